//! Test helper utilities

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use ocitools::compartments::{Compartment, CompartmentSource};
use ocitools::extract::{EventPage, EventSource, FetchError, TimeWindow};

/// Midnight UTC on the given day.
pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Noon UTC on the given day.
pub fn noon(year: i32, month: u32, d: u32) -> DateTime<Utc> {
    day(year, month, d) + chrono::Duration::hours(12)
}

/// An audit event shaped like the service returns it.
pub fn audit_event(event_type: &str, event_name: &str, at: DateTime<Utc>) -> Value {
    json!({
        "eventId": format!("{}-{}", event_name, at.timestamp()),
        "eventTime": at.to_rfc3339(),
        "source": "test",
        "data": {
            "eventType": event_type,
            "eventName": event_name,
            "compartmentId": "ocid1.tenancy.oc1..test",
        }
    })
}

/// In-memory audit service.
///
/// Serves stored events whose `eventTime` falls inside the requested window,
/// `page_size` at a time. Windows listed in `failing` answer with a 500.
pub struct FakeAuditService {
    events: Vec<(DateTime<Utc>, Value)>,
    page_size: usize,
    failing: Vec<DateTime<Utc>>,
    calls: RefCell<Vec<(TimeWindow, Option<String>)>>,
}

impl FakeAuditService {
    pub fn new(page_size: usize) -> Self {
        Self {
            events: Vec::new(),
            page_size,
            failing: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_event(mut self, event_type: &str, event_name: &str, at: DateTime<Utc>) -> Self {
        self.events.push((at, audit_event(event_type, event_name, at)));
        self
    }

    /// Fail every request for the window starting at `window_start`.
    pub fn failing_window(mut self, window_start: DateTime<Utc>) -> Self {
        self.failing.push(window_start);
        self
    }

    pub fn calls(&self) -> Vec<(TimeWindow, Option<String>)> {
        self.calls.borrow().clone()
    }
}

impl EventSource for FakeAuditService {
    fn list_events(
        &self,
        _compartment_id: &str,
        window: &TimeWindow,
        page: Option<&str>,
    ) -> Result<EventPage, FetchError> {
        self.calls
            .borrow_mut()
            .push((*window, page.map(str::to_string)));

        if self.failing.contains(&window.start) {
            return Err(FetchError::Service {
                status: 500,
                code: Some("InternalServerError".to_string()),
                message: "simulated outage".to_string(),
            });
        }

        let offset: usize = match page {
            Some(token) => token
                .parse()
                .map_err(|_| FetchError::Unexpected(format!("bad token {}", token)))?,
            None => 0,
        };
        let matching: Vec<Value> = self
            .events
            .iter()
            .filter(|(at, _)| window.contains(*at))
            .map(|(_, event)| event.clone())
            .collect();
        let records: Vec<Value> = matching
            .iter()
            .skip(offset)
            .take(self.page_size)
            .cloned()
            .collect();
        let next = offset + records.len();

        if next < matching.len() {
            Ok(EventPage::with_next(records, next.to_string()))
        } else {
            Ok(EventPage::last(records))
        }
    }
}

/// In-memory identity service built from (parent, id, name, state) rows.
#[derive(Default)]
pub struct FakeIdentityService {
    compartments: Vec<Compartment>,
}

impl FakeIdentityService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, parent: Option<&str>, id: &str, name: &str, state: &str) -> Self {
        self.compartments.push(Compartment {
            id: id.to_string(),
            name: name.to_string(),
            lifecycle_state: state.to_string(),
            parent_id: parent.map(str::to_string),
        });
        self
    }
}

impl CompartmentSource for FakeIdentityService {
    fn get_compartment(&self, id: &str) -> Result<Compartment, FetchError> {
        self.compartments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| FetchError::Service {
                status: 404,
                code: Some("NotAuthorizedOrNotFound".to_string()),
                message: format!("compartment {} not found", id),
            })
    }

    fn list_children(&self, parent_id: &str) -> Result<Vec<Compartment>, FetchError> {
        Ok(self
            .compartments
            .iter()
            .filter(|c| c.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect())
    }
}

/// Write a config file with one DEFAULT profile plus `extra` TOML.
pub fn write_config(dir: &TempDir, extra: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    let contents = format!(
        "[profiles.DEFAULT]\ntenancy = \"ocid1.tenancy.oc1..test\"\nregion = \"eu-frankfurt-1\"\naudit_endpoint = \"http://127.0.0.1:9\"\nidentity_endpoint = \"http://127.0.0.1:9\"\ntimeout_secs = 1\n\n{}",
        extra
    );
    fs::write(&path, contents).expect("Failed to write config");
    path
}

/// Parse a JSON array file.
pub fn read_json_array(path: &Path) -> Vec<Value> {
    let text = fs::read_to_string(path).expect("Failed to read output");
    serde_json::from_str(&text).expect("Output is not a JSON array")
}

/// Event names in order.
pub fn names(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["data"]["eventName"].as_str().unwrap_or_default().to_string())
        .collect()
}
