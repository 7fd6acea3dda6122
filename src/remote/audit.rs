//! Audit event listing over HTTP.

use chrono::SecondsFormat;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::trace;

use super::{build_client, decode, join_url, next_page_token, send};
use crate::extract::{EventPage, EventSource, FetchError, TimeWindow};

pub const AUDIT_API_VERSION: &str = "20190901";

/// `EventSource` backed by the audit service's ListEvents call.
#[derive(Debug, Clone)]
pub struct HttpAuditSource {
    client: Client,
    endpoint: String,
    page_limit: u32,
}

impl HttpAuditSource {
    /// Creates a source targeting `endpoint`, e.g.
    /// `https://audit.eu-frankfurt-1.oraclecloud.com`.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        page_limit: u32,
    ) -> Result<Self, FetchError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(FetchError::Unexpected(
                "audit endpoint must not be empty".to_string(),
            ));
        }
        Ok(Self::with_client(build_client(timeout)?, endpoint, page_limit))
    }

    /// Creates a source around an already configured client.
    pub fn with_client(client: Client, endpoint: impl Into<String>, page_limit: u32) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            page_limit,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn events_url(&self) -> String {
        join_url(&self.endpoint, &format!("{}/auditEvents", AUDIT_API_VERSION))
    }
}

/// Query parameters for one ListEvents page.
///
/// Window bounds are sent as RFC 3339 UTC timestamps at second precision.
pub fn event_query(
    compartment_id: &str,
    window: &TimeWindow,
    page: Option<&str>,
    limit: u32,
) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("compartmentId", compartment_id.to_string()),
        (
            "startTime",
            window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        (
            "endTime",
            window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        ("limit", limit.to_string()),
    ];
    if let Some(token) = page {
        query.push(("page", token.to_string()));
    }
    query
}

impl EventSource for HttpAuditSource {
    fn list_events(
        &self,
        compartment_id: &str,
        window: &TimeWindow,
        page: Option<&str>,
    ) -> Result<EventPage, FetchError> {
        let query = event_query(compartment_id, window, page, self.page_limit);
        trace!(url = %self.events_url(), page = ?page, "listing audit events");

        let response = send(self.client.get(self.events_url()).query(&query))?;
        let next_page = next_page_token(response.headers());
        let records: Vec<Value> = decode(response)?;

        Ok(EventPage { records, next_page })
    }
}
