//! Integration tests for the HTTP sources against a local canned server

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use chrono::Duration;
use reqwest::blocking::Client;
use serde_json::json;

use ocitools::compartments::{walk, CompartmentSource, TraversalLimits, ACTIVE};
use ocitools::extract::window::end_of_day;
use ocitools::extract::{
    partition, EventSource, FailureKind, FetchError, QuietProgress, TimeWindow, WindowedEvents,
};
use ocitools::{HttpAuditSource, HttpCompartmentSource};

use crate::helpers::{audit_event, day, noon};

const TENANCY: &str = "ocid1.tenancy.oc1..test";

/// One canned HTTP response.
struct Reply {
    status: &'static str,
    next_page: Option<&'static str>,
    body: String,
}

impl Reply {
    fn ok(body: serde_json::Value, next_page: Option<&'static str>) -> Self {
        Self {
            status: "200 OK",
            next_page,
            body: body.to_string(),
        }
    }

    fn server_error() -> Self {
        Self {
            status: "500 Internal Server Error",
            next_page: None,
            body: json!({"code": "InternalServerError", "message": "try later"}).to_string(),
        }
    }

    fn render(&self) -> String {
        let next = self
            .next_page
            .map(|token| format!("opc-next-page: {}\r\n", token))
            .unwrap_or_default();
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
            self.status,
            self.body.len(),
            next,
            self.body
        )
    }
}

/// Serve `replies` in order, one connection each. The handle yields the
/// request lines received.
fn serve(replies: Vec<Reply>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for reply in replies {
            let (mut stream, _) = listener.accept().expect("Failed to accept");
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                    break;
                }
            }
            requests.push(request_line.trim_end().to_string());
            stream.write_all(reply.render().as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        requests
    });

    (base, handle)
}

fn local_client() -> Client {
    Client::builder()
        .no_proxy()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap()
}

fn first_week() -> TimeWindow {
    TimeWindow::new(day(2025, 12, 1), end_of_day(day(2025, 12, 7).date_naive()))
}

fn event_names(records: &[serde_json::Value]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r["data"]["eventName"].as_str().unwrap())
        .collect()
}

#[test]
fn audit_pages_follow_next_page_header_until_service_error() {
    let (base, server) = serve(vec![
        Reply::ok(
            json!([
                audit_event("t.A", "a1", noon(2025, 12, 2)),
                audit_event("t.A", "a2", noon(2025, 12, 3)),
            ]),
            Some("tok-2"),
        ),
        Reply::ok(json!([audit_event("t.B", "b1", noon(2025, 12, 4))]), None),
        Reply::server_error(),
    ]);
    let source = HttpAuditSource::with_client(local_client(), &base, 2);
    let window = first_week();

    let first = source.list_events(TENANCY, &window, None).unwrap();
    assert_eq!(event_names(&first.records), vec!["a1", "a2"]);
    assert_eq!(first.next_page.as_deref(), Some("tok-2"));

    let second = source
        .list_events(TENANCY, &window, first.next_page.as_deref())
        .unwrap();
    assert_eq!(event_names(&second.records), vec!["b1"]);
    assert_eq!(second.next_page, None);

    let err = source.list_events(TENANCY, &window, None).unwrap_err();
    match &err {
        FetchError::Service { status, code, message } => {
            assert_eq!(*status, 500);
            assert_eq!(code.as_deref(), Some("InternalServerError"));
            assert_eq!(message, "try later");
        }
        other => panic!("expected service error, got {:?}", other),
    }
    assert_eq!(err.kind(), FailureKind::RemoteService);

    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].starts_with("GET /20190901/auditEvents?"));
    assert!(requests[0].contains("compartmentId=ocid1.tenancy.oc1..test"));
    assert!(requests[0].contains("limit=2"));
    assert!(!requests[0].contains("page="));
    assert!(requests[1].contains("page=tok-2"));
}

#[test]
fn failing_window_over_http_is_reported_and_skipped() {
    let (base, server) = serve(vec![
        Reply::ok(
            json!([audit_event("t.A", "a1", noon(2025, 12, 2))]),
            Some("tok-2"),
        ),
        Reply::ok(json!([audit_event("t.A", "a2", noon(2025, 12, 5))]), None),
        Reply::server_error(),
    ]);
    let source = HttpAuditSource::with_client(local_client(), &base, 100);
    let windows = partition(day(2025, 12, 1), end_of_day(day(2025, 12, 14).date_naive()), 7)
        .unwrap();
    assert_eq!(windows.len(), 2);

    let mut events = WindowedEvents::new(&source, TENANCY, windows, &QuietProgress);
    let names: Vec<String> = events
        .by_ref()
        .map(|r| r.as_value()["data"]["eventName"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a1", "a2"]);

    let report = events.into_report();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.windows[0].pages, 2);
    let failure = report.windows[1].failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::RemoteService);
    assert!(failure.message.contains("500"));

    let requests = server.join().unwrap();
    assert!(requests[2].contains("startTime=2025-12-08T00%3A00%3A01Z"));
    assert!(report.windows[1].window.start - report.windows[0].window.end == Duration::seconds(1));
}

#[test]
fn identity_children_are_collected_across_pages() {
    let child = |id: &str, name: &str| {
        json!({"id": id, "name": name, "lifecycleState": ACTIVE, "compartmentId": TENANCY})
    };
    let (base, server) = serve(vec![
        Reply::ok(json!([child("c1", "Prod"), child("c2", "Dev")]), Some("p2")),
        Reply::ok(json!([child("c3", "Test")]), None),
    ]);
    let source = HttpCompartmentSource::with_client(local_client(), &base);

    let children = source.list_children(TENANCY).unwrap();
    let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Prod", "Dev", "Test"]);

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("GET /20160918/compartments?"));
    assert!(requests[0].contains("accessLevel=ANY"));
    assert!(requests[1].contains("page=p2"));
}

#[test]
fn identity_walk_over_http() {
    let (base, server) = serve(vec![
        Reply::ok(
            json!({"id": TENANCY, "name": "root", "lifecycleState": ACTIVE}),
            None,
        ),
        Reply::ok(
            json!([{"id": "c1", "name": "Prod", "lifecycleState": ACTIVE, "compartmentId": TENANCY}]),
            None,
        ),
        Reply::ok(json!([]), None),
    ]);
    let source = HttpCompartmentSource::with_client(local_client(), &base);

    let report = walk(&source, TENANCY, TraversalLimits::unbounded()).unwrap();
    let names: Vec<&str> = report
        .visited
        .iter()
        .map(|v| v.compartment.name.as_str())
        .collect();
    assert_eq!(names, vec!["root", "Prod"]);

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with(&format!("GET /20160918/compartments/{}", TENANCY)));
}
