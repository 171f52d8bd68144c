//! Snapshot client tests against a canned-response loopback HTTP server.

use chrono::{TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use vesselscope::feed::{ChartFeed, TagSet};
use vesselscope::{SnapshotClient, SnapshotError};

/// Serve one request with a fixed response; the raw request text comes
/// back through the oneshot so tests can assert on the query string.
async fn one_shot_server(
    status_line: &'static str,
    body: &'static str,
) -> (String, tokio::sync::oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut buf = vec![0u8; 8192];
        let n = stream.read(&mut buf).await.unwrap_or(0);
        let request = String::from_utf8_lossy(&buf[..n]).to_string();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = tx.send(request);
    });
    (format!("http://{addr}"), rx)
}

const GOOD_BODY: &str = r#"{"values":[
    {"ts":"2025-03-14T08:30:00Z","value":1.8},
    {"ts":"2025-03-14T08:30:01Z","value":1.9},
    {"ts":"2025-03-14T08:30:02Z","value":2.0}
]}"#;

#[tokio::test]
async fn fetch_builds_the_query_and_parses_values() {
    let (base, request_rx) = one_shot_server("200 OK", GOOD_BODY).await;
    let client = SnapshotClient::new(base);

    let start = Utc.with_ymd_and_hms(2025, 3, 14, 5, 30, 0).unwrap();
    let points = client
        .fetch("Pressure_BPV", start, None)
        .await
        .expect("fetch should succeed");

    assert_eq!(points.len(), 3);
    assert_eq!(points[0].value, 1.8);
    assert_eq!(points[2].value, 2.0);
    assert!(points[0].at < points[2].at);

    let request = request_rx.await.expect("request captured");
    assert!(
        request.starts_with("GET /telemetry?start-at=2025-03-14T05:30:00Z&tag=Pressure_BPV"),
        "unexpected request line: {request}"
    );
    assert!(!request.contains("end-at"), "live seed must omit end-at");
}

#[tokio::test]
async fn bounded_fetch_carries_end_at() {
    let (base, request_rx) = one_shot_server("200 OK", r#"{"values":[]}"#).await;
    let client = SnapshotClient::new(base);

    let start = Utc.with_ymd_and_hms(2024, 12, 31, 17, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 1, 1, 16, 59, 59).unwrap();
    let points = client
        .fetch("Pressure_Boiler", start, Some(end))
        .await
        .expect("empty ranges are fine");
    assert!(points.is_empty());

    let request = request_rx.await.expect("request captured");
    assert!(request.contains("start-at=2024-12-31T17:00:00Z"));
    assert!(request.contains("end-at=2025-01-01T16:59:59Z"));
    assert!(request.contains("tag=Pressure_Boiler"));
}

#[tokio::test]
async fn server_error_maps_to_status_variant() {
    let (base, _request_rx) = one_shot_server("500 Internal Server Error", "{}").await;
    let client = SnapshotClient::new(base);

    let start = Utc.with_ymd_and_hms(2025, 3, 14, 5, 30, 0).unwrap();
    let err = client
        .fetch("Pressure_BPV", start, None)
        .await
        .expect_err("500 must be an error");
    match err {
        SnapshotError::Status(code) => assert_eq!(code, 500),
        other => panic!("expected Status(500), got {other}"),
    }
}

#[tokio::test]
async fn failed_seed_leaves_prior_buffer_contents() {
    let day = chrono::NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let mut feed = ChartFeed::history(TagSet::boiler(), day, day);

    let (good_base, _rx) = one_shot_server("200 OK", GOOD_BODY).await;
    feed.seed(&SnapshotClient::new(good_base))
        .await
        .expect("first seed");
    assert_eq!(feed.buffer().len(), 3);

    let (bad_base, _rx) = one_shot_server("503 Service Unavailable", "{}").await;
    let result = feed.seed(&SnapshotClient::new(bad_base)).await;
    assert!(result.is_err());
    // Stale data retained, not cleared: the chart keeps what it had.
    assert_eq!(feed.buffer().len(), 3);
    assert_eq!(feed.last_pressure(), Some(2.0));
}
