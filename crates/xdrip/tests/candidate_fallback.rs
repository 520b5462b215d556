//! Integration tests for multi-candidate fallback in [`XDripClient`].
//!
//! Each test spins up real HTTP servers on ephemeral loopback ports and
//! points the client at them in a chosen order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use diabuddy_core::TrendDirection;
use diabuddy_xdrip::{GlucoseSource, XDripClient};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Serve `router` on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

/// Base URL of a port with nothing listening on it.
fn closed_port() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}")
}

fn sgv_router(body: &'static str) -> Router {
    Router::new().route("/sgv.json", get(move || async move { body }))
}

const SINGLE_READING: &str =
    r#"[{"sgv": 154, "date": 1700000000000, "dateString": "2023-11-14T22:13:20.000Z", "direction": "FortyFiveUp"}]"#;

// ---------------------------------------------------------------------------
// Test: first healthy candidate wins
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_success_short_circuits_remaining_candidates() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let second = serve(Router::new().route(
        "/sgv.json",
        get(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                SINGLE_READING
            }
        }),
    ))
    .await;
    let first = serve(sgv_router(
        r#"[{"sgv": 80, "date": 1, "dateString": "first"}]"#,
    ))
    .await;

    let client = XDripClient::with_base_urls(vec![first, second]);
    let reading = client.fetch_latest().await.expect("reading from first candidate");

    assert_eq!(reading.value(), 80);
    assert_eq!(hits.load(Ordering::SeqCst), 0, "second candidate must not be queried");
}

// ---------------------------------------------------------------------------
// Test: timeout on A falls through to B
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timed_out_candidate_falls_back_to_next() {
    let slow = serve(Router::new().route(
        "/sgv.json",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            SINGLE_READING
        }),
    ))
    .await;
    let healthy = serve(sgv_router(SINGLE_READING)).await;

    let client = XDripClient::with_base_urls(vec![slow, healthy])
        .with_timeout(Duration::from_millis(200));
    let reading = client.fetch_latest().await.expect("reading from second candidate");

    assert_eq!(reading.value(), 154);
    assert_eq!(reading.trend(), &TrendDirection::FortyFiveUp);
    assert_eq!(reading.timestamp_epoch(), 1_700_000_000_000);
    assert_eq!(reading.timestamp_text(), "2023-11-14T22:13:20.000Z");
}

// ---------------------------------------------------------------------------
// Test: each kind of bad candidate is skipped
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refused_connection_is_skipped() {
    let healthy = serve(sgv_router(SINGLE_READING)).await;
    let client = XDripClient::with_base_urls(vec![closed_port(), healthy]);

    assert_eq!(client.fetch_latest().await.map(|r| r.value()), Some(154));
}

#[tokio::test]
async fn non_200_status_is_skipped() {
    let failing = serve(Router::new().route(
        "/sgv.json",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, SINGLE_READING) }),
    ))
    .await;
    let healthy = serve(sgv_router(
        r#"[{"sgv": 200, "date": 5, "dateString": "ok"}]"#,
    ))
    .await;

    let client = XDripClient::with_base_urls(vec![failing, healthy]);
    assert_eq!(client.fetch_latest().await.map(|r| r.value()), Some(200));
}

#[tokio::test]
async fn empty_and_malformed_bodies_are_skipped() {
    let empty = serve(sgv_router("[]")).await;
    let malformed = serve(sgv_router("not json at all")).await;
    let missing_field = serve(sgv_router(r#"[{"sgv": 99, "date": 1}]"#)).await;
    let healthy = serve(sgv_router(SINGLE_READING)).await;

    let client = XDripClient::with_base_urls(vec![empty, malformed, missing_field, healthy]);
    assert_eq!(client.fetch_latest().await.map(|r| r.value()), Some(154));
}

// ---------------------------------------------------------------------------
// Test: nothing works -> Absent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_candidates_failing_returns_none() {
    let empty = serve(sgv_router("[]")).await;
    let client = XDripClient::with_base_urls(vec![closed_port(), empty]);

    assert!(client.fetch_latest().await.is_none());
}

#[tokio::test]
async fn no_candidates_returns_none() {
    let client = XDripClient::with_base_urls(Vec::new());
    assert!(client.fetch_latest().await.is_none());
}

// ---------------------------------------------------------------------------
// Test: optional direction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_direction_reads_as_unknown() {
    let base = serve(sgv_router(
        r#"[{"sgv": 77, "date": 9, "dateString": "now"}]"#,
    ))
    .await;

    let client = XDripClient::with_base_urls(vec![format!("{base}/")]);
    let reading = client.fetch_latest().await.expect("reading");

    assert_eq!(reading.trend().as_str(), "Unknown");
}
