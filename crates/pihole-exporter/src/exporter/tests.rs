//! Tests for metrics exporter.

use std::{net::Ipv4Addr, time::Duration};

use http_body_util::{BodyExt as _, Empty};
use hyper::{body::Bytes, HeaderMap};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client as HttpClient},
    rt::TokioExecutor,
};
use pihole::{
    mock::{MockAppliance, STATS_RESPONSE},
    Client,
};
use tokio::sync::oneshot;

use super::*;

const TEST_TIMEOUT: Duration = Duration::from_secs(3);

type TestClient = HttpClient<HttpConnector, Empty<Bytes>>;

async fn start_exporter(
    appliance: &MockAppliance,
    configure: impl FnOnce(MetricsExporter<'static>) -> MetricsExporter<'static>,
) -> SocketAddr {
    let client = Client::new(&appliance.endpoint()).await.unwrap();
    let exporter = configure(MetricsExporter::new(Arc::new(Collector::new(client))));
    let bind_address: SocketAddr = (Ipv4Addr::LOCALHOST, 0).into();
    let server = exporter.bind(bind_address).await.unwrap();
    let local_addr = server.local_addr();
    tokio::spawn(server.start());
    local_addr
}

async fn send(
    client: &TestClient,
    method: Method,
    uri: String,
) -> (StatusCode, HeaderMap, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Empty::new())
        .unwrap();
    let response = tokio::time::timeout(TEST_TIMEOUT, client.request(request))
        .await
        .expect("timed out waiting for exporter response")
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

fn test_client() -> TestClient {
    HttpClient::builder(TokioExecutor::new()).build_http()
}

#[tokio::test]
async fn serving_metrics() {
    let appliance = MockAppliance::new(STATS_RESPONSE).await;
    let local_addr = start_exporter(&appliance, |exporter| exporter).await;
    let client = test_client();

    let (status, headers, body) =
        send(&client, Method::GET, format!("http://{local_addr}/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE],
        Format::PROMETHEUS_CONTENT_TYPE
    );

    let lines: Vec<_> = body.lines().collect();
    let expected_lines = [
        "# HELP pihole_enabled Whether Pi-hole is enabled or not.",
        "# TYPE pihole_enabled gauge",
        "pihole_enabled 1.0",
        "# TYPE pihole_ads_blocked_today gauge",
        "pihole_ads_blocked_today 3512.0",
        "# TYPE pihole_top_ads gauge",
        r#"pihole_top_ads{domain="ads.example.com"} 820.0"#,
        r#"pihole_top_sources{client="192.168.1.31"} 4410.0"#,
        r#"pihole_query_types{type="PTR"} 8.7"#,
        r#"pihole_forward_destinations{target="8.8.8.8"} 51.49"#,
    ];
    for line in expected_lines {
        assert!(lines.contains(&line), "{lines:#?}");
    }
    assert!(!lines.contains(&"# EOF"), "{lines:#?}");
    assert_eq!(appliance.stats_requests(), 1);

    // Each scrape collects metrics anew.
    appliance.set_stats(r#"{"status": "disabled"}"#);
    let (_, _, body) = send(&client, Method::GET, format!("http://{local_addr}/metrics")).await;
    assert!(body.lines().any(|line| line == "pihole_enabled 0.0"), "{body}");
    assert_eq!(appliance.stats_requests(), 2);
}

#[tokio::test]
async fn serving_metrics_in_open_metrics_format() {
    let appliance = MockAppliance::new(STATS_RESPONSE).await;
    let local_addr = start_exporter(&appliance, |exporter| {
        exporter
            .with_format(Format::OpenMetrics)
            .with_telemetry_path("/probe")
    })
    .await;
    let client = test_client();

    let (status, headers, body) =
        send(&client, Method::GET, format!("http://{local_addr}/probe")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE],
        Format::OPEN_METRICS_CONTENT_TYPE
    );
    assert_eq!(body.lines().last(), Some("# EOF"));

    let (status, _, _) = send(&client, Method::GET, format!("http://{local_addr}/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(&client, Method::GET, format!("http://{local_addr}/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"<a href="/probe">"#), "{body}");
}

#[tokio::test]
async fn rejecting_other_methods() {
    let appliance = MockAppliance::new(STATS_RESPONSE).await;
    let local_addr = start_exporter(&appliance, |exporter| exporter).await;

    let (status, _, _) = send(
        &test_client(),
        Method::POST,
        format!("http://{local_addr}/metrics"),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(appliance.stats_requests(), 0);
}

#[tokio::test]
async fn serving_empty_metrics_if_appliance_is_down() {
    let mut appliance = MockAppliance::new(STATS_RESPONSE).await;
    let local_addr = start_exporter(&appliance, |exporter| exporter).await;
    appliance.shutdown().await;

    let (status, _, body) = send(
        &test_client(),
        Method::GET,
        format!("http://{local_addr}/metrics"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "");
}

#[tokio::test]
async fn graceful_shutdown() {
    let appliance = MockAppliance::new(STATS_RESPONSE).await;
    let client = Client::new(&appliance.endpoint()).await.unwrap();
    let (stop_sender, stop_receiver) = oneshot::channel::<()>();
    let server = MetricsExporter::new(Arc::new(Collector::new(client)))
        .with_graceful_shutdown(async move {
            stop_receiver.await.ok();
        })
        .bind((Ipv4Addr::LOCALHOST, 0).into())
        .await
        .unwrap();
    let local_addr = server.local_addr();
    let server_task = tokio::spawn(server.start());

    let (status, _, _) = send(
        &test_client(),
        Method::GET,
        format!("http://{local_addr}/metrics"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    stop_sender.send(()).unwrap();
    tokio::time::timeout(TEST_TIMEOUT, server_task)
        .await
        .expect("timed out waiting for exporter shutdown")
        .unwrap()
        .unwrap();
}
