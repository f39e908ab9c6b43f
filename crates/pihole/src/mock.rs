//! In-process fake Pi-hole appliance for tests.

use std::{
    convert::Infallible,
    net::{Ipv4Addr, SocketAddr},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use hyper::{
    body::Incoming, header, server::conn::http1, service::service_fn, Request, Response,
    StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::{net::TcpListener, task::JoinHandle};

/// Version response of a supported appliance.
pub const VERSION_RESPONSE: &str = r#"{"version":3}"#;

/// Summary response resembling one returned by a real appliance.
pub const STATS_RESPONSE: &str = r#"{
    "domains_being_blocked": 128367,
    "dns_queries_today": 23414,
    "ads_blocked_today": 3512,
    "ads_percentage_today": 14.999573,
    "unique_domains": 1830,
    "queries_forwarded": 12052,
    "queries_cached": 7850,
    "clients_ever_seen": 9,
    "unique_clients": 8,
    "dns_queries_all_types": 23414,
    "reply_NODATA": 312,
    "reply_NXDOMAIN": 95,
    "reply_CNAME": 6142,
    "reply_IP": 11034,
    "privacy_level": 0,
    "status": "enabled",
    "gravity_last_updated": {
        "file_exists": true,
        "absolute": 1571591123,
        "relative": {"days": "3", "hours": "10", "minutes": "41"}
    },
    "top_queries": {"connectivitycheck.gstatic.com": 1430, "api.github.com": 377},
    "top_ads": {"ads.example.com": 820, "telemetry.example.net": 311},
    "top_sources": {"laptop.lan|192.168.1.20": 9120, "192.168.1.31": 4410},
    "forward_destinations": {"blocklist|blocklist": 14.99, "cache|cache": 33.52, "dns.google|8.8.8.8": 51.49},
    "querytypes": {"A (IPv4)": 61.2, "AAAA (IPv6)": 30.1, "PTR": 8.7}
}"#;

#[derive(Debug)]
struct MockState {
    version_body: String,
    stats_body: Mutex<String>,
    stats_requests: AtomicUsize,
    all_requests: AtomicUsize,
}

impl MockState {
    fn respond(&self, request: &Request<Incoming>) -> Response<String> {
        self.all_requests.fetch_add(1, Ordering::SeqCst);
        let query = request.uri().query().unwrap_or("");
        let (status, body) = if request.uri().path() != "/admin/api.php" {
            (StatusCode::NOT_FOUND, String::new())
        } else if query == "version" {
            (StatusCode::OK, self.version_body.clone())
        } else if query.starts_with("summaryRaw") {
            self.stats_requests.fetch_add(1, Ordering::SeqCst);
            (StatusCode::OK, self.stats_body.lock().unwrap().clone())
        } else {
            (StatusCode::BAD_REQUEST, "[]".to_owned())
        };

        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            // Prevents clients from reusing connections after the mock is shut down.
            .header(header::CONNECTION, "close")
            .body(body)
            .unwrap()
    }
}

/// Fake appliance serving the Pi-hole API on a random local port.
///
/// The server runs until [shut down](Self::shutdown()) or dropped.
#[derive(Debug)]
pub struct MockAppliance {
    local_addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl Drop for MockAppliance {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl MockAppliance {
    /// Starts an appliance with a supported API version and the specified stats response.
    ///
    /// # Panics
    ///
    /// Panics if binding to a local port fails.
    pub async fn new(stats_body: &str) -> Self {
        Self::with_version(VERSION_RESPONSE, stats_body).await
    }

    /// Starts an appliance with the specified version and stats responses.
    ///
    /// # Panics
    ///
    /// Panics if binding to a local port fails.
    pub async fn with_version(version_body: &str, stats_body: &str) -> Self {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("failed binding mock appliance");
        let local_addr = listener.local_addr().unwrap();
        let state = Arc::new(MockState {
            version_body: version_body.to_owned(),
            stats_body: Mutex::new(stats_body.to_owned()),
            stats_requests: AtomicUsize::new(0),
            all_requests: AtomicUsize::new(0),
        });

        let server_state = Arc::clone(&state);
        let server = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = Arc::clone(&server_state);
                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let response = state.respond(&req);
                        async move { Ok::<_, Infallible>(response) }
                    });
                    http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                        .ok();
                });
            }
        });

        Self {
            local_addr,
            state,
            server,
        }
    }

    /// Returns the endpoint URL of this appliance.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Replaces the body returned for subsequent stats requests.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    pub fn set_stats(&self, stats_body: &str) {
        *self.state.stats_body.lock().unwrap() = stats_body.to_owned();
    }

    /// Returns the number of stats requests served so far.
    pub fn stats_requests(&self) -> usize {
        self.state.stats_requests.load(Ordering::SeqCst)
    }

    /// Returns the number of requests of any kind served so far.
    pub fn all_requests(&self) -> usize {
        self.state.all_requests.load(Ordering::SeqCst)
    }

    /// Stops accepting connections. Subsequent requests to the appliance fail to connect.
    pub async fn shutdown(&mut self) {
        self.server.abort();
        (&mut self.server).await.ok();
    }
}
