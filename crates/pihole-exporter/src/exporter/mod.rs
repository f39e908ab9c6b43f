//! `MetricsExporter` and closely related types.

use std::{
    convert::Infallible,
    fmt,
    future::{self, Future},
    net::SocketAddr,
    pin::Pin,
    sync::Arc,
    time::Instant,
};

use hyper::{
    body::Incoming, header, server::conn::http1, service::service_fn, Method, Request, Response,
    StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::{
    io,
    net::{TcpListener, TcpStream},
    sync::watch,
};

use crate::{Collector, Format, Snapshot};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
struct MetricsExporterInner {
    collector: Arc<Collector>,
    format: Format,
    telemetry_path: String,
}

impl MetricsExporterInner {
    async fn render_body(&self) -> String {
        let started_at = Instant::now();
        let snapshot = Snapshot::from(self.collector.collect().await);
        let observation_count = snapshot.observations().len();
        let body = snapshot.render(self.format).unwrap();
        // ^ `unwrap()` is safe; writing to a string never fails.

        let latency = started_at.elapsed();
        let scraped_size = body.len();
        tracing::debug!(
            latency_sec = latency.as_secs_f64(),
            observation_count,
            scraped_size,
            "Scraped {observation_count} observations in {latency:?} (scraped size: {scraped_size}B)"
        );
        body
    }

    fn landing_page(&self) -> String {
        let path = &self.telemetry_path;
        format!(
            "<html>\n<head><title>Pi-hole Exporter</title></head>\n<body>\n\
             <h1>Pi-hole Exporter</h1>\n<p><a href=\"{path}\">Metrics</a></p>\n\
             </body>\n</html>\n"
        )
    }

    async fn handle(&self, request: Request<Incoming>) -> Result<Response<String>, Infallible> {
        if request.method() != Method::GET {
            return Ok(Self::plain_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed\n",
            ));
        }

        let path = request.uri().path();
        let response = if path == self.telemetry_path {
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, self.format.content_type())
                .body(self.render_body().await)
                .unwrap()
        } else if path == "/" {
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
                .body(self.landing_page())
                .unwrap()
        } else {
            Self::plain_response(StatusCode::NOT_FOUND, "Not found\n")
        };
        Ok(response)
    }

    fn plain_response(status: StatusCode, body: &str) -> Response<String> {
        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body.to_owned())
            .unwrap()
    }

    /// Serves scrapes on a single connection until it's closed by the peer, or until
    /// `stop_receiver` signals shutdown (in which case, in-flight scrapes are completed).
    async fn serve(self, stream: TcpStream, mut stop_receiver: watch::Receiver<()>) {
        let service = service_fn(|request| self.handle(request));
        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);

        let served = tokio::select! {
            served = connection.as_mut() => served,
            _ = stop_receiver.changed() => {
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        };
        if let Err(err) = served {
            tracing::warn!(%err, "Error serving scrape connection");
        }
    }
}

/// Metrics exporter to Prometheus.
///
/// The exporter runs an HTTP server; each scrape of the telemetry path triggers
/// [`Collector::collect()`] and returns its observations in the configured [`Format`].
pub struct MetricsExporter<'a> {
    inner: MetricsExporterInner,
    shutdown_future: Pin<Box<dyn Future<Output = ()> + Send + 'a>>,
}

impl fmt::Debug for MetricsExporter<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MetricsExporter")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<'a> MetricsExporter<'a> {
    /// Default path on which metrics are served.
    pub const DEFAULT_TELEMETRY_PATH: &'static str = "/metrics";

    /// Creates an exporter for the provided collector.
    pub fn new(collector: Arc<Collector>) -> Self {
        let metric_count = collector.describe().len();
        tracing::info!(
            endpoint = %collector.client().endpoint(),
            "Created metrics exporter with {metric_count} metrics"
        );
        Self {
            inner: MetricsExporterInner {
                collector,
                format: Format::default(),
                telemetry_path: Self::DEFAULT_TELEMETRY_PATH.to_owned(),
            },
            shutdown_future: Box::pin(future::pending()),
        }
    }

    /// Sets the export [`Format`]. By default, [`Format::Prometheus`] is used.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.inner.format = format;
        self
    }

    /// Sets the path on which metrics are served. By default, [`Self::DEFAULT_TELEMETRY_PATH`] is used.
    #[must_use]
    pub fn with_telemetry_path(mut self, path: impl Into<String>) -> Self {
        self.inner.telemetry_path = path.into();
        self
    }

    /// Configures graceful shutdown for the exporter server.
    #[must_use]
    pub fn with_graceful_shutdown<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = ()> + Send + 'a,
    {
        self.shutdown_future = Box::pin(shutdown);
        self
    }

    /// Starts the server on the specified address. This future resolves when the server is shut down.
    ///
    /// The server will expose the following endpoints:
    ///
    /// - `GET` on the telemetry path: serves the metrics in the format configured using [`Self::with_format()`]
    /// - `GET /`: serves a landing page linking to the metrics
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the specified address fails.
    pub async fn start(self, bind_address: SocketAddr) -> io::Result<()> {
        let server = self.bind(bind_address).await?;
        tracing::info!(
            local_addr = %server.local_addr(),
            "Serving Pi-hole metrics on {bind_address}"
        );
        server.start().await?;
        tracing::info!("Pi-hole exporter server shut down");
        Ok(())
    }

    /// Creates an HTTP exporter server and binds it to the specified address.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the specified address fails.
    pub async fn bind(mut self, bind_address: SocketAddr) -> io::Result<MetricsServer<'a>> {
        let listener = TcpListener::bind(bind_address).await?;
        let local_addr = listener.local_addr()?;
        let server = async move {
            // Receivers are held by open connections; the sender is closed once all of them are done.
            let (stop_sender, stop_receiver) = watch::channel(());
            loop {
                let stream = tokio::select! {
                    accepted = listener.accept() => accepted?.0,
                    () = &mut self.shutdown_future => break,
                };
                tokio::spawn(self.inner.clone().serve(stream, stop_receiver.clone()));
            }

            let open_connections = stop_sender.receiver_count() - 1;
            tracing::info!(
                open_connections,
                "Stop signal received, Pi-hole exporter is shutting down"
            );
            drop(stop_receiver);
            stop_sender.send_replace(());
            stop_sender.closed().await;
            Ok(())
        };

        Ok(MetricsServer {
            server: Box::pin(server),
            local_addr,
        })
    }
}

/// Metrics server bound to a certain local address returned by [`MetricsExporter::bind()`].
///
/// Useful e.g. if you need to find out which port the server was bound to if the 0th port was specified.
#[must_use = "Server should be `start()`ed"]
pub struct MetricsServer<'a> {
    server: Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>>,
    local_addr: SocketAddr,
}

impl fmt::Debug for MetricsServer<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MetricsServer")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

impl MetricsServer<'_> {
    /// Returns the local address this server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts this server. Resolves once the server is shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if starting the server operation fails.
    pub async fn start(self) -> io::Result<()> {
        self.server.await
    }
}
