//! `Client` and closely related types.

use http_body_util::{BodyExt as _, Empty};
use hyper::body::Bytes;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client as HttpClient},
    rt::TokioExecutor,
};
use serde::de::DeserializeOwned;

use crate::{
    stats::{decode_object, VersionPayload},
    Endpoint, Error, StatsPayload,
};

/// The only version of the Pi-hole API understood by [`Client`].
pub const SUPPORTED_API_VERSION: i64 = 3;

/// Client for a single Pi-hole appliance.
///
/// The client is immutable after creation and can be shared among concurrent tasks; cloning
/// it is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Endpoint,
    http: HttpClient<HttpConnector, Empty<Bytes>>,
}

impl Client {
    const VERSION_QUERY: &'static str = "version";
    /// `topItems` caps top-N maps on the appliance side. `jsonForceObject` makes the appliance
    /// return empty maps as `{}` rather than `[]`.
    const SUMMARY_QUERY: &'static str =
        "summaryRaw&topItems=20&getQueryTypes&getForwardDestinations&topClients&jsonForceObject";

    /// Creates a client for the appliance at `endpoint` and checks its API version.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `endpoint` is not a valid `http` URL.
    /// - [`Error::Network`] / [`Error::Decode`] if the version check request fails.
    /// - [`Error::Compatibility`] if the appliance doesn't use [`SUPPORTED_API_VERSION`].
    pub async fn new(endpoint: &str) -> Result<Self, Error> {
        let endpoint = Endpoint::parse(endpoint)?;
        let this = Self {
            endpoint,
            http: HttpClient::builder(TokioExecutor::new()).build_http(),
        };

        let VersionPayload { version } = this.get_json(Self::VERSION_QUERY).await?;
        if version != SUPPORTED_API_VERSION {
            return Err(Error::Compatibility {
                version,
                expected: SUPPORTED_API_VERSION,
            });
        }
        tracing::info!(endpoint = %this.endpoint, version, "Created Pi-hole client");
        Ok(this)
    }

    /// Returns the normalized endpoint of this client.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Fetches summary statistics from the appliance. Each call performs a new request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the request cannot complete, and [`Error::Decode`]
    /// if the response is not a JSON object of the expected shape.
    pub async fn fetch_metrics(&self) -> Result<StatsPayload, Error> {
        self.get_json(Self::SUMMARY_QUERY).await
    }

    async fn get_json<T: DeserializeOwned>(&self, query: &str) -> Result<T, Error> {
        let uri = self.endpoint.api_uri(query)?;
        let response = self
            .http
            .get(uri.clone())
            .await
            .map_err(|err| Error::network(&uri, err))?;

        // Status codes are not checked; an error page will fail decoding.
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| Error::network(&uri, err))?
            .to_bytes();
        tracing::debug!(
            %uri,
            %status,
            body_size = body.len(),
            "Received response from Pi-hole"
        );

        decode_object(&body).map_err(|err| Error::decode(&uri, err))
    }
}
