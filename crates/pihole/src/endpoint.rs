//! Validated appliance address.

use std::fmt;

use hyper::Uri;
use url::Url;

use crate::Error;

/// Base address of a Pi-hole appliance.
///
/// The address is normalized on parsing: user info, query and fragment are dropped, as are
/// trailing slashes in the path. The default HTTP port is omitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    const API_PATH: &'static str = "/admin/api.php";

    /// Parses and validates an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `raw` is not a URL, or its scheme is not `http`.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let url = Url::parse(raw).map_err(|err| Error::config(raw, err.to_string()))?;
        if url.scheme() != "http" {
            let reason = format!("unsupported scheme `{}`, only `http` is allowed", url.scheme());
            return Err(Error::config(raw, reason));
        }
        let host = url
            .host_str()
            .ok_or_else(|| Error::config(raw, "missing host"))?;

        let mut normalized = format!("http://{host}");
        if let Some(port) = url.port() {
            normalized.push_str(&format!(":{port}"));
        }
        normalized.push_str(url.path().trim_end_matches('/'));
        Ok(Self(normalized))
    }

    /// Returns the normalized endpoint string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI of the API script with the specified raw query.
    pub(crate) fn api_uri(&self, query: &str) -> Result<Uri, Error> {
        format!("{}{}?{query}", self.0, Self::API_PATH)
            .parse::<Uri>()
            .map_err(|err| Error::config(&self.0, err.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
