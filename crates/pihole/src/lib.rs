//! Client for the statistics API of a [Pi-hole] appliance.
//!
//! # Overview
//!
//! - [`Client`] owns a validated [`Endpoint`]. It is created using [`Client::new()`], which checks
//!   that the appliance speaks a supported API version before returning.
//! - [`Client::fetch_metrics()`] performs a single round trip to the appliance and decodes
//!   the summary into [`StatsPayload`]. There is no caching or retrying; each call hits the network.
//! - All failures are reported as [`Error`].
//!
//! Only plain HTTP endpoints are supported.
//!
//! # Examples
//!
//! ```no_run
//! # async fn test() -> Result<(), pihole::Error> {
//! let client = pihole::Client::new("http://pi.hole").await?;
//! let stats = client.fetch_metrics().await?;
//! println!("Blocked {} ads today", stats.ads_blocked_today);
//! # Ok(())
//! # }
//! ```
//!
//! [Pi-hole]: https://pi-hole.net/

// Linter settings.
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

mod client;
mod endpoint;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod stats;

pub use crate::{
    client::{Client, SUPPORTED_API_VERSION},
    endpoint::Endpoint,
    error::Error,
    stats::{GravityLastUpdated, StatsPayload},
};
