//! Prometheus exporter for [Pi-hole] statistics.
//!
//! # Overview
//!
//! - [`Collector`] wraps a [`pihole::Client`]. [`Collector::describe()`] lists the static set
//!   of exported metrics ([`DESCRIPTORS`]); [`Collector::collect()`] fetches fresh statistics
//!   and maps them to [`Observation`]s. Fetch errors are logged and produce no observations.
//! - [`Snapshot`] encodes observations of a single scrape in a text exposition [`Format`]
//!   using `prometheus-client`.
//! - [`MetricsExporter`] serves the encoded metrics over HTTP, collecting them anew on each scrape.
//!
//! All metrics are gauges prefixed with `pihole_`. Values are passed through from the appliance
//! without changes.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use pihole_exporter::{Collector, MetricsExporter};
//!
//! # async fn test() -> anyhow::Result<()> {
//! let client = pihole::Client::new("http://pi.hole").await?;
//! let collector = Arc::new(Collector::new(client));
//! MetricsExporter::new(collector)
//!     .start(([0, 0, 0, 0], 9311).into())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! [Pi-hole]: https://pi-hole.net/

// Linter settings.
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

pub mod collector;
pub mod descriptors;
mod exporter;
mod format;
mod snapshot;

pub use crate::{
    collector::{expand, observe, Collector, Describe, Observation},
    descriptors::{Descriptor, DESCRIPTORS},
    exporter::{MetricsExporter, MetricsServer},
    format::{Format, ParseFormatError},
    snapshot::Snapshot,
};
