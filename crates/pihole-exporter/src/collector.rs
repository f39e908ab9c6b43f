//! Mapping Pi-hole statistics to metric observations.

use std::{collections::HashMap, slice};

use pihole::{Client, StatsPayload};

use crate::descriptors::{metrics, Descriptor, DESCRIPTORS};

/// Single data point for a metric produced during a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Descriptor of the observed metric.
    pub descriptor: &'static Descriptor,
    /// Label values; match [`Descriptor::labels`] by position.
    pub label_values: Vec<String>,
    /// Observed value.
    pub value: f64,
}

impl Observation {
    fn unlabeled(descriptor: &'static Descriptor, value: f64) -> Self {
        Self {
            descriptor,
            label_values: Vec::new(),
            value,
        }
    }

    fn labeled(descriptor: &'static Descriptor, label_value: &str, value: f64) -> Self {
        Self {
            descriptor,
            label_values: vec![label_value.to_owned()],
            value,
        }
    }
}

/// Collector of Pi-hole metrics.
///
/// Each [`collect()`](Self::collect()) call fetches fresh statistics from the appliance;
/// no state is carried between calls.
#[derive(Debug, Clone)]
pub struct Collector {
    client: Client,
}

impl Collector {
    /// Creates a collector fetching statistics with the specified client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns the client used by this collector.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Describes all metrics that can be produced by this collector.
    pub fn describe(&self) -> Describe {
        Describe(DESCRIPTORS.iter())
    }

    /// Fetches statistics from the appliance and maps them to observations.
    ///
    /// Errors are logged and result in no observations.
    pub async fn collect(&self) -> Vec<Observation> {
        match self.client.fetch_metrics().await {
            Ok(stats) => observe(&stats),
            Err(err) => {
                tracing::error!(
                    %err,
                    endpoint = %self.client.endpoint(),
                    "Error collecting metrics from Pi-hole"
                );
                Vec::new()
            }
        }
    }
}

/// Iterator over metric descriptors returned by [`Collector::describe()`].
#[derive(Debug, Clone)]
pub struct Describe(slice::Iter<'static, &'static Descriptor>);

impl Iterator for Describe {
    type Item = &'static Descriptor;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Describe {}

/// Maps statistics to observations of all metrics.
pub fn observe(stats: &StatsPayload) -> Vec<Observation> {
    let enabled = if stats.is_enabled() { 1.0 } else { 0.0 };
    let mut observations = vec![
        Observation::unlabeled(&metrics::ENABLED, enabled),
        Observation::unlabeled(&metrics::DOMAINS_BEING_BLOCKED, stats.domains_being_blocked),
        Observation::unlabeled(&metrics::DNS_QUERIES_TODAY, stats.dns_queries_today),
        Observation::unlabeled(&metrics::ADS_BLOCKED_TODAY, stats.ads_blocked_today),
        Observation::unlabeled(&metrics::ADS_PERCENTAGE_TODAY, stats.ads_percentage_today),
        Observation::unlabeled(
            &metrics::GRAVITY_LAST_UPDATED,
            stats.gravity_last_updated.absolute,
        ),
    ];

    observations.extend(expand(&metrics::QUERY_TYPES, &stats.query_types, query_type));
    observations.extend(expand(&metrics::TOP_QUERIES, &stats.top_queries, raw_key));
    observations.extend(expand(&metrics::TOP_ADS, &stats.top_ads, raw_key));
    observations.extend(expand(&metrics::TOP_SOURCES, &stats.top_sources, raw_key));
    observations.extend(expand(
        &metrics::FORWARD_DESTINATIONS,
        &stats.forward_destinations,
        forward_target,
    ));
    observations
}

/// Produces an observation per distinct label derived from the map keys.
///
/// Several keys may map to the same label (e.g., `A (IPv4)` and `A (x)` for query types);
/// their values are summed, so that each series is exported once.
pub fn expand<'a>(
    descriptor: &'static Descriptor,
    entries: &'a HashMap<String, f64>,
    label: fn(&str) -> &str,
) -> impl Iterator<Item = Observation> + 'a {
    let mut merged = HashMap::<&str, f64>::with_capacity(entries.len());
    for (key, &value) in entries {
        *merged.entry(label(key)).or_default() += value;
    }
    merged
        .into_iter()
        .map(move |(label, value)| Observation::labeled(descriptor, label, value))
}

fn raw_key(key: &str) -> &str {
    key
}

/// Query types are reported as e.g. `A (IPv4)`; only the first word is kept.
pub fn query_type(key: &str) -> &str {
    key.split_whitespace().next().unwrap_or_default()
}

/// Destinations are reported as `name|address`; only the last segment is kept.
pub fn forward_target(key: &str) -> &str {
    key.rsplit('|').next().unwrap_or(key)
}
