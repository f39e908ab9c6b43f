//! Descriptors of all exported metrics.

/// Prefix prepended to all metric names.
pub const NAMESPACE: &str = "pihole";

/// Descriptor of a single exported metric. All metrics are gauges.
#[derive(Debug, PartialEq, Eq)]
pub struct Descriptor {
    /// Name of the metric **excluding** the namespace prefix.
    pub name: &'static str,
    /// Help for the metric exported to Prometheus.
    pub help: &'static str,
    /// Names of labels attached to each observation of this metric.
    pub labels: &'static [&'static str],
}

impl Descriptor {
    const fn new(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self { name, help, labels }
    }

    /// Returns the full metric name, e.g. `pihole_enabled`.
    pub fn full_name(&self) -> String {
        format!("{NAMESPACE}_{}", self.name)
    }
}

/// Individual metric descriptors.
#[allow(missing_docs)]
pub mod metrics {
    use super::Descriptor;

    pub static DOMAINS_BEING_BLOCKED: Descriptor =
        Descriptor::new("domains_being_blocked", "Domains being blocked.", &[]);
    pub static DNS_QUERIES_TODAY: Descriptor =
        Descriptor::new("dns_queries_today", "DNS Queries today.", &[]);
    pub static ADS_BLOCKED_TODAY: Descriptor =
        Descriptor::new("ads_blocked_today", "Ads blocked today.", &[]);
    pub static ADS_PERCENTAGE_TODAY: Descriptor =
        Descriptor::new("ads_percentage_today", "Ads percentage today.", &[]);
    pub static TOP_QUERIES: Descriptor = Descriptor::new("top_queries", "Top queries.", &["domain"]);
    pub static TOP_ADS: Descriptor = Descriptor::new("top_ads", "Top Ads.", &["domain"]);
    pub static TOP_SOURCES: Descriptor = Descriptor::new("top_sources", "Top sources.", &["client"]);
    pub static QUERY_TYPES: Descriptor =
        Descriptor::new("query_types", "DNS Query types.", &["type"]);
    pub static FORWARD_DESTINATIONS: Descriptor = Descriptor::new(
        "forward_destinations",
        "DNS Query forward destinations.",
        &["target"],
    );
    pub static GRAVITY_LAST_UPDATED: Descriptor = Descriptor::new(
        "gravity_last_updated",
        "Timestamp of last Gravity update.",
        &[],
    );
    pub static ENABLED: Descriptor =
        Descriptor::new("enabled", "Whether Pi-hole is enabled or not.", &[]);
}

/// All exported metrics in the order they are described and encoded.
pub static DESCRIPTORS: [&Descriptor; 11] = [
    &metrics::DOMAINS_BEING_BLOCKED,
    &metrics::DNS_QUERIES_TODAY,
    &metrics::ADS_BLOCKED_TODAY,
    &metrics::ADS_PERCENTAGE_TODAY,
    &metrics::TOP_QUERIES,
    &metrics::TOP_ADS,
    &metrics::TOP_SOURCES,
    &metrics::QUERY_TYPES,
    &metrics::FORWARD_DESTINATIONS,
    &metrics::GRAVITY_LAST_UPDATED,
    &metrics::ENABLED,
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn descriptor_table_is_consistent() {
        let names: HashSet<_> = DESCRIPTORS.iter().map(|descriptor| descriptor.name).collect();
        assert_eq!(names.len(), DESCRIPTORS.len());

        for descriptor in DESCRIPTORS {
            assert!(!descriptor.help.is_empty(), "{descriptor:?}");
            assert!(descriptor.labels.len() <= 1, "{descriptor:?}");
            assert!(descriptor.full_name().starts_with("pihole_"));
        }
        assert_eq!(metrics::TOP_SOURCES.full_name(), "pihole_top_sources");
        assert_eq!(metrics::QUERY_TYPES.labels, ["type"]);
    }
}
