//! Statistics payload returned by the appliance.

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Decodes a JSON object into `T`.
///
/// Derived struct decoding also accepts JSON arrays (matching elements to fields by position),
/// and the appliance answers unknown or unauthorized queries with `[]`; such bodies are rejected.
pub(crate) fn decode_object<T: DeserializeOwned>(raw: &[u8]) -> serde_json::Result<T> {
    let object: Map<String, Value> = serde_json::from_slice(raw)?;
    T::deserialize(Value::Object(object))
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Absolute and relative gravity list update time, of which only the absolute one is decoded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GravityLastUpdated {
    /// Unix timestamp of the last gravity update (in seconds).
    #[serde(deserialize_with = "null_as_default")]
    pub absolute: f64,
}

/// Summary statistics decoded from a single `summaryRaw` response.
///
/// Decoding is lenient: unknown fields are ignored, and missing or `null` fields are set
/// to their default values (zero, an empty string or an empty map).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
#[allow(missing_docs)] // field names are self-explanatory
pub struct StatsPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub domains_being_blocked: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub dns_queries_today: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub ads_blocked_today: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub ads_percentage_today: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub unique_domains: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub queries_forwarded: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub queries_cached: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub clients_ever_seen: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub unique_clients: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub dns_queries_all_types: f64,
    #[serde(rename = "reply_NODATA", deserialize_with = "null_as_default")]
    pub reply_nodata: f64,
    #[serde(rename = "reply_NXDOMAIN", deserialize_with = "null_as_default")]
    pub reply_nxdomain: f64,
    #[serde(rename = "reply_CNAME", deserialize_with = "null_as_default")]
    pub reply_cname: f64,
    #[serde(rename = "reply_IP", deserialize_with = "null_as_default")]
    pub reply_ip: f64,
    /// Blocking status; `"enabled"` if the appliance is blocking.
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gravity_last_updated: GravityLastUpdated,
    /// Most queried domains mapped to their hit count.
    #[serde(deserialize_with = "null_as_default")]
    pub top_queries: HashMap<String, f64>,
    /// Most blocked domains mapped to their hit count.
    #[serde(deserialize_with = "null_as_default")]
    pub top_ads: HashMap<String, f64>,
    /// Most active clients (`name|address` or a bare address) mapped to their request count.
    #[serde(deserialize_with = "null_as_default")]
    pub top_sources: HashMap<String, f64>,
    /// Upstream destinations (`name|address`) mapped to the share of forwarded queries.
    #[serde(deserialize_with = "null_as_default")]
    pub forward_destinations: HashMap<String, f64>,
    /// Query types (e.g., `A (IPv4)`) mapped to the share of queries.
    #[serde(rename = "querytypes", deserialize_with = "null_as_default")]
    pub query_types: HashMap<String, f64>,
}

impl StatsPayload {
    /// Checks whether the appliance reports that blocking is enabled.
    pub fn is_enabled(&self) -> bool {
        self.status == "enabled"
    }
}

/// Response to the `version` query.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VersionPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub version: i64,
}
