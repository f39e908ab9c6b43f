//! Encoding observations in the text exposition format.

use std::fmt::{self, Write as _};

use prometheus_client::{
    collector::Collector as CollectorTrait,
    encoding::{text, DescriptorEncoder, EncodeLabelValue, EncodeMetric, LabelValueEncoder},
    metrics::{gauge::ConstGauge, MetricType},
    registry::Registry,
};

use crate::{collector::Observation, descriptors::DESCRIPTORS, Format};

/// Label value escaped according to the text exposition format. Keys reported by the appliance
/// (e.g., queried domains) are arbitrary strings, while `prometheus-client` writes label values as-is.
#[derive(Debug, Clone, Copy)]
struct EscapedLabelValue<'a>(&'a str);

impl EncodeLabelValue for EscapedLabelValue<'_> {
    fn encode(&self, encoder: &mut LabelValueEncoder<'_>) -> fmt::Result {
        for ch in self.0.chars() {
            match ch {
                '\\' => encoder.write_str(r"\\")?,
                '"' => encoder.write_str(r#"\""#)?,
                '\n' => encoder.write_str(r"\n")?,
                _ => encoder.write_char(ch)?,
            }
        }
        Ok(())
    }
}

/// Observations produced by a single scrape.
///
/// Only descriptors with at least one observation are encoded, so an empty snapshot encodes
/// to an empty exposition.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    observations: Vec<Observation>,
}

impl From<Vec<Observation>> for Snapshot {
    fn from(observations: Vec<Observation>) -> Self {
        Self { observations }
    }
}

impl Snapshot {
    /// Returns observations in this snapshot.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Renders this snapshot in the specified format.
    ///
    /// # Errors
    ///
    /// Proxies formatting errors; encoding to a string never fails in practice.
    pub fn render(self, format: Format) -> Result<String, fmt::Error> {
        let mut registry = Registry::default();
        registry.register_collector(Box::new(self));
        let mut buffer = String::with_capacity(1_024);
        text::encode(&mut buffer, &registry)?;
        Ok(format.finalize(buffer))
    }
}

impl CollectorTrait for Snapshot {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> fmt::Result {
        for &descriptor in &DESCRIPTORS {
            let mut observations = self
                .observations
                .iter()
                .filter(|observation| observation.descriptor == descriptor)
                .peekable();
            if observations.peek().is_none() {
                continue;
            }

            let full_name = descriptor.full_name();
            let mut metric_encoder =
                encoder.encode_descriptor(&full_name, descriptor.help, None, MetricType::Gauge)?;
            if descriptor.labels.is_empty() {
                // Unlabeled metrics have a single observation.
                if let Some(observation) = observations.next() {
                    ConstGauge::new(observation.value).encode(metric_encoder)?;
                }
            } else {
                for observation in observations {
                    let labels: Vec<_> = descriptor
                        .labels
                        .iter()
                        .copied()
                        .zip(
                            observation
                                .label_values
                                .iter()
                                .map(|value| EscapedLabelValue(value.as_str())),
                        )
                        .collect();
                    let family_encoder = metric_encoder.encode_family(&labels)?;
                    ConstGauge::new(observation.value).encode(family_encoder)?;
                }
            }
        }
        Ok(())
    }
}
