//! Supported metrics encoding formats.

use std::str::FromStr;

/// Metrics export format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Format {
    /// [OpenMetrics text format][om] as produced by [`prometheus-client`].
    ///
    /// [om]: https://github.com/OpenObservability/OpenMetrics/blob/main/specification/OpenMetrics.md
    /// [`prometheus-client`]: https://docs.rs/prometheus-client/
    OpenMetrics,
    /// [Prometheus text format][prom]. Since only gauges are exported, it's obtained from
    /// the OpenMetrics output by removing the `# EOF` terminator.
    ///
    /// [prom]: https://prometheus.io/docs/instrumenting/exposition_formats/
    #[default]
    Prometheus,
}

impl Format {
    /// Content type for OpenMetrics text format.
    pub const OPEN_METRICS_CONTENT_TYPE: &'static str =
        "application/openmetrics-text; version=1.0.0; charset=utf-8";
    /// Content type for Prometheus text format.
    pub const PROMETHEUS_CONTENT_TYPE: &'static str = "text/plain; version=0.0.4; charset=utf-8";

    const EOF_TERMINATOR: &'static str = "# EOF\n";

    /// Returns the HTTP content type for this format.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::OpenMetrics => Self::OPEN_METRICS_CONTENT_TYPE,
            Self::Prometheus => Self::PROMETHEUS_CONTENT_TYPE,
        }
    }

    /// Converts text produced by `prometheus-client` into this format.
    pub(crate) fn finalize(self, mut buffer: String) -> String {
        if matches!(self, Self::Prometheus) && buffer.ends_with(Self::EOF_TERMINATOR) {
            // Prometheus format doesn't specify the termination sequence, so we skip it.
            buffer.truncate(buffer.len() - Self::EOF_TERMINATOR.len());
        }
        buffer
    }
}

/// Error parsing a [`Format`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFormatError(String);

impl std::fmt::Display for ParseFormatError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "unknown format `{}`, expected `prometheus` or `open-metrics`",
            self.0
        )
    }
}

impl std::error::Error for ParseFormatError {}

impl FromStr for Format {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prometheus" => Ok(Self::Prometheus),
            "open-metrics" | "openmetrics" => Ok(Self::OpenMetrics),
            _ => Err(ParseFormatError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalizing_output() {
        let input = "\
            # HELP pihole_enabled Whether Pi-hole is enabled or not.\n\
            # TYPE pihole_enabled gauge\n\
            pihole_enabled 1.0\n\
            # EOF\n";

        let output = Format::OpenMetrics.finalize(input.to_owned());
        assert_eq!(output, input);

        let output = Format::Prometheus.finalize(input.to_owned());
        assert!(input.starts_with(&output));
        assert_eq!(output.lines().last(), Some("pihole_enabled 1.0"));

        assert_eq!(Format::Prometheus.finalize("# EOF\n".to_owned()), "");
    }

    #[test]
    fn parsing_format() {
        assert_eq!("prometheus".parse::<Format>().unwrap(), Format::Prometheus);
        assert_eq!("open-metrics".parse::<Format>().unwrap(), Format::OpenMetrics);
        let err = "json".parse::<Format>().unwrap_err();
        assert!(err.to_string().contains("`json`"), "{err}");
    }
}
