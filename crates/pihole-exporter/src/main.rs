//! Prometheus exporter for Pi-hole statistics.
//!
//! # Usage
//!
//! ```text
//! pihole-exporter --pihole http://192.168.1.2 --listen-address 0.0.0.0:9311
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::sync::watch;

use pihole_exporter::{Collector, Format, MetricsExporter};

#[derive(Debug, Parser)]
#[command(name = "pihole-exporter", version, about = "Prometheus exporter for Pi-hole")]
struct Cli {
    /// Pi-hole endpoint; only plain HTTP is supported.
    #[arg(long, env = "PIHOLE_ENDPOINT", default_value = "http://pi.hole")]
    pihole: String,

    /// Address to serve metrics on.
    #[arg(
        long,
        env = "PIHOLE_EXPORTER_LISTEN_ADDRESS",
        default_value = "0.0.0.0:9311"
    )]
    listen_address: SocketAddr,

    /// Path under which metrics are exposed.
    #[arg(
        long,
        env = "PIHOLE_EXPORTER_TELEMETRY_PATH",
        default_value = MetricsExporter::DEFAULT_TELEMETRY_PATH
    )]
    telemetry_path: String,

    /// Exposition format: `prometheus` or `open-metrics`.
    #[arg(long, env = "PIHOLE_EXPORTER_FORMAT", default_value = "prometheus")]
    format: Format,
}

impl Cli {
    fn validate(&self) -> anyhow::Result<()> {
        if !self.telemetry_path.starts_with('/') {
            anyhow::bail!("Telemetry path `{}` must start with `/`", self.telemetry_path);
        }
        Ok(())
    }

    /// Connects to the appliance; fails if it's unreachable or speaks an unsupported API version.
    async fn create_collector(&self) -> anyhow::Result<Collector> {
        let client = pihole::Client::new(&self.pihole)
            .await
            .with_context(|| format!("Cannot connect to Pi-hole at `{}`", self.pihole))?;
        Ok(Collector::new(client))
    }

    async fn run(self) -> anyhow::Result<()> {
        self.validate()?;
        let collector = Arc::new(self.create_collector().await?);

        let (stop_sender, mut stop_receiver) = watch::channel(());
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            stop_sender.send_replace(());
        });

        MetricsExporter::new(collector)
            .with_format(self.format)
            .with_telemetry_path(self.telemetry_path)
            .with_graceful_shutdown(async move {
                stop_receiver.changed().await.ok();
            })
            .start(self.listen_address)
            .await
            .with_context(|| format!("Failed running exporter on `{}`", self.listen_address))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    Cli::parse().run().await
}

#[cfg(test)]
mod tests {
    use pihole::mock::MockAppliance;

    use super::*;

    #[test]
    fn parsing_cli_args() {
        let cli = Cli::try_parse_from([
            "pihole-exporter",
            "--pihole",
            "http://192.168.1.2",
            "--listen-address",
            "127.0.0.1:9000",
            "--telemetry-path",
            "/probe",
            "--format",
            "open-metrics",
        ])
        .unwrap();

        assert_eq!(cli.pihole, "http://192.168.1.2");
        assert_eq!(cli.listen_address, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cli.telemetry_path, "/probe");
        assert_eq!(cli.format, Format::OpenMetrics);
        cli.validate().unwrap();
    }

    #[test]
    fn rejecting_invalid_cli_args() {
        let err = Cli::try_parse_from(["pihole-exporter", "--format", "xml"]).unwrap_err();
        assert!(err.to_string().contains("unknown format `xml`"), "{err}");

        let err = Cli::try_parse_from(["pihole-exporter", "--listen-address", "localhost"])
            .unwrap_err();
        assert!(err.to_string().contains("--listen-address"), "{err}");

        let cli = Cli::try_parse_from(["pihole-exporter", "--telemetry-path", "metrics"]).unwrap();
        let err = cli.validate().unwrap_err();
        assert!(err.to_string().contains("must start with `/`"), "{err}");
    }

    #[tokio::test]
    async fn startup_fails_for_unusable_appliance() {
        let appliance =
            MockAppliance::with_version(r#"{"version":2}"#, pihole::mock::STATS_RESPONSE).await;
        let endpoint = appliance.endpoint();
        let cli = Cli::try_parse_from(["pihole-exporter", "--pihole", &endpoint]).unwrap();
        let err = cli.create_collector().await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Cannot connect to Pi-hole"), "{message}");
        assert!(message.contains("version"), "{message}");

        let cli = Cli::try_parse_from(["pihole-exporter", "--pihole", "https://pi.hole"]).unwrap();
        let err = cli.create_collector().await.unwrap_err();
        let root_cause = err.root_cause().downcast_ref::<pihole::Error>();
        assert!(
            matches!(root_cause, Some(pihole::Error::Config { .. })),
            "{err:#}"
        );
        assert_eq!(appliance.stats_requests(), 0);
    }
}
