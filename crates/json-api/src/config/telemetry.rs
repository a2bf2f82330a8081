//! OpenTelemetry trace export settings.
//!
//! Environment variable names follow the OpenTelemetry conventions so the
//! usual collector sidecar setup works unchanged.

use std::time::Duration;

use clap::{ArgAction, Args};

#[derive(Debug, Args)]
pub struct TelemetryConfig {
    #[arg(
        long = "otel-enabled",
        env = "OTEL_ENABLED",
        action = ArgAction::Set,
        default_value_t = true
    )]
    pub enabled: bool,

    /// Continue traces from an incoming `traceparent` header.
    #[arg(
        long = "otel-parent-propagation",
        env = "OTEL_PARENT_PROPAGATION_ENABLED",
        action = ArgAction::Set,
        default_value_t = false
    )]
    pub parent_propagation: bool,

    #[arg(
        long = "otel-endpoint",
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub endpoint: String,

    #[arg(
        long = "otel-export-timeout-seconds",
        env = "OTEL_EXPORTER_OTLP_TIMEOUT_SECONDS",
        default_value_t = 3u64
    )]
    pub export_timeout_seconds: u64,

    #[arg(
        long = "otel-service-name",
        env = "OTEL_SERVICE_NAME",
        default_value = "souk-json"
    )]
    pub service_name: String,

    #[arg(
        long = "otel-service-version",
        env = "OTEL_SERVICE_VERSION",
        default_value = env!("CARGO_PKG_VERSION")
    )]
    pub service_version: String,

    #[arg(
        long = "otel-environment",
        env = "OTEL_DEPLOYMENT_ENVIRONMENT",
        default_value = "development"
    )]
    pub environment: String,

    /// Head sampling ratio; values outside `[0.0, 1.0]` are clamped.
    #[arg(
        long = "otel-sample-ratio",
        env = "OTEL_TRACE_SAMPLE_RATIO",
        default_value_t = 1.0_f64
    )]
    pub sample_ratio: f64,
}

impl TelemetryConfig {
    #[must_use]
    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_seconds)
    }

    /// Parent propagation only applies while export is on.
    #[must_use]
    pub fn propagates_parent(&self) -> bool {
        self.enabled && self.parent_propagation
    }

    #[must_use]
    pub fn clamped_sample_ratio(&self) -> f64 {
        self.sample_ratio.clamp(0.0, 1.0)
    }
}
