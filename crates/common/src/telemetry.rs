//! Tracing setup for the gateway process.
//!
//! Builds the layered subscriber the gateway runs under: env-filtered
//! fmt output, plus an OTLP/gRPC span export layer driven by
//! [`TelemetryConfig`] when the `telemetry` feature is compiled in.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::TelemetryConfig;

#[cfg(feature = "telemetry")]
use {
    opentelemetry::trace::TracerProvider, opentelemetry::KeyValue,
    opentelemetry_otlp::WithExportConfig,
    opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider, opentelemetry_sdk::Resource,
    tracing_opentelemetry::OpenTelemetryLayer,
};

/// Build the gateway's subscriber from configuration without installing
/// it. `RUST_LOG` overrides the default `info` filter.
pub fn build_subscriber(
    config: &TelemetryConfig,
) -> Result<impl tracing::Subscriber + Send + Sync> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(export_layer(config)?);
    Ok(subscriber)
}

/// Install the configured subscriber globally. Called once at startup.
pub fn init(config: &TelemetryConfig) -> Result<()> {
    tracing::subscriber::set_global_default(build_subscriber(config)?)?;
    Ok(())
}

/// Span export layer for `config`. Disabled telemetry (or a build
/// without the `telemetry` feature) yields a no-op layer so the rest of
/// the stack is identical either way.
fn export_layer<S>(config: &TelemetryConfig) -> Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
{
    if !config.enabled {
        return Ok(Box::new(tracing_subscriber::layer::Identity::new()));
    }

    #[cfg(feature = "telemetry")]
    {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&config.endpoint)
            .build()?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                config.service_name.clone(),
            )]))
            .build();

        let tracer = provider.tracer(config.service_name.clone());

        // Shared globally so connector code can start spans of its own.
        opentelemetry::global::set_tracer_provider(provider);

        Ok(Box::new(OpenTelemetryLayer::new(tracer)))
    }
    #[cfg(not(feature = "telemetry"))]
    {
        tracing::warn!(
            endpoint = %config.endpoint,
            "Telemetry enabled but this build has no OTLP support; spans stay local"
        );
        Ok(Box::new(tracing_subscriber::layer::Identity::new()))
    }
}

/// Flush pending span exports before process exit.
pub fn shutdown() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    #[test]
    fn test_disabled_telemetry_builds_local_only_subscriber() {
        let subscriber = build_subscriber(&TelemetryConfig::default()).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "telemetry", "subscriber accepts events");
        });
    }

    #[test]
    fn test_subscriber_from_gateway_config() {
        let config = GatewayConfig::default();
        assert!(build_subscriber(&config.telemetry).is_ok());
    }
}
