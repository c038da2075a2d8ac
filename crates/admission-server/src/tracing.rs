use anyhow::{anyhow, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config;

// Setup the tracing system. This MUST be done inside of a tokio Runtime
// because some collectors rely on it and would panic otherwise.
//
// When the `otlp` format is selected the tracer provider is returned, it must
// be shut down before exiting to flush the pending spans.
pub fn setup_tracing(
    log_level: &str,
    log_fmt: &str,
    log_no_color: bool,
) -> Result<Option<SdkTracerProvider>> {
    // some of our dependencies generate trace events too, but we don't care about them ->
    // let's filter them
    let filter_layer = EnvFilter::new(log_level)
        .add_directive("h2=off".parse()?)
        .add_directive("hyper=off".parse()?)
        .add_directive("hyper_util=off".parse()?)
        .add_directive("rustls=off".parse()?)
        .add_directive("tonic=off".parse()?)
        .add_directive("tower=off".parse()?);

    let tracer_provider = match log_fmt {
        "json" => {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().json())
                .init();
            None
        }
        "text" => {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().with_ansi(!log_no_color))
                .init();
            None
        }
        "otlp" => {
            // Send spans to an OpenTelemetry collector using OTLP over gRPC.
            // The collector endpoint is taken from the standard OTEL_EXPORTER_OTLP_*
            // environment variables, localhost by default (eg: a sidecar inside of k8s)
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .build()?;
            let provider = SdkTracerProvider::builder()
                .with_batch_exporter(exporter)
                .with_resource(
                    Resource::builder()
                        .with_service_name(config::SERVICE_NAME)
                        .build(),
                )
                .build();
            let tracer = provider.tracer(config::SERVICE_NAME);
            opentelemetry::global::set_tracer_provider(provider.clone());

            let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(telemetry)
                .with(fmt::layer().with_ansi(!log_no_color))
                .init();
            Some(provider)
        }
        _ => return Err(anyhow!("Unknown log message format")),
    };

    Ok(tracer_provider)
}
