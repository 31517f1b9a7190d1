use opentelemetry::KeyValue;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use opentelemetry_semantic_conventions::resource::SERVICE_NAME;
use tracing::{Subscriber, subscriber::set_global_default};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use crate::configuration::TelemetrySettings;

/// Bunyan JSON logs to `sink`, plus OTLP span export when an endpoint is
/// configured. The returned provider must be kept until shutdown.
pub fn get_subscriber<Sink>(
    settings: &TelemetrySettings,
    sink: Sink,
) -> anyhow::Result<(impl Subscriber + Send + Sync, Option<sdktrace::TracerProvider>)>
where
    Sink: for<'a> tracing_subscriber::fmt::MakeWriter<'a> + Sync + Send + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));

    let tracer_provider = match &settings.otlp_endpoint {
        Some(endpoint) => Some(tracer_provider(&settings.service_name, endpoint)?),
        None => None,
    };
    let telemetry_layer = tracer_provider.as_ref().map(|provider| {
        let tracer =
            opentelemetry::trace::TracerProvider::tracer(provider, settings.service_name.clone());
        tracing_opentelemetry::layer().with_tracer(tracer)
    });

    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry_layer)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(
            settings.service_name.clone(),
            sink,
        ));
    Ok((subscriber, tracer_provider))
}

fn tracer_provider(name: &str, endpoint: &str) -> anyhow::Result<sdktrace::TracerProvider> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let resource = Resource::new(vec![KeyValue::new(SERVICE_NAME, name.to_string())]);

    let provider = sdktrace::TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(resource)
        .build();
    opentelemetry::global::set_tracer_provider(provider.clone());
    Ok(provider)
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> anyhow::Result<()> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}
