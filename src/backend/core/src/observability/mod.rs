//! Observability: tracing, metrics, and logging.

use opentelemetry_otlp::WithExportConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the observability stack.
pub fn init(service_name: &str, otlp_endpoint: Option<&str>) -> anyhow::Result<()> {
    // Set up OpenTelemetry tracing if endpoint is provided
    if let Some(endpoint) = otlp_endpoint {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(endpoint),
            )
            .with_trace_config(
                opentelemetry_sdk::trace::config()
                    .with_resource(opentelemetry_sdk::Resource::new(vec![
                        opentelemetry::KeyValue::new("service.name", service_name.to_string()),
                    ])),
            )
            .install_batch(opentelemetry_sdk::runtime::Tokio)?;

        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(telemetry_layer)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Just use local logging
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    }

    Ok(())
}

/// Shutdown OpenTelemetry.
pub fn shutdown() {
    opentelemetry::global::shutdown_tracer_provider();
}

/// Metrics registry and helpers.
pub mod metrics {
    use metrics::{counter, describe_counter};
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
    use std::sync::OnceLock;

    static PROMETHEUS: OnceLock<PrometheusHandle> = OnceLock::new();

    /// Install the Prometheus recorder and register metric descriptions.
    ///
    /// Safe to call more than once; later calls keep the first recorder.
    pub fn install_recorder() -> anyhow::Result<()> {
        if PROMETHEUS.get().is_some() {
            return Ok(());
        }

        let handle = PrometheusBuilder::new().install_recorder()?;
        let _ = PROMETHEUS.set(handle);
        register_metrics();
        Ok(())
    }

    /// Render the current metrics in Prometheus exposition format.
    pub fn render() -> String {
        PROMETHEUS.get().map(PrometheusHandle::render).unwrap_or_default()
    }

    /// Register all metric descriptions.
    pub fn register_metrics() {
        describe_counter!(
            "lattice_authz_decisions_total",
            "Authorization decisions, labelled by effect"
        );
        describe_counter!(
            "lattice_authz_forbidden_total",
            "Policy denials surfaced to clients as 403, labelled by action and subject"
        );
        describe_counter!(
            "lattice_auth_success_total",
            "Successfully validated bearer tokens"
        );
        describe_counter!(
            "lattice_auth_errors_total",
            "Rejected authentication attempts, labelled by error type"
        );
        describe_counter!("lattice_errors_total", "Errors raised, labelled by code");
    }

    /// Record a policy denial surfaced to a client as 403.
    pub fn record_forbidden(action: &str, subject: &str) {
        counter!(
            "lattice_authz_forbidden_total",
            "action" => action.to_string(),
            "subject" => subject.to_string(),
        )
        .increment(1);
    }
}
