use anyhow::Result;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::{ExportConfig, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};

mod admission_evaluations_total;
pub use admission_evaluations_total::add_admission_evaluation;
mod admission_evaluation_latency;
pub use admission_evaluation_latency::record_evaluation_latency;

const METER_NAME: &str = "admission-server";

/// Export metrics to an OpenTelemetry collector. The returned provider must
/// be shut down before exiting to flush the pending data points.
pub fn setup_metrics() -> Result<SdkMeterProvider> {
    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_export_config(ExportConfig::default())
        .build()?;

    let periodic_reader = PeriodicReader::builder(metric_exporter).build();
    let meter_provider = SdkMeterProvider::builder()
        .with_reader(periodic_reader)
        .build();

    global::set_meter_provider(meter_provider.clone());
    Ok(meter_provider)
}

pub trait AdmissionEvaluationMetric: Into<Vec<KeyValue>> {}

#[derive(Clone, Debug)]
pub(crate) struct AdmissionEvaluation {
    pub(crate) mode: String,
    pub(crate) resource_kind: String,
    pub(crate) resource_namespace: Option<String>,
    pub(crate) resource_request_operation: String,
    pub(crate) accepted: bool,
    pub(crate) mutated: bool,
    pub(crate) error_code: Option<u16>,
}

impl AdmissionEvaluationMetric for &AdmissionEvaluation {}

#[allow(clippy::from_over_into)]
impl Into<Vec<KeyValue>> for &AdmissionEvaluation {
    fn into(self) -> Vec<KeyValue> {
        let mut baggage = vec![
            KeyValue::new("mode", self.mode.clone()),
            KeyValue::new("resource_kind", self.resource_kind.clone()),
            KeyValue::new(
                "resource_request_operation",
                self.resource_request_operation.clone(),
            ),
            KeyValue::new("accepted", self.accepted),
            KeyValue::new("mutated", self.mutated),
        ];
        if let Some(resource_namespace) = &self.resource_namespace {
            baggage.push(KeyValue::new(
                "resource_namespace",
                resource_namespace.clone(),
            ));
        }
        if let Some(error_code) = self.error_code {
            baggage.push(KeyValue::new("error_code", error_code as i64));
        }
        baggage
    }
}
