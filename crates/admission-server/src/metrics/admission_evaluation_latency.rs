use lazy_static::lazy_static;
use opentelemetry::{metrics::Histogram, KeyValue};
use std::convert::TryFrom;
use std::time::Duration;

use super::AdmissionEvaluationMetric;

lazy_static! {
    static ref ADMISSION_EVALUATION_LATENCY: Histogram<u64> =
        opentelemetry::global::meter(super::METER_NAME)
            .u64_histogram("admission_evaluation_latency_milliseconds")
            .build();
}

pub fn record_evaluation_latency(
    latency: Duration,
    admission_evaluation: impl AdmissionEvaluationMetric,
) {
    let millis_latency = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
    ADMISSION_EVALUATION_LATENCY.record(
        millis_latency,
        &Into::<Vec<KeyValue>>::into(admission_evaluation),
    );
}
