use std::{sync::Arc, time::Instant};

use admission_evaluator::{
    admission_request::AdmissionRequest,
    admission_response::AdmissionResponse,
    admission_review::{self, AdmissionReply},
    errors::EvaluationError,
    evaluate,
    resource::ResourceView,
    Evaluation, Mode,
};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn, Span};

use crate::{
    api::{api_error::ApiError, state::ApiServerState},
    metrics::{self, AdmissionEvaluation},
};

#[tracing::instrument(
    name = "validation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        mode=%Mode::Validate,
        operation=tracing::field::Empty,
        kind=tracing::field::Empty,
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_code=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Decide whether the resource can be admitted unchanged.
pub(crate) async fn validate_handler(
    State(state): State<Arc<ApiServerState>>,
    payload: Result<Bytes, BytesRejection>,
) -> Result<Response, (StatusCode, ApiError)> {
    evaluate_payload(&state, payload, Mode::Validate)
}

#[tracing::instrument(
    name = "mutation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        mode=%Mode::Mutate,
        operation=tracing::field::Empty,
        kind=tracing::field::Empty,
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_code=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Compute the patch to apply to the resource before it is persisted.
pub(crate) async fn mutate_handler(
    State(state): State<Arc<ApiServerState>>,
    payload: Result<Bytes, BytesRejection>,
) -> Result<Response, (StatusCode, ApiError)> {
    evaluate_payload(&state, payload, Mode::Mutate)
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

// The whole evaluation runs inside of the request future: when the request
// deadline fires the future is dropped and nothing keeps running.
fn evaluate_payload(
    state: &ApiServerState,
    payload: Result<Bytes, BytesRejection>,
    mode: Mode,
) -> Result<Response, (StatusCode, ApiError)> {
    let start_time = Instant::now();
    let payload = payload.map_err(handle_body_rejection)?;

    let (request, envelope) =
        admission_review::decode(&payload).map_err(|e| handle_evaluation_error(e.into()))?;

    let outcome = evaluate(&request, mode).and_then(|Evaluation { response, resource }| {
        let reply = AdmissionReply::new(&envelope, response);
        let body = reply.to_vec()?;
        Ok((resource, reply, body))
    });

    let identity = ResourceIdentity::new(
        &request,
        outcome.as_ref().ok().map(|(resource, _, _)| resource),
    );
    populate_span_with_admission_request_data(&request, &identity);

    if state.metrics_enabled {
        let admission_evaluation = admission_evaluation(
            mode,
            &request,
            &identity,
            outcome.as_ref().map(|(_, reply, _)| reply.response()),
        );
        metrics::record_evaluation_latency(start_time.elapsed(), &admission_evaluation);
        metrics::add_admission_evaluation(&admission_evaluation);
    }

    let (_, reply, body) = outcome.map_err(handle_evaluation_error)?;
    populate_span_with_evaluation_results(reply.response());
    debug!(response =? reply.response(), "admission request evaluated");

    Ok((
        [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
        body,
    )
        .into_response())
}

/// Kind, name and namespace of the resource under review.
///
/// Trimmed down requests don't carry them, in that case they are taken from
/// the evaluated object.
#[derive(Debug, PartialEq, Eq)]
struct ResourceIdentity<'a> {
    kind: &'a str,
    name: &'a str,
    namespace: Option<&'a str>,
}

impl<'a> ResourceIdentity<'a> {
    fn new(request: &'a AdmissionRequest, resource: Option<&'a ResourceView>) -> Self {
        let kind = match request.kind_name() {
            "" => resource
                .and_then(ResourceView::type_meta)
                .map(|type_meta| type_meta.kind.as_str())
                .unwrap_or_default(),
            kind => kind,
        };
        let name = request
            .name
            .as_deref()
            .or_else(|| resource.and_then(ResourceView::name))
            .unwrap_or_default();
        let namespace = request
            .namespace
            .as_deref()
            .or_else(|| resource.and_then(ResourceView::namespace));

        ResourceIdentity {
            kind,
            name,
            namespace,
        }
    }
}

fn populate_span_with_admission_request_data(
    adm_req: &AdmissionRequest,
    identity: &ResourceIdentity,
) {
    Span::current().record("request_uid", adm_req.uid.as_str());
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("kind", identity.kind);
    Span::current().record("name", identity.name);
    Span::current().record("namespace", identity.namespace.unwrap_or_default());
}

fn populate_span_with_evaluation_results(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    Span::current().record("mutated", response.patch.is_some());
    if let Some(status) = &response.status {
        if let Some(code) = &status.code {
            Span::current().record("response_code", code);
        }
        if let Some(message) = &status.message {
            Span::current().record("response_message", message.as_str());
        }
    }
}

fn admission_evaluation(
    mode: Mode,
    request: &AdmissionRequest,
    identity: &ResourceIdentity,
    outcome: Result<&AdmissionResponse, &EvaluationError>,
) -> AdmissionEvaluation {
    let (accepted, mutated, error_code) = match outcome {
        Ok(response) => (
            response.allowed,
            response.patch.is_some(),
            response.status.as_ref().and_then(|status| status.code),
        ),
        Err(error) => (false, false, Some(evaluation_error_status(error).as_u16())),
    };

    AdmissionEvaluation {
        mode: mode.to_string(),
        resource_kind: identity.kind.to_owned(),
        resource_namespace: identity.namespace.map(str::to_owned),
        resource_request_operation: request.operation.clone(),
        accepted,
        mutated,
        error_code,
    }
}

fn evaluation_error_status(error: &EvaluationError) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn handle_evaluation_error(error: EvaluationError) -> (StatusCode, ApiError) {
    let status = evaluation_error_status(&error);
    let message = if error.is_client_error() {
        warn!(%error, "rejecting admission payload");
        error.to_string()
    } else {
        error!(%error, "cannot build admission response");
        "Something went wrong".to_owned()
    };

    (status, ApiError { status, message })
}

fn handle_body_rejection(rejection: BytesRejection) -> (StatusCode, ApiError) {
    let error = ApiError::from(rejection);
    warn!(
        status = error.status.as_u16(),
        error = error.message.as_str(),
        "cannot read request body"
    );

    (error.status, error)
}
