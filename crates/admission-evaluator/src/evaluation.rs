use crate::admission_request::AdmissionRequest;
use crate::admission_response::AdmissionResponse;
use crate::decision::{decide, Mode};
use crate::errors::Result;
use crate::resource::ResourceView;

/// Result of a successful evaluation.
#[derive(Clone, Debug)]
pub struct Evaluation {
    pub response: AdmissionResponse,
    /// The evaluated object. Its metadata identifies the resource when the
    /// request does not.
    pub resource: ResourceView,
}

/// Run the admission policy selected by `mode` against the given request.
///
/// Policy outcomes, denials included, are reported inside of the returned
/// response. Only conversion and encoding problems are returned as errors.
pub fn evaluate(request: &AdmissionRequest, mode: Mode) -> Result<Evaluation> {
    let resource = ResourceView::from_request(request)?;
    let decision = decide(&resource, mode);
    let response = AdmissionResponse::from_decision(request.uid.clone(), decision)?;

    Ok(Evaluation { response, resource })
}
