use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::admission_request::AdmissionRequest;
use crate::admission_response::AdmissionResponse;
use crate::errors::{DecodeError, EncodeError};

pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub request: AdmissionRequest,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    pub fn with_api_version(api_version: String, response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            api_version: Some(api_version),
            kind: Some(ADMISSION_REVIEW_KIND.to_string()),
            response,
        }
    }
}

/// Shape of the payload sent by the caller. The reply uses the same shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Envelope {
    /// A full AdmissionReview object, `request` wrapped inside of it.
    Review { api_version: String },
    /// A bare AdmissionRequest.
    Bare,
}

/// Decode an admission payload.
///
/// Payloads with a top-level `request` key are decoded as an AdmissionReview,
/// everything else as a bare AdmissionRequest.
pub fn decode(body: &[u8]) -> Result<(AdmissionRequest, Envelope), DecodeError> {
    let value: Value = serde_json::from_slice(body).map_err(DecodeError::MalformedJson)?;

    if value.get("request").is_some() {
        let review: AdmissionReviewRequest =
            serde_json::from_value(value).map_err(DecodeError::InvalidAdmissionReview)?;
        let api_version = review
            .api_version
            .unwrap_or_else(|| ADMISSION_API_VERSION.to_string());
        return Ok((review.request, Envelope::Review { api_version }));
    }

    let request: AdmissionRequest =
        serde_json::from_value(value).map_err(DecodeError::InvalidAdmissionRequest)?;
    Ok((request, Envelope::Bare))
}

/// Reply sent back to the caller.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum AdmissionReply {
    Review(AdmissionReviewResponse),
    Bare(AdmissionResponse),
}

impl AdmissionReply {
    pub fn new(envelope: &Envelope, response: AdmissionResponse) -> Self {
        match envelope {
            Envelope::Review { api_version } => AdmissionReply::Review(
                AdmissionReviewResponse::with_api_version(api_version.clone(), response),
            ),
            Envelope::Bare => AdmissionReply::Bare(response),
        }
    }

    pub fn response(&self) -> &AdmissionResponse {
        match self {
            AdmissionReply::Review(review) => &review.response,
            AdmissionReply::Bare(response) => response,
        }
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(self).map_err(EncodeError::Response)
    }
}
