use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::decision::Decision;
use crate::errors::{EncodeError, PatchDecodeError};

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/kubernetes/pkg/apis/admission#AdmissionResponse
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// Copied over from the corresponding AdmissionRequest.
    pub uid: String,

    pub allowed: bool,

    /// Set only when `patch` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,

    /// Base64 encoding of the serialized JSON Patch (RFC 6902).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    /// Why the request was denied, or why an allowed request could not be
    /// mutated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,

    /// Key/value pairs added to the audit log of the request. The admission
    /// policies never set them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_annotations: Option<HashMap<String, String>>,

    /// Warning messages returned to the requesting API client. The admission
    /// policies never set them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    #[default]
    JSONPatch,
}

/// Values that Status.Status of an AdmissionResponse can have
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum AdmissionResponseStatusValue {
    Success,
    Failure,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct AdmissionResponseStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatusValue>,

    /// A human-readable description of the status of this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// A machine-readable description of why this operation is in the
    /// "Failure" status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StatusReason>,

    /// Suggested HTTP return code for this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

/// Subset of the Kubernetes StatusReason values produced by the admission
/// policies.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum StatusReason {
    /// Status code 403.
    Forbidden,

    /// The object does not have the shape expected by the policy.
    /// Status code 422.
    Invalid,

    /// Status code 500.
    InternalError,
}

impl AdmissionResponse {
    /// Build the response to the request identified by `uid`.
    ///
    /// The patch carried by the decision is serialized and base64 encoded, a
    /// response never has a `patchType` without a `patch`.
    pub fn from_decision(uid: String, decision: Decision) -> Result<AdmissionResponse, EncodeError> {
        let patch = decision
            .patch()
            .map(|patch| {
                serde_json::to_string(patch)
                    .map(|s| general_purpose::STANDARD.encode(s))
                    .map_err(EncodeError::Patch)
            })
            .transpose()?;
        let patch_type = patch.as_ref().and(decision.patch_type());

        Ok(AdmissionResponse {
            uid,
            allowed: decision.allowed,
            patch_type,
            patch,
            status: decision.result,
            ..Default::default()
        })
    }

    /// Decode the patch, `None` when the response carries no patch.
    pub fn decoded_patch(&self) -> Option<Result<json_patch::Patch, PatchDecodeError>> {
        self.patch.as_ref().map(|encoded| {
            let raw = general_purpose::STANDARD.decode(encoded)?;
            Ok(serde_json::from_slice(&raw)?)
        })
    }
}
