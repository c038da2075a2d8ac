use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvaluationError>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("request body is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("cannot decode AdmissionReview: {0}")]
    InvalidAdmissionReview(#[source] serde_json::Error),

    #[error("cannot decode AdmissionRequest: {0}")]
    InvalidAdmissionRequest(#[source] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("admission request does not carry an object")]
    MissingObject,

    #[error("admission request object must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Raised while looking up a policy relevant field. These errors never reach
/// the HTTP layer: they are turned into a denial by the decision engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyEvaluationError {
    #[error("field `{path}` is missing")]
    MissingField { path: String },

    #[error("field `{path}` must be {expected}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Raised while building a mutation patch. These errors never reach the HTTP
/// layer: mutation fails open.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchConstructionError {
    #[error("invalid JSON pointer `{pointer}`: {message}")]
    InvalidPointer { pointer: String, message: String },

    #[error("patch cannot be applied to the resource: {0}")]
    NotApplicable(String),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot serialize JSON patch: {0}")]
    Patch(#[source] serde_json::Error),

    #[error("cannot serialize admission response: {0}")]
    Response(#[source] serde_json::Error),
}

/// Raised while reading back the patch carried by an AdmissionResponse.
#[derive(Debug, Error)]
pub enum PatchDecodeError {
    #[error("patch is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("patch is not a JSON Patch: {0}")]
    MalformedPatch(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl EvaluationError {
    /// Errors caused by the payload sent by the caller, as opposed to faults
    /// of this server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EvaluationError::Decode(_) | EvaluationError::Conversion(_)
        )
    }
}

/// Name of the JSON type of the given value, used inside of error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
