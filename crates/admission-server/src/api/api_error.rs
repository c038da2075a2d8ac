use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
/// An error that can be returned by the API
/// and will be converted into a JSON response.
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = json!({
            "message": self.message,
            "status": self.status.as_u16(),
        });

        (self.status, axum::Json(payload)).into_response()
    }
}

/// Give a JSON body to the errors produced by the routing and timeout layers,
/// which reply with an empty one.
pub(crate) async fn error_body(response: Response) -> Response {
    match response.status() {
        status @ (StatusCode::METHOD_NOT_ALLOWED | StatusCode::REQUEST_TIMEOUT) => ApiError {
            status,
            message: status
                .canonical_reason()
                .unwrap_or_default()
                .to_owned(),
        }
        .into_response(),
        _ => response,
    }
}
