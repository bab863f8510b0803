use actix_web::{error::JsonPayloadError, HttpRequest};

use crate::core::AppError;
use crate::middleware::request_id::request_id;

/// Turn JSON body extraction failures into validation errors so malformed
/// payloads get the same 400 envelope as repository validation failures.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let id = request_id(req);
    tracing::debug!(
        request_id = id.as_deref().unwrap_or("-"),
        path = %req.path(),
        "Rejected request body: {}",
        err
    );

    let message = match &err {
        JsonPayloadError::ContentType => "Content-Type must be application/json".to_string(),
        JsonPayloadError::Deserialize(e) => format!("Invalid request body: {}", e),
        other => format!("Invalid request body: {}", other),
    };

    AppError::validation(message).into()
}
