/**
 * Error Conversion
 *
 * `BackendError` renders as a JSON body so handlers can return it directly:
 * ```json
 * {
 *   "error": "chat room not found: 6f1c...",
 *   "status": 404
 * }
 * ```
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("[HTTP] {} - {}", status, message);
        } else {
            tracing::debug!("[HTTP] {} - {}", status, message);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
