//! Middleware for logging requests and responses.

use axum::{extract::Request, middleware::Next, response::Response};

/// How many bytes of a body are logged at the `info` level before the rest is
/// relegated to `debug`.
const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level. If a body is
/// longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated and the full
/// body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_text = read_body_text(body).await;
    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &body_text,
    );

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_text = read_body_text(body).await;
    log_body(
        &format!("Sending response: {}", parts.status),
        &body_text,
    );

    Response::from_parts(parts, body_text.into())
}

async fn read_body_text(body: axum::body::Body) -> String {
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    String::from_utf8_lossy(&body_bytes).to_string()
}

fn log_body(prefix: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("{prefix}\nbody: {:}...", &body[..LOG_BODY_LENGTH_LIMIT]);
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{prefix}\nbody: {body:?}");
    }
}
