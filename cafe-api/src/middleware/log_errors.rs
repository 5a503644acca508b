use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

// 错误日志中间件
pub async fn log_errors(request: Request, next: Next) -> Result<Response, StatusCode> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    if response.status().is_client_error() || response.status().is_server_error() {
        warn!("{} {} failed: {}", method, path, response.status());
    }

    Ok(response)
}
