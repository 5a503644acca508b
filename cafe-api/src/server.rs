use axum::{Json, Router, extract::State, middleware, routing::get};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::api::{dashboard, orders, products};
use crate::config::Config;
use crate::middleware::log_errors::log_errors;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: sqlx::MySqlPool,
}

pub fn create_app(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    let app_state = Arc::new(state);

    // JSON API 路由
    let api_routes = Router::new()
        .nest("/products", products::routes())
        .nest("/orders", orders::routes())
        .nest("/dashboard", dashboard::routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health))
        // 页面是纯前端渲染, 只消费上面的 JSON API
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn(log_errors))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.config.server.environment,
    }))
}
