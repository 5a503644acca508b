use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::services::dashboard_service::{
    DashboardService, DashboardStats, RevenuePeriod, RevenueReport,
};
use crate::error::AppError;
use crate::server::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(dashboard_stats))
        .route("/revenue", get(revenue))
}

#[derive(Debug, Deserialize)]
pub struct RevenueParams {
    pub period: Option<String>,
}

async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = DashboardService::new(&state.db).dashboard_stats().await?;

    Ok(Json(stats))
}

async fn revenue(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RevenueParams>,
) -> Result<Json<RevenueReport>, AppError> {
    let period = params
        .period
        .as_deref()
        .map(RevenuePeriod::parse)
        .unwrap_or_default();

    let report = DashboardService::new(&state.db)
        .revenue_for_period(period)
        .await?;

    Ok(Json(report))
}
