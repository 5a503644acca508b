use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use validator::Validate;

use super::validate_price;
use crate::domain::models::product::Product;
use crate::domain::services::catalog_service::CatalogService;
use crate::error::AppError;
use crate::server::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = validate_price))]
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(custom(function = validate_price))]
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteProductParams {
    /// soft=true 走下架而不是硬删除
    pub soft: Option<bool>,
}

async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = CatalogService::new(&state.db).list_active_products().await?;

    Ok(Json(products))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Product>, AppError> {
    let product = CatalogService::new(&state.db).get_product(id).await?;

    Ok(Json(product))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let product = CatalogService::new(&state.db)
        .create_product(
            &payload.name,
            payload.price,
            &payload.category,
            &payload.description,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let product = CatalogService::new(&state.db)
        .update_product(
            id,
            payload.name,
            payload.price,
            payload.category,
            payload.description,
            payload.is_active,
        )
        .await?;

    Ok(Json(product))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(params): Query<DeleteProductParams>,
) -> Result<Json<Value>, AppError> {
    let service = CatalogService::new(&state.db);

    if params.soft.unwrap_or(false) {
        let product = service.deactivate_product(id).await?;
        Ok(Json(json!({
            "message": "Product deleted successfully",
            "product": product,
        })))
    } else {
        service.delete_product_hard(id).await?;
        Ok(Json(json!({ "message": "Product deleted successfully" })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateProductRequest {
        CreateProductRequest {
            name: "Espresso".to_string(),
            price: "2.50".parse().unwrap(),
            category: "Coffee".to_string(),
            description: "Strong black coffee shot".to_string(),
        }
    }

    #[test]
    fn valid_create_request_passes() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut payload = valid_create();
        payload.name = String::new();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut payload = valid_create();
        payload.price = Decimal::ZERO;
        assert!(payload.validate().is_err());

        payload.price = "-1".parse().unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn partial_update_with_no_fields_passes() {
        let payload = UpdateProductRequest {
            name: None,
            price: None,
            category: None,
            description: None,
            is_active: None,
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn update_cannot_empty_required_text() {
        let payload = UpdateProductRequest {
            name: Some(String::new()),
            price: None,
            category: None,
            description: None,
            is_active: None,
        };
        assert!(payload.validate().is_err());
    }
}
