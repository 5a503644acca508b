use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use validator::Validate;

use super::validate_price;
use crate::domain::models::order::{NewLineItem, OrderItemWithProduct, OrderWithItems};
use crate::domain::services::order_service::OrderService;
use crate::error::AppError;
use crate::server::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route(
            "/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/{id}/items", post(add_item))
        .route("/{id}/items/{item_id}", put(update_item).delete(remove_item))
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[validate(range(min = 1, message = "Product id must be positive"))]
    pub product_id: u64,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom(function = validate_price))]
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<&OrderItemRequest> for NewLineItem {
    fn from(item: &OrderItemRequest) -> Self {
        NewLineItem {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "At least one order item is required"), nested)]
    pub order_items: Vec<OrderItemRequest>,
}

/// 替换行项目允许空列表: 结果是零项零金额的订单, 不算错误
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, message = "Customer name cannot be empty"))]
    pub customer_name: Option<String>,
    pub is_paid: Option<bool>,
    #[validate(nested)]
    pub order_items: Option<Vec<OrderItemRequest>>,
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OrderWithItems>>, AppError> {
    let orders = OrderService::new(&state.db).list_orders().await?;

    Ok(Json(orders))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<OrderWithItems>, AppError> {
    let order = OrderService::new(&state.db).get_order(id).await?;

    Ok(Json(order))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderWithItems>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let items: Vec<NewLineItem> = payload.order_items.iter().map(Into::into).collect();

    let order = OrderService::new(&state.db)
        .create_order(&payload.customer_name, &items)
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

async fn update_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Json<OrderWithItems>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let items: Option<Vec<NewLineItem>> = payload
        .order_items
        .as_ref()
        .map(|items| items.iter().map(Into::into).collect());

    let order = OrderService::new(&state.db)
        .update_order(
            id,
            payload.customer_name.as_deref(),
            payload.is_paid,
            items.as_deref(),
        )
        .await?;

    Ok(Json(order))
}

async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    OrderService::new(&state.db).delete_order(id).await?;

    Ok(Json(json!({ "message": "Order deleted successfully" })))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<OrderItemRequest>,
) -> Result<(StatusCode, Json<OrderItemWithProduct>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let item = OrderService::new(&state.db)
        .add_item(id, &NewLineItem::from(&payload))
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(u64, u64)>,
    Json(payload): Json<OrderItemRequest>,
) -> Result<Json<OrderItemWithProduct>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let item = OrderService::new(&state.db)
        .update_item(id, item_id, &NewLineItem::from(&payload))
        .await?;

    Ok(Json(item))
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(u64, u64)>,
) -> Result<Json<Value>, AppError> {
    OrderService::new(&state.db).remove_item(id, item_id).await?;

    Ok(Json(json!({ "message": "Order item removed successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: u64, quantity: i32, price: &str) -> OrderItemRequest {
        OrderItemRequest {
            product_id,
            quantity,
            price: price.parse().unwrap(),
        }
    }

    #[test]
    fn valid_create_request_passes() {
        let payload = CreateOrderRequest {
            customer_name: "John Doe".to_string(),
            order_items: vec![item(1, 2, "2.50")],
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn empty_customer_name_is_rejected() {
        let payload = CreateOrderRequest {
            customer_name: String::new(),
            order_items: vec![item(1, 1, "2.50")],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn empty_item_list_is_rejected_on_create() {
        let payload = CreateOrderRequest {
            customer_name: "John Doe".to_string(),
            order_items: vec![],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let payload = CreateOrderRequest {
            customer_name: "John Doe".to_string(),
            order_items: vec![item(1, 0, "2.50")],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn nested_item_price_is_validated() {
        let payload = CreateOrderRequest {
            customer_name: "John Doe".to_string(),
            order_items: vec![item(1, 1, "0")],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn update_accepts_empty_replacement_list() {
        let payload = UpdateOrderRequest {
            customer_name: None,
            is_paid: None,
            order_items: Some(vec![]),
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn update_with_name_only_passes() {
        let payload = UpdateOrderRequest {
            customer_name: Some("Jane".to_string()),
            is_paid: Some(true),
            order_items: None,
        };
        assert!(payload.validate().is_ok());
    }
}
