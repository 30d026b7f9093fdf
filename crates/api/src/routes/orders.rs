//! Order creation, lookup and transition endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{
    CreateOrder, Metadata, Money, Order, OrderItem, Priority, TransitionOrder, TransitionRecord,
};
use lifecycle::OrderLifecycle;
use serde::{Deserialize, Serialize};

use super::{parse_order_id, parse_state};
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub lifecycle: OrderLifecycle,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_email: String,
    #[serde(default)]
    pub customer_name: String,
    pub items: Vec<OrderItemRequest>,
    pub priority: u8,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub sku: String,
    #[serde(default)]
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub target_state: String,
    pub agent: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub state: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_email: String,
    pub customer_name: String,
    pub state: String,
    pub priority: u8,
    pub sla_hours: u32,
    pub sla_deadline: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub history_length: usize,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub sku: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub order_id: String,
    pub state: String,
    pub history: Vec<TransitionRecord>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            customer_email: order.customer_email().to_string(),
            customer_name: order.customer_name().to_string(),
            state: order.state().to_string(),
            priority: order.priority().level(),
            sla_hours: order.sla_hours(),
            sla_deadline: order.sla_deadline(),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    sku: item.sku().to_string(),
                    description: item.description().to_string(),
                    quantity: item.quantity(),
                    unit_price_cents: item.unit_price().cents(),
                    line_total_cents: item.line_total().cents(),
                })
                .collect(),
            total_cents: order.total_amount().cents(),
            metadata: order.metadata().clone(),
            created_at: order.created_at(),
            updated_at: order
                .last_transition()
                .map_or(order.created_at(), TransitionRecord::timestamp),
            history_length: order.history().len(),
        }
    }
}

// -- Handlers --

/// POST /orders: create a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let items = req
        .items
        .into_iter()
        .map(|item| {
            OrderItem::new(
                item.sku,
                item.description,
                item.quantity,
                Money::from_cents(item.unit_price_cents),
            )
        })
        .collect();

    let cmd = CreateOrder::new(
        req.customer_email,
        req.customer_name,
        items,
        Priority::new(req.priority),
    )
    .with_metadata(req.metadata);

    let order = state.lifecycle.create_order(cmd).await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders: list orders, optionally filtered by `?state=`.
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = match query.state.as_deref() {
        Some(name) => state.lifecycle.orders_in_state(parse_state(name)?).await,
        None => state.lifecycle.list_orders().await,
    };

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}: load one order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.lifecycle.get_order(order_id).await?;

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/{id}/history: full audit trail, oldest first.
#[tracing::instrument(skip(state))]
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.lifecycle.get_order(order_id).await?;

    Ok(Json(HistoryResponse {
        order_id: order.id().to_string(),
        state: order.state().to_string(),
        history: order.history().to_vec(),
    }))
}

/// POST /orders/{id}/transitions: move an order to a new state.
#[tracing::instrument(skip(state, req))]
pub async fn transition(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let target = parse_state(&req.target_state)?;

    let cmd = TransitionOrder::new(order_id, target, req.agent, req.reason)
        .with_metadata(req.metadata);
    let order = state.lifecycle.transition_order(cmd).await?;

    Ok(Json(OrderResponse::from(&order)))
}
