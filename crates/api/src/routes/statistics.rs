//! Dashboard and SLA escalation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use lifecycle::OrderStatistics;
use serde::Serialize;

use super::orders::AppState;

#[derive(Serialize)]
pub struct OverdueOrderResponse {
    pub id: String,
    pub state: String,
    pub priority: u8,
    pub sla_hours: u32,
    pub sla_deadline: DateTime<Utc>,
    pub hours_overdue: f64,
}

/// GET /statistics: aggregate counts, value and processing time.
#[tracing::instrument(skip(state))]
pub async fn get(State(state): State<Arc<AppState>>) -> Json<OrderStatistics> {
    Json(state.lifecycle.get_order_statistics().await)
}

/// GET /sla/overdue: open orders past their deadline, most overdue first.
#[tracing::instrument(skip(state))]
pub async fn overdue(State(state): State<Arc<AppState>>) -> Json<Vec<OverdueOrderResponse>> {
    let now = state.lifecycle.now();
    let orders = state.lifecycle.overdue_orders().await;

    let mut overdue: Vec<OverdueOrderResponse> = orders
        .iter()
        .map(|order| OverdueOrderResponse {
            id: order.id().to_string(),
            state: order.state().to_string(),
            priority: order.priority().level(),
            sla_hours: order.sla_hours(),
            sla_deadline: order.sla_deadline(),
            hours_overdue: (now - order.sla_deadline()).num_minutes() as f64 / 60.0,
        })
        .collect();
    overdue.sort_by(|a, b| b.hours_overdue.total_cmp(&a.hours_overdue));

    Json(overdue)
}
