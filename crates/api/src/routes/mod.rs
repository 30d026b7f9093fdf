//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod statistics;

use std::str::FromStr;

use common::OrderId;
use domain::OrderState;

use crate::error::ApiError;

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}

fn parse_state(name: &str) -> Result<OrderState, ApiError> {
    OrderState::from_str(name).map_err(|e| ApiError::BadRequest(e.to_string()))
}
