use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::app_state::AppState;
use crate::models::order::Order;
use crate::services::orders::OrderServiceError;

/// JSON error body shared by every failing lookup response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// GET /order/{order_uid}: full order record by UID.
pub async fn get_order_by_uid(
    State(state): State<AppState>,
    order_uid: Result<Path<String>, PathRejection>,
) -> Result<Json<Arc<Order>>, ApiError> {
    let order_uid = match order_uid {
        Ok(Path(order_uid)) => order_uid,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unusable order_uid path parameter");
            return Err(api_error(StatusCode::BAD_REQUEST, "order_uid is required"));
        }
    };

    if order_uid.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "order_uid is required"));
    }

    match state.orders.get_order_by_uid(&order_uid).await {
        Ok(order) => Ok(Json(order)),
        Err(OrderServiceError::NotFound) => {
            Err(api_error(StatusCode::NOT_FOUND, "Order not found"))
        }
        Err(e) => {
            tracing::error!(order_uid = %order_uid, error = %e, "Failed to get order");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ))
        }
    }
}

/// GET /order/: lookup without an identifier.
pub async fn missing_order_uid() -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "order_uid is required")
}
