use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coordination::idempotency::CachedResponse;
use crate::engine::orchestrator;
use crate::engine::transition::Action;
use crate::error::AppError;
use crate::models::leg::Leg;
use crate::models::order::Order;
use crate::state::AppState;
use crate::storage::StorageError;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/start", post(start_leg))
        .route("/orders/:id/finish", post(finish_leg))
}

#[derive(Deserialize)]
pub struct StartLegRequest {
    pub rider_id: Uuid,
    pub dedup_key: String,
}

#[derive(Deserialize)]
pub struct FinishLegRequest {
    pub rider_id: Uuid,
    pub is_final_delivery: bool,
    pub dedup_key: String,
}

#[derive(Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub legs: Vec<Leg>,
}

async fn create_order(State(state): State<Arc<AppState>>) -> Result<Json<Order>, AppError> {
    let order = orchestrator::create_order(&state).await?;
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    let record = state.store.load(id).await.map_err(|err| match err {
        StorageError::NotFound => AppError::NotFound(format!("order {id} not found")),
        other => AppError::Internal(format!("order load failed: {other}")),
    })?;

    Ok(Json(OrderDetail {
        order: record.order,
        legs: record.legs,
    }))
}

async fn start_leg(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StartLegRequest>,
) -> Result<Response, AppError> {
    require_dedup_key(&payload.dedup_key)?;

    let outcome = orchestrator::execute_handoff(
        &state,
        id,
        payload.rider_id,
        Action::Start,
        &payload.dedup_key,
    )
    .await?;

    Ok(handoff_response(outcome))
}

async fn finish_leg(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FinishLegRequest>,
) -> Result<Response, AppError> {
    require_dedup_key(&payload.dedup_key)?;

    let outcome = orchestrator::execute_handoff(
        &state,
        id,
        payload.rider_id,
        Action::Finish {
            is_final: payload.is_final_delivery,
        },
        &payload.dedup_key,
    )
    .await?;

    Ok(handoff_response(outcome))
}

fn require_dedup_key(dedup_key: &str) -> Result<(), AppError> {
    if dedup_key.trim().is_empty() {
        return Err(AppError::BadRequest("dedup_key cannot be empty".to_string()));
    }
    Ok(())
}

// Replays reproduce the original status and body verbatim.
fn handoff_response(outcome: CachedResponse) -> Response {
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::OK);
    (status, Json(outcome.body)).into_response()
}
