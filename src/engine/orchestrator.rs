use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::coordination::idempotency::CachedResponse;
use crate::coordination::lock::LockError;
use crate::engine::ledger;
use crate::engine::transition::{Action, transition};
use crate::error::AppError;
use crate::models::handoff::{HandoffEvent, HandoffResponse};
use crate::models::leg::LegStatus;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;
use crate::storage::{OrderRecord, StorageError};

pub async fn create_order(state: &AppState) -> Result<Order, AppError> {
    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4(),
        status: OrderStatus::Created,
        current_rider: None,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .insert(OrderRecord {
            order: order.clone(),
            legs: Vec::new(),
        })
        .await
        .map_err(|err| AppError::Internal(format!("order insert failed: {err}")))?;

    state.metrics.orders_created_total.inc();
    info!(order_id = %order.id, "order created");

    Ok(order)
}

/// One mutating request end to end: idempotency lookup, lock acquisition,
/// transition validation, atomic commit, response caching, lock release.
/// The lock is released on every exit path past acquisition.
pub async fn execute_handoff(
    state: &AppState,
    order_id: Uuid,
    rider_id: Uuid,
    action: Action,
    dedup_key: &str,
) -> Result<CachedResponse, AppError> {
    let started = Instant::now();

    let cached = state
        .idempotency
        .lookup(order_id, action.name(), dedup_key)
        .await
        .map_err(|err| AppError::Internal(format!("idempotency lookup failed: {err}")))?;

    if let Some(cached) = cached {
        state.metrics.idempotency_hits_total.inc();
        info!(order_id = %order_id, action = action.name(), "replay served from idempotency cache");
        return Ok(cached);
    }

    let token = match state.locks.acquire(order_id).await {
        Ok(token) => token,
        Err(LockError::Busy) => {
            state.metrics.lock_busy_total.inc();
            warn!(order_id = %order_id, action = action.name(), "lock busy after retries");
            return Err(AppError::Conflict(format!(
                "order {order_id} is being modified by another request"
            )));
        }
        Err(LockError::Store(err)) => {
            return Err(AppError::Internal(format!("lock acquisition failed: {err}")));
        }
    };

    let result = run_locked(state, order_id, rider_id, action, dedup_key).await;

    if let Err(err) = state.locks.release(order_id, &token).await {
        error!(order_id = %order_id, error = %err, "lock release failed");
    }

    let outcome = match &result {
        Ok(_) => "success",
        Err(AppError::Validation(_)) => "rejected",
        Err(AppError::NotFound(_)) => "not_found",
        Err(_) => "error",
    };
    state
        .metrics
        .handoffs_total
        .with_label_values(&[action.name(), outcome])
        .inc();
    state
        .metrics
        .handoff_latency_seconds
        .with_label_values(&[action.name()])
        .observe(started.elapsed().as_secs_f64());

    result
}

async fn run_locked(
    state: &AppState,
    order_id: Uuid,
    rider_id: Uuid,
    action: Action,
    dedup_key: &str,
) -> Result<CachedResponse, AppError> {
    let mut record = state.store.load(order_id).await.map_err(|err| match err {
        StorageError::NotFound => AppError::NotFound(format!("order {order_id} not found")),
        other => AppError::Internal(format!("order load failed: {other}")),
    })?;

    // Rejections are not cached: a retry re-evaluates against current state.
    let next = transition(record.order.status, action).map_err(|rejection| {
        warn!(
            order_id = %order_id,
            status = ?record.order.status,
            action = action.name(),
            code = rejection.code(),
            "transition rejected"
        );
        AppError::Validation(rejection)
    })?;

    let now = Utc::now();
    let leg_number = match action {
        Action::Start => ledger::open_leg(&mut record, rider_id, now),
        Action::Finish { .. } => ledger::close_leg(&mut record, now),
    }
    .map_err(|err| {
        error!(order_id = %order_id, error = %err, "ledger invariant violated");
        AppError::Internal(format!("ledger invariant violated for order {order_id}: {err}"))
    })?;

    record.order.status = next;
    record.order.current_rider = match next {
        OrderStatus::InProgress => Some(rider_id),
        _ => None,
    };
    record.order.updated_at = now;

    state
        .store
        .commit(record.clone())
        .await
        .map_err(|err| AppError::Internal(format!("commit failed: {err}")))?;

    let leg_status = match action {
        Action::Start => LegStatus::InProgress,
        Action::Finish { .. } => LegStatus::Completed,
    };
    let body = serde_json::to_value(HandoffResponse {
        order_id,
        status: next,
        current_rider: record.order.current_rider,
        leg_number,
        leg_status,
    })
    .map_err(|err| AppError::Internal(format!("response serialization failed: {err}")))?;
    let response = CachedResponse { status: 200, body };

    // A failure here leaves the commit in place; the request still succeeded.
    // A retry of the same key would then replay the action (see DESIGN.md).
    if let Err(err) = state
        .idempotency
        .store(order_id, action.name(), dedup_key, &response)
        .await
    {
        warn!(order_id = %order_id, error = %err, "idempotency store failed after commit");
    }

    let _ = state.handoff_events_tx.send(HandoffEvent {
        order_id,
        action: action.name().to_string(),
        status: next,
        rider_id,
        leg_number,
        at: now,
    });

    info!(
        order_id = %order_id,
        action = action.name(),
        status = ?next,
        leg_number,
        "handoff committed"
    );

    Ok(response)
}
