use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::leg::LegStatus;
use crate::models::order::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffResponse {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub current_rider: Option<Uuid>,
    pub leg_number: u32,
    pub leg_status: LegStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffEvent {
    pub order_id: Uuid,
    pub action: String,
    pub status: OrderStatus,
    pub rider_id: Uuid,
    pub leg_number: u32,
    pub at: DateTime<Utc>,
}
