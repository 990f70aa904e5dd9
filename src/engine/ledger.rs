use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::leg::{Leg, LegStatus};
use crate::storage::OrderRecord;

/// Ledger invariant violations. These indicate broken lock discipline, not a
/// bad request; the orchestrator surfaces them as internal errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("an active leg already exists")]
    ActiveLegPresent,

    #[error("expected exactly one active leg, found {0}")]
    ActiveLegCount(usize),
}

fn active_leg_count(legs: &[Leg]) -> usize {
    legs.iter()
        .filter(|leg| leg.status == LegStatus::InProgress)
        .count()
}

/// Appends the next leg for the order and returns its leg number. Leg numbers
/// are 1-based and strictly increasing with no gaps.
pub fn open_leg(
    record: &mut OrderRecord,
    rider_id: Uuid,
    now: DateTime<Utc>,
) -> Result<u32, LedgerError> {
    if active_leg_count(&record.legs) != 0 {
        return Err(LedgerError::ActiveLegPresent);
    }

    let leg_number = record
        .legs
        .iter()
        .map(|leg| leg.leg_number)
        .max()
        .unwrap_or(0)
        + 1;

    record.legs.push(Leg {
        id: Uuid::new_v4(),
        order_id: record.order.id,
        rider_id,
        leg_number,
        status: LegStatus::InProgress,
        started_at: now,
        finished_at: None,
    });

    Ok(leg_number)
}

/// Completes the unique active leg and returns its leg number. Completed legs
/// are never touched again.
pub fn close_leg(record: &mut OrderRecord, now: DateTime<Utc>) -> Result<u32, LedgerError> {
    let active = active_leg_count(&record.legs);
    if active != 1 {
        return Err(LedgerError::ActiveLegCount(active));
    }

    let leg = record
        .legs
        .iter_mut()
        .find(|leg| leg.status == LegStatus::InProgress)
        .ok_or(LedgerError::ActiveLegCount(0))?;

    leg.status = LegStatus::Completed;
    leg.finished_at = Some(now);

    Ok(leg.leg_number)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{LedgerError, close_leg, open_leg};
    use crate::models::leg::LegStatus;
    use crate::models::order::{Order, OrderStatus};
    use crate::storage::OrderRecord;

    fn record() -> OrderRecord {
        let now = Utc::now();
        OrderRecord {
            order: Order {
                id: Uuid::new_v4(),
                status: OrderStatus::Created,
                current_rider: None,
                created_at: now,
                updated_at: now,
            },
            legs: Vec::new(),
        }
    }

    #[test]
    fn first_leg_is_number_one() {
        let mut record = record();
        let leg_number = open_leg(&mut record, Uuid::new_v4(), Utc::now()).unwrap();

        assert_eq!(leg_number, 1);
        assert_eq!(record.legs.len(), 1);
        assert_eq!(record.legs[0].status, LegStatus::InProgress);
        assert!(record.legs[0].finished_at.is_none());
    }

    #[test]
    fn leg_numbers_increase_without_gaps() {
        let mut record = record();
        let now = Utc::now();

        for expected in 1..=3 {
            assert_eq!(open_leg(&mut record, Uuid::new_v4(), now).unwrap(), expected);
            assert_eq!(close_leg(&mut record, now).unwrap(), expected);
        }

        let numbers: Vec<u32> = record.legs.iter().map(|leg| leg.leg_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn open_with_active_leg_violates_ledger() {
        let mut record = record();
        let now = Utc::now();
        open_leg(&mut record, Uuid::new_v4(), now).unwrap();

        let result = open_leg(&mut record, Uuid::new_v4(), now);
        assert_eq!(result, Err(LedgerError::ActiveLegPresent));
    }

    #[test]
    fn close_completes_the_active_leg() {
        let mut record = record();
        let now = Utc::now();
        open_leg(&mut record, Uuid::new_v4(), now).unwrap();

        let leg_number = close_leg(&mut record, now).unwrap();
        assert_eq!(leg_number, 1);
        assert_eq!(record.legs[0].status, LegStatus::Completed);
        assert!(record.legs[0].finished_at.is_some());
    }

    #[test]
    fn close_without_active_leg_violates_ledger() {
        let mut record = record();

        let result = close_leg(&mut record, Utc::now());
        assert_eq!(result, Err(LedgerError::ActiveLegCount(0)));
    }

    #[test]
    fn close_with_two_active_legs_violates_ledger() {
        let mut record = record();
        let now = Utc::now();

        // Hand-built corruption that correct lock usage can never produce.
        open_leg(&mut record, Uuid::new_v4(), now).unwrap();
        let mut extra = record.legs[0].clone();
        extra.id = Uuid::new_v4();
        extra.leg_number = 2;
        record.legs.push(extra);

        let result = close_leg(&mut record, now);
        assert_eq!(result, Err(LedgerError::ActiveLegCount(2)));
    }
}
