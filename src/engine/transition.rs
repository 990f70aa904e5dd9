use thiserror::Error;

use crate::models::order::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Finish { is_final: bool },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Finish { .. } => "finish",
        }
    }
}

/// One variant per rejected (state, action) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionRejection {
    #[error("cannot start: order already has an active rider")]
    StartWhileInProgress,

    #[error("cannot start: order already delivered")]
    StartAfterDelivered,

    #[error("cannot finish: order has not been started")]
    FinishBeforeStart,

    #[error("cannot finish: order is awaiting handoff with no active leg")]
    FinishWhileAwaitingHandoff,

    #[error("cannot finish: order already delivered")]
    FinishAfterDelivered,
}

impl TransitionRejection {
    pub fn code(&self) -> &'static str {
        match self {
            TransitionRejection::StartWhileInProgress => "start_while_in_progress",
            TransitionRejection::StartAfterDelivered => "start_after_delivered",
            TransitionRejection::FinishBeforeStart => "finish_before_start",
            TransitionRejection::FinishWhileAwaitingHandoff => "finish_while_awaiting_handoff",
            TransitionRejection::FinishAfterDelivered => "finish_after_delivered",
        }
    }
}

/// Pure transition table. Called only after the orchestrator has loaded
/// authoritative state under the order's lock; does no I/O of its own.
pub fn transition(status: OrderStatus, action: Action) -> Result<OrderStatus, TransitionRejection> {
    match (status, action) {
        (OrderStatus::Created, Action::Start) => Ok(OrderStatus::InProgress),
        (OrderStatus::AwaitingHandoff, Action::Start) => Ok(OrderStatus::InProgress),
        (OrderStatus::InProgress, Action::Finish { is_final: false }) => {
            Ok(OrderStatus::AwaitingHandoff)
        }
        (OrderStatus::InProgress, Action::Finish { is_final: true }) => Ok(OrderStatus::Delivered),
        (OrderStatus::InProgress, Action::Start) => Err(TransitionRejection::StartWhileInProgress),
        (OrderStatus::Delivered, Action::Start) => Err(TransitionRejection::StartAfterDelivered),
        (OrderStatus::Created, Action::Finish { .. }) => Err(TransitionRejection::FinishBeforeStart),
        (OrderStatus::AwaitingHandoff, Action::Finish { .. }) => {
            Err(TransitionRejection::FinishWhileAwaitingHandoff)
        }
        (OrderStatus::Delivered, Action::Finish { .. }) => {
            Err(TransitionRejection::FinishAfterDelivered)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, TransitionRejection, transition};
    use crate::models::order::OrderStatus;

    #[test]
    fn start_from_created_begins_progress() {
        assert_eq!(
            transition(OrderStatus::Created, Action::Start),
            Ok(OrderStatus::InProgress)
        );
    }

    #[test]
    fn start_from_awaiting_handoff_begins_progress() {
        assert_eq!(
            transition(OrderStatus::AwaitingHandoff, Action::Start),
            Ok(OrderStatus::InProgress)
        );
    }

    #[test]
    fn non_final_finish_awaits_handoff() {
        assert_eq!(
            transition(OrderStatus::InProgress, Action::Finish { is_final: false }),
            Ok(OrderStatus::AwaitingHandoff)
        );
    }

    #[test]
    fn final_finish_delivers() {
        assert_eq!(
            transition(OrderStatus::InProgress, Action::Finish { is_final: true }),
            Ok(OrderStatus::Delivered)
        );
    }

    #[test]
    fn start_while_in_progress_is_rejected() {
        assert_eq!(
            transition(OrderStatus::InProgress, Action::Start),
            Err(TransitionRejection::StartWhileInProgress)
        );
    }

    #[test]
    fn finish_before_start_is_rejected() {
        for is_final in [false, true] {
            assert_eq!(
                transition(OrderStatus::Created, Action::Finish { is_final }),
                Err(TransitionRejection::FinishBeforeStart)
            );
        }
    }

    #[test]
    fn finish_while_awaiting_handoff_is_rejected() {
        for is_final in [false, true] {
            assert_eq!(
                transition(OrderStatus::AwaitingHandoff, Action::Finish { is_final }),
                Err(TransitionRejection::FinishWhileAwaitingHandoff)
            );
        }
    }

    #[test]
    fn delivered_is_terminal() {
        assert_eq!(
            transition(OrderStatus::Delivered, Action::Start),
            Err(TransitionRejection::StartAfterDelivered)
        );
        for is_final in [false, true] {
            assert_eq!(
                transition(OrderStatus::Delivered, Action::Finish { is_final }),
                Err(TransitionRejection::FinishAfterDelivered)
            );
        }
    }

    #[test]
    fn rejection_codes_name_the_offending_pair() {
        let rejected = transition(OrderStatus::Delivered, Action::Start).unwrap_err();
        assert_eq!(rejected.code(), "start_after_delivered");
    }
}
