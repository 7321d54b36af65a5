//! Error types for reward calculation and distribution operations.

use crate::ledger::DistributionStatus;
use fanstake_core::{EventId, UserId};
use thiserror::Error;

/// Result type alias for reward operations
pub type Result<T> = std::result::Result<T, RewardError>;

/// Errors that can occur in the reward core.
///
/// No variant here is ever swallowed or replaced by a default monetary
/// value; every detected inconsistency surfaces to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RewardError {
    // === Engine input validation ===
    /// Malformed or out-of-range numeric input to the calculation engine
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // === Batch calculation ===
    /// Distributions already exist for the event, or another calculation
    /// for the same event is in flight
    #[error("distributions already calculated or in progress for {0}")]
    Conflict(EventId),

    /// No finalized outcome recorded for the event
    #[error("no finalized outcome for {0}")]
    OutcomeNotFound(EventId),

    /// The event was cancelled; no distribution is ever computed for it
    #[error("{0} was cancelled, rewards are not distributable")]
    EventCancelled(EventId),

    /// The event has no stake records; zero total stake is a data defect,
    /// not a zero-reward case
    #[error("no stake records for {0}")]
    EmptyStakeSet(EventId),

    /// A participant's engine invocation failed mid-batch; nothing was
    /// persisted for the event
    #[error("calculation failed for {user_id} in {event_id}: {reason}")]
    CalculationFailed {
        event_id: EventId,
        user_id: UserId,
        reason: String,
    },

    // === Claims ===
    /// No distribution row exists for this participant and event
    #[error("no distribution for {user_id} in {event_id}")]
    DistributionNotFound { event_id: EventId, user_id: UserId },

    /// Claim attempted on a distribution not yet released
    #[error("distribution for {user_id} in {event_id} is {status}, not claimable")]
    NotClaimable {
        event_id: EventId,
        user_id: UserId,
        status: DistributionStatus,
    },

    // === Release, recalculation & integrity ===
    /// Release or override requested for an event with no distribution rows
    #[error("no distributions recorded for {0}")]
    NoDistributions(EventId),

    /// A persisted admin pool amount diverges from the source outcome
    #[error("admin pool mismatch for {event_id}: {mismatched} row(s) diverge from source outcome")]
    IntegrityViolation { event_id: EventId, mismatched: usize },
}

impl RewardError {
    /// Whether retrying the operation can succeed without an explicit
    /// override. Only batch failures (after the upstream data defect is
    /// fixed) and in-flight conflicts qualify; everything else is a
    /// definitive rejection.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CalculationFailed { .. } | Self::Conflict(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let failed = RewardError::CalculationFailed {
            event_id: EventId(1),
            user_id: UserId(2),
            reason: "stake out of range".into(),
        };
        assert!(failed.is_retryable());
        assert!(RewardError::Conflict(EventId(1)).is_retryable());

        assert!(!RewardError::InvalidInput("fee out of range".into()).is_retryable());
        assert!(!RewardError::EventCancelled(EventId(1)).is_retryable());
    }

    #[test]
    fn test_error_display_names_offender() {
        let err = RewardError::CalculationFailed {
            event_id: EventId(9),
            user_id: UserId(42),
            reason: "non-positive total stake".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("user#42"));
        assert!(msg.contains("event#9"));
        assert!(msg.contains("non-positive total stake"));
    }
}
