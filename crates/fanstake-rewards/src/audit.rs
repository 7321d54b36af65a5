//! Append-only audit trail for distribution overrides and integrity checks.
//!
//! Historical distribution rows are never rewritten in place. A formula or
//! input correction goes through the override path, which records the prior
//! and new rows side by side here; a pool amount divergence is recorded as a
//! mismatch entry, never auto-corrected.

use crate::ledger::RewardDistribution;
use fanstake_core::{EventId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single divergence between a persisted distribution row and the source
/// event outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolMismatch {
    /// Participant whose row diverges
    pub user_id: UserId,

    /// Pool amount copied into the row at calculation time
    pub recorded_pool: Decimal,

    /// Pool amount currently recorded on the source outcome
    pub outcome_pool: Decimal,
}

/// What an audit entry records
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuditKind {
    /// An audited override recalculation: prior rows superseded by new ones
    Recalculation {
        /// Operator-supplied justification
        reason: String,
        /// Rows as they stood before the override
        prior: Vec<RewardDistribution>,
        /// Rows written by the override
        new: Vec<RewardDistribution>,
    },

    /// Detected divergence between persisted rows and the source outcome
    PoolMismatch {
        /// All diverging rows for the event
        mismatches: Vec<PoolMismatch>,
    },
}

/// One append-only audit trail entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry identifier
    pub id: Uuid,

    /// Event the entry concerns
    pub event_id: EventId,

    /// What was recorded
    pub kind: AuditKind,

    /// Unix timestamp the entry was recorded
    pub recorded_at: i64,
}

impl AuditEntry {
    /// Record an override recalculation.
    pub fn recalculation(
        event_id: EventId,
        reason: impl Into<String>,
        prior: Vec<RewardDistribution>,
        new: Vec<RewardDistribution>,
        recorded_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            kind: AuditKind::Recalculation {
                reason: reason.into(),
                prior,
                new,
            },
            recorded_at,
        }
    }

    /// Record a pool integrity violation.
    pub fn pool_mismatch(
        event_id: EventId,
        mismatches: Vec<PoolMismatch>,
        recorded_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            kind: AuditKind::PoolMismatch { mismatches },
            recorded_at,
        }
    }
}
