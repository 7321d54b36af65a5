//! Storage seam between the reward core and the surrounding platform.
//!
//! The ledger consumes three narrow traits: read access to stakes and
//! outcomes, and a transactional distribution store enforcing the per-event
//! uniqueness and locking contract. [`MemoryStore`] implements all three
//! behind `parking_lot` locks; the application layer backs the same traits
//! with its relational database.

use crate::audit::AuditEntry;
use crate::error::{Result, RewardError};
use crate::ledger::{DistributionStatus, RewardDistribution};
use fanstake_core::{EventId, EventOutcome, StakeRecord, UserId};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Read accessor for an event's stake records
pub trait StakeSource {
    /// All stake records for the event, in stable order.
    fn stakes_for_event(&self, event_id: EventId) -> Vec<StakeRecord>;
}

/// Read accessor for finalized event outcomes
pub trait OutcomeSource {
    /// The finalized outcome for the event, if one was recorded.
    fn outcome_for_event(&self, event_id: EventId) -> Option<EventOutcome>;
}

/// Transactional persistence for distribution rows and the audit trail.
///
/// Implementations must make `insert_batch` all-or-nothing, keep at most one
/// active row per `(event, user)`, and give `try_lock_event` exactly-one-
/// winner semantics per event.
pub trait DistributionStore {
    /// Acquire the per-event calculation lock. Returns false if another
    /// calculation for the same event is in flight.
    fn try_lock_event(&self, event_id: EventId) -> bool;

    /// Release the per-event calculation lock.
    fn unlock_event(&self, event_id: EventId);

    /// Persist a full batch atomically. Fails with a conflict if the event
    /// already has active rows; on failure nothing is persisted.
    fn insert_batch(&self, event_id: EventId, rows: Vec<RewardDistribution>) -> Result<()>;

    /// All active rows for the event, ordered by participant.
    fn distributions_for_event(&self, event_id: EventId) -> Vec<RewardDistribution>;

    /// One participant's active row, if any.
    fn distribution(&self, event_id: EventId, user_id: UserId) -> Option<RewardDistribution>;

    /// Transition every `Calculated` row of the event to `Claimable`.
    /// Returns the number of rows transitioned; errors if the event has no
    /// rows at all.
    fn mark_event_claimable(&self, event_id: EventId) -> Result<usize>;

    /// Conditionally claim a row: `Claimable -> Claimed`, setting
    /// `claimed_at`. Returns the row and whether this call performed the
    /// transition; an already claimed row is returned unchanged with
    /// `false`.
    fn claim(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: i64,
    ) -> Result<(RewardDistribution, bool)>;

    /// Replace the event's active rows, archiving the prior generation.
    /// Returns the superseded rows; fails with a conflict if any row is
    /// already claimed.
    fn supersede_event(
        &self,
        event_id: EventId,
        new_rows: Vec<RewardDistribution>,
    ) -> Result<Vec<RewardDistribution>>;

    /// Append an entry to the append-only audit trail.
    fn append_audit(&self, entry: AuditEntry);

    /// The full audit trail, oldest first.
    fn audit_log(&self) -> Vec<AuditEntry>;

    /// Superseded (historical) rows for the event, oldest generation first.
    fn superseded_for_event(&self, event_id: EventId) -> Vec<RewardDistribution>;
}

/// In-memory store implementing all three accessor traits.
///
/// Used by tests and by tooling that replays production data offline. Rows
/// are keyed by participant in a `BTreeMap` so iteration order, and with it
/// every batch result, is deterministic.
#[derive(Default)]
pub struct MemoryStore {
    stakes: RwLock<HashMap<EventId, Vec<StakeRecord>>>,
    outcomes: RwLock<HashMap<EventId, EventOutcome>>,
    distributions: RwLock<HashMap<EventId, BTreeMap<UserId, RewardDistribution>>>,
    superseded: RwLock<HashMap<EventId, Vec<RewardDistribution>>>,
    audit: RwLock<Vec<AuditEntry>>,
    in_flight: Mutex<HashSet<EventId>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stake. Stakes are append-only input data.
    pub fn add_stake(&self, record: StakeRecord) {
        self.stakes
            .write()
            .entry(record.event_id)
            .or_default()
            .push(record);
    }

    /// Record an event outcome. Finalization authority (set-exactly-once)
    /// lives upstream; overwriting here models upstream data changing out
    /// from under persisted rows, which integrity verification detects.
    pub fn set_outcome(&self, outcome: EventOutcome) {
        self.outcomes.write().insert(outcome.event_id, outcome);
    }
}

impl StakeSource for MemoryStore {
    fn stakes_for_event(&self, event_id: EventId) -> Vec<StakeRecord> {
        self.stakes
            .read()
            .get(&event_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl OutcomeSource for MemoryStore {
    fn outcome_for_event(&self, event_id: EventId) -> Option<EventOutcome> {
        self.outcomes.read().get(&event_id).cloned()
    }
}

impl DistributionStore for MemoryStore {
    fn try_lock_event(&self, event_id: EventId) -> bool {
        self.in_flight.lock().insert(event_id)
    }

    fn unlock_event(&self, event_id: EventId) {
        self.in_flight.lock().remove(&event_id);
    }

    fn insert_batch(&self, event_id: EventId, rows: Vec<RewardDistribution>) -> Result<()> {
        for row in &rows {
            if row.event_id != event_id {
                return Err(RewardError::InvalidInput(format!(
                    "row for {} in batch for {}",
                    row.event_id, event_id
                )));
            }
        }

        let mut distributions = self.distributions.write();
        let entry = distributions.entry(event_id).or_default();
        if !entry.is_empty() {
            return Err(RewardError::Conflict(event_id));
        }
        for row in rows {
            entry.insert(row.user_id, row);
        }
        Ok(())
    }

    fn distributions_for_event(&self, event_id: EventId) -> Vec<RewardDistribution> {
        self.distributions
            .read()
            .get(&event_id)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    fn distribution(&self, event_id: EventId, user_id: UserId) -> Option<RewardDistribution> {
        self.distributions
            .read()
            .get(&event_id)
            .and_then(|rows| rows.get(&user_id))
            .cloned()
    }

    fn mark_event_claimable(&self, event_id: EventId) -> Result<usize> {
        let mut distributions = self.distributions.write();
        let rows = distributions
            .get_mut(&event_id)
            .filter(|rows| !rows.is_empty())
            .ok_or(RewardError::NoDistributions(event_id))?;

        let mut released = 0;
        for row in rows.values_mut() {
            if row.status == DistributionStatus::Calculated {
                row.status = DistributionStatus::Claimable;
                released += 1;
            }
        }
        Ok(released)
    }

    fn claim(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: i64,
    ) -> Result<(RewardDistribution, bool)> {
        let mut distributions = self.distributions.write();
        let row = distributions
            .get_mut(&event_id)
            .and_then(|rows| rows.get_mut(&user_id))
            .ok_or(RewardError::DistributionNotFound { event_id, user_id })?;

        match row.status {
            DistributionStatus::Claimed => Ok((row.clone(), false)),
            DistributionStatus::Claimable => {
                row.status = DistributionStatus::Claimed;
                row.claimed_at = Some(now);
                Ok((row.clone(), true))
            }
            DistributionStatus::Calculated => Err(RewardError::NotClaimable {
                event_id,
                user_id,
                status: row.status,
            }),
        }
    }

    fn supersede_event(
        &self,
        event_id: EventId,
        new_rows: Vec<RewardDistribution>,
    ) -> Result<Vec<RewardDistribution>> {
        let mut distributions = self.distributions.write();
        let rows = distributions
            .get_mut(&event_id)
            .filter(|rows| !rows.is_empty())
            .ok_or(RewardError::NoDistributions(event_id))?;

        if rows
            .values()
            .any(|row| row.status == DistributionStatus::Claimed)
        {
            return Err(RewardError::Conflict(event_id));
        }

        let prior: Vec<RewardDistribution> = rows.values().cloned().collect();
        self.superseded
            .write()
            .entry(event_id)
            .or_default()
            .extend(prior.clone());

        rows.clear();
        for row in new_rows {
            rows.insert(row.user_id, row);
        }
        Ok(prior)
    }

    fn append_audit(&self, entry: AuditEntry) {
        self.audit.write().push(entry);
    }

    fn audit_log(&self) -> Vec<AuditEntry> {
        self.audit.read().clone()
    }

    fn superseded_for_event(&self, event_id: EventId) -> Vec<RewardDistribution> {
        self.superseded
            .read()
            .get(&event_id)
            .cloned()
            .unwrap_or_default()
    }
}
