//! # Distribution Ledger
//!
//! Orchestrates reward calculation across all participants of a finalized
//! event exactly once, persists the results, and exposes claim transitions.
//!
//! ## Status machine
//!
//! ```text
//! Calculated ──release──> Claimable ──claim──> Claimed (terminal)
//! ```
//!
//! No backward transitions. A recalculation for an event that already has
//! rows is rejected with a conflict unless the audited override path is
//! used, which supersedes the prior rows and logs both generations side by
//! side in the audit trail.

use crate::audit::{AuditEntry, PoolMismatch};
use crate::engine::{self, RewardInput, FORMULA_VERSION};
use crate::error::{Result, RewardError};
use crate::store::{DistributionStore, OutcomeSource, StakeSource};
use fanstake_core::{EventId, EventOutcome, ParticipationTier, StakeId, StakeRecord, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle status of a distribution row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionStatus {
    /// Computed and persisted, not yet released for claiming
    Calculated,
    /// Released by the platform; the participant may claim
    Claimable,
    /// Claimed by the participant (terminal)
    Claimed,
}

impl DistributionStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Claimed)
    }
}

impl std::fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Calculated => "calculated",
            Self::Claimable => "claimable",
            Self::Claimed => "claimed",
        };
        f.write_str(name)
    }
}

/// One participant's persisted reward distribution for one event.
///
/// Created once when the event is finalized and all stakes are known; never
/// deleted, only superseded through the audited override path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardDistribution {
    /// Row identifier
    pub id: Uuid,

    /// Event the distribution belongs to
    pub event_id: EventId,

    /// Receiving participant
    pub user_id: UserId,

    /// Stake record this distribution was computed from
    pub stake_record_id: StakeId,

    /// Pool amount copied from the event outcome at calculation time.
    /// Divergence from the source outcome is an integrity defect.
    pub admin_pool_amount: Decimal,

    /// Tier the participant was computed under
    pub tier: ParticipationTier,

    /// Coefficient applied for that tier
    pub tier_coefficient: Decimal,

    /// stake_amount / total_event_stake
    pub user_share_ratio: Decimal,

    /// Pool-derived reward before fee and principal
    pub base_reward: Decimal,

    /// Fee levied on base_reward + principal
    pub platform_fee_amount: Decimal,

    /// Final payout: principal plus base reward, net of fee
    pub final_reward: Decimal,

    /// Human-readable derivation for audit display
    pub calculation_formula: String,

    /// Version of the payout formula the row was computed under
    pub formula_version: u16,

    /// Lifecycle status
    pub status: DistributionStatus,

    /// Unix timestamp of calculation
    pub calculated_at: i64,

    /// Unix timestamp of the claim, set exactly once
    pub claimed_at: Option<i64>,
}

impl RewardDistribution {
    /// Final payout rounded for display. Persisted values are never rounded;
    /// this is the presentation boundary.
    pub fn final_reward_rounded(&self, dp: u32) -> Decimal {
        self.final_reward.round_dp(dp)
    }
}

/// The distribution ledger.
///
/// Generic over the read accessors for stakes and outcomes and the
/// transactional distribution store, so the surrounding application layer
/// can plug in its database while tests use the in-memory store.
pub struct DistributionLedger<'a, S, O, D> {
    stakes: &'a S,
    outcomes: &'a O,
    store: &'a D,
}

impl<'a, T> DistributionLedger<'a, T, T, T>
where
    T: StakeSource + OutcomeSource + DistributionStore,
{
    /// Build a ledger over a single backing store implementing all three
    /// accessor traits.
    pub fn with_store(store: &'a T) -> Self {
        Self {
            stakes: store,
            outcomes: store,
            store,
        }
    }
}

impl<'a, S, O, D> DistributionLedger<'a, S, O, D>
where
    S: StakeSource,
    O: OutcomeSource,
    D: DistributionStore,
{
    /// Create a ledger over separate accessors.
    pub fn new(stakes: &'a S, outcomes: &'a O, store: &'a D) -> Self {
        Self {
            stakes,
            outcomes,
            store,
        }
    }

    /// Calculate and persist distributions for every staker of a finalized
    /// event, exactly once.
    ///
    /// The whole batch is all-or-nothing: any participant failing validation
    /// aborts the batch with zero rows persisted. Calling again for an event
    /// that already has rows (or while another calculation for the same
    /// event is in flight) fails with a conflict.
    pub fn calculate_distributions_for_event(
        &self,
        event_id: EventId,
        now: i64,
    ) -> Result<Vec<RewardDistribution>> {
        let outcome = self
            .outcomes
            .outcome_for_event(event_id)
            .ok_or(RewardError::OutcomeNotFound(event_id))?;
        if !outcome.match_result.is_distributable() {
            return Err(RewardError::EventCancelled(event_id));
        }

        // Per-event mutual exclusion: exactly one batch wins, others fail fast
        if !self.store.try_lock_event(event_id) {
            return Err(RewardError::Conflict(event_id));
        }
        let result = self.calculate_locked(event_id, &outcome, now);
        self.store.unlock_event(event_id);
        result
    }

    fn calculate_locked(
        &self,
        event_id: EventId,
        outcome: &EventOutcome,
        now: i64,
    ) -> Result<Vec<RewardDistribution>> {
        if !self.store.distributions_for_event(event_id).is_empty() {
            return Err(RewardError::Conflict(event_id));
        }

        let stakes = self.stakes.stakes_for_event(event_id);
        if stakes.is_empty() {
            return Err(RewardError::EmptyStakeSet(event_id));
        }

        let rows = self.compute_rows(event_id, outcome, &stakes, now)?;
        self.store.insert_batch(event_id, rows.clone())?;

        info!(
            event = %event_id,
            participants = rows.len(),
            pool = %outcome.admin_pool_amount,
            "calculated reward distributions"
        );
        Ok(rows)
    }

    /// Run the engine for every stake of the event. Pure apart from row id
    /// generation; nothing is persisted here.
    fn compute_rows(
        &self,
        event_id: EventId,
        outcome: &EventOutcome,
        stakes: &[StakeRecord],
        now: i64,
    ) -> Result<Vec<RewardDistribution>> {
        let total_event_stake: Decimal = stakes.iter().map(|s| s.stake_amount).sum();

        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(stakes.len());
        for stake in stakes {
            // One row per (event, user); duplicate stake rows are an
            // upstream defect, not something to sum over silently.
            if !seen.insert(stake.user_id) {
                return Err(RewardError::CalculationFailed {
                    event_id,
                    user_id: stake.user_id,
                    reason: "duplicate stake record for participant".into(),
                });
            }

            let input = RewardInput {
                user_stake: stake.stake_amount,
                total_event_stake,
                tier: stake.tier,
                admin_pool_amount: outcome.admin_pool_amount,
                platform_fee_percent: outcome.platform_fee_percent,
            };
            let breakdown =
                engine::calculate_reward(&input).map_err(|e| RewardError::CalculationFailed {
                    event_id,
                    user_id: stake.user_id,
                    reason: e.to_string(),
                })?;

            debug!(
                event = %event_id,
                user = %stake.user_id,
                final_reward = %breakdown.final_reward,
                "computed participant payout"
            );

            rows.push(RewardDistribution {
                id: Uuid::new_v4(),
                event_id,
                user_id: stake.user_id,
                stake_record_id: stake.id,
                admin_pool_amount: outcome.admin_pool_amount,
                tier: stake.tier,
                tier_coefficient: breakdown.tier_coefficient,
                user_share_ratio: breakdown.user_share_ratio,
                base_reward: breakdown.base_reward,
                platform_fee_amount: breakdown.platform_fee_amount,
                final_reward: breakdown.final_reward,
                calculation_formula: breakdown.calculation_formula,
                formula_version: FORMULA_VERSION,
                status: DistributionStatus::Calculated,
                calculated_at: now,
                claimed_at: None,
            });
        }
        Ok(rows)
    }

    /// Release an event's rewards for claiming: every `Calculated` row
    /// becomes `Claimable`. Idempotent over rows already released; claimed
    /// rows are untouched. Returns the number of rows transitioned.
    pub fn release_event(&self, event_id: EventId) -> Result<usize> {
        let released = self.store.mark_event_claimable(event_id)?;
        info!(event = %event_id, released, "released rewards for claiming");
        Ok(released)
    }

    /// Claim a participant's reward.
    ///
    /// Transitions `Claimable -> Claimed` and sets `claimed_at` once.
    /// Claiming an already claimed row returns the existing row unchanged;
    /// only the first call ever reports a fresh transition, so an external
    /// payout can never be triggered twice.
    pub fn claim_reward(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: i64,
    ) -> Result<RewardDistribution> {
        let (row, newly_claimed) = self.store.claim(event_id, user_id, now)?;
        if newly_claimed {
            info!(
                event = %event_id,
                user = %user_id,
                amount = %row.final_reward,
                "reward claimed"
            );
        }
        Ok(row)
    }

    /// Audited override: recompute an event's distributions and supersede
    /// the existing rows.
    ///
    /// Refused while any row is already claimed. The prior and new rows are
    /// recorded side by side in the audit trail; nothing is overwritten
    /// silently. New rows re-enter the lifecycle at `Calculated` and must be
    /// released again.
    pub fn recalculate_with_override(
        &self,
        event_id: EventId,
        reason: &str,
        now: i64,
    ) -> Result<Vec<RewardDistribution>> {
        let outcome = self
            .outcomes
            .outcome_for_event(event_id)
            .ok_or(RewardError::OutcomeNotFound(event_id))?;
        if !outcome.match_result.is_distributable() {
            return Err(RewardError::EventCancelled(event_id));
        }

        if !self.store.try_lock_event(event_id) {
            return Err(RewardError::Conflict(event_id));
        }
        let result = self.override_locked(event_id, &outcome, reason, now);
        self.store.unlock_event(event_id);
        result
    }

    fn override_locked(
        &self,
        event_id: EventId,
        outcome: &EventOutcome,
        reason: &str,
        now: i64,
    ) -> Result<Vec<RewardDistribution>> {
        let prior = self.store.distributions_for_event(event_id);
        if prior.is_empty() {
            return Err(RewardError::NoDistributions(event_id));
        }

        let stakes = self.stakes.stakes_for_event(event_id);
        if stakes.is_empty() {
            return Err(RewardError::EmptyStakeSet(event_id));
        }

        let rows = self.compute_rows(event_id, outcome, &stakes, now)?;
        let prior = self.store.supersede_event(event_id, rows.clone())?;

        warn!(
            event = %event_id,
            reason,
            superseded = prior.len(),
            replacement = rows.len(),
            "override recalculation applied"
        );
        self.store
            .append_audit(AuditEntry::recalculation(
                event_id,
                reason,
                prior,
                rows.clone(),
                now,
            ));
        Ok(rows)
    }

    /// Verify that every persisted row still carries the pool amount the
    /// source outcome records. Divergence is reported and logged to the
    /// audit trail, never auto-corrected.
    pub fn verify_pool_integrity(&self, event_id: EventId, now: i64) -> Result<()> {
        let outcome = self
            .outcomes
            .outcome_for_event(event_id)
            .ok_or(RewardError::OutcomeNotFound(event_id))?;

        let mismatches: Vec<PoolMismatch> = self
            .store
            .distributions_for_event(event_id)
            .iter()
            .filter(|row| row.admin_pool_amount != outcome.admin_pool_amount)
            .map(|row| PoolMismatch {
                user_id: row.user_id,
                recorded_pool: row.admin_pool_amount,
                outcome_pool: outcome.admin_pool_amount,
            })
            .collect();

        if mismatches.is_empty() {
            return Ok(());
        }

        let mismatched = mismatches.len();
        warn!(
            event = %event_id,
            mismatched,
            "admin pool amounts diverge from source outcome"
        );
        self.store
            .append_audit(AuditEntry::pool_mismatch(event_id, mismatches, now));
        Err(RewardError::IntegrityViolation {
            event_id,
            mismatched,
        })
    }
}
