//! # Fanstake Rewards - Calculation Engine & Distribution Ledger
//!
//! Single source of truth for the liquidity-mining reward payout on the
//! Fanstake event staking platform: given a finalized event, the total
//! staked capital, each participant's stake and tier, and the
//! platform-injected reward pool, compute every participant's final payout
//! net of the platform fee and persist it in an auditable, idempotent
//! fashion.
//!
//! ## Canonical payout (formula version 2)
//!
//! ```text
//! user_share_ratio = user_stake / total_event_stake
//! base_reward      = admin_pool_amount * user_share_ratio * tier_coefficient
//! final_reward     = (base_reward + user_stake) * (1 - fee% / 100)
//! platform_fee     = (base_reward + user_stake) * (fee% / 100)
//! ```
//!
//! ## Guarantees
//!
//! - **Deterministic**: identical inputs yield byte-identical payouts and
//!   audit formula strings; money is fixed-point decimal throughout.
//! - **Exactly once per event**: a second batch calculation conflicts
//!   instead of duplicating rows; concurrent calculations for one event
//!   have a single winner.
//! - **All-or-nothing batches**: one bad stake record aborts the whole
//!   event with zero rows persisted.
//! - **Forward-only lifecycle**: `Calculated -> Claimable -> Claimed`,
//!   claims idempotent, `claimed_at` set exactly once.
//! - **Audited corrections**: historical rows are superseded through a
//!   logged override, never overwritten; pool divergence is reported,
//!   never auto-repaired.

pub mod audit;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod store;

// Re-exports
pub use audit::{AuditEntry, AuditKind, PoolMismatch};
pub use engine::{calculate_reward, RewardBreakdown, RewardInput, FORMULA_VERSION};
pub use error::{Result, RewardError};
pub use ledger::{DistributionLedger, DistributionStatus, RewardDistribution};
pub use store::{DistributionStore, MemoryStore, OutcomeSource, StakeSource};
