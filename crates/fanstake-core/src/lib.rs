//! # Fanstake Core - Shared Domain Types
//!
//! Identifier newtypes and the read-only input records consumed by the
//! reward distribution core: stake ledger rows, finalized event outcomes,
//! and participation tiers.
//!
//! ## Participation Tiers
//!
//! | Tier | Code | Coefficient | Description |
//! |------|------|-------------|-------------|
//! | Full | 1 | 1.0 | Staked, attended, and watched the match |
//! | StakeAndMatch | 2 | 0.7 | Staked and watched the match |
//! | StakeOnly | 3 | 0.3 | Staked without attending |
//! | Unknown | - | 0.3 | Unrecognized tier code, flagged for review |
//!
//! Everything in this crate is plain data: no I/O, no clocks, no locking.
//! Stake records and outcomes are authored by the surrounding platform and
//! are immutable once an event completes.

pub mod tier;
pub mod types;

// Re-exports
pub use tier::ParticipationTier;
pub use types::{
    EventId, EventOutcome, MatchResult, StakeId, StakeRecord, TeamChoice, UserId,
};
