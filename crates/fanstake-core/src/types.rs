//! Identifier newtypes and read-only input records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// User identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

/// Stake record identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StakeId(pub u64);

impl fmt::Display for StakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stake#{}", self.0)
    }
}

/// Team a participant backed when staking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamChoice {
    /// Home team
    TeamA,
    /// Away team
    TeamB,
    /// Backed a draw
    Draw,
}

/// Final result of a match, set exactly once at event finalization
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    /// Home team won
    TeamAWins,
    /// Away team won
    TeamBWins,
    /// Match ended in a draw
    Draw,
    /// Event cancelled; stakes are refunded outside the reward core
    Cancelled,
}

impl MatchResult {
    /// Whether rewards may be distributed for this result.
    /// Cancelled events never produce distributions.
    pub fn is_distributable(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// One participant's stake in an event.
///
/// Immutable once the event transitions to completed; the reward core only
/// ever reads these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StakeRecord {
    /// Stake record identifier
    pub id: StakeId,

    /// Event this stake belongs to
    pub event_id: EventId,

    /// Staking participant
    pub user_id: UserId,

    /// Staked amount in CHZ (fixed-point decimal, never negative)
    pub stake_amount: Decimal,

    /// Declared participation tier
    pub tier: crate::tier::ParticipationTier,

    /// Team the participant backed (carried data, never affects payout)
    pub team_choice: TeamChoice,

    /// Unix timestamp the stake was placed
    pub stake_time: i64,
}

/// Finalized outcome of an event.
///
/// `admin_pool_amount` and `match_result` are written exactly once when the
/// platform finalizes the event and are immutable thereafter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Event identifier
    pub event_id: EventId,

    /// Platform-injected reward pool in CHZ
    pub admin_pool_amount: Decimal,

    /// Final match result
    pub match_result: MatchResult,

    /// Platform fee percentage, e.g. 5 meaning 5%
    pub platform_fee_percent: Decimal,
}
