//! Participation tiers and their reward coefficients.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A participant's declared level of engagement with an event.
///
/// The tier scales the pool-derived share of the reward. Unrecognized tier
/// codes map to [`ParticipationTier::Unknown`], which computes with the
/// `StakeOnly` coefficient but is flagged in the audit formula so that
/// misclassified records stay visible instead of silently blending in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipationTier {
    /// Staked, attended the venue, and watched the match (code 1)
    Full,
    /// Staked and watched the match (code 2)
    StakeAndMatch,
    /// Staked without attending (code 3)
    StakeOnly,
    /// Unrecognized tier code; computes as StakeOnly, flagged for review
    Unknown,
}

impl ParticipationTier {
    /// Map a raw platform tier code to a tier.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Full,
            2 => Self::StakeAndMatch,
            3 => Self::StakeOnly,
            _ => Self::Unknown,
        }
    }

    /// Raw platform tier code, if the tier is a recognized one.
    pub fn code(&self) -> Option<u8> {
        match self {
            Self::Full => Some(1),
            Self::StakeAndMatch => Some(2),
            Self::StakeOnly => Some(3),
            Self::Unknown => None,
        }
    }

    /// Reward coefficient applied to the pool-derived share.
    pub fn coefficient(&self) -> Decimal {
        match self {
            Self::Full => Decimal::new(10, 1),          // 1.0
            Self::StakeAndMatch => Decimal::new(7, 1),  // 0.7
            Self::StakeOnly | Self::Unknown => Decimal::new(3, 1), // 0.3
        }
    }

    /// Whether this tier is the explicit fallback for unrecognized codes.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Get tier name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::StakeAndMatch => "StakeAndMatch",
            Self::StakeOnly => "StakeOnly",
            Self::Unknown => "Unknown",
        }
    }
}
