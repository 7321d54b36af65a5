//! # Reward Calculation Engine
//!
//! Pure, deterministic computation of one participant's payout from an
//! event's aggregate data. No I/O, no clock, no locking; safe to invoke in
//! parallel across participants.
//!
//! ## Canonical formula
//!
//! ```text
//! user_share_ratio = user_stake / total_event_stake
//! base_reward      = admin_pool_amount * user_share_ratio * tier_coefficient
//! gross            = base_reward + user_stake        (principal returned)
//! platform_fee     = gross * platform_fee_percent / 100
//! final_reward     = gross - platform_fee
//! ```
//!
//! The final payout returns the participant's principal alongside their
//! share of the pool-derived reward, with the platform fee levied on the
//! combined amount (liquidity-mining semantics). `final_reward` is derived
//! by subtraction from the fee so `final_reward + platform_fee == gross`
//! holds exactly.
//!
//! All amounts are fixed-point decimals; rounding belongs to the
//! presentation boundary, never to this module.

use crate::error::{Result, RewardError};
use fanstake_core::ParticipationTier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Version of the canonical payout formula. Version 1 omitted the principal
/// from the final payout; version 2 returns it. Any future change must bump
/// this and ship as a logged recalculation, never an in-place edit.
pub const FORMULA_VERSION: u16 = 2;

/// Per-participant input to a reward calculation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardInput {
    /// This participant's stake (must be > 0 and <= total)
    pub user_stake: Decimal,

    /// Sum of all stakes for the event (must be > 0)
    pub total_event_stake: Decimal,

    /// Declared participation tier
    pub tier: ParticipationTier,

    /// Platform-injected reward pool for the event
    pub admin_pool_amount: Decimal,

    /// Platform fee percentage in [0, 100)
    pub platform_fee_percent: Decimal,
}

/// Result of a reward calculation for one participant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// user_stake / total_event_stake
    pub user_share_ratio: Decimal,

    /// Coefficient applied for the participation tier
    pub tier_coefficient: Decimal,

    /// Pool-derived reward before fee and principal
    pub base_reward: Decimal,

    /// Fee levied on base_reward + user_stake
    pub platform_fee_amount: Decimal,

    /// Payout: base_reward + user_stake, net of platform fee
    pub final_reward: Decimal,

    /// Human-readable derivation embedding every numeric input, for audit
    pub calculation_formula: String,
}

/// Calculate one participant's payout.
///
/// Fails only on invalid input; an unrecognized tier is not an error (it
/// computes with the `StakeOnly` coefficient and is flagged in the formula
/// string).
pub fn calculate_reward(input: &RewardInput) -> Result<RewardBreakdown> {
    if input.total_event_stake <= Decimal::ZERO {
        return Err(RewardError::InvalidInput(
            "non-positive total stake".into(),
        ));
    }
    if input.user_stake <= Decimal::ZERO || input.user_stake > input.total_event_stake {
        return Err(RewardError::InvalidInput("stake out of range".into()));
    }
    if input.platform_fee_percent < Decimal::ZERO
        || input.platform_fee_percent >= Decimal::ONE_HUNDRED
    {
        return Err(RewardError::InvalidInput("fee out of range".into()));
    }
    if input.admin_pool_amount < Decimal::ZERO {
        return Err(RewardError::InvalidInput("negative admin pool".into()));
    }

    let overflow = || RewardError::InvalidInput("numeric overflow in reward computation".into());

    let coefficient = input.tier.coefficient();

    let user_share_ratio = input
        .user_stake
        .checked_div(input.total_event_stake)
        .ok_or_else(overflow)?;

    let base_reward = input
        .admin_pool_amount
        .checked_mul(user_share_ratio)
        .and_then(|v| v.checked_mul(coefficient))
        .ok_or_else(overflow)?;

    let gross = base_reward.checked_add(input.user_stake).ok_or_else(overflow)?;

    let platform_fee_amount = gross
        .checked_mul(input.platform_fee_percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;

    // Derived by subtraction so final + fee == gross exactly
    let final_reward = gross.checked_sub(platform_fee_amount).ok_or_else(overflow)?;

    let fallback_note = if input.tier.is_fallback() {
        " [tier fallback: unknown -> stake-only 0.3]"
    } else {
        ""
    };

    let calculation_formula = format!(
        "share = {us} / {total} = {ratio}; \
         base = {pool} * {ratio} * {coef} = {base}; \
         gross = {base} + {us} = {gross}; \
         fee = {gross} * {fee}% = {fee_amount}; \
         final = {gross} - {fee_amount} = {finalv}{note}",
        us = input.user_stake,
        total = input.total_event_stake,
        ratio = user_share_ratio,
        pool = input.admin_pool_amount,
        coef = coefficient,
        base = base_reward,
        gross = gross,
        fee = input.platform_fee_percent,
        fee_amount = platform_fee_amount,
        finalv = final_reward,
        note = fallback_note,
    );

    Ok(RewardBreakdown {
        user_share_ratio,
        tier_coefficient: coefficient,
        base_reward,
        platform_fee_amount,
        final_reward,
        calculation_formula,
    })
}
