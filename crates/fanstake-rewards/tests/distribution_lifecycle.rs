//! End-to-end tests for the distribution ledger lifecycle:
//! calculate -> release -> claim, plus the conflict, atomicity, override,
//! and integrity-verification paths.

use fanstake_core::{
    EventId, EventOutcome, MatchResult, ParticipationTier, StakeId, StakeRecord, TeamChoice,
    UserId,
};
use fanstake_rewards::{
    AuditKind, DistributionLedger, DistributionStatus, MemoryStore, RewardError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const EVENT: EventId = EventId(1);
const ALICE: UserId = UserId(1);
const BOB: UserId = UserId(2);

fn stake(
    id: u64,
    user: UserId,
    amount: Decimal,
    tier: ParticipationTier,
    choice: TeamChoice,
) -> StakeRecord {
    StakeRecord {
        id: StakeId(id),
        event_id: EVENT,
        user_id: user,
        stake_amount: amount,
        tier,
        team_choice: choice,
        stake_time: 1_700_000_000,
    }
}

fn outcome(pool: Decimal, result: MatchResult) -> EventOutcome {
    EventOutcome {
        event_id: EVENT,
        admin_pool_amount: pool,
        match_result: result,
        platform_fee_percent: dec!(5),
    }
}

/// The reference scenario: Alice stakes 6 CHZ at Full, Bob stakes 4 CHZ at
/// StakeOnly, 10 CHZ pool, 5% fee.
fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_stake(stake(1, ALICE, dec!(6), ParticipationTier::Full, TeamChoice::TeamA));
    store.add_stake(stake(2, BOB, dec!(4), ParticipationTier::StakeOnly, TeamChoice::TeamB));
    store.set_outcome(outcome(dec!(10), MatchResult::TeamAWins));
    store
}

#[test]
fn full_lifecycle_calculate_release_claim() {
    let store = seeded_store();
    let ledger = DistributionLedger::with_store(&store);

    let rows = ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap();
    assert_eq!(rows.len(), 2);

    let alice = rows.iter().find(|r| r.user_id == ALICE).unwrap();
    assert_eq!(alice.user_share_ratio, dec!(0.6));
    assert_eq!(alice.base_reward, dec!(6));
    assert_eq!(alice.platform_fee_amount, dec!(0.6));
    assert_eq!(alice.final_reward, dec!(11.4));
    assert_eq!(alice.status, DistributionStatus::Calculated);
    assert_eq!(alice.admin_pool_amount, dec!(10));

    let bob = rows.iter().find(|r| r.user_id == BOB).unwrap();
    assert_eq!(bob.user_share_ratio, dec!(0.4));
    assert_eq!(bob.base_reward, dec!(1.2));
    assert_eq!(bob.platform_fee_amount, dec!(0.26));
    assert_eq!(bob.final_reward, dec!(4.94));

    assert_eq!(ledger.release_event(EVENT).unwrap(), 2);

    let claimed = ledger.claim_reward(EVENT, ALICE, 1_700_002_000).unwrap();
    assert_eq!(claimed.status, DistributionStatus::Claimed);
    assert_eq!(claimed.claimed_at, Some(1_700_002_000));
    assert_eq!(claimed.final_reward, dec!(11.4));
}

#[test]
fn claim_is_idempotent_with_single_timestamp() {
    let store = seeded_store();
    let ledger = DistributionLedger::with_store(&store);
    ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap();
    ledger.release_event(EVENT).unwrap();

    let first = ledger.claim_reward(EVENT, BOB, 1_700_002_000).unwrap();
    let second = ledger.claim_reward(EVENT, BOB, 1_700_009_999).unwrap();

    assert_eq!(first, second);
    assert_eq!(second.claimed_at, Some(1_700_002_000));
}

#[test]
fn second_calculation_conflicts() {
    let store = seeded_store();
    let ledger = DistributionLedger::with_store(&store);
    ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap();

    let err = ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_500)
        .unwrap_err();
    assert_eq!(err, RewardError::Conflict(EVENT));

    // no duplicate rows
    assert_eq!(
        fanstake_rewards::DistributionStore::distributions_for_event(&store, EVENT).len(),
        2
    );
}

#[test]
fn poisoned_batch_persists_nothing() {
    let store = seeded_store();
    // zero-amount stake is invalid input to the engine
    store.add_stake(stake(
        3,
        UserId(3),
        dec!(0),
        ParticipationTier::Full,
        TeamChoice::Draw,
    ));
    let ledger = DistributionLedger::with_store(&store);

    let err = ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap_err();
    assert_eq!(
        err,
        RewardError::CalculationFailed {
            event_id: EVENT,
            user_id: UserId(3),
            reason: "invalid input: stake out of range".into(),
        }
    );
    assert!(err.is_retryable());
    assert!(
        fanstake_rewards::DistributionStore::distributions_for_event(&store, EVENT).is_empty()
    );
}

#[test]
fn event_without_stakes_is_a_defect() {
    let store = MemoryStore::new();
    store.set_outcome(outcome(dec!(10), MatchResult::Draw));
    let ledger = DistributionLedger::with_store(&store);

    let err = ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap_err();
    assert_eq!(err, RewardError::EmptyStakeSet(EVENT));
}

#[test]
fn cancelled_event_never_distributes() {
    let store = seeded_store();
    store.set_outcome(outcome(dec!(10), MatchResult::Cancelled));
    let ledger = DistributionLedger::with_store(&store);

    let err = ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap_err();
    assert_eq!(err, RewardError::EventCancelled(EVENT));
}

#[test]
fn missing_outcome_rejected() {
    let store = MemoryStore::new();
    store.add_stake(stake(1, ALICE, dec!(6), ParticipationTier::Full, TeamChoice::TeamA));
    let ledger = DistributionLedger::with_store(&store);

    let err = ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap_err();
    assert_eq!(err, RewardError::OutcomeNotFound(EVENT));
}

#[test]
fn claim_before_release_rejected() {
    let store = seeded_store();
    let ledger = DistributionLedger::with_store(&store);
    ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap();

    let err = ledger.claim_reward(EVENT, ALICE, 1_700_002_000).unwrap_err();
    assert_eq!(
        err,
        RewardError::NotClaimable {
            event_id: EVENT,
            user_id: ALICE,
            status: DistributionStatus::Calculated,
        }
    );

    let err = ledger
        .claim_reward(EVENT, UserId(99), 1_700_002_000)
        .unwrap_err();
    assert_eq!(
        err,
        RewardError::DistributionNotFound {
            event_id: EVENT,
            user_id: UserId(99),
        }
    );
}

#[test]
fn release_is_idempotent() {
    let store = seeded_store();
    let ledger = DistributionLedger::with_store(&store);
    ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap();

    assert_eq!(ledger.release_event(EVENT).unwrap(), 2);
    assert_eq!(ledger.release_event(EVENT).unwrap(), 0);
}

#[test]
fn override_supersedes_and_logs_both_generations() {
    let store = seeded_store();
    let ledger = DistributionLedger::with_store(&store);
    let original = ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap();

    // upstream corrects the injected pool from 10 to 20 CHZ
    store.set_outcome(outcome(dec!(20), MatchResult::TeamAWins));

    let recalculated = ledger
        .recalculate_with_override(EVENT, "pool amount corrected by finance", 1_700_005_000)
        .unwrap();

    let alice = recalculated.iter().find(|r| r.user_id == ALICE).unwrap();
    assert_eq!(alice.base_reward, dec!(12)); // 20 * 0.6 * 1.0
    assert_eq!(alice.admin_pool_amount, dec!(20));
    assert_eq!(alice.status, DistributionStatus::Calculated);

    // prior generation archived, not deleted
    let superseded = fanstake_rewards::DistributionStore::superseded_for_event(&store, EVENT);
    assert_eq!(superseded.len(), 2);
    assert_eq!(
        superseded.iter().find(|r| r.user_id == ALICE).unwrap().id,
        original.iter().find(|r| r.user_id == ALICE).unwrap().id
    );

    // audit entry holds prior and new side by side
    let log = fanstake_rewards::DistributionStore::audit_log(&store);
    assert_eq!(log.len(), 1);
    match &log[0].kind {
        AuditKind::Recalculation { reason, prior, new } => {
            assert_eq!(reason, "pool amount corrected by finance");
            assert_eq!(prior.len(), 2);
            assert_eq!(new.len(), 2);
            assert_eq!(
                prior.iter().find(|r| r.user_id == ALICE).unwrap().base_reward,
                dec!(6)
            );
            assert_eq!(
                new.iter().find(|r| r.user_id == ALICE).unwrap().base_reward,
                dec!(12)
            );
        }
        other => panic!("expected recalculation entry, got {:?}", other),
    }
}

#[test]
fn override_refused_once_claimed() {
    let store = seeded_store();
    let ledger = DistributionLedger::with_store(&store);
    ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap();
    ledger.release_event(EVENT).unwrap();
    ledger.claim_reward(EVENT, ALICE, 1_700_002_000).unwrap();

    let err = ledger
        .recalculate_with_override(EVENT, "late fix attempt", 1_700_005_000)
        .unwrap_err();
    assert_eq!(err, RewardError::Conflict(EVENT));
}

#[test]
fn override_without_prior_rows_rejected() {
    let store = seeded_store();
    let ledger = DistributionLedger::with_store(&store);

    let err = ledger
        .recalculate_with_override(EVENT, "nothing computed yet", 1_700_005_000)
        .unwrap_err();
    assert_eq!(err, RewardError::NoDistributions(EVENT));
}

#[test]
fn pool_divergence_is_reported_not_repaired() {
    let store = seeded_store();
    let ledger = DistributionLedger::with_store(&store);
    ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap();

    assert!(ledger.verify_pool_integrity(EVENT, 1_700_003_000).is_ok());

    // upstream pool changes out from under the persisted rows
    store.set_outcome(outcome(dec!(12), MatchResult::TeamAWins));

    let err = ledger
        .verify_pool_integrity(EVENT, 1_700_003_500)
        .unwrap_err();
    assert_eq!(
        err,
        RewardError::IntegrityViolation {
            event_id: EVENT,
            mismatched: 2,
        }
    );

    // rows still carry the original pool; nothing auto-corrected
    let rows = fanstake_rewards::DistributionStore::distributions_for_event(&store, EVENT);
    assert!(rows.iter().all(|r| r.admin_pool_amount == dec!(10)));

    // violation landed in the audit trail
    let log = fanstake_rewards::DistributionStore::audit_log(&store);
    assert_eq!(log.len(), 1);
    match &log[0].kind {
        AuditKind::PoolMismatch { mismatches } => {
            assert_eq!(mismatches.len(), 2);
            assert!(mismatches
                .iter()
                .all(|m| m.recorded_pool == dec!(10) && m.outcome_pool == dec!(12)));
        }
        other => panic!("expected pool mismatch entry, got {:?}", other),
    }
}

#[test]
fn conservation_holds_exactly_across_the_event() {
    let store = seeded_store();
    let ledger = DistributionLedger::with_store(&store);
    let rows = ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap();

    let total_final: Decimal = rows.iter().map(|r| r.final_reward).sum();
    let total_fee: Decimal = rows.iter().map(|r| r.platform_fee_amount).sum();
    let total_gross: Decimal = rows
        .iter()
        .map(|r| r.base_reward)
        .sum::<Decimal>()
        + dec!(6)
        + dec!(4);

    assert_eq!(total_final + total_fee, total_gross);
}

#[test]
fn events_are_independent() {
    let store = seeded_store();
    let other_event = EventId(2);
    store.add_stake(StakeRecord {
        id: StakeId(10),
        event_id: other_event,
        user_id: ALICE,
        stake_amount: dec!(5),
        tier: ParticipationTier::StakeAndMatch,
        team_choice: TeamChoice::TeamA,
        stake_time: 1_700_000_000,
    });
    store.set_outcome(EventOutcome {
        event_id: other_event,
        admin_pool_amount: dec!(8),
        match_result: MatchResult::TeamBWins,
        platform_fee_percent: dec!(5),
    });

    let ledger = DistributionLedger::with_store(&store);
    ledger
        .calculate_distributions_for_event(EVENT, 1_700_001_000)
        .unwrap();
    let rows = ledger
        .calculate_distributions_for_event(other_event, 1_700_001_000)
        .unwrap();

    // sole staker: share 1, base = 8 * 1 * 0.7 = 5.6, gross 10.6
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].base_reward, dec!(5.6));
    assert_eq!(rows[0].final_reward, dec!(10.07)); // 10.6 * 0.95
}
