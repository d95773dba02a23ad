use solana_program::{decode_error::DecodeError, program_error::ProgramError, pubkey::Pubkey};

use solraffle::{
    admission::check_upkeep,
    error::RaffleError,
    events::{RaffleEvent, EVENT_TAG},
    ledger::enter,
    settlement::{winner_index, word_from_u64, PrizeTransfer},
    state::{Config, RaffleState, Round},
    upkeep::perform_upkeep,
    vrf::{
        fulfill_random_words, RandomWordsRequest, RandomnessCoordinator, NUM_WORDS,
        REQUEST_CONFIRMATIONS,
    },
};

// Coordinator that hands out sequential request ids
#[derive(Default)]
struct MockCoordinator {
    last_id: u64,
    requests: Vec<RandomWordsRequest>,
    fail: bool,
}

impl RandomnessCoordinator for MockCoordinator {
    fn request_random_words(&mut self, request: &RandomWordsRequest) -> Result<u64, ProgramError> {
        if self.fail {
            return Err(ProgramError::InsufficientFunds);
        }
        self.requests.push(*request);
        self.last_id += 1;
        Ok(self.last_id)
    }
}

// Records payouts instead of moving lamports
#[derive(Default)]
struct MockTransfer {
    payouts: Vec<(Pubkey, u64)>,
    reject: bool,
}

impl PrizeTransfer for MockTransfer {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        if self.reject {
            return Err(RaffleError::TransferFailed.into());
        }
        self.payouts.push((*winner, amount));
        Ok(())
    }
}

fn test_config(entrance_fee: u64, closing_interval: u64) -> Config {
    Config {
        is_initialized: true,
        admin: Pubkey::new_unique(),
        coordinator: Pubkey::new_unique(),
        key_hash: [7u8; 32],
        subscription_id: 42,
        entrance_fee,
        closing_interval,
        callback_gas_limit: 500_000,
        max_participants: 16,
        round_bump: 255,
    }
}

// Round opened at t=0 with `players` exact-fee entries, closed at `close_at`
fn closed_round(config: &Config, players: &[Pubkey], close_at: i64) -> (Round, MockCoordinator, u64) {
    let mut round = Round::new(0);
    for player in players {
        enter(&mut round, config, *player, config.entrance_fee).unwrap();
    }
    let mut coordinator = MockCoordinator::default();
    let request_id = perform_upkeep(&mut round, config, close_at, &mut coordinator).unwrap();
    (round, coordinator, request_id)
}

#[test]
fn test_pool_tracks_exact_fee_entries() {
    let config = test_config(100, 30);
    let mut round = Round::new(0);

    for count in 1..=5u64 {
        enter(&mut round, &config, Pubkey::new_unique(), 100).unwrap();
        assert_eq!(round.pool_balance, config.entrance_fee * count);
        assert_eq!(round.number_of_players() as u64, count);
    }
}

#[test]
fn test_enter_below_fee_is_rejected() {
    let config = test_config(100, 30);
    let mut round = Round::new(0);
    let player = Pubkey::new_unique();
    enter(&mut round, &config, player, 100).unwrap();
    let before = round.clone();

    assert_eq!(
        enter(&mut round, &config, Pubkey::new_unique(), 99),
        Err(RaffleError::InsufficientPayment)
    );
    assert_eq!(round, before);
}

#[test]
fn test_duplicate_entries_and_overpayment_are_kept() {
    let config = test_config(100, 30);
    let mut round = Round::new(0);
    let player = Pubkey::new_unique();

    enter(&mut round, &config, player, 100).unwrap();
    enter(&mut round, &config, player, 150).unwrap();

    assert_eq!(round.participants, vec![player, player]);
    assert_eq!(round.player(1), Some(&player));
    assert_eq!(round.pool_balance, 250);
}

#[test]
fn test_pool_overflow_is_rejected() {
    let config = test_config(100, 30);
    let mut round = Round::new(0);
    enter(&mut round, &config, Pubkey::new_unique(), u64::MAX - 50).unwrap();
    let before = round.clone();

    assert_eq!(
        enter(&mut round, &config, Pubkey::new_unique(), 100),
        Err(RaffleError::PoolOverflow)
    );
    assert_eq!(round, before);
}

#[test]
fn test_custom_error_codes_decode() {
    assert_eq!(
        <RaffleError as DecodeError<RaffleError>>::decode_custom_error_to_enum(5),
        Some(RaffleError::UnknownRequest)
    );
    assert_eq!(
        <RaffleError as DecodeError<RaffleError>>::decode_custom_error_to_enum(14),
        Some(RaffleError::PoolOverflow)
    );
    assert_eq!(
        <RaffleError as DecodeError<RaffleError>>::decode_custom_error_to_enum(99),
        None
    );
    assert_eq!(
        ProgramError::from(RaffleError::PoolOverflow),
        ProgramError::Custom(14)
    );
}

#[test]
fn test_enter_rejected_when_full() {
    let mut config = test_config(100, 30);
    config.max_participants = 2;
    let mut round = Round::new(0);

    enter(&mut round, &config, Pubkey::new_unique(), 100).unwrap();
    enter(&mut round, &config, Pubkey::new_unique(), 100).unwrap();
    assert_eq!(
        enter(&mut round, &config, Pubkey::new_unique(), 100),
        Err(RaffleError::RaffleFull)
    );
    assert_eq!(round.pool_balance, 200);
}

#[test]
fn test_check_upkeep_conditions() {
    let config = test_config(100, 30);
    let mut round = Round::new(0);

    // Fresh raffle: nothing collected, interval not elapsed
    let status = check_upkeep(&round, &config, 0);
    assert!(!status.upkeep_needed());
    assert!(status.is_open);
    assert!(!status.interval_elapsed);

    // Interval elapsed but nobody entered
    assert!(!check_upkeep(&round, &config, 31).upkeep_needed());

    enter(&mut round, &config, Pubkey::new_unique(), 100).unwrap();
    assert!(!check_upkeep(&round, &config, 29).upkeep_needed());
    assert!(check_upkeep(&round, &config, 30).upkeep_needed());
    assert!(check_upkeep(&round, &config, 31).upkeep_needed());

    // Clock behind the round start never counts as elapsed
    assert!(!check_upkeep(&round, &config, -5).interval_elapsed);
}

#[test]
fn test_perform_upkeep_requires_elapsed_interval() {
    let config = test_config(100, 30);
    let mut round = Round::new(0);
    enter(&mut round, &config, Pubkey::new_unique(), 100).unwrap();
    let before = round.clone();
    let mut coordinator = MockCoordinator::default();

    assert_eq!(
        perform_upkeep(&mut round, &config, 10, &mut coordinator),
        Err(RaffleError::UpkeepNotNeeded.into())
    );
    assert_eq!(round, before);
    assert!(coordinator.requests.is_empty());
}

#[test]
fn test_perform_upkeep_opens_single_request() {
    let config = test_config(100, 30);
    let player = Pubkey::new_unique();
    let (mut round, mut coordinator, request_id) = closed_round(&config, &[player], 31);

    assert_eq!(round.state, RaffleState::Calculating);
    let pending = round.pending_request.unwrap();
    assert_eq!(pending.request_id, request_id);
    assert_eq!(pending.requested_at, 31);

    assert_eq!(
        coordinator.requests,
        vec![RandomWordsRequest {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: config.callback_gas_limit,
            num_words: NUM_WORDS,
        }]
    );

    // Second close before fulfillment
    assert_eq!(
        perform_upkeep(&mut round, &config, 60, &mut coordinator),
        Err(RaffleError::UpkeepNotNeeded.into())
    );
    assert_eq!(coordinator.requests.len(), 1);
    assert_eq!(round.pending_request, Some(pending));

    // Entries are refused while calculating
    assert_eq!(
        enter(&mut round, &config, Pubkey::new_unique(), 100),
        Err(RaffleError::RoundNotOpen)
    );
}

#[test]
fn test_coordinator_failure_leaves_round_open() {
    let config = test_config(100, 30);
    let mut round = Round::new(0);
    enter(&mut round, &config, Pubkey::new_unique(), 100).unwrap();
    let before = round.clone();
    let mut coordinator = MockCoordinator {
        fail: true,
        ..MockCoordinator::default()
    };

    assert_eq!(
        perform_upkeep(&mut round, &config, 31, &mut coordinator),
        Err(ProgramError::InsufficientFunds)
    );
    assert_eq!(round, before);
}

#[test]
fn test_fulfill_with_unknown_id_changes_nothing() {
    let config = test_config(100, 30);
    let (mut round, _, request_id) = closed_round(&config, &[Pubkey::new_unique()], 31);
    let before = round.clone();
    let mut transfer = MockTransfer::default();

    assert_eq!(
        fulfill_random_words(&mut round, request_id + 1, &[word_from_u64(3)], 40, &mut transfer),
        Err(RaffleError::UnknownRequest.into())
    );
    assert_eq!(round, before);
    assert!(transfer.payouts.is_empty());
}

#[test]
fn test_fulfill_before_any_request_is_unknown() {
    let config = test_config(100, 30);
    let mut round = Round::new(0);
    enter(&mut round, &config, Pubkey::new_unique(), 100).unwrap();
    let mut transfer = MockTransfer::default();

    assert_eq!(
        fulfill_random_words(&mut round, 0, &[word_from_u64(1)], 5, &mut transfer),
        Err(RaffleError::UnknownRequest.into())
    );
    assert!(round.is_open());
}

#[test]
fn test_fulfill_without_words_is_rejected() {
    let config = test_config(100, 30);
    let (mut round, _, request_id) = closed_round(&config, &[Pubkey::new_unique()], 31);
    let before = round.clone();
    let mut transfer = MockTransfer::default();

    assert_eq!(
        fulfill_random_words(&mut round, request_id, &[], 40, &mut transfer),
        Err(RaffleError::InvalidRandomWords.into())
    );
    assert_eq!(round, before);
}

#[test]
fn test_settlement_picks_word_mod_players() {
    let config = test_config(100, 30);
    let players: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
    let (mut round, _, request_id) = closed_round(&config, &players, 31);
    let mut transfer = MockTransfer::default();

    let recent =
        fulfill_random_words(&mut round, request_id, &[word_from_u64(17)], 45, &mut transfer)
            .unwrap();

    // 17 mod 4 = 1
    assert_eq!(recent.winner, players[1]);
    assert_eq!(recent.prize, 400);
    assert_eq!(recent.settled_at, 45);
    assert_eq!(transfer.payouts, vec![(players[1], 400)]);

    assert_eq!(round.pool_balance, 0);
    assert!(round.participants.is_empty());
    assert_eq!(round.recent_winner(), Some(&players[1]));
    assert_eq!(round.state, RaffleState::Open);
    assert_eq!(round.pending_request, None);
    assert_eq!(round.last_timestamp, 45);
    assert_eq!(round.round_index, 1);
}

#[test]
fn test_failed_payout_keeps_round_calculating() {
    let config = test_config(100, 30);
    let players = [Pubkey::new_unique(), Pubkey::new_unique()];
    let (mut round, _, request_id) = closed_round(&config, &players, 31);
    let before = round.clone();
    let mut transfer = MockTransfer {
        reject: true,
        ..MockTransfer::default()
    };

    assert_eq!(
        fulfill_random_words(&mut round, request_id, &[word_from_u64(1)], 40, &mut transfer),
        Err(RaffleError::TransferFailed.into())
    );
    assert_eq!(round, before);
    assert_eq!(round.state, RaffleState::Calculating);
    assert_eq!(round.pool_balance, 200);
    assert!(round.recent_winner.is_none());
}

#[test]
fn test_full_cycle_and_replay() {
    let config = test_config(100, 30);
    let mut round = Round::new(0);
    let first = Pubkey::new_unique();
    enter(&mut round, &config, first, 100).unwrap();

    assert!(check_upkeep(&round, &config, 31).upkeep_needed());

    let mut coordinator = MockCoordinator::default();
    let request_id = perform_upkeep(&mut round, &config, 31, &mut coordinator).unwrap();

    let mut transfer = MockTransfer::default();
    let word = word_from_u64(987_654_321);
    fulfill_random_words(&mut round, request_id, &[word], 50, &mut transfer).unwrap();
    assert_eq!(round.recent_winner(), Some(&first));
    assert!(round.is_open());

    // Replayed delivery of the same message
    let settled = round.clone();
    assert_eq!(
        fulfill_random_words(&mut round, request_id, &[word], 51, &mut transfer),
        Err(RaffleError::UnknownRequest.into())
    );
    assert_eq!(round, settled);
    assert_eq!(transfer.payouts.len(), 1);

    // New round accepts entries and restarts the interval
    let second = Pubkey::new_unique();
    enter(&mut round, &config, second, 100).unwrap();
    assert_eq!(round.participants, vec![second]);
    assert!(!check_upkeep(&round, &config, 60).upkeep_needed());
    assert!(check_upkeep(&round, &config, 80).upkeep_needed());

    let next_id = perform_upkeep(&mut round, &config, 80, &mut coordinator).unwrap();
    assert_ne!(next_id, request_id);
}

#[test]
fn test_winner_index_uses_whole_word() {
    assert_eq!(winner_index(&word_from_u64(17), 4), Some(1));
    assert_eq!(winner_index(&word_from_u64(17), 0), None);

    // 2^256 - 1 is 3 mod 4 and 0 mod 3
    let max = [0xffu8; 32];
    assert_eq!(winner_index(&max, 4), Some(3));
    assert_eq!(winner_index(&max, 3), Some(0));

    // 2^64 mod 10 = 6
    let mut word = [0u8; 32];
    word[23] = 1;
    assert_eq!(winner_index(&word, 10), Some(6));
}

#[test]
fn test_round_account_layout() {
    let config = test_config(100, 30);
    let mut round = Round::new(12);
    for _ in 0..config.max_participants {
        enter(&mut round, &config, Pubkey::new_unique(), 100).unwrap();
    }
    round.recent_winner = Some(solraffle::state::RecentWinner {
        winner: Pubkey::new_unique(),
        prize: 1,
        settled_at: 3,
    });
    round.pending_request = Some(solraffle::state::PendingRequest {
        request_id: 9,
        requested_at: 11,
    });

    let mut data = vec![0u8; Round::space(config.max_participants)];
    assert_eq!(Round::unpack(&data), Err(ProgramError::UninitializedAccount));

    round.pack(&mut data).unwrap();
    assert_eq!(Round::unpack(&data).unwrap(), round);

    // One byte short of a full round
    let mut short = vec![0u8; Round::space(config.max_participants) - 1];
    assert_eq!(round.pack(&mut short), Err(ProgramError::AccountDataTooSmall));
}

#[test]
fn test_event_decoding() {
    let event = RaffleEvent::ClosingRequested { request_id: 5 };
    let payload = borsh::BorshSerialize::try_to_vec(&event).unwrap();

    assert_eq!(RaffleEvent::decode(&[EVENT_TAG, payload.as_slice()]), Some(event));
    assert_eq!(RaffleEvent::decode(&[b"other".as_ref(), payload.as_slice()]), None);
}
