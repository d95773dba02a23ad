use crate::admission::{self, UpkeepStatus};
use crate::error::RaffleError;
use crate::state::{Config, PendingRequest, RaffleState, Round};
use crate::vrf::{RandomWordsRequest, RandomnessCoordinator};

use solana_program::{clock::UnixTimestamp, msg, program_error::ProgramError};

/// Close entry and request randomness for the current round.
///
/// The admission check is repeated here against the state this
/// transaction actually sees. Returns the coordinator's request id, which
/// becomes the round's single pending request.
pub fn perform_upkeep(
    round: &mut Round,
    config: &Config,
    now: UnixTimestamp,
    coordinator: &mut impl RandomnessCoordinator,
) -> Result<u64, ProgramError> {
    let status = admission::check_upkeep(round, config, now);
    if !status.upkeep_needed() {
        log_rejection(round, &status);
        return Err(RaffleError::UpkeepNotNeeded.into());
    }

    if let Some(pending) = round.pending_request {
        msg!(
            "Open round still holds pending request {}",
            pending.request_id
        );
        return Err(RaffleError::RequestAlreadyPending.into());
    }

    let request_id = coordinator.request_random_words(&RandomWordsRequest::from_config(config))?;

    round.pending_request = Some(PendingRequest {
        request_id,
        requested_at: now,
    });
    round.state = RaffleState::Calculating;

    Ok(request_id)
}

fn log_rejection(round: &Round, status: &UpkeepStatus) {
    msg!(
        "Upkeep not needed: balance={}, players={}, state={:?}",
        round.pool_balance,
        round.participants.len(),
        round.state
    );
    if status.is_open && !status.interval_elapsed {
        msg!("Closing interval has not elapsed yet");
    }
}
