// Randomness coordinator integration: outbound requests and the fulfillment callback
use crate::error::RaffleError;
use crate::settlement::{self, PrizeTransfer};
use crate::state::{Config, PendingRequest, RecentWinner, Round};

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    clock::UnixTimestamp,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
};
use std::convert::TryInto;

/// Random words requested per round
pub const NUM_WORDS: u32 = 1;
/// Blocks the coordinator waits before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Upper bound on words accepted in a single fulfillment
pub const MAX_RANDOM_WORDS: usize = 8;
/// Seed of the coordinator PDA that signs fulfillments
pub const COORDINATOR_AUTHORITY_SEED: &[u8] = b"coordinator";

/// Instructions understood by the randomness coordinator
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorInstruction {
    /// Request random words on behalf of the signing requester
    ///
    /// Accounts expected:
    /// 0. `[signer]` The requester (raffle round PDA)
    /// Remaining accounts are coordinator specific (subscription, queue, ...)
    ///
    /// The coordinator sets the request id as little-endian `u64` return data.
    RequestRandomWords {
        key_hash: [u8; 32],
        subscription_id: u64,
        request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    },
}

/// Parameters of one randomness request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomWordsRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl RandomWordsRequest {
    pub fn from_config(config: &Config) -> Self {
        Self {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: config.callback_gas_limit,
            num_words: NUM_WORDS,
        }
    }
}

impl From<RandomWordsRequest> for CoordinatorInstruction {
    fn from(request: RandomWordsRequest) -> Self {
        CoordinatorInstruction::RequestRandomWords {
            key_hash: request.key_hash,
            subscription_id: request.subscription_id,
            request_confirmations: request.request_confirmations,
            callback_gas_limit: request.callback_gas_limit,
            num_words: request.num_words,
        }
    }
}

/// Source of randomness requests
///
/// Issuing a request never blocks on the result. The value arrives later
/// through [`fulfill_random_words`], correlated only by the returned id.
pub trait RandomnessCoordinator {
    fn request_random_words(&mut self, request: &RandomWordsRequest) -> Result<u64, ProgramError>;
}

/// Coordinator reached through a cross-program invocation
pub struct CpiCoordinator<'a, 'info> {
    pub coordinator_program: &'a AccountInfo<'info>,
    /// Round PDA, signs as the requester
    pub requester: &'a AccountInfo<'info>,
    pub requester_seeds: &'a [&'a [u8]],
    /// Extra accounts forwarded to the coordinator as-is
    pub remaining: &'a [AccountInfo<'info>],
}

impl<'a, 'info> RandomnessCoordinator for CpiCoordinator<'a, 'info> {
    fn request_random_words(&mut self, request: &RandomWordsRequest) -> Result<u64, ProgramError> {
        let data = CoordinatorInstruction::from(*request)
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidInstructionData)?;

        let mut accounts = vec![AccountMeta::new_readonly(*self.requester.key, true)];
        accounts.extend(self.remaining.iter().map(|acc| AccountMeta {
            pubkey: *acc.key,
            is_signer: acc.is_signer,
            is_writable: acc.is_writable,
        }));

        let mut account_infos = Vec::with_capacity(self.remaining.len() + 2);
        account_infos.push(self.requester.clone());
        account_infos.extend(self.remaining.iter().cloned());
        account_infos.push(self.coordinator_program.clone());

        invoke_signed(
            &Instruction {
                program_id: *self.coordinator_program.key,
                accounts,
                data,
            },
            &account_infos,
            &[self.requester_seeds],
        )?;

        let (program_id, return_data) = get_return_data().ok_or(RaffleError::MissingRequestId)?;
        if program_id != *self.coordinator_program.key {
            msg!("Return data set by {} instead of the coordinator", program_id);
            return Err(RaffleError::MissingRequestId.into());
        }
        let request_id: [u8; 8] = return_data
            .get(..8)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(RaffleError::MissingRequestId)?;

        Ok(u64::from_le_bytes(request_id))
    }
}

/// Address that must sign fulfillments coming from `coordinator`
pub fn coordinator_authority(coordinator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COORDINATOR_AUTHORITY_SEED], coordinator)
}

/// Accept the coordinator's answer for the pending request and settle the round.
///
/// Anything but the exact pending id is rejected before touching state, so
/// forged, stale and replayed fulfillments all fail with `UnknownRequest`.
pub fn fulfill_random_words(
    round: &mut Round,
    request_id: u64,
    random_words: &[[u8; 32]],
    now: UnixTimestamp,
    transfer: &mut impl PrizeTransfer,
) -> Result<RecentWinner, ProgramError> {
    let pending: PendingRequest = match round.pending_request {
        Some(pending) if pending.request_id == request_id => pending,
        Some(pending) => {
            msg!(
                "Fulfillment for request {} does not match pending request {}",
                request_id,
                pending.request_id
            );
            return Err(RaffleError::UnknownRequest.into());
        }
        None => {
            msg!("No randomness request pending, rejecting request {}", request_id);
            return Err(RaffleError::UnknownRequest.into());
        }
    };

    let random_word = random_words.first().ok_or(RaffleError::InvalidRandomWords)?;

    let recent_winner = settlement::settle(round, random_word, now, transfer)?;
    round.pending_request = None;

    msg!(
        "Request {} fulfilled {}s after it was issued",
        pending.request_id,
        now.saturating_sub(pending.requested_at)
    );
    Ok(recent_winner)
}
