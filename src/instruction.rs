use crate::error::RaffleError;
use crate::utils::{find_config_address, find_round_address};
use crate::vrf::MAX_RANDOM_WORDS;

use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;

/// Parameters fixed when the raffle is created
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleParams {
    /// Minimum payment per entry in lamports
    pub entrance_fee: u64,
    /// Minimum round duration in seconds
    pub closing_interval: u64,
    /// Coordinator lane for randomness requests
    pub key_hash: [u8; 32],
    /// Coordinator subscription billed for requests
    pub subscription_id: u64,
    /// Compute budget reserved for the fulfillment callback
    pub callback_gas_limit: u32,
    /// Number of entries the round account can hold
    pub max_participants: u32,
}

impl RaffleParams {
    const LEN: usize = 8 + 8 + 32 + 8 + 4 + 4;
}

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the config and round accounts and open the first round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The admin, pays for both accounts
    /// 1. `[writable]` The config account (PDA)
    /// 2. `[writable]` The round account (PDA)
    /// 3. `[]` The randomness coordinator program
    /// 4. `[]` The system program
    InitializeRaffle(RaffleParams),

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player, pays `payment` lamports
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        payment: u64,
    },

    /// Report whether the round may close, as one byte of return data
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[]` The round account
    CheckUpkeep,

    /// Close entry and request randomness (anyone may call)
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[]` The randomness coordinator program
    /// Remaining accounts are forwarded to the coordinator
    PerformUpkeep,

    /// Deliver randomness for the pending request
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator authority PDA
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[writable]` The selected winner
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<[u8; 32]>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                if rest.len() < RaffleParams::LEN {
                    return Err(RaffleError::InvalidInstructionData.into());
                }
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (closing_interval, rest) = Self::unpack_u64(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, rest) = Self::unpack_u32(rest)?;
                let (max_participants, _) = Self::unpack_u32(rest)?;
                Self::InitializeRaffle(RaffleParams {
                    entrance_fee,
                    closing_interval,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                    max_participants,
                })
            }
            1 => {
                let (payment, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { payment }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (count, mut rest) = rest
                    .split_first()
                    .ok_or(RaffleError::InvalidInstructionData)?;
                let count = *count as usize;
                if count > MAX_RANDOM_WORDS {
                    return Err(RaffleError::InvalidRandomWords.into());
                }
                let mut random_words = Vec::with_capacity(count);
                for _ in 0..count {
                    let (word, next) = Self::unpack_fixed_bytes::<32>(rest)?;
                    random_words.push(word);
                    rest = next;
                }
                Self::FulfillRandomWords {
                    request_id,
                    random_words,
                }
            }
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::InitializeRaffle(params) => {
                buf.reserve(1 + RaffleParams::LEN);
                buf.push(0);
                buf.extend_from_slice(&params.entrance_fee.to_le_bytes());
                buf.extend_from_slice(&params.closing_interval.to_le_bytes());
                buf.extend_from_slice(&params.key_hash);
                buf.extend_from_slice(&params.subscription_id.to_le_bytes());
                buf.extend_from_slice(&params.callback_gas_limit.to_le_bytes());
                buf.extend_from_slice(&params.max_participants.to_le_bytes());
            }
            Self::EnterRaffle { payment } => {
                buf.push(1);
                buf.extend_from_slice(&payment.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.push(random_words.len() as u8);
                for word in random_words {
                    buf.extend_from_slice(word);
                }
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(N);
        let bytes: [u8; N] = bytes
            .try_into()
            .map_err(|_| RaffleError::InvalidInstructionData)?;
        Ok((bytes, rest))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    admin: &Pubkey,
    coordinator: &Pubkey,
    params: RaffleParams,
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(config, false),
            AccountMeta::new(round, false),
            AccountMeta::new_readonly(*coordinator, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::InitializeRaffle(params).pack(),
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(program_id: &Pubkey, player: &Pubkey, payment: u64) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*player, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(round, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::EnterRaffle { payment }.pack(),
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(config, false),
            AccountMeta::new_readonly(round, false),
        ],
        data: RaffleInstruction::CheckUpkeep.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    coordinator: &Pubkey,
    coordinator_accounts: &[AccountMeta],
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);

    let mut accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new_readonly(config, false),
        AccountMeta::new(round, false),
        AccountMeta::new_readonly(*coordinator, false),
    ];
    accounts.extend_from_slice(coordinator_accounts);

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::PerformUpkeep.pack(),
    }
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    coordinator_authority: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_words: Vec<[u8; 32]>,
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (round, _) = find_round_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*coordinator_authority, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(round, false),
            AccountMeta::new(*winner, false),
        ],
        data: RaffleInstruction::FulfillRandomWords {
            request_id,
            random_words,
        }
        .pack(),
    }
}
