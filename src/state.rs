use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

/// Lifecycle of the active round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Entry closed, waiting for the coordinator to deliver randomness
    Calculating,
}

impl Default for RaffleState {
    fn default() -> Self {
        RaffleState::Open
    }
}

/// Raffle configuration, written once at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Account that initialized the raffle
    pub admin: Pubkey,
    /// Randomness coordinator program
    pub coordinator: Pubkey,
    /// Coordinator lane (pricing / risk tier) for randomness requests
    pub key_hash: [u8; 32],
    /// Pre-funded coordinator subscription billed for requests
    pub subscription_id: u64,
    /// Minimum payment per entry in lamports
    pub entrance_fee: u64,
    /// Minimum round duration in seconds
    pub closing_interval: u64,
    /// Compute budget reserved for the fulfillment callback
    pub callback_gas_limit: u32,
    /// Capacity of the round account
    pub max_participants: u32,
    /// Bump seed of the round PDA
    pub round_bump: u8,
}

impl Sealed for Config {}

impl IsInitialized for Config {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Config {
    const LEN: usize = 1 + 32 + 32 + 32 + 8 + 8 + 8 + 4 + 4 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Config::LEN];
        let (
            is_initialized,
            admin,
            coordinator,
            key_hash,
            subscription_id,
            entrance_fee,
            closing_interval,
            callback_gas_limit,
            max_participants,
            round_bump,
        ) = array_refs![src, 1, 32, 32, 32, 8, 8, 8, 4, 4, 1];

        let is_initialized = match is_initialized {
            [0] => false,
            [1] => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(Config {
            is_initialized,
            admin: Pubkey::new_from_array(*admin),
            coordinator: Pubkey::new_from_array(*coordinator),
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            closing_interval: u64::from_le_bytes(*closing_interval),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            max_participants: u32::from_le_bytes(*max_participants),
            round_bump: round_bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Config::LEN];
        let (
            is_initialized_dst,
            admin_dst,
            coordinator_dst,
            key_hash_dst,
            subscription_id_dst,
            entrance_fee_dst,
            closing_interval_dst,
            callback_gas_limit_dst,
            max_participants_dst,
            round_bump_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 32, 8, 8, 8, 4, 4, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        admin_dst.copy_from_slice(self.admin.as_ref());
        coordinator_dst.copy_from_slice(self.coordinator.as_ref());
        *key_hash_dst = self.key_hash;
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *closing_interval_dst = self.closing_interval.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *max_participants_dst = self.max_participants.to_le_bytes();
        round_bump_dst[0] = self.round_bump;
    }
}

/// Outstanding randomness request of a closing round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    pub requested_at: UnixTimestamp,
}

/// Last settled winner
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecentWinner {
    pub winner: Pubkey,
    /// Lamports paid out
    pub prize: u64,
    pub settled_at: UnixTimestamp,
}

/// Round account data
///
/// Besides the bookkeeping below, the round account custodies the pooled
/// lamports on top of its rent-exempt reserve.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Round {
    /// Is the account initialized
    pub is_initialized: bool,
    pub state: RaffleState,
    /// Number of rounds settled so far
    pub round_index: u64,
    /// Start of the current round (initialization or last settlement)
    pub last_timestamp: UnixTimestamp,
    /// Lamports collected in the current round
    pub pool_balance: u64,
    pub pending_request: Option<PendingRequest>,
    pub recent_winner: Option<RecentWinner>,
    /// One entry per paid ticket, in entry order
    pub participants: Vec<Pubkey>,
}

impl Round {
    /// Serialized size with no participants
    pub const BASE_LEN: usize = 1 + 1 + 8 + 8 + 8 + (1 + 8 + 8) + (1 + 32 + 8 + 8) + 4;

    pub fn new(now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            last_timestamp: now,
            ..Self::default()
        }
    }

    /// Account size able to hold `max_participants` entries
    pub fn space(max_participants: u32) -> usize {
        Self::BASE_LEN + 32 * max_participants as usize
    }

    pub fn unpack(src: &[u8]) -> Result<Self, ProgramError> {
        let round =
            Self::deserialize(&mut &src[..]).map_err(|_| ProgramError::InvalidAccountData)?;
        if !round.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(round)
    }

    pub fn pack(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        let mut writer: &mut [u8] = dst;
        self.serialize(&mut writer)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    pub fn is_open(&self) -> bool {
        self.state == RaffleState::Open
    }

    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.participants.get(index)
    }

    pub fn number_of_players(&self) -> usize {
        self.participants.len()
    }

    pub fn recent_winner(&self) -> Option<&Pubkey> {
        self.recent_winner.as_ref().map(|w| &w.winner)
    }
}
