use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData = 0,

    /// Payment is below the entrance fee
    #[error("Payment is below the entrance fee")]
    InsufficientPayment = 1,

    /// Entries are only accepted while the round is open
    #[error("Round is not open")]
    RoundNotOpen = 2,

    /// The round account has no room for another entry
    #[error("Raffle is full")]
    RaffleFull = 3,

    /// The round cannot be closed yet
    #[error("Upkeep not needed")]
    UpkeepNotNeeded = 4,

    /// Fulfillment does not match the pending randomness request
    #[error("Unknown randomness request")]
    UnknownRequest = 5,

    /// The prize could not be moved to the winner
    #[error("Prize transfer failed")]
    TransferFailed = 6,

    /// Fulfillment must carry at least one random word
    #[error("Fulfillment carried no random words")]
    InvalidRandomWords = 7,

    /// Winner account does not match the selected participant
    #[error("Winner account does not match the selected participant")]
    WinnerAccountMismatch = 8,

    /// Fulfillment was not signed by the coordinator authority
    #[error("Caller is not the randomness coordinator")]
    NotCoordinator = 9,

    /// Coordinator did not hand back a request id
    #[error("Coordinator returned no request id")]
    MissingRequestId = 10,

    /// A request is already outstanding for this round
    #[error("Randomness request already pending")]
    RequestAlreadyPending = 11,

    /// Settlement needs at least one entry
    #[error("Round has no players")]
    NoPlayers = 12,

    /// Raffle parameters rejected at initialization
    #[error("Invalid raffle configuration")]
    InvalidConfig = 13,

    /// Pool balance would exceed u64
    #[error("Pool balance overflow")]
    PoolOverflow = 14,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
