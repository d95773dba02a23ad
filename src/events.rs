// Raffle notifications, logged as text and as borsh-encoded program data
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

/// Prefix of every event record in the program data log
pub const EVENT_TAG: &[u8] = b"raffle";

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    EnteredRound { player: Pubkey, payment: u64 },
    ClosingRequested { request_id: u64 },
    WinnerPicked { winner: Pubkey, prize: u64 },
}

impl RaffleEvent {
    pub fn emit(&self) {
        match self {
            RaffleEvent::EnteredRound { player, payment } => {
                msg!("EnteredRound: player={}, payment={}", player, payment)
            }
            RaffleEvent::ClosingRequested { request_id } => {
                msg!("ClosingRequested: request_id={}", request_id)
            }
            RaffleEvent::WinnerPicked { winner, prize } => {
                msg!("WinnerPicked: winner={}, prize={}", winner, prize)
            }
        }

        match self.try_to_vec() {
            Ok(payload) => sol_log_data(&[EVENT_TAG, &payload]),
            Err(e) => msg!("Failed to encode event data: {}", e),
        }
    }

    /// Decode an event from the fields of a program data log entry
    pub fn decode(fields: &[&[u8]]) -> Option<Self> {
        match fields {
            [tag, payload] if *tag == EVENT_TAG => Self::try_from_slice(payload).ok(),
            _ => None,
        }
    }
}
