use crate::error::RaffleError;
use crate::state::{RaffleState, RecentWinner, Round};

use solana_program::{
    account_info::AccountInfo, clock::UnixTimestamp, msg, program_error::ProgramError,
    pubkey::Pubkey,
};

/// Pays the prize out of the round's custody
pub trait PrizeTransfer {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError>;
}

/// Moves lamports from the program-owned round account to the winner account
pub struct LamportTransfer<'a, 'info> {
    pub source: &'a AccountInfo<'info>,
    pub recipient: &'a AccountInfo<'info>,
}

impl<'a, 'info> PrizeTransfer for LamportTransfer<'a, 'info> {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        if self.recipient.key != winner {
            msg!(
                "Winner account {} does not match selected winner {}",
                self.recipient.key,
                winner
            );
            return Err(RaffleError::WinnerAccountMismatch.into());
        }

        if !self.recipient.is_writable || self.recipient.executable {
            msg!("Winner account {} cannot receive lamports", winner);
            return Err(RaffleError::TransferFailed.into());
        }

        let source_lamports = self
            .source
            .lamports()
            .checked_sub(amount)
            .ok_or(RaffleError::TransferFailed)?;
        let recipient_lamports = self
            .recipient
            .lamports()
            .checked_add(amount)
            .ok_or(RaffleError::TransferFailed)?;

        **self.source.try_borrow_mut_lamports()? = source_lamports;
        **self.recipient.try_borrow_mut_lamports()? = recipient_lamports;
        Ok(())
    }
}

/// Reduce a 32-byte big-endian random word modulo the number of players
pub fn winner_index(random_word: &[u8; 32], players: usize) -> Option<usize> {
    if players == 0 {
        return None;
    }

    let modulus = players as u128;
    let index = random_word
        .iter()
        .fold(0u128, |acc, byte| (acc * 256 + *byte as u128) % modulus);
    Some(index as usize)
}

/// Big-endian random word holding `value`
pub fn word_from_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Pick the winner, pay the whole pool and reopen the round.
///
/// The payout is the only fallible step and runs before any field is
/// written; on failure the round is left exactly as it was (still
/// calculating, funds retained).
pub fn settle(
    round: &mut Round,
    random_word: &[u8; 32],
    now: UnixTimestamp,
    transfer: &mut impl PrizeTransfer,
) -> Result<RecentWinner, ProgramError> {
    let winner = winner_index(random_word, round.participants.len())
        .and_then(|index| round.participants.get(index).copied())
        .ok_or(RaffleError::NoPlayers)?;
    let prize = round.pool_balance;

    transfer.transfer(&winner, prize)?;

    let recent_winner = RecentWinner {
        winner,
        prize,
        settled_at: now,
    };
    round.recent_winner = Some(recent_winner);
    round.participants.clear();
    round.pool_balance = 0;
    round.last_timestamp = now;
    round.round_index = round.round_index.saturating_add(1);
    round.state = RaffleState::Open;

    Ok(recent_winner)
}
