use crate::error::RaffleError;
use crate::state::{Config, Round};

use solana_program::{msg, pubkey::Pubkey};

/// Record a paid entry for `player`.
///
/// Every call appends one entry, so a player entering twice holds two
/// chances. The full `payment` is added to the pool, overpayment included.
pub fn enter(
    round: &mut Round,
    config: &Config,
    player: Pubkey,
    payment: u64,
) -> Result<(), RaffleError> {
    if !round.is_open() {
        msg!("Round is not open, state={:?}", round.state);
        return Err(RaffleError::RoundNotOpen);
    }

    if payment < config.entrance_fee {
        msg!(
            "Payment of {} lamports is below the entrance fee of {}",
            payment,
            config.entrance_fee
        );
        return Err(RaffleError::InsufficientPayment);
    }

    if round.participants.len() >= config.max_participants as usize {
        msg!("Raffle is full: {} entries", round.participants.len());
        return Err(RaffleError::RaffleFull);
    }

    let pool_balance = round
        .pool_balance
        .checked_add(payment)
        .ok_or(RaffleError::PoolOverflow)?;

    round.participants.push(player);
    round.pool_balance = pool_balance;
    Ok(())
}
