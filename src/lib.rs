// Self-operating raffle program
// Rounds close on a keeper trigger and settle on coordinator-supplied randomness

pub mod admission;
pub mod error;
pub mod events;
pub mod instruction;
pub mod ledger;
pub mod processor;
pub mod settlement;
pub mod state;
pub mod upkeep;
pub mod utils;
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use crate::error::RaffleError;
use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, program_error::PrintProgramError,
    pubkey::Pubkey,
};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    if let Err(error) = processor::Processor::process(program_id, accounts, instruction_data) {
        // Log the error text before failing the instruction
        error.print::<RaffleError>();
        return Err(error);
    }
    Ok(())
}
