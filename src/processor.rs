use crate::admission;
use crate::error::RaffleError;
use crate::events::RaffleEvent;
use crate::instruction::{RaffleInstruction, RaffleParams};
use crate::ledger;
use crate::settlement::LamportTransfer;
use crate::state::{Config, Round};
use crate::upkeep;
use crate::utils::{find_config_address, find_round_address, CONFIG_SEED, ROUND_SEED};
use crate::vrf::{self, coordinator_authority, CpiCoordinator};

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::{ProgramResult, MAX_PERMITTED_DATA_INCREASE},
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle(params) => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(accounts, params, program_id)
            }
            RaffleInstruction::EnterRaffle { payment } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, payment, program_id)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    /// Create the config and round accounts and open the first round
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        params: RaffleParams,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !admin_info.is_signer {
            msg!("Admin must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        // A single-entry pool must leave an emptied winner account rent exempt
        let rent = Rent::get()?;
        let round_space = Round::space(params.max_participants);
        if params.entrance_fee < rent.minimum_balance(0)
            || params.callback_gas_limit == 0
            || params.max_participants == 0
            || round_space > MAX_PERMITTED_DATA_INCREASE
        {
            msg!("Rejected raffle parameters: {:?}", params);
            return Err(RaffleError::InvalidConfig.into());
        }

        let (expected_config, config_bump) = find_config_address(program_id);
        if *config_info.key != expected_config {
            msg!("Invalid config account address");
            return Err(ProgramError::InvalidSeeds);
        }
        let (expected_round, round_bump) = find_round_address(program_id);
        if *round_info.key != expected_round {
            msg!("Invalid round account address");
            return Err(ProgramError::InvalidSeeds);
        }

        if config_info.owner == program_id || round_info.owner == program_id {
            msg!("Raffle is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        Self::create_pda_account(
            admin_info,
            config_info,
            system_program_info,
            &rent,
            Config::LEN,
            &[CONFIG_SEED, &[config_bump]],
            program_id,
        )?;
        Self::create_pda_account(
            admin_info,
            round_info,
            system_program_info,
            &rent,
            round_space,
            &[ROUND_SEED, &[round_bump]],
            program_id,
        )?;

        let now = Clock::get()?.unix_timestamp;
        let config = Config {
            is_initialized: true,
            admin: *admin_info.key,
            coordinator: *coordinator_info.key,
            key_hash: params.key_hash,
            subscription_id: params.subscription_id,
            entrance_fee: params.entrance_fee,
            closing_interval: params.closing_interval,
            callback_gas_limit: params.callback_gas_limit,
            max_participants: params.max_participants,
            round_bump,
        };
        Config::pack(config, &mut config_info.try_borrow_mut_data()?)?;
        Round::new(now).pack(&mut round_info.try_borrow_mut_data()?)?;

        msg!(
            "Raffle initialized: EntranceFee={}, Interval={}s, Coordinator={}, Capacity={}",
            config.entrance_fee,
            config.closing_interval,
            config.coordinator,
            config.max_participants
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        payment: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Self::load_config(config_info, program_id)?;
        Self::check_round_account(round_info, &config, program_id)?;

        let mut round = Round::unpack(&round_info.try_borrow_data()?)?;
        ledger::enter(&mut round, &config, *player_info.key, payment)?;

        invoke(
            &system_instruction::transfer(player_info.key, round_info.key, payment),
            &[
                player_info.clone(),
                round_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        round.pack(&mut round_info.try_borrow_mut_data()?)?;

        RaffleEvent::EnteredRound {
            player: *player_info.key,
            payment,
        }
        .emit();
        Ok(())
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;

        let config = Self::load_config(config_info, program_id)?;
        Self::check_round_account(round_info, &config, program_id)?;
        let round = Round::unpack(&round_info.try_borrow_data()?)?;

        let now = Clock::get()?.unix_timestamp;
        let status = admission::check_upkeep(&round, &config, now);
        msg!("Upkeep status: {:?}", status);

        set_return_data(&[status.upkeep_needed() as u8]);
        Ok(())
    }

    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let remaining = accounts.get(4..).unwrap_or(&[]);

        // Anyone can close a round once it is due
        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Self::load_config(config_info, program_id)?;
        Self::check_round_account(round_info, &config, program_id)?;

        if *coordinator_info.key != config.coordinator {
            msg!("Coordinator account does not match the configured coordinator");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut round = Round::unpack(&round_info.try_borrow_data()?)?;
        let now = Clock::get()?.unix_timestamp;

        let bump = [config.round_bump];
        let requester_seeds: [&[u8]; 2] = [ROUND_SEED, &bump];
        let mut coordinator = CpiCoordinator {
            coordinator_program: coordinator_info,
            requester: round_info,
            requester_seeds: &requester_seeds,
            remaining,
        };
        let request_id = upkeep::perform_upkeep(&mut round, &config, now, &mut coordinator)?;

        round.pack(&mut round_info.try_borrow_mut_data()?)?;

        RaffleEvent::ClosingRequested { request_id }.emit();
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[[u8; 32]],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Coordinator authority must sign the fulfillment");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Self::load_config(config_info, program_id)?;
        Self::check_round_account(round_info, &config, program_id)?;

        let (expected_authority, _) = coordinator_authority(&config.coordinator);
        if *authority_info.key != expected_authority {
            msg!("Fulfillment signed by {}, expected {}", authority_info.key, expected_authority);
            return Err(RaffleError::NotCoordinator.into());
        }

        let mut round = Round::unpack(&round_info.try_borrow_data()?)?;
        let now = Clock::get()?.unix_timestamp;

        let mut transfer = LamportTransfer {
            source: round_info,
            recipient: winner_info,
        };
        let recent_winner =
            vrf::fulfill_random_words(&mut round, request_id, random_words, now, &mut transfer)?;

        round.pack(&mut round_info.try_borrow_mut_data()?)?;

        RaffleEvent::WinnerPicked {
            winner: recent_winner.winner,
            prize: recent_winner.prize,
        }
        .emit();
        Ok(())
    }

    fn load_config(config_info: &AccountInfo, program_id: &Pubkey) -> Result<Config, ProgramError> {
        if config_info.owner != program_id {
            msg!("Config account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let (expected_config, _) = find_config_address(program_id);
        if *config_info.key != expected_config {
            msg!("Invalid config account address");
            return Err(ProgramError::InvalidSeeds);
        }

        Config::unpack(&config_info.try_borrow_data()?)
    }

    fn check_round_account(
        round_info: &AccountInfo,
        config: &Config,
        program_id: &Pubkey,
    ) -> ProgramResult {
        if round_info.owner != program_id {
            msg!("Round account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let expected_round =
            Pubkey::create_program_address(&[ROUND_SEED, &[config.round_bump]], program_id)?;
        if *round_info.key != expected_round {
            msg!("Invalid round account address");
            return Err(ProgramError::InvalidSeeds);
        }
        Ok(())
    }

    fn create_pda_account<'a>(
        payer_info: &AccountInfo<'a>,
        new_account_info: &AccountInfo<'a>,
        system_program_info: &AccountInfo<'a>,
        rent: &Rent,
        space: usize,
        seeds: &[&[u8]],
        program_id: &Pubkey,
    ) -> ProgramResult {
        invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                new_account_info.key,
                rent.minimum_balance(space),
                space as u64,
                program_id,
            ),
            &[
                payer_info.clone(),
                new_account_info.clone(),
                system_program_info.clone(),
            ],
            &[seeds],
        )
    }
}
