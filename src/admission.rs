use crate::state::{Config, Round};

use solana_program::clock::UnixTimestamp;

/// Result of the admission check, one flag per condition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub is_open: bool,
    pub interval_elapsed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepStatus {
    /// True when every condition holds and the round may close
    pub fn upkeep_needed(&self) -> bool {
        self.is_open && self.interval_elapsed && self.has_players && self.has_balance
    }
}

/// Seconds since the current round started; zero if the clock went backwards
pub fn elapsed(round: &Round, now: UnixTimestamp) -> u64 {
    u64::try_from(now.saturating_sub(round.last_timestamp)).unwrap_or(0)
}

/// Evaluate whether the current round may be closed at `now`.
///
/// Read-only. Callers must re-run it at commit time; a `true` observed
/// earlier says nothing about the state a later transaction will see.
pub fn check_upkeep(round: &Round, config: &Config, now: UnixTimestamp) -> UpkeepStatus {
    UpkeepStatus {
        is_open: round.is_open(),
        interval_elapsed: elapsed(round, now) >= config.closing_interval,
        has_players: !round.participants.is_empty(),
        has_balance: round.pool_balance > 0,
    }
}
