use anchor_lang::prelude::*;
use derive_new::new;
use routes_std::account::AccountExt;
use routes_std::Bytes32;

use crate::instructions::PortalError;

pub const VAULT_SEED: &[u8] = b"vault";
pub const FUNDER_SEED: &[u8] = b"funder";
pub const CLAIM_STATE_SEED: &[u8] = b"claim_state";
pub const FULFILL_MARKER_SEED: &[u8] = b"fulfill_marker";
pub const EXECUTOR_SEED: &[u8] = b"executor";
pub const DISPATCHER_SEED: &[u8] = b"dispatcher";
pub const CONFIG_SEED: &[u8] = b"config";
pub const MAX_SOLVER_WHITELIST_LEN: usize = 20;

pub fn vault_pda(intent_hash: &Bytes32) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, intent_hash.as_ref()], &crate::ID)
}

pub fn funder_pda(route_hash: &Bytes32, reward_hash: &Bytes32) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[FUNDER_SEED, route_hash.as_ref(), reward_hash.as_ref()],
        &crate::ID,
    )
}

pub fn executor_pda() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[EXECUTOR_SEED], &crate::ID)
}

pub fn dispatcher_pda() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[DISPATCHER_SEED], &crate::ID)
}

#[derive(
    AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq,
)]
pub enum RewardStatus {
    #[default]
    Initiated,
    Claimed,
    Refunded,
}

/// Terminal resolution of an intent's reward. Absent until the reward is
/// withdrawn or refunded; an absent record reads as `Initiated`.
#[account]
#[derive(InitSpace, Debug, PartialEq, Eq, new)]
pub struct ClaimState {
    pub status: RewardStatus,
    pub claimant: Option<Pubkey>,
}

impl ClaimState {
    /// Status recorded at `account`, `Initiated` while nothing is recorded.
    pub fn status(account: &AccountInfo) -> Result<RewardStatus> {
        Self::try_load(account).map(|state| state.map(|state| state.status).unwrap_or_default())
    }

    pub fn pda(intent_hash: &Bytes32) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[CLAIM_STATE_SEED, intent_hash.as_ref()], &crate::ID)
    }
}

impl AccountExt for ClaimState {}

#[account]
#[derive(InitSpace, Debug, new)]
pub struct FulfillMarker {
    pub claimant: Pubkey,
}

impl FulfillMarker {
    pub fn pda(intent_hash: &Bytes32) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[FULFILL_MARKER_SEED, intent_hash.as_ref()], &crate::ID)
    }
}

impl AccountExt for FulfillMarker {}

#[account]
#[derive(InitSpace, Debug)]
pub struct Config {
    pub owner: Pubkey,
    pub solving_public: bool,
    #[max_len(MAX_SOLVER_WHITELIST_LEN)]
    pub solver_whitelist: Vec<Pubkey>,
}

impl Config {
    pub fn new(owner: Pubkey, solving_public: bool, solver_whitelist: Vec<Pubkey>) -> Result<Self> {
        require!(
            solver_whitelist.len() <= MAX_SOLVER_WHITELIST_LEN,
            PortalError::TooManyWhitelistedSolvers
        );

        Ok(Self {
            owner,
            solving_public,
            solver_whitelist,
        })
    }

    pub fn pda() -> (Pubkey, u8) {
        Pubkey::find_program_address(&[CONFIG_SEED], &crate::ID)
    }

    pub fn can_solve(&self, solver: &Pubkey) -> bool {
        self.solving_public || self.solver_whitelist.contains(solver)
    }

    pub fn set_solver(&mut self, solver: Pubkey, can_solve: bool) -> Result<()> {
        match (can_solve, self.solver_whitelist.contains(&solver)) {
            (true, false) => {
                require!(
                    self.solver_whitelist.len() < MAX_SOLVER_WHITELIST_LEN,
                    PortalError::TooManyWhitelistedSolvers
                );
                self.solver_whitelist.push(solver);
            }
            (false, true) => self.solver_whitelist.retain(|whitelisted| *whitelisted != solver),
            _ => {}
        }

        Ok(())
    }
}

impl AccountExt for Config {}
