//! Read-only views over portal state.

use anchor_lang::prelude::*;
use routes_std::account::AccountExt;

use crate::state::{funder_pda, vault_pda, ClaimState, FulfillMarker, RewardStatus};
use crate::types::{Intent, Reward};
use crate::vault::Balances;

pub fn vault_address(intent: &Intent) -> Pubkey {
    let (intent_hash, _, _) = intent.hash();

    vault_pda(&intent_hash).0
}

pub fn funder_address(intent: &Intent) -> Pubkey {
    let (_, route_hash, reward_hash) = intent.hash();

    funder_pda(&route_hash, &reward_hash).0
}

/// Whether the vault holds at least the full reward in every asset.
pub fn is_funded(reward: &Reward, vault: &Balances) -> Result<bool> {
    Ok(vault.native >= reward.native_amount
        && reward
            .token_amounts()?
            .iter()
            .all(|(mint, amount)| vault.token(mint) >= *amount))
}

pub fn reward_status(claim_state: &AccountInfo) -> Result<RewardStatus> {
    ClaimState::status(claim_state)
}

/// Claimant recorded by the gateway, if the intent was fulfilled on this chain.
pub fn fulfilled_claimant(fulfill_marker: &AccountInfo) -> Result<Option<Pubkey>> {
    Ok(FulfillMarker::try_load(fulfill_marker)?.map(|marker| marker.claimant))
}
