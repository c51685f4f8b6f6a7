use std::slice;

use anchor_lang::prelude::*;
use anchor_spl::{token, token_2022};
use routes_std::Bytes32;

use crate::events::IntentTokenRecovered;
use crate::instructions::payout::{
    require_payable, vault_balances, TokenPayoutAccounts, VaultPayer,
};
use crate::instructions::PortalError;
use crate::state::{vault_pda, ClaimState, RewardStatus, VAULT_SEED};
use crate::types::{self, Reward};
use crate::vault::{Vault, VaultMode};

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct RecoverTokenArgs {
    pub route_hash: Bytes32,
    pub reward: Reward,
    pub token: Pubkey,
}

#[derive(Accounts)]
#[instruction(args: RecoverTokenArgs)]
pub struct RecoverToken<'info> {
    /// CHECK: address is validated
    #[account(address = args.reward.creator @ PortalError::InvalidCreator)]
    pub creator: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(address = vault_pda(&types::intent_hash(&args.route_hash, &args.reward.hash())).0 @ PortalError::InvalidVault)]
    pub vault: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(address = ClaimState::pda(&types::intent_hash(&args.route_hash, &args.reward.hash())).0 @ PortalError::InvalidClaimState)]
    pub claim_state: UncheckedAccount<'info>,
    /// CHECK: validated as the vault's associated token account
    #[account(mut)]
    pub vault_token: UncheckedAccount<'info>,
    /// CHECK: validated as a token account of the creator
    #[account(mut)]
    pub creator_token: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(address = args.token @ PortalError::InvalidRefundToken)]
    pub mint: UncheckedAccount<'info>,
    pub token_program: Program<'info, token::Token>,
    pub token_2022_program: Program<'info, token_2022::Token2022>,
    pub system_program: Program<'info, System>,
}

/// Sweeps a token that is not part of the reward from the vault to the
/// creator. Intents with a native reward must be resolved first.
pub fn recover_intent_token<'info>(
    ctx: Context<'_, '_, '_, 'info, RecoverToken<'info>>,
    args: RecoverTokenArgs,
) -> Result<()> {
    let RecoverTokenArgs {
        route_hash,
        reward,
        token,
    } = args;
    let intent_hash = types::intent_hash(&route_hash, &reward.hash());
    let (_, vault_bump) = vault_pda(&intent_hash);
    let creator: &AccountInfo<'info> = &ctx.accounts.creator;

    require!(
        reward.native_amount == 0
            || ClaimState::status(&ctx.accounts.claim_state)? != RewardStatus::Initiated,
        PortalError::IntentNotResolved
    );

    let token_accounts = TokenPayoutAccounts::parse(
        ctx.accounts.vault.key,
        &[
            ctx.accounts.vault_token.to_account_info(),
            ctx.accounts.creator_token.to_account_info(),
            ctx.accounts.mint.to_account_info(),
        ],
        1,
    )?;
    let balances = vault_balances(&ctx.accounts.vault, &token_accounts)?;
    let payouts =
        Vault::new(&reward, balances.clone(), Some(token)).settle(VaultMode::RecoverToken)?;
    require_payable(&payouts, &[creator], &token_accounts)?;

    VaultPayer {
        vault: &ctx.accounts.vault,
        signer_seeds: &[VAULT_SEED, intent_hash.as_ref(), slice::from_ref(&vault_bump)],
        token_program: &ctx.accounts.token_program,
        token_2022_program: &ctx.accounts.token_2022_program,
        system_program: &ctx.accounts.system_program,
    }
    .pay(&payouts, &[creator], &token_accounts)?;

    emit!(IntentTokenRecovered::new(
        intent_hash,
        token,
        balances.token(&token)
    ));

    Ok(())
}
