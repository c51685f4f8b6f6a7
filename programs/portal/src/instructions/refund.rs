use std::slice;

use anchor_lang::prelude::*;
use anchor_spl::{token, token_2022};
use routes_std::account::AccountExt;
use routes_std::Bytes32;

use crate::events::IntentRefunded;
use crate::instructions::payout::{
    require_mints, require_payable, vault_balances, TokenPayoutAccounts, VaultPayer,
};
use crate::instructions::PortalError;
use crate::state::{self, ClaimState, RewardStatus, CLAIM_STATE_SEED, VAULT_SEED};
use crate::types::{self, Reward};
use crate::vault::{Vault, VaultMode};

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct RefundArgs {
    pub route_hash: Bytes32,
    pub reward: Reward,
}

/// Remaining accounts: `[vault_ata, creator_ata, mint]` per reward token.
#[derive(Accounts)]
#[instruction(args: RefundArgs)]
pub struct Refund<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    /// CHECK: address is validated
    #[account(mut, address = args.reward.creator @ PortalError::InvalidCreator)]
    pub creator: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(
        mut,
        address = state::vault_pda(&types::intent_hash(&args.route_hash, &args.reward.hash())).0 @ PortalError::InvalidVault,
    )]
    pub vault: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(
        mut,
        address = ClaimState::pda(&types::intent_hash(&args.route_hash, &args.reward.hash())).0 @ PortalError::InvalidClaimState,
    )]
    pub claim_state: UncheckedAccount<'info>,
    pub token_program: Program<'info, token::Token>,
    pub token_2022_program: Program<'info, token_2022::Token2022>,
    pub system_program: Program<'info, System>,
}

pub fn refund_intent<'info>(
    ctx: Context<'_, '_, '_, 'info, Refund<'info>>,
    args: RefundArgs,
) -> Result<()> {
    let RefundArgs { route_hash, reward } = args;
    let intent_hash = types::intent_hash(&route_hash, &reward.hash());
    let (_, vault_bump) = state::vault_pda(&intent_hash);
    let (_, claim_state_bump) = ClaimState::pda(&intent_hash);
    let creator: &AccountInfo<'info> = &ctx.accounts.creator;

    match ClaimState::status(&ctx.accounts.claim_state)? {
        RewardStatus::Claimed => return Err(PortalError::RewardsAlreadyWithdrawn.into()),
        RewardStatus::Refunded => return Err(PortalError::IntentAlreadyRefunded.into()),
        RewardStatus::Initiated => {}
    }
    require!(
        reward.is_expired(Clock::get()?.unix_timestamp),
        PortalError::IntentNotExpired
    );

    let token_accounts =
        TokenPayoutAccounts::parse(ctx.accounts.vault.key, ctx.remaining_accounts, 1)?;
    require_mints(&token_accounts, reward.token_amounts()?.keys())?;

    let balances = vault_balances(&ctx.accounts.vault, &token_accounts)?;
    let payouts = Vault::new(&reward, balances, None).settle(VaultMode::Refund)?;
    require_payable(&payouts, &[creator], &token_accounts)?;

    ClaimState::new(RewardStatus::Refunded, None)
        .init(
            &ctx.accounts.claim_state,
            &ctx.accounts.payer,
            &ctx.accounts.system_program,
            &[&[
                CLAIM_STATE_SEED,
                intent_hash.as_ref(),
                slice::from_ref(&claim_state_bump),
            ]],
        )
        .map_err(|_| PortalError::IntentAlreadyResolved)?;

    let payer = VaultPayer {
        vault: &ctx.accounts.vault,
        signer_seeds: &[VAULT_SEED, intent_hash.as_ref(), slice::from_ref(&vault_bump)],
        token_program: &ctx.accounts.token_program,
        token_2022_program: &ctx.accounts.token_2022_program,
        system_program: &ctx.accounts.system_program,
    };
    payer.pay(&payouts, &[creator], &token_accounts)?;
    payer.close(&token_accounts, &ctx.accounts.payer)?;

    emit!(IntentRefunded::new(intent_hash, reward.creator));

    Ok(())
}
