use anchor_lang::prelude::*;
use anchor_spl::{associated_token, token, token_2022};
use routes_std::Bytes32;

use crate::events::IntentFunded;
use crate::funder::Funder;
use crate::instructions::fund_context::FundTokenContext;
use crate::instructions::PortalError;
use crate::state::{vault_pda, ClaimState, RewardStatus};
use crate::types::{self, Reward, VecTokenTransferAccounts};
use crate::vault::{Asset, Balances};

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct FundArgs {
    pub route_hash: Bytes32,
    pub reward: Reward,
    pub allow_partial: bool,
}

#[derive(Accounts)]
#[instruction(args: FundArgs)]
pub struct Fund<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(mut)]
    pub funder: Signer<'info>,
    /// CHECK: address is validated
    #[account(
        mut,
        address = vault_pda(&types::intent_hash(&args.route_hash, &args.reward.hash())).0 @ PortalError::InvalidVault,
    )]
    pub vault: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(
        address = ClaimState::pda(&types::intent_hash(&args.route_hash, &args.reward.hash())).0 @ PortalError::InvalidClaimState,
    )]
    pub claim_state: UncheckedAccount<'info>,
    pub token_program: Program<'info, token::Token>,
    pub token_2022_program: Program<'info, token_2022::Token2022>,
    pub associated_token_program: Program<'info, associated_token::AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn fund_intent<'info>(
    ctx: Context<'_, '_, '_, 'info, Fund<'info>>,
    args: FundArgs,
) -> Result<()> {
    let FundArgs {
        route_hash,
        reward,
        allow_partial,
    } = args;
    let intent_hash = types::intent_hash(&route_hash, &reward.hash());

    require_unresolved(&ctx.accounts.claim_state)?;

    fund_vault(
        &FundTokenContext::from(&ctx),
        &VecTokenTransferAccounts::try_from(ctx.remaining_accounts)?,
        &intent_hash,
        &reward,
        allow_partial,
    )
}

pub(crate) fn require_unresolved(claim_state: &AccountInfo) -> Result<()> {
    require!(
        ClaimState::status(claim_state)? == RewardStatus::Initiated,
        PortalError::IntentAlreadyResolved
    );

    Ok(())
}

/// Tops the vault up to the reward from a signing funder, moving
/// `min(deficit, balance)` of every asset.
pub(crate) fn fund_vault<'info>(
    fund_ctx: &FundTokenContext<'_, 'info>,
    accounts: &VecTokenTransferAccounts<'info>,
    intent_hash: &Bytes32,
    reward: &Reward,
    allow_partial: bool,
) -> Result<()> {
    accounts.require_mints(&reward.token_amounts()?)?;

    let vault = Balances::from_destinations(fund_ctx.fundee.lamports(), accounts.iter())?;
    let available = Balances::from_sources(fund_ctx.funder.lamports(), accounts.iter())?;
    let plan = Funder::new(reward, vault, available, None).plan()?;

    require!(
        allow_partial || plan.complete,
        PortalError::InsufficientFunds
    );

    plan.transfers
        .iter()
        .try_for_each(|(asset, amount)| match asset {
            Asset::Native => fund_ctx.transfer_native(*amount),
            Asset::Token(mint) => fund_ctx.transfer_token(accounts.get(mint)?, *amount, &[]),
        })?;

    emit!(IntentFunded::new(
        *intent_hash,
        fund_ctx.funder.key(),
        plan.complete
    ));

    Ok(())
}
