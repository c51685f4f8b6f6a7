use anchor_lang::prelude::*;
use anchor_spl::{associated_token, token, token_2022};
use routes_std::CHAIN_ID;

use crate::events::IntentPublished;
use crate::instructions::fund::{fund_vault, require_unresolved};
use crate::instructions::fund_context::FundTokenContext;
use crate::instructions::PortalError;
use crate::state::{vault_pda, ClaimState};
use crate::types::{Intent, VecTokenTransferAccounts};

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct PublishArgs {
    pub intent: Intent,
    /// Fully fund the vault from the payer in the same instruction.
    pub fund: bool,
}

#[derive(Accounts)]
#[instruction(args: PublishArgs)]
pub struct Publish<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    /// CHECK: address is validated
    #[account(mut, address = vault_pda(&args.intent.hash().0).0 @ PortalError::InvalidVault)]
    pub vault: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(address = ClaimState::pda(&args.intent.hash().0).0 @ PortalError::InvalidClaimState)]
    pub claim_state: UncheckedAccount<'info>,
    pub token_program: Program<'info, token::Token>,
    pub token_2022_program: Program<'info, token_2022::Token2022>,
    pub associated_token_program: Program<'info, associated_token::AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn publish_intent<'info>(
    ctx: Context<'_, '_, '_, 'info, Publish<'info>>,
    args: PublishArgs,
) -> Result<()> {
    let PublishArgs { intent, fund } = args;
    let (intent_hash, _, _) = intent.hash();

    require!(
        intent.route.source == CHAIN_ID,
        PortalError::WrongSourceChain
    );
    require_unresolved(&ctx.accounts.claim_state)?;

    emit!(IntentPublished::new(
        intent_hash,
        intent.route,
        intent.reward.clone()
    ));

    if fund {
        fund_vault(
            &FundTokenContext::from(&ctx),
            &VecTokenTransferAccounts::try_from(ctx.remaining_accounts)?,
            &intent_hash,
            &intent.reward,
            false,
        )?;
    }

    Ok(())
}
