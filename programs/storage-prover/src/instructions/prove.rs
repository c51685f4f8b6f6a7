use anchor_lang::prelude::*;
use anchor_lang::system_program;
use routes_std::prover::ProveArgs;

use crate::instructions::StorageProverError;

#[derive(Accounts)]
pub struct Prove<'info> {
    #[account(mut, address = portal::state::dispatcher_pda().0 @ StorageProverError::InvalidPortalDispatcher)]
    pub portal_dispatcher: Signer<'info>,
    /// CHECK: only receives the fee back
    #[account(mut)]
    pub payer: UncheckedAccount<'info>,
    pub system_program: Program<'info, System>,
}

/// State proofs need no message, so a dispatch from the portal only hands the
/// fee back. The intents are proven later with `prove_fulfillment`.
pub fn prove_intent(ctx: Context<Prove>, args: ProveArgs) -> Result<()> {
    msg!(
        "{} intents from {} await a state proof",
        args.intent_hashes_claimants.len(),
        args.source
    );

    match args.fee {
        0 => Ok(()),
        fee => system_program::transfer(
            CpiContext::new(
                ctx.accounts.system_program.to_account_info(),
                system_program::Transfer {
                    from: ctx.accounts.portal_dispatcher.to_account_info(),
                    to: ctx.accounts.payer.to_account_info(),
                },
            ),
            fee,
        ),
    }
}
