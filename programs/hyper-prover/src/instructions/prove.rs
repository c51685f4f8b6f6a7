use anchor_lang::prelude::*;
use anchor_lang::system_program;
use routes_std::prover::ProveArgs;
use routes_std::Bytes32;

use crate::hyperlane::{self, OutboxDispatch};
use crate::instructions::HyperProverError;
use crate::state::{dispatcher_pda, Config, DISPATCHER_SEED};

#[derive(Accounts)]
#[instruction(args: ProveArgs)]
pub struct Prove<'info> {
    /// Holds the fee for the duration of the call.
    #[account(mut, address = portal::state::dispatcher_pda().0 @ HyperProverError::InvalidPortalDispatcher)]
    pub portal_dispatcher: Signer<'info>,
    /// CHECK: only receives the fee overpayment
    #[account(mut)]
    pub payer: UncheckedAccount<'info>,
    #[account(address = Config::pda().0 @ HyperProverError::InvalidConfig)]
    pub config: Account<'info, Config>,
    /// CHECK: address is validated
    #[account(address = dispatcher_pda().0 @ HyperProverError::InvalidDispatcher)]
    pub dispatcher: UncheckedAccount<'info>,
    /// CHECK: Checked in CPI
    #[account(mut)]
    pub outbox: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(executable, address = config.mailbox @ HyperProverError::InvalidMailbox)]
    pub mailbox_program: UncheckedAccount<'info>,
    pub system_program: Program<'info, System>,
}

pub fn prove_intent(ctx: Context<Prove>, args: ProveArgs) -> Result<()> {
    let ProveArgs {
        source,
        intent_hashes_claimants,
        data,
        fee,
    } = args;

    let source_prover: Bytes32 = <[u8; 32]>::try_from(data)
        .map_err(|_| HyperProverError::InvalidData)?
        .into();
    let outbox_dispatch = OutboxDispatch::new(
        ctx.accounts.dispatcher.key(),
        chain_to_domain(source)?,
        source_prover.into(),
        intent_hashes_claimants.to_bytes(),
    );

    let quote = hyperlane::quote_dispatch(&ctx, &outbox_dispatch)?;
    require!(fee >= quote, HyperProverError::InsufficientFee);

    let (_, bump) = dispatcher_pda();
    let signer_seeds = [DISPATCHER_SEED, &[bump]];
    hyperlane::dispatch_msg(&ctx, outbox_dispatch, &signer_seeds)?;

    msg!(
        "dispatched {} proofs to {}, fee {} of {}",
        intent_hashes_claimants.len(),
        source,
        quote,
        fee
    );

    refund_overpayment(&ctx, fee - quote)
}

fn refund_overpayment(ctx: &Context<Prove>, amount: u64) -> Result<()> {
    match amount {
        0 => Ok(()),
        amount => system_program::transfer(
            CpiContext::new(
                ctx.accounts.system_program.to_account_info(),
                system_program::Transfer {
                    from: ctx.accounts.portal_dispatcher.to_account_info(),
                    to: ctx.accounts.payer.to_account_info(),
                },
            ),
            amount,
        ),
    }
}

// Chain ids double as mailbox domains.
fn chain_to_domain(chain: u64) -> Result<u32> {
    chain
        .try_into()
        .map_err(|_| HyperProverError::InvalidChainId.into())
}
