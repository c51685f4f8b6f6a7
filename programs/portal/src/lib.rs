//! # Portal Program
//!
//! Both halves of the intent protocol live here.
//!
//! On the source chain the portal escrows rewards. Every intent gets a vault
//! whose address is derived from the intent hash, so it can be funded before the
//! intent is ever published. Rewards leave the vault exactly once: to the
//! claimant once the intent's prover holds a proof of fulfillment, or back to the
//! creator after the deadline.
//!
//! On the destination chain the portal fulfills routes. A solver supplies the
//! route's tokens and native value, the portal executes the route calls from its
//! executor address and records the fulfillment so that it can be proven back to
//! the source chain, immediately or in batches.

use anchor_lang::prelude::*;

declare_id!("52gVFYqekRiSUxWwCKPNKw9LhBsVxbZiLSnGVsTBGh5F");

pub mod events;
pub mod funder;
pub mod instructions;
pub mod queries;
pub mod state;
pub mod types;
pub mod vault;

use instructions::*;

#[program]
pub mod portal {
    use super::*;

    pub fn publish<'info>(
        ctx: Context<'_, '_, '_, 'info, Publish<'info>>,
        args: PublishArgs,
    ) -> Result<()> {
        publish_intent(ctx, args)
    }

    pub fn fund<'info>(ctx: Context<'_, '_, '_, 'info, Fund<'info>>, args: FundArgs) -> Result<()> {
        fund_intent(ctx, args)
    }

    /// Funds an intent from a source that approved the intent's funder address
    /// or a permit helper, without the source signing.
    pub fn fund_for<'info>(
        ctx: Context<'_, '_, '_, 'info, FundFor<'info>>,
        args: FundForArgs,
    ) -> Result<()> {
        fund_intent_for(ctx, args)
    }

    pub fn withdraw<'info>(
        ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
        args: WithdrawArgs,
    ) -> Result<()> {
        withdraw_intent(ctx, args)
    }

    /// Returns one flag per intent, `true` where the withdrawal went through.
    pub fn batch_withdraw<'info>(
        ctx: Context<'_, '_, '_, 'info, BatchWithdraw<'info>>,
        args: BatchWithdrawArgs,
    ) -> Result<Vec<bool>> {
        batch_withdraw_intents(ctx, args)
    }

    pub fn refund<'info>(
        ctx: Context<'_, '_, '_, 'info, Refund<'info>>,
        args: RefundArgs,
    ) -> Result<()> {
        refund_intent(ctx, args)
    }

    pub fn recover_token<'info>(
        ctx: Context<'_, '_, '_, 'info, RecoverToken<'info>>,
        args: RecoverTokenArgs,
    ) -> Result<()> {
        recover_intent_token(ctx, args)
    }

    pub fn init(ctx: Context<Init>, args: InitArgs) -> Result<()> {
        instructions::init(ctx, args)
    }

    pub fn make_solving_public(ctx: Context<Admin>) -> Result<()> {
        instructions::make_solving_public(ctx)
    }

    pub fn change_solver_whitelist(
        ctx: Context<Admin>,
        args: ChangeSolverWhitelistArgs,
    ) -> Result<()> {
        instructions::change_solver_whitelist(ctx, args)
    }

    pub fn fulfill<'info>(
        ctx: Context<'_, '_, '_, 'info, Fulfill<'info>>,
        args: FulfillArgs,
    ) -> Result<()> {
        fulfill_intent(ctx, args)
    }

    pub fn fulfill_storage<'info>(
        ctx: Context<'_, '_, '_, 'info, Fulfill<'info>>,
        args: FulfillArgs,
    ) -> Result<()> {
        fulfill_storage_intent(ctx, args)
    }

    pub fn fulfill_and_prove<'info>(
        ctx: Context<'_, '_, '_, 'info, FulfillAndProve<'info>>,
        args: FulfillAndProveArgs,
    ) -> Result<()> {
        fulfill_and_prove_intent(ctx, args)
    }

    pub fn fulfill_batched<'info>(
        ctx: Context<'_, '_, '_, 'info, Fulfill<'info>>,
        args: FulfillBatchedArgs,
    ) -> Result<()> {
        fulfill_batched_intent(ctx, args)
    }

    pub fn prove<'info>(
        ctx: Context<'_, '_, '_, 'info, Prove<'info>>,
        args: ProveArgs,
    ) -> Result<()> {
        prove_intents(ctx, args)
    }
}
