use std::slice;

use anchor_lang::prelude::*;
use anchor_spl::{associated_token, token, token_2022};
use routes_std::account::AccountExt;
use routes_std::prover::IntentHashClaimant;
use routes_std::{Bytes32, CHAIN_ID};

use crate::events::{IntentAddedToBatch, IntentFulfilled, IntentReadyToProve};
use crate::instructions::call::CallAccounts;
use crate::instructions::fund_context::FundTokenContext;
use crate::instructions::prove::{dispatch, DispatchAccounts};
use crate::instructions::PortalError;
use crate::state::{
    dispatcher_pda, executor_pda, Config, FulfillMarker, EXECUTOR_SEED, FULFILL_MARKER_SEED,
};
use crate::types::{
    self, Route, VecTokenTransferAccounts, VEC_TOKEN_TRANSFER_ACCOUNTS_CHUNK_SIZE,
};

#[derive(AnchorSerialize, AnchorDeserialize, Debug)]
pub struct FulfillArgs {
    pub route: Route,
    pub reward_hash: Bytes32,
    pub claimant: Pubkey,
    pub expected_hash: Bytes32,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug)]
pub struct FulfillAndProveArgs {
    pub fulfill: FulfillArgs,
    pub prover: Pubkey,
    pub data: Vec<u8>,
    pub fee: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug)]
pub struct FulfillBatchedArgs {
    pub fulfill: FulfillArgs,
    pub prover: Pubkey,
}

/// Remaining accounts: `[solver_ata, executor_ata, mint]` per route token,
/// then every route call as `[target, ..call accounts]`.
#[derive(Accounts)]
pub struct Fulfill<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    /// Provides the route's tokens and native value.
    #[account(mut)]
    pub solver: Signer<'info>,
    /// CHECK: address is validated
    #[account(mut, address = executor_pda().0 @ PortalError::InvalidExecutor)]
    pub executor: UncheckedAccount<'info>,
    /// CHECK: address is validated against the intent hash
    #[account(mut)]
    pub fulfill_marker: UncheckedAccount<'info>,
    /// CHECK: address is validated, an empty account leaves solving public
    #[account(address = Config::pda().0 @ PortalError::InvalidConfig)]
    pub config: UncheckedAccount<'info>,
    pub token_program: Program<'info, token::Token>,
    pub token_2022_program: Program<'info, token_2022::Token2022>,
    pub associated_token_program: Program<'info, associated_token::AssociatedToken>,
    pub system_program: Program<'info, System>,
}

/// [`Fulfill`] followed by the prover invocation. Remaining accounts after the
/// route calls are handed to the prover.
#[derive(Accounts)]
pub struct FulfillAndProve<'info> {
    pub fulfill: Fulfill<'info>,
    /// CHECK: address is validated
    #[account(executable)]
    pub prover: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(mut, address = dispatcher_pda().0 @ PortalError::InvalidDispatcher)]
    pub dispatcher: UncheckedAccount<'info>,
}

pub fn fulfill_intent<'info>(
    ctx: Context<'_, '_, '_, 'info, Fulfill<'info>>,
    args: FulfillArgs,
) -> Result<()> {
    fulfill(&ctx.accounts, ctx.remaining_accounts, args).map(|_| ())
}

/// Fulfills and announces the intent to storage proof relayers.
pub fn fulfill_storage_intent<'info>(
    ctx: Context<'_, '_, '_, 'info, Fulfill<'info>>,
    args: FulfillArgs,
) -> Result<()> {
    let source = args.route.source;
    let claimant = args.claimant;
    let (intent_hash, _) = fulfill(&ctx.accounts, ctx.remaining_accounts, args)?;

    emit!(IntentReadyToProve::new(intent_hash, source, claimant));

    Ok(())
}

/// Fulfills and immediately sends the proof through `prover`. The solver pays
/// the prover fee.
pub fn fulfill_and_prove_intent<'info>(
    ctx: Context<'_, '_, '_, 'info, FulfillAndProve<'info>>,
    args: FulfillAndProveArgs,
) -> Result<()> {
    let FulfillAndProveArgs {
        fulfill: fulfill_args,
        prover,
        data,
        fee,
    } = args;
    let source = fulfill_args.route.source;
    let claimant = fulfill_args.claimant;
    let (intent_hash, prover_accounts) =
        fulfill(&ctx.accounts.fulfill, ctx.remaining_accounts, fulfill_args)?;

    require_keys_eq!(ctx.accounts.prover.key(), prover, PortalError::InvalidProver);

    dispatch(
        DispatchAccounts {
            payer: &ctx.accounts.fulfill.solver,
            prover: &ctx.accounts.prover,
            dispatcher: &ctx.accounts.dispatcher,
            system_program: &ctx.accounts.fulfill.system_program,
        },
        prover_accounts,
        source,
        vec![IntentHashClaimant::new(intent_hash, claimant)],
        data,
        fee,
    )
}

/// Fulfills and defers the proof to a later `prove` batch.
pub fn fulfill_batched_intent<'info>(
    ctx: Context<'_, '_, '_, 'info, Fulfill<'info>>,
    args: FulfillBatchedArgs,
) -> Result<()> {
    let FulfillBatchedArgs {
        fulfill: fulfill_args,
        prover,
    } = args;
    let source = fulfill_args.route.source;
    let (intent_hash, _) = fulfill(&ctx.accounts, ctx.remaining_accounts, fulfill_args)?;

    emit!(IntentAddedToBatch::new(intent_hash, prover, source));

    Ok(())
}

/// Shared fulfillment path. Returns the intent hash and the remaining
/// accounts the route did not consume.
fn fulfill<'c, 'info>(
    accounts: &Fulfill<'info>,
    remaining_accounts: &'c [AccountInfo<'info>],
    args: FulfillArgs,
) -> Result<(Bytes32, &'c [AccountInfo<'info>])> {
    let FulfillArgs {
        route,
        reward_hash,
        claimant,
        expected_hash,
    } = args;
    let (token_accounts, rest) = split_token_accounts(remaining_accounts, &route)?;

    let mut rest = rest.iter();
    let calls = route
        .calls
        .iter()
        .map(|call| CallAccounts::take(call, &mut rest))
        .collect::<Result<Vec<_>>>()?;
    let hashed_route = Route {
        calls: calls
            .iter()
            .map(CallAccounts::hashed_call)
            .collect::<Result<_>>()?,
        ..route.clone()
    };
    let intent_hash = types::intent_hash(&hashed_route.hash(), &reward_hash);

    require!(intent_hash == expected_hash, PortalError::InvalidHash);
    require_keys_eq!(route.portal, crate::ID, PortalError::InvalidPortal);
    require!(route.destination == CHAIN_ID, PortalError::InvalidDestination);
    require!(
        Config::try_load(&accounts.config)?.map_or(true, |config| config.can_solve(accounts.solver.key)),
        PortalError::UnauthorizedSolveAttempt
    );
    require_keys_neq!(claimant, Pubkey::default(), PortalError::ZeroClaimant);

    mark_fulfilled(accounts, &intent_hash, &claimant)?;

    let fund_context = FundTokenContext::from(accounts);
    fund_context.transfer_tokens(&token_accounts, &route.token_amounts()?)?;
    fund_context.transfer_native(route.native_amount()?)?;

    let (_, bump) = executor_pda();
    calls.iter().try_for_each(|call| {
        call.execute_signed(
            &accounts.executor,
            &accounts.system_program,
            &[EXECUTOR_SEED, slice::from_ref(&bump)],
        )
    })?;

    msg!("intent {} fulfilled by {}", intent_hash, accounts.solver.key);
    emit!(IntentFulfilled::new(intent_hash, claimant));

    Ok((intent_hash, rest.as_slice()))
}

fn split_token_accounts<'c, 'info>(
    remaining_accounts: &'c [AccountInfo<'info>],
    route: &Route,
) -> Result<(VecTokenTransferAccounts<'info>, &'c [AccountInfo<'info>])> {
    let split_index = route.tokens.len() * VEC_TOKEN_TRANSFER_ACCOUNTS_CHUNK_SIZE;
    require!(
        split_index <= remaining_accounts.len(),
        PortalError::InvalidTokenTransferAccounts
    );
    let (token_accounts, rest) = remaining_accounts.split_at(split_index);

    Ok((token_accounts.try_into()?, rest))
}

fn mark_fulfilled(accounts: &Fulfill, intent_hash: &Bytes32, claimant: &Pubkey) -> Result<()> {
    let (fulfill_marker, bump) = FulfillMarker::pda(intent_hash);
    require_keys_eq!(
        accounts.fulfill_marker.key(),
        fulfill_marker,
        PortalError::InvalidFulfillMarker
    );

    FulfillMarker::new(*claimant)
        .init(
            &accounts.fulfill_marker,
            &accounts.payer,
            &accounts.system_program,
            &[&[FULFILL_MARKER_SEED, intent_hash.as_ref(), &[bump]]],
        )
        .map_err(|_| PortalError::IntentAlreadyFulfilled.into())
}
