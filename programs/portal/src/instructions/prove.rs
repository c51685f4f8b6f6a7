use std::iter;

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::invoke_signed;
use anchor_lang::system_program;
use itertools::Itertools;
use routes_std::account::AccountExt;
use routes_std::prover::{self, is_prover, IntentHashClaimant, IntentProven};
use routes_std::{Bytes32, CHAIN_ID};

use crate::events::IntentNotFulfilledSkipped;
use crate::instructions::PortalError;
use crate::state::{dispatcher_pda, FulfillMarker, DISPATCHER_SEED};

pub const MAX_BATCH_SIZE: usize = 100;

#[derive(AnchorSerialize, AnchorDeserialize, Debug)]
pub struct ProveArgs {
    pub prover: Pubkey,
    pub source: u64,
    pub intent_hashes: Vec<Bytes32>,
    /// Prover specific payload, e.g. the source chain prover address.
    pub data: Vec<u8>,
    pub fee: u64,
}

/// Remaining accounts: the fulfill marker of every intent hash, in order,
/// then the accounts the prover needs.
#[derive(Accounts)]
#[instruction(args: ProveArgs)]
pub struct Prove<'info> {
    /// Pays the prover fee.
    #[account(mut)]
    pub payer: Signer<'info>,
    /// CHECK: address is validated
    #[account(executable, address = args.prover @ PortalError::InvalidProver)]
    pub prover: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(mut, address = dispatcher_pda().0 @ PortalError::InvalidDispatcher)]
    pub dispatcher: UncheckedAccount<'info>,
    pub system_program: Program<'info, System>,
}

/// Sends proofs for already fulfilled intents in one batch. Hashes without a
/// fulfillment are skipped.
pub fn prove_intents<'info>(
    ctx: Context<'_, '_, '_, 'info, Prove<'info>>,
    args: ProveArgs,
) -> Result<()> {
    let ProveArgs {
        prover: _,
        source,
        intent_hashes,
        data,
        fee,
    } = args;

    require_batch_size(intent_hashes.len())?;
    require!(
        intent_hashes.len() <= ctx.remaining_accounts.len(),
        PortalError::InvalidFulfillMarker
    );
    let (markers, prover_accounts) = ctx.remaining_accounts.split_at(intent_hashes.len());

    let mut pairs = Vec::with_capacity(intent_hashes.len());
    for (intent_hash, marker) in intent_hashes
        .into_iter()
        .zip(markers)
        .unique_by(|(intent_hash, _)| *intent_hash)
    {
        require_keys_eq!(
            marker.key(),
            FulfillMarker::pda(&intent_hash).0,
            PortalError::InvalidFulfillMarker
        );

        match FulfillMarker::try_load(marker)? {
            Some(marker) => pairs.push(IntentHashClaimant::new(intent_hash, marker.claimant)),
            None => {
                msg!("intent {} not fulfilled, skipped", intent_hash);
                emit!(IntentNotFulfilledSkipped::new(intent_hash));
            }
        }
    }

    require!(!pairs.is_empty(), PortalError::IntentNotFulfilled);

    dispatch(
        DispatchAccounts {
            payer: &ctx.accounts.payer,
            prover: &ctx.accounts.prover,
            dispatcher: &ctx.accounts.dispatcher,
            system_program: &ctx.accounts.system_program,
        },
        prover_accounts,
        source,
        pairs,
        data,
        fee,
    )
}

fn require_batch_size(len: usize) -> Result<()> {
    require!(len > 0, PortalError::EmptyBatch);
    require!(len <= MAX_BATCH_SIZE, PortalError::BatchTooLarge);

    Ok(())
}

pub(crate) struct DispatchAccounts<'a, 'info> {
    pub payer: &'a AccountInfo<'info>,
    pub prover: &'a AccountInfo<'info>,
    pub dispatcher: &'a AccountInfo<'info>,
    pub system_program: &'a Program<'info, System>,
}

/// Hands `pairs` to the prover through the portal dispatcher, which is the
/// only caller provers accept proof requests from. The dispatcher holds `fee`
/// for the duration of the call.
pub(crate) fn dispatch<'info>(
    accounts: DispatchAccounts<'_, 'info>,
    prover_accounts: &[AccountInfo<'info>],
    source: u64,
    pairs: Vec<IntentHashClaimant>,
    data: Vec<u8>,
    fee: u64,
) -> Result<()> {
    let DispatchAccounts {
        payer,
        prover,
        dispatcher,
        system_program,
    } = accounts;

    require!(
        is_prover(prover.key) && prover.executable,
        PortalError::InvalidProver
    );

    if fee > 0 {
        system_program::transfer(
            CpiContext::new(
                system_program.to_account_info(),
                system_program::Transfer {
                    from: payer.to_account_info(),
                    to: dispatcher.to_account_info(),
                },
            ),
            fee,
        )?;
    }

    let data = prover::ProveArgs::new(source, pairs.clone().into(), data, fee)
        .to_instruction_data()?;
    let instruction = Instruction::new_with_bytes(
        prover.key(),
        &data,
        iter::once(AccountMeta::new(dispatcher.key(), true))
            .chain(prover_accounts.iter().map(|account| AccountMeta {
                pubkey: account.key(),
                is_signer: account.is_signer,
                is_writable: account.is_writable,
            }))
            .collect(),
    );
    let (_, bump) = dispatcher_pda();

    invoke_signed(
        &instruction,
        &iter::once(dispatcher.to_account_info())
            .chain(prover_accounts.iter().cloned())
            .chain(iter::once(prover.to_account_info()))
            .collect::<Vec<_>>(),
        &[&[DISPATCHER_SEED, &[bump]]],
    )?;

    msg!("{} proofs dispatched to {}", pairs.len(), prover.key);
    pairs.into_iter().for_each(|pair| {
        emit!(IntentProven::new(
            pair.intent_hash,
            pair.claimant,
            source,
            CHAIN_ID
        ))
    });

    Ok(())
}
