use anchor_lang::prelude::*;
use routes_std::account::AccountExt;
use routes_std::prover::{
    IntentAlreadyProven, IntentHashClaimant, IntentHashesClaimants, IntentProven, Proof,
    PROOF_SEED,
};
use routes_std::CHAIN_ID;

use crate::instructions::HyperProverError;
use crate::state::{pda_payer_pda, Config, ProofAccount, PDA_PAYER_SEED};

/// Remaining accounts: the proof account of every pair in the message body,
/// in order.
#[derive(Accounts)]
pub struct Handle<'info> {
    #[account(address = config.process_authority() @ HyperProverError::InvalidProcessAuthority)]
    pub process_authority: Signer<'info>,
    #[account(address = Config::pda().0 @ HyperProverError::InvalidConfig)]
    pub config: Account<'info, Config>,
    /// CHECK: address is validated
    #[account(mut, address = pda_payer_pda().0 @ HyperProverError::InvalidPdaPayer)]
    pub pda_payer: UncheckedAccount<'info>,
    pub system_program: Program<'info, System>,
}

/// Records a proof for every `(intent_hash, claimant)` pair in `payload`.
/// Pairs proven before are reported and skipped, so redelivery is harmless.
pub fn handle<'info>(
    ctx: Context<'_, '_, '_, 'info, Handle<'info>>,
    origin: u32,
    sender: [u8; 32],
    payload: Vec<u8>,
) -> Result<()> {
    require!(
        ctx.accounts.config.is_whitelisted(&sender.into()),
        HyperProverError::InvalidSender
    );

    let destination = domain_to_chain(origin);
    let pairs = IntentHashesClaimants::try_from(payload.as_slice())
        .map_err(|_| HyperProverError::InvalidData)?;
    require!(
        pairs.len() == ctx.remaining_accounts.len(),
        HyperProverError::InvalidProof
    );

    pairs
        .iter()
        .zip(ctx.remaining_accounts)
        .try_for_each(|(pair, proof)| mark_proven(&ctx, destination, pair, proof))
}

// Mailbox domains double as chain ids.
fn domain_to_chain(domain: u32) -> u64 {
    domain.into()
}

fn mark_proven<'info>(
    ctx: &Context<'_, '_, '_, 'info, Handle<'info>>,
    destination: u64,
    pair: &IntentHashClaimant,
    proof: &AccountInfo<'info>,
) -> Result<()> {
    let IntentHashClaimant {
        intent_hash,
        claimant,
    } = *pair;
    let (proof_pda, proof_bump) = Proof::pda(&intent_hash, &crate::ID);
    require_keys_eq!(proof.key(), proof_pda, HyperProverError::InvalidProof);

    if claimant == Pubkey::default() {
        msg!("intent {} has no claimant, skipped", intent_hash);
        return Ok(());
    }

    if ProofAccount::try_load(proof)?.is_some() {
        emit!(IntentAlreadyProven::new(intent_hash));
        return Ok(());
    }

    let (_, pda_payer_bump) = pda_payer_pda();
    ProofAccount::from(Proof::new(destination, claimant)).init(
        proof,
        &ctx.accounts.pda_payer,
        &ctx.accounts.system_program,
        &[
            &[PDA_PAYER_SEED, &[pda_payer_bump]],
            &[PROOF_SEED, intent_hash.as_ref(), &[proof_bump]],
        ],
    )?;

    emit!(IntentProven::new(intent_hash, claimant, CHAIN_ID, destination));

    Ok(())
}
