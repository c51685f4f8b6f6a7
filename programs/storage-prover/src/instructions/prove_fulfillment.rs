use anchor_lang::prelude::*;
use routes_std::account::AccountExt;
use routes_std::prover::{IntentAlreadyProven, IntentProven, Proof, PROOF_SEED};
use routes_std::{Bytes32, CHAIN_ID};

use crate::instructions::StorageProverError;
use crate::merkle::{InclusionVerifier, SortedPairMerkle};
use crate::state::{account_leaf, storage_leaf, AnchoredBlock, BlockHeader, Config, ProofAccount};
use crate::state_proof::{fulfill_marker_address, FulfillmentStateProof};

#[derive(AnchorSerialize, AnchorDeserialize, Debug)]
pub struct ProveFulfillmentArgs {
    pub destination: u64,
    pub intent_hash: Bytes32,
    pub claimant: Pubkey,
    pub header: BlockHeader,
    pub account_proof: Vec<Bytes32>,
    pub storage_root: Bytes32,
    pub storage_proof: Vec<Bytes32>,
}

impl ProveFulfillmentArgs {
    pub fn from_state_proof(
        destination: u64,
        intent_hash: Bytes32,
        state_proof: FulfillmentStateProof,
    ) -> Self {
        Self {
            destination,
            intent_hash,
            claimant: state_proof.claimant,
            header: state_proof.header,
            account_proof: state_proof.account_proof,
            storage_root: state_proof.storage_root,
            storage_proof: state_proof.storage_proof,
        }
    }
}

/// Anyone may relay a proof.
#[derive(Accounts)]
#[instruction(args: ProveFulfillmentArgs)]
pub struct ProveFulfillment<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(address = Config::pda().0 @ StorageProverError::InvalidConfig)]
    pub config: Account<'info, Config>,
    /// CHECK: validated against the oracle in the handler
    pub anchored_block: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(
        mut,
        address = Proof::pda(&args.intent_hash, &crate::ID).0 @ StorageProverError::InvalidProof,
    )]
    pub proof: UncheckedAccount<'info>,
    pub system_program: Program<'info, System>,
}

pub fn prove_fulfillment(
    ctx: Context<ProveFulfillment>,
    args: ProveFulfillmentArgs,
) -> Result<()> {
    prove_with(ctx, args, &SortedPairMerkle)
}

/// Verifies the fulfill marker of `intent_hash` against an anchored
/// destination block and records the proof.
pub fn prove_with(
    ctx: Context<ProveFulfillment>,
    args: ProveFulfillmentArgs,
    verifier: &impl InclusionVerifier,
) -> Result<()> {
    let ProveFulfillmentArgs {
        destination,
        intent_hash,
        claimant,
        header,
        account_proof,
        storage_root,
        storage_proof,
    } = args;
    let config = &ctx.accounts.config;
    let portal = config
        .portal(destination)
        .ok_or(StorageProverError::UnknownDestination)?;

    require_keys_neq!(claimant, Pubkey::default(), StorageProverError::ZeroClaimant);

    let anchored = AnchoredBlock::try_from_account_info(
        &ctx.accounts.anchored_block,
        &config.oracle,
        destination,
        header.number,
    )?;
    require!(
        header.hash() == anchored.block_hash,
        StorageProverError::InvalidBlockHeader
    );
    require!(
        verifier.verify(
            &header.state_root,
            &account_leaf(&portal, &storage_root),
            &account_proof
        ),
        StorageProverError::InvalidAccountProof
    );
    require!(
        verifier.verify(
            &storage_root,
            &storage_leaf(&fulfill_marker_address(&portal, &intent_hash), claimant.as_ref()),
            &storage_proof
        ),
        StorageProverError::InvalidStorageProof
    );

    if ProofAccount::try_load(&ctx.accounts.proof)?.is_some() {
        emit!(IntentAlreadyProven::new(intent_hash));

        return Ok(());
    }

    let (_, bump) = Proof::pda(&intent_hash, &crate::ID);
    ProofAccount::from(Proof::new(destination, claimant)).init(
        &ctx.accounts.proof,
        &ctx.accounts.payer,
        &ctx.accounts.system_program,
        &[&[PROOF_SEED, intent_hash.as_ref(), &[bump]]],
    )?;

    msg!(
        "intent {} proven from block {} of {}",
        intent_hash,
        header.number,
        destination
    );
    emit!(IntentProven::new(intent_hash, claimant, CHAIN_ID, destination));

    Ok(())
}
