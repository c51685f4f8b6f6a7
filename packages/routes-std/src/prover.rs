use anchor_lang::prelude::*;
use derive_more::Deref;
use derive_new::new;

use crate::Bytes32;

pub const PROOF_SEED: &[u8] = b"proof";
pub const PROVE_DISCRIMINATOR: [u8; 8] = [52, 246, 26, 161, 211, 170, 86, 215];

pub const HYPER_PROVER_ID: Pubkey = pubkey!("B4pMQaAGPZ7Mza9XnDxJfXZ1cUa4aa67zrNkv8zYAjx4");
pub const STORAGE_PROVER_ID: Pubkey = pubkey!("9HRzBk9sDpQVWevztY2QNBUT4uRZhmVQ3HDQ5JRmTu3B");

const INTENT_HASH_CLAIMANT_LEN: usize = 64;

pub fn is_prover(program_id: &Pubkey) -> bool {
    [HYPER_PROVER_ID, STORAGE_PROVER_ID].contains(program_id)
}

#[error_code]
pub enum ProverError {
    InvalidIntentHashesClaimantsLength,
}

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Default, new, Debug, PartialEq, Eq)]
pub struct Proof {
    pub destination: u64,
    pub claimant: Pubkey,
}

impl Proof {
    pub fn pda(intent_hash: &Bytes32, prover: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[PROOF_SEED, intent_hash.as_ref()], prover)
    }

    /// Reads the proof held by `account`. Accounts that `prover` does not own
    /// carry no proof.
    pub fn try_from_account_info(account: &AccountInfo, prover: &Pubkey) -> Result<Option<Self>> {
        if account.owner != prover {
            return Ok(None);
        }

        account
            .try_borrow_data()?
            .get(8..)
            .map(Self::try_from_slice)
            .transpose()
            .map_err(Into::into)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct IntentHashClaimant {
    pub intent_hash: Bytes32,
    pub claimant: Pubkey,
}

/// Batch of fulfilled intents carried by a proof message. On the wire each pair
/// is `intent_hash || claimant`, 64 bytes, with no length prefix.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq, Deref)]
pub struct IntentHashesClaimants(Vec<IntentHashClaimant>);

impl From<Vec<IntentHashClaimant>> for IntentHashesClaimants {
    fn from(pairs: Vec<IntentHashClaimant>) -> Self {
        Self(pairs)
    }
}

impl IntentHashesClaimants {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0
            .iter()
            .flat_map(|pair| pair.intent_hash.into_iter().chain(pair.claimant.to_bytes()))
            .collect()
    }
}

impl TryFrom<&[u8]> for IntentHashesClaimants {
    type Error = anchor_lang::error::Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        require!(
            bytes.len() % INTENT_HASH_CLAIMANT_LEN == 0,
            ProverError::InvalidIntentHashesClaimantsLength
        );

        Ok(Self(
            bytes
                .chunks_exact(INTENT_HASH_CLAIMANT_LEN)
                .map(|chunk| {
                    let (intent_hash, claimant) = chunk.split_at(32);

                    IntentHashClaimant::new(
                        Bytes32::from(<[u8; 32]>::try_from(intent_hash).unwrap_or_default()),
                        Pubkey::try_from(claimant).unwrap_or_default(),
                    )
                })
                .collect(),
        ))
    }
}

/// Arguments the portal passes to a prover's `prove` instruction, prefixed with
/// [`PROVE_DISCRIMINATOR`]. `fee` lamports are held by the portal dispatcher,
/// which signs the invocation; the prover spends what it needs and returns the
/// rest to the fee payer.
#[derive(AnchorSerialize, AnchorDeserialize, Debug, new)]
pub struct ProveArgs {
    pub source: u64,
    pub intent_hashes_claimants: IntentHashesClaimants,
    pub data: Vec<u8>,
    pub fee: u64,
}

impl ProveArgs {
    pub fn to_instruction_data(&self) -> Result<Vec<u8>> {
        Ok(PROVE_DISCRIMINATOR
            .into_iter()
            .chain(self.try_to_vec()?)
            .collect())
    }
}

/// Emitted by the portal when it dispatches a proof and by a prover when it
/// records one.
#[event]
#[derive(new)]
pub struct IntentProven {
    intent_hash: Bytes32,
    claimant: Pubkey,
    source: u64,
    destination: u64,
}

#[event]
#[derive(new)]
pub struct IntentAlreadyProven {
    intent_hash: Bytes32,
}
