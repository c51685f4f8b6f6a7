use anchor_lang::prelude::*;
use routes_std::account::AccountExt;
use routes_std::prover::Proof;
use routes_std::Bytes32;

use crate::hyperlane::process_authority_pda;
use crate::instructions::HyperProverError;

pub const DISPATCHER_SEED: &[u8] = b"dispatcher";
pub const CONFIG_SEED: &[u8] = b"config";
pub const PDA_PAYER_SEED: &[u8] = b"pda_payer";
pub const MAX_WHITELIST_LEN: usize = 20;

/// Proof record at `Proof::pda(intent_hash, hyper_prover::ID)`. Written once by
/// `handle`, read by the portal on withdrawal.
#[account]
#[derive(InitSpace, Debug)]
pub struct ProofAccount(pub Proof);

impl AccountExt for ProofAccount {}

impl From<Proof> for ProofAccount {
    fn from(proof: Proof) -> Self {
        Self(proof)
    }
}

/// Sender of every outbound message.
pub fn dispatcher_pda() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[DISPATCHER_SEED], &crate::ID)
}

/// Pays rent for proof records. Inbound delivery does not hand the recipient a
/// funded signer, so this address is topped up out of band.
pub fn pda_payer_pda() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PDA_PAYER_SEED], &crate::ID)
}

/// The mailbox this prover talks to and the source chain provers whose
/// messages it accepts.
#[account]
#[derive(InitSpace, Debug)]
pub struct Config {
    pub mailbox: Pubkey,
    #[max_len(MAX_WHITELIST_LEN)]
    pub whitelisted_senders: Vec<Bytes32>,
}

impl Config {
    pub fn new(mailbox: Pubkey, whitelisted_senders: Vec<Bytes32>) -> Result<Self> {
        require!(
            whitelisted_senders.len() <= MAX_WHITELIST_LEN,
            HyperProverError::TooManyWhitelistedSenders
        );
        require_keys_neq!(mailbox, Pubkey::default(), HyperProverError::InvalidMailbox);

        Ok(Self {
            mailbox,
            whitelisted_senders,
        })
    }

    pub fn pda() -> (Pubkey, u8) {
        Pubkey::find_program_address(&[CONFIG_SEED], &crate::ID)
    }

    pub fn is_whitelisted(&self, sender: &Bytes32) -> bool {
        self.whitelisted_senders.contains(sender)
    }

    /// The only signer `handle` accepts: the configured mailbox's process
    /// authority for this program.
    pub fn process_authority(&self) -> Pubkey {
        process_authority_pda(&self.mailbox, &crate::ID).0
    }
}

impl AccountExt for Config {}
