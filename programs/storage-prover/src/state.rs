use anchor_lang::prelude::*;
use derive_new::new;
use routes_std::account::AccountExt;
use routes_std::prover::Proof;
use routes_std::{keccak, Bytes32};

use crate::instructions::StorageProverError;

pub const CONFIG_SEED: &[u8] = b"config";
pub const ANCHORED_BLOCK_SEED: &[u8] = b"anchored_block";
pub const MAX_PORTALS_LEN: usize = 20;

#[account]
#[derive(InitSpace)]
pub struct ProofAccount(pub Proof);

impl AccountExt for ProofAccount {}

impl From<Proof> for ProofAccount {
    fn from(proof: Proof) -> Self {
        Self(proof)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct DestinationPortal {
    pub chain_id: u64,
    pub portal: Pubkey,
}

#[account]
#[derive(InitSpace, Debug)]
pub struct Config {
    /// Program whose accounts hold anchored destination block hashes.
    pub oracle: Pubkey,
    #[max_len(MAX_PORTALS_LEN)]
    pub portals: Vec<DestinationPortal>,
}

impl Config {
    pub fn new(oracle: Pubkey, portals: Vec<DestinationPortal>) -> Result<Self> {
        require_gte!(
            MAX_PORTALS_LEN,
            portals.len(),
            StorageProverError::TooManyPortals
        );

        Ok(Self { oracle, portals })
    }

    pub fn pda() -> (Pubkey, u8) {
        Pubkey::find_program_address(&[CONFIG_SEED], &crate::ID)
    }

    pub fn portal(&self, chain_id: u64) -> Option<Pubkey> {
        self.portals
            .iter()
            .find(|portal| portal.chain_id == chain_id)
            .map(|portal| portal.portal)
    }
}

impl AccountExt for Config {}

/// Destination block hash attested by the settlement oracle. Stored as plain
/// borsh in an account the oracle owns.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct AnchoredBlock {
    pub chain_id: u64,
    pub block_number: u64,
    pub block_hash: Bytes32,
}

impl AnchoredBlock {
    pub fn pda(oracle: &Pubkey, chain_id: u64, block_number: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[
                ANCHORED_BLOCK_SEED,
                &chain_id.to_le_bytes(),
                &block_number.to_le_bytes(),
            ],
            oracle,
        )
    }

    /// Reads the block held by `account`, which must be the oracle's account
    /// for `(chain_id, block_number)`.
    pub fn try_from_account_info(
        account: &AccountInfo,
        oracle: &Pubkey,
        chain_id: u64,
        block_number: u64,
    ) -> Result<Self> {
        let (address, _) = Self::pda(oracle, chain_id, block_number);
        require_keys_eq!(*account.key, address, StorageProverError::InvalidAnchoredBlock);
        require!(!account.data_is_empty(), StorageProverError::RootNotAnchored);
        require_keys_eq!(*account.owner, *oracle, StorageProverError::InvalidOracle);

        let block = Self::deserialize(&mut &account.try_borrow_data()?[..])
            .map_err(|_| StorageProverError::InvalidOracle)?;
        require!(
            block.chain_id == chain_id && block.block_number == block_number,
            StorageProverError::InvalidOracle
        );

        Ok(block)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct BlockHeader {
    pub number: u64,
    pub parent_hash: Bytes32,
    /// Root over one account leaf per program.
    pub state_root: Bytes32,
    pub timestamp: i64,
}

impl BlockHeader {
    pub fn hash(&self) -> Bytes32 {
        let encoded = self.try_to_vec().expect("Failed to serialize BlockHeader");

        keccak([encoded.as_slice()])
    }
}

/// Commitment to a program and the root over its accounts.
pub fn account_leaf(program: &Pubkey, storage_root: &Bytes32) -> Bytes32 {
    keccak([program.as_ref(), storage_root.as_slice()])
}

/// Commitment to an account address and its value, the account data without
/// the discriminator.
pub fn storage_leaf(address: &Pubkey, value: &[u8]) -> Bytes32 {
    keccak([address.as_ref(), value])
}
