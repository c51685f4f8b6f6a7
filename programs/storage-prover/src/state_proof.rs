use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use portal::state::FULFILL_MARKER_SEED;
use routes_std::Bytes32;

use crate::instructions::StorageProverError;
use crate::merkle::MerkleTree;
use crate::state::{account_leaf, storage_leaf, BlockHeader};

const DISCRIMINATOR_LEN: usize = 8;

/// Data of every account on a chain, keyed by owning program, then address.
pub type ChainState = BTreeMap<Pubkey, BTreeMap<Pubkey, Vec<u8>>>;

/// Everything a relayer presents to prove one fulfillment, read from the
/// destination chain.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct FulfillmentStateProof {
    pub header: BlockHeader,
    pub claimant: Pubkey,
    pub account_proof: Vec<Bytes32>,
    pub storage_root: Bytes32,
    pub storage_proof: Vec<Bytes32>,
}

/// Address of the fulfill marker `portal` keeps for `intent_hash`.
pub fn fulfill_marker_address(portal: &Pubkey, intent_hash: &Bytes32) -> Pubkey {
    Pubkey::find_program_address(&[FULFILL_MARKER_SEED, intent_hash.as_ref()], portal).0
}

impl FulfillmentStateProof {
    /// Commits to `state` in a block header and proves the fulfill marker of
    /// `intent_hash` under it. Accounts without data are left out.
    pub fn build(
        state: &ChainState,
        portal: &Pubkey,
        intent_hash: &Bytes32,
        number: u64,
        parent_hash: Bytes32,
        timestamp: i64,
    ) -> Result<Self> {
        let storage_trees = state
            .iter()
            .map(|(program, accounts)| storage_tree(accounts).map(|tree| (*program, tree)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let state_tree = MerkleTree::new(
            storage_trees
                .iter()
                .map(|(program, tree)| account_leaf(program, &tree.root()))
                .collect(),
        )?;

        let portal_index = storage_trees
            .keys()
            .position(|program| program == portal)
            .ok_or(StorageProverError::InvalidAccountProof)?;
        let portal_storage = &storage_trees[portal];

        let marker = fulfill_marker_address(portal, intent_hash);
        let (marker_index, claimant) = stored_accounts(&state[portal])
            .enumerate()
            .find(|(_, (address, _))| **address == marker)
            .map(|(index, (_, data))| (index, storage_value(data)))
            .ok_or(StorageProverError::InvalidStorageProof)?;

        Ok(Self {
            header: BlockHeader::new(number, parent_hash, state_tree.root(), timestamp),
            claimant: Pubkey::try_from(claimant)
                .map_err(|_| StorageProverError::InvalidStorageProof)?,
            account_proof: state_tree.proof(portal_index)?,
            storage_root: portal_storage.root(),
            storage_proof: portal_storage.proof(marker_index)?,
        })
    }
}

fn stored_accounts(
    accounts: &BTreeMap<Pubkey, Vec<u8>>,
) -> impl Iterator<Item = (&Pubkey, &Vec<u8>)> {
    accounts.iter().filter(|(_, data)| !data.is_empty())
}

fn storage_tree(accounts: &BTreeMap<Pubkey, Vec<u8>>) -> Result<MerkleTree> {
    MerkleTree::new(
        stored_accounts(accounts)
            .map(|(address, data)| storage_leaf(address, storage_value(data)))
            .collect(),
    )
}

fn storage_value(data: &[u8]) -> &[u8] {
    data.get(DISCRIMINATOR_LEN..).unwrap_or_default()
}
