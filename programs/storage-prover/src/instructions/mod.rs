use anchor_lang::prelude::*;

mod init;
mod prove;
mod prove_fulfillment;

pub use init::*;
pub use prove::*;
pub use prove_fulfillment::*;

#[error_code]
pub enum StorageProverError {
    InvalidConfig,
    InvalidPortalDispatcher,
    InvalidProof,
    InvalidAnchoredBlock,
    RootNotAnchored,
    InvalidOracle,
    InvalidBlockHeader,
    InvalidAccountProof,
    InvalidStorageProof,
    UnknownDestination,
    ZeroClaimant,
    TooManyPortals,
    EmptyTree,
    LeafIndexOutOfBounds,
}
