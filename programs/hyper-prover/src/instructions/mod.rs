use anchor_lang::prelude::*;

mod handle;
mod init;
mod prove;

pub use handle::*;
pub use init::*;
pub use prove::*;

#[error_code]
pub enum HyperProverError {
    InvalidPortalDispatcher,
    InvalidDispatcher,
    InvalidConfig,
    InvalidMailbox,
    InvalidProcessAuthority,
    InvalidPdaPayer,
    InvalidProof,
    InvalidSender,
    InvalidData,
    InvalidChainId,
    InvalidMailboxResponse,
    InsufficientFee,
    TooManyWhitelistedSenders,
}
