use anchor_lang::prelude::*;

pub mod call;
pub mod config;
pub mod fulfill;
pub mod fund;
pub mod fund_context;
pub mod fund_for;
pub mod payout;
pub mod permit;
pub mod prove;
pub mod publish;
pub mod recover_token;
pub mod refund;
pub mod withdraw;

pub use config::*;
pub use fulfill::*;
pub use fund::*;
pub use fund_for::*;
pub use prove::*;
pub use publish::*;
pub use recover_token::*;
pub use refund::*;
pub use withdraw::*;

#[error_code]
pub enum PortalError {
    WrongSourceChain,
    IntentAlreadyResolved,
    InsufficientFunds,
    TokenAmountOverflow,
    InvalidPermitResponse,
    UnauthorizedWithdrawal,
    RewardsAlreadyWithdrawn,
    IntentAlreadyRefunded,
    IntentNotExpired,
    IntentNotResolved,
    InvalidRefundToken,
    InsufficientVaultBalance,
    ArrayLengthMismatch,
    InvalidHash,
    InvalidPortal,
    InvalidDestination,
    UnauthorizedSolveAttempt,
    IntentAlreadyFulfilled,
    ZeroClaimant,
    CallToPortal,
    CallToProver,
    CallToNonProgram,
    CallToTokenProgram,
    InvalidProver,
    EmptyBatch,
    BatchTooLarge,
    IntentNotFulfilled,
    TooManyWhitelistedSolvers,
    ConfigAlreadyInitialized,
    Unauthorized,
    InvalidVault,
    InvalidMint,
    InvalidAta,
    InvalidTokenProgram,
    InvalidTokenTransferAccounts,
    InvalidCalldata,
    InvalidCallTarget,
    InvalidExecutor,
    InvalidFulfillMarker,
    InvalidDispatcher,
    InvalidCreator,
    InvalidClaimant,
    InvalidClaimState,
    InvalidConfig,
    InvalidFunder,
    InvalidFundingSource,
    InvalidProof,
}
