//! # Storage-Prover Program
//!
//! Proves fulfillments by reading the destination chain's state instead of
//! waiting for a message.
//!
//! A settlement oracle anchors destination block hashes on the source chain.
//! Anyone can then present a block header matching an anchored hash together
//! with two inclusion proofs: the gateway's storage root under the header's
//! state root, and the intent's fulfill marker under that storage root. A valid
//! presentation records the same proof the message bridge would have.
//!
//! Proving is permissionless and replayable. Fulfillment on the destination
//! only announces the intent; there is nothing to dispatch.

use anchor_lang::prelude::*;
use routes_std::prover;

declare_id!("9HRzBk9sDpQVWevztY2QNBUT4uRZhmVQ3HDQ5JRmTu3B");

pub mod instructions;
pub mod merkle;
pub mod state;
pub mod state_proof;

use instructions::*;

#[program]
pub mod storage_prover {
    use super::*;

    pub fn init(ctx: Context<Init>, args: InitArgs) -> Result<()> {
        instructions::init(ctx, args)
    }

    /// Portal dispatcher entry point. Returns the fee, there is nothing to send.
    pub fn prove(ctx: Context<Prove>, args: prover::ProveArgs) -> Result<()> {
        prove_intent(ctx, args)
    }

    pub fn prove_fulfillment(
        ctx: Context<ProveFulfillment>,
        args: ProveFulfillmentArgs,
    ) -> Result<()> {
        instructions::prove_fulfillment(ctx, args)
    }
}
