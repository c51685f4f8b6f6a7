//! # Hyper-Prover Program
//!
//! Relays fulfillments back to the source chain over a Hyperlane mailbox.
//!
//! On the destination chain the portal dispatcher hands the prover a batch of
//! `(intent_hash, claimant)` pairs together with the fee it collected. The
//! prover quotes the mailbox, dispatches the batch to the prover registered on
//! the source chain and returns any fee overpayment to the payer.
//!
//! On the source chain the mailbox delivers the message through its process
//! authority. Messages from whitelisted senders become proof records that the
//! portal reads to release rewards. Proofs are never overwritten; a redelivered
//! pair only emits `IntentAlreadyProven`.

use anchor_lang::prelude::*;
use routes_std::prover;

declare_id!("B4pMQaAGPZ7Mza9XnDxJfXZ1cUa4aa67zrNkv8zYAjx4");

pub mod hyperlane;
pub mod instructions;
pub mod state;

use instructions::*;

#[program]
pub mod hyper_prover {
    use super::*;

    /// Stores the mailbox and the source chain senders `handle` accepts.
    pub fn init(ctx: Context<Init>, args: InitArgs) -> Result<()> {
        instructions::init(ctx, args)
    }

    /// Dispatches proofs for the pairs in `args`. Only the portal dispatcher
    /// may call it; `args.data` is the source chain prover address.
    pub fn prove(ctx: Context<Prove>, args: prover::ProveArgs) -> Result<()> {
        prove_intent(ctx, args)
    }

    /// Mailbox entry point for inbound proof messages.
    #[instruction(discriminator = &hyperlane::HANDLE_DISCRIMINATOR)]
    pub fn handle<'info>(
        ctx: Context<'_, '_, '_, 'info, Handle<'info>>,
        origin: u32,
        sender: [u8; 32],
        payload: Vec<u8>,
    ) -> Result<()> {
        instructions::handle(ctx, origin, sender, payload)
    }
}
