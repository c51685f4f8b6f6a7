//! Minimal Hyperlane mailbox for tests.
//!
//! Instruction data is the mailbox's borsh `MailboxInstruction`: a one byte
//! variant index followed by the variant's fields. Only the variants the
//! hyper-prover uses are served. Dispatched messages are announced with a
//! `Dispatched` event; tests relay them with `inbox_process`, late, out of
//! order or more than once.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::program::invoke_signed;
use anchor_lang::system_program;
use hyper_prover::hyperlane::HANDLE_DISCRIMINATOR;

declare_id!("7cUmG9bpHnDVN9TjfCzAwVMo1UTFWgkWDeTzqqnoBCb3");

pub const OUTBOX_SEED: &[u8] = b"outbox";
pub const PROCESS_AUTHORITY_SEED: &[u8] = b"process_authority";

#[error_code]
pub enum MailboxError {
    InvalidSender,
    InvalidDestination,
    UnknownRecipient,
}

#[account]
#[derive(InitSpace, Debug)]
pub struct Outbox {
    pub local_domain: u32,
    pub fee: u64,
    pub nonce: u32,
}

impl Outbox {
    pub fn pda() -> (Pubkey, u8) {
        Pubkey::find_program_address(&[OUTBOX_SEED], &crate::ID)
    }
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub nonce: u32,
    pub origin: u32,
    pub sender: [u8; 32],
    pub destination: u32,
    pub recipient: [u8; 32],
    pub body: Vec<u8>,
}

#[program]
pub mod mock_mailbox {
    use super::*;

    #[instruction(discriminator = &[0])]
    pub fn init(ctx: Context<Init>, local_domain: u32, fee: u64) -> Result<()> {
        ctx.accounts.outbox.set_inner(Outbox {
            local_domain,
            fee,
            nonce: 0,
        });

        Ok(())
    }

    /// Delivers a message to its recipient, signing as the recipient's
    /// process authority. Remaining accounts are passed to the recipient.
    #[instruction(discriminator = &[1])]
    #[allow(clippy::too_many_arguments)]
    pub fn inbox_process<'info>(
        ctx: Context<'_, '_, '_, 'info, InboxProcess<'info>>,
        nonce: u32,
        origin: u32,
        sender: [u8; 32],
        destination: u32,
        recipient: [u8; 32],
        body: Vec<u8>,
    ) -> Result<()> {
        require_eq!(
            destination,
            ctx.accounts.outbox.local_domain,
            MailboxError::InvalidDestination
        );

        let process_authority = ctx.accounts.process_authority.to_account_info();
        let data = HANDLE_DISCRIMINATOR
            .into_iter()
            .chain((origin, sender, body).try_to_vec()?)
            .collect::<Vec<_>>();
        let instruction = Instruction::new_with_bytes(
            ctx.accounts.recipient_program.key(),
            &data,
            std::iter::once(AccountMeta::new_readonly(process_authority.key(), true))
                .chain(ctx.remaining_accounts.iter().map(|account| AccountMeta {
                    pubkey: account.key(),
                    is_signer: account.is_signer,
                    is_writable: account.is_writable,
                }))
                .collect(),
        );

        msg!("processing message {} from {}", nonce, origin);

        invoke_signed(
            &instruction,
            &std::iter::once(process_authority)
                .chain(ctx.remaining_accounts.iter().cloned())
                .chain(std::iter::once(ctx.accounts.recipient_program.to_account_info()))
                .collect::<Vec<_>>(),
            &[&[
                b"hyperlane",
                b"-",
                PROCESS_AUTHORITY_SEED,
                b"-",
                recipient.as_ref(),
                &[ctx.bumps.process_authority],
            ]],
        )
        .map_err(Into::into)
    }

    /// Charges the outbox fee to `payer` and announces the message.
    #[instruction(discriminator = &[4])]
    pub fn outbox_dispatch(
        ctx: Context<OutboxDispatch>,
        sender: Pubkey,
        destination_domain: u32,
        recipient: [u8; 32],
        message_body: Vec<u8>,
    ) -> Result<()> {
        require_keys_eq!(
            ctx.accounts.sender.key(),
            sender,
            MailboxError::InvalidSender
        );

        let fee = ctx.accounts.outbox.fee;
        if fee > 0 {
            system_program::transfer(
                CpiContext::new(
                    ctx.accounts.system_program.to_account_info(),
                    system_program::Transfer {
                        from: ctx.accounts.payer.to_account_info(),
                        to: ctx.accounts.outbox.to_account_info(),
                    },
                ),
                fee,
            )?;
        }

        let outbox = &mut ctx.accounts.outbox;
        emit!(Dispatched {
            nonce: outbox.nonce,
            origin: outbox.local_domain,
            sender: sender.to_bytes(),
            destination: destination_domain,
            recipient,
            body: message_body,
        });
        outbox.nonce += 1;

        Ok(())
    }

    #[instruction(discriminator = &[12])]
    pub fn outbox_quote_dispatch(
        ctx: Context<OutboxQuoteDispatch>,
        _sender: Pubkey,
        _destination_domain: u32,
        _recipient: [u8; 32],
        _message_body: Vec<u8>,
    ) -> Result<u64> {
        Ok(ctx.accounts.outbox.fee)
    }
}

#[derive(Accounts)]
pub struct Init<'info> {
    #[account(init, payer = payer, space = 8 + Outbox::INIT_SPACE, seeds = [OUTBOX_SEED], bump)]
    pub outbox: Account<'info, Outbox>,
    #[account(mut)]
    pub payer: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(nonce: u32, origin: u32, sender: [u8; 32], destination: u32, recipient: [u8; 32])]
pub struct InboxProcess<'info> {
    #[account(seeds = [OUTBOX_SEED], bump)]
    pub outbox: Account<'info, Outbox>,
    /// CHECK: address is validated
    #[account(seeds = [b"hyperlane", b"-", PROCESS_AUTHORITY_SEED, b"-", recipient.as_ref()], bump)]
    pub process_authority: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(executable, address = Pubkey::new_from_array(recipient) @ MailboxError::UnknownRecipient)]
    pub recipient_program: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct OutboxDispatch<'info> {
    #[account(mut, seeds = [OUTBOX_SEED], bump)]
    pub outbox: Account<'info, Outbox>,
    pub sender: Signer<'info>,
    #[account(mut)]
    pub payer: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct OutboxQuoteDispatch<'info> {
    #[account(seeds = [OUTBOX_SEED], bump)]
    pub outbox: Account<'info, Outbox>,
}
