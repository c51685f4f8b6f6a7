use anchor_lang::prelude::borsh::{BorshDeserialize, BorshSerialize};
use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::program::{get_return_data, invoke, invoke_signed};
use anchor_lang::system_program;
use derive_new::new;

use crate::instructions::{HyperProverError, Prove};

pub const HANDLE_DISCRIMINATOR: [u8; 8] = [33, 210, 5, 66, 196, 212, 239, 142];

/// Authority the mailbox signs with when delivering a message to `recipient`.
pub fn process_authority_pda(mailbox: &Pubkey, recipient: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            b"hyperlane",
            b"-",
            b"process_authority",
            b"-",
            recipient.as_ref(),
        ],
        mailbox,
    )
}

// Borsh encodes the variant index, so the mailbox's variants keep their order
// and fee quoting is appended at the end.
#[derive(BorshSerialize, BorshDeserialize, Debug)]
#[allow(dead_code)]
pub enum MailboxInstruction {
    Init(Init),
    InboxProcess(InboxProcess),
    InboxSetDefaultIsm(Pubkey),
    InboxGetRecipientIsm(Pubkey),
    OutboxDispatch(OutboxDispatch),
    OutboxGetCount,
    OutboxGetLatestCheckpoint,
    OutboxGetRoot,
    GetOwner,
    TransferOwnership(Option<Pubkey>),
    ClaimProtocolFees,
    SetProtocolFeeConfig,
    OutboxQuoteDispatch(OutboxDispatch),
}

#[derive(BorshSerialize, BorshDeserialize, Debug, new)]
pub struct Init {
    pub local_domain: u32,
    pub fee: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, new)]
pub struct OutboxDispatch {
    pub sender: Pubkey,
    pub destination_domain: u32,
    pub recipient: [u8; 32],
    pub message_body: Vec<u8>,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, new)]
pub struct InboxProcess {
    pub message: Message,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq, new)]
pub struct Message {
    pub nonce: u32,
    pub origin: u32,
    pub sender: [u8; 32],
    pub destination: u32,
    pub recipient: [u8; 32],
    pub body: Vec<u8>,
}

/// Asks the mailbox what dispatching `outbox_dispatch` costs, in lamports.
pub fn quote_dispatch(ctx: &Context<Prove>, outbox_dispatch: &OutboxDispatch) -> Result<u64> {
    let ix = Instruction {
        program_id: ctx.accounts.mailbox_program.key(),
        accounts: vec![AccountMeta::new_readonly(ctx.accounts.outbox.key(), false)],
        data: MailboxInstruction::OutboxQuoteDispatch(outbox_dispatch.clone()).try_to_vec()?,
    };

    invoke(
        &ix,
        &[
            ctx.accounts.outbox.to_account_info(),
            ctx.accounts.mailbox_program.to_account_info(),
        ],
    )?;

    match get_return_data() {
        Some((program_id, data)) if program_id == ctx.accounts.mailbox_program.key() => {
            u64::try_from_slice(&data).map_err(|_| HyperProverError::InvalidMailboxResponse.into())
        }
        _ => Err(HyperProverError::InvalidMailboxResponse.into()),
    }
}

/// Dispatches through the mailbox, which charges its fee to the portal
/// dispatcher.
pub fn dispatch_msg(
    ctx: &Context<Prove>,
    outbox_dispatch: OutboxDispatch,
    signer_seeds: &[&[u8]],
) -> Result<()> {
    let ix = Instruction {
        program_id: ctx.accounts.mailbox_program.key(),
        accounts: vec![
            AccountMeta::new(ctx.accounts.outbox.key(), false),
            AccountMeta::new_readonly(ctx.accounts.dispatcher.key(), true),
            AccountMeta::new(ctx.accounts.portal_dispatcher.key(), true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: MailboxInstruction::OutboxDispatch(outbox_dispatch).try_to_vec()?,
    };

    invoke_signed(
        &ix,
        &[
            ctx.accounts.outbox.to_account_info(),
            ctx.accounts.dispatcher.to_account_info(),
            ctx.accounts.portal_dispatcher.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
            ctx.accounts.mailbox_program.to_account_info(),
        ],
        &[signer_seeds],
    )
    .map_err(Into::into)
}
