use anchor_lang::prelude::*;
use routes_std::account::AccountExt;
use routes_std::Bytes32;

use crate::instructions::HyperProverError;
use crate::state::{Config, CONFIG_SEED};

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct InitArgs {
    pub mailbox: Pubkey,
    pub whitelisted_senders: Vec<Bytes32>,
}

#[derive(Accounts)]
pub struct Init<'info> {
    /// CHECK: address is validated
    #[account(mut, address = Config::pda().0 @ HyperProverError::InvalidConfig)]
    pub config: UncheckedAccount<'info>,
    #[account(mut)]
    pub payer: Signer<'info>,
    pub system_program: Program<'info, System>,
}

pub fn init(ctx: Context<Init>, args: InitArgs) -> Result<()> {
    let InitArgs {
        mailbox,
        whitelisted_senders,
    } = args;
    let (_, bump) = Config::pda();
    let signer_seeds = [CONFIG_SEED, &[bump]];

    Config::new(mailbox, whitelisted_senders)?.init(
        &ctx.accounts.config,
        &ctx.accounts.payer,
        &ctx.accounts.system_program,
        &[&signer_seeds],
    )
}
