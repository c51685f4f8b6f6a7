use anchor_lang::prelude::*;
use routes_std::account::AccountExt;

use crate::instructions::StorageProverError;
use crate::state::{Config, DestinationPortal, CONFIG_SEED};

#[derive(AnchorSerialize, AnchorDeserialize, Debug)]
pub struct InitArgs {
    pub oracle: Pubkey,
    pub portals: Vec<DestinationPortal>,
}

#[derive(Accounts)]
pub struct Init<'info> {
    /// CHECK: address is validated
    #[account(mut, address = Config::pda().0 @ StorageProverError::InvalidConfig)]
    pub config: UncheckedAccount<'info>,
    #[account(mut)]
    pub payer: Signer<'info>,
    pub system_program: Program<'info, System>,
}

pub fn init(ctx: Context<Init>, args: InitArgs) -> Result<()> {
    let InitArgs { oracle, portals } = args;
    let (_, bump) = Config::pda();
    let destinations = portals.len();

    Config::new(oracle, portals)?.init(
        &ctx.accounts.config,
        &ctx.accounts.payer,
        &ctx.accounts.system_program,
        &[&[CONFIG_SEED, &[bump]]],
    )?;
    msg!("oracle {} anchors {} destinations", oracle, destinations);

    Ok(())
}
