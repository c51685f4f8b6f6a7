use anchor_lang::prelude::*;
use routes_std::account::AccountExt;

use crate::events::{ConfigInitialized, SolverWhitelistChanged, SolvingMadePublic};
use crate::instructions::PortalError;
use crate::state::{Config, CONFIG_SEED};

#[derive(AnchorSerialize, AnchorDeserialize, Debug)]
pub struct InitArgs {
    pub owner: Pubkey,
    pub solving_public: bool,
    pub solver_whitelist: Vec<Pubkey>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug)]
pub struct ChangeSolverWhitelistArgs {
    pub solver: Pubkey,
    pub can_solve: bool,
}

#[derive(Accounts)]
pub struct Init<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    /// CHECK: address is validated
    #[account(mut, address = Config::pda().0 @ PortalError::InvalidConfig)]
    pub config: UncheckedAccount<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct Admin<'info> {
    pub owner: Signer<'info>,
    #[account(
        mut,
        address = Config::pda().0 @ PortalError::InvalidConfig,
        has_one = owner @ PortalError::Unauthorized,
    )]
    pub config: Account<'info, Config>,
}

/// Creates the solver configuration. Without it, fulfillment is open to any
/// solver.
pub fn init(ctx: Context<Init>, args: InitArgs) -> Result<()> {
    let InitArgs {
        owner,
        solving_public,
        solver_whitelist,
    } = args;
    let (_, bump) = Config::pda();

    Config::new(owner, solving_public, solver_whitelist)?
        .init(
            &ctx.accounts.config,
            &ctx.accounts.payer,
            &ctx.accounts.system_program,
            &[&[CONFIG_SEED, &[bump]]],
        )
        .map_err(|_| PortalError::ConfigAlreadyInitialized)?;

    emit!(ConfigInitialized::new(owner, solving_public));

    Ok(())
}

/// Opens fulfillment to everyone. There is no way back.
pub fn make_solving_public(ctx: Context<Admin>) -> Result<()> {
    ctx.accounts.config.solving_public = true;

    emit!(SolvingMadePublic::new());

    Ok(())
}

pub fn change_solver_whitelist(
    ctx: Context<Admin>,
    args: ChangeSolverWhitelistArgs,
) -> Result<()> {
    let ChangeSolverWhitelistArgs { solver, can_solve } = args;

    ctx.accounts.config.set_solver(solver, can_solve)?;

    msg!("solver {} can solve: {}", solver, can_solve);
    emit!(SolverWhitelistChanged::new(solver, can_solve));

    Ok(())
}
