//! Call target for tests.

use anchor_lang::prelude::*;
use anchor_spl::token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked};

declare_id!("5s2o8jgv2qpCwYvmM3oU4H2hEZyjPeC7QKhrQ4ZBxQE5");

#[event]
#[derive(Debug, PartialEq, Eq)]
pub struct LamportsObserved {
    pub account: Pubkey,
    pub lamports: u64,
}

#[program]
pub mod mock_target {
    use super::*;

    /// Reports the balance `account` holds while the call runs.
    pub fn observe_lamports(ctx: Context<ObserveLamports>) -> Result<()> {
        emit!(LamportsObserved {
            account: ctx.accounts.account.key(),
            lamports: ctx.accounts.account.lamports(),
        });

        Ok(())
    }

    /// Moves `amount` with whatever signature `authority` carries.
    pub fn pull(ctx: Context<Pull>, amount: u64) -> Result<()> {
        msg!("pulling {} from {}", amount, ctx.accounts.from.key());

        transfer_checked(
            CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.from.to_account_info(),
                    mint: ctx.accounts.mint.to_account_info(),
                    to: ctx.accounts.to.to_account_info(),
                    authority: ctx.accounts.authority.to_account_info(),
                },
            ),
            amount,
            ctx.accounts.mint.decimals,
        )
    }
}

#[derive(Accounts)]
pub struct ObserveLamports<'info> {
    /// CHECK: only read
    pub account: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct Pull<'info> {
    #[account(mut)]
    pub from: InterfaceAccount<'info, TokenAccount>,
    #[account(mut)]
    pub to: InterfaceAccount<'info, TokenAccount>,
    pub mint: InterfaceAccount<'info, Mint>,
    /// CHECK: the token program checks the signature
    pub authority: UncheckedAccount<'info>,
    pub token_program: Interface<'info, TokenInterface>,
}
