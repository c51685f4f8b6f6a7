//! Permit helper for tests.
//!
//! Owners approve the helper's authority on their token account once and then
//! grant per-spender allowances. The portal reads an allowance with
//! `allowance` and spends it with `transfer_from`, signing as the spender.

use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    approve, transfer_checked, Approve, Mint, TokenAccount, TokenInterface, TransferChecked,
};

declare_id!("6s2yDy2BF9bSb7WDzvkeHxsN93wTWynEnDe8m7NjGN16");

pub const ALLOWANCE_SEED: &[u8] = b"allowance";
pub const AUTHORITY_SEED: &[u8] = b"authority";

#[error_code]
pub enum PermitError {
    InsufficientAllowance,
}

#[account]
#[derive(InitSpace, Debug)]
pub struct Allowance {
    pub amount: u64,
}

impl Allowance {
    pub fn pda(token_account: &Pubkey, spender: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[ALLOWANCE_SEED, token_account.as_ref(), spender.as_ref()],
            &crate::ID,
        )
    }
}

pub fn authority_pda() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[AUTHORITY_SEED], &crate::ID)
}

#[program]
pub mod mock_permit {
    use super::*;

    /// Lets `spender` move up to `amount` out of `owner_token`.
    pub fn permit(ctx: Context<Permit>, amount: u64) -> Result<()> {
        ctx.accounts.allowance.amount = amount;

        approve(
            CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                Approve {
                    to: ctx.accounts.owner_token.to_account_info(),
                    delegate: ctx.accounts.authority.to_account_info(),
                    authority: ctx.accounts.owner.to_account_info(),
                },
            ),
            u64::MAX,
        )
    }

    pub fn allowance(ctx: Context<AllowanceOf>) -> Result<u64> {
        Ok(ctx.accounts.allowance.amount)
    }

    pub fn transfer_from(ctx: Context<TransferFrom>, amount: u64) -> Result<()> {
        let allowance = &mut ctx.accounts.allowance;
        allowance.amount = allowance
            .amount
            .checked_sub(amount)
            .ok_or(PermitError::InsufficientAllowance)?;

        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.from.to_account_info(),
                    mint: ctx.accounts.mint.to_account_info(),
                    to: ctx.accounts.to.to_account_info(),
                    authority: ctx.accounts.authority.to_account_info(),
                },
                &[&[AUTHORITY_SEED, &[ctx.bumps.authority]]],
            ),
            amount,
            ctx.accounts.mint.decimals,
        )
    }
}

#[derive(Accounts)]
pub struct Permit<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,
    #[account(mut, token::authority = owner)]
    pub owner_token: InterfaceAccount<'info, TokenAccount>,
    /// CHECK: any address may be granted an allowance
    pub spender: UncheckedAccount<'info>,
    #[account(
        init,
        payer = owner,
        space = 8 + Allowance::INIT_SPACE,
        seeds = [ALLOWANCE_SEED, owner_token.key().as_ref(), spender.key().as_ref()],
        bump,
    )]
    pub allowance: Account<'info, Allowance>,
    /// CHECK: address is validated
    #[account(seeds = [AUTHORITY_SEED], bump)]
    pub authority: UncheckedAccount<'info>,
    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct AllowanceOf<'info> {
    pub spender: Signer<'info>,
    pub from: InterfaceAccount<'info, TokenAccount>,
    pub mint: InterfaceAccount<'info, Mint>,
    #[account(seeds = [ALLOWANCE_SEED, from.key().as_ref(), spender.key().as_ref()], bump)]
    pub allowance: Account<'info, Allowance>,
    /// CHECK: address is validated
    #[account(seeds = [AUTHORITY_SEED], bump)]
    pub authority: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct TransferFrom<'info> {
    pub spender: Signer<'info>,
    #[account(mut, token::mint = mint)]
    pub from: InterfaceAccount<'info, TokenAccount>,
    #[account(mut, token::mint = mint)]
    pub to: InterfaceAccount<'info, TokenAccount>,
    pub mint: InterfaceAccount<'info, Mint>,
    pub token_program: Interface<'info, TokenInterface>,
    #[account(mut, seeds = [ALLOWANCE_SEED, from.key().as_ref(), spender.key().as_ref()], bump)]
    pub allowance: Account<'info, Allowance>,
    /// CHECK: address is validated
    #[account(seeds = [AUTHORITY_SEED], bump)]
    pub authority: UncheckedAccount<'info>,
}
