use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::associated_token::{self, get_associated_token_address_with_program_id};
use anchor_spl::{token, token_2022};

use crate::instructions::{Fulfill, Fund, PortalError, Publish};
use crate::types::{TokenTransferAccounts, VecTokenTransferAccounts};

/// Moves tokens and lamports from `funder` to `fundee`, creating the fundee's
/// token accounts on the way.
pub struct FundTokenContext<'a, 'info> {
    pub payer: &'a AccountInfo<'info>,
    pub funder: AccountInfo<'info>,
    pub fundee: AccountInfo<'info>,
    pub token_program: &'a Program<'info, token::Token>,
    pub token_2022_program: &'a Program<'info, token_2022::Token2022>,
    pub associated_token_program: &'a Program<'info, associated_token::AssociatedToken>,
    pub system_program: &'a Program<'info, System>,
}

impl<'a, 'info> From<&'a Context<'_, '_, '_, 'info, Fund<'info>>> for FundTokenContext<'a, 'info> {
    fn from(ctx: &'a Context<'_, '_, '_, 'info, Fund<'info>>) -> Self {
        Self {
            payer: &ctx.accounts.payer,
            funder: ctx.accounts.funder.to_account_info(),
            fundee: ctx.accounts.vault.to_account_info(),
            token_program: &ctx.accounts.token_program,
            token_2022_program: &ctx.accounts.token_2022_program,
            associated_token_program: &ctx.accounts.associated_token_program,
            system_program: &ctx.accounts.system_program,
        }
    }
}

impl<'a, 'info> From<&'a Context<'_, '_, '_, 'info, Publish<'info>>>
    for FundTokenContext<'a, 'info>
{
    fn from(ctx: &'a Context<'_, '_, '_, 'info, Publish<'info>>) -> Self {
        Self {
            payer: &ctx.accounts.payer,
            funder: ctx.accounts.payer.to_account_info(),
            fundee: ctx.accounts.vault.to_account_info(),
            token_program: &ctx.accounts.token_program,
            token_2022_program: &ctx.accounts.token_2022_program,
            associated_token_program: &ctx.accounts.associated_token_program,
            system_program: &ctx.accounts.system_program,
        }
    }
}

impl<'a, 'info> From<&'a Fulfill<'info>> for FundTokenContext<'a, 'info> {
    fn from(accounts: &'a Fulfill<'info>) -> Self {
        Self {
            payer: &accounts.payer,
            funder: accounts.solver.to_account_info(),
            fundee: accounts.executor.to_account_info(),
            token_program: &accounts.token_program,
            token_2022_program: &accounts.token_2022_program,
            associated_token_program: &accounts.associated_token_program,
            system_program: &accounts.system_program,
        }
    }
}

impl<'info> FundTokenContext<'_, 'info> {
    /// Tops every fundee token account up to its amount in `token_amounts`
    /// with whatever the funder holds. Returns the amount moved per mint.
    pub fn fund_tokens(
        &self,
        accounts: &VecTokenTransferAccounts<'info>,
        token_amounts: &BTreeMap<Pubkey, u64>,
    ) -> Result<BTreeMap<Pubkey, u64>> {
        accounts
            .iter()
            .map(|accounts| {
                let token_amount = token_amounts
                    .get(accounts.mint.key)
                    .ok_or(PortalError::InvalidMint)?;
                let deficit = token_amount.saturating_sub(accounts.to_amount()?);
                let amount = deficit.min(accounts.from_amount()?);

                self.transfer_token(accounts, amount, &[])?;

                Ok((accounts.mint.key(), amount))
            })
            .collect()
    }

    /// Moves exactly `token_amounts` to the fundee; fails when the funder holds
    /// less.
    pub fn transfer_tokens(
        &self,
        accounts: &VecTokenTransferAccounts<'info>,
        token_amounts: &BTreeMap<Pubkey, u64>,
    ) -> Result<()> {
        accounts.require_mints(token_amounts)?;

        accounts.iter().try_for_each(|accounts| {
            let amount = token_amounts
                .get(accounts.mint.key)
                .ok_or(PortalError::InvalidMint)?;

            self.transfer_token(accounts, *amount, &[])
        })
    }

    /// Transfers `amount` of one mint, signing for the funder with
    /// `signer_seeds` when the funder is a program address.
    pub fn transfer_token(
        &self,
        accounts: &TokenTransferAccounts<'info>,
        amount: u64,
        signer_seeds: &[&[&[u8]]],
    ) -> Result<()> {
        let token_program = self.ensure_fundee_ata(accounts)?;

        accounts.transfer_with_signer(&token_program, &self.funder, signer_seeds, amount)
    }

    /// Checks that `accounts.to` is the fundee's associated token account and
    /// creates it when missing. Returns the mint's token program.
    pub fn ensure_fundee_ata(
        &self,
        accounts: &TokenTransferAccounts<'info>,
    ) -> Result<AccountInfo<'info>> {
        let token_program = accounts.token_program(self.token_program, self.token_2022_program)?;
        self.ensure_fundee_ata_initialized(
            &accounts.mint,
            &accounts.to,
            &token_program,
            accounts.token_program_id(),
        )?;

        Ok(token_program)
    }

    pub fn transfer_native(&self, amount: u64) -> Result<()> {
        match amount {
            0 => Ok(()),
            amount => system_program::transfer(
                CpiContext::new(
                    self.system_program.to_account_info(),
                    system_program::Transfer {
                        from: self.funder.to_account_info(),
                        to: self.fundee.to_account_info(),
                    },
                ),
                amount,
            ),
        }
    }

    fn ensure_fundee_ata_initialized(
        &self,
        mint: &AccountInfo<'info>,
        to: &AccountInfo<'info>,
        token_program: &AccountInfo<'info>,
        program_id: &Pubkey,
    ) -> Result<()> {
        let fundee_ata =
            get_associated_token_address_with_program_id(self.fundee.key, mint.key, program_id);
        require_keys_eq!(fundee_ata, *to.key, PortalError::InvalidAta);

        if to.data_is_empty() {
            associated_token::create(CpiContext::new(
                self.associated_token_program.to_account_info(),
                associated_token::Create {
                    payer: self.payer.to_account_info(),
                    associated_token: to.to_account_info(),
                    authority: self.fundee.to_account_info(),
                    mint: mint.to_account_info(),
                    system_program: self.system_program.to_account_info(),
                    token_program: token_program.to_account_info(),
                },
            ))?;
        }

        Ok(())
    }
}
