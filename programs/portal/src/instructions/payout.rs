use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::invoke_signed;
use anchor_lang::solana_program::system_instruction;
use anchor_spl::associated_token::get_associated_token_address_with_program_id;
use anchor_spl::token_interface::{close_account, CloseAccount, TokenAccount};
use anchor_spl::{token, token_2022};
use itertools::Itertools;

use crate::instructions::PortalError;
use crate::types::TokenTransferAccounts;
use crate::vault::{Asset, Balances, Payout};

/// A vault token account together with the token accounts of everyone it may
/// pay. Passed as `[vault_ata, ..recipient token accounts, mint]`.
pub struct TokenPayoutAccounts<'info> {
    pub vault_ata: AccountInfo<'info>,
    pub recipients: Vec<AccountInfo<'info>>,
    pub mint: AccountInfo<'info>,
}

impl<'info> TokenPayoutAccounts<'info> {
    pub fn chunk_size(recipient_count: usize) -> usize {
        recipient_count + 2
    }

    /// Splits `accounts` into chunks of `recipient_count` recipients each and
    /// checks that every chunk starts with the vault's associated token account.
    pub fn parse(
        vault: &Pubkey,
        accounts: &[AccountInfo<'info>],
        recipient_count: usize,
    ) -> Result<Vec<Self>> {
        let chunk_size = Self::chunk_size(recipient_count);
        require!(
            accounts.len() % chunk_size == 0,
            PortalError::InvalidTokenTransferAccounts
        );

        accounts
            .chunks(chunk_size)
            .map(|chunk| {
                let (vault_ata, rest) = chunk
                    .split_first()
                    .ok_or(PortalError::InvalidTokenTransferAccounts)?;
                let (mint, recipients) = rest
                    .split_last()
                    .ok_or(PortalError::InvalidTokenTransferAccounts)?;

                require_keys_eq!(
                    vault_ata.key(),
                    get_associated_token_address_with_program_id(
                        vault,
                        mint.key,
                        mint.owner
                    ),
                    PortalError::InvalidAta
                );

                Ok(Self {
                    vault_ata: vault_ata.clone(),
                    recipients: recipients.to_vec(),
                    mint: mint.clone(),
                })
            })
            .collect()
    }

    fn recipient_account(&self, recipient: &Pubkey) -> Result<&AccountInfo<'info>> {
        self.recipients
            .iter()
            .find(|account| {
                *account.owner == *self.mint.owner
                    && TokenAccount::try_deserialize(&mut &account.data.borrow()[..])
                        .is_ok_and(|data| data.owner == *recipient && data.mint == self.mint.key())
            })
            .ok_or(PortalError::InvalidAta.into())
    }
}

/// What `vault` holds of native value and of every mint in `accounts`.
pub fn vault_balances(vault: &AccountInfo, accounts: &[TokenPayoutAccounts]) -> Result<Balances> {
    accounts
        .iter()
        .map(|accounts| {
            let amount = match accounts.vault_ata.data_is_empty() {
                true => 0,
                false => {
                    TokenAccount::try_deserialize(&mut &accounts.vault_ata.data.borrow()[..])?
                        .amount
                }
            };

            Result::Ok((accounts.mint.key(), amount))
        })
        .collect::<Result<BTreeMap<_, _>>>()
        .map(|tokens| Balances {
            native: vault.lamports(),
            tokens,
        })
}

/// Fails unless `accounts` name exactly the mints in `mints`.
pub fn require_mints<'m>(
    accounts: &[TokenPayoutAccounts],
    mints: impl IntoIterator<Item = &'m Pubkey>,
) -> Result<()> {
    let keys = accounts
        .iter()
        .map(|accounts| accounts.mint.key())
        .sorted()
        .dedup()
        .collect::<Vec<_>>();

    require!(
        keys.len() == accounts.len() && keys.iter().eq(mints.into_iter().sorted()),
        PortalError::InvalidMint
    );

    Ok(())
}

/// Fails unless every payout can be made from `accounts` to `recipients`.
pub fn require_payable(
    payouts: &[Payout],
    recipients: &[&AccountInfo],
    accounts: &[TokenPayoutAccounts],
) -> Result<()> {
    payouts.iter().try_for_each(|payout| match payout.asset {
        Asset::Native => recipients
            .iter()
            .any(|recipient| *recipient.key == payout.recipient)
            .then_some(())
            .ok_or(PortalError::InvalidClaimant.into()),
        Asset::Token(mint) => accounts
            .iter()
            .find(|accounts| *accounts.mint.key == mint)
            .ok_or(PortalError::InvalidMint)?
            .recipient_account(&payout.recipient)
            .map(|_| ()),
    })
}

/// Pays out of a vault, signing with the vault's seeds.
pub struct VaultPayer<'a, 'info> {
    pub vault: &'a AccountInfo<'info>,
    pub signer_seeds: &'a [&'a [u8]],
    pub token_program: &'a Program<'info, token::Token>,
    pub token_2022_program: &'a Program<'info, token_2022::Token2022>,
    pub system_program: &'a Program<'info, System>,
}

impl<'info> VaultPayer<'_, 'info> {
    pub fn pay(
        &self,
        payouts: &[Payout],
        recipients: &[&AccountInfo<'info>],
        accounts: &[TokenPayoutAccounts<'info>],
    ) -> Result<()> {
        payouts.iter().try_for_each(|payout| match payout.asset {
            Asset::Native => {
                let recipient = recipients
                    .iter()
                    .find(|recipient| *recipient.key == payout.recipient)
                    .ok_or(PortalError::InvalidClaimant)?;

                self.pay_native(recipient, payout.amount)
            }
            Asset::Token(mint) => {
                let accounts = accounts
                    .iter()
                    .find(|accounts| *accounts.mint.key == mint)
                    .ok_or(PortalError::InvalidMint)?;

                self.pay_token(accounts, &payout.recipient, payout.amount)
            }
        })
    }

    pub fn pay_native(&self, recipient: &AccountInfo<'info>, amount: u64) -> Result<()> {
        invoke_signed(
            &system_instruction::transfer(self.vault.key, recipient.key, amount),
            &[
                self.vault.to_account_info(),
                recipient.to_account_info(),
                self.system_program.to_account_info(),
            ],
            &[self.signer_seeds],
        )
        .map_err(Into::into)
    }

    pub fn pay_token(
        &self,
        accounts: &TokenPayoutAccounts<'info>,
        recipient: &Pubkey,
        amount: u64,
    ) -> Result<()> {
        let transfer_accounts = TokenTransferAccounts {
            from: accounts.vault_ata.clone(),
            to: accounts.recipient_account(recipient)?.clone(),
            mint: accounts.mint.clone(),
        };
        let token_program =
            transfer_accounts.token_program(self.token_program, self.token_2022_program)?;

        transfer_accounts.transfer_with_signer(
            &token_program,
            self.vault,
            &[self.signer_seeds],
            amount,
        )
    }

    /// Closes the vault's token accounts, returning their rent to `destination`.
    pub fn close(
        &self,
        accounts: &[TokenPayoutAccounts<'info>],
        destination: &AccountInfo<'info>,
    ) -> Result<()> {
        accounts
            .iter()
            .filter(|accounts| !accounts.vault_ata.data_is_empty())
            .try_for_each(|accounts| {
                let token_program = if *accounts.mint.owner == token::ID {
                    self.token_program.to_account_info()
                } else if *accounts.mint.owner == token_2022::ID {
                    self.token_2022_program.to_account_info()
                } else {
                    return Err(PortalError::InvalidTokenProgram.into());
                };

                close_account(CpiContext::new_with_signer(
                    token_program,
                    CloseAccount {
                        account: accounts.vault_ata.to_account_info(),
                        destination: destination.to_account_info(),
                        authority: self.vault.to_account_info(),
                    },
                    &[self.signer_seeds],
                ))
            })
    }
}
