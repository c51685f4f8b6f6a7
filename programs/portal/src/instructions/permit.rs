use std::iter;

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::{get_return_data, invoke_signed};
use routes_std::Bytes32;

use crate::instructions::call::validate_call_target;
use crate::instructions::PortalError;
use crate::types::TokenTransferAccounts;

pub const PERMIT_SPENDER_SEED: &[u8] = b"permit_spender";
pub const ALLOWANCE_DISCRIMINATOR: [u8; 8] = [136, 247, 23, 176, 23, 17, 76, 7];
pub const TRANSFER_FROM_DISCRIMINATOR: [u8; 8] = [230, 255, 130, 7, 220, 247, 122, 0];
/// Helper specific accounts following each `[from, to, mint]` chunk.
pub const PERMIT_ACCOUNTS_LEN: usize = 2;

/// Spender the portal presents to `helper` for one intent. It is scoped to the
/// helper so that a signature handed to one helper is worthless at another.
pub fn permit_spender_pda(
    route_hash: &Bytes32,
    reward_hash: &Bytes32,
    helper: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            PERMIT_SPENDER_SEED,
            route_hash.as_ref(),
            reward_hash.as_ref(),
            helper.as_ref(),
        ],
        &crate::ID,
    )
}

/// Permit helper program spending allowances its users granted to a spender.
///
/// `allowance` is invoked with `[spender, from, mint, ..helper accounts]` and
/// returns the spendable amount as a borsh `u64`; `transfer_from(amount)` with
/// `[spender, from, to, mint, token_program, ..helper accounts]`.
pub struct PermitHelper<'a, 'info> {
    pub program: &'a AccountInfo<'info>,
    pub spender: &'a AccountInfo<'info>,
    pub signer_seeds: &'a [&'a [u8]],
}

impl<'info> PermitHelper<'_, 'info> {
    pub fn validate(&self) -> Result<()> {
        validate_call_target(self.program.key)?;
        require!(self.program.executable, PortalError::CallToNonProgram);

        Ok(())
    }

    pub fn allowance(
        &self,
        accounts: &TokenTransferAccounts<'info>,
        helper_accounts: &[AccountInfo<'info>],
    ) -> Result<u64> {
        self.invoke(
            ALLOWANCE_DISCRIMINATOR.to_vec(),
            [accounts.from.clone(), accounts.mint.clone()],
            helper_accounts,
        )?;

        match get_return_data() {
            Some((program_id, data)) if program_id == self.program.key() => {
                u64::try_from_slice(&data).map_err(|_| PortalError::InvalidPermitResponse.into())
            }
            _ => Err(PortalError::InvalidPermitResponse.into()),
        }
    }

    pub fn transfer_from(
        &self,
        accounts: &TokenTransferAccounts<'info>,
        token_program: &AccountInfo<'info>,
        helper_accounts: &[AccountInfo<'info>],
        amount: u64,
    ) -> Result<()> {
        match amount {
            0 => Ok(()),
            amount => self.invoke(
                TRANSFER_FROM_DISCRIMINATOR
                    .into_iter()
                    .chain(amount.to_le_bytes())
                    .collect(),
                [
                    accounts.from.clone(),
                    accounts.to.clone(),
                    accounts.mint.clone(),
                    token_program.clone(),
                ],
                helper_accounts,
            ),
        }
    }

    fn invoke(
        &self,
        data: Vec<u8>,
        accounts: impl IntoIterator<Item = AccountInfo<'info>>,
        helper_accounts: &[AccountInfo<'info>],
    ) -> Result<()> {
        let account_infos: Vec<_> = iter::once(self.spender.clone())
            .chain(accounts)
            .chain(helper_accounts.iter().cloned())
            .collect();
        let instruction = Instruction::new_with_bytes(
            self.program.key(),
            &data,
            account_infos
                .iter()
                .map(|account| AccountMeta {
                    pubkey: account.key(),
                    is_signer: account.is_signer || account.key == self.spender.key,
                    is_writable: account.is_writable,
                })
                .collect(),
        );

        invoke_signed(
            &instruction,
            &account_infos
                .into_iter()
                .chain(iter::once(self.program.clone()))
                .collect::<Vec<_>>(),
            &[self.signer_seeds],
        )
        .map_err(Into::into)
    }
}
