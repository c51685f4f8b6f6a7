use std::iter;

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::{invoke, invoke_signed};
use anchor_lang::system_program;
use anchor_spl::{token, token_2022};
use routes_std::prover::is_prover;

use crate::instructions::PortalError;
use crate::types::{Call, Calldata, CalldataWithAccounts};

/// Calls may never re-enter the portal or forge proofs through a prover.
pub fn validate_call_target(target: &Pubkey) -> Result<()> {
    require_keys_neq!(*target, crate::ID, PortalError::CallToPortal);
    require!(!is_prover(target), PortalError::CallToProver);

    Ok(())
}

/// A call ready to run: its target account and the accounts it runs with.
pub struct CallAccounts<'info> {
    pub target: AccountInfo<'info>,
    pub calldata: Calldata,
    pub accounts: Vec<AccountInfo<'info>>,
    pub value: u64,
}

impl<'info> CallAccounts<'info> {
    /// Takes the call's target and `calldata.account_count` accounts off the
    /// front of `accounts`.
    pub fn take<'c>(
        call: &Call,
        accounts: &mut impl Iterator<Item = &'c AccountInfo<'info>>,
    ) -> Result<Self>
    where
        'info: 'c,
    {
        let calldata =
            Calldata::try_from_slice(&call.data).map_err(|_| PortalError::InvalidCalldata)?;
        let target = accounts
            .next()
            .ok_or(PortalError::InvalidCallTarget)?
            .to_account_info();
        require_keys_eq!(target.key(), call.target, PortalError::InvalidCallTarget);

        let call_accounts: Vec<_> = accounts
            .take(calldata.account_count as usize)
            .map(ToAccountInfo::to_account_info)
            .collect();
        require!(
            call_accounts.len() == calldata.account_count as usize,
            PortalError::InvalidCalldata
        );

        Ok(Self {
            target,
            calldata,
            accounts: call_accounts,
            value: call.value,
        })
    }

    /// The call as the route hash commits to it.
    pub fn hashed_call(&self) -> Result<Call> {
        let calldata = CalldataWithAccounts::new(self.calldata.clone(), self.accounts.clone())?;

        Ok(Call {
            target: self.target.key(),
            data: calldata.try_to_vec()?,
            value: self.value,
        })
    }

    /// Runs the call with `caller` signing wherever it appears among the call
    /// accounts. A call without data or accounts sends `value` to the target;
    /// program calls carry no value.
    pub fn execute_signed(
        &self,
        caller: &AccountInfo<'info>,
        system_program: &Program<'info, System>,
        signer_seeds: &[&[u8]],
    ) -> Result<()> {
        validate_call_target(self.target.key)?;

        if self.calldata.data.is_empty() && self.accounts.is_empty() {
            return match self.value {
                0 => Ok(()),
                value => system_program::transfer(
                    CpiContext::new_with_signer(
                        system_program.to_account_info(),
                        system_program::Transfer {
                            from: caller.to_account_info(),
                            to: self.target.to_account_info(),
                        },
                        &[signer_seeds],
                    ),
                    value,
                ),
            };
        }
        require!(self.value == 0, PortalError::InvalidCalldata);

        let instruction = self.instruction(Some(caller.key))?;
        invoke_signed(&instruction, &self.account_infos(), &[signer_seeds]).map_err(Into::into)
    }

    /// Runs the call with no program signature attached. Token programs are
    /// off limits so that no allowance held by a portal address can be spent.
    pub fn execute_unsigned(&self) -> Result<()> {
        validate_call_target(self.target.key)?;
        require!(
            *self.target.key != token::ID && *self.target.key != token_2022::ID,
            PortalError::CallToTokenProgram
        );
        require!(self.value == 0, PortalError::InvalidCalldata);

        let instruction = self.instruction(None)?;
        invoke(&instruction, &self.account_infos()).map_err(Into::into)
    }

    fn instruction(&self, signer: Option<&Pubkey>) -> Result<Instruction> {
        require!(self.target.executable, PortalError::CallToNonProgram);

        Ok(Instruction::new_with_bytes(
            self.target.key(),
            &self.calldata.data,
            self.accounts
                .iter()
                .map(|account| AccountMeta {
                    pubkey: account.key(),
                    is_signer: account.is_signer || Some(account.key) == signer,
                    is_writable: account.is_writable,
                })
                .collect(),
        ))
    }

    fn account_infos(&self) -> Vec<AccountInfo<'info>> {
        self.accounts
            .iter()
            .cloned()
            .chain(iter::once(self.target.clone()))
            .collect()
    }
}
