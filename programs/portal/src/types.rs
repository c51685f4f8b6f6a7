use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token};
use anchor_spl::token_2022::{self, Token2022};
use anchor_spl::token_interface::{transfer_checked, Mint, TokenAccount, TransferChecked};
use itertools::Itertools;
use routes_std::{keccak, Bytes32, SerializableAccountMeta};

use crate::instructions::PortalError;

pub const VEC_TOKEN_TRANSFER_ACCOUNTS_CHUNK_SIZE: usize = 3;

/// Intent hash binding a route to its reward: `keccak(route_hash || reward_hash)`.
pub fn intent_hash(route_hash: &Bytes32, reward_hash: &Bytes32) -> Bytes32 {
    keccak([route_hash.as_slice(), reward_hash.as_slice()])
}

pub struct VecTokenTransferAccounts<'info>(Vec<TokenTransferAccounts<'info>>);

impl<'info> TryFrom<&[AccountInfo<'info>]> for VecTokenTransferAccounts<'info> {
    type Error = anchor_lang::error::Error;

    fn try_from(accounts: &[AccountInfo<'info>]) -> Result<Self> {
        require!(
            accounts.len() % VEC_TOKEN_TRANSFER_ACCOUNTS_CHUNK_SIZE == 0,
            PortalError::InvalidTokenTransferAccounts
        );

        accounts
            .iter()
            .chunks(VEC_TOKEN_TRANSFER_ACCOUNTS_CHUNK_SIZE)
            .into_iter()
            .map(|chunk| chunk.collect::<Vec<_>>().try_into())
            .collect::<Result<Vec<TokenTransferAccounts>>>()
            .map(Self)
    }
}

impl<'info> From<Vec<TokenTransferAccounts<'info>>> for VecTokenTransferAccounts<'info> {
    fn from(accounts: Vec<TokenTransferAccounts<'info>>) -> Self {
        Self(accounts)
    }
}

impl<'info> VecTokenTransferAccounts<'info> {
    pub fn into_inner(self) -> Vec<TokenTransferAccounts<'info>> {
        self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TokenTransferAccounts<'info>> {
        self.0.iter()
    }

    pub fn get(&self, mint: &Pubkey) -> Result<&TokenTransferAccounts<'info>> {
        self.0
            .iter()
            .find(|accounts| accounts.mint.key == mint)
            .ok_or(PortalError::InvalidMint.into())
    }

    /// Fails unless the chunks name every mint in `token_amounts` exactly once.
    pub fn require_mints(&self, token_amounts: &BTreeMap<Pubkey, u64>) -> Result<()> {
        let mints = self
            .0
            .iter()
            .map(|accounts| accounts.mint.key())
            .sorted()
            .dedup()
            .collect::<Vec<_>>();

        require!(
            mints.len() == self.0.len() && mints.iter().eq(token_amounts.keys()),
            PortalError::InvalidMint
        );

        Ok(())
    }
}

pub struct TokenTransferAccounts<'info> {
    pub from: AccountInfo<'info>,
    pub to: AccountInfo<'info>,
    pub mint: AccountInfo<'info>,
}

impl<'info> TryFrom<Vec<&AccountInfo<'info>>> for TokenTransferAccounts<'info> {
    type Error = anchor_lang::error::Error;

    fn try_from(accounts: Vec<&AccountInfo<'info>>) -> Result<Self> {
        match accounts.as_slice() {
            [from, to, mint] => {
                let token_program = mint.owner;
                require!(
                    from.data_is_empty() || token_program == from.owner,
                    PortalError::InvalidTokenTransferAccounts
                );
                require!(
                    to.data_is_empty() || token_program == to.owner,
                    PortalError::InvalidTokenTransferAccounts
                );

                Ok(Self {
                    from: from.to_account_info(),
                    to: to.to_account_info(),
                    mint: mint.to_account_info(),
                })
            }
            _ => Err(PortalError::InvalidTokenTransferAccounts.into()),
        }
    }
}

impl<'info> TokenTransferAccounts<'info> {
    pub fn transfer(
        &self,
        token_program: &AccountInfo<'info>,
        authority: &AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        self.transfer_with_signer(token_program, authority, &[], amount)
    }

    pub fn transfer_with_signer(
        &self,
        token_program: &AccountInfo<'info>,
        authority: &AccountInfo<'info>,
        signer_seeds: &[&[&[u8]]],
        amount: u64,
    ) -> Result<()> {
        match amount {
            0 => Ok(()),
            amount => transfer_checked(
                CpiContext::new_with_signer(
                    token_program.to_account_info(),
                    TransferChecked {
                        from: self.from.to_account_info(),
                        to: self.to.to_account_info(),
                        mint: self.mint.to_account_info(),
                        authority: authority.to_account_info(),
                    },
                    signer_seeds,
                ),
                amount,
                self.mint_data()?.decimals,
            ),
        }
    }

    pub fn token_program(
        &self,
        token_program: &Program<'info, Token>,
        token_2022_program: &Program<'info, Token2022>,
    ) -> Result<AccountInfo<'info>> {
        let token_program_id = self.token_program_id();

        if *token_program_id == token::ID {
            Ok(token_program.to_account_info())
        } else if *token_program_id == token_2022::ID {
            Ok(token_2022_program.to_account_info())
        } else {
            Err(PortalError::InvalidTokenProgram.into())
        }
    }

    pub fn token_program_id(&self) -> &Pubkey {
        self.mint.owner
    }

    pub fn mint_data(&self) -> Result<Mint> {
        Mint::try_deserialize(&mut &self.mint.try_borrow_data()?[..])
    }

    pub fn from_data(&self) -> Result<TokenAccount> {
        TokenAccount::try_deserialize(&mut &self.from.try_borrow_data()?[..])
    }

    pub fn to_data(&self) -> Result<TokenAccount> {
        TokenAccount::try_deserialize(&mut &self.to.try_borrow_data()?[..])
    }

    /// Balance of `from`, zero while the account does not exist.
    pub fn from_amount(&self) -> Result<u64> {
        token_amount(&self.from)
    }

    /// Balance of `to`, zero while the account does not exist.
    pub fn to_amount(&self) -> Result<u64> {
        token_amount(&self.to)
    }
}

fn token_amount(account: &AccountInfo) -> Result<u64> {
    if account.data_is_empty() {
        return Ok(0);
    }

    TokenAccount::try_deserialize(&mut &account.try_borrow_data()?[..]).map(|data| data.amount)
}

/// Call data as submitted to `fulfill`. The call's accounts travel in the
/// transaction; only their count is part of the instruction.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Calldata {
    pub data: Vec<u8>,
    pub account_count: u8,
}

/// Call data as committed to by the route hash: the instruction data together
/// with every account the call is executed with.
#[derive(AnchorSerialize, AnchorDeserialize, Debug, PartialEq, Eq)]
pub struct CalldataWithAccounts {
    pub calldata: Calldata,
    pub accounts: Vec<SerializableAccountMeta>,
}

impl CalldataWithAccounts {
    pub fn new<T>(calldata: Calldata, accounts: Vec<T>) -> Result<Self>
    where
        T: Into<SerializableAccountMeta>,
    {
        require!(
            accounts.len() == calldata.account_count as usize,
            PortalError::InvalidCalldata,
        );

        Ok(Self {
            calldata,
            accounts: accounts.into_iter().map(Into::into).collect(),
        })
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Intent {
    pub route: Route,
    pub reward: Reward,
}

impl Intent {
    /// Returns `(intent_hash, route_hash, reward_hash)`.
    pub fn hash(&self) -> (Bytes32, Bytes32, Bytes32) {
        let route_hash = self.route.hash();
        let reward_hash = self.reward.hash();

        (
            intent_hash(&route_hash, &reward_hash),
            route_hash,
            reward_hash,
        )
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub salt: Bytes32,
    pub source: u64,
    pub destination: u64,
    pub portal: Pubkey,
    pub tokens: Vec<TokenAmount>,
    pub calls: Vec<Call>,
}

impl Route {
    pub fn hash(&self) -> Bytes32 {
        let encoded = self.try_to_vec().expect("Failed to serialize Route");

        keccak([encoded.as_slice()])
    }

    pub fn token_amounts(&self) -> Result<BTreeMap<Pubkey, u64>> {
        token_amounts(&self.tokens)
    }

    /// Total native value the route's calls forward.
    pub fn native_amount(&self) -> Result<u64> {
        self.calls.iter().try_fold(0u64, |total, call| {
            total
                .checked_add(call.value)
                .ok_or(PortalError::TokenAmountOverflow.into())
        })
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Reward {
    pub creator: Pubkey,
    pub prover: Pubkey,
    pub deadline: i64,
    pub native_amount: u64,
    pub tokens: Vec<TokenAmount>,
}

impl Reward {
    pub fn hash(&self) -> Bytes32 {
        let encoded = self.try_to_vec().expect("Failed to serialize Reward");

        keccak([encoded.as_slice()])
    }

    pub fn token_amounts(&self) -> Result<BTreeMap<Pubkey, u64>> {
        token_amounts(&self.tokens)
    }

    pub fn is_expired(&self, unix_timestamp: i64) -> bool {
        unix_timestamp >= self.deadline
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAmount {
    pub token: Pubkey,
    pub amount: u64,
}

/// One route call. On this chain `data` is a borsh [`Calldata`] when the call
/// is submitted and a borsh [`CalldataWithAccounts`] when the route is hashed.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub target: Pubkey,
    pub data: Vec<u8>,
    pub value: u64,
}

fn token_amounts(tokens: &[TokenAmount]) -> Result<BTreeMap<Pubkey, u64>> {
    tokens
        .iter()
        .try_fold(BTreeMap::new(), |mut token_amounts, token| {
            let amount: &mut u64 = token_amounts.entry(token.token).or_default();
            *amount = amount
                .checked_add(token.amount)
                .ok_or(PortalError::TokenAmountOverflow)?;

            Result::Ok(token_amounts)
        })
}
