use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use derive_new::new;

use crate::instructions::PortalError;
use crate::types::{Reward, TokenTransferAccounts};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Asset {
    Native,
    Token(Pubkey),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Balances {
    pub native: u64,
    pub tokens: BTreeMap<Pubkey, u64>,
}

impl Balances {
    /// Balances of an address holding `native` lamports, read from its token
    /// accounts on the `from` side of `accounts`.
    pub fn from_sources<'a, 'info: 'a>(
        native: u64,
        accounts: impl IntoIterator<Item = &'a TokenTransferAccounts<'info>>,
    ) -> Result<Self> {
        accounts
            .into_iter()
            .map(|accounts| Ok((accounts.mint.key(), accounts.from_amount()?)))
            .collect::<Result<_>>()
            .map(|tokens| Self { native, tokens })
    }

    /// Same as [`Balances::from_sources`] for the `to` side.
    pub fn from_destinations<'a, 'info: 'a>(
        native: u64,
        accounts: impl IntoIterator<Item = &'a TokenTransferAccounts<'info>>,
    ) -> Result<Self> {
        accounts
            .into_iter()
            .map(|accounts| Ok((accounts.mint.key(), accounts.to_amount()?)))
            .collect::<Result<_>>()
            .map(|tokens| Self { native, tokens })
    }

    pub fn token(&self, mint: &Pubkey) -> u64 {
        self.tokens.get(mint).copied().unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VaultMode {
    Claim(Pubkey),
    Refund,
    RecoverToken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct Payout {
    pub asset: Asset,
    pub recipient: Pubkey,
    pub amount: u64,
}

/// Per-intent escrow holding the reward. The vault is only ever an address
/// derived from the intent hash; this type captures its balances at one point
/// in time and decides where they go.
#[derive(Debug, new)]
pub struct Vault<'a> {
    reward: &'a Reward,
    balances: Balances,
    refund_token: Option<Pubkey>,
}

impl<'a> Vault<'a> {
    pub fn settle(&self, mode: VaultMode) -> Result<Vec<Payout>> {
        let reward_token_amounts = self.reward.token_amounts()?;

        if let Some(refund_token) = self.refund_token {
            require!(
                refund_token != Pubkey::default()
                    && !reward_token_amounts.contains_key(&refund_token),
                PortalError::InvalidRefundToken
            );
        }

        let mut payouts = match mode {
            VaultMode::Claim(claimant) => reward_token_amounts.iter().try_fold(
                self.split(Asset::Native, self.reward.native_amount, claimant)?,
                |mut payouts, (mint, amount)| {
                    payouts.extend(self.split(Asset::Token(*mint), *amount, claimant)?);

                    Result::Ok(payouts)
                },
            )?,
            VaultMode::Refund => reward_token_amounts
                .keys()
                .map(|mint| Asset::Token(*mint))
                .chain([Asset::Native])
                .map(|asset| Payout::new(asset, self.reward.creator, self.balance(&asset)))
                .collect(),
            VaultMode::RecoverToken => Vec::new(),
        };

        payouts.extend(self.refund_token.map(|mint| {
            Payout::new(
                Asset::Token(mint),
                self.reward.creator,
                self.balances.token(&mint),
            )
        }));
        payouts.retain(|payout| payout.amount > 0);

        Ok(payouts)
    }

    fn balance(&self, asset: &Asset) -> u64 {
        match asset {
            Asset::Native => self.balances.native,
            Asset::Token(mint) => self.balances.token(mint),
        }
    }

    /// Owed amount to the claimant, any surplus back to the creator.
    fn split(&self, asset: Asset, owed: u64, claimant: Pubkey) -> Result<Vec<Payout>> {
        let surplus = self
            .balance(&asset)
            .checked_sub(owed)
            .ok_or(PortalError::InsufficientVaultBalance)?;

        Ok(vec![
            Payout::new(asset, claimant, owed),
            Payout::new(asset, self.reward.creator, surplus),
        ])
    }
}
