use anchor_lang::prelude::*;
use derive_new::new;

use crate::types::Reward;
use crate::vault::{Asset, Balances};

/// Transfers needed to bring a vault up to its reward.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FundingPlan {
    /// Refund-token balance held by the funding address, swept to the creator
    /// before anything else moves.
    pub sweep: Option<(Pubkey, u64)>,
    pub transfers: Vec<(Asset, u64)>,
    pub complete: bool,
}

/// One funding round for a vault. Each asset moves `min(deficit, available)`,
/// where `available` is whatever the funding source can give: its balance for
/// direct funding, its allowance for delegated funding.
#[derive(Debug, new)]
pub struct Funder<'a> {
    reward: &'a Reward,
    vault: Balances,
    available: Balances,
    refund_token: Option<(Pubkey, u64)>,
}

impl Funder<'_> {
    pub fn plan(&self) -> Result<FundingPlan> {
        let required = self
            .reward
            .token_amounts()?
            .into_iter()
            .map(|(mint, amount)| (Asset::Token(mint), amount))
            .chain([(Asset::Native, self.reward.native_amount)]);

        let (transfers, complete) = required.fold(
            (Vec::new(), true),
            |(mut transfers, complete), (asset, required)| {
                let deficit = required.saturating_sub(self.balance(&self.vault, &asset));
                let amount = deficit.min(self.balance(&self.available, &asset));

                if amount > 0 {
                    transfers.push((asset, amount));
                }

                (transfers, complete && amount == deficit)
            },
        );

        Ok(FundingPlan {
            sweep: self.refund_token.filter(|(_, balance)| *balance > 0),
            transfers,
            complete,
        })
    }

    fn balance(&self, balances: &Balances, asset: &Asset) -> u64 {
        match asset {
            Asset::Native => balances.native,
            Asset::Token(mint) => balances.token(mint),
        }
    }
}
