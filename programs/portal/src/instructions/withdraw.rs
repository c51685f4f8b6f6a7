use std::slice;

use anchor_lang::prelude::*;
use anchor_spl::{token, token_2022};
use routes_std::account::AccountExt;
use routes_std::prover::Proof;
use routes_std::Bytes32;

use crate::events::{IntentRefunded, IntentWithdrawalFailed, IntentWithdrawn};
use crate::instructions::payout::{
    require_mints, require_payable, vault_balances, TokenPayoutAccounts, VaultPayer,
};
use crate::instructions::PortalError;
use crate::state::{vault_pda, ClaimState, RewardStatus, CLAIM_STATE_SEED, VAULT_SEED};
use crate::types::{self, Reward};
use crate::vault::{Payout, Vault, VaultMode};

/// Token accounts following each vault token account: the claimant's and the
/// creator's.
const WITHDRAW_RECIPIENT_COUNT: usize = 2;
/// Per batch element: claimant, creator, vault, proof and claim state, then
/// the element's token chunks.
const BATCH_WITHDRAW_ACCOUNTS_LEN: usize = 5;

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct WithdrawArgs {
    /// Chain the route was fulfilled on. The proof must have been recorded
    /// for it.
    pub destination: u64,
    pub route_hash: Bytes32,
    pub reward: Reward,
}

#[derive(Accounts)]
#[instruction(args: WithdrawArgs)]
pub struct Withdraw<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    /// CHECK: validated against the proof
    #[account(mut)]
    pub claimant: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(mut, address = args.reward.creator @ PortalError::InvalidCreator)]
    pub creator: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(
        mut,
        address = vault_pda(&types::intent_hash(&args.route_hash, &args.reward.hash())).0 @ PortalError::InvalidVault,
    )]
    pub vault: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(
        address = Proof::pda(&types::intent_hash(&args.route_hash, &args.reward.hash()), &args.reward.prover).0 @ PortalError::InvalidProof,
    )]
    pub proof: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(
        mut,
        address = ClaimState::pda(&types::intent_hash(&args.route_hash, &args.reward.hash())).0 @ PortalError::InvalidClaimState,
    )]
    pub claim_state: UncheckedAccount<'info>,
    pub token_program: Program<'info, token::Token>,
    pub token_2022_program: Program<'info, token_2022::Token2022>,
    pub system_program: Program<'info, System>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct BatchWithdrawArgs {
    pub destinations: Vec<u64>,
    pub route_hashes: Vec<Bytes32>,
    pub rewards: Vec<Reward>,
}

/// Remaining accounts, per element: `[claimant, creator, vault, proof,
/// claim_state]` followed by `[vault_ata, claimant_ata, creator_ata, mint]`
/// for every reward token of the element.
#[derive(Accounts)]
pub struct BatchWithdraw<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    pub token_program: Program<'info, token::Token>,
    pub token_2022_program: Program<'info, token_2022::Token2022>,
    pub system_program: Program<'info, System>,
}

/// Accounts one withdrawal settles between.
struct WithdrawalAccounts<'a, 'info> {
    claimant: &'a AccountInfo<'info>,
    creator: &'a AccountInfo<'info>,
    vault: &'a AccountInfo<'info>,
    proof: &'a AccountInfo<'info>,
    claim_state: &'a AccountInfo<'info>,
}

/// Withdrawal that passed every check and only has to be paid out.
struct Withdrawal<'a, 'info> {
    accounts: WithdrawalAccounts<'a, 'info>,
    intent_hash: Bytes32,
    mode: VaultMode,
    payouts: Vec<Payout>,
    token_accounts: Vec<TokenPayoutAccounts<'info>>,
}

/// Shared programs every withdrawal pays through.
struct WithdrawalPrograms<'a, 'info> {
    payer: &'a AccountInfo<'info>,
    token_program: &'a Program<'info, token::Token>,
    token_2022_program: &'a Program<'info, token_2022::Token2022>,
    system_program: &'a Program<'info, System>,
}

pub fn withdraw_intent<'info>(
    ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
    args: WithdrawArgs,
) -> Result<()> {
    let WithdrawArgs {
        destination,
        route_hash,
        reward,
    } = args;
    let accounts = WithdrawalAccounts {
        claimant: &ctx.accounts.claimant,
        creator: &ctx.accounts.creator,
        vault: &ctx.accounts.vault,
        proof: &ctx.accounts.proof,
        claim_state: &ctx.accounts.claim_state,
    };
    let programs = WithdrawalPrograms {
        payer: &ctx.accounts.payer,
        token_program: &ctx.accounts.token_program,
        token_2022_program: &ctx.accounts.token_2022_program,
        system_program: &ctx.accounts.system_program,
    };

    plan_withdrawal(
        accounts,
        destination,
        &route_hash,
        &reward,
        ctx.remaining_accounts,
        Clock::get()?.unix_timestamp,
    )?
    .execute(&programs)
}

/// Withdraws every element it can and reports the rest. A failing element
/// emits `IntentWithdrawalFailed` and leaves its vault untouched.
pub fn batch_withdraw_intents<'info>(
    ctx: Context<'_, '_, '_, 'info, BatchWithdraw<'info>>,
    args: BatchWithdrawArgs,
) -> Result<Vec<bool>> {
    let BatchWithdrawArgs {
        destinations,
        route_hashes,
        rewards,
    } = args;
    require!(
        destinations.len() == route_hashes.len() && route_hashes.len() == rewards.len(),
        PortalError::ArrayLengthMismatch
    );

    let programs = WithdrawalPrograms {
        payer: &ctx.accounts.payer,
        token_program: &ctx.accounts.token_program,
        token_2022_program: &ctx.accounts.token_2022_program,
        system_program: &ctx.accounts.system_program,
    };
    let now = Clock::get()?.unix_timestamp;
    let mut remaining_accounts = ctx.remaining_accounts;

    destinations
        .into_iter()
        .zip(route_hashes)
        .zip(rewards)
        .map(|((destination, route_hash), reward)| {
            let element_len = BATCH_WITHDRAW_ACCOUNTS_LEN
                + reward.token_amounts()?.len()
                    * TokenPayoutAccounts::chunk_size(WITHDRAW_RECIPIENT_COUNT);
            require!(
                element_len <= remaining_accounts.len(),
                PortalError::InvalidTokenTransferAccounts
            );
            let (element_accounts, rest) = remaining_accounts.split_at(element_len);
            remaining_accounts = rest;

            let (accounts, token_accounts) = element_accounts.split_at(BATCH_WITHDRAW_ACCOUNTS_LEN);
            let intent_hash = types::intent_hash(&route_hash, &reward.hash());
            let withdrawal = batch_element_accounts(accounts, &intent_hash, &reward).and_then(
                |accounts| {
                    plan_withdrawal(
                        accounts,
                        destination,
                        &route_hash,
                        &reward,
                        token_accounts,
                        now,
                    )
                },
            );

            match withdrawal {
                Ok(withdrawal) => withdrawal.execute(&programs).map(|_| true),
                Err(error) => {
                    msg!("Withdrawal of intent {} failed: {}", intent_hash, error);
                    emit!(IntentWithdrawalFailed::new(intent_hash));

                    Ok(false)
                }
            }
        })
        .collect()
}

fn batch_element_accounts<'a, 'info>(
    accounts: &'a [AccountInfo<'info>],
    intent_hash: &Bytes32,
    reward: &Reward,
) -> Result<WithdrawalAccounts<'a, 'info>> {
    let [claimant, creator, vault, proof, claim_state] = accounts else {
        return Err(PortalError::InvalidTokenTransferAccounts.into());
    };

    require_keys_eq!(creator.key(), reward.creator, PortalError::InvalidCreator);
    require_keys_eq!(vault.key(), vault_pda(intent_hash).0, PortalError::InvalidVault);
    require_keys_eq!(
        proof.key(),
        Proof::pda(intent_hash, &reward.prover).0,
        PortalError::InvalidProof
    );
    require_keys_eq!(
        claim_state.key(),
        ClaimState::pda(intent_hash).0,
        PortalError::InvalidClaimState
    );
    require!(
        claimant.is_writable && creator.is_writable && vault.is_writable && claim_state.is_writable,
        PortalError::InvalidTokenTransferAccounts
    );

    Ok(WithdrawalAccounts {
        claimant,
        creator,
        vault,
        proof,
        claim_state,
    })
}

/// Decides who a vault pays. A proof counts only when it was recorded for
/// `destination` and names the withdrawing claimant; without one, an expired
/// intent refunds its creator.
fn plan_withdrawal<'a, 'info>(
    accounts: WithdrawalAccounts<'a, 'info>,
    destination: u64,
    route_hash: &Bytes32,
    reward: &Reward,
    token_accounts: &[AccountInfo<'info>],
    now: i64,
) -> Result<Withdrawal<'a, 'info>> {
    let intent_hash = types::intent_hash(route_hash, &reward.hash());

    match ClaimState::status(accounts.claim_state)? {
        RewardStatus::Claimed => return Err(PortalError::RewardsAlreadyWithdrawn.into()),
        RewardStatus::Refunded => return Err(PortalError::IntentAlreadyRefunded.into()),
        RewardStatus::Initiated => {}
    }

    let proven_claimant = Proof::try_from_account_info(accounts.proof, &reward.prover)?
        .filter(|proof| proof.destination == destination && proof.claimant != Pubkey::default())
        .map(|proof| proof.claimant);
    let mode = match proven_claimant {
        Some(claimant) => {
            require_keys_eq!(
                accounts.claimant.key(),
                claimant,
                PortalError::InvalidClaimant
            );

            VaultMode::Claim(claimant)
        }
        None if reward.is_expired(now) => VaultMode::Refund,
        None => return Err(PortalError::UnauthorizedWithdrawal.into()),
    };

    let token_accounts = TokenPayoutAccounts::parse(
        accounts.vault.key,
        token_accounts,
        WITHDRAW_RECIPIENT_COUNT,
    )?;
    require_mints(&token_accounts, reward.token_amounts()?.keys())?;

    let balances = vault_balances(accounts.vault, &token_accounts)?;
    let payouts = Vault::new(reward, balances, None).settle(mode)?;
    require_payable(
        &payouts,
        &[accounts.claimant, accounts.creator],
        &token_accounts,
    )?;

    Ok(Withdrawal {
        accounts,
        intent_hash,
        mode,
        payouts,
        token_accounts,
    })
}

impl<'info> Withdrawal<'_, 'info> {
    fn execute(self, programs: &WithdrawalPrograms<'_, 'info>) -> Result<()> {
        let Withdrawal {
            accounts,
            intent_hash,
            mode,
            payouts,
            token_accounts,
        } = self;
        let (_, vault_bump) = vault_pda(&intent_hash);
        let (_, claim_state_bump) = ClaimState::pda(&intent_hash);

        let (status, claimant) = match mode {
            VaultMode::Claim(claimant) => (RewardStatus::Claimed, Some(claimant)),
            _ => (RewardStatus::Refunded, None),
        };
        // marks the intent resolved before any value leaves the vault
        ClaimState::new(status, claimant)
            .init(
                accounts.claim_state,
                programs.payer,
                programs.system_program,
                &[&[
                    CLAIM_STATE_SEED,
                    intent_hash.as_ref(),
                    slice::from_ref(&claim_state_bump),
                ]],
            )
            .map_err(|_| PortalError::IntentAlreadyResolved)?;

        let payer = VaultPayer {
            vault: accounts.vault,
            signer_seeds: &[VAULT_SEED, intent_hash.as_ref(), slice::from_ref(&vault_bump)],
            token_program: programs.token_program,
            token_2022_program: programs.token_2022_program,
            system_program: programs.system_program,
        };
        payer.pay(
            &payouts,
            &[accounts.claimant, accounts.creator],
            &token_accounts,
        )?;

        match claimant {
            Some(claimant) => emit!(IntentWithdrawn::new(intent_hash, claimant)),
            None => emit!(IntentRefunded::new(intent_hash, accounts.creator.key())),
        }

        Ok(())
    }
}
