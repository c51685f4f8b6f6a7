use std::collections::BTreeMap;
use std::slice;

use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::associated_token::get_associated_token_address_with_program_id;
use anchor_spl::{associated_token, token, token_2022};
use routes_std::Bytes32;

use crate::events::IntentFunded;
use crate::funder::Funder;
use crate::instructions::call::CallAccounts;
use crate::instructions::fund::require_unresolved;
use crate::instructions::fund_context::FundTokenContext;
use crate::instructions::permit::{
    permit_spender_pda, PermitHelper, PERMIT_ACCOUNTS_LEN, PERMIT_SPENDER_SEED,
};
use crate::instructions::PortalError;
use crate::state::{funder_pda, vault_pda, ClaimState, FUNDER_SEED};
use crate::types::{
    self, Call, Reward, TokenTransferAccounts, VecTokenTransferAccounts,
    VEC_TOKEN_TRANSFER_ACCOUNTS_CHUNK_SIZE,
};
use crate::vault::{Asset, Balances};

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct FundForArgs {
    pub route_hash: Bytes32,
    pub reward: Reward,
    /// Owner of the tokens pulled into the vault.
    pub funding_source: Pubkey,
    /// Executed before any transfer, e.g. to submit a permit to a helper.
    /// They run without any portal signature.
    pub pre_transfer_calls: Vec<Call>,
    pub permit_helper: Option<Pubkey>,
    pub refund_token: Option<Pubkey>,
    pub allow_partial: bool,
}

/// Remaining accounts, in order:
/// - the accounts of every pre-transfer call, target first
/// - `[permit_helper, permit_spender]` when a permit helper is used
/// - `[funder_ata, creator_ata, mint]` when a refund token is given
/// - per reward token `[source_ata, vault_ata, mint]`, followed by the permit
///   helper's accounts when a permit helper is used
#[derive(Accounts)]
#[instruction(args: FundForArgs)]
pub struct FundFor<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    /// CHECK: address is validated
    #[account(address = args.funding_source @ PortalError::InvalidFundingSource)]
    pub funding_source: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(address = args.reward.creator @ PortalError::InvalidCreator)]
    pub creator: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(address = funder_pda(&args.route_hash, &args.reward.hash()).0 @ PortalError::InvalidFunder)]
    pub funder: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(
        mut,
        address = vault_pda(&types::intent_hash(&args.route_hash, &args.reward.hash())).0 @ PortalError::InvalidVault,
    )]
    pub vault: UncheckedAccount<'info>,
    /// CHECK: address is validated
    #[account(
        address = ClaimState::pda(&types::intent_hash(&args.route_hash, &args.reward.hash())).0 @ PortalError::InvalidClaimState,
    )]
    pub claim_state: UncheckedAccount<'info>,
    pub token_program: Program<'info, token::Token>,
    pub token_2022_program: Program<'info, token_2022::Token2022>,
    pub associated_token_program: Program<'info, associated_token::AssociatedToken>,
    pub system_program: Program<'info, System>,
}

impl<'info> FundFor<'info> {
    fn fund_token_context(
        &self,
        funder: AccountInfo<'info>,
        fundee: AccountInfo<'info>,
    ) -> FundTokenContext<'_, 'info> {
        FundTokenContext {
            payer: &self.payer,
            funder,
            fundee,
            token_program: &self.token_program,
            token_2022_program: &self.token_2022_program,
            associated_token_program: &self.associated_token_program,
            system_program: &self.system_program,
        }
    }
}

/// Funds a vault on behalf of `funding_source` through the intent's funder
/// address. Tokens come from allowances the source granted to the funder
/// address, or to its permit spender at a permit helper.
pub fn fund_intent_for<'info>(
    ctx: Context<'_, '_, '_, 'info, FundFor<'info>>,
    args: FundForArgs,
) -> Result<()> {
    let FundForArgs {
        route_hash,
        reward,
        funding_source,
        pre_transfer_calls,
        permit_helper,
        refund_token,
        allow_partial,
    } = args;
    let reward_hash = reward.hash();
    let intent_hash = types::intent_hash(&route_hash, &reward_hash);
    let (_, funder_bump) = funder_pda(&route_hash, &reward_hash);
    let funder_seeds: &[&[u8]] = &[
        FUNDER_SEED,
        route_hash.as_ref(),
        reward_hash.as_ref(),
        &[funder_bump],
    ];

    require_unresolved(&ctx.accounts.claim_state)?;

    let mut remaining_accounts = ctx.remaining_accounts.iter();
    pre_transfer_calls.iter().try_for_each(|call| {
        CallAccounts::take(call, &mut remaining_accounts)?.execute_unsigned()
    })?;

    let permit = permit_helper
        .map(|helper| {
            take_permit_accounts(&mut remaining_accounts, &route_hash, &reward_hash, &helper)
        })
        .transpose()?;
    let sweep_accounts = refund_token
        .map(|mint| take_sweep_accounts(&ctx, &mut remaining_accounts, &reward, &mint))
        .transpose()?;
    let (accounts, helper_accounts) =
        token_accounts(remaining_accounts.as_slice(), permit.is_some())?;
    accounts.require_mints(&reward.token_amounts()?)?;

    let permit_seeds;
    let permit_helper = match &permit {
        Some((helper, spender, bump)) => {
            permit_seeds = [
                PERMIT_SPENDER_SEED,
                route_hash.as_ref(),
                reward_hash.as_ref(),
                helper.key.as_ref(),
                slice::from_ref(bump),
            ];
            let permit_helper = PermitHelper {
                program: helper,
                spender,
                signer_seeds: &permit_seeds,
            };
            permit_helper.validate()?;

            Some(permit_helper)
        }
        None => None,
    };

    let available = accounts
        .iter()
        .map(|accounts| {
            let owner_balance = source_balance(accounts, &funding_source)?;
            let allowance = match &permit_helper {
                Some(permit_helper) => {
                    permit_helper.allowance(accounts, helper_accounts[accounts.mint.key])?
                }
                None => delegated_allowance(accounts, ctx.accounts.funder.key)?,
            };

            Result::Ok((accounts.mint.key(), allowance.min(owner_balance)))
        })
        .collect::<Result<_>>()
        .map(|tokens| Balances {
            native: ctx.accounts.payer.lamports(),
            tokens,
        })?;
    let vault = Balances::from_destinations(ctx.accounts.vault.lamports(), accounts.iter())?;
    let sweep = sweep_accounts
        .as_ref()
        .map(|accounts| Result::Ok((accounts.mint.key(), accounts.from_amount()?)))
        .transpose()?;
    let plan = Funder::new(&reward, vault, available, sweep).plan()?;

    require!(
        allow_partial || plan.complete,
        PortalError::InsufficientFunds
    );

    if let (Some((_, amount)), Some(sweep_accounts)) = (plan.sweep, &sweep_accounts) {
        ctx.accounts
            .fund_token_context(
                ctx.accounts.funder.to_account_info(),
                ctx.accounts.creator.to_account_info(),
            )
            .transfer_token(sweep_accounts, amount, &[funder_seeds])?;
    }

    let vault_funding = ctx.accounts.fund_token_context(
        ctx.accounts.funder.to_account_info(),
        ctx.accounts.vault.to_account_info(),
    );
    plan.transfers
        .iter()
        .try_for_each(|(asset, amount)| match (asset, &permit_helper) {
            (Asset::Native, _) => ctx
                .accounts
                .fund_token_context(
                    ctx.accounts.payer.to_account_info(),
                    ctx.accounts.vault.to_account_info(),
                )
                .transfer_native(*amount),
            (Asset::Token(mint), Some(permit_helper)) => {
                let accounts = accounts.get(mint)?;
                let token_program = vault_funding.ensure_fundee_ata(accounts)?;

                permit_helper.transfer_from(accounts, &token_program, helper_accounts[mint], *amount)
            }
            (Asset::Token(mint), None) => {
                vault_funding.transfer_token(accounts.get(mint)?, *amount, &[funder_seeds])
            }
        })?;

    emit!(IntentFunded::new(intent_hash, funding_source, plan.complete));

    Ok(())
}

fn take_permit_accounts<'c, 'info>(
    remaining_accounts: &mut slice::Iter<'c, AccountInfo<'info>>,
    route_hash: &Bytes32,
    reward_hash: &Bytes32,
    helper: &Pubkey,
) -> Result<(&'c AccountInfo<'info>, &'c AccountInfo<'info>, u8)> {
    let (program, spender) = remaining_accounts
        .next()
        .zip(remaining_accounts.next())
        .ok_or(PortalError::InvalidCallTarget)?;
    let (spender_pda, bump) = permit_spender_pda(route_hash, reward_hash, helper);

    require_keys_eq!(program.key(), *helper, PortalError::InvalidCallTarget);
    require_keys_eq!(spender.key(), spender_pda, PortalError::InvalidFunder);

    Ok((program, spender, bump))
}

fn take_sweep_accounts<'info>(
    ctx: &Context<'_, '_, '_, 'info, FundFor<'info>>,
    remaining_accounts: &mut slice::Iter<'_, AccountInfo<'info>>,
    reward: &Reward,
    mint: &Pubkey,
) -> Result<TokenTransferAccounts<'info>> {
    require!(
        *mint != Pubkey::default() && !reward.token_amounts()?.contains_key(mint),
        PortalError::InvalidRefundToken
    );

    let accounts = TokenTransferAccounts::try_from(
        remaining_accounts
            .by_ref()
            .take(VEC_TOKEN_TRANSFER_ACCOUNTS_CHUNK_SIZE)
            .collect::<Vec<_>>(),
    )?;
    let funder_ata = get_associated_token_address_with_program_id(
        ctx.accounts.funder.key,
        mint,
        accounts.token_program_id(),
    );

    require_keys_eq!(accounts.mint.key(), *mint, PortalError::InvalidRefundToken);
    require_keys_eq!(accounts.from.key(), funder_ata, PortalError::InvalidAta);

    Ok(accounts)
}

/// Splits the token chunks from the permit helper accounts that follow each
/// of them.
fn token_accounts<'c, 'info>(
    accounts: &'c [AccountInfo<'info>],
    with_permit: bool,
) -> Result<(
    VecTokenTransferAccounts<'info>,
    BTreeMap<Pubkey, &'c [AccountInfo<'info>]>,
)> {
    let chunk_size = match with_permit {
        true => VEC_TOKEN_TRANSFER_ACCOUNTS_CHUNK_SIZE + PERMIT_ACCOUNTS_LEN,
        false => VEC_TOKEN_TRANSFER_ACCOUNTS_CHUNK_SIZE,
    };
    require!(
        accounts.len() % chunk_size == 0,
        PortalError::InvalidTokenTransferAccounts
    );

    accounts
        .chunks(chunk_size)
        .map(|chunk| {
            let (transfer_accounts, helper_accounts) =
                chunk.split_at(VEC_TOKEN_TRANSFER_ACCOUNTS_CHUNK_SIZE);
            let transfer_accounts =
                TokenTransferAccounts::try_from(transfer_accounts.iter().collect::<Vec<_>>())?;

            Ok((transfer_accounts, helper_accounts))
        })
        .collect::<Result<Vec<_>>>()
        .map(|chunks| {
            let helper_accounts = chunks
                .iter()
                .map(|(accounts, helper_accounts)| (accounts.mint.key(), *helper_accounts))
                .collect();
            let accounts = chunks.into_iter().map(|(accounts, _)| accounts).collect::<Vec<_>>();

            (accounts.into(), helper_accounts)
        })
}

fn source_balance(accounts: &TokenTransferAccounts, funding_source: &Pubkey) -> Result<u64> {
    let source = accounts.from_data()?;
    require_keys_eq!(
        source.owner,
        *funding_source,
        PortalError::InvalidFundingSource
    );

    Ok(source.amount)
}

/// What the funder address may spend from the source token account.
fn delegated_allowance(accounts: &TokenTransferAccounts, funder: &Pubkey) -> Result<u64> {
    let source = accounts.from_data()?;

    Ok(match source.delegate {
        COption::Some(delegate) if delegate == *funder => source.delegated_amount,
        _ => 0,
    })
}
