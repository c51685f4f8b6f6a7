use anchor_lang::prelude::AccountMeta;
use anchor_lang::{InstructionData, ToAccountMetas};
use anchor_spl::{associated_token, token, token_2022};
use derive_more::{Deref, DerefMut};
use portal::instructions::{
    BatchWithdrawArgs, ChangeSolverWhitelistArgs, FulfillAndProveArgs, FulfillArgs,
    FulfillBatchedArgs, FundArgs, FundForArgs, InitArgs, ProveArgs, PublishArgs, RecoverTokenArgs,
    RefundArgs, WithdrawArgs,
};
use portal::state::{
    dispatcher_pda, executor_pda, funder_pda, vault_pda, ClaimState, Config, FulfillMarker,
};
use portal::types::{self, Intent, Reward, Route, TokenAmount};
use routes_std::prover::Proof;
use routes_std::Bytes32;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;

use crate::common::{Context, RouteCall, TransactionResult};

#[derive(Deref, DerefMut)]
pub struct Portal<'a>(&'a mut Context);

impl Context {
    pub fn portal(&mut self) -> Portal<'_> {
        Portal(self)
    }

    /// `[from_ata, to_ata, mint]` per token.
    pub fn token_transfer_metas(
        &self,
        from: &Pubkey,
        to: &Pubkey,
        tokens: &[TokenAmount],
    ) -> Vec<AccountMeta> {
        tokens
            .iter()
            .flat_map(|token| {
                [
                    AccountMeta::new(self.ata(from, &token.token), false),
                    AccountMeta::new(self.ata(to, &token.token), false),
                    AccountMeta::new_readonly(token.token, false),
                ]
            })
            .collect()
    }

    /// `[vault_ata, ..recipient atas, mint]` per token.
    pub fn payout_metas(
        &self,
        vault: &Pubkey,
        recipients: &[Pubkey],
        tokens: &[TokenAmount],
    ) -> Vec<AccountMeta> {
        tokens
            .iter()
            .flat_map(|token| {
                std::iter::once(AccountMeta::new(self.ata(vault, &token.token), false))
                    .chain(
                        recipients
                            .iter()
                            .map(|recipient| AccountMeta::new(self.ata(recipient, &token.token), false)),
                    )
                    .chain(std::iter::once(AccountMeta::new_readonly(token.token, false)))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Mints every reward token of `intent` to the payer and publishes the
    /// intent with a fully funded vault.
    pub fn publish_funded_intent(&mut self, intent: &Intent) -> TransactionResult {
        let payer = self.payer.pubkey();
        intent
            .reward
            .tokens
            .iter()
            .for_each(|token| self.airdrop_token_ata(&token.token, &payer, token.amount));

        self.portal().publish(intent.clone(), true)
    }

    /// Creates empty token accounts for `owner` for every token in `tokens`.
    pub fn create_token_accounts(&mut self, owner: &Pubkey, tokens: &[TokenAmount]) {
        tokens
            .iter()
            .for_each(|token| self.airdrop_token_ata(&token.token, owner, 0));
    }
}

pub fn fulfill_args(intent: &Intent, route: Route, claimant: Pubkey) -> FulfillArgs {
    FulfillArgs {
        route,
        reward_hash: intent.reward.hash(),
        claimant,
        expected_hash: intent.hash().0,
    }
}

impl Portal<'_> {
    pub fn publish(&mut self, intent: Intent, fund: bool) -> TransactionResult {
        let (intent_hash, _, _) = intent.hash();
        let vault = vault_pda(&intent_hash).0;
        let remaining = match fund {
            true => self.token_transfer_metas(&self.payer.pubkey(), &vault, &intent.reward.tokens),
            false => vec![],
        };
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::Publish {
                payer: self.payer.pubkey(),
                vault,
                claim_state: ClaimState::pda(&intent_hash).0,
                token_program: token::ID,
                token_2022_program: token_2022::ID,
                associated_token_program: associated_token::ID,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None)
            .into_iter()
            .chain(remaining)
            .collect(),
            data: portal::instruction::Publish {
                args: PublishArgs { intent, fund },
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    pub fn fund(
        &mut self,
        route_hash: Bytes32,
        reward: Reward,
        allow_partial: bool,
    ) -> TransactionResult {
        let funder = self.funder.insecure_clone();
        let intent_hash = types::intent_hash(&route_hash, &reward.hash());
        let vault = vault_pda(&intent_hash).0;
        let remaining = self.token_transfer_metas(&funder.pubkey(), &vault, &reward.tokens);
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::Fund {
                payer: self.payer.pubkey(),
                funder: funder.pubkey(),
                vault,
                claim_state: ClaimState::pda(&intent_hash).0,
                token_program: token::ID,
                token_2022_program: token_2022::ID,
                associated_token_program: associated_token::ID,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None)
            .into_iter()
            .chain(remaining)
            .collect(),
            data: portal::instruction::Fund {
                args: FundArgs {
                    route_hash,
                    reward,
                    allow_partial,
                },
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[&funder])
    }

    pub fn fund_for(&mut self, args: FundForArgs, remaining: Vec<AccountMeta>) -> TransactionResult {
        let reward_hash = args.reward.hash();
        let intent_hash = types::intent_hash(&args.route_hash, &reward_hash);
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::FundFor {
                payer: self.payer.pubkey(),
                funding_source: args.funding_source,
                creator: args.reward.creator,
                funder: funder_pda(&args.route_hash, &reward_hash).0,
                vault: vault_pda(&intent_hash).0,
                claim_state: ClaimState::pda(&intent_hash).0,
                token_program: token::ID,
                token_2022_program: token_2022::ID,
                associated_token_program: associated_token::ID,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None)
            .into_iter()
            .chain(remaining)
            .collect(),
            data: portal::instruction::FundFor { args }.data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    pub fn withdraw(
        &mut self,
        destination: u64,
        route_hash: Bytes32,
        reward: Reward,
        claimant: Pubkey,
    ) -> TransactionResult {
        let intent_hash = types::intent_hash(&route_hash, &reward.hash());
        let vault = vault_pda(&intent_hash).0;
        let remaining = self.payout_metas(&vault, &[claimant, reward.creator], &reward.tokens);
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::Withdraw {
                payer: self.payer.pubkey(),
                claimant,
                creator: reward.creator,
                vault,
                proof: Proof::pda(&intent_hash, &reward.prover).0,
                claim_state: ClaimState::pda(&intent_hash).0,
                token_program: token::ID,
                token_2022_program: token_2022::ID,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None)
            .into_iter()
            .chain(remaining)
            .collect(),
            data: portal::instruction::Withdraw {
                args: WithdrawArgs {
                    destination,
                    route_hash,
                    reward,
                },
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    /// Withdraws every `(destination, route_hash, reward, claimant)` element
    /// in one instruction.
    pub fn batch_withdraw(
        &mut self,
        elements: Vec<(u64, Bytes32, Reward, Pubkey)>,
    ) -> TransactionResult {
        let remaining = elements
            .iter()
            .flat_map(|(_, route_hash, reward, claimant)| {
                let intent_hash = types::intent_hash(route_hash, &reward.hash());
                let vault = vault_pda(&intent_hash).0;

                [
                    AccountMeta::new(*claimant, false),
                    AccountMeta::new(reward.creator, false),
                    AccountMeta::new(vault, false),
                    AccountMeta::new_readonly(Proof::pda(&intent_hash, &reward.prover).0, false),
                    AccountMeta::new(ClaimState::pda(&intent_hash).0, false),
                ]
                .into_iter()
                .chain(self.payout_metas(&vault, &[*claimant, reward.creator], &reward.tokens))
                .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let (destinations, rest): (Vec<_>, Vec<_>) = elements
            .into_iter()
            .map(|(destination, route_hash, reward, _)| (destination, (route_hash, reward)))
            .unzip();
        let (route_hashes, rewards) = rest.into_iter().unzip();
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::BatchWithdraw {
                payer: self.payer.pubkey(),
                token_program: token::ID,
                token_2022_program: token_2022::ID,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None)
            .into_iter()
            .chain(remaining)
            .collect(),
            data: portal::instruction::BatchWithdraw {
                args: BatchWithdrawArgs {
                    destinations,
                    route_hashes,
                    rewards,
                },
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    pub fn refund(&mut self, route_hash: Bytes32, reward: Reward) -> TransactionResult {
        let intent_hash = types::intent_hash(&route_hash, &reward.hash());
        let vault = vault_pda(&intent_hash).0;
        let remaining = self.payout_metas(&vault, &[reward.creator], &reward.tokens);
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::Refund {
                payer: self.payer.pubkey(),
                creator: reward.creator,
                vault,
                claim_state: ClaimState::pda(&intent_hash).0,
                token_program: token::ID,
                token_2022_program: token_2022::ID,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None)
            .into_iter()
            .chain(remaining)
            .collect(),
            data: portal::instruction::Refund {
                args: RefundArgs { route_hash, reward },
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    pub fn recover_token(
        &mut self,
        route_hash: Bytes32,
        reward: Reward,
        token: Pubkey,
    ) -> TransactionResult {
        let intent_hash = types::intent_hash(&route_hash, &reward.hash());
        let vault = vault_pda(&intent_hash).0;
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::RecoverToken {
                creator: reward.creator,
                vault,
                claim_state: ClaimState::pda(&intent_hash).0,
                vault_token: self.ata(&vault, &token),
                creator_token: self.ata(&reward.creator, &token),
                mint: token,
                token_program: token::ID,
                token_2022_program: token_2022::ID,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None),
            data: portal::instruction::RecoverToken {
                args: RecoverTokenArgs {
                    route_hash,
                    reward,
                    token,
                },
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    pub fn init(
        &mut self,
        owner: Pubkey,
        solving_public: bool,
        solver_whitelist: Vec<Pubkey>,
    ) -> TransactionResult {
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::Init {
                payer: self.payer.pubkey(),
                config: Config::pda().0,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None),
            data: portal::instruction::Init {
                args: InitArgs {
                    owner,
                    solving_public,
                    solver_whitelist,
                },
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    pub fn make_solving_public(&mut self, owner: &Keypair) -> TransactionResult {
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::Admin {
                owner: owner.pubkey(),
                config: Config::pda().0,
            }
            .to_account_metas(None),
            data: portal::instruction::MakeSolvingPublic {}.data(),
        };

        self.send_instructions(&[instruction], &[owner])
    }

    pub fn change_solver_whitelist(
        &mut self,
        owner: &Keypair,
        solver: Pubkey,
        can_solve: bool,
    ) -> TransactionResult {
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::Admin {
                owner: owner.pubkey(),
                config: Config::pda().0,
            }
            .to_account_metas(None),
            data: portal::instruction::ChangeSolverWhitelist {
                args: ChangeSolverWhitelistArgs { solver, can_solve },
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[owner])
    }

    pub fn fulfill(&mut self, args: FulfillArgs, calls: &[RouteCall]) -> TransactionResult {
        let accounts = self.fulfill_metas(&args);
        let remaining = self.fulfill_remaining(&args.route, calls);
        let data = portal::instruction::Fulfill { args }.data();

        self.send_fulfill(accounts, remaining, data)
    }

    pub fn fulfill_storage(&mut self, args: FulfillArgs, calls: &[RouteCall]) -> TransactionResult {
        let accounts = self.fulfill_metas(&args);
        let remaining = self.fulfill_remaining(&args.route, calls);
        let data = portal::instruction::FulfillStorage { args }.data();

        self.send_fulfill(accounts, remaining, data)
    }

    pub fn fulfill_batched(
        &mut self,
        args: FulfillBatchedArgs,
        calls: &[RouteCall],
    ) -> TransactionResult {
        let accounts = self.fulfill_metas(&args.fulfill);
        let remaining = self.fulfill_remaining(&args.fulfill.route, calls);
        let data = portal::instruction::FulfillBatched { args }.data();

        self.send_fulfill(accounts, remaining, data)
    }

    /// `prover_metas` follow the route calls and are handed to the prover.
    pub fn fulfill_and_prove(
        &mut self,
        args: FulfillAndProveArgs,
        calls: &[RouteCall],
        prover_metas: Vec<AccountMeta>,
    ) -> TransactionResult {
        let accounts = self
            .fulfill_metas(&args.fulfill)
            .into_iter()
            .chain([
                AccountMeta::new_readonly(args.prover, false),
                AccountMeta::new(dispatcher_pda().0, false),
            ])
            .collect();
        let remaining = self
            .fulfill_remaining(&args.fulfill.route, calls)
            .into_iter()
            .chain(prover_metas)
            .collect();
        let data = portal::instruction::FulfillAndProve { args }.data();

        self.send_fulfill(accounts, remaining, data)
    }

    /// Proves `args.intent_hashes`; their fulfill markers are passed ahead of
    /// `prover_metas`.
    pub fn prove(&mut self, args: ProveArgs, prover_metas: Vec<AccountMeta>) -> TransactionResult {
        let remaining = args
            .intent_hashes
            .iter()
            .map(|intent_hash| AccountMeta::new_readonly(FulfillMarker::pda(intent_hash).0, false))
            .chain(prover_metas)
            .collect::<Vec<_>>();
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: portal::accounts::Prove {
                payer: self.payer.pubkey(),
                prover: args.prover,
                dispatcher: dispatcher_pda().0,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None)
            .into_iter()
            .chain(remaining)
            .collect(),
            data: portal::instruction::Prove { args }.data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    fn fulfill_metas(&self, args: &FulfillArgs) -> Vec<AccountMeta> {
        portal::accounts::Fulfill {
            payer: self.payer.pubkey(),
            solver: self.solver.pubkey(),
            executor: executor_pda().0,
            fulfill_marker: FulfillMarker::pda(&args.expected_hash).0,
            config: Config::pda().0,
            token_program: token::ID,
            token_2022_program: token_2022::ID,
            associated_token_program: associated_token::ID,
            system_program: anchor_lang::system_program::ID,
        }
        .to_account_metas(None)
    }

    fn fulfill_remaining(&self, route: &Route, calls: &[RouteCall]) -> Vec<AccountMeta> {
        self.token_transfer_metas(&self.solver.pubkey(), &executor_pda().0, &route.tokens)
            .into_iter()
            .chain(calls.iter().flat_map(RouteCall::account_metas))
            .collect()
    }

    fn send_fulfill(
        &mut self,
        accounts: Vec<AccountMeta>,
        remaining: Vec<AccountMeta>,
        data: Vec<u8>,
    ) -> TransactionResult {
        let solver = self.solver.insecure_clone();
        let instruction = Instruction {
            program_id: portal::ID,
            accounts: accounts.into_iter().chain(remaining).collect(),
            data,
        };

        self.send_instructions(&[instruction], &[&solver])
    }
}
