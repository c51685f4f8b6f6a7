use std::iter;
use std::ops::Deref;

use anchor_lang::prelude::AccountMeta;
use anchor_lang::{AnchorSerialize, Discriminator, Event, InstructionData, ToAccountMetas};
use anchor_spl::associated_token::get_associated_token_address_with_program_id;
use anchor_spl::associated_token::spl_associated_token_account::instruction::create_associated_token_account;
use anchor_spl::token::{self, spl_token};
use anchor_spl::token_2022::{self, spl_token_2022};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use derive_more::{Deref, DerefMut};
use hyper_prover::state::{pda_payer_pda, ProofAccount};
use litesvm::types::{FailedTransactionMetadata, TransactionMetadata};
use litesvm::LiteSVM;
use portal::types::{Call, Calldata, CalldataWithAccounts, Intent, Reward, Route, TokenAmount};
use rand::random;
use routes_std::prover::Proof;
use routes_std::{Bytes32, CHAIN_ID};
use solana_sdk::clock::Clock;
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::instruction::{Instruction, InstructionError};
use solana_sdk::message::Message;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::rent::Rent;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::{Transaction, TransactionError};

mod portal_context;
mod prover_context;

pub use portal_context::fulfill_args;
pub use prover_context::dispatched_message;

const COMPUTE_UNIT_LIMIT: u32 = 1_400_000;
const PORTAL_BIN: &[u8] = include_bytes!("../../../target/deploy/portal.so");
const HYPER_PROVER_BIN: &[u8] = include_bytes!("../../../target/deploy/hyper_prover.so");
const STORAGE_PROVER_BIN: &[u8] = include_bytes!("../../../target/deploy/storage_prover.so");
const MOCK_MAILBOX_BIN: &[u8] = include_bytes!("../../../target/deploy/mock_mailbox.so");
const MOCK_PERMIT_BIN: &[u8] = include_bytes!("../../../target/deploy/mock_permit.so");
const MOCK_TARGET_BIN: &[u8] = include_bytes!("../../../target/deploy/mock_target.so");

pub const DECIMALS: u8 = 6;
pub const MAILBOX_FEE: u64 = 1_000_000;
/// The mailbox runs on this chain, so messages loop back to it.
pub const LOCAL_DOMAIN: u32 = CHAIN_ID as u32;

pub type TransactionResult = Result<TransactionMetadata, Box<FailedTransactionMetadata>>;

#[derive(Deref, DerefMut)]
pub struct Context {
    #[deref]
    #[deref_mut]
    svm: LiteSVM,
    mint_authority: Keypair,
    pub token_program: Pubkey,
    pub creator: Keypair,
    pub payer: Keypair,
    pub funder: Keypair,
    pub solver: Keypair,
}

impl Default for Context {
    fn default() -> Self {
        let mut svm = LiteSVM::new();

        svm.add_program(portal::ID, PORTAL_BIN);
        svm.add_program(hyper_prover::ID, HYPER_PROVER_BIN);
        svm.add_program(storage_prover::ID, STORAGE_PROVER_BIN);
        svm.add_program(mock_mailbox::ID, MOCK_MAILBOX_BIN);
        svm.add_program(mock_permit::ID, MOCK_PERMIT_BIN);
        svm.add_program(mock_target::ID, MOCK_TARGET_BIN);

        let mint_authority = Keypair::new();
        let creator = Keypair::new();
        let payer = Keypair::new();
        let funder = Keypair::new();
        let solver = Keypair::new();

        svm.airdrop(&mint_authority.pubkey(), sol_amount(100.0))
            .unwrap();
        svm.airdrop(&creator.pubkey(), sol_amount(1.0)).unwrap();
        svm.airdrop(&payer.pubkey(), sol_amount(10.0)).unwrap();
        svm.airdrop(&funder.pubkey(), sol_amount(10.0)).unwrap();
        svm.airdrop(&solver.pubkey(), sol_amount(10.0)).unwrap();
        svm.airdrop(&pda_payer_pda().0, sol_amount(1.0)).unwrap();

        let mut ctx = Self {
            svm,
            mint_authority,
            token_program: token::ID,
            creator,
            payer,
            funder,
            solver,
        };
        ctx.init_mailbox();

        ctx
    }
}

impl Context {
    pub fn new_with_token_2022() -> Self {
        Self {
            token_program: token_2022::ID,
            ..Default::default()
        }
    }

    pub fn now(&self) -> i64 {
        self.svm.get_sysvar::<Clock>().unix_timestamp
    }

    /// Intent from this chain to this chain with two reward tokens, one route
    /// token and no calls.
    pub fn rand_intent(&mut self) -> Intent {
        let route_tokens = vec![TokenAmount {
            token: Pubkey::new_unique(),
            amount: 5_000_000,
        }];
        let reward_tokens: Vec<_> = (0..2)
            .map(|i| TokenAmount {
                token: Pubkey::new_unique(),
                amount: (i + 1) * 1_000_000,
            })
            .collect();

        route_tokens
            .iter()
            .chain(reward_tokens.iter())
            .for_each(|token| self.set_mint_account(&token.token));

        Intent {
            route: Route {
                salt: random::<[u8; 32]>().into(),
                source: CHAIN_ID,
                destination: CHAIN_ID,
                portal: portal::ID,
                tokens: route_tokens,
                calls: vec![],
            },
            reward: Reward {
                creator: self.creator.pubkey(),
                prover: hyper_prover::ID,
                deadline: self.now() + 3600,
                native_amount: sol_amount(1.0),
                tokens: reward_tokens,
            },
        }
    }

    pub fn set_mint_account(&mut self, mint: &Pubkey) {
        let mint_account = if self.token_program == token::ID {
            let mut mint_data = [0u8; spl_token::state::Mint::LEN];
            spl_token::state::Mint::pack(
                spl_token::state::Mint {
                    decimals: DECIMALS,
                    is_initialized: true,
                    mint_authority: Some(self.mint_authority.pubkey()).into(),
                    supply: 0,
                    freeze_authority: None.into(),
                },
                &mut mint_data,
            )
            .unwrap();

            solana_sdk::account::Account {
                lamports: self
                    .get_sysvar::<Rent>()
                    .minimum_balance(spl_token::state::Mint::LEN),
                data: mint_data.to_vec(),
                owner: self.token_program,
                executable: false,
                rent_epoch: 0,
            }
        } else {
            let mut mint_data = [0u8; spl_token_2022::state::Mint::LEN];
            spl_token_2022::state::Mint::pack(
                spl_token_2022::state::Mint {
                    decimals: DECIMALS,
                    is_initialized: true,
                    mint_authority: Some(self.mint_authority.pubkey()).into(),
                    supply: 0,
                    freeze_authority: None.into(),
                },
                &mut mint_data,
            )
            .unwrap();

            solana_sdk::account::Account {
                lamports: self
                    .get_sysvar::<Rent>()
                    .minimum_balance(spl_token_2022::state::Mint::LEN),
                data: mint_data.to_vec(),
                owner: self.token_program,
                executable: false,
                rent_epoch: 0,
            }
        };

        self.set_account(*mint, mint_account).unwrap();
    }

    pub fn ata(&self, owner: &Pubkey, mint: &Pubkey) -> Pubkey {
        get_associated_token_address_with_program_id(owner, mint, &self.token_program)
    }

    /// Mints `amount` to the associated token account of `recipient`,
    /// creating it first when missing.
    pub fn airdrop_token_ata(&mut self, mint: &Pubkey, recipient: &Pubkey, amount: u64) {
        let recipient_token = self.ata(recipient, mint);

        let mut instructions = if self.get_account(&recipient_token).is_none() {
            vec![create_associated_token_account(
                &self.mint_authority.pubkey(),
                recipient,
                mint,
                &self.token_program,
            )]
        } else {
            vec![]
        };

        if amount > 0 {
            instructions.push(match self.token_program {
                token::ID => spl_token::instruction::mint_to(
                    &self.token_program,
                    mint,
                    &recipient_token,
                    &self.mint_authority.pubkey(),
                    &[],
                    amount,
                )
                .unwrap(),
                token_2022::ID => spl_token_2022::instruction::mint_to(
                    &self.token_program,
                    mint,
                    &recipient_token,
                    &self.mint_authority.pubkey(),
                    &[],
                    amount,
                )
                .unwrap(),
                _ => panic!("unsupported token program"),
            });
        }

        let transaction = Transaction::new(
            &[&self.mint_authority],
            Message::new(&instructions, Some(&self.mint_authority.pubkey())),
            self.latest_blockhash(),
        );

        self.send_transaction(transaction).unwrap();
    }

    /// Lets `delegate` spend `amount` from the associated token account of
    /// `owner`.
    pub fn approve(&mut self, mint: &Pubkey, owner: &Keypair, delegate: &Pubkey, amount: u64) {
        let owner_token = self.ata(&owner.pubkey(), mint);
        let instruction = match self.token_program {
            token::ID => spl_token::instruction::approve(
                &self.token_program,
                &owner_token,
                delegate,
                &owner.pubkey(),
                &[],
                amount,
            )
            .unwrap(),
            token_2022::ID => spl_token_2022::instruction::approve(
                &self.token_program,
                &owner_token,
                delegate,
                &owner.pubkey(),
                &[],
                amount,
            )
            .unwrap(),
            _ => panic!("unsupported token program"),
        };

        self.send_instructions(&[instruction], &[owner]).unwrap();
    }

    pub fn balance(&self, pubkey: &Pubkey) -> u64 {
        self.svm.get_balance(pubkey).unwrap_or_default()
    }

    pub fn token_balance(&self, pubkey: &Pubkey) -> u64 {
        self.get_account(pubkey)
            .and_then(|account| {
                if self.token_program == token::ID {
                    spl_token::state::Account::unpack(&account.data)
                        .ok()
                        .map(|acc| acc.amount)
                } else if self.token_program == token_2022::ID {
                    spl_token_2022::extension::StateWithExtensions::<spl_token_2022::state::Account>::unpack(&account.data)
                        .ok()
                        .map(|state| state.base.amount)
                } else {
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn token_balance_ata(&self, mint: &Pubkey, owner: &Pubkey) -> u64 {
        self.token_balance(&self.ata(owner, mint))
    }

    pub fn account<T: anchor_lang::AccountDeserialize>(&self, pubkey: &Pubkey) -> Option<T> {
        self.svm
            .get_account(pubkey)
            .and_then(|account| T::try_deserialize(&mut account.data.as_slice()).ok())
    }

    /// Writes a proof record the way `prover` stores it.
    pub fn set_proof(&mut self, intent_hash: &Bytes32, prover: Pubkey, proof: Proof) {
        self.set_proof_with_owner(intent_hash, prover, proof, prover);
    }

    /// Writes a proof record at the proof address of `prover`, owned by
    /// `owner`.
    pub fn set_proof_with_owner(
        &mut self,
        intent_hash: &Bytes32,
        prover: Pubkey,
        proof: Proof,
        owner: Pubkey,
    ) {
        let mut data = Vec::new();
        data.extend_from_slice(ProofAccount::DISCRIMINATOR);
        proof.serialize(&mut data).unwrap();

        let account = solana_sdk::account::Account {
            lamports: self.get_sysvar::<Rent>().minimum_balance(data.len()),
            data,
            owner,
            executable: false,
            rent_epoch: 0,
        };

        self.set_account(Proof::pda(intent_hash, &prover).0, account)
            .unwrap();
    }

    pub fn warp_to_timestamp(&mut self, unix_timestamp: i64) {
        let mut clock = self.get_sysvar::<Clock>();
        clock.unix_timestamp = unix_timestamp;

        self.set_sysvar(&clock);
    }

    pub fn expire_intent(&mut self, intent: &Intent) {
        self.warp_to_timestamp(intent.reward.deadline + 1);
    }

    /// Sends `instructions` paid for by the payer, signed by the payer and
    /// `signers`.
    pub fn send_instructions(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> TransactionResult {
        let payer = self.payer.insecure_clone();
        let signers: Vec<_> = iter::once(&payer).chain(signers.iter().copied()).collect();
        let instructions: Vec<_> =
            iter::once(ComputeBudgetInstruction::set_compute_unit_limit(COMPUTE_UNIT_LIMIT))
                .chain(instructions.iter().cloned())
                .collect();

        let transaction = Transaction::new(
            &signers,
            Message::new(&instructions, Some(&payer.pubkey())),
            self.latest_blockhash(),
        );

        self.send_transaction(transaction)
    }

    fn init_mailbox(&mut self) {
        let instruction = Instruction {
            program_id: mock_mailbox::ID,
            accounts: mock_mailbox::accounts::Init {
                outbox: mock_mailbox::Outbox::pda().0,
                payer: self.payer.pubkey(),
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None),
            data: mock_mailbox::instruction::Init {
                local_domain: LOCAL_DOMAIN,
                fee: MAILBOX_FEE,
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[]).unwrap();
    }

    fn send_transaction(&mut self, transaction: Transaction) -> TransactionResult {
        let result = self.svm.send_transaction(transaction);
        self.expire_blockhash();
        let slot = self.svm.get_sysvar::<Clock>().slot;
        self.svm.warp_to_slot(slot + 1);

        result.map_err(Box::new)
    }
}

/// A route call together with the accounts it runs with.
#[derive(Clone, Debug)]
pub struct RouteCall {
    pub target: Pubkey,
    pub data: Vec<u8>,
    pub accounts: Vec<AccountMeta>,
    pub value: u64,
}

impl RouteCall {
    pub fn new(instruction: Instruction) -> Self {
        Self {
            target: instruction.program_id,
            data: instruction.data,
            accounts: instruction.accounts,
            value: 0,
        }
    }

    pub fn native_transfer(recipient: Pubkey, value: u64) -> Self {
        Self {
            target: recipient,
            data: vec![],
            accounts: vec![],
            value,
        }
    }

    fn calldata(&self) -> Calldata {
        Calldata {
            data: self.data.clone(),
            account_count: self.accounts.len() as u8,
        }
    }

    /// The call as the solver submits it.
    pub fn submitted(&self) -> Call {
        Call {
            target: self.target,
            data: self.calldata().try_to_vec().unwrap(),
            value: self.value,
        }
    }

    /// The call as the route hash commits to it.
    pub fn hashed(&self) -> Call {
        Call {
            target: self.target,
            data: CalldataWithAccounts::new(self.calldata(), self.accounts.clone())
                .unwrap()
                .try_to_vec()
                .unwrap(),
            value: self.value,
        }
    }

    /// `[target, ..accounts]`, writable where the call needs it.
    pub fn account_metas(&self) -> Vec<AccountMeta> {
        let target = match self.value {
            0 => AccountMeta::new_readonly(self.target, false),
            _ => AccountMeta::new(self.target, false),
        };

        iter::once(target).chain(self.accounts.clone()).collect()
    }
}

/// Sets `calls` on `intent`. Returns the intent as published on the source
/// chain and the route as submitted to `fulfill`.
pub fn with_calls(mut intent: Intent, calls: &[RouteCall]) -> (Intent, Route) {
    let mut submitted = intent.route.clone();
    submitted.calls = calls.iter().map(RouteCall::submitted).collect();
    intent.route.calls = calls.iter().map(RouteCall::hashed).collect();

    (intent, submitted)
}

pub fn sol_amount(amount: f64) -> u64 {
    (amount * 1_000_000_000.0) as u64
}

pub fn contains_event<E>(expected: E) -> impl Fn(TransactionMetadata) -> bool
where
    E: Event,
{
    let expected = STANDARD.encode(expected.data());

    move |actual: TransactionMetadata| {
        actual
            .logs
            .iter()
            .any(|log| log.contains(format!("Program data: {}", expected).as_str()))
    }
}

pub fn is_error<T, Err>(expected: Err) -> impl Fn(T) -> bool
where
    T: Deref<Target = FailedTransactionMetadata>,
    Err: Into<u32>,
{
    let expected = expected.into();

    move |actual: T| match actual.err {
        TransactionError::InstructionError(_, InstructionError::Custom(error_code)) => {
            error_code == expected
        }
        _ => false,
    }
}

pub fn is_instruction_error<T>(expected: InstructionError) -> impl Fn(T) -> bool
where
    T: Deref<Target = FailedTransactionMetadata>,
{
    move |actual: T| {
        matches!(&actual.err, TransactionError::InstructionError(_, error) if *error == expected)
    }
}
