use anchor_lang::prelude::AccountMeta;
use anchor_lang::{AnchorDeserialize, AnchorSerialize, Discriminator, InstructionData, ToAccountMetas};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use derive_more::{Deref, DerefMut};
use hyper_prover::hyperlane::process_authority_pda;
use litesvm::types::TransactionMetadata;
use mock_mailbox::{Dispatched, Outbox};
use routes_std::prover::Proof;
use routes_std::Bytes32;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::rent::Rent;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use storage_prover::instructions::ProveFulfillmentArgs;
use storage_prover::state::{AnchoredBlock, DestinationPortal};

use crate::common::{Context, TransactionResult};

#[derive(Deref, DerefMut)]
pub struct HyperProver<'a>(&'a mut Context);

#[derive(Deref, DerefMut)]
pub struct Mailbox<'a>(&'a mut Context);

#[derive(Deref, DerefMut)]
pub struct StorageProver<'a>(&'a mut Context);

impl Context {
    pub fn hyper_prover(&mut self) -> HyperProver<'_> {
        HyperProver(self)
    }

    pub fn mailbox(&mut self) -> Mailbox<'_> {
        Mailbox(self)
    }

    pub fn storage_prover(&mut self) -> StorageProver<'_> {
        StorageProver(self)
    }
}

/// The message the mock mailbox announced in `result`, if any.
pub fn dispatched_message(result: &TransactionMetadata) -> Option<Dispatched> {
    result
        .logs
        .iter()
        .filter_map(|log| log.strip_prefix("Program data: "))
        .filter_map(|data| STANDARD.decode(data).ok())
        .find_map(|data| {
            data.strip_prefix(Dispatched::DISCRIMINATOR)
                .and_then(|mut body| Dispatched::deserialize(&mut body).ok())
        })
}

impl HyperProver<'_> {
    pub fn init(&mut self, whitelisted_senders: Vec<Bytes32>) -> TransactionResult {
        let instruction = Instruction {
            program_id: hyper_prover::ID,
            accounts: hyper_prover::accounts::Init {
                config: hyper_prover::state::Config::pda().0,
                payer: self.payer.pubkey(),
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None),
            data: hyper_prover::instruction::Init {
                args: hyper_prover::instructions::InitArgs {
                    mailbox: mock_mailbox::ID,
                    whitelisted_senders,
                },
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    /// Accounts the portal hands to the prover after its own dispatcher.
    /// `refundee` receives the fee overpayment.
    pub fn prove_accounts(&self, refundee: Pubkey) -> Vec<AccountMeta> {
        hyper_prover::accounts::Prove {
            portal_dispatcher: portal::state::dispatcher_pda().0,
            payer: refundee,
            config: hyper_prover::state::Config::pda().0,
            dispatcher: hyper_prover::state::dispatcher_pda().0,
            outbox: Outbox::pda().0,
            mailbox_program: mock_mailbox::ID,
            system_program: anchor_lang::system_program::ID,
        }
        .to_account_metas(None)
        .into_iter()
        .skip(1)
        .collect()
    }

    /// Calls `handle` directly with `process_authority` signing.
    pub fn handle(
        &mut self,
        process_authority: &Keypair,
        origin: u32,
        sender: [u8; 32],
        payload: Vec<u8>,
        intent_hashes: &[Bytes32],
    ) -> TransactionResult {
        let instruction = Instruction {
            program_id: hyper_prover::ID,
            accounts: hyper_prover::accounts::Handle {
                process_authority: process_authority.pubkey(),
                config: hyper_prover::state::Config::pda().0,
                pda_payer: hyper_prover::state::pda_payer_pda().0,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None)
            .into_iter()
            .chain(proof_metas(intent_hashes, &hyper_prover::ID))
            .collect(),
            data: hyper_prover::instruction::Handle {
                origin,
                sender,
                payload,
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[process_authority])
    }
}

impl Mailbox<'_> {
    /// Delivers `message` to the hyper-prover. `intent_hashes` name the proof
    /// accounts the message body needs.
    pub fn process(&mut self, message: Dispatched, intent_hashes: &[Bytes32]) -> TransactionResult {
        let Dispatched {
            nonce,
            origin,
            sender,
            destination,
            recipient,
            body,
        } = message;
        let recipient_program = Pubkey::new_from_array(recipient);
        let instruction = Instruction {
            program_id: mock_mailbox::ID,
            accounts: mock_mailbox::accounts::InboxProcess {
                outbox: Outbox::pda().0,
                process_authority: process_authority_pda(&mock_mailbox::ID, &recipient_program).0,
                recipient_program,
            }
            .to_account_metas(None)
            .into_iter()
            .chain(
                hyper_prover::accounts::Handle {
                    process_authority: process_authority_pda(&mock_mailbox::ID, &hyper_prover::ID)
                        .0,
                    config: hyper_prover::state::Config::pda().0,
                    pda_payer: hyper_prover::state::pda_payer_pda().0,
                    system_program: anchor_lang::system_program::ID,
                }
                .to_account_metas(None)
                .into_iter()
                .skip(1),
            )
            .chain(proof_metas(intent_hashes, &hyper_prover::ID))
            .collect(),
            data: mock_mailbox::instruction::InboxProcess {
                nonce,
                origin,
                sender,
                destination,
                recipient,
                body,
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[])
    }
}

impl StorageProver<'_> {
    pub fn init(&mut self, oracle: Pubkey, portals: Vec<DestinationPortal>) -> TransactionResult {
        let instruction = Instruction {
            program_id: storage_prover::ID,
            accounts: storage_prover::accounts::Init {
                config: storage_prover::state::Config::pda().0,
                payer: self.payer.pubkey(),
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None),
            data: storage_prover::instruction::Init {
                args: storage_prover::instructions::InitArgs { oracle, portals },
            }
            .data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    /// Writes the block the oracle anchored for `(chain_id, number)`.
    pub fn set_anchored_block(&mut self, oracle: &Pubkey, block: AnchoredBlock) {
        let data = block.try_to_vec().unwrap();
        let account = solana_sdk::account::Account {
            lamports: self.get_sysvar::<Rent>().minimum_balance(data.len()),
            data,
            owner: *oracle,
            executable: false,
            rent_epoch: 0,
        };

        self.set_account(
            AnchoredBlock::pda(oracle, block.chain_id, block.block_number).0,
            account,
        )
        .unwrap();
    }

    pub fn prove_fulfillment(
        &mut self,
        oracle: &Pubkey,
        args: ProveFulfillmentArgs,
    ) -> TransactionResult {
        let instruction = Instruction {
            program_id: storage_prover::ID,
            accounts: storage_prover::accounts::ProveFulfillment {
                payer: self.payer.pubkey(),
                config: storage_prover::state::Config::pda().0,
                anchored_block: AnchoredBlock::pda(oracle, args.destination, args.header.number).0,
                proof: Proof::pda(&args.intent_hash, &storage_prover::ID).0,
                system_program: anchor_lang::system_program::ID,
            }
            .to_account_metas(None),
            data: storage_prover::instruction::ProveFulfillment { args }.data(),
        };

        self.send_instructions(&[instruction], &[])
    }

    pub fn prove_accounts(&self, refundee: Pubkey) -> Vec<AccountMeta> {
        storage_prover::accounts::Prove {
            portal_dispatcher: portal::state::dispatcher_pda().0,
            payer: refundee,
            system_program: anchor_lang::system_program::ID,
        }
        .to_account_metas(None)
        .into_iter()
        .skip(1)
        .collect()
    }
}

fn proof_metas<'a>(
    intent_hashes: &'a [Bytes32],
    prover: &'a Pubkey,
) -> impl Iterator<Item = AccountMeta> + 'a {
    intent_hashes
        .iter()
        .map(move |intent_hash| AccountMeta::new(Proof::pda(intent_hash, prover).0, false))
}
