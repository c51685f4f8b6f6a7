use anchor_lang::prelude::*;
use derive_new::new;
use routes_std::Bytes32;

use crate::types::{Reward, Route};

#[event]
#[derive(new)]
pub struct IntentPublished {
    intent_hash: Bytes32,
    route: Route,
    reward: Reward,
}

#[event]
#[derive(new)]
pub struct IntentFunded {
    intent_hash: Bytes32,
    funder: Pubkey,
    complete: bool,
}

#[event]
#[derive(new)]
pub struct IntentRefunded {
    intent_hash: Bytes32,
    refundee: Pubkey,
}

#[event]
#[derive(new)]
pub struct IntentWithdrawn {
    intent_hash: Bytes32,
    claimant: Pubkey,
}

#[event]
#[derive(new)]
pub struct IntentWithdrawalFailed {
    intent_hash: Bytes32,
}

#[event]
#[derive(new)]
pub struct IntentTokenRecovered {
    intent_hash: Bytes32,
    token: Pubkey,
    amount: u64,
}

#[event]
#[derive(new)]
pub struct IntentFulfilled {
    intent_hash: Bytes32,
    claimant: Pubkey,
}

#[event]
#[derive(new)]
pub struct IntentReadyToProve {
    intent_hash: Bytes32,
    source: u64,
    claimant: Pubkey,
}

#[event]
#[derive(new)]
pub struct IntentAddedToBatch {
    intent_hash: Bytes32,
    prover: Pubkey,
    source: u64,
}

#[event]
#[derive(new)]
pub struct IntentNotFulfilledSkipped {
    intent_hash: Bytes32,
}

#[event]
#[derive(new)]
pub struct ConfigInitialized {
    owner: Pubkey,
    solving_public: bool,
}

#[event]
#[derive(new)]
pub struct SolvingMadePublic {}

#[event]
#[derive(new)]
pub struct SolverWhitelistChanged {
    solver: Pubkey,
    can_solve: bool,
}
