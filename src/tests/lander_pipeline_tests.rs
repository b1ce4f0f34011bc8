//! Lander Pipeline Tests
//!
//! Budgeting, signing and event ordering through `sign_and_send`.

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::test_helpers::*;
use crate::submission::{StateCallback, SubmissionObserver};
use crate::test_utils::{sample_skeleton, MockRpc, StatusScript};
use crate::tx_builder::{budget_instructions, TransactionBuilderError};
use crate::types::{
    ComputeBudget, ConfirmationStatus, PriorityFeeSample, SubmissionState, TransactionSkeleton,
};

fn confirming_rpc() -> MockRpc {
    MockRpc::new().with_status_script(vec![StatusScript::Status(ConfirmationStatus::confirmed(1))])
}

#[tokio::test(start_paused = true)]
async fn test_broadcast_carries_fresh_budget_and_blockhash() {
    let rpc = Arc::new(
        confirming_rpc()
            .with_simulated_units(Some(200_000))
            .with_fee_samples(vec![
                PriorityFeeSample { slot: 1, fee: 12_000 },
                PriorityFeeSample { slot: 2, fee: 90_000 },
            ]),
    );
    let payer = Keypair::new();
    let mut skeleton = sample_skeleton(payer.pubkey());
    skeleton
        .instructions
        .insert(0, ComputeBudgetInstruction::set_compute_unit_price(1));
    let program_ix = skeleton.instructions[1].clone();

    lander(&rpc)
        .sign_and_send(skeleton, &[&payer], None)
        .await
        .unwrap();

    let sent = decode(&rpc.sent_payloads()[0]);
    assert_eq!(sent.message.recent_blockhash, rpc.blockhash());

    let rebuilt = crate::compat::decompile_instructions(&sent.message).unwrap();
    let expected_budget = ComputeBudget {
        unit_limit: 240_000,
        micro_lamport_price: 90_000,
    };
    assert_eq!(rebuilt.len(), 3);
    assert_eq!(rebuilt[..2], budget_instructions(&expected_budget));
    assert_eq!(rebuilt[2].program_id, program_ix.program_id);
    assert_eq!(rebuilt[2].data, program_ix.data);
}

#[tokio::test(start_paused = true)]
async fn test_two_signers_fill_both_slots() {
    let rpc = Arc::new(confirming_rpc());
    let payer = Keypair::new();
    let cosigner = Keypair::new();
    let skeleton = TransactionSkeleton::new(payer.pubkey(), Default::default()).with_instruction(
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[42],
            vec![AccountMeta::new(cosigner.pubkey(), true)],
        ),
    );

    let signature = lander(&rpc)
        .sign_and_send(skeleton, &[&cosigner, &payer], None)
        .await
        .unwrap();

    let sent = decode(&rpc.sent_payloads()[0]);
    assert_eq!(sent.signatures.len(), 2);
    assert!(sent.verify().is_ok());
    assert_eq!(sent.message.account_keys[0], payer.pubkey());
    assert_eq!(signature, sent.signatures[0]);
}

#[tokio::test(start_paused = true)]
async fn test_estimation_failure_emits_nothing() {
    let rpc = Arc::new(MockRpc::new().with_fee_samples(vec![]));
    let payer = Keypair::new();
    let (tx, mut rx) = event_channel();

    let err = lander(&rpc)
        .sign_and_send(sample_skeleton(payer.pubkey()), &[&payer], observer(&tx))
        .await
        .unwrap_err();

    assert!(matches!(err, TransactionBuilderError::Estimation(_)));
    assert!(drain(&mut rx).is_empty());
    assert_eq!(rpc.send_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_signing_failure_never_broadcasts() {
    let rpc = Arc::new(MockRpc::new());
    let payer = Keypair::new();
    let stranger = Keypair::new();
    let (tx, mut rx) = event_channel();

    let err = lander(&rpc)
        .sign_and_send(sample_skeleton(payer.pubkey()), &[&payer, &stranger], observer(&tx))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "signing");
    assert_eq!(state_names(&drain(&mut rx)), ["created"]);
    assert_eq!(rpc.send_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_state_callback_observer() {
    let rpc = Arc::new(confirming_rpc());
    let payer = Keypair::new();
    let seen = Mutex::new(Vec::new());
    let callback = StateCallback(|state: &SubmissionState| {
        seen.lock().unwrap().push(state.to_string());
    });

    let observer: &dyn SubmissionObserver = &callback;

    let signature = lander(&rpc)
        .sign_and_send(sample_skeleton(payer.pubkey()), &[&payer], Some(observer))
        .await
        .unwrap();

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0], "created");
    assert_eq!(seen[1], "signed");
    assert_eq!(seen[2], format!("sent({signature})"));
    assert_eq!(seen[3], format!("confirmed({signature}, confirmed)"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_submissions_are_independent() {
    let rpc = Arc::new(confirming_rpc());
    let lander = lander(&rpc);
    let payers: Vec<Keypair> = (0..4).map(|_| Keypair::new()).collect();

    let results = futures::future::join_all(payers.iter().map(|payer| {
        let lander = &lander;
        async move {
            lander
                .sign_and_send(sample_skeleton(payer.pubkey()), &[payer], None)
                .await
        }
    }))
    .await;

    let signatures: HashSet<_> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(signatures.len(), 4);
    assert_eq!(rpc.send_calls(), 8);
}
