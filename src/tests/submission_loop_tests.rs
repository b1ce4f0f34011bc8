//! Submission Loop Tests
//!
//! Retry timing, terminal outcomes and failure swallowing of the
//! rebroadcast/poll loop, under paused tokio time.

use solana_sdk::{signature::Keypair, signer::Signer, transaction::TransactionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::test_helpers::*;
use crate::submission::{NoopObserver, StateEmitter, SubmissionLoop, SubmissionSettings};
use crate::structured_logging::SubmissionLogger;
use crate::test_utils::{sample_skeleton, transport_error, MockRpc, SendScript, StatusScript};
use crate::tx_builder::{sign_skeleton, TransactionBuilderError};
use crate::types::{ConfirmationStatus, SubmissionOperation, SubmissionState};

#[tokio::test(start_paused = true)]
async fn test_pending_then_confirmed_takes_five_intervals() {
    let mut script = vec![StatusScript::Status(ConfirmationStatus::pending(10)); 4];
    script.push(StatusScript::Status(ConfirmationStatus::confirmed(12)));
    let rpc = Arc::new(MockRpc::new().with_status_script(script));
    let payer = Keypair::new();
    let (tx, mut rx) = event_channel();

    let started = Instant::now();
    let signature = lander(&rpc)
        .sign_and_send(sample_skeleton(payer.pubkey()), &[&payer], observer(&tx))
        .await
        .unwrap();

    // Iteration 1 has no signature to poll; polls 1-4 pending, poll 5 confirmed
    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert_eq!(rpc.send_calls(), 6);
    assert_eq!(rpc.status_calls(), 5);

    let events = drain(&mut rx);
    assert_eq!(state_names(&events), ["created", "signed", "sent", "confirmed"]);
    assert!(transient_failures(&events).is_empty());

    let first = decode(&rpc.sent_payloads()[0]);
    assert_eq!(signature, first.signatures[0]);
}

#[tokio::test(start_paused = true)]
async fn test_every_broadcast_is_byte_identical() {
    let rpc = Arc::new(MockRpc::new().with_status_script(vec![
        StatusScript::NotFound,
        StatusScript::NotFound,
        StatusScript::Status(ConfirmationStatus::finalized(40)),
    ]));
    let payer = Keypair::new();

    lander(&rpc)
        .sign_and_send(sample_skeleton(payer.pubkey()), &[&payer], None)
        .await
        .unwrap();

    let payloads = rpc.sent_payloads();
    assert_eq!(payloads.len(), 4);
    assert!(payloads.windows(2).all(|w| w[0] == w[1]));
    assert!(decode(&payloads[0]).verify().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_on_chain_error_stops_immediately() {
    let rpc = Arc::new(MockRpc::new().with_status_script(vec![StatusScript::Status(
        ConfirmationStatus::failed(7, TransactionError::AccountInUse),
    )]));
    let payer = Keypair::new();
    let (tx, mut rx) = event_channel();

    let started = Instant::now();
    let err = lander(&rpc)
        .sign_and_send(sample_skeleton(payer.pubkey()), &[&payer], observer(&tx))
        .await
        .unwrap_err();

    assert_eq!(rpc.send_calls(), 2);
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    match err {
        TransactionBuilderError::OnChain { signature, payload } => {
            assert_eq!(signature, decode(&rpc.sent_payloads()[0]).signatures[0]);
            assert!(payload.contains("AccountInUse"));
        }
        other => panic!("Expected OnChain error, got {other:?}"),
    }

    let events = drain(&mut rx);
    assert_eq!(state_names(&events), ["created", "signed", "sent"]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhaustion_times_out() {
    let rpc = Arc::new(MockRpc::new());
    let payer = Keypair::new();
    let (tx, mut rx) = event_channel();

    let started = Instant::now();
    let err = lander(&rpc)
        .sign_and_send(sample_skeleton(payer.pubkey()), &[&payer], observer(&tx))
        .await
        .unwrap_err();

    // No sleep after the final attempt
    assert_eq!(started.elapsed(), Duration::from_secs(58));
    assert_eq!(rpc.send_calls(), 30);
    assert_eq!(rpc.status_calls(), 29);

    let expected = decode(&rpc.sent_payloads()[0]).signatures[0];
    match err {
        TransactionBuilderError::Timeout {
            signature,
            attempts,
        } => {
            assert_eq!(signature, Some(expected));
            assert_eq!(attempts, 30);
        }
        other => panic!("Expected Timeout, got {other:?}"),
    }

    let events = drain(&mut rx);
    assert!(!state_names(&events).contains(&"confirmed"));
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_swallowed_and_reported() {
    let rpc = Arc::new(
        MockRpc::new()
            .with_send_script(vec![
                SendScript::Fail(transport_error("connection reset")),
                SendScript::Fail(transport_error("connection reset")),
                SendScript::Accept,
            ])
            .with_status_script(vec![
                StatusScript::NotFound,
                StatusScript::Fail(transport_error("timed out")),
                StatusScript::Status(ConfirmationStatus::confirmed(3)),
            ]),
    );
    let payer = Keypair::new();
    let (tx, mut rx) = event_channel();

    let result = lander(&rpc)
        .sign_and_send(sample_skeleton(payer.pubkey()), &[&payer], observer(&tx))
        .await;

    assert!(result.is_ok());
    assert_eq!(rpc.send_calls(), 6);

    let events = drain(&mut rx);
    let failures = transient_failures(&events);
    let operations: Vec<(u32, SubmissionOperation)> =
        failures.iter().map(|f| (f.attempt, f.operation)).collect();
    let expected: Vec<(u32, SubmissionOperation)> = vec![
        (1, SubmissionOperation::Broadcast),
        (2, SubmissionOperation::Broadcast),
        (5, SubmissionOperation::StatusPoll),
    ];
    assert_eq!(operations, expected);
    assert_eq!(state_names(&events), ["created", "signed", "sent", "confirmed"]);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts_the_wait() {
    let rpc = Arc::new(MockRpc::new());
    let payer = Keypair::new();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = lander(&rpc)
        .sign_and_send_with_cancel(sample_skeleton(payer.pubkey()), &[&payer], None, &cancel)
        .await
        .unwrap_err();

    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(rpc.send_calls(), 3);
    match err {
        TransactionBuilderError::Cancelled { signature } => assert!(signature.is_some()),
        other => panic!("Expected Cancelled, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_before_first_broadcast() {
    let rpc = Arc::new(MockRpc::new());
    let payer = Keypair::new();
    let signed = sign_skeleton(&sample_skeleton(payer.pubkey()), &[&payer]).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = lander(&rpc)
        .send_signed(signed, None, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransactionBuilderError::Cancelled { signature: None }
    ));
    assert_eq!(rpc.send_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_loop_with_custom_settings() {
    let rpc = Arc::new(MockRpc::new());
    let payer = Keypair::new();
    let signed = sign_skeleton(&sample_skeleton(payer.pubkey()), &[&payer]).unwrap();
    let settings = SubmissionSettings {
        retry_interval: Duration::from_millis(250),
        max_retries: 4,
        ..Default::default()
    };
    let mut emitter = StateEmitter::new(&NoopObserver);

    let started = Instant::now();
    let err = SubmissionLoop::new(rpc.clone(), signed, settings, SubmissionLogger::new("test"))
        .run(&mut emitter, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(started.elapsed(), Duration::from_millis(750));
    assert_eq!(rpc.send_calls(), 4);
    assert_eq!(err.category(), "timeout");
}

#[test]
fn test_emitter_drops_non_advancing_states() {
    let (tx, mut rx) = event_channel();
    let mut emitter = StateEmitter::new(&tx);
    let signature = solana_sdk::signature::Signature::from([1u8; 64]);

    assert!(emitter.emit(SubmissionState::Created));
    assert!(emitter.emit(SubmissionState::Sent { signature }));
    assert!(!emitter.emit(SubmissionState::Signed));
    assert!(!emitter.emit(SubmissionState::Sent { signature }));

    assert_eq!(state_names(&drain(&mut rx)), ["created", "sent"]);
}
