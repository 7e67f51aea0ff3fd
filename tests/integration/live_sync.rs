//! Integration tests for the live subscription contract: full-snapshot
//! replacement, cross-connection propagation, and the missing-index
//! failure surface.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use taskdeck::net::{self, NetCommand, NetConfig, NetEvent};
use taskdeck::tasks::Task;
use taskdeck_emulator::config::EmulatorConfig;
use taskdeck_emulator::server::{self, EmulatorState};

async fn start_emulator_with(config: EmulatorConfig) -> SocketAddr {
    let state = Arc::new(EmulatorState::from_config(&config));
    let (addr, _handle) = server::start_server("127.0.0.1:0", state)
        .await
        .expect("emulator should bind");
    addr
}

async fn connect(addr: SocketAddr) -> (mpsc::Sender<NetCommand>, mpsc::Receiver<NetEvent>) {
    net::spawn_net(NetConfig::new(format!("ws://{addr}/ws")))
        .await
        .expect("client should connect")
}

async fn next_event(rx: &mut mpsc::Receiver<NetEvent>) -> NetEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Signs into the shared federated account and waits for the initial
/// snapshot, returning its parsed contents.
async fn federated_session(
    cmd_tx: &mpsc::Sender<NetCommand>,
    evt_rx: &mut mpsc::Receiver<NetEvent>,
) -> Vec<Task> {
    cmd_tx.send(NetCommand::SignInFederated).await.unwrap();
    loop {
        if let NetEvent::TasksSnapshot { documents } = next_event(evt_rx).await {
            return documents
                .iter()
                .map(|d| Task::from_document(d).expect("snapshot document parses as task"))
                .collect();
        }
    }
}

async fn wait_snapshot_len(evt_rx: &mut mpsc::Receiver<NetEvent>, len: usize) -> Vec<Task> {
    loop {
        if let NetEvent::TasksSnapshot { documents } = next_event(evt_rx).await {
            if documents.len() == len {
                return documents
                    .iter()
                    .map(|d| Task::from_document(d).expect("snapshot document parses as task"))
                    .collect();
            }
        }
    }
}

#[tokio::test]
async fn writes_propagate_to_every_live_subscription() {
    let addr = start_emulator_with(EmulatorConfig::default()).await;

    // Two connections signed into the same federated account.
    let (cmd_a, mut evt_a) = connect(addr).await;
    federated_session(&cmd_a, &mut evt_a).await;
    let (cmd_b, mut evt_b) = connect(addr).await;
    federated_session(&cmd_b, &mut evt_b).await;

    cmd_a
        .send(NetCommand::CreateTask {
            title: "shared".to_string(),
        })
        .await
        .unwrap();

    let seen_a = wait_snapshot_len(&mut evt_a, 1).await;
    let seen_b = wait_snapshot_len(&mut evt_b, 1).await;
    assert_eq!(seen_a[0].title, "shared");
    assert_eq!(seen_b[0].id, seen_a[0].id);

    // A toggle from the other connection comes back to both.
    cmd_b
        .send(NetCommand::ToggleTask {
            id: seen_b[0].id.clone(),
            current_completed: seen_b[0].completed,
        })
        .await
        .unwrap();
    loop {
        let tasks = wait_snapshot_len(&mut evt_a, 1).await;
        if tasks[0].completed {
            break;
        }
    }
}

#[tokio::test]
async fn each_snapshot_is_the_full_result_set() {
    let addr = start_emulator_with(EmulatorConfig::default()).await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;
    federated_session(&cmd_tx, &mut evt_rx).await;

    // Sizes grow one at a time: every snapshot carries the whole list.
    for (i, title) in ["one", "two", "three"].iter().enumerate() {
        cmd_tx
            .send(NetCommand::CreateTask {
                title: (*title).to_string(),
            })
            .await
            .unwrap();
        let tasks = wait_snapshot_len(&mut evt_rx, i + 1).await;
        assert_eq!(tasks.len(), i + 1);
    }

    // And it shrinks the same way.
    let tasks = wait_snapshot_len(&mut evt_rx, 3).await;
    cmd_tx
        .send(NetCommand::DeleteTask {
            id: tasks[0].id.clone(),
        })
        .await
        .unwrap();
    let remaining = wait_snapshot_len(&mut evt_rx, 2).await;
    assert!(remaining.iter().all(|t| t.id != tasks[0].id));
}

#[tokio::test]
async fn missing_composite_index_fails_the_subscription() {
    // An emulator with no registered indexes cannot serve the task query.
    let addr = start_emulator_with(EmulatorConfig {
        composite_indexes: Vec::new(),
        ..EmulatorConfig::default()
    })
    .await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;

    cmd_tx.send(NetCommand::SignInFederated).await.unwrap();

    loop {
        match next_event(&mut evt_rx).await {
            NetEvent::SubscriptionFailed { reason } => {
                assert!(reason.contains("composite index"), "reason: {reason}");
                break;
            }
            NetEvent::TasksSnapshot { .. } => {
                panic!("query served without its composite index")
            }
            _ => {}
        }
    }
}
