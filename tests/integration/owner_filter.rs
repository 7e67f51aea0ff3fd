//! Integration tests for owner isolation: a session only ever observes
//! its own tasks, and writes against another user's documents are
//! rejected by the service.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use taskdeck::net::{self, NetCommand, NetConfig, NetEvent};
use taskdeck::tasks::Task;
use taskdeck_emulator::config::EmulatorConfig;
use taskdeck_emulator::server::{self, EmulatorState};
use taskdeck_proto::auth::UserProfile;

async fn start_emulator() -> SocketAddr {
    let state = Arc::new(EmulatorState::from_config(&EmulatorConfig::default()));
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

async fn sign_up(
    cmd_tx: &mpsc::Sender<NetCommand>,
    evt_rx: &mut mpsc::Receiver<NetEvent>,
    email: &str,
) -> UserProfile {
    cmd_tx
        .send(NetCommand::SignUp {
            email: email.to_string(),
            password: "secret1".to_string(),
            display_name: "Tester".to_string(),
        })
        .await
        .unwrap();
    loop {
        match next_event(evt_rx).await {
            NetEvent::SessionChanged { user: Some(user) } => return user,
            NetEvent::AuthRejected { code } => panic!("sign-up rejected: {code}"),
            _ => {}
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
async fn sessions_never_observe_each_others_tasks() {
    let addr = start_emulator().await;

    let (cmd_alice, mut evt_alice) = connect(addr).await;
    let alice = sign_up(&cmd_alice, &mut evt_alice, "alice@example.com").await;
    wait_snapshot_len(&mut evt_alice, 0).await;

    let (cmd_bob, mut evt_bob) = connect(addr).await;
    let bob = sign_up(&cmd_bob, &mut evt_bob, "bob@example.com").await;
    wait_snapshot_len(&mut evt_bob, 0).await;

    cmd_alice
        .send(NetCommand::CreateTask {
            title: "alice's task".to_string(),
        })
        .await
        .unwrap();
    cmd_bob
        .send(NetCommand::CreateTask {
            title: "bob's task".to_string(),
        })
        .await
        .unwrap();

    let alice_tasks = wait_snapshot_len(&mut evt_alice, 1).await;
    let bob_tasks = wait_snapshot_len(&mut evt_bob, 1).await;

    assert!(alice_tasks.iter().all(|t| t.user_id == alice.uid));
    assert!(bob_tasks.iter().all(|t| t.user_id == bob.uid));
    assert!(alice_tasks.iter().all(|t| t.title != "bob's task"));
    assert!(bob_tasks.iter().all(|t| t.title != "alice's task"));

    // Bob never gets a snapshot containing two tasks either.
    let verdict = tokio::time::timeout(Duration::from_millis(300), async {
        loop {
            if let Some(NetEvent::TasksSnapshot { documents }) = evt_bob.recv().await {
                if documents.len() > 1 {
                    return;
                }
            }
        }
    })
    .await;
    assert!(verdict.is_err(), "bob observed a foreign task");
}

#[tokio::test]
async fn writes_to_foreign_documents_are_rejected() {
    let addr = start_emulator().await;

    let (cmd_alice, mut evt_alice) = connect(addr).await;
    sign_up(&cmd_alice, &mut evt_alice, "owner@example.com").await;
    wait_snapshot_len(&mut evt_alice, 0).await;

    cmd_alice
        .send(NetCommand::CreateTask {
            title: "private".to_string(),
        })
        .await
        .unwrap();
    let alice_tasks = wait_snapshot_len(&mut evt_alice, 1).await;
    let target = alice_tasks[0].id.clone();

    let (cmd_eve, mut evt_eve) = connect(addr).await;
    sign_up(&cmd_eve, &mut evt_eve, "eve@example.com").await;
    wait_snapshot_len(&mut evt_eve, 0).await;

    cmd_eve
        .send(NetCommand::ToggleTask {
            id: target.clone(),
            current_completed: false,
        })
        .await
        .unwrap();

    loop {
        match next_event(&mut evt_eve).await {
            NetEvent::MutationFailed { reason } => {
                assert!(reason.contains("permission denied"), "reason: {reason}");
                break;
            }
            NetEvent::TasksSnapshot { documents } => {
                assert!(documents.is_empty(), "eve observed a foreign task");
            }
            _ => {}
        }
    }

    // Alice's task is untouched.
    cmd_alice
        .send(NetCommand::CreateTask {
            title: "second".to_string(),
        })
        .await
        .unwrap();
    let tasks = wait_snapshot_len(&mut evt_alice, 2).await;
    let private = tasks.iter().find(|t| t.title == "private").unwrap();
    assert!(!private.completed);
}

#[tokio::test]
async fn foreign_delete_is_rejected_and_task_survives() {
    let addr = start_emulator().await;

    let (cmd_alice, mut evt_alice) = connect(addr).await;
    sign_up(&cmd_alice, &mut evt_alice, "holder@example.com").await;
    wait_snapshot_len(&mut evt_alice, 0).await;
    cmd_alice
        .send(NetCommand::CreateTask {
            title: "keep me".to_string(),
        })
        .await
        .unwrap();
    let target = wait_snapshot_len(&mut evt_alice, 1).await[0].id.clone();

    let (cmd_eve, mut evt_eve) = connect(addr).await;
    sign_up(&cmd_eve, &mut evt_eve, "intruder@example.com").await;
    wait_snapshot_len(&mut evt_eve, 0).await;

    cmd_eve
        .send(NetCommand::DeleteTask { id: target })
        .await
        .unwrap();
    loop {
        if let NetEvent::MutationFailed { reason } = next_event(&mut evt_eve).await {
            assert!(reason.contains("permission denied"), "reason: {reason}");
            break;
        }
    }

    // The owner still sees the task after a subsequent write round-trips.
    cmd_alice
        .send(NetCommand::CreateTask {
            title: "probe".to_string(),
        })
        .await
        .unwrap();
    let tasks = wait_snapshot_len(&mut evt_alice, 2).await;
    assert!(tasks.iter().any(|t| t.title == "keep me"));
}
