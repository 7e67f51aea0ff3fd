//! Integration tests for the task CRUD contract: creation defaults,
//! double-toggle round trip, idempotent delete, and title-only edits —
//! each observed purely through pushed snapshots, never through replies.

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

/// Waits for a snapshot with exactly `len` tasks and parses it.
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
async fn create_yields_one_task_with_defaults_and_server_timestamp() {
    let addr = start_emulator().await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;
    let user = sign_up(&cmd_tx, &mut evt_rx, "create@example.com").await;
    wait_snapshot_len(&mut evt_rx, 0).await;

    cmd_tx
        .send(NetCommand::CreateTask {
            title: "write the report".to_string(),
        })
        .await
        .unwrap();

    let tasks = wait_snapshot_len(&mut evt_rx, 1).await;
    assert_eq!(tasks[0].title, "write the report");
    assert!(!tasks[0].completed);
    assert_eq!(tasks[0].user_id, user.uid);
    assert!(tasks[0].created_at.as_millis() > 0, "server assigns the timestamp");
}

#[tokio::test]
async fn toggle_twice_returns_to_original_value() {
    let addr = start_emulator().await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;
    sign_up(&cmd_tx, &mut evt_rx, "toggle@example.com").await;
    wait_snapshot_len(&mut evt_rx, 0).await;

    cmd_tx
        .send(NetCommand::CreateTask {
            title: "flip me".to_string(),
        })
        .await
        .unwrap();
    let tasks = wait_snapshot_len(&mut evt_rx, 1).await;
    let task = &tasks[0];
    assert!(!task.completed);

    // First toggle, awaited through its snapshot.
    cmd_tx
        .send(NetCommand::ToggleTask {
            id: task.id.clone(),
            current_completed: task.completed,
        })
        .await
        .unwrap();
    let tasks = loop {
        let tasks = wait_snapshot_len(&mut evt_rx, 1).await;
        if tasks[0].completed {
            break tasks;
        }
    };

    // Second toggle from the observed value.
    cmd_tx
        .send(NetCommand::ToggleTask {
            id: tasks[0].id.clone(),
            current_completed: tasks[0].completed,
        })
        .await
        .unwrap();
    loop {
        let tasks = wait_snapshot_len(&mut evt_rx, 1).await;
        if !tasks[0].completed {
            break;
        }
    }
}

#[tokio::test]
async fn delete_removes_exactly_that_task_and_repeat_is_noop() {
    let addr = start_emulator().await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;
    sign_up(&cmd_tx, &mut evt_rx, "delete@example.com").await;
    wait_snapshot_len(&mut evt_rx, 0).await;

    cmd_tx
        .send(NetCommand::CreateTask {
            title: "keep".to_string(),
        })
        .await
        .unwrap();
    wait_snapshot_len(&mut evt_rx, 1).await;
    cmd_tx
        .send(NetCommand::CreateTask {
            title: "doomed".to_string(),
        })
        .await
        .unwrap();
    let tasks = wait_snapshot_len(&mut evt_rx, 2).await;
    let doomed = tasks
        .iter()
        .find(|t| t.title == "doomed")
        .expect("created task present")
        .clone();

    cmd_tx
        .send(NetCommand::DeleteTask {
            id: doomed.id.clone(),
        })
        .await
        .unwrap();
    let remaining = wait_snapshot_len(&mut evt_rx, 1).await;
    assert!(remaining.iter().all(|t| t.id != doomed.id));
    assert_eq!(remaining[0].title, "keep");

    // Repeating the delete is a no-op: no error event arrives.
    cmd_tx
        .send(NetCommand::DeleteTask { id: doomed.id })
        .await
        .unwrap();
    let verdict = tokio::time::timeout(Duration::from_millis(300), async {
        loop {
            match evt_rx.recv().await {
                Some(NetEvent::MutationFailed { reason }) => return reason,
                Some(_) => {}
                None => panic!("event channel closed"),
            }
        }
    })
    .await;
    assert!(verdict.is_err(), "repeated delete surfaced an error");
}

#[tokio::test]
async fn edit_changes_only_the_title() {
    let addr = start_emulator().await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;
    sign_up(&cmd_tx, &mut evt_rx, "edit@example.com").await;
    wait_snapshot_len(&mut evt_rx, 0).await;

    cmd_tx
        .send(NetCommand::CreateTask {
            title: "before".to_string(),
        })
        .await
        .unwrap();
    let before = wait_snapshot_len(&mut evt_rx, 1).await.remove(0);

    cmd_tx
        .send(NetCommand::RenameTask {
            id: before.id.clone(),
            title: "  after  ".to_string(),
        })
        .await
        .unwrap();

    let after = loop {
        let tasks = wait_snapshot_len(&mut evt_rx, 1).await;
        if tasks[0].title != "before" {
            break tasks.into_iter().next().unwrap();
        }
    };
    // Title is stored trimmed; everything else is untouched.
    assert_eq!(after.title, "after");
    assert_eq!(after.id, before.id);
    assert_eq!(after.user_id, before.user_id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.completed, before.completed);
}

#[tokio::test]
async fn tasks_are_ordered_newest_first() {
    let addr = start_emulator().await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;
    sign_up(&cmd_tx, &mut evt_rx, "order@example.com").await;
    wait_snapshot_len(&mut evt_rx, 0).await;

    for title in ["first", "second", "third"] {
        cmd_tx
            .send(NetCommand::CreateTask {
                title: title.to_string(),
            })
            .await
            .unwrap();
    }

    let tasks = wait_snapshot_len(&mut evt_rx, 3).await;
    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
    assert!(tasks[0].created_at >= tasks[1].created_at);
    assert!(tasks[1].created_at >= tasks[2].created_at);
}
