//! Integration tests for the identity flow: sign-up validation, federated
//! sign-in, session resolution, and sign-out semantics, against an
//! in-process emulator.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use taskdeck::net::{self, NetCommand, NetConfig, NetEvent};
use taskdeck_emulator::config::EmulatorConfig;
use taskdeck_emulator::server::{self, EmulatorState};
use taskdeck_proto::auth::{AuthErrorCode, UserProfile};

async fn start_emulator_with(config: EmulatorConfig) -> SocketAddr {
    let state = Arc::new(EmulatorState::from_config(&config));
    let (addr, _handle) = server::start_server("127.0.0.1:0", state)
        .await
        .expect("emulator should bind");
    addr
}

async fn start_emulator() -> SocketAddr {
    start_emulator_with(EmulatorConfig::default()).await
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

/// Drives a sign-up and returns the profile once the display name from
/// the follow-up profile update has round-tripped.
async fn sign_up(
    cmd_tx: &mpsc::Sender<NetCommand>,
    evt_rx: &mut mpsc::Receiver<NetEvent>,
    email: &str,
    name: &str,
) -> UserProfile {
    cmd_tx
        .send(NetCommand::SignUp {
            email: email.to_string(),
            password: "secret1".to_string(),
            display_name: name.to_string(),
        })
        .await
        .expect("command channel open");
    loop {
        match next_event(evt_rx).await {
            NetEvent::SessionChanged { user: Some(user) }
                if user.display_name.as_deref() == Some(name) =>
            {
                return user;
            }
            NetEvent::AuthRejected { code } => panic!("sign-up rejected: {code}"),
            _ => {}
        }
    }
}

#[tokio::test]
async fn initial_session_resolves_signed_out() {
    let addr = start_emulator().await;
    let (_cmd_tx, mut evt_rx) = connect(addr).await;

    match next_event(&mut evt_rx).await {
        NetEvent::SessionChanged { user } => assert!(user.is_none()),
        other => panic!("expected initial SessionChanged, got {other:?}"),
    }
}

#[tokio::test]
async fn sign_up_resolves_session_with_profile() {
    let addr = start_emulator().await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;

    let user = sign_up(&cmd_tx, &mut evt_rx, "alice@example.com", "Alice").await;
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.display_name.as_deref(), Some("Alice"));
    assert!(!user.uid.is_empty());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let addr = start_emulator().await;

    let (cmd_a, mut evt_a) = connect(addr).await;
    sign_up(&cmd_a, &mut evt_a, "taken@example.com", "First").await;

    let (cmd_b, mut evt_b) = connect(addr).await;
    cmd_b
        .send(NetCommand::SignUp {
            email: "taken@example.com".to_string(),
            password: "secret1".to_string(),
            display_name: "Second".to_string(),
        })
        .await
        .unwrap();

    loop {
        match next_event(&mut evt_b).await {
            NetEvent::AuthRejected { code } => {
                assert_eq!(code, AuthErrorCode::EmailAlreadyRegistered);
                break;
            }
            NetEvent::SessionChanged { user: Some(_) } => panic!("duplicate sign-up succeeded"),
            _ => {}
        }
    }
}

#[tokio::test]
async fn malformed_email_is_rejected() {
    let addr = start_emulator().await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;

    cmd_tx
        .send(NetCommand::SignUp {
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
            display_name: "X".to_string(),
        })
        .await
        .unwrap();

    loop {
        match next_event(&mut evt_rx).await {
            NetEvent::AuthRejected { code } => {
                assert_eq!(code, AuthErrorCode::MalformedEmail);
                break;
            }
            NetEvent::SessionChanged { user: Some(_) } => panic!("malformed email accepted"),
            _ => {}
        }
    }
}

#[tokio::test]
async fn weak_password_is_rejected() {
    let addr = start_emulator().await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;

    cmd_tx
        .send(NetCommand::SignUp {
            email: "weak@example.com".to_string(),
            password: "short".to_string(),
            display_name: "X".to_string(),
        })
        .await
        .unwrap();

    loop {
        match next_event(&mut evt_rx).await {
            NetEvent::AuthRejected { code } => {
                assert_eq!(code, AuthErrorCode::WeakPassword);
                break;
            }
            NetEvent::SessionChanged { user: Some(_) } => panic!("weak password accepted"),
            _ => {}
        }
    }
}

#[tokio::test]
async fn federated_sign_in_resolves_session() {
    let addr = start_emulator().await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;

    cmd_tx.send(NetCommand::SignInFederated).await.unwrap();

    loop {
        match next_event(&mut evt_rx).await {
            NetEvent::SessionChanged { user: Some(user) } => {
                assert_eq!(user.email, "demo.user@example.com");
                break;
            }
            NetEvent::AuthRejected { code } => panic!("federated sign-in rejected: {code}"),
            _ => {}
        }
    }
}

#[tokio::test]
async fn blocked_popup_surfaces_error_code() {
    let addr = start_emulator_with(EmulatorConfig {
        popup_blocked: true,
        ..EmulatorConfig::default()
    })
    .await;
    let (cmd_tx, mut evt_rx) = connect(addr).await;

    cmd_tx.send(NetCommand::SignInFederated).await.unwrap();

    loop {
        match next_event(&mut evt_rx).await {
            NetEvent::AuthRejected { code } => {
                assert_eq!(code, AuthErrorCode::PopupBlocked);
                break;
            }
            NetEvent::SessionChanged { user: Some(_) } => panic!("blocked popup signed in"),
            _ => {}
        }
    }
}

#[tokio::test]
async fn sign_out_clears_session_and_stops_snapshots() {
    let addr = start_emulator().await;

    // Two connections to the same federated account.
    let (cmd_a, mut evt_a) = connect(addr).await;
    cmd_a.send(NetCommand::SignInFederated).await.unwrap();
    loop {
        if matches!(
            next_event(&mut evt_a).await,
            NetEvent::TasksSnapshot { .. }
        ) {
            break; // initial snapshot: subscription is live
        }
    }

    cmd_a.send(NetCommand::SignOut).await.unwrap();
    loop {
        match next_event(&mut evt_a).await {
            NetEvent::SessionChanged { user: None } => break,
            NetEvent::SessionChanged { user: Some(_) } => {}
            _ => {}
        }
    }

    // A second connection to the same account writes a task.
    let (cmd_b, mut evt_b) = connect(addr).await;
    cmd_b.send(NetCommand::SignInFederated).await.unwrap();
    loop {
        if matches!(
            next_event(&mut evt_b).await,
            NetEvent::TasksSnapshot { .. }
        ) {
            break;
        }
    }
    cmd_b
        .send(NetCommand::CreateTask {
            title: "after sign-out".to_string(),
        })
        .await
        .unwrap();
    loop {
        if let NetEvent::TasksSnapshot { documents } = next_event(&mut evt_b).await {
            if documents.len() == 1 {
                break;
            }
        }
    }

    // The signed-out connection must not receive that snapshot.
    let quiet = tokio::time::timeout(Duration::from_millis(300), async {
        loop {
            if let Some(NetEvent::TasksSnapshot { .. }) = evt_a.recv().await {
                return;
            }
        }
    })
    .await;
    assert!(quiet.is_err(), "snapshot delivered after sign-out");
}
