mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use common::{FakeLogin, token_manager};
use fqcs_console::domains::auth::{
    ActionKind, CredentialStorage, LoginOutcome, SessionEvent, TOKEN_GROUP,
};
use fqcs_model::Credential;
use tempfile::tempdir;
use tokio::sync::broadcast::error::TryRecvError;

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

#[tokio::test]
async fn schedule_follows_expiry_and_refresh_token() {
    let dir = tempdir().expect("tempdir");
    let tokens = token_manager(dir.path(), false, Arc::new(FakeLogin::default()));
    let now = Utc::now();

    tokens
        .save_credential(
            Credential::new("a")
                .with_refresh_token("r")
                .with_expiry(now + TimeDelta::minutes(10)),
        )
        .await
        .expect("save");
    let action = tokens.check_token_at(now).expect("refresh planned");
    assert_eq!(action.kind, ActionKind::Refresh);
    assert_eq!(action.fire_after, minutes(5));
    assert_eq!(action.group, TOKEN_GROUP);

    tokens
        .save_credential(Credential::new("a").with_expiry(now + TimeDelta::minutes(3)))
        .await
        .expect("save");
    let action = tokens.check_token_at(now).expect("logout planned");
    assert_eq!(action.kind, ActionKind::Logout);
    assert_eq!(action.fire_after, minutes(3));

    tokens
        .save_credential(
            Credential::new("a")
                .with_refresh_token("r")
                .with_expiry(now - TimeDelta::minutes(1)),
        )
        .await
        .expect("save");
    let action = tokens.check_token_at(now).expect("past expiry still plans");
    assert_eq!(action.fire_after, Duration::ZERO);

    tokens.log_out().await.expect("logout");
}

#[tokio::test]
async fn repeated_checks_leave_one_pending_action() {
    let dir = tempdir().expect("tempdir");
    let tokens = token_manager(dir.path(), false, Arc::new(FakeLogin::default()));
    tokens
        .save_credential(Credential::new("a").with_expiry(Utc::now() + TimeDelta::hours(1)))
        .await
        .expect("save");

    tokens.check_token();
    tokens.check_token();
    tokens.check_token();

    assert_eq!(tokens.registry().live_count(TOKEN_GROUP), 1);
    assert!(tokens.registry().is_pending(TOKEN_GROUP));
    tokens.log_out().await.expect("logout");
}

#[tokio::test]
async fn credential_without_expiry_schedules_nothing() {
    let dir = tempdir().expect("tempdir");
    let tokens = token_manager(dir.path(), false, Arc::new(FakeLogin::default()));
    tokens
        .save_credential(Credential::new("a").with_refresh_token("r"))
        .await
        .expect("save");

    assert!(tokens.check_token().is_none());
    assert_eq!(tokens.registry().live_count(TOKEN_GROUP), 0);
}

#[tokio::test]
async fn log_out_cancels_pending_action_and_deletes_token_file() {
    let dir = tempdir().expect("tempdir");
    let tokens = token_manager(dir.path(), false, Arc::new(FakeLogin::default()));
    let mut events = tokens.subscribe();
    tokens
        .save_credential(Credential::new("a").with_expiry(Utc::now() + TimeDelta::hours(1)))
        .await
        .expect("save");
    tokens.check_token();
    assert!(dir.path().join("token.json").exists());

    tokens.log_out().await.expect("logout");

    assert!(!tokens.is_logged_in());
    assert_eq!(tokens.registry().live_count(TOKEN_GROUP), 0);
    assert!(!dir.path().join("token.json").exists());
    assert_eq!(
        events.recv().await.expect("event"),
        SessionEvent::LoggedOut { forced: false }
    );
}

#[tokio::test]
async fn log_out_while_logged_out_is_quiet() {
    let dir = tempdir().expect("tempdir");
    let tokens = token_manager(dir.path(), false, Arc::new(FakeLogin::default()));
    let mut events = tokens.subscribe();

    tokens.log_out().await.expect("logout");

    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn expiry_without_refresh_token_forces_logout() {
    let dir = tempdir().expect("tempdir");
    let tokens = token_manager(dir.path(), false, Arc::new(FakeLogin::default()));
    tokens
        .save_credential(Credential::new("a").with_expiry(Utc::now() + TimeDelta::minutes(3)))
        .await
        .expect("save");
    let mut events = tokens.subscribe();

    let action = tokens.check_token().expect("scheduled");
    assert_eq!(action.kind, ActionKind::Logout);

    assert_eq!(
        events.recv().await.expect("event"),
        SessionEvent::LoggedOut { forced: true }
    );
    assert!(!tokens.is_logged_in());
    assert!(!dir.path().join("token.json").exists());
}

#[tokio::test(start_paused = true)]
async fn logout_before_deadline_prevents_forced_logout() {
    let dir = tempdir().expect("tempdir");
    let tokens = token_manager(dir.path(), false, Arc::new(FakeLogin::default()));
    tokens
        .save_credential(Credential::new("a").with_expiry(Utc::now() + TimeDelta::minutes(1)))
        .await
        .expect("save");
    let mut events = tokens.subscribe();
    tokens.check_token();

    tokens.log_out().await.expect("logout");
    tokio::time::sleep(minutes(2)).await;

    assert_eq!(
        events.recv().await.expect("event"),
        SessionEvent::LoggedOut { forced: false }
    );
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn refresh_at_lead_time_replaces_credential() {
    let dir = tempdir().expect("tempdir");
    let login = Arc::new(FakeLogin::default());
    *login.refreshed.lock() = Some(
        Credential::new("fresh")
            .with_refresh_token("r2")
            .with_expiry(Utc::now() + TimeDelta::hours(2)),
    );
    let tokens = token_manager(dir.path(), false, Arc::clone(&login));
    tokens
        .save_credential(
            Credential::new("stale")
                .with_refresh_token("r1")
                .with_expiry(Utc::now() + TimeDelta::minutes(6)),
        )
        .await
        .expect("save");
    let mut events = tokens.subscribe();
    tokens.check_token();

    assert_eq!(events.recv().await.expect("event"), SessionEvent::Refreshed);
    assert_eq!(login.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        tokens.current_credential().map(|c| c.access_token),
        Some("fresh".to_string())
    );

    let stored = CredentialStorage::new(dir.path().join("token.json"))
        .load()
        .await
        .expect("read")
        .expect("stored");
    assert_eq!(stored.access_token, "fresh");
    tokens.log_out().await.expect("logout");
}

#[tokio::test]
async fn missing_token_file_starts_logged_out() {
    let dir = tempdir().expect("tempdir");
    let tokens = token_manager(dir.path(), false, Arc::new(FakeLogin::default()));

    assert!(!tokens.initialize().await.expect("initialize"));
    assert!(!tokens.is_logged_in());
    assert!(tokens.check_token().is_none());
}

#[tokio::test]
async fn stored_token_is_restored_on_start() {
    let dir = tempdir().expect("tempdir");
    CredentialStorage::new(dir.path().join("token.json"))
        .save(&Credential::new("persisted").with_role("device"))
        .await
        .expect("seed");

    let tokens = token_manager(dir.path(), false, Arc::new(FakeLogin::default()));
    assert!(tokens.initialize().await.expect("initialize"));
    assert!(tokens.is_logged_in());
    assert_eq!(
        tokens.current_credential().map(|c| c.access_token),
        Some("persisted".to_string())
    );
}

#[tokio::test]
async fn dev_mode_never_schedules_and_logs_in_from_file() {
    let dir = tempdir().expect("tempdir");
    let tokens = token_manager(dir.path(), true, Arc::new(FakeLogin::default()));

    let outcome = tokens.log_in("operator", "secret").await.expect("login");
    assert!(matches!(outcome, LoginOutcome::Rejected { .. }));

    CredentialStorage::new(dir.path().join("dev_token.json"))
        .save(&Credential::new("dev").with_expiry(Utc::now() + TimeDelta::minutes(1)))
        .await
        .expect("seed dev token");
    let outcome = tokens.sign_in("operator", "secret").await.expect("login");
    assert!(outcome.is_success());
    assert!(tokens.is_logged_in());

    assert!(tokens.check_token().is_none());
    assert_eq!(tokens.registry().live_count(TOKEN_GROUP), 0);
}

#[tokio::test]
async fn sign_in_persists_and_schedules() {
    let dir = tempdir().expect("tempdir");
    let login = Arc::new(FakeLogin::default());
    *login.accepted.lock() = Some(
        Credential::new("issued")
            .with_refresh_token("r")
            .with_expiry(Utc::now() + TimeDelta::hours(1)),
    );
    let tokens = token_manager(dir.path(), false, login);
    let mut events = tokens.subscribe();

    let outcome = tokens.sign_in("operator", "secret").await.expect("login");

    assert!(outcome.is_success());
    assert_eq!(events.recv().await.expect("event"), SessionEvent::LoggedIn);
    assert!(dir.path().join("token.json").exists());
    assert!(tokens.registry().is_pending(TOKEN_GROUP));
    tokens.log_out().await.expect("logout");
}

#[tokio::test]
async fn rejected_sign_in_leaves_state_untouched() {
    let dir = tempdir().expect("tempdir");
    let tokens = token_manager(dir.path(), false, Arc::new(FakeLogin::default()));

    let outcome = tokens.sign_in("operator", "wrong").await.expect("login");

    assert_eq!(
        outcome,
        LoginOutcome::Rejected {
            reason: "invalid credentials".into()
        }
    );
    assert!(!tokens.is_logged_in());
    assert!(!dir.path().join("token.json").exists());
}
