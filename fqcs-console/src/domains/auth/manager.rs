//! Owner of the session credential and its refresh/expiry timer.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fqcs_model::Credential;
use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::domains::auth::errors::AuthResult;
use crate::domains::auth::schedule::{self, ActionKind, ScheduledAction};
use crate::domains::auth::storage::{CredentialStorage, read_credential};
use crate::domains::auth::types::{CredentialStore, LoginOutcome, SessionEvent};
use crate::infrastructure::services::LoginClient;
use crate::infrastructure::task_groups::ThreadGroupRegistry;

/// Registry group holding this manager's single pending action.
pub const TOKEN_GROUP: &str = "token-lifecycle";

const SESSION_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// Development mode: no scheduling, login served from `dev_token_path`.
    pub dev_mode: bool,
    pub api_url: String,
    pub dev_token_path: PathBuf,
}

struct Inner {
    settings: TokenSettings,
    storage: CredentialStorage,
    registry: ThreadGroupRegistry,
    login: Arc<dyn LoginClient>,
    credential: CredentialStore,
    events: broadcast::Sender<SessionEvent>,
    /// Serializes plan-then-register so concurrent checks cannot interleave.
    schedule_lock: Mutex<()>,
    /// Held across every credential write and across logout, so a commit
    /// and a logout never interleave on the token file.
    commit_lock: tokio::sync::Mutex<()>,
}

/// Handle to the session. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct TokenLifecycleManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for TokenLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLifecycleManager")
            .field("settings", &self.inner.settings)
            .field("token_path", &self.inner.storage.path())
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

impl TokenLifecycleManager {
    pub fn new(
        settings: TokenSettings,
        storage: CredentialStorage,
        registry: ThreadGroupRegistry,
        login: Arc<dyn LoginClient>,
    ) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                settings,
                storage,
                registry,
                login,
                credential: CredentialStore::new(),
                events,
                schedule_lock: Mutex::new(()),
                commit_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Load a persisted credential. Returns whether a session was restored;
    /// a missing token file is the logged-out state.
    pub async fn initialize(&self) -> AuthResult<bool> {
        match self.inner.storage.load().await? {
            Some(credential) => {
                info!(
                    "[TokenLifecycle] Restored session {}…",
                    credential.access_token_preview()
                );
                self.inner.credential.set(credential);
                Ok(true)
            }
            None => {
                debug!("[TokenLifecycle] No stored token, starting logged out");
                Ok(false)
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.credential.is_present()
    }

    pub fn is_dev_mode(&self) -> bool {
        self.inner.settings.dev_mode
    }

    pub fn current_credential(&self) -> Option<Credential> {
        self.inner.credential.current()
    }

    pub fn is_device_account(&self) -> bool {
        self.inner
            .credential
            .with_credential(|c| c.is_some_and(Credential::is_device_account))
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credential
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn registry(&self) -> &ThreadGroupRegistry {
        &self.inner.registry
    }

    /// Re-plan the refresh/logout timer against the wall clock.
    pub fn check_token(&self) -> Option<ScheduledAction> {
        self.check_token_at(Utc::now())
    }

    /// Re-plan the timer as of `now`, superseding any pending action.
    ///
    /// Does nothing in development mode, with no credential, or with a
    /// credential that has no expiry.
    pub fn check_token_at(&self, now: DateTime<Utc>) -> Option<ScheduledAction> {
        if self.inner.settings.dev_mode {
            return None;
        }

        let _guard = self.inner.schedule_lock.lock();
        let credential = self.inner.credential.current()?;
        let action = schedule::plan(TOKEN_GROUP, &credential, now)?;

        // Registration cancels whatever the group held before.
        let manager = self.clone();
        let kind = action.kind;
        self.inner
            .registry
            .register(TOKEN_GROUP, action.fire_after, move |token| async move {
                manager.fire(kind, token).await;
            });

        match kind {
            ActionKind::Refresh => info!(
                "[TokenLifecycle] Refresh token in {} mins",
                action.fire_after.as_secs() / 60
            ),
            ActionKind::Logout => info!(
                "[TokenLifecycle] Session expires in {} mins",
                action.fire_after.as_secs() / 60
            ),
        }
        Some(action)
    }

    /// Ask the service for a credential. Does not change session state;
    /// see [`Self::sign_in`] for the full flow.
    pub async fn log_in(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<LoginOutcome> {
        if self.inner.settings.dev_mode {
            let path = &self.inner.settings.dev_token_path;
            return Ok(match read_credential(path).await? {
                Some(credential) => {
                    debug!("[TokenLifecycle] Dev mode login from {}", path.display());
                    LoginOutcome::Accepted(credential)
                }
                None => LoginOutcome::Rejected {
                    reason: format!("dev token file {} not found", path.display()),
                },
            });
        }

        self.inner
            .login
            .login(&self.inner.settings.api_url, username, password)
            .await
    }

    /// Log in, and on success persist the credential, start its timer and
    /// announce the new session.
    pub async fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<LoginOutcome> {
        let outcome = self.log_in(username, password).await?;
        match &outcome {
            LoginOutcome::Accepted(credential) => {
                self.save_credential(credential.clone()).await?;
                self.check_token();
                let _ = self.inner.events.send(SessionEvent::LoggedIn);
            }
            LoginOutcome::Rejected { reason } => {
                warn!("[TokenLifecycle] Login failed: {reason}");
            }
        }
        Ok(outcome)
    }

    /// Replace the in-memory credential and overwrite the token file.
    pub async fn save_credential(&self, credential: Credential) -> AuthResult<()> {
        let _commit = self.inner.commit_lock.lock().await;
        self.commit(credential).await
    }

    async fn commit(&self, credential: Credential) -> AuthResult<()> {
        self.inner.credential.set(credential.clone());
        self.inner.storage.save(&credential).await
    }

    /// Cancel the pending action and end the session if there is one.
    pub async fn log_out(&self) -> AuthResult<()> {
        self.end_session(false).await
    }

    async fn end_session(&self, forced: bool) -> AuthResult<()> {
        self.inner.registry.cancel(TOKEN_GROUP);
        let _commit = self.inner.commit_lock.lock().await;
        if !self.is_logged_in() {
            return Ok(());
        }

        let deleted = self.inner.storage.delete().await;
        self.inner.credential.clear();
        let _ = self.inner.events.send(SessionEvent::LoggedOut { forced });
        info!("[TokenLifecycle] Logged out (forced: {forced})");
        deleted
    }

    async fn fire(&self, kind: ActionKind, token: CancellationToken) {
        match kind {
            ActionKind::Refresh => self.refresh(&token).await,
            ActionKind::Logout => {
                info!("[TokenLifecycle] Token expired");
                self.force_logout(&token).await;
            }
        }
    }

    async fn refresh(&self, token: &CancellationToken) {
        let Some(refresh_token) = self
            .inner
            .credential
            .with_credential(|c| c.and_then(Credential::refresh_token).map(str::to_owned))
        else {
            self.force_logout(token).await;
            return;
        };

        let result = self
            .inner
            .login
            .refresh(&self.inner.settings.api_url, &refresh_token)
            .await;
        match result {
            Ok(credential) => {
                {
                    // A logout that cancelled us may already hold the lock;
                    // once it is ours the token says whether it did.
                    let _commit = self.inner.commit_lock.lock().await;
                    if token.is_cancelled() {
                        debug!("[TokenLifecycle] Refresh result dropped, action was cancelled");
                        return;
                    }
                    if let Err(e) = self.commit(credential).await {
                        warn!("[TokenLifecycle] Failed to persist refreshed token: {e}");
                    }
                    let _ = self.inner.events.send(SessionEvent::Refreshed);
                }
                info!("[TokenLifecycle] Token refreshed");
                self.check_token();
            }
            Err(e) => {
                warn!("[TokenLifecycle] Refresh failed: {e}");
                self.force_logout(token).await;
            }
        }
    }

    async fn force_logout(&self, token: &CancellationToken) {
        if token.is_cancelled() {
            return;
        }
        if let Err(e) = self.end_session(true).await {
            warn!("[TokenLifecycle] Forced logout left token file behind: {e}");
        }
    }
}
