//! Session state shared between the token manager and its observers.

use std::sync::Arc;

use fqcs_model::Credential;
use tokio::sync::watch;

/// Result of a login attempt that reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Accepted(Credential),
    Rejected { reason: String },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Accepted(_))
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            LoginOutcome::Accepted(credential) => Some(credential),
            LoginOutcome::Rejected { .. } => None,
        }
    }
}

/// Session transitions published by the token manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    /// `forced` is set when the session ended on its own (expiry or a
    /// failed refresh) rather than by an explicit logout.
    LoggedOut { forced: bool },
}

/// Current credential behind a watch channel; readers never lock.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    sender: Arc<watch::Sender<Option<Credential>>>,
    receiver: watch::Receiver<Option<Credential>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn current(&self) -> Option<Credential> {
        self.receiver.borrow().clone()
    }

    pub fn is_present(&self) -> bool {
        self.receiver.borrow().is_some()
    }

    pub fn with_credential<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Option<&Credential>) -> R,
    {
        f(self.receiver.borrow().as_ref())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.receiver.clone()
    }

    pub fn set(&self, credential: Credential) {
        self.sender.send_replace(Some(credential));
    }

    pub fn clear(&self) {
        self.sender.send_replace(None);
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
