//! Refresh/expiry timing for a credential.

use std::time::Duration;

use chrono::{DateTime, Utc};
use fqcs_model::Credential;

/// Lead time before expiry at which a refresh is attempted.
pub const REFRESH_LEAD: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Refresh,
    Logout,
}

/// One pending token action, as registered with the task registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAction {
    pub group: String,
    pub fire_after: Duration,
    pub kind: ActionKind,
}

/// Time remaining until expiry and until the refresh point, both clamped
/// at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWindow {
    pub until_expiry: Duration,
    pub until_refresh: Duration,
}

impl ExpiryWindow {
    pub fn compute(expires_utc: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        // Negative differences (clock skew, stale file) map to zero.
        let until_expiry = (expires_utc - now).to_std().unwrap_or(Duration::ZERO);
        let until_refresh = until_expiry.saturating_sub(REFRESH_LEAD);
        Self {
            until_expiry,
            until_refresh,
        }
    }

    pub fn minutes_until_expiry(&self) -> u64 {
        self.until_expiry.as_secs() / 60
    }

    pub fn minutes_until_refresh(&self) -> u64 {
        self.until_refresh.as_secs() / 60
    }
}

/// Decide the single action to schedule for `credential`, if any.
///
/// Credentials without an expiry never schedule anything. With a refresh
/// token the action is a refresh at the refresh point; without one it is
/// a logout at expiry.
pub fn plan(
    group: &str,
    credential: &Credential,
    now: DateTime<Utc>,
) -> Option<ScheduledAction> {
    let expires_utc = credential.expires_utc?;
    let window = ExpiryWindow::compute(expires_utc, now);

    let (kind, fire_after) = if credential.has_refresh_token() {
        (ActionKind::Refresh, window.until_refresh)
    } else {
        (ActionKind::Logout, window.until_expiry)
    };

    Some(ScheduledAction {
        group: group.to_string(),
        fire_after,
        kind,
    })
}
