//! Authentication credential bundle as persisted by the console.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role claim carried by station (device) accounts.
pub const ROLE_DEVICE: &str = "device";

/// Access/refresh token pair with its expiry and role claims.
///
/// `expires_utc` is always UTC. Timestamps written without an offset by
/// older services are read as UTC rather than local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(
        default,
        with = "utc_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_utc: None,
            roles: BTreeSet::new(),
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_expiry(mut self, expires_utc: DateTime<Utc>) -> Self {
        self.expires_utc = Some(expires_utc);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// A blank refresh token counts as absent.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token().is_some()
    }

    /// Station accounts are non-expiring sessions identified by role.
    pub fn is_device_account(&self) -> bool {
        self.roles.contains(ROLE_DEVICE)
    }

    /// Short prefix of the access token, safe for log lines.
    pub fn access_token_preview(&self) -> String {
        self.access_token.chars().take(8).collect()
    }
}

mod utc_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const NAIVE_FORMATS: [&str; 2] =
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn serialize<S>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NAIVE_FORMATS.iter().find_map(|format| {
            NaiveDateTime::parse_from_str(raw, format)
                .ok()
                .map(|naive| naive.and_utc())
        })
    }
}
