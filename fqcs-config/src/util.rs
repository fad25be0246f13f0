use std::path::PathBuf;
use std::str::FromStr;

use crate::loader::error::ConfigLoadError;

/// Parse a boolean value from a raw string, accepting common env-style forms.
///
/// Accepted truthy values (case-insensitive): `"1"`, `"true"`, `"yes"`, `"on"`.
/// Accepted falsy values: `"0"`, `"false"`, `"no"`, `"off"`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Look up a non-blank variable through `lookup`.
pub fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

pub fn bool_var<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(raw) => parse_bool(&raw).map(Some).ok_or(
            ConfigLoadError::InvalidValue {
                key,
                value: raw,
                reason: "expected 1/0, true/false, yes/no or on/off",
            },
        ),
        None => Ok(None),
    }
}

pub fn number_var<F, T>(
    lookup: &F,
    key: &'static str,
) -> Result<Option<T>, ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup, key) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigLoadError::InvalidValue {
                key,
                value: raw,
                reason: "expected an unsigned integer",
            }
        }),
        None => Ok(None),
    }
}

pub fn path_var<F>(lookup: &F, key: &str) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key).map(|raw| PathBuf::from(raw.trim()))
}
