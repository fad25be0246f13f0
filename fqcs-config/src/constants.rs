//! Default values and environment keys.

pub const CONFIG_FILE_NAME: &str = "fqcs.toml";
pub const TOKEN_FILE_NAME: &str = "token.json";
pub const DEV_TOKEN_FILE_NAME: &str = "dev_token.json";
pub const CAMERA_DIR_NAME: &str = "cameras";

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_CAPTURE_PERIOD_MS: u64 = 20;
pub const DEFAULT_REQUEST_TIMEOUT_S: u64 = 15;

/// Accepted range for the capture tick period.
pub const CAPTURE_PERIOD_RANGE_MS: std::ops::RangeInclusive<u64> = 1..=1000;

pub mod env {
    pub const DEV: &str = "FQCS_DEV";
    pub const API_URL: &str = "FQCS_API_URL";
    pub const TOKEN_PATH: &str = "FQCS_TOKEN_PATH";
    pub const DEV_TOKEN_PATH: &str = "FQCS_DEV_TOKEN_PATH";
    pub const REQUEST_TIMEOUT_S: &str = "FQCS_REQUEST_TIMEOUT_S";
    pub const CAPTURE_PERIOD_MS: &str = "FQCS_CAPTURE_PERIOD_MS";
    pub const CAMERA_INDEX: &str = "FQCS_CAMERA_INDEX";
    pub const CAMERA_ROOT: &str = "FQCS_CAMERA_ROOT";
    pub const CONFIG_FOLDER: &str = "FQCS_CONFIG_FOLDER";
}
