use serde::Deserialize;

use crate::utils::auth::{ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER};

#[derive(Debug, Deserialize, Clone)]
pub(crate) struct Args {
    #[serde(default = "default_log_level")]
    pub(crate) log_level: String,
    #[serde(default = "default_port")]
    pub(crate) port: u16,
    pub(crate) private_key_path: String,
    pub(crate) public_key_path: String,
    #[serde(default)]
    pub(crate) issuer: String,
    #[serde(default)]
    pub(crate) audience: String,
    #[serde(default = "default_access_token_ttl")]
    pub(crate) access_token_ttl: i64,
    #[serde(default = "default_refresh_token_ttl")]
    pub(crate) refresh_token_ttl: i64,
    #[serde(default = "default_access_token_header")]
    pub(crate) access_token_header: String,
    #[serde(default = "default_refresh_token_header")]
    pub(crate) refresh_token_header: String,
    #[serde(default = "default_bcrypt_cost")]
    pub(crate) bcrypt_cost: u32,
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_access_token_ttl() -> i64 {
    15 * 60
}

fn default_refresh_token_ttl() -> i64 {
    7 * 24 * 60 * 60
}

fn default_access_token_header() -> String {
    ACCESS_TOKEN_HEADER.to_owned()
}

fn default_refresh_token_header() -> String {
    REFRESH_TOKEN_HEADER.to_owned()
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

pub(crate) fn parse_audience(audience: &str) -> Vec<String> {
    audience
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}
