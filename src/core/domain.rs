use serde::{Deserialize, Serialize};
use crate::utils::date::parse_ttl;

// Identifiable defines common traits that can be shared by persistent objects
pub trait Identifiable: Sync + Send {
    fn id(&self) -> String;
    fn version(&self) -> i64;
}

const DEV_JWT_SECRET: &str = "library-api-dev-secret";

// Configuration abstracts config options for library system
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    pub branch_id: String,
    pub loan_days: i64,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    // shared with the identity gateway that calls the external sign-in route; None disables it
    pub external_auth_key: Option<String>,
}

impl Configuration {
    pub fn new(branch_id: &str) -> Self {
        Configuration {
            branch_id: branch_id.to_string(),
            loan_days: 14,
            access_token_ttl_secs: 60 * 60,
            refresh_token_ttl_secs: 7 * 24 * 60 * 60,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            external_auth_key: None,
        }
    }

    // Overrides the defaults from JWT_SECRET, JWT_EXPIRATION, REFRESH_TOKEN_EXPIRATION,
    // LOAN_DAYS, BCRYPT_COST and EXTERNAL_AUTH_KEY; unparsable values keep the default.
    pub fn from_env(branch_id: &str) -> Self {
        let mut config = Configuration::new(branch_id);
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                config.jwt_secret = secret;
            }
        }
        if let Some(ttl) = std::env::var("JWT_EXPIRATION").ok().and_then(|v| parse_ttl(v.as_str())) {
            config.access_token_ttl_secs = ttl;
        }
        if let Some(ttl) = std::env::var("REFRESH_TOKEN_EXPIRATION").ok().and_then(|v| parse_ttl(v.as_str())) {
            config.refresh_token_ttl_secs = ttl;
        }
        if let Some(days) = std::env::var("LOAN_DAYS").ok().and_then(|v| v.parse::<i64>().ok()) {
            if days > 0 {
                config.loan_days = days;
            }
        }
        if let Some(cost) = std::env::var("BCRYPT_COST").ok().and_then(|v| v.parse::<u32>().ok()) {
            config.bcrypt_cost = cost;
        }
        config.external_auth_key = std::env::var("EXTERNAL_AUTH_KEY").ok().filter(|k| !k.is_empty());
        config
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}
