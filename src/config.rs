//! Configuration for the cropchain backend
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtValidator;
use crate::issuance::{DisabledIssuer, HttpIssuer, HttpIssuerConfig, TokenIssuer, MAX_DECIMALS};
use crate::ledger::{TokenPolicy, DEFAULT_KG_PER_TOKEN};
use crate::types::{CropchainError, Result};

/// Cropchain - crop registration and reward token backend
#[derive(Parser, Debug, Clone)]
#[command(name = "cropchain")]
#[command(about = "Crop registration backend that rewards farmers with ledger tokens")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// Enable development mode (dev JWT secret, in-memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "cropchain")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Kilograms of crop per reward token
    #[arg(long, env = "KG_PER_TOKEN", default_value_t = DEFAULT_KG_PER_TOKEN)]
    pub kg_per_token: u32,

    /// Issuance gateway mint endpoint. Minting is disabled when unset.
    #[arg(long, env = "MINT_SERVICE_URL")]
    pub mint_service_url: Option<String>,

    /// Bearer token for the issuance gateway
    #[arg(long, env = "MINT_SERVICE_TOKEN")]
    pub mint_service_token: Option<String>,

    /// Token decimals on the ledger
    #[arg(long, env = "TOKEN_DECIMALS", default_value = "9")]
    pub token_decimals: u8,

    /// Mint request timeout in milliseconds
    #[arg(long, env = "MINT_TIMEOUT_MS", default_value = "15000")]
    pub mint_timeout_ms: u64,

    /// Value for Access-Control-Allow-Origin
    #[arg(long, env = "CORS_ORIGIN", default_value = "*")]
    pub cors_origin: String,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "10240")]
    pub max_body_bytes: usize,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.kg_per_token == 0 {
            return Err("KG_PER_TOKEN must be at least 1".to_string());
        }

        if self.token_decimals > MAX_DECIMALS {
            return Err(format!("TOKEN_DECIMALS must be at most {MAX_DECIMALS}"));
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be positive".to_string());
        }

        Ok(())
    }

    /// JWT validator for this configuration. Dev mode falls back to a fixed secret.
    pub fn jwt_validator(&self) -> Result<JwtValidator> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => JwtValidator::new(secret.clone(), self.jwt_expiry_seconds),
            (None, true) => Ok(JwtValidator::new_dev()),
            (None, false) => Err(CropchainError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    pub fn token_policy(&self) -> Result<TokenPolicy> {
        TokenPolicy::new(self.kg_per_token)
    }

    /// Issuance client: the HTTP gateway when configured, otherwise disabled
    pub fn issuer(&self) -> Result<Arc<dyn TokenIssuer>> {
        let Some(url) = self.mint_service_url.as_ref().filter(|u| !u.trim().is_empty()) else {
            return Ok(Arc::new(DisabledIssuer));
        };

        let issuer = HttpIssuer::new(HttpIssuerConfig {
            url: url.trim().to_string(),
            auth_token: self.mint_service_token.clone(),
            decimals: self.token_decimals,
            timeout: Duration::from_millis(self.mint_timeout_ms),
        })?;
        Ok(Arc::new(issuer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["cropchain"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let args = parse(&[]);
        assert!(args.validate().is_err());
        assert!(args.jwt_validator().is_err());

        let dev = parse(&["--dev-mode"]);
        assert!(dev.validate().is_ok());
        assert!(dev.jwt_validator().is_ok());
    }

    #[test]
    fn test_rate_and_decimals_bounds() {
        assert!(parse(&["--dev-mode", "--kg-per-token", "0"]).validate().is_err());
        assert!(parse(&["--dev-mode", "--token-decimals", "19"]).validate().is_err());

        let args = parse(&["--dev-mode", "--kg-per-token", "10"]);
        assert_eq!(args.token_policy().unwrap().tokens_for(25.0).unwrap(), 2);
    }

    #[test]
    fn test_issuer_selection() {
        let disabled = parse(&["--dev-mode"]).issuer().unwrap();
        assert!(!disabled.is_configured());

        let http = parse(&["--dev-mode", "--mint-service-url", "http://127.0.0.1:9/mint"])
            .issuer()
            .unwrap();
        assert!(http.is_configured());
    }
}
