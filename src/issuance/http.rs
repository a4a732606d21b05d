//! HTTP client for the token issuance gateway
//!
//! The gateway holds the mint authority keypair and submits the ledger
//! transaction. Request body:
//!
//! ```json
//! { "recipient": "<base58>", "amount": 25, "baseUnits": "25000000000", "decimals": 9 }
//! ```
//!
//! A 2xx response carries `{ "signature": "<tx signature>" }`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{MintError, MintReceipt, TokenIssuer};
use crate::types::CropchainError;

/// Largest supported token decimals (10^18 still fits comfortably in u128 math)
pub const MAX_DECIMALS: u8 = 18;

/// Gateway client configuration
#[derive(Debug, Clone)]
pub struct HttpIssuerConfig {
    /// Full mint endpoint URL
    pub url: String,
    /// Optional bearer token for the gateway
    pub auth_token: Option<String>,
    /// Token decimals on the ledger
    pub decimals: u8,
    /// Per-request timeout; a timeout counts as a failed mint
    pub timeout: Duration,
}

/// Mint request sent to the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub recipient: String,
    pub amount: u64,
    /// `amount * 10^decimals`, as a string to survive JSON number limits
    pub base_units: String,
    pub decimals: u8,
}

/// Successful gateway response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintResponse {
    pub signature: String,
}

/// Issuer backed by the HTTP issuance gateway
pub struct HttpIssuer {
    config: HttpIssuerConfig,
    http_client: reqwest::Client,
}

impl HttpIssuer {
    pub fn new(config: HttpIssuerConfig) -> Result<Self, CropchainError> {
        if config.decimals > MAX_DECIMALS {
            return Err(CropchainError::Config(format!(
                "TOKEN_DECIMALS must be at most {MAX_DECIMALS}"
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CropchainError::Config(format!("Failed to create HTTP client: {e}")))?;

        info!(url = %config.url, decimals = config.decimals, "Token issuance gateway configured");

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Build the gateway request for a mint
    pub fn mint_request(&self, address: &str, amount: u64) -> Result<MintRequest, MintError> {
        if amount == 0 {
            return Err(MintError::InvalidAmount("amount must be greater than 0".into()));
        }

        Ok(MintRequest {
            recipient: address.to_string(),
            amount,
            base_units: base_units(amount, self.config.decimals)?.to_string(),
            decimals: self.config.decimals,
        })
    }
}

/// Convert whole tokens into ledger base units
pub fn base_units(amount: u64, decimals: u8) -> Result<u128, MintError> {
    10u128
        .checked_pow(u32::from(decimals))
        .and_then(|scale| u128::from(amount).checked_mul(scale))
        .ok_or_else(|| MintError::InvalidAmount(format!("{amount} tokens overflows base units")))
}

#[async_trait::async_trait]
impl TokenIssuer for HttpIssuer {
    async fn mint(&self, address: &str, amount: u64) -> Result<MintReceipt, MintError> {
        let body = self.mint_request(address, amount)?;

        let mut request = self.http_client.post(&self.config.url).json(&body);
        if let Some(ref token) = self.config.auth_token {
            request = request.bearer_auth(token);
        }

        debug!(recipient = %address, amount, "Sending mint request");

        let response = request
            .send()
            .await
            .map_err(|e| MintError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(recipient = %address, amount, %status, "Issuance gateway rejected mint");
            return Err(MintError::Rejected(if detail.is_empty() {
                status.to_string()
            } else {
                format!("{status}: {detail}")
            }));
        }

        let parsed: MintResponse = response
            .json()
            .await
            .map_err(|e| MintError::Rejected(format!("malformed gateway response: {e}")))?;

        info!(recipient = %address, amount, signature = %parsed.signature, "Tokens minted");

        Ok(MintReceipt {
            signature: parsed.signature,
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use tokio::net::TcpListener;

    fn config(url: String) -> HttpIssuerConfig {
        HttpIssuerConfig {
            url,
            auth_token: Some("gateway-token".into()),
            decimals: 9,
            timeout: Duration::from_secs(5),
        }
    }

    /// Serve one canned response on a random local port, returning its URL
    async fn one_shot_gateway(status: StatusCode, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let service = service_fn(move |req: Request<hyper::body::Incoming>| async move {
                // Echo-check the body shape before answering
                let bytes = req.into_body().collect().await.unwrap().to_bytes();
                let parsed: MintRequest = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(parsed.decimals, 9);

                let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
                *response.status_mut() = status;
                Ok::<_, Infallible>(response)
            });
            let _ = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await;
        });

        format!("http://{addr}/mint")
    }

    #[test]
    fn test_base_units() {
        assert_eq!(base_units(25, 9).unwrap(), 25_000_000_000);
        assert_eq!(base_units(1, 0).unwrap(), 1);
        assert_eq!(
            base_units(u64::MAX, 18).unwrap(),
            u128::from(u64::MAX) * 1_000_000_000_000_000_000
        );
    }

    #[test]
    fn test_mint_request_rejects_zero_amount() {
        let issuer = HttpIssuer::new(config("http://127.0.0.1:9/mint".into())).unwrap();
        assert!(matches!(
            issuer.mint_request("addr", 0),
            Err(MintError::InvalidAmount(_))
        ));

        let request = issuer.mint_request("addr", 3).unwrap();
        assert_eq!(request.base_units, "3000000000");
    }

    #[test]
    fn test_too_many_decimals_rejected() {
        let mut cfg = config("http://127.0.0.1:9/mint".into());
        cfg.decimals = 30;
        assert!(HttpIssuer::new(cfg).is_err());
    }

    #[tokio::test]
    async fn test_successful_mint_returns_signature() {
        let url = one_shot_gateway(StatusCode::OK, r#"{"signature":"5xSig"}"#).await;
        let issuer = HttpIssuer::new(config(url)).unwrap();

        let receipt = issuer.mint("recipient", 25).await.unwrap();
        assert_eq!(receipt.signature, "5xSig");
        assert_eq!(receipt.amount, 25);
    }

    #[tokio::test]
    async fn test_gateway_error_is_rejection() {
        let url = one_shot_gateway(StatusCode::BAD_GATEWAY, "rpc node down").await;
        let issuer = HttpIssuer::new(config(url)).unwrap();

        match issuer.mint("recipient", 25).await {
            Err(MintError::Rejected(detail)) => assert!(detail.contains("rpc node down")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let issuer = HttpIssuer::new(config(format!("http://{addr}/mint"))).unwrap();
        assert!(matches!(
            issuer.mint("recipient", 1).await,
            Err(MintError::Transport(_))
        ));
    }
}
