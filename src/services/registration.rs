//! Crop registration workflow
//!
//! validate → load farmer → sync wallet → persist crop → mint → credit balance
//!
//! Validation and lookup failures abort before anything is written. Once the
//! crop is stored it stays stored: a failed mint downgrades to a warning on
//! an otherwise successful result, and the balance is only credited after the
//! issuer confirms the mint.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::issuance::TokenIssuer;
use crate::ledger::{parse_wallet_address, TokenPolicy, MAX_CROP_WEIGHT_KG};
use crate::store::{CropStore, UserStore};
use crate::types::{CropRecord, CropchainError, NewCrop, Result};

/// Crop registration input
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCropRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
}

/// Outcome of a registration. Present whenever the crop was stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    pub crop: CropRecord,
    pub tokens_minted: u64,
    pub new_balance: u64,
    /// Ledger transaction signature when a mint happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Why no tokens were minted even though some were earned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub struct RegistrationService {
    users: Arc<dyn UserStore>,
    crops: Arc<dyn CropStore>,
    issuer: Arc<dyn TokenIssuer>,
    policy: TokenPolicy,
}

/// Checked, trimmed registration fields
struct ValidCrop {
    name: String,
    weight: f64,
    location: String,
    wallet_address: Option<String>,
}

fn validate(request: RegisterCropRequest) -> Result<ValidCrop> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(CropchainError::Validation("Crop name is required".into()));
    }

    let location = request.location.trim();
    if location.is_empty() {
        return Err(CropchainError::Validation("Location is required".into()));
    }

    if !request.weight.is_finite() || request.weight <= 0.0 {
        return Err(CropchainError::Validation(
            "Weight must be a positive number".into(),
        ));
    }
    if request.weight > MAX_CROP_WEIGHT_KG {
        return Err(CropchainError::Validation(format!(
            "Weight must not exceed {MAX_CROP_WEIGHT_KG} kg"
        )));
    }

    let wallet_address = match request.wallet_address.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_wallet_address(raw)?),
    };

    Ok(ValidCrop {
        name: name.to_string(),
        weight: request.weight,
        location: location.to_string(),
        wallet_address,
    })
}

impl RegistrationService {
    pub fn new(
        users: Arc<dyn UserStore>,
        crops: Arc<dyn CropStore>,
        issuer: Arc<dyn TokenIssuer>,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            users,
            crops,
            issuer,
            policy,
        }
    }

    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    /// Register a crop batch for `farmer_id` and mint its reward tokens
    pub async fn register_crop(
        &self,
        farmer_id: &str,
        request: RegisterCropRequest,
    ) -> Result<RegistrationResult> {
        let input = validate(request)?;
        let token_amount = self.policy.tokens_for(input.weight)?;

        let farmer = self
            .users
            .find_user(farmer_id)
            .await?
            .ok_or_else(|| CropchainError::NotFound(format!("Farmer {farmer_id} not found")))?;

        let mut wallet = farmer.wallet_address.clone();
        if let Some(address) = input.wallet_address {
            if wallet.as_deref() != Some(address.as_str()) {
                if !self.users.set_wallet_address(farmer_id, &address).await? {
                    return Err(CropchainError::NotFound(format!(
                        "Farmer {farmer_id} not found"
                    )));
                }
                info!(farmer_id = %farmer_id, wallet = %address, "Updated farmer wallet address");
                wallet = Some(address);
            }
        }

        let crop = self
            .crops
            .insert_crop(NewCrop {
                farmer_id: farmer_id.to_string(),
                name: input.name,
                weight: input.weight,
                location: input.location,
                token_amount,
            })
            .await?;

        info!(
            farmer_id = %farmer_id,
            crop_id = %crop.id,
            weight = crop.weight,
            token_amount,
            "Crop registered"
        );

        let unchanged = |warning: Option<String>| RegistrationResult {
            crop: crop.clone(),
            tokens_minted: 0,
            new_balance: farmer.token_balance,
            signature: None,
            warning,
        };

        if token_amount == 0 {
            return Ok(unchanged(None));
        }

        let Some(address) = wallet else {
            return Ok(unchanged(Some(format!(
                "Crop registered but no wallet address is on file; {token_amount} tokens were not minted"
            ))));
        };

        let receipt = match self.issuer.mint(&address, token_amount).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(
                    farmer_id = %farmer_id,
                    crop_id = %crop.id,
                    token_amount,
                    error = %e,
                    "Token minting failed"
                );
                return Ok(unchanged(Some(format!(
                    "Crop registered but token minting failed: {e}"
                ))));
            }
        };

        let new_balance = self
            .users
            .increment_balance(farmer_id, token_amount)
            .await?
            .ok_or_else(|| CropchainError::NotFound(format!("Farmer {farmer_id} not found")))?;

        info!(
            farmer_id = %farmer_id,
            crop_id = %crop.id,
            tokens_minted = token_amount,
            new_balance,
            "Reward tokens credited"
        );

        Ok(RegistrationResult {
            crop,
            tokens_minted: token_amount,
            new_balance,
            signature: Some(receipt.signature),
            warning: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::issuance::{DisabledIssuer, MintError, MintReceipt};
    use crate::store::MemoryStore;
    use crate::types::{CropQuery, NewUser};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every mint and succeeds
    #[derive(Default)]
    struct RecordingIssuer {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TokenIssuer for RecordingIssuer {
        async fn mint(&self, _address: &str, amount: u64) -> std::result::Result<MintReceipt, MintError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(MintReceipt {
                signature: format!("sig-{n}"),
                amount,
            })
        }
    }

    struct FailingIssuer;

    #[async_trait::async_trait]
    impl TokenIssuer for FailingIssuer {
        async fn mint(&self, _address: &str, _amount: u64) -> std::result::Result<MintReceipt, MintError> {
            Err(MintError::Transport("connection timed out".into()))
        }
    }

    fn wallet() -> String {
        bs58::encode([9u8; 32]).into_string()
    }

    async fn setup(
        issuer: Arc<dyn TokenIssuer>,
        kg_per_token: u32,
    ) -> (Arc<MemoryStore>, RegistrationService, String) {
        let store = Arc::new(MemoryStore::new());
        let farmer = store
            .create_user(NewUser {
                email: "ana@farm.io".into(),
                username: "ana".into(),
                password_hash: "hash".into(),
                role: Role::Farmer,
            })
            .await
            .unwrap();
        let service = RegistrationService::new(
            store.clone(),
            store.clone(),
            issuer,
            TokenPolicy::new(kg_per_token).unwrap(),
        );
        (store, service, farmer.id)
    }

    fn request(name: &str, weight: f64, location: &str, wallet: Option<String>) -> RegisterCropRequest {
        RegisterCropRequest {
            name: name.into(),
            weight,
            location: location.into(),
            wallet_address: wallet,
        }
    }

    #[tokio::test]
    async fn test_successful_mint_credits_balance() {
        let issuer = Arc::new(RecordingIssuer::default());
        let (store, service, farmer_id) = setup(issuer.clone(), 10).await;

        let result = service
            .register_crop(&farmer_id, request("Maize", 25.0, "Nakuru", Some(wallet())))
            .await
            .unwrap();

        assert_eq!(result.crop.token_amount, 2);
        assert_eq!(result.tokens_minted, 2);
        assert_eq!(result.new_balance, 2);
        assert_eq!(result.signature.as_deref(), Some("sig-0"));
        assert!(result.warning.is_none());

        let farmer = store.find_user(&farmer_id).await.unwrap().unwrap();
        assert_eq!(farmer.token_balance, 2);
        assert_eq!(farmer.wallet_address, Some(wallet()));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mint_failure_keeps_crop_and_balance() {
        let (store, service, farmer_id) = setup(Arc::new(FailingIssuer), 1).await;

        let result = service
            .register_crop(&farmer_id, request("Beans", 40.0, "Eldoret", Some(wallet())))
            .await
            .unwrap();

        assert_eq!(result.tokens_minted, 0);
        assert_eq!(result.new_balance, 0);
        assert!(result.warning.as_deref().unwrap().contains("minting failed"));

        // Crop stays stored with its earned amount for audit
        let stored = store.find_crop(&result.crop.id).await.unwrap().unwrap();
        assert_eq!(stored.token_amount, 40);
        assert_eq!(
            store.find_user(&farmer_id).await.unwrap().unwrap().token_balance,
            0
        );
    }

    #[tokio::test]
    async fn test_no_wallet_skips_mint_with_warning() {
        let issuer = Arc::new(RecordingIssuer::default());
        let (_store, service, farmer_id) = setup(issuer.clone(), 1).await;

        let result = service
            .register_crop(&farmer_id, request("Tea", 12.0, "Kericho", None))
            .await
            .unwrap();

        assert_eq!(result.tokens_minted, 0);
        assert!(result.warning.as_deref().unwrap().contains("no wallet"));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_tokens_skips_mint_silently() {
        let issuer = Arc::new(RecordingIssuer::default());
        let (_store, service, farmer_id) = setup(issuer.clone(), 10).await;

        let result = service
            .register_crop(&farmer_id, request("Herbs", 9.5, "Nyeri", Some(wallet())))
            .await
            .unwrap();

        assert_eq!(result.crop.token_amount, 0);
        assert_eq!(result.tokens_minted, 0);
        assert!(result.warning.is_none());
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_writes_nothing() {
        let (store, service, farmer_id) = setup(Arc::new(DisabledIssuer), 1).await;

        let bad = [
            request("", 10.0, "Nakuru", None),
            request("   ", 10.0, "Nakuru", None),
            request("Maize", 10.0, "", None),
            request("Maize", 0.0, "Nakuru", None),
            request("Maize", -3.0, "Nakuru", None),
            request("Maize", f64::NAN, "Nakuru", None),
            request("Maize", 10.0, "Nakuru", Some("not-base58!".into())),
        ];
        for req in bad {
            let err = service.register_crop(&farmer_id, req).await.unwrap_err();
            assert!(matches!(err, CropchainError::Validation(_)), "got {err:?}");
        }

        let page = store.list_crops(&farmer_id, &CropQuery::default()).await.unwrap();
        assert_eq!(page.total_count, 0);
        assert!(store
            .find_user(&farmer_id)
            .await
            .unwrap()
            .unwrap()
            .wallet_address
            .is_none());
    }

    #[tokio::test]
    async fn test_oversized_weight_rejected_before_any_write() {
        let issuer = Arc::new(RecordingIssuer::default());
        let (store, service, farmer_id) = setup(issuer.clone(), 1).await;

        for weight in [1e19, MAX_CROP_WEIGHT_KG * 2.0, f64::MAX] {
            let err = service
                .register_crop(&farmer_id, request("Maize", weight, "Nakuru", Some(wallet())))
                .await
                .unwrap_err();
            assert!(matches!(err, CropchainError::Validation(_)), "got {err:?}");
        }

        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.sum_tokens(&farmer_id).await.unwrap(), 0);
        let page = store.list_crops(&farmer_id, &CropQuery::default()).await.unwrap();
        assert_eq!(page.total_count, 0);
        let farmer = store.find_user(&farmer_id).await.unwrap().unwrap();
        assert_eq!(farmer.token_balance, 0);
        assert!(farmer.wallet_address.is_none());

        // The ceiling itself still registers and mints
        let result = service
            .register_crop(&farmer_id, request("Maize", MAX_CROP_WEIGHT_KG, "Nakuru", Some(wallet())))
            .await
            .unwrap();
        assert_eq!(result.new_balance, 1_000_000_000);
    }

    #[tokio::test]
    async fn test_unknown_farmer_is_not_found() {
        let (store, service, _) = setup(Arc::new(DisabledIssuer), 1).await;

        let err = service
            .register_crop("000000000000000000000000", request("Maize", 5.0, "Nakuru", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CropchainError::NotFound(_)));

        let page = store
            .list_crops("000000000000000000000000", &CropQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_submissions_are_distinct_records() {
        let (store, service, farmer_id) = setup(Arc::new(RecordingIssuer::default()), 1).await;

        let first = service
            .register_crop(&farmer_id, request("Maize", 5.0, "Nakuru", Some(wallet())))
            .await
            .unwrap();
        let second = service
            .register_crop(&farmer_id, request("Maize", 5.0, "Nakuru", None))
            .await
            .unwrap();

        assert_ne!(first.crop.id, second.crop.id);
        assert_eq!(second.new_balance, 10);
        assert_eq!(store.sum_tokens(&farmer_id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_changed_wallet_is_persisted_before_mint() {
        let (store, service, farmer_id) = setup(Arc::new(RecordingIssuer::default()), 1).await;
        let first = wallet();
        let second = bs58::encode([3u8; 32]).into_string();

        service
            .register_crop(&farmer_id, request("Maize", 1.0, "Nakuru", Some(first)))
            .await
            .unwrap();
        service
            .register_crop(&farmer_id, request("Maize", 1.0, "Nakuru", Some(second.clone())))
            .await
            .unwrap();

        let farmer = store.find_user(&farmer_id).await.unwrap().unwrap();
        assert_eq!(farmer.wallet_address, Some(second));
    }
}
