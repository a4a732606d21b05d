//! Read paths over a farmer's crops

use serde::Serialize;
use std::sync::Arc;

use crate::ledger::Tier;
use crate::store::{CropStore, UserStore};
use crate::types::{CropPage, CropQuery, CropRecord, CropchainError, Result};

/// Dashboard figures for one farmer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerSummary {
    pub farmer_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    /// Tokens actually minted and credited
    pub token_balance: u64,
    /// Tokens earned across all crops, minted or not
    pub sum_tokens: u64,
    pub crop_count: u64,
    pub total_weight: f64,
    pub tier: Tier,
    pub tier_progress: u8,
}

pub struct CropQueryService {
    users: Arc<dyn UserStore>,
    crops: Arc<dyn CropStore>,
}

impl CropQueryService {
    pub fn new(users: Arc<dyn UserStore>, crops: Arc<dyn CropStore>) -> Self {
        Self { users, crops }
    }

    /// A farmer's crops, newest first
    pub async fn list_my_crops(&self, farmer_id: &str, query: CropQuery) -> Result<CropPage> {
        self.crops.list_crops(farmer_id, &query).await
    }

    pub async fn sum_tokens(&self, farmer_id: &str) -> Result<u64> {
        self.crops.sum_tokens(farmer_id).await
    }

    /// A single crop, only if `farmer_id` owns it
    pub async fn get_crop(&self, farmer_id: &str, crop_id: &str) -> Result<CropRecord> {
        let crop = self
            .crops
            .find_crop(crop_id)
            .await?
            .ok_or_else(|| CropchainError::NotFound("Crop not found".into()))?;

        if crop.farmer_id != farmer_id {
            return Err(CropchainError::Forbidden(
                "Not authorized to access this crop".into(),
            ));
        }

        Ok(crop)
    }

    pub async fn summary(&self, farmer_id: &str) -> Result<FarmerSummary> {
        let farmer = self
            .users
            .find_user(farmer_id)
            .await?
            .ok_or_else(|| CropchainError::NotFound(format!("Farmer {farmer_id} not found")))?;
        let totals = self.crops.crop_totals(farmer_id).await?;
        let tier = Tier::from_balance(farmer.token_balance);

        Ok(FarmerSummary {
            farmer_id: farmer.id,
            username: farmer.username,
            wallet_address: farmer.wallet_address,
            token_balance: farmer.token_balance,
            sum_tokens: totals.total_tokens,
            crop_count: totals.crop_count,
            total_weight: totals.total_weight,
            tier,
            tier_progress: tier.progress(),
        })
    }
}
