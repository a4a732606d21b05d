//! User document schema
//!
//! Stores credentials, role, wallet address and the running token balance.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::types::{NewUser, User};

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Lower-cased login email
    pub email: String,

    pub username: String,

    /// Argon2 password hash
    pub password_hash: String,

    #[serde(default)]
    pub role: Role,

    /// Ledger address that receives minted tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,

    /// Whole tokens minted to this user; only ever changed with `$inc`
    #[serde(default)]
    pub token_balance: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime>,
}

impl UserDoc {
    pub fn new(input: NewUser) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            email: input.email,
            username: input.username,
            password_hash: input.password_hash,
            role: input.role,
            wallet_address: None,
            token_balance: 0,
            last_login: None,
        }
    }

    /// Convert to the domain type (`id` must be set)
    pub fn into_user(self) -> User {
        User {
            id: self._id.map(|id| id.to_hex()).unwrap_or_default(),
            created_at: self.metadata.created_at_utc(),
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            role: self.role,
            wallet_address: self.wallet_address,
            token_balance: u64::try_from(self.token_balance).unwrap_or(0),
            last_login: self.last_login.map(|dt| dt.to_chrono()),
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "username": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("username_unique".to_string())
                        .build(),
                ),
            ),
            // Holder listings sort by balance
            (
                doc! { "token_balance": -1 },
                Some(
                    IndexOptions::builder()
                        .name("token_balance_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
