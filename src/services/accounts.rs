//! Account sign-up, login, wallet and profile

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, JwtValidator, Role, MIN_PASSWORD_LEN};
use crate::ledger::{parse_wallet_address, Tier};
use crate::store::UserStore;
use crate::types::{CropchainError, NewUser, Result, User};

/// Minimum username length after trimming
pub const MIN_USERNAME_LEN: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Token plus the account it was issued for
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub tier: Tier,
}

pub struct AccountService {
    users: Arc<dyn UserStore>,
    jwt: JwtValidator,
}

/// Loose `local@domain.tld` shape check
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtValidator) -> Self {
        Self { users, jwt }
    }

    pub fn jwt(&self) -> &JwtValidator {
        &self.jwt
    }

    fn session(&self, user: User) -> Result<AuthSession> {
        Ok(AuthSession {
            token: self.jwt.generate_token(&user)?,
            expires_in: self.jwt.expiry_seconds(),
            user,
        })
    }

    /// Create a farmer account and sign it in
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<AuthSession> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(CropchainError::Validation(format!(
                "Username must be at least {MIN_USERNAME_LEN} characters long"
            )));
        }
        if !is_valid_email(&email) {
            return Err(CropchainError::Validation("Please enter a valid email".into()));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CropchainError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }

        if self.users.user_exists(&email, &username).await? {
            return Err(CropchainError::Conflict("User already exists".into()));
        }

        let user = self
            .users
            .create_user(NewUser {
                email,
                username,
                password_hash: hash_password(&request.password)?,
                role: Role::Farmer,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        self.session(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession> {
        let email = request.email.trim().to_lowercase();
        if email.is_empty() || request.password.is_empty() {
            return Err(CropchainError::Validation(
                "Missing required fields: email, password".into(),
            ));
        }

        let invalid = || CropchainError::Unauthorized("Invalid credentials".into());

        let Some(mut user) = self.users.find_user_by_email(&email).await? else {
            return Err(invalid());
        };

        if !verify_password(&request.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(invalid());
        }

        self.users.record_login(&user.id).await?;
        user.last_login = Some(chrono::Utc::now());

        info!(user_id = %user.id, "User logged in");
        self.session(user)
    }

    /// Set the wallet address that receives minted tokens
    pub async fn set_wallet(&self, user_id: &str, address: &str) -> Result<User> {
        let address = parse_wallet_address(address)?;
        if !self.users.set_wallet_address(user_id, &address).await? {
            return Err(CropchainError::NotFound("User not found".into()));
        }
        info!(user_id = %user_id, wallet = %address, "Wallet address updated");
        self.find(user_id).await
    }

    pub async fn profile(&self, user_id: &str) -> Result<Profile> {
        let user = self.find(user_id).await?;
        let tier = Tier::from_balance(user.token_balance);
        Ok(Profile { user, tier })
    }

    pub async fn holders(&self, limit: u64) -> Result<Vec<User>> {
        self.users.list_holders(limit).await
    }

    async fn find(&self, user_id: &str) -> Result<User> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| CropchainError::NotFound("User not found".into()))
    }
}
