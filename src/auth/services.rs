use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::User;
use crate::auth::token::TokenKeys;
use crate::error::AppError;
use crate::store::{StoreError, UserStore};

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;':\",.<>/?`~";

pub(crate) fn validate_login(login: &str) -> Result<(), AppError> {
    lazy_static! {
        static ref LOGIN_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
    }
    let len = login.chars().count();
    if !(3..=50).contains(&len) {
        return Err(AppError::validation("login must be between 3 and 50 characters"));
    }
    if !LOGIN_RE.is_match(login) {
        return Err(AppError::validation(
            "login may only contain letters, digits, underscores and hyphens",
        ));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(8..=100).contains(&len) {
        return Err(AppError::validation("password must be between 8 and 100 characters"));
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIAL_CHARS.contains(c));
    if !(has_upper && has_lower && has_digit && has_special) {
        return Err(AppError::validation(
            "password must contain an uppercase letter, a lowercase letter, a digit and a special character",
        ));
    }
    Ok(())
}

/// Registration, login and identity lookup.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: TokenKeys) -> Self {
        Self { users, keys }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    pub async fn register(&self, login: &str, password: &str) -> Result<User, AppError> {
        validate_login(login)?;
        validate_password(password)?;

        let existing = self.users.get_user_by_login(login).await.map_err(|e| {
            error!(error = %e, "get_user_by_login failed");
            AppError::from(e)
        })?;
        if existing.is_some() {
            warn!(login = %login, "login already registered");
            return Err(AppError::AlreadyExists);
        }

        let password_hash = hash_password(password).map_err(AppError::Internal)?;
        let user = User {
            id: Uuid::new_v4(),
            login: login.to_string(),
            password_hash,
            created_at: OffsetDateTime::now_utc(),
        };

        match self.users.create_user(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate) => {
                warn!(login = %login, "login taken by concurrent registration");
                return Err(AppError::AlreadyExists);
            }
            Err(e) => {
                error!(error = %e, "create_user failed");
                return Err(e.into());
            }
        }

        info!(user_id = %user.id, login = %user.login, "user registered");
        Ok(user)
    }

    /// Returns a signed token. Unknown login and wrong password fail identically.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<String, AppError> {
        let user = match self.users.get_user_by_login(login).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!("login rejected");
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "get_user_by_login failed");
                return Err(e.into());
            }
        };

        if !verify_password(password, &user.password_hash) {
            warn!("login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let token = self
            .keys
            .issue(&user.id.to_string())
            .map_err(AppError::Internal)?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .get_user_by_id(user_id)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "get_user_by_id failed");
                AppError::from(e)
            })?
            .ok_or(AppError::NotFound)
    }
}
