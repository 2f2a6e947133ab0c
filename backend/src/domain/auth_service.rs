//! Registration and login.
//!
//! Passwords are stored as `pbkdf2_sha256$<iterations>$<salt>$<key>`, salt
//! and key in base64. The iteration count travels with the hash, so raising
//! it only affects passwords set afterwards.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use tracing::{info, warn};

use shared::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use super::errors::{DomainError, DomainResult};
use super::validation::{is_valid_email, is_valid_phone, optional, optional_date, required};
use crate::config::DEFAULT_PASSWORD_ITERATIONS;
use crate::storage::{CreateUserOutcome, NewUser, UserStorage};

pub const MIN_PASSWORD_LEN: usize = 6;
const HASH_SCHEME: &str = "pbkdf2_sha256";
const KEY_LEN: usize = 32;

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

pub fn hash_password(password: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    // 122 random bits from the OS generator
    let salt = *uuid::Uuid::new_v4().as_bytes();
    let key = derive_key(password, &salt, iterations);
    format!("{}${}${}${}", HASH_SCHEME, iterations, B64.encode(salt), B64.encode(key))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (Some(HASH_SCHEME), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let (Ok(iterations), Ok(salt), Ok(expected)) =
        (iterations.parse::<u32>(), B64.decode(salt), B64.decode(expected))
    else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    derive_key(password, &salt, iterations).as_slice() == expected.as_slice()
}

/// Key derivation is deliberately slow, so it runs on the blocking pool
async fn hash_off_runtime(password: String, iterations: u32) -> DomainResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password, iterations))
        .await
        .map_err(|e| DomainError::Storage(e.into()))
}

async fn verify_off_runtime(password: String, stored: String) -> DomainResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| DomainError::Storage(e.into()))
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStorage>,
    iterations: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStorage>) -> Self {
        Self {
            users,
            iterations: DEFAULT_PASSWORD_ITERATIONS,
        }
    }

    /// PBKDF2 rounds for passwords hashed from now on
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    pub async fn register(&self, request: RegisterRequest) -> DomainResult<RegisterResponse> {
        info!("Registering user '{}'", request.name.trim());

        let name = required(&request.name, "Username")?;
        let email = required(&request.email, "Email")?;
        if request.password.is_empty() || request.confirm_password.is_empty() {
            return Err(DomainError::validation("Password is required"));
        }
        if !is_valid_email(&email) {
            return Err(DomainError::validation("Invalid email format"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if request.password != request.confirm_password {
            return Err(DomainError::validation("Passwords do not match"));
        }
        let date_of_birth = optional_date(request.date_of_birth.as_deref(), "Date of birth")?;
        let phone = optional(request.phone.as_deref());
        if let Some(phone) = &phone {
            if !is_valid_phone(phone) {
                return Err(DomainError::validation("Phone number must be 7-15 digits"));
            }
        }

        let new_user = NewUser {
            name,
            email,
            password_hash: hash_off_runtime(request.password, self.iterations).await?,
            date_of_birth,
            phone,
        };

        match self.users.create_user(&new_user).await? {
            CreateUserOutcome::Created(user) => {
                info!("Registered user {} ({})", user.id, user.name);
                Ok(RegisterResponse {
                    user,
                    success_message: "Registration successful".to_string(),
                })
            }
            CreateUserOutcome::Duplicate => {
                warn!("Registration rejected for duplicate user '{}'", new_user.name);
                Err(DomainError::Conflict(
                    "Username, email or phone already exists".to_string(),
                ))
            }
        }
    }

    pub async fn login(&self, request: LoginRequest) -> DomainResult<LoginResponse> {
        let identifier = request.identifier.trim();
        info!("Login attempt for '{}'", identifier);
        if identifier.is_empty() || request.password.is_empty() {
            return Err(DomainError::validation("Please enter username and password"));
        }

        let invalid = || DomainError::Unauthorized("Invalid username or password".to_string());
        let credentials = self.users.find_credentials(identifier).await?.ok_or_else(invalid)?;
        if !verify_off_runtime(request.password, credentials.password_hash).await? {
            warn!("Wrong password for '{}'", identifier);
            return Err(invalid());
        }

        Ok(LoginResponse {
            success_message: format!("Welcome {}!", credentials.user.name),
            user: credentials.user,
        })
    }

    /// Display name for the dashboard header
    pub async fn resolve_user_name(&self, user_id: Option<i64>) -> DomainResult<String> {
        let Some(id) = user_id else {
            return Ok("Admin".to_string());
        };
        Ok(match self.users.get_user(id).await? {
            Some(user) => user.name,
            None => format!("User {}", id),
        })
    }
}
