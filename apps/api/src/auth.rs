//! JWT authentication module.
//!
//! Handles token generation and validation, password hashing and the
//! [`AuthUser`] extractor that guards every protected route.
//!
//! ```text
//! Authorization: Bearer <jwt>
//!         │
//!         ▼
//! AuthUser::from_request_parts
//!   ├── extract_bearer_token        missing → 401
//!   ├── JwtManager::validate_access_token
//!   └── employee still active?      no → 401
//!         │
//!         ▼
//! handler: user.require(Role::Manager)?   too low → 403
//! ```

use std::sync::{Arc, OnceLock};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use storehub_core::validation::{validate_email, validate_password};
use storehub_core::{Employee, NewEmployee, Role};
use storehub_db::Database;
use tracing::info;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::server::AppState;

/// Token flavour carried in the claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (employee id)
    pub sub: String,

    /// Role at the time the token was issued
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    pub token_type: TokenType,
}

/// Access and refresh token returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        JwtManager::new(
            config.jwt_secret.clone(),
            config.access_lifetime_secs,
            config.refresh_lifetime_secs,
        )
    }

    fn generate(
        &self,
        employee_id: &str,
        role: Role,
        token_type: TokenType,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime_secs,
            TokenType::Refresh => self.refresh_lifetime_secs,
        };

        let claims = Claims {
            sub: employee_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(lifetime)).timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Issues a fresh access/refresh pair for an employee.
    pub fn issue_pair(&self, employee: &Employee) -> Result<TokenPair, ApiError> {
        Ok(TokenPair {
            access_token: self.generate(&employee.id, employee.role, TokenType::Access)?,
            refresh_token: self.generate(&employee.id, employee.role, TokenType::Refresh)?,
            token_type: "Bearer",
            expires_in: self.access_lifetime_secs,
        })
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// Validate that a token is an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != TokenType::Access {
            return Err(ApiError::unauthorized("Expected access token"));
        }

        Ok(claims)
    }

    /// Validate that a token is a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != TokenType::Refresh {
            return Err(ApiError::unauthorized("Expected refresh token"));
        }

        Ok(claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hashes a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// False for a wrong password and for a malformed stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Runs one verification against a fixed hash and discards the result.
///
/// Login calls this for unknown emails so they cost the same as a wrong
/// password.
pub fn verify_dummy_password(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(password, hash);
    }
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    DUMMY_HASH
        .get_or_init(|| hash_password("storehub-unknown-account").ok())
        .as_deref()
}

/// Creates the configured admin when nobody can log in yet.
pub async fn bootstrap_admin(db: &Database, config: &AuthConfig) -> Result<Option<Employee>, ApiError> {
    let (Some(email), Some(password)) = (
        config.bootstrap_admin_email.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) else {
        return Ok(None);
    };

    if db.employees().count().await? > 0 {
        return Ok(None);
    }

    validate_email(email)?;
    validate_password(password)?;

    let hash = hash_password(password)?;
    let admin = db
        .employees()
        .create(
            &NewEmployee {
                email: email.to_string(),
                full_name: "Administrator".to_string(),
                role: Role::Admin,
                password: String::new(),
                phone: None,
                hourly_rate_cents: None,
                hired_at: None,
            },
            &hash,
        )
        .await?;

    info!(email = %admin.email, "Bootstrap admin created");
    Ok(Some(admin))
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated employee behind a request.
///
/// The role is read from the database, not the token, so demotions and
/// deactivations take effect immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee_id: String,
    pub role: Role,
}

impl AuthUser {
    /// 403 unless the caller's role meets `required`.
    pub fn require(&self, required: Role) -> Result<(), ApiError> {
        if self.role.allows(required) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "{} role required",
                required.as_str()
            )))
        }
    }

    pub fn is_self(&self, employee_id: &str) -> bool {
        self.employee_id == employee_id
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Expected a bearer token"))?;

        let claims = state.jwt.validate_access_token(token)?;

        let employee = match state.db.employees().get(&claims.sub).await {
            Ok(employee) => employee,
            Err(storehub_db::DbError::NotFound { .. }) => {
                return Err(ApiError::unauthorized("Unknown employee"))
            }
            Err(e) => return Err(e.into()),
        };

        if !employee.is_active {
            return Err(ApiError::unauthorized("Employee is inactive"));
        }

        Ok(AuthUser {
            employee_id: employee.id,
            role: employee.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(role: Role) -> Employee {
        let now = Utc::now();
        Employee {
            id: "emp-001".to_string(),
            email: "jo@store.test".to_string(),
            full_name: "Jo".to_string(),
            role,
            phone: None,
            hourly_rate_cents: None,
            is_active: true,
            hired_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600, 86400);
        let pair = manager.issue_pair(&employee(Role::Manager)).unwrap();

        let claims = manager.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, "emp-001");
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(pair.expires_in, 3600);

        let claims = manager.validate_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_ne!(claims.jti, "");
    }

    #[test]
    fn test_wrong_token_type() {
        let manager = JwtManager::new("test-secret".to_string(), 3600, 86400);
        let pair = manager.issue_pair(&employee(Role::Cashier)).unwrap();

        assert!(manager.validate_refresh_token(&pair.access_token).is_err());
        assert!(manager.validate_access_token(&pair.refresh_token).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let issuer = JwtManager::new("secret-a".to_string(), 3600, 86400);
        let verifier = JwtManager::new("secret-b".to_string(), 3600, 86400);
        let pair = issuer.issue_pair(&employee(Role::Admin)).unwrap();

        let err = verifier.validate_access_token(&pair.access_token).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn test_dummy_hash_is_a_real_argon2_hash() {
        let hash = dummy_hash().unwrap();
        assert!(PasswordHash::new(hash).is_ok());
        assert!(!verify_password("correct horse", hash));
        verify_dummy_password("correct horse");
    }

    #[test]
    fn test_require_role() {
        let user = AuthUser {
            employee_id: "e".into(),
            role: Role::Manager,
        };
        assert!(user.require(Role::Cashier).is_ok());
        assert!(user.require(Role::Manager).is_ok());
        assert_eq!(
            user.require(Role::Admin).unwrap_err().status,
            axum::http::StatusCode::FORBIDDEN
        );
    }
}
