//! Password hashing, JWT issuing/validation and the `AuthUser` extractor.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::db_utils::AppState;
use crate::types::Role;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, issuer: &str, ttl_minutes: i64) -> Self {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_owned(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, user_id: i64, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AppError::Internal(format!("unable to sign token: {err}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => {
                    tracing::warn!(error = %err, "rejected bearer token");
                    AppError::Unauthorized
                }
            })
    }
}

/// The caller identified by a valid bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

impl AuthUser {
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            tracing::warn!(user_id = self.id, role = %self.role, "forbidden");
            Err(AppError::Forbidden)
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        self.require(&[Role::Staff, Role::Admin])
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require(&[Role::Admin])
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let state = req
        .app_data::<Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state is not configured".into()))?;

    let token = bearer_token(req).ok_or(AppError::Unauthorized)?;
    let claims = state.jwt.verify(token)?;
    let id = claims.sub.parse::<i64>().map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser { id, role: claims.role })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("rahasia123", &hash));
        assert!(!verify_password("rahasia124", &hash));
        assert!(!verify_password("rahasia123", "not-a-phc-string"));
    }

    #[test]
    fn issued_token_round_trips() {
        let keys = JwtKeys::new(SECRET, "nusa-resto", 60);
        let token = keys.issue(42, Role::Staff).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let keys = JwtKeys::new(SECRET, "nusa-resto", -10);
        let token = keys.issue(1, Role::Customer).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::TokenExpired)));
    }

    #[test]
    fn token_from_other_secret_or_issuer_is_rejected() {
        let keys = JwtKeys::new(SECRET, "nusa-resto", 60);
        let foreign = JwtKeys::new("ffffffffffffffffffffffffffffffff", "nusa-resto", 60);
        let other_issuer = JwtKeys::new(SECRET, "someone-else", 60);

        let token = foreign.issue(1, Role::Admin).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::Unauthorized)));

        let token = other_issuer.issue(1, Role::Admin).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn role_requirements() {
        let customer = AuthUser { id: 1, role: Role::Customer };
        let staff = AuthUser { id: 2, role: Role::Staff };
        let admin = AuthUser { id: 3, role: Role::Admin };

        assert!(matches!(customer.require_staff(), Err(AppError::Forbidden)));
        assert!(staff.require_staff().is_ok());
        assert!(matches!(staff.require_admin(), Err(AppError::Forbidden)));
        assert!(admin.require_admin().is_ok());
    }
}
