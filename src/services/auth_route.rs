//! `/api/auth`: registration and login.

use actix_web::web::{Data, Json};
use actix_web::{post, HttpResponse};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::services::auth::{hash_password, verify_password};
use crate::services::db_models::User;
use crate::services::db_utils::AppState;
use crate::services::messages::{FetchUserByEmail, RegisterUser};
use crate::services::response;

#[derive(Deserialize, Validate)]
pub struct RegisterBody {
    #[validate(length(min = 3, max = 100, message = "must be between 3 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(min = 6, max = 30, message = "must be between 6 and 30 characters"))]
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 128, message = "must be at least 8 characters"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginBody {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

fn token_response(state: &AppState, user: User) -> Result<TokenResponse, AppError> {
    Ok(TokenResponse {
        token: state.jwt.issue(user.id, user.role)?,
        token_type: "Bearer",
        expires_in: state.jwt.ttl_seconds(),
        user,
    })
}

/// Trims optional text; a blank value counts as absent.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()))
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[post("/register")]
pub async fn register(state: Data<AppState>, body: Json<RegisterBody>) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let body = body.into_inner();

    let user = state
        .pg_db
        .send(RegisterUser {
            name: body.name.trim().to_owned(),
            email: normalize_email(&body.email),
            phone: body.phone,
            password_hash: hash_password(&body.password)?,
        })
        .await??;

    tracing::info!(user_id = user.id, "user registered");
    Ok(response::created(token_response(&state, user)?))
}

#[post("/login")]
pub async fn login(state: Data<AppState>, body: Json<LoginBody>) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let user = match state.pg_db.send(FetchUserByEmail(normalize_email(&body.email))).await? {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => return Err(AppError::InvalidCredentials),
        Err(err) => return Err(err),
    };

    if !verify_password(&body.password, &user.password_hash) {
        tracing::warn!(user_id = user.id, "failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    Ok(response::ok(token_response(&state, user)?))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use serde_json::json;

    use super::*;
    use crate::services::configure;
    use crate::services::test_support::test_state;

    #[test]
    fn emails_are_compared_case_insensitively() {
        assert_eq!(normalize_email("  Sari@Example.COM "), "sari@example.com");
    }

    #[test]
    fn blank_phone_is_optional_on_registration() {
        let body: RegisterBody = serde_json::from_value(json!({
            "name": "Sari",
            "email": "sari@example.com",
            "phone": "   ",
            "password": "rahasia123",
        }))
        .unwrap();
        assert_eq!(body.phone, None);
        assert!(body.validate().is_ok());

        let body: RegisterBody = serde_json::from_value(json!({
            "name": "Sari",
            "email": "sari@example.com",
            "phone": " 0812 ",
            "password": "rahasia123",
        }))
        .unwrap();
        assert_eq!(body.phone.as_deref(), Some("0812"));
        assert!(body.validate().is_err());
    }

    #[actix_web::test]
    async fn register_rejects_short_password_before_touching_the_database() {
        let app = actix_test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "name": "Sari", "email": "sari@example.com", "password": "short" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
