use actix_web::web::{Data, Json};
use actix_web::{get, patch, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::services::auth::AuthUser;
use crate::services::auth_route::normalize_email;
use crate::services::db_utils::AppState;
use crate::services::insertable::UserChanges;
use crate::services::messages::{FetchUser, UpdateUser};
use crate::services::response;

#[derive(Deserialize, Validate, Default)]
pub struct ProfileBody {
    #[validate(length(min = 3, max = 100, message = "must be between 3 and 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    /// An empty string clears the stored number.
    #[validate(length(max = 30, message = "must be at most 30 characters"))]
    pub phone: Option<String>,
}

impl ProfileBody {
    pub fn into_changes(self) -> UserChanges {
        UserChanges {
            name: self.name.map(|n| n.trim().to_owned()),
            email: self.email.as_deref().map(normalize_email),
            phone: self.phone.map(|p| Some(p.trim().to_owned()).filter(|p| !p.is_empty())),
            role: None,
        }
    }
}

#[get("")]
pub async fn get_profile(auth: AuthUser, state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let user = state.pg_db.send(FetchUser(auth.id)).await??;
    Ok(response::ok(user))
}

#[patch("")]
pub async fn update_profile(
    auth: AuthUser,
    state: Data<AppState>,
    body: Json<ProfileBody>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let user = state
        .pg_db
        .send(UpdateUser { id: auth.id, changes: body.into_inner().into_changes() })
        .await??;

    Ok(response::ok_with_message(user, "Profile updated"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_phone_clears_and_email_is_normalized() {
        let body = ProfileBody {
            email: Some(" Budi@Mail.com".into()),
            phone: Some("  ".into()),
            ..Default::default()
        };
        let changes = body.into_changes();

        assert_eq!(changes.email.as_deref(), Some("budi@mail.com"));
        assert_eq!(changes.phone, Some(None));
        assert!(changes.name.is_none());
        assert!(changes.role.is_none());
    }

    #[test]
    fn empty_body_changes_nothing() {
        assert!(ProfileBody::default().into_changes().is_empty());
    }
}
