// sub-route "/api/users", admin only

use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, patch, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::AppError;
use crate::services::auth::AuthUser;
use crate::services::auth_route::normalize_email;
use crate::services::db_utils::AppState;
use crate::services::insertable::UserChanges;
use crate::services::messages::{DeleteUser, FetchUser, ListUsers, UpdateUser};
use crate::services::pagination::{ListQuery, Page, ADMIN_PAGE_SIZE};
use crate::services::response;
use crate::types::Role;

#[derive(Deserialize, Validate, Default)]
pub struct UserPatch {
    #[validate(length(min = 3, max = 100, message = "must be between 3 and 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 30, message = "must be at most 30 characters"))]
    pub phone: Option<String>,
    pub role: Option<Role>,
}

impl From<UserPatch> for UserChanges {
    fn from(patch: UserPatch) -> Self {
        UserChanges {
            name: patch.name.map(|n| n.trim().to_owned()),
            email: patch.email.as_deref().map(normalize_email),
            phone: patch.phone.map(|p| Some(p.trim().to_owned()).filter(|p| !p.is_empty())),
            role: patch.role,
        }
    }
}

#[get("")]
pub async fn list_users(auth: AuthUser, state: Data<AppState>, query: Query<ListQuery>) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let users = state
        .pg_db
        .send(ListUsers { search: query.search_term(), page: Page::new(query.page, ADMIN_PAGE_SIZE) })
        .await??;

    Ok(response::ok(users))
}

#[get("/{id}")]
pub async fn get_user(auth: AuthUser, state: Data<AppState>, path: Path<i64>) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let user = state.pg_db.send(FetchUser(path.into_inner())).await??;
    Ok(response::ok(user))
}

#[patch("/{id}")]
pub async fn update_user(
    auth: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
    body: Json<UserPatch>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    body.validate()?;
    let id = path.into_inner();

    let user = state.pg_db.send(UpdateUser { id, changes: body.into_inner().into() }).await??;

    tracing::info!(user_id = id, role = %user.role, by = auth.id, "user updated");
    Ok(response::ok(user))
}

#[delete("/{id}")]
pub async fn delete_user(auth: AuthUser, state: Data<AppState>, path: Path<i64>) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let id = path.into_inner();

    if id == auth.id {
        return Err(AppError::bad_request("you cannot delete your own account"));
    }

    state.pg_db.send(DeleteUser(id)).await??;

    tracing::info!(user_id = id, by = auth.id, "user deleted");
    Ok(response::ok(json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};

    use super::*;
    use crate::services::configure;
    use crate::services::test_support::{bearer, test_state};

    #[actix_web::test]
    async fn admin_cannot_delete_themself() {
        let state = test_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let req = actix_test::TestRequest::delete()
            .uri("/api/users/1")
            .insert_header(bearer(&state, 1, Role::Admin))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn patch_can_promote_a_user() {
        let changes = UserChanges::from(UserPatch { role: Some(Role::Staff), ..Default::default() });
        assert_eq!(changes.role, Some(Role::Staff));
        assert!(!changes.is_empty());
    }
}
