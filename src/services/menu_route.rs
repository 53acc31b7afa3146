// sub-routes "/api/menus" and "/api/categories"

use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, patch, post, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::AppError;
use crate::services::auth::AuthUser;
use crate::services::db_utils::AppState;
use crate::services::insertable::{MenuChanges, NewMenu};
use crate::services::messages::{
    CreateCategory, CreateMenu, DeleteCategory, DeleteMenu, FetchCategories, FetchMenu, RenameCategory, UpdateMenu,
};
use crate::services::redis_handling::{invalidate_menu_logged, load_menu};
use crate::services::response;

#[derive(Deserialize)]
pub struct MenuListQuery {
    pub category: Option<i64>,
    pub available: Option<bool>,
}

#[derive(Deserialize, Validate)]
pub struct MenuBody {
    #[validate(length(min = 2, max = 255, message = "must be between 2 and 255 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "must be a positive amount of rupiah"))]
    pub price: i32,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub image: Option<String>,
    pub category_id: i64,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
}

fn available_by_default() -> bool {
    true
}

/// Blank optional text clears the column.
fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

impl From<MenuBody> for NewMenu {
    fn from(body: MenuBody) -> Self {
        NewMenu {
            name: body.name.trim().to_owned(),
            description: optional_text(body.description),
            price: body.price,
            image: optional_text(body.image),
            category_id: body.category_id,
            is_available: body.is_available,
        }
    }
}

#[derive(Deserialize, Validate, Default)]
pub struct MenuPatch {
    #[validate(length(min = 2, max = 255, message = "must be between 2 and 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "must be a positive amount of rupiah"))]
    pub price: Option<i32>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub is_available: Option<bool>,
}

impl From<MenuPatch> for MenuChanges {
    fn from(patch: MenuPatch) -> Self {
        MenuChanges {
            name: patch.name.map(|n| n.trim().to_owned()),
            description: patch.description.map(|d| optional_text(Some(d))),
            price: patch.price,
            image: patch.image.map(|i| optional_text(Some(i))),
            category_id: patch.category_id,
            is_available: patch.is_available,
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct CategoryBody {
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: String,
}

#[get("")]
pub async fn list_menus(state: Data<AppState>, query: Query<MenuListQuery>) -> Result<HttpResponse, AppError> {
    let menus: Vec<_> = load_menu(&state)
        .await?
        .into_iter()
        .filter(|m| query.category.map_or(true, |id| m.menu.category_id == id))
        .filter(|m| query.available.map_or(true, |flag| m.menu.is_available == flag))
        .collect();

    Ok(response::ok(menus))
}

#[get("/{id}")]
pub async fn get_menu(state: Data<AppState>, path: Path<i64>) -> Result<HttpResponse, AppError> {
    let menu = state.pg_db.send(FetchMenu(path.into_inner())).await??;
    Ok(response::ok(menu))
}

#[post("")]
pub async fn create_menu(auth: AuthUser, state: Data<AppState>, body: Json<MenuBody>) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    body.validate()?;

    let menu = state.pg_db.send(CreateMenu(body.into_inner().into())).await??;
    invalidate_menu_logged(&state.redis_db);

    tracing::info!(menu_id = menu.id, "menu item created");
    Ok(response::created(menu))
}

#[patch("/{id}")]
pub async fn update_menu(
    auth: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
    body: Json<MenuPatch>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    body.validate()?;

    let menu = state
        .pg_db
        .send(UpdateMenu { id: path.into_inner(), changes: body.into_inner().into() })
        .await??;
    invalidate_menu_logged(&state.redis_db);

    Ok(response::ok(menu))
}

#[delete("/{id}")]
pub async fn delete_menu(auth: AuthUser, state: Data<AppState>, path: Path<i64>) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let id = path.into_inner();

    state.pg_db.send(DeleteMenu(id)).await??;
    invalidate_menu_logged(&state.redis_db);

    tracing::info!(menu_id = id, "menu item deleted");
    Ok(response::ok(json!({ "id": id })))
}

#[get("")]
pub async fn list_categories(state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let categories = state.pg_db.send(FetchCategories).await??;
    Ok(response::ok(categories))
}

#[post("")]
pub async fn create_category(
    auth: AuthUser,
    state: Data<AppState>,
    body: Json<CategoryBody>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    body.validate()?;

    let category = state.pg_db.send(CreateCategory(body.name.trim().to_owned())).await??;
    Ok(response::created(category))
}

#[patch("/{id}")]
pub async fn rename_category(
    auth: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
    body: Json<CategoryBody>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    body.validate()?;

    let category = state
        .pg_db
        .send(RenameCategory { id: path.into_inner(), name: body.name.trim().to_owned() })
        .await??;
    invalidate_menu_logged(&state.redis_db);

    Ok(response::ok(category))
}

#[delete("/{id}")]
pub async fn delete_category(auth: AuthUser, state: Data<AppState>, path: Path<i64>) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let id = path.into_inner();

    state.pg_db.send(DeleteCategory(id)).await??;
    invalidate_menu_logged(&state.redis_db);

    Ok(response::ok(json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};

    use super::*;
    use crate::services::configure;
    use crate::services::test_support::{bearer, test_state};
    use crate::types::Role;

    #[test]
    fn menu_body_trims_text_and_drops_blank_optionals() {
        let body: MenuBody = serde_json::from_value(json!({
            "name": "  Rendang Sapi ",
            "description": "   ",
            "price": 55000,
            "category_id": 2
        }))
        .unwrap();
        let new_menu = NewMenu::from(body);

        assert_eq!(new_menu.name, "Rendang Sapi");
        assert_eq!(new_menu.description, None);
        assert!(new_menu.is_available);
    }

    #[test]
    fn patch_distinguishes_clearing_from_leaving_untouched() {
        let changes = MenuChanges::from(MenuPatch { image: Some(String::new()), ..Default::default() });
        assert_eq!(changes.image, Some(None));
        assert_eq!(changes.description, None);
    }

    #[test]
    fn zero_price_fails_validation() {
        let body: MenuBody =
            serde_json::from_value(json!({ "name": "Es Teh", "price": 0, "category_id": 1 })).unwrap();
        assert!(body.validate().is_err());
    }

    #[actix_web::test]
    async fn staff_cannot_edit_the_menu() {
        let state = test_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/menus")
            .insert_header(bearer(&state, 2, Role::Staff))
            .set_json(json!({ "name": "Sate Ayam", "price": 30000, "category_id": 1 }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
