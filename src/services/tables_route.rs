// sub-route "/api/tables"

use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, patch, post, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::AppError;
use crate::services::auth::AuthUser;
use crate::services::booking_rules::TimeWindow;
use crate::services::db_utils::AppState;
use crate::services::insertable::{NewTable, TableChanges};
use crate::services::messages::{CreateTable, DeleteTable, FindAvailableTables, ListTables, UpdateTable};
use crate::services::pagination::{ListQuery, Page, ADMIN_PAGE_SIZE};
use crate::services::response;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date_time: DateTime<Utc>,
    pub guest_count: i32,
    pub duration_minutes: Option<i32>,
}

#[derive(Deserialize, Validate)]
pub struct TableBody {
    #[validate(range(min = 1, message = "must be a positive number"))]
    pub table_number: i32,
    #[validate(range(min = 1, max = 50, message = "must be between 1 and 50"))]
    pub capacity: i32,
    #[serde(default = "open_by_default")]
    pub is_available: bool,
}

fn open_by_default() -> bool {
    true
}

#[derive(Deserialize, Validate, Default)]
pub struct TablePatch {
    #[validate(range(min = 1, message = "must be a positive number"))]
    pub table_number: Option<i32>,
    #[validate(range(min = 1, max = 50, message = "must be between 1 and 50"))]
    pub capacity: Option<i32>,
    pub is_available: Option<bool>,
}

#[get("/available")]
pub async fn available_tables(
    _auth: AuthUser,
    state: Data<AppState>,
    query: Query<AvailabilityQuery>,
) -> Result<HttpResponse, AppError> {
    let policy = &state.policy;
    let duration = policy.resolve_duration(query.duration_minutes);
    policy.validate_request(Utc::now(), query.date_time, duration, query.guest_count)?;

    let window = TimeWindow::new(query.date_time, duration);
    let tables = state
        .pg_db
        .send(FindAvailableTables {
            window,
            guest_count: query.guest_count,
            lookback: policy.overlap_lookback(window.start),
        })
        .await??;

    Ok(response::ok(json!({
        "window": window,
        "guestCount": query.guest_count,
        "durationMinutes": duration,
        "tables": tables,
    })))
}

#[get("")]
pub async fn list_tables(auth: AuthUser, state: Data<AppState>, query: Query<ListQuery>) -> Result<HttpResponse, AppError> {
    auth.require_staff()?;

    let tables = state
        .pg_db
        .send(ListTables { search: query.search_term(), page: Page::new(query.page, ADMIN_PAGE_SIZE) })
        .await??;

    Ok(response::ok(tables))
}

#[post("")]
pub async fn create_table(auth: AuthUser, state: Data<AppState>, body: Json<TableBody>) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    body.validate()?;

    let table = state
        .pg_db
        .send(CreateTable(NewTable {
            table_number: body.table_number,
            capacity: body.capacity,
            is_available: body.is_available,
        }))
        .await??;

    tracing::info!(table_id = table.id, table_number = table.table_number, "table created");
    Ok(response::created(table))
}

#[patch("/{id}")]
pub async fn update_table(
    auth: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
    body: Json<TablePatch>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    body.validate()?;

    let table = state
        .pg_db
        .send(UpdateTable {
            id: path.into_inner(),
            changes: TableChanges {
                table_number: body.table_number,
                capacity: body.capacity,
                is_available: body.is_available,
            },
        })
        .await??;

    Ok(response::ok(table))
}

#[delete("/{id}")]
pub async fn delete_table(auth: AuthUser, state: Data<AppState>, path: Path<i64>) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let id = path.into_inner();

    state.pg_db.send(DeleteTable(id)).await??;

    tracing::info!(table_id = id, "table deleted");
    Ok(response::ok(json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use serde_json::Value;

    use super::*;
    use crate::services::configure;
    use crate::services::test_support::{bearer, test_state};
    use crate::types::Role;

    #[actix_web::test]
    async fn availability_rejects_rule_violations_with_422() {
        let state = test_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        // a party of twelve is over the limit regardless of the date
        let req = actix_test::TestRequest::get()
            .uri("/api/tables/available?date_time=2099-01-05T05:00:00Z&guest_count=12")
            .insert_header(bearer(&state, 1, Role::Customer))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = actix_test::read_body_json(resp).await;
        assert!(body["message"].as_str().unwrap().contains("guest count"));
    }

    #[actix_web::test]
    async fn availability_refuses_dates_past_the_booking_horizon() {
        let state = test_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/tables/available?date_time=%2B262142-12-31T22:30:00Z&guest_count=2")
            .insert_header(bearer(&state, 1, Role::Customer))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn availability_needs_a_parsable_date() {
        let state = test_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/tables/available?date_time=tomorrow&guest_count=2")
            .insert_header(bearer(&state, 1, Role::Customer))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn table_capacity_is_bounded() {
        let body = TableBody { table_number: 4, capacity: 0, is_available: true };
        assert!(body.validate().is_err());
        let patch = TablePatch { table_number: Some(0), ..Default::default() };
        assert!(patch.validate().is_err());
    }
}
