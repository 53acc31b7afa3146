use actix_web::web::{Data, Query};
use actix_web::{get, HttpResponse};

use crate::error::AppError;
use crate::services::auth::AuthUser;
use crate::services::db_utils::AppState;
use crate::services::messages::{FetchDashboardStats, ListContactMessages};
use crate::services::pagination::{ListQuery, Page, ADMIN_PAGE_SIZE};
use crate::services::response;

#[get("/contact-messages")]
pub async fn list_contact_messages(
    auth: AuthUser,
    state: Data<AppState>,
    query: Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let messages = state
        .pg_db
        .send(ListContactMessages(Page::new(query.page, ADMIN_PAGE_SIZE)))
        .await??;

    Ok(response::ok(messages))
}

#[get("/admin/dashboard-stats")]
pub async fn dashboard_stats(auth: AuthUser, state: Data<AppState>) -> Result<HttpResponse, AppError> {
    auth.require_staff()?;

    let stats = state.pg_db.send(FetchDashboardStats).await??;
    Ok(response::ok(stats))
}
