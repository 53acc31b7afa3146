// sub-route "/api/orders"

use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, patch, post, put, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::services::auth::AuthUser;
use crate::services::bookings_route::{parse_status, StatusBody};
use crate::services::db_utils::AppState;
use crate::services::messages::{
    AddItemToOrder, CreateOrder, DecrementItemInOrder, GetOrder, ListOrders, RemoveItemFromOrder, UpdateOrderStatus,
};
use crate::services::pagination::{ListQuery, Page, ADMIN_PAGE_SIZE};
use crate::services::response;
use crate::types::OrderStatus;

#[derive(Deserialize)]
pub struct NewOrderBody {
    pub booking_id: i64,
}

#[post("")]
pub async fn create_order(auth: AuthUser, state: Data<AppState>, body: Json<NewOrderBody>) -> Result<HttpResponse, AppError> {
    auth.require_staff()?;

    let order = state.pg_db.send(CreateOrder(body.booking_id)).await??;

    tracing::info!(order_id = order.id, booking_id = order.booking_id, "order opened");
    Ok(response::created(order))
}

#[get("")]
pub async fn list_orders(auth: AuthUser, state: Data<AppState>, query: Query<ListQuery>) -> Result<HttpResponse, AppError> {
    auth.require_staff()?;

    let orders = state
        .pg_db
        .send(ListOrders {
            status: parse_status::<OrderStatus>(query.status.as_deref())?,
            page: Page::new(query.page, ADMIN_PAGE_SIZE),
        })
        .await??;

    Ok(response::ok(orders))
}

#[get("/{order_id}")]
pub async fn get_order(auth: AuthUser, state: Data<AppState>, path: Path<i64>) -> Result<HttpResponse, AppError> {
    auth.require_staff()?;

    let order = state.pg_db.send(GetOrder(path.into_inner())).await??;
    Ok(response::ok(order))
}

#[post("/{order_id}/items/{menu_id}")]
pub async fn add_item_to_order(
    auth: AuthUser,
    state: Data<AppState>,
    path: Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    auth.require_staff()?;
    let (order_id, menu_id) = path.into_inner();

    let order = state.pg_db.send(AddItemToOrder { order_id, menu_id }).await??;
    Ok(response::ok(order))
}

#[put("/{order_id}/items/{menu_id}/decrement")]
pub async fn decrement_item_in_order(
    auth: AuthUser,
    state: Data<AppState>,
    path: Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    auth.require_staff()?;
    let (order_id, menu_id) = path.into_inner();

    let order = state.pg_db.send(DecrementItemInOrder { order_id, menu_id }).await??;
    Ok(response::ok(order))
}

#[delete("/{order_id}/items/{menu_id}")]
pub async fn remove_item_from_order(
    auth: AuthUser,
    state: Data<AppState>,
    path: Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    auth.require_staff()?;
    let (order_id, menu_id) = path.into_inner();

    let order = state.pg_db.send(RemoveItemFromOrder { order_id, menu_id }).await??;
    Ok(response::ok(order))
}

#[patch("/{order_id}/status")]
pub async fn update_order_status(
    auth: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
    body: Json<StatusBody<OrderStatus>>,
) -> Result<HttpResponse, AppError> {
    auth.require_staff()?;
    let id = path.into_inner();

    let order = state.pg_db.send(UpdateOrderStatus { id, status: body.status }).await??;

    tracing::info!(order_id = id, status = %order.status, by = auth.id, "order status changed");
    Ok(response::ok(order))
}
