// sub-route "/api/bookings"

use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, patch, post, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::services::auth::AuthUser;
use crate::services::booking_rules::TimeWindow;
use crate::services::db_utils::AppState;
use crate::services::messages::{CancelBooking, CreateBooking, FetchBooking, ListBookings, UpdateBookingStatus};
use crate::services::pagination::{ListQuery, Page, ADMIN_PAGE_SIZE};
use crate::services::response;
use crate::types::BookingStatus;

#[derive(Deserialize, Validate)]
pub struct BookingBody {
    pub date_time: DateTime<Utc>,
    pub guest_count: i32,
    pub duration_minutes: Option<i32>,
    pub table_id: Option<i64>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub special_request: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusBody<S> {
    pub status: S,
}

pub(crate) fn parse_status<S: std::str::FromStr>(raw: Option<&str>) -> Result<Option<S>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => text
            .to_uppercase()
            .parse::<S>()
            .map(Some)
            .map_err(|_| AppError::bad_request(format!("unknown status '{text}'"))),
        None => Ok(None),
    }
}

#[post("")]
pub async fn create_booking(
    auth: AuthUser,
    state: Data<AppState>,
    body: Json<BookingBody>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let body = body.into_inner();
    let policy = &state.policy;

    let duration = policy.resolve_duration(body.duration_minutes);
    policy.validate_request(Utc::now(), body.date_time, duration, body.guest_count)?;
    let window = TimeWindow::new(body.date_time, duration);

    let booking = state
        .pg_db
        .send(CreateBooking {
            user_id: auth.id,
            window,
            duration_minutes: duration,
            guest_count: body.guest_count,
            table_id: body.table_id,
            special_request: body.special_request.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()),
            lookback: policy.overlap_lookback(window.start),
        })
        .await??;

    Ok(response::created(booking))
}

#[get("")]
pub async fn list_bookings(
    auth: AuthUser,
    state: Data<AppState>,
    query: Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let status = parse_status::<BookingStatus>(query.status.as_deref())?;

    let bookings = state
        .pg_db
        .send(ListBookings {
            user_id: (!auth.is_staff()).then_some(auth.id),
            status,
            page: Page::new(query.page, ADMIN_PAGE_SIZE),
        })
        .await??;

    Ok(response::ok(bookings))
}

#[get("/{id}")]
pub async fn get_booking(auth: AuthUser, state: Data<AppState>, path: Path<i64>) -> Result<HttpResponse, AppError> {
    let booking = state
        .pg_db
        .send(FetchBooking {
            id: path.into_inner(),
            owner_id: (!auth.is_staff()).then_some(auth.id),
            policy: state.policy.clone(),
            now: Utc::now(),
        })
        .await??;

    Ok(response::ok(booking))
}

#[delete("/{id}")]
pub async fn cancel_booking(auth: AuthUser, state: Data<AppState>, path: Path<i64>) -> Result<HttpResponse, AppError> {
    let booking = state
        .pg_db
        .send(CancelBooking {
            id: path.into_inner(),
            requester_id: auth.id,
            by_staff: auth.is_staff(),
            policy: state.policy.clone(),
            now: Utc::now(),
        })
        .await??;

    Ok(response::ok_with_message(booking, "Booking cancelled"))
}

#[patch("/{id}/status")]
pub async fn update_booking_status(
    auth: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
    body: Json<StatusBody<BookingStatus>>,
) -> Result<HttpResponse, AppError> {
    auth.require_staff()?;
    let id = path.into_inner();

    let booking = state.pg_db.send(UpdateBookingStatus { id, status: body.status }).await??;

    tracing::info!(booking_id = id, status = %booking.status, by = auth.id, "booking status changed");
    Ok(response::ok(booking))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::services::configure;
    use crate::services::test_support::{bearer, test_state};
    use crate::types::{OrderStatus, Role};

    #[test]
    fn status_filter_is_case_insensitive_and_optional() {
        assert_eq!(parse_status::<BookingStatus>(Some("confirmed")).unwrap(), Some(BookingStatus::Confirmed));
        assert_eq!(parse_status::<OrderStatus>(Some(" ")).unwrap(), None);
        assert_eq!(parse_status::<OrderStatus>(None).unwrap(), None);
        assert!(matches!(parse_status::<BookingStatus>(Some("seated")), Err(AppError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn booking_in_the_past_is_refused_as_too_soon() {
        let state = test_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/bookings")
            .insert_header(bearer(&state, 3, Role::Customer))
            .set_json(json!({ "date_time": "2020-01-06T05:00:00Z", "guest_count": 2 }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = actix_test::read_body_json(resp).await;
        assert!(body["message"].as_str().unwrap().contains("at least"));
    }

    #[actix_web::test]
    async fn far_future_booking_is_refused_without_panicking() {
        let state = test_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/bookings")
            .insert_header(bearer(&state, 3, Role::Customer))
            .set_json(json!({ "date_time": "+262142-12-31T22:30:00Z", "guest_count": 2 }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = actix_test::read_body_json(resp).await;
        assert!(body["message"].as_str().unwrap().contains("at most 90 days"));
    }

    #[actix_web::test]
    async fn overlong_special_request_is_a_validation_error() {
        let state = test_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/bookings")
            .insert_header(bearer(&state, 3, Role::Customer))
            .set_json(json!({
                "date_time": "2099-01-05T05:00:00Z",
                "guest_count": 2,
                "special_request": "x".repeat(501),
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn customers_cannot_change_booking_status() {
        let state = test_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let req = actix_test::TestRequest::patch()
            .uri("/api/bookings/7/status")
            .insert_header(bearer(&state, 3, Role::Customer))
            .set_json(json!({ "status": "CONFIRMED" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
