use actix_web::web::{self, Data};
use actix_web::{get, HttpResponse};
use serde_json::json;

use crate::error::AppError;
use crate::services::db_utils::AppState;
use crate::services::messages::{FetchBestSellers, FetchCategories};
use crate::types::RESTAURANT_NAME;

pub mod admin_route;
pub mod auth;
pub mod auth_route;
pub mod booking_rules;
pub mod bookings_route;
pub mod db_models;
pub mod db_utils;
pub mod insertable;
pub mod menu_route;
pub mod messages;
pub mod order_route;
pub mod pagination;
pub mod pg_handling;
pub mod profile_route;
pub mod redis_handling;
pub mod response;
pub mod sweeper;
pub mod tables_route;
pub mod users_route;

const TAGLINE: &str = "Authentic Indonesian flavours, served the way grandmother made them";
const BEST_SELLER_COUNT: usize = 3;

/// Registers every page and API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(response::json_config())
        .app_data(response::query_config())
        .service(home_page)
        .service(pages_route::about_page)
        .service(pages_route::contact_page)
        .service(pages_route::submit_contact)
        .service(pages_route::booking_page)
        .service(pages_route::menu_page)
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .service(auth_route::register)
                        .service(auth_route::login),
                )
                .service(
                    web::scope("/profile")
                        .service(profile_route::get_profile)
                        .service(profile_route::update_profile),
                )
                .service(
                    web::scope("/menus")
                        .service(menu_route::list_menus)
                        .service(menu_route::get_menu)
                        .service(menu_route::create_menu)
                        .service(menu_route::update_menu)
                        .service(menu_route::delete_menu),
                )
                .service(
                    web::scope("/categories")
                        .service(menu_route::list_categories)
                        .service(menu_route::create_category)
                        .service(menu_route::rename_category)
                        .service(menu_route::delete_category),
                )
                .service(
                    web::scope("/tables")
                        .service(tables_route::available_tables)
                        .service(tables_route::list_tables)
                        .service(tables_route::create_table)
                        .service(tables_route::update_table)
                        .service(tables_route::delete_table),
                )
                .service(
                    web::scope("/bookings")
                        .service(bookings_route::create_booking)
                        .service(bookings_route::list_bookings)
                        .service(bookings_route::get_booking)
                        .service(bookings_route::cancel_booking)
                        .service(bookings_route::update_booking_status),
                )
                .service(
                    web::scope("/orders")
                        .service(order_route::create_order)
                        .service(order_route::list_orders)
                        .service(order_route::get_order)
                        .service(order_route::add_item_to_order)
                        .service(order_route::decrement_item_in_order)
                        .service(order_route::remove_item_from_order)
                        .service(order_route::update_order_status),
                )
                .service(
                    web::scope("/users")
                        .service(users_route::list_users)
                        .service(users_route::get_user)
                        .service(users_route::update_user)
                        .service(users_route::delete_user),
                )
                .service(admin_route::list_contact_messages)
                .service(admin_route::dashboard_stats),
        )
        .service(web::scope("/test").service(test_route::healthcheck));
}

#[get("/")]
pub async fn home_page(state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let (best_sellers, categories) = futures::try_join!(
        state.pg_db.send(FetchBestSellers(BEST_SELLER_COUNT)),
        state.pg_db.send(FetchCategories),
    )?;
    let (best_sellers, categories) = (best_sellers?, categories?);

    Ok(response::ok(json!({
        "name": RESTAURANT_NAME,
        "tagline": TAGLINE,
        "openingHours": state.policy.opening_hours,
        "bestSellers": best_sellers,
        "categories": categories,
    })))
}

// public page models
pub mod pages_route {
    use actix_web::web::{Data, Json, Query};
    use actix_web::{get, post, HttpResponse};
    use serde::Deserialize;
    use serde_json::json;
    use validator::Validate;

    use crate::error::AppError;
    use crate::services::db_utils::AppState;
    use crate::services::insertable::NewContactMessage;
    use crate::services::messages::{FetchCategories, FetchTableCapacities, SaveContactMessage};
    use crate::services::pagination::{Page, Paginated, MENU_PAGE_SIZE};
    use crate::services::redis_handling::load_menu;
    use crate::services::response;
    use crate::types::RESTAURANT_NAME;

    pub const ADDRESS: &str = "Jl. Malioboro No. 52, Yogyakarta 55271";
    pub const PHONE: &str = "+62 274 512 345";
    pub const EMAIL: &str = "halo@citanusa.id";

    #[get("/about")]
    pub async fn about_page() -> HttpResponse {
        response::ok(json!({
            "name": RESTAURANT_NAME,
            "story": "Cita Nusa started as a family kitchen in Yogyakarta and grew into a \
                      restaurant celebrating recipes from across the archipelago.",
            "values": ["Fresh local ingredients", "Recipes passed down through generations", "Warm hospitality"],
        }))
    }

    #[get("/contact")]
    pub async fn contact_page(state: Data<AppState>) -> HttpResponse {
        response::ok(json!({
            "name": RESTAURANT_NAME,
            "address": ADDRESS,
            "phone": PHONE,
            "email": EMAIL,
            "openingHours": state.policy.opening_hours,
        }))
    }

    #[derive(Deserialize, Validate)]
    pub struct ContactForm {
        #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
        pub name: String,
        #[validate(email(message = "must be a valid email address"))]
        pub email: String,
        #[validate(length(min = 3, max = 255, message = "must be between 3 and 255 characters"))]
        pub subject: String,
        #[validate(length(min = 10, max = 5000, message = "must be between 10 and 5000 characters"))]
        pub message: String,
    }

    #[post("/contact")]
    pub async fn submit_contact(state: Data<AppState>, body: Json<ContactForm>) -> Result<HttpResponse, AppError> {
        body.validate()?;
        let form = body.into_inner();

        let saved = state
            .pg_db
            .send(SaveContactMessage(NewContactMessage {
                name: form.name.trim().to_owned(),
                email: form.email.trim().to_lowercase(),
                subject: form.subject.trim().to_owned(),
                message: form.message.trim().to_owned(),
            }))
            .await??;

        tracing::info!(message_id = saved.id, "contact message received");
        Ok(HttpResponse::Created().json(response::ApiResponse::with_message(
            saved,
            "Thank you, we will get back to you soon",
        )))
    }

    #[get("/booking")]
    pub async fn booking_page(state: Data<AppState>) -> Result<HttpResponse, AppError> {
        let capacities = state.pg_db.send(FetchTableCapacities).await??;
        let policy = &state.policy;

        Ok(response::ok(json!({
            "openingHours": policy.opening_hours,
            "tableCapacities": capacities,
            "maxGuestCount": policy.max_guest_count,
            "defaultDurationMinutes": policy.default_duration_minutes,
            "minDurationMinutes": policy.min_duration_minutes,
            "maxDurationMinutes": policy.max_duration_minutes,
            "leadTimeMinutes": policy.lead_time.num_minutes(),
            "maxAdvanceDays": policy.max_advance.num_days(),
            "cancelWindowMinutes": policy.cancel_window.num_minutes(),
            "holdMinutes": policy.hold.num_minutes(),
            "utcOffsetHours": policy.utc_offset_hours,
        })))
    }

    #[derive(Deserialize)]
    pub struct MenuPageQuery {
        pub category: Option<i64>,
        pub page: Option<i64>,
    }

    #[get("/menu")]
    pub async fn menu_page(state: Data<AppState>, query: Query<MenuPageQuery>) -> Result<HttpResponse, AppError> {
        let categories = state.pg_db.send(FetchCategories).await??;

        let menus = load_menu(&state)
            .await?
            .into_iter()
            .filter(|m| m.menu.is_available)
            .filter(|m| query.category.map_or(true, |id| m.menu.category_id == id))
            .collect();

        Ok(response::ok(json!({
            "categories": categories,
            "selectedCategory": query.category,
            "menus": Paginated::from_vec(menus, Page::new(query.page, MENU_PAGE_SIZE)),
        })))
    }
}

// sub-route "/test"
pub mod test_route {
    use actix_web::{get, HttpResponse};
    use serde_json::json;

    use crate::services::response;
    use crate::types::RESTAURANT_NAME;

    #[get("/healthcheck")]
    pub async fn healthcheck() -> HttpResponse {
        response::ok(json!({ "status": "alive", "service": RESTAURANT_NAME }))
    }
}


#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use serde_json::Value;

    use super::test_support::{bearer, test_state};
    use super::*;
    use crate::types::Role;

    #[actix_web::test]
    async fn healthcheck_reports_alive() {
        let app = actix_test::init_service(App::new().configure(configure)).await;
        let req = actix_test::TestRequest::get().uri("/test/healthcheck").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "alive");
    }

    #[actix_web::test]
    async fn about_and_contact_pages_are_public() {
        let app = actix_test::init_service(App::new().app_data(test_state()).configure(configure)).await;

        let req = actix_test::TestRequest::get().uri("/about").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["name"], RESTAURANT_NAME);

        let req = actix_test::TestRequest::get().uri("/contact").to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["email"], pages_route::EMAIL);
        assert_eq!(body["data"]["openingHours"]["weekday"]["open"], "11:00:00");
    }

    #[actix_web::test]
    async fn invalid_contact_form_is_rejected_with_field_messages() {
        let app = actix_test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = actix_test::TestRequest::post()
            .uri("/contact")
            .set_json(json!({ "name": "A", "email": "nope", "subject": "Hi", "message": "short" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        let message = body["message"].as_str().unwrap();
        for field in ["email", "message", "name", "subject"] {
            assert!(message.contains(field), "{message} should mention {field}");
        }
    }

    #[actix_web::test]
    async fn malformed_json_uses_error_envelope() {
        let app = actix_test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = actix_test::TestRequest::post()
            .uri("/contact")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn protected_routes_require_a_token() {
        let app = actix_test::init_service(App::new().app_data(test_state()).configure(configure)).await;

        for uri in ["/api/profile", "/api/bookings", "/api/orders", "/api/admin/dashboard-stats"] {
            let req = actix_test::TestRequest::get().uri(uri).to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }

        let req = actix_test::TestRequest::get()
            .uri("/api/profile")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn customers_cannot_reach_staff_and_admin_routes() {
        let state = test_state();
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        for uri in ["/api/tables", "/api/orders", "/api/users", "/api/contact-messages", "/api/admin/dashboard-stats"] {
            let req = actix_test::TestRequest::get()
                .uri(uri)
                .insert_header(bearer(&state, 5, Role::Customer))
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
        }

        let req = actix_test::TestRequest::get()
            .uri("/api/users")
            .insert_header(bearer(&state, 6, Role::Staff))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
