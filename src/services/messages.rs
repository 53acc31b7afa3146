use actix::Message;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::services::booking_rules::{BookingPolicy, TimeWindow};
use crate::services::db_models::{
    BestSeller, Booking, BookingDetail, BookingListItem, ContactMessage, DashboardStats, Menu, MenuCategory,
    MenuWithCategory, Order, OrderDetail, RestaurantTable, User,
};
use crate::services::insertable::{MenuChanges, NewContactMessage, NewMenu, NewTable, TableChanges, UserChanges};
use crate::services::pagination::{Page, Paginated};
use crate::types::{BookingStatus, OrderStatus};

// users

#[derive(Message)]
#[rtype(result = "Result<User, AppError>")]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

#[derive(Message)]
#[rtype(result = "Result<User, AppError>")]
pub struct FetchUserByEmail(pub String);

#[derive(Message)]
#[rtype(result = "Result<User, AppError>")]
pub struct FetchUser(pub i64);

#[derive(Message)]
#[rtype(result = "Result<Paginated<User>, AppError>")]
pub struct ListUsers {
    pub search: Option<String>,
    pub page: Page,
}

#[derive(Message)]
#[rtype(result = "Result<User, AppError>")]
pub struct UpdateUser {
    pub id: i64,
    pub changes: UserChanges,
}

#[derive(Message)]
#[rtype(result = "Result<(), AppError>")]
pub struct DeleteUser(pub i64);

// tables

#[derive(Message)]
#[rtype(result = "Result<Paginated<RestaurantTable>, AppError>")]
pub struct ListTables {
    pub search: Option<String>,
    pub page: Page,
}

#[derive(Message)]
#[rtype(result = "Result<RestaurantTable, AppError>")]
pub struct CreateTable(pub NewTable);

#[derive(Message)]
#[rtype(result = "Result<RestaurantTable, AppError>")]
pub struct UpdateTable {
    pub id: i64,
    pub changes: TableChanges,
}

#[derive(Message)]
#[rtype(result = "Result<(), AppError>")]
pub struct DeleteTable(pub i64);

/// Distinct capacities of tables open for booking, ascending.
#[derive(Message)]
#[rtype(result = "Result<Vec<i32>, AppError>")]
pub struct FetchTableCapacities;

#[derive(Message)]
#[rtype(result = "Result<Vec<RestaurantTable>, AppError>")]
pub struct FindAvailableTables {
    pub window: TimeWindow,
    pub guest_count: i32,
    pub lookback: DateTime<Utc>,
}

// menus

#[derive(Message)]
#[rtype(result = "Result<Vec<MenuWithCategory>, AppError>")]
pub struct FetchMenus {
    pub only_available: bool,
}

#[derive(Message)]
#[rtype(result = "Result<MenuWithCategory, AppError>")]
pub struct FetchMenu(pub i64);

#[derive(Message)]
#[rtype(result = "Result<Menu, AppError>")]
pub struct CreateMenu(pub NewMenu);

#[derive(Message)]
#[rtype(result = "Result<Menu, AppError>")]
pub struct UpdateMenu {
    pub id: i64,
    pub changes: MenuChanges,
}

#[derive(Message)]
#[rtype(result = "Result<(), AppError>")]
pub struct DeleteMenu(pub i64);

#[derive(Message)]
#[rtype(result = "Result<Vec<MenuCategory>, AppError>")]
pub struct FetchCategories;

#[derive(Message)]
#[rtype(result = "Result<MenuCategory, AppError>")]
pub struct CreateCategory(pub String);

#[derive(Message)]
#[rtype(result = "Result<MenuCategory, AppError>")]
pub struct RenameCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Message)]
#[rtype(result = "Result<(), AppError>")]
pub struct DeleteCategory(pub i64);

#[derive(Message)]
#[rtype(result = "Result<Vec<BestSeller>, AppError>")]
pub struct FetchBestSellers(pub usize);

// bookings

#[derive(Message)]
#[rtype(result = "Result<Booking, AppError>")]
pub struct CreateBooking {
    pub user_id: i64,
    pub window: TimeWindow,
    pub duration_minutes: i32,
    pub guest_count: i32,
    pub table_id: Option<i64>,
    pub special_request: Option<String>,
    pub lookback: DateTime<Utc>,
}

#[derive(Message)]
#[rtype(result = "Result<Paginated<BookingListItem>, AppError>")]
pub struct ListBookings {
    /// Restricts the listing to one customer's bookings.
    pub user_id: Option<i64>,
    pub status: Option<BookingStatus>,
    pub page: Page,
}

#[derive(Message)]
#[rtype(result = "Result<BookingDetail, AppError>")]
pub struct FetchBooking {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub policy: BookingPolicy,
    pub now: DateTime<Utc>,
}

#[derive(Message)]
#[rtype(result = "Result<Booking, AppError>")]
pub struct CancelBooking {
    pub id: i64,
    pub requester_id: i64,
    pub by_staff: bool,
    pub policy: BookingPolicy,
    pub now: DateTime<Utc>,
}

#[derive(Message)]
#[rtype(result = "Result<Booking, AppError>")]
pub struct UpdateBookingStatus {
    pub id: i64,
    pub status: BookingStatus,
}

/// Cancels active bookings that started before `cutoff` and never got an order.
#[derive(Message)]
#[rtype(result = "Result<Vec<i64>, AppError>")]
pub struct ExpireStaleBookings {
    pub cutoff: DateTime<Utc>,
}

// orders

#[derive(Message)]
#[rtype(result = "Result<Order, AppError>")]
pub struct CreateOrder(pub i64);

#[derive(Message)]
#[rtype(result = "Result<Paginated<Order>, AppError>")]
pub struct ListOrders {
    pub status: Option<OrderStatus>,
    pub page: Page,
}

#[derive(Message)]
#[rtype(result = "Result<OrderDetail, AppError>")]
pub struct GetOrder(pub i64);

#[derive(Message)]
#[rtype(result = "Result<OrderDetail, AppError>")]
pub struct AddItemToOrder {
    pub order_id: i64,
    pub menu_id: i64,
}

#[derive(Message)]
#[rtype(result = "Result<OrderDetail, AppError>")]
pub struct DecrementItemInOrder {
    pub order_id: i64,
    pub menu_id: i64,
}

#[derive(Message)]
#[rtype(result = "Result<OrderDetail, AppError>")]
pub struct RemoveItemFromOrder {
    pub order_id: i64,
    pub menu_id: i64,
}

#[derive(Message)]
#[rtype(result = "Result<Order, AppError>")]
pub struct UpdateOrderStatus {
    pub id: i64,
    pub status: OrderStatus,
}

// contact & dashboard

#[derive(Message)]
#[rtype(result = "Result<ContactMessage, AppError>")]
pub struct SaveContactMessage(pub NewContactMessage);

#[derive(Message)]
#[rtype(result = "Result<Paginated<ContactMessage>, AppError>")]
pub struct ListContactMessages(pub Page);

#[derive(Message)]
#[rtype(result = "Result<DashboardStats, AppError>")]
pub struct FetchDashboardStats;
