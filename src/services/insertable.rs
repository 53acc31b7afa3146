use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable};

use crate::schema::{bookings, contact_messages, menu_categories, menus, order_items, orders, restaurant_tables, users};
use crate::types::{BookingStatus, OrderStatus, Role};

#[derive(Insertable, Clone)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

/// `None` leaves a column untouched.
#[derive(AsChangeset, Clone, Default)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub role: Option<Role>,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = restaurant_tables)]
pub struct NewTable {
    pub table_number: i32,
    pub capacity: i32,
    pub is_available: bool,
}

#[derive(AsChangeset, Clone, Default)]
#[diesel(table_name = restaurant_tables)]
pub struct TableChanges {
    pub table_number: Option<i32>,
    pub capacity: Option<i32>,
    pub is_available: Option<bool>,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = menu_categories)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = menus)]
pub struct NewMenu {
    pub name: String,
    pub description: Option<String>,
    pub price: i32,
    pub image: Option<String>,
    pub category_id: i64,
    pub is_available: bool,
}

#[derive(AsChangeset, Clone, Default)]
#[diesel(table_name = menus)]
pub struct MenuChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<i32>,
    pub image: Option<Option<String>>,
    pub category_id: Option<i64>,
    pub is_available: Option<bool>,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = bookings)]
pub struct NewBooking {
    pub user_id: i64,
    pub table_id: i64,
    pub date_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub guest_count: i32,
    pub special_request: Option<String>,
    pub status: BookingStatus,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub booking_id: i64,
    pub status: OrderStatus,
    pub total_price: i32,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = order_items)]
pub struct OrderMenuItem {
    pub order_id: i64,
    pub menu_id: i64,
    pub quantity: i32,
    pub unit_price: i32,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = contact_messages)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.role.is_none()
    }
}

impl TableChanges {
    pub fn is_empty(&self) -> bool {
        self.table_number.is_none() && self.capacity.is_none() && self.is_available.is_none()
    }
}

impl MenuChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image.is_none()
            && self.category_id.is_none()
            && self.is_available.is_none()
    }
}
