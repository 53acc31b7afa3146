use std::collections::HashMap;

use actix::Handler;
use chrono::{DateTime, Utc};
use diesel::dsl::sum;
use diesel::prelude::*;

use crate::error::AppError;
use crate::schema::{bookings, menus, order_items, orders, restaurant_tables, users};
use crate::services::db_models::{DashboardStats, Order, RecentBooking, RecentOrder};
use crate::services::db_utils::{establish_connection, PgActor};
use crate::services::messages::FetchDashboardStats;
use crate::types::{BookingStatus, OrderStatus};

const RECENT_LIMIT: i64 = 5;

impl Handler<FetchDashboardStats> for PgActor {
    type Result = Result<DashboardStats, AppError>;

    fn handle(&mut self, _msg: FetchDashboardStats, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().read_only().run(|trx_conn| {
            let total_users = users::table.count().get_result::<i64>(trx_conn)?;
            let total_bookings = bookings::table.count().get_result::<i64>(trx_conn)?;
            let total_orders = orders::table.count().get_result::<i64>(trx_conn)?;
            let total_menu_items = menus::table.count().get_result::<i64>(trx_conn)?;
            let total_tables = restaurant_tables::table.count().get_result::<i64>(trx_conn)?;

            let revenue = orders::table
                .filter(orders::status.eq(OrderStatus::Paid))
                .select(sum(orders::total_price))
                .first::<Option<i64>>(trx_conn)?
                .unwrap_or(0);

            let recent_bookings = bookings::table
                .inner_join(users::table)
                .order((bookings::created_at.desc(), bookings::id.desc()))
                .limit(RECENT_LIMIT)
                .select((bookings::id, users::name, bookings::date_time, bookings::guest_count, bookings::status))
                .load::<(i64, String, DateTime<Utc>, i32, BookingStatus)>(trx_conn)?
                .into_iter()
                .map(|(id, user_name, date_time, guest_count, status)| RecentBooking {
                    id,
                    user_name,
                    date_time,
                    guest_count,
                    status,
                })
                .collect();

            let latest_orders: Vec<Order> = orders::table
                .order((orders::created_at.desc(), orders::id.desc()))
                .limit(RECENT_LIMIT)
                .select(Order::as_select())
                .load(trx_conn)?;

            let order_ids: Vec<i64> = latest_orders.iter().map(|o| o.id).collect();
            let mut item_counts: HashMap<i64, i64> = HashMap::new();
            for (order_id, quantity) in order_items::table
                .filter(order_items::order_id.eq_any(order_ids))
                .select((order_items::order_id, order_items::quantity))
                .load::<(i64, i32)>(trx_conn)?
            {
                *item_counts.entry(order_id).or_insert(0) += i64::from(quantity);
            }

            let recent_orders = latest_orders
                .into_iter()
                .map(|order| RecentOrder {
                    item_count: item_counts.get(&order.id).copied().unwrap_or(0),
                    id: order.id,
                    created_at: order.created_at,
                    total_price: order.total_price,
                    status: order.status,
                })
                .collect();

            Ok(DashboardStats {
                total_users,
                total_bookings,
                total_orders,
                total_menu_items,
                total_tables,
                revenue,
                recent_bookings,
                recent_orders,
            })
        })
    }
}
