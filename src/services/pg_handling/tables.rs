use actix::Handler;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::refuse_when_referenced;
use crate::error::AppError;
use crate::schema::{bookings, restaurant_tables};
use crate::services::booking_rules::{free_tables, BookedSlot, TimeWindow};
use crate::services::db_models::RestaurantTable;
use crate::services::db_utils::{establish_connection, PgActor};
use crate::services::messages::{
    CreateTable, DeleteTable, FetchTableCapacities, FindAvailableTables, ListTables, UpdateTable,
};
use crate::services::pagination::Paginated;
use crate::types::BookingStatus;

/// Tables able to seat `guest_count` with no active booking overlapping `window`.
pub(crate) fn available_tables(
    conn: &mut PgConnection,
    window: TimeWindow,
    guest_count: i32,
    lookback: DateTime<Utc>,
) -> Result<Vec<RestaurantTable>, AppError> {
    let candidates = restaurant_tables::table
        .filter(restaurant_tables::is_available.eq(true))
        .filter(restaurant_tables::capacity.ge(guest_count))
        .select(RestaurantTable::as_select())
        .load(conn)?;

    let booked: Vec<BookedSlot> = bookings::table
        .filter(bookings::status.eq_any(BookingStatus::ACTIVE))
        .filter(bookings::date_time.ge(lookback))
        .filter(bookings::date_time.lt(window.end))
        .select((bookings::table_id, bookings::date_time, bookings::duration_minutes, bookings::status))
        .load::<(i64, DateTime<Utc>, i32, BookingStatus)>(conn)?
        .into_iter()
        .map(|(table_id, date_time, duration, status)| BookedSlot {
            table_id,
            window: TimeWindow::new(date_time, duration),
            status,
        })
        .collect();

    Ok(free_tables(candidates, &booked, window))
}

/// Case-insensitive substring match on the table number or capacity.
pub(crate) fn matches_table_search(table: &RestaurantTable, term: &str) -> bool {
    table.table_number.to_string().contains(term) || table.capacity.to_string().contains(term)
}

impl Handler<ListTables> for PgActor {
    type Result = Result<Paginated<RestaurantTable>, AppError>;

    fn handle(&mut self, msg: ListTables, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        let tables = restaurant_tables::table
            .order(restaurant_tables::table_number.asc())
            .select(RestaurantTable::as_select())
            .load(&mut conn)?;

        let filtered = match msg.search {
            Some(term) => tables.into_iter().filter(|t| matches_table_search(t, &term)).collect(),
            None => tables,
        };

        Ok(Paginated::from_vec(filtered, msg.page))
    }
}

impl Handler<CreateTable> for PgActor {
    type Result = Result<RestaurantTable, AppError>;

    fn handle(&mut self, msg: CreateTable, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;
        let number = msg.0.table_number;

        diesel::insert_into(restaurant_tables::table)
            .values(msg.0)
            .returning(RestaurantTable::as_returning())
            .get_result(&mut conn)
            .map_err(|err| match AppError::from(err) {
                AppError::Conflict(_) => AppError::conflict(format!("table number {number} already exists")),
                other => other,
            })
    }
}

impl Handler<UpdateTable> for PgActor {
    type Result = Result<RestaurantTable, AppError>;

    fn handle(&mut self, msg: UpdateTable, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        let updated = if msg.changes.is_empty() {
            restaurant_tables::table
                .find(msg.id)
                .select(RestaurantTable::as_select())
                .first(&mut conn)
                .optional()?
        } else {
            diesel::update(restaurant_tables::table.find(msg.id))
                .set(&msg.changes)
                .returning(RestaurantTable::as_returning())
                .get_result(&mut conn)
                .optional()
                .map_err(|err| match AppError::from(err) {
                    AppError::Conflict(_) => AppError::conflict("table number already exists"),
                    other => other,
                })?
        };

        updated.ok_or_else(|| AppError::not_found("table"))
    }
}

impl Handler<DeleteTable> for PgActor {
    type Result = Result<(), AppError>;

    fn handle(&mut self, msg: DeleteTable, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let booking_count = bookings::table
                .filter(bookings::table_id.eq(msg.0))
                .count()
                .get_result::<i64>(trx_conn)?;

            refuse_when_referenced(booking_count, "table has bookings on record; mark it unavailable instead")?;

            match diesel::delete(restaurant_tables::table.find(msg.0)).execute(trx_conn)? {
                0 => Err(AppError::not_found("table")),
                _ => Ok(()),
            }
        })
    }
}

impl Handler<FetchTableCapacities> for PgActor {
    type Result = Result<Vec<i32>, AppError>;

    fn handle(&mut self, _msg: FetchTableCapacities, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        Ok(restaurant_tables::table
            .filter(restaurant_tables::is_available.eq(true))
            .select(restaurant_tables::capacity)
            .distinct()
            .order(restaurant_tables::capacity.asc())
            .load(&mut conn)?)
    }
}

impl Handler<FindAvailableTables> for PgActor {
    type Result = Result<Vec<RestaurantTable>, AppError>;

    fn handle(&mut self, msg: FindAvailableTables, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        available_tables(&mut conn, msg.window, msg.guest_count, msg.lookback)
    }
}
