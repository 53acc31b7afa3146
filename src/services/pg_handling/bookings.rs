use actix::Handler;
use diesel::prelude::*;

use super::tables::available_tables;
use crate::error::AppError;
use crate::schema::{bookings, orders, restaurant_tables, users};
use crate::services::booking_rules::{pick_table, BookingRuleViolation};
use crate::services::db_models::{Booking, BookingDetail, BookingListItem, Order, RestaurantTable, User, UserSummary};
use crate::services::db_utils::{establish_connection, PgActor};
use crate::services::insertable::NewBooking;
use crate::services::messages::{
    CancelBooking, CreateBooking, ExpireStaleBookings, FetchBooking, ListBookings, UpdateBookingStatus,
};
use crate::services::pagination::Paginated;
use crate::types::BookingStatus;

fn lock_booking(conn: &mut PgConnection, id: i64) -> Result<Booking, AppError> {
    bookings::table
        .find(id)
        .select(Booking::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("booking"))
}

fn set_booking_status(conn: &mut PgConnection, id: i64, status: BookingStatus) -> Result<Booking, AppError> {
    Ok(diesel::update(bookings::table.find(id))
        .set(bookings::status.eq(status))
        .returning(Booking::as_returning())
        .get_result(conn)?)
}

impl Handler<CreateBooking> for PgActor {
    type Result = Result<Booking, AppError>;

    fn handle(&mut self, msg: CreateBooking, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        // two requests racing for the last table: one of them fails to commit
        conn.build_transaction().serializable().run(|trx_conn| {
            let free = available_tables(trx_conn, msg.window, msg.guest_count, msg.lookback)?;
            let table = pick_table(&free, msg.table_id)?;

            let booking = diesel::insert_into(bookings::table)
                .values(NewBooking {
                    user_id: msg.user_id,
                    table_id: table.id,
                    date_time: msg.window.start,
                    duration_minutes: msg.duration_minutes,
                    guest_count: msg.guest_count,
                    special_request: msg.special_request.clone(),
                    status: BookingStatus::Pending,
                })
                .returning(Booking::as_returning())
                .get_result(trx_conn)?;

            tracing::info!(booking_id = booking.id, table_id = table.id, "booking created");
            Ok(booking)
        })
    }
}

impl Handler<ListBookings> for PgActor {
    type Result = Result<Paginated<BookingListItem>, AppError>;

    fn handle(&mut self, msg: ListBookings, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        let mut count_query = bookings::table.into_boxed();
        let mut query = bookings::table
            .inner_join(users::table)
            .inner_join(restaurant_tables::table)
            .into_boxed();

        if let Some(user_id) = msg.user_id {
            count_query = count_query.filter(bookings::user_id.eq(user_id));
            query = query.filter(bookings::user_id.eq(user_id));
        }
        if let Some(status) = msg.status {
            count_query = count_query.filter(bookings::status.eq(status));
            query = query.filter(bookings::status.eq(status));
        }

        let total = count_query.count().get_result::<i64>(&mut conn)?;
        let rows = query
            .order((bookings::date_time.desc(), bookings::id.desc()))
            .limit(msg.page.per_page)
            .offset(msg.page.offset())
            .select((Booking::as_select(), User::as_select(), restaurant_tables::table_number))
            .load::<(Booking, User, i32)>(&mut conn)?;

        let items = rows
            .into_iter()
            .map(|(booking, user, table_number)| BookingListItem {
                booking,
                user: UserSummary::from(&user),
                table_number,
            })
            .collect();

        Ok(Paginated::new(items, msg.page, total))
    }
}

impl Handler<FetchBooking> for PgActor {
    type Result = Result<BookingDetail, AppError>;

    fn handle(&mut self, msg: FetchBooking, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        let (booking, user, table) = bookings::table
            .inner_join(users::table)
            .inner_join(restaurant_tables::table)
            .filter(bookings::id.eq(msg.id))
            .select((Booking::as_select(), User::as_select(), RestaurantTable::as_select()))
            .first::<(Booking, User, RestaurantTable)>(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("booking"))?;

        // other customers' bookings are reported as missing
        if msg.owner_id.is_some_and(|owner| owner != booking.user_id) {
            return Err(AppError::not_found("booking"));
        }

        let orders = orders::table
            .filter(orders::booking_id.eq(booking.id))
            .order(orders::created_at.asc())
            .select(Order::as_select())
            .load(&mut conn)?;

        let is_cancellable = msg.policy.is_cancellable(booking.status, booking.date_time, msg.now);
        let hold_expired = orders.is_empty() && msg.policy.hold_expired(booking.status, booking.date_time, msg.now);

        Ok(BookingDetail { user: UserSummary::from(&user), table, orders, is_cancellable, hold_expired, booking })
    }
}

impl Handler<CancelBooking> for PgActor {
    type Result = Result<Booking, AppError>;

    fn handle(&mut self, msg: CancelBooking, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let booking = lock_booking(trx_conn, msg.id)?;

            if msg.by_staff {
                if booking.status.is_terminal() {
                    return Err(BookingRuleViolation::NotCancellable(booking.status).into());
                }
            } else {
                if booking.user_id != msg.requester_id {
                    return Err(AppError::not_found("booking"));
                }
                msg.policy.check_cancellation(booking.status, booking.date_time, msg.now)?;
            }

            let cancelled = set_booking_status(trx_conn, booking.id, BookingStatus::Cancelled)?;
            tracing::info!(booking_id = cancelled.id, by_staff = msg.by_staff, "booking cancelled");
            Ok(cancelled)
        })
    }
}

impl Handler<UpdateBookingStatus> for PgActor {
    type Result = Result<Booking, AppError>;

    fn handle(&mut self, msg: UpdateBookingStatus, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let booking = lock_booking(trx_conn, msg.id)?;

            if !booking.status.can_transition_to(msg.status) {
                return Err(AppError::conflict(format!(
                    "booking cannot move from {} to {}",
                    booking.status, msg.status
                )));
            }

            set_booking_status(trx_conn, booking.id, msg.status)
        })
    }
}

impl Handler<ExpireStaleBookings> for PgActor {
    type Result = Result<Vec<i64>, AppError>;

    fn handle(&mut self, msg: ExpireStaleBookings, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        // a booking with an order attached means the party was seated
        Ok(diesel::update(
            bookings::table
                .filter(bookings::status.eq_any(BookingStatus::ACTIVE))
                .filter(bookings::date_time.lt(msg.cutoff))
                .filter(bookings::id.ne_all(orders::table.select(orders::booking_id))),
        )
        .set(bookings::status.eq(BookingStatus::Cancelled))
        .returning(bookings::id)
        .get_results::<i64>(&mut conn)?)
    }
}
