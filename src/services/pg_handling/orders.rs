use actix::Handler;
use diesel::pg::Pg;
use diesel::prelude::*;

use crate::error::AppError;
use crate::schema::{bookings, menus, order_items, orders};
use crate::services::db_models::{Order, OrderDetail, OrderItem, OrderItemDetail};
use crate::services::db_utils::{establish_connection, PgActor};
use crate::services::insertable::{NewOrder, OrderMenuItem};
use crate::services::messages::{
    AddItemToOrder, CreateOrder, DecrementItemInOrder, GetOrder, ListOrders, RemoveItemFromOrder, UpdateOrderStatus,
};
use crate::services::pagination::Paginated;
use crate::types::{BookingStatus, OrderStatus};

/// Sum of `quantity * unit_price` over `(quantity, unit_price)` lines.
pub fn order_total(lines: &[(i32, i32)]) -> i32 {
    lines.iter().map(|(quantity, unit_price)| quantity * unit_price).sum()
}

fn lock_order(conn: &mut PgConnection, id: i64) -> Result<Order, AppError> {
    orders::table
        .find(id)
        .select(Order::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("order"))
}

fn ensure_editable(order: &Order) -> Result<(), AppError> {
    if order.status != OrderStatus::Pending {
        return Err(AppError::conflict(format!(
            "order items can only be changed while the order is PENDING (currently {})",
            order.status
        )));
    }
    Ok(())
}

fn recompute_total(conn: &mut PgConnection, order_id: i64) -> Result<(), AppError> {
    let lines = order_items::table
        .filter(order_items::order_id.eq(order_id))
        .select((order_items::quantity, order_items::unit_price))
        .load::<(i32, i32)>(conn)?;

    diesel::update(orders::table.find(order_id))
        .set(orders::total_price.eq(order_total(&lines)))
        .execute(conn)?;

    Ok(())
}

fn find_item(conn: &mut PgConnection, order_id: i64, menu_id: i64) -> Result<Option<OrderItem>, AppError> {
    Ok(order_items::table
        .filter(order_items::order_id.eq(order_id))
        .filter(order_items::menu_id.eq(menu_id))
        .select(OrderItem::as_select())
        .first(conn)
        .optional()?)
}

fn order_detail(conn: &mut PgConnection, order_id: i64) -> Result<OrderDetail, AppError> {
    let order = orders::table
        .find(order_id)
        .select(Order::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("order"))?;

    let items = order_items::table
        .inner_join(menus::table)
        .filter(order_items::order_id.eq(order_id))
        .order(order_items::id.asc())
        .select((OrderItem::as_select(), menus::name))
        .load::<(OrderItem, String)>(conn)?
        .into_iter()
        .map(|(item, menu_name)| OrderItemDetail {
            line_total: item.quantity * item.unit_price,
            item,
            menu_name,
        })
        .collect();

    Ok(OrderDetail { order, items })
}

impl Handler<CreateOrder> for PgActor {
    type Result = Result<Order, AppError>;

    fn handle(&mut self, msg: CreateOrder, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let status = bookings::table
                .find(msg.0)
                .select(bookings::status)
                .for_update()
                .first::<BookingStatus>(trx_conn)
                .optional()?
                .ok_or_else(|| AppError::not_found("booking"))?;

            if status != BookingStatus::Confirmed {
                return Err(AppError::conflict(format!(
                    "orders can only be opened for CONFIRMED bookings (booking is {status})"
                )));
            }

            Ok(diesel::insert_into(orders::table)
                .values(NewOrder { booking_id: msg.0, status: OrderStatus::Pending, total_price: 0 })
                .returning(Order::as_returning())
                .get_result(trx_conn)?)
        })
    }
}

impl Handler<ListOrders> for PgActor {
    type Result = Result<Paginated<Order>, AppError>;

    fn handle(&mut self, msg: ListOrders, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        let filtered = || -> orders::BoxedQuery<'static, Pg> {
            let mut query = orders::table.into_boxed();
            if let Some(status) = msg.status {
                query = query.filter(orders::status.eq(status));
            }
            query
        };

        let total = filtered().count().get_result::<i64>(&mut conn)?;
        let items = filtered()
            .order((orders::created_at.desc(), orders::id.desc()))
            .limit(msg.page.per_page)
            .offset(msg.page.offset())
            .select(Order::as_select())
            .load(&mut conn)?;

        Ok(Paginated::new(items, msg.page, total))
    }
}

impl Handler<GetOrder> for PgActor {
    type Result = Result<OrderDetail, AppError>;

    fn handle(&mut self, msg: GetOrder, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        order_detail(&mut conn, msg.0)
    }
}

impl Handler<AddItemToOrder> for PgActor {
    type Result = Result<OrderDetail, AppError>;

    fn handle(&mut self, msg: AddItemToOrder, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let order = lock_order(trx_conn, msg.order_id)?;
            ensure_editable(&order)?;

            let (price, is_available) = menus::table
                .find(msg.menu_id)
                .select((menus::price, menus::is_available))
                .first::<(i32, bool)>(trx_conn)
                .optional()?
                .ok_or_else(|| AppError::not_found("menu"))?;

            if !is_available {
                return Err(AppError::conflict("menu item is not available"));
            }

            match find_item(trx_conn, order.id, msg.menu_id)? {
                Some(item) => {
                    diesel::update(order_items::table.find(item.id))
                        .set(order_items::quantity.eq(item.quantity + 1))
                        .execute(trx_conn)?;
                }
                None => {
                    // price is frozen at the moment the dish joins the order
                    diesel::insert_into(order_items::table)
                        .values(OrderMenuItem {
                            order_id: order.id,
                            menu_id: msg.menu_id,
                            quantity: 1,
                            unit_price: price,
                        })
                        .execute(trx_conn)?;
                }
            }

            recompute_total(trx_conn, order.id)?;
            order_detail(trx_conn, order.id)
        })
    }
}

impl Handler<DecrementItemInOrder> for PgActor {
    type Result = Result<OrderDetail, AppError>;

    fn handle(&mut self, msg: DecrementItemInOrder, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let order = lock_order(trx_conn, msg.order_id)?;
            ensure_editable(&order)?;

            let item = find_item(trx_conn, order.id, msg.menu_id)?
                .ok_or_else(|| AppError::not_found("order item"))?;

            if item.quantity <= 1 {
                diesel::delete(order_items::table.find(item.id)).execute(trx_conn)?;
            } else {
                diesel::update(order_items::table.find(item.id))
                    .set(order_items::quantity.eq(item.quantity - 1))
                    .execute(trx_conn)?;
            }

            recompute_total(trx_conn, order.id)?;
            order_detail(trx_conn, order.id)
        })
    }
}

impl Handler<RemoveItemFromOrder> for PgActor {
    type Result = Result<OrderDetail, AppError>;

    fn handle(&mut self, msg: RemoveItemFromOrder, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let order = lock_order(trx_conn, msg.order_id)?;
            ensure_editable(&order)?;

            let removed = diesel::delete(
                order_items::table
                    .filter(order_items::order_id.eq(order.id))
                    .filter(order_items::menu_id.eq(msg.menu_id)),
            )
            .execute(trx_conn)?;

            if removed == 0 {
                return Err(AppError::not_found("order item"));
            }

            recompute_total(trx_conn, order.id)?;
            order_detail(trx_conn, order.id)
        })
    }
}

impl Handler<UpdateOrderStatus> for PgActor {
    type Result = Result<Order, AppError>;

    fn handle(&mut self, msg: UpdateOrderStatus, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let order = lock_order(trx_conn, msg.id)?;

            if !order.status.can_transition_to(msg.status) {
                return Err(AppError::conflict(format!(
                    "order cannot move from {} to {}",
                    order.status, msg.status
                )));
            }

            if msg.status == OrderStatus::Processing {
                let item_count = order_items::table
                    .filter(order_items::order_id.eq(order.id))
                    .count()
                    .get_result::<i64>(trx_conn)?;

                if item_count == 0 {
                    return Err(AppError::conflict("an empty order cannot be processed"));
                }
            }

            let updated = diesel::update(orders::table.find(order.id))
                .set(orders::status.eq(msg.status))
                .returning(Order::as_returning())
                .get_result::<Order>(trx_conn)?;

            if updated.status == OrderStatus::Paid {
                let completed = diesel::update(
                    bookings::table
                        .filter(bookings::id.eq(updated.booking_id))
                        .filter(bookings::status.eq(BookingStatus::Confirmed)),
                )
                .set(bookings::status.eq(BookingStatus::Completed))
                .execute(trx_conn)?;

                tracing::info!(
                    order_id = updated.id,
                    booking_id = updated.booking_id,
                    booking_completed = completed > 0,
                    "order paid"
                );
            }

            Ok(updated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::order_total;

    #[test]
    fn total_multiplies_snapshot_prices() {
        assert_eq!(order_total(&[(2, 35_000), (1, 18_000)]), 88_000);
    }

    #[test]
    fn empty_order_totals_zero() {
        assert_eq!(order_total(&[]), 0);
    }
}
