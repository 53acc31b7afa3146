use std::collections::HashMap;

use actix::Handler;
use diesel::prelude::*;

use super::refuse_when_referenced;
use crate::error::AppError;
use crate::schema::{menu_categories, menus, order_items, orders};
use crate::services::db_models::{BestSeller, Menu, MenuCategory, MenuWithCategory};
use crate::services::db_utils::{establish_connection, PgActor};
use crate::services::insertable::NewCategory;
use crate::services::messages::{
    CreateCategory, CreateMenu, DeleteCategory, DeleteMenu, FetchBestSellers, FetchCategories, FetchMenu,
    FetchMenus, RenameCategory, UpdateMenu,
};
use crate::types::OrderStatus;

fn ensure_category_exists(conn: &mut PgConnection, category_id: i64) -> Result<(), AppError> {
    let exists = menu_categories::table
        .find(category_id)
        .select(menu_categories::id)
        .first::<i64>(conn)
        .optional()?
        .is_some();

    if exists {
        Ok(())
    } else {
        Err(AppError::not_found("category"))
    }
}

/// `(menu_id, sold)` ranked by units sold, ties broken by menu id.
pub fn rank_best_sellers(sold_items: &[(i64, i32)], limit: usize) -> Vec<(i64, i64)> {
    let mut totals: HashMap<i64, i64> = HashMap::new();
    for (menu_id, quantity) in sold_items {
        *totals.entry(*menu_id).or_insert(0) += i64::from(*quantity);
    }

    let mut ranked: Vec<(i64, i64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

impl Handler<FetchMenus> for PgActor {
    type Result = Result<Vec<MenuWithCategory>, AppError>;

    fn handle(&mut self, msg: FetchMenus, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        let mut query = menus::table.inner_join(menu_categories::table).into_boxed();
        if msg.only_available {
            query = query.filter(menus::is_available.eq(true));
        }

        let rows = query
            .order((menu_categories::name.asc(), menus::name.asc()))
            .select((Menu::as_select(), MenuCategory::as_select()))
            .load::<(Menu, MenuCategory)>(&mut conn)?;

        Ok(rows.into_iter().map(|(menu, category)| MenuWithCategory { menu, category }).collect())
    }
}

impl Handler<FetchMenu> for PgActor {
    type Result = Result<MenuWithCategory, AppError>;

    fn handle(&mut self, msg: FetchMenu, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        menus::table
            .inner_join(menu_categories::table)
            .filter(menus::id.eq(msg.0))
            .select((Menu::as_select(), MenuCategory::as_select()))
            .first::<(Menu, MenuCategory)>(&mut conn)
            .optional()?
            .map(|(menu, category)| MenuWithCategory { menu, category })
            .ok_or_else(|| AppError::not_found("menu"))
    }
}

impl Handler<CreateMenu> for PgActor {
    type Result = Result<Menu, AppError>;

    fn handle(&mut self, msg: CreateMenu, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            ensure_category_exists(trx_conn, msg.0.category_id)?;

            Ok(diesel::insert_into(menus::table)
                .values(msg.0)
                .returning(Menu::as_returning())
                .get_result(trx_conn)?)
        })
    }
}

impl Handler<UpdateMenu> for PgActor {
    type Result = Result<Menu, AppError>;

    fn handle(&mut self, msg: UpdateMenu, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            if let Some(category_id) = msg.changes.category_id {
                ensure_category_exists(trx_conn, category_id)?;
            }

            let updated = if msg.changes.is_empty() {
                menus::table.find(msg.id).select(Menu::as_select()).first(trx_conn).optional()?
            } else {
                diesel::update(menus::table.find(msg.id))
                    .set(&msg.changes)
                    .returning(Menu::as_returning())
                    .get_result(trx_conn)
                    .optional()?
            };

            updated.ok_or_else(|| AppError::not_found("menu"))
        })
    }
}

impl Handler<DeleteMenu> for PgActor {
    type Result = Result<(), AppError>;

    fn handle(&mut self, msg: DeleteMenu, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let ordered = order_items::table
                .filter(order_items::menu_id.eq(msg.0))
                .count()
                .get_result::<i64>(trx_conn)?;

            refuse_when_referenced(ordered, "menu item appears in orders; mark it unavailable instead")?;

            match diesel::delete(menus::table.find(msg.0)).execute(trx_conn)? {
                0 => Err(AppError::not_found("menu")),
                _ => Ok(()),
            }
        })
    }
}

impl Handler<FetchCategories> for PgActor {
    type Result = Result<Vec<MenuCategory>, AppError>;

    fn handle(&mut self, _msg: FetchCategories, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        Ok(menu_categories::table
            .order(menu_categories::name.asc())
            .select(MenuCategory::as_select())
            .load(&mut conn)?)
    }
}

impl Handler<CreateCategory> for PgActor {
    type Result = Result<MenuCategory, AppError>;

    fn handle(&mut self, msg: CreateCategory, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        diesel::insert_into(menu_categories::table)
            .values(NewCategory { name: msg.0 })
            .returning(MenuCategory::as_returning())
            .get_result(&mut conn)
            .map_err(|err| match AppError::from(err) {
                AppError::Conflict(_) => AppError::conflict("category already exists"),
                other => other,
            })
    }
}

impl Handler<RenameCategory> for PgActor {
    type Result = Result<MenuCategory, AppError>;

    fn handle(&mut self, msg: RenameCategory, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        diesel::update(menu_categories::table.find(msg.id))
            .set(menu_categories::name.eq(msg.name))
            .returning(MenuCategory::as_returning())
            .get_result(&mut conn)
            .optional()
            .map_err(|err| match AppError::from(err) {
                AppError::Conflict(_) => AppError::conflict("category already exists"),
                other => other,
            })?
            .ok_or_else(|| AppError::not_found("category"))
    }
}

impl Handler<DeleteCategory> for PgActor {
    type Result = Result<(), AppError>;

    fn handle(&mut self, msg: DeleteCategory, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let in_use = menus::table
                .filter(menus::category_id.eq(msg.0))
                .count()
                .get_result::<i64>(trx_conn)?;

            refuse_when_referenced(in_use, "category still has menu items")?;

            match diesel::delete(menu_categories::table.find(msg.0)).execute(trx_conn)? {
                0 => Err(AppError::not_found("category")),
                _ => Ok(()),
            }
        })
    }
}

impl Handler<FetchBestSellers> for PgActor {
    type Result = Result<Vec<BestSeller>, AppError>;

    fn handle(&mut self, msg: FetchBestSellers, _ctx: &mut Self::Context) -> Self::Result {
        let limit = msg.0;
        let mut conn = establish_connection(&self.0)?;

        let sold_items = order_items::table
            .inner_join(orders::table)
            .filter(orders::status.eq(OrderStatus::Paid))
            .select((order_items::menu_id, order_items::quantity))
            .load::<(i64, i32)>(&mut conn)?;

        let available: Vec<MenuWithCategory> = menus::table
            .inner_join(menu_categories::table)
            .filter(menus::is_available.eq(true))
            .order(menus::created_at.desc())
            .select((Menu::as_select(), MenuCategory::as_select()))
            .load::<(Menu, MenuCategory)>(&mut conn)?
            .into_iter()
            .map(|(menu, category)| MenuWithCategory { menu, category })
            .collect();

        let mut by_id: HashMap<i64, MenuWithCategory> =
            available.iter().cloned().map(|m| (m.menu.id, m)).collect();

        let mut best: Vec<BestSeller> = rank_best_sellers(&sold_items, sold_items.len())
            .into_iter()
            .filter_map(|(menu_id, sold)| by_id.remove(&menu_id).map(|menu| BestSeller { menu, sold }))
            .take(limit)
            .collect();

        // newest dishes fill the gaps while sales history is thin
        for menu in available {
            if best.len() >= limit {
                break;
            }
            if by_id.remove(&menu.menu.id).is_some() {
                best.push(BestSeller { menu, sold: 0 });
            }
        }

        Ok(best)
    }
}
