use actix::Handler;
use diesel::pg::Pg;
use diesel::prelude::*;

use super::{like_pattern, refuse_when_referenced};
use crate::error::AppError;
use crate::schema::{bookings, users};
use crate::services::db_models::{ContactMessage, User};
use crate::services::db_utils::{establish_connection, PgActor};
use crate::services::insertable::NewUser;
use crate::services::messages::{
    DeleteUser, FetchUser, FetchUserByEmail, ListContactMessages, ListUsers, RegisterUser, SaveContactMessage,
    UpdateUser,
};
use crate::services::pagination::Paginated;
use crate::types::Role;

fn user_search(search: &Option<String>) -> users::BoxedQuery<'static, Pg> {
    let mut query = users::table.into_boxed();

    if let Some(term) = search {
        let pattern = like_pattern(term);
        query = query.filter(users::name.ilike(pattern.clone()).or(users::email.ilike(pattern)));
    }

    query
}

impl Handler<RegisterUser> for PgActor {
    type Result = Result<User, AppError>;

    fn handle(&mut self, msg: RegisterUser, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        diesel::insert_into(users::table)
            .values(NewUser {
                name: msg.name,
                email: msg.email,
                phone: msg.phone,
                password_hash: msg.password_hash,
                role: Role::Customer,
            })
            .returning(User::as_returning())
            .get_result(&mut conn)
            .map_err(|err| match AppError::from(err) {
                AppError::Conflict(_) => AppError::conflict("email is already registered"),
                other => other,
            })
    }
}

impl Handler<FetchUserByEmail> for PgActor {
    type Result = Result<User, AppError>;

    fn handle(&mut self, msg: FetchUserByEmail, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        users::table
            .filter(users::email.eq(msg.0))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("user"))
    }
}

impl Handler<FetchUser> for PgActor {
    type Result = Result<User, AppError>;

    fn handle(&mut self, msg: FetchUser, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        users::table
            .find(msg.0)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("user"))
    }
}

impl Handler<ListUsers> for PgActor {
    type Result = Result<Paginated<User>, AppError>;

    fn handle(&mut self, msg: ListUsers, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        let total = user_search(&msg.search).count().get_result::<i64>(&mut conn)?;
        let items = user_search(&msg.search)
            .order(users::created_at.desc())
            .limit(msg.page.per_page)
            .offset(msg.page.offset())
            .select(User::as_select())
            .load(&mut conn)?;

        Ok(Paginated::new(items, msg.page, total))
    }
}

impl Handler<UpdateUser> for PgActor {
    type Result = Result<User, AppError>;

    fn handle(&mut self, msg: UpdateUser, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        if msg.changes.is_empty() {
            return users::table
                .find(msg.id)
                .select(User::as_select())
                .first(&mut conn)
                .optional()?
                .ok_or_else(|| AppError::not_found("user"));
        }

        diesel::update(users::table.find(msg.id))
            .set(&msg.changes)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .optional()
            .map_err(|err| match AppError::from(err) {
                AppError::Conflict(_) => AppError::conflict("email is already registered"),
                other => other,
            })?
            .ok_or_else(|| AppError::not_found("user"))
    }
}

impl Handler<DeleteUser> for PgActor {
    type Result = Result<(), AppError>;

    fn handle(&mut self, msg: DeleteUser, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;

        conn.build_transaction().run(|trx_conn| {
            let booking_count = bookings::table
                .filter(bookings::user_id.eq(msg.0))
                .count()
                .get_result::<i64>(trx_conn)?;

            refuse_when_referenced(booking_count, "user has bookings on record; change their role instead")?;

            match diesel::delete(users::table.find(msg.0)).execute(trx_conn)? {
                0 => Err(AppError::not_found("user")),
                _ => Ok(()),
            }
        })
    }
}

impl Handler<SaveContactMessage> for PgActor {
    type Result = Result<ContactMessage, AppError>;

    fn handle(&mut self, msg: SaveContactMessage, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::contact_messages;

        let mut conn = establish_connection(&self.0)?;

        Ok(diesel::insert_into(contact_messages::table)
            .values(msg.0)
            .returning(ContactMessage::as_returning())
            .get_result(&mut conn)?)
    }
}

impl Handler<ListContactMessages> for PgActor {
    type Result = Result<Paginated<ContactMessage>, AppError>;

    fn handle(&mut self, msg: ListContactMessages, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::contact_messages;

        let mut conn = establish_connection(&self.0)?;
        let page = msg.0;

        let total = contact_messages::table.count().get_result::<i64>(&mut conn)?;
        let items = contact_messages::table
            .order(contact_messages::created_at.desc())
            .limit(page.per_page)
            .offset(page.offset())
            .select(ContactMessage::as_select())
            .load(&mut conn)?;

        Ok(Paginated::new(items, page, total))
    }
}
