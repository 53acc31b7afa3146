use actix::{Actor, Addr, SyncContext};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};

use crate::error::{AppError, StartupError};
use crate::services::auth::JwtKeys;
use crate::services::booking_rules::BookingPolicy;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub struct PgActor(pub PgPool);

pub struct AppState {
    pub pg_db: Addr<PgActor>,
    pub redis_db: redis::Client,
    pub jwt: JwtKeys,
    pub policy: BookingPolicy,
    pub menu_ttl_secs: u64,
}

impl Actor for PgActor {
    type Context = SyncContext<Self>;
}

pub fn get_db_pool(db_url: &str, max_size: u32) -> Result<PgPool, StartupError> {
    let manager: ConnectionManager<PgConnection> = ConnectionManager::<PgConnection>::new(db_url);
    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|err| StartupError::Pool(err.to_string()))
}

pub fn establish_connection(pool: &PgPool) -> Result<PooledConnection<ConnectionManager<PgConnection>>, AppError> {
    Ok(pool.get()?)
}
