use std::time::Duration;

use actix::{Addr, SyncArbiter};
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenv::dotenv;

use crate::config::Settings;
use crate::error::StartupError;
use crate::services::auth::JwtKeys;
use crate::services::db_utils::{get_db_pool, AppState, PgActor};

mod config;
mod error;
mod schema;
mod services;
mod types;

fn init_pg_db(settings: &Settings) -> Result<Addr<PgActor>, StartupError> {
    let pool = get_db_pool(&settings.database.url, settings.database.pool_size)?;

    Ok(SyncArbiter::start(settings.database.actors, move || PgActor(pool.clone())))
}

fn init_redis_db(settings: &Settings) -> Result<redis::Client, StartupError> {
    Ok(redis::Client::open(settings.redis.uri.as_str())?)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nusa_resto=info,actix_web=info".into()),
        )
        .init();
}

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header()
            .max_age(3600),
        None => Cors::permissive(),
    }
}

#[actix_web::main]
async fn main() -> Result<(), StartupError> {
    dotenv().ok();
    init_tracing();

    let settings = Settings::load()?;
    let pg_db = init_pg_db(&settings)?;
    let redis_db = init_redis_db(&settings)?;
    let policy = settings.booking_policy();

    let state = Data::new(AppState {
        pg_db: pg_db.clone(),
        redis_db,
        jwt: JwtKeys::new(&settings.auth.jwt_secret, &settings.auth.issuer, settings.auth.token_ttl_minutes),
        policy: policy.clone(),
        menu_ttl_secs: settings.redis.menu_ttl_secs,
    });

    services::sweeper::spawn_no_show_sweeper(
        pg_db,
        policy,
        Duration::from_secs(settings.booking.sweep_interval_secs),
    );

    let cors_origin = settings.server.cors_origin.clone();
    tracing::info!(host = %settings.server.host, port = settings.server.port, "starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(cors(cors_origin.as_deref()))
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(services::configure)
    })
    .workers(settings.server.workers)
    .bind((settings.server.host.as_str(), settings.server.port))?
    .run()
    .await?;

    Ok(())
}
