use actix_web::web::Data;

use crate::error::AppError;
use crate::services::db_models::MenuWithCategory;
use crate::services::db_utils::AppState;
use crate::services::messages::FetchMenus;
use crate::types::MENU_CACHE_KEY;

pub fn put_menu_to_cache(redis_db: &redis::Client, menu: &[MenuWithCategory], ttl_secs: u64) -> Result<(), AppError> {
    let menu_json = serde_json::to_string(menu)
        .map_err(|err| AppError::Internal(format!("failed to compose JSON object of menu: {err}")))?;

    let mut conn = redis_db.get_connection()?;

    redis::cmd("SET")
        .arg(MENU_CACHE_KEY)
        .arg(menu_json)
        .arg("EX")
        .arg(ttl_secs)
        .query::<()>(&mut conn)?;

    Ok(())
}

pub fn get_cached_menu(redis_db: &redis::Client) -> Result<Option<Vec<MenuWithCategory>>, AppError> {
    let mut conn = redis_db.get_connection()?;

    match redis::cmd("GET").arg(MENU_CACHE_KEY).query::<Option<String>>(&mut conn)? {
        Some(menu_json) => match serde_json::from_str::<Vec<MenuWithCategory>>(&menu_json) {
            Ok(menu) => Ok(Some(menu)),
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable cached menu");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub fn invalidate_menu(redis_db: &redis::Client) -> Result<(), AppError> {
    let mut conn = redis_db.get_connection()?;

    redis::cmd("DEL").arg(MENU_CACHE_KEY).query::<()>(&mut conn)?;

    Ok(())
}

/// Drops the cached menu after a write; a cache outage only costs freshness until the TTL runs out.
pub fn invalidate_menu_logged(redis_db: &redis::Client) {
    if let Err(err) = invalidate_menu(redis_db) {
        tracing::warn!(error = %err, "failed to invalidate cached menu");
    }
}

/// Full menu ordered by category, served from redis when possible.
pub async fn load_menu(state: &Data<AppState>) -> Result<Vec<MenuWithCategory>, AppError> {
    match get_cached_menu(&state.redis_db) {
        Ok(Some(menu)) => return Ok(menu),
        Ok(None) => tracing::debug!("menu cache miss"),
        Err(err) => tracing::warn!(error = %err, "menu cache unavailable, reading from postgres"),
    }

    let menu = state.pg_db.send(FetchMenus { only_available: false }).await??;

    if let Err(err) = put_menu_to_cache(&state.redis_db, &menu, state.menu_ttl_secs) {
        tracing::warn!(error = %err, "failed to refresh menu cache");
    }

    Ok(menu)
}
