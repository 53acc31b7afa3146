use std::time::Duration;

use actix::Addr;
use chrono::Utc;

use crate::services::booking_rules::BookingPolicy;
use crate::services::db_utils::PgActor;
use crate::services::messages::ExpireStaleBookings;

/// Releases tables held for parties that never arrived.
pub fn spawn_no_show_sweeper(pg_db: Addr<PgActor>, policy: BookingPolicy, every: Duration) {
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let cutoff = policy.hold_cutoff(Utc::now());
            match pg_db.send(ExpireStaleBookings { cutoff }).await {
                Ok(Ok(expired)) if expired.is_empty() => tracing::debug!("no stale bookings"),
                Ok(Ok(expired)) => {
                    for booking_id in &expired {
                        tracing::info!(booking_id, "booking cancelled after hold expired");
                    }
                }
                Ok(Err(err)) => tracing::error!(error = %err, "no-show sweep failed"),
                Err(err) => tracing::error!(error = %err, "database actor unreachable, sweep skipped"),
            }
        }
    });
}
