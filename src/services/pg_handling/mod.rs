//! `Handler` impls of `PgActor`, one file per aggregate.

mod bookings;
mod dashboard;
mod menus;
mod orders;
mod tables;
mod users;

use crate::error::AppError;

/// `%term%` for `ILIKE`, with the LIKE wildcards in `term` escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

/// Rows with history are never deleted out from under it.
pub(crate) fn refuse_when_referenced(references: i64, reason: &str) -> Result<(), AppError> {
    if references > 0 {
        return Err(AppError::conflict(reason));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = include_str!("../../../migrations/2025-04-21-000000_create_restaurant/up.sql");

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("budi"), "%budi%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn referenced_rows_are_a_conflict() {
        assert!(refuse_when_referenced(0, "unused").is_ok());
        assert!(matches!(
            refuse_when_referenced(2, "user has bookings on record"),
            Err(AppError::Conflict(msg)) if msg == "user has bookings on record"
        ));
    }

    #[test]
    fn booking_history_never_cascades_away() {
        let bookings_user_fk = SCHEMA
            .lines()
            .find(|line| line.trim_start().starts_with("user_id") && line.contains("REFERENCES users"))
            .unwrap();
        assert!(!bookings_user_fk.contains("CASCADE"));

        let orders_booking_fk = SCHEMA
            .lines()
            .find(|line| line.contains("REFERENCES bookings"))
            .unwrap();
        assert!(!orders_booking_fk.contains("CASCADE"));
    }
}
