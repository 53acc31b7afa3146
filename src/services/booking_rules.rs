//! Availability, cancellation and hold rules for table bookings.
//!
//! Everything here is pure: callers pass "now" and the rows they loaded, so the
//! rules can be checked without a database.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, Offset, Utc, Weekday};
use serde::Serialize;
use thiserror::Error;

use crate::services::db_models::RestaurantTable;
use crate::types::BookingStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingRuleViolation {
    #[error("guest count must be between 1 and {max}; larger groups please contact us")]
    InvalidGuestCount { max: i32 },

    #[error("duration must be between {min} and {max} minutes")]
    InvalidDuration { min: i32, max: i32 },

    #[error("bookings must be made at least {minutes} minutes in advance")]
    TooSoon { minutes: i64 },

    #[error("bookings can be made at most {days} days in advance")]
    TooFarAhead { days: i64 },

    #[error("requested time is outside opening hours")]
    OutsideOpeningHours,

    #[error("no table is available for the requested time and party size")]
    NoTableAvailable,

    #[error("the requested table is not available")]
    TableUnavailable,

    #[error("booking can no longer be cancelled; cancellations close {minutes} minutes before the booking")]
    CancellationWindowClosed { minutes: i64 },

    #[error("booking in status {0} cannot be cancelled")]
    NotCancellable(BookingStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpeningHours {
    /// Monday to Friday.
    pub weekday: DayHours,
    /// Saturday and Sunday.
    pub weekend: DayHours,
}

impl OpeningHours {
    pub fn for_day(&self, day: Weekday) -> DayHours {
        match day {
            Weekday::Sat | Weekday::Sun => self.weekend,
            _ => self.weekday,
        }
    }
}

impl Default for OpeningHours {
    fn default() -> Self {
        let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN);

        OpeningHours {
            weekday: DayHours { open: at(11), close: at(22) },
            weekend: DayHours { open: at(10), close: at(23) },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingPolicy {
    pub lead_time: Duration,
    pub max_advance: Duration,
    pub cancel_window: Duration,
    pub hold: Duration,
    pub default_duration_minutes: i32,
    pub min_duration_minutes: i32,
    pub max_duration_minutes: i32,
    pub max_guest_count: i32,
    pub utc_offset_hours: i32,
    pub opening_hours: OpeningHours,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        BookingPolicy {
            lead_time: Duration::hours(2),
            max_advance: Duration::days(90),
            cancel_window: Duration::hours(3),
            hold: Duration::minutes(15),
            default_duration_minutes: 120,
            min_duration_minutes: 30,
            max_duration_minutes: 240,
            max_guest_count: 8,
            utc_offset_hours: 7,
            opening_hours: OpeningHours::default(),
        }
    }
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, duration_minutes: i32) -> Self {
        let end = start
            .checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        TimeWindow { start, end }
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A booking row reduced to what availability needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedSlot {
    pub table_id: i64,
    pub window: TimeWindow,
    pub status: BookingStatus,
}

pub fn blocks_table(status: BookingStatus) -> bool {
    BookingStatus::ACTIVE.contains(&status)
}

impl BookingPolicy {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or(Utc.fix())
    }

    pub fn resolve_duration(&self, requested: Option<i32>) -> i32 {
        requested.unwrap_or(self.default_duration_minutes)
    }

    pub fn validate_request(
        &self,
        now: DateTime<Utc>,
        date_time: DateTime<Utc>,
        duration_minutes: i32,
        guest_count: i32,
    ) -> Result<(), BookingRuleViolation> {
        if guest_count < 1 || guest_count > self.max_guest_count {
            return Err(BookingRuleViolation::InvalidGuestCount { max: self.max_guest_count });
        }

        if duration_minutes < self.min_duration_minutes || duration_minutes > self.max_duration_minutes {
            return Err(BookingRuleViolation::InvalidDuration {
                min: self.min_duration_minutes,
                max: self.max_duration_minutes,
            });
        }

        if date_time < now + self.lead_time {
            return Err(BookingRuleViolation::TooSoon { minutes: self.lead_time.num_minutes() });
        }

        // also keeps the window arithmetic below in range
        if date_time - now > self.max_advance {
            return Err(BookingRuleViolation::TooFarAhead { days: self.max_advance.num_days() });
        }

        if !self.within_opening_hours(TimeWindow::new(date_time, duration_minutes)) {
            return Err(BookingRuleViolation::OutsideOpeningHours);
        }

        Ok(())
    }

    /// The whole window must fall inside the local opening period of its start day.
    pub fn within_opening_hours(&self, window: TimeWindow) -> bool {
        let start = window.start.with_timezone(&self.offset());
        let hours = self.opening_hours.for_day(start.weekday());

        if start.time() < hours.open {
            return false;
        }

        let until_close = hours.close - start.time();
        window.end - window.start <= until_close
    }

    /// Bookings starting before this instant cannot overlap a window that starts at `start`.
    pub fn overlap_lookback(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start - Duration::minutes(i64::from(self.max_duration_minutes))
    }

    pub fn is_cancellable(&self, status: BookingStatus, date_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.check_cancellation(status, date_time, now).is_ok()
    }

    pub fn check_cancellation(
        &self,
        status: BookingStatus,
        date_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), BookingRuleViolation> {
        if !blocks_table(status) {
            return Err(BookingRuleViolation::NotCancellable(status));
        }

        if date_time - now < self.cancel_window {
            return Err(BookingRuleViolation::CancellationWindowClosed {
                minutes: self.cancel_window.num_minutes(),
            });
        }

        Ok(())
    }

    /// True once the party is later than the hold allows.
    pub fn hold_expired(&self, status: BookingStatus, date_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        blocks_table(status) && now > date_time + self.hold
    }

    /// Latest booking time whose hold has lapsed at `now`.
    pub fn hold_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.hold
    }
}

/// Tables from `candidates` with no blocking booking overlapping `requested`,
/// smallest capacity first, then by table number.
pub fn free_tables(
    candidates: Vec<RestaurantTable>,
    booked: &[BookedSlot],
    requested: TimeWindow,
) -> Vec<RestaurantTable> {
    let mut free: Vec<RestaurantTable> = candidates
        .into_iter()
        .filter(|table| {
            !booked.iter().any(|slot| {
                slot.table_id == table.id && blocks_table(slot.status) && slot.window.overlaps(&requested)
            })
        })
        .collect();

    free.sort_by_key(|t| (t.capacity, t.table_number));
    free
}

pub fn pick_table(
    free: &[RestaurantTable],
    requested_table: Option<i64>,
) -> Result<&RestaurantTable, BookingRuleViolation> {
    match requested_table {
        Some(table_id) => free
            .iter()
            .find(|t| t.id == table_id)
            .ok_or(BookingRuleViolation::TableUnavailable),
        None => free.first().ok_or(BookingRuleViolation::NoTableAvailable),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn table(id: i64, number: i32, capacity: i32) -> RestaurantTable {
        RestaurantTable {
            id,
            table_number: number,
            capacity,
            is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // 2025-04-21 is a Monday; 12:00 WIB == 05:00 UTC.
    fn monday_utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 21, h, m, 0).unwrap()
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let a = TimeWindow::new(monday_utc(5, 0), 120);
        let b = TimeWindow::new(monday_utc(7, 0), 60);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));

        let c = TimeWindow::new(monday_utc(6, 59), 60);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn request_must_respect_lead_time() {
        let policy = BookingPolicy::default();
        let now = monday_utc(4, 0);

        assert_eq!(
            policy.validate_request(now, monday_utc(5, 30), 60, 2),
            Err(BookingRuleViolation::TooSoon { minutes: 120 })
        );
        assert!(policy.validate_request(now, monday_utc(6, 0), 60, 2).is_ok());
    }

    #[test]
    fn request_beyond_booking_horizon_is_rejected() {
        let policy = BookingPolicy::default();
        let now = monday_utc(0, 0);
        let far_future = DateTime::<Utc>::MAX_UTC - Duration::minutes(90);

        assert_eq!(
            policy.validate_request(now, far_future, 120, 2),
            Err(BookingRuleViolation::TooFarAhead { days: 90 })
        );
        assert_eq!(
            policy.validate_request(now, monday_utc(6, 0) + Duration::days(91), 60, 2),
            Err(BookingRuleViolation::TooFarAhead { days: 90 })
        );
        assert!(policy.validate_request(now, monday_utc(6, 0) + Duration::days(89), 60, 2).is_ok());
    }

    #[test]
    fn window_end_saturates_instead_of_overflowing() {
        let start = DateTime::<Utc>::MAX_UTC - Duration::minutes(30);
        let window = TimeWindow::new(start, 240);
        assert_eq!(window.end, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn request_checks_guests_and_duration() {
        let policy = BookingPolicy::default();
        let now = monday_utc(0, 0);

        assert!(matches!(
            policy.validate_request(now, monday_utc(6, 0), 60, 0),
            Err(BookingRuleViolation::InvalidGuestCount { max: 8 })
        ));
        assert!(matches!(
            policy.validate_request(now, monday_utc(6, 0), 60, 9),
            Err(BookingRuleViolation::InvalidGuestCount { .. })
        ));
        assert!(matches!(
            policy.validate_request(now, monday_utc(6, 0), 15, 2),
            Err(BookingRuleViolation::InvalidDuration { min: 30, max: 240 })
        ));
    }

    #[test]
    fn weekday_opening_hours_apply_in_local_time() {
        let policy = BookingPolicy::default();
        let now = monday_utc(0, 0);

        // 10:30 WIB on a Monday is before opening
        assert_eq!(
            policy.validate_request(now, monday_utc(3, 30), 60, 2),
            Err(BookingRuleViolation::OutsideOpeningHours)
        );
        // 20:00 WIB + 2h ends exactly at 22:00 close
        assert!(policy.validate_request(now, monday_utc(13, 0), 120, 2).is_ok());
        // 21:00 WIB + 2h runs past close
        assert_eq!(
            policy.validate_request(now, monday_utc(14, 0), 120, 2),
            Err(BookingRuleViolation::OutsideOpeningHours)
        );
    }

    #[test]
    fn weekend_opens_earlier_and_closes_later() {
        let policy = BookingPolicy::default();
        let now = monday_utc(0, 0);
        // Saturday 2025-04-26 10:00 WIB == 03:00 UTC
        let saturday_open = Utc.with_ymd_and_hms(2025, 4, 26, 3, 0, 0).unwrap();
        assert!(policy.validate_request(now, saturday_open, 60, 4).is_ok());
        // Saturday 21:00 WIB + 2h ends at 23:00
        let saturday_late = Utc.with_ymd_and_hms(2025, 4, 26, 14, 0, 0).unwrap();
        assert!(policy.validate_request(now, saturday_late, 120, 4).is_ok());
    }

    #[test]
    fn free_tables_excludes_overlapping_active_bookings() {
        let requested = TimeWindow::new(monday_utc(6, 0), 120);
        let candidates = vec![table(1, 1, 4), table(2, 2, 2), table(3, 3, 6)];
        let booked = [
            BookedSlot { table_id: 2, window: TimeWindow::new(monday_utc(7, 0), 60), status: BookingStatus::Confirmed },
            BookedSlot { table_id: 1, window: TimeWindow::new(monday_utc(6, 30), 60), status: BookingStatus::Cancelled },
            BookedSlot { table_id: 3, window: TimeWindow::new(monday_utc(8, 0), 60), status: BookingStatus::Pending },
        ];

        let free = free_tables(candidates, &booked, requested);
        let ids: Vec<i64> = free.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn free_tables_are_ordered_by_capacity_then_number() {
        let requested = TimeWindow::new(monday_utc(6, 0), 60);
        let candidates = vec![table(1, 9, 6), table(2, 5, 4), table(3, 2, 4)];

        let free = free_tables(candidates, &[], requested);
        let numbers: Vec<i32> = free.iter().map(|t| t.table_number).collect();
        assert_eq!(numbers, vec![2, 5, 9]);
    }

    #[test]
    fn pick_table_prefers_request_then_smallest() {
        let free = vec![table(3, 2, 4), table(1, 9, 6)];

        assert_eq!(pick_table(&free, None).unwrap().id, 3);
        assert_eq!(pick_table(&free, Some(1)).unwrap().id, 1);
        assert_eq!(pick_table(&free, Some(7)).unwrap_err(), BookingRuleViolation::TableUnavailable);
        assert_eq!(pick_table(&[], None).unwrap_err(), BookingRuleViolation::NoTableAvailable);
    }

    #[test]
    fn cancellation_window_is_three_hours() {
        let policy = BookingPolicy::default();
        let booking_at = monday_utc(10, 0);

        assert!(policy.is_cancellable(BookingStatus::Pending, booking_at, monday_utc(7, 0)));
        assert!(policy.is_cancellable(BookingStatus::Confirmed, booking_at, monday_utc(6, 59)));
        assert_eq!(
            policy.check_cancellation(BookingStatus::Confirmed, booking_at, monday_utc(7, 1)),
            Err(BookingRuleViolation::CancellationWindowClosed { minutes: 180 })
        );
        assert_eq!(
            policy.check_cancellation(BookingStatus::Completed, booking_at, monday_utc(0, 0)),
            Err(BookingRuleViolation::NotCancellable(BookingStatus::Completed))
        );
    }

    #[test]
    fn hold_expires_fifteen_minutes_after_start() {
        let policy = BookingPolicy::default();
        let booking_at = monday_utc(6, 0);

        assert!(!policy.hold_expired(BookingStatus::Confirmed, booking_at, monday_utc(6, 15)));
        assert!(policy.hold_expired(BookingStatus::Confirmed, booking_at, monday_utc(6, 16)));
        assert!(!policy.hold_expired(BookingStatus::Cancelled, booking_at, monday_utc(9, 0)));
        assert_eq!(policy.hold_cutoff(monday_utc(6, 16)), monday_utc(6, 1));
    }

    #[test]
    fn lookback_covers_longest_booking() {
        let policy = BookingPolicy::default();
        assert_eq!(policy.overlap_lookback(monday_utc(8, 0)), monday_utc(4, 0));
    }
}
