//! Order number generation
//!
//! Format: `ORD-YYYYMMDD-NNNNNN`. The sequence restarts implicitly at each
//! date change since the date prefix changes the search space; gaps are
//! acceptable, uniqueness is enforced by the store's UNIQUE constraint.

use chrono::NaiveDate;

/// Order number prefix
pub const PREFIX: &str = "ORD";
/// Highest sequence representable in the zero-padded field
const MAX_SEQUENCE: u32 = 999_999;

/// Search prefix for all of a day's order numbers, e.g. `ORD-20260807-`
pub fn date_prefix(date: NaiveDate) -> String {
    format!("{PREFIX}-{}-", date.format("%Y%m%d"))
}

/// Render an order number, e.g. `ORD-20260807-000042`
pub fn format(date: NaiveDate, sequence: u32) -> String {
    format!("{PREFIX}-{}-{sequence:06}", date.format("%Y%m%d"))
}

/// Next sequence after the greatest existing order number for the day.
///
/// `None` means the day's sequence space is exhausted. A number with an
/// unparsable tail restarts at 1; the UNIQUE constraint catches any
/// resulting collision.
pub fn sequence_after(last: Option<&str>) -> Option<u32> {
    match last.and_then(parse_sequence) {
        Some(n) if n >= MAX_SEQUENCE => None,
        Some(n) => Some(n + 1),
        None => Some(1),
    }
}

fn parse_sequence(order_number: &str) -> Option<u32> {
    order_number.rsplit('-').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_format_zero_padded() {
        assert_eq!(format(day(), 1), "ORD-20260807-000001");
        assert_eq!(format(day(), 42), "ORD-20260807-000042");
        assert_eq!(format(day(), 999_999), "ORD-20260807-999999");
    }

    #[test]
    fn test_date_prefix() {
        assert_eq!(date_prefix(day()), "ORD-20260807-");
        assert!(format(day(), 7).starts_with(&date_prefix(day())));
    }

    #[test]
    fn test_sequence_after_none_starts_at_one() {
        assert_eq!(sequence_after(None), Some(1));
    }

    #[test]
    fn test_sequence_after_increments() {
        assert_eq!(sequence_after(Some("ORD-20260807-000041")), Some(42));
        assert_eq!(sequence_after(Some("ORD-20260807-000999")), Some(1000));
    }

    #[test]
    fn test_sequence_after_exhausted() {
        assert_eq!(sequence_after(Some("ORD-20260807-999999")), None);
    }

    #[test]
    fn test_sequence_after_unparsable_tail_restarts() {
        assert_eq!(sequence_after(Some("ORD-20260807-garbage")), Some(1));
        assert_eq!(sequence_after(Some("")), Some(1));
    }
}
