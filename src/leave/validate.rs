use crate::error::AppError;
use chrono::NaiveDate;

/// Inclusive calendar-day count for a leave span. A single day counts as 1;
/// weekends and holidays are not excluded.
pub fn total_days(start: NaiveDate, end: NaiveDate) -> Result<u32, AppError> {
    if end < start {
        return Err(AppError::validation("End date must be after start date"));
    }

    Ok((end - start).num_days() as u32 + 1)
}

pub fn validate_reason(reason: &str) -> Result<(), AppError> {
    if reason.trim().is_empty() {
        return Err(AppError::validation("Reason is required"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_day_counts_as_one() {
        assert_eq!(total_days(date(2025, 3, 10), date(2025, 3, 10)).unwrap(), 1);
    }

    #[test]
    fn span_is_inclusive_of_both_ends() {
        assert_eq!(total_days(date(2025, 3, 10), date(2025, 3, 12)).unwrap(), 3);
    }

    #[test]
    fn weekends_are_not_excluded() {
        // Fri 2025-03-07 through Mon 2025-03-10
        assert_eq!(total_days(date(2025, 3, 7), date(2025, 3, 10)).unwrap(), 4);
    }

    #[test]
    fn leap_day_is_counted() {
        assert_eq!(total_days(date(2024, 2, 28), date(2024, 3, 1)).unwrap(), 3);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = total_days(date(2025, 3, 12), date(2025, 3, 10)).unwrap_err();
        assert_eq!(err.to_string(), "End date must be after start date");
    }

    #[test]
    fn blank_reason_is_rejected() {
        assert!(validate_reason("  \t ").is_err());
        assert!(validate_reason("Family event").is_ok());
    }
}
