//! Trading-date planning and the date spellings used by the sources.
//!
//! Canonical dates are ISO-8601 `YYYY-MM-DD`. Sources also speak compact
//! `YYYYMMDD`, slash-separated `YYYY/MM/DD` and the ROC calendar `YYY/MM/DD`
//! whose year is the Gregorian year minus 1911.

use time::macros::{format_description, offset};
use time::{Date, Month, OffsetDateTime, Weekday};

use crate::error::ValidationError;

/// Gregorian year of ROC year 0.
pub const ROC_YEAR_OFFSET: i32 = 1911;

/// Expand an inclusive ISO date range into its weekdays, ascending.
///
/// Exchange holidays are not known here; sources report them as empty results.
pub fn business_dates(start: &str, end: &str) -> Result<Vec<String>, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidDateRange {
        start: start.to_string(),
        end: end.to_string(),
        reason,
    };

    let first = parse_iso(start).map_err(|error| invalid(error.to_string()))?;
    let last = parse_iso(end).map_err(|error| invalid(error.to_string()))?;
    if last < first {
        return Err(invalid(String::from("end date is before start date")));
    }

    let mut dates = Vec::new();
    let mut current = Some(first);
    while let Some(date) = current {
        if date > last {
            break;
        }
        if !matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday) {
            dates.push(format_iso(date));
        }
        current = date.next_day();
    }
    Ok(dates)
}

/// Parse a strict ISO-8601 calendar date.
pub fn parse_iso(value: &str) -> Result<Date, ValidationError> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: value.to_string(),
        }
    })
}

pub fn format_iso(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// `2024-01-05` -> `20240105`
pub fn iso_to_compact(value: &str) -> Result<String, ValidationError> {
    let date = parse_iso(value)?;
    Ok(format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    ))
}

/// `20240105` -> `2024-01-05`
pub fn compact_to_iso(value: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::InvalidCompactDate {
        value: value.to_string(),
    };
    let trimmed = value.trim();
    if trimmed.len() != 8 || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = trimmed[0..4].parse().map_err(|_| invalid())?;
    let month: u8 = trimmed[4..6].parse().map_err(|_| invalid())?;
    let day: u8 = trimmed[6..8].parse().map_err(|_| invalid())?;
    let date = calendar_date(year, month, day).ok_or_else(invalid)?;
    Ok(format_iso(date))
}

/// `2024-01-05` -> `2024/01/05`
pub fn iso_to_slash(value: &str) -> Result<String, ValidationError> {
    Ok(format_iso(parse_iso(value)?).replace('-', "/"))
}

/// `2024-01-05` -> `113/01/05`
pub fn iso_to_roc(value: &str) -> Result<String, ValidationError> {
    let date = parse_iso(value)?;
    let roc_year = date.year() - ROC_YEAR_OFFSET;
    if roc_year < 1 {
        return Err(ValidationError::InvalidRocDate {
            value: value.to_string(),
        });
    }
    Ok(format!(
        "{roc_year}/{:02}/{:02}",
        u8::from(date.month()),
        date.day()
    ))
}

/// `113/01/05` -> `2024-01-05`
pub fn roc_to_iso(value: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::InvalidRocDate {
        value: value.to_string(),
    };
    let mut parts = value.trim().split('/');
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let digits = |part: &str, max_len: usize| {
        !part.is_empty() && part.len() <= max_len && part.bytes().all(|byte| byte.is_ascii_digit())
    };
    if !digits(year, 4) || !digits(month, 2) || !digits(day, 2) {
        return Err(invalid());
    }

    let roc_year: i32 = year.parse().map_err(|_| invalid())?;
    if roc_year < 1 {
        return Err(invalid());
    }
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let day: u8 = day.parse().map_err(|_| invalid())?;
    let date = calendar_date(roc_year + ROC_YEAR_OFFSET, month, day).ok_or_else(invalid)?;
    Ok(format_iso(date))
}

/// Today's date on the Taipei wall clock (UTC+8, no daylight saving).
pub fn taipei_today() -> String {
    format_iso(OffsetDateTime::now_utc().to_offset(offset!(+8)).date())
}

fn calendar_date(year: i32, month: u8, day: u8) -> Option<Date> {
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::Duration;

    #[test]
    fn week_spanning_a_weekend_yields_five_dates() {
        // 2024-01-06 is a Saturday.
        let dates = business_dates("2024-01-04", "2024-01-10").expect("plan");
        assert_eq!(
            dates,
            vec!["2024-01-04", "2024-01-05", "2024-01-08", "2024-01-09", "2024-01-10"]
        );
    }

    #[test]
    fn single_weekend_day_yields_nothing() {
        assert!(business_dates("2024-01-06", "2024-01-06")
            .expect("plan")
            .is_empty());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let error = business_dates("2024-01-10", "2024-01-04").expect_err("reject");
        assert!(matches!(error, ValidationError::InvalidDateRange { .. }));
    }

    #[test]
    fn malformed_dates_are_rejected_as_invalid_range() {
        for (start, end) in [
            ("2024/01/04", "2024-01-05"),
            ("2024-01-04", "2024-02-30"),
            ("yesterday", "2024-01-05"),
        ] {
            let error = business_dates(start, end).expect_err("reject");
            assert!(matches!(error, ValidationError::InvalidDateRange { .. }));
        }
    }

    #[test]
    fn venue_spellings_of_a_date() {
        assert_eq!(iso_to_compact("2024-01-05").expect("compact"), "20240105");
        assert_eq!(compact_to_iso("20240105").expect("iso"), "2024-01-05");
        assert_eq!(iso_to_slash("2024-01-05").expect("slash"), "2024/01/05");
        assert_eq!(iso_to_roc("2024-01-05").expect("roc"), "113/01/05");
        assert_eq!(iso_to_roc("2004-02-11").expect("roc"), "93/02/11");
        assert_eq!(roc_to_iso("93/02/11").expect("iso"), "2004-02-11");
    }

    #[test]
    fn dates_before_the_roc_epoch_have_no_roc_form() {
        assert!(iso_to_roc("1911-12-31").is_err());
        assert!(roc_to_iso("0/01/01").is_err());
        assert!(roc_to_iso("113/02/30").is_err());
        assert!(roc_to_iso("113-01-05").is_err());
        assert!(compact_to_iso("2024015").is_err());
    }

    fn date_from(offset_days: i64) -> Date {
        Date::from_calendar_date(1912, Month::January, 1).expect("epoch")
            + Duration::days(offset_days)
    }

    proptest! {
        #[test]
        fn plan_length_matches_weekday_count(start_offset in 0i64..40_000, span in 0i64..400) {
            let start = date_from(start_offset);
            let end = start + Duration::days(span);

            let dates = business_dates(&format_iso(start), &format_iso(end)).expect("plan");

            let weekdays = (0..=span)
                .map(|day| (start + Duration::days(day)).weekday())
                .filter(|weekday| !matches!(weekday, Weekday::Saturday | Weekday::Sunday))
                .count();
            prop_assert_eq!(dates.len(), weekdays);
            prop_assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
        }

        #[test]
        fn roc_conversion_round_trips(offset_days in 0i64..400_000) {
            let iso = format_iso(date_from(offset_days));
            let roc = iso_to_roc(&iso).expect("roc");
            prop_assert_eq!(roc_to_iso(&roc).expect("iso"), iso);
        }
    }
}
