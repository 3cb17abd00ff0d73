//! Catalog date parsing anchored to US Pacific time.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc, Weekday};

use crate::constants::documents::DATE_FORMAT;

const PST_OFFSET_SECS: i32 = -8 * 3600;
const PDT_OFFSET_SECS: i32 = -7 * 3600;

/// Parse a `YYYY-MM-DD` catalog date as midnight US Pacific time.
///
/// Returns `None` when the value does not match the pattern or names an
/// impossible calendar day.
pub fn parse_catalog_date(value: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).ok()?;
    pacific_midnight(date)
}

/// Convert a calendar day to the UTC instant of its Pacific midnight.
pub fn pacific_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    let offset = pacific_offset_at_midnight(date)?;
    date.and_hms_opt(0, 0, 0)?
        .and_local_timezone(offset)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// UTC offset in effect in the US Pacific zone at 00:00 local time on `date`.
///
/// Transitions happen at 02:00 local, so midnight on the spring-forward day is
/// still standard time and midnight on the fall-back day is still daylight time.
/// Follows the federal rules from 1967 onward; earlier years are treated as
/// standard time all year.
pub fn pacific_offset_at_midnight(date: NaiveDate) -> Option<FixedOffset> {
    let daylight = daylight_saving_bounds(date.year())
        .is_some_and(|(start, end)| date > start && date <= end);
    FixedOffset::east_opt(if daylight {
        PDT_OFFSET_SECS
    } else {
        PST_OFFSET_SECS
    })
}

/// Calendar days on which daylight saving time starts and ends for `year`.
///
/// `None` when no uniform rule applies.
fn daylight_saving_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let start = match year {
        2007.. => NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2)?,
        1987..=2006 => NaiveDate::from_weekday_of_month_opt(year, 4, Weekday::Sun, 1)?,
        // Energy-crisis years.
        1974 => NaiveDate::from_ymd_opt(1974, 1, 6)?,
        1975 => NaiveDate::from_ymd_opt(1975, 2, 23)?,
        1967..=1986 => last_sunday_of(year, 4)?,
        _ => return None,
    };
    let end = if year >= 2007 {
        NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1)?
    } else {
        last_sunday_of(year, 10)?
    };
    Some((start, end))
}

fn last_sunday_of(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = first_of_next - Duration::days(1);
    Some(last - Duration::days(i64::from(last.weekday().num_days_from_sunday())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn winter_dates_use_standard_time() {
        assert_eq!(parse_catalog_date("2016-01-23"), Some(utc(2016, 1, 23, 8)));
        assert_eq!(parse_catalog_date("2015-12-31"), Some(utc(2015, 12, 31, 8)));
    }

    #[test]
    fn summer_dates_use_daylight_time() {
        assert_eq!(parse_catalog_date("2016-07-01"), Some(utc(2016, 7, 1, 7)));
    }

    #[test]
    fn transition_days_follow_two_am_switch() {
        // 2016: DST from Sunday March 13 to Sunday November 6.
        assert_eq!(parse_catalog_date("2016-03-13"), Some(utc(2016, 3, 13, 8)));
        assert_eq!(parse_catalog_date("2016-03-14"), Some(utc(2016, 3, 14, 7)));
        assert_eq!(parse_catalog_date("2016-11-06"), Some(utc(2016, 11, 6, 7)));
        assert_eq!(parse_catalog_date("2016-11-07"), Some(utc(2016, 11, 7, 8)));
    }

    #[test]
    fn pre_2007_rules_apply_to_older_dates() {
        // 2005: DST from Sunday April 3 to Sunday October 30.
        assert_eq!(parse_catalog_date("2005-04-03"), Some(utc(2005, 4, 3, 8)));
        assert_eq!(parse_catalog_date("2005-04-04"), Some(utc(2005, 4, 4, 7)));
        assert_eq!(parse_catalog_date("2005-10-30"), Some(utc(2005, 10, 30, 7)));
        assert_eq!(parse_catalog_date("2005-10-31"), Some(utc(2005, 10, 31, 8)));
    }

    #[test]
    fn seventies_and_eighties_start_on_last_sunday_of_april() {
        // 1980: DST from Sunday April 27 to Sunday October 26.
        assert_eq!(parse_catalog_date("1980-04-07"), Some(utc(1980, 4, 7, 8)));
        assert_eq!(parse_catalog_date("1980-04-27"), Some(utc(1980, 4, 27, 8)));
        assert_eq!(parse_catalog_date("1980-04-28"), Some(utc(1980, 4, 28, 7)));
        assert_eq!(parse_catalog_date("1980-10-27"), Some(utc(1980, 10, 27, 8)));
        assert_eq!(parse_catalog_date("1974-01-07"), Some(utc(1974, 1, 7, 7)));
    }

    #[test]
    fn years_before_uniform_rules_stay_on_standard_time() {
        assert_eq!(parse_catalog_date("1960-07-01"), Some(utc(1960, 7, 1, 8)));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_catalog_date(""), None);
        assert_eq!(parse_catalog_date("not-a-date"), None);
        assert_eq!(parse_catalog_date("2016-02-30"), None);
        assert_eq!(parse_catalog_date("2016-13-01"), None);
        assert_eq!(parse_catalog_date("01/23/2016"), None);
    }

    #[test]
    fn last_sunday_handles_december() {
        assert_eq!(
            last_sunday_of(2016, 12),
            NaiveDate::from_ymd_opt(2016, 12, 25)
        );
    }
}
