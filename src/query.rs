use chrono::{DateTime, Duration, Utc};

/// Upper bound of a single listing page; anything past it is dropped.
pub const MAX_RESULTS: u32 = 1000;

/// Gmail search filter for `phrase` in the subject, received in the last
/// `lookback_days` days counted from `now`.
pub fn build_query(phrase: &str, lookback_days: u32, now: DateTime<Utc>) -> String {
    let since = (now - Duration::days(i64::from(lookback_days))).format("%Y/%m/%d");
    format!(r#"subject:"{}" after:{since}"#, phrase.replace('"', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn seven_day_window() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        assert_eq!(
            build_query("Trial expired by", 7, now),
            r#"subject:"Trial expired by" after:2026/10/12"#
        );
    }

    #[test]
    fn window_crosses_month_and_year() {
        let now = Utc.with_ymd_and_hms(2027, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(
            build_query("Trial expired by", 7, now),
            r#"subject:"Trial expired by" after:2026/12/27"#
        );
    }

    #[test]
    fn quotes_in_phrase_do_not_break_the_filter() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        assert_eq!(
            build_query(r#"Trial "expired""#, 1, now),
            r#"subject:"Trial expired" after:2026/10/18"#
        );
    }
}
