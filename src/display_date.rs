use chrono::NaiveDate;

/// Canonical on-screen study date, e.g. `Jan 15, 2020`.
pub const DISPLAY_DATE_FORMAT: &str = "%b %d, %Y";
/// Text a date field takes when it could not be read as a compact DICOM date.
pub const INVALID_DATE: &str = "Invalid date";

/// Strict parse of the canonical display form. Month names match in any case
/// (`JAN 05, 2020`); the day must have two digits (`Jan 5, 2020` is rejected).
pub fn parse_display_date(value: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(value, DISPLAY_DATE_FORMAT).ok()?;
    format_display_date(date)
        .eq_ignore_ascii_case(value)
        .then_some(date)
}

pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Reads a DICOM DA value (`YYYYMMDD`). Separators (`2020-01-15`, `2020.01.15`) are tolerated.
pub fn parse_compact_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed
        .chars()
        .any(|ch| !ch.is_ascii_digit() && !matches!(ch, '-' | '/' | '.'))
    {
        return None;
    }
    let digits = trimmed
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    if digits.len() != 8 {
        return None;
    }

    let year = digits[0..4].parse::<i32>().ok()?;
    let month = digits[4..6].parse::<u32>().ok()?;
    let day = digits[6..8].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Canonical display text for a study date; already-canonical input is returned unchanged.
pub fn normalize_display_date(value: &str) -> String {
    if parse_display_date(value).is_some() {
        return value.to_string();
    }
    parse_compact_date(value)
        .map(format_display_date)
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_date_becomes_display_date() {
        assert_eq!(normalize_display_date("20200115"), "Jan 15, 2020");
        assert_eq!(normalize_display_date("19991231"), "Dec 31, 1999");
    }

    #[test]
    fn display_date_is_left_alone() {
        assert_eq!(normalize_display_date("Jan 15, 2020"), "Jan 15, 2020");
        let once = normalize_display_date("20200201");
        assert_eq!(normalize_display_date(&once), once);
    }

    #[test]
    fn display_date_parse_is_strict() {
        assert!(parse_display_date("Jan 05, 2020").is_some());
        assert!(parse_display_date("Jan 5, 2020").is_none());
        assert!(parse_display_date("Jan 05,  2020").is_none());
        assert!(parse_display_date("Feb 30, 2020").is_none());
        assert!(parse_display_date("20200105").is_none());
    }

    #[test]
    fn display_date_month_matches_any_case() {
        assert_eq!(
            parse_display_date("JAN 05, 2020"),
            NaiveDate::from_ymd_opt(2020, 1, 5)
        );
        assert_eq!(normalize_display_date("JAN 05, 2020"), "JAN 05, 2020");
        assert_eq!(normalize_display_date("feb 29, 2020"), "feb 29, 2020");
    }

    #[test]
    fn malformed_dates_become_invalid_date() {
        assert_eq!(normalize_display_date(""), INVALID_DATE);
        assert_eq!(normalize_display_date("2020011"), INVALID_DATE);
        assert_eq!(normalize_display_date("20201340"), INVALID_DATE);
        assert_eq!(normalize_display_date("yesterday"), INVALID_DATE);
    }

    #[test]
    fn compact_date_tolerates_separators() {
        assert_eq!(
            parse_compact_date("2020-01-15"),
            NaiveDate::from_ymd_opt(2020, 1, 15)
        );
        assert_eq!(
            parse_compact_date("2020.01.15"),
            NaiveDate::from_ymd_opt(2020, 1, 15)
        );
    }

    #[test]
    fn compact_date_formats_as_dicom_da() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 7).expect("valid date");
        assert_eq!(format_compact_date(date), "20200307");
    }
}
