use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::models::config::Config;

/// Two weekly pages of the portal.
pub const MAX_ROWS: usize = 14;

const ROW_DATE_FORMAT: &str = "%m/%d/%y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimesheetRow {
    pub index: usize,
    /// `None` on rows that already carry a punch; their date cell is never read.
    pub date: Option<NaiveDate>,
    pub already_punched: bool,
}

impl fmt::Display for TimesheetRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "row {} ({})", self.index + 1, date),
            None => write!(f, "row {}", self.index + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchDecision {
    AlreadyPunched,
    SkippedByDateRange,
    SkippedByWeekday,
    NeedsPunch,
}

impl fmt::Display for PunchDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PunchDecision::AlreadyPunched => "punch already done",
            PunchDecision::SkippedByDateRange => "skipped, inside a skip date range",
            PunchDecision::SkippedByWeekday => "skipped, not a workday",
            PunchDecision::NeedsPunch => "needs punch",
        };
        f.write_str(text)
    }
}

/// First match wins: punched, then skip ranges, then workdays.
pub fn decide(row: &TimesheetRow, config: &Config) -> PunchDecision {
    if row.already_punched {
        return PunchDecision::AlreadyPunched;
    }
    match row.date {
        Some(date) if config.in_skip_range(date) => PunchDecision::SkippedByDateRange,
        Some(date) if config.is_workday(date.weekday()) => PunchDecision::NeedsPunch,
        // An undated row has no weekday to match.
        _ => PunchDecision::SkippedByWeekday,
    }
}

/// The date cell renders as `"<weekday>\nMM/DD/YY"`; only the part after the
/// last newline is the date.
pub fn parse_row_date(raw: &str) -> Option<NaiveDate> {
    let (_, date) = raw.rsplit_once('\n')?;
    NaiveDate::parse_from_str(date.trim(), ROW_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::SkipDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(date: NaiveDate) -> TimesheetRow {
        TimesheetRow {
            index: 0,
            date: Some(date),
            already_punched: false,
        }
    }

    fn weekdays_config() -> Config {
        Config {
            workdays: vec![Some(1), Some(2), Some(3), Some(4), Some(5)],
            ..Default::default()
        }
    }

    #[test]
    fn saturday_is_skipped_by_weekday() {
        // 2024-01-06 is a Saturday
        let decision = decide(&row(date(2024, 1, 6)), &weekdays_config());
        assert_eq!(decision, PunchDecision::SkippedByWeekday);
    }

    #[test]
    fn weekday_needs_punch() {
        let decision = decide(&row(date(2024, 1, 8)), &weekdays_config());
        assert_eq!(decision, PunchDecision::NeedsPunch);
    }

    #[test]
    fn skip_range_precedes_workday_check() {
        let mut config = weekdays_config();
        config.skip_dates = vec![SkipDate {
            start: "2024-01-01".into(),
            end: "2024-01-07".into(),
        }];
        // Wednesday, a workday
        assert_eq!(
            decide(&row(date(2024, 1, 3)), &config),
            PunchDecision::SkippedByDateRange
        );
        // Saturday, also not a workday
        assert_eq!(
            decide(&row(date(2024, 1, 6)), &config),
            PunchDecision::SkippedByDateRange
        );
    }

    #[test]
    fn skip_range_is_inclusive() {
        let mut config = weekdays_config();
        config.skip_dates = vec![SkipDate {
            start: "2024-01-02".into(),
            end: "2024-01-04".into(),
        }];
        for day in [2, 3, 4] {
            assert_eq!(
                decide(&row(date(2024, 1, day)), &config),
                PunchDecision::SkippedByDateRange
            );
        }
        assert_eq!(decide(&row(date(2024, 1, 1)), &config), PunchDecision::NeedsPunch);
        assert_eq!(decide(&row(date(2024, 1, 5)), &config), PunchDecision::NeedsPunch);
    }

    #[test]
    fn already_punched_wins() {
        let mut config = weekdays_config();
        config.skip_dates = vec![SkipDate {
            start: "2024-01-01".into(),
            end: "2024-01-31".into(),
        }];
        let mut r = row(date(2024, 1, 6));
        r.already_punched = true;
        assert_eq!(decide(&r, &config), PunchDecision::AlreadyPunched);
    }

    #[test]
    fn punched_row_needs_no_date() {
        let r = TimesheetRow {
            index: 3,
            date: None,
            already_punched: true,
        };
        assert_eq!(decide(&r, &weekdays_config()), PunchDecision::AlreadyPunched);
        assert_eq!(r.to_string(), "row 4");
    }

    #[test]
    fn undated_open_row_is_never_punched() {
        let r = TimesheetRow {
            index: 0,
            date: None,
            already_punched: false,
        };
        assert_eq!(decide(&r, &weekdays_config()), PunchDecision::SkippedByWeekday);
    }

    #[test]
    fn empty_workdays_skips_everything() {
        let config = Config::default();
        assert_eq!(
            decide(&row(date(2024, 1, 8)), &config),
            PunchDecision::SkippedByWeekday
        );
    }

    #[test]
    fn sunday_is_index_zero() {
        let config = Config {
            workdays: vec![Some(0)],
            ..Default::default()
        };
        assert_eq!(decide(&row(date(2024, 1, 7)), &config), PunchDecision::NeedsPunch);
    }

    #[test]
    fn row_date_uses_text_after_last_newline() {
        assert_eq!(parse_row_date("Mon\n01/08/24"), Some(date(2024, 1, 8)));
        assert_eq!(parse_row_date("Week 2\nTue\n 12/31/24 "), Some(date(2024, 12, 31)));
        assert_eq!(parse_row_date("01/08/24"), None);
        assert_eq!(parse_row_date("Mon\n2024-01-08"), None);
    }
}
