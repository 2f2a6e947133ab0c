//! Date windows for list filters.

use chrono::{Datelike, Duration, NaiveDate};
use shared::DatePeriod;

/// Start of a [`DatePeriod`] relative to `today`, and the SQL fragment that
/// selects it.
pub trait DateWindow {
    /// First day included in the window; `None` for all time
    fn start_date(&self, today: NaiveDate) -> Option<NaiveDate>;

    /// `"{column} = ?"` for today, `"{column} >= ?"` otherwise, paired with
    /// the date to bind
    fn sql_condition(&self, column: &str, today: NaiveDate) -> Option<(String, NaiveDate)>;
}

impl DateWindow for DatePeriod {
    fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DatePeriod::AllTime => None,
            DatePeriod::Today => Some(today),
            DatePeriod::ThisWeek => {
                let offset = today.weekday().num_days_from_monday() as i64;
                Some(today - Duration::days(offset))
            }
            DatePeriod::ThisMonth => Some(first_of_month(today)),
            DatePeriod::Last30Days => Some(today - Duration::days(30)),
            DatePeriod::Last90Days => Some(today - Duration::days(90)),
        }
    }

    fn sql_condition(&self, column: &str, today: NaiveDate) -> Option<(String, NaiveDate)> {
        let start = self.start_date(today)?;
        let op = if *self == DatePeriod::Today { "=" } else { ">=" };
        Some((format!("{} {} ?", column, op), start))
    }
}

pub fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}
