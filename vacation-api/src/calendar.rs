//! Month view of approved vacations.
//!
//! The view is rebuilt on every request: each day of the month is checked
//! against every vacation in the list.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::{VacationPhase, VacationWithEmployee};

/// One vacation as shown on a calendar day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[ts(export)]
pub struct CalendarEntry {
    pub vacation_id: i32,
    pub employee_id: i32,
    pub employee_name: String,
    pub phase: VacationPhase,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[ts(export)]
pub struct CalendarDay {
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub is_weekend: bool,
    pub vacations: Vec<CalendarEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[ts(export)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

/// Builds the calendar for `year`/`month`. Each entry carries the vacation's
/// phase as of `today`.
///
/// Returns `None` when the month is not 1..=12 or the year is out of range.
pub fn month_calendar(
    year: i32,
    month: u32,
    vacations: &[VacationWithEmployee],
    today: NaiveDate,
) -> Option<MonthCalendar> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let days = first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| CalendarDay {
            date,
            is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            vacations: vacations
                .iter()
                .filter(|v| v.vacation.covers(date))
                .map(|v| CalendarEntry {
                    vacation_id: v.vacation.id,
                    employee_id: v.vacation.employee_id,
                    employee_name: v.employee_name.clone(),
                    phase: v.vacation.phase(today),
                })
                .collect(),
        })
        .collect();

    Some(MonthCalendar { year, month, days })
}
