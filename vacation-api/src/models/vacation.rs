use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::vacations;

/// Lifecycle of a vacation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum VacationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VacationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VacationStatus::Pending => "pending",
            VacationStatus::Approved => "approved",
            VacationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VacationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VacationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(VacationStatus::Pending),
            "approved" => Ok(VacationStatus::Approved),
            "rejected" => Ok(VacationStatus::Rejected),
            other => Err(format!("Unknown vacation status '{}'", other)),
        }
    }
}

/// Where a request stands relative to a given day. Approved requests are
/// split into finished, ongoing and planned; clients colour by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum VacationPhase {
    Pending,
    Rejected,
    Finished,
    Ongoing,
    Planned,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = vacations)]
#[ts(export)]
pub struct Vacation {
    pub id: i32,
    pub employee_id: i32,
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string")]
    pub end_date: NaiveDate,
    pub note: Option<String>,
    pub status: String,
    pub is_archived: bool,
    pub is_inactive: bool,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

impl Vacation {
    /// Number of calendar days covered, both ends included.
    pub fn day_count(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }

    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }

    /// Phase of the request as seen on `today`. An unrecognised status
    /// counts as approved.
    pub fn phase(&self, today: NaiveDate) -> VacationPhase {
        match self.status.parse().unwrap_or(VacationStatus::Approved) {
            VacationStatus::Pending => VacationPhase::Pending,
            VacationStatus::Rejected => VacationPhase::Rejected,
            VacationStatus::Approved if self.end_date < today => VacationPhase::Finished,
            VacationStatus::Approved if self.start_date <= today => VacationPhase::Ongoing,
            VacationStatus::Approved => VacationPhase::Planned,
        }
    }
}

/// Inclusive day count of a date range; zero when the range is inverted.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        0
    } else {
        (end - start).num_days() + 1
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = vacations)]
pub struct NewVacation {
    pub employee_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub note: Option<String>,
    pub status: String,
}

/// Request body for filing or editing a vacation.
#[derive(Deserialize, Serialize, Clone, Debug, TS)]
#[ts(export)]
pub struct VacationInput {
    /// Target employee. Regular users may only file for themselves; when
    /// omitted the requester is used.
    pub employee_id: Option<i32>,
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string")]
    pub end_date: NaiveDate,
    pub note: Option<String>,
}

/// Vacation joined with the owning employee's name.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[ts(export)]
pub struct VacationWithEmployee {
    #[serde(flatten)]
    pub vacation: Vacation,
    pub employee_name: String,
}

/// Vacation together with its phase on the day it was loaded.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[ts(export)]
pub struct PhasedVacation {
    #[serde(flatten)]
    pub vacation: Vacation,
    pub phase: VacationPhase,
}

impl PhasedVacation {
    pub fn new(vacation: Vacation, today: NaiveDate) -> Self {
        let phase = vacation.phase(today);
        PhasedVacation { vacation, phase }
    }
}

/// Outcome of a bulk vacation operation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[ts(export)]
pub struct BulkResult {
    pub success: bool,
    pub affected_count: usize,
    pub errors: Vec<String>,
}

impl BulkResult {
    pub fn failed(error: impl Into<String>) -> Self {
        BulkResult {
            success: false,
            affected_count: 0,
            errors: vec![error.into()],
        }
    }
}
