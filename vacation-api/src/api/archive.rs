//! Year rollover endpoints.

use chrono::{Datelike, Local};
use rocket::serde::json::Json;
use rocket::{Route, State, get, post};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::ApiError;
use crate::config::VacationConfig;
use crate::logged_json::LoggedJson;
use crate::models::ArchivableEmployee;
use crate::orm::DbConn;
use crate::orm::archive::{
    NewYearSummary, get_employees_with_archivable_vacations, start_new_vacation_year,
};
use crate::session_guards::AdminUser;

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct NewYearRequest {
    pub employee_ids: Vec<i32>,
    /// Allowance to reset to; the configured default when omitted.
    pub default_days: Option<i32>,
}

/// Archivable Employees endpoint.
///
/// - **URL:** `/api/1/archive/employees`
/// - **Method:** `GET`
/// - **Purpose:** Active employees with the number of approved vacations from earlier years that are not archived yet
/// - **Authentication:** Admin
#[get("/1/archive/employees")]
pub async fn archivable_employees(
    db: DbConn,
    _admin: AdminUser,
) -> Result<Json<Vec<ArchivableEmployee>>, ApiError> {
    let current_year = Local::now().year();
    let employees = db
        .run(move |conn| get_employees_with_archivable_vacations(conn, current_year))
        .await?;
    Ok(Json(employees))
}

/// New Vacation Year endpoint.
///
/// - **URL:** `/api/1/archive/new-year`
/// - **Method:** `POST`
/// - **Purpose:** Archives earlier years' approved vacations of the selected employees and resets their allowance
/// - **Authentication:** Admin
///
/// # Request Format
///
/// ```json
/// { "employee_ids": [2, 3], "default_days": 30 }
/// ```
///
/// # Response
///
/// ```json
/// { "archived_vacations": 5, "updated_employees": 2 }
/// ```
#[post("/1/archive/new-year", data = "<request>")]
pub async fn new_year(
    db: DbConn,
    admin: AdminUser,
    config: &State<VacationConfig>,
    request: LoggedJson<NewYearRequest>,
) -> Result<Json<NewYearSummary>, ApiError> {
    let NewYearRequest {
        employee_ids,
        default_days,
    } = request.into_inner();
    let default_days = default_days.unwrap_or(config.default_vacation_days);
    let current_year = Local::now().year();
    let summary = db
        .run(move |conn| start_new_vacation_year(conn, &employee_ids, default_days, current_year))
        .await?;
    info!(
        "Admin '{}' started vacation year {}: {} vacations archived, {} employees reset",
        admin.employee.username,
        current_year,
        summary.archived_vacations,
        summary.updated_employees
    );
    Ok(Json(summary))
}

pub fn routes() -> Vec<Route> {
    routes![archivable_employees, new_year]
}
