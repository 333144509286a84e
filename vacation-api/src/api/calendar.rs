use chrono::Local;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, get};

use crate::api::{ApiError, db_error, error_response};
use crate::calendar::{MonthCalendar, month_calendar};
use crate::orm::DbConn;
use crate::orm::vacation::get_all_active_vacations;
use crate::session_guards::AuthenticatedUser;

/// Month Calendar endpoint.
///
/// - **URL:** `/api/1/calendar/<year>/<month>`
/// - **Method:** `GET`
/// - **Purpose:** Every day of the month with the active vacations covering it,
///   each tagged with its phase (`finished`, `ongoing`, `planned`) as of today
/// - **Authentication:** Required
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// {
///   "year": 2025,
///   "month": 2,
///   "days": [
///     { "date": "2025-02-01", "is_weekend": true, "vacations": [
///       { "vacation_id": 4, "employee_id": 2, "employee_name": "Alice Smith", "phase": "planned" }
///     ] }
///   ]
/// }
/// ```
///
/// **Failure (HTTP 400 Bad Request):** month outside 1..=12
#[get("/1/calendar/<year>/<month>")]
pub async fn month(
    db: DbConn,
    _auth_user: AuthenticatedUser,
    year: i32,
    month: u32,
) -> Result<Json<MonthCalendar>, ApiError> {
    if !(1..=12).contains(&month) {
        return Err(error_response(Status::BadRequest, "Month must be between 1 and 12"));
    }
    let vacations = db.run(get_all_active_vacations).await.map_err(db_error)?;
    month_calendar(year, month, &vacations, Local::now().date_naive())
        .map(Json)
        .ok_or_else(|| error_response(Status::BadRequest, "Invalid year"))
}

pub fn routes() -> Vec<Route> {
    routes![month]
}
