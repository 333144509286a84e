//! API endpoints for vacation requests.
//!
//! Every mutation that concerns another employee's vacation is admin-only
//! and writes a notification for the owner in the same transaction.

use chrono::NaiveDate;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, delete, get, post, put};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ApiError, db_error, error_response};
use crate::logged_json::LoggedJson;
use crate::models::{Vacation, VacationInput, VacationStatus, VacationWithEmployee};
use crate::orm::DbConn;
use crate::orm::vacation::{
    add_vacation, delete_vacation, get_all_active_vacations, get_pending_vacation_requests,
    get_vacation, toggle_vacation_activity, update_vacation, update_vacation_status,
};
use crate::session_guards::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct UpdateVacationRequest {
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string")]
    pub end_date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct StatusRequest {
    pub status: VacationStatus,
}

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct InactiveRequest {
    pub is_inactive: bool,
}

/// Request Vacation endpoint.
///
/// - **URL:** `/api/1/vacations`
/// - **Method:** `POST`
/// - **Purpose:** Files a vacation request
/// - **Authentication:** Required
///
/// Requests filed by an admin are approved immediately; all others start
/// as `pending` and every active admin is notified. Regular employees can
/// only file for themselves.
///
/// # Request Format
///
/// ```json
/// {
///   "start_date": "2025-07-01",
///   "end_date": "2025-07-14",
///   "note": "Summer"
/// }
/// ```
///
/// # Response
///
/// - **201 Created** with the stored vacation
/// - **400 Bad Request** when `end_date` is before `start_date`
/// - **403 Forbidden** when a regular employee files for someone else
#[post("/1/vacations", data = "<request>")]
pub async fn create_vacation(
    db: DbConn,
    auth_user: AuthenticatedUser,
    request: LoggedJson<VacationInput>,
) -> Result<status::Created<Json<Vacation>>, ApiError> {
    let requester = auth_user.employee;
    let input = request.into_inner();
    let vacation = db
        .run(move |conn| add_vacation(conn, &requester, input))
        .await?;
    Ok(status::Created::new(format!("/api/1/vacations/{}", vacation.id)).body(Json(vacation)))
}

/// Active Vacations endpoint.
///
/// - **URL:** `/api/1/vacations/active`
/// - **Method:** `GET`
/// - **Purpose:** Approved vacations that are neither archived nor inactive, with employee names
/// - **Authentication:** Required
#[get("/1/vacations/active")]
pub async fn active_vacations(
    db: DbConn,
    _auth_user: AuthenticatedUser,
) -> Result<Json<Vec<VacationWithEmployee>>, ApiError> {
    db.run(get_all_active_vacations)
        .await
        .map(Json)
        .map_err(db_error)
}

/// Pending Requests endpoint.
///
/// - **URL:** `/api/1/vacations/pending?employee_id=3`
/// - **Method:** `GET`
/// - **Purpose:** Pending requests, oldest first
/// - **Authentication:** Required
///
/// Admins see every employee's requests, optionally narrowed by
/// `employee_id`. Regular employees always get only their own.
#[get("/1/vacations/pending?<employee_id>")]
pub async fn pending_vacations(
    db: DbConn,
    auth_user: AuthenticatedUser,
    employee_id: Option<i32>,
) -> Result<Json<Vec<VacationWithEmployee>>, ApiError> {
    let filter = if auth_user.is_admin() {
        employee_id
    } else {
        Some(auth_user.employee.id)
    };
    db.run(move |conn| get_pending_vacation_requests(conn, filter))
        .await
        .map(Json)
        .map_err(db_error)
}

/// Get Vacation endpoint.
///
/// - **URL:** `/api/1/vacations/<vacation_id>`
/// - **Method:** `GET`
/// - **Purpose:** Returns one vacation
/// - **Authentication:** The owner or an admin
#[get("/1/vacations/<vacation_id>")]
pub async fn get_vacation_endpoint(
    db: DbConn,
    auth_user: AuthenticatedUser,
    vacation_id: i32,
) -> Result<Json<Vacation>, ApiError> {
    let vacation = db
        .run(move |conn| get_vacation(conn, vacation_id))
        .await
        .map_err(db_error)?
        .ok_or_else(|| error_response(Status::NotFound, "Vacation not found"))?;
    if !auth_user.can_act_for(vacation.employee_id) {
        // Other employees' vacations read as missing.
        return Err(error_response(Status::NotFound, "Vacation not found"));
    }
    Ok(Json(vacation))
}

/// Edit Vacation endpoint.
///
/// - **URL:** `/api/1/vacations/<vacation_id>`
/// - **Method:** `PUT`
/// - **Purpose:** Changes dates and note of a vacation; the owner is notified
/// - **Authentication:** Admin
#[put("/1/vacations/<vacation_id>", data = "<request>")]
pub async fn edit_vacation(
    db: DbConn,
    admin: AdminUser,
    vacation_id: i32,
    request: LoggedJson<UpdateVacationRequest>,
) -> Result<Json<Vacation>, ApiError> {
    let request = request.into_inner();
    let admin_name = admin.employee.name;
    let vacation = db
        .run(move |conn| {
            update_vacation(
                conn,
                vacation_id,
                request.start_date,
                request.end_date,
                request.note,
                &admin_name,
            )
        })
        .await?;
    Ok(Json(vacation))
}

/// Set Status endpoint.
///
/// - **URL:** `/api/1/vacations/<vacation_id>/status`
/// - **Method:** `PUT`
/// - **Purpose:** Approves or rejects a vacation; the owner is notified
/// - **Authentication:** Admin
///
/// Only `approved` and `rejected` are accepted (400 otherwise).
#[put("/1/vacations/<vacation_id>/status", data = "<request>")]
pub async fn set_vacation_status(
    db: DbConn,
    admin: AdminUser,
    vacation_id: i32,
    request: LoggedJson<StatusRequest>,
) -> Result<Json<Vacation>, ApiError> {
    let status = request.status;
    let admin_name = admin.employee.name;
    let vacation = db
        .run(move |conn| update_vacation_status(conn, vacation_id, status, &admin_name))
        .await?;
    info!("Vacation {} set to {}", vacation_id, status);
    Ok(Json(vacation))
}

/// Toggle Activity endpoint.
///
/// - **URL:** `/api/1/vacations/<vacation_id>/activity`
/// - **Method:** `PUT`
/// - **Purpose:** Marks an approved vacation inactive (or active again); the owner is notified
/// - **Authentication:** Admin
#[put("/1/vacations/<vacation_id>/activity", data = "<request>")]
pub async fn set_vacation_activity(
    db: DbConn,
    admin: AdminUser,
    vacation_id: i32,
    request: LoggedJson<InactiveRequest>,
) -> Result<Json<Vacation>, ApiError> {
    let is_inactive = request.is_inactive;
    let admin_name = admin.employee.name;
    let vacation = db
        .run(move |conn| toggle_vacation_activity(conn, vacation_id, is_inactive, &admin_name))
        .await?;
    Ok(Json(vacation))
}

/// Delete Vacation endpoint.
///
/// - **URL:** `/api/1/vacations/<vacation_id>`
/// - **Method:** `DELETE`
/// - **Purpose:** Deletes a vacation; the owner is notified
/// - **Authentication:** Admin
#[delete("/1/vacations/<vacation_id>")]
pub async fn delete_vacation_endpoint(
    db: DbConn,
    admin: AdminUser,
    vacation_id: i32,
) -> Result<Status, ApiError> {
    let admin_name = admin.employee.name;
    db.run(move |conn| delete_vacation(conn, vacation_id, &admin_name))
        .await?;
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![
        create_vacation,
        active_vacations,
        pending_vacations,
        get_vacation_endpoint,
        edit_vacation,
        set_vacation_status,
        set_vacation_activity,
        delete_vacation_endpoint,
    ]
}
