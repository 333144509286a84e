//! Client error reports.

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, delete, get, post, put};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ApiError, db_error, error_response};
use crate::logged_json::LoggedJson;
use crate::models::ErrorLogView;
use crate::orm::DbConn;
use crate::orm::error_log::{delete_error_log, get_all_errors, log_error, mark_error_as_resolved};
use crate::session_guards::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct ErrorReport {
    pub traceback: String,
}

/// Report Error endpoint.
///
/// - **URL:** `/api/1/errors`
/// - **Method:** `POST`
/// - **Purpose:** Stores an error a client ran into
/// - **Authentication:** Optional; the reporter is recorded when logged in
#[post("/1/errors", data = "<report>")]
pub async fn report_error(
    db: DbConn,
    auth_user: Option<AuthenticatedUser>,
    report: LoggedJson<ErrorReport>,
) -> Result<Status, ApiError> {
    let traceback = report.into_inner().traceback;
    if traceback.trim().is_empty() {
        return Err(error_response(Status::BadRequest, "Traceback is required"));
    }
    let user_id = auth_user.map(|u| u.employee.id);
    db.run(move |conn| log_error(conn, user_id, &traceback))
        .await
        .map_err(db_error)?;
    Ok(Status::Created)
}

/// List Errors endpoint.
///
/// - **URL:** `/api/1/errors`
/// - **Method:** `GET`
/// - **Purpose:** Every reported error, newest first, with the reporter's username
/// - **Authentication:** Admin
#[get("/1/errors")]
pub async fn list_errors(
    db: DbConn,
    _admin: AdminUser,
) -> Result<Json<Vec<ErrorLogView>>, ApiError> {
    db.run(get_all_errors).await.map(Json).map_err(db_error)
}

/// Resolve Error endpoint.
///
/// - **URL:** `/api/1/errors/<error_id>/resolved`
/// - **Method:** `PUT`
/// - **Authentication:** Admin
#[put("/1/errors/<error_id>/resolved")]
pub async fn resolve_error(
    db: DbConn,
    _admin: AdminUser,
    error_id: i32,
) -> Result<Status, ApiError> {
    let updated = db
        .run(move |conn| mark_error_as_resolved(conn, error_id))
        .await
        .map_err(db_error)?;
    if updated == 0 {
        return Err(error_response(Status::NotFound, "Error log not found"));
    }
    Ok(Status::Ok)
}

/// Delete Error endpoint.
///
/// - **URL:** `/api/1/errors/<error_id>`
/// - **Method:** `DELETE`
/// - **Authentication:** Admin
#[delete("/1/errors/<error_id>")]
pub async fn delete_error(
    db: DbConn,
    _admin: AdminUser,
    error_id: i32,
) -> Result<Status, ApiError> {
    let deleted = db
        .run(move |conn| delete_error_log(conn, error_id))
        .await
        .map_err(db_error)?;
    if deleted == 0 {
        return Err(error_response(Status::NotFound, "Error log not found"));
    }
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![report_error, list_errors, resolve_error, delete_error]
}
