//! Bulk vacation operations for admins.

use rocket::serde::json::Json;
use rocket::{Route, post};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ApiError, db_error};
use crate::logged_json::LoggedJson;
use crate::models::{BulkResult, VacationStatus};
use crate::orm::DbConn;
use crate::orm::bulk::{bulk_delete_vacations, bulk_update_vacation_status};
use crate::session_guards::AdminUser;

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i32>,
}

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct BulkStatusRequest {
    pub ids: Vec<i32>,
    pub status: VacationStatus,
}

/// Bulk Delete endpoint.
///
/// - **URL:** `/api/1/vacations/bulk/delete`
/// - **Method:** `POST`
/// - **Purpose:** Deletes several vacations at once and notifies each owner
/// - **Authentication:** Admin
///
/// The body of a 200 response tells whether anything happened:
///
/// ```json
/// { "success": true, "affected_count": 2, "errors": ["Vacation 99 not found"] }
/// ```
#[post("/1/vacations/bulk/delete", data = "<request>")]
pub async fn bulk_delete(
    db: DbConn,
    admin: AdminUser,
    request: LoggedJson<BulkDeleteRequest>,
) -> Result<Json<BulkResult>, ApiError> {
    let ids = request.into_inner().ids;
    let admin_name = admin.employee.name;
    let result = db
        .run(move |conn| bulk_delete_vacations(conn, &ids, &admin_name))
        .await
        .map_err(db_error)?;
    Ok(Json(result))
}

/// Bulk Status endpoint.
///
/// - **URL:** `/api/1/vacations/bulk/status`
/// - **Method:** `POST`
/// - **Purpose:** Sets the status of several vacations at once and notifies each owner
/// - **Authentication:** Admin
#[post("/1/vacations/bulk/status", data = "<request>")]
pub async fn bulk_status(
    db: DbConn,
    admin: AdminUser,
    request: LoggedJson<BulkStatusRequest>,
) -> Result<Json<BulkResult>, ApiError> {
    let BulkStatusRequest { ids, status } = request.into_inner();
    let admin_name = admin.employee.name;
    let result = db
        .run(move |conn| bulk_update_vacation_status(conn, &ids, status, &admin_name))
        .await
        .map_err(db_error)?;
    Ok(Json(result))
}

pub fn routes() -> Vec<Route> {
    routes![bulk_delete, bulk_status]
}
