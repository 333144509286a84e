//! Maintenance mode switch.

use rocket::serde::json::Json;
use rocket::{Route, get, put};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ApiError, db_error};
use crate::logged_json::LoggedJson;
use crate::orm::DbConn;
use crate::orm::settings::{get_maintenance_mode, set_maintenance_mode};
use crate::session_guards::AdminUser;

#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct MaintenanceStatus {
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct MaintenanceChange {
    pub enabled: bool,
    /// Employees whose sessions were ended by switching it on.
    pub logged_out: Vec<i32>,
}

/// Maintenance Mode endpoint.
///
/// - **URL:** `/api/1/settings/maintenance`
/// - **Method:** `GET`
/// - **Purpose:** Whether maintenance mode is on
/// - **Authentication:** None required
#[get("/1/settings/maintenance")]
pub async fn maintenance_mode(db: DbConn) -> Result<Json<MaintenanceStatus>, ApiError> {
    let enabled = db.run(get_maintenance_mode).await.map_err(db_error)?;
    Ok(Json(MaintenanceStatus { enabled }))
}

/// Set Maintenance Mode endpoint.
///
/// - **URL:** `/api/1/settings/maintenance`
/// - **Method:** `PUT`
/// - **Purpose:** Switches maintenance mode on or off
/// - **Authentication:** Admin
///
/// Switching it on sends `IMMEDIATE_LOGOUT` to every non-admin with a live
/// session and ends those sessions. While it is on, non-admin logins fail
/// with 503.
///
/// # Request Format
///
/// ```json
/// { "enabled": true }
/// ```
#[put("/1/settings/maintenance", data = "<request>")]
pub async fn update_maintenance_mode(
    db: DbConn,
    admin: AdminUser,
    request: LoggedJson<MaintenanceStatus>,
) -> Result<Json<MaintenanceChange>, ApiError> {
    let enabled = request.enabled;
    let logged_out = db
        .run(move |conn| set_maintenance_mode(conn, enabled))
        .await
        .map_err(db_error)?;
    warn!(
        "Admin '{}' turned maintenance mode {} ({} employees logged out)",
        admin.employee.username,
        if enabled { "on" } else { "off" },
        logged_out.len()
    );
    Ok(Json(MaintenanceChange {
        enabled,
        logged_out,
    }))
}

pub fn routes() -> Vec<Route> {
    routes![maintenance_mode, update_maintenance_mode]
}
