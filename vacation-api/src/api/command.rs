//! System commands: logout instructions that clients poll for.

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, get, post};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::session::UserIdsRequest;
use crate::api::{ApiError, db_error};
use crate::logged_json::LoggedJson;
use crate::models::SystemCommand;
use crate::orm::DbConn;
use crate::orm::system_command::{
    get_pending_command, issue_immediate_logout_command, issue_timed_logout_command,
    mark_command_as_executed,
};
use crate::session_guards::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct TimedLogoutRequest {
    pub user_ids: Vec<i32>,
    pub minutes: i64,
}

#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct IssuedCommands {
    pub issued: usize,
}

/// Timed Logout endpoint.
///
/// - **URL:** `/api/1/commands/timed-logout`
/// - **Method:** `POST`
/// - **Purpose:** Tells the given employees' clients to log out `minutes` from now
/// - **Authentication:** Admin
///
/// # Request Format
///
/// ```json
/// { "user_ids": [2, 3], "minutes": 5 }
/// ```
#[post("/1/commands/timed-logout", data = "<request>")]
pub async fn timed_logout(
    db: DbConn,
    _admin: AdminUser,
    request: LoggedJson<TimedLogoutRequest>,
) -> Result<Json<IssuedCommands>, ApiError> {
    let TimedLogoutRequest { user_ids, minutes } = request.into_inner();
    let issued = db
        .run(move |conn| issue_timed_logout_command(conn, &user_ids, minutes))
        .await?;
    Ok(Json(IssuedCommands { issued }))
}

/// Immediate Logout endpoint.
///
/// - **URL:** `/api/1/commands/immediate-logout`
/// - **Method:** `POST`
/// - **Purpose:** Tells the given employees' clients to log out now
/// - **Authentication:** Admin
#[post("/1/commands/immediate-logout", data = "<request>")]
pub async fn immediate_logout(
    db: DbConn,
    _admin: AdminUser,
    request: LoggedJson<UserIdsRequest>,
) -> Result<Json<IssuedCommands>, ApiError> {
    let user_ids = request.into_inner().user_ids;
    let issued = db
        .run(move |conn| issue_immediate_logout_command(conn, &user_ids))
        .await?;
    Ok(Json(IssuedCommands { issued }))
}

/// Pending Command endpoint.
///
/// - **URL:** `/api/1/commands/pending`
/// - **Method:** `GET`
/// - **Purpose:** The caller's latest unexecuted command, or `null`
/// - **Authentication:** Required
#[get("/1/commands/pending")]
pub async fn pending_command(
    db: DbConn,
    auth_user: AuthenticatedUser,
) -> Result<Json<Option<SystemCommand>>, ApiError> {
    let user_id = auth_user.employee.id;
    db.run(move |conn| get_pending_command(conn, user_id))
        .await
        .map(Json)
        .map_err(db_error)
}

/// Command Executed endpoint.
///
/// - **URL:** `/api/1/commands/<command_id>/executed`
/// - **Method:** `POST`
/// - **Purpose:** Acknowledges a command addressed to the caller
/// - **Authentication:** Required
///
/// Commands addressed to someone else answer 404.
#[post("/1/commands/<command_id>/executed")]
pub async fn command_executed(
    db: DbConn,
    auth_user: AuthenticatedUser,
    command_id: i32,
) -> Result<Status, ApiError> {
    let user_id = auth_user.employee.id;
    db.run(move |conn| mark_command_as_executed(conn, command_id, user_id))
        .await?;
    Ok(Status::Ok)
}

pub fn routes() -> Vec<Route> {
    routes![timed_logout, immediate_logout, pending_command, command_executed]
}
