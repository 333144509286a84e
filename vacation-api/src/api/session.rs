//! Admin view of live sessions.

use rocket::serde::json::Json;
use rocket::{Route, get, post};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ApiError, db_error};
use crate::logged_json::LoggedJson;
use crate::models::{ActiveUserDetail, SessionCount};
use crate::orm::DbConn;
use crate::orm::session::{
    force_remove_sessions_by_user_id, get_active_session_counts, get_active_user_details,
};
use crate::session_guards::AdminUser;

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct UserIdsRequest {
    pub user_ids: Vec<i32>,
}

#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct RemovedSessions {
    pub removed: usize,
}

/// Session Counts endpoint.
///
/// - **URL:** `/api/1/sessions/counts`
/// - **Method:** `GET`
/// - **Purpose:** Number of live sessions per employee
/// - **Authentication:** Admin
#[get("/1/sessions/counts")]
pub async fn session_counts(
    db: DbConn,
    _admin: AdminUser,
) -> Result<Json<Vec<SessionCount>>, ApiError> {
    db.run(get_active_session_counts)
        .await
        .map(Json)
        .map_err(db_error)
}

/// Active Users endpoint.
///
/// - **URL:** `/api/1/sessions`
/// - **Method:** `GET`
/// - **Purpose:** Every live session with the employee it belongs to
/// - **Authentication:** Admin
#[get("/1/sessions")]
pub async fn active_users(
    db: DbConn,
    _admin: AdminUser,
) -> Result<Json<Vec<ActiveUserDetail>>, ApiError> {
    db.run(get_active_user_details)
        .await
        .map(Json)
        .map_err(db_error)
}

/// Force Logout endpoint.
///
/// - **URL:** `/api/1/sessions/force-logout`
/// - **Method:** `POST`
/// - **Purpose:** Ends every session of the given employees
/// - **Authentication:** Admin
///
/// Clients learn about it on their next request, which fails with 401.
#[post("/1/sessions/force-logout", data = "<request>")]
pub async fn force_logout(
    db: DbConn,
    admin: AdminUser,
    request: LoggedJson<UserIdsRequest>,
) -> Result<Json<RemovedSessions>, ApiError> {
    let user_ids = request.into_inner().user_ids;
    let removed = db
        .run(move |conn| force_remove_sessions_by_user_id(conn, &user_ids))
        .await
        .map_err(db_error)?;
    info!(
        "Admin '{}' force-removed {} sessions",
        admin.employee.username, removed
    );
    Ok(Json(RemovedSessions { removed }))
}

pub fn routes() -> Vec<Route> {
    routes![session_counts, active_users, force_logout]
}
