//! API endpoints for the caller's own notifications.
//!
//! Every endpoint works on the logged-in employee's rows only; ids that
//! belong to someone else are silently ignored.

use rocket::serde::json::Json;
use rocket::{Route, get, post};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ApiError, db_error};
use crate::logged_json::LoggedJson;
use crate::models::NotificationView;
use crate::orm::DbConn;
use crate::orm::notification::{
    delete_notifications, get_all_notifications, get_unread_count, mark_notifications_as_read,
};
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct NotificationIdsRequest {
    pub ids: Vec<i32>,
}

#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct AffectedCount {
    pub affected: usize,
}

/// List Notifications endpoint.
///
/// - **URL:** `/api/1/notifications`
/// - **Method:** `GET`
/// - **Purpose:** The caller's notifications, newest first
/// - **Authentication:** Required
///
/// Each entry carries `vacation_employee_id`, the owner of the linked
/// vacation, or `null` when the notification has no link.
#[get("/1/notifications")]
pub async fn list_notifications(
    db: DbConn,
    auth_user: AuthenticatedUser,
) -> Result<Json<Vec<NotificationView>>, ApiError> {
    let user_id = auth_user.employee.id;
    db.run(move |conn| get_all_notifications(conn, user_id))
        .await
        .map(Json)
        .map_err(db_error)
}

/// Unread Count endpoint.
///
/// - **URL:** `/api/1/notifications/unread-count`
/// - **Method:** `GET`
/// - **Purpose:** Number of unread notifications
/// - **Authentication:** Required
#[get("/1/notifications/unread-count")]
pub async fn unread_count(
    db: DbConn,
    auth_user: AuthenticatedUser,
) -> Result<Json<UnreadCount>, ApiError> {
    let user_id = auth_user.employee.id;
    let unread = db
        .run(move |conn| get_unread_count(conn, user_id))
        .await
        .map_err(db_error)?;
    Ok(Json(UnreadCount { unread }))
}

/// Mark Read endpoint.
///
/// - **URL:** `/api/1/notifications/read`
/// - **Method:** `POST`
/// - **Purpose:** Marks the given notifications as read
/// - **Authentication:** Required
#[post("/1/notifications/read", data = "<request>")]
pub async fn mark_read(
    db: DbConn,
    auth_user: AuthenticatedUser,
    request: LoggedJson<NotificationIdsRequest>,
) -> Result<Json<AffectedCount>, ApiError> {
    let user_id = auth_user.employee.id;
    let ids = request.into_inner().ids;
    let affected = db
        .run(move |conn| mark_notifications_as_read(conn, user_id, &ids))
        .await
        .map_err(db_error)?;
    Ok(Json(AffectedCount { affected }))
}

/// Delete Notifications endpoint.
///
/// - **URL:** `/api/1/notifications/delete`
/// - **Method:** `POST`
/// - **Purpose:** Deletes the given notifications
/// - **Authentication:** Required
#[post("/1/notifications/delete", data = "<request>")]
pub async fn delete_selected(
    db: DbConn,
    auth_user: AuthenticatedUser,
    request: LoggedJson<NotificationIdsRequest>,
) -> Result<Json<AffectedCount>, ApiError> {
    let user_id = auth_user.employee.id;
    let ids = request.into_inner().ids;
    let affected = db
        .run(move |conn| delete_notifications(conn, user_id, &ids))
        .await
        .map_err(db_error)?;
    Ok(Json(AffectedCount { affected }))
}

pub fn routes() -> Vec<Route> {
    routes![list_notifications, unread_count, mark_read, delete_selected]
}
