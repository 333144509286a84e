//! API version 1 - Status endpoints
//!
//! Health check for monitoring, including build information and whether
//! maintenance mode is currently on.

use rocket::{Route, serde::json::Json};
use serde::Serialize;
use ts_rs::TS;

use crate::orm::DbConn;
use crate::orm::settings::get_maintenance_mode;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize, TS)]
#[ts(export)]
pub struct HealthStatus {
    status: &'static str,
    version: &'static str,
    built: &'static str,
    git_commit: Option<&'static str>,
    /// `None` when the main database is unreachable.
    maintenance_mode: Option<bool>,
}

/// Health Status endpoint.
///
/// - **URL:** `/api/1/status`
/// - **Method:** `GET`
/// - **Purpose:** Returns the health status of the application
/// - **Authentication:** None required
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// {
///   "status": "running",
///   "version": "0.1.0",
///   "built": "Fri, 15 Aug 2025 18:13:43 +0000",
///   "git_commit": "cd51275141a2e7d49737aa7dd4e8ff7c9a804d67",
///   "maintenance_mode": false
/// }
/// ```
///
/// `status` is `"degraded"` when no database connection could be obtained.
#[rocket::get("/1/status")]
pub async fn health_status(db: Option<DbConn>) -> Json<HealthStatus> {
    let maintenance_mode = match db {
        Some(db) => match db.run(get_maintenance_mode).await {
            Ok(flag) => Some(flag),
            Err(e) => {
                warn!("Status check could not read maintenance mode: {}", e);
                None
            }
        },
        None => None,
    };

    Json(HealthStatus {
        status: if maintenance_mode.is_some() {
            "running"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        built: built_info::BUILT_TIME_UTC,
        git_commit: built_info::GIT_COMMIT_HASH,
        maintenance_mode,
    })
}

/// Returns a vector of all routes defined in this module.
pub fn routes() -> Vec<Route> {
    routes![health_status]
}
