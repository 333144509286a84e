//! API endpoints for employee login and authentication.
//!
//! Login is checked against the main database first. When that database
//! cannot be reached the offline mirror answers instead, and the response
//! says so with `offline: true`.

use std::net::IpAddr;

use rocket::http::{CookieJar, Status};
use rocket::serde::json::Json;
use rocket::{Route, State, get, post};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ApiError, error_response};
use crate::config::VacationConfig;
use crate::logged_json::LoggedJson;
use crate::models::Employee;
use crate::orm::login::{LoginOutcome, process_login};
use crate::orm::{DbConn, OfflineDbConn};
use crate::session_guards::AuthenticatedUser;

/// Login request structure containing employee credentials.
#[derive(Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Identity returned by login and hello.
#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct LoginSuccessResponse {
    pub employee_id: i32,
    pub username: String,
    pub name: String,
    pub role: String,
    pub total_vacation_days: Option<i32>,
    /// True when the main database was unreachable and the offline mirror
    /// accepted the credentials. No session exists in that case.
    pub offline: bool,
}

impl From<&Employee> for LoginSuccessResponse {
    fn from(employee: &Employee) -> Self {
        LoginSuccessResponse {
            employee_id: employee.id,
            username: employee.username.clone(),
            name: employee.name.clone(),
            role: employee.role.clone(),
            total_vacation_days: Some(employee.total_vacation_days),
            offline: false,
        }
    }
}

fn login_error(status: Status) -> ApiError {
    let message = match status.code {
        400 => "Username and password are required",
        401 => "Invalid credentials",
        403 => "Maximum number of active sessions reached",
        503 => "The system is in maintenance mode",
        _ => "Login failed",
    };
    error_response(status, message)
}

/// Login endpoint that authenticates employees and creates sessions.
///
/// - **URL:** `/api/1/login`
/// - **Method:** `POST`
/// - **Purpose:** Authenticates an employee by username and password, and sets a secure session cookie
/// - **Authentication:** None required
///
/// # Request Format
///
/// ```json
/// {
///   "username": "alice",
///   "password": "secret"
/// }
/// ```
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// {
///   "employee_id": 2,
///   "username": "alice",
///   "name": "Alice Smith",
///   "role": "user",
///   "total_vacation_days": 30,
///   "offline": false
/// }
/// ```
///
/// **Failure:**
/// - 400 when a field is empty
/// - 401 for unknown users or a wrong password
/// - 403 when the employee already holds `max_sessions` sessions
/// - 503 when maintenance mode is on and the employee is not an admin
#[post("/1/login", data = "<login>")]
pub async fn login(
    db: Option<DbConn>,
    offline: OfflineDbConn,
    cookies: &CookieJar<'_>,
    config: &State<VacationConfig>,
    remote: Option<IpAddr>,
    login: LoggedJson<LoginRequest>,
) -> Result<Json<LoginSuccessResponse>, ApiError> {
    let ip_address = remote.map(|ip| ip.to_string());
    match process_login(db.as_ref(), &offline, cookies, &login, config, ip_address).await {
        Ok(LoginOutcome::Online(employee)) => Ok(Json(LoginSuccessResponse::from(&employee))),
        Ok(LoginOutcome::Offline(user)) => Ok(Json(LoginSuccessResponse {
            employee_id: user.employee_id,
            username: user.username,
            name: user.name,
            role: user.role,
            total_vacation_days: None,
            offline: true,
        })),
        Err(status) => Err(login_error(status)),
    }
}

/// Hello (Authentication Check) endpoint.
///
/// - **URL:** `/api/1/hello`
/// - **Method:** `GET`
/// - **Purpose:** Returns the logged-in employee; useful for checking authentication status
/// - **Authentication:** Required
///
/// Returns the same structure as login.
#[get("/1/hello")]
pub async fn secure_hello(auth_user: AuthenticatedUser) -> Json<LoginSuccessResponse> {
    Json(LoginSuccessResponse::from(&auth_user.employee))
}

/// Returns all login-related API routes.
pub fn routes() -> Vec<Route> {
    routes![login, secure_hello]
}
