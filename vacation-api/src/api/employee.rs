//! API endpoints for managing employees.
//!
//! Most endpoints require the admin role. Employees may read their own
//! record, edit their own profile, change their own password and read their
//! own archived vacations.

use chrono::{Datelike, Local};
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, State, delete, get, post, put};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ApiError, db_error, error_response};
use crate::config::VacationConfig;
use crate::logged_json::LoggedJson;
use crate::models::{
    Employee, EmployeeInput, EmployeeOverview, LoginHistory, ProfileUpdate,
    SystemSettingsUpdate, Vacation,
};
use crate::orm::DbConn;
use crate::orm::employee::{
    admin_set_password, change_password, check_and_fix_vacation_days, check_if_email_exists,
    check_if_name_exists, check_if_username_exists, delete_employee, get_employee,
    get_hidden_employees, hide_employee, insert_employee, list_employees, load_data_for_user,
    permanently_delete_employee, set_employee_activity, unhide_employee, update_employee,
    update_employee_profile, update_employee_system_settings,
};
use crate::orm::session::get_login_history;
use crate::orm::vacation::load_archived_vacations_for_year;
use crate::session_guards::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct UpdateEmployeeRequest {
    pub name: String,
    pub total_vacation_days: i32,
    pub max_sessions: i32,
}

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct ActivityRequest {
    pub is_active: bool,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct SetPasswordRequest {
    pub new_password: String,
}

/// Confirmation for destructive admin actions.
#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct AdminPasswordRequest {
    pub admin_password: String,
}

#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct ExistsResponse {
    pub name_exists: Option<bool>,
    pub username_exists: Option<bool>,
    pub email_exists: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct UpdatedCount {
    pub updated: usize,
}

async fn require_employee(db: &DbConn, employee_id: i32) -> Result<Employee, ApiError> {
    db.run(move |conn| get_employee(conn, employee_id))
        .await
        .map_err(db_error)?
        .ok_or_else(|| error_response(Status::NotFound, "Employee not found"))
}

fn forbidden() -> ApiError {
    error_response(Status::Forbidden, "Not allowed")
}

/// List Employees endpoint.
///
/// - **URL:** `/api/1/employees`
/// - **Method:** `GET`
/// - **Purpose:** Lists every employee, active or not, ordered by name
/// - **Authentication:** Admin
#[get("/1/employees")]
pub async fn list_employees_endpoint(
    db: DbConn,
    _admin: AdminUser,
) -> Result<Json<Vec<Employee>>, ApiError> {
    db.run(list_employees).await.map(Json).map_err(db_error)
}

/// Employee Overview endpoint.
///
/// - **URL:** `/api/1/employees/overview`
/// - **Method:** `GET`
/// - **Purpose:** Employees with their unarchived vacations, session counts and used/remaining days
/// - **Authentication:** Required
///
/// Admins get every visible employee; everyone else only themself.
#[get("/1/employees/overview")]
pub async fn employee_overview(
    db: DbConn,
    auth_user: AuthenticatedUser,
) -> Result<Json<Vec<EmployeeOverview>>, ApiError> {
    let viewer = auth_user.employee;
    let today = Local::now().date_naive();
    db.run(move |conn| load_data_for_user(conn, &viewer, today))
        .await
        .map(Json)
        .map_err(db_error)
}

/// Create Employee endpoint.
///
/// - **URL:** `/api/1/employees`
/// - **Method:** `POST`
/// - **Purpose:** Creates an employee account
/// - **Authentication:** Admin
///
/// Omitted role, vacation days and session limit fall back to `user` and
/// the configured defaults.
///
/// # Request Format
///
/// ```json
/// {
///   "name": "Jane Roe",
///   "username": "jane",
///   "password": "secret",
///   "role": "user",
///   "total_vacation_days": 28
/// }
/// ```
///
/// # Response
///
/// - **201 Created** with the new employee
/// - **409 Conflict** when the name, username or email is taken
/// - **400 Bad Request** for empty fields or an unknown role
#[post("/1/employees", data = "<new_employee>")]
pub async fn create_employee(
    db: DbConn,
    _admin: AdminUser,
    config: &State<VacationConfig>,
    new_employee: LoggedJson<EmployeeInput>,
) -> Result<status::Created<Json<Employee>>, ApiError> {
    let input = new_employee.into_inner();
    let defaults = config.inner().clone();
    let employee = db
        .run(move |conn| insert_employee(conn, input, &defaults))
        .await?;
    info!("Created employee '{}'", employee.username);
    Ok(status::Created::new(format!("/api/1/employees/{}", employee.id)).body(Json(employee)))
}

/// Name Availability endpoint.
///
/// - **URL:** `/api/1/employees/exists?name=..&username=..&email=..&exclude_id=..`
/// - **Method:** `GET`
/// - **Purpose:** Checks whether a display name, username or email is already used
/// - **Authentication:** Admin
///
/// `exclude_id` skips the employee being edited. Fields that were not asked
/// about come back as `null`.
#[get("/1/employees/exists?<name>&<username>&<email>&<exclude_id>")]
pub async fn check_exists(
    db: DbConn,
    _admin: AdminUser,
    name: Option<String>,
    username: Option<String>,
    email: Option<String>,
    exclude_id: Option<i32>,
) -> Result<Json<ExistsResponse>, ApiError> {
    db.run(move |conn| -> Result<ExistsResponse, diesel::result::Error> {
        Ok(ExistsResponse {
            name_exists: name
                .map(|n| check_if_name_exists(conn, &n, exclude_id))
                .transpose()?,
            username_exists: username
                .map(|u| check_if_username_exists(conn, &u, exclude_id))
                .transpose()?,
            email_exists: email
                .map(|e| check_if_email_exists(conn, &e, exclude_id))
                .transpose()?,
        })
    })
    .await
    .map(Json)
    .map_err(db_error)
}

/// Hidden Employees endpoint.
///
/// - **URL:** `/api/1/employees/hidden`
/// - **Method:** `GET`
/// - **Purpose:** Lists employees hidden from the overview
/// - **Authentication:** Admin
#[get("/1/employees/hidden")]
pub async fn hidden_employees(
    db: DbConn,
    _admin: AdminUser,
) -> Result<Json<Vec<Employee>>, ApiError> {
    db.run(get_hidden_employees).await.map(Json).map_err(db_error)
}

/// Fix Vacation Days endpoint.
///
/// - **URL:** `/api/1/employees/fix-vacation-days`
/// - **Method:** `POST`
/// - **Purpose:** Gives every employee without vacation days the configured default
/// - **Authentication:** Admin
#[post("/1/employees/fix-vacation-days")]
pub async fn fix_vacation_days(
    db: DbConn,
    _admin: AdminUser,
    config: &State<VacationConfig>,
) -> Result<Json<UpdatedCount>, ApiError> {
    let default_days = config.default_vacation_days;
    let updated = db
        .run(move |conn| check_and_fix_vacation_days(conn, default_days))
        .await
        .map_err(db_error)?;
    if updated > 0 {
        info!("Reset vacation days of {} employees to {}", updated, default_days);
    }
    Ok(Json(UpdatedCount { updated }))
}

/// Get Employee endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>`
/// - **Method:** `GET`
/// - **Purpose:** Returns a single employee
/// - **Authentication:** The employee themself or an admin
#[get("/1/employees/<employee_id>")]
pub async fn get_employee_endpoint(
    db: DbConn,
    auth_user: AuthenticatedUser,
    employee_id: i32,
) -> Result<Json<Employee>, ApiError> {
    if !auth_user.can_act_for(employee_id) {
        return Err(forbidden());
    }
    require_employee(&db, employee_id).await.map(Json)
}

/// Update Employee endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>`
/// - **Method:** `PUT`
/// - **Purpose:** Changes name, vacation days and session limit
/// - **Authentication:** Admin
#[put("/1/employees/<employee_id>", data = "<request>")]
pub async fn update_employee_endpoint(
    db: DbConn,
    _admin: AdminUser,
    employee_id: i32,
    request: LoggedJson<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, ApiError> {
    let request = request.into_inner();
    let employee = db
        .run(move |conn| {
            update_employee(
                conn,
                employee_id,
                &request.name,
                request.total_vacation_days,
                request.max_sessions,
            )
        })
        .await?;
    Ok(Json(employee))
}

/// Update System Settings endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>/settings`
/// - **Method:** `PUT`
/// - **Purpose:** Changes role, vacation days, session limit and username
/// - **Authentication:** Admin
///
/// # Response
///
/// - **200 OK** with the updated employee
/// - **400 Bad Request** for an unknown role, negative days or a session limit outside 1..=100
/// - **409 Conflict** when the username is taken
#[put("/1/employees/<employee_id>/settings", data = "<settings>")]
pub async fn update_system_settings(
    db: DbConn,
    _admin: AdminUser,
    employee_id: i32,
    settings: LoggedJson<SystemSettingsUpdate>,
) -> Result<Json<Employee>, ApiError> {
    let settings = settings.into_inner();
    let employee = db
        .run(move |conn| update_employee_system_settings(conn, employee_id, &settings))
        .await?;
    Ok(Json(employee))
}

/// Update Profile endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>/profile`
/// - **Method:** `PUT`
/// - **Purpose:** Updates contact and profile fields; omitted fields are left unchanged
/// - **Authentication:** The employee themself or an admin
#[put("/1/employees/<employee_id>/profile", data = "<profile>")]
pub async fn update_profile(
    db: DbConn,
    auth_user: AuthenticatedUser,
    employee_id: i32,
    profile: LoggedJson<ProfileUpdate>,
) -> Result<Json<Employee>, ApiError> {
    if !auth_user.can_act_for(employee_id) {
        return Err(forbidden());
    }
    let profile = profile.into_inner();
    let employee = db
        .run(move |conn| update_employee_profile(conn, employee_id, &profile))
        .await?;
    Ok(Json(employee))
}

/// Set Activity endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>/activity`
/// - **Method:** `PUT`
/// - **Purpose:** Activates or deactivates an employee account
/// - **Authentication:** Admin
#[put("/1/employees/<employee_id>/activity", data = "<request>")]
pub async fn set_activity(
    db: DbConn,
    _admin: AdminUser,
    employee_id: i32,
    request: LoggedJson<ActivityRequest>,
) -> Result<Status, ApiError> {
    let active = request.is_active;
    let updated = db
        .run(move |conn| set_employee_activity(conn, employee_id, active))
        .await
        .map_err(db_error)?;
    if updated == 0 {
        return Err(error_response(Status::NotFound, "Employee not found"));
    }
    Ok(Status::Ok)
}

/// Delete Employee endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>`
/// - **Method:** `DELETE`
/// - **Purpose:** Soft-deletes an employee by marking the account inactive
/// - **Authentication:** Admin
#[delete("/1/employees/<employee_id>")]
pub async fn delete_employee_endpoint(
    db: DbConn,
    admin: AdminUser,
    employee_id: i32,
) -> Result<Status, ApiError> {
    if admin.employee.id == employee_id {
        return Err(error_response(
            Status::Forbidden,
            "You cannot deactivate your own account",
        ));
    }
    let updated = db
        .run(move |conn| delete_employee(conn, employee_id))
        .await
        .map_err(db_error)?;
    if updated == 0 {
        return Err(error_response(Status::NotFound, "Employee not found"));
    }
    Ok(Status::NoContent)
}

/// Change Own Password endpoint.
///
/// - **URL:** `/api/1/me/password`
/// - **Method:** `POST`
/// - **Purpose:** Changes the caller's password after checking the current one
/// - **Authentication:** Required
///
/// Returns **403 Forbidden** when the current password is wrong.
#[post("/1/me/password", data = "<request>")]
pub async fn change_own_password(
    db: DbConn,
    auth_user: AuthenticatedUser,
    request: LoggedJson<ChangePasswordRequest>,
) -> Result<Status, ApiError> {
    let employee_id = auth_user.employee.id;
    let request = request.into_inner();
    db.run(move |conn| {
        change_password(
            conn,
            employee_id,
            &request.current_password,
            &request.new_password,
        )
    })
    .await?;
    info!("Employee '{}' changed their password", auth_user.employee.username);
    Ok(Status::Ok)
}

/// Set Password endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>/password`
/// - **Method:** `PUT`
/// - **Purpose:** Sets an employee's password without the current one
/// - **Authentication:** Admin
#[put("/1/employees/<employee_id>/password", data = "<request>")]
pub async fn set_password(
    db: DbConn,
    _admin: AdminUser,
    employee_id: i32,
    request: LoggedJson<SetPasswordRequest>,
) -> Result<Status, ApiError> {
    let new_password = request.into_inner().new_password;
    db.run(move |conn| admin_set_password(conn, employee_id, &new_password))
        .await?;
    Ok(Status::Ok)
}

/// Hide Employee endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>/hide`
/// - **Method:** `POST`
/// - **Purpose:** Hides an employee from the overview
/// - **Authentication:** Admin, confirmed with the admin's own password
#[post("/1/employees/<employee_id>/hide", data = "<request>")]
pub async fn hide(
    db: DbConn,
    admin: AdminUser,
    employee_id: i32,
    request: LoggedJson<AdminPasswordRequest>,
) -> Result<Status, ApiError> {
    let admin_id = admin.employee.id;
    let password = request.into_inner().admin_password;
    db.run(move |conn| hide_employee(conn, employee_id, &password, admin_id))
        .await?;
    Ok(Status::Ok)
}

/// Unhide Employee endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>/unhide`
/// - **Method:** `POST`
/// - **Purpose:** Shows a hidden employee in the overview again
/// - **Authentication:** Admin
#[post("/1/employees/<employee_id>/unhide")]
pub async fn unhide(db: DbConn, _admin: AdminUser, employee_id: i32) -> Result<Status, ApiError> {
    db.run(move |conn| unhide_employee(conn, employee_id))
        .await?;
    Ok(Status::Ok)
}

/// Permanent Delete endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>/permanent`
/// - **Method:** `DELETE`
/// - **Purpose:** Removes an employee and everything that belongs to them
/// - **Authentication:** Admin, confirmed with the admin's own password
///
/// An admin cannot delete their own account (403).
#[delete("/1/employees/<employee_id>/permanent", data = "<request>")]
pub async fn permanent_delete(
    db: DbConn,
    admin: AdminUser,
    employee_id: i32,
    request: LoggedJson<AdminPasswordRequest>,
) -> Result<Status, ApiError> {
    let admin_id = admin.employee.id;
    let password = request.into_inner().admin_password;
    db.run(move |conn| permanently_delete_employee(conn, employee_id, &password, admin_id))
        .await?;
    info!(
        "Admin '{}' permanently deleted employee {}",
        admin.employee.username, employee_id
    );
    Ok(Status::NoContent)
}

/// Login History endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>/login-history`
/// - **Method:** `GET`
/// - **Purpose:** Lists an employee's logins, newest first
/// - **Authentication:** Admin
#[get("/1/employees/<employee_id>/login-history")]
pub async fn login_history(
    db: DbConn,
    _admin: AdminUser,
    employee_id: i32,
) -> Result<Json<Vec<LoginHistory>>, ApiError> {
    db.run(move |conn| get_login_history(conn, employee_id))
        .await
        .map(Json)
        .map_err(db_error)
}

/// Archived Vacations endpoint.
///
/// - **URL:** `/api/1/employees/<employee_id>/vacations/archived?year=2024`
/// - **Method:** `GET`
/// - **Purpose:** Lists an employee's archived vacations starting in `year`
/// - **Authentication:** The employee themself or an admin
///
/// `year` defaults to the previous calendar year.
#[get("/1/employees/<employee_id>/vacations/archived?<year>")]
pub async fn archived_vacations(
    db: DbConn,
    auth_user: AuthenticatedUser,
    employee_id: i32,
    year: Option<i32>,
) -> Result<Json<Vec<Vacation>>, ApiError> {
    if !auth_user.can_act_for(employee_id) {
        return Err(forbidden());
    }
    let year = year.unwrap_or_else(|| Local::now().year() - 1);
    db.run(move |conn| load_archived_vacations_for_year(conn, employee_id, year))
        .await
        .map(Json)
        .map_err(db_error)
}

pub fn routes() -> Vec<Route> {
    routes![
        list_employees_endpoint,
        employee_overview,
        create_employee,
        check_exists,
        hidden_employees,
        fix_vacation_days,
        get_employee_endpoint,
        update_employee_endpoint,
        update_system_settings,
        update_profile,
        set_activity,
        delete_employee_endpoint,
        change_own_password,
        set_password,
        hide,
        unhide,
        permanent_delete,
        login_history,
        archived_vacations,
    ]
}
