//! API endpoints for departments and positions.
//!
//! Reading is open to every logged-in employee so profile forms can offer
//! the choices; changes are admin-only.

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, delete, get, post, put};

use crate::api::{ApiError, db_error, error_response};
use crate::logged_json::LoggedJson;
use crate::models::{Department, DepartmentInput, Position, PositionInput, PositionView};
use crate::orm::DbConn;
use crate::orm::organisation::{
    add_department, add_position, delete_department, delete_position, get_all_departments,
    get_all_positions, get_department, get_position, update_department, update_position,
};
use crate::session_guards::{AdminUser, AuthenticatedUser};

/// List Departments endpoint.
///
/// - **URL:** `/api/1/departments`
/// - **Method:** `GET`
/// - **Purpose:** All departments by name
/// - **Authentication:** Required
#[get("/1/departments")]
pub async fn list_departments(
    db: DbConn,
    _auth_user: AuthenticatedUser,
) -> Result<Json<Vec<Department>>, ApiError> {
    db.run(get_all_departments).await.map(Json).map_err(db_error)
}

/// Get Department endpoint.
///
/// - **URL:** `/api/1/departments/<department_id>`
/// - **Method:** `GET`
/// - **Authentication:** Required
#[get("/1/departments/<department_id>")]
pub async fn get_department_endpoint(
    db: DbConn,
    _auth_user: AuthenticatedUser,
    department_id: i32,
) -> Result<Json<Department>, ApiError> {
    db.run(move |conn| get_department(conn, department_id))
        .await
        .map_err(db_error)?
        .map(Json)
        .ok_or_else(|| error_response(Status::NotFound, "Department not found"))
}

/// Create Department endpoint.
///
/// - **URL:** `/api/1/departments`
/// - **Method:** `POST`
/// - **Purpose:** Creates a department; names are unique (409)
/// - **Authentication:** Admin
#[post("/1/departments", data = "<input>")]
pub async fn create_department(
    db: DbConn,
    _admin: AdminUser,
    input: LoggedJson<DepartmentInput>,
) -> Result<status::Created<Json<Department>>, ApiError> {
    let input = input.into_inner();
    let department = db.run(move |conn| add_department(conn, input)).await?;
    Ok(status::Created::new(format!("/api/1/departments/{}", department.id))
        .body(Json(department)))
}

/// Update Department endpoint.
///
/// - **URL:** `/api/1/departments/<department_id>`
/// - **Method:** `PUT`
/// - **Authentication:** Admin
#[put("/1/departments/<department_id>", data = "<input>")]
pub async fn update_department_endpoint(
    db: DbConn,
    _admin: AdminUser,
    department_id: i32,
    input: LoggedJson<DepartmentInput>,
) -> Result<Json<Department>, ApiError> {
    let input = input.into_inner();
    let department = db
        .run(move |conn| update_department(conn, department_id, input))
        .await?;
    Ok(Json(department))
}

/// Delete Department endpoint.
///
/// - **URL:** `/api/1/departments/<department_id>`
/// - **Method:** `DELETE`
/// - **Purpose:** Deletes a department without positions
/// - **Authentication:** Admin
///
/// Answers **409 Conflict** while positions still belong to it.
#[delete("/1/departments/<department_id>")]
pub async fn delete_department_endpoint(
    db: DbConn,
    _admin: AdminUser,
    department_id: i32,
) -> Result<Status, ApiError> {
    db.run(move |conn| delete_department(conn, department_id))
        .await?;
    Ok(Status::NoContent)
}

/// List Positions endpoint.
///
/// - **URL:** `/api/1/positions`
/// - **Method:** `GET`
/// - **Purpose:** All positions with their department's name
/// - **Authentication:** Required
#[get("/1/positions")]
pub async fn list_positions(
    db: DbConn,
    _auth_user: AuthenticatedUser,
) -> Result<Json<Vec<PositionView>>, ApiError> {
    db.run(get_all_positions).await.map(Json).map_err(db_error)
}

/// Get Position endpoint.
///
/// - **URL:** `/api/1/positions/<position_id>`
/// - **Method:** `GET`
/// - **Authentication:** Required
#[get("/1/positions/<position_id>")]
pub async fn get_position_endpoint(
    db: DbConn,
    _auth_user: AuthenticatedUser,
    position_id: i32,
) -> Result<Json<Position>, ApiError> {
    db.run(move |conn| get_position(conn, position_id))
        .await
        .map_err(db_error)?
        .map(Json)
        .ok_or_else(|| error_response(Status::NotFound, "Position not found"))
}

/// Create Position endpoint.
///
/// - **URL:** `/api/1/positions`
/// - **Method:** `POST`
/// - **Purpose:** Creates a position, optionally inside a department
/// - **Authentication:** Admin
#[post("/1/positions", data = "<input>")]
pub async fn create_position(
    db: DbConn,
    _admin: AdminUser,
    input: LoggedJson<PositionInput>,
) -> Result<status::Created<Json<Position>>, ApiError> {
    let input = input.into_inner();
    let position = db.run(move |conn| add_position(conn, input)).await?;
    Ok(status::Created::new(format!("/api/1/positions/{}", position.id)).body(Json(position)))
}

/// Update Position endpoint.
///
/// - **URL:** `/api/1/positions/<position_id>`
/// - **Method:** `PUT`
/// - **Authentication:** Admin
#[put("/1/positions/<position_id>", data = "<input>")]
pub async fn update_position_endpoint(
    db: DbConn,
    _admin: AdminUser,
    position_id: i32,
    input: LoggedJson<PositionInput>,
) -> Result<Json<Position>, ApiError> {
    let input = input.into_inner();
    let position = db
        .run(move |conn| update_position(conn, position_id, input))
        .await?;
    Ok(Json(position))
}

/// Delete Position endpoint.
///
/// - **URL:** `/api/1/positions/<position_id>`
/// - **Method:** `DELETE`
/// - **Purpose:** Deletes a position and clears it from every employee holding it
/// - **Authentication:** Admin
#[delete("/1/positions/<position_id>")]
pub async fn delete_position_endpoint(
    db: DbConn,
    _admin: AdminUser,
    position_id: i32,
) -> Result<Status, ApiError> {
    db.run(move |conn| delete_position(conn, position_id))
        .await?;
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![
        list_departments,
        get_department_endpoint,
        create_department,
        update_department_endpoint,
        delete_department_endpoint,
        list_positions,
        get_position_endpoint,
        create_position,
        update_position_endpoint,
        delete_position_endpoint,
    ]
}
