/*
API version 1
*/

use rocket::Route;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::Serialize;
use ts_rs::TS;

use crate::orm::error::DataError;

pub mod archive;
pub mod bulk;
pub mod calendar;
pub mod command;
pub mod employee;
pub mod error_log;
pub mod login;
pub mod logout;
pub mod notification;
pub mod organisation;
pub mod session;
pub mod settings;
pub mod status;
pub mod vacation;

/// Error body returned by every endpoint.
#[derive(Serialize, TS, Debug)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = Custom<Json<ErrorResponse>>;

pub fn error_response(status: Status, message: impl Into<String>) -> ApiError {
    Custom(
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Maps a database failure to a 500 and logs it.
pub fn db_error(e: diesel::result::Error) -> ApiError {
    error!("Database error: {}", e);
    error_response(Status::InternalServerError, "Database error")
}

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        let status = match &e {
            DataError::NotFound(_) => Status::NotFound,
            DataError::Conflict(_) => Status::Conflict,
            DataError::Invalid(_) => Status::BadRequest,
            DataError::Forbidden(_) => Status::Forbidden,
            DataError::WrongPassword => Status::Forbidden,
            DataError::Hash(_) | DataError::Database(_) => {
                error!("{}", e);
                return error_response(Status::InternalServerError, "Internal error");
            }
        };
        error_response(status, e.to_string())
    }
}

/// Returns every API route, to be mounted under `/api`.
pub fn routes() -> Vec<Route> {
    let mut all = Vec::new();
    all.extend(login::routes());
    all.extend(logout::routes());
    all.extend(status::routes());
    all.extend(employee::routes());
    all.extend(vacation::routes());
    all.extend(bulk::routes());
    all.extend(calendar::routes());
    all.extend(notification::routes());
    all.extend(session::routes());
    all.extend(command::routes());
    all.extend(settings::routes());
    all.extend(archive::routes());
    all.extend(organisation::routes());
    all.extend(error_log::routes());
    all
}
