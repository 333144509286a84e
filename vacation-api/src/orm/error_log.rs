//! Client-reported errors kept for admins to review.

use diesel::prelude::*;

use crate::models::{ERROR_STATUS_RESOLVED, ErrorLog, ErrorLogView, NewErrorLog};
use crate::schema::{employees, error_logs};

pub fn log_error(
    conn: &mut SqliteConnection,
    user_id: Option<i32>,
    traceback: &str,
) -> Result<usize, diesel::result::Error> {
    diesel::insert_into(error_logs::table)
        .values(&NewErrorLog {
            user_id,
            traceback_text: traceback.to_string(),
        })
        .execute(conn)
}

/// All entries, newest first, with the reporting employee's username.
pub fn get_all_errors(
    conn: &mut SqliteConnection,
) -> Result<Vec<ErrorLogView>, diesel::result::Error> {
    let rows: Vec<(ErrorLog, Option<String>)> = error_logs::table
        .left_join(employees::table)
        .select((ErrorLog::as_select(), employees::username.nullable()))
        .order((error_logs::error_timestamp.desc(), error_logs::id.desc()))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(entry, username)| ErrorLogView { entry, username })
        .collect())
}

pub fn mark_error_as_resolved(
    conn: &mut SqliteConnection,
    error_id: i32,
) -> Result<usize, diesel::result::Error> {
    diesel::update(error_logs::table.filter(error_logs::id.eq(error_id)))
        .set(error_logs::status.eq(ERROR_STATUS_RESOLVED))
        .execute(conn)
}

pub fn delete_error_log(
    conn: &mut SqliteConnection,
    error_id: i32,
) -> Result<usize, diesel::result::Error> {
    diesel::delete(error_logs::table.filter(error_logs::id.eq(error_id))).execute(conn)
}
