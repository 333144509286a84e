//! Logout commands queued for clients to pick up.

use chrono::{Duration, Utc};
use diesel::prelude::*;

use crate::models::{IMMEDIATE_LOGOUT, NewSystemCommand, SystemCommand, TIMED_LOGOUT};
use crate::orm::error::DataError;
use crate::schema::system_commands;

pub fn issue_command(
    conn: &mut SqliteConnection,
    target_user_id: i32,
    command_type: &str,
    command_value: Option<String>,
) -> Result<usize, diesel::result::Error> {
    diesel::insert_into(system_commands::table)
        .values(&NewSystemCommand {
            target_user_id,
            command_type: command_type.to_string(),
            command_value,
        })
        .execute(conn)
}

/// Queues `TIMED_LOGOUT` for every employee in `user_ids`. The command value
/// is the RFC 3339 instant `minutes` from now.
///
/// # Returns
/// Number of commands written
pub fn issue_timed_logout_command(
    conn: &mut SqliteConnection,
    user_ids: &[i32],
    minutes: i64,
) -> Result<usize, DataError> {
    if user_ids.is_empty() {
        return Err(DataError::invalid("No employees selected"));
    }
    if minutes <= 0 {
        return Err(DataError::invalid("Minutes must be positive"));
    }
    let logout_at = Duration::try_minutes(minutes)
        .and_then(|delay| Utc::now().checked_add_signed(delay))
        .ok_or_else(|| DataError::invalid("Minutes out of range"))?
        .to_rfc3339();
    let written = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let mut written = 0;
        for user_id in user_ids {
            written += issue_command(conn, *user_id, TIMED_LOGOUT, Some(logout_at.clone()))?;
        }
        Ok(written)
    })?;
    Ok(written)
}

/// Queues `IMMEDIATE_LOGOUT` for every employee in `user_ids`.
pub fn issue_immediate_logout_command(
    conn: &mut SqliteConnection,
    user_ids: &[i32],
) -> Result<usize, DataError> {
    if user_ids.is_empty() {
        return Err(DataError::invalid("No employees selected"));
    }
    let written = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let mut written = 0;
        for user_id in user_ids {
            written += issue_command(conn, *user_id, IMMEDIATE_LOGOUT, None)?;
        }
        Ok(written)
    })?;
    Ok(written)
}

/// Latest unexecuted command for an employee.
pub fn get_pending_command(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Option<SystemCommand>, diesel::result::Error> {
    system_commands::table
        .filter(system_commands::target_user_id.eq(user_id))
        .filter(system_commands::is_executed.eq(false))
        .order((system_commands::created_at.desc(), system_commands::id.desc()))
        .first::<SystemCommand>(conn)
        .optional()
}

/// Marks a command executed. Only the target employee may do this.
pub fn mark_command_as_executed(
    conn: &mut SqliteConnection,
    command_id: i32,
    user_id: i32,
) -> Result<(), DataError> {
    let rows = diesel::update(
        system_commands::table
            .filter(system_commands::id.eq(command_id))
            .filter(system_commands::target_user_id.eq(user_id)),
    )
    .set(system_commands::is_executed.eq(true))
    .execute(conn)?;
    if rows == 0 {
        return Err(DataError::NotFound("Command"));
    }
    Ok(())
}
