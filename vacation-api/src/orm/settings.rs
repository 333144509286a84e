//! Application-wide settings stored as key/value strings.
//!
//! Maintenance mode is stored under `maintenance_mode` as `'true'` or
//! `'false'`. A missing row reads as disabled.

use diesel::prelude::*;

use crate::models::{AppSetting, IMMEDIATE_LOGOUT, MAINTENANCE_MODE_KEY};
use crate::orm::session::{force_remove_sessions_by_user_id, get_all_active_non_admin_user_ids};
use crate::orm::system_command::issue_command;
use crate::schema::app_settings;

pub fn get_setting(
    conn: &mut SqliteConnection,
    key: &str,
) -> Result<Option<String>, diesel::result::Error> {
    app_settings::table
        .filter(app_settings::setting_key.eq(key))
        .select(app_settings::setting_value)
        .first::<String>(conn)
        .optional()
}

/// Inserts or replaces a setting.
pub fn set_setting(
    conn: &mut SqliteConnection,
    key: &str,
    value: &str,
) -> Result<(), diesel::result::Error> {
    let row = AppSetting {
        setting_key: key.to_string(),
        setting_value: value.to_string(),
    };
    diesel::insert_into(app_settings::table)
        .values(&row)
        .on_conflict(app_settings::setting_key)
        .do_update()
        .set(app_settings::setting_value.eq(value))
        .execute(conn)?;
    Ok(())
}

pub fn get_maintenance_mode(conn: &mut SqliteConnection) -> Result<bool, diesel::result::Error> {
    Ok(get_setting(conn, MAINTENANCE_MODE_KEY)?
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false))
}

/// Writes the maintenance flag without touching sessions.
pub fn set_maintenance_flag(
    conn: &mut SqliteConnection,
    enabled: bool,
) -> Result<(), diesel::result::Error> {
    set_setting(
        conn,
        MAINTENANCE_MODE_KEY,
        if enabled { "true" } else { "false" },
    )
}

/// Switches maintenance mode.
///
/// Enabling it also issues `IMMEDIATE_LOGOUT` to every non-admin holding a
/// live session and removes those sessions, all in one transaction.
///
/// # Returns
/// IDs of the employees that were logged out
pub fn set_maintenance_mode(
    conn: &mut SqliteConnection,
    enabled: bool,
) -> Result<Vec<i32>, diesel::result::Error> {
    conn.transaction(|conn| {
        set_maintenance_flag(conn, enabled)?;
        if !enabled {
            return Ok(Vec::new());
        }
        let user_ids = get_all_active_non_admin_user_ids(conn)?;
        for user_id in &user_ids {
            issue_command(conn, *user_id, IMMEDIATE_LOGOUT, None)?;
        }
        force_remove_sessions_by_user_id(conn, &user_ids)?;
        Ok(user_ids)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::session::{count_active_sessions, create_session};
    use crate::orm::system_command::get_pending_command;
    use crate::orm::testing::{insert_test_employee, setup_test_db};

    #[test]
    fn test_maintenance_defaults_to_false() {
        let mut conn = setup_test_db();
        assert!(!get_maintenance_mode(&mut conn).unwrap());

        diesel::delete(app_settings::table).execute(&mut conn).unwrap();
        assert!(!get_maintenance_mode(&mut conn).unwrap());
    }

    #[test]
    fn test_enabling_maintenance_logs_out_non_admins() {
        let mut conn = setup_test_db();
        let admin = insert_test_employee(&mut conn, "Boss", "boss", "admin");
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        create_session(&mut conn, admin.id, None).unwrap();
        create_session(&mut conn, jane.id, None).unwrap();

        let kicked = set_maintenance_mode(&mut conn, true).unwrap();
        assert_eq!(kicked, vec![jane.id]);
        assert!(get_maintenance_mode(&mut conn).unwrap());
        assert_eq!(count_active_sessions(&mut conn, jane.id).unwrap(), 0);
        assert_eq!(count_active_sessions(&mut conn, admin.id).unwrap(), 1);

        let command = get_pending_command(&mut conn, jane.id).unwrap().expect("command");
        assert_eq!(command.command_type, IMMEDIATE_LOGOUT);
        assert!(get_pending_command(&mut conn, admin.id).unwrap().is_none());

        assert!(set_maintenance_mode(&mut conn, false).unwrap().is_empty());
        assert!(!get_maintenance_mode(&mut conn).unwrap());
    }
}
