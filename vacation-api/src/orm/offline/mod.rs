//! Offline mirror of the credentials needed to log in.
//!
//! The mirror keeps username, password hash, display name and role of every
//! employee that logged in online, plus the tenant identity the server last
//! served. The connection string itself is never stored.

mod db;

use chrono::Utc;
use diesel::prelude::*;
use thiserror::Error;

use crate::models::{ConnectionInfo, Employee, OfflineUser};
use crate::offline_schema::{connection_info, offline_users};
use crate::orm::login::verify_password;

pub use db::*;

#[derive(Debug, Error)]
pub enum OfflineError {
    #[error("Offline store error: {0}")]
    Database(#[from] diesel::result::Error),
}

/// Inserts or refreshes the mirror entry for `employee`.
pub fn save_employee_for_offline(
    conn: &mut SqliteConnection,
    employee: &Employee,
) -> Result<(), OfflineError> {
    let row = OfflineUser {
        username: employee.username.clone(),
        employee_id: employee.id,
        password_hash: employee.password_hash.clone(),
        name: employee.name.clone(),
        role: employee.role.clone(),
        last_sync: Utc::now().naive_utc(),
    };
    diesel::replace_into(offline_users::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

/// Checks credentials against the mirror.
///
/// # Returns
/// * `Ok(Some(OfflineUser))` - Known username and matching password
/// * `Ok(None)` - Unknown username or wrong password
pub fn authenticate_offline(
    conn: &mut SqliteConnection,
    username: &str,
    password: &str,
) -> Result<Option<OfflineUser>, OfflineError> {
    let user = offline_users::table
        .filter(offline_users::username.eq(username))
        .first::<OfflineUser>(conn)
        .optional()?;
    Ok(user.filter(|u| verify_password(password, &u.password_hash)))
}

pub fn list_offline_users(conn: &mut SqliteConnection) -> Result<Vec<OfflineUser>, OfflineError> {
    Ok(offline_users::table
        .order(offline_users::username.asc())
        .load::<OfflineUser>(conn)?)
}

/// Records the tenant identity and the time it was last reachable.
pub fn save_connection_info(
    conn: &mut SqliteConnection,
    tenant_id: Option<&str>,
    company_name: Option<&str>,
) -> Result<(), OfflineError> {
    let row = ConnectionInfo {
        id: 1,
        tenant_id: tenant_id.map(str::to_string),
        company_name: company_name.map(str::to_string),
        last_online: Utc::now().naive_utc(),
    };
    diesel::replace_into(connection_info::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

pub fn get_connection_info(
    conn: &mut SqliteConnection,
) -> Result<Option<ConnectionInfo>, OfflineError> {
    Ok(connection_info::table
        .filter(connection_info::id.eq(1))
        .first::<ConnectionInfo>(conn)
        .optional()?)
}

pub fn clear_connection_info(conn: &mut SqliteConnection) -> Result<(), OfflineError> {
    diesel::delete(connection_info::table).execute(conn)?;
    Ok(())
}

/// Removes every mirrored credential and the connection info.
pub fn clear_offline_data(conn: &mut SqliteConnection) -> Result<usize, OfflineError> {
    let removed = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let users = diesel::delete(offline_users::table).execute(conn)?;
        diesel::delete(connection_info::table).execute(conn)?;
        Ok(users)
    })?;
    info!("[offline] Cleared {} mirrored credential(s)", removed);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::{insert_test_employee, setup_offline_test_db, setup_test_db};

    #[test]
    fn test_save_and_authenticate() {
        let mut main = setup_test_db();
        let mut offline = setup_offline_test_db();
        let jane = insert_test_employee(&mut main, "Jane Roe", "jane", "user");

        save_employee_for_offline(&mut offline, &jane).unwrap();
        save_employee_for_offline(&mut offline, &jane).unwrap();
        assert_eq!(list_offline_users(&mut offline).unwrap().len(), 1);

        let user = authenticate_offline(&mut offline, "jane", "admin")
            .unwrap()
            .expect("credentials match");
        assert_eq!(user.employee_id, jane.id);
        assert_eq!(user.role, "user");

        assert!(authenticate_offline(&mut offline, "jane", "wrong").unwrap().is_none());
        assert!(authenticate_offline(&mut offline, "nobody", "admin").unwrap().is_none());
    }

    #[test]
    fn test_connection_info_is_single_row() {
        let mut offline = setup_offline_test_db();
        assert!(get_connection_info(&mut offline).unwrap().is_none());

        save_connection_info(&mut offline, Some("t1"), Some("First")).unwrap();
        save_connection_info(&mut offline, Some("t2"), None).unwrap();
        let info = get_connection_info(&mut offline).unwrap().unwrap();
        assert_eq!(info.id, 1);
        assert_eq!(info.tenant_id.as_deref(), Some("t2"));
        assert!(info.company_name.is_none());

        clear_connection_info(&mut offline).unwrap();
        assert!(get_connection_info(&mut offline).unwrap().is_none());
    }

    #[test]
    fn test_clear_offline_data() {
        let mut main = setup_test_db();
        let mut offline = setup_offline_test_db();
        let jane = insert_test_employee(&mut main, "Jane Roe", "jane", "user");
        save_employee_for_offline(&mut offline, &jane).unwrap();
        save_connection_info(&mut offline, None, None).unwrap();

        assert_eq!(clear_offline_data(&mut offline).unwrap(), 1);
        assert!(list_offline_users(&mut offline).unwrap().is_empty());
        assert!(get_connection_info(&mut offline).unwrap().is_none());
    }
}
