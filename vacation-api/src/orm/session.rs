//! Database operations for live sessions and the login history.
//!
//! Every login writes one `login_history` row and one `active_sessions`
//! row pointing at it. Ending a session deletes the live row and stamps
//! `logout_time` on the history row.

use chrono::Utc;
use diesel::QueryableByName;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use uuid::Uuid;

use crate::models::{
    ActiveSession, ActiveUserDetail, LoginHistory, NewActiveSession, NewLoginHistory, ROLE_ADMIN,
    SessionCount,
};
use crate::schema::{active_sessions, employees, login_history};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Generates a new UUID-based session token.
fn generate_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Creates a session for `user_id` together with its login history entry.
///
/// # Returns
/// * `Ok(String)` - The new session id
/// * `Err(diesel::result::Error)` - Database insertion failed
pub fn create_session(
    conn: &mut SqliteConnection,
    user_id: i32,
    ip_address: Option<String>,
) -> Result<String, diesel::result::Error> {
    let now = Utc::now().naive_utc();
    let session_id = generate_session_token();

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::insert_into(login_history::table)
            .values(&NewLoginHistory {
                user_id,
                ip_address: ip_address.clone(),
                login_time: now,
            })
            .execute(conn)?;

        let history_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
            .get_result::<LastInsertRowId>(conn)?
            .last_insert_rowid;

        diesel::insert_into(active_sessions::table)
            .values(&NewActiveSession {
                session_id: session_id.clone(),
                user_id,
                history_id: Some(history_id as i32),
                ip_address,
                login_time: now,
            })
            .execute(conn)?;
        Ok(())
    })?;

    Ok(session_id)
}

pub fn get_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<Option<ActiveSession>, diesel::result::Error> {
    active_sessions::table
        .filter(active_sessions::session_id.eq(session_id))
        .first::<ActiveSession>(conn)
        .optional()
}

pub fn count_active_sessions(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<i64, diesel::result::Error> {
    active_sessions::table
        .filter(active_sessions::user_id.eq(user_id))
        .count()
        .get_result(conn)
}

/// Ends one session: deletes it and stamps the paired history row.
///
/// # Returns
/// Number of sessions removed (0 when the id was unknown)
pub fn remove_user_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<usize, diesel::result::Error> {
    let now = Utc::now().naive_utc();
    conn.transaction(|conn| {
        let Some(session) = get_session(conn, session_id)? else {
            return Ok(0);
        };
        if let Some(history_id) = session.history_id {
            diesel::update(login_history::table.filter(login_history::id.eq(history_id)))
                .set(login_history::logout_time.eq(Some(now)))
                .execute(conn)?;
        }
        diesel::delete(active_sessions::table.filter(active_sessions::session_id.eq(session_id)))
            .execute(conn)
    })
}

/// Number of live sessions per employee, for employees that have any.
pub fn get_active_session_counts(
    conn: &mut SqliteConnection,
) -> Result<Vec<SessionCount>, diesel::result::Error> {
    let rows: Vec<(i32, i64)> = active_sessions::table
        .group_by(active_sessions::user_id)
        .select((active_sessions::user_id, count_star()))
        .order(active_sessions::user_id.asc())
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(user_id, count)| SessionCount { user_id, count })
        .collect())
}

/// Every live session joined with its employee, newest login first.
pub fn get_active_user_details(
    conn: &mut SqliteConnection,
) -> Result<Vec<ActiveUserDetail>, diesel::result::Error> {
    let rows: Vec<(ActiveSession, (String, String, String))> = active_sessions::table
        .inner_join(employees::table)
        .select((
            ActiveSession::as_select(),
            (employees::name, employees::username, employees::role),
        ))
        .order(active_sessions::login_time.desc())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(session, (name, username, role))| ActiveUserDetail {
            session_id: session.session_id,
            user_id: session.user_id,
            name,
            username,
            role,
            ip_address: session.ip_address,
            login_time: session.login_time,
        })
        .collect())
}

/// Ends every session of the given employees.
///
/// Open history rows of those employees get their `logout_time` stamped.
///
/// # Returns
/// Number of sessions removed
pub fn force_remove_sessions_by_user_id(
    conn: &mut SqliteConnection,
    user_ids: &[i32],
) -> Result<usize, diesel::result::Error> {
    if user_ids.is_empty() {
        return Ok(0);
    }
    let now = Utc::now().naive_utc();
    conn.transaction(|conn| {
        diesel::update(
            login_history::table
                .filter(login_history::user_id.eq_any(user_ids))
                .filter(login_history::logout_time.is_null()),
        )
        .set(login_history::logout_time.eq(Some(now)))
        .execute(conn)?;
        diesel::delete(active_sessions::table.filter(active_sessions::user_id.eq_any(user_ids)))
            .execute(conn)
    })
}

/// Login history of one employee, newest first.
pub fn get_login_history(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Vec<LoginHistory>, diesel::result::Error> {
    login_history::table
        .filter(login_history::user_id.eq(user_id))
        .order((login_history::login_time.desc(), login_history::id.desc()))
        .load::<LoginHistory>(conn)
}

/// IDs of non-admin employees holding at least one live session.
pub fn get_all_active_non_admin_user_ids(
    conn: &mut SqliteConnection,
) -> Result<Vec<i32>, diesel::result::Error> {
    active_sessions::table
        .inner_join(employees::table)
        .filter(employees::role.ne(ROLE_ADMIN))
        .select(active_sessions::user_id)
        .distinct()
        .order(active_sessions::user_id.asc())
        .load::<i32>(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::{insert_test_employee, setup_test_db};

    #[test]
    fn test_create_and_remove_session() {
        let mut conn = setup_test_db();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");

        let token = create_session(&mut conn, jane.id, Some("10.0.0.7".to_string())).unwrap();
        let session = get_session(&mut conn, &token).unwrap().expect("session stored");
        assert_eq!(session.user_id, jane.id);
        assert_eq!(session.ip_address.as_deref(), Some("10.0.0.7"));
        assert!(session.history_id.is_some());
        assert_eq!(count_active_sessions(&mut conn, jane.id).unwrap(), 1);

        assert_eq!(remove_user_session(&mut conn, &token).unwrap(), 1);
        assert!(get_session(&mut conn, &token).unwrap().is_none());

        let history = get_login_history(&mut conn, jane.id).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].logout_time.is_some());

        assert_eq!(remove_user_session(&mut conn, &token).unwrap(), 0);
    }

    #[test]
    fn test_counts_details_and_force_removal() {
        let mut conn = setup_test_db();
        let admin = insert_test_employee(&mut conn, "Boss", "boss", "admin");
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        let john = insert_test_employee(&mut conn, "John Doe", "john", "user");

        create_session(&mut conn, admin.id, None).unwrap();
        create_session(&mut conn, jane.id, None).unwrap();
        create_session(&mut conn, jane.id, None).unwrap();
        create_session(&mut conn, john.id, None).unwrap();

        let counts = get_active_session_counts(&mut conn).unwrap();
        assert_eq!(
            counts,
            vec![
                SessionCount { user_id: admin.id, count: 1 },
                SessionCount { user_id: jane.id, count: 2 },
                SessionCount { user_id: john.id, count: 1 },
            ]
        );

        let details = get_active_user_details(&mut conn).unwrap();
        assert_eq!(details.len(), 4);
        assert!(details.iter().any(|d| d.username == "boss" && d.role == "admin"));

        assert_eq!(
            get_all_active_non_admin_user_ids(&mut conn).unwrap(),
            vec![jane.id, john.id]
        );

        assert_eq!(force_remove_sessions_by_user_id(&mut conn, &[jane.id]).unwrap(), 2);
        assert_eq!(count_active_sessions(&mut conn, jane.id).unwrap(), 0);
        assert!(
            get_login_history(&mut conn, jane.id)
                .unwrap()
                .iter()
                .all(|h| h.logout_time.is_some())
        );
        assert_eq!(force_remove_sessions_by_user_id(&mut conn, &[]).unwrap(), 0);
    }
}
