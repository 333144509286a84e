//! Database operations for employee logout.

use crate::orm::DbRunner;
use crate::orm::session::remove_user_session;

/// Ends a session by deleting it and stamping the history row.
///
/// # Arguments
/// * `db` - Database connection implementing the `DbRunner` trait
/// * `session_id` - Session token to end
///
/// # Returns
/// * `Ok(usize)` - Number of sessions removed (0 for unknown tokens)
/// * `Err(diesel::result::Error)` - Database operation failed
pub async fn end_session<D: DbRunner>(
    db: &D,
    session_id: &str,
) -> Result<usize, diesel::result::Error> {
    let session_id = session_id.to_string();
    db.run(move |conn| remove_user_session(conn, &session_id))
        .await
}
