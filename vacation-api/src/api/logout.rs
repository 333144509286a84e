//! API endpoint for employee logout and session termination.

use rocket::http::{Cookie, CookieJar};
use rocket::serde::json::{Json, Value, json};
use rocket::{Route, post};

use crate::orm::DbConn;
use crate::orm::login::SESSION_COOKIE;
use crate::orm::logout::end_session;

/// Logout endpoint that terminates the employee's session.
///
/// - **URL:** `/api/1/logout`
/// - **Method:** `POST`
/// - **Purpose:** Ends the current session and clears the session cookie
/// - **Authentication:** None required (works with or without a valid session)
///
/// The session row is deleted and its login history entry gets a logout
/// time. The call is idempotent and always reports success.
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// { "message": "Logout successful", "status": "ok" }
/// ```
#[post("/1/logout")]
pub async fn logout(db: DbConn, cookies: &CookieJar<'_>) -> Json<Value> {
    let cookie_value = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());

    if let Some(session_id) = cookie_value {
        if let Err(e) = end_session(&db, &session_id).await {
            error!("Failed to end session: {}", e);
        }
        cookies.remove(Cookie::from(SESSION_COOKIE));
    }

    Json(json!({
        "message": "Logout successful",
        "status": "ok"
    }))
}

pub fn routes() -> Vec<Route> {
    routes![logout]
}
