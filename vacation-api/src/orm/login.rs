//! Database operations for employee authentication.
//!
//! Login first tries the main database. When the pool is unavailable or a
//! lookup fails, the credentials are checked against the offline mirror
//! instead; such logins create no session and set no cookie.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rocket::http::{Cookie, CookieJar, SameSite, Status};

use crate::api::login::LoginRequest;
use crate::config::VacationConfig;
use crate::models::{Employee, OfflineUser};
use crate::orm::DbRunner;
use crate::orm::employee::get_employee_for_login;
use crate::orm::error::DataError;
use crate::orm::offline::{authenticate_offline, save_connection_info, save_employee_for_offline};
use crate::orm::session::{count_active_sessions, create_session};
use crate::orm::settings::get_maintenance_mode;

/// Name of the cookie holding the session id.
pub const SESSION_COOKIE: &str = "session";

/// Result of a successful login.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Authenticated against the main database; a session was created.
    Online(Employee),
    /// Authenticated against the offline mirror.
    Offline(OfflineUser),
}

/// Verifies a password against a stored hash.
///
/// # Returns
/// * `true` - Password matches the stored hash
/// * `false` - Password doesn't match or hash format is invalid
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hashes a password using Argon2 with a random salt.
pub fn hash_password(password: &str) -> Result<String, DataError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DataError::Hash(e.to_string()))
}

/// Sets a secure session cookie in the response.
///
/// # Security Features
/// - `http_only(true)` - Prevents JavaScript access to the cookie
/// - `secure(true)` - Requires HTTPS outside of tests
/// - `same_site(SameSite::Lax)` - Provides CSRF protection
/// - `path("/")` - Makes cookie available for all paths
pub fn set_session_cookie(cookies: &CookieJar<'_>, session_token: &str) {
    let secure_flag = !cfg!(test);
    let cookie = Cookie::build((SESSION_COOKIE, session_token.to_string()))
        .http_only(true)
        .secure(secure_flag)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    cookies.add(cookie);
}

/// Processes a complete login: validation, lookup, password check,
/// maintenance and session-limit checks, session creation and cookie.
///
/// `db` is `None` when the main pool could not hand out a connection.
///
/// # Returns
/// * `Ok(LoginOutcome::Online)` - Session created and cookie set
/// * `Ok(LoginOutcome::Offline)` - Main database unavailable, offline mirror accepted the credentials
/// * `Err(Status::BadRequest)` - Empty username or password
/// * `Err(Status::Unauthorized)` - Unknown or inactive user, or wrong password
/// * `Err(Status::Forbidden)` - Employee already holds `max_sessions` sessions
/// * `Err(Status::ServiceUnavailable)` - Maintenance mode is on and the employee is not an admin
/// * `Err(Status::InternalServerError)` - Database operation failed
pub async fn process_login<D: DbRunner, O: DbRunner>(
    db: Option<&D>,
    offline: &O,
    cookies: &CookieJar<'_>,
    login: &LoginRequest,
    config: &VacationConfig,
    ip_address: Option<String>,
) -> Result<LoginOutcome, Status> {
    if login.username.trim().is_empty() || login.password.is_empty() {
        return Err(Status::BadRequest);
    }
    let username = login.username.trim().to_string();

    let lookup = match db {
        Some(db) => {
            let name = username.clone();
            db.run(move |conn| get_employee_for_login(conn, &name))
                .await
                .map_err(|e| e.to_string())
        }
        None => Err("no connection available".to_string()),
    };

    let employee = match lookup {
        Ok(Some(employee)) => employee,
        Ok(None) => return Err(Status::Unauthorized),
        Err(reason) => {
            warn!(
                "[offline] Main database unavailable ({}), trying offline login for '{}'",
                reason, username
            );
            return login_offline(offline, &username, &login.password).await;
        }
    };
    // `lookup` succeeded, so the pool was present.
    let Some(db) = db else {
        return Err(Status::InternalServerError);
    };

    if !verify_password(&login.password, &employee.password_hash) {
        return Err(Status::Unauthorized);
    }

    let maintenance = db
        .run(get_maintenance_mode)
        .await
        .map_err(|_| Status::InternalServerError)?;
    if maintenance && !employee.is_admin() {
        info!(
            "Login refused for '{}': maintenance mode is enabled",
            employee.username
        );
        return Err(Status::ServiceUnavailable);
    }

    let employee_id = employee.id;
    let active = db
        .run(move |conn| count_active_sessions(conn, employee_id))
        .await
        .map_err(|_| Status::InternalServerError)?;
    if active >= i64::from(employee.max_sessions) {
        info!(
            "Login refused for '{}': {} of {} sessions in use",
            employee.username, active, employee.max_sessions
        );
        return Err(Status::Forbidden);
    }

    let session_token = db
        .run(move |conn| create_session(conn, employee_id, ip_address))
        .await
        .map_err(|_| Status::InternalServerError)?;
    set_session_cookie(cookies, &session_token);

    mirror_for_offline(offline, &employee, config).await;

    info!("Employee '{}' logged in", employee.username);
    Ok(LoginOutcome::Online(employee))
}

async fn login_offline<O: DbRunner>(
    offline: &O,
    username: &str,
    password: &str,
) -> Result<LoginOutcome, Status> {
    let username = username.to_string();
    let password = password.to_string();
    match offline
        .run(move |conn| authenticate_offline(conn, &username, &password))
        .await
    {
        Ok(Some(user)) => {
            info!("[offline] Employee '{}' logged in offline", user.username);
            Ok(LoginOutcome::Offline(user))
        }
        Ok(None) => Err(Status::Unauthorized),
        Err(e) => {
            error!("[offline] Offline authentication failed: {}", e);
            Err(Status::InternalServerError)
        }
    }
}

/// Stores the employee's credentials and the tenant identity in the offline
/// mirror. Failures are logged and never fail the login.
async fn mirror_for_offline<O: DbRunner>(offline: &O, employee: &Employee, config: &VacationConfig) {
    let snapshot = employee.clone();
    let tenant_id = config.tenant_id.clone();
    let company_name = config.company_name.clone();
    let result = offline
        .run(move |conn| {
            save_employee_for_offline(conn, &snapshot)?;
            save_connection_info(conn, tenant_id.as_deref(), company_name.as_deref())
        })
        .await;
    if let Err(e) = result {
        warn!(
            "[offline] Could not mirror '{}' for offline use: {}",
            employee.username, e
        );
    }
}
