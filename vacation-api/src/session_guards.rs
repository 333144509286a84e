//! Session-based authentication and authorization guards for Rocket routes.
//!
//! # Basic Authentication
//!
//! ```rust,ignore
//! use rocket::get;
//! use vacation_api::session_guards::AuthenticatedUser;
//!
//! #[get("/profile")]
//! fn get_profile(user: AuthenticatedUser) -> String {
//!     format!("Welcome, {}!", user.employee.name)
//! }
//! ```
//!
//! # Admin-only routes
//!
//! ```rust,ignore
//! use rocket::get;
//! use vacation_api::session_guards::AdminUser;
//!
//! #[get("/admin")]
//! fn admin_only(user: AdminUser) -> String {
//!     format!("Admin access granted to {}", user.employee.username)
//! }
//! ```

use diesel::prelude::*;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};

use crate::models::{ActiveSession, Employee, ROLE_ADMIN};
use crate::orm::DbConn;
use crate::orm::login::SESSION_COOKIE;
use crate::schema::{active_sessions, employees};

/// A request guard for routes that require a logged-in employee.
///
/// 1. Reads the `session` cookie
/// 2. Looks the id up in `active_sessions`
/// 3. Loads the employee the session belongs to, who must still be active
///
/// # Returns
///
/// - `Outcome::Success(AuthenticatedUser)` if authentication succeeds
/// - `Outcome::Error(Status::Unauthorized)` for a missing, unknown or ended session, or an inactive employee
/// - `Outcome::Error(Status::InternalServerError)` if no database connection is available
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub employee: Employee,
    pub session_id: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = match request.guard::<DbConn>().await {
            Outcome::Success(db) => db,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        let session_id = match request.cookies().get(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        let lookup_id = session_id.clone();
        let session_result = db
            .run(move |conn| {
                active_sessions::table
                    .filter(active_sessions::session_id.eq(&lookup_id))
                    .first::<ActiveSession>(conn)
                    .optional()
            })
            .await;

        let session = match session_result {
            Ok(Some(sess)) => sess,
            Ok(None) => return Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                error!("Database error finding session: {:?}", e);
                return Outcome::Error((Status::Unauthorized, ()));
            }
        };

        let employee_result = db
            .run(move |conn| {
                employees::table
                    .filter(employees::id.eq(session.user_id))
                    .filter(employees::is_active.eq(true))
                    .first::<Employee>(conn)
                    .optional()
            })
            .await;

        match employee_result {
            Ok(Some(employee)) => Outcome::Success(AuthenticatedUser {
                employee,
                session_id,
            }),
            Ok(None) => Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                error!("Database error finding employee: {:?}", e);
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

impl AuthenticatedUser {
    pub fn has_role(&self, role_name: &str) -> bool {
        self.employee.role == role_name
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// True when the caller is `employee_id` or an admin.
    pub fn can_act_for(&self, employee_id: i32) -> bool {
        self.employee.id == employee_id || self.is_admin()
    }
}

/// Macro to create role-specific request guards
macro_rules! create_role_guard {
    ($name:ident, $role:expr) => {
        #[derive(Debug)]
        pub struct $name {
            pub employee: Employee,
            pub session_id: String,
        }

        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $name {
            type Error = ();

            async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
                let auth_user = match AuthenticatedUser::from_request(request).await {
                    Outcome::Success(user) => user,
                    Outcome::Error(e) => return Outcome::Error(e),
                    Outcome::Forward(f) => return Outcome::Forward(f),
                };

                if auth_user.has_role($role) {
                    Outcome::Success($name {
                        employee: auth_user.employee,
                        session_id: auth_user.session_id,
                    })
                } else {
                    Outcome::Error((Status::Forbidden, ()))
                }
            }
        }
    };
}

// A request guard that requires the "admin" role.
//
// - `Outcome::Success(AdminUser)` if the employee is logged in and an admin
// - `Outcome::Error(Status::Forbidden)` if logged in without the admin role
// - `Outcome::Error(Status::Unauthorized)` if not logged in
create_role_guard!(AdminUser, ROLE_ADMIN);
