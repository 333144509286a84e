use dotenvy::dotenv;
use rocket::Rocket;
use rocket::fairing::AdHoc;

use crate::config::VacationConfig;
use crate::models::{EmployeeInput, ROLE_ADMIN};
use crate::orm::DbConn;
use crate::orm::employee::{get_employee_by_username, insert_employee};
use crate::orm::error::DataError;

/// Add the default admin employee if needed.
///
/// Set the default admin username/pass based on envars
/// VACATION_DEFAULT_USERNAME and VACATION_DEFAULT_PASSWORD.
pub fn admin_init_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Admin Employee Initialization", |rocket| async {
        dotenv().ok();

        let Some(conn) = get_db_connection(&rocket).await else {
            return Err(rocket);
        };
        let config = rocket
            .state::<VacationConfig>()
            .cloned()
            .unwrap_or_default();

        let username = get_admin_username();
        let password = get_admin_password();
        match conn
            .run(move |c| create_admin_if_needed(c, &username, &password, &config))
            .await
        {
            Ok(()) => Ok(rocket),
            Err(e) => {
                error!("[admin-init] FATAL: Admin employee creation failed: {}", e);
                Err(rocket)
            }
        }
    })
}

async fn get_db_connection(rocket: &Rocket<rocket::Build>) -> Option<DbConn> {
    match DbConn::get_one(rocket).await {
        Some(conn) => Some(conn),
        None => {
            error!("[admin-init] ERROR: Could not get DB connection.");
            None
        }
    }
}

fn get_admin_username() -> String {
    std::env::var("VACATION_DEFAULT_USERNAME").unwrap_or_else(|_| "admin".to_string())
}

fn get_admin_password() -> String {
    std::env::var("VACATION_DEFAULT_PASSWORD").unwrap_or_else(|_| "admin".to_string())
}

fn create_admin_if_needed(
    c: &mut diesel::SqliteConnection,
    username: &str,
    password: &str,
    config: &VacationConfig,
) -> Result<(), DataError> {
    if get_employee_by_username(c, username)?.is_some() {
        info!("[admin-init] Admin employee '{}' already exists", username);
        return Ok(());
    }

    let input = EmployeeInput {
        name: "Administrator".to_string(),
        username: username.to_string(),
        password: password.to_string(),
        role: Some(ROLE_ADMIN.to_string()),
        ..EmployeeInput::default()
    };
    let admin = insert_employee(c, input, config)?;
    info!(
        "[admin-init] Created admin employee '{}' (id {})",
        admin.username, admin.id
    );
    if password == "admin" {
        warn!("[admin-init] The default admin password is in use; change it.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::login::verify_password;
    use crate::orm::testing::setup_test_db;

    #[test]
    fn test_creates_admin_once() {
        let mut conn = setup_test_db();
        let config = VacationConfig::default();

        create_admin_if_needed(&mut conn, "boss", "s3cret", &config).unwrap();
        let admin = get_employee_by_username(&mut conn, "boss")
            .unwrap()
            .expect("admin created");
        assert!(admin.is_admin());
        assert!(verify_password("s3cret", &admin.password_hash));
        assert_eq!(admin.total_vacation_days, config.default_vacation_days);

        // Second run leaves the existing account alone.
        create_admin_if_needed(&mut conn, "boss", "other", &config).unwrap();
        let again = get_employee_by_username(&mut conn, "boss").unwrap().unwrap();
        assert_eq!(again.id, admin.id);
        assert!(verify_password("s3cret", &again.password_hash));
    }
}
