#![cfg(feature = "test-staging")]

use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rocket::figment::{
    util::map,
    value::{Map, Value},
};
use rocket::{Build, Rocket, fairing::AdHoc};
use rocket_sync_db_pools::diesel;

use super::db::{DbConn, run_pending_migrations, set_foreign_keys};
use super::offline::{OfflineDbConn, run_offline_migrations, run_offline_migrations_fairing};
use crate::admin_init_fairing::admin_init_fairing;
use crate::config::{VacationConfig, config_fairing};
use crate::models::{
    DepartmentInput, Employee, EmployeeInput, NewVacation, PositionInput, ProfileUpdate, Vacation,
};
use crate::orm::employee::{get_employee_by_username, insert_employee};
use crate::orm::organisation::{add_department, add_position, get_all_departments};
use crate::schema::vacations;

/// Password of every fixture employee.
pub const TEST_PASSWORD: &str = "admin";

/// Configures SQLite with performance-optimized settings for testing.
///
/// Sets the following PRAGMAs:
/// - `synchronous = OFF`: Disables synchronous writes for faster performance
/// - `journal_mode = OFF`: Disables rollback journal
///
/// These settings make SQLite faster but less durable - only use for testing.
///
/// # Panics
/// Panics if the PRAGMA commands fail to execute
fn set_sqlite_test_pragmas(conn: &mut diesel::SqliteConnection) {
    conn.batch_execute(
        r#"
        PRAGMA synchronous = OFF;
        PRAGMA journal_mode = OFF;
        "#,
    )
    .expect("Failed to set SQLite PRAGMAs");
}

fn set_sqlite_test_pragmas_fairing() -> AdHoc {
    AdHoc::on_ignite("Set SQLite Test Pragmas", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for test pragmas");
        conn.run(|c| {
            set_sqlite_test_pragmas(c);
        })
        .await;
        rocket
    })
}

/// Creates a Rocket fairing that seeds the standard test employees.
///
/// Runs after the admin bootstrap, so the `admin` account already exists.
fn test_data_init_fairing() -> AdHoc {
    AdHoc::on_ignite("Test Data Initialization", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for test data initialization");

        conn.run(|c| {
            if let Err(e) = create_test_data(c) {
                eprintln!("[test-data-init] ERROR: Failed to create test data: {}", e);
            } else {
                eprintln!("[test-data-init] Test data initialization completed");
            }
        })
        .await;

        rocket
    })
}

/// Creates standard test data for all tests to use.
///
/// | username | name          | role  | notes              |
/// |----------|---------------|-------|--------------------|
/// | manager  | Maria Manager | admin |                    |
/// | alice    | Alice Smith   | user  | Engineering        |
/// | bob      | Bob Jones     | user  |                    |
/// | carol    | Carol White   | user  | `max_sessions = 2` |
/// | dave     | Dave Brown    | user  |                    |
fn create_test_data(
    conn: &mut SqliteConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let engineering = match get_all_departments(conn)?
        .into_iter()
        .find(|d| d.name == "Engineering")
    {
        Some(d) => d,
        None => add_department(
            conn,
            DepartmentInput {
                name: "Engineering".to_string(),
                description: Some("Builds things".to_string()),
            },
        )?,
    };
    let developer = add_position(
        conn,
        PositionInput {
            name: "Developer".to_string(),
            department_id: Some(engineering.id),
            description: None,
        },
    )?;

    create_test_employee(conn, "Maria Manager", "manager", "admin", None, ProfileUpdate::default())?;
    create_test_employee(
        conn,
        "Alice Smith",
        "alice",
        "user",
        None,
        ProfileUpdate {
            department_id: Some(engineering.id),
            position_id: Some(developer.id),
            phone_number: Some("+1 555 0100".to_string()),
            ..Default::default()
        },
    )?;
    create_test_employee(conn, "Bob Jones", "bob", "user", None, ProfileUpdate::default())?;
    create_test_employee(conn, "Carol White", "carol", "user", Some(2), ProfileUpdate::default())?;
    create_test_employee(conn, "Dave Brown", "dave", "user", None, ProfileUpdate::default())?;
    Ok(())
}

fn create_test_employee(
    conn: &mut SqliteConnection,
    name: &str,
    username: &str,
    role: &str,
    max_sessions: Option<i32>,
    profile: ProfileUpdate,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if get_employee_by_username(conn, username)?.is_some() {
        eprintln!("[test-data-init] Employee '{}' already exists", username);
        return Ok(());
    }
    insert_employee(
        conn,
        EmployeeInput {
            name: name.to_string(),
            username: username.to_string(),
            password: TEST_PASSWORD.to_string(),
            role: Some(role.to_string()),
            max_sessions,
            profile,
            ..Default::default()
        },
        &VacationConfig::default(),
    )?;
    eprintln!("[test-data-init] Created employee '{}' ({})", username, role);
    Ok(())
}

/// Creates and configures a Rocket instance for testing with in-memory
/// SQLite databases.
///
/// The returned Rocket instance will have:
/// - A unique shared in-memory main database and offline store
/// - Database connection pools attached
/// - Foreign keys enabled and testing pragmas set
/// - All migrations run on both databases
/// - Admin initialization completed and fixtures seeded
/// - API routes and catchers mounted
pub fn test_rocket() -> Rocket<Build> {
    use uuid::Uuid;

    let unique_db_name = format!("file:test_db_{}?mode=memory&cache=shared", Uuid::new_v4());
    let db_config: Map<_, Value> = map! {
        "url" => unique_db_name.into(),
        "pool_size" => 5.into(),
        "timeout" => 5.into(),
    };

    let offline_db_name = format!(
        "file:test_offline_db_{}?mode=memory&cache=shared",
        Uuid::new_v4()
    );
    let offline_config: Map<_, Value> = map! {
        "url" => offline_db_name.into(),
        "pool_size" => 2.into(),
        "timeout" => 5.into(),
    };

    let databases = map![
        "sqlite_db" => db_config,
        "offline_db" => offline_config
    ];

    let figment = rocket::Config::figment().merge(("databases", databases));

    let rocket = rocket::custom(figment)
        .attach(config_fairing())
        .attach(DbConn::fairing())
        .attach(super::db::set_foreign_keys_fairing())
        .attach(set_sqlite_test_pragmas_fairing())
        .attach(super::db::run_migrations_fairing())
        .attach(OfflineDbConn::fairing())
        .attach(run_offline_migrations_fairing())
        .attach(admin_init_fairing())
        .attach(test_data_init_fairing());

    crate::register_catchers(crate::mount_api_routes(rocket))
}

/// Creates a synchronous in-memory SQLite database connection for unit tests.
///
/// Runs all embedded migrations and enables foreign keys. Each call returns a
/// new, independent database.
pub fn setup_test_db() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:")
        .expect("Failed to create in-memory SQLite database");
    set_foreign_keys(&mut conn).expect("Failed to enable foreign keys");
    run_pending_migrations(&mut conn).expect("Failed to run migrations");
    conn
}

/// Same as `setup_test_db` for the offline mirror schema.
pub fn setup_offline_test_db() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:")
        .expect("Failed to create in-memory SQLite database");
    run_offline_migrations(&mut conn).expect("Failed to run offline migrations");
    conn
}

/// Inserts an employee with password `admin` and default allowance.
pub fn insert_test_employee(
    conn: &mut SqliteConnection,
    name: &str,
    username: &str,
    role: &str,
) -> Employee {
    insert_employee(
        conn,
        EmployeeInput {
            name: name.to_string(),
            username: username.to_string(),
            password: TEST_PASSWORD.to_string(),
            role: Some(role.to_string()),
            ..Default::default()
        },
        &VacationConfig::default(),
    )
    .expect("insert test employee")
}

/// Inserts a vacation row directly, without notifications.
/// Dates are `YYYY-MM-DD`.
pub fn insert_test_vacation(
    conn: &mut SqliteConnection,
    employee_id: i32,
    start: &str,
    end: &str,
    status: &str,
) -> Vacation {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date");
    diesel::insert_into(vacations::table)
        .values(&NewVacation {
            employee_id,
            start_date: parse(start),
            end_date: parse(end),
            note: None,
            status: status.to_string(),
        })
        .execute(conn)
        .expect("insert test vacation");
    vacations::table
        .order(vacations::id.desc())
        .first::<Vacation>(conn)
        .expect("load test vacation")
}

/// A minimal async-compatible wrapper for a synchronous SQLite connection for unit testing.
///
/// Lets tests drive code that expects a Rocket-style async `.run()` interface
/// (anything generic over `DbRunner`) with a connection from `setup_test_db()`.
pub struct FakeDbConn<'a>(pub &'a mut diesel::SqliteConnection);

impl<'a> FakeDbConn<'a> {
    /// Executes a closure with a mutable reference to the underlying SQLite connection.
    ///
    /// # Safety
    /// This uses unsafe code to convert an immutable reference to mutable, which is safe
    /// in this controlled test environment where we know we have exclusive access.
    pub async fn run<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        unsafe {
            let conn_ptr =
                self.0 as *const diesel::SqliteConnection as *mut diesel::SqliteConnection;
            f(&mut *conn_ptr)
        }
    }
}

/// Creates a `FakeDbConn` for async-style testing with the given SQLite connection.
pub fn setup_test_dbconn<'a>(conn: &'a mut diesel::SqliteConnection) -> FakeDbConn<'a> {
    FakeDbConn(conn)
}
