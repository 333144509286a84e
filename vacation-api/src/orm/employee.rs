//! Database operations for employee accounts.
//!
//! Accounts are never removed by `delete_employee`; it only clears
//! `is_active`. Hard deletion goes through `permanently_delete_employee`,
//! which needs the acting admin's password.

use chrono::{Datelike, NaiveDate};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::config::VacationConfig;
use crate::models::{
    Employee, EmployeeInput, EmployeeOverview, NewEmployee, PhasedVacation, ProfileUpdate,
    ROLE_USER, SystemSettingsUpdate, VacationStatus, is_valid_role,
};
use crate::orm::error::DataError;
use crate::orm::login::{hash_password, verify_password};
use crate::orm::vacation::{list_unarchived_vacations_for_employee, used_days_in_year};
use crate::schema::{
    active_sessions, employees, error_logs, login_history, notifications, system_commands,
    vacations,
};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Upper bound for `max_sessions`.
pub const MAX_SESSIONS_LIMIT: i32 = 100;

/// Inserts a new employee after checking name, username and email are free.
///
/// Omitted role, vacation days and session limit are taken from `defaults`.
///
/// # Returns
/// * `Ok(Employee)` - The stored employee
/// * `Err(DataError::Invalid)` - Empty name/username/password or unknown role
/// * `Err(DataError::Conflict)` - Name, username or email already in use
pub fn insert_employee(
    conn: &mut SqliteConnection,
    input: EmployeeInput,
    defaults: &VacationConfig,
) -> Result<Employee, DataError> {
    let name = input.name.trim().to_string();
    let username = input.username.trim().to_string();
    if name.is_empty() || username.is_empty() {
        return Err(DataError::invalid("Name and username are required"));
    }
    if input.password.is_empty() {
        return Err(DataError::invalid("Password is required"));
    }

    validate_profile(&input.profile)?;

    let role = input.role.unwrap_or_else(|| ROLE_USER.to_string());
    if !is_valid_role(&role) {
        return Err(DataError::invalid(format!("Unknown role '{}'", role)));
    }

    let email = input
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());

    if check_if_username_exists(conn, &username, None)? {
        return Err(DataError::conflict(format!(
            "Username '{}' is already taken",
            username
        )));
    }
    if let Some(ref e) = email {
        if check_if_email_exists(conn, e, None)? {
            return Err(DataError::conflict(format!(
                "Email '{}' is already registered",
                e
            )));
        }
    }
    if check_if_name_exists(conn, &name, None)? {
        return Err(DataError::conflict(format!(
            "An employee named '{}' already exists",
            name
        )));
    }

    let profile = input.profile;
    let new_employee = NewEmployee {
        name,
        username,
        password_hash: hash_password(&input.password)?,
        role,
        total_vacation_days: input
            .total_vacation_days
            .unwrap_or(defaults.default_vacation_days),
        max_sessions: input.max_sessions.unwrap_or(defaults.default_max_sessions),
        email,
        first_name: profile.first_name,
        last_name: profile.last_name,
        father_name: profile.father_name,
        phone_number: profile.phone_number,
        birth_date: profile.birth_date,
        fin_code: profile.fin_code,
        department_id: profile.department_id,
        position_id: profile.position_id,
        hire_date: profile.hire_date,
        salary: profile.salary,
        address: profile.address,
        emergency_contact: profile.emergency_contact,
    };

    diesel::insert_into(employees::table)
        .values(&new_employee)
        .execute(conn)?;

    let last_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)?
        .last_insert_rowid;

    Ok(employees::table
        .filter(employees::id.eq(last_id as i32))
        .first::<Employee>(conn)?)
}

/// Gets a single employee by ID.
pub fn get_employee(
    conn: &mut SqliteConnection,
    employee_id: i32,
) -> Result<Option<Employee>, diesel::result::Error> {
    employees::table
        .filter(employees::id.eq(employee_id))
        .first::<Employee>(conn)
        .optional()
}

/// Gets an employee by username regardless of state.
pub fn get_employee_by_username(
    conn: &mut SqliteConnection,
    login: &str,
) -> Result<Option<Employee>, diesel::result::Error> {
    employees::table
        .filter(employees::username.eq(login))
        .first::<Employee>(conn)
        .optional()
}

/// Gets an employee that may log in: matching username and `is_active`.
pub fn get_employee_for_login(
    conn: &mut SqliteConnection,
    login: &str,
) -> Result<Option<Employee>, diesel::result::Error> {
    employees::table
        .filter(employees::username.eq(login))
        .filter(employees::is_active.eq(true))
        .first::<Employee>(conn)
        .optional()
}

/// Returns all employees ordered by name.
pub fn list_employees(conn: &mut SqliteConnection) -> Result<Vec<Employee>, diesel::result::Error> {
    employees::table
        .order(employees::name.asc())
        .load::<Employee>(conn)
}

/// Returns IDs of active admins, the audience of new-request notifications.
pub fn list_admin_ids(conn: &mut SqliteConnection) -> Result<Vec<i32>, diesel::result::Error> {
    employees::table
        .filter(employees::role.eq(crate::models::ROLE_ADMIN))
        .filter(employees::is_active.eq(true))
        .select(employees::id)
        .order(employees::id.asc())
        .load::<i32>(conn)
}

pub fn check_if_name_exists(
    conn: &mut SqliteConnection,
    candidate: &str,
    exclude_id: Option<i32>,
) -> Result<bool, diesel::result::Error> {
    let mut query = employees::table
        .filter(employees::name.eq(candidate))
        .into_boxed();
    if let Some(exclude) = exclude_id {
        query = query.filter(employees::id.ne(exclude));
    }
    Ok(query.count().get_result::<i64>(conn)? > 0)
}

pub fn check_if_username_exists(
    conn: &mut SqliteConnection,
    candidate: &str,
    exclude_id: Option<i32>,
) -> Result<bool, diesel::result::Error> {
    let mut query = employees::table
        .filter(employees::username.eq(candidate))
        .into_boxed();
    if let Some(exclude) = exclude_id {
        query = query.filter(employees::id.ne(exclude));
    }
    Ok(query.count().get_result::<i64>(conn)? > 0)
}

pub fn check_if_email_exists(
    conn: &mut SqliteConnection,
    candidate: &str,
    exclude_id: Option<i32>,
) -> Result<bool, diesel::result::Error> {
    let mut query = employees::table
        .filter(employees::email.eq(candidate))
        .into_boxed();
    if let Some(exclude) = exclude_id {
        query = query.filter(employees::id.ne(exclude));
    }
    Ok(query.count().get_result::<i64>(conn)? > 0)
}

fn require_employee(conn: &mut SqliteConnection, employee_id: i32) -> Result<Employee, DataError> {
    get_employee(conn, employee_id)?.ok_or(DataError::NotFound("Employee"))
}

/// Updates display name, yearly allowance and session limit.
pub fn update_employee(
    conn: &mut SqliteConnection,
    employee_id: i32,
    new_name: &str,
    total_days: i32,
    sessions: i32,
) -> Result<Employee, DataError> {
    require_employee(conn, employee_id)?;

    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(DataError::invalid("Name is required"));
    }
    validate_allowance(total_days, sessions)?;
    if check_if_name_exists(conn, new_name, Some(employee_id))? {
        return Err(DataError::conflict(format!(
            "An employee named '{}' already exists",
            new_name
        )));
    }

    diesel::update(employees::table.filter(employees::id.eq(employee_id)))
        .set((
            employees::name.eq(new_name),
            employees::total_vacation_days.eq(total_days),
            employees::max_sessions.eq(sessions),
        ))
        .execute(conn)?;

    require_employee(conn, employee_id)
}

fn validate_allowance(total_days: i32, sessions: i32) -> Result<(), DataError> {
    if total_days < 0 {
        return Err(DataError::invalid("Vacation days cannot be negative"));
    }
    if !(1..=MAX_SESSIONS_LIMIT).contains(&sessions) {
        return Err(DataError::invalid(format!(
            "Session limit must be between 1 and {}",
            MAX_SESSIONS_LIMIT
        )));
    }
    Ok(())
}

/// Updates role, allowance, session limit and username in one go.
pub fn update_employee_system_settings(
    conn: &mut SqliteConnection,
    employee_id: i32,
    settings: &SystemSettingsUpdate,
) -> Result<Employee, DataError> {
    require_employee(conn, employee_id)?;

    if !is_valid_role(&settings.role) {
        return Err(DataError::invalid(format!("Unknown role '{}'", settings.role)));
    }
    validate_allowance(settings.total_vacation_days, settings.max_sessions)?;

    let new_username = settings.username.trim();
    if new_username.is_empty() {
        return Err(DataError::invalid("Username cannot be empty"));
    }
    if check_if_username_exists(conn, new_username, Some(employee_id))? {
        return Err(DataError::conflict(format!(
            "Username '{}' is already taken",
            new_username
        )));
    }

    diesel::update(employees::table.filter(employees::id.eq(employee_id)))
        .set((
            employees::role.eq(&settings.role),
            employees::total_vacation_days.eq(settings.total_vacation_days),
            employees::max_sessions.eq(settings.max_sessions),
            employees::username.eq(new_username),
        ))
        .execute(conn)?;

    info!(
        "Employee {} settings updated: role={}, days={}, sessions={}, username={}",
        employee_id,
        settings.role,
        settings.total_vacation_days,
        settings.max_sessions,
        new_username
    );
    require_employee(conn, employee_id)
}

fn validate_profile(profile: &ProfileUpdate) -> Result<(), DataError> {
    if profile.salary.is_some_and(|s| s < 0.0 || s.is_nan()) {
        return Err(DataError::invalid("Salary cannot be negative"));
    }
    Ok(())
}

/// Writes the profile fields that are present in `profile`.
pub fn update_employee_profile(
    conn: &mut SqliteConnection,
    employee_id: i32,
    profile: &ProfileUpdate,
) -> Result<Employee, DataError> {
    validate_profile(profile)?;
    require_employee(conn, employee_id)?;
    if !profile.is_empty() {
        diesel::update(employees::table.filter(employees::id.eq(employee_id)))
            .set(profile)
            .execute(conn)?;
    }
    require_employee(conn, employee_id)
}

/// Soft-deletes an employee by clearing `is_active`.
pub fn delete_employee(
    conn: &mut SqliteConnection,
    employee_id: i32,
) -> Result<usize, diesel::result::Error> {
    set_employee_activity(conn, employee_id, false)
}

pub fn set_employee_activity(
    conn: &mut SqliteConnection,
    employee_id: i32,
    active: bool,
) -> Result<usize, diesel::result::Error> {
    diesel::update(employees::table.filter(employees::id.eq(employee_id)))
        .set(employees::is_active.eq(active))
        .execute(conn)
}

/// Changes an employee's own password after verifying the current one.
pub fn change_password(
    conn: &mut SqliteConnection,
    employee_id: i32,
    current_password: &str,
    new_password: &str,
) -> Result<(), DataError> {
    let employee = require_employee(conn, employee_id)?;
    if !verify_password(current_password, &employee.password_hash) {
        return Err(DataError::WrongPassword);
    }
    admin_set_password(conn, employee_id, new_password)
}

/// Replaces an employee's password without checking the old one.
pub fn admin_set_password(
    conn: &mut SqliteConnection,
    employee_id: i32,
    new_password: &str,
) -> Result<(), DataError> {
    if new_password.is_empty() {
        return Err(DataError::invalid("Password cannot be empty"));
    }
    let hash = hash_password(new_password)?;
    let rows = diesel::update(employees::table.filter(employees::id.eq(employee_id)))
        .set(employees::password_hash.eq(hash))
        .execute(conn)?;
    if rows == 0 {
        return Err(DataError::NotFound("Employee"));
    }
    Ok(())
}

fn verify_admin_password(
    conn: &mut SqliteConnection,
    admin_id: i32,
    admin_password: &str,
) -> Result<(), DataError> {
    let admin = get_employee(conn, admin_id)?.ok_or(DataError::NotFound("Admin"))?;
    if !admin.is_admin() {
        return Err(DataError::forbidden("Only admins can do this"));
    }
    if !verify_password(admin_password, &admin.password_hash) {
        return Err(DataError::WrongPassword);
    }
    Ok(())
}

/// Hides an employee from the overview. Requires the acting admin's password.
pub fn hide_employee(
    conn: &mut SqliteConnection,
    employee_id: i32,
    admin_password: &str,
    admin_id: i32,
) -> Result<(), DataError> {
    verify_admin_password(conn, admin_id, admin_password)?;
    set_employee_hidden(conn, employee_id, true)
}

pub fn unhide_employee(conn: &mut SqliteConnection, employee_id: i32) -> Result<(), DataError> {
    set_employee_hidden(conn, employee_id, false)
}

/// Sets the `hide` flag without a password check. Used by the admin CLI.
pub fn set_employee_hidden(
    conn: &mut SqliteConnection,
    employee_id: i32,
    hidden: bool,
) -> Result<(), DataError> {
    let rows = diesel::update(employees::table.filter(employees::id.eq(employee_id)))
        .set(employees::hide.eq(hidden))
        .execute(conn)?;
    if rows == 0 {
        return Err(DataError::NotFound("Employee"));
    }
    Ok(())
}

pub fn get_hidden_employees(
    conn: &mut SqliteConnection,
) -> Result<Vec<Employee>, diesel::result::Error> {
    employees::table
        .filter(employees::hide.eq(true))
        .order(employees::name.asc())
        .load::<Employee>(conn)
}

/// Removes an employee and everything that references them.
///
/// Requires the acting admin's password. An admin cannot delete their own
/// account this way.
pub fn permanently_delete_employee(
    conn: &mut SqliteConnection,
    employee_id: i32,
    admin_password: &str,
    admin_id: i32,
) -> Result<(), DataError> {
    if employee_id == admin_id {
        return Err(DataError::forbidden("You cannot delete your own account"));
    }
    verify_admin_password(conn, admin_id, admin_password)?;
    require_employee(conn, employee_id)?;

    conn.transaction::<_, DataError, _>(|conn| {
        let owned_vacations = vacations::table
            .filter(vacations::employee_id.eq(employee_id))
            .select(vacations::id.nullable());
        diesel::update(
            notifications::table.filter(notifications::related_vacation_id.eq_any(owned_vacations)),
        )
        .set(notifications::related_vacation_id.eq(None::<i32>))
        .execute(conn)?;

        diesel::delete(notifications::table.filter(notifications::recipient_id.eq(employee_id)))
            .execute(conn)?;
        diesel::delete(vacations::table.filter(vacations::employee_id.eq(employee_id)))
            .execute(conn)?;
        diesel::delete(active_sessions::table.filter(active_sessions::user_id.eq(employee_id)))
            .execute(conn)?;
        diesel::delete(login_history::table.filter(login_history::user_id.eq(employee_id)))
            .execute(conn)?;
        diesel::delete(
            system_commands::table.filter(system_commands::target_user_id.eq(employee_id)),
        )
        .execute(conn)?;
        diesel::update(error_logs::table.filter(error_logs::user_id.eq(employee_id)))
            .set(error_logs::user_id.eq(None::<i32>))
            .execute(conn)?;
        diesel::delete(employees::table.filter(employees::id.eq(employee_id))).execute(conn)?;
        Ok(())
    })?;

    warn!(
        "Employee {} permanently deleted by admin {}",
        employee_id, admin_id
    );
    Ok(())
}

/// Gives every active employee with a zero allowance the default allowance.
///
/// # Returns
/// Number of employees that were fixed
pub fn check_and_fix_vacation_days(
    conn: &mut SqliteConnection,
    default_days: i32,
) -> Result<usize, diesel::result::Error> {
    diesel::update(
        employees::table
            .filter(employees::is_active.eq(true))
            .filter(employees::total_vacation_days.le(0)),
    )
    .set(employees::total_vacation_days.eq(default_days))
    .execute(conn)
}

/// Builds the employee overview visible to `viewer`.
///
/// Admins see every employee that is not hidden; anyone else sees only
/// themself. Each entry carries the unarchived vacations, the live session
/// count and the days used/remaining in `today`'s year.
pub fn load_data_for_user(
    conn: &mut SqliteConnection,
    viewer: &Employee,
    today: NaiveDate,
) -> Result<Vec<EmployeeOverview>, diesel::result::Error> {
    let visible: Vec<Employee> = if viewer.is_admin() {
        employees::table
            .filter(employees::hide.eq(false))
            .order(employees::name.asc())
            .load::<Employee>(conn)?
    } else {
        employees::table
            .filter(employees::id.eq(viewer.id))
            .filter(employees::hide.eq(false))
            .load::<Employee>(conn)?
    };

    let mut overview = Vec::with_capacity(visible.len());
    for employee in visible {
        let employee_vacations = list_unarchived_vacations_for_employee(conn, employee.id)?;
        let active_session_count = active_sessions::table
            .filter(active_sessions::user_id.eq(employee.id))
            .count()
            .get_result::<i64>(conn)?;
        let used_days = employee_vacations
            .iter()
            .filter(|v| v.status == VacationStatus::Approved.as_str() && !v.is_inactive)
            .map(|v| used_days_in_year(v, today.year()))
            .sum::<i64>();
        let remaining_days = i64::from(employee.total_vacation_days) - used_days;

        overview.push(EmployeeOverview {
            employee,
            vacations: employee_vacations
                .into_iter()
                .map(|v| PhasedVacation::new(v, today))
                .collect(),
            active_session_count,
            used_days,
            remaining_days,
        });
    }
    Ok(overview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewVacation, VacationPhase};
    use crate::orm::testing::{insert_test_employee, setup_test_db};

    fn input(name: &str, username: &str) -> EmployeeInput {
        EmployeeInput {
            name: name.to_string(),
            username: username.to_string(),
            password: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_employee_uses_defaults() {
        let mut conn = setup_test_db();
        let employee = insert_employee(&mut conn, input("Jane Roe", "jane"), &VacationConfig::default())
            .expect("insert employee");

        assert_eq!(employee.username, "jane");
        assert_eq!(employee.role, "user");
        assert_eq!(employee.total_vacation_days, 30);
        assert_eq!(employee.max_sessions, 1);
        assert!(employee.is_active);
        assert!(!employee.hide);
        assert!(verify_password("secret", &employee.password_hash));
    }

    #[test]
    fn test_insert_employee_rejects_duplicates() {
        let mut conn = setup_test_db();
        let config = VacationConfig::default();
        let mut first = input("Jane Roe", "jane");
        first.email = Some("jane@example.com".to_string());
        insert_employee(&mut conn, first, &config).expect("insert employee");

        let same_username = insert_employee(&mut conn, input("Other Name", "jane"), &config);
        assert!(matches!(same_username, Err(DataError::Conflict(_))));

        let same_name = insert_employee(&mut conn, input("Jane Roe", "jroe"), &config);
        assert!(matches!(same_name, Err(DataError::Conflict(_))));

        let mut same_email = input("Janet", "janet");
        same_email.email = Some("jane@example.com".to_string());
        assert!(matches!(
            insert_employee(&mut conn, same_email, &config),
            Err(DataError::Conflict(_))
        ));
    }

    #[test]
    fn test_insert_employee_rejects_unknown_role() {
        let mut conn = setup_test_db();
        let mut bad = input("Jane Roe", "jane");
        bad.role = Some("superuser".to_string());
        let result = insert_employee(&mut conn, bad, &VacationConfig::default());
        assert!(matches!(result, Err(DataError::Invalid(_))));
    }

    #[test]
    fn test_login_lookup_skips_inactive() {
        let mut conn = setup_test_db();
        let employee = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        assert!(get_employee_for_login(&mut conn, "jane").unwrap().is_some());

        delete_employee(&mut conn, employee.id).unwrap();
        assert!(get_employee_for_login(&mut conn, "jane").unwrap().is_none());
        assert!(get_employee_by_username(&mut conn, "jane").unwrap().is_some());
    }

    #[test]
    fn test_system_settings_validation() {
        let mut conn = setup_test_db();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        insert_test_employee(&mut conn, "John Doe", "john", "user");

        let mut settings = SystemSettingsUpdate {
            role: "admin".to_string(),
            total_vacation_days: 25,
            max_sessions: 3,
            username: "jane.roe".to_string(),
        };
        let updated = update_employee_system_settings(&mut conn, jane.id, &settings).unwrap();
        assert_eq!(updated.role, "admin");
        assert_eq!(updated.total_vacation_days, 25);
        assert_eq!(updated.max_sessions, 3);
        assert_eq!(updated.username, "jane.roe");

        settings.max_sessions = 0;
        assert!(matches!(
            update_employee_system_settings(&mut conn, jane.id, &settings),
            Err(DataError::Invalid(_))
        ));

        settings.max_sessions = 2;
        settings.username = "john".to_string();
        assert!(matches!(
            update_employee_system_settings(&mut conn, jane.id, &settings),
            Err(DataError::Conflict(_))
        ));
    }

    #[test]
    fn test_change_password_requires_current() {
        let mut conn = setup_test_db();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");

        let wrong = change_password(&mut conn, jane.id, "not-it", "new-secret");
        assert!(matches!(wrong, Err(DataError::WrongPassword)));

        change_password(&mut conn, jane.id, "admin", "new-secret").unwrap();
        let reloaded = get_employee(&mut conn, jane.id).unwrap().unwrap();
        assert!(verify_password("new-secret", &reloaded.password_hash));
    }

    #[test]
    fn test_admin_set_password_missing_employee() {
        let mut conn = setup_test_db();
        let result = admin_set_password(&mut conn, 4242, "whatever");
        assert!(matches!(result, Err(DataError::NotFound(_))));
    }

    #[test]
    fn test_hide_requires_admin_password() {
        let mut conn = setup_test_db();
        let admin = insert_test_employee(&mut conn, "Boss", "boss", "admin");
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");

        let wrong = hide_employee(&mut conn, jane.id, "nope", admin.id);
        assert!(matches!(wrong, Err(DataError::WrongPassword)));

        hide_employee(&mut conn, jane.id, "admin", admin.id).unwrap();
        let hidden = get_hidden_employees(&mut conn).unwrap();
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden[0].id, jane.id);

        unhide_employee(&mut conn, jane.id).unwrap();
        assert!(get_hidden_employees(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_permanent_delete_removes_related_rows() {
        let mut conn = setup_test_db();
        let admin = insert_test_employee(&mut conn, "Boss", "boss", "admin");
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");

        diesel::insert_into(vacations::table)
            .values(&NewVacation {
                employee_id: jane.id,
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
                note: None,
                status: "pending".to_string(),
            })
            .execute(&mut conn)
            .unwrap();

        let own = permanently_delete_employee(&mut conn, admin.id, "admin", admin.id);
        assert!(matches!(own, Err(DataError::Forbidden(_))));

        permanently_delete_employee(&mut conn, jane.id, "admin", admin.id).unwrap();
        assert!(get_employee(&mut conn, jane.id).unwrap().is_none());
        let left: i64 = vacations::table.count().get_result(&mut conn).unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn test_check_and_fix_vacation_days() {
        let mut conn = setup_test_db();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        diesel::update(employees::table.filter(employees::id.eq(jane.id)))
            .set(employees::total_vacation_days.eq(0))
            .execute(&mut conn)
            .unwrap();

        assert_eq!(check_and_fix_vacation_days(&mut conn, 30).unwrap(), 1);
        let fixed = get_employee(&mut conn, jane.id).unwrap().unwrap();
        assert_eq!(fixed.total_vacation_days, 30);
        assert_eq!(check_and_fix_vacation_days(&mut conn, 30).unwrap(), 0);
    }

    #[test]
    fn test_check_and_fix_vacation_days_skips_inactive() {
        let mut conn = setup_test_db();
        let gone = insert_test_employee(&mut conn, "Former", "former", "user");
        diesel::update(employees::table.filter(employees::id.eq(gone.id)))
            .set(employees::total_vacation_days.eq(0))
            .execute(&mut conn)
            .unwrap();
        delete_employee(&mut conn, gone.id).unwrap();

        assert_eq!(check_and_fix_vacation_days(&mut conn, 30).unwrap(), 0);
        let untouched = get_employee(&mut conn, gone.id).unwrap().unwrap();
        assert_eq!(untouched.total_vacation_days, 0);
    }

    #[test]
    fn test_negative_salary_is_rejected() {
        let mut conn = setup_test_db();
        let mut negative = input("Jane Roe", "jane");
        negative.profile.salary = Some(-1.0);
        assert!(matches!(
            insert_employee(&mut conn, negative, &VacationConfig::default()),
            Err(DataError::Invalid(_))
        ));

        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        let update = ProfileUpdate {
            salary: Some(-500.0),
            ..Default::default()
        };
        assert!(matches!(
            update_employee_profile(&mut conn, jane.id, &update),
            Err(DataError::Invalid(_))
        ));

        let update = ProfileUpdate {
            salary: Some(1500.0),
            ..Default::default()
        };
        let updated = update_employee_profile(&mut conn, jane.id, &update).unwrap();
        assert_eq!(updated.salary, Some(1500.0));
    }

    #[test]
    fn test_load_data_for_user_visibility() {
        let mut conn = setup_test_db();
        let admin = insert_test_employee(&mut conn, "Boss", "boss", "admin");
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        let hidden = insert_test_employee(&mut conn, "Ghost", "ghost", "user");
        set_employee_hidden(&mut conn, hidden.id, true).unwrap();

        diesel::insert_into(vacations::table)
            .values(&NewVacation {
                employee_id: jane.id,
                start_date: NaiveDate::from_ymd_opt(2025, 12, 30).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(),
                note: None,
                status: "approved".to_string(),
            })
            .execute(&mut conn)
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let admin_view = load_data_for_user(&mut conn, &admin, today).unwrap();
        let names: Vec<&str> = admin_view.iter().map(|o| o.employee.name.as_str()).collect();
        assert_eq!(names, vec!["Boss", "Jane Roe"]);

        let jane_view = load_data_for_user(&mut conn, &jane, today).unwrap();
        assert_eq!(jane_view.len(), 1);
        let entry = &jane_view[0];
        assert_eq!(entry.vacations.len(), 1);
        assert_eq!(entry.vacations[0].phase, VacationPhase::Finished);
        // Only Jan 1..=3 of the vacation falls into 2026.
        assert_eq!(entry.used_days, 3);
        assert_eq!(entry.remaining_days, 27);
        assert_eq!(entry.active_session_count, 0);

        // A hidden employee sees no overview at all.
        assert!(load_data_for_user(&mut conn, &hidden, today).unwrap().is_empty());
    }
}
