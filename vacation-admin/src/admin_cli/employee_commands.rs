use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use vacation_api::config::VacationConfig;
use vacation_api::models::{Employee, EmployeeInput, ROLE_USER, SystemSettingsUpdate};
use vacation_api::orm::employee::{
    admin_set_password, delete_employee, get_employee, insert_employee, list_employees,
    set_employee_hidden, update_employee, update_employee_system_settings,
};

use super::utils::{SearchPattern, confirm, prompt_for_password, resolve_employee_id};

#[derive(Subcommand)]
pub enum EmployeeAction {
    #[command(about = "Add a new employee")]
    Add {
        #[arg(short, long, help = "Full name")]
        name: String,
        #[arg(short, long, help = "Login name")]
        username: String,
        #[arg(short, long, help = "Password (will be prompted securely if not provided)")]
        password: Option<String>,
        #[arg(short, long, default_value = ROLE_USER, help = "Role: admin or user")]
        role: String,
        #[arg(long, help = "Vacation days per year (default from configuration)")]
        days: Option<i32>,
        #[arg(long, help = "Maximum concurrent sessions (default from configuration)")]
        max_sessions: Option<i32>,
        #[arg(long, help = "E-mail address")]
        email: Option<String>,
    },
    #[command(about = "List employees, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term matched against name and username (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(short = 'F', long = "fixed-string", help = "Treat search term as fixed string instead of regex")]
        fixed_string: bool,
        #[arg(short, long, help = "Include inactive and hidden employees")]
        all: bool,
    },
    #[command(about = "Deactivate employees matching search term")]
    Rm {
        #[arg(help = "Search term to match employees for deactivation (regex by default, use -F for fixed string)")]
        search_term: String,
        #[arg(short = 'F', long = "fixed-string", help = "Treat search term as fixed string instead of regex")]
        fixed_string: bool,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
    #[command(about = "Edit employee name and allowance")]
    Edit {
        #[arg(help = "Employee ID or username")]
        employee: String,
        #[arg(long, help = "New full name")]
        name: Option<String>,
        #[arg(long, help = "New vacation days per year")]
        days: Option<i32>,
        #[arg(long, help = "New maximum concurrent sessions")]
        max_sessions: Option<i32>,
    },
    #[command(about = "Set an employee's password")]
    ChangePassword {
        #[arg(help = "Employee ID or username")]
        employee: String,
        #[arg(short, long, help = "New password (will be prompted securely if not provided)")]
        password: Option<String>,
    },
    #[command(about = "Set an employee's role")]
    SetRole {
        #[arg(help = "Employee ID or username")]
        employee: String,
        #[arg(help = "Role: admin or user")]
        role: String,
    },
    #[command(about = "Hide an employee from the overview")]
    Hide {
        #[arg(help = "Employee ID or username")]
        employee: String,
    },
    #[command(about = "Show a hidden employee in the overview again")]
    Unhide {
        #[arg(help = "Employee ID or username")]
        employee: String,
    },
}

pub fn handle_employee_command_with_conn(
    conn: &mut SqliteConnection,
    action: EmployeeAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        EmployeeAction::Add {
            name,
            username,
            password,
            role,
            days,
            max_sessions,
            email,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_for_password()?,
            };
            let input = EmployeeInput {
                name,
                username,
                password,
                role: Some(role),
                total_vacation_days: days,
                max_sessions,
                email,
                ..Default::default()
            };
            employee_add_impl(conn, input, &VacationConfig::default())?;
        }
        EmployeeAction::Ls {
            search_term,
            fixed_string,
            all,
        } => {
            employee_ls_impl(conn, search_term, fixed_string, all)?;
        }
        EmployeeAction::Rm {
            search_term,
            fixed_string,
            yes,
        } => {
            employee_rm_impl(conn, &search_term, fixed_string, yes)?;
        }
        EmployeeAction::Edit {
            employee,
            name,
            days,
            max_sessions,
        } => {
            let id = resolve_employee_id(conn, &employee)?;
            employee_edit_impl(conn, id, name, days, max_sessions)?;
        }
        EmployeeAction::ChangePassword { employee, password } => {
            let id = resolve_employee_id(conn, &employee)?;
            let password = match password {
                Some(p) => p,
                None => prompt_for_password()?,
            };
            admin_set_password(conn, id, &password)?;
            println!("Password changed successfully for employee: {}", employee);
        }
        EmployeeAction::SetRole { employee, role } => {
            let id = resolve_employee_id(conn, &employee)?;
            employee_set_role_impl(conn, id, &role)?;
        }
        EmployeeAction::Hide { employee } => {
            let id = resolve_employee_id(conn, &employee)?;
            set_employee_hidden(conn, id, true)?;
            println!("Employee '{}' is now hidden", employee);
        }
        EmployeeAction::Unhide { employee } => {
            let id = resolve_employee_id(conn, &employee)?;
            set_employee_hidden(conn, id, false)?;
            println!("Employee '{}' is visible again", employee);
        }
    }
    Ok(())
}

pub fn employee_add_impl(
    conn: &mut SqliteConnection,
    input: EmployeeInput,
    defaults: &VacationConfig,
) -> Result<Employee, Box<dyn std::error::Error>> {
    let created = insert_employee(conn, input, defaults)?;

    println!("Employee created successfully!");
    println!("ID: {}", created.id);
    println!("Name: {}", created.name);
    println!("Username: {}", created.username);
    println!("Role: {}", created.role);
    println!("Vacation days: {}", created.total_vacation_days);

    Ok(created)
}

fn matching_employees(
    conn: &mut SqliteConnection,
    search_term: Option<&str>,
    fixed_string: bool,
) -> Result<Vec<Employee>, Box<dyn std::error::Error>> {
    let employees = list_employees(conn)?;
    let Some(term) = search_term else {
        return Ok(employees);
    };
    let pattern = SearchPattern::new(term, fixed_string)?;
    Ok(employees
        .into_iter()
        .filter(|e| pattern.is_match(&e.name) || pattern.is_match(&e.username))
        .collect())
}

pub fn employee_ls_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    fixed_string: bool,
    all: bool,
) -> Result<Vec<Employee>, Box<dyn std::error::Error>> {
    let employees: Vec<Employee> = matching_employees(conn, search_term.as_deref(), fixed_string)?
        .into_iter()
        .filter(|e| all || (e.is_active && !e.hide))
        .collect();

    if employees.is_empty() {
        println!("No employees found.");
    } else {
        println!("Employees:");
        for e in &employees {
            let mut flags = Vec::new();
            if !e.is_active {
                flags.push("inactive");
            }
            if e.hide {
                flags.push("hidden");
            }
            println!(
                "  ID: {}, Name: {}, Username: {}, Role: {}, Days: {}, Sessions: {}{}",
                e.id,
                e.name,
                e.username,
                e.role,
                e.total_vacation_days,
                e.max_sessions,
                if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                }
            );
        }
    }

    Ok(employees)
}

/// Deactivates every active employee matching the search term. Returns how
/// many were deactivated.
pub fn employee_rm_impl(
    conn: &mut SqliteConnection,
    search_term: &str,
    fixed_string: bool,
    yes: bool,
) -> Result<usize, Box<dyn std::error::Error>> {
    let matching: Vec<Employee> = matching_employees(conn, Some(search_term), fixed_string)?
        .into_iter()
        .filter(|e| e.is_active)
        .collect();

    if matching.is_empty() {
        println!("No active employees found matching the search term.");
        return Ok(0);
    }

    println!(
        "Found {} employee(s) matching the search term:",
        matching.len()
    );
    for e in &matching {
        println!("  ID: {}, Name: {}, Username: {}", e.id, e.name, e.username);
    }

    if !yes
        && !confirm(&format!(
            "Are you sure you want to deactivate these {} employee(s)?",
            matching.len()
        ))?
    {
        println!("Operation cancelled.");
        return Ok(0);
    }

    let mut deactivated = 0;
    let mut errors = Vec::new();
    for e in matching {
        match delete_employee(conn, e.id) {
            Ok(rows) if rows > 0 => {
                deactivated += 1;
                println!("Deactivated employee: {} (ID: {})", e.username, e.id);
            }
            Ok(_) => {}
            Err(err) => errors.push(format!(
                "Failed to deactivate {} (ID: {}): {}",
                e.username, e.id, err
            )),
        }
    }

    println!("Successfully deactivated {} employee(s).", deactivated);

    if !errors.is_empty() {
        println!("Errors encountered:");
        for error in errors {
            println!("  {}", error);
        }
        return Err("Some deactivations failed".into());
    }

    Ok(deactivated)
}

pub fn employee_edit_impl(
    conn: &mut SqliteConnection,
    employee_id: i32,
    name: Option<String>,
    days: Option<i32>,
    max_sessions: Option<i32>,
) -> Result<(), Box<dyn std::error::Error>> {
    if name.is_none() && days.is_none() && max_sessions.is_none() {
        println!("No fields specified for update. Use --name, --days, or --max-sessions.");
        return Ok(());
    }

    let current = get_employee(conn, employee_id)?
        .ok_or_else(|| format!("Employee with ID {} does not exist", employee_id))?;
    let updated = update_employee(
        conn,
        employee_id,
        name.as_deref().unwrap_or(&current.name),
        days.unwrap_or(current.total_vacation_days),
        max_sessions.unwrap_or(current.max_sessions),
    )?;

    println!("Employee updated successfully!");
    println!("ID: {}", updated.id);
    println!("Name: {}", updated.name);
    println!("Vacation days: {}", updated.total_vacation_days);
    println!("Max sessions: {}", updated.max_sessions);

    Ok(())
}

pub fn employee_set_role_impl(
    conn: &mut SqliteConnection,
    employee_id: i32,
    role: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let current = get_employee(conn, employee_id)?
        .ok_or_else(|| format!("Employee with ID {} does not exist", employee_id))?;
    if current.role == role {
        println!("Employee '{}' already has role '{}'", current.username, role);
        return Ok(());
    }

    let settings = SystemSettingsUpdate {
        role: role.to_string(),
        total_vacation_days: current.total_vacation_days,
        max_sessions: current.max_sessions,
        username: current.username.clone(),
    };
    update_employee_system_settings(conn, employee_id, &settings)?;
    println!("Successfully set role '{}' for employee '{}'", role, current.username);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vacation_api::orm::login::verify_password;
    use vacation_api::orm::testing::{insert_test_employee, setup_test_db};

    #[test]
    fn test_add_uses_configured_defaults() {
        let mut conn = setup_test_db();
        let defaults = VacationConfig {
            default_vacation_days: 25,
            ..Default::default()
        };
        let created = employee_add_impl(
            &mut conn,
            EmployeeInput {
                name: "Erin Green".to_string(),
                username: "erin".to_string(),
                password: "secret".to_string(),
                role: Some(ROLE_USER.to_string()),
                ..Default::default()
            },
            &defaults,
        )
        .unwrap();
        assert_eq!(created.total_vacation_days, 25);
        assert!(verify_password("secret", &created.password_hash));

        let duplicate = employee_add_impl(
            &mut conn,
            EmployeeInput {
                name: "Someone Else".to_string(),
                username: "erin".to_string(),
                password: "secret".to_string(),
                ..Default::default()
            },
            &defaults,
        );
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_ls_filters_by_name_or_username() {
        let mut conn = setup_test_db();
        insert_test_employee(&mut conn, "Alice Smith", "alice", "user");
        insert_test_employee(&mut conn, "Bob Jones", "bjones", "user");
        let hidden = insert_test_employee(&mut conn, "Hidden Person", "hidden", "user");
        set_employee_hidden(&mut conn, hidden.id, true).unwrap();

        let found = employee_ls_impl(&mut conn, Some("^b".to_string()), false, false).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "bjones");

        let found = employee_ls_impl(&mut conn, Some("Smith".to_string()), true, false).unwrap();
        assert_eq!(found.len(), 1);

        assert_eq!(employee_ls_impl(&mut conn, None, false, false).unwrap().len(), 2);
        assert_eq!(employee_ls_impl(&mut conn, None, false, true).unwrap().len(), 3);
    }

    #[test]
    fn test_rm_deactivates_matches() {
        let mut conn = setup_test_db();
        let alice = insert_test_employee(&mut conn, "Alice Smith", "alice", "user");
        let bob = insert_test_employee(&mut conn, "Bob Jones", "bob", "user");

        assert_eq!(employee_rm_impl(&mut conn, "alice", true, true).unwrap(), 1);
        assert!(!get_employee(&mut conn, alice.id).unwrap().unwrap().is_active);
        assert!(get_employee(&mut conn, bob.id).unwrap().unwrap().is_active);

        // Already inactive employees are not matched again.
        assert_eq!(employee_rm_impl(&mut conn, "alice", true, true).unwrap(), 0);
    }

    #[test]
    fn test_edit_keeps_unspecified_fields() {
        let mut conn = setup_test_db();
        let alice = insert_test_employee(&mut conn, "Alice Smith", "alice", "user");

        employee_edit_impl(&mut conn, alice.id, None, Some(12), None).unwrap();
        let updated = get_employee(&mut conn, alice.id).unwrap().unwrap();
        assert_eq!(updated.name, "Alice Smith");
        assert_eq!(updated.total_vacation_days, 12);
        assert_eq!(updated.max_sessions, alice.max_sessions);

        assert!(employee_edit_impl(&mut conn, alice.id, None, None, Some(0)).is_err());
    }

    #[test]
    fn test_set_role() {
        let mut conn = setup_test_db();
        let alice = insert_test_employee(&mut conn, "Alice Smith", "alice", "user");

        employee_set_role_impl(&mut conn, alice.id, "admin").unwrap();
        assert!(get_employee(&mut conn, alice.id).unwrap().unwrap().is_admin());

        assert!(employee_set_role_impl(&mut conn, alice.id, "owner").is_err());
    }
}
