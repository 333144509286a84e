use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use vacation_api::models::ActiveUserDetail;
use vacation_api::orm::session::{force_remove_sessions_by_user_id, get_active_user_details};
use vacation_api::orm::settings::{get_maintenance_mode, set_maintenance_mode};
use vacation_api::orm::system_command::{
    issue_immediate_logout_command, issue_timed_logout_command,
};

use super::utils::resolve_employee_id;

#[derive(Subcommand)]
pub enum SystemAction {
    #[command(about = "Switch maintenance mode or show its state")]
    Maintenance {
        #[command(subcommand)]
        action: MaintenanceAction,
    },
    #[command(about = "List active sessions")]
    Sessions,
    #[command(about = "Log employees out")]
    Logout {
        #[arg(required = true, help = "Employees (ID or username)")]
        employees: Vec<String>,
        #[arg(short, long, help = "Give the client this many minutes before logging out")]
        minutes: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum MaintenanceAction {
    #[command(about = "Enable maintenance mode and log out every non-admin")]
    On,
    #[command(about = "Disable maintenance mode")]
    Off,
    #[command(about = "Show whether maintenance mode is enabled")]
    Status,
}

pub fn handle_system_command_with_conn(
    conn: &mut SqliteConnection,
    action: SystemAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SystemAction::Maintenance { action } => match action {
            MaintenanceAction::On => {
                maintenance_set_impl(conn, true)?;
            }
            MaintenanceAction::Off => {
                maintenance_set_impl(conn, false)?;
            }
            MaintenanceAction::Status => {
                let enabled = get_maintenance_mode(conn)?;
                println!(
                    "Maintenance mode is {}",
                    if enabled { "enabled" } else { "disabled" }
                );
            }
        },
        SystemAction::Sessions => {
            sessions_impl(conn)?;
        }
        SystemAction::Logout { employees, minutes } => {
            let mut ids = Vec::with_capacity(employees.len());
            for e in &employees {
                ids.push(resolve_employee_id(conn, e)?);
            }
            logout_impl(conn, &ids, minutes)?;
        }
    }
    Ok(())
}

/// Returns the IDs that were logged out by enabling.
pub fn maintenance_set_impl(
    conn: &mut SqliteConnection,
    enabled: bool,
) -> Result<Vec<i32>, Box<dyn std::error::Error>> {
    let logged_out = set_maintenance_mode(conn, enabled)?;
    if enabled {
        println!("Maintenance mode enabled.");
        if !logged_out.is_empty() {
            println!(
                "Logged out {} employee(s): {:?}",
                logged_out.len(),
                logged_out
            );
        }
    } else {
        println!("Maintenance mode disabled.");
    }
    Ok(logged_out)
}

pub fn sessions_impl(
    conn: &mut SqliteConnection,
) -> Result<Vec<ActiveUserDetail>, Box<dyn std::error::Error>> {
    let sessions = get_active_user_details(conn)?;
    if sessions.is_empty() {
        println!("No active sessions.");
    } else {
        println!("Active sessions:");
        for s in &sessions {
            println!(
                "  User: {} ({}, ID: {}), Role: {}, IP: {}, Since: {}",
                s.name,
                s.username,
                s.user_id,
                s.role,
                s.ip_address.as_deref().unwrap_or("-"),
                s.login_time
            );
        }
    }
    Ok(sessions)
}

/// With `minutes`, issues a timed logout and leaves the sessions alone until
/// the client acts on it. Without, issues an immediate logout and drops the
/// sessions right away.
pub fn logout_impl(
    conn: &mut SqliteConnection,
    user_ids: &[i32],
    minutes: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    match minutes {
        Some(minutes) => {
            let issued = issue_timed_logout_command(conn, user_ids, minutes)?;
            println!(
                "Issued {} timed logout command(s) ({} minute(s)).",
                issued, minutes
            );
        }
        None => {
            let issued = issue_immediate_logout_command(conn, user_ids)?;
            let removed = force_remove_sessions_by_user_id(conn, user_ids)?;
            println!(
                "Issued {} logout command(s), removed {} session(s).",
                issued, removed
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vacation_api::orm::session::{count_active_sessions, create_session};
    use vacation_api::orm::system_command::get_pending_command;
    use vacation_api::orm::testing::{insert_test_employee, setup_test_db};

    #[test]
    fn test_maintenance_logs_out_non_admins() {
        let mut conn = setup_test_db();
        let admin = insert_test_employee(&mut conn, "Maria Manager", "manager", "admin");
        let alice = insert_test_employee(&mut conn, "Alice Smith", "alice", "user");
        create_session(&mut conn, admin.id, None).unwrap();
        create_session(&mut conn, alice.id, None).unwrap();

        let logged_out = maintenance_set_impl(&mut conn, true).unwrap();
        assert_eq!(logged_out, vec![alice.id]);
        assert!(get_maintenance_mode(&mut conn).unwrap());
        assert_eq!(count_active_sessions(&mut conn, alice.id).unwrap(), 0);
        assert_eq!(count_active_sessions(&mut conn, admin.id).unwrap(), 1);

        assert!(maintenance_set_impl(&mut conn, false).unwrap().is_empty());
        assert!(!get_maintenance_mode(&mut conn).unwrap());
    }

    #[test]
    fn test_logout_immediate_and_timed() {
        let mut conn = setup_test_db();
        let alice = insert_test_employee(&mut conn, "Alice Smith", "alice", "user");
        let bob = insert_test_employee(&mut conn, "Bob Jones", "bob", "user");
        create_session(&mut conn, alice.id, Some("10.0.0.1".to_string())).unwrap();
        create_session(&mut conn, bob.id, None).unwrap();
        assert_eq!(sessions_impl(&mut conn).unwrap().len(), 2);

        logout_impl(&mut conn, &[alice.id], None).unwrap();
        assert_eq!(count_active_sessions(&mut conn, alice.id).unwrap(), 0);
        assert_eq!(
            get_pending_command(&mut conn, alice.id).unwrap().unwrap().command_type,
            "IMMEDIATE_LOGOUT"
        );

        logout_impl(&mut conn, &[bob.id], Some(10)).unwrap();
        assert_eq!(count_active_sessions(&mut conn, bob.id).unwrap(), 1);
        assert_eq!(
            get_pending_command(&mut conn, bob.id).unwrap().unwrap().command_type,
            "TIMED_LOGOUT"
        );

        assert!(logout_impl(&mut conn, &[bob.id], Some(0)).is_err());
    }
}
