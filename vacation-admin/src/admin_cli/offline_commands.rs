use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use vacation_api::models::OfflineUser;
use vacation_api::orm::offline::{clear_offline_data, get_connection_info, list_offline_users};

use super::utils::confirm;

#[derive(Subcommand)]
pub enum OfflineAction {
    #[command(about = "List employees that can log in while the main database is down")]
    Ls,
    #[command(about = "Remove every mirrored credential and the stored tenant identity")]
    Clear {
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
}

pub fn handle_offline_command_with_conn(
    conn: &mut SqliteConnection,
    action: OfflineAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        OfflineAction::Ls => {
            offline_ls_impl(conn)?;
        }
        OfflineAction::Clear { yes } => {
            if !yes && !confirm("Remove all offline login data?")? {
                println!("Operation cancelled.");
                return Ok(());
            }
            offline_clear_impl(conn)?;
        }
    }
    Ok(())
}

pub fn offline_ls_impl(
    conn: &mut SqliteConnection,
) -> Result<Vec<OfflineUser>, Box<dyn std::error::Error>> {
    match get_connection_info(conn)? {
        Some(info) => println!(
            "Tenant: {}, Company: {}, Last online: {}",
            info.tenant_id.as_deref().unwrap_or("-"),
            info.company_name.as_deref().unwrap_or("-"),
            info.last_online
        ),
        None => println!("No connection info stored."),
    }

    let users = list_offline_users(conn)?;
    if users.is_empty() {
        println!("No offline users.");
    } else {
        println!("Offline users:");
        for u in &users {
            println!(
                "  Username: {}, Name: {}, Role: {}, Employee ID: {}, Last sync: {}",
                u.username, u.name, u.role, u.employee_id, u.last_sync
            );
        }
    }
    Ok(users)
}

/// Returns the number of mirrored users removed.
pub fn offline_clear_impl(
    conn: &mut SqliteConnection,
) -> Result<usize, Box<dyn std::error::Error>> {
    let removed = clear_offline_data(conn)?;
    println!("Removed {} offline user(s) and the connection info.", removed);
    Ok(removed)
}
