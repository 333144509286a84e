// vacation-admin/src/main.rs

use clap::{Parser, Subcommand};

mod admin_cli;
mod credential_cache;

use admin_cli::employee_commands::{EmployeeAction, handle_employee_command_with_conn};
use admin_cli::offline_commands::{OfflineAction, handle_offline_command_with_conn};
use admin_cli::remote_commands::{RemoteAction, handle_remote_command, server_url};
use admin_cli::system_commands::{SystemAction, handle_system_command_with_conn};
use admin_cli::utils::{establish_connection, establish_offline_connection};
use admin_cli::vacation_commands::{VacationAction, handle_vacation_command_with_conn};
use credential_cache::CredentialCache;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Parser)]
#[command(name = "vacation-admin")]
#[command(about = "Vacation tracker administration tool")]
#[command(version)]
struct Cli {
    /// Show extended version information
    #[arg(long, action = clap::ArgAction::SetTrue)]
    version_info: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Employee management commands")]
    Employee {
        #[command(subcommand)]
        action: EmployeeAction,
    },
    #[command(about = "Vacation request commands")]
    Vacation {
        #[command(subcommand)]
        action: VacationAction,
    },
    #[command(about = "Maintenance mode, sessions and logout commands")]
    System {
        #[command(subcommand)]
        action: SystemAction,
    },
    #[command(about = "Offline login mirror (uses OFFLINE_DATABASE_URL)")]
    Offline {
        #[command(subcommand)]
        action: OfflineAction,
    },
    #[command(about = "Talk to a running server (uses VACATION_SERVER_URL)")]
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },
}

async fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Employee { action } => {
            let mut conn = establish_connection()?;
            handle_employee_command_with_conn(&mut conn, action)
        }
        Commands::Vacation { action } => {
            let mut conn = establish_connection()?;
            handle_vacation_command_with_conn(&mut conn, action)
        }
        Commands::System { action } => {
            let mut conn = establish_connection()?;
            handle_system_command_with_conn(&mut conn, action)
        }
        Commands::Offline { action } => {
            let mut conn = establish_offline_connection()?;
            handle_offline_command_with_conn(&mut conn, action)
        }
        Commands::Remote { action } => {
            dotenvy::dotenv().ok();
            let cache = CredentialCache::from_env()?;
            handle_remote_command(&server_url(), &cache, action).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.version_info {
        println!("vacation-admin {}", built_info::PKG_VERSION);
        println!("Built: {}", built_info::BUILT_TIME_UTC);
        if let Some(commit) = built_info::GIT_COMMIT_HASH {
            println!("Git commit: {}", commit);
        }
        return;
    }

    let Some(command) = cli.command else {
        eprintln!("No command given. Run with --help for usage.");
        std::process::exit(2);
    };

    if let Err(e) = run(command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
