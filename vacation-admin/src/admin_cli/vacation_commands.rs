use chrono::{Datelike, Local};
use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use vacation_api::models::{BulkResult, VacationStatus, VacationWithEmployee};
use vacation_api::orm::archive::{
    NewYearSummary, get_employees_with_archivable_vacations, start_new_vacation_year,
};
use vacation_api::orm::bulk::{bulk_delete_vacations, bulk_update_vacation_status};
use vacation_api::orm::employee::get_employee;
use vacation_api::orm::vacation::{
    format_day, get_all_active_vacations, get_pending_vacation_requests,
    list_unarchived_vacations_for_employee,
};

use super::utils::{acting_admin_name, confirm, resolve_employee_id};

#[derive(Subcommand)]
pub enum VacationAction {
    #[command(about = "List vacations (approved by default)")]
    Ls {
        #[arg(short, long, help = "Only this employee (ID or username), all unarchived requests")]
        employee: Option<String>,
        #[arg(short, long, help = "Show pending requests instead")]
        pending: bool,
    },
    #[command(about = "Approve vacation requests")]
    Approve {
        #[arg(required = true, help = "Vacation IDs")]
        ids: Vec<i32>,
    },
    #[command(about = "Reject vacation requests")]
    Reject {
        #[arg(required = true, help = "Vacation IDs")]
        ids: Vec<i32>,
    },
    #[command(about = "Delete vacation requests")]
    Rm {
        #[arg(required = true, help = "Vacation IDs")]
        ids: Vec<i32>,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
    #[command(about = "Archive last year's vacations and reset allowances")]
    ArchiveYear {
        #[arg(help = "Employees (ID or username); defaults to everyone with archivable vacations")]
        employees: Vec<String>,
        #[arg(long, default_value_t = vacation_api::config::DEFAULT_VACATION_DAYS, help = "New yearly allowance")]
        days: i32,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
}

pub fn handle_vacation_command_with_conn(
    conn: &mut SqliteConnection,
    action: VacationAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let admin_name = acting_admin_name();
    match action {
        VacationAction::Ls { employee, pending } => {
            let employee_id = match employee {
                Some(e) => Some(resolve_employee_id(conn, &e)?),
                None => None,
            };
            vacation_ls_impl(conn, employee_id, pending)?;
        }
        VacationAction::Approve { ids } => {
            vacation_set_status_impl(conn, &ids, VacationStatus::Approved, &admin_name)?;
        }
        VacationAction::Reject { ids } => {
            vacation_set_status_impl(conn, &ids, VacationStatus::Rejected, &admin_name)?;
        }
        VacationAction::Rm { ids, yes } => {
            if !yes
                && !confirm(&format!(
                    "Are you sure you want to delete {} vacation(s)?",
                    ids.len()
                ))?
            {
                println!("Operation cancelled.");
                return Ok(());
            }
            let result = bulk_delete_vacations(conn, &ids, &admin_name)?;
            report_bulk("Deleted", &result)?;
        }
        VacationAction::ArchiveYear {
            employees,
            days,
            yes,
        } => {
            let mut ids = Vec::with_capacity(employees.len());
            for e in &employees {
                ids.push(resolve_employee_id(conn, e)?);
            }
            vacation_archive_year_impl(conn, ids, days, Local::now().year(), yes)?;
        }
    }
    Ok(())
}

fn print_vacation(row: &VacationWithEmployee) {
    let v = &row.vacation;
    println!(
        "  ID: {}, Employee: {} (ID: {}), {} - {}, Status: {}{}{}",
        v.id,
        row.employee_name,
        v.employee_id,
        format_day(v.start_date),
        format_day(v.end_date),
        v.status,
        if v.is_inactive { " [inactive]" } else { "" },
        v.note
            .as_deref()
            .map(|n| format!(", Note: {}", n))
            .unwrap_or_default()
    );
}

pub fn vacation_ls_impl(
    conn: &mut SqliteConnection,
    employee_id: Option<i32>,
    pending: bool,
) -> Result<Vec<VacationWithEmployee>, Box<dyn std::error::Error>> {
    let rows = if pending {
        get_pending_vacation_requests(conn, employee_id)?
    } else if let Some(id) = employee_id {
        let name = get_employee(conn, id)?
            .map(|e| e.name)
            .unwrap_or_default();
        list_unarchived_vacations_for_employee(conn, id)?
            .into_iter()
            .map(|vacation| VacationWithEmployee {
                vacation,
                employee_name: name.clone(),
            })
            .collect()
    } else {
        get_all_active_vacations(conn)?
    };

    if rows.is_empty() {
        println!("No vacations found.");
    } else {
        println!("Vacations:");
        for row in &rows {
            print_vacation(row);
        }
    }
    Ok(rows)
}

fn report_bulk(verb: &str, result: &BulkResult) -> Result<(), Box<dyn std::error::Error>> {
    if result.affected_count > 0 {
        println!("{} {} vacation(s).", verb, result.affected_count);
    }
    if !result.errors.is_empty() {
        println!("Errors encountered:");
        for error in &result.errors {
            println!("  {}", error);
        }
    }
    if !result.success {
        return Err("Operation failed".into());
    }
    Ok(())
}

pub fn vacation_set_status_impl(
    conn: &mut SqliteConnection,
    ids: &[i32],
    status: VacationStatus,
    admin_name: &str,
) -> Result<BulkResult, Box<dyn std::error::Error>> {
    let result = bulk_update_vacation_status(conn, ids, status, admin_name)?;
    let verb = match status {
        VacationStatus::Approved => "Approved",
        VacationStatus::Rejected => "Rejected",
        VacationStatus::Pending => "Updated",
    };
    report_bulk(verb, &result)?;
    Ok(result)
}

/// Archives approved vacations that started before `current_year` for the
/// given employees, or for everyone who has some when `employee_ids` is empty.
pub fn vacation_archive_year_impl(
    conn: &mut SqliteConnection,
    employee_ids: Vec<i32>,
    default_days: i32,
    current_year: i32,
    yes: bool,
) -> Result<Option<NewYearSummary>, Box<dyn std::error::Error>> {
    let candidates = get_employees_with_archivable_vacations(conn, current_year)?;
    let selected: Vec<_> = candidates
        .into_iter()
        .filter(|c| {
            if employee_ids.is_empty() {
                c.archivable_count > 0
            } else {
                employee_ids.contains(&c.id)
            }
        })
        .collect();

    if selected.is_empty() {
        println!("No employees with vacations to archive.");
        return Ok(None);
    }

    println!("Employees to roll over into {}:", current_year);
    for c in &selected {
        println!(
            "  ID: {}, Name: {}, Vacations to archive: {}",
            c.id, c.name, c.archivable_count
        );
    }

    if !yes
        && !confirm(&format!(
            "Archive and reset {} employee(s) to {} days?",
            selected.len(),
            default_days
        ))?
    {
        println!("Operation cancelled.");
        return Ok(None);
    }

    let ids: Vec<i32> = selected.iter().map(|c| c.id).collect();
    let summary = start_new_vacation_year(conn, &ids, default_days, current_year)?;
    println!(
        "Archived {} vacation(s), reset {} employee(s).",
        summary.archived_vacations, summary.updated_employees
    );
    Ok(Some(summary))
}
