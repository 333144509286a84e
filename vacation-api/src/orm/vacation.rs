//! Database operations for vacation requests.
//!
//! Every admin-side change notifies the owning employee in the same
//! transaction as the change itself.

use chrono::{Datelike, NaiveDate};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::models::{
    Employee, NewVacation, Vacation, VacationInput, VacationStatus, VacationWithEmployee,
    inclusive_days,
};
use crate::orm::employee::{get_employee, list_admin_ids};
use crate::orm::error::DataError;
use crate::orm::notification::{notify, notify_many};
use crate::schema::{employees, notifications, vacations};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Dates as they appear in notification texts.
pub fn format_day(day: NaiveDate) -> String {
    day.format("%d.%m.%Y").to_string()
}

pub(crate) fn new_request_message(employee_name: &str) -> String {
    format!(
        "Employee '{}' submitted a new vacation request.",
        employee_name
    )
}

pub(crate) fn status_message(admin_name: &str, vacation: &Vacation, status: VacationStatus) -> String {
    format!(
        "Admin '{}' set your {} - {} request to '{}'.",
        admin_name,
        format_day(vacation.start_date),
        format_day(vacation.end_date),
        status
    )
}

pub(crate) fn deleted_message(admin_name: &str, vacation: &Vacation) -> String {
    format!(
        "Admin '{}' deleted your {} - {} request.",
        admin_name,
        format_day(vacation.start_date),
        format_day(vacation.end_date)
    )
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), DataError> {
    if end < start {
        return Err(DataError::invalid("End date must not be before start date"));
    }
    Ok(())
}

fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

pub fn get_vacation(
    conn: &mut SqliteConnection,
    vacation_id: i32,
) -> Result<Option<Vacation>, diesel::result::Error> {
    vacations::table
        .filter(vacations::id.eq(vacation_id))
        .first::<Vacation>(conn)
        .optional()
}

fn require_vacation(conn: &mut SqliteConnection, vacation_id: i32) -> Result<Vacation, DataError> {
    get_vacation(conn, vacation_id)?.ok_or(DataError::NotFound("Vacation"))
}

/// Files a vacation request.
///
/// Admins may file for anyone and their requests are approved at once.
/// Everyone else files for themself; the request stays pending and every
/// active admin is notified.
///
/// # Returns
/// * `Ok(Vacation)` - The stored request
/// * `Err(DataError::Invalid)` - End date before start date
/// * `Err(DataError::Forbidden)` - A regular employee filed for someone else
/// * `Err(DataError::NotFound)` - Target employee does not exist
pub fn add_vacation(
    conn: &mut SqliteConnection,
    requester: &Employee,
    input: VacationInput,
) -> Result<Vacation, DataError> {
    validate_range(input.start_date, input.end_date)?;

    let employee_id = input.employee_id.unwrap_or(requester.id);
    if employee_id != requester.id && !requester.is_admin() {
        return Err(DataError::forbidden(
            "You can only request vacation for yourself",
        ));
    }
    let owner = get_employee(conn, employee_id)?.ok_or(DataError::NotFound("Employee"))?;

    let status = if requester.is_admin() {
        VacationStatus::Approved
    } else {
        VacationStatus::Pending
    };

    let vacation = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::insert_into(vacations::table)
            .values(&NewVacation {
                employee_id,
                start_date: input.start_date,
                end_date: input.end_date,
                note: clean_note(input.note),
                status: status.as_str().to_string(),
            })
            .execute(conn)?;

        let last_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
            .get_result::<LastInsertRowId>(conn)?
            .last_insert_rowid as i32;

        if status == VacationStatus::Pending {
            let admins = list_admin_ids(conn)?;
            notify_many(conn, &admins, &new_request_message(&owner.name), Some(last_id))?;
        }

        vacations::table
            .filter(vacations::id.eq(last_id))
            .first::<Vacation>(conn)
    })?;

    info!(
        "Vacation {} filed for employee {} ({} - {}, {})",
        vacation.id, employee_id, vacation.start_date, vacation.end_date, vacation.status
    );
    Ok(vacation)
}

/// Changes dates and note of a request and tells the owner.
pub fn update_vacation(
    conn: &mut SqliteConnection,
    vacation_id: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    note: Option<String>,
    admin_name: &str,
) -> Result<Vacation, DataError> {
    validate_range(start_date, end_date)?;
    let existing = require_vacation(conn, vacation_id)?;

    let updated = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::update(vacations::table.filter(vacations::id.eq(vacation_id)))
            .set((
                vacations::start_date.eq(start_date),
                vacations::end_date.eq(end_date),
                vacations::note.eq(clean_note(note)),
            ))
            .execute(conn)?;
        let message = format!(
            "Admin '{}' changed your vacation request starting {}.",
            admin_name,
            format_day(existing.start_date)
        );
        notify(conn, existing.employee_id, &message, Some(vacation_id))?;
        vacations::table
            .filter(vacations::id.eq(vacation_id))
            .first::<Vacation>(conn)
    })?;
    Ok(updated)
}

/// Approves or rejects a request and tells the owner.
pub fn update_vacation_status(
    conn: &mut SqliteConnection,
    vacation_id: i32,
    status: VacationStatus,
    admin_name: &str,
) -> Result<Vacation, DataError> {
    if status == VacationStatus::Pending {
        return Err(DataError::invalid("Status must be 'approved' or 'rejected'"));
    }
    let existing = require_vacation(conn, vacation_id)?;

    let updated = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::update(vacations::table.filter(vacations::id.eq(vacation_id)))
            .set(vacations::status.eq(status.as_str()))
            .execute(conn)?;
        notify(
            conn,
            existing.employee_id,
            &status_message(admin_name, &existing, status),
            Some(vacation_id),
        )?;
        vacations::table
            .filter(vacations::id.eq(vacation_id))
            .first::<Vacation>(conn)
    })?;

    info!("Vacation {} set to {} by '{}'", vacation_id, status, admin_name);
    Ok(updated)
}

/// Deletes a request. The owner's notification carries no vacation link,
/// and notifications that pointed at the request lose theirs.
pub fn delete_vacation(
    conn: &mut SqliteConnection,
    vacation_id: i32,
    admin_name: &str,
) -> Result<(), DataError> {
    let existing = require_vacation(conn, vacation_id)?;

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::update(
            notifications::table.filter(notifications::related_vacation_id.eq(vacation_id)),
        )
        .set(notifications::related_vacation_id.eq(None::<i32>))
        .execute(conn)?;
        diesel::delete(vacations::table.filter(vacations::id.eq(vacation_id))).execute(conn)?;
        notify(
            conn,
            existing.employee_id,
            &deleted_message(admin_name, &existing),
            None,
        )?;
        Ok(())
    })?;

    info!("Vacation {} deleted by '{}'", vacation_id, admin_name);
    Ok(())
}

/// Marks an approved vacation inactive (or active again) and tells the owner.
pub fn toggle_vacation_activity(
    conn: &mut SqliteConnection,
    vacation_id: i32,
    is_inactive: bool,
    admin_name: &str,
) -> Result<Vacation, DataError> {
    let existing = require_vacation(conn, vacation_id)?;

    let updated = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::update(vacations::table.filter(vacations::id.eq(vacation_id)))
            .set(vacations::is_inactive.eq(is_inactive))
            .execute(conn)?;
        let message = format!(
            "Admin '{}' marked your approved vacation starting {} as {}.",
            admin_name,
            format_day(existing.start_date),
            if is_inactive { "inactive" } else { "active" }
        );
        notify(conn, existing.employee_id, &message, Some(vacation_id))?;
        vacations::table
            .filter(vacations::id.eq(vacation_id))
            .first::<Vacation>(conn)
    })?;
    Ok(updated)
}

fn with_names(rows: Vec<(Vacation, String)>) -> Vec<VacationWithEmployee> {
    rows.into_iter()
        .map(|(vacation, employee_name)| VacationWithEmployee {
            vacation,
            employee_name,
        })
        .collect()
}

/// Approved vacations that are neither archived nor inactive.
pub fn get_all_active_vacations(
    conn: &mut SqliteConnection,
) -> Result<Vec<VacationWithEmployee>, diesel::result::Error> {
    let rows = vacations::table
        .inner_join(employees::table)
        .filter(vacations::status.eq(VacationStatus::Approved.as_str()))
        .filter(vacations::is_archived.eq(false))
        .filter(vacations::is_inactive.eq(false))
        .select((Vacation::as_select(), employees::name))
        .order((vacations::start_date.asc(), vacations::id.asc()))
        .load::<(Vacation, String)>(conn)?;
    Ok(with_names(rows))
}

/// Pending requests, oldest first, optionally for a single employee.
pub fn get_pending_vacation_requests(
    conn: &mut SqliteConnection,
    employee_id: Option<i32>,
) -> Result<Vec<VacationWithEmployee>, diesel::result::Error> {
    let mut query = vacations::table
        .inner_join(employees::table)
        .filter(vacations::status.eq(VacationStatus::Pending.as_str()))
        .select((Vacation::as_select(), employees::name))
        .into_boxed();
    if let Some(id) = employee_id {
        query = query.filter(vacations::employee_id.eq(id));
    }
    let rows = query
        .order((vacations::created_at.asc(), vacations::id.asc()))
        .load::<(Vacation, String)>(conn)?;
    Ok(with_names(rows))
}

/// Archived vacations of one employee that start in `year`.
pub fn load_archived_vacations_for_year(
    conn: &mut SqliteConnection,
    employee_id: i32,
    year: i32,
) -> Result<Vec<Vacation>, diesel::result::Error> {
    let (Some(first), Some(last)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return Ok(Vec::new());
    };
    vacations::table
        .filter(vacations::employee_id.eq(employee_id))
        .filter(vacations::is_archived.eq(true))
        .filter(vacations::start_date.between(first, last))
        .order(vacations::start_date.asc())
        .load::<Vacation>(conn)
}

pub fn list_unarchived_vacations_for_employee(
    conn: &mut SqliteConnection,
    employee_id: i32,
) -> Result<Vec<Vacation>, diesel::result::Error> {
    vacations::table
        .filter(vacations::employee_id.eq(employee_id))
        .filter(vacations::is_archived.eq(false))
        .order(vacations::start_date.asc())
        .load::<Vacation>(conn)
}

/// Days of `vacation` that fall into `year`, both ends included.
pub fn used_days_in_year(vacation: &Vacation, year: i32) -> i64 {
    let (Some(first), Some(last)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return 0;
    };
    if vacation.end_date.year() < year || vacation.start_date.year() > year {
        return 0;
    }
    inclusive_days(vacation.start_date.max(first), vacation.end_date.min(last))
}
