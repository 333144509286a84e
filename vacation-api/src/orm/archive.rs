//! Year rollover: archiving last year's vacations and resetting allowances.

use std::collections::HashMap;

use chrono::NaiveDate;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::{ArchivableEmployee, VacationStatus};
use crate::orm::error::DataError;
use crate::schema::{employees, vacations};

fn year_start(year: i32) -> Result<NaiveDate, DataError> {
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| DataError::invalid(format!("Invalid year {}", year)))
}

/// Active employees, by name, with the number of approved, unarchived
/// vacations that start before `current_year`.
pub fn get_employees_with_archivable_vacations(
    conn: &mut SqliteConnection,
    current_year: i32,
) -> Result<Vec<ArchivableEmployee>, DataError> {
    let cutoff = year_start(current_year)?;

    let active: Vec<(i32, String)> = employees::table
        .filter(employees::is_active.eq(true))
        .select((employees::id, employees::name))
        .order(employees::name.asc())
        .load(conn)?;

    let counts: HashMap<i32, i64> = vacations::table
        .filter(vacations::status.eq(VacationStatus::Approved.as_str()))
        .filter(vacations::is_archived.eq(false))
        .filter(vacations::start_date.lt(cutoff))
        .group_by(vacations::employee_id)
        .select((vacations::employee_id, count_star()))
        .load::<(i32, i64)>(conn)?
        .into_iter()
        .collect();

    Ok(active
        .into_iter()
        .map(|(id, name)| ArchivableEmployee {
            archivable_count: counts.get(&id).copied().unwrap_or(0),
            id,
            name,
        })
        .collect())
}

/// Summary of a year rollover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewYearSummary {
    pub archived_vacations: usize,
    pub updated_employees: usize,
}

/// Archives the selected employees' approved vacations that start before
/// `current_year` and resets their allowance to `default_days`.
pub fn start_new_vacation_year(
    conn: &mut SqliteConnection,
    employee_ids: &[i32],
    default_days: i32,
    current_year: i32,
) -> Result<NewYearSummary, DataError> {
    if employee_ids.is_empty() {
        return Err(DataError::invalid("No employees selected"));
    }
    if default_days < 0 {
        return Err(DataError::invalid("Vacation days cannot be negative"));
    }
    let cutoff = year_start(current_year)?;

    let summary = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let archived_vacations = diesel::update(
            vacations::table
                .filter(vacations::status.eq(VacationStatus::Approved.as_str()))
                .filter(vacations::start_date.lt(cutoff))
                .filter(vacations::employee_id.eq_any(employee_ids)),
        )
        .set(vacations::is_archived.eq(true))
        .execute(conn)?;

        let updated_employees =
            diesel::update(employees::table.filter(employees::id.eq_any(employee_ids)))
                .set(employees::total_vacation_days.eq(default_days))
                .execute(conn)?;

        Ok(NewYearSummary {
            archived_vacations,
            updated_employees,
        })
    })?;

    info!(
        "New vacation year {}: {} employee(s) reset to {} days, {} vacation(s) archived",
        current_year, summary.updated_employees, default_days, summary.archived_vacations
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::employee::{delete_employee, get_employee};
    use crate::orm::testing::{insert_test_employee, insert_test_vacation, setup_test_db};
    use crate::orm::vacation::{get_vacation, load_archived_vacations_for_year};

    #[test]
    fn test_archivable_counts() {
        let mut conn = setup_test_db();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        let john = insert_test_employee(&mut conn, "John Doe", "john", "user");
        let gone = insert_test_employee(&mut conn, "Zed Gone", "zed", "user");
        delete_employee(&mut conn, gone.id).unwrap();

        insert_test_vacation(&mut conn, jane.id, "2024-06-01", "2024-06-05", "approved");
        insert_test_vacation(&mut conn, jane.id, "2024-07-01", "2024-07-05", "pending");
        insert_test_vacation(&mut conn, jane.id, "2025-01-10", "2025-01-12", "approved");

        let listed = get_employees_with_archivable_vacations(&mut conn, 2025).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, jane.id);
        assert_eq!(listed[0].archivable_count, 1);
        assert_eq!(listed[1].id, john.id);
        assert_eq!(listed[1].archivable_count, 0);
    }

    #[test]
    fn test_start_new_vacation_year() {
        let mut conn = setup_test_db();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        let old = insert_test_vacation(&mut conn, jane.id, "2024-06-01", "2024-06-05", "approved");
        let current = insert_test_vacation(&mut conn, jane.id, "2025-02-01", "2025-02-05", "approved");

        let summary = start_new_vacation_year(&mut conn, &[jane.id], 28, 2025).unwrap();
        assert_eq!(
            summary,
            NewYearSummary {
                archived_vacations: 1,
                updated_employees: 1
            }
        );

        assert!(get_vacation(&mut conn, old.id).unwrap().unwrap().is_archived);
        assert!(!get_vacation(&mut conn, current.id).unwrap().unwrap().is_archived);
        assert_eq!(get_employee(&mut conn, jane.id).unwrap().unwrap().total_vacation_days, 28);

        let archived = load_archived_vacations_for_year(&mut conn, jane.id, 2024).unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, old.id);

        assert!(matches!(
            start_new_vacation_year(&mut conn, &[], 30, 2025),
            Err(DataError::Invalid(_))
        ));
    }
}
