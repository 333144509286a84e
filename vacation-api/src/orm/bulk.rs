//! Batched vacation changes.
//!
//! Each operation is one `DELETE`/`UPDATE` over all selected rows followed by
//! one notification per affected vacation, inside a single transaction.

use diesel::prelude::*;

use crate::models::{BulkResult, NewNotification, Vacation, VacationStatus};
use crate::orm::vacation::{deleted_message, status_message};
use crate::schema::{notifications, vacations};

fn load_selected(
    conn: &mut SqliteConnection,
    ids: &[i32],
) -> Result<Vec<Vacation>, diesel::result::Error> {
    vacations::table
        .filter(vacations::id.eq_any(ids))
        .order(vacations::id.asc())
        .load::<Vacation>(conn)
}

fn missing_ids(ids: &[i32], found: &[Vacation]) -> Vec<String> {
    ids.iter()
        .filter(|id| !found.iter().any(|v| v.id == **id))
        .map(|id| format!("Vacation {} not found", id))
        .collect()
}

/// Deletes every listed vacation and notifies each owner.
///
/// An empty list, or a list where none of the IDs exist, is a failure.
/// IDs that do not exist are reported in `errors` while the rest proceed.
pub fn bulk_delete_vacations(
    conn: &mut SqliteConnection,
    ids: &[i32],
    admin_name: &str,
) -> Result<BulkResult, diesel::result::Error> {
    if ids.is_empty() {
        return Ok(BulkResult::failed("No vacations selected"));
    }

    conn.transaction(|conn| {
        let found = load_selected(conn, ids)?;
        if found.is_empty() {
            return Ok(BulkResult::failed("No matching vacations found"));
        }
        let found_ids: Vec<i32> = found.iter().map(|v| v.id).collect();

        diesel::update(
            notifications::table.filter(notifications::related_vacation_id.eq_any(&found_ids)),
        )
        .set(notifications::related_vacation_id.eq(None::<i32>))
        .execute(conn)?;

        let affected_count =
            diesel::delete(vacations::table.filter(vacations::id.eq_any(&found_ids)))
                .execute(conn)?;

        let rows: Vec<NewNotification> = found
            .iter()
            .map(|v| NewNotification {
                recipient_id: v.employee_id,
                message: deleted_message(admin_name, v),
                related_vacation_id: None,
            })
            .collect();
        diesel::insert_into(notifications::table)
            .values(&rows)
            .execute(conn)?;

        info!(
            "Bulk delete by '{}': {} vacation(s) removed",
            admin_name, affected_count
        );
        Ok(BulkResult {
            success: true,
            affected_count,
            errors: missing_ids(ids, &found),
        })
    })
}

/// Sets the status of every listed vacation and notifies each owner.
pub fn bulk_update_vacation_status(
    conn: &mut SqliteConnection,
    ids: &[i32],
    status: VacationStatus,
    admin_name: &str,
) -> Result<BulkResult, diesel::result::Error> {
    if ids.is_empty() {
        return Ok(BulkResult::failed("No vacations selected"));
    }
    if status == VacationStatus::Pending {
        return Ok(BulkResult::failed("Status must be 'approved' or 'rejected'"));
    }

    conn.transaction(|conn| {
        let found = load_selected(conn, ids)?;
        if found.is_empty() {
            return Ok(BulkResult::failed("No matching vacations found"));
        }
        let found_ids: Vec<i32> = found.iter().map(|v| v.id).collect();

        let affected_count =
            diesel::update(vacations::table.filter(vacations::id.eq_any(&found_ids)))
                .set(vacations::status.eq(status.as_str()))
                .execute(conn)?;

        let rows: Vec<NewNotification> = found
            .iter()
            .map(|v| NewNotification {
                recipient_id: v.employee_id,
                message: status_message(admin_name, v, status),
                related_vacation_id: Some(v.id),
            })
            .collect();
        diesel::insert_into(notifications::table)
            .values(&rows)
            .execute(conn)?;

        info!(
            "Bulk status update by '{}': {} vacation(s) set to {}",
            admin_name, affected_count, status
        );
        Ok(BulkResult {
            success: true,
            affected_count,
            errors: missing_ids(ids, &found),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::notification::get_all_notifications;
    use crate::orm::testing::{insert_test_employee, insert_test_vacation, setup_test_db};
    use crate::orm::vacation::get_vacation;

    #[test]
    fn test_empty_selection_fails() {
        let mut conn = setup_test_db();
        let result = bulk_delete_vacations(&mut conn, &[], "Boss").unwrap();
        assert!(!result.success);
        assert_eq!(result.affected_count, 0);

        let result = bulk_update_vacation_status(&mut conn, &[999], VacationStatus::Approved, "Boss")
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.errors, vec!["No matching vacations found".to_string()]);
    }

    #[test]
    fn test_bulk_delete_notifies_each_owner() {
        let mut conn = setup_test_db();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        let john = insert_test_employee(&mut conn, "John Doe", "john", "user");
        let a = insert_test_vacation(&mut conn, jane.id, "2025-02-01", "2025-02-02", "pending");
        let b = insert_test_vacation(&mut conn, john.id, "2025-02-03", "2025-02-04", "approved");

        let result = bulk_delete_vacations(&mut conn, &[a.id, b.id, 4242], "Boss").unwrap();
        assert!(result.success);
        assert_eq!(result.affected_count, 2);
        assert_eq!(result.errors, vec!["Vacation 4242 not found".to_string()]);

        assert!(get_vacation(&mut conn, a.id).unwrap().is_none());
        assert!(get_vacation(&mut conn, b.id).unwrap().is_none());
        for id in [jane.id, john.id] {
            let inbox = get_all_notifications(&mut conn, id).unwrap();
            assert_eq!(inbox.len(), 1);
            assert!(inbox[0].notification.related_vacation_id.is_none());
        }
    }

    #[test]
    fn test_bulk_status_update() {
        let mut conn = setup_test_db();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        let a = insert_test_vacation(&mut conn, jane.id, "2025-02-01", "2025-02-02", "pending");
        let b = insert_test_vacation(&mut conn, jane.id, "2025-02-10", "2025-02-12", "pending");

        let result =
            bulk_update_vacation_status(&mut conn, &[a.id, b.id], VacationStatus::Approved, "Boss")
                .unwrap();
        assert!(result.success);
        assert_eq!(result.affected_count, 2);
        assert!(result.errors.is_empty());

        assert_eq!(get_vacation(&mut conn, a.id).unwrap().unwrap().status, "approved");
        let inbox = get_all_notifications(&mut conn, jane.id).unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(inbox.iter().all(|n| n.notification.related_vacation_id.is_some()));
    }
}
