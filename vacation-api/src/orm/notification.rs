//! Per-employee notifications about vacation changes.

use diesel::prelude::*;

use crate::models::{NewNotification, Notification, NotificationView};
use crate::schema::{notifications, vacations};

/// Writes one notification.
pub fn notify(
    conn: &mut SqliteConnection,
    recipient_id: i32,
    message: &str,
    related_vacation_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    diesel::insert_into(notifications::table)
        .values(&NewNotification {
            recipient_id,
            message: message.to_string(),
            related_vacation_id,
        })
        .execute(conn)
}

/// Writes the same message to several recipients.
pub fn notify_many(
    conn: &mut SqliteConnection,
    recipient_ids: &[i32],
    message: &str,
    related_vacation_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    let rows: Vec<NewNotification> = recipient_ids
        .iter()
        .map(|recipient_id| NewNotification {
            recipient_id: *recipient_id,
            message: message.to_string(),
            related_vacation_id,
        })
        .collect();
    if rows.is_empty() {
        return Ok(0);
    }
    diesel::insert_into(notifications::table)
        .values(&rows)
        .execute(conn)
}

pub fn get_unread_count(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<i64, diesel::result::Error> {
    notifications::table
        .filter(notifications::recipient_id.eq(user_id))
        .filter(notifications::is_read.eq(false))
        .count()
        .get_result(conn)
}

/// All notifications of an employee, newest first, with the owner of the
/// related vacation when it still exists.
pub fn get_all_notifications(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Vec<NotificationView>, diesel::result::Error> {
    let rows: Vec<(Notification, Option<i32>)> = notifications::table
        .left_join(vacations::table)
        .filter(notifications::recipient_id.eq(user_id))
        .select((Notification::as_select(), vacations::employee_id.nullable()))
        .order((notifications::created_at.desc(), notifications::id.desc()))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(notification, vacation_employee_id)| NotificationView {
            notification,
            vacation_employee_id,
        })
        .collect())
}

/// Marks the given notifications read. Rows of other employees are left
/// alone; an empty list is a no-op.
pub fn mark_notifications_as_read(
    conn: &mut SqliteConnection,
    user_id: i32,
    ids: &[i32],
) -> Result<usize, diesel::result::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    diesel::update(
        notifications::table
            .filter(notifications::recipient_id.eq(user_id))
            .filter(notifications::id.eq_any(ids)),
    )
    .set(notifications::is_read.eq(true))
    .execute(conn)
}

/// Deletes the given notifications of `user_id`; an empty list is a no-op.
pub fn delete_notifications(
    conn: &mut SqliteConnection,
    user_id: i32,
    ids: &[i32],
) -> Result<usize, diesel::result::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    diesel::delete(
        notifications::table
            .filter(notifications::recipient_id.eq(user_id))
            .filter(notifications::id.eq_any(ids)),
    )
    .execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::{insert_test_employee, insert_test_vacation, setup_test_db};

    #[test]
    fn test_unread_count_and_listing() {
        let mut conn = setup_test_db();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        let vacation = insert_test_vacation(&mut conn, jane.id, "2025-07-01", "2025-07-10", "pending");

        notify(&mut conn, jane.id, "first", None).unwrap();
        notify(&mut conn, jane.id, "second", Some(vacation.id)).unwrap();
        assert_eq!(get_unread_count(&mut conn, jane.id).unwrap(), 2);

        let listed = get_all_notifications(&mut conn, jane.id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].notification.message, "second");
        assert_eq!(listed[0].vacation_employee_id, Some(jane.id));
        assert_eq!(listed[1].vacation_employee_id, None);
    }

    #[test]
    fn test_mark_and_delete_touch_only_own_rows() {
        let mut conn = setup_test_db();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        let john = insert_test_employee(&mut conn, "John Doe", "john", "user");
        notify_many(&mut conn, &[jane.id, john.id], "hello", None).unwrap();

        let janes: Vec<i32> = get_all_notifications(&mut conn, jane.id)
            .unwrap()
            .iter()
            .map(|n| n.notification.id)
            .collect();
        let johns: Vec<i32> = get_all_notifications(&mut conn, john.id)
            .unwrap()
            .iter()
            .map(|n| n.notification.id)
            .collect();

        assert_eq!(mark_notifications_as_read(&mut conn, jane.id, &johns).unwrap(), 0);
        assert_eq!(mark_notifications_as_read(&mut conn, jane.id, &janes).unwrap(), 1);
        assert_eq!(get_unread_count(&mut conn, jane.id).unwrap(), 0);
        assert_eq!(get_unread_count(&mut conn, john.id).unwrap(), 1);

        assert_eq!(mark_notifications_as_read(&mut conn, jane.id, &[]).unwrap(), 0);
        assert_eq!(delete_notifications(&mut conn, jane.id, &johns).unwrap(), 0);
        assert_eq!(delete_notifications(&mut conn, john.id, &johns).unwrap(), 1);
        assert!(get_all_notifications(&mut conn, john.id).unwrap().is_empty());
    }
}
