use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::notifications;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = notifications)]
#[ts(export)]
pub struct Notification {
    pub id: i32,
    pub recipient_id: i32,
    pub message: String,
    pub related_vacation_id: Option<i32>,
    pub is_read: bool,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub recipient_id: i32,
    pub message: String,
    pub related_vacation_id: Option<i32>,
}

/// Notification plus the employee that owns the related vacation, if any.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[ts(export)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub vacation_employee_id: Option<i32>,
}
