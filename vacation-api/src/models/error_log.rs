use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::error_logs;

pub const ERROR_STATUS_NEW: &str = "new";
pub const ERROR_STATUS_RESOLVED: &str = "resolved";

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = error_logs)]
#[ts(export)]
pub struct ErrorLog {
    pub id: i32,
    pub user_id: Option<i32>,
    pub traceback_text: String,
    pub status: String,
    #[ts(type = "string")]
    pub error_timestamp: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = error_logs)]
pub struct NewErrorLog {
    pub user_id: Option<i32>,
    pub traceback_text: String,
}

/// Error log entry with the reporting employee's username.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[ts(export)]
pub struct ErrorLogView {
    #[serde(flatten)]
    pub entry: ErrorLog,
    pub username: Option<String>,
}
