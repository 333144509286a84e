use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::system_commands;

pub const IMMEDIATE_LOGOUT: &str = "IMMEDIATE_LOGOUT";
pub const TIMED_LOGOUT: &str = "TIMED_LOGOUT";

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = system_commands)]
#[ts(export)]
pub struct SystemCommand {
    pub id: i32,
    pub target_user_id: i32,
    pub command_type: String,
    /// For `TIMED_LOGOUT`, the RFC 3339 instant at which the client must log out.
    pub command_value: Option<String>,
    pub is_executed: bool,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = system_commands)]
pub struct NewSystemCommand {
    pub target_user_id: i32,
    pub command_type: String,
    pub command_value: Option<String>,
}
