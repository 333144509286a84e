use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::{active_sessions, login_history};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = active_sessions)]
#[diesel(primary_key(session_id))]
#[ts(export)]
pub struct ActiveSession {
    pub session_id: String, // Opaque session token (UUID v4)
    pub user_id: i32,
    pub history_id: Option<i32>,
    pub ip_address: Option<String>,
    #[ts(type = "string")]
    pub login_time: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = active_sessions)]
pub struct NewActiveSession {
    pub session_id: String,
    pub user_id: i32,
    pub history_id: Option<i32>,
    pub ip_address: Option<String>,
    pub login_time: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = login_history)]
#[ts(export)]
pub struct LoginHistory {
    pub id: i32,
    pub user_id: i32,
    pub ip_address: Option<String>,
    #[ts(type = "string")]
    pub login_time: NaiveDateTime,
    #[ts(type = "string | null")]
    pub logout_time: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = login_history)]
pub struct NewLoginHistory {
    pub user_id: i32,
    pub ip_address: Option<String>,
    pub login_time: NaiveDateTime,
}

/// Number of live sessions held by one employee.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[ts(export)]
pub struct SessionCount {
    pub user_id: i32,
    pub count: i64,
}

/// Live session joined with the employee it belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[ts(export)]
pub struct ActiveUserDetail {
    pub session_id: String,
    pub user_id: i32,
    pub name: String,
    pub username: String,
    pub role: String,
    pub ip_address: Option<String>,
    #[ts(type = "string")]
    pub login_time: NaiveDateTime,
}
