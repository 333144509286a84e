use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::offline_schema::{connection_info, offline_users};

/// Last known credentials of an employee, kept for offline authentication.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = offline_users)]
#[ts(export)]
pub struct OfflineUser {
    pub username: String,
    pub employee_id: i32,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
    #[ts(type = "string")]
    pub last_sync: NaiveDateTime,
}

/// Tenant identity the server last talked to. The connection string itself
/// is never persisted.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[diesel(table_name = connection_info)]
#[ts(export)]
pub struct ConnectionInfo {
    pub id: i32,
    pub tenant_id: Option<String>,
    pub company_name: Option<String>,
    #[ts(type = "string")]
    pub last_online: NaiveDateTime,
}
