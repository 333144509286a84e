use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::{departments, positions};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = departments)]
#[ts(export)]
pub struct Department {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Deserialize, Serialize, Clone, Debug, TS)]
#[diesel(table_name = departments)]
#[ts(export)]
pub struct DepartmentInput {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = positions)]
#[ts(export)]
pub struct Position {
    pub id: i32,
    pub name: String,
    pub department_id: Option<i32>,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Deserialize, Serialize, Clone, Debug, TS)]
#[diesel(table_name = positions)]
#[ts(export)]
pub struct PositionInput {
    pub name: String,
    pub department_id: Option<i32>,
    pub description: Option<String>,
}

/// Position with the name of its department resolved.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[ts(export)]
pub struct PositionView {
    #[serde(flatten)]
    pub position: Position,
    pub department_name: Option<String>,
}
