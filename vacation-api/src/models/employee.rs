use chrono::{NaiveDate, NaiveDateTime};
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, QueryableByName, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::PhasedVacation;
use crate::schema::employees;

/// Role name stored in `employees.role` for administrators.
pub const ROLE_ADMIN: &str = "admin";
/// Role name stored in `employees.role` for regular employees.
pub const ROLE_USER: &str = "user";

/// Returns true if `role` is one of the two roles the system knows about.
pub fn is_valid_role(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_USER
}

#[derive(
    Queryable, Selectable, Identifiable, QueryableByName, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(table_name = employees)]
#[ts(export)]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: String,
    pub total_vacation_days: i32,
    pub max_sessions: i32,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub father_name: Option<String>,
    pub phone_number: Option<String>,
    #[ts(type = "string | null")]
    pub birth_date: Option<NaiveDate>,
    pub fin_code: Option<String>,
    pub department_id: Option<i32>,
    pub position_id: Option<i32>,
    #[ts(type = "string | null")]
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub is_active: bool,
    pub hide: bool,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

impl Employee {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = employees)]
pub struct NewEmployee {
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub total_vacation_days: i32,
    pub max_sessions: i32,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub father_name: Option<String>,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub fin_code: Option<String>,
    pub department_id: Option<i32>,
    pub position_id: Option<i32>,
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

/// Everything needed to create an employee. The password arrives in clear
/// text and is hashed by the ORM layer; omitted settings fall back to the
/// configured defaults.
#[derive(Deserialize, Serialize, Clone, Debug, Default, TS)]
#[ts(export)]
pub struct EmployeeInput {
    pub name: String,
    pub username: String,
    #[ts(skip)]
    pub password: String,
    pub role: Option<String>,
    pub total_vacation_days: Option<i32>,
    pub max_sessions: Option<i32>,
    pub email: Option<String>,
    #[serde(flatten)]
    pub profile: ProfileUpdate,
}

/// Profile fields an employee may edit about themselves. Only fields that
/// are present are written.
#[derive(AsChangeset, Deserialize, Serialize, Clone, Debug, Default, TS)]
#[diesel(table_name = employees)]
#[ts(export)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub father_name: Option<String>,
    pub phone_number: Option<String>,
    #[ts(type = "string | null")]
    pub birth_date: Option<NaiveDate>,
    pub fin_code: Option<String>,
    pub department_id: Option<i32>,
    pub position_id: Option<i32>,
    #[ts(type = "string | null")]
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.father_name.is_none()
            && self.phone_number.is_none()
            && self.birth_date.is_none()
            && self.fin_code.is_none()
            && self.department_id.is_none()
            && self.position_id.is_none()
            && self.hire_date.is_none()
            && self.salary.is_none()
            && self.address.is_none()
            && self.emergency_contact.is_none()
    }
}

/// Administrative settings of an employee account.
#[derive(Deserialize, Serialize, Clone, Debug, TS)]
#[ts(export)]
pub struct SystemSettingsUpdate {
    pub role: String,
    pub total_vacation_days: i32,
    pub max_sessions: i32,
    pub username: String,
}

/// One row of the employee overview returned by `load_data_for_user`.
#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct EmployeeOverview {
    pub employee: Employee,
    pub vacations: Vec<PhasedVacation>,
    pub active_session_count: i64,
    pub used_days: i64,
    pub remaining_days: i64,
}

/// Employee together with the number of vacations that can be archived.
#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct ArchivableEmployee {
    pub id: i32,
    pub name: String,
    pub archivable_count: i64,
}
