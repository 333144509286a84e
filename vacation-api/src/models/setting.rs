use diesel::{Insertable, Queryable, Selectable};

use crate::schema::app_settings;

pub const MAINTENANCE_MODE_KEY: &str = "maintenance_mode";

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = app_settings)]
pub struct AppSetting {
    pub setting_key: String,
    pub setting_value: String,
}
