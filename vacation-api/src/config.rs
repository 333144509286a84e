//! Application settings read from the `vacation` section of the Rocket figment.
//!
//! ```toml
//! [default.vacation]
//! default_vacation_days = 30
//! default_max_sessions = 1
//! tenant_id = "acme"
//! company_name = "Acme Ltd"
//! ```
//!
//! Any key can also be set through the environment, for example
//! `ROCKET_VACATION={default_vacation_days=25}`.

use rocket::fairing::AdHoc;
use serde::Deserialize;

pub const DEFAULT_VACATION_DAYS: i32 = 30;
pub const DEFAULT_MAX_SESSIONS: i32 = 1;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VacationConfig {
    #[serde(default = "default_vacation_days")]
    pub default_vacation_days: i32,
    #[serde(default = "default_max_sessions")]
    pub default_max_sessions: i32,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

fn default_vacation_days() -> i32 {
    DEFAULT_VACATION_DAYS
}

fn default_max_sessions() -> i32 {
    DEFAULT_MAX_SESSIONS
}

impl Default for VacationConfig {
    fn default() -> Self {
        VacationConfig {
            default_vacation_days: DEFAULT_VACATION_DAYS,
            default_max_sessions: DEFAULT_MAX_SESSIONS,
            tenant_id: None,
            company_name: None,
        }
    }
}

/// Extracts `VacationConfig` and places it in managed state. A missing
/// section yields the defaults; a malformed one aborts ignition.
pub fn config_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Vacation Config", |rocket| async {
        let config = match rocket.figment().find_value("vacation") {
            Ok(_) => match rocket.figment().extract_inner::<VacationConfig>("vacation") {
                Ok(config) => config,
                Err(e) => {
                    error!("Invalid [vacation] configuration: {}", e);
                    return Err(rocket);
                }
            },
            Err(_) => VacationConfig::default(),
        };

        info!(
            "Vacation defaults: {} days, {} session(s) per employee",
            config.default_vacation_days, config.default_max_sessions
        );
        Ok(rocket.manage(config))
    })
}
