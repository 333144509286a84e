pub mod archive;
pub mod bulk;
mod db;
pub mod employee;
pub mod error;
pub mod error_log;
pub mod login;
pub mod logout;
pub mod notification;
pub mod offline;
pub mod organisation;
pub mod session;
pub mod settings;
pub mod system_command;
#[cfg(feature = "test-staging")]
pub mod testing;
pub mod vacation;

pub use db::*;
pub use offline::OfflineDbConn;
