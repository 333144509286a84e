pub mod employee;
pub mod error_log;
pub mod notification;
pub mod offline;
pub mod organisation;
pub mod session;
pub mod setting;
pub mod system_command;
pub mod vacation;

// Re-export models for easier access
pub use employee::*;
pub use error_log::*;
pub use notification::*;
pub use offline::*;
pub use organisation::*;
pub use session::*;
pub use setting::*;
pub use system_command::*;
pub use vacation::*;
