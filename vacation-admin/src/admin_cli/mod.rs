pub mod employee_commands;
pub mod offline_commands;
pub mod remote_commands;
pub mod system_commands;
pub mod utils;
pub mod vacation_commands;
