pub mod config;
pub mod timesheet;
