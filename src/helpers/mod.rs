pub mod auth;
pub mod browser;
pub mod discord;
pub mod fake;
pub mod punch_form;
pub mod scanner;
pub mod webdriver;
