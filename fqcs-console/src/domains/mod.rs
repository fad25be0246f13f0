pub mod auth;
pub mod capture;
pub mod config;
pub mod ui;
