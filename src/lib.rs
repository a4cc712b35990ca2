pub mod admin;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod logging;
pub mod models;
pub mod notify;
pub mod router;
pub mod services;
pub mod validation;
