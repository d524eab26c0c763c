pub mod api;
pub mod app;
pub mod config;
pub mod engine;
pub mod forms;
pub mod logging;
pub mod notifications;
pub mod poller;
pub mod session;
pub mod tui;
