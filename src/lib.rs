pub mod app;
pub mod client;
pub mod config;
pub mod conversation;
pub mod handler;
pub mod tui;
pub mod ui;
