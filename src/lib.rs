pub mod agent;
pub mod api;
pub mod bridge;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod json;
pub mod logs;
pub mod models;
pub mod tools;
pub mod ui;
