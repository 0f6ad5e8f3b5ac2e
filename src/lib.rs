// Crate root library declaration and module exports.
pub mod admin;
pub mod calendar;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod filter;
pub mod loader;
pub mod model;
pub mod session;
pub mod site;
pub mod storage;
pub mod theme;
pub mod time_utils;
