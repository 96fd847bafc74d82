pub mod client;
pub mod config;
pub mod database;
pub mod errors;
pub mod model;
pub mod server;
pub mod services;
pub mod store;
