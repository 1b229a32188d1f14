pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod membership;
pub mod models;
pub mod reader;
pub mod routes;
pub mod schema;
pub mod state;
pub mod types;
