pub mod config;
pub mod logger;
pub mod routes;
