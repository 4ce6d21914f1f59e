pub mod config;
pub mod generator;
pub mod models;
pub mod params;
pub mod parser;
pub mod server;
