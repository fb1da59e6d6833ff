pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod telemetry;
pub mod test;
pub mod time;
pub mod utils;
