pub mod config;
pub mod error;
pub mod portal;
pub mod reports;
pub mod telemetry;
