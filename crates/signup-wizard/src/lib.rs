pub mod accounts;
pub mod clients;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod wizard;
