pub mod collector_config;
pub mod error;
