pub mod error;
pub mod open_data_hub;
pub mod parking_source;
