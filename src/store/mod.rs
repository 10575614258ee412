pub mod coverage;
pub mod dataset_store;
pub mod error;
pub mod merge;
