pub mod normalizer;
pub mod skip_reason;
