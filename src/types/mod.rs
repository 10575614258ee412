pub mod location_map;
pub mod observation;
pub mod raw_record;
pub mod timestamp;
