mod age_range;
mod location_id;

pub use age_range::AgeRange;
pub use location_id::LocationId;
