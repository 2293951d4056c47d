use serde::{Deserialize, Serialize};

use crate::types::LocationId;

/// The kind of point of interest a group describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoiType {
    PrimarySchool,
    SecondarySchool,
    TertiarySchool,
    Workplace,
    AssistedLiving,
    Hospital,
}

/// A group of (or a single) point of interest within a location, e.g. "small
/// businesses" or "the high school". Employee and attendee bounds are hints
/// for downstream allocation, not enforced by the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiGroup {
    /// The location in/at which these POIs appear.
    pub location_id: LocationId,
    pub group_type: PoiType,
    /// If the POIs have employees, how many each should have.
    pub min_employees: u32,
    pub max_employees: u32,
    /// If the POIs have attendees (students, residents), how many each
    /// should have.
    pub min_attendees: u32,
    pub max_attendees: u32,
    /// The number of POIs in this group.
    pub number: u32,
    /// A display label for the group; not unique, not an id.
    pub label: String,
}
