use thiserror::Error;

use crate::types::LocationId;

/// Contract violations raised by the core data structures.
///
/// Every failure carries a distinguishable kind so callers can discriminate
/// between caller bugs (unknown ids, duplicate edges) and malformed input
/// data (bad ranges, invalid footprints). None of these are recoverable by
/// the operation that raised them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error("location {id} is already in the dataset")]
    DuplicateLocation { id: LocationId },

    #[error("location {id} is not in the dataset")]
    UnknownLocation { id: LocationId },

    #[error("location {id} cannot contain itself")]
    SelfReference { id: LocationId },

    #[error("{child} is already a direct child of {parent}")]
    DuplicateEdge { parent: LocationId, child: LocationId },

    #[error("linking {child} under {parent} would create a containment cycle")]
    Cycle { parent: LocationId, child: LocationId },

    #[error("location {id} already has a footprint")]
    DuplicateArea { id: LocationId },

    #[error("location {id} has no footprint")]
    MissingArea { id: LocationId },

    #[error("location {id} has no population")]
    MissingPopulation { id: LocationId },

    #[error("invalid age range: start {start} must be <= end {end}")]
    InvalidAgeRange { start: u32, end: u32 },

    #[error("footprint for {id} has {latitudes} latitudes but {longitudes} longitudes")]
    CoordinateMismatch {
        id: LocationId,
        latitudes: usize,
        longitudes: usize,
    },

    #[error("footprint for {id} has {vertices} vertices; expected one point or at least three")]
    InvalidFootprint { id: LocationId, vertices: usize },

    #[error("attribute {name} is not numeric: {value:?}")]
    InvalidAttribute { name: String, value: String },

    #[error("population of {parent} does not entirely contain the population of its child {child}")]
    HierarchyInconsistency { parent: LocationId, child: LocationId },
}

pub type Result<T, E = RegionError> = std::result::Result<T, E>;
