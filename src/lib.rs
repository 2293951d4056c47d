#![doc = "Demograph public API"]
mod area;
mod attributes;
pub mod dataset;
mod error;
mod graph;
mod location;
mod poi;
mod population;
mod types;

#[doc(inline)]
pub use area::{AreaKind, GeoArea};

#[doc(inline)]
pub use attributes::Attributes;

#[doc(inline)]
pub use error::RegionError;

#[doc(inline)]
pub use graph::{RegionGraph, RegionGraphBuilder};

#[doc(inline)]
pub use location::Location;

#[doc(inline)]
pub use poi::{PoiGroup, PoiType};

#[doc(inline)]
pub use population::Population;

#[doc(inline)]
pub use types::{AgeRange, LocationId};
