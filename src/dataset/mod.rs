//! Record-level dataset loading.
//!
//! The core has no file format of its own: a front-end parses whatever
//! tabular source it likes into the serde-derivable record structs here, and
//! [`load`] drives the [`RegionGraphBuilder`] in an order that satisfies
//! every precondition (locations before edges, footprints, and populations
//! that reference them). Loading is all-or-nothing: any malformed record,
//! conflicting population row, or hierarchy inconsistency aborts the whole
//! load, and only a fully validated [`RegionGraph`] is ever returned.

use ahash::AHashMap;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::area::GeoArea;
use crate::graph::{RegionGraph, RegionGraphBuilder};
use crate::location::Location;
use crate::poi::{PoiGroup, PoiType};
use crate::types::AgeRange;

/// One location: unique id plus a display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: String,
    pub name: String,
}

/// One direct containment edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyRecord {
    pub parent_id: String,
    pub child_id: String,
}

/// One footprint vertex. Rows for the same location accumulate in row order
/// into a point (one row) or polygon (three or more rows).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintRecord {
    pub location_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One attribute, for a location or for a location's population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub location_id: String,
    pub name: String,
    pub value: String,
}

/// One population cell. `citation` is bookkeeping for the dataset's authors
/// and is ignored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub location_id: String,
    pub segment: String,
    pub start_age: u32,
    pub end_age: u32,
    pub count: u32,
    #[serde(default)]
    pub citation: Option<String>,
}

/// One POI group. `citation` is ignored, as for populations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiGroupRecord {
    pub location_id: String,
    pub group_type: PoiType,
    #[serde(default)]
    pub min_employees: u32,
    #[serde(default)]
    pub max_employees: u32,
    #[serde(default)]
    pub min_attendees: u32,
    #[serde(default)]
    pub max_attendees: u32,
    pub number: u32,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub citation: Option<String>,
}

/// Everything a region dataset is built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecords {
    #[serde(default)]
    pub locations: Vec<LocationRecord>,
    #[serde(default)]
    pub hierarchy: Vec<HierarchyRecord>,
    #[serde(default)]
    pub footprints: Vec<FootprintRecord>,
    #[serde(default)]
    pub location_attributes: Vec<AttributeRecord>,
    #[serde(default)]
    pub populations: Vec<PopulationRecord>,
    #[serde(default)]
    pub population_attributes: Vec<AttributeRecord>,
    #[serde(default)]
    pub poi_groups: Vec<PoiGroupRecord>,
}

/// Builds a queryable [`RegionGraph`] from parsed records.
///
/// Every location must receive a valid footprint; population rows whose
/// segment and age range overlap an already recorded cell for the same
/// location are rejected as duplicates.
pub fn load(records: &DatasetRecords) -> Result<RegionGraph> {
    let mut builder = RegionGraphBuilder::new();

    for record in &records.locations {
        builder
            .add_location(Location::new(record.id.as_str(), record.name.as_str()))
            .with_context(|| format!("location record {:?}", record.id))?;
    }
    info!(locations = records.locations.len(), "registered locations");

    for record in &records.hierarchy {
        builder
            .add_child(&record.parent_id, &record.child_id)
            .with_context(|| {
                format!("hierarchy record {:?} -> {:?}", record.parent_id, record.child_id)
            })?;
    }

    // Footprints accumulate per location in row order; every location must
    // end up with a valid point or polygon.
    let mut areas: AHashMap<&str, GeoArea> = records
        .locations
        .iter()
        .map(|record| (record.id.as_str(), GeoArea::new(record.id.as_str())))
        .collect();
    for record in &records.footprints {
        let Some(area) = areas.get_mut(record.location_id.as_str()) else {
            bail!("footprint row references unknown location {:?}", record.location_id);
        };
        area.add_point(record.latitude, record.longitude);
    }
    for record in &records.locations {
        if let Some(area) = areas.remove(record.id.as_str()) {
            debug!(location = %record.id, vertices = area.vertex_count(), "footprint");
            builder
                .set_area(area)
                .with_context(|| format!("footprint for location {:?}", record.id))?;
        }
    }

    for record in &records.location_attributes {
        builder
            .set_location_attribute(&record.location_id, &record.name, &record.value)
            .with_context(|| {
                format!("attribute {:?} for location {:?}", record.name, record.location_id)
            })?;
    }

    for record in &records.populations {
        let duplicate = builder.population(&record.location_id).is_some_and(|population| {
            AgeRange::new(record.start_age, record.end_age)
                .is_ok_and(|range| population.has_overlap(&record.segment, range))
        });
        if duplicate {
            bail!(
                "overlapping segment ({}) & age range ({}-{}) in location {:?}",
                record.segment,
                record.start_age,
                record.end_age,
                record.location_id,
            );
        }
        builder
            .set_population(
                &record.location_id,
                record.segment.as_str(),
                record.start_age,
                record.end_age,
                record.count,
            )
            .with_context(|| format!("population row for location {:?}", record.location_id))?;
    }
    info!(rows = records.populations.len(), "recorded population cells");

    for record in &records.population_attributes {
        builder
            .set_population_attribute(&record.location_id, &record.name, &record.value)
            .with_context(|| {
                format!(
                    "population attribute {:?} for location {:?}",
                    record.name, record.location_id
                )
            })?;
    }

    for record in &records.poi_groups {
        builder
            .add_poi_group(PoiGroup {
                location_id: record.location_id.as_str().into(),
                group_type: record.group_type,
                min_employees: record.min_employees,
                max_employees: record.max_employees,
                min_attendees: record.min_attendees,
                max_attendees: record.max_attendees,
                number: record.number,
                label: record.label.clone(),
            })
            .with_context(|| format!("POI group for location {:?}", record.location_id))?;
    }

    let graph = builder.build().context("hierarchy consistency validation")?;
    info!(locations = graph.len(), "dataset loaded");
    Ok(graph)
}
