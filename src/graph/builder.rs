use ahash::{AHashMap, AHashSet};
use rstar::RTree;
use tracing::debug;

use crate::area::GeoArea;
use crate::error::{RegionError, Result};
use crate::graph::graph::{FootprintBounds, RegionGraph};
use crate::location::Location;
use crate::poi::PoiGroup;
use crate::population::Population;
use crate::types::{AgeRange, LocationId};

/// The mutable Building phase of a region graph.
///
/// A single writer registers locations, containment edges, footprints, and
/// population cells; every mutation either commits fully or fails with a
/// [`RegionError`] kind and leaves the structure unchanged. [`Self::build`]
/// validates hierarchy consistency and converts into the read-only
/// [`RegionGraph`]; there is no way back.
#[derive(Debug, Default)]
pub struct RegionGraphBuilder {
    locations: AHashMap<LocationId, Location>,
    /// Direct containment edges, parent -> children (outgoing).
    children: AHashMap<LocationId, Vec<LocationId>>,
    /// Direct containment edges, child -> parents (incoming).
    parents: AHashMap<LocationId, Vec<LocationId>>,
    areas: AHashMap<LocationId, GeoArea>,
    populations: AHashMap<LocationId, Population<String>>,
    poi_groups: AHashMap<LocationId, Vec<PoiGroup>>,
}

impl RegionGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a location. Ids are unique across the dataset.
    pub fn add_location(&mut self, location: Location) -> Result<()> {
        if self.locations.contains_key(location.id()) {
            return Err(RegionError::DuplicateLocation { id: location.id().clone() });
        }
        let id = location.id().clone();
        self.children.insert(id.clone(), Vec::new());
        self.parents.insert(id.clone(), Vec::new());
        self.locations.insert(id, location);
        Ok(())
    }

    /// Links two known locations as direct parent and child. An edge whose
    /// addition would close a containment cycle is rejected and the edge
    /// set is left unchanged.
    pub fn add_child(&mut self, parent: &str, child: &str) -> Result<()> {
        let parent = self.require(parent)?.clone();
        let child = self.require(child)?.clone();
        if parent == child {
            return Err(RegionError::SelfReference { id: parent });
        }
        if self.children[&parent].contains(&child) {
            return Err(RegionError::DuplicateEdge { parent, child });
        }
        if self.reaches(&child, &parent) {
            return Err(RegionError::Cycle { parent, child });
        }

        self.children.get_mut(&parent).unwrap().push(child.clone());
        self.parents.get_mut(&child).unwrap().push(parent);
        Ok(())
    }

    /// Records the footprint for its owning location; one per location,
    /// validity-checked on entry.
    pub fn set_area(&mut self, area: GeoArea) -> Result<()> {
        let id = self.require(area.location_id().as_str())?.clone();
        area.kind()?;
        if self.areas.contains_key(&id) {
            return Err(RegionError::DuplicateArea { id });
        }
        self.areas.insert(id, area);
        Ok(())
    }

    /// Sets one population cell, lazily creating the location's ledger.
    pub fn set_population(
        &mut self,
        location: &str,
        segment: impl Into<String>,
        start_age: u32,
        end_age: u32,
        count: u32,
    ) -> Result<()> {
        let id = self.require(location)?.clone();
        let range = AgeRange::new(start_age, end_age)?;
        self.populations
            .entry(id)
            .or_default()
            .put(segment.into(), range, count);
        Ok(())
    }

    pub fn set_location_attribute(
        &mut self,
        location: &str,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let id = self.require(location)?.clone();
        self.locations
            .get_mut(&id)
            .unwrap()
            .attributes_mut()
            .set(name, value);
        Ok(())
    }

    /// Sets an attribute on the location's ledger, which must already exist.
    pub fn set_population_attribute(
        &mut self,
        location: &str,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let id = self.require(location)?.clone();
        let population = self
            .populations
            .get_mut(&id)
            .ok_or(RegionError::MissingPopulation { id })?;
        population.attributes_mut().set(name, value);
        Ok(())
    }

    pub fn add_poi_group(&mut self, group: PoiGroup) -> Result<()> {
        let id = self.require(group.location_id.as_str())?.clone();
        self.poi_groups.entry(id).or_default().push(group);
        Ok(())
    }

    /// The ledger recorded so far for a location, if any. Lets loaders check
    /// for conflicting rows (via [`Population::has_overlap`]) before writing.
    pub fn population(&self, location: &str) -> Option<&Population<String>> {
        self.populations.get(location)
    }

    pub fn has_location(&self, location: &str) -> bool {
        self.locations.contains_key(location)
    }

    /// Checks that every location's ledger entirely contains the combined
    /// ledgers of its direct children, folding children out in id order.
    /// A parent with too few people to account for its children is a fatal
    /// dataset error.
    pub fn validate_hierarchy(&self) -> Result<()> {
        let mut parents: Vec<&LocationId> = self.populations.keys().collect();
        parents.sort();

        for parent in parents {
            let mut with_populations: Vec<&LocationId> = self.children[parent]
                .iter()
                .filter(|child| self.populations.contains_key(*child))
                .collect();
            if with_populations.is_empty() {
                continue;
            }
            with_populations.sort();

            let mut remaining = self.populations[parent].clone();
            for child in with_populations {
                let population = &self.populations[child];
                debug!(%parent, %child, child_size = population.size(), "checking containment");
                if !remaining.entirely_contains(population) {
                    return Err(RegionError::HierarchyInconsistency {
                        parent: parent.clone(),
                        child: child.clone(),
                    });
                }
                remaining = remaining.excluding(population);
            }
        }
        Ok(())
    }

    /// Finishes the Building phase: validates hierarchy consistency, indexes
    /// footprints for spatial lookup, and returns the immutable graph.
    pub fn build(self) -> Result<RegionGraph> {
        self.validate_hierarchy()?;

        let rtree = RTree::bulk_load(
            self.areas
                .iter()
                .filter_map(|(id, area)| {
                    area.bounds()
                        .map(|(min, max)| FootprintBounds { id: id.clone(), min, max })
                })
                .collect(),
        );

        Ok(RegionGraph {
            locations: self.locations,
            children: self.children,
            parents: self.parents,
            areas: self.areas,
            populations: self.populations,
            poi_groups: self.poi_groups,
            rtree,
        })
    }

    fn require(&self, location: &str) -> Result<&LocationId> {
        self.locations
            .get_key_value(location)
            .map(|(id, _)| id)
            .ok_or_else(|| RegionError::UnknownLocation { id: location.into() })
    }

    /// Depth-first reachability over outgoing edges; used to reject edges
    /// that would close a cycle before committing them.
    fn reaches(&self, from: &LocationId, target: &LocationId) -> bool {
        let mut stack = vec![from];
        let mut seen: AHashSet<&LocationId> = AHashSet::new();
        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if !seen.insert(node) {
                continue;
            }
            if let Some(kids) = self.children.get(node) {
                stack.extend(kids.iter());
            }
        }
        false
    }
}
