use ahash::{AHashMap, AHashSet};
use rstar::{RTree, RTreeObject, AABB};

use crate::area::{AreaKind, GeoArea};
use crate::error::{RegionError, Result};
use crate::location::Location;
use crate::poi::PoiGroup;
use crate::population::Population;
use crate::types::{AgeRange, LocationId};

/// R-tree entry: a footprint's bounding box, pointing back at its location.
#[derive(Debug, Clone)]
pub(crate) struct FootprintBounds {
    pub(crate) id: LocationId,
    pub(crate) min: [f64; 2],
    pub(crate) max: [f64; 2],
}

impl RTreeObject for FootprintBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// The Queryable phase of a region dataset: an immutable snapshot of
/// locations, their containment DAG, footprints, populations, and POI
/// groups.
///
/// Produced exclusively by [`RegionGraphBuilder::build`], which guarantees
/// that the containment structure is acyclic and that every ledger entirely
/// contains its children's ledgers. All queries are read-only, so a built
/// graph can be shared freely across reader threads.
///
/// [`RegionGraphBuilder::build`]: crate::RegionGraphBuilder::build
#[derive(Debug)]
pub struct RegionGraph {
    pub(crate) locations: AHashMap<LocationId, Location>,
    pub(crate) children: AHashMap<LocationId, Vec<LocationId>>,
    pub(crate) parents: AHashMap<LocationId, Vec<LocationId>>,
    pub(crate) areas: AHashMap<LocationId, GeoArea>,
    pub(crate) populations: AHashMap<LocationId, Population<String>>,
    pub(crate) poi_groups: AHashMap<LocationId, Vec<PoiGroup>>,
    pub(crate) rtree: RTree<FootprintBounds>,
}

impl RegionGraph {
    pub fn has_location(&self, location: &str) -> bool {
        self.locations.contains_key(location)
    }

    pub fn location(&self, location: &str) -> Result<&Location> {
        self.locations
            .get(location)
            .ok_or_else(|| RegionError::UnknownLocation { id: location.into() })
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// The footprint recorded for the location.
    pub fn area(&self, location: &str) -> Result<&GeoArea> {
        let id = self.location(location)?.id();
        self.areas
            .get(id)
            .ok_or_else(|| RegionError::MissingArea { id: id.clone() })
    }

    pub fn areas(&self) -> impl Iterator<Item = &GeoArea> {
        self.areas.values()
    }

    /// Locations that were never given a footprint.
    pub fn locations_without_areas(&self) -> Vec<&Location> {
        let mut found: Vec<&Location> = self
            .locations
            .values()
            .filter(|l| !self.areas.contains_key(l.id()))
            .collect();
        found.sort_by(|a, b| a.id().cmp(b.id()));
        found
    }

    pub fn has_population(&self, location: &str) -> bool {
        self.populations.contains_key(location)
    }

    /// The location's own ledger, which records its *inclusive* total (the
    /// loader guarantees it covers all descendants).
    pub fn population(&self, location: &str) -> Result<&Population<String>> {
        let id = self.location(location)?.id();
        self.populations
            .get(id)
            .ok_or_else(|| RegionError::MissingPopulation { id: id.clone() })
    }

    /// People in the age window at the location, descendants included; zero
    /// when the location has no ledger. Not a roll-up: the recorded ledger
    /// is already the inclusive total.
    pub fn total_population_size(&self, location: &str, start_age: u32, end_age: u32) -> Result<u32> {
        let id = self.location(location)?.id();
        let window = AgeRange::new(start_age, end_age)?;
        Ok(self
            .populations
            .get(id)
            .map_or(0, |population| population.get_count(window)))
    }

    /// The location's ledger with every ledger-bearing direct child's ledger
    /// subtracted out, children folded in id order. With no such children
    /// the own ledger is returned unchanged.
    pub fn exclusive_population(&self, location: &str) -> Result<Population<String>> {
        let id = self.location(location)?.id();
        let own = self
            .populations
            .get(id)
            .ok_or_else(|| RegionError::MissingPopulation { id: id.clone() })?;

        let mut with_populations: Vec<&LocationId> = self.children[id]
            .iter()
            .filter(|child| self.populations.contains_key(*child))
            .collect();
        with_populations.sort();

        let mut result = own.clone();
        for child in with_populations {
            result = result.excluding(&self.populations[child]);
        }
        Ok(result)
    }

    /// People in the age window at the location itself, descendants
    /// excluded.
    pub fn exclusive_population_size(
        &self,
        location: &str,
        start_age: u32,
        end_age: u32,
    ) -> Result<u32> {
        let window = AgeRange::new(start_age, end_age)?;
        Ok(self.exclusive_population(location)?.get_count(window))
    }

    /// Direct children of the location, in id order.
    pub fn direct_sublocations(&self, location: &str) -> Result<Vec<&Location>> {
        let id = self.location(location)?.id();
        let mut children: Vec<&Location> = self.children[id]
            .iter()
            .map(|child| &self.locations[child])
            .collect();
        children.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(children)
    }

    /// All descendants of the location (direct and indirect), in id order.
    pub fn all_sublocations(&self, location: &str) -> Result<Vec<&Location>> {
        let id = self.location(location)?.id();
        let mut seen: AHashSet<&LocationId> = AHashSet::new();
        let mut stack: Vec<&LocationId> = self.children[id].iter().collect();
        while let Some(node) = stack.pop() {
            if seen.insert(node) {
                stack.extend(self.children[node].iter());
            }
        }
        let mut found: Vec<&Location> = seen.into_iter().map(|id| &self.locations[id]).collect();
        found.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(found)
    }

    /// Direct parents of the location, in id order.
    pub fn direct_parents(&self, location: &str) -> Result<Vec<&Location>> {
        let id = self.location(location)?.id();
        let mut parents: Vec<&Location> = self.parents[id]
            .iter()
            .map(|parent| &self.locations[parent])
            .collect();
        parents.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(parents)
    }

    /// POI groups recorded for the location; empty for unknown ids.
    pub fn poi_groups(&self, location: &str) -> &[PoiGroup] {
        self.poi_groups.get(location).map_or(&[], Vec::as_slice)
    }

    /// All locations whose footprint covers the coordinate: regions that
    /// contain it, plus point footprints that equal it exactly. R-tree
    /// accelerated; results in id order.
    pub fn locate(&self, lat: f64, lon: f64) -> Vec<&Location> {
        let probe = AABB::from_point([lat, lon]);
        let mut hits: Vec<&Location> = self
            .rtree
            .locate_in_envelope_intersecting(&probe)
            .filter(|bounds| {
                let area = &self.areas[&bounds.id];
                match area.kind() {
                    Ok(AreaKind::Point) => {
                        area.latitudes()[0] == lat && area.longitudes()[0] == lon
                    }
                    Ok(AreaKind::Region) => area.contains(lat, lon),
                    Err(_) => false,
                }
            })
            .map(|bounds| &self.locations[&bounds.id])
            .collect();
        hits.sort_by(|a, b| a.id().cmp(b.id()));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RegionGraphBuilder;

    /// CR-Unity contains a school (point, no population) and a care home
    /// (point, with population); CR-RoundValley is a sibling region with no
    /// declared hierarchy link.
    fn sample_graph() -> RegionGraph {
        let mut builder = RegionGraphBuilder::new();
        for (id, name) in [
            ("CR-RoundValley", "Round Valley No 410"),
            ("CR-Unity", "Unity"),
            ("Unity-LutherPlace", "Luther Place"),
            ("Unity-UCHS", "UCHS"),
        ] {
            builder.add_location(Location::new(id, name)).unwrap();
        }
        builder.add_child("CR-Unity", "Unity-LutherPlace").unwrap();
        builder.add_child("CR-Unity", "Unity-UCHS").unwrap();

        builder
            .set_area(GeoArea::from_points(
                "CR-RoundValley",
                [
                    (52.668713, -109.460515),
                    (52.668297, -109.026555),
                    (52.404338, -109.025181),
                    (52.405595, -109.457081),
                ],
            ))
            .unwrap();
        builder
            .set_area(GeoArea::from_points(
                "CR-Unity",
                [(52.45, -109.17), (52.45, -109.14), (52.43, -109.14), (52.43, -109.17)],
            ))
            .unwrap();
        builder
            .set_area(GeoArea::from_points("Unity-LutherPlace", [(52.4405, -109.1533)]))
            .unwrap();
        builder
            .set_area(GeoArea::from_points("Unity-UCHS", [(52.4420, -109.1600)]))
            .unwrap();

        builder.set_population("CR-Unity", "All", 0, 40, 1200).unwrap();
        builder.set_population("CR-Unity", "All", 40, 80, 800).unwrap();
        builder.set_population("CR-Unity", "All", 80, 120, 100).unwrap();
        builder.set_population("Unity-LutherPlace", "All", 60, 120, 35).unwrap();
        builder.set_population("CR-RoundValley", "All", 0, 120, 3000).unwrap();

        builder.build().unwrap()
    }

    #[test]
    fn unknown_ids_are_rejected_uniformly() {
        let graph = sample_graph();

        assert_eq!(
            graph.location("nowhere").unwrap_err(),
            RegionError::UnknownLocation { id: "nowhere".into() }
        );
        assert!(matches!(graph.area("nowhere"), Err(RegionError::UnknownLocation { .. })));
        assert!(matches!(graph.direct_sublocations("nowhere"), Err(RegionError::UnknownLocation { .. })));
        assert!(matches!(graph.all_sublocations("nowhere"), Err(RegionError::UnknownLocation { .. })));
        assert!(matches!(
            graph.total_population_size("nowhere", 0, 10),
            Err(RegionError::UnknownLocation { .. })
        ));
    }

    #[test]
    fn sublocation_queries() {
        let graph = sample_graph();

        let direct: Vec<&str> = graph
            .direct_sublocations("CR-Unity")
            .unwrap()
            .iter()
            .map(|l| l.id().as_str())
            .collect();
        assert_eq!(direct, vec!["Unity-LutherPlace", "Unity-UCHS"]);

        let all: Vec<&str> = graph
            .all_sublocations("CR-Unity")
            .unwrap()
            .iter()
            .map(|l| l.id().as_str())
            .collect();
        assert_eq!(all, vec!["Unity-LutherPlace", "Unity-UCHS"]);

        // Geographic containment without a declared edge is not hierarchy.
        assert!(graph.all_sublocations("CR-RoundValley").unwrap().is_empty());
        assert!(graph.all_sublocations("Unity-UCHS").unwrap().is_empty());

        let parents: Vec<&str> = graph
            .direct_parents("Unity-UCHS")
            .unwrap()
            .iter()
            .map(|l| l.id().as_str())
            .collect();
        assert_eq!(parents, vec!["CR-Unity"]);
    }

    #[test]
    fn total_population_is_the_recorded_inclusive_total() {
        let graph = sample_graph();

        assert_eq!(graph.total_population_size("CR-Unity", 40, 80).unwrap(), 800);
        // Prorated window on a single broad band: 3000 * 3/120.
        assert_eq!(graph.total_population_size("CR-RoundValley", 70, 73).unwrap(), 75);
        // No ledger reads as zero.
        assert_eq!(graph.total_population_size("Unity-UCHS", 0, 100).unwrap(), 0);
    }

    #[test]
    fn exclusive_population_subtracts_ledgered_children() {
        let graph = sample_graph();

        // Luther Place's [60, 120) band of 35 prorates to 11 people within
        // [40, 80) and 23 within [80, 120).
        assert_eq!(graph.exclusive_population_size("CR-Unity", 40, 80).unwrap(), 789);
        assert_eq!(graph.exclusive_population_size("CR-Unity", 80, 120).unwrap(), 77);
        assert_eq!(graph.exclusive_population_size("CR-Unity", 0, 40).unwrap(), 1200);

        // A leaf's exclusive view is its own ledger, unchanged.
        assert_eq!(
            graph.exclusive_population_size("Unity-LutherPlace", 0, 120).unwrap(),
            graph.total_population_size("Unity-LutherPlace", 0, 120).unwrap(),
        );
        assert_eq!(
            graph.exclusive_population("CR-RoundValley").unwrap(),
            *graph.population("CR-RoundValley").unwrap(),
        );

        assert!(matches!(
            graph.exclusive_population("Unity-UCHS"),
            Err(RegionError::MissingPopulation { .. })
        ));
    }

    #[test]
    fn exclusive_population_floors_at_zero_per_band() {
        // c1 + c2 exactly exhaust the parent's single band.
        let mut builder = RegionGraphBuilder::new();
        for id in ["p", "c1", "c2"] {
            builder.add_location(Location::new(id, id)).unwrap();
        }
        builder.add_child("p", "c1").unwrap();
        builder.add_child("p", "c2").unwrap();
        builder.set_population("p", "All", 0, 10, 100).unwrap();
        builder.set_population("c1", "All", 0, 10, 60).unwrap();
        builder.set_population("c2", "All", 0, 10, 40).unwrap();
        let graph = builder.build().unwrap();

        assert_eq!(graph.exclusive_population_size("p", 0, 10).unwrap(), 0);
    }

    #[test]
    fn area_lookup_and_diagnostics() {
        let graph = sample_graph();

        assert!(graph.area("Unity-UCHS").unwrap().is_point().unwrap());
        assert!(graph.area("CR-RoundValley").unwrap().is_region().unwrap());
        assert!(graph.locations_without_areas().is_empty());

        let mut builder = RegionGraphBuilder::new();
        builder.add_location(Location::new("bare", "Bare")).unwrap();
        let graph = builder.build().unwrap();
        assert!(matches!(
            graph.area("bare"),
            Err(RegionError::MissingArea { .. })
        ));
        assert_eq!(graph.locations_without_areas().len(), 1);
    }

    #[test]
    fn footprints_intersect_across_the_hierarchy() {
        let graph = sample_graph();
        let round_valley = graph.area("CR-RoundValley").unwrap();
        let unity = graph.area("CR-Unity").unwrap();
        let luther = graph.area("Unity-LutherPlace").unwrap();
        let school = graph.area("Unity-UCHS").unwrap();

        assert!(round_valley.intersects(unity).unwrap());
        assert!(unity.intersects(round_valley).unwrap());
        assert!(!luther.intersects(school).unwrap());
        assert!(school.intersects(school).unwrap());
    }

    #[test]
    fn locate_finds_all_covering_footprints() {
        let graph = sample_graph();

        let at_luther: Vec<&str> = graph
            .locate(52.4405, -109.1533)
            .iter()
            .map(|l| l.id().as_str())
            .collect();
        assert_eq!(at_luther, vec!["CR-RoundValley", "CR-Unity", "Unity-LutherPlace"]);

        let in_round_valley_only: Vec<&str> = graph
            .locate(52.6, -109.2)
            .iter()
            .map(|l| l.id().as_str())
            .collect();
        assert_eq!(in_round_valley_only, vec!["CR-RoundValley"]);

        assert!(graph.locate(0.0, 0.0).is_empty());
    }
}
