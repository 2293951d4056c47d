use geo::{Contains, Coord, LineString, Point, Polygon, Relate};
use smallvec::SmallVec;

use crate::error::{RegionError, Result};
use crate::types::LocationId;

/// Whether a footprint is a single coordinate or a fenced region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    Point,
    Region,
}

/// The geometric footprint of a location: either a single point (one lat/lon
/// pair) or a simple polygon (at least three vertices, in insertion order).
///
/// Built incrementally with [`GeoArea::add_point`]; the vertex path never
/// shrinks. Most footprints in practice are single points, hence the inline
/// coordinate storage.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoArea {
    location_id: LocationId,
    latitudes: SmallVec<[f64; 4]>,
    longitudes: SmallVec<[f64; 4]>,
}

impl GeoArea {
    pub fn new(location_id: impl Into<LocationId>) -> Self {
        Self {
            location_id: location_id.into(),
            latitudes: SmallVec::new(),
            longitudes: SmallVec::new(),
        }
    }

    /// Build a footprint from `(lat, lon)` pairs in path order.
    pub fn from_points(
        location_id: impl Into<LocationId>,
        points: impl IntoIterator<Item = (f64, f64)>,
    ) -> Self {
        let mut area = Self::new(location_id);
        for (lat, lon) in points {
            area.add_point(lat, lon);
        }
        area
    }

    /// The location this footprint belongs to.
    #[inline]
    pub fn location_id(&self) -> &LocationId {
        &self.location_id
    }

    /// Appends a vertex, extending the polygon path.
    pub fn add_point(&mut self, latitude: f64, longitude: f64) {
        self.latitudes.push(latitude);
        self.longitudes.push(longitude);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.latitudes.len()
    }

    #[inline]
    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    #[inline]
    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// Vertices as `(lat, lon)` pairs in insertion order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.latitudes
            .iter()
            .copied()
            .zip(self.longitudes.iter().copied())
    }

    /// Classifies the footprint, or reports why it is malformed: mismatched
    /// coordinate sequences (impossible through `add_point`) or a vertex
    /// count of 0 or 2.
    pub fn kind(&self) -> Result<AreaKind> {
        if self.latitudes.len() != self.longitudes.len() {
            return Err(RegionError::CoordinateMismatch {
                id: self.location_id.clone(),
                latitudes: self.latitudes.len(),
                longitudes: self.longitudes.len(),
            });
        }
        match self.latitudes.len() {
            1 => Ok(AreaKind::Point),
            n if n >= 3 => Ok(AreaKind::Region),
            n => Err(RegionError::InvalidFootprint {
                id: self.location_id.clone(),
                vertices: n,
            }),
        }
    }

    pub fn is_point(&self) -> Result<bool> {
        Ok(self.kind()? == AreaKind::Point)
    }

    pub fn is_region(&self) -> Result<bool> {
        Ok(self.kind()? == AreaKind::Region)
    }

    pub fn is_valid(&self) -> bool {
        self.kind().is_ok()
    }

    /// Absolute shoelace area over the vertex path, in squared coordinate
    /// units. Meaningful only for regions; `0.0` for fewer than three
    /// vertices.
    pub fn area(&self) -> f64 {
        let n = self.latitudes.len();
        if n < 3 || n != self.longitudes.len() {
            return 0.0;
        }
        let x = &self.latitudes;
        let y = &self.longitudes;
        let mut sum = 0.0;
        for i in 0..n - 1 {
            sum += x[i] * y[i + 1] - x[i + 1] * y[i];
        }
        sum += x[n - 1] * y[0] - x[0] * y[n - 1];
        (0.5 * sum).abs()
    }

    /// Point-in-polygon test over the closed vertex path. Always false for
    /// point footprints and degenerate paths; boundary coordinates are not
    /// contained.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if self.latitudes.len() < 3 || self.latitudes.len() != self.longitudes.len() {
            return false;
        }
        self.to_polygon().contains(&Point::new(lat, lon))
    }

    /// True if the two footprints occupy common ground:
    /// point/point by exact coordinate equality, point/region through
    /// [`GeoArea::contains`], and region/region iff the planar intersection
    /// is non-empty. Boundary-only touching does not count as an
    /// intersection; a region always intersects itself.
    pub fn intersects(&self, other: &GeoArea) -> Result<bool> {
        Ok(match (self.kind()?, other.kind()?) {
            (AreaKind::Point, AreaKind::Point) => {
                self.latitudes == other.latitudes && self.longitudes == other.longitudes
            }
            (AreaKind::Point, AreaKind::Region) => {
                other.contains(self.latitudes[0], self.longitudes[0])
            }
            (AreaKind::Region, AreaKind::Point) => {
                self.contains(other.latitudes[0], other.longitudes[0])
            }
            (AreaKind::Region, AreaKind::Region) => {
                let im = self.to_polygon().relate(&other.to_polygon());
                im.is_intersects() && !im.is_touches()
            }
        })
    }

    /// Axis-aligned `([min_lat, min_lon], [max_lat, max_lon])` bounds, or
    /// `None` for an empty path.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        if self.latitudes.is_empty() {
            return None;
        }
        let fold = |values: &[f64]| {
            values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
        };
        let (min_lat, max_lat) = fold(&self.latitudes);
        let (min_lon, max_lon) = fold(&self.longitudes);
        Some(([min_lat, min_lon], [max_lat, max_lon]))
    }

    fn to_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points()
            .map(|(lat, lon)| Coord { x: lat, y: lon })
            .collect();
        // Polygon::new closes the exterior ring.
        Polygon::new(LineString(coords), vec![])
    }
}
