//! Country lookup for geo points
//!
//! The default resolver uses the OSM-derived boundary raster bundled with
//! `country-boundaries` and turns ISO 3166-1 codes into short names. When
//! that dataset cannot be decoded we fall back to a polygon scan over the
//! coarse continent outlines the renderer already carries.

use super::outlines::CONTINENTS;
use codes_iso_3166::part_1::CountryCode;
use country_boundaries::{CountryBoundaries, LatLon, BOUNDARIES_ODBL_360X180};
use geo::{Coord, Intersects, LineString, MultiPolygon, Point, Polygon};
use std::cell::RefCell;
use std::collections::HashMap;
use std::str::FromStr;

/// Name reported when no boundary contains the point.
pub const OCEAN: &str = "Ocean";

pub trait CountryResolver {
    fn resolve(&self, lat: f64, lng: f64) -> String;
}

impl<T: CountryResolver + ?Sized> CountryResolver for Box<T> {
    fn resolve(&self, lat: f64, lng: f64) -> String {
        (**self).resolve(lat, lng)
    }
}

/// Lookup against the bundled country boundary dataset.
pub struct BoundaryResolver {
    boundaries: CountryBoundaries,
}

impl BoundaryResolver {
    pub fn new() -> Option<Self> {
        match CountryBoundaries::from_reader(BOUNDARIES_ODBL_360X180) {
            Ok(boundaries) => Some(Self { boundaries }),
            Err(err) => {
                tracing::warn!(?err, "country boundary dataset failed to load");
                None
            }
        }
    }
}

impl CountryResolver for BoundaryResolver {
    fn resolve(&self, lat: f64, lng: f64) -> String {
        let Ok(position) = LatLon::new(lat, lng) else {
            return OCEAN.to_string();
        };
        // ids() lists subdivisions ("US-TX") alongside the country ("US").
        self.boundaries
            .ids(position)
            .into_iter()
            .find_map(|id| CountryCode::from_str(id).ok().map(|code| common_name(id, code.short_name())))
            .unwrap_or_else(|| OCEAN.to_string())
    }
}

/// Everyday names for codes whose ISO short name is a formal or inverted form.
const COMMON_NAMES: &[(&str, &str)] = &[
    ("BN", "Brunei"),
    ("BO", "Bolivia"),
    ("BQ", "Caribbean Netherlands"),
    ("CD", "DR Congo"),
    ("FM", "Micronesia"),
    ("GB", "United Kingdom"),
    ("IR", "Iran"),
    ("KP", "North Korea"),
    ("KR", "South Korea"),
    ("LA", "Laos"),
    ("MD", "Moldova"),
    ("PS", "Palestine"),
    ("RU", "Russia"),
    ("SH", "Saint Helena"),
    ("SY", "Syria"),
    ("TW", "Taiwan"),
    ("TZ", "Tanzania"),
    ("US", "United States"),
    ("VA", "Vatican City"),
    ("VE", "Venezuela"),
    ("VG", "British Virgin Islands"),
    ("VI", "U.S. Virgin Islands"),
    ("VN", "Vietnam"),
];

/// Display name for an ISO 3166-1 alpha-2 code: the override table first,
/// otherwise the short name with "(the)" style qualifiers cut off.
fn common_name(alpha_2: &str, short_name: &str) -> String {
    if let Some((_, name)) = COMMON_NAMES.iter().find(|(code, _)| *code == alpha_2) {
        return name.to_string();
    }
    plain_name(short_name).to_string()
}

/// "Netherlands (the)" -> "Netherlands", "Falkland Islands (the) [Malvinas]" -> "Falkland Islands".
fn plain_name(short_name: &str) -> &str {
    let end = [" (", " [", ","]
        .iter()
        .filter_map(|mark| short_name.find(mark))
        .min()
        .unwrap_or(short_name.len());
    short_name[..end].trim_end()
}

/// Linear point-in-polygon scan over named shapes; first match wins.
///
/// Boundary points count as inside. Cost is linear in the number of
/// shapes, so wrap it in a [`MemoResolver`] when resolving many points.
pub struct PolygonResolver {
    shapes: Vec<(String, MultiPolygon<f64>)>,
}

impl PolygonResolver {
    pub fn new(shapes: Vec<(String, MultiPolygon<f64>)>) -> Self {
        Self { shapes }
    }

    /// Resolver over the continent outlines, naming continents instead of countries.
    pub fn continents() -> Self {
        let shapes = CONTINENTS
            .iter()
            .map(|outline| {
                let ring: Vec<Coord<f64>> = outline
                    .points
                    .iter()
                    .map(|&(lat, lng)| Coord { x: lng, y: lat })
                    .collect();
                let polygon = Polygon::new(LineString::new(ring), vec![]);
                (outline.name.to_string(), MultiPolygon::new(vec![polygon]))
            })
            .collect();
        Self::new(shapes)
    }
}

impl CountryResolver for PolygonResolver {
    fn resolve(&self, lat: f64, lng: f64) -> String {
        let point = Point::new(lng, lat);
        self.shapes
            .iter()
            .find(|(_, shape)| shape.intersects(&point))
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| OCEAN.to_string())
    }
}

/// Caches another resolver's answers by coordinate rounded to 1e-4 degrees.
pub struct MemoResolver<R> {
    inner: R,
    cache: RefCell<HashMap<(i64, i64), String>>,
}

const MEMO_SCALE: f64 = 1e4;

impl<R: CountryResolver> MemoResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<R: CountryResolver> CountryResolver for MemoResolver<R> {
    fn resolve(&self, lat: f64, lng: f64) -> String {
        let key = (
            (lat * MEMO_SCALE).round() as i64,
            (lng * MEMO_SCALE).round() as i64,
        );
        if let Some(name) = self.cache.borrow().get(&key) {
            return name.clone();
        }
        let name = self.inner.resolve(lat, lng);
        self.cache.borrow_mut().insert(key, name.clone());
        name
    }
}

/// Boundary dataset when available, continent outlines otherwise.
pub fn default_resolver() -> Box<dyn CountryResolver> {
    match BoundaryResolver::new() {
        Some(resolver) => Box::new(MemoResolver::new(resolver)),
        None => {
            tracing::info!("resolving points against continent outlines");
            Box::new(MemoResolver::new(PolygonResolver::continents()))
        }
    }
}
