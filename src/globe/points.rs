//! Arc input records and the unique geo points derived from their endpoints

use super::country::CountryResolver;
use serde::Deserialize;
use std::collections::HashSet;

/// A great-circle connection between two coordinates, in degrees.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arc {
    #[serde(default)]
    pub order: i32,
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: f64,
    pub end_lng: f64,
    #[serde(default = "default_arc_alt")]
    pub arc_alt: f64,
    #[serde(default = "default_arc_color")]
    pub color: String,
    #[serde(default)]
    pub start_title: Option<String>,
    #[serde(default)]
    pub start_description: Option<String>,
    #[serde(default)]
    pub end_title: Option<String>,
    #[serde(default)]
    pub end_description: Option<String>,
}

fn default_arc_alt() -> f64 {
    0.1
}

fn default_arc_color() -> String {
    "#ffffff".to_string()
}

impl Arc {
    pub fn new(order: i32, start: (f64, f64), end: (f64, f64), arc_alt: f64, color: &str) -> Self {
        Self {
            order,
            start_lat: start.0,
            start_lng: start.1,
            end_lat: end.0,
            end_lng: end.1,
            arc_alt,
            color: color.to_string(),
            start_title: None,
            start_description: None,
            end_title: None,
            end_description: None,
        }
    }

    /// Both endpoints finite and inside the lat/lng ranges, altitude finite.
    pub fn is_valid(&self) -> bool {
        valid_coord(self.start_lat, self.start_lng)
            && valid_coord(self.end_lat, self.end_lng)
            && self.arc_alt.is_finite()
    }
}

fn valid_coord(lat: f64, lng: f64) -> bool {
    lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// A location derived from one end of an arc.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub order: i32,
    pub color: String,
    pub title: String,
    pub description: String,
    pub country: String,
}

impl GeoPoint {
    /// Exact-match identity. -0.0 and 0.0 are the same coordinate.
    fn key(&self) -> (u64, u64) {
        (canonical_bits(self.lat), canonical_bits(self.lng))
    }
}

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Remove arcs that cannot be placed on the globe.
pub fn valid_arcs(arcs: &[Arc]) -> Vec<Arc> {
    arcs.iter()
        .enumerate()
        .filter_map(|(i, arc)| {
            if arc.is_valid() {
                Some(arc.clone())
            } else {
                tracing::warn!(index = i, ?arc, "dropping malformed arc");
                None
            }
        })
        .collect()
}

/// Both endpoints of every arc, resolved against `resolver`, keeping the
/// first occurrence of each exact (lat, lng) pair.
///
/// The resolver is consulted once per endpoint, duplicates included.
/// Malformed arcs are skipped.
pub fn dedup_points<R>(arcs: &[Arc], resolver: &R) -> Vec<GeoPoint>
where
    R: CountryResolver + ?Sized,
{
    let mut points = Vec::with_capacity(arcs.len() * 2);
    for (i, arc) in arcs.iter().enumerate() {
        if !arc.is_valid() {
            tracing::warn!(index = i, "skipping malformed arc endpoints");
            continue;
        }
        points.push(GeoPoint {
            lat: arc.start_lat,
            lng: arc.start_lng,
            order: arc.order,
            color: arc.color.clone(),
            title: arc.start_title.clone().unwrap_or_else(|| format!("Point {i}")),
            description: arc
                .start_description
                .clone()
                .unwrap_or_else(|| "Start location".to_string()),
            country: resolver.resolve(arc.start_lat, arc.start_lng),
        });
        points.push(GeoPoint {
            lat: arc.end_lat,
            lng: arc.end_lng,
            order: arc.order,
            color: arc.color.clone(),
            title: arc.end_title.clone().unwrap_or_else(|| format!("Point {i}")),
            description: arc
                .end_description
                .clone()
                .unwrap_or_else(|| "End location".to_string()),
            country: resolver.resolve(arc.end_lat, arc.end_lng),
        });
    }

    let mut seen = HashSet::with_capacity(points.len());
    points.retain(|p| seen.insert(p.key()));
    points
}
