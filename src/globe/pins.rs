//! Choosing which points get a pin, and the pin markers themselves

use super::points::GeoPoint;
use super::projection::SurfaceProjector;
use glam::DVec3;

/// Maximum number of pins on the globe.
pub const DEFAULT_MAX_PINS: usize = 6;

/// Altitude used to place and filter pins.
pub const PIN_ALTITUDE: f64 = 0.003;

/// Vertical nudge applied to the resting pin so it sits on the surface.
pub const PIN_LIFT: f64 = 0.03;

/// Pin sprite size, world units.
pub const PIN_SCALE: f64 = 7.0;

/// A visible pin bound to one selected geo point.
#[derive(Clone, Debug, PartialEq)]
pub struct PinMarker {
    pub lat: f64,
    pub lng: f64,
    pub country: String,
    pub title: String,
    pub color: String,
    pub position: DVec3,
    pub base_position: DVec3,
    pub scale: f64,
    pub base_scale: f64,
    /// Higher draws later. Resting pins share 0.
    pub render_order: u32,
    /// Roster entry last shown for this pin, card popups only.
    pub profile_index: Option<usize>,
}

impl PinMarker {
    fn new(point: &GeoPoint, surface: DVec3, scale: f64) -> Self {
        let position = surface + DVec3::Y * PIN_LIFT;
        Self {
            lat: point.lat,
            lng: point.lng,
            country: if point.country.is_empty() {
                "Unknown".to_string()
            } else {
                point.country.clone()
            },
            title: point.title.clone(),
            color: point.color.clone(),
            position,
            base_position: position,
            scale,
            base_scale: scale,
            render_order: 0,
            profile_index: None,
        }
    }

    /// Put position, scale and draw order back to their resting values.
    pub fn restore(&mut self) {
        self.position = self.base_position;
        self.scale = self.base_scale;
        self.render_order = 0;
    }

    pub fn is_elevated(&self) -> bool {
        self.render_order > 0
    }
}

/// Project every point, keep those facing the camera (`z > 0`) and above
/// the equator (`y > 0`), nearest first, at most `cap` of them.
///
/// The camera is assumed to start on +Z. The filter runs once per point
/// set, not per frame.
pub fn select_pins<P>(points: &[GeoPoint], projector: &P, cap: usize) -> Vec<PinMarker>
where
    P: SurfaceProjector + ?Sized,
{
    select_pins_scaled(points, projector, cap, PIN_SCALE)
}

pub fn select_pins_scaled<P>(points: &[GeoPoint], projector: &P, cap: usize, scale: f64) -> Vec<PinMarker>
where
    P: SurfaceProjector + ?Sized,
{
    let mut front: Vec<(&GeoPoint, DVec3)> = points
        .iter()
        .map(|p| (p, projector.project_to_surface(p.lat, p.lng, PIN_ALTITUDE)))
        .filter(|(_, c)| c.z > 0.0 && c.y > 0.0)
        .collect();
    // Stable, so equal depths keep input order.
    front.sort_by(|a, b| b.1.z.total_cmp(&a.1.z));
    front.truncate(cap);
    front
        .into_iter()
        .map(|(p, c)| PinMarker::new(p, c, scale))
        .collect()
}
