//! Pointer picking and the hover state machine for pins

use super::pins::{PinMarker, PIN_LIFT};
use super::popup::{next_index, prev_index, Popup, PopupContent, PopupStyle};
use super::projection::{Basis, Camera, Ray, SurfaceProjector};
use glam::{DVec2, DVec3};
use rand::rngs::StdRng;
use rand::Rng;

/// Altitude a hovered pin is raised to.
pub const HOVER_ALTITUDE: f64 = 0.012;

/// Altitude of the popup anchor; always above the raised pin.
pub const POPUP_ALTITUDE: f64 = 0.025;

/// Scale factor for the hovered pin (7 -> 9).
pub const HOVER_SCALE: f64 = 9.0 / 7.0;

/// Nearest pin whose camera-facing sprite the ray passes through.
///
/// Sprites are anchored at their bottom center, `scale` wide and tall,
/// and always face the camera. The globe itself does not block picks.
pub fn pick(ray: &Ray, basis: &Basis, markers: &[PinMarker]) -> Option<usize> {
    let normal = basis.forward;
    let facing = ray.dir.dot(normal);
    if facing.abs() < 1e-12 {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, marker) in markers.iter().enumerate() {
        let t = (marker.position - ray.origin).dot(normal) / facing;
        if t <= 0.0 {
            continue;
        }
        let local = ray.at(t) - marker.position;
        let u = local.dot(basis.right);
        let v = local.dot(basis.up);
        let half = marker.scale * 0.5;
        if u.abs() <= half && (0.0..=marker.scale).contains(&v) && best.map_or(true, |(_, bt)| t < bt) {
            best = Some((i, t));
        }
    }
    best.map(|(i, _)| i)
}

/// Owns the pin markers while the globe is mounted and tracks which one
/// the pointer is on.
pub struct HoverController {
    markers: Vec<PinMarker>,
    hovered: Option<usize>,
    popup: Option<Popup>,
    popup_hovered: bool,
    style: PopupStyle,
    roster_len: usize,
    rng: StdRng,
    ray: Ray,
    mounted: bool,
}

impl HoverController {
    pub fn new(style: PopupStyle, roster_len: usize, rng: StdRng) -> Self {
        Self {
            markers: Vec::new(),
            hovered: None,
            popup: None,
            popup_hovered: false,
            style,
            roster_len,
            rng,
            ray: Ray::default(),
            mounted: true,
        }
    }

    /// Replace the marker set. Any hover or popup on the old set is dropped.
    pub fn set_markers(&mut self, markers: Vec<PinMarker>) {
        self.markers = markers;
        self.hovered = None;
        self.popup = None;
        self.popup_hovered = false;
    }

    pub fn markers(&self) -> &[PinMarker] {
        &self.markers
    }

    #[cfg(test)]
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    /// Markers sorted for drawing, elevated ones last.
    pub fn draw_order(&self) -> Vec<&PinMarker> {
        let mut sorted: Vec<&PinMarker> = self.markers.iter().collect();
        sorted.sort_by_key(|m| m.render_order);
        sorted
    }

    /// Pointer entered or left the popup card.
    pub fn set_popup_hovered(&mut self, hovered: bool) {
        if self.mounted {
            self.popup_hovered = hovered;
        }
    }

    #[cfg(test)]
    pub fn popup_hovered(&self) -> bool {
        self.popup_hovered
    }

    /// Handle a pointer move at `ndc`. Returns true when hover state changed.
    ///
    /// While the pointer is on the popup card the card owns it: no pick runs,
    /// so pins drawn underneath the card cannot take the hover away.
    pub fn pointer_move<P>(&mut self, camera: &Camera, ndc: DVec2, projector: &P) -> bool
    where
        P: SurfaceProjector + ?Sized,
    {
        if !self.mounted || self.popup_hovered {
            return false;
        }
        camera.ray_through(ndc, &mut self.ray);
        let hit = pick(&self.ray, &camera.basis(), &self.markers);

        match hit {
            Some(i) if self.hovered == Some(i) => false,
            Some(i) => {
                self.leave();
                self.enter(i, projector);
                true
            }
            None => {
                let changed = self.hovered.is_some() || self.popup.is_some();
                self.leave();
                self.popup = None;
                changed
            }
        }
    }

    fn leave(&mut self) {
        if let Some(prev) = self.hovered.take() {
            if let Some(marker) = self.markers.get_mut(prev) {
                marker.restore();
            }
        }
    }

    fn enter<P>(&mut self, i: usize, projector: &P)
    where
        P: SurfaceProjector + ?Sized,
    {
        let top = self.markers.len() as u32;
        let content = match self.style {
            PopupStyle::ProfileCard if self.roster_len > 0 => PopupContent::Profile {
                index: self.rng.gen_range(0..self.roster_len),
            },
            _ => PopupContent::Country(self.markers[i].country.clone()),
        };

        let marker = &mut self.markers[i];
        marker.position = projector.project_to_surface(marker.lat, marker.lng, HOVER_ALTITUDE)
            + DVec3::Y * PIN_LIFT;
        marker.scale = marker.base_scale * HOVER_SCALE;
        marker.render_order = top;
        if let PopupContent::Profile { index } = content {
            marker.profile_index = Some(index);
        }

        self.popup = Some(Popup {
            position: projector.project_to_surface(marker.lat, marker.lng, POPUP_ALTITUDE),
            content,
        });
        self.hovered = Some(i);
    }

    /// Show the next roster entry on the open card.
    pub fn page_next(&mut self) -> bool {
        self.page(next_index)
    }

    /// Show the previous roster entry on the open card.
    pub fn page_prev(&mut self) -> bool {
        self.page(prev_index)
    }

    fn page(&mut self, step: fn(usize, usize) -> usize) -> bool {
        if !self.mounted {
            return false;
        }
        let len = self.roster_len;
        let Some(Popup { content: PopupContent::Profile { index }, .. }) = self.popup.as_mut() else {
            return false;
        };
        *index = step(*index, len);
        let index = *index;
        if let Some(marker) = self.hovered.and_then(|h| self.markers.get_mut(h)) {
            marker.profile_index = Some(index);
        }
        true
    }

    /// Release every marker and stop reacting to pointer input.
    pub fn unmount(&mut self) {
        self.markers.clear();
        self.hovered = None;
        self.popup = None;
        self.popup_hovered = false;
        self.mounted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globe::pins::select_pins;
    use crate::globe::points::GeoPoint;
    use crate::globe::popup::ROSTER;
    use crate::globe::projection::SphereProjector;
    use rand::SeedableRng;

    fn point(lat: f64, lng: f64, country: &str) -> GeoPoint {
        GeoPoint {
            lat,
            lng,
            order: 1,
            color: "#06b6d4".to_string(),
            title: country.to_string(),
            description: String::new(),
            country: country.to_string(),
        }
    }

    fn controller(style: PopupStyle) -> (HoverController, Camera, SphereProjector) {
        let projector = SphereProjector::default();
        let points = vec![
            point(20.0, -20.0, "West"),
            point(20.0, 20.0, "East"),
            point(45.0, 0.0, "North"),
        ];
        let mut hover = HoverController::new(style, ROSTER.len(), StdRng::seed_from_u64(7));
        hover.set_markers(select_pins(&points, &projector, 6));
        (hover, Camera::default(), projector)
    }

    /// NDC that lands on the middle of a marker's sprite.
    fn aim(camera: &Camera, marker: &PinMarker) -> DVec2 {
        let center = marker.position + camera.basis().up * (marker.scale * 0.5);
        camera.project(center).unwrap().0
    }

    fn index_of(hover: &HoverController, country: &str) -> usize {
        hover.markers().iter().position(|m| m.country == country).unwrap()
    }

    const EMPTY: DVec2 = DVec2::new(0.95, -0.95);

    #[test]
    fn pick_finds_marker_under_pointer() {
        let (hover, camera, _) = controller(PopupStyle::CountryLabel);
        let east = index_of(&hover, "East");
        let mut ray = Ray::default();
        camera.ray_through(aim(&camera, &hover.markers()[east]), &mut ray);
        assert_eq!(pick(&ray, &camera.basis(), hover.markers()), Some(east));
        camera.ray_through(EMPTY, &mut ray);
        assert_eq!(pick(&ray, &camera.basis(), hover.markers()), None);
    }

    #[test]
    fn pick_prefers_nearest_overlapping_sprite() {
        let basis = Camera::default().basis();
        let mut near = select_pins(&[point(10.0, 0.0, "Near")], &SphereProjector::default(), 1).remove(0);
        let mut far = near.clone();
        near.position = DVec3::new(0.0, 0.0, 150.0);
        far.position = DVec3::new(0.0, 0.0, 120.0);
        far.country = "Far".to_string();
        let ray = Ray {
            origin: DVec3::new(0.0, 1.0, 300.0),
            dir: DVec3::NEG_Z,
        };
        assert_eq!(pick(&ray, &basis, &[far.clone(), near.clone()]), Some(1));
        assert_eq!(pick(&ray, &basis, &[near, far]), Some(0));
    }

    #[test]
    fn enter_elevates_and_opens_popup_above_pin() {
        let (mut hover, camera, projector) = controller(PopupStyle::CountryLabel);
        let east = index_of(&hover, "East");
        let before = hover.markers()[east].clone();
        assert!(hover.pointer_move(&camera, aim(&camera, &before), &projector));

        let marker = &hover.markers()[east];
        assert_eq!(hover.hovered(), Some(east));
        assert!((marker.scale / marker.base_scale - HOVER_SCALE).abs() < 1e-12);
        assert!(marker.position.length() > before.position.length());
        assert!(hover.markers().iter().all(|m| std::ptr::eq(m, marker) || m.render_order < marker.render_order));

        let popup = hover.popup().unwrap();
        assert_eq!(popup.content, PopupContent::Country("East".to_string()));
        assert!(popup.position.length() > marker.position.length());
    }

    #[test]
    fn moving_within_same_pin_is_a_no_op() {
        let (mut hover, camera, projector) = controller(PopupStyle::ProfileCard);
        let east = index_of(&hover, "East");
        let ndc = aim(&camera, &hover.markers()[east]);
        assert!(hover.pointer_move(&camera, ndc, &projector));
        let popup = hover.popup().cloned();
        assert!(!hover.pointer_move(&camera, ndc + DVec2::new(0.001, 0.0), &projector));
        assert_eq!(hover.popup().cloned(), popup);
    }

    #[test]
    fn leaving_restores_base_values_exactly() {
        let (mut hover, camera, projector) = controller(PopupStyle::CountryLabel);
        let west = index_of(&hover, "West");
        let before = hover.markers()[west].clone();
        hover.pointer_move(&camera, aim(&camera, &before), &projector);
        assert!(hover.pointer_move(&camera, EMPTY, &projector));

        let after = &hover.markers()[west];
        assert_eq!(after.position.to_array().map(f64::to_bits), before.position.to_array().map(f64::to_bits));
        assert_eq!(after.scale.to_bits(), before.scale.to_bits());
        assert_eq!(after.render_order, before.render_order);
        assert_eq!(hover.hovered(), None);
        assert!(hover.popup().is_none());
    }

    #[test]
    fn switching_pins_keeps_a_single_hover() {
        let (mut hover, camera, projector) = controller(PopupStyle::CountryLabel);
        let targets: Vec<DVec2> = hover.markers().iter().map(|m| aim(&camera, m)).collect();
        let path = [targets[0], targets[1], EMPTY, targets[2], targets[0], targets[2], EMPTY, targets[1]];
        for ndc in path {
            hover.pointer_move(&camera, ndc, &projector);
            let elevated = hover.markers().iter().filter(|m| m.is_elevated()).count();
            assert!(elevated <= 1);
            assert_eq!(elevated == 1, hover.hovered().is_some());
            assert_eq!(hover.popup().is_some(), hover.hovered().is_some());
        }
    }

    #[test]
    fn sticky_popup_survives_empty_space() {
        let (mut hover, camera, projector) = controller(PopupStyle::ProfileCard);
        let north = index_of(&hover, "North");
        hover.pointer_move(&camera, aim(&camera, &hover.markers()[north]), &projector);
        hover.set_popup_hovered(true);
        assert!(!hover.pointer_move(&camera, EMPTY, &projector));
        assert_eq!(hover.hovered(), Some(north));
        assert!(hover.popup().is_some());

        hover.set_popup_hovered(false);
        assert!(hover.pointer_move(&camera, EMPTY, &projector));
        assert!(hover.popup().is_none());
        assert!(!hover.markers()[north].is_elevated());
    }

    #[test]
    fn pins_under_the_card_do_not_steal_hover() {
        let (mut hover, camera, projector) = controller(PopupStyle::ProfileCard);
        let west = index_of(&hover, "West");
        let north = index_of(&hover, "North");
        let north_ndc = aim(&camera, &hover.markers()[north]);
        hover.pointer_move(&camera, aim(&camera, &hover.markers()[west]), &projector);
        let card = hover.popup().cloned();

        hover.set_popup_hovered(true);
        assert!(!hover.pointer_move(&camera, north_ndc, &projector));
        assert_eq!(hover.hovered(), Some(west));
        assert_eq!(hover.popup().cloned(), card);
        assert!(!hover.markers()[north].is_elevated());

        hover.set_popup_hovered(false);
        assert!(hover.pointer_move(&camera, north_ndc, &projector));
        assert_eq!(hover.hovered(), Some(north));
    }

    #[test]
    fn card_paging_wraps_and_tracks_marker() {
        let (mut hover, camera, projector) = controller(PopupStyle::ProfileCard);
        let east = index_of(&hover, "East");
        hover.pointer_move(&camera, aim(&camera, &hover.markers()[east]), &projector);
        let Some(PopupContent::Profile { index: start }) = hover.popup().map(|p| p.content.clone()) else {
            panic!("card popup expected");
        };
        for _ in 0..ROSTER.len() {
            assert!(hover.page_next());
        }
        assert_eq!(hover.popup().unwrap().content, PopupContent::Profile { index: start });
        assert!(hover.page_prev());
        let expected = (start + ROSTER.len() - 1) % ROSTER.len();
        assert_eq!(hover.popup().unwrap().content, PopupContent::Profile { index: expected });
        assert_eq!(hover.markers()[east].profile_index, Some(expected));
    }

    #[test]
    fn label_popup_does_not_page() {
        let (mut hover, camera, projector) = controller(PopupStyle::CountryLabel);
        hover.pointer_move(&camera, aim(&camera, &hover.markers()[0]), &projector);
        assert!(!hover.page_next());
    }

    #[test]
    fn seeded_profile_choice_is_reproducible() {
        let run = || {
            let (mut hover, camera, projector) = controller(PopupStyle::ProfileCard);
            let targets: Vec<DVec2> = hover.markers().iter().map(|m| aim(&camera, m)).collect();
            let mut seen = Vec::new();
            for ndc in targets.iter().chain(targets.iter()) {
                hover.pointer_move(&camera, *ndc, &projector);
                seen.push(hover.popup().unwrap().content.clone());
            }
            seen
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn events_after_unmount_are_ignored() {
        let (mut hover, camera, projector) = controller(PopupStyle::ProfileCard);
        let ndc = aim(&camera, &hover.markers()[0]);
        hover.unmount();
        assert!(hover.markers().is_empty());
        assert!(!hover.pointer_move(&camera, ndc, &projector));
        hover.set_popup_hovered(true);
        assert!(!hover.popup_hovered());
        assert!(!hover.page_next());
        assert!(hover.popup().is_none());
    }

    #[test]
    fn new_marker_set_clears_hover() {
        let (mut hover, camera, projector) = controller(PopupStyle::CountryLabel);
        hover.pointer_move(&camera, aim(&camera, &hover.markers()[0]), &projector);
        hover.set_markers(Vec::new());
        assert_eq!(hover.hovered(), None);
        assert!(hover.popup().is_none());
        assert!(!hover.pointer_move(&camera, EMPTY, &projector));
    }
}
