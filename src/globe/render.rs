//! Braille rasterizer for the globe, its arcs, points, rings and pins

use super::outlines::CONTINENTS;
use super::pins::PinMarker;
use super::points::{Arc, GeoPoint};
use super::popup::{layout_card, present, CardLayout, Popup, Profile};
use super::projection::{slerp, Camera, SurfaceProjector, Viewport, GLOBE_RADIUS};
use super::rings::{ripples, RingEvent};
use crate::colors::{blend, css_or, dim};
use crate::config::{GlobeConfig, VariantStyle};
use crate::help::draw_box;
use crate::terminal::Terminal;
use crossterm::style::Color;
use glam::DVec3;
use std::f64::consts::PI;
use std::time::Duration;

/// Gap between arc dashes, in arc lengths.
pub const ARC_DASH_GAP: f64 = 15.0;

/// Surface points are tested against a slightly smaller sphere so they do
/// not occlude themselves.
const OCCLUDER: f64 = GLOBE_RADIUS * 0.999;

// Draw priority, later wins when two things share a dot.
const LAYER_ATMOSPHERE: u8 = 1;
const LAYER_GRATICULE: u8 = 2;
const LAYER_LAND: u8 = 3;
const LAYER_RING: u8 = 4;
const LAYER_POINT: u8 = 5;
const LAYER_ARC: u8 = 6;

/// Grid of braille dots, 2x4 per terminal cell, each with a layer and color.
pub struct Canvas {
    width: usize,
    height: usize,
    dots: Vec<Option<(u8, Color)>>,
}

impl Canvas {
    pub fn new(viewport: Viewport) -> Self {
        let (width, height) = viewport.dots();
        Self {
            width,
            height,
            dots: vec![None; width * height],
        }
    }

    pub fn plot(&mut self, x: f64, y: f64, layer: u8, color: Color) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        let slot = &mut self.dots[y * self.width + x];
        if slot.map_or(true, |(l, _)| layer >= l) {
            *slot = Some((layer, color));
        }
    }

    #[cfg(test)]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.dots[y * self.width + x].is_some()
    }

    /// Fold dots into braille characters colored by their top layer.
    pub fn flush(&self, term: &mut Terminal) {
        const DOT_BITS: [u8; 8] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];
        for cy in 0..self.height / 4 {
            let by = cy * 4;
            for cx in 0..self.width / 2 {
                let bx = cx * 2;
                let positions = [
                    (by, bx), (by + 1, bx), (by + 2, bx),
                    (by, bx + 1), (by + 1, bx + 1), (by + 2, bx + 1),
                    (by + 3, bx), (by + 3, bx + 1),
                ];

                let mut bits: u8 = 0;
                let mut top: Option<(u8, Color)> = None;
                for (i, &(py, px)) in positions.iter().enumerate() {
                    if let Some((layer, color)) = self.dots[py * self.width + px] {
                        bits |= DOT_BITS[i];
                        if top.map_or(true, |(l, _)| layer >= l) {
                            top = Some((layer, color));
                        }
                    }
                }

                if let (Some((layer, color)), Some(ch)) = (top, char::from_u32(0x2800 + bits as u32)) {
                    term.set(cx as i32, cy as i32, ch, Some(color), layer >= LAYER_ARC);
                }
            }
        }
    }
}

/// Everything one frame needs.
pub struct Scene<'a, P: SurfaceProjector + ?Sized> {
    pub camera: &'a Camera,
    pub viewport: Viewport,
    pub projector: &'a P,
    pub config: &'a GlobeConfig,
    pub style: VariantStyle,
    pub arcs: &'a [Arc],
    pub points: &'a [GeoPoint],
    pub rings: &'a [RingEvent],
    /// Time since the active rings were emitted.
    pub ring_age: Duration,
    /// Pins, lowest render order first.
    pub markers: Vec<&'a PinMarker>,
    pub popup: Option<&'a Popup>,
    pub roster: &'a [Profile],
    /// Time since mount, drives the arc dashes.
    pub elapsed: Duration,
}

impl<P: SurfaceProjector + ?Sized> Scene<'_, P> {
    fn to_dot(&self, p: DVec3) -> Option<(f64, f64)> {
        let (ndc, _) = self.camera.project(p)?;
        Some(self.viewport.ndc_to_dot(ndc))
    }

    fn plot_surface(&self, canvas: &mut Canvas, lat: f64, lng: f64, alt: f64, layer: u8, color: Color) {
        let p = self.projector.project_to_surface(lat, lng, alt);
        if self.camera.is_occluded(p, OCCLUDER) {
            return;
        }
        if let Some((x, y)) = self.to_dot(p) {
            canvas.plot(x, y, layer, color);
        }
    }
}

/// Draw the full frame. Returns where the popup card landed, if one is open.
pub fn render<P>(term: &mut Terminal, scene: &Scene<'_, P>) -> Option<CardLayout>
where
    P: SurfaceProjector + ?Sized,
{
    let mut canvas = Canvas::new(scene.viewport);
    let config = scene.config;

    if config.show_atmosphere {
        draw_atmosphere(&mut canvas, scene);
    }
    draw_graticule(&mut canvas, scene);
    draw_land(&mut canvas, scene);
    draw_rings(&mut canvas, scene);
    draw_points(&mut canvas, scene);
    draw_arcs(&mut canvas, scene);

    canvas.flush(term);
    let raised = draw_pins(term, scene);
    draw_popup(term, scene, raised)
}

fn draw_atmosphere<P: SurfaceProjector + ?Sized>(canvas: &mut Canvas, scene: &Scene<'_, P>) {
    let color = dim(css_or(&scene.config.atmosphere_color, Color::White), 0.5);
    let (cx, cy) = scene.viewport.ndc_to_dot(glam::DVec2::ZERO);
    let (_, h) = scene.viewport.dots();
    let r_ndc = scene.camera.silhouette_radius(GLOBE_RADIUS * (1.0 + scene.config.atmosphere_altitude));
    let r = r_ndc * h as f64 * 0.5;
    let steps = (r * 8.0).max(32.0) as usize;
    for i in 0..steps {
        let a = i as f64 / steps as f64 * 2.0 * PI;
        canvas.plot(cx + r * a.cos(), cy + r * a.sin(), LAYER_ATMOSPHERE, color);
    }
}

fn draw_graticule<P: SurfaceProjector + ?Sized>(canvas: &mut Canvas, scene: &Scene<'_, P>) {
    let base = css_or(&scene.config.globe_color, Color::DarkMagenta);
    let glow = css_or(&scene.config.emissive, Color::Black);
    // The globe fill is dark, so lines are lifted toward white to stay visible.
    let color = blend(
        blend(base, Color::Rgb { r: 160, g: 140, b: 190 }, 0.5),
        glow,
        scene.config.emissive_intensity,
    );

    for lat in (-60..=60).step_by(30) {
        for lng in -180..180 {
            scene.plot_surface(canvas, lat as f64, lng as f64, 0.0, LAYER_GRATICULE, color);
        }
    }
    for lng in (-180..180).step_by(30) {
        for lat in -90..=90 {
            scene.plot_surface(canvas, lat as f64, lng as f64, 0.0, LAYER_GRATICULE, color);
        }
    }
}

fn draw_land<P: SurfaceProjector + ?Sized>(canvas: &mut Canvas, scene: &Scene<'_, P>) {
    let color = css_or(&scene.config.polygon_color, Color::White);
    for outline in CONTINENTS {
        let pts = outline.points;
        for i in 0..pts.len() {
            let (lat1, lng1) = pts[i];
            let (lat2, lng2) = pts[(i + 1) % pts.len()];
            for t in 0..20 {
                let frac = t as f64 / 20.0;
                let lat = lat1 + (lat2 - lat1) * frac;
                let lng = lng1 + (lng2 - lng1) * frac;
                scene.plot_surface(canvas, lat, lng, 0.0, LAYER_LAND, color);
            }
        }
    }
}

fn draw_points<P: SurfaceProjector + ?Sized>(canvas: &mut Canvas, scene: &Scene<'_, P>) {
    let size = scene.config.point_size.max(0.0).round() as i32;
    for point in scene.points {
        let p = scene.projector.project_to_surface(point.lat, point.lng, 0.0);
        if scene.camera.is_occluded(p, OCCLUDER) {
            continue;
        }
        let Some((x, y)) = scene.to_dot(p) else {
            continue;
        };
        let color = css_or(&point.color, Color::Cyan);
        for dy in -size..=size {
            for dx in -size..=size {
                canvas.plot(x + dx as f64, y + dy as f64, LAYER_POINT, color);
            }
        }
    }
}

/// Portion `[from, to]` of the arc (in arc lengths) lit by the dash at
/// `elapsed`, or `None` while the dash is in its gap.
pub fn dash_window(elapsed: Duration, arc_time_ms: f64, dash: f64, initial_gap: f64) -> Option<(f64, f64)> {
    if arc_time_ms <= 0.0 || dash <= 0.0 {
        return None;
    }
    let period = dash + ARC_DASH_GAP;
    let head = (elapsed.as_secs_f64() * 1000.0 / arc_time_ms - initial_gap).rem_euclid(period);
    if head - dash >= 1.0 {
        return None;
    }
    Some(((head - dash).max(0.0), head.min(1.0)))
}

fn draw_arcs<P: SurfaceProjector + ?Sized>(canvas: &mut Canvas, scene: &Scene<'_, P>) {
    let config = scene.config;
    for arc in scene.arcs {
        let Some((from, to)) =
            dash_window(scene.elapsed, config.arc_time, config.arc_length, arc.order as f64)
        else {
            continue;
        };
        let a = scene.projector.project_to_surface(arc.start_lat, arc.start_lng, 0.0);
        let b = scene.projector.project_to_surface(arc.end_lat, arc.end_lng, 0.0);
        let radius = a.length();
        let color = css_or(&arc.color, Color::White);

        let steps = 120;
        for i in 0..=steps {
            let t = from + (to - from) * i as f64 / steps as f64;
            let lift = 1.0 + arc.arc_alt * (t * PI).sin();
            let p = slerp(a, b, t) * radius * lift;
            if scene.camera.is_occluded(p, OCCLUDER) {
                continue;
            }
            if let Some((x, y)) = scene.to_dot(p) {
                canvas.plot(x, y, LAYER_ARC, color);
            }
        }
    }
}

/// Point `distance_deg` away from (lat, lng) along `bearing` (radians).
fn destination(lat: f64, lng: f64, distance_deg: f64, bearing: f64) -> (f64, f64) {
    let (phi1, lambda1) = (lat.to_radians(), lng.to_radians());
    let delta = distance_deg.to_radians();
    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * bearing.cos()).asin();
    let lambda2 = lambda1
        + (bearing.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());
    (phi2.to_degrees(), lambda2.to_degrees())
}

fn draw_rings<P: SurfaceProjector + ?Sized>(canvas: &mut Canvas, scene: &Scene<'_, P>) {
    let period = scene.config.ring_repeat_period();
    for ring in scene.rings {
        let base = css_or(&ring.color, Color::White);
        for (radius, fade) in ripples(scene.ring_age, scene.config.max_rings, period) {
            if radius <= 0.0 {
                continue;
            }
            let color = dim(base, fade);
            for k in 0..48 {
                let bearing = k as f64 / 48.0 * 2.0 * PI;
                let (lat, lng) = destination(ring.lat, ring.lng, radius, bearing);
                scene.plot_surface(canvas, lat, lng, 0.0, LAYER_RING, color);
            }
        }
    }
}

/// Draws the visible pins and returns the cell of the raised one.
fn draw_pins<P: SurfaceProjector + ?Sized>(term: &mut Terminal, scene: &Scene<'_, P>) -> Option<(i32, i32)> {
    let up = scene.camera.basis().up;
    let mut raised = None;
    for marker in &scene.markers {
        if scene.camera.is_occluded(marker.position, OCCLUDER) {
            continue;
        }
        // Sprites hang upward from their anchor; draw at the sprite center.
        let center = marker.position + up * (marker.scale * 0.5);
        let Some((ndc, _)) = scene.camera.project(center) else {
            continue;
        };
        let (col, row) = scene.viewport.ndc_to_cell(ndc);
        let color = css_or(&marker.color, Color::Cyan);
        if marker.is_elevated() {
            term.set(col, row, scene.style.pin_glyph, Some(Color::White), true);
            raised = Some((col, row));
        } else {
            term.set(col, row, scene.style.pin_glyph, Some(color), false);
        }
    }
    raised
}

/// `● ○ ○` style page indicator.
pub fn page_dots(current: usize, total: usize) -> String {
    (0..total)
        .map(|i| if i == current { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

fn draw_popup<P: SurfaceProjector + ?Sized>(
    term: &mut Terminal,
    scene: &Scene<'_, P>,
    raised: Option<(i32, i32)>,
) -> Option<CardLayout> {
    let popup = scene.popup?;
    let view = present(Some(popup), scene.roster)?;
    let (ndc, _) = scene.camera.project(popup.position)?;
    let mut anchor = scene.viewport.ndc_to_cell(ndc);
    // Keep the raised pin visible below the card.
    if let Some((_, row)) = raised {
        anchor.1 = anchor.1.min(row);
    }
    let layout = layout_card(&view, anchor, term.size());

    let mut lines = view.lines.clone();
    if let Some((current, total)) = view.page {
        lines.push(page_dots(current, total));
    }
    draw_box(term, layout.card, &lines, Color::White, Color::Grey);
    if let (Some(prev), Some(next)) = (layout.prev, layout.next) {
        term.set(prev.x as i32, prev.y as i32, '❮', Some(Color::Cyan), true);
        term.set(next.x as i32 + 1, next.y as i32, '❯', Some(Color::Cyan), true);
    }
    Some(layout)
}
