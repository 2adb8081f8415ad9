//! Interactive globe: arcs, deduplicated points, hoverable pins and ring pulses

pub mod country;
pub mod data;
pub mod hover;
pub mod outlines;
pub mod pins;
pub mod points;
pub mod popup;
pub mod projection;
pub mod render;
pub mod rings;

use crate::config::{GlobeConfig, RunConfig, Variant, VariantStyle};
use crate::help::{render_help_overlay, GLOBE_HELP};
use crate::terminal::{MouseCaptureGuard, Terminal};
use country::{default_resolver, CountryResolver};
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use crossterm::style::Color;
use data::{load_arcs, sample_arcs, DataError};
use glam::DVec2;
use hover::HoverController;
use pins::{select_pins, PinMarker};
use points::{dedup_points, valid_arcs, Arc, GeoPoint};
use popup::{CardLayout, ROSTER};
use projection::{Camera, SphereProjector, SurfaceProjector, Viewport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use render::Scene;
use rings::RingScheduler;
use std::f64::consts::TAU;
use std::io;
use std::time::{Duration, Instant};

/// Autorotation, radians per second (one turn a minute).
pub const AUTOROTATE_SPEED: f64 = TAU / 60.0;

const ORBIT_STEP: f64 = 0.1;
const MIN_FRAME: Duration = Duration::from_millis(5);
const MAX_FRAME: Duration = Duration::from_secs(1);
const TILT_STEP: f64 = 0.05;

/// A mounted globe: its data, pins, hover state and ring timer.
pub struct Globe<P: SurfaceProjector = SphereProjector> {
    config: GlobeConfig,
    style: VariantStyle,
    projector: P,
    resolver: Box<dyn CountryResolver>,
    arcs: Vec<Arc>,
    points: Vec<GeoPoint>,
    hover: HoverController,
    rings: RingScheduler,
    max_pins: usize,
    mounted_at: Option<Instant>,
}

impl<P: SurfaceProjector> Globe<P> {
    /// Build the pins for `arcs` and start the ring timer at `now`.
    pub fn mount(
        run: &RunConfig,
        projector: P,
        resolver: Box<dyn CountryResolver>,
        arcs: Vec<Arc>,
        seed: u64,
        now: Instant,
    ) -> Self {
        let style = run.variant.style();
        let mut globe = Self {
            config: run.globe.clone(),
            style,
            projector,
            resolver,
            arcs: Vec::new(),
            points: Vec::new(),
            hover: HoverController::new(style.popup, ROSTER.len(), StdRng::seed_from_u64(seed)),
            rings: RingScheduler::new(run.ring_interval, StdRng::seed_from_u64(seed.wrapping_add(1))),
            max_pins: run.max_pins,
            mounted_at: Some(now),
        };
        globe.set_arcs(arcs);
        globe.rings.start(now);
        tracing::info!(
            variant = ?run.variant,
            arcs = globe.arcs.len(),
            points = globe.points.len(),
            pins = globe.hover.markers().len(),
            "globe mounted"
        );
        globe
    }

    /// Replace the arc data and rebuild points and pins from it.
    pub fn set_arcs(&mut self, arcs: Vec<Arc>) {
        self.arcs = valid_arcs(&arcs);
        self.points = dedup_points(&self.arcs, self.resolver.as_ref());
        if !self.is_mounted() {
            return;
        }
        let markers = select_pins(&self.points, &self.projector, self.max_pins);
        tracing::debug!(points = self.points.len(), pins = markers.len(), "pins rebuilt");
        self.hover.set_markers(markers);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted_at.is_some()
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn markers(&self) -> &[PinMarker] {
        self.hover.markers()
    }

    #[cfg(test)]
    pub fn hover(&self) -> &HoverController {
        &self.hover
    }

    pub fn rings(&self) -> &RingScheduler {
        &self.rings
    }

    /// Pointer at `ndc`. True when the hover state changed.
    pub fn pointer_move(&mut self, camera: &Camera, ndc: DVec2) -> bool {
        self.hover.pointer_move(camera, ndc, &self.projector)
    }

    pub fn set_popup_hovered(&mut self, hovered: bool) {
        self.hover.set_popup_hovered(hovered);
    }

    /// Page the open profile card.
    pub fn page(&mut self, forward: bool) -> bool {
        if forward {
            self.hover.page_next()
        } else {
            self.hover.page_prev()
        }
    }

    /// Run the ring timer. True when a new ring set was emitted.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.rings.poll(now, &self.arcs)
    }

    /// Drop the pins, stop the rings, ignore further pointer input.
    pub fn unmount(&mut self) {
        if self.mounted_at.take().is_some() {
            self.hover.unmount();
            self.rings.stop();
            tracing::info!("globe unmounted");
        }
    }

    /// Frame description for the renderer.
    pub fn scene<'a>(&'a self, camera: &'a Camera, viewport: Viewport, now: Instant) -> Scene<'a, P> {
        let since = |t: Option<Instant>| t.map(|t| now.saturating_duration_since(t)).unwrap_or_default();
        Scene {
            camera,
            viewport,
            projector: &self.projector,
            config: &self.config,
            style: self.style,
            arcs: &self.arcs,
            points: &self.points,
            rings: self.rings.active(),
            ring_age: since(self.rings.emitted_at()),
            markers: self.hover.draw_order(),
            popup: self.hover.popup(),
            roster: &ROSTER,
            elapsed: since(self.mounted_at),
        }
    }
}

/// Arcs from the configured file, or the demo set colored from the run seed.
pub fn initial_arcs(run: &RunConfig) -> Result<Vec<Arc>, DataError> {
    match &run.arcs_file {
        Some(path) => load_arcs(path),
        None => Ok(sample_arcs(&mut StdRng::seed_from_u64(run.seed.unwrap_or_default()))),
    }
}

fn variant_name(variant: Variant) -> &'static str {
    match variant {
        Variant::Label => "label",
        Variant::Card => "card",
        Variant::Tilted => "tilted",
    }
}

fn draw_status(term: &mut Terminal, run: &RunConfig, globe: &Globe) {
    let (_, height) = term.size();
    let line = format!(
        " termglobe · {} · {} pins · {} points · ? help ",
        variant_name(run.variant),
        globe.markers().len(),
        globe.points().len()
    );
    term.set_str(0, height as i32 - 1, &line, Some(Color::DarkGrey), false);
}

/// Frame pacing for a `--time` step in seconds, kept within 5 ms..1 s.
fn frame_interval(step: f32) -> Duration {
    Duration::try_from_secs_f32(step)
        .unwrap_or(MIN_FRAME)
        .clamp(MIN_FRAME, MAX_FRAME)
}

/// Emit a ring set and pick the instant the printed frame shows: far enough
/// in that the first dashes are in flight and the ripples are mid-growth.
fn stage_print_frame<P: SurfaceProjector>(globe: &mut Globe<P>, run: &RunConfig, start: Instant) -> Instant {
    let at = start + Duration::try_from_secs_f64(run.globe.arc_time * 1.5 / 1000.0).unwrap_or_default();
    let emitted = at
        .checked_sub(rings::ripple_lifetime(run.globe.max_rings) / 2)
        .unwrap_or(at);
    globe.rings.emit(emitted, &globe.arcs);
    at
}

fn camera_for(run: &RunConfig, viewport: Viewport) -> Camera {
    Camera {
        aspect: viewport.aspect(),
        ..Camera::with_polar(run.variant.style().camera_polar)
    }
}

/// Run the interactive globe, or print a single frame with `--print`.
pub fn run(run: RunConfig, arcs: Vec<Arc>) -> io::Result<()> {
    let seed = run.seed.unwrap_or_default();
    if run.print {
        return print_frame(&run, arcs, seed);
    }

    let mut term = Terminal::new(true)?;
    let _mouse = MouseCaptureGuard::enable()?;
    let (mut width, mut height) = term.size();
    let mut viewport = Viewport::new(width, height);
    let mut camera = camera_for(&run, viewport);
    let mut autorotate = run.autorotate.unwrap_or(run.variant.style().autorotate);
    let mut show_help = false;
    let mut card: Option<CardLayout> = None;

    let start = Instant::now();
    let mut globe = Globe::mount(&run, SphereProjector::default(), default_resolver(), arcs, seed, start);
    let mut last_frame = start;
    let frame = frame_interval(run.time_step);

    'frames: loop {
        let (w, h) = crossterm::terminal::size().unwrap_or((width, height));
        if (w, h) != (width, height) {
            width = w;
            height = h;
            term.resize(width, height);
            term.clear_screen()?;
            viewport = Viewport::new(width, height);
            camera.aspect = viewport.aspect();
        }

        let mut timeout = frame;
        while let Some(event) = term.poll_event(timeout)? {
            timeout = Duration::ZERO;
            match event {
                Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break 'frames,
                    KeyCode::Char('?') => show_help = !show_help,
                    KeyCode::Left | KeyCode::Char('h') => camera.orbit(-ORBIT_STEP, 0.0),
                    KeyCode::Right | KeyCode::Char('l') => camera.orbit(ORBIT_STEP, 0.0),
                    KeyCode::Up | KeyCode::Char('k') => camera.orbit(0.0, -TILT_STEP),
                    KeyCode::Down | KeyCode::Char('j') => camera.orbit(0.0, TILT_STEP),
                    KeyCode::Char('a') => autorotate = !autorotate,
                    KeyCode::Char('[') => {
                        globe.page(false);
                    }
                    KeyCode::Char(']') => {
                        globe.page(true);
                    }
                    KeyCode::Char('r') => match initial_arcs(&run) {
                        Ok(arcs) => {
                            globe.set_arcs(arcs);
                            card = None;
                            tracing::info!(arcs = globe.arcs().len(), "arcs reloaded");
                        }
                        Err(err) => tracing::warn!(%err, "reload failed, keeping current arcs"),
                    },
                    _ => {}
                },
                Event::Mouse(mouse) => {
                    let (col, row) = (mouse.column, mouse.row);
                    match mouse.kind {
                        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                            globe.set_popup_hovered(card.is_some_and(|c| c.contains(col, row)));
                            globe.pointer_move(&camera, viewport.cell_to_ndc(col, row));
                        }
                        MouseEventKind::Down(MouseButton::Left) => {
                            if let Some(layout) = card {
                                if layout.prev.is_some_and(|a| a.contains(col, row)) {
                                    globe.page(false);
                                } else if layout.next.is_some_and(|a| a.contains(col, row)) {
                                    globe.page(true);
                                }
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        let now = Instant::now();
        let dt = now.saturating_duration_since(last_frame).as_secs_f64();
        last_frame = now;
        if autorotate {
            camera.orbit(AUTOROTATE_SPEED * dt, 0.0);
        }
        if globe.tick(now) {
            tracing::trace!(rings = globe.rings().active().len(), "ring pulse");
        }

        term.clear();
        card = render::render(&mut term, &globe.scene(&camera, viewport, now));
        draw_status(&mut term, &run, &globe);
        if show_help {
            render_help_overlay(&mut term, GLOBE_HELP);
        }
        term.present()?;
    }

    globe.unmount();
    Ok(())
}

fn print_frame(run: &RunConfig, arcs: Vec<Arc>, seed: u64) -> io::Result<()> {
    let (width, height) = crossterm::terminal::size().unwrap_or((80, 40));
    let mut term = Terminal::offscreen(width, height);
    let viewport = Viewport::new(width, height);
    let camera = camera_for(run, viewport);

    let start = Instant::now();
    let mut globe = Globe::mount(run, SphereProjector::default(), default_resolver(), arcs, seed, start);
    let at = stage_print_frame(&mut globe, run, start);

    render::render(&mut term, &globe.scene(&camera, viewport, at));
    draw_status(&mut term, run, &globe);
    globe.unmount();
    term.print_to_stdout()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use std::path::PathBuf;

    struct Fixed(&'static str);

    impl CountryResolver for Fixed {
        fn resolve(&self, _lat: f64, _lng: f64) -> String {
            self.0.to_string()
        }
    }

    fn run_config(variant: Variant) -> RunConfig {
        RunConfig {
            variant,
            time_step: 0.03,
            seed: Some(1),
            max_pins: pins::DEFAULT_MAX_PINS,
            arcs_file: None,
            autorotate: None,
            print: false,
            ring_interval: rings::RING_INTERVAL,
            globe: GlobeConfig::default(),
        }
    }

    /// Puts everything in front of the camera and above the equator.
    fn flat(lat: f64, lng: f64, alt: f64) -> DVec3 {
        DVec3::new(lng, lat + 1.0, 1.0 + alt)
    }

    #[test]
    fn one_arc_gives_two_points_and_two_pins() {
        let arcs = vec![Arc::new(1, (0.0, 0.0), (10.0, 10.0), 0.1, "#06b6d4")];
        let globe = Globe::mount(
            &run_config(Variant::Label),
            flat,
            Box::new(Fixed("Testland")),
            arcs,
            3,
            Instant::now(),
        );
        assert_eq!(globe.points().len(), 2);
        assert_eq!(globe.markers().len(), 2);
        assert!(globe.points().iter().all(|p| p.country == "Testland"));
        assert!(globe.rings().is_running());
    }

    #[test]
    fn malformed_arcs_never_reach_the_pins() {
        let arcs = vec![
            Arc::new(1, (95.0, 0.0), (10.0, 10.0), 0.1, "#fff"),
            Arc::new(2, (f64::NAN, 0.0), (1.0, 1.0), 0.1, "#fff"),
            Arc::new(3, (5.0, 5.0), (5.0, 5.0), 0.1, "#fff"),
        ];
        let globe = Globe::mount(
            &run_config(Variant::Label),
            flat,
            Box::new(Fixed("X")),
            arcs,
            3,
            Instant::now(),
        );
        assert_eq!(globe.arcs().len(), 1);
        assert_eq!(globe.points().len(), 1);
        assert_eq!(globe.markers().len(), 1);
    }

    #[test]
    fn hover_card_then_page_then_unmount() {
        let arcs = vec![Arc::new(1, (10.0, -10.0), (30.0, 20.0), 0.2, "#3b82f6")];
        let run = run_config(Variant::Card);
        let mut globe = Globe::mount(
            &run,
            SphereProjector::default(),
            Box::new(Fixed("Somewhere")),
            arcs,
            11,
            Instant::now(),
        );
        assert_eq!(globe.markers().len(), 2);

        let camera = Camera::default();
        let marker = &globe.markers()[0];
        let center = marker.position + camera.basis().up * (marker.scale * 0.5);
        let (ndc, _) = camera.project(center).unwrap();
        assert!(globe.pointer_move(&camera, ndc));
        assert_eq!(globe.hover().hovered(), Some(0));

        let before = match globe.hover().popup().map(|p| &p.content) {
            Some(popup::PopupContent::Profile { index }) => *index,
            other => panic!("expected a profile card, got {other:?}"),
        };
        assert!(globe.page(true));
        match globe.hover().popup().map(|p| &p.content) {
            Some(popup::PopupContent::Profile { index }) => {
                assert_eq!(*index, popup::next_index(before, ROSTER.len()))
            }
            other => panic!("expected a profile card, got {other:?}"),
        }

        globe.unmount();
        assert!(!globe.is_mounted());
        assert!(globe.markers().is_empty());
        assert!(!globe.pointer_move(&camera, ndc));
        assert!(!globe.tick(Instant::now() + Duration::from_secs(10)));
        globe.unmount();
    }

    #[test]
    fn rings_follow_the_timer() {
        let arcs: Vec<Arc> = (0..10)
            .map(|i| Arc::new(i, (i as f64, 0.0), (0.0, i as f64 + 20.0), 0.1, "#6366f1"))
            .collect();
        let t0 = Instant::now();
        let mut globe = Globe::mount(&run_config(Variant::Label), flat, Box::new(Fixed("X")), arcs, 5, t0);
        assert!(!globe.tick(t0 + Duration::from_millis(500)));
        assert!(globe.tick(t0 + Duration::from_millis(2000)));
        assert_eq!(globe.rings().active().len(), 8);
    }

    #[test]
    fn printed_frame_shows_growing_ripples() {
        let arcs: Vec<Arc> = (0..10)
            .map(|i| Arc::new(i, (i as f64, 0.0), (0.0, i as f64 + 20.0), 0.1, "#6366f1"))
            .collect();
        let run = run_config(Variant::Label);
        let start = Instant::now();
        let mut globe = Globe::mount(&run, flat, Box::new(Fixed("X")), arcs, 5, start);
        let at = stage_print_frame(&mut globe, &run, start);

        let camera = Camera::default();
        let scene = globe.scene(&camera, Viewport::new(80, 40), at);
        assert_eq!(scene.rings.len(), 8);
        assert!(scene.ring_age > Duration::ZERO);
        let ripples = rings::ripples(scene.ring_age, run.globe.max_rings, run.globe.ring_repeat_period());
        assert!(ripples.iter().any(|&(radius, _)| radius > 0.0));
    }

    #[test]
    fn frame_interval_stays_in_range() {
        assert_eq!(frame_interval(0.25), Duration::from_millis(250));
        assert_eq!(frame_interval(0.0), MIN_FRAME);
        assert_eq!(frame_interval(-1.0), MIN_FRAME);
        assert_eq!(frame_interval(f32::INFINITY), MIN_FRAME);
        assert_eq!(frame_interval(f32::NAN), MIN_FRAME);
        assert_eq!(frame_interval(3600.0), MAX_FRAME);
    }

    #[test]
    fn missing_arc_file_is_an_error() {
        let mut run = run_config(Variant::Label);
        assert_eq!(initial_arcs(&run).unwrap().len(), 40);
        run.arcs_file = Some(PathBuf::from("/nonexistent/termglobe/arcs.json"));
        assert!(matches!(initial_arcs(&run), Err(DataError::Io { .. })));
    }
}
