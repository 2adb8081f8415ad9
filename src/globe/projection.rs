//! Sphere surface projection, orbit camera and pointer rays

use glam::{DVec2, DVec3};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Radius of the globe in world units.
pub const GLOBE_RADIUS: f64 = 100.0;

/// Camera distance from the globe center.
pub const CAMERA_DISTANCE: f64 = 300.0;

/// Vertical field of view, degrees.
pub const CAMERA_FOV_DEG: f64 = 50.0;

const NEAR_PLANE: f64 = 1.0;

/// Orbit limits, measured from the +Y pole.
pub const MIN_POLAR: f64 = PI / 3.5;
pub const MAX_POLAR: f64 = PI - PI / 3.0;

/// Maps geographic coordinates onto a point above the globe surface.
///
/// `altitude` is relative to the globe radius: 0.0 is the surface, 0.1
/// is ten percent of the radius above it.
pub trait SurfaceProjector {
    fn project_to_surface(&self, lat: f64, lng: f64, altitude: f64) -> DVec3;
}

impl<F> SurfaceProjector for F
where
    F: Fn(f64, f64, f64) -> DVec3,
{
    fn project_to_surface(&self, lat: f64, lng: f64, altitude: f64) -> DVec3 {
        self(lat, lng, altitude)
    }
}

/// Spherical projector. +Z faces the initial camera, +Y is north.
#[derive(Clone, Copy, Debug)]
pub struct SphereProjector {
    pub radius: f64,
}

impl Default for SphereProjector {
    fn default() -> Self {
        Self { radius: GLOBE_RADIUS }
    }
}

impl SurfaceProjector for SphereProjector {
    fn project_to_surface(&self, lat: f64, lng: f64, altitude: f64) -> DVec3 {
        let phi = (90.0 - lat).to_radians();
        let theta = (90.0 - lng).to_radians();
        let r = self.radius * (1.0 + altitude);
        DVec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.cos(),
            r * phi.sin() * theta.sin(),
        )
    }
}

/// Great-circle interpolation between two surface directions.
pub fn slerp(a: DVec3, b: DVec3, t: f64) -> DVec3 {
    let (a, b) = (a.normalize_or_zero(), b.normalize_or_zero());
    let dot = a.dot(b).clamp(-1.0, 1.0);
    let omega = dot.acos();
    if omega.abs() < 1e-9 {
        return a;
    }
    let sin_omega = omega.sin();
    if sin_omega.abs() < 1e-9 {
        // Antipodal: any great circle works, keep the lerp fallback.
        return a.lerp(b, t).normalize_or_zero();
    }
    a * (((1.0 - t) * omega).sin() / sin_omega) + b * ((t * omega).sin() / sin_omega)
}

/// A pointer ray. Kept around by the hover controller and rewritten in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub dir: DVec3,
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: DVec3::ZERO,
            dir: DVec3::NEG_Z,
        }
    }
}

impl Ray {
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.dir * t
    }
}

/// Orthonormal camera frame.
#[derive(Clone, Copy, Debug)]
pub struct Basis {
    pub forward: DVec3,
    pub right: DVec3,
    pub up: DVec3,
}

/// Perspective camera orbiting the globe center.
#[derive(Clone, Debug)]
pub struct Camera {
    pub distance: f64,
    /// Rotation around +Y, radians. 0 looks down -Z.
    pub azimuth: f64,
    /// Angle from the +Y pole, radians. PI/2 sits on the equator.
    pub polar: f64,
    pub fov_y: f64,
    /// Width over height of the drawing surface.
    pub aspect: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            distance: CAMERA_DISTANCE,
            azimuth: 0.0,
            polar: FRAC_PI_2,
            fov_y: CAMERA_FOV_DEG.to_radians(),
            aspect: 1.2,
        }
    }
}

impl Camera {
    pub fn with_polar(polar: f64) -> Self {
        Self {
            polar: polar.clamp(MIN_POLAR, MAX_POLAR),
            ..Self::default()
        }
    }

    pub fn position(&self) -> DVec3 {
        let s = self.polar.sin();
        DVec3::new(
            self.distance * s * self.azimuth.sin(),
            self.distance * self.polar.cos(),
            self.distance * s * self.azimuth.cos(),
        )
    }

    pub fn basis(&self) -> Basis {
        let forward = (-self.position()).normalize();
        let right = forward.cross(DVec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        Basis { forward, right, up }
    }

    /// Rotate around the globe, keeping the polar angle inside the orbit limits.
    pub fn orbit(&mut self, d_azimuth: f64, d_polar: f64) {
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(TAU);
        self.polar = (self.polar + d_polar).clamp(MIN_POLAR, MAX_POLAR);
    }

    fn tan_half_fov(&self) -> f64 {
        (self.fov_y * 0.5).tan()
    }

    /// World point to normalized device coordinates plus view depth.
    /// Points behind the near plane yield `None`.
    pub fn project(&self, p: DVec3) -> Option<(DVec2, f64)> {
        let basis = self.basis();
        let v = p - self.position();
        let depth = v.dot(basis.forward);
        if depth <= NEAR_PLANE {
            return None;
        }
        let t = self.tan_half_fov();
        let x = v.dot(basis.right) / (depth * t * self.aspect);
        let y = v.dot(basis.up) / (depth * t);
        Some((DVec2::new(x, y), depth))
    }

    /// Aim `ray` from the camera through a point given in NDC.
    pub fn ray_through(&self, ndc: DVec2, ray: &mut Ray) {
        let basis = self.basis();
        let t = self.tan_half_fov();
        ray.origin = self.position();
        ray.dir = (basis.forward + basis.right * (ndc.x * t * self.aspect) + basis.up * (ndc.y * t))
            .normalize();
    }

    /// True when the straight line from the camera to `p` passes through
    /// the globe of radius `radius` before reaching `p`.
    pub fn is_occluded(&self, p: DVec3, radius: f64) -> bool {
        let origin = self.position();
        let to_p = p - origin;
        let len = to_p.length();
        if len <= f64::EPSILON {
            return false;
        }
        let dir = to_p / len;
        let b = origin.dot(dir);
        let c = origin.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc <= 0.0 {
            return false;
        }
        let t_near = -b - disc.sqrt();
        t_near > 0.0 && t_near < len - 1e-6
    }

    /// NDC radius of the globe silhouette (vertical axis).
    pub fn silhouette_radius(&self, radius: f64) -> f64 {
        let ratio = (radius / self.distance).min(1.0);
        ratio.asin().tan() / self.tan_half_fov()
    }
}

/// Terminal drawing surface in cells, with a braille grid of 2x4 dots per cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn dots(&self) -> (usize, usize) {
        (self.width as usize * 2, self.height as usize * 4)
    }

    /// Braille dots are roughly square, so this is also the pixel aspect.
    pub fn aspect(&self) -> f64 {
        let (w, h) = self.dots();
        if h == 0 {
            1.0
        } else {
            w as f64 / h as f64
        }
    }

    /// Center of a terminal cell in normalized device coordinates.
    pub fn cell_to_ndc(&self, col: u16, row: u16) -> DVec2 {
        let w = self.width.max(1) as f64;
        let h = self.height.max(1) as f64;
        DVec2::new(
            (col as f64 + 0.5) / w * 2.0 - 1.0,
            -((row as f64 + 0.5) / h) * 2.0 + 1.0,
        )
    }

    pub fn ndc_to_dot(&self, ndc: DVec2) -> (f64, f64) {
        let (w, h) = self.dots();
        ((ndc.x + 1.0) * 0.5 * w as f64, (1.0 - ndc.y) * 0.5 * h as f64)
    }

    pub fn ndc_to_cell(&self, ndc: DVec2) -> (i32, i32) {
        let (x, y) = self.ndc_to_dot(ndc);
        ((x / 2.0).floor() as i32, (y / 4.0).floor() as i32)
    }
}
