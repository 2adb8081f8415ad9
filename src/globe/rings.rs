//! Periodic ring pulses from a random subset of arc origins

use super::points::Arc;
use rand::rngs::StdRng;
use rand::seq::index;
use std::time::{Duration, Instant};

/// Time between ring selections.
pub const RING_INTERVAL: Duration = Duration::from_millis(2000);

/// Ring growth, degrees per second.
pub const RING_PROPAGATION_SPEED: f64 = 3.0;

#[derive(Clone, Debug, PartialEq)]
pub struct RingEvent {
    pub lat: f64,
    pub lng: f64,
    pub color: String,
}

/// Rings emitted per tick: 80% of the arcs, rounded down.
pub fn ring_count(arcs: usize) -> usize {
    arcs * 4 / 5
}

pub struct RingScheduler {
    interval: Duration,
    rng: StdRng,
    active: Vec<RingEvent>,
    last_tick: Option<Instant>,
    emitted_at: Option<Instant>,
}

impl RingScheduler {
    pub fn new(interval: Duration, rng: StdRng) -> Self {
        Self {
            interval,
            rng,
            active: Vec::new(),
            last_tick: None,
            emitted_at: None,
        }
    }

    /// Arm the timer. The first tick fires one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.last_tick = Some(now);
    }

    /// Disarm the timer and forget the active rings.
    pub fn stop(&mut self) {
        self.last_tick = None;
        self.emitted_at = None;
        self.active.clear();
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.last_tick.is_some()
    }

    pub fn active(&self) -> &[RingEvent] {
        &self.active
    }

    /// When the current ring set was emitted.
    pub fn emitted_at(&self) -> Option<Instant> {
        self.emitted_at
    }

    /// Tick if an interval has passed since the last one.
    pub fn poll(&mut self, now: Instant, arcs: &[Arc]) -> bool {
        let Some(last) = self.last_tick else {
            return false;
        };
        if now.saturating_duration_since(last) < self.interval {
            return false;
        }
        self.last_tick = Some(now);
        self.emit(now, arcs);
        true
    }

    /// Pick a new ring set now, outside the timer.
    pub fn emit(&mut self, now: Instant, arcs: &[Arc]) -> &[RingEvent] {
        self.emitted_at = Some(now);
        self.tick(arcs)
    }

    /// Replace the active rings with a fresh sample of arc origins.
    pub fn tick(&mut self, arcs: &[Arc]) -> &[RingEvent] {
        let amount = ring_count(arcs.len());
        let mut picked = index::sample(&mut self.rng, arcs.len(), amount).into_vec();
        picked.sort_unstable();
        self.active = picked
            .into_iter()
            .map(|i| RingEvent {
                lat: arcs[i].start_lat,
                lng: arcs[i].start_lng,
                color: arcs[i].color.clone(),
            })
            .collect();
        &self.active
    }
}

/// How long one ripple takes to reach `max_radius`.
pub fn ripple_lifetime(max_radius: f64) -> Duration {
    Duration::try_from_secs_f64(max_radius / RING_PROPAGATION_SPEED).unwrap_or_default()
}

/// Radii (degrees) and fade (1.0 fresh, 0.0 gone) of the ripples a ring
/// shows `elapsed` after emission. A new ripple starts every
/// `repeat_period`; each grows until `max_radius`.
pub fn ripples(elapsed: Duration, max_radius: f64, repeat_period: Duration) -> Vec<(f64, f64)> {
    if max_radius <= 0.0 {
        return Vec::new();
    }
    let t = elapsed.as_secs_f64();
    let period = repeat_period.as_secs_f64();
    let lifetime = ripple_lifetime(max_radius).as_secs_f64();
    let mut out = Vec::new();
    let mut k = 0u32;
    loop {
        let age = t - k as f64 * period;
        if age < 0.0 {
            break;
        }
        if age <= lifetime {
            let radius = age * RING_PROPAGATION_SPEED;
            out.push((radius, 1.0 - radius / max_radius));
        }
        if period <= 0.0 {
            break;
        }
        k += 1;
    }
    out
}
