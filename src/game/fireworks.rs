//! Firework bursts for the post-results finale.
//!
//! Scene space is normalized: x in [0, 1] left to right, y in [0, 1] bottom to top.
//! All times are milliseconds on the session clock.

use glam::DVec2;
use std::f64::consts::PI;

pub const POOL_SIZE: usize = 8;

const FUSE_MS: (f64, f64) = (700.0, 1_300.0);
const LIVE_SPAN_MS: (f64, f64) = (1_200.0, 2_200.0);
const RESPAWN_DELAY_MS: (f64, f64) = (0.0, 1_200.0);
const EXPAND_MS: f64 = 350.0;
const LAUNCH_X: (f64, f64) = (0.1, 0.9);
const TARGET_DRIFT_X: f64 = 0.25;
const TARGET_X_BOUNDS: (f64, f64) = (0.05, 0.95);
const TARGET_Y: (f64, f64) = (0.55, 0.9);
const CONTROL_U: (f64, f64) = (0.2, 0.8);
const RADIUS: (f64, f64) = (0.06, 0.14);
const PARTICLES: (u32, u32) = (14, 30);
/// Scene units per second squared.
pub const GRAVITY: f64 = 0.18;

/// Source of uniform samples in `[0, 1)`.
pub trait UnitSource {
    fn unit(&mut self) -> f64;
}

/// Adapts any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl<R: rand::Rng> UnitSource for RngSource<R> {
    #[inline(always)]
    fn unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

#[inline(always)]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (b - a).mul_add(t, a)
}

#[inline(always)]
fn sample(range: (f64, f64), rng: &mut impl UnitSource) -> f64 {
    lerp(range.0, range.1, rng.unit().clamp(0.0, 1.0))
}

// Between launch and target in x, anywhere from the ground up to the target in y.
fn control_point(launch: DVec2, target: DVec2, rng: &mut impl UnitSource) -> DVec2 {
    let u = sample(CONTROL_U, rng);
    DVec2::new(lerp(launch.x, target.x, u), sample((0.0, target.y), rng))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BurstPhase {
    /// Rocket climbing along its path; `progress` in `[0, 1)`.
    Fusing { progress: f64 },
    Live {
        /// Current ring radius in scene units.
        ring_radius: f64,
        /// Half-sine envelope over the live span.
        alpha: f64,
    },
    Expired,
}

/// One firework, immutable once spawned.
#[derive(Debug, Clone, PartialEq)]
pub struct Burst {
    pub start_time: f64,
    pub fuse_duration: f64,
    /// Fuse plus live span, relative to `start_time`.
    pub lifetime: f64,
    pub respawn_at: f64,
    pub expand_duration: f64,
    pub launch: DVec2,
    pub control_a: DVec2,
    pub control_b: DVec2,
    pub target: DVec2,
    pub radius: f64,
    pub particle_count: u32,
    pub hue: f64,
}

impl Burst {
    pub fn spawn(now: f64, rng: &mut impl UnitSource) -> Self {
        let fuse_duration = sample(FUSE_MS, rng);
        let lifetime = fuse_duration + sample(LIVE_SPAN_MS, rng);
        let respawn_at = now + lifetime + sample(RESPAWN_DELAY_MS, rng);

        let launch = DVec2::new(sample(LAUNCH_X, rng), 0.0);
        let drift = sample((-TARGET_DRIFT_X, TARGET_DRIFT_X), rng);
        let target = DVec2::new(
            (launch.x + drift).clamp(TARGET_X_BOUNDS.0, TARGET_X_BOUNDS.1),
            sample(TARGET_Y, rng),
        );

        let control_a = control_point(launch, target, rng);
        let control_b = control_point(launch, target, rng);

        let radius = sample(RADIUS, rng);
        let span = f64::from(PARTICLES.1 - PARTICLES.0 + 1);
        let particle_count =
            (PARTICLES.0 + (rng.unit().clamp(0.0, 1.0) * span) as u32).min(PARTICLES.1);
        let hue = sample((0.0, 360.0), rng);

        Self {
            start_time: now,
            fuse_duration,
            lifetime,
            respawn_at,
            expand_duration: EXPAND_MS,
            launch,
            control_a,
            control_b,
            target,
            radius,
            particle_count,
            hue,
        }
    }

    #[inline(always)]
    pub fn age(&self, now: f64) -> f64 {
        (now - self.start_time).max(0.0)
    }

    #[inline(always)]
    pub fn live_span(&self) -> f64 {
        self.lifetime - self.fuse_duration
    }

    pub fn phase(&self, now: f64) -> BurstPhase {
        let age = self.age(now);
        if age < self.fuse_duration {
            return BurstPhase::Fusing {
                progress: age / self.fuse_duration,
            };
        }
        if age >= self.lifetime {
            return BurstPhase::Expired;
        }
        let live_age = age - self.fuse_duration;
        let expand = if self.expand_duration > 0.0 {
            (live_age / self.expand_duration).min(1.0)
        } else {
            1.0
        };
        let span = self.live_span();
        let alpha = if span > 0.0 {
            (PI * live_age / span).sin().max(0.0)
        } else {
            0.0
        };
        BurstPhase::Live {
            ring_radius: self.radius * expand,
            alpha,
        }
    }

    /// Cubic Bezier from launch to target, `t` in `[0, 1]`.
    pub fn point_on_path(&self, t: f64) -> DVec2 {
        let t = t.clamp(0.0, 1.0);
        let mt = 1.0 - t;
        self.launch * (mt * mt * mt)
            + self.control_a * (3.0 * mt * mt * t)
            + self.control_b * (3.0 * mt * t * t)
            + self.target * (t * t * t)
    }

    /// Ring positions after the gravity drop; empty outside the live phase.
    /// Gravity runs on the burst's full age, so the ring already hangs below the
    /// target when it opens.
    pub fn particle_positions(&self, now: f64) -> Vec<DVec2> {
        let BurstPhase::Live { ring_radius, .. } = self.phase(now) else {
            return Vec::new();
        };
        let secs = self.age(now) / 1_000.0;
        let drop = 0.5 * GRAVITY * secs * secs;
        let n = self.particle_count.max(1);
        (0..n)
            .map(|i| {
                let angle = 2.0 * PI * f64::from(i) / f64::from(n);
                self.target + DVec2::new(angle.cos(), angle.sin()) * ring_radius
                    - DVec2::new(0.0, drop)
            })
            .collect()
    }
}

/// Fixed pool; each slot is refilled once its burst's `respawn_at` passes.
#[derive(Debug, Clone, Default)]
pub struct FireworksPool {
    slots: [Option<Burst>; POOL_SIZE],
}

impl FireworksPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, now: f64, rng: &mut impl UnitSource) {
        for slot in &mut self.slots {
            let due = slot.as_ref().is_none_or(|b| b.respawn_at <= now);
            if due {
                *slot = Some(Burst::spawn(now, rng));
            }
        }
    }

    pub fn bursts(&self) -> impl Iterator<Item = &Burst> {
        self.slots.iter().flatten()
    }
}
