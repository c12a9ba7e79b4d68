//! Star Raid - a top-down arcade space shooter simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pools, spatial grid, actors, tick driver)
//! - `tuning`: Data-driven game balance
//!
//! Rendering, audio, input polling and wave scheduling belong to the host.
//! The host feeds [`sim::InputEvent`]s into [`sim::World::tick`] once per
//! fixed step and draws the returned [`sim::Snapshot`].

pub mod sim;
pub mod tuning;

pub use sim::{InputEvent, Snapshot, World};
pub use tuning::{Difficulty, Tuning, TuningError};

use glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Ticks per second
    pub const TICK_RATE: f64 = 60.0;
    /// Slack used when comparing accumulated timers against a threshold
    pub const TIMER_EPSILON: f64 = 1e-6;

    /// Default playfield dimensions
    pub const SCREEN_WIDTH: f64 = 800.0;
    pub const SCREEN_HEIGHT: f64 = 600.0;

    /// Number of points kept in a projectile trail
    pub const PROJECTILE_TRAIL_LENGTH: usize = 5;
    /// Number of points kept in the player thruster trail
    pub const THRUSTER_TRAIL_LENGTH: usize = 12;

    /// Maximum successor hops for a chaining projectile
    pub const MAX_CHAIN_HOPS: usize = 3;

    /// Straight up in screen space (y grows downward)
    pub const FORWARD_ANGLE: f64 = -std::f64::consts::FRAC_PI_2;
}

/// Normalize an angle to (-π, π]
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = PI - (PI - angle).rem_euclid(TAU);
    // rem_euclid may round up to TAU
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Unit vector at `angle` scaled to `length`
#[inline]
pub fn from_polar(length: f64, angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin()) * length
}

/// True once a countdown has reached zero (within float slack)
#[inline]
pub fn timer_expired(remaining: f64) -> bool {
    remaining <= consts::TIMER_EPSILON
}

/// Count a timer down by `dt`, never below zero
#[inline]
pub fn tick_down(timer: &mut f64, dt: f64) {
    *timer = (*timer - dt).max(0.0);
}
