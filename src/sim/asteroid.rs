//! Asteroids: horizontally wrapping rocks that split when destroyed

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::pool::Poolable;
use crate::normalize_angle;
use crate::tuning::AsteroidStats;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum AsteroidSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl AsteroidSize {
    /// Size of the two fragments left behind, if any
    pub fn split(self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Asteroid {
    pub active: bool,
    pub pos: DVec2,
    /// px/tick
    pub vel: DVec2,
    pub radius: f64,
    pub size: AsteroidSize,
    pub health: f64,
    pub max_health: f64,
    pub points: u32,
    pub rotation: f64,
    /// rad/tick
    pub rotation_speed: f64,
}

impl Poolable for Asteroid {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl Asteroid {
    pub fn configure(
        &mut self,
        size: AsteroidSize,
        stats: &AsteroidStats,
        pos: DVec2,
        vel: DVec2,
        rotation_speed: f64,
    ) {
        self.active = true;
        self.size = size;
        self.pos = pos;
        self.vel = vel;
        self.radius = stats.radius;
        self.health = stats.health;
        self.max_health = stats.health;
        self.points = stats.points;
        self.rotation = 0.0;
        self.rotation_speed = rotation_speed;
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Move, spin, wrap at the side edges; deactivate below the bottom margin
    pub fn update(&mut self, scale: f64, width: f64, height: f64, bottom_margin: f64) {
        self.pos += self.vel * scale;
        self.rotation = normalize_angle(self.rotation + self.rotation_speed * scale);

        if self.pos.x < -self.radius {
            self.pos.x += width + 2.0 * self.radius;
        } else if self.pos.x > width + self.radius {
            self.pos.x -= width + 2.0 * self.radius;
        }

        if self.pos.y > height + bottom_margin {
            self.active = false;
        }
    }

    /// Returns true when this hit destroyed the asteroid
    pub fn take_damage(&mut self, amount: f64) -> bool {
        if !self.active || self.health <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.health <= 0.0
    }
}
