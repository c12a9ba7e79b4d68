//! Falling pickups

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::pool::Poolable;
use super::state::Rgba;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum PowerupType {
    #[default]
    Health,
    Shield,
    Weapon,
    Speed,
    Mystery,
}

impl PowerupType {
    pub const ALL: [PowerupType; 5] = [
        PowerupType::Health,
        PowerupType::Shield,
        PowerupType::Weapon,
        PowerupType::Speed,
        PowerupType::Mystery,
    ];

    pub fn color(&self) -> Rgba {
        match self {
            PowerupType::Health => Rgba::new(80, 220, 100, 255),
            PowerupType::Shield => Rgba::new(80, 160, 255, 255),
            PowerupType::Weapon => Rgba::new(255, 200, 60, 255),
            PowerupType::Speed => Rgba::new(0, 230, 230, 255),
            PowerupType::Mystery => Rgba::new(200, 90, 255, 255),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Powerup {
    pub active: bool,
    pub kind: PowerupType,
    pub pos: DVec2,
    /// px/tick, always downward
    pub vel: DVec2,
    pub radius: f64,
    /// Bobbing/pulse animation phase (visual)
    pub anim_phase: f64,
}

impl Poolable for Powerup {
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

impl Powerup {
    pub fn configure(&mut self, kind: PowerupType, pos: DVec2, radius: f64, fall_speed: f64) {
        self.active = true;
        self.kind = kind;
        self.pos = pos;
        self.vel = DVec2::new(0.0, fall_speed);
        self.radius = radius;
        self.anim_phase = 0.0;
    }

    pub fn update(&mut self, dt: f64, height: f64, bottom_margin: f64) {
        self.pos += self.vel;
        self.anim_phase = (self.anim_phase + dt * 4.0) % std::f64::consts::TAU;
        if self.pos.y > height + bottom_margin {
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falls_and_expires() {
        let mut p = Powerup::default();
        p.configure(PowerupType::Shield, DVec2::new(100.0, 590.0), 12.0, 1.5);
        p.update(1.0 / 60.0, 600.0, 30.0);
        assert_eq!(p.pos.y, 591.5);
        assert!(p.active);
        p.pos.y = 631.0;
        p.update(1.0 / 60.0, 600.0, 30.0);
        assert!(!p.active);
    }
}
