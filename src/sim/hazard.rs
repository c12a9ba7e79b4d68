//! Environmental hazards: barriers, pull fields, damage zones

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::collision::circles_overlap;
use super::state::Rgba;
use crate::tuning::HazardStats;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum HazardType {
    #[default]
    Barrier,
    MagneticField,
    RadiationZone,
    BlackHole,
}

impl HazardType {
    pub fn color(&self) -> Rgba {
        match self {
            HazardType::Barrier => Rgba::new(150, 150, 170, 255),
            HazardType::MagneticField => Rgba::new(90, 140, 255, 110),
            HazardType::RadiationZone => Rgba::new(120, 255, 80, 90),
            HazardType::BlackHole => Rgba::new(60, 0, 90, 200),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Hazard {
    pub active: bool,
    pub kind: HazardType,
    pub pos: DVec2,
    /// px/tick
    pub vel: DVec2,
    pub radius: f64,
    /// Only barriers can be worn down; 0 means indestructible
    pub health: f64,
    pub max_health: f64,
    /// px/tick of pull at the edge, growing toward the center
    pub pull_force: f64,
    /// Health per second drained from the player inside
    pub damage_rate: f64,
    /// Rotation for the host's swirl/pulse art
    pub anim_phase: f64,
}

impl Hazard {
    pub fn new(kind: HazardType, stats: &HazardStats, pos: DVec2, drift_speed: f64) -> Self {
        Self {
            active: true,
            kind,
            pos,
            vel: DVec2::new(0.0, drift_speed),
            radius: stats.radius,
            health: stats.health,
            max_health: stats.health,
            pull_force: stats.pull_force,
            damage_rate: stats.damage_rate,
            anim_phase: 0.0,
        }
    }

    pub fn is_solid(&self) -> bool {
        self.kind == HazardType::Barrier
    }

    pub fn pulls(&self) -> bool {
        self.pull_force > 0.0
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    pub fn update(&mut self, dt: f64, scale: f64, height: f64, bottom_margin: f64) {
        self.pos += self.vel * scale;
        self.anim_phase = (self.anim_phase + dt * 2.0) % std::f64::consts::TAU;
        if self.pos.y - self.radius > height + bottom_margin {
            self.active = false;
        }
    }

    pub fn touches(&self, pos: DVec2, radius: f64) -> bool {
        circles_overlap(self.pos, self.radius, pos, radius)
    }

    /// Displacement toward the center for a point inside the field
    pub fn pull_offset(&self, pos: DVec2) -> DVec2 {
        if !self.pulls() {
            return DVec2::ZERO;
        }
        let delta = self.pos - pos;
        let dist = delta.length();
        if dist >= self.radius || dist < 1e-6 {
            return DVec2::ZERO;
        }
        // Stronger near the center
        let multiplier = (self.radius / dist.max(self.radius * 0.25)).min(4.0);
        let step = (self.pull_force * multiplier).min(dist);
        delta / dist * step
    }

    /// Player damage for this tick (already scaled by dt)
    pub fn damage_for(&self, pos: DVec2, radius: f64, dt: f64, core_fraction: f64) -> f64 {
        match self.kind {
            HazardType::RadiationZone if self.touches(pos, radius) => self.damage_rate * dt,
            HazardType::BlackHole
                if circles_overlap(self.pos, self.radius * core_fraction, pos, radius) =>
            {
                self.damage_rate * dt
            }
            _ => 0.0,
        }
    }

    /// Barrier absorbs a hit; returns true when it is destroyed
    pub fn take_damage(&mut self, amount: f64) -> bool {
        if !self.is_solid() || self.max_health <= 0.0 || !self.active {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        if self.health <= 0.0 {
            self.active = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::HazardTuning;

    fn hazard(kind: HazardType) -> Hazard {
        let t = HazardTuning::default();
        Hazard::new(kind, &t.stats(kind), DVec2::new(400.0, 300.0), t.drift_speed)
    }

    #[test]
    fn test_pull_points_inward_and_grows() {
        let h = hazard(HazardType::BlackHole);
        let far = h.pull_offset(DVec2::new(400.0 + 130.0, 300.0));
        let near = h.pull_offset(DVec2::new(400.0 + 40.0, 300.0));
        assert!(far.x < 0.0 && near.x < 0.0);
        assert!(near.length() > far.length());
        assert_eq!(h.pull_offset(DVec2::new(400.0 + 200.0, 300.0)), DVec2::ZERO);
    }

    #[test]
    fn test_pull_never_overshoots_center() {
        let h = hazard(HazardType::BlackHole);
        let p = DVec2::new(400.1, 300.0);
        let moved = p + h.pull_offset(p);
        assert!(moved.x >= 400.0 - 1e-9);
    }

    #[test]
    fn test_black_hole_damages_core_only() {
        let t = HazardTuning::default();
        let h = hazard(HazardType::BlackHole);
        assert_eq!(h.damage_for(DVec2::new(400.0 + 100.0, 300.0), 15.0, 1.0, t.core_fraction), 0.0);
        assert!(h.damage_for(DVec2::new(400.0 + 20.0, 300.0), 15.0, 1.0, t.core_fraction) > 0.0);
    }

    #[test]
    fn test_barrier_breaks() {
        let mut h = hazard(HazardType::Barrier);
        assert!(!h.take_damage(150.0));
        assert!(h.take_damage(50.0));
        assert!(!h.active);
        let mut field = hazard(HazardType::MagneticField);
        assert!(!field.take_damage(1000.0));
        assert!(field.active);
    }
}
