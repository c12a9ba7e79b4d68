//! Visual-lifetime entities: explosions, impact sparks, floating text
//!
//! None of these interact with gameplay; they exist so the host can draw them.

use glam::DVec2;

use super::pool::Poolable;
use super::state::Rgba;
use crate::tick_down;

#[derive(Debug, Clone, Default)]
pub struct Explosion {
    pub active: bool,
    pub pos: DVec2,
    pub max_radius: f64,
    pub color: Rgba,
    pub life: f64,
    pub max_life: f64,
}

impl Poolable for Explosion {
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

impl Explosion {
    pub fn start(&mut self, pos: DVec2, max_radius: f64, color: Rgba, life: f64) {
        self.active = true;
        self.pos = pos;
        self.max_radius = max_radius;
        self.color = color;
        self.life = life;
        self.max_life = life;
    }

    /// 0 at birth, 1 when finished
    pub fn progress(&self) -> f64 {
        if self.max_life > 0.0 {
            (1.0 - self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Current ring radius, growing with progress
    pub fn radius(&self) -> f64 {
        self.max_radius * self.progress()
    }

    pub fn update(&mut self, dt: f64) {
        tick_down(&mut self.life, dt);
        if self.life <= 0.0 {
            self.active = false;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImpactEffect {
    pub active: bool,
    pub pos: DVec2,
    pub color: Rgba,
    pub sparks: u32,
    /// Direction the sparks fly out along
    pub angle: f64,
    pub life: f64,
    pub max_life: f64,
}

impl Poolable for ImpactEffect {
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

impl ImpactEffect {
    pub fn start(&mut self, pos: DVec2, color: Rgba, sparks: u32, angle: f64, life: f64) {
        self.active = true;
        self.pos = pos;
        self.color = color;
        self.sparks = sparks;
        self.angle = angle;
        self.life = life;
        self.max_life = life;
    }

    pub fn update(&mut self, dt: f64) {
        tick_down(&mut self.life, dt);
        if self.life <= 0.0 {
            self.active = false;
        }
    }
}

/// Rising score/status label
#[derive(Debug, Clone, Default)]
pub struct FloatingText {
    pub active: bool,
    pub pos: DVec2,
    /// Reused between spawns
    pub text: String,
    pub color: Rgba,
    /// px/tick upward
    pub rise: f64,
    pub life: f64,
    pub max_life: f64,
}

impl Poolable for FloatingText {
    fn reset(&mut self) {
        let mut text = std::mem::take(&mut self.text);
        text.clear();
        *self = Self {
            text,
            ..Self::default()
        };
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl FloatingText {
    pub fn start(&mut self, pos: DVec2, text: &str, color: Rgba, rise: f64, life: f64) {
        self.active = true;
        self.pos = pos;
        self.text.clear();
        self.text.push_str(text);
        self.color = color;
        self.rise = rise;
        self.life = life;
        self.max_life = life;
    }

    /// 1 at birth fading to 0
    pub fn alpha(&self) -> f64 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn update(&mut self, dt: f64) {
        self.pos.y -= self.rise;
        tick_down(&mut self.life, dt);
        if self.life <= 0.0 {
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    #[test]
    fn test_explosion_grows_then_expires() {
        let mut e = Explosion::default();
        e.start(DVec2::ZERO, 40.0, Rgba::WHITE, 0.5);
        assert_eq!(e.radius(), 0.0);
        for _ in 0..15 {
            e.update(SIM_DT);
        }
        assert!((e.radius() - 20.0).abs() < 1e-6);
        for _ in 0..15 {
            e.update(SIM_DT);
        }
        assert!(!e.active);
    }

    #[test]
    fn test_floating_text_rises_and_keeps_buffer() {
        let mut t = FloatingText::default();
        t.start(DVec2::new(10.0, 100.0), "+100", Rgba::WHITE, 1.0, 1.0);
        t.update(SIM_DT);
        assert_eq!(t.pos.y, 99.0);
        assert_eq!(t.text, "+100");
        let cap = t.text.capacity();
        t.reset();
        assert!(t.text.is_empty());
        assert_eq!(t.text.capacity(), cap);
    }

    #[test]
    fn test_impact_expires() {
        let mut i = ImpactEffect::default();
        i.start(DVec2::ZERO, Rgba::WHITE, 6, 0.0, 0.25);
        for _ in 0..15 {
            i.update(SIM_DT);
        }
        assert!(!i.active);
    }
}
