//! Projectiles: ballistic, homing, chaining, burning and beam behaviors

use glam::DVec2;

use super::enemy::Enemy;
use super::pool::{Pool, Poolable, SlotRef, SlotRemap};
use super::state::Rgba;
use super::trail::Trail;
use super::weapon::ShotSpec;
use crate::consts::{MAX_CHAIN_HOPS, PROJECTILE_TRAIL_LENGTH, SIM_DT, TICK_RATE, TIMER_EPSILON};
use crate::normalize_angle;
use crate::tuning::ProjectileTuning;

/// Steering toward the nearest enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomingState {
    /// Maximum heading change per tick (radians)
    pub turn_rate: f64,
    pub target: Option<SlotRef>,
}

/// Remaining chain hops and the enemies already struck along the chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainState {
    pub remaining: u32,
    pub range: f64,
    struck: [Option<SlotRef>; MAX_CHAIN_HOPS + 1],
    struck_len: usize,
}

impl ChainState {
    pub fn new(remaining: u32, range: f64) -> Self {
        Self {
            remaining: remaining.min(MAX_CHAIN_HOPS as u32),
            range,
            struck: [None; MAX_CHAIN_HOPS + 1],
            struck_len: 0,
        }
    }

    pub fn has_struck(&self, slot: SlotRef) -> bool {
        self.struck[..self.struck_len].contains(&Some(slot))
    }

    pub fn record_strike(&mut self, slot: SlotRef) {
        if self.struck_len < self.struck.len() && !self.has_struck(slot) {
            self.struck[self.struck_len] = Some(slot);
            self.struck_len += 1;
        }
    }

    pub fn struck(&self) -> impl Iterator<Item = SlotRef> + '_ {
        self.struck[..self.struck_len].iter().flatten().copied()
    }

    /// Translate struck enemies after the enemy pool compacted. Dead ones
    /// keep their stale reference.
    pub fn remap(&mut self, remap: &SlotRemap) {
        for entry in self.struck[..self.struck_len].iter_mut().flatten() {
            if let Some(moved) = remap.slot(*entry) {
                *entry = moved;
            }
        }
    }
}

/// Burn applied to whatever this projectile hits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnEffect {
    pub duration: f64,
    pub damage_per_tick: f64,
}

/// Beam geometry: fixed source, projectile position is the tip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamState {
    pub source: DVec2,
    pub piercing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Projectile {
    pub active: bool,
    pub pos: DVec2,
    /// px/tick
    pub vel: DVec2,
    pub radius: f64,
    pub damage: f64,
    /// Fired by the player (hits enemies) vs. hostile (hits the player)
    pub friendly: bool,
    pub age: f64,
    /// Seconds; 0 = no lifetime limit
    pub lifetime: f64,
    pub main_color: Rgba,
    pub glow_color: Rgba,
    pub trail: Trail<PROJECTILE_TRAIL_LENGTH>,
    pub homing: Option<HomingState>,
    pub chain: Option<ChainState>,
    pub burn: Option<BurnEffect>,
    pub beam: Option<BeamState>,
}

impl Poolable for Projectile {
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

impl Projectile {
    /// Follow the enemy pool's compaction
    pub fn remap_enemy_slots(&mut self, remap: &SlotRemap) {
        if let Some(homing) = self.homing.as_mut() {
            homing.target = homing.target.and_then(|target| remap.slot(target));
        }
        if let Some(chain) = self.chain.as_mut() {
            chain.remap(remap);
        }
    }

    /// Configure a freshly acquired projectile from a shot description
    pub fn launch(&mut self, shot: &ShotSpec, friendly: bool, rules: &ProjectileTuning) {
        self.active = true;
        self.friendly = friendly;
        self.pos = shot.pos;
        self.vel = shot.vel;
        self.radius = shot.radius;
        self.damage = shot.damage;
        self.main_color = shot.main_color;
        self.glow_color = shot.glow_color;
        self.age = 0.0;
        self.trail.clear();
        self.homing = shot.homing_turn_rate.map(|turn_rate| HomingState {
            turn_rate,
            target: None,
        });
        self.chain = shot.chain;
        self.burn = shot.burn;
        self.beam = shot.beam_source.map(|source| BeamState {
            source,
            piercing: true,
        });
        self.lifetime = if self.beam.is_some() {
            rules.beam_lifetime_ticks as f64 * SIM_DT
        } else if self.vel.length() * TICK_RATE > rules.fast_speed_threshold {
            rules.fast_lifetime
        } else {
            rules.slow_lifetime
        };
    }

    pub fn is_piercing(&self) -> bool {
        self.beam.is_some_and(|b| b.piercing)
    }

    /// Age, expire, record the trail and move. `scale` slows hostile shots.
    pub fn update(&mut self, dt: f64, scale: f64, width: f64, height: f64, margin: f64) {
        if !self.active {
            return;
        }
        self.age += dt;
        if self.lifetime > 0.0 && self.age >= self.lifetime - TIMER_EPSILON {
            self.active = false;
            return;
        }

        self.trail.push(self.pos);
        let step = self.vel * scale;
        self.pos += step;
        // Beams live two ticks and are never culled
        if self.beam.is_some() {
            return;
        }

        if self.pos.x < -margin
            || self.pos.x > width + margin
            || self.pos.y < -margin
            || self.pos.y > height + margin
        {
            self.active = false;
        }
    }

    /// Rotate the velocity toward `target` by at most `turn_rate`, keeping speed
    pub fn steer_toward(&mut self, target: DVec2, turn_rate: f64) {
        let to_target = target - self.pos;
        let speed = self.vel.length();
        if speed < 1e-9 || to_target.length_squared() < 1e-9 {
            return;
        }
        let current = self.vel.y.atan2(self.vel.x);
        let desired = to_target.y.atan2(to_target.x);
        let diff = normalize_angle(desired - current).clamp(-turn_rate, turn_rate);
        self.vel = crate::from_polar(speed, current + diff);
    }

    /// Keep a still-valid homing target or pick the nearest enemy in range,
    /// then steer. Without a target the projectile flies straight.
    pub fn update_homing(&mut self, enemies: &Pool<Enemy>, range: f64) {
        let Some(mut homing) = self.homing else {
            return;
        };
        let current = homing
            .target
            .and_then(|slot| enemies.resolve(slot).map(|e| e.pos));
        let target_pos = match current {
            Some(pos) => Some(pos),
            None => {
                homing.target = nearest_enemy(self.pos, enemies, range, |_| true);
                homing
                    .target
                    .and_then(|slot| enemies.resolve(slot).map(|e| e.pos))
            }
        };
        if let Some(pos) = target_pos {
            self.steer_toward(pos, homing.turn_rate);
        }
        self.homing = Some(homing);
    }

    /// Circle that encloses everything this projectile can touch
    pub fn broad_phase_circle(&self) -> (DVec2, f64) {
        match self.beam {
            Some(beam) => {
                let mid = (beam.source + self.pos) * 0.5;
                (mid, beam.source.distance(self.pos) * 0.5 + self.radius)
            }
            None => (self.pos, self.radius),
        }
    }

    /// Narrow-phase test against a circle
    pub fn hits_circle(&self, center: DVec2, radius: f64) -> bool {
        match self.beam {
            Some(beam) => super::collision::circle_hits_thick_segment(
                center,
                radius,
                beam.source,
                self.pos,
                self.radius,
            ),
            None => super::collision::circles_overlap(self.pos, self.radius, center, radius),
        }
    }
}

/// Nearest active enemy within `range` (compared squared) that passes `filter`
pub fn nearest_enemy(
    from: DVec2,
    enemies: &Pool<Enemy>,
    range: f64,
    filter: impl Fn(SlotRef) -> bool,
) -> Option<SlotRef> {
    let range_sq = range * range;
    let mut best: Option<(f64, usize)> = None;
    for (index, enemy) in enemies.iter_active() {
        let d = from.distance_squared(enemy.pos);
        if d > range_sq {
            continue;
        }
        let Some(slot) = enemies.slot_ref(index) else {
            continue;
        };
        if !filter(slot) {
            continue;
        }
        if best.is_none_or(|(best_d, _)| d < best_d) {
            best = Some((d, index));
        }
    }
    best.and_then(|(_, index)| enemies.slot_ref(index))
}
