//! Enemies: one struct plus a type tag, behavior dispatched per type

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::formation::FormationSlot;
use super::pool::{Poolable, SlotRemap};
use super::projectile::BurnEffect;
use super::state::Rgba;
use super::weapon::ShotSpec;
use crate::timer_expired;
use crate::tuning::{EnemyBehaviorTuning, EnemyStats};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum EnemyType {
    #[default]
    Scout,
    Drone,
    Hunter,
    Tank,
    Bomber,
    Sniper,
    Splitter,
    ShieldBearer,
}

impl EnemyType {
    pub const ALL: [EnemyType; 8] = [
        EnemyType::Scout,
        EnemyType::Drone,
        EnemyType::Hunter,
        EnemyType::Tank,
        EnemyType::Bomber,
        EnemyType::Sniper,
        EnemyType::Splitter,
        EnemyType::ShieldBearer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EnemyType::Scout => "Scout",
            EnemyType::Drone => "Drone",
            EnemyType::Hunter => "Hunter",
            EnemyType::Tank => "Tank",
            EnemyType::Bomber => "Bomber",
            EnemyType::Sniper => "Sniper",
            EnemyType::Splitter => "Splitter",
            EnemyType::ShieldBearer => "Shield Bearer",
        }
    }
}

/// Wave-difficulty multipliers applied at spawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyScaling {
    pub health: f64,
    pub speed: f64,
    pub damage: f64,
}

impl Default for EnemyScaling {
    fn default() -> Self {
        Self {
            health: 1.0,
            speed: 1.0,
            damage: 1.0,
        }
    }
}

/// Damage-over-time state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BurnState {
    pub active: bool,
    /// Seconds of burning left
    pub remaining: f64,
    pub damage_per_tick: f64,
    /// Countdown to the next damage tick
    pub tick_timer: f64,
}

/// What an enemy needs to know about the world for one update
#[derive(Debug, Clone, Copy)]
pub struct EnemyContext<'a> {
    pub player_pos: DVec2,
    pub width: f64,
    pub height: f64,
    /// Motion multiplier (below 1 during Slow Time)
    pub motion_scale: f64,
    pub projectile_radius: f64,
    pub behavior: &'a EnemyBehaviorTuning,
}

#[derive(Debug, Clone, Default)]
pub struct Enemy {
    pub active: bool,
    pub kind: EnemyType,
    pub pos: DVec2,
    /// px/tick
    pub vel: DVec2,
    pub radius: f64,
    pub speed: f64,
    pub health: f64,
    pub max_health: f64,
    pub points: u32,
    pub shoot_timer: f64,
    pub shoot_rate: f64,
    pub projectile_speed: f64,
    pub projectile_damage: f64,
    pub contact_damage: f64,
    pub anim_timer: f64,
    pub phase: f64,
    pub color: Rgba,
    /// Seconds of white flash after a hit (visual)
    pub hit_flash: f64,
    pub burn: BurnState,
    pub formation: Option<FormationSlot>,
    /// Same-group formation members within range, refreshed each tick
    pub allies: Vec<usize>,
    pub shield_points: f64,
    pub max_shield_points: f64,
    pub shield_regen_timer: f64,
    pub has_split: bool,
    pub lock_timer: f64,
    pub locked: bool,
    pub locked_target: DVec2,
}

impl Poolable for Enemy {
    fn reset(&mut self) {
        // Keep the ally cache's allocation
        let mut allies = std::mem::take(&mut self.allies);
        allies.clear();
        *self = Self {
            allies,
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

impl Enemy {
    /// Follow the enemy pool's compaction. A dead leader's reference stays
    /// stale so the follower still counts as a follower.
    pub fn remap_slots(&mut self, remap: &SlotRemap) {
        if let Some(slot) = self.formation.as_mut() {
            if let Some(leader) = slot.leader {
                slot.leader = Some(remap.slot(leader).unwrap_or(leader));
            }
        }
        self.allies.retain_mut(|ally| match remap.index(*ally) {
            Some(moved) => {
                *ally = moved;
                true
            }
            None => false,
        });
    }

    /// Fill a freshly acquired slot from the type's stats
    pub fn configure(
        &mut self,
        kind: EnemyType,
        stats: &EnemyStats,
        pos: DVec2,
        scaling: &EnemyScaling,
    ) {
        self.active = true;
        self.kind = kind;
        self.pos = pos;
        self.vel = DVec2::ZERO;
        self.radius = stats.radius;
        self.speed = stats.speed * scaling.speed;
        self.max_health = (stats.health * scaling.health).max(1.0);
        self.health = self.max_health;
        self.points = stats.points;
        self.shoot_rate = stats.shoot_rate;
        self.shoot_timer = 0.0;
        self.projectile_speed = stats.projectile_speed;
        self.projectile_damage = stats.projectile_damage * scaling.damage;
        self.contact_damage = stats.contact_damage * scaling.damage;
        self.color = stats.color;
        self.max_shield_points = stats.shield_points;
        self.shield_points = stats.shield_points;
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn is_dead(&self) -> bool {
        self.active && self.health <= 0.0
    }

    /// Motion, lock-on, shield regen and shooting for one tick
    pub fn update(&mut self, dt: f64, ctx: &EnemyContext) -> Option<ShotSpec> {
        if !self.active {
            return None;
        }
        self.anim_timer += dt;
        self.shoot_timer += dt;
        crate::tick_down(&mut self.hit_flash, dt);

        // Formation members get their velocity from the formation pass
        if self.formation.is_none() {
            self.steer(ctx);
        }
        self.pos += self.vel * ctx.motion_scale;
        self.pos.x = self.pos.x.clamp(self.radius, (ctx.width - self.radius).max(self.radius));

        if self.pos.y > ctx.height + ctx.behavior.offscreen_bottom {
            // Leaving the screen is not a kill
            self.active = false;
            return None;
        }

        if self.kind == EnemyType::Sniper && !self.locked {
            self.lock_timer += dt;
            if self.lock_timer >= ctx.behavior.sniper_lock_time - crate::consts::TIMER_EPSILON {
                self.locked = true;
                self.locked_target = ctx.player_pos;
            }
        }

        if self.kind == EnemyType::ShieldBearer {
            self.regen_shield(dt, ctx.behavior);
        }

        self.try_shoot(ctx)
    }

    fn steer(&mut self, ctx: &EnemyContext) {
        let b = ctx.behavior;
        self.vel = match self.kind {
            EnemyType::Scout | EnemyType::Tank | EnemyType::ShieldBearer => {
                DVec2::new(0.0, self.speed)
            }
            EnemyType::Drone | EnemyType::Splitter => {
                self.phase += b.drone_phase_step;
                DVec2::new(self.phase.sin() * b.drone_amplitude, self.speed)
            }
            EnemyType::Hunter => {
                let dx = ctx.player_pos.x - self.pos.x;
                let vx = if dx.abs() > b.hunter_deadband {
                    dx.signum() * b.hunter_track_factor * self.speed
                } else {
                    0.0
                };
                DVec2::new(vx, b.hunter_descent_factor * self.speed)
            }
            EnemyType::Bomber => {
                let dir = (ctx.player_pos - self.pos).normalize_or_zero();
                if dir == DVec2::ZERO {
                    DVec2::new(0.0, self.speed)
                } else {
                    dir * self.speed
                }
            }
            EnemyType::Sniper => {
                self.phase += b.drone_phase_step * 0.5;
                let vx = self.phase.sin() * b.sniper_drift;
                let remaining = b.sniper_hold_y - self.pos.y;
                let vy = remaining.clamp(0.0, self.speed);
                DVec2::new(vx, vy)
            }
        };
    }

    fn regen_shield(&mut self, dt: f64, b: &EnemyBehaviorTuning) {
        let first = b.shield_regen_delay + b.shield_regen_interval;
        if self.shield_points >= self.max_shield_points {
            self.shield_regen_timer = (self.shield_regen_timer + dt).min(first);
            return;
        }
        self.shield_regen_timer += dt;
        if self.shield_regen_timer >= first - crate::consts::TIMER_EPSILON {
            self.shield_points = (self.shield_points + 1.0).min(self.max_shield_points);
            self.shield_regen_timer -= b.shield_regen_interval;
        }
    }

    fn try_shoot(&mut self, ctx: &EnemyContext) -> Option<ShotSpec> {
        if self.shoot_rate <= 0.0
            || self.shoot_timer < self.shoot_rate - crate::consts::TIMER_EPSILON
        {
            return None;
        }
        let origin = self.pos + DVec2::new(0.0, self.radius);
        let vel = match self.kind {
            EnemyType::Sniper => {
                if !self.locked {
                    return None;
                }
                let dir = (self.locked_target - origin).normalize_or(DVec2::Y);
                self.locked = false;
                self.lock_timer = 0.0;
                dir * self.projectile_speed
            }
            EnemyType::Drone | EnemyType::Hunter | EnemyType::Tank | EnemyType::ShieldBearer => {
                DVec2::new(0.0, self.projectile_speed)
            }
            _ => return None,
        };
        self.shoot_timer = 0.0;
        Some(ShotSpec {
            pos: origin,
            vel,
            radius: ctx.projectile_radius,
            damage: self.projectile_damage,
            main_color: self.color,
            glow_color: self.color.with_alpha(140),
            ..ShotSpec::default()
        })
    }

    /// Apply damage; shields absorb first. Returns health actually lost.
    pub fn take_damage(&mut self, amount: f64) -> f64 {
        if !self.active || amount <= 0.0 {
            return 0.0;
        }
        let mut remaining = amount;
        if self.kind == EnemyType::ShieldBearer {
            self.shield_regen_timer = 0.0;
            if self.shield_points > 0.0 {
                let absorbed = self.shield_points.min(remaining);
                self.shield_points -= absorbed;
                remaining -= absorbed;
            }
        }
        let before = self.health;
        self.health = (self.health - remaining).max(0.0);
        self.hit_flash = 0.1;
        before - self.health
    }

    /// Start burning, or refresh the duration of an existing burn
    pub fn ignite(&mut self, effect: BurnEffect, tick_interval: f64) {
        if self.burn.active {
            self.burn.remaining = self.burn.remaining.max(effect.duration);
            self.burn.damage_per_tick = self.burn.damage_per_tick.max(effect.damage_per_tick);
        } else {
            self.burn = BurnState {
                active: true,
                remaining: effect.duration,
                damage_per_tick: effect.damage_per_tick,
                tick_timer: tick_interval,
            };
        }
    }

    /// Advance the burn; returns damage dealt this tick
    pub fn tick_burn(&mut self, dt: f64, tick_interval: f64) -> f64 {
        if !self.active || !self.burn.active {
            return 0.0;
        }
        self.burn.remaining -= dt;
        self.burn.tick_timer -= dt;
        let mut dealt = 0.0;
        if timer_expired(self.burn.tick_timer) {
            dealt = self.take_damage(self.burn.damage_per_tick);
            self.burn.tick_timer = tick_interval;
        }
        if timer_expired(self.burn.remaining) || self.health <= 0.0 {
            self.burn = BurnState::default();
        }
        dealt
    }

    /// Two weaker Scouts for a dying Splitter (at most once per Splitter)
    pub fn split(
        &mut self,
        scout: &EnemyStats,
        b: &EnemyBehaviorTuning,
    ) -> Option<[(DVec2, f64, u32); 2]> {
        if self.kind != EnemyType::Splitter || self.has_split {
            return None;
        }
        self.has_split = true;
        let health = (scout.health * b.split_health_fraction).ceil();
        let points = (scout.points as f64 * b.split_points_fraction).round() as u32;
        let offset = DVec2::new(b.split_offset, 0.0);
        Some([
            (self.pos - offset, health, points),
            (self.pos + offset, health, points),
        ])
    }
}
