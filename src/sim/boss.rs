//! Boss phase machine and attack pattern library

use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, TAU};

use glam::DVec2;
use serde::Serialize;

use super::weapon::ShotSpec;
use crate::consts::TIMER_EPSILON;
use crate::tuning::BossTuning;
use crate::{from_polar, tick_down, timer_expired};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BossPhase {
    Entering,
    Attacking,
    SpecialAttack,
    Rage,
    Dying,
}

/// Things the world reacts to after a boss update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BossUpdate {
    pub phase_changed: Option<BossPhase>,
    /// Telegraph raised this tick (seconds)
    pub telegraph: Option<f64>,
    pub shield_raised: bool,
    /// Pattern fired this tick
    pub attacked: Option<u32>,
    /// Spawn one of the dying explosions
    pub explode: bool,
    /// Dying sequence finished; remove and score
    pub finished: bool,
}

/// World state the boss reads during its update
#[derive(Debug, Clone, Copy)]
pub struct BossContext<'a> {
    pub player_pos: DVec2,
    pub width: f64,
    pub motion_scale: f64,
    pub tuning: &'a BossTuning,
}

#[derive(Debug, Clone)]
pub struct Boss {
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    pub health: f64,
    pub max_health: f64,
    pub attack_pattern: u32,
    pub anim_timer: f64,
    pub attack_timer: f64,
    /// Time since the shield last dropped
    pub special_timer: f64,
    pub shield_active: bool,
    pub shield_timer: f64,
    pub entry_y: f64,
    pub level: u32,
    pub speed_mult: f64,
    pub attack_rate_mult: f64,
    pub damage: f64,
    pub pattern_count: u32,
    pub telegraph_active: bool,
    pub telegraph_timer: f64,
    pub phase: BossPhase,
    pub dying_timer: f64,
    explosion_timer: f64,
}

impl Boss {
    /// Build a level-`level` boss just above the top edge
    pub fn new(level: u32, tuning: &BossTuning, width: f64) -> Self {
        let level = level.max(1);
        let stats = tuning.stats_for_level(level);
        Self {
            pos: DVec2::new(width * 0.5, -tuning.radius),
            vel: DVec2::ZERO,
            radius: tuning.radius,
            health: stats.health,
            max_health: stats.health,
            attack_pattern: 0,
            anim_timer: 0.0,
            attack_timer: 0.0,
            special_timer: 0.0,
            shield_active: false,
            shield_timer: 0.0,
            entry_y: tuning.entry_y,
            level,
            speed_mult: stats.speed_mult,
            attack_rate_mult: stats.attack_rate_mult,
            damage: stats.damage,
            pattern_count: stats.pattern_count.clamp(1, 10),
            telegraph_active: false,
            telegraph_timer: 0.0,
            phase: BossPhase::Entering,
            dying_timer: 0.0,
            explosion_timer: 0.0,
        }
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn shield_interval(&self, tuning: &BossTuning) -> f64 {
        tuning.shield_interval_base / (self.level as f64 * 0.5)
    }

    pub fn shield_duration(&self, tuning: &BossTuning) -> f64 {
        (tuning.shield_duration_base - self.level as f64 * tuning.shield_duration_step)
            .max(tuning.min_shield_duration)
    }

    pub fn attack_interval(&self, tuning: &BossTuning) -> f64 {
        let phase_scale = match self.phase {
            BossPhase::Rage => tuning.rage_interval_scale,
            BossPhase::SpecialAttack => tuning.special_interval_scale,
            _ => 1.0,
        };
        tuning.base_attack_interval / self.attack_rate_mult * phase_scale
    }

    /// Apply damage. `false` while shielded or already dying.
    pub fn take_damage(&mut self, amount: f64, tuning: &BossTuning) -> bool {
        if self.shield_active || self.phase == BossPhase::Dying {
            return false;
        }
        self.health = (self.health - amount.max(0.0)).max(0.0);
        if self.health <= 0.0 {
            self.begin_dying(tuning);
        }
        true
    }

    fn begin_dying(&mut self, tuning: &BossTuning) {
        self.phase = BossPhase::Dying;
        self.dying_timer = tuning.dying_duration;
        self.explosion_timer = 0.0;
        self.telegraph_active = false;
        self.telegraph_timer = 0.0;
        self.shield_active = false;
        self.vel = DVec2::ZERO;
    }

    fn raise_telegraph(&mut self, duration: f64, out: &mut BossUpdate) {
        self.telegraph_active = true;
        self.telegraph_timer = duration;
        out.telegraph = Some(duration);
    }

    fn enter_attacking(&mut self, telegraph: f64, tuning: &BossTuning, out: &mut BossUpdate) {
        self.phase = BossPhase::Attacking;
        out.phase_changed = Some(BossPhase::Attacking);
        self.raise_telegraph(telegraph, out);
        // First attack fires the tick the telegraph ends
        self.attack_timer = self.attack_interval(tuning);
    }

    /// Advance one tick, pushing any bullets into `shots`
    pub fn update(&mut self, dt: f64, ctx: &BossContext, shots: &mut Vec<ShotSpec>) -> BossUpdate {
        let tuning = ctx.tuning;
        let mut out = BossUpdate::default();
        self.anim_timer += dt;

        match self.phase {
            BossPhase::Dying => {
                self.dying_timer -= dt;
                self.explosion_timer -= dt;
                if timer_expired(self.explosion_timer) {
                    out.explode = true;
                    self.explosion_timer = tuning.dying_explosion_interval;
                }
                if timer_expired(self.dying_timer) {
                    out.finished = true;
                }
                return out;
            }
            BossPhase::Entering => {
                self.vel = DVec2::new(0.0, tuning.entry_speed * self.speed_mult);
                self.pos += self.vel * ctx.motion_scale;
                if self.pos.y >= self.entry_y {
                    self.pos.y = self.entry_y;
                    self.enter_attacking(tuning.entry_telegraph, tuning, &mut out);
                } else if self.pos.y >= 0.0
                    && (ctx.player_pos.x - self.pos.x).abs() < tuning.proximity_range
                {
                    self.enter_attacking(tuning.proximity_telegraph, tuning, &mut out);
                }
                return out;
            }
            BossPhase::Attacking | BossPhase::SpecialAttack | BossPhase::Rage => {}
        }

        self.check_health_phase(tuning, &mut out);
        self.move_toward_player(ctx);
        self.update_shield(dt, tuning, &mut out);

        if self.telegraph_active {
            self.telegraph_timer -= dt;
            if !timer_expired(self.telegraph_timer) {
                return out;
            }
            self.telegraph_active = false;
            self.telegraph_timer = 0.0;
        }

        self.attack_timer += dt;
        if self.attack_timer >= self.attack_interval(tuning) - TIMER_EPSILON {
            self.attack_timer = 0.0;
            let pattern = self.attack_pattern % self.pattern_count;
            self.fire_pattern(pattern, ctx, shots);
            self.attack_pattern = self.attack_pattern.wrapping_add(1);
            out.attacked = Some(pattern);
        }
        out
    }

    fn check_health_phase(&mut self, tuning: &BossTuning, out: &mut BossUpdate) {
        let frac = self.health_fraction();
        let next = match self.phase {
            BossPhase::Attacking if frac < tuning.rage_threshold => Some(BossPhase::Rage),
            BossPhase::Attacking
                if self.level >= 2
                    && frac >= tuning.rage_threshold
                    && frac < tuning.special_threshold =>
            {
                Some(BossPhase::SpecialAttack)
            }
            BossPhase::SpecialAttack if frac < tuning.rage_threshold => Some(BossPhase::Rage),
            _ => None,
        };
        if let Some(phase) = next {
            log::debug!("boss L{} phase {:?} -> {:?}", self.level, self.phase, phase);
            self.phase = phase;
            out.phase_changed = Some(phase);
            self.raise_telegraph(tuning.phase_telegraph, out);
        }
    }

    /// Track the player horizontally. A boss that began attacking above its
    /// entry line keeps descending until it reaches it.
    fn move_toward_player(&mut self, ctx: &BossContext) {
        let tuning = ctx.tuning;
        let rage = if self.phase == BossPhase::Rage {
            tuning.rage_speed_scale
        } else {
            1.0
        };
        let vx = (ctx.player_pos.x - self.pos.x) * tuning.track_gain * self.speed_mult * rage;
        let vy = (self.entry_y - self.pos.y).clamp(0.0, tuning.entry_speed * self.speed_mult);
        self.vel = DVec2::new(vx, vy);
        self.pos += self.vel * ctx.motion_scale;
        let lo = self.radius + tuning.edge_margin;
        let hi = (ctx.width - self.radius - tuning.edge_margin).max(lo);
        self.pos.x = self.pos.x.clamp(lo, hi);
    }

    fn update_shield(&mut self, dt: f64, tuning: &BossTuning, out: &mut BossUpdate) {
        if self.shield_active {
            tick_down(&mut self.shield_timer, dt);
            if timer_expired(self.shield_timer) {
                self.shield_active = false;
                self.special_timer = 0.0;
            }
            return;
        }
        self.special_timer += dt;
        if self.special_timer >= self.shield_interval(tuning) - TIMER_EPSILON {
            self.shield_active = true;
            self.shield_timer = self.shield_duration(tuning);
            self.special_timer = 0.0;
            out.shield_raised = true;
        }
    }

    fn bullet(&self, origin: DVec2, angle: f64, speed: f64, tuning: &BossTuning) -> ShotSpec {
        ShotSpec {
            pos: origin,
            vel: from_polar(speed, angle),
            radius: tuning.bullet_radius,
            damage: self.damage,
            main_color: tuning.color,
            glow_color: tuning.color.with_alpha(150),
            ..ShotSpec::default()
        }
    }

    /// Emit the bullets of pattern `pattern` (0..10)
    pub fn fire_pattern(&self, pattern: u32, ctx: &BossContext, shots: &mut Vec<ShotSpec>) {
        let tuning = ctx.tuning;
        let speed = tuning.bullet_speed + (self.level - 1) as f64 * tuning.bullet_speed_per_level;
        let origin = self.pos + DVec2::new(0.0, self.radius * 0.8);
        let to_player = ctx.player_pos - origin;
        let aim = if to_player.length_squared() > 1e-9 {
            to_player.y.atan2(to_player.x)
        } else {
            FRAC_PI_2
        };
        let t = self.anim_timer;

        match pattern {
            // Spread shot
            0 => {
                let spread: i32 = if self.level >= 2 { 3 } else { 2 };
                for i in 0..=(2 * spread) {
                    let angle = FRAC_PI_2 + (i - spread) as f64 * 0.2;
                    shots.push(self.bullet(origin, angle, speed, tuning));
                }
            }
            // Aimed shot with wings
            1 => {
                shots.push(self.bullet(origin, aim, speed, tuning));
                let side_count = 1 + self.level / 2;
                for k in 1..=side_count {
                    let off = k as f64 * 0.25;
                    shots.push(self.bullet(origin, aim - off, speed * 0.8, tuning));
                    shots.push(self.bullet(origin, aim + off, speed * 0.8, tuning));
                }
            }
            // Circular burst
            2 => {
                let n = match self.level {
                    1 => 8,
                    2 | 3 => 12,
                    _ => 16,
                };
                for i in 0..n {
                    let angle = i as f64 * TAU / n as f64;
                    shots.push(self.bullet(origin, angle, speed, tuning));
                }
            }
            // Laser lines
            3 => {
                let n: i32 = if self.level >= 2 { 5 } else { 3 };
                let half = n / 2;
                for i in -half..=half {
                    let start = origin + DVec2::new(i as f64 * 30.0, 0.0);
                    shots.push(self.bullet(start, FRAC_PI_2, speed * 1.5, tuning));
                }
            }
            // Spiral
            4 => {
                for i in 0..6 {
                    let angle = i as f64 * FRAC_PI_3 + t * tuning.spiral_rate;
                    shots.push(self.bullet(origin, angle, speed, tuning));
                }
            }
            // Double arc from two launch points
            5 => {
                for side in [-20.0, 20.0] {
                    let start = origin + DVec2::new(side, 0.0);
                    for k in -3..=3 {
                        let angle = FRAC_PI_2 + k as f64 * 0.25;
                        shots.push(self.bullet(start, angle, speed, tuning));
                    }
                }
            }
            // Tracking spiral
            6 => {
                for i in 0..6 {
                    let angle = aim + i as f64 * FRAC_PI_3 + t * tuning.tracking_spiral_rate;
                    shots.push(self.bullet(origin, angle, speed * 1.1, tuning));
                }
            }
            // Wave row
            7 => {
                for i in 0..7 {
                    let start = origin + DVec2::new((i - 3) as f64 * 25.0, 0.0);
                    let angle = FRAC_PI_2 + 0.3 * (i as f64 * FRAC_PI_3 + t).sin();
                    shots.push(self.bullet(start, angle, speed, tuning));
                }
            }
            // Cross burst
            8 => {
                for axis in 0..4 {
                    let angle = FRAC_PI_4 + axis as f64 * FRAC_PI_2;
                    for j in 0..3 {
                        shots.push(self.bullet(origin, angle, speed * (1.0 + j as f64 * 0.25), tuning));
                    }
                }
            }
            // Chaos
            _ => {
                for i in 0..10 {
                    let angle = i as f64 * TAU / 10.0 + t;
                    let s = speed * (1.0 + 0.5 * (i as f64 + t * 5.0).sin());
                    shots.push(self.bullet(origin, angle, s.max(speed * 0.5), tuning));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn ctx(tuning: &BossTuning, player_x: f64) -> BossContext<'_> {
        BossContext {
            player_pos: DVec2::new(player_x, 520.0),
            width: 800.0,
            motion_scale: 1.0,
            tuning,
        }
    }

    #[test]
    fn test_level_table_applied() {
        let tuning = BossTuning::default();
        let boss = Boss::new(2, &tuning, 800.0);
        assert_eq!(boss.health, 1000.0);
        assert_eq!(boss.pattern_count, 6);
        assert_eq!(boss.phase, BossPhase::Entering);
        assert_eq!(boss.radius, 60.0);
        assert_eq!(boss.entry_y, 150.0);
    }

    #[test]
    fn test_entry_telegraph_then_first_attack() {
        let tuning = BossTuning::default();
        // Player far to the side so only reaching entry y triggers
        let mut boss = Boss::new(1, &tuning, 800.0);
        boss.pos.x = 700.0;
        let c = ctx(&tuning, 100.0);
        let mut shots = Vec::new();
        let mut transition_tick = None;
        let mut first_attack_tick = None;
        for tick in 0..600 {
            let out = boss.update(SIM_DT, &c, &mut shots);
            if out.telegraph.is_some() && transition_tick.is_none() {
                assert!(shots.is_empty());
                transition_tick = Some(tick);
            }
            if out.attacked.is_some() {
                first_attack_tick = Some(tick);
                break;
            }
        }
        let start = transition_tick.expect("boss reaches entry y");
        assert_eq!(boss.pos.y, 150.0);
        assert_eq!(first_attack_tick, Some(start + 30));
    }

    #[test]
    fn test_no_attacks_while_telegraphing() {
        let tuning = BossTuning::default();
        let mut boss = Boss::new(1, &tuning, 800.0);
        boss.phase = BossPhase::Attacking;
        boss.pos.y = 150.0;
        boss.telegraph_active = true;
        boss.telegraph_timer = 0.5;
        boss.attack_timer = 100.0;
        let mut shots = Vec::new();
        for _ in 0..29 {
            boss.update(SIM_DT, &ctx(&tuning, 400.0), &mut shots);
        }
        assert!(shots.is_empty());
        boss.update(SIM_DT, &ctx(&tuning, 400.0), &mut shots);
        assert!(!shots.is_empty());
    }

    #[test]
    fn test_shield_blocks_damage() {
        let tuning = BossTuning::default();
        let mut boss = Boss::new(1, &tuning, 800.0);
        boss.shield_active = true;
        assert!(!boss.take_damage(100.0, &tuning));
        assert_eq!(boss.health, 500.0);
    }

    #[test]
    fn test_shield_timing_per_level() {
        let tuning = BossTuning::default();
        let boss = Boss::new(2, &tuning, 800.0);
        assert!((boss.shield_interval(&tuning) - 5.0).abs() < 1e-12);
        assert!((boss.shield_duration(&tuning) - 1.6).abs() < 1e-12);
        let late = Boss::new(12, &tuning, 800.0);
        assert_eq!(late.shield_duration(&tuning), 0.5);
    }

    #[test]
    fn test_lethal_damage_enters_dying_and_stops_attacks() {
        let tuning = BossTuning::default();
        let mut boss = Boss::new(1, &tuning, 800.0);
        boss.phase = BossPhase::Attacking;
        assert!(boss.take_damage(10_000.0, &tuning));
        assert_eq!(boss.phase, BossPhase::Dying);
        assert_eq!(boss.health, 0.0);
        assert!(!boss.take_damage(1.0, &tuning));

        let mut shots = Vec::new();
        let mut explosions = 0;
        let mut finished_at = None;
        for tick in 1..=200 {
            let out = boss.update(SIM_DT, &ctx(&tuning, 400.0), &mut shots);
            explosions += out.explode as u32;
            if out.finished {
                finished_at = Some(tick);
                break;
            }
        }
        assert!(shots.is_empty());
        assert_eq!(finished_at, Some(120));
        assert!(explosions >= 8);
    }

    #[test]
    fn test_health_gates() {
        let tuning = BossTuning::default();
        let mut boss = Boss::new(1, &tuning, 800.0);
        boss.phase = BossPhase::Attacking;
        boss.pos.y = 150.0;
        boss.health = 250.0;
        let mut shots = Vec::new();
        boss.update(SIM_DT, &ctx(&tuning, 400.0), &mut shots);
        // Level 1 never enters SpecialAttack
        assert_eq!(boss.phase, BossPhase::Attacking);

        let mut boss = Boss::new(2, &tuning, 800.0);
        boss.phase = BossPhase::Attacking;
        boss.pos.y = 150.0;
        boss.health = 500.0;
        let out = boss.update(SIM_DT, &ctx(&tuning, 400.0), &mut shots);
        assert_eq!(boss.phase, BossPhase::SpecialAttack);
        assert_eq!(out.telegraph, Some(0.5));
        boss.health = 200.0;
        boss.update(SIM_DT, &ctx(&tuning, 400.0), &mut shots);
        assert_eq!(boss.phase, BossPhase::Rage);
    }

    #[test]
    fn test_rage_shortens_interval() {
        let tuning = BossTuning::default();
        let mut boss = Boss::new(1, &tuning, 800.0);
        boss.phase = BossPhase::Attacking;
        let normal = boss.attack_interval(&tuning);
        boss.phase = BossPhase::Rage;
        assert!((boss.attack_interval(&tuning) - normal * 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_pattern_bullet_counts() {
        let tuning = BossTuning::default();
        let c = ctx(&tuning, 400.0);
        let count = |boss: &Boss, p: u32| {
            let mut shots = Vec::new();
            boss.fire_pattern(p, &c, &mut shots);
            shots.len()
        };
        let l1 = Boss::new(1, &tuning, 800.0);
        let l2 = Boss::new(2, &tuning, 800.0);
        let l4 = Boss::new(4, &tuning, 800.0);
        assert_eq!(count(&l1, 0), 5);
        assert_eq!(count(&l2, 0), 7);
        assert_eq!(count(&l1, 2), 8);
        assert_eq!(count(&l2, 2), 12);
        assert_eq!(count(&l4, 2), 16);
        assert_eq!(count(&l1, 3), 3);
        assert_eq!(count(&l2, 3), 5);
        assert_eq!(count(&l2, 4), 6);
        assert_eq!(count(&l4, 7), 7);
        assert_eq!(count(&l4, 8), 12);
        assert_eq!(count(&l4, 9), 10);
    }

    #[test]
    fn test_clamped_to_screen_edges() {
        let tuning = BossTuning::default();
        let mut boss = Boss::new(1, &tuning, 800.0);
        boss.phase = BossPhase::Attacking;
        boss.pos = DVec2::new(81.0, 150.0);
        let mut shots = Vec::new();
        boss.update(SIM_DT, &ctx(&tuning, -5000.0), &mut shots);
        assert_eq!(boss.pos.x, 80.0);
    }
}
