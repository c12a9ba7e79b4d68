//! Player ship: movement, shields, buffs, charge and ultimate

use std::f64::consts::FRAC_1_SQRT_2;

use glam::DVec2;

use super::ability::{AbilityManager, AbilityType};
use super::trail::Trail;
use super::weapon::{ShotSpec, WeaponManager};
use crate::consts::{THRUSTER_TRAIL_LENGTH, TIMER_EPSILON};
use crate::tick_down;
use crate::tuning::{ProjectileTuning, Tuning};

/// Dead-zone for reading a move intent as a directional key
const AXIS_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct Player {
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    pub base_speed: f64,
    pub health: f64,
    pub max_health: f64,
    pub shield: f64,
    pub max_shield: f64,
    /// Shield points per tick while regenerating
    pub shield_regen_rate: f64,
    /// Seconds since the last hit before regen starts
    pub shield_regen_delay: f64,
    pub shield_accumulator: f64,
    /// Post-damage grace period length
    pub invincibility_time: f64,
    pub invincibility_timer: f64,
    pub last_damage_time: Option<f64>,
    pub weapons: WeaponManager,
    pub abilities: AbilityManager,
    pub charge: f64,
    pub ultimate_charge: f64,
    pub ultimate_active: bool,
    pub ultimate_timer: f64,
    pub trail: Trail<THRUSTER_TRAIL_LENGTH>,
    /// Latched movement intent (last MoveDirection)
    pub move_intent: DVec2,

    pub speed_boost_timer: f64,
    pub speed_boost_multiplier: f64,
    pub engine_malfunction_timer: f64,
    pub engine_malfunction_multiplier: f64,
    pub rapid_fire_timer: f64,
    pub rapid_fire_multiplier: f64,
    pub score_multiplier_timer: f64,
    pub score_multiplier: f64,
    pub control_reversal_timer: f64,
    pub slow_fire_timer: f64,
    pub slow_fire_multiplier: f64,
    pub powerup_invincibility_timer: f64,
    pub dash_invincibility_timer: f64,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        let p = &tuning.player;
        let difficulty = tuning.difficulty_tuning();
        Self {
            pos: DVec2::new(
                tuning.screen.width * p.spawn_x,
                tuning.screen.height * p.spawn_y,
            ),
            vel: DVec2::ZERO,
            radius: p.radius,
            base_speed: p.speed,
            health: p.max_health,
            max_health: p.max_health,
            shield: p.max_shield,
            max_shield: p.max_shield,
            shield_regen_rate: difficulty.shield_regen_rate,
            shield_regen_delay: difficulty.shield_regen_delay,
            shield_accumulator: 0.0,
            invincibility_time: difficulty.invincibility_time,
            invincibility_timer: 0.0,
            last_damage_time: None,
            weapons: WeaponManager::new(&tuning.weapons, p.side_blaster_offset),
            abilities: AbilityManager::new(&tuning.abilities),
            charge: 0.0,
            ultimate_charge: 0.0,
            ultimate_active: false,
            ultimate_timer: 0.0,
            trail: Trail::default(),
            move_intent: DVec2::ZERO,
            speed_boost_timer: 0.0,
            speed_boost_multiplier: 1.0,
            engine_malfunction_timer: 0.0,
            engine_malfunction_multiplier: 1.0,
            rapid_fire_timer: 0.0,
            rapid_fire_multiplier: 1.0,
            score_multiplier_timer: 0.0,
            score_multiplier: 1.0,
            control_reversal_timer: 0.0,
            slow_fire_timer: 0.0,
            slow_fire_multiplier: 1.0,
            powerup_invincibility_timer: 0.0,
            dash_invincibility_timer: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn controls_reversed(&self) -> bool {
        self.control_reversal_timer > TIMER_EPSILON
    }

    /// Any source of invincibility (post-hit grace, powerup, dash, Barrier)
    pub fn is_invincible(&self) -> bool {
        self.invincibility_timer > TIMER_EPSILON
            || self.powerup_invincibility_timer > TIMER_EPSILON
            || self.dash_invincibility_timer > TIMER_EPSILON
            || self.abilities.is_active(AbilityType::Barrier)
    }

    /// Current movement speed (px/tick)
    pub fn speed(&self) -> f64 {
        self.base_speed * self.speed_boost_multiplier * self.engine_malfunction_multiplier
    }

    pub fn nose(&self) -> DVec2 {
        self.pos - DVec2::new(0.0, self.radius)
    }

    pub fn health_fraction(&self) -> f64 {
        (self.health / self.max_health.max(1e-9)).clamp(0.0, 1.0)
    }

    pub fn shield_fraction(&self) -> f64 {
        (self.shield / self.max_shield.max(1e-9)).clamp(0.0, 1.0)
    }

    /// Count every buff/debuff down; expired ones revert to neutral
    pub fn update_buffs(&mut self, dt: f64) {
        fn expire(timer: &mut f64, value: &mut f64, dt: f64) {
            if *timer > 0.0 {
                tick_down(timer, dt);
                if *timer <= TIMER_EPSILON {
                    *timer = 0.0;
                    *value = 1.0;
                }
            }
        }
        expire(&mut self.speed_boost_timer, &mut self.speed_boost_multiplier, dt);
        expire(
            &mut self.engine_malfunction_timer,
            &mut self.engine_malfunction_multiplier,
            dt,
        );
        expire(&mut self.rapid_fire_timer, &mut self.rapid_fire_multiplier, dt);
        expire(&mut self.score_multiplier_timer, &mut self.score_multiplier, dt);
        expire(&mut self.slow_fire_timer, &mut self.slow_fire_multiplier, dt);
        tick_down(&mut self.control_reversal_timer, dt);
        tick_down(&mut self.powerup_invincibility_timer, dt);
        tick_down(&mut self.dash_invincibility_timer, dt);
        tick_down(&mut self.invincibility_timer, dt);

        if self.ultimate_active {
            tick_down(&mut self.ultimate_timer, dt);
            if self.ultimate_timer <= TIMER_EPSILON {
                self.ultimate_active = false;
                self.ultimate_timer = 0.0;
            }
        }
        self.weapons.update(dt);
        self.abilities.update(dt);
    }

    /// Unit direction from the latched intent, as four directional keys
    pub fn input_direction(&self) -> DVec2 {
        let axis = |v: f64| {
            if v > AXIS_THRESHOLD {
                1.0
            } else if v < -AXIS_THRESHOLD {
                -1.0
            } else {
                0.0
            }
        };
        let mut dir = DVec2::new(axis(self.move_intent.x), axis(self.move_intent.y));
        if self.controls_reversed() {
            dir = -dir;
        }
        if dir.x != 0.0 && dir.y != 0.0 {
            dir *= FRAC_1_SQRT_2;
        }
        dir
    }

    pub fn clamp_to_screen(&mut self, width: f64, height: f64) {
        self.pos.x = self.pos.x.clamp(self.radius, (width - self.radius).max(self.radius));
        self.pos.y = self.pos.y.clamp(self.radius, (height - self.radius).max(self.radius));
    }

    pub fn update_movement(&mut self, width: f64, height: f64) {
        self.vel = self.input_direction() * self.speed();
        self.pos += self.vel;
        self.clamp_to_screen(width, height);
        self.trail.push(self.pos);
    }

    /// Regenerate after `regen_delay` seconds without damage
    pub fn regen_shield(&mut self, time: f64) {
        if self.shield >= self.max_shield || self.invincibility_timer > TIMER_EPSILON {
            return;
        }
        if let Some(last) = self.last_damage_time {
            if time - last < self.shield_regen_delay - TIMER_EPSILON {
                return;
            }
        }
        self.shield_accumulator += self.shield_regen_rate;
        let whole = self.shield_accumulator.floor();
        if whole >= 1.0 {
            self.shield += whole;
            self.shield_accumulator -= whole;
            if self.shield >= self.max_shield {
                self.shield = self.max_shield;
                self.shield_accumulator = 0.0;
            }
        }
    }

    /// Shield absorbs first, remainder to health. `false` if invincible.
    pub fn take_damage(&mut self, amount: f64, time: f64) -> bool {
        if amount <= 0.0 || self.is_invincible() {
            return false;
        }
        let absorbed = self.shield.min(amount);
        self.shield -= absorbed;
        self.health = (self.health - (amount - absorbed)).max(0.0);
        self.last_damage_time = Some(time);
        self.invincibility_timer = self.invincibility_time;
        true
    }

    /// Damage that bypasses the post-hit grace (hazard fields); `false` if
    /// another invincibility source is up
    pub fn take_continuous_damage(&mut self, amount: f64, time: f64) -> bool {
        if amount <= 0.0
            || self.powerup_invincibility_timer > TIMER_EPSILON
            || self.dash_invincibility_timer > TIMER_EPSILON
            || self.abilities.is_active(AbilityType::Barrier)
        {
            return false;
        }
        let absorbed = self.shield.min(amount);
        self.shield -= absorbed;
        self.health = (self.health - (amount - absorbed)).max(0.0);
        self.last_damage_time = Some(time);
        true
    }

    pub fn heal(&mut self, amount: f64) {
        self.health = (self.health + amount).min(self.max_health);
    }

    pub fn add_shield(&mut self, amount: f64) {
        self.shield = (self.shield + amount).min(self.max_shield);
    }

    /// Charge fills while firing and drains otherwise
    pub fn update_charge(&mut self, dt: f64, shooting: bool, charge_time: f64, decay: f64) {
        if shooting {
            self.charge += dt / charge_time.max(1e-6);
        } else {
            self.charge -= decay * dt;
        }
        self.charge = self.charge.clamp(0.0, 1.0);
    }

    pub fn add_ultimate_charge(&mut self, amount: f64) {
        self.ultimate_charge = (self.ultimate_charge + amount).clamp(0.0, 1.0);
    }

    /// Spend a full ultimate meter
    pub fn activate_ultimate(&mut self, duration: f64) -> bool {
        if self.ultimate_active || self.ultimate_charge < 1.0 - TIMER_EPSILON {
            return false;
        }
        self.ultimate_charge = 0.0;
        self.ultimate_active = true;
        self.ultimate_timer = duration;
        true
    }

    /// Fire-rate multiplier from buffs, debuffs and Weapon Boost
    pub fn fire_rate_multiplier(&self, weapon_boost: f64) -> f64 {
        let boost = if self.abilities.is_active(AbilityType::WeaponBoost) {
            weapon_boost
        } else {
            1.0
        };
        self.rapid_fire_multiplier * self.slow_fire_multiplier * boost
    }

    /// Fire the current weapon from the nose; returns projectiles emitted
    pub fn fire(&mut self, weapon_boost: f64, rules: &ProjectileTuning, out: &mut Vec<ShotSpec>) -> usize {
        let nose = self.nose();
        let mult = self.fire_rate_multiplier(weapon_boost);
        self.weapons.fire(nose, mult, rules, out)
    }

    /// Start an ability if it is off cooldown and the shield can pay for it
    pub fn try_ability(&mut self, kind: AbilityType) -> bool {
        let cost = self.abilities.shield_cost(kind);
        if !self.abilities.can_use(kind) {
            log::warn!("{} is cooling down", kind.name());
            return false;
        }
        if self.shield + TIMER_EPSILON < cost {
            log::warn!("not enough shield for {}", kind.name());
            return false;
        }
        if !self.abilities.use_ability(kind) {
            return false;
        }
        self.shield = (self.shield - cost).max(0.0);
        log::debug!("ability {} used", kind.name());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn player() -> Player {
        Player::new(&Tuning::default())
    }

    #[test]
    fn test_spawn_defaults() {
        let p = player();
        assert_eq!(p.pos, DVec2::new(400.0, 510.0));
        assert_eq!((p.health, p.shield), (100.0, 50.0));
    }

    #[test]
    fn test_diagonal_normalized() {
        let mut p = player();
        p.move_intent = DVec2::new(1.0, -1.0).normalize();
        p.update_movement(800.0, 600.0);
        assert!((p.vel.length() - p.speed()).abs() < 1e-9);
    }

    #[test]
    fn test_control_reversal_negates() {
        let mut p = player();
        p.move_intent = DVec2::X;
        p.control_reversal_timer = 1.0;
        p.update_movement(800.0, 600.0);
        assert!(p.vel.x < 0.0);
    }

    #[test]
    fn test_clamped_by_radius() {
        let mut p = player();
        p.pos = DVec2::new(16.0, 300.0);
        p.move_intent = -DVec2::X;
        p.update_movement(800.0, 600.0);
        assert_eq!(p.pos.x, p.radius);
    }

    #[test]
    fn test_shield_absorbs_then_health() {
        let mut p = player();
        p.shield = 10.0;
        assert!(p.take_damage(30.0, 1.0));
        assert_eq!((p.shield, p.health), (0.0, 80.0));
        // Grace period
        assert!(!p.take_damage(30.0, 1.0));
        assert_eq!(p.health, 80.0);
    }

    #[test]
    fn test_shield_regen_waits_for_delay() {
        let mut p = player();
        p.shield = 10.0;
        p.last_damage_time = Some(0.0);
        p.regen_shield(2.0);
        assert_eq!(p.shield, 10.0);
        // 0.05 per tick -> one point every 20 ticks
        for _ in 0..20 {
            p.regen_shield(3.0);
        }
        assert_eq!(p.shield, 11.0);
    }

    #[test]
    fn test_shield_regen_clamps_and_clears_accumulator() {
        let mut p = player();
        p.shield = 49.0;
        p.shield_regen_rate = 1.5;
        p.regen_shield(10.0);
        assert_eq!(p.shield, 50.0);
        assert_eq!(p.shield_accumulator, 0.0);
    }

    #[test]
    fn test_buffs_revert() {
        let mut p = player();
        p.speed_boost_multiplier = 1.5;
        p.speed_boost_timer = 0.5;
        for _ in 0..30 {
            p.update_buffs(SIM_DT);
        }
        assert_eq!(p.speed_boost_multiplier, 1.0);
        assert_eq!(p.speed_boost_timer, 0.0);
    }

    #[test]
    fn test_ability_costs_shield() {
        let mut p = player();
        p.shield = 25.0;
        assert!(!p.try_ability(AbilityType::Barrier));
        assert!(p.try_ability(AbilityType::SlowTime));
        assert_eq!(p.shield, 5.0);
        assert!(!p.try_ability(AbilityType::SlowTime));
    }

    #[test]
    fn test_barrier_blocks_damage() {
        let mut p = player();
        assert!(p.try_ability(AbilityType::Barrier));
        assert!(!p.take_damage(40.0, 0.0));
        assert!(!p.take_continuous_damage(1.0, 0.0));
    }

    #[test]
    fn test_charge_and_ultimate() {
        let mut p = player();
        for _ in 0..60 {
            p.update_charge(SIM_DT, true, 1.0, 2.0);
        }
        assert!((p.charge - 1.0).abs() < 1e-9);
        p.update_charge(SIM_DT, false, 1.0, 2.0);
        assert!(p.charge < 1.0);

        assert!(!p.activate_ultimate(5.0));
        for _ in 0..50 {
            p.add_ultimate_charge(0.02);
        }
        assert!(p.activate_ultimate(5.0));
        assert_eq!(p.ultimate_charge, 0.0);
        for _ in 0..300 {
            p.update_buffs(SIM_DT);
        }
        assert!(!p.ultimate_active);
    }
}
