//! Weapon manager: per-weapon state, upgrade ladder and shot patterns

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::projectile::{BurnEffect, ChainState};
use super::state::Rgba;
use crate::consts::{FORWARD_ANGLE, TICK_RATE, TIMER_EPSILON};
use crate::from_polar;
use crate::tuning::{ProjectileTuning, WeaponStats};

pub const MAX_WEAPON_LEVEL: u8 = 5;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum WeaponType {
    #[default]
    Basic,
    SpreadShot,
    Laser,
    FollowingRocket,
    ChainLightning,
    Flamethrower,
    IonBeam,
    PlasmaCannon,
}

impl WeaponType {
    pub const ALL: [WeaponType; 8] = [
        WeaponType::Basic,
        WeaponType::SpreadShot,
        WeaponType::Laser,
        WeaponType::FollowingRocket,
        WeaponType::ChainLightning,
        WeaponType::Flamethrower,
        WeaponType::IonBeam,
        WeaponType::PlasmaCannon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WeaponType::Basic => "Blaster",
            WeaponType::SpreadShot => "Spread Shot",
            WeaponType::Laser => "Laser",
            WeaponType::FollowingRocket => "Following Rocket",
            WeaponType::ChainLightning => "Chain Lightning",
            WeaponType::Flamethrower => "Flamethrower",
            WeaponType::IonBeam => "Ion Beam",
            WeaponType::PlasmaCannon => "Plasma Cannon",
        }
    }
}

/// Everything needed to spawn one projectile
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShotSpec {
    pub pos: DVec2,
    /// px/tick
    pub vel: DVec2,
    pub radius: f64,
    pub damage: f64,
    pub main_color: Rgba,
    pub glow_color: Rgba,
    pub homing_turn_rate: Option<f64>,
    pub chain: Option<ChainState>,
    pub burn: Option<BurnEffect>,
    /// Beam emitter; `pos` is then the beam tip
    pub beam_source: Option<DVec2>,
}

/// Live state of one weapon
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponState {
    pub kind: WeaponType,
    /// Mk I..=Mk V
    pub level: u8,
    pub damage: f64,
    pub fire_rate: f64,
    pub fire_timer: f64,
    /// px/s
    pub projectile_speed: f64,
    pub spread: f64,
    pub projectile_count: u32,
    pub projectile_radius: f64,
    pub unlocked: bool,
    pub main_color: Rgba,
    pub glow_color: Rgba,
    base: WeaponStats,
}

impl WeaponState {
    pub fn new(kind: WeaponType, base: &WeaponStats) -> Self {
        let mut state = Self {
            kind,
            level: 1,
            damage: base.damage,
            fire_rate: base.fire_rate,
            fire_timer: 0.0,
            projectile_speed: base.projectile_speed,
            spread: base.spread,
            projectile_count: base.projectile_count,
            projectile_radius: base.projectile_radius,
            unlocked: base.unlocked,
            main_color: base.main_color,
            glow_color: base.glow_color,
            base: base.clone(),
        };
        state.apply_level();
        state
    }

    /// Recompute stats by replaying the ladder from Mk I
    fn apply_level(&mut self) {
        let base = &self.base;
        self.damage = base.damage;
        self.fire_rate = base.fire_rate;
        self.projectile_speed = base.projectile_speed;
        self.spread = base.spread;
        self.projectile_count = base.projectile_count;

        for level in 2..=self.level {
            if self.kind == WeaponType::Basic {
                match level {
                    2 => {
                        self.fire_rate *= 1.25;
                        self.damage *= 1.10;
                    }
                    3 => {
                        self.projectile_count = 3;
                        self.damage *= 1.15;
                    }
                    4 => {
                        self.spread *= 1.3;
                        self.damage *= 1.20;
                        self.fire_rate *= 1.10;
                    }
                    _ => {
                        self.projectile_count = 5;
                        self.damage *= 1.25;
                    }
                }
            } else {
                self.damage *= 1.15;
                self.fire_rate *= 1.08;
                self.projectile_speed *= 1.05;
                match level {
                    4 => self.projectile_count += base.extra_projectiles[0],
                    5 => self.projectile_count += base.extra_projectiles[1],
                    _ => {}
                }
            }
        }
        // One projectile always flies straight ahead
        if self.projectile_count % 2 == 0 {
            self.projectile_count += 1;
        }
    }

    pub fn can_fire(&self) -> bool {
        self.fire_timer <= TIMER_EPSILON
    }

    /// Start the refire countdown. `rate_mult` folds in buffs and debuffs.
    pub fn fire(&mut self, rate_mult: f64) -> bool {
        if !self.can_fire() {
            return false;
        }
        let rate = (self.fire_rate * rate_mult).max(1e-3);
        self.fire_timer = 1.0 / rate;
        true
    }

    pub fn update(&mut self, dt: f64) {
        crate::tick_down(&mut self.fire_timer, dt);
    }

    fn shot(&self, pos: DVec2, angle: f64) -> ShotSpec {
        ShotSpec {
            pos,
            vel: from_polar(self.projectile_speed / TICK_RATE, angle),
            radius: self.projectile_radius,
            damage: self.damage,
            main_color: self.main_color,
            glow_color: self.glow_color,
            ..ShotSpec::default()
        }
    }
}

/// Result of collecting a weapon powerup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponPickup {
    Upgraded(WeaponType, u8),
    Unlocked(WeaponType),
    /// Everything is unlocked and maxed
    Maxed,
}

#[derive(Debug, Clone)]
pub struct WeaponManager {
    weapons: BTreeMap<WeaponType, WeaponState>,
    pub current: WeaponType,
    /// Alternates the mixed-mode side blaster
    side_counter: u32,
    side_offset: f64,
}

impl WeaponManager {
    pub fn new(stats: &BTreeMap<WeaponType, WeaponStats>, side_offset: f64) -> Self {
        let mut weapons: BTreeMap<WeaponType, WeaponState> = stats
            .iter()
            .map(|(kind, base)| (*kind, WeaponState::new(*kind, base)))
            .collect();
        if let Some(basic) = weapons.get_mut(&WeaponType::Basic) {
            basic.unlocked = true;
        }
        Self {
            weapons,
            current: WeaponType::Basic,
            side_counter: 0,
            side_offset,
        }
    }

    pub fn get(&self, kind: WeaponType) -> Option<&WeaponState> {
        self.weapons.get(&kind)
    }

    pub fn get_mut(&mut self, kind: WeaponType) -> Option<&mut WeaponState> {
        self.weapons.get_mut(&kind)
    }

    pub fn current_state(&self) -> Option<&WeaponState> {
        self.weapons.get(&self.current)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeaponState> {
        self.weapons.values()
    }

    pub fn update(&mut self, dt: f64) {
        for weapon in self.weapons.values_mut() {
            weapon.update(dt);
        }
    }

    pub fn can_fire(&self) -> bool {
        self.current_state().is_some_and(|w| w.can_fire())
    }

    /// Basic gun at Mk V while another weapon is selected
    pub fn mixed_mode(&self) -> bool {
        self.current != WeaponType::Basic
            && self
                .weapons
                .get(&WeaponType::Basic)
                .is_some_and(|b| b.level >= MAX_WEAPON_LEVEL)
    }

    pub fn switch_to(&mut self, kind: WeaponType) -> bool {
        match self.weapons.get(&kind) {
            Some(w) if w.unlocked => {
                self.current = kind;
                true
            }
            _ => {
                log::warn!("cannot switch to locked weapon {}", kind.name());
                false
            }
        }
    }

    /// Next unlocked weapon after the current one (wraps)
    pub fn cycle(&mut self) -> WeaponType {
        let kinds: Vec<WeaponType> = self
            .weapons
            .values()
            .filter(|w| w.unlocked)
            .map(|w| w.kind)
            .collect();
        if let Some(pos) = kinds.iter().position(|k| *k == self.current) {
            self.current = kinds[(pos + 1) % kinds.len()];
        } else if let Some(first) = kinds.first() {
            self.current = *first;
        }
        self.current
    }

    pub fn unlock(&mut self, kind: WeaponType) -> bool {
        match self.weapons.get_mut(&kind) {
            Some(w) if !w.unlocked => {
                w.unlocked = true;
                true
            }
            _ => false,
        }
    }

    pub fn upgrade(&mut self, kind: WeaponType) -> bool {
        match self.weapons.get_mut(&kind) {
            Some(w) if w.level < MAX_WEAPON_LEVEL => {
                w.level += 1;
                w.unlocked = true;
                w.apply_level();
                log::debug!("{} upgraded to Mk {}", kind.name(), w.level);
                true
            }
            _ => false,
        }
    }

    pub fn downgrade(&mut self, kind: WeaponType) -> bool {
        match self.weapons.get_mut(&kind) {
            Some(w) if w.level > 1 => {
                w.level -= 1;
                w.apply_level();
                log::debug!("{} downgraded to Mk {}", kind.name(), w.level);
                true
            }
            _ => false,
        }
    }

    /// Weapon powerup: upgrade the current weapon, or unlock and select the
    /// next locked one once it is maxed
    pub fn collect_pickup(&mut self) -> WeaponPickup {
        let current = self.current;
        if self.upgrade(current) {
            let level = self.weapons.get(&current).map_or(1, |w| w.level);
            return WeaponPickup::Upgraded(current, level);
        }
        let next_locked = WeaponType::ALL
            .iter()
            .copied()
            .find(|k| self.weapons.get(k).is_some_and(|w| !w.unlocked));
        match next_locked {
            Some(kind) => {
                self.unlock(kind);
                self.current = kind;
                WeaponPickup::Unlocked(kind)
            }
            None => WeaponPickup::Maxed,
        }
    }

    /// Fire the current weapon from `nose` if its timer allows.
    ///
    /// Pushes every projectile of the salvo (plus the mixed-mode side blaster)
    /// into `out` and returns the number pushed.
    pub fn fire(
        &mut self,
        nose: DVec2,
        rate_mult: f64,
        rules: &ProjectileTuning,
        out: &mut Vec<ShotSpec>,
    ) -> usize {
        let mixed = self.mixed_mode();
        let Some(weapon) = self.weapons.get_mut(&self.current) else {
            return 0;
        };
        if !weapon.fire(rate_mult) {
            return 0;
        }
        let start = out.len();
        let n = weapon.projectile_count.max(1);

        match weapon.kind {
            WeaponType::ChainLightning => {
                let mut shot = weapon.shot(nose, FORWARD_ANGLE);
                shot.chain = Some(ChainState::new(rules.chain_count, rules.chain_range));
                out.push(shot);
            }
            WeaponType::IonBeam => {
                let mut shot = weapon.shot(nose + from_polar(rules.beam_length, FORWARD_ANGLE), FORWARD_ANGLE);
                shot.beam_source = Some(nose);
                shot.radius = rules.beam_radius.max(weapon.projectile_radius);
                out.push(shot);
            }
            WeaponType::Flamethrower => {
                // Center flame, then alternate left/right
                for i in 0..n {
                    let rank = i.div_ceil(2) as f64;
                    let side = if i % 2 == 1 { -1.0 } else { 1.0 };
                    let offset = side * rank * weapon.spread;
                    let mut shot = weapon.shot(nose, FORWARD_ANGLE + offset);
                    shot.burn = Some(BurnEffect {
                        duration: rules.burn_duration,
                        damage_per_tick: rules.burn_damage,
                    });
                    out.push(shot);
                }
            }
            kind => {
                let center = (n - 1) as f64 * 0.5;
                for i in 0..n {
                    let offset = weapon.spread * (i as f64 - center);
                    let mut shot = weapon.shot(nose, FORWARD_ANGLE + offset);
                    if kind == WeaponType::FollowingRocket {
                        shot.homing_turn_rate = Some(rules.homing_turn_rate);
                    }
                    out.push(shot);
                }
            }
        }

        if mixed {
            if let Some(basic) = self.weapons.get(&WeaponType::Basic) {
                let side = if self.side_counter % 2 == 0 { -1.0 } else { 1.0 };
                self.side_counter = self.side_counter.wrapping_add(1);
                let pos = nose + DVec2::new(side * self.side_offset, 0.0);
                out.push(basic.shot(pos, FORWARD_ANGLE));
            }
        }
        out.len() - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::tuning::{Tuning, default_weapons};

    fn manager() -> WeaponManager {
        WeaponManager::new(&default_weapons(), 12.0)
    }

    #[test]
    fn test_basic_ladder() {
        let mut wm = manager();
        let base = wm.get(WeaponType::Basic).unwrap().clone();
        wm.upgrade(WeaponType::Basic);
        let mk2 = wm.get(WeaponType::Basic).unwrap().clone();
        assert!((mk2.fire_rate - base.fire_rate * 1.25).abs() < 1e-9);
        assert!((mk2.damage - base.damage * 1.10).abs() < 1e-9);
        wm.upgrade(WeaponType::Basic);
        assert_eq!(wm.get(WeaponType::Basic).unwrap().projectile_count, 3);
        wm.upgrade(WeaponType::Basic);
        let mk4 = wm.get(WeaponType::Basic).unwrap().clone();
        assert!((mk4.spread - base.spread * 1.3).abs() < 1e-9);
        assert_eq!(mk4.projectile_count, 3);
        wm.upgrade(WeaponType::Basic);
        let mk5 = wm.get(WeaponType::Basic).unwrap().clone();
        assert_eq!(mk5.projectile_count, 5);
        let expected = base.damage * 1.10 * 1.15 * 1.20 * 1.25;
        assert!((mk5.damage - expected).abs() < 1e-9);
        assert!(!wm.upgrade(WeaponType::Basic));
    }

    #[test]
    fn test_other_ladder_and_extra_projectiles_stay_odd() {
        let mut wm = manager();
        for _ in 0..4 {
            wm.upgrade(WeaponType::SpreadShot);
        }
        let w = wm.get(WeaponType::SpreadShot).unwrap();
        assert_eq!(w.level, 5);
        assert_eq!(w.projectile_count, 7);
        assert!((w.damage - 7.0 * 1.15f64.powi(4)).abs() < 1e-9);
        assert!((w.projectile_speed - 480.0 * 1.05f64.powi(4)).abs() < 1e-9);
        for w in wm.iter() {
            assert_eq!(w.projectile_count % 2, 1);
        }
    }

    #[test]
    fn test_downgrade_replays_ladder() {
        let mut wm = manager();
        wm.upgrade(WeaponType::Basic);
        wm.upgrade(WeaponType::Basic);
        let mk3 = wm.get(WeaponType::Basic).unwrap().clone();
        wm.upgrade(WeaponType::Basic);
        wm.downgrade(WeaponType::Basic);
        assert_eq!(wm.get(WeaponType::Basic).unwrap(), &mk3);
    }

    #[test]
    fn test_fire_rate_gate() {
        let tuning = Tuning::default();
        let mut wm = manager();
        let mut out = Vec::new();
        assert_eq!(wm.fire(DVec2::ZERO, 1.0, &tuning.projectiles, &mut out), 1);
        assert_eq!(wm.fire(DVec2::ZERO, 1.0, &tuning.projectiles, &mut out), 0);
        // 5 shots/s -> 12 ticks
        for _ in 0..11 {
            wm.update(SIM_DT);
        }
        assert!(!wm.can_fire());
        wm.update(SIM_DT);
        assert!(wm.can_fire());
    }

    #[test]
    fn test_fan_is_centered_and_speed_per_tick() {
        let tuning = Tuning::default();
        let mut wm = manager();
        wm.unlock(WeaponType::SpreadShot);
        wm.switch_to(WeaponType::SpreadShot);
        let mut out = Vec::new();
        wm.fire(DVec2::new(400.0, 500.0), 1.0, &tuning.projectiles, &mut out);
        assert_eq!(out.len(), 3);
        let mid = out[1].vel;
        assert!(mid.x.abs() < 1e-9);
        assert!((mid.length() - 8.0).abs() < 1e-9);
        assert!((out[0].vel.x + out[2].vel.x).abs() < 1e-9);
    }

    #[test]
    fn test_specialized_weapons() {
        let tuning = Tuning::default();
        let rules = &tuning.projectiles;
        let mut wm = manager();
        let nose = DVec2::new(400.0, 500.0);
        let mut out = Vec::new();

        wm.unlock(WeaponType::FollowingRocket);
        wm.switch_to(WeaponType::FollowingRocket);
        wm.fire(nose, 1.0, rules, &mut out);
        assert_eq!(out[0].homing_turn_rate, Some(0.08));

        out.clear();
        wm.unlock(WeaponType::ChainLightning);
        wm.switch_to(WeaponType::ChainLightning);
        wm.fire(nose, 1.0, rules, &mut out);
        assert_eq!(out.len(), 1);
        let chain = out[0].chain.unwrap();
        assert_eq!((chain.remaining, chain.range), (3, 150.0));

        out.clear();
        wm.unlock(WeaponType::IonBeam);
        wm.switch_to(WeaponType::IonBeam);
        wm.fire(nose, 1.0, rules, &mut out);
        assert_eq!(out[0].beam_source, Some(nose));
        assert!((out[0].pos.y - (500.0 - 480.0)).abs() < 1e-9);
    }

    #[test]
    fn test_mixed_mode_alternates_sides() {
        let tuning = Tuning::default();
        let rules = &tuning.projectiles;
        let mut wm = manager();
        for _ in 0..4 {
            wm.upgrade(WeaponType::Basic);
        }
        wm.unlock(WeaponType::Flamethrower);
        wm.switch_to(WeaponType::Flamethrower);
        assert!(wm.mixed_mode());
        let nose = DVec2::new(400.0, 500.0);
        let mut out = Vec::new();
        assert_eq!(wm.fire(nose, 1.0, rules, &mut out), 4);
        let first = out[3];
        assert!(first.burn.is_none());
        wm.get_mut(WeaponType::Flamethrower).unwrap().fire_timer = 0.0;
        out.clear();
        wm.fire(nose, 1.0, rules, &mut out);
        let second = out[3];
        assert_eq!(first.pos.x - nose.x, -(second.pos.x - nose.x));
        assert_eq!((first.pos.x - nose.x).abs(), 12.0);
    }

    #[test]
    fn test_pickup_unlocks_next_at_max() {
        let mut wm = manager();
        for _ in 0..4 {
            assert!(matches!(wm.collect_pickup(), WeaponPickup::Upgraded(WeaponType::Basic, _)));
        }
        assert_eq!(wm.collect_pickup(), WeaponPickup::Unlocked(WeaponType::SpreadShot));
        assert_eq!(wm.current, WeaponType::SpreadShot);
    }

    #[test]
    fn test_cycle_skips_locked() {
        let mut wm = manager();
        assert_eq!(wm.cycle(), WeaponType::Basic);
        wm.unlock(WeaponType::Laser);
        assert_eq!(wm.cycle(), WeaponType::Laser);
        assert_eq!(wm.cycle(), WeaponType::Basic);
        assert!(!wm.switch_to(WeaponType::IonBeam));
    }
}
