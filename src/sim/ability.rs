//! Ability manager: cooldown-gated timed effects

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::TIMER_EPSILON;
use crate::tick_down;
use crate::tuning::AbilityStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityType {
    SlowTime,
    Barrier,
    WeaponBoost,
    EmpPulse,
    OrbitalShield,
    Dash,
}

impl AbilityType {
    pub const ALL: [AbilityType; 6] = [
        AbilityType::SlowTime,
        AbilityType::Barrier,
        AbilityType::WeaponBoost,
        AbilityType::EmpPulse,
        AbilityType::OrbitalShield,
        AbilityType::Dash,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AbilityType::SlowTime => "Slow Time",
            AbilityType::Barrier => "Barrier",
            AbilityType::WeaponBoost => "Weapon Boost",
            AbilityType::EmpPulse => "EMP Pulse",
            AbilityType::OrbitalShield => "Orbital Shield",
            AbilityType::Dash => "Dash",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbilityState {
    pub cooldown: f64,
    pub cooldown_timer: f64,
    pub shield_cost: f64,
    pub active: bool,
    /// Length of the active effect (0 = instant)
    pub duration: f64,
    pub duration_timer: f64,
}

impl AbilityState {
    pub fn new(stats: &AbilityStats) -> Self {
        Self {
            cooldown: stats.cooldown,
            cooldown_timer: 0.0,
            shield_cost: stats.shield_cost,
            active: false,
            duration: stats.duration,
            duration_timer: 0.0,
        }
    }

    pub fn can_use(&self) -> bool {
        self.cooldown_timer <= TIMER_EPSILON
    }

    /// 0 = ready, 1 = just used
    pub fn cooldown_fraction(&self) -> f64 {
        if self.cooldown > 0.0 {
            (self.cooldown_timer / self.cooldown).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AbilityManager {
    abilities: BTreeMap<AbilityType, AbilityState>,
}

impl AbilityManager {
    pub fn new(stats: &BTreeMap<AbilityType, AbilityStats>) -> Self {
        Self {
            abilities: stats
                .iter()
                .map(|(kind, s)| (*kind, AbilityState::new(s)))
                .collect(),
        }
    }

    pub fn get(&self, kind: AbilityType) -> Option<&AbilityState> {
        self.abilities.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AbilityType, &AbilityState)> {
        self.abilities.iter().map(|(k, s)| (*k, s))
    }

    pub fn can_use(&self, kind: AbilityType) -> bool {
        self.abilities.get(&kind).is_some_and(|a| a.can_use())
    }

    pub fn is_active(&self, kind: AbilityType) -> bool {
        self.abilities.get(&kind).is_some_and(|a| a.active)
    }

    pub fn shield_cost(&self, kind: AbilityType) -> f64 {
        self.abilities.get(&kind).map_or(0.0, |a| a.shield_cost)
    }

    /// Start the cooldown and the effect. `false` while cooling down.
    pub fn use_ability(&mut self, kind: AbilityType) -> bool {
        let Some(ability) = self.abilities.get_mut(&kind) else {
            return false;
        };
        if !ability.can_use() {
            return false;
        }
        ability.cooldown_timer = ability.cooldown;
        ability.duration_timer = ability.duration;
        ability.active = ability.duration > 0.0;
        true
    }

    pub fn update(&mut self, dt: f64) {
        for ability in self.abilities.values_mut() {
            tick_down(&mut ability.cooldown_timer, dt);
            if ability.active {
                tick_down(&mut ability.duration_timer, dt);
                if ability.duration_timer <= TIMER_EPSILON {
                    ability.active = false;
                    ability.duration_timer = 0.0;
                }
            }
        }
    }

    pub fn reset(&mut self) {
        for ability in self.abilities.values_mut() {
            ability.cooldown_timer = 0.0;
            ability.duration_timer = 0.0;
            ability.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::tuning::default_abilities;

    #[test]
    fn test_use_sets_cooldown_and_duration() {
        let mut am = AbilityManager::new(&default_abilities());
        assert!(am.use_ability(AbilityType::SlowTime));
        assert!(am.is_active(AbilityType::SlowTime));
        assert!(!am.can_use(AbilityType::SlowTime));
        assert!(!am.use_ability(AbilityType::SlowTime));
        for _ in 0..119 {
            am.update(SIM_DT);
        }
        assert!(am.is_active(AbilityType::SlowTime));
        am.update(SIM_DT);
        assert!(!am.is_active(AbilityType::SlowTime));
    }

    #[test]
    fn test_dash_is_instant() {
        let mut am = AbilityManager::new(&default_abilities());
        assert!(am.use_ability(AbilityType::Dash));
        assert!(!am.is_active(AbilityType::Dash));
        for _ in 0..180 {
            am.update(SIM_DT);
        }
        assert!(am.can_use(AbilityType::Dash));
    }

    #[test]
    fn test_cooldown_fraction() {
        let mut am = AbilityManager::new(&default_abilities());
        assert_eq!(am.get(AbilityType::EmpPulse).unwrap().cooldown_fraction(), 0.0);
        am.use_ability(AbilityType::EmpPulse);
        assert_eq!(am.get(AbilityType::EmpPulse).unwrap().cooldown_fraction(), 1.0);
        am.reset();
        assert!(am.can_use(AbilityType::EmpPulse));
    }
}
