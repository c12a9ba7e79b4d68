//! Mystery powerup roulette

use serde::{Deserialize, Serialize};

use super::player::Player;
use super::rng::SimRng;
use crate::tuning::MysteryTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MysteryEffect {
    SuperWeaponUpgrade,
    SpeedBoost,
    ShieldOvercharge,
    RapidFire,
    Invincibility,
    ScoreMultiplier,
    WeaponDowngrade,
    EngineMalfunction,
    ShieldDrain,
    FireRateReduction,
    ControlReversal,
}

impl MysteryEffect {
    pub fn name(&self) -> &'static str {
        match self {
            MysteryEffect::SuperWeaponUpgrade => "Super Weapon Upgrade!",
            MysteryEffect::SpeedBoost => "Speed Boost!",
            MysteryEffect::ShieldOvercharge => "Shield Overcharge!",
            MysteryEffect::RapidFire => "Rapid Fire!",
            MysteryEffect::Invincibility => "Invincibility!",
            MysteryEffect::ScoreMultiplier => "Score x2!",
            MysteryEffect::WeaponDowngrade => "Weapon Downgrade",
            MysteryEffect::EngineMalfunction => "Engine Malfunction",
            MysteryEffect::ShieldDrain => "Shield Drain",
            MysteryEffect::FireRateReduction => "Jammed Guns",
            MysteryEffect::ControlReversal => "Controls Reversed",
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(
            self,
            MysteryEffect::SuperWeaponUpgrade
                | MysteryEffect::SpeedBoost
                | MysteryEffect::ShieldOvercharge
                | MysteryEffect::RapidFire
                | MysteryEffect::Invincibility
                | MysteryEffect::ScoreMultiplier
        )
    }
}

/// What the caller learns about an applied effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MysteryOutcome {
    pub effect: MysteryEffect,
    pub name: &'static str,
    pub positive: bool,
}

/// Draw the sign first, then an effect weighted within that table
pub fn roll(rng: &mut SimRng, tuning: &MysteryTuning) -> MysteryEffect {
    let table = if rng.chance(tuning.positive_chance) {
        &tuning.positive
    } else {
        &tuning.negative
    };
    let index = rng.weighted_index(table.iter().map(|(_, w)| *w)).unwrap_or(0);
    table
        .get(index)
        .map(|(effect, _)| *effect)
        .unwrap_or(MysteryEffect::ShieldOvercharge)
}

/// Apply an effect to the player
pub fn apply(player: &mut Player, effect: MysteryEffect, tuning: &MysteryTuning) -> MysteryOutcome {
    match effect {
        MysteryEffect::SuperWeaponUpgrade => {
            let current = player.weapons.current;
            player.weapons.upgrade(current);
            player.weapons.upgrade(current);
        }
        MysteryEffect::SpeedBoost => {
            player.speed_boost_multiplier = tuning.speed_boost_multiplier;
            player.speed_boost_timer = tuning.speed_boost_duration;
        }
        MysteryEffect::ShieldOvercharge => {
            player.shield = player.max_shield;
            player.shield_accumulator = 0.0;
        }
        MysteryEffect::RapidFire => {
            player.rapid_fire_multiplier = tuning.rapid_fire_multiplier;
            player.rapid_fire_timer = tuning.rapid_fire_duration;
        }
        MysteryEffect::Invincibility => {
            player.powerup_invincibility_timer = tuning.invincibility_duration;
        }
        MysteryEffect::ScoreMultiplier => {
            player.score_multiplier = tuning.score_multiplier;
            player.score_multiplier_timer = tuning.score_multiplier_duration;
        }
        MysteryEffect::WeaponDowngrade => {
            let current = player.weapons.current;
            player.weapons.downgrade(current);
        }
        MysteryEffect::EngineMalfunction => {
            player.engine_malfunction_multiplier = tuning.engine_malfunction_multiplier;
            player.engine_malfunction_timer = tuning.engine_malfunction_duration;
        }
        MysteryEffect::ShieldDrain => {
            player.shield = 0.0;
            player.shield_accumulator = 0.0;
        }
        MysteryEffect::FireRateReduction => {
            player.slow_fire_multiplier = tuning.slow_fire_multiplier;
            player.slow_fire_timer = tuning.slow_fire_duration;
        }
        MysteryEffect::ControlReversal => {
            player.control_reversal_timer = tuning.control_reversal_duration;
        }
    }
    let outcome = MysteryOutcome {
        effect,
        name: effect.name(),
        positive: effect.is_positive(),
    };
    log::debug!("mystery: {} ({})", outcome.name, if outcome.positive { "+" } else { "-" });
    outcome
}
