//! Data-driven game balance
//!
//! Every constant the simulation reads lives here so hosts can ship balance
//! patches as JSON. Sections default individually, so a partial document only
//! overrides what it names.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sim::{
    AbilityType, AsteroidSize, EnemyType, HazardType, MysteryEffect, PowerupType, Rgba,
    WeaponType,
};

/// Difficulty presets (affect player survivability)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "med" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Why a tuning document was rejected
#[derive(Debug)]
pub enum TuningError {
    /// The document is not valid JSON for [`Tuning`]
    Parse(serde_json::Error),
    /// The document parsed but a value is out of range
    Invalid(String),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(err) => write!(f, "failed to parse tuning: {err}"),
            TuningError::Invalid(msg) => write!(f, "invalid tuning: {msg}"),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(err) => Some(err),
            TuningError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        TuningError::Parse(err)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenTuning {
    pub width: f64,
    pub height: f64,
}

impl Default for ScreenTuning {
    fn default() -> Self {
        Self {
            width: crate::consts::SCREEN_WIDTH,
            height: crate::consts::SCREEN_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridTuning {
    /// Uniform cell edge in pixels
    pub cell_size: f64,
}

impl Default for GridTuning {
    fn default() -> Self {
        Self { cell_size: 128.0 }
    }
}

/// Survivability knobs that differ per difficulty
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DifficultyTuning {
    /// Shield points added to the accumulator per tick
    pub shield_regen_rate: f64,
    /// Post-damage grace period (seconds)
    pub invincibility_time: f64,
    /// Seconds without damage before the shield regenerates
    pub shield_regen_delay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub radius: f64,
    /// Movement speed (px/tick)
    pub speed: f64,
    pub max_health: f64,
    pub max_shield: f64,
    /// Spawn point as a fraction of the screen
    pub spawn_x: f64,
    pub spawn_y: f64,
    /// Seconds of held fire to reach full charge
    pub charge_time: f64,
    /// Charge lost per second while not firing
    pub charge_decay: f64,
    pub ultimate_duration: f64,
    pub ultimate_charge_per_kill: f64,
    /// Horizontal offset of the mixed-mode side blasters
    pub side_blaster_offset: f64,
    /// Damage the ship's hull deals to an enemy it rams
    pub ram_damage: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 15.0,
            speed: 5.0,
            max_health: 100.0,
            max_shield: 50.0,
            spawn_x: 0.5,
            spawn_y: 0.85,
            charge_time: 1.0,
            charge_decay: 2.0,
            ultimate_duration: 5.0,
            ultimate_charge_per_kill: 0.02,
            side_blaster_offset: 12.0,
            ram_damage: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Speeds above this (px/s) get the short lifetime
    pub fast_speed_threshold: f64,
    pub fast_lifetime: f64,
    pub slow_lifetime: f64,
    /// Distance beyond the screen edge before culling
    pub offscreen_margin: f64,
    pub homing_range: f64,
    pub homing_turn_rate: f64,
    pub chain_count: u32,
    pub chain_range: f64,
    pub burn_duration: f64,
    pub burn_damage: f64,
    pub burn_tick_interval: f64,
    pub beam_length: f64,
    pub beam_radius: f64,
    pub beam_lifetime_ticks: u32,
    pub enemy_radius: f64,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            fast_speed_threshold: 350.0,
            fast_lifetime: 2.0,
            slow_lifetime: 2.5,
            offscreen_margin: 100.0,
            homing_range: 500.0,
            homing_turn_rate: 0.08,
            chain_count: 3,
            chain_range: 150.0,
            burn_duration: 3.0,
            burn_damage: 5.0,
            burn_tick_interval: 0.5,
            beam_length: 480.0,
            beam_radius: 6.0,
            beam_lifetime_ticks: 2,
            enemy_radius: 5.0,
        }
    }
}

/// Base (Mk I) stats of a weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub damage: f64,
    /// Shots per second
    pub fire_rate: f64,
    /// Pixels per second
    pub projectile_speed: f64,
    /// Angle between neighbouring projectiles (radians)
    pub spread: f64,
    pub projectile_count: u32,
    pub projectile_radius: f64,
    pub unlocked: bool,
    pub main_color: Rgba,
    pub glow_color: Rgba,
    /// Extra projectiles gained at Mk IV and Mk V (kept even so counts stay odd)
    pub extra_projectiles: [u32; 2],
}

#[allow(clippy::too_many_arguments)]
fn weapon(
    damage: f64,
    fire_rate: f64,
    projectile_speed: f64,
    spread: f64,
    projectile_count: u32,
    projectile_radius: f64,
    main_color: Rgba,
    glow_color: Rgba,
    extra_projectiles: [u32; 2],
) -> WeaponStats {
    WeaponStats {
        damage,
        fire_rate,
        projectile_speed,
        spread,
        projectile_count,
        projectile_radius,
        unlocked: false,
        main_color,
        glow_color,
        extra_projectiles,
    }
}

pub fn default_weapons() -> BTreeMap<WeaponType, WeaponStats> {
    let mut map = BTreeMap::new();
    let mut basic = weapon(
        10.0,
        5.0,
        600.0,
        0.15,
        1,
        4.0,
        Rgba::new(120, 220, 255, 255),
        Rgba::new(40, 120, 255, 160),
        [0, 0],
    );
    basic.unlocked = true;
    map.insert(WeaponType::Basic, basic);
    map.insert(
        WeaponType::SpreadShot,
        weapon(
            7.0,
            3.0,
            480.0,
            0.2,
            3,
            4.0,
            Rgba::new(255, 220, 90, 255),
            Rgba::new(255, 160, 40, 160),
            [2, 2],
        ),
    );
    map.insert(
        WeaponType::Laser,
        weapon(
            6.0,
            10.0,
            900.0,
            0.1,
            1,
            3.0,
            Rgba::new(255, 80, 120, 255),
            Rgba::new(255, 20, 80, 160),
            [0, 2],
        ),
    );
    map.insert(
        WeaponType::FollowingRocket,
        weapon(
            18.0,
            1.5,
            300.0,
            0.25,
            1,
            5.0,
            Rgba::new(255, 170, 60, 255),
            Rgba::new(255, 90, 20, 160),
            [2, 2],
        ),
    );
    map.insert(
        WeaponType::ChainLightning,
        weapon(
            14.0,
            2.0,
            700.0,
            0.0,
            1,
            5.0,
            Rgba::new(170, 200, 255, 255),
            Rgba::new(90, 120, 255, 180),
            [0, 0],
        ),
    );
    map.insert(
        WeaponType::Flamethrower,
        weapon(
            4.0,
            12.0,
            240.0,
            0.12,
            3,
            6.0,
            Rgba::new(255, 120, 30, 255),
            Rgba::new(255, 60, 0, 170),
            [2, 2],
        ),
    );
    map.insert(
        WeaponType::IonBeam,
        weapon(
            3.0,
            60.0,
            600.0,
            0.0,
            1,
            6.0,
            Rgba::new(150, 255, 240, 255),
            Rgba::new(40, 220, 200, 170),
            [0, 0],
        ),
    );
    map.insert(
        WeaponType::PlasmaCannon,
        weapon(
            30.0,
            1.2,
            360.0,
            0.3,
            1,
            8.0,
            Rgba::new(220, 120, 255, 255),
            Rgba::new(160, 40, 255, 170),
            [0, 2],
        ),
    );
    map
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AbilityStats {
    pub cooldown: f64,
    pub shield_cost: f64,
    /// Seconds the effect stays active (0 = instant)
    pub duration: f64,
}

pub fn default_abilities() -> BTreeMap<AbilityType, AbilityStats> {
    let mut map = BTreeMap::new();
    let mut add = |kind, cooldown, shield_cost, duration| {
        map.insert(
            kind,
            AbilityStats {
                cooldown,
                shield_cost,
                duration,
            },
        );
    };
    add(AbilityType::SlowTime, 12.0, 20.0, 2.0);
    add(AbilityType::Barrier, 20.0, 30.0, 5.0);
    add(AbilityType::WeaponBoost, 15.0, 15.0, 3.0);
    add(AbilityType::EmpPulse, 10.0, 25.0, 0.2);
    add(AbilityType::OrbitalShield, 25.0, 30.0, 8.0);
    add(AbilityType::Dash, 3.0, 5.0, 0.0);
    map
}

/// Gameplay strength of each ability's active effect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityEffectTuning {
    /// Motion multiplier applied to hostiles during Slow Time
    pub slow_time_factor: f64,
    pub weapon_boost_multiplier: f64,
    pub emp_radius: f64,
    pub emp_damage: f64,
    /// Hull clearance swept by the orbital shield
    pub orbital_radius: f64,
    pub dash_distance: f64,
    pub dash_invincibility: f64,
}

impl Default for AbilityEffectTuning {
    fn default() -> Self {
        Self {
            slow_time_factor: 0.5,
            weapon_boost_multiplier: 1.5,
            emp_radius: 250.0,
            emp_damage: 20.0,
            orbital_radius: 40.0,
            dash_distance: 120.0,
            dash_invincibility: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyStats {
    pub radius: f64,
    /// px/tick
    pub speed: f64,
    pub health: f64,
    pub points: u32,
    /// Seconds between shots (0 = never shoots)
    pub shoot_rate: f64,
    /// px/tick
    pub projectile_speed: f64,
    pub projectile_damage: f64,
    pub contact_damage: f64,
    pub shield_points: f64,
    pub color: Rgba,
}

#[allow(clippy::too_many_arguments)]
fn enemy(
    radius: f64,
    speed: f64,
    health: f64,
    points: u32,
    shoot_rate: f64,
    projectile_speed: f64,
    projectile_damage: f64,
    contact_damage: f64,
    color: Rgba,
) -> EnemyStats {
    EnemyStats {
        radius,
        speed,
        health,
        points,
        shoot_rate,
        projectile_speed,
        projectile_damage,
        contact_damage,
        shield_points: 0.0,
        color,
    }
}

pub fn default_enemies() -> BTreeMap<EnemyType, EnemyStats> {
    let mut map = BTreeMap::new();
    map.insert(
        EnemyType::Scout,
        enemy(12.0, 3.0, 20.0, 100, 0.0, 0.0, 0.0, 15.0, Rgba::new(255, 90, 90, 255)),
    );
    map.insert(
        EnemyType::Drone,
        enemy(14.0, 2.0, 30.0, 150, 2.0, 6.0, 10.0, 15.0, Rgba::new(255, 150, 60, 255)),
    );
    map.insert(
        EnemyType::Hunter,
        enemy(16.0, 2.5, 40.0, 200, 1.5, 6.0, 10.0, 20.0, Rgba::new(220, 60, 220, 255)),
    );
    map.insert(
        EnemyType::Tank,
        enemy(26.0, 1.0, 120.0, 400, 2.5, 5.0, 20.0, 35.0, Rgba::new(140, 140, 160, 255)),
    );
    map.insert(
        EnemyType::Bomber,
        enemy(18.0, 3.5, 35.0, 250, 0.0, 0.0, 0.0, 40.0, Rgba::new(255, 60, 30, 255)),
    );
    map.insert(
        EnemyType::Sniper,
        enemy(14.0, 1.5, 30.0, 300, 0.5, 9.0, 25.0, 15.0, Rgba::new(90, 255, 140, 255)),
    );
    map.insert(
        EnemyType::Splitter,
        enemy(18.0, 2.0, 40.0, 250, 0.0, 0.0, 0.0, 20.0, Rgba::new(255, 230, 80, 255)),
    );
    let mut shield_bearer = enemy(
        20.0,
        1.0,
        60.0,
        350,
        2.5,
        5.0,
        15.0,
        25.0,
        Rgba::new(80, 160, 255, 255),
    );
    shield_bearer.shield_points = 30.0;
    map.insert(EnemyType::ShieldBearer, shield_bearer);
    map
}

/// Shared constants for enemy AI, formations and special abilities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyBehaviorTuning {
    /// Enemies deactivate this far below the screen
    pub offscreen_bottom: f64,
    pub drone_amplitude: f64,
    pub drone_phase_step: f64,
    pub hunter_deadband: f64,
    pub hunter_track_factor: f64,
    pub hunter_descent_factor: f64,
    pub sniper_hold_y: f64,
    pub sniper_drift: f64,
    pub sniper_lock_time: f64,
    pub shield_regen_delay: f64,
    pub shield_regen_interval: f64,
    pub split_offset: f64,
    pub split_health_fraction: f64,
    pub split_points_fraction: f64,
    pub formation_ally_radius: f64,
    pub v_lateral_spacing: f64,
    pub v_depth_spacing: f64,
    pub v_steer_gain: f64,
    pub v_lateral_bias: f64,
    pub circle_radius: f64,
    pub circle_step: f64,
    pub wave_step: f64,
    pub wave_amplitude: f64,
    pub pincer_spread: f64,
    pub pincer_descent: f64,
    pub convoy_min_gap: f64,
    pub convoy_max_gap: f64,
}

impl Default for EnemyBehaviorTuning {
    fn default() -> Self {
        Self {
            offscreen_bottom: 50.0,
            drone_amplitude: 3.0,
            drone_phase_step: 0.05,
            hunter_deadband: 5.0,
            hunter_track_factor: 0.8,
            hunter_descent_factor: 0.6,
            sniper_hold_y: 80.0,
            sniper_drift: 0.5,
            sniper_lock_time: 1.5,
            shield_regen_delay: 3.5,
            shield_regen_interval: 0.5,
            split_offset: 30.0,
            split_health_fraction: 2.0 / 3.0,
            split_points_fraction: 0.5,
            formation_ally_radius: 150.0,
            v_lateral_spacing: 40.0,
            v_depth_spacing: 30.0,
            v_steer_gain: 0.08,
            v_lateral_bias: 0.1,
            circle_radius: 80.0,
            circle_step: 0.02,
            wave_step: 0.03,
            wave_amplitude: 2.5,
            pincer_spread: 0.6,
            pincer_descent: 0.8,
            convoy_min_gap: 50.0,
            convoy_max_gap: 70.0,
        }
    }
}

/// Per-level boss stats
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BossLevelStats {
    pub health: f64,
    pub damage: f64,
    pub pattern_count: u32,
    pub speed_mult: f64,
    pub attack_rate_mult: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    /// Explicit stats for levels 1..=levels.len()
    pub levels: Vec<BossLevelStats>,
    /// Stats for the first level past the table
    pub beyond: BossLevelStats,
    /// Added per level past `beyond`
    pub health_step: f64,
    pub speed_step: f64,
    pub rate_step: f64,
    pub radius: f64,
    pub entry_y: f64,
    /// px/tick while entering
    pub entry_speed: f64,
    pub proximity_range: f64,
    pub entry_telegraph: f64,
    pub proximity_telegraph: f64,
    pub phase_telegraph: f64,
    pub base_attack_interval: f64,
    pub rage_interval_scale: f64,
    pub special_interval_scale: f64,
    pub rage_speed_scale: f64,
    pub track_gain: f64,
    pub edge_margin: f64,
    pub special_threshold: f64,
    pub rage_threshold: f64,
    /// px/tick for a level-1 bullet
    pub bullet_speed: f64,
    pub bullet_speed_per_level: f64,
    pub bullet_radius: f64,
    /// Rotation of the spiral pattern (rad/s of boss animation time)
    pub spiral_rate: f64,
    pub tracking_spiral_rate: f64,
    pub shield_interval_base: f64,
    pub shield_duration_base: f64,
    pub shield_duration_step: f64,
    pub min_shield_duration: f64,
    pub dying_duration: f64,
    pub dying_explosion_interval: f64,
    pub points_per_level: u32,
    pub contact_damage: f64,
    pub color: Rgba,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            levels: vec![
                BossLevelStats {
                    health: 500.0,
                    damage: 15.0,
                    pattern_count: 4,
                    speed_mult: 1.0,
                    attack_rate_mult: 1.0,
                },
                BossLevelStats {
                    health: 1000.0,
                    damage: 20.0,
                    pattern_count: 6,
                    speed_mult: 1.2,
                    attack_rate_mult: 1.1,
                },
                BossLevelStats {
                    health: 1500.0,
                    damage: 25.0,
                    pattern_count: 8,
                    speed_mult: 1.4,
                    attack_rate_mult: 1.3,
                },
            ],
            beyond: BossLevelStats {
                health: 2000.0,
                damage: 30.0,
                pattern_count: 10,
                speed_mult: 1.6,
                attack_rate_mult: 1.5,
            },
            health_step: 500.0,
            speed_step: 0.1,
            rate_step: 0.1,
            radius: 60.0,
            entry_y: 150.0,
            entry_speed: 1.5,
            proximity_range: 200.0,
            entry_telegraph: 0.5,
            proximity_telegraph: 0.3,
            phase_telegraph: 0.5,
            base_attack_interval: 1.5,
            rage_interval_scale: 0.6,
            special_interval_scale: 0.5,
            rage_speed_scale: 1.5,
            track_gain: 0.01,
            edge_margin: 20.0,
            special_threshold: 0.6,
            rage_threshold: 0.3,
            bullet_speed: 4.0,
            bullet_speed_per_level: 0.3,
            bullet_radius: 6.0,
            spiral_rate: 6.0,
            tracking_spiral_rate: 12.0,
            shield_interval_base: 5.0,
            shield_duration_base: 2.0,
            shield_duration_step: 0.2,
            min_shield_duration: 0.5,
            dying_duration: 2.0,
            dying_explosion_interval: 0.25,
            points_per_level: 5000,
            contact_damage: 30.0,
            color: Rgba::new(200, 40, 90, 255),
        }
    }
}

impl BossTuning {
    /// Stats for a 1-based level; levels past the table scale linearly
    pub fn stats_for_level(&self, level: u32) -> BossLevelStats {
        let level = level.max(1);
        if let Some(stats) = self.levels.get(level as usize - 1) {
            return *stats;
        }
        let past = (level as usize).saturating_sub(self.levels.len() + 1) as f64;
        BossLevelStats {
            health: self.beyond.health + past * self.health_step,
            damage: self.beyond.damage,
            pattern_count: self.beyond.pattern_count,
            speed_mult: self.beyond.speed_mult + past * self.speed_step,
            attack_rate_mult: self.beyond.attack_rate_mult + past * self.rate_step,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupTuning {
    pub radius: f64,
    /// px/tick
    pub fall_speed: f64,
    pub offscreen_bottom: f64,
    /// Chance an enemy kill drops a powerup
    pub drop_chance: f64,
    pub weights: BTreeMap<PowerupType, f64>,
    pub health_amount: f64,
    pub shield_amount: f64,
    pub speed_boost_multiplier: f64,
    pub speed_boost_duration: f64,
}

impl Default for PowerupTuning {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(PowerupType::Health, 0.30);
        weights.insert(PowerupType::Shield, 0.25);
        weights.insert(PowerupType::Weapon, 0.20);
        weights.insert(PowerupType::Speed, 0.15);
        weights.insert(PowerupType::Mystery, 0.10);
        Self {
            radius: 12.0,
            fall_speed: 1.5,
            offscreen_bottom: 30.0,
            drop_chance: 0.1,
            weights,
            health_amount: 25.0,
            shield_amount: 25.0,
            speed_boost_multiplier: 1.5,
            speed_boost_duration: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AsteroidStats {
    pub radius: f64,
    pub health: f64,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidTuning {
    pub sizes: BTreeMap<AsteroidSize, AsteroidStats>,
    /// Sideways speed given to split fragments (px/tick)
    pub split_speed: f64,
    pub offscreen_bottom: f64,
    pub contact_damage: f64,
}

impl Default for AsteroidTuning {
    fn default() -> Self {
        let mut sizes = BTreeMap::new();
        sizes.insert(
            AsteroidSize::Small,
            AsteroidStats {
                radius: 15.0,
                health: 20.0,
                points: 50,
            },
        );
        sizes.insert(
            AsteroidSize::Medium,
            AsteroidStats {
                radius: 30.0,
                health: 50.0,
                points: 100,
            },
        );
        sizes.insert(
            AsteroidSize::Large,
            AsteroidStats {
                radius: 50.0,
                health: 100.0,
                points: 200,
            },
        );
        Self {
            sizes,
            split_speed: 1.5,
            offscreen_bottom: 100.0,
            contact_damage: 15.0,
        }
    }
}

impl AsteroidTuning {
    pub fn stats(&self, size: AsteroidSize) -> AsteroidStats {
        self.sizes.get(&size).copied().unwrap_or(AsteroidStats {
            radius: 20.0,
            health: 30.0,
            points: 50,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HazardStats {
    pub radius: f64,
    pub health: f64,
    /// Acceleration toward the center at the center (px/tick²)
    pub pull_force: f64,
    /// Damage per second to the player
    pub damage_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    pub kinds: BTreeMap<HazardType, HazardStats>,
    /// px/tick
    pub drift_speed: f64,
    /// Fraction of a black hole's radius that damages the player
    pub core_fraction: f64,
    pub offscreen_bottom: f64,
}

impl Default for HazardTuning {
    fn default() -> Self {
        let mut kinds = BTreeMap::new();
        let mut add = |kind, radius, health, pull_force, damage_rate| {
            kinds.insert(
                kind,
                HazardStats {
                    radius,
                    health,
                    pull_force,
                    damage_rate,
                },
            );
        };
        add(HazardType::Barrier, 40.0, 200.0, 0.0, 0.0);
        add(HazardType::MagneticField, 120.0, 0.0, 0.15, 0.0);
        add(HazardType::RadiationZone, 90.0, 0.0, 0.0, 8.0);
        add(HazardType::BlackHole, 140.0, 0.0, 0.35, 20.0);
        Self {
            kinds,
            drift_speed: 0.5,
            core_fraction: 0.3,
            offscreen_bottom: 150.0,
        }
    }
}

impl HazardTuning {
    pub fn stats(&self, kind: HazardType) -> HazardStats {
        self.kinds.get(&kind).copied().unwrap_or(HazardStats {
            radius: 60.0,
            health: 0.0,
            pull_force: 0.0,
            damage_rate: 0.0,
        })
    }
}

/// Roulette tables and the strength of each mystery effect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MysteryTuning {
    /// Probability of drawing from the positive table
    pub positive_chance: f64,
    pub positive: Vec<(MysteryEffect, f64)>,
    pub negative: Vec<(MysteryEffect, f64)>,
    pub speed_boost_multiplier: f64,
    pub speed_boost_duration: f64,
    pub rapid_fire_multiplier: f64,
    pub rapid_fire_duration: f64,
    pub invincibility_duration: f64,
    pub score_multiplier: f64,
    pub score_multiplier_duration: f64,
    pub engine_malfunction_multiplier: f64,
    pub engine_malfunction_duration: f64,
    pub slow_fire_multiplier: f64,
    pub slow_fire_duration: f64,
    pub control_reversal_duration: f64,
}

impl Default for MysteryTuning {
    fn default() -> Self {
        Self {
            positive_chance: 0.60,
            positive: vec![
                (MysteryEffect::SuperWeaponUpgrade, 0.15),
                (MysteryEffect::SpeedBoost, 0.10),
                (MysteryEffect::ShieldOvercharge, 0.10),
                (MysteryEffect::RapidFire, 0.10),
                (MysteryEffect::Invincibility, 0.05),
                (MysteryEffect::ScoreMultiplier, 0.05),
            ],
            negative: vec![
                (MysteryEffect::WeaponDowngrade, 0.10),
                (MysteryEffect::EngineMalfunction, 0.10),
                (MysteryEffect::ShieldDrain, 0.08),
                (MysteryEffect::FireRateReduction, 0.07),
                (MysteryEffect::ControlReversal, 0.05),
            ],
            speed_boost_multiplier: 1.5,
            speed_boost_duration: 10.0,
            rapid_fire_multiplier: 2.0,
            rapid_fire_duration: 8.0,
            invincibility_duration: 5.0,
            score_multiplier: 2.0,
            score_multiplier_duration: 15.0,
            engine_malfunction_multiplier: 0.6,
            engine_malfunction_duration: 8.0,
            slow_fire_multiplier: 0.5,
            slow_fire_duration: 8.0,
            control_reversal_duration: 5.0,
        }
    }
}

/// Lifetimes of purely visual entities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsTuning {
    pub explosion_life: f64,
    /// Explosion max radius relative to the victim's radius
    pub explosion_scale: f64,
    pub impact_life: f64,
    pub impact_sparks: u32,
    pub floating_text_life: f64,
    /// px/tick
    pub floating_text_rise: f64,
}

impl Default for EffectsTuning {
    fn default() -> Self {
        Self {
            explosion_life: 0.5,
            explosion_scale: 2.0,
            impact_life: 0.25,
            impact_sparks: 6,
            floating_text_life: 1.0,
            floating_text_rise: 1.0,
        }
    }
}

/// Complete simulation balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub screen: ScreenTuning,
    pub grid: GridTuning,
    pub difficulty: Difficulty,
    pub difficulties: BTreeMap<Difficulty, DifficultyTuning>,
    pub player: PlayerTuning,
    pub projectiles: ProjectileTuning,
    pub weapons: BTreeMap<WeaponType, WeaponStats>,
    pub abilities: BTreeMap<AbilityType, AbilityStats>,
    pub ability_effects: AbilityEffectTuning,
    pub enemies: BTreeMap<EnemyType, EnemyStats>,
    pub enemy_behavior: EnemyBehaviorTuning,
    pub boss: BossTuning,
    pub powerups: PowerupTuning,
    pub asteroids: AsteroidTuning,
    pub hazards: HazardTuning,
    pub mystery: MysteryTuning,
    pub effects: EffectsTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        let mut difficulties = BTreeMap::new();
        difficulties.insert(
            Difficulty::Easy,
            DifficultyTuning {
                shield_regen_rate: 0.08,
                invincibility_time: 1.5,
                shield_regen_delay: 2.0,
            },
        );
        difficulties.insert(
            Difficulty::Normal,
            DifficultyTuning {
                shield_regen_rate: 0.05,
                invincibility_time: 1.0,
                shield_regen_delay: 3.0,
            },
        );
        difficulties.insert(
            Difficulty::Hard,
            DifficultyTuning {
                shield_regen_rate: 0.03,
                invincibility_time: 0.6,
                shield_regen_delay: 4.0,
            },
        );
        Self {
            screen: ScreenTuning::default(),
            grid: GridTuning::default(),
            difficulty: Difficulty::Normal,
            difficulties,
            player: PlayerTuning::default(),
            projectiles: ProjectileTuning::default(),
            weapons: default_weapons(),
            abilities: default_abilities(),
            ability_effects: AbilityEffectTuning::default(),
            enemies: default_enemies(),
            enemy_behavior: EnemyBehaviorTuning::default(),
            boss: BossTuning::default(),
            powerups: PowerupTuning::default(),
            asteroids: AsteroidTuning::default(),
            hazards: HazardTuning::default(),
            mystery: MysteryTuning::default(),
            effects: EffectsTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON (for shipping a baseline balance file)
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ranges the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.screen.width <= 0.0 || self.screen.height <= 0.0 {
            return Err(TuningError::Invalid("screen size must be positive".into()));
        }
        if self.grid.cell_size <= 0.0 {
            return Err(TuningError::Invalid("grid cell size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.mystery.positive_chance) {
            return Err(TuningError::Invalid(
                "mystery positive_chance must lie in [0, 1]".into(),
            ));
        }
        let table_ok = |table: &[(MysteryEffect, f64)]| {
            !table.is_empty() && table.iter().all(|(_, w)| *w >= 0.0)
                && table.iter().map(|(_, w)| w).sum::<f64>() > 0.0
        };
        if !table_ok(&self.mystery.positive) || !table_ok(&self.mystery.negative) {
            return Err(TuningError::Invalid(
                "mystery tables need at least one positive weight".into(),
            ));
        }
        for (kind, stats) in &self.weapons {
            if stats.fire_rate <= 0.0 {
                return Err(TuningError::Invalid(format!(
                    "{} fire rate must be positive",
                    kind.name()
                )));
            }
            if stats.projectile_count % 2 == 0 || stats.extra_projectiles.iter().any(|n| n % 2 != 0)
            {
                return Err(TuningError::Invalid(format!(
                    "{} projectile counts must stay odd",
                    kind.name()
                )));
            }
        }
        if !self.weapons.contains_key(&WeaponType::Basic) {
            return Err(TuningError::Invalid("the basic gun must be defined".into()));
        }
        Ok(())
    }

    /// Survivability row for the selected difficulty
    pub fn difficulty_tuning(&self) -> DifficultyTuning {
        self.difficulties
            .get(&self.difficulty)
            .copied()
            .unwrap_or(DifficultyTuning {
                shield_regen_rate: 0.05,
                invincibility_time: 1.0,
                shield_regen_delay: 3.0,
            })
    }

    pub fn enemy_stats(&self, kind: EnemyType) -> EnemyStats {
        self.enemies.get(&kind).cloned().unwrap_or_else(|| {
            enemy(12.0, 2.0, 20.0, 100, 0.0, 0.0, 0.0, 15.0, Rgba::WHITE)
        })
    }

    /// Largest body radius any enemy type can have (for grid query margins)
    pub fn max_enemy_radius(&self) -> f64 {
        self.enemies
            .values()
            .map(|s| s.radius)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_validates() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let tuning = Tuning::from_json(r#"{ "screen": { "width": 1024.0 }, "difficulty": "Hard" }"#)
            .expect("partial tuning parses");
        assert_eq!(tuning.screen.width, 1024.0);
        assert_eq!(tuning.screen.height, crate::consts::SCREEN_HEIGHT);
        assert_eq!(tuning.difficulty, Difficulty::Hard);
        assert_eq!(tuning.grid.cell_size, 128.0);
    }

    #[test]
    fn test_round_trip_through_json() {
        let json = Tuning::default().to_json().unwrap();
        let parsed = Tuning::from_json(&json).unwrap();
        assert_eq!(parsed.weapons.len(), Tuning::default().weapons.len());
        assert_eq!(parsed.boss.levels.len(), 3);
    }

    #[test]
    fn test_invalid_cell_size_rejected() {
        let err = Tuning::from_json(r#"{ "grid": { "cell_size": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = Tuning::from_json("not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_boss_level_table() {
        let boss = BossTuning::default();
        let l1 = boss.stats_for_level(1);
        assert_eq!((l1.health, l1.damage, l1.pattern_count), (500.0, 15.0, 4));
        let l3 = boss.stats_for_level(3);
        assert_eq!((l3.health, l3.pattern_count), (1500.0, 8));
        assert!((l3.attack_rate_mult - 1.3).abs() < 1e-9);
        let l4 = boss.stats_for_level(4);
        assert_eq!((l4.health, l4.damage, l4.pattern_count), (2000.0, 30.0, 10));
        let l6 = boss.stats_for_level(6);
        assert_eq!(l6.health, 3000.0);
        assert!((l6.speed_mult - 1.8).abs() < 1e-9);
        assert!((l6.attack_rate_mult - 1.7).abs() < 1e-9);
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("nope"), None);
    }
}
