//! Read-only view of the world handed to the host after every tick

use glam::DVec2;
use serde::Serialize;

use super::ability::AbilityType;
use super::asteroid::AsteroidSize;
use super::boss::BossPhase;
use super::enemy::EnemyType;
use super::events::SimEvent;
use super::hazard::HazardType;
use super::powerup::PowerupType;
use super::state::{Rgba, RunPhase, World};
use super::weapon::WeaponType;
use crate::consts::TIMER_EPSILON;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub pos: DVec2,
    pub radius: f64,
    pub health_fraction: f64,
    pub shield_fraction: f64,
    pub invincible: bool,
    pub barrier: bool,
    pub orbital_shield: bool,
    pub thruster_trail: Vec<DVec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemyView {
    pub kind: EnemyType,
    pub pos: DVec2,
    pub radius: f64,
    pub color: Rgba,
    pub health_fraction: f64,
    pub shield_points: f64,
    pub burning: bool,
    pub hit_flash: bool,
    /// Sniper aim point while locked
    pub lock_target: Option<DVec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectileView {
    pub pos: DVec2,
    pub radius: f64,
    pub friendly: bool,
    pub main_color: Rgba,
    pub glow_color: Rgba,
    pub trail: Vec<DVec2>,
    /// Beam emitter (the projectile position is the tip)
    pub beam_source: Option<DVec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsteroidView {
    pub size: AsteroidSize,
    pub pos: DVec2,
    pub radius: f64,
    pub rotation: f64,
    pub health_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerupView {
    pub kind: PowerupType,
    pub pos: DVec2,
    pub radius: f64,
    pub color: Rgba,
    pub anim_phase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardView {
    pub kind: HazardType,
    pub pos: DVec2,
    pub radius: f64,
    pub color: Rgba,
    pub health_fraction: f64,
    pub anim_phase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectView {
    pub pos: DVec2,
    pub radius: f64,
    pub color: Rgba,
    /// 0 at birth, 1 when done
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextView {
    pub pos: DVec2,
    pub text: String,
    pub color: Rgba,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BossView {
    pub level: u32,
    pub pos: DVec2,
    pub radius: f64,
    pub phase: BossPhase,
    pub health_fraction: f64,
    pub shield_active: bool,
    pub telegraph: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponHud {
    pub kind: WeaponType,
    pub name: &'static str,
    pub level: u8,
    pub unlocked: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbilityHud {
    pub kind: AbilityType,
    pub name: &'static str,
    /// 0 = ready, 1 = just used
    pub cooldown: f64,
    pub active: bool,
    pub affordable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub wave: u32,
    pub kills: u32,
    pub health: f64,
    pub max_health: f64,
    pub shield: f64,
    pub max_shield: f64,
    pub weapon: WeaponType,
    pub weapon_level: u8,
    pub mixed_mode: bool,
    pub weapons: Vec<WeaponHud>,
    pub abilities: Vec<AbilityHud>,
    pub charge: f64,
    pub ultimate_charge: f64,
    pub ultimate_active: bool,
    pub boss_health: Option<f64>,
    pub score_multiplier: f64,
    pub speed_multiplier: f64,
    pub fire_rate_multiplier: f64,
    pub controls_reversed: bool,
}

/// Owned copy of everything the host draws for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub time: f64,
    pub phase: RunPhase,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub asteroids: Vec<AsteroidView>,
    pub powerups: Vec<PowerupView>,
    pub hazards: Vec<HazardView>,
    pub explosions: Vec<EffectView>,
    pub impacts: Vec<EffectView>,
    pub texts: Vec<TextView>,
    pub boss: Option<BossView>,
    pub hud: Hud,
    pub events: Vec<SimEvent>,
}

impl Snapshot {
    pub fn capture(world: &World) -> Self {
        let player = &world.player;
        let weapon_boost = world.tuning.ability_effects.weapon_boost_multiplier;

        let mut thruster_trail = Vec::with_capacity(player.trail.len());
        player.trail.copy_into(&mut thruster_trail);

        let enemies = world
            .enemies
            .iter_active()
            .map(|(_, e)| EnemyView {
                kind: e.kind,
                pos: e.pos,
                radius: e.radius,
                color: e.color,
                health_fraction: e.health_fraction(),
                shield_points: e.shield_points,
                burning: e.burn.active,
                hit_flash: e.hit_flash > TIMER_EPSILON,
                lock_target: e.locked.then_some(e.locked_target),
            })
            .collect();

        let projectiles = world
            .projectiles
            .iter_active()
            .map(|(_, p)| {
                let mut trail = Vec::with_capacity(p.trail.len());
                p.trail.copy_into(&mut trail);
                ProjectileView {
                    pos: p.pos,
                    radius: p.radius,
                    friendly: p.friendly,
                    main_color: p.main_color,
                    glow_color: p.glow_color,
                    trail,
                    beam_source: p.beam.map(|b| b.source),
                }
            })
            .collect();

        let asteroids = world
            .asteroids
            .iter_active()
            .map(|(_, a)| AsteroidView {
                size: a.size,
                pos: a.pos,
                radius: a.radius,
                rotation: a.rotation,
                health_fraction: a.health_fraction(),
            })
            .collect();

        let powerups = world
            .powerups
            .iter_active()
            .map(|(_, p)| PowerupView {
                kind: p.kind,
                pos: p.pos,
                radius: p.radius,
                color: p.kind.color(),
                anim_phase: p.anim_phase,
            })
            .collect();

        let hazards = world
            .hazards
            .iter()
            .filter(|h| h.active)
            .map(|h| HazardView {
                kind: h.kind,
                pos: h.pos,
                radius: h.radius,
                color: h.kind.color(),
                health_fraction: h.health_fraction(),
                anim_phase: h.anim_phase,
            })
            .collect();

        let explosions = world
            .explosions
            .iter_active()
            .map(|(_, e)| EffectView {
                pos: e.pos,
                radius: e.radius(),
                color: e.color,
                progress: e.progress(),
            })
            .collect();

        let impacts = world
            .impacts
            .iter_active()
            .map(|(_, i)| EffectView {
                pos: i.pos,
                radius: i.sparks as f64,
                color: i.color,
                progress: if i.max_life > 0.0 {
                    1.0 - i.life / i.max_life
                } else {
                    1.0
                },
            })
            .collect();

        let texts = world
            .floating_texts
            .iter_active()
            .map(|(_, t)| TextView {
                pos: t.pos,
                text: t.text.clone(),
                color: t.color,
                alpha: t.alpha(),
            })
            .collect();

        let boss = world.boss.as_ref().map(|b| BossView {
            level: b.level,
            pos: b.pos,
            radius: b.radius,
            phase: b.phase,
            health_fraction: b.health_fraction(),
            shield_active: b.shield_active,
            telegraph: b.telegraph_active,
        });

        let weapons = player
            .weapons
            .iter()
            .map(|w| WeaponHud {
                kind: w.kind,
                name: w.kind.name(),
                level: w.level,
                unlocked: w.unlocked,
                selected: w.kind == player.weapons.current,
            })
            .collect();

        let abilities = player
            .abilities
            .iter()
            .map(|(kind, a)| AbilityHud {
                kind,
                name: kind.name(),
                cooldown: a.cooldown_fraction(),
                active: a.active,
                affordable: player.shield + TIMER_EPSILON >= a.shield_cost,
            })
            .collect();

        let hud = Hud {
            score: world.score,
            wave: world.wave,
            kills: world.kills,
            health: player.health,
            max_health: player.max_health,
            shield: player.shield,
            max_shield: player.max_shield,
            weapon: player.weapons.current,
            weapon_level: player.weapons.current_state().map_or(1, |w| w.level),
            mixed_mode: player.weapons.mixed_mode(),
            weapons,
            abilities,
            charge: player.charge,
            ultimate_charge: player.ultimate_charge,
            ultimate_active: player.ultimate_active,
            boss_health: world.boss.as_ref().map(|b| b.health_fraction()),
            score_multiplier: player.score_multiplier,
            speed_multiplier: player.speed() / player.base_speed.max(1e-9),
            fire_rate_multiplier: player.fire_rate_multiplier(weapon_boost),
            controls_reversed: player.controls_reversed(),
        };

        Self {
            tick: world.tick_count,
            time: world.time,
            phase: world.phase,
            player: PlayerView {
                pos: player.pos,
                radius: player.radius,
                health_fraction: player.health_fraction(),
                shield_fraction: player.shield_fraction(),
                invincible: player.is_invincible(),
                barrier: player.abilities.is_active(AbilityType::Barrier),
                orbital_shield: player.abilities.is_active(AbilityType::OrbitalShield),
                thruster_trail,
            },
            enemies,
            projectiles,
            asteroids,
            powerups,
            hazards,
            explosions,
            impacts,
            texts,
            boss,
            hud,
            events: world.events.clone(),
        }
    }
}
