//! Events emitted during a tick, for the host's audio and UI feedback

use glam::DVec2;
use serde::Serialize;

use super::ability::AbilityType;
use super::asteroid::AsteroidSize;
use super::boss::BossPhase;
use super::enemy::EnemyType;
use super::hazard::HazardType;
use super::mystery::MysteryEffect;
use super::powerup::PowerupType;
use super::weapon::WeaponType;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// Player weapon emitted at least one projectile
    PlayerFired { weapon: WeaponType, count: usize },
    EnemyFired { pos: DVec2 },
    EnemyHit { pos: DVec2 },
    /// ShieldBearer shield soaked (part of) a hit
    ShieldAbsorbed { pos: DVec2 },
    EnemyKilled { kind: EnemyType, pos: DVec2, points: u32 },
    EnemySplit { pos: DVec2 },
    AsteroidDestroyed { size: AsteroidSize, pos: DVec2 },
    HazardDestroyed { kind: HazardType, pos: DVec2 },
    PlayerHit { damage: f64 },
    PlayerDied,
    PowerupCollected { kind: PowerupType },
    Mystery { effect: MysteryEffect, name: &'static str, positive: bool },
    WeaponUpgraded { weapon: WeaponType, level: u8 },
    WeaponUnlocked { weapon: WeaponType },
    WeaponSwitched { weapon: WeaponType },
    AbilityActivated { ability: AbilityType },
    AbilityRejected { ability: AbilityType },
    ChainArc { from: DVec2, to: DVec2 },
    UltimateActivated,
    BossSpawned { level: u32 },
    BossTelegraph { duration: f64 },
    BossPhaseChanged { phase: BossPhase },
    BossShieldRaised,
    BossAttack { pattern: u32 },
    BossShieldBlocked { pos: DVec2 },
    BossDefeated { level: u32, points: u64 },
    Explosion { pos: DVec2, radius: f64 },
    Paused,
    Resumed,
}
