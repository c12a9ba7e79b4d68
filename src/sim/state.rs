//! World state and host-facing mutators
//!
//! Everything the tick touches is owned here: one pool per high-turnover
//! entity class, the hazard list, the optional boss, the seeded RNG and the
//! per-tick scratch buffers the driver reuses.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::asteroid::{Asteroid, AsteroidSize};
use super::boss::Boss;
use super::effects::{Explosion, FloatingText, ImpactEffect};
use super::enemy::{Enemy, EnemyScaling, EnemyType};
use super::events::SimEvent;
use super::formation::{
    FormationSlot, FormationType, MemberSnapshot, WaveSpec, initial_orbit_angle, spawn_offset,
};
use super::grid::SpatialGrid;
use super::hazard::{Hazard, HazardType};
use super::player::Player;
use super::pool::{Pool, PoolStats};
use super::powerup::{Powerup, PowerupType};
use super::projectile::Projectile;
use super::rng::SimRng;
use super::weapon::ShotSpec;
use crate::tuning::Tuning;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Playing,
    Paused,
    /// Player destroyed; only `reset_run` leaves this phase
    GameOver,
}

/// Statistics for every pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PoolReport {
    pub projectiles: PoolStats,
    pub enemies: PoolStats,
    pub explosions: PoolStats,
    pub floating_texts: PoolStats,
    pub impacts: PoolStats,
    pub asteroids: PoolStats,
    pub powerups: PoolStats,
}

/// Initial pool sizes
const PROJECTILE_POOL: usize = 256;
const ENEMY_POOL: usize = 64;
const EFFECT_POOL: usize = 64;
const PICKUP_POOL: usize = 16;

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub tuning: Tuning,
    pub rng: SimRng,
    pub phase: RunPhase,
    pub player: Player,
    pub boss: Option<Boss>,
    pub projectiles: Pool<Projectile>,
    pub enemies: Pool<Enemy>,
    pub explosions: Pool<Explosion>,
    pub floating_texts: Pool<FloatingText>,
    pub impacts: Pool<ImpactEffect>,
    pub asteroids: Pool<Asteroid>,
    pub powerups: Pool<Powerup>,
    pub hazards: Vec<Hazard>,
    pub grid: SpatialGrid,
    pub score: u64,
    /// Wave number last announced by the host
    pub wave: u32,
    pub kills: u32,
    /// Simulated seconds since the run started
    pub time: f64,
    pub tick_count: u64,
    /// Events produced by the current tick (or mutators since the last tick)
    pub(crate) events: Vec<SimEvent>,
    pub(crate) shooting: bool,
    pub(crate) emp_pending: bool,
    next_group_id: u32,

    // Per-tick scratch, cleared rather than reallocated
    pub(crate) shots: Vec<ShotSpec>,
    pub(crate) chain_shots: Vec<ShotSpec>,
    pub(crate) neighbors: Vec<usize>,
    pub(crate) members: Vec<MemberSnapshot>,
    pub(crate) dead: Vec<usize>,
}

impl World {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let grid = SpatialGrid::new(tuning.screen.width, tuning.screen.height, tuning.grid.cell_size);
        let player = Player::new(&tuning);
        Self {
            rng: SimRng::new(seed),
            phase: RunPhase::Playing,
            player,
            boss: None,
            projectiles: Pool::with_capacity(PROJECTILE_POOL),
            enemies: Pool::with_capacity(ENEMY_POOL),
            explosions: Pool::with_capacity(EFFECT_POOL),
            floating_texts: Pool::with_capacity(EFFECT_POOL),
            impacts: Pool::with_capacity(EFFECT_POOL),
            asteroids: Pool::with_capacity(PICKUP_POOL),
            powerups: Pool::with_capacity(PICKUP_POOL),
            hazards: Vec::new(),
            grid,
            score: 0,
            wave: 0,
            kills: 0,
            time: 0.0,
            tick_count: 0,
            events: Vec::new(),
            shooting: false,
            emp_pending: false,
            next_group_id: 1,
            shots: Vec::new(),
            chain_shots: Vec::new(),
            neighbors: Vec::new(),
            members: Vec::new(),
            dead: Vec::new(),
            tuning,
        }
    }

    /// Default tuning with the given run seed
    pub fn with_seed(seed: u64) -> Self {
        Self::new(Tuning::default(), seed)
    }

    pub fn width(&self) -> f64 {
        self.tuning.screen.width
    }

    pub fn height(&self) -> f64 {
        self.tuning.screen.height
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Spawn one enemy of `kind`; returns its pool slot
    pub fn spawn_enemy(&mut self, kind: EnemyType, pos: DVec2, scaling: EnemyScaling) -> usize {
        let stats = self.tuning.enemy_stats(kind);
        let (index, enemy) = self.enemies.acquire();
        enemy.configure(kind, &stats, pos, &scaling);
        index
    }

    /// Spawn a group, optionally in formation; returns the slots in member order
    pub fn spawn_wave(&mut self, spec: &WaveSpec) -> Vec<usize> {
        if spec.count == 0 {
            log::warn!("ignoring empty wave of {}", spec.enemy_type.name());
            return Vec::new();
        }
        if let Some(number) = spec.wave_number {
            self.wave = number;
        }
        let group_id = self.next_group_id;
        self.next_group_id = self.next_group_id.wrapping_add(1).max(1);

        let mut slots = Vec::with_capacity(spec.count as usize);
        let mut leader = None;
        for i in 0..spec.count {
            let offset = spawn_offset(spec.formation, i, spec.count, spec.spacing, &self.tuning.enemy_behavior);
            let pos = spec.origin + offset;
            let index = self.spawn_enemy(spec.enemy_type, pos, spec.scaling);
            if let Some(kind) = spec.formation {
                let slot = FormationSlot {
                    kind,
                    group_id,
                    leader: if i == 0 { None } else { leader },
                    index: i,
                    target: pos,
                    orbit_angle: if kind == FormationType::Circular {
                        initial_orbit_angle(i, spec.count)
                    } else {
                        0.0
                    },
                    wave_phase: 0.0,
                };
                if let Some(enemy) = self.enemies.get_mut(index) {
                    enemy.formation = Some(slot);
                }
                if i == 0 {
                    leader = self.enemies.slot_ref(index);
                }
            }
            slots.push(index);
        }
        log::info!(
            "wave {}: {} x{} ({:?})",
            self.wave,
            spec.enemy_type.name(),
            spec.count,
            spec.formation
        );
        slots
    }

    /// Bring in a boss. `false` while another boss is alive.
    pub fn spawn_boss(&mut self, level: u32) -> bool {
        if self.boss.is_some() {
            log::warn!("boss already present; level {level} spawn rejected");
            return false;
        }
        let boss = Boss::new(level, &self.tuning.boss, self.width());
        log::info!("boss level {} spawned ({} hp)", boss.level, boss.max_health);
        self.events.push(SimEvent::BossSpawned { level: boss.level });
        self.boss = Some(boss);
        true
    }

    pub fn spawn_asteroid(&mut self, size: AsteroidSize, pos: DVec2, vel: DVec2) -> usize {
        let stats = self.tuning.asteroids.stats(size);
        let spin = self.rng.range(-0.05, 0.05);
        let (index, asteroid) = self.asteroids.acquire();
        asteroid.configure(size, &stats, pos, vel, spin);
        index
    }

    pub fn spawn_powerup(&mut self, kind: PowerupType, pos: DVec2) -> usize {
        let t = &self.tuning.powerups;
        let (radius, fall) = (t.radius, t.fall_speed);
        let (index, powerup) = self.powerups.acquire();
        powerup.configure(kind, pos, radius, fall);
        index
    }

    /// Hazards live in a plain list; returns the list index
    pub fn spawn_hazard(&mut self, kind: HazardType, pos: DVec2) -> usize {
        let t = &self.tuning.hazards;
        self.hazards.push(Hazard::new(kind, &t.stats(kind), pos, t.drift_speed));
        self.hazards.len() - 1
    }

    /// Start a fresh run with the current seed
    pub fn reset_run(&mut self) {
        let seed = self.rng.seed();
        self.reset_run_with_seed(seed);
    }

    pub fn reset_run_with_seed(&mut self, seed: u64) {
        self.rng.reseed(seed);
        self.projectiles.release_all();
        self.enemies.release_all();
        self.explosions.release_all();
        self.floating_texts.release_all();
        self.impacts.release_all();
        self.asteroids.release_all();
        self.powerups.release_all();
        self.hazards.clear();
        self.boss = None;
        self.player = Player::new(&self.tuning);
        self.phase = RunPhase::Playing;
        self.score = 0;
        self.wave = 0;
        self.kills = 0;
        self.time = 0.0;
        self.tick_count = 0;
        self.shooting = false;
        self.emp_pending = false;
        self.next_group_id = 1;
        self.events.clear();
        log::info!("run reset (seed {seed})");
    }

    /// Compact oversized pools between ticks; returns how many were trimmed.
    ///
    /// Leader links and homing or chain targets follow the enemies to their
    /// new slots.
    pub fn trim_pools(&mut self, min_capacity: usize) -> usize {
        let enemy_remap = self.enemies.trim(min_capacity);
        if let Some(remap) = &enemy_remap {
            for (_, enemy) in self.enemies.iter_active_mut() {
                enemy.remap_slots(remap);
            }
            for (_, projectile) in self.projectiles.iter_active_mut() {
                projectile.remap_enemy_slots(remap);
            }
        }
        let trimmed = [
            enemy_remap.is_some(),
            self.projectiles.trim(min_capacity).is_some(),
            self.explosions.trim(min_capacity).is_some(),
            self.floating_texts.trim(min_capacity).is_some(),
            self.impacts.trim(min_capacity).is_some(),
            self.asteroids.trim(min_capacity).is_some(),
            self.powerups.trim(min_capacity).is_some(),
        ]
        .iter()
        .filter(|t| **t)
        .count();
        if trimmed > 0 {
            log::info!("trimmed {trimmed} pools (min capacity {min_capacity})");
        }
        trimmed
    }

    pub fn pool_stats(&self) -> PoolReport {
        PoolReport {
            projectiles: self.projectiles.stats(),
            enemies: self.enemies.stats(),
            explosions: self.explosions.stats(),
            floating_texts: self.floating_texts.stats(),
            impacts: self.impacts.stats(),
            asteroids: self.asteroids.stats(),
            powerups: self.powerups.stats(),
        }
    }

    /// Every pool agrees with its entities' active flags
    pub fn pools_consistent(&self) -> bool {
        self.projectiles.is_consistent()
            && self.enemies.is_consistent()
            && self.explosions.is_consistent()
            && self.floating_texts.is_consistent()
            && self.impacts.is_consistent()
            && self.asteroids.is_consistent()
            && self.powerups.is_consistent()
    }

    pub(crate) fn spawn_explosion(&mut self, pos: DVec2, max_radius: f64, color: Rgba) {
        let life = self.tuning.effects.explosion_life;
        let (_, explosion) = self.explosions.acquire();
        explosion.start(pos, max_radius, color, life);
        self.events.push(SimEvent::Explosion { pos, radius: max_radius });
    }

    pub(crate) fn spawn_impact(&mut self, pos: DVec2, color: Rgba, angle: f64) {
        let e = &self.tuning.effects;
        let (sparks, life) = (e.impact_sparks, e.impact_life);
        let (_, impact) = self.impacts.acquire();
        impact.start(pos, color, sparks, angle, life);
    }

    pub(crate) fn spawn_text(&mut self, pos: DVec2, text: &str, color: Rgba) {
        let e = &self.tuning.effects;
        let (rise, life) = (e.floating_text_rise, e.floating_text_life);
        let (_, label) = self.floating_texts.acquire();
        label.start(pos, text, color, rise, life);
    }

    /// Launch every queued shot in `self.shots` as a projectile
    pub(crate) fn launch_shots(&mut self, friendly: bool) {
        let mut shots = std::mem::take(&mut self.shots);
        for shot in shots.drain(..) {
            let (_, projectile) = self.projectiles.acquire();
            projectile.launch(&shot, friendly, &self.tuning.projectiles);
        }
        self.shots = shots;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_with_alpha() {
        let c = Rgba::new(10, 20, 30, 255).with_alpha(7);
        assert_eq!(c, Rgba::new(10, 20, 30, 7));
    }

    #[test]
    fn test_spawn_enemy_uses_stats_and_scaling() {
        let mut world = World::with_seed(1);
        let scaling = EnemyScaling {
            health: 2.0,
            ..EnemyScaling::default()
        };
        let index = world.spawn_enemy(EnemyType::Tank, DVec2::new(100.0, 50.0), scaling);
        let tank = world.enemies.get(index).unwrap();
        assert_eq!(tank.max_health, 240.0);
        assert_eq!(world.enemies.active_count(), 1);
    }

    #[test]
    fn test_spawn_wave_links_formation() {
        let mut world = World::with_seed(1);
        let spec = WaveSpec {
            enemy_type: EnemyType::Drone,
            count: 5,
            formation: Some(FormationType::V),
            origin: DVec2::new(400.0, 40.0),
            spacing: 40.0,
            scaling: EnemyScaling::default(),
            wave_number: Some(3),
        };
        let slots = world.spawn_wave(&spec);
        assert_eq!(slots.len(), 5);
        assert_eq!(world.wave, 3);
        let leader_ref = world.enemies.slot_ref(slots[0]);
        let leader = world.enemies.get(slots[0]).unwrap();
        assert_eq!(leader.formation.unwrap().leader, None);
        for &s in &slots[1..] {
            let slot = world.enemies.get(s).unwrap().formation.unwrap();
            assert_eq!(slot.leader, leader_ref);
            assert_eq!(slot.group_id, leader.formation.unwrap().group_id);
        }
    }

    #[test]
    fn test_spawn_boss_rejects_second() {
        let mut world = World::with_seed(1);
        assert!(world.spawn_boss(2));
        assert!(!world.spawn_boss(3));
        assert_eq!(world.boss.as_ref().unwrap().level, 2);
    }

    #[test]
    fn test_reset_run_clears_everything() {
        let mut world = World::with_seed(9);
        world.spawn_enemy(EnemyType::Scout, DVec2::new(100.0, 100.0), EnemyScaling::default());
        world.spawn_powerup(PowerupType::Health, DVec2::new(100.0, 100.0));
        world.spawn_hazard(HazardType::BlackHole, DVec2::new(300.0, 100.0));
        world.spawn_boss(1);
        world.score = 500;
        world.player.health = 10.0;
        world.reset_run();
        assert_eq!(world.enemies.active_count(), 0);
        assert_eq!(world.powerups.active_count(), 0);
        assert!(world.hazards.is_empty());
        assert!(world.boss.is_none());
        assert_eq!(world.score, 0);
        assert_eq!(world.player.health, world.player.max_health);
        assert!(world.pools_consistent());
    }

    #[test]
    fn test_trim_pools_after_burst() {
        let mut world = World::with_seed(1);
        for i in 0..600 {
            let (_, p) = world.projectiles.acquire();
            p.pos = DVec2::new(i as f64, 0.0);
        }
        world.projectiles.release_all();
        assert_eq!(world.trim_pools(64), 1);
        assert!(world.projectiles.len() <= 64);
    }

    #[test]
    fn test_trim_pools_keeps_formation_and_homing_links() {
        let mut world = World::with_seed(1);
        let fillers: Vec<usize> = (0..4)
            .map(|i| {
                world.spawn_enemy(
                    EnemyType::Tank,
                    DVec2::new(100.0 + 60.0 * i as f64, 50.0),
                    EnemyScaling::default(),
                )
            })
            .collect();
        let slots = world.spawn_wave(&WaveSpec {
            enemy_type: EnemyType::Drone,
            count: 5,
            formation: Some(FormationType::V),
            origin: DVec2::new(400.0, 40.0),
            spacing: 40.0,
            scaling: EnemyScaling::default(),
            wave_number: None,
        });
        let leader_target = world.enemies.slot_ref(slots[0]);
        let (_, rocket) = world.projectiles.acquire();
        rocket.homing = Some(crate::sim::projectile::HomingState {
            turn_rate: 0.08,
            target: leader_target,
        });
        for index in fillers {
            assert!(world.enemies.release(index));
        }

        let followers_with_leader = |world: &World| {
            world
                .enemies
                .iter_active()
                .filter_map(|(_, e)| e.formation.and_then(|f| f.leader))
                .filter(|leader| world.enemies.resolve(*leader).is_some())
                .count()
        };
        assert_eq!(followers_with_leader(&world), 4);

        assert!(world.trim_pools(0) >= 1);
        assert_eq!(world.enemies.len(), 5);
        assert_eq!(followers_with_leader(&world), 4);
        let leader_ref = world
            .enemies
            .iter_active()
            .find(|(_, e)| e.formation.is_some_and(|f| f.leader.is_none()))
            .and_then(|(i, _)| world.enemies.slot_ref(i));
        assert!(leader_ref.is_some());
        for (_, e) in world.enemies.iter_active() {
            if let Some(leader) = e.formation.and_then(|f| f.leader) {
                assert_eq!(Some(leader), leader_ref);
            }
        }
        let (_, rocket) = world.projectiles.iter_active().next().unwrap();
        assert_eq!(rocket.homing.unwrap().target, leader_ref);
        assert!(world.pools_consistent());
    }
}
