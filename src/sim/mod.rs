//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (owned by the world)
//! - Stable iteration order (by pool slot)
//! - No rendering, audio or platform dependencies

pub mod ability;
pub mod asteroid;
pub mod boss;
pub mod collision;
pub mod effects;
pub mod enemy;
pub mod events;
pub mod formation;
pub mod grid;
pub mod hazard;
pub mod mystery;
pub mod player;
pub mod pool;
pub mod powerup;
pub mod projectile;
pub mod rng;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod trail;
pub mod weapon;

pub use ability::{AbilityManager, AbilityState, AbilityType};
pub use asteroid::{Asteroid, AsteroidSize};
pub use boss::{Boss, BossPhase};
pub use collision::{circles_overlap, point_segment_distance};
pub use effects::{Explosion, FloatingText, ImpactEffect};
pub use enemy::{BurnState, Enemy, EnemyScaling, EnemyType};
pub use events::SimEvent;
pub use formation::{FormationSlot, FormationType, WaveSpec};
pub use grid::{GridLayer, SpatialGrid};
pub use hazard::{Hazard, HazardType};
pub use mystery::{MysteryEffect, MysteryOutcome};
pub use player::Player;
pub use pool::{Pool, PoolStats, Poolable, SlotRef, SlotRemap};
pub use powerup::{Powerup, PowerupType};
pub use projectile::{BeamState, ChainState, HomingState, Projectile};
pub use rng::SimRng;
pub use snapshot::Snapshot;
pub use state::{PoolReport, Rgba, RunPhase, World};
pub use tick::InputEvent;
pub use trail::Trail;
pub use weapon::{ShotSpec, WeaponManager, WeaponState, WeaponType};
