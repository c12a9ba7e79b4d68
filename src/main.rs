//! Star Raid headless demo
//!
//! Drives a scripted run through the simulation at a fixed step and logs what
//! happened. Usage: `star-raid [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::DVec2;

    use star_raid::consts::SIM_DT;
    use star_raid::sim::{
        AbilityType, AsteroidSize, EnemyScaling, EnemyType, FormationType, HazardType, RunPhase,
        SimEvent, WaveSpec, WeaponType,
    };
    use star_raid::{InputEvent, Tuning, World};

    /// Simulated seconds the demo runs for
    const DEMO_SECONDS: f64 = 90.0;
    /// Host frame interval; the sim catches up with fixed steps
    const FRAME_TIME: f64 = 1.0 / 45.0;
    const MAX_STEPS_PER_FRAME: u32 = 8;

    /// Things the host schedules; the sim itself never spawns waves
    enum Cue {
        Wave(WaveSpec),
        Asteroids(u32),
        Hazard(HazardType, DVec2),
        Boss(u32),
    }

    fn wave(number: u32, kind: EnemyType, count: u32, formation: Option<FormationType>) -> Cue {
        let growth = 1.0 + 0.15 * (number.saturating_sub(1)) as f64;
        Cue::Wave(WaveSpec {
            enemy_type: kind,
            count,
            formation,
            origin: DVec2::new(400.0, -20.0),
            spacing: 45.0,
            scaling: EnemyScaling {
                health: growth,
                speed: growth.sqrt(),
                ..EnemyScaling::default()
            },
            wave_number: Some(number),
        })
    }

    fn schedule() -> Vec<(f64, Cue)> {
        vec![
            (1.0, wave(1, EnemyType::Scout, 6, Some(FormationType::Convoy))),
            (6.0, wave(2, EnemyType::Drone, 5, Some(FormationType::V))),
            (10.0, Cue::Asteroids(3)),
            (14.0, wave(3, EnemyType::Hunter, 4, None)),
            (18.0, Cue::Hazard(HazardType::MagneticField, DVec2::new(200.0, -100.0))),
            (22.0, wave(4, EnemyType::ShieldBearer, 4, Some(FormationType::Wave))),
            (27.0, wave(5, EnemyType::Splitter, 3, None)),
            (32.0, wave(6, EnemyType::Sniper, 3, Some(FormationType::Circular))),
            (36.0, Cue::Hazard(HazardType::Barrier, DVec2::new(560.0, -60.0))),
            (40.0, Cue::Boss(1)),
            (60.0, Cue::Asteroids(4)),
            (64.0, wave(7, EnemyType::Tank, 2, None)),
            (70.0, Cue::Hazard(HazardType::BlackHole, DVec2::new(400.0, -150.0))),
            (75.0, wave(8, EnemyType::Drone, 8, Some(FormationType::V))),
        ]
    }

    fn run_cue(world: &mut World, cue: &Cue) {
        match cue {
            Cue::Wave(spec) => {
                world.spawn_wave(spec);
            }
            Cue::Asteroids(count) => {
                let width = world.width();
                for i in 0..*count {
                    let x = world.rng.range(60.0, width - 60.0);
                    let drift = DVec2::new(world.rng.range(-0.6, 0.6), 1.0 + 0.2 * i as f64);
                    world.spawn_asteroid(AsteroidSize::Large, DVec2::new(x, -60.0), drift);
                }
            }
            Cue::Hazard(kind, pos) => {
                world.spawn_hazard(*kind, *pos);
            }
            Cue::Boss(level) => {
                world.spawn_boss(*level);
            }
        }
    }

    /// A crude autopilot: shadow the nearest enemy, use abilities when useful
    fn autopilot(world: &World, inputs: &mut Vec<InputEvent>) {
        inputs.clear();
        inputs.push(InputEvent::Shoot);

        let player = world.player.pos;
        let target = world
            .boss
            .as_ref()
            .map(|b| b.pos)
            .or_else(|| {
                world
                    .enemies
                    .iter_active()
                    .map(|(_, e)| e.pos)
                    .min_by(|a, b| a.distance_squared(player).total_cmp(&b.distance_squared(player)))
            });
        let dx = target.map_or(world.width() * 0.5 - player.x, |t| t.x - player.x);
        let steer = if dx.abs() > 8.0 { dx.signum() } else { 0.0 };
        inputs.push(InputEvent::MoveDirection(DVec2::new(steer, 0.0)));

        let incoming = world
            .projectiles
            .iter_active()
            .filter(|(_, p)| !p.friendly && p.pos.distance_squared(player) < 150.0 * 150.0)
            .count();
        if incoming >= 4 {
            inputs.push(InputEvent::ActivateAbility(AbilityType::EmpPulse));
        }
        if world.player.ultimate_charge >= 1.0 {
            inputs.push(InputEvent::ActivateUltimate);
        }
        if world.tick_count % 600 == 300 {
            inputs.push(InputEvent::CycleWeapon);
        }
    }

    pub fn run() {
        env_logger::init();

        let mut args = std::env::args().skip(1);
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0x5eed_u64);
        let tuning = match args.next() {
            Some(path) => match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
            {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::error!("failed to load tuning from {path}: {e}");
                    std::process::exit(1);
                }
            },
            None => Tuning::default(),
        };

        log::info!("Star Raid demo starting (seed {seed})");
        let mut world = World::new(tuning, seed);
        world.player.weapons.unlock(WeaponType::SpreadShot);

        let mut cues = schedule().into_iter().peekable();
        let mut inputs = Vec::new();
        let mut accumulator = 0.0;
        let mut frames = 0u64;
        let mut boss_kills = 0u32;
        let mut pickups = 0u32;

        while world.time < DEMO_SECONDS && world.phase != RunPhase::GameOver {
            frames += 1;
            accumulator += FRAME_TIME;
            let mut steps = 0;
            while accumulator >= SIM_DT && steps < MAX_STEPS_PER_FRAME {
                while let Some((_, cue)) = cues.next_if(|(at, _)| *at <= world.time) {
                    run_cue(&mut world, &cue);
                }
                autopilot(&world, &mut inputs);
                let snapshot = world.tick(&inputs, SIM_DT);
                for event in &snapshot.events {
                    match event {
                        SimEvent::BossDefeated { .. } => boss_kills += 1,
                        SimEvent::PowerupCollected { .. } => pickups += 1,
                        _ => {}
                    }
                }
                accumulator -= SIM_DT;
                steps += 1;
            }
            if steps == MAX_STEPS_PER_FRAME {
                accumulator = 0.0;
            }
            if frames % 450 == 0 {
                let snap = world.snapshot();
                log::info!(
                    "t={:.1}s score={} enemies={} projectiles={} hp={:.0} shield={:.0}",
                    snap.time,
                    snap.hud.score,
                    snap.enemies.len(),
                    snap.projectiles.len(),
                    snap.hud.health,
                    snap.hud.shield
                );
                world.trim_pools(128);
            }
        }

        let stats = world.pool_stats();
        log::info!(
            "run ended at {:.1}s ({:?}): score {}, wave {}, kills {}, bosses {}, pickups {}",
            world.time,
            world.phase,
            world.score,
            world.wave,
            world.kills,
            boss_kills,
            pickups
        );
        for (name, s) in [
            ("projectiles", stats.projectiles),
            ("enemies", stats.enemies),
            ("explosions", stats.explosions),
            ("texts", stats.floating_texts),
            ("impacts", stats.impacts),
            ("asteroids", stats.asteroids),
            ("powerups", stats.powerups),
        ] {
            log::info!(
                "pool {name}: created {} reused {} ({:.0}% reuse), peak {}",
                s.total_created,
                s.total_reused,
                s.reuse_rate() * 100.0,
                s.peak_active
            );
        }
        if !world.pools_consistent() {
            log::error!("pool bookkeeping out of sync");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on the web
}
