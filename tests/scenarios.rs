//! End-to-end behavior checks driven through the public API

use glam::DVec2;

use star_raid::consts::SIM_DT;
use star_raid::sim::projectile::BurnEffect;
use star_raid::sim::{
    BossPhase, Enemy, EnemyScaling, EnemyType, Player, Pool, Poolable, Projectile, ShotSpec,
    SimEvent, WeaponType,
};
use star_raid::tuning::ProjectileTuning;
use star_raid::{Tuning, World};

/// Spawn an enemy that holds its position (speed zeroed)
fn parked(world: &mut World, kind: EnemyType, pos: DVec2) -> usize {
    let index = world.spawn_enemy(kind, pos, EnemyScaling::default());
    world.enemies.get_mut(index).unwrap().speed = 0.0;
    index
}

#[test]
fn test_homing_target_expiry_falls_back_to_straight_flight() {
    let tuning = Tuning::default();
    let rules = ProjectileTuning::default();
    let mut enemies: Pool<Enemy> = Pool::new();
    let (index, enemy) = enemies.acquire();
    enemy.configure(
        EnemyType::Scout,
        &tuning.enemy_stats(EnemyType::Scout),
        DVec2::new(500.0, 100.0),
        &EnemyScaling::default(),
    );

    let mut rocket = Projectile::default();
    rocket.launch(
        &ShotSpec {
            pos: DVec2::new(400.0, 400.0),
            vel: DVec2::new(0.0, -6.0),
            radius: 5.0,
            damage: 10.0,
            homing_turn_rate: Some(0.05),
            ..ShotSpec::default()
        },
        true,
        &rules,
    );

    rocket.update_homing(&enemies, rules.homing_range);
    let locked = rocket.homing.unwrap().target;
    assert_eq!(locked, enemies.slot_ref(index));
    assert!(rocket.vel.x > 0.0, "rocket turns toward the target");

    // Target dies and its slot is recycled by an enemy far out of range
    enemies.get_mut(index).unwrap().set_active(false);
    enemies.release_inactive();
    let (reused, stranger) = enemies.acquire();
    assert_eq!(reused, index);
    stranger.configure(
        EnemyType::Tank,
        &tuning.enemy_stats(EnemyType::Tank),
        DVec2::new(-5000.0, -5000.0),
        &EnemyScaling::default(),
    );

    let heading = rocket.vel;
    for _ in 0..10 {
        rocket.update_homing(&enemies, rules.homing_range);
        rocket.update(SIM_DT, 1.0, 800.0, 600.0, rules.offscreen_margin);
    }
    assert_eq!(rocket.vel, heading);
    assert_eq!(rocket.homing.unwrap().target, None);
    assert!(rocket.active);
}

#[test]
fn test_shield_bearer_overflow_then_regen() {
    let mut world = World::with_seed(7);
    let index = parked(&mut world, EnemyType::ShieldBearer, DVec2::new(100.0, 100.0));
    {
        let bearer = world.enemies.get_mut(index).unwrap();
        bearer.shield_points = 10.0;
        bearer.health = 50.0;
        bearer.max_health = 50.0;
        bearer.shield_regen_timer = 1.5;
        bearer.take_damage(30.0);
        assert_eq!(bearer.shield_points, 0.0);
        assert_eq!(bearer.health, 30.0);
        assert_eq!(bearer.shield_regen_timer, 0.0);
    }

    let shield = |world: &World| world.enemies.get(index).unwrap().shield_points;
    // 3.5 s quiet period, then one point per 0.5 s: the first lands at 4.0 s
    for _ in 0..239 {
        world.tick(&[], SIM_DT);
    }
    assert_eq!(shield(&world), 0.0);
    world.tick(&[], SIM_DT);
    assert_eq!(shield(&world), 1.0);
    for _ in 0..30 {
        world.tick(&[], SIM_DT);
    }
    assert_eq!(shield(&world), 2.0);

    let max = world.enemies.get(index).unwrap().max_shield_points;
    for _ in 0..60 * 30 {
        world.tick(&[], SIM_DT);
    }
    assert_eq!(shield(&world), max);
    assert_eq!(world.enemies.get(index).unwrap().health, 30.0);
}

#[test]
fn test_mixed_mode_adds_alternating_side_blaster() {
    let tuning = Tuning::default();
    let mut player = Player::new(&tuning);
    for _ in 0..4 {
        assert!(player.weapons.upgrade(WeaponType::Basic));
    }
    player.weapons.unlock(WeaponType::Flamethrower);
    assert!(player.weapons.switch_to(WeaponType::Flamethrower));
    assert!(player.weapons.mixed_mode());

    let basic_color = player.weapons.get(WeaponType::Basic).unwrap().main_color;
    let salvo = player.weapons.current_state().unwrap().projectile_count as usize;
    let nose_x = player.nose().x;

    let mut sides = Vec::new();
    let mut shots = Vec::new();
    for _ in 0..120 {
        player.update_buffs(SIM_DT);
        shots.clear();
        let count = player.fire(1.0, &tuning.projectiles, &mut shots);
        if count == 0 {
            continue;
        }
        assert_eq!(count, salvo + 1);
        let side: Vec<&ShotSpec> = shots.iter().filter(|s| s.main_color == basic_color).collect();
        assert_eq!(side.len(), 1);
        assert!(shots.iter().filter(|s| s.burn.is_some()).count() == salvo);
        sides.push((side[0].pos.x - nose_x).signum());
        if sides.len() == 2 {
            break;
        }
    }
    assert_eq!(sides.len(), 2);
    assert_eq!(sides[0], -sides[1]);
}

#[test]
fn test_level_three_boss_attacks_right_after_early_telegraph() {
    let mut world = World::with_seed(3);
    world.player.pos.x = world.width() * 0.5;
    assert!(world.spawn_boss(3));

    let mut telegraph_tick = None;
    let mut attack_tick = None;
    for tick in 0..600u32 {
        let snap = world.tick(&[], SIM_DT);
        for event in &snap.events {
            match event {
                SimEvent::BossTelegraph { duration } if telegraph_tick.is_none() => {
                    assert!((duration - 0.3).abs() < 1e-12);
                    telegraph_tick = Some(tick);
                }
                SimEvent::BossAttack { .. } if attack_tick.is_none() => {
                    attack_tick = Some(tick);
                }
                _ => {}
            }
        }
        if attack_tick.is_some() {
            break;
        }
    }
    let start = telegraph_tick.expect("boss telegraphs on the way in");
    assert_eq!(attack_tick, Some(start + 18));
    let boss = world.boss.as_ref().unwrap();
    assert!(boss.pos.y < boss.entry_y, "attack began before reaching the entry line");
    assert_eq!(boss.phase, BossPhase::Attacking);
}

#[test]
fn test_burn_kills_scout_and_releases_slot() {
    let mut world = World::with_seed(5);
    let index = parked(&mut world, EnemyType::Scout, DVec2::new(120.0, 80.0));
    world.enemies.get_mut(index).unwrap().ignite(
        BurnEffect {
            duration: 3.0,
            damage_per_tick: 5.0,
        },
        world.tuning.projectiles.burn_tick_interval,
    );

    let mut killed_at = None;
    for tick in 1..=180u32 {
        let snap = world.tick(&[], SIM_DT);
        if snap
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::EnemyKilled { kind: EnemyType::Scout, .. }))
        {
            killed_at = Some(tick);
            break;
        }
    }
    // 20 hp at 5 per half second
    assert_eq!(killed_at, Some(120));
    assert_eq!(world.enemies.active_count(), 0);
    assert!(!world.enemies.is_held(index));
    assert_eq!(world.kills, 1);
    assert!(world.pools_consistent());
}

#[test]
fn test_splitter_death_spawns_two_scouts_once() {
    let mut world = World::with_seed(11);
    let index = parked(&mut world, EnemyType::Splitter, DVec2::new(300.0, 150.0));
    {
        let splitter = world.enemies.get_mut(index).unwrap();
        splitter.health = 10.0;
        splitter.take_damage(20.0);
    }

    let snap = world.tick(&[], SIM_DT);
    let death = snap
        .events
        .iter()
        .find_map(|e| match e {
            SimEvent::EnemyKilled {
                kind: EnemyType::Splitter,
                pos,
                ..
            } => Some(*pos),
            _ => None,
        })
        .expect("splitter destroyed");
    assert!(snap.events.contains(&SimEvent::EnemySplit { pos: death }));

    let scouts: Vec<&Enemy> = world.enemies.iter_active().map(|(_, e)| e).collect();
    assert_eq!(scouts.len(), 2);
    let offset = world.tuning.enemy_behavior.split_offset;
    let mut xs: Vec<f64> = scouts.iter().map(|s| s.pos.x - death.x).collect();
    xs.sort_by(f64::total_cmp);
    assert!((xs[0] + offset).abs() < 1e-9 && (xs[1] - offset).abs() < 1e-9);
    for scout in &scouts {
        assert_eq!(scout.pos.y, death.y);
        assert_eq!(scout.kind, EnemyType::Scout);
        assert_eq!(scout.health, 14.0);
        assert_eq!(scout.points, 50);
        assert!(!scout.has_split);
    }

    // The splitter's own flag never clears while it lives
    let mut splitter = Enemy::default();
    splitter.configure(
        EnemyType::Splitter,
        &world.tuning.enemy_stats(EnemyType::Splitter),
        DVec2::new(200.0, 200.0),
        &EnemyScaling::default(),
    );
    let scout_stats = world.tuning.enemy_stats(EnemyType::Scout);
    let behavior = &world.tuning.enemy_behavior;
    assert!(splitter.split(&scout_stats, behavior).is_some());
    for _ in 0..5 {
        splitter.take_damage(1.0);
        assert!(splitter.has_split);
        assert!(splitter.split(&scout_stats, behavior).is_none());
    }
}
