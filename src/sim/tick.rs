//! Fixed timestep simulation tick
//!
//! Advances the world one step in a fixed, observable order: clocks, inputs,
//! player, boss, enemies and the other actors, projectiles, grid rebuild,
//! collision phases, deaths and secondary spawns, then pool cleanup.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::ability::AbilityType;
use super::boss::{BossContext, BossPhase};
use super::collision::{circles_overlap, push_out_of_circle};
use super::enemy::{BurnState, EnemyContext, EnemyScaling, EnemyType};
use super::events::SimEvent;
use super::formation::update_formations;
use super::hazard::HazardType;
use super::mystery;
use super::powerup::PowerupType;
use super::projectile::{Projectile, nearest_enemy};
use super::snapshot::Snapshot;
use super::state::{Rgba, RunPhase, World};
use super::weapon::{ShotSpec, WeaponPickup, WeaponType};

/// Player intent delivered by the host for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Toggle pause
    Pause,
    CycleWeapon,
    SwitchWeapon(WeaponType),
    ActivateAbility(AbilityType),
    /// Fire button held this tick
    Shoot,
    /// Latched movement intent; zero stops the ship
    MoveDirection(DVec2),
    ActivateUltimate,
}

const POSITIVE_TEXT: Rgba = Rgba::new(120, 255, 140, 255);
const NEGATIVE_TEXT: Rgba = Rgba::new(255, 110, 110, 255);

impl World {
    /// Advance the world by one fixed step and return the resulting view
    pub fn tick(&mut self, inputs: &[InputEvent], dt: f64) -> Snapshot {
        let toggles = inputs.iter().filter(|e| **e == InputEvent::Pause).count();
        if toggles % 2 == 1 {
            match self.phase {
                RunPhase::Playing => {
                    self.phase = RunPhase::Paused;
                    self.events.push(SimEvent::Paused);
                }
                RunPhase::Paused => {
                    self.phase = RunPhase::Playing;
                    self.events.push(SimEvent::Resumed);
                }
                RunPhase::GameOver => {}
            }
        }
        if self.phase != RunPhase::Playing {
            return self.finish_tick();
        }
        if !(dt.is_finite() && dt > 0.0) {
            log::warn!("tick rejected: invalid dt {dt}");
            return self.finish_tick();
        }

        // 1. Clocks
        self.time += dt;
        self.tick_count += 1;
        self.player.update_buffs(dt);

        // 2. Inputs
        self.apply_inputs(inputs);
        let hostile_scale = self.hostile_motion_scale();

        // 3-6. Actors
        self.update_player(dt);
        self.update_boss(dt, hostile_scale);
        self.update_enemies(dt, hostile_scale);
        self.update_environment(dt, hostile_scale);
        self.update_projectiles(dt, hostile_scale);

        // 7. Broad phase
        self.rebuild_grid();

        // 8. Collisions and field effects
        self.collide_friendly_projectiles();
        self.collide_hostile_projectiles();
        self.collide_bodies();
        self.collect_powerups();
        self.apply_hazards(dt);
        self.apply_emp();

        // 9. Deaths and secondary spawns
        self.resolve_enemy_deaths();
        self.resolve_asteroid_deaths();
        self.launch_chain_shots();
        if !self.player.is_alive() {
            self.phase = RunPhase::GameOver;
            self.player.health = 0.0;
            let (pos, radius) = (self.player.pos, self.player.radius);
            self.spawn_explosion(pos, radius * 4.0, Rgba::WHITE);
            self.events.push(SimEvent::PlayerDied);
            log::info!(
                "game over: score {} after {:.1}s, {} kills",
                self.score,
                self.time,
                self.kills
            );
        }

        // 10. Cleanup
        self.cleanup();
        self.finish_tick()
    }

    /// Capture the view without advancing
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    fn finish_tick(&mut self) -> Snapshot {
        let snapshot = Snapshot::capture(self);
        self.events.clear();
        snapshot
    }

    fn hostile_motion_scale(&self) -> f64 {
        if self.player.abilities.is_active(AbilityType::SlowTime) {
            self.tuning.ability_effects.slow_time_factor
        } else {
            1.0
        }
    }

    fn apply_inputs(&mut self, inputs: &[InputEvent]) {
        self.shooting = false;
        for input in inputs {
            match *input {
                InputEvent::Pause => {}
                InputEvent::Shoot => self.shooting = true,
                InputEvent::MoveDirection(dir) => {
                    self.player.move_intent = if dir.is_finite() { dir } else { DVec2::ZERO };
                }
                InputEvent::CycleWeapon => {
                    let weapon = self.player.weapons.cycle();
                    self.events.push(SimEvent::WeaponSwitched { weapon });
                }
                InputEvent::SwitchWeapon(weapon) => {
                    if self.player.weapons.switch_to(weapon) {
                        self.events.push(SimEvent::WeaponSwitched { weapon });
                    }
                }
                InputEvent::ActivateAbility(ability) => self.activate_ability(ability),
                InputEvent::ActivateUltimate => {
                    if self.player.activate_ultimate(self.tuning.player.ultimate_duration) {
                        log::debug!("ultimate activated");
                        self.events.push(SimEvent::UltimateActivated);
                    }
                }
            }
        }
    }

    fn activate_ability(&mut self, ability: AbilityType) {
        if !self.player.try_ability(ability) {
            self.events.push(SimEvent::AbilityRejected { ability });
            return;
        }
        let fx = &self.tuning.ability_effects;
        match ability {
            AbilityType::EmpPulse => self.emp_pending = true,
            AbilityType::Dash => {
                let dir = self.player.input_direction().normalize_or(DVec2::NEG_Y);
                self.player.pos += dir * fx.dash_distance;
                self.player.dash_invincibility_timer = fx.dash_invincibility;
                let (w, h) = (self.width(), self.height());
                self.player.clamp_to_screen(w, h);
            }
            AbilityType::SlowTime
            | AbilityType::Barrier
            | AbilityType::WeaponBoost
            | AbilityType::OrbitalShield => {}
        }
        self.events.push(SimEvent::AbilityActivated { ability });
    }

    fn update_player(&mut self, dt: f64) {
        let (w, h) = (self.width(), self.height());
        self.player.update_movement(w, h);
        self.player.regen_shield(self.time);
        let pt = &self.tuning.player;
        self.player
            .update_charge(dt, self.shooting, pt.charge_time, pt.charge_decay);

        if self.shooting {
            let weapon = self.player.weapons.current;
            let boost = self.tuning.ability_effects.weapon_boost_multiplier;
            let count = self.player.fire(boost, &self.tuning.projectiles, &mut self.shots);
            if count > 0 {
                self.events.push(SimEvent::PlayerFired { weapon, count });
                self.launch_shots(true);
            }
        }
    }

    fn update_boss(&mut self, dt: f64, hostile_scale: f64) {
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let ctx = BossContext {
            player_pos: self.player.pos,
            width: self.tuning.screen.width,
            motion_scale: hostile_scale,
            tuning: &self.tuning.boss,
        };
        let update = boss.update(dt, &ctx, &mut self.shots);
        let (pos, radius, level) = (boss.pos, boss.radius, boss.level);

        if let Some(phase) = update.phase_changed {
            self.events.push(SimEvent::BossPhaseChanged { phase });
        }
        if let Some(duration) = update.telegraph {
            self.events.push(SimEvent::BossTelegraph { duration });
        }
        if update.shield_raised {
            self.events.push(SimEvent::BossShieldRaised);
        }
        if let Some(pattern) = update.attacked {
            self.events.push(SimEvent::BossAttack { pattern });
        }
        self.launch_shots(false);

        let color = self.tuning.boss.color;
        if update.explode {
            let offset = DVec2::new(
                self.rng.range(-radius, radius),
                self.rng.range(-radius, radius),
            ) * 0.8;
            self.spawn_explosion(pos + offset, radius * 0.6, color);
        }
        if update.finished {
            let points = self.tuning.boss.points_per_level as u64 * level as u64;
            self.score += points;
            self.boss = None;
            let scale = self.tuning.effects.explosion_scale;
            self.spawn_explosion(pos, radius * scale, color);
            self.spawn_text(pos, &format!("+{points}"), Rgba::WHITE);
            self.events.push(SimEvent::BossDefeated { level, points });
            log::info!("boss level {level} defeated (+{points})");
        }
    }

    fn update_enemies(&mut self, dt: f64, hostile_scale: f64) {
        update_formations(&mut self.enemies, &mut self.members, &self.tuning.enemy_behavior);

        let ctx = EnemyContext {
            player_pos: self.player.pos,
            width: self.tuning.screen.width,
            height: self.tuning.screen.height,
            motion_scale: hostile_scale,
            projectile_radius: self.tuning.projectiles.enemy_radius,
            behavior: &self.tuning.enemy_behavior,
        };
        let burn_interval = self.tuning.projectiles.burn_tick_interval;
        for (_, enemy) in self.enemies.iter_active_mut() {
            if let Some(shot) = enemy.update(dt, &ctx) {
                self.events.push(SimEvent::EnemyFired { pos: shot.pos });
                self.shots.push(shot);
            }
            enemy.tick_burn(dt, burn_interval);
        }
        self.launch_shots(false);
    }

    /// Asteroids, powerups, hazards and visual effects
    fn update_environment(&mut self, dt: f64, hostile_scale: f64) {
        let (w, h) = (self.width(), self.height());
        let asteroid_margin = self.tuning.asteroids.offscreen_bottom;
        for (_, asteroid) in self.asteroids.iter_active_mut() {
            asteroid.update(hostile_scale, w, h, asteroid_margin);
        }
        let powerup_margin = self.tuning.powerups.offscreen_bottom;
        for (_, powerup) in self.powerups.iter_active_mut() {
            powerup.update(dt, h, powerup_margin);
        }
        let hazard_margin = self.tuning.hazards.offscreen_bottom;
        for hazard in self.hazards.iter_mut().filter(|h| h.active) {
            hazard.update(dt, hostile_scale, h, hazard_margin);
        }
        for (_, explosion) in self.explosions.iter_active_mut() {
            explosion.update(dt);
        }
        for (_, impact) in self.impacts.iter_active_mut() {
            impact.update(dt);
        }
        for (_, text) in self.floating_texts.iter_active_mut() {
            text.update(dt);
        }
    }

    fn update_projectiles(&mut self, dt: f64, hostile_scale: f64) {
        let (w, h) = (self.width(), self.height());
        let rules = &self.tuning.projectiles;
        for (_, projectile) in self.projectiles.iter_active_mut() {
            let scale = if projectile.friendly { 1.0 } else { hostile_scale };
            projectile.update(dt, scale, w, h, rules.offscreen_margin);
            if projectile.active && projectile.homing.is_some() {
                projectile.update_homing(&self.enemies, rules.homing_range);
            }
        }
    }

    fn rebuild_grid(&mut self) {
        self.grid.clear();
        for (index, enemy) in self.enemies.iter_active() {
            self.grid.insert_enemy(index, enemy);
        }
        for (index, projectile) in self.projectiles.iter_active() {
            self.grid.insert_projectile(index, projectile);
        }
        for (index, powerup) in self.powerups.iter_active() {
            self.grid.insert_powerup(index, powerup);
        }
        for (index, asteroid) in self.asteroids.iter_active() {
            self.grid.insert_asteroid(index, asteroid);
        }
    }

    /// Player shots against enemies, the boss, asteroids and barriers
    fn collide_friendly_projectiles(&mut self) {
        let mut neighbors = std::mem::take(&mut self.neighbors);
        for pi in 0..self.projectiles.len() {
            let Some(proj) = self
                .projectiles
                .get(pi)
                .filter(|p| p.active && p.friendly)
                .cloned()
            else {
                continue;
            };
            let piercing = proj.is_piercing();
            let (center, reach) = proj.broad_phase_circle();
            let mut spent = false;

            self.grid.neighbors_enemies(center, reach, &mut neighbors);
            for &ei in &neighbors {
                let Some(enemy) = self.enemies.get(ei) else {
                    continue;
                };
                if !enemy.active || enemy.health <= 0.0 || !proj.hits_circle(enemy.pos, enemy.radius) {
                    continue;
                }
                if let (Some(chain), Some(slot)) = (&proj.chain, self.enemies.slot_ref(ei)) {
                    if chain.has_struck(slot) {
                        continue;
                    }
                }
                self.hit_enemy(ei, &proj);
                if !piercing {
                    spent = true;
                    break;
                }
            }

            if !spent {
                spent = self.hit_boss(&proj) && !piercing;
            }

            if !spent {
                self.grid.neighbors_asteroids(center, reach, &mut neighbors);
                for &ai in &neighbors {
                    let Some(asteroid) = self.asteroids.get_mut(ai) else {
                        continue;
                    };
                    if !asteroid.active
                        || asteroid.health <= 0.0
                        || !proj.hits_circle(asteroid.pos, asteroid.radius)
                    {
                        continue;
                    }
                    asteroid.take_damage(proj.damage);
                    let pos = asteroid.pos;
                    self.spawn_impact(pos, proj.main_color, proj.vel.y.atan2(proj.vel.x));
                    if !piercing {
                        spent = true;
                        break;
                    }
                }
            }

            if !spent {
                spent = self.absorb_in_barrier(&proj);
            }

            if spent {
                if let Some(p) = self.projectiles.get_mut(pi) {
                    p.active = false;
                }
            }
        }
        self.neighbors = neighbors;
    }

    fn hit_enemy(&mut self, index: usize, proj: &Projectile) {
        let burn_interval = self.tuning.projectiles.burn_tick_interval;
        let slot = self.enemies.slot_ref(index);
        let Some(enemy) = self.enemies.get_mut(index) else {
            return;
        };
        let shield_before = enemy.shield_points;
        enemy.take_damage(proj.damage);
        if let Some(burn) = proj.burn {
            enemy.ignite(burn, burn_interval);
        }
        let pos = enemy.pos;
        let absorbed = enemy.shield_points < shield_before;

        self.events.push(SimEvent::EnemyHit { pos });
        if absorbed {
            self.events.push(SimEvent::ShieldAbsorbed { pos });
        }
        self.spawn_impact(pos, proj.main_color, proj.vel.y.atan2(proj.vel.x));

        let (Some(mut chain), Some(slot)) = (proj.chain, slot) else {
            return;
        };
        chain.record_strike(slot);
        if chain.remaining == 0 {
            return;
        }
        let next = nearest_enemy(pos, &self.enemies, chain.range, |candidate| {
            candidate != slot
                && !chain.has_struck(candidate)
                && self.enemies.resolve(candidate).is_some_and(|e| e.health > 0.0)
        });
        let Some(target) = next.and_then(|s| self.enemies.resolve(s)).map(|e| e.pos) else {
            return;
        };
        chain.remaining -= 1;
        let speed = proj.vel.length().max(1.0);
        self.chain_shots.push(ShotSpec {
            pos,
            vel: (target - pos).normalize_or(DVec2::NEG_Y) * speed,
            radius: proj.radius,
            damage: proj.damage,
            main_color: proj.main_color,
            glow_color: proj.glow_color,
            chain: Some(chain),
            ..ShotSpec::default()
        });
        self.events.push(SimEvent::ChainArc { from: pos, to: target });
    }

    /// Returns true if the projectile touched the boss (shielded or not)
    fn hit_boss(&mut self, proj: &Projectile) -> bool {
        let Some(boss) = self.boss.as_mut() else {
            return false;
        };
        if boss.phase == BossPhase::Dying || !proj.hits_circle(boss.pos, boss.radius) {
            return false;
        }
        let angle = proj.vel.y.atan2(proj.vel.x);
        if boss.take_damage(proj.damage, &self.tuning.boss) {
            self.events.push(SimEvent::EnemyHit { pos: proj.pos });
            if boss.phase == BossPhase::Dying {
                log::debug!("boss level {} dying", boss.level);
                self.events.push(SimEvent::BossPhaseChanged {
                    phase: BossPhase::Dying,
                });
            }
        } else {
            self.events.push(SimEvent::BossShieldBlocked { pos: proj.pos });
        }
        self.spawn_impact(proj.pos, proj.main_color, angle);
        true
    }

    /// Barriers swallow any projectile; friendly hits wear them down
    fn absorb_in_barrier(&mut self, proj: &Projectile) -> bool {
        let Some(hazard) = self
            .hazards
            .iter_mut()
            .find(|h| h.active && h.is_solid() && proj.hits_circle(h.pos, h.radius))
        else {
            return false;
        };
        if proj.friendly && hazard.take_damage(proj.damage) {
            let (kind, pos, radius) = (hazard.kind, hazard.pos, hazard.radius);
            self.events.push(SimEvent::HazardDestroyed { kind, pos });
            self.spawn_explosion(pos, radius, kind.color());
        }
        true
    }

    /// Hostile shots against the orbital shield, the player and barriers
    fn collide_hostile_projectiles(&mut self) {
        let mut neighbors = std::mem::take(&mut self.neighbors);
        let orbital = self.player.abilities.is_active(AbilityType::OrbitalShield);
        let (ppos, pr) = (self.player.pos, self.player.radius);
        let reach = if orbital {
            pr + self.tuning.ability_effects.orbital_radius
        } else {
            pr
        };

        self.grid.neighbors_projectiles(ppos, reach, &mut neighbors);
        for &pi in &neighbors {
            let Some(proj) = self
                .projectiles
                .get_mut(pi)
                .filter(|p| p.active && !p.friendly)
            else {
                continue;
            };
            let (pos, color, damage) = (proj.pos, proj.main_color, proj.damage);
            if proj.hits_circle(ppos, pr) {
                proj.active = false;
                if self.player.take_damage(damage, self.time) {
                    self.events.push(SimEvent::PlayerHit { damage });
                }
                self.spawn_impact(pos, color, 0.0);
            } else if orbital && proj.hits_circle(ppos, reach) {
                proj.active = false;
                self.spawn_impact(pos, color, 0.0);
            }
        }
        self.neighbors = neighbors;

        let hazards = &self.hazards;
        for (_, proj) in self.projectiles.iter_active_mut() {
            if !proj.friendly
                && hazards
                    .iter()
                    .any(|h| h.active && h.is_solid() && proj.hits_circle(h.pos, h.radius))
            {
                proj.active = false;
            }
        }
    }

    /// Enemy, asteroid and boss bodies against the player
    fn collide_bodies(&mut self) {
        let mut neighbors = std::mem::take(&mut self.neighbors);
        let (ppos, pr) = (self.player.pos, self.player.radius);
        let ram = self.tuning.player.ram_damage;

        self.grid.neighbors_enemies(ppos, pr, &mut neighbors);
        for &ei in &neighbors {
            let Some(enemy) = self.enemies.get_mut(ei) else {
                continue;
            };
            if !enemy.active || enemy.health <= 0.0 || !circles_overlap(enemy.pos, enemy.radius, ppos, pr) {
                continue;
            }
            let contact = enemy.contact_damage;
            enemy.take_damage(ram);
            if self.player.take_damage(contact, self.time) {
                self.events.push(SimEvent::PlayerHit { damage: contact });
            }
        }

        let rock = self.tuning.asteroids.contact_damage;
        self.grid.neighbors_asteroids(ppos, pr, &mut neighbors);
        for &ai in &neighbors {
            let Some(asteroid) = self.asteroids.get_mut(ai) else {
                continue;
            };
            if !asteroid.active
                || asteroid.health <= 0.0
                || !circles_overlap(asteroid.pos, asteroid.radius, ppos, pr)
            {
                continue;
            }
            asteroid.take_damage(ram);
            if self.player.take_damage(rock, self.time) {
                self.events.push(SimEvent::PlayerHit { damage: rock });
            }
        }
        self.neighbors = neighbors;

        if let Some(boss) = &self.boss {
            if boss.phase != BossPhase::Dying && circles_overlap(boss.pos, boss.radius, ppos, pr) {
                let contact = self.tuning.boss.contact_damage;
                if self.player.take_damage(contact, self.time) {
                    self.events.push(SimEvent::PlayerHit { damage: contact });
                }
            }
        }
    }

    fn collect_powerups(&mut self) {
        let mut neighbors = std::mem::take(&mut self.neighbors);
        let (ppos, pr) = (self.player.pos, self.player.radius);
        self.grid.neighbors_powerups(ppos, pr, &mut neighbors);
        for &i in &neighbors {
            let Some(powerup) = self.powerups.get_mut(i) else {
                continue;
            };
            if !powerup.active || !circles_overlap(powerup.pos, powerup.radius, ppos, pr) {
                continue;
            }
            powerup.active = false;
            let (kind, pos) = (powerup.kind, powerup.pos);
            self.apply_powerup(kind, pos);
        }
        self.neighbors = neighbors;
    }

    fn apply_powerup(&mut self, kind: PowerupType, pos: DVec2) {
        let t = &self.tuning.powerups;
        self.events.push(SimEvent::PowerupCollected { kind });
        match kind {
            PowerupType::Health => {
                self.player.heal(t.health_amount);
                self.spawn_text(pos, "+HP", kind.color());
            }
            PowerupType::Shield => {
                self.player.add_shield(t.shield_amount);
                self.spawn_text(pos, "+SHIELD", kind.color());
            }
            PowerupType::Speed => {
                self.player.speed_boost_multiplier = t.speed_boost_multiplier;
                self.player.speed_boost_timer = t.speed_boost_duration;
                self.spawn_text(pos, "SPEED UP", kind.color());
            }
            PowerupType::Weapon => match self.player.weapons.collect_pickup() {
                WeaponPickup::Upgraded(weapon, level) => {
                    self.events.push(SimEvent::WeaponUpgraded { weapon, level });
                    self.spawn_text(pos, &format!("{} Mk {level}", weapon.name()), kind.color());
                }
                WeaponPickup::Unlocked(weapon) => {
                    self.events.push(SimEvent::WeaponUnlocked { weapon });
                    self.spawn_text(pos, weapon.name(), kind.color());
                }
                WeaponPickup::Maxed => self.spawn_text(pos, "MAX", kind.color()),
            },
            PowerupType::Mystery => {
                let effect = mystery::roll(&mut self.rng, &self.tuning.mystery);
                let outcome = mystery::apply(&mut self.player, effect, &self.tuning.mystery);
                self.events.push(SimEvent::Mystery {
                    effect,
                    name: outcome.name,
                    positive: outcome.positive,
                });
                let color = if outcome.positive {
                    POSITIVE_TEXT
                } else {
                    NEGATIVE_TEXT
                };
                self.spawn_text(pos, outcome.name, color);
            }
        }
    }

    /// Barrier push-out, pull fields and damage zones
    fn apply_hazards(&mut self, dt: f64) {
        let core = self.tuning.hazards.core_fraction;
        let time = self.time;
        for hazard in self.hazards.iter().filter(|h| h.active) {
            let player = &mut self.player;
            if hazard.is_solid() {
                if let Some(pos) = push_out_of_circle(player.pos, player.radius, hazard.pos, hazard.radius) {
                    player.pos = pos;
                }
            }
            if hazard.pulls() {
                player.pos += hazard.pull_offset(player.pos);
                if hazard.kind == HazardType::BlackHole {
                    for (_, enemy) in self.enemies.iter_active_mut() {
                        enemy.pos += hazard.pull_offset(enemy.pos);
                    }
                    for (_, proj) in self.projectiles.iter_active_mut() {
                        if proj.beam.is_none() {
                            proj.pos += hazard.pull_offset(proj.pos);
                        }
                    }
                }
            }
            let damage = hazard.damage_for(player.pos, player.radius, dt, core);
            if damage > 0.0 {
                player.take_continuous_damage(damage, time);
            }
        }
        let (w, h) = (self.width(), self.height());
        self.player.clamp_to_screen(w, h);
    }

    /// One-shot pulse around the player: clears hostile shots, damages enemies
    fn apply_emp(&mut self) {
        if !self.emp_pending {
            return;
        }
        self.emp_pending = false;
        let fx = &self.tuning.ability_effects;
        let (center, radius, damage) = (self.player.pos, fx.emp_radius, fx.emp_damage);

        for (_, proj) in self.projectiles.iter_active_mut() {
            if !proj.friendly && proj.pos.distance_squared(center) <= radius * radius {
                proj.active = false;
            }
        }
        for (_, enemy) in self.enemies.iter_active_mut() {
            if circles_overlap(enemy.pos, enemy.radius, center, radius) {
                enemy.take_damage(damage);
            }
        }
        if let Some(boss) = self.boss.as_mut() {
            if boss.phase != BossPhase::Dying && circles_overlap(boss.pos, boss.radius, center, radius) {
                boss.take_damage(damage, &self.tuning.boss);
                if boss.phase == BossPhase::Dying {
                    self.events.push(SimEvent::BossPhaseChanged {
                        phase: BossPhase::Dying,
                    });
                }
            }
        }
        self.spawn_explosion(center, radius, Rgba::new(120, 200, 255, 200));
    }

    fn resolve_enemy_deaths(&mut self) {
        let mut dead = std::mem::take(&mut self.dead);
        dead.clear();
        dead.extend(
            self.enemies
                .iter_active()
                .filter(|(_, e)| e.health <= 0.0)
                .map(|(i, _)| i),
        );
        for &index in &dead {
            self.kill_enemy(index);
        }
        self.dead = dead;
    }

    /// Score, effects, split and drop for a destroyed enemy
    pub fn kill_enemy(&mut self, index: usize) -> bool {
        let scout = self.tuning.enemy_stats(EnemyType::Scout);
        let Some(enemy) = self.enemies.get_mut(index).filter(|e| e.active) else {
            log::warn!("kill_enemy: slot {index} is not a live enemy");
            return false;
        };
        let children = enemy.split(&scout, &self.tuning.enemy_behavior);
        enemy.health = 0.0;
        enemy.burn = BurnState::default();
        enemy.active = false;
        let (kind, pos, radius, points, color) =
            (enemy.kind, enemy.pos, enemy.radius, enemy.points, enemy.color);

        self.score += points as u64;
        self.kills += 1;
        self.player
            .add_ultimate_charge(self.tuning.player.ultimate_charge_per_kill);
        self.events.push(SimEvent::EnemyKilled { kind, pos, points });
        let scale = self.tuning.effects.explosion_scale;
        self.spawn_explosion(pos, radius * scale, color);
        self.spawn_text(pos, &format!("+{points}"), Rgba::WHITE);

        if let Some(children) = children {
            for (child_pos, health, child_points) in children {
                let child = self.spawn_enemy(EnemyType::Scout, child_pos, EnemyScaling::default());
                if let Some(spawned) = self.enemies.get_mut(child) {
                    spawned.health = health;
                    spawned.max_health = health;
                    spawned.points = child_points;
                }
                self.spawn_explosion(child_pos, scout.radius * scale * 0.5, color);
            }
            self.events.push(SimEvent::EnemySplit { pos });
        }

        self.roll_drop(pos);
        true
    }

    fn roll_drop(&mut self, pos: DVec2) {
        let t = &self.tuning.powerups;
        if !self.rng.chance(t.drop_chance) {
            return;
        }
        let Some(kind) = self
            .rng
            .weighted_index(t.weights.values().copied())
            .and_then(|i| t.weights.keys().nth(i).copied())
        else {
            return;
        };
        self.spawn_powerup(kind, pos);
    }

    fn resolve_asteroid_deaths(&mut self) {
        let mut dead = std::mem::take(&mut self.dead);
        dead.clear();
        dead.extend(
            self.asteroids
                .iter_active()
                .filter(|(_, a)| a.health <= 0.0)
                .map(|(i, _)| i),
        );
        let split_speed = self.tuning.asteroids.split_speed;
        for &index in &dead {
            let Some(asteroid) = self.asteroids.get_mut(index) else {
                continue;
            };
            asteroid.active = false;
            let (size, pos, vel, radius, points) =
                (asteroid.size, asteroid.pos, asteroid.vel, asteroid.radius, asteroid.points);
            self.score += points as u64;
            self.events.push(SimEvent::AsteroidDestroyed { size, pos });
            self.spawn_explosion(pos, radius * 1.5, Rgba::new(170, 150, 130, 255));
            self.spawn_text(pos, &format!("+{points}"), Rgba::WHITE);
            if let Some(fragment) = size.split() {
                let offset = self.tuning.asteroids.stats(fragment).radius;
                for side in [-1.0, 1.0] {
                    self.spawn_asteroid(
                        fragment,
                        pos + DVec2::new(side * offset, 0.0),
                        vel + DVec2::new(side * split_speed, 0.0),
                    );
                }
            }
        }
        self.dead = dead;
    }

    fn launch_chain_shots(&mut self) {
        let mut shots = std::mem::take(&mut self.chain_shots);
        for shot in shots.drain(..) {
            let (_, projectile) = self.projectiles.acquire();
            projectile.launch(&shot, true, &self.tuning.projectiles);
        }
        self.chain_shots = shots;
    }

    fn cleanup(&mut self) {
        self.projectiles.release_inactive();
        self.enemies.release_inactive();
        self.explosions.release_inactive();
        self.floating_texts.release_inactive();
        self.impacts.release_inactive();
        self.asteroids.release_inactive();
        self.powerups.release_inactive();
        self.hazards.retain(|h| h.active);
    }
}
