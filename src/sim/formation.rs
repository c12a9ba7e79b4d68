//! Enemy formations
//!
//! Members reference each other by group id and weak leader index only. Each
//! tick the formation pass snapshots every member, rebuilds ally caches and
//! writes the velocity the enemy update then integrates.

use std::f64::consts::TAU;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::enemy::{Enemy, EnemyScaling, EnemyType};
use super::pool::{Pool, SlotRef};
use crate::tuning::EnemyBehaviorTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationType {
    V,
    Circular,
    Wave,
    Pincer,
    Convoy,
}

/// A member's place in its formation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationSlot {
    pub kind: FormationType,
    pub group_id: u32,
    /// `None` for the leader itself
    pub leader: Option<SlotRef>,
    pub index: u32,
    /// Point this member is steering to
    pub target: DVec2,
    pub orbit_angle: f64,
    pub wave_phase: f64,
}

/// Host request for a group of enemies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveSpec {
    pub enemy_type: EnemyType,
    pub count: u32,
    pub formation: Option<FormationType>,
    /// Leader (or first member) spawn point
    pub origin: DVec2,
    /// Horizontal gap between members of an unformed row
    pub spacing: f64,
    #[serde(default)]
    pub scaling: EnemyScaling,
    /// Wave number to publish on the HUD
    #[serde(default)]
    pub wave_number: Option<u32>,
}

/// Spawn offset of member `index` relative to the origin
pub fn spawn_offset(
    kind: Option<FormationType>,
    index: u32,
    count: u32,
    spacing: f64,
    b: &EnemyBehaviorTuning,
) -> DVec2 {
    let i = index as f64;
    match kind {
        Some(FormationType::V) => {
            if index == 0 {
                DVec2::ZERO
            } else {
                let (side, rank) = v_side_rank(index);
                DVec2::new(side * rank * b.v_lateral_spacing, -rank * b.v_depth_spacing)
            }
        }
        Some(FormationType::Circular) => {
            if index == 0 {
                DVec2::ZERO
            } else {
                crate::from_polar(b.circle_radius, initial_orbit_angle(index, count))
            }
        }
        Some(FormationType::Convoy) => DVec2::new(0.0, -i * (b.convoy_min_gap + b.convoy_max_gap) * 0.5),
        Some(FormationType::Wave) | Some(FormationType::Pincer) | None => {
            let center = (count.max(1) - 1) as f64 * 0.5;
            DVec2::new((i - center) * spacing, 0.0)
        }
    }
}

pub fn initial_orbit_angle(index: u32, count: u32) -> f64 {
    let followers = count.saturating_sub(1).max(1) as f64;
    (index.saturating_sub(1)) as f64 * TAU / followers
}

/// Odd members go right, even members left; rank grows every pair
fn v_side_rank(index: u32) -> (f64, f64) {
    let side = if index % 2 == 1 { 1.0 } else { -1.0 };
    let rank = index.div_ceil(2) as f64;
    (side, rank)
}

/// Per-tick snapshot of one formation member
#[derive(Debug, Clone, Copy)]
pub struct MemberSnapshot {
    pub index: usize,
    pub pos: DVec2,
    pub slot: FormationSlot,
    /// Leader position if the leader is still alive
    pub leader_pos: Option<DVec2>,
}

/// Refresh ally caches and formation velocities for every member.
///
/// `members` is a caller-owned scratch buffer (cleared here).
pub fn update_formations(
    enemies: &mut Pool<Enemy>,
    members: &mut Vec<MemberSnapshot>,
    b: &EnemyBehaviorTuning,
) {
    members.clear();
    for (index, enemy) in enemies.iter_active() {
        if let Some(slot) = enemy.formation {
            let leader_pos = slot
                .leader
                .and_then(|leader| enemies.resolve(leader))
                .map(|leader| leader.pos);
            members.push(MemberSnapshot {
                index,
                pos: enemy.pos,
                slot,
                leader_pos,
            });
        }
    }

    let ally_range_sq = b.formation_ally_radius * b.formation_ally_radius;
    for member in members.iter() {
        let Some(enemy) = enemies.get_mut(member.index) else {
            continue;
        };
        enemy.allies.clear();
        for other in members.iter() {
            if other.index == member.index
                || other.slot.group_id != member.slot.group_id
                || other.slot.kind != member.slot.kind
            {
                continue;
            }
            if member.pos.distance_squared(other.pos) <= ally_range_sq {
                enemy.allies.push(other.index);
            }
        }

        let first_ally_pos = enemy
            .allies
            .first()
            .and_then(|ally| members.iter().find(|m| m.index == *ally))
            .map(|m| m.pos);
        let mut slot = member.slot;
        enemy.vel = formation_velocity(&mut slot, member, first_ally_pos, enemy.speed, b);
        enemy.formation = Some(slot);
    }
}

fn formation_velocity(
    slot: &mut FormationSlot,
    member: &MemberSnapshot,
    first_ally: Option<DVec2>,
    speed: f64,
    b: &EnemyBehaviorTuning,
) -> DVec2 {
    let descend = DVec2::new(0.0, speed);
    match slot.kind {
        FormationType::Wave => {
            slot.wave_phase += b.wave_step;
            DVec2::new(slot.wave_phase.sin() * b.wave_amplitude, speed)
        }
        FormationType::Pincer => {
            let side = if slot.index % 2 == 1 { 1.0 } else { -1.0 };
            DVec2::new(side * b.pincer_spread * speed, b.pincer_descent * speed)
        }
        FormationType::V => {
            // A member whose leader died leads its own remnant
            let Some(leader) = member.leader_pos else {
                return descend;
            };
            let (side, rank) = v_side_rank(slot.index);
            slot.target = leader
                + DVec2::new(side * rank * b.v_lateral_spacing, -rank * b.v_depth_spacing);
            let steer = (slot.target - member.pos) * b.v_steer_gain;
            let bias = DVec2::new(side * b.v_lateral_bias, 0.0);
            (descend + steer + bias).clamp_length_max(speed * 2.0)
        }
        FormationType::Circular => {
            let Some(leader) = member.leader_pos else {
                return descend;
            };
            slot.orbit_angle = (slot.orbit_angle + b.circle_step) % TAU;
            // Orbit target rides along with the descending leader
            slot.target = leader + descend + crate::from_polar(b.circle_radius, slot.orbit_angle);
            (slot.target - member.pos).clamp_length_max(speed * 2.0 + b.circle_radius * b.circle_step)
        }
        FormationType::Convoy => {
            if member.leader_pos.is_none() {
                return descend;
            }
            let Some(ally) = first_ally else {
                return descend;
            };
            slot.target = ally;
            let to_ally = ally - member.pos;
            let gap = to_ally.length();
            let dir = to_ally.normalize_or_zero();
            if gap > b.convoy_max_gap {
                dir * speed * 1.5
            } else if gap < b.convoy_min_gap {
                -dir * speed * 0.5
            } else {
                descend
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn spawn_group(
        enemies: &mut Pool<Enemy>,
        tuning: &Tuning,
        kind: FormationType,
        count: u32,
    ) -> Vec<usize> {
        let b = &tuning.enemy_behavior;
        let origin = DVec2::new(400.0, 100.0);
        let mut leader = None;
        let mut ids = Vec::new();
        for i in 0..count {
            let (idx, e) = enemies.acquire();
            e.configure(
                EnemyType::Drone,
                &tuning.enemy_stats(EnemyType::Drone),
                origin + spawn_offset(Some(kind), i, count, 40.0, b),
                &EnemyScaling::default(),
            );
            e.formation = Some(FormationSlot {
                kind,
                group_id: 7,
                leader,
                index: i,
                target: e.pos,
                orbit_angle: initial_orbit_angle(i, count),
                wave_phase: 0.0,
            });
            if i == 0 {
                leader = enemies.slot_ref(idx);
            }
            ids.push(idx);
        }
        ids
    }

    #[test]
    fn test_allies_rebuilt_within_range() {
        let tuning = Tuning::default();
        let mut enemies = Pool::new();
        let ids = spawn_group(&mut enemies, &tuning, FormationType::Wave, 3);
        // Move the last member far away
        enemies.get_mut(ids[2]).unwrap().pos.x += 1000.0;
        let mut scratch = Vec::new();
        update_formations(&mut enemies, &mut scratch, &tuning.enemy_behavior);
        assert_eq!(enemies.get(ids[0]).unwrap().allies, vec![ids[1]]);
        assert!(enemies.get(ids[2]).unwrap().allies.is_empty());
    }

    #[test]
    fn test_wave_members_share_phase() {
        let tuning = Tuning::default();
        let mut enemies = Pool::new();
        let ids = spawn_group(&mut enemies, &tuning, FormationType::Wave, 4);
        let mut scratch = Vec::new();
        update_formations(&mut enemies, &mut scratch, &tuning.enemy_behavior);
        let expected = (0.03f64).sin() * 2.5;
        for id in ids {
            let e = enemies.get(id).unwrap();
            assert!((e.vel.x - expected).abs() < 1e-12);
            assert_eq!(e.vel.y, e.speed);
        }
    }

    #[test]
    fn test_pincer_sides() {
        let tuning = Tuning::default();
        let mut enemies = Pool::new();
        let ids = spawn_group(&mut enemies, &tuning, FormationType::Pincer, 2);
        let mut scratch = Vec::new();
        update_formations(&mut enemies, &mut scratch, &tuning.enemy_behavior);
        assert!(enemies.get(ids[0]).unwrap().vel.x < 0.0);
        assert!(enemies.get(ids[1]).unwrap().vel.x > 0.0);
        let e = enemies.get(ids[1]).unwrap();
        assert!((e.vel.y - 0.8 * e.speed).abs() < 1e-12);
    }

    #[test]
    fn test_circular_orbit_advances() {
        let tuning = Tuning::default();
        let mut enemies = Pool::new();
        let ids = spawn_group(&mut enemies, &tuning, FormationType::Circular, 3);
        let before = enemies.get(ids[1]).unwrap().formation.unwrap().orbit_angle;
        let mut scratch = Vec::new();
        update_formations(&mut enemies, &mut scratch, &tuning.enemy_behavior);
        let after = enemies.get(ids[1]).unwrap().formation.unwrap().orbit_angle;
        assert!((after - before - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_orphaned_v_member_descends() {
        let tuning = Tuning::default();
        let mut enemies = Pool::new();
        let ids = spawn_group(&mut enemies, &tuning, FormationType::V, 3);
        enemies.release(ids[0]);
        let mut scratch = Vec::new();
        update_formations(&mut enemies, &mut scratch, &tuning.enemy_behavior);
        let e = enemies.get(ids[1]).unwrap();
        assert_eq!(e.vel, DVec2::new(0.0, e.speed));
    }

    #[test]
    fn test_convoy_keeps_standoff() {
        let tuning = Tuning::default();
        let mut enemies = Pool::new();
        let ids = spawn_group(&mut enemies, &tuning, FormationType::Convoy, 2);
        // Follower too close to the leader backs off
        enemies.get_mut(ids[1]).unwrap().pos = DVec2::new(400.0, 80.0);
        let mut scratch = Vec::new();
        update_formations(&mut enemies, &mut scratch, &tuning.enemy_behavior);
        assert!(enemies.get(ids[1]).unwrap().vel.y < 0.0);
        // Too far: closes the gap
        enemies.get_mut(ids[1]).unwrap().pos = DVec2::new(400.0, -20.0);
        update_formations(&mut enemies, &mut scratch, &tuning.enemy_behavior);
        assert!(enemies.get(ids[1]).unwrap().vel.y > 0.0);
    }

    #[test]
    fn test_v_spawn_offsets_alternate_sides() {
        let b = EnemyBehaviorTuning::default();
        let first = spawn_offset(Some(FormationType::V), 1, 5, 40.0, &b);
        let second = spawn_offset(Some(FormationType::V), 2, 5, 40.0, &b);
        assert!(first.x > 0.0 && second.x < 0.0);
        assert_eq!(first.y, second.y);
    }
}
