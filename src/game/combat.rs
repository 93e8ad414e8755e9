//! Player-versus-player attack resolution.
//!
//! Damage is a uniform roll from the configured range and is not mitigated by
//! attributes. A defender brought to 0 hp is reset in the same resolution:
//! full hp, back to spawn, path cleared.

use log::info;
use rand::Rng;
use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::sync::Mutex;

use crate::game::player::PlayerRecord;
use crate::game::types::{Coords, NotificationEvent};

/// Source of damage rolls.
pub trait DamageRoller: Send + Sync {
    fn roll(&self, range: RangeInclusive<u32>) -> u32;
}

/// Uniform roll from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRoller;

impl DamageRoller for RandomRoller {
    fn roll(&self, range: RangeInclusive<u32>) -> u32 {
        if range.is_empty() {
            return *range.start();
        }
        rand::thread_rng().gen_range(range)
    }
}

/// Hands out pre-arranged rolls in order, ignoring the range; falls back to
/// the range start once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedRolls {
    rolls: Mutex<VecDeque<u32>>,
}

impl ScriptedRolls {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: Mutex::new(rolls.into_iter().collect()),
        }
    }

    pub fn push(&self, roll: u32) {
        self.rolls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(roll);
    }
}

impl DamageRoller for ScriptedRolls {
    fn roll(&self, range: RangeInclusive<u32>) -> u32 {
        self.rolls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(*range.start())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackOutcome {
    /// Not co-located; nothing changed.
    Rejected { reason: String },
    Hit { damage: u32, remaining_hp: u32 },
    Defeated { damage: u32 },
}

impl AttackOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, AttackOutcome::Rejected { .. })
    }

    /// Hits notify the defender only; defeats notify both sides; rejections
    /// go back to the attacker.
    pub fn notifications(
        &self,
        attacker: &PlayerRecord,
        defender: &PlayerRecord,
    ) -> Vec<NotificationEvent> {
        match self {
            AttackOutcome::Rejected { reason } => {
                vec![NotificationEvent::warning(attacker.id, reason.clone())]
            }
            AttackOutcome::Hit {
                damage,
                remaining_hp,
            } => vec![NotificationEvent::alert(
                defender.id,
                format!(
                    "{} attacked you for {} damage. HP {}/{}.",
                    attacker.display_name, damage, remaining_hp, defender.max_hp
                ),
            )],
            AttackOutcome::Defeated { damage } => vec![
                NotificationEvent::success(
                    attacker.id,
                    format!(
                        "You struck {} for {} damage and defeated them!",
                        defender.display_name, damage
                    ),
                ),
                NotificationEvent::alert(
                    defender.id,
                    format!(
                        "{} defeated you. You wake at the starting stone \
                         and must choose your path again.",
                        attacker.display_name
                    ),
                ),
            ],
        }
    }
}

/// Resolve one attack. Only the defender is mutated.
pub fn attack(
    attacker: &PlayerRecord,
    defender: &mut PlayerRecord,
    damage_range: RangeInclusive<u32>,
    roller: &dyn DamageRoller,
    spawn: Coords,
) -> AttackOutcome {
    if !attacker.is_colocated_with(defender) {
        return AttackOutcome::Rejected {
            reason: format!("{} is not here.", defender.display_name),
        };
    }

    let damage = roller.roll(damage_range);
    let remaining = defender.take_damage(damage);
    if remaining == 0 {
        defender.reset_after_defeat(spawn);
        info!(
            "player {} defeated player {} ({} damage)",
            attacker.id, defender.id, damage
        );
        AttackOutcome::Defeated { damage }
    } else {
        AttackOutcome::Hit {
            damage,
            remaining_hp: remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::Path;

    fn pair() -> (PlayerRecord, PlayerRecord) {
        let a = PlayerRecord::new(1, "A", Coords::new(30, 22), 100);
        let mut b = PlayerRecord::new(2, "B", Coords::new(30, 22), 100);
        b.path = Some(Path::Mana);
        (a, b)
    }

    #[test]
    fn hit_reduces_hp() {
        let (a, mut b) = pair();
        let rolls = ScriptedRolls::new([40]);
        let outcome = attack(&a, &mut b, 10..=25, &rolls, Coords::new(25, 25));
        assert_eq!(
            outcome,
            AttackOutcome::Hit {
                damage: 40,
                remaining_hp: 60
            }
        );
        assert_eq!(b.hp, 60);
        assert_eq!(b.position, Coords::new(30, 22));
        let notes = outcome.notifications(&a, &b);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].target_player_id, 2);
    }

    #[test]
    fn lethal_hit_resets_defender() {
        let (a, mut b) = pair();
        b.hp = 60;
        let rolls = ScriptedRolls::new([120]);
        let spawn = Coords::new(25, 25);
        let outcome = attack(&a, &mut b, 10..=25, &rolls, spawn);
        assert_eq!(outcome, AttackOutcome::Defeated { damage: 120 });
        assert_eq!(b.hp, b.max_hp);
        assert_eq!(b.position, spawn);
        assert!(b.path.is_none());
        let targets: Vec<u64> = outcome
            .notifications(&a, &b)
            .iter()
            .map(|n| n.target_player_id)
            .collect();
        assert_eq!(targets, vec![1, 2]);
    }

    #[test]
    fn distant_target_is_rejected_without_change() {
        let (a, mut b) = pair();
        b.position = Coords::new(31, 22);
        let before = b.clone();
        let rolls = ScriptedRolls::new([99]);
        let outcome = attack(&a, &mut b, 10..=25, &rolls, Coords::new(25, 25));
        assert!(outcome.is_rejected());
        assert_eq!(b, before);
    }

    #[test]
    fn random_rolls_stay_in_range() {
        let roller = RandomRoller;
        for _ in 0..200 {
            let roll = roller.roll(10..=25);
            assert!((10..=25).contains(&roll));
        }
    }
}
