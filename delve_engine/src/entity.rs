//! Entity Module
//!
//! Players and enemies share one combatant type. An entity at 0 hp is defeated but stays in the
//! roster so it can still be named in narration and excluded from targeting.

use std::fmt::Display;

use delve_data::StatusKind;
use log::info;
use serde::{Deserialize, Serialize};
use variantly::Variantly;

use crate::status::{StatusEffect, StatusTick, TriggeredEffect};

pub type EntityId = String;

/// Which side an entity fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Variantly)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Enemy,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Player => f.write_str("player"),
            EntityKind::Enemy => f.write_str("enemy"),
        }
    }
}

/// Spell slot pool. `current` never exceeds `max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlots {
    pub current: u32,
    pub max: u32,
}

impl SpellSlots {
    /// A full pool of `max` slots.
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Spend one slot. Returns `false` (and changes nothing) when the pool is empty.
    pub fn use_slot(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Restore up to `amount` slots, clamped to the maximum.
    pub fn restore(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    pub fn restore_all(&mut self) {
        self.current = self.max;
    }
}

/// A player or enemy combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub race: String,
    pub class: String,
    pub hp: u32,
    pub max_hp: u32,
    pub ac: i32,
    pub attack_modifier: i32,
    #[serde(default)]
    pub known_attacks: Vec<String>,
    #[serde(default)]
    pub known_spells: Vec<String>,
    pub spell_slots: SpellSlots,
    #[serde(default)]
    pub status_effects: Vec<StatusEffect>,
}

impl Entity {
    /// Create an entity at full health with no attacks, spells or effects.
    pub fn new(entity_id: impl Into<EntityId>, name: impl Into<String>, kind: EntityKind, max_hp: u32, ac: i32) -> Self {
        Self {
            entity_id: entity_id.into(),
            name: name.into(),
            kind,
            race: String::new(),
            class: String::new(),
            hp: max_hp,
            max_hp,
            ac,
            attack_modifier: 0,
            known_attacks: Vec::new(),
            known_spells: Vec::new(),
            spell_slots: SpellSlots::default(),
            status_effects: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_player(&self) -> bool {
        self.kind.is_player()
    }

    /// Deal damage. Saturates at zero and returns the hp actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let applied = amount.min(self.hp);
        self.hp -= applied;
        applied
    }

    /// Heal. Saturates at `max_hp` and returns the hp actually gained.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let applied = amount.min(self.max_hp.saturating_sub(self.hp));
        self.hp += applied;
        applied
    }

    /// Set hp to maximum, returning the hp gained.
    pub fn restore_full_health(&mut self) -> u32 {
        self.heal(self.max_hp)
    }

    pub fn knows_attack(&self, attack_id: &str) -> bool {
        self.known_attacks.iter().any(|a| a == attack_id)
    }

    pub fn knows_spell(&self, spell_id: &str) -> bool {
        self.known_spells.iter().any(|s| s == spell_id)
    }

    /// Append an effect, even if one of the same kind is already present.
    pub fn add_status_effect(&mut self, effect: StatusEffect) {
        self.status_effects.push(effect);
    }

    /// Apply an effect, replacing any existing effects of the same kind.
    pub fn apply_status_effect(&mut self, effect: StatusEffect) {
        self.remove_status_effect(&effect.kind);
        self.add_status_effect(effect);
    }

    /// Remove every effect of `kind`. Returns `true` if anything was removed.
    pub fn remove_status_effect(&mut self, kind: &StatusKind) -> bool {
        let before = self.status_effects.len();
        self.status_effects.retain(|fx| &fx.kind != kind);
        self.status_effects.len() < before
    }

    pub fn has_status_effect(&self, kind: &StatusKind) -> bool {
        self.status_effects.iter().any(|fx| &fx.kind == kind)
    }

    /// First effect of `kind`, if any.
    pub fn status_effect(&self, kind: &StatusKind) -> Option<&StatusEffect> {
        self.status_effects.iter().find(|fx| &fx.kind == kind)
    }

    /// Tick every effect down by one turn and drop the expired ones.
    pub fn decrement_status_effects(&mut self) {
        for fx in &mut self.status_effects {
            fx.duration -= 1;
        }
        self.status_effects.retain(|fx| fx.duration > 0);
    }

    /// Armor class adjustment from fortified (+) and vulnerable (-) effects.
    pub fn ac_modifier(&self) -> i32 {
        self.sum_magnitudes(&StatusKind::Fortified) - self.sum_magnitudes(&StatusKind::Vulnerable)
    }

    pub fn effective_ac(&self) -> i32 {
        self.ac + self.ac_modifier()
    }

    /// Base attack modifier adjusted by strengthened (+) and weakened (-) effects.
    pub fn effective_attack_modifier(&self) -> i32 {
        self.attack_modifier + self.sum_magnitudes(&StatusKind::Strengthened)
            - self.sum_magnitudes(&StatusKind::Weakened)
    }

    /// Run the start-of-turn tick.
    ///
    /// Each poisoned or burned effect deals its magnitude (floored at 0, clamped to remaining hp),
    /// then all durations drop by one and effects at or below zero are removed.
    pub fn tick_start_of_turn(&mut self) -> StatusTick {
        let dot: Vec<(StatusKind, i32, i32)> = self
            .status_effects
            .iter()
            .filter(|fx| fx.kind.deals_damage_over_time())
            .map(|fx| (fx.kind.clone(), fx.magnitude, fx.duration))
            .collect();

        let mut triggered = Vec::with_capacity(dot.len());
        for (kind, magnitude, duration) in dot {
            let applied = self.take_damage(magnitude.max(0).unsigned_abs());
            info!("{} takes {applied} damage from {kind}", self.name);
            triggered.push(TriggeredEffect {
                effect_type: kind,
                damage_applied: applied,
                duration_remaining: (duration - 1).max(0),
            });
        }

        self.decrement_status_effects();
        StatusTick {
            entity_id: self.entity_id.clone(),
            triggered,
        }
    }

    fn sum_magnitudes(&self, kind: &StatusKind) -> i32 {
        self.status_effects
            .iter()
            .filter(|fx| &fx.kind == kind)
            .map(|fx| fx.magnitude)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin() -> Entity {
        Entity::new("goblin_1", "Goblin", EntityKind::Enemy, 10, 12)
    }

    #[test]
    fn take_damage_saturates_and_reports_applied() {
        let mut e = goblin();
        assert_eq!(e.take_damage(4), 4);
        assert_eq!(e.hp, 6);
        assert_eq!(e.take_damage(50), 6);
        assert_eq!(e.hp, 0);
        assert!(!e.is_alive());
        assert_eq!(e.take_damage(3), 0);
    }

    #[test]
    fn heal_saturates_at_max() {
        let mut e = goblin();
        e.take_damage(7);
        assert_eq!(e.heal(2), 2);
        assert_eq!(e.heal(100), 5);
        assert_eq!(e.hp, e.max_hp);
        e.take_damage(9);
        assert_eq!(e.restore_full_health(), 9);
    }

    #[test]
    fn applying_same_kind_replaces_instead_of_stacking() {
        let mut e = goblin();
        e.apply_status_effect(StatusEffect::new(StatusKind::Poisoned, 2, 1));
        e.apply_status_effect(StatusEffect::new(StatusKind::Stunned, 1, 1));
        e.apply_status_effect(StatusEffect::new(StatusKind::Poisoned, 5, 3));

        let poison: Vec<_> = e
            .status_effects
            .iter()
            .filter(|fx| fx.kind == StatusKind::Poisoned)
            .collect();
        assert_eq!(poison.len(), 1);
        assert_eq!((poison[0].duration, poison[0].magnitude), (5, 3));
        assert!(e.has_status_effect(&StatusKind::Stunned));
    }

    #[test]
    fn modifiers_follow_effect_magnitudes() {
        let mut e = goblin();
        e.attack_modifier = 2;
        e.apply_status_effect(StatusEffect::new(StatusKind::Fortified, 2, 3));
        e.apply_status_effect(StatusEffect::new(StatusKind::Weakened, 2, 1));
        assert_eq!(e.effective_ac(), 15);
        assert_eq!(e.effective_attack_modifier(), 1);
        assert!(e.remove_status_effect(&StatusKind::Fortified));
        assert!(!e.remove_status_effect(&StatusKind::Fortified));
        e.apply_status_effect(StatusEffect::new(StatusKind::Vulnerable, 1, 2));
        assert_eq!(e.effective_ac(), 10);
    }

    #[test]
    fn poison_ticks_twice_then_expires() {
        let mut e = goblin();
        e.apply_status_effect(StatusEffect::new(StatusKind::Poisoned, 2, 2));

        let first = e.tick_start_of_turn();
        assert_eq!(first.triggered.len(), 1);
        assert_eq!(first.triggered[0].damage_applied, 2);
        assert_eq!(first.triggered[0].duration_remaining, 1);
        assert_eq!(e.hp, 8);
        assert_eq!(e.status_effect(&StatusKind::Poisoned).map(|fx| fx.duration), Some(1));

        let second = e.tick_start_of_turn();
        assert_eq!(second.triggered[0].damage_applied, 2);
        assert_eq!(second.triggered[0].duration_remaining, 0);
        assert_eq!(e.hp, 6);
        assert!(!e.has_status_effect(&StatusKind::Poisoned));
    }

    #[test]
    fn non_damaging_effects_only_count_down() {
        let mut e = goblin();
        e.apply_status_effect(StatusEffect::new(StatusKind::Stunned, 1, 1));
        let tick = e.tick_start_of_turn();
        assert!(tick.triggered.is_empty());
        assert_eq!(e.hp, 10);
        assert!(e.status_effects.is_empty());
    }

    #[test]
    fn spell_slots_clamp() {
        let mut slots = SpellSlots::full(2);
        assert!(slots.use_slot());
        assert!(slots.use_slot());
        assert!(!slots.use_slot());
        slots.restore(5);
        assert_eq!(slots.current, 2);
        slots.current = 0;
        slots.restore_all();
        assert_eq!(slots.current, 2);
    }

    #[test]
    fn entity_serializes_with_type_tag() {
        let json = serde_json::to_value(goblin()).unwrap();
        assert_eq!(json["type"], "enemy");
        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back, goblin());

        let missing_hp = serde_json::json!({
            "entity_id": "x", "name": "X", "type": "player", "race": "", "class": "",
            "max_hp": 3, "ac": 10, "attack_modifier": 0, "spell_slots": {"current": 0, "max": 0}
        });
        assert!(serde_json::from_value::<Entity>(missing_hp).is_err());
    }
}
