use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dice::DiceNotation;
use crate::status::StatusKind;

/// Stable identifier used across content references.
pub type Id = String;

/// Top-level content bundle loaded by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentDef {
    #[serde(default)]
    pub dungeons: Vec<DungeonDef>,
    #[serde(default)]
    pub encounters: Vec<EncounterDef>,
    #[serde(default)]
    pub spells: Vec<SpellDef>,
    #[serde(default)]
    pub attacks: Vec<AttackDef>,
    #[serde(default)]
    pub enemies: Vec<EnemyDef>,
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub races: Vec<RaceDef>,
}

/// A dungeon: a graph of rooms with an entrance and an exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DungeonDef {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_room: Id,
    pub exit_room: Id,
    #[serde(default)]
    pub rooms: BTreeMap<Id, RoomDef>,
}

/// A single room inside a dungeon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub connections: Vec<Id>,
    #[serde(default)]
    pub rest_allowed: bool,
    #[serde(default)]
    pub encounter_id: Option<Id>,
}

/// A group of enemy templates fought together, and the reward for clearing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterDef {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    pub enemies: Vec<Id>,
    #[serde(default)]
    pub reward: u32,
}

/// What a spell does when it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellCategory {
    Damage,
    Heal,
    Status,
    /// Category tag the engine does not recognize.
    #[serde(other)]
    Unknown,
}

/// Who a spell may be aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetRule {
    #[serde(rename = "self")]
    Caster,
    Enemy,
    Ally,
    Enemies,
    Allies,
}

impl TargetRule {
    /// Area rules hit a whole side and never take a single target id.
    pub fn is_area(self) -> bool {
        matches!(self, TargetRule::Enemies | TargetRule::Allies)
    }
}

/// Status payload carried by attacks and spells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffectDef {
    #[serde(rename = "type")]
    pub kind: StatusKind,
    #[serde(default = "default_duration")]
    pub duration: i32,
    #[serde(default = "default_magnitude")]
    pub magnitude: i32,
}

fn default_duration() -> i32 {
    1
}

fn default_magnitude() -> i32 {
    1
}

/// Spell definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellDef {
    pub id: Id,
    pub name: String,
    pub category: SpellCategory,
    pub target: TargetRule,
    #[serde(default)]
    pub damage: Option<DiceNotation>,
    #[serde(default)]
    pub heal: Option<DiceNotation>,
    #[serde(default)]
    pub status_effect: Option<StatusEffectDef>,
    /// Listed cost for display; a cast always spends exactly one slot.
    #[serde(default = "default_spell_cost")]
    pub cost: u32,
}

fn default_spell_cost() -> u32 {
    1
}

/// Weapon or natural attack definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackDef {
    pub id: Id,
    pub name: String,
    pub damage: DiceNotation,
    #[serde(default)]
    pub to_hit_modifier: i32,
    #[serde(default)]
    pub status_effect: Option<StatusEffectDef>,
}

/// Spell slot pool declared by a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlotsDef {
    pub current: u32,
    pub max: u32,
}

/// Enemy template, instantiated once per enemy in an encounter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDef {
    pub id: Id,
    pub name: String,
    #[serde(default = "default_enemy_race")]
    pub race: String,
    #[serde(default)]
    pub class: String,
    pub hp: u32,
    pub ac: i32,
    #[serde(default)]
    pub attack_modifier: i32,
    #[serde(default)]
    pub attacks: Vec<Id>,
    #[serde(default)]
    pub spells: Vec<Id>,
    #[serde(default)]
    pub spell_slots: SpellSlotsDef,
}

fn default_enemy_race() -> String {
    "monster".to_string()
}

/// Character class template for party members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub id: Id,
    pub name: String,
    pub starting_hp: u32,
    pub base_ac: i32,
    pub attack_modifier: i32,
    #[serde(default)]
    pub attacks: Vec<Id>,
    #[serde(default)]
    pub spells: Vec<Id>,
    #[serde(default)]
    pub spell_slots: u32,
}

/// Character race template; its bonuses stack on top of the class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceDef {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub hp_bonus: i32,
    #[serde(default)]
    pub ac_bonus: i32,
}

impl DungeonDef {
    pub fn room(&self, room_id: &str) -> Option<&RoomDef> {
        self.rooms.get(room_id)
    }
}
