//! Shared content and party builders for unit tests.

use std::collections::BTreeMap;

use delve_data::{
    AttackDef, ClassDef, ContentDef, DungeonDef, EncounterDef, EnemyDef, RaceDef, RoomDef, SpellCategory, SpellDef,
    SpellSlotsDef, StatusEffectDef, StatusKind, TargetRule,
};

use crate::content::Content;
use crate::encounter::EncounterState;
use crate::entity::{Entity, EntityKind, SpellSlots};
use crate::world::GlobalGameState;

fn room(name: &str, connections: &[&str], rest_allowed: bool, encounter_id: Option<&str>) -> RoomDef {
    RoomDef {
        name: name.to_string(),
        description: format!("You stand in the {}.", name.to_lowercase()),
        connections: connections.iter().map(ToString::to_string).collect(),
        rest_allowed,
        encounter_id: encounter_id.map(ToString::to_string),
    }
}

fn attack(id: &str, name: &str, damage: &str, to_hit: i32, status: Option<StatusEffectDef>) -> AttackDef {
    AttackDef {
        id: id.into(),
        name: name.into(),
        damage: damage.into(),
        to_hit_modifier: to_hit,
        status_effect: status,
    }
}

fn spell(id: &str, name: &str, category: SpellCategory, target: TargetRule) -> SpellDef {
    SpellDef {
        id: id.into(),
        name: name.into(),
        category,
        target,
        damage: None,
        heal: None,
        status_effect: None,
        cost: 1,
    }
}

pub fn status(kind: StatusKind, duration: i32, magnitude: i32) -> StatusEffectDef {
    StatusEffectDef {
        kind,
        duration,
        magnitude,
    }
}

pub fn content_def() -> ContentDef {
    let mut rooms = BTreeMap::new();
    rooms.insert("gate".to_string(), room("Crypt Gate", &["hall"], true, None));
    rooms.insert(
        "hall".to_string(),
        room("Great Hall", &["gate", "armory", "sanctum"], false, Some("ghouls")),
    );
    rooms.insert("armory".to_string(), room("Armory", &["hall"], true, Some("rats")));
    rooms.insert("sanctum".to_string(), room("Inner Sanctum", &["hall"], false, None));

    let mut firebolt = spell("firebolt", "Fire Bolt", SpellCategory::Damage, TargetRule::Enemy);
    firebolt.damage = Some("1d10".into());
    let mut flame_wave = spell("flame_wave", "Flame Wave", SpellCategory::Damage, TargetRule::Enemies);
    flame_wave.damage = Some("2d6".into());
    let mut healing_word = spell("healing_word", "Healing Word", SpellCategory::Heal, TargetRule::Ally);
    healing_word.heal = Some("1d4+2".into());
    let mut shield = spell("shield_of_faith", "Shield of Faith", SpellCategory::Status, TargetRule::Caster);
    shield.status_effect = Some(status(StatusKind::Fortified, 2, 2));
    let mut hex = spell("hex", "Hex", SpellCategory::Status, TargetRule::Enemy);
    hex.status_effect = Some(status(StatusKind::Weakened, 2, 2));
    let mut rally = spell("rally", "Rally", SpellCategory::Heal, TargetRule::Allies);
    rally.heal = Some("1d4".into());

    ContentDef {
        dungeons: vec![DungeonDef {
            id: "crypt".into(),
            name: "The Crypt".into(),
            description: String::new(),
            start_room: "gate".into(),
            exit_room: "sanctum".into(),
            rooms,
        }],
        encounters: vec![
            EncounterDef {
                id: "ghouls".into(),
                name: "Ghoul Pack".into(),
                enemies: vec!["ghoul".into(), "ghoul".into()],
                reward: 50,
            },
            EncounterDef {
                id: "rats".into(),
                name: "Rat Nest".into(),
                enemies: vec!["rat".into()],
                reward: 10,
            },
        ],
        spells: vec![firebolt, flame_wave, healing_word, shield, hex, rally],
        attacks: vec![
            attack("longsword", "Longsword", "1d8", 1, None),
            attack(
                "dagger",
                "Poisoned Dagger",
                "1d4",
                0,
                Some(status(StatusKind::Poisoned, 2, 2)),
            ),
            attack("claw", "Claw", "1d6", 0, None),
            attack("bite", "Bite", "1d4", 0, None),
        ],
        enemies: vec![
            EnemyDef {
                id: "ghoul".into(),
                name: "Ghoul".into(),
                race: "undead".into(),
                class: "brute".into(),
                hp: 12,
                ac: 11,
                attack_modifier: 2,
                attacks: vec!["claw".into()],
                spells: Vec::new(),
                spell_slots: SpellSlotsDef::default(),
            },
            EnemyDef {
                id: "rat".into(),
                name: "Giant Rat".into(),
                race: "beast".into(),
                class: String::new(),
                hp: 4,
                ac: 10,
                attack_modifier: 0,
                attacks: vec!["bite".into()],
                spells: Vec::new(),
                spell_slots: SpellSlotsDef::default(),
            },
        ],
        classes: vec![
            ClassDef {
                id: "fighter".into(),
                name: "Fighter".into(),
                starting_hp: 20,
                base_ac: 15,
                attack_modifier: 3,
                attacks: vec!["longsword".into()],
                spells: Vec::new(),
                spell_slots: 0,
            },
            ClassDef {
                id: "wizard".into(),
                name: "Wizard".into(),
                starting_hp: 10,
                base_ac: 11,
                attack_modifier: 1,
                attacks: vec!["dagger".into()],
                spells: vec!["firebolt".into(), "flame_wave".into(), "shield_of_faith".into()],
                spell_slots: 2,
            },
        ],
        races: vec![
            RaceDef {
                id: "human".into(),
                name: "Human".into(),
                hp_bonus: 1,
                ac_bonus: 0,
            },
            RaceDef {
                id: "dwarf".into(),
                name: "Dwarf".into(),
                hp_bonus: 2,
                ac_bonus: 1,
            },
        ],
    }
}

pub fn content() -> Content {
    Content::new(content_def())
}

pub fn fighter(id: &str, name: &str) -> Entity {
    let mut e = Entity::new(id, name, EntityKind::Player, 20, 15);
    e.race = "human".into();
    e.class = "fighter".into();
    e.attack_modifier = 3;
    e.known_attacks = vec!["longsword".into()];
    e
}

pub fn wizard(id: &str, name: &str) -> Entity {
    let mut e = Entity::new(id, name, EntityKind::Player, 10, 11);
    e.race = "human".into();
    e.class = "wizard".into();
    e.attack_modifier = 1;
    e.known_attacks = vec!["dagger".into()];
    e.known_spells = vec!["firebolt".into(), "flame_wave".into(), "shield_of_faith".into()];
    e.spell_slots = SpellSlots::full(2);
    e
}

pub fn ghoul(id: &str, name: &str) -> Entity {
    let mut e = Entity::new(id, name, EntityKind::Enemy, 12, 11);
    e.race = "undead".into();
    e.attack_modifier = 2;
    e.known_attacks = vec!["claw".into()];
    e
}

/// Exploration state in the crypt with the given party, standing at the gate.
pub fn exploring(players: Vec<Entity>) -> GlobalGameState {
    let def = content_def();
    GlobalGameState::new_run(&def.dungeons[0], players)
}

/// A live encounter in the great hall; initiative is players first, then enemies.
pub fn fighting(players: Vec<Entity>, enemies: Vec<Entity>) -> (GlobalGameState, EncounterState) {
    let mut global = exploring(players);
    global.enter_room("hall");
    let order = global
        .roster
        .players()
        .map(|p| p.entity_id.clone())
        .chain(enemies.iter().map(|e| e.entity_id.clone()))
        .collect();
    let encounter = global.begin_encounter("ghouls", enemies, order);
    (global, encounter)
}
