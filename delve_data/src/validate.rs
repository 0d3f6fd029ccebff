use std::collections::HashSet;
use std::fmt;

use crate::dice::DiceNotation;
use crate::*;

/// Validation error for malformed or missing references in a `ContentDef`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateId { kind: &'static str, id: String },
    MissingReference { kind: &'static str, id: String, context: String },
    InvalidDice { notation: String, context: String },
    InvalidValue { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateId { kind, id } => {
                write!(f, "duplicate {kind} id '{id}'")
            },
            ValidationError::MissingReference { kind, id, context } => {
                write!(f, "missing {kind} '{id}' ({context})")
            },
            ValidationError::InvalidDice { notation, context } => {
                write!(f, "invalid dice notation '{notation}' ({context})")
            },
            ValidationError::InvalidValue { context } => {
                write!(f, "invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate cross-references, dice notation and basic invariants in a `ContentDef`.
///
/// ```
/// use delve_data::{ContentDef, DungeonDef, RoomDef, validate_content};
///
/// let content = ContentDef {
///     dungeons: vec![DungeonDef {
///         id: "crypt".into(),
///         name: "Crypt".into(),
///         description: String::new(),
///         start_room: "gate".into(),
///         exit_room: "gate".into(),
///         rooms: [("gate".to_string(), RoomDef { name: "Gate".into(), ..RoomDef::default() })].into(),
///     }],
///     ..ContentDef::default()
/// };
/// assert!(validate_content(&content).is_empty());
/// ```
pub fn validate_content(content: &ContentDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut dungeons = HashSet::new();
    let mut encounters = HashSet::new();
    let mut spells = HashSet::new();
    let mut attacks = HashSet::new();
    let mut enemies = HashSet::new();
    let mut classes = HashSet::new();
    let mut races = HashSet::new();

    track_ids(
        "dungeon",
        content.dungeons.iter().map(|d| d.id.as_str()),
        &mut dungeons,
        &mut errors,
    );
    track_ids(
        "encounter",
        content.encounters.iter().map(|e| e.id.as_str()),
        &mut encounters,
        &mut errors,
    );
    track_ids("spell", content.spells.iter().map(|s| s.id.as_str()), &mut spells, &mut errors);
    track_ids(
        "attack",
        content.attacks.iter().map(|a| a.id.as_str()),
        &mut attacks,
        &mut errors,
    );
    track_ids("enemy", content.enemies.iter().map(|e| e.id.as_str()), &mut enemies, &mut errors);
    track_ids("class", content.classes.iter().map(|c| c.id.as_str()), &mut classes, &mut errors);
    track_ids("race", content.races.iter().map(|r| r.id.as_str()), &mut races, &mut errors);

    for dungeon in &content.dungeons {
        validate_dungeon(dungeon, &encounters, &mut errors);
    }

    for encounter in &content.encounters {
        if encounter.enemies.is_empty() {
            errors.push(ValidationError::InvalidValue {
                context: format!("encounter '{}' has no enemies", encounter.id),
            });
        }
        for enemy in &encounter.enemies {
            check_ref(
                "enemy",
                enemy,
                &enemies,
                format!("encounter '{}'", encounter.id),
                &mut errors,
            );
        }
    }

    for attack in &content.attacks {
        check_dice(&attack.damage, format!("attack '{}' damage", attack.id), &mut errors);
    }

    for spell in &content.spells {
        validate_spell(spell, &mut errors);
    }

    for enemy in &content.enemies {
        if enemy.hp == 0 {
            errors.push(ValidationError::InvalidValue {
                context: format!("enemy '{}' has zero hp", enemy.id),
            });
        }
        let context = format!("enemy '{}'", enemy.id);
        check_refs("attack", &enemy.attacks, &attacks, &context, &mut errors);
        check_refs("spell", &enemy.spells, &spells, &context, &mut errors);
    }

    for class in &content.classes {
        if class.starting_hp == 0 {
            errors.push(ValidationError::InvalidValue {
                context: format!("class '{}' has zero starting hp", class.id),
            });
        }
        let context = format!("class '{}'", class.id);
        check_refs("attack", &class.attacks, &attacks, &context, &mut errors);
        check_refs("spell", &class.spells, &spells, &context, &mut errors);
    }

    errors
}

fn validate_dungeon(dungeon: &DungeonDef, encounters: &HashSet<String>, errors: &mut Vec<ValidationError>) {
    let context = format!("dungeon '{}'", dungeon.id);
    if dungeon.rooms.is_empty() {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context} has no rooms"),
        });
    }
    if !dungeon.rooms.contains_key(&dungeon.start_room) {
        errors.push(ValidationError::MissingReference {
            kind: "room",
            id: dungeon.start_room.clone(),
            context: format!("{context} start room"),
        });
    }
    if !dungeon.rooms.contains_key(&dungeon.exit_room) {
        errors.push(ValidationError::MissingReference {
            kind: "room",
            id: dungeon.exit_room.clone(),
            context: format!("{context} exit room"),
        });
    }
    for (room_id, room) in &dungeon.rooms {
        for connection in &room.connections {
            if !dungeon.rooms.contains_key(connection) {
                errors.push(ValidationError::MissingReference {
                    kind: "room",
                    id: connection.clone(),
                    context: format!("{context} room '{room_id}' connection"),
                });
            }
        }
        if let Some(encounter_id) = &room.encounter_id {
            check_ref(
                "encounter",
                encounter_id,
                encounters,
                format!("{context} room '{room_id}'"),
                errors,
            );
        }
    }
}

fn validate_spell(spell: &SpellDef, errors: &mut Vec<ValidationError>) {
    let context = format!("spell '{}'", spell.id);
    match spell.category {
        SpellCategory::Damage => match &spell.damage {
            Some(dice) => check_dice(dice, format!("{context} damage"), errors),
            None => errors.push(ValidationError::InvalidValue {
                context: format!("{context} is a damage spell without damage dice"),
            }),
        },
        SpellCategory::Heal => match &spell.heal {
            Some(dice) => check_dice(dice, format!("{context} heal"), errors),
            None => errors.push(ValidationError::InvalidValue {
                context: format!("{context} is a heal spell without heal dice"),
            }),
        },
        SpellCategory::Status => {
            if spell.status_effect.is_none() {
                errors.push(ValidationError::InvalidValue {
                    context: format!("{context} is a status spell without a status effect"),
                });
            }
        },
        SpellCategory::Unknown => errors.push(ValidationError::InvalidValue {
            context: format!("{context} has an unknown category"),
        }),
    }
}

fn track_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
    set: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
) {
    for id in ids {
        if !set.insert(id.to_string()) {
            errors.push(ValidationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
}

fn check_ref(kind: &'static str, id: &str, set: &HashSet<String>, context: String, errors: &mut Vec<ValidationError>) {
    if !set.contains(id) {
        errors.push(ValidationError::MissingReference {
            kind,
            id: id.to_string(),
            context,
        });
    }
}

fn check_refs(
    kind: &'static str,
    ids: &[Id],
    set: &HashSet<String>,
    context: &str,
    errors: &mut Vec<ValidationError>,
) {
    for id in ids {
        check_ref(kind, id, set, context.to_string(), errors);
    }
}

fn check_dice(dice: &DiceNotation, context: String, errors: &mut Vec<ValidationError>) {
    if dice.parse().is_err() {
        errors.push(ValidationError::InvalidDice {
            notation: dice.as_str().to_string(),
            context,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn room(name: &str, connections: &[&str]) -> RoomDef {
        RoomDef {
            name: name.to_string(),
            description: String::new(),
            connections: connections.iter().map(ToString::to_string).collect(),
            rest_allowed: false,
            encounter_id: None,
        }
    }

    fn base_content() -> ContentDef {
        let mut rooms = BTreeMap::new();
        rooms.insert("gate".to_string(), room("Gate", &["hall"]));
        rooms.insert("hall".to_string(), room("Hall", &["gate"]));
        ContentDef {
            dungeons: vec![DungeonDef {
                id: "crypt".into(),
                name: "Crypt".into(),
                description: String::new(),
                start_room: "gate".into(),
                exit_room: "hall".into(),
                rooms,
            }],
            attacks: vec![AttackDef {
                id: "bite".into(),
                name: "Bite".into(),
                damage: "1d4".into(),
                to_hit_modifier: 0,
                status_effect: None,
            }],
            ..ContentDef::default()
        }
    }

    #[test]
    fn clean_content_has_no_errors() {
        assert!(validate_content(&base_content()).is_empty());
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let mut content = base_content();
        let dup = content.attacks[0].clone();
        content.attacks.push(dup);

        let errors = validate_content(&content);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::DuplicateId { kind, id } if *kind == "attack" && id == "bite"))
        );
    }

    #[test]
    fn dangling_connections_and_encounters_are_reported() {
        let mut content = base_content();
        let dungeon = &mut content.dungeons[0];
        dungeon.rooms.insert("pit".into(), room("Pit", &["nowhere"]));
        dungeon.rooms.get_mut("hall").unwrap().encounter_id = Some("ghouls".into());

        let errors = validate_content(&content);
        assert!(errors.iter().any(
            |err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "room" && id == "nowhere")
        ));
        assert!(errors.iter().any(
            |err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "encounter" && id == "ghouls")
        ));
    }

    #[test]
    fn invalid_attack_dice_is_reported() {
        let mut content = base_content();
        content.attacks[0].damage = "1d".into();

        let errors = validate_content(&content);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ValidationError::InvalidDice { notation, .. } if notation == "1d"));
    }

    #[test]
    fn spells_missing_their_payload_are_reported() {
        let mut content = base_content();
        content.spells.push(SpellDef {
            id: "hex".into(),
            name: "Hex".into(),
            category: SpellCategory::Status,
            target: TargetRule::Enemy,
            damage: None,
            heal: None,
            status_effect: None,
            cost: 1,
        });

        let errors = validate_content(&content);
        assert!(errors.iter().any(|err| err.to_string().contains("status spell")));
    }
}
