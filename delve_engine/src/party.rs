//! Party and enemy construction from content templates.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use delve_data::{EncounterDef, EnemyDef};
use log::info;

use crate::config::PartyMember;
use crate::content::ContentRepository;
use crate::entity::{Entity, EntityKind, SpellSlots};

/// Build a player from a class and a race template.
///
/// Race bonuses stack on the class base values; hit points never drop below 1.
///
/// # Errors
/// Returns an error if the class or race id is unknown.
pub fn build_player(
    content: &dyn ContentRepository,
    entity_id: &str,
    name: &str,
    class_id: &str,
    race_id: &str,
) -> Result<Entity> {
    let class = content
        .class(class_id)
        .ok_or_else(|| anyhow!("unknown class '{class_id}' for {name}"))?;
    let race = content
        .race(race_id)
        .ok_or_else(|| anyhow!("unknown race '{race_id}' for {name}"))?;

    let max_hp = i64::from(class.starting_hp) + i64::from(race.hp_bonus);
    let max_hp = u32::try_from(max_hp.max(1)).unwrap_or(u32::MAX);
    let mut player = Entity::new(entity_id, name, EntityKind::Player, max_hp, class.base_ac + race.ac_bonus);
    player.race.clone_from(&race.id);
    player.class.clone_from(&class.id);
    player.attack_modifier = class.attack_modifier;
    player.known_attacks.clone_from(&class.attacks);
    player.known_spells.clone_from(&class.spells);
    player.spell_slots = SpellSlots::full(class.spell_slots);
    info!("built {} the {} {} ({max_hp} hp)", player.name, race.name, class.name);
    Ok(player)
}

/// Build the configured party, numbering players `player_1`, `player_2`, ...
///
/// # Errors
/// Returns an error if the party is empty or a member names an unknown class or race.
pub fn build_party(content: &dyn ContentRepository, members: &[PartyMember]) -> Result<Vec<Entity>> {
    if members.is_empty() {
        return Err(anyhow!("the party needs at least one member"));
    }
    members
        .iter()
        .enumerate()
        .map(|(i, m)| {
            build_player(content, &format!("player_{}", i + 1), &m.name, &m.class, &m.race)
                .with_context(|| format!("while building party member {}", i + 1))
        })
        .collect()
}

/// Instantiate an enemy template.
pub fn build_enemy(template: &EnemyDef, instance_id: &str, name: &str) -> Entity {
    let mut enemy = Entity::new(instance_id, name, EntityKind::Enemy, template.hp, template.ac);
    enemy.race.clone_from(&template.race);
    enemy.class.clone_from(&template.class);
    enemy.attack_modifier = template.attack_modifier;
    enemy.known_attacks.clone_from(&template.attacks);
    enemy.known_spells.clone_from(&template.spells);
    enemy.spell_slots = SpellSlots {
        current: template.spell_slots.current.min(template.spell_slots.max),
        max: template.spell_slots.max,
    };
    enemy
}

/// Instantiate every enemy of an encounter.
///
/// Instances are numbered per template (`ghoul_1`, `ghoul_2`); when a template appears more
/// than once its display names are numbered too, so players can tell them apart.
///
/// # Errors
/// Returns an error if the encounter names an unknown enemy template.
pub fn build_encounter_enemies(content: &dyn ContentRepository, encounter: &EncounterDef) -> Result<Vec<Entity>> {
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for id in &encounter.enemies {
        *totals.entry(id.as_str()).or_default() += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut enemies = Vec::with_capacity(encounter.enemies.len());
    for id in &encounter.enemies {
        let template = content
            .enemy(id)
            .ok_or_else(|| anyhow!("encounter '{}' references unknown enemy '{id}'", encounter.id))?;
        let n = seen.entry(id.as_str()).or_default();
        *n += 1;
        let name = if totals.get(id.as_str()).copied().unwrap_or_default() > 1 {
            format!("{} {n}", template.name)
        } else {
            template.name.clone()
        };
        enemies.push(build_enemy(template, &format!("{id}_{n}"), &name));
    }
    Ok(enemies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn race_bonuses_stack_on_class() -> Result<()> {
        let content = fixtures::content();
        let dwarf = build_player(&content, "player_1", "Brannoc", "fighter", "dwarf")?;
        assert_eq!((dwarf.max_hp, dwarf.hp, dwarf.ac), (22, 22, 16));
        assert_eq!(dwarf.known_attacks, vec!["longsword".to_string()]);

        let wizard = build_player(&content, "player_2", "Ilsa", "wizard", "human")?;
        assert_eq!(wizard.spell_slots, SpellSlots::full(2));
        assert!(wizard.knows_spell("flame_wave"));
        Ok(())
    }

    #[test]
    fn unknown_templates_are_errors() {
        let content = fixtures::content();
        assert!(build_player(&content, "p", "P", "bard", "human").is_err());
        let members = [PartyMember {
            name: "P".into(),
            class: "fighter".into(),
            race: "elf".into(),
        }];
        let err = build_party(&content, &members).unwrap_err();
        assert!(format!("{err:#}").contains("elf"));
        assert!(build_party(&content, &[]).is_err());
    }

    #[test]
    fn encounter_enemies_get_numbered_ids_and_names() -> Result<()> {
        let content = fixtures::content();
        let ghouls = content.encounter("ghouls").unwrap();
        let enemies = build_encounter_enemies(&content, ghouls)?;
        let ids: Vec<_> = enemies.iter().map(|e| e.entity_id.as_str()).collect();
        let names: Vec<_> = enemies.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(ids, ["ghoul_1", "ghoul_2"]);
        assert_eq!(names, ["Ghoul 1", "Ghoul 2"]);
        assert!(enemies.iter().all(|e| e.kind == EntityKind::Enemy && e.hp == 12));

        let rats = build_encounter_enemies(&content, content.encounter("rats").unwrap())?;
        assert_eq!(rats[0].name, "Giant Rat");
        Ok(())
    }
}
