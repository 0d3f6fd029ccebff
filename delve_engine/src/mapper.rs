//! Action mapping
//!
//! Turns a [`ParsedIntent`] into a concrete [`Action`], filling in parameters the player left out
//! when exactly one choice makes sense, and asking for clarification otherwise. Mapping never
//! mutates state.

use delve_data::TargetRule;
use log::debug;
use thiserror::Error;

use crate::action::{Action, ActionType};
use crate::content::ContentRepository;
use crate::encounter::EncounterState;
use crate::entity::{Entity, EntityId};
use crate::intent::ParsedIntent;
use crate::world::GlobalGameState;

pub const HELP_PROMPT: &str = "I didn't understand that. Try move, attack, cast a spell, rest, explore, or end turn.";

/// Why an intent could not be mapped to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("Unknown intent.")]
    UnknownIntent,
    #[error("Actor is required to {0}.")]
    MissingActor(&'static str),
    #[error("Move target room is missing.")]
    MissingRoom,
    #[error("Attack id is missing.")]
    MissingAttack,
    #[error("Attack target is missing.")]
    MissingAttackTarget,
    #[error("Spell id is missing.")]
    MissingSpell,
    #[error("Spell target is missing.")]
    MissingSpellTarget,
}

/// Outcome of mapping an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
    Ok(Action),
    Fail(Vec<MappingError>),
    /// The player must supply more detail; `prompt` is the question to ask.
    Clarify {
        prompt: String,
        errors: Vec<MappingError>,
    },
}

impl Mapping {
    fn clarify(prompt: &str, error: MappingError) -> Self {
        Mapping::Clarify {
            prompt: prompt.to_string(),
            errors: vec![error],
        }
    }

    fn fail(error: MappingError) -> Self {
        Mapping::Fail(vec![error])
    }

    pub fn needs_clarification(&self) -> bool {
        matches!(self, Mapping::Clarify { .. })
    }

    pub fn action(&self) -> Option<&Action> {
        match self {
            Mapping::Ok(action) => Some(action),
            _ => None,
        }
    }

    pub fn into_action(self) -> Option<Action> {
        match self {
            Mapping::Ok(action) => Some(action),
            _ => None,
        }
    }

    pub fn errors(&self) -> &[MappingError] {
        match self {
            Mapping::Ok(_) => &[],
            Mapping::Fail(errors) | Mapping::Clarify { errors, .. } => errors,
        }
    }
}

/// Maps parsed intents to actions.
#[derive(Clone, Copy, Default)]
pub struct ActionMapper<'c> {
    content: Option<&'c dyn ContentRepository>,
}

impl<'c> ActionMapper<'c> {
    pub fn new(content: &'c dyn ContentRepository) -> Self {
        Self { content: Some(content) }
    }

    pub fn map_intent(
        &self,
        parsed: &ParsedIntent,
        actor: Option<&Entity>,
        global: Option<&GlobalGameState>,
        encounter: Option<&EncounterState>,
    ) -> Mapping {
        let Some(intent) = parsed.intent else {
            return Mapping::clarify(HELP_PROMPT, MappingError::UnknownIntent);
        };
        let mapping = match intent {
            ActionType::Move => self.map_move(parsed, actor, global),
            ActionType::Attack => map_attack(parsed, actor, global, encounter),
            ActionType::CastSpell => self.map_cast_spell(parsed, actor, global, encounter),
            ActionType::Rest => match actor {
                Some(actor) => Mapping::Ok(Action::rest(&actor.entity_id, parsed.rest_type.unwrap_or_default())),
                None => Mapping::fail(MappingError::MissingActor("rest")),
            },
            ActionType::EndTurn => match actor {
                Some(actor) => Mapping::Ok(Action::end_turn(&actor.entity_id)),
                None => Mapping::fail(MappingError::MissingActor("end turn")),
            },
            ActionType::Explore => match actor {
                Some(actor) => Mapping::Ok(Action::explore(&actor.entity_id)),
                None => Mapping::fail(MappingError::MissingActor("explore")),
            },
        };
        debug!("mapped '{}' ({intent}) to {mapping:?}", parsed.raw_text);
        mapping
    }

    fn map_move(&self, parsed: &ParsedIntent, actor: Option<&Entity>, global: Option<&GlobalGameState>) -> Mapping {
        let Some(actor) = actor else {
            return Mapping::fail(MappingError::MissingActor("move"));
        };
        let room_id = parsed
            .room_id()
            .map(ToString::to_string)
            .or_else(|| self.single_connection(global));
        match room_id {
            Some(room_id) => Mapping::Ok(Action::move_to(&actor.entity_id, room_id)),
            None => Mapping::clarify("Where do you want to go?", MappingError::MissingRoom),
        }
    }

    fn map_cast_spell(
        &self,
        parsed: &ParsedIntent,
        actor: Option<&Entity>,
        global: Option<&GlobalGameState>,
        encounter: Option<&EncounterState>,
    ) -> Mapping {
        let Some(actor) = actor else {
            return Mapping::fail(MappingError::MissingActor("cast a spell"));
        };
        let spell_id = parsed.spell_id().map(ToString::to_string).or_else(|| only(&actor.known_spells));
        let Some(spell_id) = spell_id else {
            return Mapping::clarify("Which spell do you want to cast?", MappingError::MissingSpell);
        };

        let rule = self.content.and_then(|c| c.spell(&spell_id)).map(|s| s.target);
        let parsed_target = parsed.target_id().map(ToString::to_string);
        let target_id = match rule {
            Some(rule) if rule.is_area() => None,
            Some(TargetRule::Caster) => Some(actor.entity_id.clone()),
            Some(TargetRule::Enemy) => parsed_target.or_else(|| single_living_enemy(global, encounter)),
            Some(TargetRule::Ally) => parsed_target.or_else(|| single_living_ally(actor, global, encounter)),
            _ => parsed_target,
        };

        if matches!(rule, Some(TargetRule::Enemy | TargetRule::Ally)) && target_id.is_none() {
            return Mapping::clarify(
                "Which target should the spell affect?",
                MappingError::MissingSpellTarget,
            );
        }
        Mapping::Ok(Action::cast_spell(&actor.entity_id, spell_id, target_id))
    }

    /// The current room's only exit, if it has exactly one.
    fn single_connection(&self, global: Option<&GlobalGameState>) -> Option<String> {
        let global = global?;
        let room = self.content?.room(&global.current_dungeon_id, &global.current_room_id)?;
        only(&room.connections)
    }
}

fn map_attack(
    parsed: &ParsedIntent,
    actor: Option<&Entity>,
    global: Option<&GlobalGameState>,
    encounter: Option<&EncounterState>,
) -> Mapping {
    let Some(actor) = actor else {
        return Mapping::fail(MappingError::MissingActor("attack"));
    };
    let attack_id = parsed.attack_id().map(ToString::to_string).or_else(|| only(&actor.known_attacks));
    let target_id = parsed
        .target_id()
        .map(ToString::to_string)
        .or_else(|| single_living_enemy(global, encounter));

    match (attack_id, target_id) {
        (None, _) => Mapping::clarify("Which attack do you want to use?", MappingError::MissingAttack),
        (Some(_), None) => Mapping::clarify(
            "Which target do you want to attack?",
            MappingError::MissingAttackTarget,
        ),
        (Some(attack_id), Some(target_id)) => Mapping::Ok(Action::attack(&actor.entity_id, target_id, attack_id)),
    }
}

fn only(ids: &[String]) -> Option<String> {
    match ids {
        [single] => Some(single.clone()),
        _ => None,
    }
}

fn single_living_enemy(global: Option<&GlobalGameState>, encounter: Option<&EncounterState>) -> Option<EntityId> {
    match encounter?.living_enemies(&global?.roster).as_slice() {
        [single] => Some(single.entity_id.clone()),
        _ => None,
    }
}

/// The only living entity on the actor's side, which may be the actor itself.
fn single_living_ally(
    actor: &Entity,
    global: Option<&GlobalGameState>,
    encounter: Option<&EncounterState>,
) -> Option<EntityId> {
    match encounter?.living_of_kind(&global?.roster, actor.kind).as_slice() {
        [single] => Some(single.entity_id.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, RestType};
    use crate::fixtures;
    use crate::intent::IntentParser;

    fn map_text(
        text: &str,
        actor_id: &str,
        global: &GlobalGameState,
        encounter: Option<&EncounterState>,
    ) -> Mapping {
        let content = fixtures::content();
        let actor = global.roster.get(actor_id);
        let parsed = IntentParser::new(&content).parse(text, actor, Some(global), encounter);
        ActionMapper::new(&content).map_intent(&parsed, actor, Some(global), encounter)
    }

    #[test]
    fn unknown_intent_asks_for_help() {
        let global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        let mapping = map_text("juggle", "hero", &global, None);
        assert_eq!(
            mapping,
            Mapping::Clarify {
                prompt: HELP_PROMPT.to_string(),
                errors: vec![MappingError::UnknownIntent],
            }
        );
    }

    #[test]
    fn attack_infers_single_enemy_and_single_attack() {
        let (global, encounter) = fixtures::fighting(
            vec![fixtures::fighter("hero", "Hero")],
            vec![fixtures::ghoul("ghoul_1", "Ghoul")],
        );
        let mapping = map_text("attack!", "hero", &global, Some(&encounter));
        assert_eq!(mapping, Mapping::Ok(Action::attack("hero", "ghoul_1", "longsword")));
    }

    #[test]
    fn attack_with_two_enemies_needs_a_target() {
        let (global, encounter) = fixtures::fighting(
            vec![fixtures::fighter("hero", "Hero")],
            vec![
                fixtures::ghoul("ghoul_1", "Pale Ghoul"),
                fixtures::ghoul("ghoul_2", "Dark Ghoul"),
            ],
        );
        let mapping = map_text("attack", "hero", &global, Some(&encounter));
        assert!(mapping.needs_clarification());
        assert_eq!(mapping.errors(), &[MappingError::MissingAttackTarget]);

        let named = map_text("attack the dark ghoul", "hero", &global, Some(&encounter));
        assert_eq!(named.action().and_then(Action::target_id), Some("ghoul_2"));
    }

    #[test]
    fn defeated_enemies_are_not_inferred() {
        let (mut global, encounter) = fixtures::fighting(
            vec![fixtures::fighter("hero", "Hero")],
            vec![
                fixtures::ghoul("ghoul_1", "Pale Ghoul"),
                fixtures::ghoul("ghoul_2", "Dark Ghoul"),
            ],
        );
        global.roster.get_mut("ghoul_1").unwrap().take_damage(100);
        let mapping = map_text("attack", "hero", &global, Some(&encounter));
        assert_eq!(mapping.action().and_then(Action::target_id), Some("ghoul_2"));
    }

    #[test]
    fn attack_without_known_attack_asks_which() {
        let mut hero = fixtures::fighter("hero", "Hero");
        hero.known_attacks.push("dagger".into());
        let (global, encounter) = fixtures::fighting(vec![hero], vec![fixtures::ghoul("ghoul_1", "Ghoul")]);
        let mapping = map_text("attack", "hero", &global, Some(&encounter));
        assert_eq!(mapping.errors(), &[MappingError::MissingAttack]);
    }

    #[test]
    fn area_spells_drop_parsed_target() {
        let (global, encounter) = fixtures::fighting(
            vec![fixtures::wizard("mage", "Mira")],
            vec![fixtures::ghoul("ghoul_1", "Ghoul")],
        );
        let content = fixtures::content();
        let actor = global.roster.get("mage");
        let mut parsed = IntentParser::new(&content).parse("cast flame wave at the ghoul", actor, Some(&global), Some(&encounter));
        assert_eq!(parsed.target_id(), Some("ghoul_1"));
        let mapping = ActionMapper::new(&content).map_intent(&parsed, actor, Some(&global), Some(&encounter));
        let action = mapping.into_action().unwrap();
        assert_eq!(action.spell_id(), Some("flame_wave"));
        assert_eq!(action.target_id(), None);

        parsed.target = None;
        let mapping = ActionMapper::new(&content).map_intent(&parsed, actor, Some(&global), Some(&encounter));
        assert_eq!(mapping.action().and_then(Action::target_id), None);
    }

    #[test]
    fn self_spells_target_the_caster() {
        let (global, encounter) = fixtures::fighting(
            vec![fixtures::wizard("mage", "Mira")],
            vec![fixtures::ghoul("ghoul_1", "Ghoul")],
        );
        let mapping = map_text("cast shield of faith on the ghoul", "mage", &global, Some(&encounter));
        assert_eq!(mapping.action().and_then(Action::target_id), Some("mage"));
    }

    #[test]
    fn enemy_spell_without_target_asks_which() {
        let (global, encounter) = fixtures::fighting(
            vec![fixtures::wizard("mage", "Mira")],
            vec![
                fixtures::ghoul("ghoul_1", "Pale Ghoul"),
                fixtures::ghoul("ghoul_2", "Dark Ghoul"),
            ],
        );
        let mapping = map_text("cast fire bolt", "mage", &global, Some(&encounter));
        assert_eq!(mapping.errors(), &[MappingError::MissingSpellTarget]);
        assert!(mapping.needs_clarification());
    }

    #[test]
    fn spell_is_required_when_several_are_known() {
        let (global, encounter) = fixtures::fighting(
            vec![fixtures::wizard("mage", "Mira")],
            vec![fixtures::ghoul("ghoul_1", "Ghoul")],
        );
        let mapping = map_text("cast a spell", "mage", &global, Some(&encounter));
        assert_eq!(mapping.errors(), &[MappingError::MissingSpell]);
    }

    #[test]
    fn rest_defaults_to_short() {
        let global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        let content = fixtures::content();
        let mut parsed = IntentParser::new(&content).parse("rest", None, None, None);
        parsed.rest_type = None;
        let actor = global.roster.get("hero");
        let mapping = ActionMapper::new(&content).map_intent(&parsed, actor, Some(&global), None);
        assert_eq!(mapping, Mapping::Ok(Action::rest("hero", RestType::Short)));
    }

    #[test]
    fn move_uses_the_only_exit() {
        let global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        let mapping = map_text("walk on", "hero", &global, None);
        assert_eq!(
            mapping.action().map(Action::kind),
            Some(&ActionKind::Move { room_id: "hall".into() })
        );
    }

    #[test]
    fn move_with_several_exits_asks_where() {
        let mut global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        global.enter_room("hall");
        let mapping = map_text("go", "hero", &global, None);
        assert_eq!(mapping.errors(), &[MappingError::MissingRoom]);
    }

    #[test]
    fn actor_is_required() {
        let content = fixtures::content();
        let parsed = IntentParser::new(&content).parse("search", None, None, None);
        let mapping = ActionMapper::new(&content).map_intent(&parsed, None, None, None);
        assert_eq!(mapping, Mapping::Fail(vec![MappingError::MissingActor("explore")]));
        assert_eq!(mapping.errors()[0].to_string(), "Actor is required to explore.");
    }
}
