//! Action validation
//!
//! Checks an [`Action`] against the current state before anything is mutated. A failed check is
//! a normal outcome the player can correct, so it is reported as a value rather than an error.

use delve_data::{StatusKind, TargetRule};
use thiserror::Error;

use crate::action::{Action, ActionKind, ActionType};
use crate::content::ContentRepository;
use crate::encounter::EncounterState;
use crate::entity::Entity;
use crate::world::{GameMode, GlobalGameState};

/// A rule the action breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("Encounter state is required during combat.")]
    MissingEncounter,
    #[error("The game is over; no further actions are possible.")]
    GameOver,
    #[error("Action '{0}' is invalid in exploration mode.")]
    InvalidInExploration(ActionType),
    #[error("Action '{0}' is invalid in encounter mode.")]
    InvalidInEncounter(ActionType),
    #[error("Actor does not exist in this encounter.")]
    UnknownActor,
    #[error("Actor is not alive and cannot act.")]
    ActorDefeated,
    #[error("It is not the actor's turn.")]
    NotActorsTurn,
    #[error("Actor is stunned and cannot act.")]
    ActorStunned,
    #[error("Current dungeon is not loaded.")]
    DungeonNotLoaded,
    #[error("Current room does not exist.")]
    CurrentRoomMissing,
    #[error("Move action requires a target room.")]
    MissingDestination,
    #[error("Target room does not exist.")]
    UnknownRoom,
    #[error("Target room is not connected to current room.")]
    RoomNotConnected,
    #[error("Rest is not allowed in this room.")]
    RestNotAllowed,
    #[error("This room has already been used for resting.")]
    AlreadyRested,
    #[error("Attack action requires an attack_id.")]
    MissingAttackId,
    #[error("Actor does not know this attack.")]
    AttackNotKnown,
    #[error("Attack definition not found.")]
    AttackNotFound,
    #[error("Attack action requires a target.")]
    MissingTarget,
    #[error("Target does not exist in this encounter.")]
    UnknownTarget,
    #[error("Target is already defeated.")]
    TargetDefeated,
    #[error("Cast spell action requires a spell_id.")]
    MissingSpellId,
    #[error("Actor does not know this spell.")]
    SpellNotKnown,
    #[error("Spell definition not found.")]
    SpellNotFound,
    #[error("No spell slots available.")]
    NoSpellSlots,
    #[error("Spell requires a single target.")]
    SpellNeedsTarget,
    #[error("AoE spell should not specify a single target.")]
    AreaSpellWithTarget,
}

/// Outcome of validating an action. Valid when there are no violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<RuleViolation>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn fail(violation: RuleViolation) -> Self {
        Self {
            errors: vec![violation],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable messages, one per violation.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

impl From<Result<(), RuleViolation>> for ValidationResult {
    fn from(result: Result<(), RuleViolation>) -> Self {
        match result {
            Ok(()) => ValidationResult::ok(),
            Err(violation) => ValidationResult::fail(violation),
        }
    }
}

/// Pure rule checks over actions.
#[derive(Clone, Copy)]
pub struct ValidationEngine<'c> {
    content: &'c dyn ContentRepository,
}

impl<'c> ValidationEngine<'c> {
    pub fn new(content: &'c dyn ContentRepository) -> Self {
        Self { content }
    }

    pub fn validate(
        &self,
        action: &Action,
        global: &GlobalGameState,
        encounter: Option<&EncounterState>,
    ) -> ValidationResult {
        let result = match global.game_mode {
            GameMode::Exploration => self.check_exploration(action, global),
            GameMode::Encounter => match encounter {
                Some(encounter) => self.check_encounter(action, global, encounter),
                None => Err(RuleViolation::MissingEncounter),
            },
            GameMode::GameOver => Err(RuleViolation::GameOver),
        };
        result.into()
    }

    fn check_exploration(&self, action: &Action, global: &GlobalGameState) -> Result<(), RuleViolation> {
        match action.kind() {
            ActionKind::Move { room_id } => self.check_move(room_id, global),
            ActionKind::Rest { .. } => self.check_rest(global),
            ActionKind::Explore => Ok(()),
            _ => Err(RuleViolation::InvalidInExploration(action.action_type())),
        }
    }

    fn check_move(&self, room_id: &str, global: &GlobalGameState) -> Result<(), RuleViolation> {
        let dungeon = self
            .content
            .dungeon(&global.current_dungeon_id)
            .ok_or(RuleViolation::DungeonNotLoaded)?;
        let current = dungeon
            .room(&global.current_room_id)
            .ok_or(RuleViolation::CurrentRoomMissing)?;
        if room_id.is_empty() {
            return Err(RuleViolation::MissingDestination);
        }
        if dungeon.room(room_id).is_none() {
            return Err(RuleViolation::UnknownRoom);
        }
        if !current.connections.iter().any(|c| c == room_id) {
            return Err(RuleViolation::RoomNotConnected);
        }
        Ok(())
    }

    fn check_rest(&self, global: &GlobalGameState) -> Result<(), RuleViolation> {
        let dungeon = self
            .content
            .dungeon(&global.current_dungeon_id)
            .ok_or(RuleViolation::DungeonNotLoaded)?;
        let current = dungeon
            .room(&global.current_room_id)
            .ok_or(RuleViolation::CurrentRoomMissing)?;
        if !current.rest_allowed {
            return Err(RuleViolation::RestNotAllowed);
        }
        if global.dungeon_state.has_rested_in(&global.current_room_id) {
            return Err(RuleViolation::AlreadyRested);
        }
        Ok(())
    }

    fn check_encounter(
        &self,
        action: &Action,
        global: &GlobalGameState,
        encounter: &EncounterState,
    ) -> Result<(), RuleViolation> {
        if !matches!(
            action.action_type(),
            ActionType::Attack | ActionType::CastSpell | ActionType::EndTurn
        ) {
            return Err(RuleViolation::InvalidInEncounter(action.action_type()));
        }

        let actor = encounter
            .entity(&global.roster, action.actor_id())
            .ok_or(RuleViolation::UnknownActor)?;
        if !actor.is_alive() {
            return Err(RuleViolation::ActorDefeated);
        }
        if encounter.active_entity_id != action.actor_id() {
            return Err(RuleViolation::NotActorsTurn);
        }
        if actor.has_status_effect(&StatusKind::Stunned) {
            return Err(RuleViolation::ActorStunned);
        }

        match action.kind() {
            ActionKind::Attack { target_id, attack_id } => {
                self.check_attack(actor, attack_id, target_id, global, encounter)
            },
            ActionKind::CastSpell { spell_id, target_id } => {
                self.check_spell(actor, spell_id, target_id.as_deref(), global, encounter)
            },
            _ => Ok(()),
        }
    }

    fn check_attack(
        &self,
        actor: &Entity,
        attack_id: &str,
        target_id: &str,
        global: &GlobalGameState,
        encounter: &EncounterState,
    ) -> Result<(), RuleViolation> {
        if attack_id.is_empty() {
            return Err(RuleViolation::MissingAttackId);
        }
        if !actor.knows_attack(attack_id) {
            return Err(RuleViolation::AttackNotKnown);
        }
        if self.content.attack(attack_id).is_none() {
            return Err(RuleViolation::AttackNotFound);
        }
        if target_id.is_empty() {
            return Err(RuleViolation::MissingTarget);
        }
        check_living_target(target_id, global, encounter)
    }

    fn check_spell(
        &self,
        actor: &Entity,
        spell_id: &str,
        target_id: Option<&str>,
        global: &GlobalGameState,
        encounter: &EncounterState,
    ) -> Result<(), RuleViolation> {
        if spell_id.is_empty() {
            return Err(RuleViolation::MissingSpellId);
        }
        if !actor.knows_spell(spell_id) {
            return Err(RuleViolation::SpellNotKnown);
        }
        let spell = self.content.spell(spell_id).ok_or(RuleViolation::SpellNotFound)?;
        if actor.spell_slots.current == 0 {
            return Err(RuleViolation::NoSpellSlots);
        }

        let target_id = target_id.filter(|id| !id.is_empty());
        match (spell.target, target_id) {
            (TargetRule::Caster | TargetRule::Enemy | TargetRule::Ally, None) => Err(RuleViolation::SpellNeedsTarget),
            (rule, Some(_)) if rule.is_area() => Err(RuleViolation::AreaSpellWithTarget),
            (_, Some(target_id)) => check_living_target(target_id, global, encounter),
            (_, None) => Ok(()),
        }
    }
}

fn check_living_target(target_id: &str, global: &GlobalGameState, encounter: &EncounterState) -> Result<(), RuleViolation> {
    let target = encounter
        .entity(&global.roster, target_id)
        .ok_or(RuleViolation::UnknownTarget)?;
    if target.is_alive() {
        Ok(())
    } else {
        Err(RuleViolation::TargetDefeated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::RestType;
    use crate::fixtures;
    use crate::status::StatusEffect;

    fn violations(action: &Action, global: &GlobalGameState, encounter: Option<&EncounterState>) -> Vec<RuleViolation> {
        let content = fixtures::content();
        ValidationEngine::new(&content).validate(action, global, encounter).errors
    }

    #[test]
    fn exploration_allows_only_move_explore_rest() {
        let global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        assert!(violations(&Action::explore("hero"), &global, None).is_empty());
        assert_eq!(
            violations(&Action::attack("hero", "ghoul", "longsword"), &global, None),
            vec![RuleViolation::InvalidInExploration(ActionType::Attack)]
        );
        assert_eq!(
            RuleViolation::InvalidInExploration(ActionType::EndTurn).to_string(),
            "Action 'end_turn' is invalid in exploration mode."
        );
    }

    #[test]
    fn move_requires_a_connected_existing_room() {
        let global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        assert!(violations(&Action::move_to("hero", "hall"), &global, None).is_empty());
        assert_eq!(
            violations(&Action::move_to("hero", "sanctum"), &global, None),
            vec![RuleViolation::RoomNotConnected]
        );
        assert_eq!(
            violations(&Action::move_to("hero", "attic"), &global, None),
            vec![RuleViolation::UnknownRoom]
        );

        let mut lost = global.clone();
        lost.current_dungeon_id = "tower".into();
        assert_eq!(
            violations(&Action::move_to("hero", "hall"), &lost, None),
            vec![RuleViolation::DungeonNotLoaded]
        );
    }

    #[test]
    fn rest_is_once_per_room_and_only_where_allowed() {
        let mut global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        let rest = Action::rest("hero", RestType::Short);
        assert!(violations(&rest, &global, None).is_empty());
        global.dungeon_state.mark_rested("gate");
        assert_eq!(violations(&rest, &global, None), vec![RuleViolation::AlreadyRested]);

        global.enter_room("hall");
        assert_eq!(violations(&rest, &global, None), vec![RuleViolation::RestNotAllowed]);
    }

    #[test]
    fn encounter_mode_needs_encounter_state() {
        let (global, _) = fixtures::fighting(
            vec![fixtures::fighter("hero", "Hero")],
            vec![fixtures::ghoul("ghoul_1", "Ghoul")],
        );
        assert_eq!(
            violations(&Action::end_turn("hero"), &global, None),
            vec![RuleViolation::MissingEncounter]
        );
    }

    #[test]
    fn turn_ownership_aliveness_and_stun() {
        let (mut global, encounter) = fixtures::fighting(
            vec![fixtures::fighter("hero", "Hero"), fixtures::wizard("mage", "Mira")],
            vec![fixtures::ghoul("ghoul_1", "Ghoul")],
        );
        assert!(violations(&Action::end_turn("hero"), &global, Some(&encounter)).is_empty());
        assert_eq!(
            violations(&Action::end_turn("mage"), &global, Some(&encounter)),
            vec![RuleViolation::NotActorsTurn]
        );
        assert_eq!(
            violations(&Action::end_turn("stranger"), &global, Some(&encounter)),
            vec![RuleViolation::UnknownActor]
        );
        assert_eq!(
            violations(&Action::explore("hero"), &global, Some(&encounter)),
            vec![RuleViolation::InvalidInEncounter(ActionType::Explore)]
        );

        global
            .roster
            .get_mut("hero")
            .unwrap()
            .apply_status_effect(StatusEffect::new(StatusKind::Stunned, 1, 1));
        assert_eq!(
            violations(&Action::end_turn("hero"), &global, Some(&encounter)),
            vec![RuleViolation::ActorStunned]
        );

        global.roster.get_mut("hero").unwrap().take_damage(100);
        assert_eq!(
            violations(&Action::end_turn("hero"), &global, Some(&encounter)),
            vec![RuleViolation::ActorDefeated]
        );
    }

    #[test]
    fn attack_checks_attack_and_target() {
        let (mut global, encounter) = fixtures::fighting(
            vec![fixtures::fighter("hero", "Hero")],
            vec![fixtures::ghoul("ghoul_1", "Ghoul")],
        );
        let enc = Some(&encounter);
        assert!(violations(&Action::attack("hero", "ghoul_1", "longsword"), &global, enc).is_empty());
        assert_eq!(
            violations(&Action::attack("hero", "ghoul_1", "claw"), &global, enc),
            vec![RuleViolation::AttackNotKnown]
        );
        assert_eq!(
            violations(&Action::attack("hero", "ghoul_9", "longsword"), &global, enc),
            vec![RuleViolation::UnknownTarget]
        );

        global.roster.get_mut("hero").unwrap().known_attacks.push("warhammer".into());
        assert_eq!(
            violations(&Action::attack("hero", "ghoul_1", "warhammer"), &global, enc),
            vec![RuleViolation::AttackNotFound]
        );

        global.roster.get_mut("ghoul_1").unwrap().take_damage(100);
        assert_eq!(
            violations(&Action::attack("hero", "ghoul_1", "longsword"), &global, enc),
            vec![RuleViolation::TargetDefeated]
        );
    }

    #[test]
    fn spell_checks_slots_and_target_shape() {
        let (mut global, encounter) = fixtures::fighting(
            vec![fixtures::wizard("mage", "Mira")],
            vec![fixtures::ghoul("ghoul_1", "Ghoul")],
        );
        let enc = Some(&encounter);
        assert!(violations(&Action::cast_spell("mage", "firebolt", Some("ghoul_1".into())), &global, enc).is_empty());
        assert!(violations(&Action::cast_spell("mage", "flame_wave", None), &global, enc).is_empty());
        assert_eq!(
            violations(&Action::cast_spell("mage", "firebolt", None), &global, enc),
            vec![RuleViolation::SpellNeedsTarget]
        );
        assert_eq!(
            violations(&Action::cast_spell("mage", "flame_wave", Some("ghoul_1".into())), &global, enc),
            vec![RuleViolation::AreaSpellWithTarget]
        );
        assert_eq!(
            violations(&Action::cast_spell("mage", "hex", Some("ghoul_1".into())), &global, enc),
            vec![RuleViolation::SpellNotKnown]
        );

        global.roster.get_mut("mage").unwrap().spell_slots.current = 0;
        assert_eq!(
            violations(&Action::cast_spell("mage", "firebolt", Some("ghoul_1".into())), &global, enc),
            vec![RuleViolation::NoSpellSlots]
        );
    }

    #[test]
    fn game_over_rejects_everything() {
        let mut global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        global.game_mode = GameMode::GameOver;
        let result = ValidationEngine::new(&fixtures::content()).validate(&Action::explore("hero"), &global, None);
        assert!(!result.is_valid());
        assert_eq!(result.errors, vec![RuleViolation::GameOver]);
    }
}
