//! Session driver
//!
//! Owns the game state for one run and pushes each line of player input through the pipeline:
//! parse, map, validate, then either move the party (exploration) or hand the action to the
//! resolution engine. In combat it also runs the turns nobody types for: start-of-turn ticks,
//! stunned or defeated entities losing their turn, and the enemies.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use delve_data::StatusKind;
use log::{info, warn};
use variantly::Variantly;

use crate::action::{Action, ActionKind};
use crate::content::{Content, ContentRepository};
use crate::dice::{self, DieSource};
use crate::encounter::EncounterState;
use crate::entity::{Entity, EntityId};
use crate::events::{EventSink, GameEvent, SessionLog};
use crate::intent::IntentParser;
use crate::mapper::{ActionMapper, Mapping};
use crate::party::build_encounter_enemies;
use crate::resolution::{ResolutionDetails, ResolutionEngine, ResolutionResult, SpellEffect};
use crate::validation::ValidationEngine;
use crate::world::{EncounterOutcome, GameMode, GameResult, GlobalGameState};

/// Upper bound on automatic turns run for a single input, in case an encounter never settles.
const MAX_AUTOMATIC_TURNS: usize = 1_000;

/// Where the run stands after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Variantly)]
pub enum TurnOutcome {
    Continue,
    Victory,
    GameOver,
    Complete,
}

/// Everything the player should see after one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub lines: Vec<String>,
    pub outcome: TurnOutcome,
}

impl TurnReport {
    fn new(lines: Vec<String>, outcome: TurnOutcome) -> Self {
        Self { lines, outcome }
    }

    fn message(line: impl Into<String>) -> Self {
        Self::new(vec![line.into()], TurnOutcome::Continue)
    }
}

/// A single dungeon run.
pub struct Session {
    content: Content,
    global: GlobalGameState,
    encounter: Option<EncounterState>,
    dice: Box<dyn DieSource>,
    log: SessionLog,
    result: GameResult,
}

impl Session {
    /// Start a run in `dungeon_id` (or the first dungeon in the content) with the given party.
    ///
    /// # Errors
    /// Returns an error if the dungeon is unknown, the content has no dungeons, or the party is
    /// empty.
    pub fn new(
        content: Content,
        dungeon_id: Option<&str>,
        players: Vec<Entity>,
        dice: Box<dyn DieSource>,
    ) -> Result<Self> {
        if players.is_empty() {
            bail!("cannot start a run without players");
        }
        let dungeon = match dungeon_id {
            Some(id) => content.dungeon(id).ok_or_else(|| anyhow!("unknown dungeon '{id}'"))?,
            None => content.def().dungeons.first().context("content defines no dungeons")?,
        };
        let global = GlobalGameState::new_run(dungeon, players);
        Ok(Self::resume(content, global, None, dice))
    }

    /// Continue from saved state.
    pub fn resume(
        content: Content,
        global: GlobalGameState,
        encounter: Option<EncounterState>,
        dice: Box<dyn DieSource>,
    ) -> Self {
        let result = if global.game_mode.is_game_over() {
            GameResult::GameOver
        } else {
            GameResult::InProgress
        };
        Self {
            content,
            global,
            encounter,
            dice,
            log: SessionLog::new(),
            result,
        }
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn global(&self) -> &GlobalGameState {
        &self.global
    }

    pub fn encounter(&self) -> Option<&EncounterState> {
        self.encounter.as_ref()
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn is_over(&self) -> bool {
        self.result != GameResult::InProgress
    }

    /// Swap in saved state, keeping the content, dice and log.
    pub fn restore(&mut self, global: GlobalGameState, encounter: Option<EncounterState>) {
        info!("restoring saved state in room '{}'", global.current_room_id);
        self.result = if global.game_mode.is_game_over() {
            GameResult::GameOver
        } else {
            GameResult::InProgress
        };
        self.global = global;
        self.encounter = encounter;
    }

    /// The player whose input `submit` acts on: the active entity in combat, otherwise the first
    /// living player.
    pub fn acting_player(&self) -> Option<&Entity> {
        match &self.encounter {
            Some(encounter) => encounter
                .active_entity(&self.global.roster)
                .filter(|e| e.is_player() && e.is_alive()),
            None => self.global.living_players().into_iter().next(),
        }
    }

    /// Describe the starting room and spring any encounter waiting there.
    pub fn start(&mut self) -> TurnReport {
        let mut lines = Vec::new();
        let encounter_id = self.describe_room(&mut lines);
        let outcome = self.arrive(encounter_id, &mut lines);
        TurnReport::new(lines, outcome)
    }

    /// Run one line of player input through the pipeline.
    pub fn submit(&mut self, text: &str) -> TurnReport {
        if self.is_over() {
            return TurnReport::new(vec!["The adventure is over.".into()], self.finished_outcome());
        }
        let Some(actor_id) = self.acting_player().map(|e| e.entity_id.clone()) else {
            return TurnReport::message("No one is able to act.");
        };

        let (parsed, mapping) = {
            let actor = self.global.roster.get(&actor_id);
            let encounter = self.encounter.as_ref();
            let parsed = IntentParser::new(&self.content).parse(text, actor, Some(&self.global), encounter);
            let mapping = ActionMapper::new(&self.content).map_intent(&parsed, actor, Some(&self.global), encounter);
            (parsed, mapping)
        };
        self.log.record(GameEvent::ActionInitiated {
            actor_id: actor_id.clone(),
            raw_input: text.to_string(),
            parsed_intent: parsed.label().to_string(),
            confidence: parsed.confidence,
            action: mapping.action().cloned(),
        });

        let action = match mapping {
            Mapping::Ok(action) => action,
            Mapping::Clarify { prompt, .. } => return TurnReport::message(prompt),
            Mapping::Fail(errors) => {
                return TurnReport::new(errors.iter().map(ToString::to_string).collect(), TurnOutcome::Continue);
            },
        };

        let validation = ValidationEngine::new(&self.content).validate(&action, &self.global, self.encounter.as_ref());
        if !validation.is_valid() {
            return TurnReport::new(validation.messages(), TurnOutcome::Continue);
        }

        let mut lines = Vec::new();
        let outcome = match (self.global.game_mode, action.kind()) {
            (GameMode::Exploration, ActionKind::Move { room_id }) => self.move_party(room_id, &mut lines),
            (GameMode::Exploration, ActionKind::Explore) => {
                self.explore(&action, &mut lines);
                TurnOutcome::Continue
            },
            _ => self.player_action(&action, &mut lines),
        };
        TurnReport::new(lines, outcome)
    }

    /// Give up the run, recording it as abandoned if it was still in progress.
    pub fn abandon(&mut self) {
        self.finish(GameResult::Abandoned);
    }

    /// Write the session log to `dir`.
    ///
    /// # Errors
    /// Returns an error if the log cannot be written.
    pub fn save_log(&mut self, dir: &Path) -> Result<PathBuf> {
        let dungeon_id = self.global.current_dungeon_id.clone();
        self.log.save(dir, &dungeon_id, self.result)
    }

    /// One line per party member, plus the room and, in combat, the enemies.
    pub fn status_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let room_name = self
            .content
            .room(&self.global.current_dungeon_id, &self.global.current_room_id)
            .map_or(self.global.current_room_id.as_str(), |r| r.name.as_str());
        lines.push(format!("Location: {room_name} ({})", self.global.game_mode));
        lines.extend(self.global.players().map(describe_entity));
        if let Some(encounter) = &self.encounter {
            lines.push(format!(
                "Round {}, {} to act",
                encounter.round,
                encounter
                    .active_entity(&self.global.roster)
                    .map_or("nobody", |e| e.name.as_str())
            ));
            lines.extend(self.global.roster.enemies().map(describe_entity));
        }
        lines.push(format!(
            "Rewards: {} from {} encounters",
            self.global.progression.total_rewards, self.global.progression.encounters_cleared
        ));
        lines
    }

    fn finished_outcome(&self) -> TurnOutcome {
        match self.result {
            GameResult::GameComplete => TurnOutcome::Complete,
            GameResult::InProgress => TurnOutcome::Continue,
            GameResult::GameOver | GameResult::Abandoned => TurnOutcome::GameOver,
        }
    }

    fn finish(&mut self, result: GameResult) {
        if self.is_over() {
            return;
        }
        self.result = result;
        info!("run ended: {result:?}");
        self.log.record(GameEvent::GameEnded {
            result,
            total_rewards: self.global.progression.total_rewards,
            total_encounters: self.global.progression.encounters_cleared,
            final_party_state: self.global.players().cloned().collect(),
        });
    }

    fn narrate(&mut self, lines: &mut Vec<String>, line: String) {
        if let Some(encounter) = self.encounter.as_mut() {
            encounter.append_log(line.clone());
        }
        lines.push(line);
    }

    fn at_exit(&self) -> bool {
        self.content
            .dungeon(&self.global.current_dungeon_id)
            .is_some_and(|d| d.exit_room == self.global.current_room_id)
    }

    fn complete(&mut self, lines: &mut Vec<String>) -> TurnOutcome {
        let dungeon_name = self
            .content
            .dungeon(&self.global.current_dungeon_id)
            .map_or_else(|| self.global.current_dungeon_id.clone(), |d| d.name.clone());
        lines.push(format!("You have reached the end of {dungeon_name}. The delve is complete!"));
        self.global.game_mode = GameMode::GameOver;
        self.finish(GameResult::GameComplete);
        TurnOutcome::Complete
    }

    /// Push the current room's name and description. Returns the room's encounter id, if any.
    fn describe_room(&self, lines: &mut Vec<String>) -> Option<String> {
        let room = self
            .content
            .room(&self.global.current_dungeon_id, &self.global.current_room_id)?;
        lines.push(room.name.clone());
        if !room.description.is_empty() {
            lines.push(room.description.clone());
        }
        room.encounter_id.clone()
    }

    /// Whatever happens on entering a room: an uncleared encounter starts, or the exit ends the run.
    fn arrive(&mut self, encounter_id: Option<String>, lines: &mut Vec<String>) -> TurnOutcome {
        if let Some(encounter_id) = encounter_id
            && !self.global.has_cleared_encounter(&encounter_id)
        {
            return self.start_encounter(&encounter_id, lines);
        }
        if self.at_exit() {
            return self.complete(lines);
        }
        TurnOutcome::Continue
    }

    fn move_party(&mut self, room_id: &str, lines: &mut Vec<String>) -> TurnOutcome {
        let from_room = self.global.current_room_id.clone();
        self.global.enter_room(room_id);
        let encounter_id = self.describe_room(lines);
        let room_description = self
            .content
            .room(&self.global.current_dungeon_id, room_id)
            .map(|r| r.description.clone())
            .unwrap_or_default();
        self.log.record(GameEvent::ExplorationMoved {
            from_room,
            to_room: room_id.to_string(),
            room_description,
        });
        self.arrive(encounter_id, lines)
    }

    fn explore(&mut self, action: &Action, lines: &mut Vec<String>) {
        self.describe_room(lines);
        let dungeon = self.content.dungeon(&self.global.current_dungeon_id);
        if let Some(room) = dungeon.and_then(|d| d.room(&self.global.current_room_id)) {
            let exits: Vec<String> = room
                .connections
                .iter()
                .map(|id| {
                    let name = dungeon.and_then(|d| d.room(id)).map_or(id.as_str(), |r| r.name.as_str());
                    let seen = if self.global.dungeon_state.has_visited(id) { "" } else { " (unexplored)" };
                    format!("{name}{seen}")
                })
                .collect();
            if exits.is_empty() {
                lines.push("There are no exits.".to_string());
            } else {
                lines.push(format!("Exits: {}", exits.join(", ")));
            }
            if room.rest_allowed {
                if self.global.dungeon_state.has_rested_in(&self.global.current_room_id) {
                    lines.push("You have already rested here.".to_string());
                } else {
                    lines.push("This room looks safe enough to rest in.".to_string());
                }
            }
        }
        self.log.record(GameEvent::ActionResolved {
            actor_id: action.actor_id().to_string(),
            action_type: action.action_type(),
            round: None,
            success: true,
            narration: lines.join(" "),
            details: None,
        });
    }

    /// Resolve an action through the rules core, narrate it and log it.
    fn apply(&mut self, action: &Action, lines: &mut Vec<String>) -> ResolutionResult {
        let round = self.encounter.as_ref().map(|e| e.round);
        let result = ResolutionEngine::new(&self.content, self.dice.as_mut()).resolve(
            action,
            &mut self.global,
            self.encounter.as_mut(),
            Some(&mut self.log),
        );
        self.log.record(GameEvent::ActionResolved {
            actor_id: action.actor_id().to_string(),
            action_type: action.action_type(),
            round,
            success: result.success,
            narration: result.narration.clone(),
            details: result.details.clone(),
        });
        self.narrate(lines, result.narration.clone());
        for name in defeated_by(&result, &self.global) {
            self.narrate(lines, format!("{name} is defeated."));
        }
        result
    }

    fn player_action(&mut self, action: &Action, lines: &mut Vec<String>) -> TurnOutcome {
        let result = self.apply(action, lines);
        if !result.success || self.encounter.is_none() {
            return TurnOutcome::Continue;
        }
        match action.kind() {
            ActionKind::Attack { .. } | ActionKind::CastSpell { .. } => {
                if let Some(encounter) = self.encounter.as_mut() {
                    encounter.advance_turn();
                }
                self.run_turns(lines)
            },
            ActionKind::EndTurn => self.run_turns(lines),
            _ => TurnOutcome::Continue,
        }
    }

    fn start_encounter(&mut self, encounter_id: &str, lines: &mut Vec<String>) -> TurnOutcome {
        let Some(def) = self.content.encounter(encounter_id) else {
            warn!("room references unknown encounter '{encounter_id}'");
            return TurnOutcome::Continue;
        };
        let name = if def.name.is_empty() { def.id.clone() } else { def.name.clone() };
        let enemies = match build_encounter_enemies(&self.content, def) {
            Ok(enemies) => enemies,
            Err(err) => {
                warn!("could not build encounter '{encounter_id}': {err:#}");
                return TurnOutcome::Continue;
            },
        };

        let combatants: Vec<(EntityId, String)> = self
            .global
            .living_players()
            .into_iter()
            .chain(enemies.iter())
            .map(|e| (e.entity_id.clone(), e.name.clone()))
            .collect();
        let mut initiative: Vec<(EntityId, String, u32)> = combatants
            .into_iter()
            .map(|(id, name)| {
                let roll = dice::roll_d20(self.dice.as_mut());
                (id, name, roll)
            })
            .collect();
        initiative.sort_by(|a, b| b.2.cmp(&a.2));
        let order: Vec<EntityId> = initiative.iter().map(|(id, _, _)| id.clone()).collect();

        let encounter = self.global.begin_encounter(encounter_id, enemies, order.clone());
        self.log.record(GameEvent::CombatStarted {
            encounter_id: encounter_id.to_string(),
            room_id: encounter.room_id.clone(),
            initiative_order: order,
            entities: encounter.entities(&self.global.roster).into_iter().cloned().collect(),
        });
        self.encounter = Some(encounter);

        self.narrate(lines, format!("Combat begins: {name}!"));
        let rolls: Vec<String> = initiative
            .iter()
            .map(|(_, name, roll)| format!("{name} ({roll})"))
            .collect();
        self.narrate(lines, format!("Initiative: {}", rolls.join(", ")));
        self.run_turns(lines)
    }

    /// Run automatic turns from the active entity until a player can act or the encounter ends.
    fn run_turns(&mut self, lines: &mut Vec<String>) -> TurnOutcome {
        for _ in 0..MAX_AUTOMATIC_TURNS {
            if let Some(outcome) = self.settle_encounter(lines) {
                return outcome;
            }
            let Some(active_id) = self.encounter.as_ref().map(|e| e.active_entity_id.clone()) else {
                return TurnOutcome::Continue;
            };

            let can_act = self.start_turn(&active_id, lines);
            if let Some(outcome) = self.settle_encounter(lines) {
                return outcome;
            }
            if can_act {
                if self.global.roster.get(&active_id).is_some_and(Entity::is_player) {
                    return TurnOutcome::Continue;
                }
                self.enemy_turn(&active_id, lines);
            }
            if let Some(encounter) = self.encounter.as_mut() {
                encounter.advance_turn();
            }
        }
        warn!("encounter did not settle after {MAX_AUTOMATIC_TURNS} automatic turns");
        TurnOutcome::Continue
    }

    /// Tick the entity entering its turn. Returns whether it may act.
    fn start_turn(&mut self, entity_id: &str, lines: &mut Vec<String>) -> bool {
        let Some(entity) = self.global.roster.get_mut(entity_id) else {
            return false;
        };
        if !entity.is_alive() {
            return false;
        }
        let stunned = entity.has_status_effect(&StatusKind::Stunned);
        let tick = ResolutionEngine::resolve_start_of_turn(entity, Some(&mut self.log));
        let name = entity.name.clone();
        let alive = entity.is_alive();

        for fx in &tick.triggered {
            self.narrate(
                lines,
                format!("{name} takes {} damage from being {}.", fx.damage_applied, fx.effect_type),
            );
        }
        if !alive {
            self.narrate(lines, format!("{name} is defeated."));
            return false;
        }
        if stunned {
            self.narrate(lines, format!("{name} is stunned and loses the turn."));
            return false;
        }
        true
    }

    /// Enemy turn: the first usable attack against the living player with the lowest hp.
    fn enemy_turn(&mut self, enemy_id: &str, lines: &mut Vec<String>) {
        let Some(enemy) = self.global.roster.get(enemy_id) else {
            return;
        };
        let name = enemy.name.clone();
        let attack_id = enemy
            .known_attacks
            .iter()
            .find(|id| self.content.attack(id).is_some())
            .cloned();
        let target_id = self.encounter.as_ref().and_then(|encounter| {
            encounter
                .living_players(&self.global.roster)
                .into_iter()
                .min_by_key(|p| p.hp)
                .map(|p| p.entity_id.clone())
        });

        let (Some(attack_id), Some(target_id)) = (attack_id, target_id) else {
            self.narrate(lines, format!("{name} hesitates."));
            return;
        };
        let action = Action::attack(enemy_id, target_id, attack_id);
        let validation = ValidationEngine::new(&self.content).validate(&action, &self.global, self.encounter.as_ref());
        if !validation.is_valid() {
            warn!("enemy action rejected: {}", validation.messages().join("; "));
            self.narrate(lines, format!("{name} hesitates."));
            return;
        }
        self.apply(&action, lines);
    }

    /// End the encounter if one side is down.
    fn settle_encounter(&mut self, lines: &mut Vec<String>) -> Option<TurnOutcome> {
        let over = self.encounter.as_ref().is_some_and(|e| {
            e.all_enemies_defeated(&self.global.roster) || e.all_players_defeated(&self.global.roster)
        });
        if !over {
            return None;
        }
        let encounter = self.encounter.take()?;
        let reward = self
            .content
            .encounter(&encounter.encounter_id)
            .map_or(0, |def| def.reward);
        let outcome = self.global.end_encounter(&encounter, reward);
        self.log.record(GameEvent::EncounterEnded {
            encounter_id: encounter.encounter_id.clone(),
            result: outcome,
            reward: if outcome == EncounterOutcome::Victory { reward } else { 0 },
            player_final_states: self.global.players().cloned().collect(),
        });

        match outcome {
            EncounterOutcome::Victory => {
                lines.push(format!("Victory! The party earns {reward} reward."));
                if self.at_exit() {
                    return Some(self.complete(lines));
                }
                Some(TurnOutcome::Victory)
            },
            EncounterOutcome::Defeat => {
                lines.push("The party has fallen. Game over.".to_string());
                self.finish(GameResult::GameOver);
                Some(TurnOutcome::GameOver)
            },
            EncounterOutcome::Withdrawn => Some(TurnOutcome::Continue),
        }
    }
}

/// Names of the entities this resolution took to 0 hp.
fn defeated_by(result: &ResolutionResult, global: &GlobalGameState) -> Vec<String> {
    let ids: Vec<&str> = match &result.details {
        Some(ResolutionDetails::Attack(attack)) if attack.damage_applied > 0 && attack.target_hp == 0 => {
            vec![attack.target_id.as_str()]
        },
        Some(ResolutionDetails::Spell(spell)) => spell
            .targets
            .iter()
            .filter(|t| matches!(t.effect, SpellEffect::Damage { amount, hp_after: 0 } if amount > 0))
            .map(|t| t.target_id.as_str())
            .collect(),
        _ => Vec::new(),
    };
    ids.into_iter()
        .filter_map(|id| global.roster.get(id))
        .map(|e| e.name.clone())
        .collect()
}

fn describe_entity(entity: &Entity) -> String {
    let mut line = format!(
        "{}: {}/{} hp, AC {}",
        entity.name,
        entity.hp,
        entity.max_hp,
        entity.effective_ac()
    );
    if entity.spell_slots.max > 0 {
        line.push_str(&format!(", slots {}/{}", entity.spell_slots.current, entity.spell_slots.max));
    }
    if !entity.status_effects.is_empty() {
        let effects: Vec<String> = entity
            .status_effects
            .iter()
            .map(|fx| format!("{} {}", fx.kind, fx.duration))
            .collect();
        line.push_str(&format!(" [{}]", effects.join(", ")));
    }
    if !entity.is_alive() {
        line.push_str(" (defeated)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::fixtures;

    fn session(global: GlobalGameState, encounter: Option<EncounterState>, faces: &[u32]) -> Session {
        Session::resume(
            fixtures::content(),
            global,
            encounter,
            Box::new(ScriptedDice::new(faces.iter().copied())),
        )
    }

    fn lone_ghoul(hp: u32) -> (GlobalGameState, EncounterState) {
        let mut ghoul = fixtures::ghoul("ghoul_1", "Ghoul");
        ghoul.hp = hp;
        fixtures::fighting(vec![fixtures::fighter("hero", "Hero")], vec![ghoul])
    }

    #[test]
    fn moving_into_a_guarded_room_starts_combat() {
        let global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        let mut session = session(global, None, &[20, 5, 3]);

        let report = session.submit("go to the great hall");
        assert_eq!(report.outcome, TurnOutcome::Continue);
        assert!(report.lines.iter().any(|l| l == "Combat begins: Ghoul Pack!"));
        assert!(report.lines.iter().any(|l| l == "Initiative: Hero (20), Ghoul 1 (5), Ghoul 2 (3)"));

        let encounter = session.encounter().unwrap();
        assert_eq!(encounter.active_entity_id, "hero");
        assert_eq!(session.global().roster.len(), 3);
        assert_eq!(session.global().current_room_id, "hall");
        assert_eq!(session.log().of_type("combat_started").count(), 1);
        assert_eq!(session.log().of_type("exploration_moved").count(), 1);
    }

    #[test]
    fn enemies_act_until_a_player_is_up() {
        let global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        // initiative, then two claw attacks that hit for 4 each
        let mut session = session(global, None, &[1, 20, 15, 15, 4, 15, 4]);

        let report = session.submit("walk to the great hall");
        assert_eq!(report.outcome, TurnOutcome::Continue);
        assert_eq!(session.encounter().unwrap().active_entity_id, "hero");
        assert_eq!(session.global().roster.get("hero").unwrap().hp, 12);
        let hits = report.lines.iter().filter(|l| l.contains("hits Hero with Claw for 4")).count();
        assert_eq!(hits, 2);
        assert!(session.encounter().unwrap().combat_log.len() >= 4);
    }

    #[test]
    fn killing_the_last_enemy_wins_the_encounter() {
        let (global, encounter) = lone_ghoul(1);
        let mut session = session(global, Some(encounter), &[20, 1]);

        let report = session.submit("attack the ghoul");
        assert_eq!(report.outcome, TurnOutcome::Victory);
        assert!(report.lines.iter().any(|l| l == "Ghoul is defeated."));
        assert!(session.encounter().is_none());

        let global = session.global();
        assert!(global.game_mode.is_exploration());
        assert!(global.has_cleared_encounter("ghouls"));
        assert_eq!(global.progression.total_rewards, 50);
        assert_eq!(global.roster.len(), 1);
        assert_eq!(session.log().of_type("encounter_ended").count(), 1);
    }

    #[test]
    fn fallen_party_ends_the_run() {
        let (mut global, encounter) = lone_ghoul(12);
        global.roster.get_mut("hero").unwrap().take_damage(19);
        let mut session = session(global, Some(encounter), &[20, 6]);

        let report = session.submit("end turn");
        assert_eq!(report.outcome, TurnOutcome::GameOver);
        assert!(session.is_over());
        assert!(session.global().game_mode.is_game_over());
        assert_eq!(session.log().of_type("game_ended").count(), 1);

        let again = session.submit("attack the ghoul");
        assert_eq!(again.lines, vec!["The adventure is over.".to_string()]);
        assert_eq!(again.outcome, TurnOutcome::GameOver);
    }

    #[test]
    fn clarification_leaves_state_alone() {
        let (global, encounter) = fixtures::fighting(
            vec![fixtures::fighter("hero", "Hero")],
            vec![fixtures::ghoul("ghoul_1", "Pale Ghoul"), fixtures::ghoul("ghoul_2", "Dark Ghoul")],
        );
        let before = global.clone();
        let mut session = session(global, Some(encounter), &[20, 8]);

        let report = session.submit("attack");
        assert_eq!(report.lines.len(), 1);
        assert_eq!(session.global(), &before);
        assert_eq!(session.encounter().unwrap().active_entity_id, "hero");
    }

    #[test]
    fn rest_once_per_room() {
        let mut global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        global.roster.get_mut("hero").unwrap().take_damage(10);
        let mut session = session(global, None, &[]);

        let first = session.submit("take a short rest");
        assert_eq!(first.lines, vec!["The party takes a short rest.".to_string()]);
        assert_eq!(session.global().roster.get("hero").unwrap().hp, 15);

        let second = session.submit("rest again");
        assert_eq!(second.lines, vec!["This room has already been used for resting.".to_string()]);
    }

    #[test]
    fn reaching_the_exit_completes_the_run() {
        let mut global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        global.enter_room("hall");
        global.mark_encounter_cleared("ghouls", 50);
        let mut session = session(global, None, &[]);

        let report = session.submit("head into the inner sanctum");
        assert_eq!(report.outcome, TurnOutcome::Complete);
        assert_eq!(session.result(), GameResult::GameComplete);
        assert!(report.lines.last().unwrap().contains("The delve is complete!"));
    }

    #[test]
    fn explore_lists_exits_and_rest_hint() {
        let global = fixtures::exploring(vec![fixtures::fighter("hero", "Hero")]);
        let mut session = session(global, None, &[]);

        let report = session.submit("look around");
        assert_eq!(report.lines[0], "Crypt Gate");
        assert!(report.lines.contains(&"Exits: Great Hall (unexplored)".to_string()));
        assert!(report.lines.contains(&"This room looks safe enough to rest in.".to_string()));
    }

    #[test]
    fn poison_ticks_and_stun_skips_the_turn() {
        let (mut global, encounter) = lone_ghoul(12);
        let ghoul = global.roster.get_mut("ghoul_1").unwrap();
        ghoul.apply_status_effect(crate::status::StatusEffect::new(StatusKind::Poisoned, 2, 2));
        ghoul.apply_status_effect(crate::status::StatusEffect::new(StatusKind::Stunned, 1, 1));
        let mut session = session(global, Some(encounter), &[]);

        let report = session.submit("end turn");
        assert_eq!(report.outcome, TurnOutcome::Continue);
        assert!(report.lines.contains(&"Ghoul takes 2 damage from being poisoned.".to_string()));
        assert!(report.lines.contains(&"Ghoul is stunned and loses the turn.".to_string()));
        assert_eq!(session.global().roster.get("ghoul_1").unwrap().hp, 10);
        assert_eq!(session.global().roster.get("hero").unwrap().hp, 20);
        assert_eq!(session.encounter().unwrap().round, 2);
    }

    #[test]
    fn status_lines_show_party_and_enemies() {
        let (global, encounter) = lone_ghoul(12);
        let session = session(global, Some(encounter), &[]);
        let lines = session.status_lines();
        assert_eq!(lines[0], "Location: Great Hall (encounter)");
        assert!(lines.contains(&"Hero: 20/20 hp, AC 15".to_string()));
        assert!(lines.contains(&"Round 1, Hero to act".to_string()));
        assert!(lines.contains(&"Ghoul: 12/12 hp, AC 11".to_string()));
    }
}
