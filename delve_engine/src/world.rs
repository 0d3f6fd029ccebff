//! World state
//!
//! `GlobalGameState` is the state that lives for a whole dungeon run. It owns the single entity
//! [`Roster`]: the party, plus the enemies of the encounter currently being fought. Encounters refer
//! to roster entries by id, so damage taken in combat is the same damage seen while exploring.

use std::collections::BTreeSet;
use std::fmt::Display;

use delve_data::DungeonDef;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use variantly::Variantly;

use crate::encounter::EncounterState;
use crate::entity::{Entity, EntityId, EntityKind};

/// Top-level mode the game is in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Variantly)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Exploration,
    Encounter,
    GameOver,
}

impl Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Exploration => f.write_str("exploration"),
            GameMode::Encounter => f.write_str("encounter"),
            GameMode::GameOver => f.write_str("game over"),
        }
    }
}

/// How a run ended, as recorded in the session log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameResult {
    GameComplete,
    GameOver,
    Abandoned,
    InProgress,
}

/// How an encounter ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterOutcome {
    Victory,
    Defeat,
    /// Ended with both sides still standing.
    Withdrawn,
}

/// The single table of every entity in play, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    entities: Vec<Entity>,
}

impl Roster {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    pub fn get(&self, entity_id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.entity_id == entity_id)
    }

    pub fn get_mut(&mut self, entity_id: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.entity_id == entity_id)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.get(entity_id).is_some()
    }

    /// Insert an entity, replacing any existing entry with the same id.
    pub fn insert(&mut self, entity: Entity) {
        if let Some(slot) = self.get_mut(&entity.entity_id) {
            *slot = entity;
        } else {
            self.entities.push(entity);
        }
    }

    pub fn remove(&mut self, entity_id: &str) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.entity_id == entity_id)?;
        Some(self.entities.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn players(&self) -> impl Iterator<Item = &Entity> {
        self.of_kind(EntityKind::Player)
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut().filter(|e| e.kind == EntityKind::Player)
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Entity> {
        self.of_kind(EntityKind::Enemy)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }
}

/// Exploration bookkeeping for the current dungeon run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonState {
    pub visited_rooms: BTreeSet<String>,
    pub rested_rooms: BTreeSet<String>,
}

impl DungeonState {
    pub fn mark_visited(&mut self, room_id: &str) {
        self.visited_rooms.insert(room_id.to_string());
    }

    pub fn mark_rested(&mut self, room_id: &str) {
        self.rested_rooms.insert(room_id.to_string());
    }

    pub fn has_visited(&self, room_id: &str) -> bool {
        self.visited_rooms.contains(room_id)
    }

    pub fn has_rested_in(&self, room_id: &str) -> bool {
        self.rested_rooms.contains(room_id)
    }
}

/// Rewards and achievements accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub total_rewards: u32,
    pub encounters_cleared: u32,
}

/// State that persists across the whole dungeon run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalGameState {
    pub game_mode: GameMode,
    pub current_dungeon_id: String,
    pub current_room_id: String,
    pub roster: Roster,
    #[serde(default)]
    pub cleared_encounters: BTreeSet<String>,
    pub dungeon_state: DungeonState,
    pub progression: Progression,
}

impl GlobalGameState {
    /// Start a run at the dungeon's entrance with the given party.
    pub fn new_run(dungeon: &DungeonDef, players: Vec<Entity>) -> Self {
        let mut dungeon_state = DungeonState::default();
        dungeon_state.mark_visited(&dungeon.start_room);
        info!(
            "starting run in dungeon '{}' at room '{}' with {} players",
            dungeon.id,
            dungeon.start_room,
            players.len()
        );
        Self {
            game_mode: GameMode::Exploration,
            current_dungeon_id: dungeon.id.clone(),
            current_room_id: dungeon.start_room.clone(),
            roster: Roster::new(players),
            cleared_encounters: BTreeSet::new(),
            dungeon_state,
            progression: Progression::default(),
        }
    }

    pub fn players(&self) -> impl Iterator<Item = &Entity> {
        self.roster.players()
    }

    pub fn living_players(&self) -> Vec<&Entity> {
        self.roster.players().filter(|p| p.is_alive()).collect()
    }

    pub fn all_players_defeated(&self) -> bool {
        self.living_players().is_empty()
    }

    pub fn has_cleared_encounter(&self, encounter_id: &str) -> bool {
        self.cleared_encounters.contains(encounter_id)
    }

    /// Record an encounter as cleared. The reward and counter only count the first time.
    pub fn mark_encounter_cleared(&mut self, encounter_id: &str, reward: u32) -> bool {
        if !self.cleared_encounters.insert(encounter_id.to_string()) {
            return false;
        }
        self.progression.total_rewards = self.progression.total_rewards.saturating_add(reward);
        self.progression.encounters_cleared += 1;
        true
    }

    /// Move the party to `room_id`, marking it visited.
    pub fn enter_room(&mut self, room_id: &str) {
        info!("party moves from '{}' to '{}'", self.current_room_id, room_id);
        room_id.clone_into(&mut self.current_room_id);
        self.dungeon_state.mark_visited(room_id);
    }

    /// Put the enemies into the roster and switch to encounter mode.
    ///
    /// Participants are every player followed by the enemies; `initiative_order` is the turn
    /// rotation rolled by the caller.
    pub fn begin_encounter(
        &mut self,
        encounter_id: &str,
        enemies: Vec<Entity>,
        initiative_order: Vec<EntityId>,
    ) -> EncounterState {
        let mut participants: Vec<EntityId> = self.roster.players().map(|p| p.entity_id.clone()).collect();
        for enemy in enemies {
            participants.push(enemy.entity_id.clone());
            self.roster.insert(enemy);
        }
        self.game_mode = GameMode::Encounter;
        info!(
            "encounter '{encounter_id}' begins in '{}' with {} participants",
            self.current_room_id,
            participants.len()
        );
        EncounterState::new(encounter_id, &self.current_room_id, participants, initiative_order)
    }

    /// Tear down an encounter: its enemies leave the roster, a victory is recorded with `reward`,
    /// and the mode returns to exploration (or game over when the party has fallen).
    pub fn end_encounter(&mut self, encounter: &EncounterState, reward: u32) -> EncounterOutcome {
        let outcome = if encounter.all_players_defeated(&self.roster) {
            EncounterOutcome::Defeat
        } else if encounter.all_enemies_defeated(&self.roster) {
            EncounterOutcome::Victory
        } else {
            EncounterOutcome::Withdrawn
        };

        for id in &encounter.participants {
            if self.roster.get(id).is_some_and(|e| e.kind == EntityKind::Enemy) {
                self.roster.remove(id);
            }
        }

        match outcome {
            EncounterOutcome::Victory => {
                self.mark_encounter_cleared(&encounter.encounter_id, reward);
                self.game_mode = GameMode::Exploration;
                info!("encounter '{}' cleared (+{reward})", encounter.encounter_id);
            },
            EncounterOutcome::Defeat => {
                self.game_mode = GameMode::GameOver;
                warn!("party defeated in encounter '{}'", encounter.encounter_id);
            },
            EncounterOutcome::Withdrawn => {
                self.game_mode = GameMode::Exploration;
                info!("encounter '{}' ended without a victor", encounter.encounter_id);
            },
        }
        outcome
    }
}
