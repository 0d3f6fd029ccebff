//! Encounter state
//!
//! Turn order, round counter and combat log for one fight. Participants are ids into the
//! [`Roster`] owned by the global state; every query takes that roster.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityKind};
use crate::world::Roster;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterState {
    pub encounter_id: String,
    pub room_id: String,
    pub round: u32,
    pub participants: Vec<EntityId>,
    pub initiative_order: Vec<EntityId>,
    pub active_entity_id: EntityId,
    #[serde(default)]
    pub combat_log: Vec<String>,
}

impl EncounterState {
    /// Round 1, with the first entity in `initiative_order` active.
    pub fn new(
        encounter_id: impl Into<String>,
        room_id: impl Into<String>,
        participants: Vec<EntityId>,
        initiative_order: Vec<EntityId>,
    ) -> Self {
        let active_entity_id = initiative_order.first().cloned().unwrap_or_default();
        Self {
            encounter_id: encounter_id.into(),
            room_id: room_id.into(),
            round: 1,
            participants,
            initiative_order,
            active_entity_id,
            combat_log: Vec::new(),
        }
    }

    pub fn is_participant(&self, entity_id: &str) -> bool {
        self.participants.iter().any(|id| id == entity_id)
    }

    /// Look up a participant. Roster entries outside this encounter are not visible.
    pub fn entity<'r>(&self, roster: &'r Roster, entity_id: &str) -> Option<&'r Entity> {
        if self.is_participant(entity_id) {
            roster.get(entity_id)
        } else {
            None
        }
    }

    /// All participants present in the roster, in participant order.
    pub fn entities<'r>(&self, roster: &'r Roster) -> Vec<&'r Entity> {
        self.participants.iter().filter_map(|id| roster.get(id)).collect()
    }

    pub fn living_entities<'r>(&self, roster: &'r Roster) -> Vec<&'r Entity> {
        self.entities(roster).into_iter().filter(|e| e.is_alive()).collect()
    }

    pub fn living_enemies<'r>(&self, roster: &'r Roster) -> Vec<&'r Entity> {
        self.living_of_kind(roster, EntityKind::Enemy)
    }

    pub fn living_players<'r>(&self, roster: &'r Roster) -> Vec<&'r Entity> {
        self.living_of_kind(roster, EntityKind::Player)
    }

    /// Living participants fighting on the `kind` side.
    pub fn living_of_kind<'r>(&self, roster: &'r Roster, kind: EntityKind) -> Vec<&'r Entity> {
        self.entities(roster)
            .into_iter()
            .filter(|e| e.is_alive() && e.kind == kind)
            .collect()
    }

    pub fn active_entity<'r>(&self, roster: &'r Roster) -> Option<&'r Entity> {
        self.entity(roster, &self.active_entity_id)
    }

    pub fn all_enemies_defeated(&self, roster: &Roster) -> bool {
        self.living_enemies(roster).is_empty()
    }

    pub fn all_players_defeated(&self, roster: &Roster) -> bool {
        self.living_players(roster).is_empty()
    }

    /// Hand the turn to the next id in the initiative order, wrapping around.
    ///
    /// Wrapping back to the first id starts a new round. Does nothing if the active id is not in
    /// the order.
    pub fn advance_turn(&mut self) {
        let Some(current) = self.initiative_order.iter().position(|id| *id == self.active_entity_id) else {
            return;
        };
        let next = (current + 1) % self.initiative_order.len();
        self.active_entity_id.clone_from(&self.initiative_order[next]);
        if next == 0 {
            self.round += 1;
            debug!("encounter '{}' enters round {}", self.encounter_id, self.round);
        }
    }

    pub fn append_log(&mut self, message: impl Into<String>) {
        self.combat_log.push(message.into());
    }
}
