//! Game events and the session log
//!
//! Stages report what happened through an [`EventSink`]. Nothing in the rules depends on a sink
//! being present; the session log is purely a record for later inspection.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::action::{Action, ActionType, RestType};
use crate::entity::{Entity, EntityId};
use crate::resolution::{ResolutionDetails, RestSnapshot};
use crate::world::{EncounterOutcome, GameResult};
use delve_data::StatusKind;

/// Everything worth recording during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "details", rename_all = "snake_case")]
pub enum GameEvent {
    ActionInitiated {
        actor_id: EntityId,
        raw_input: String,
        parsed_intent: String,
        confidence: f32,
        action: Option<Action>,
    },
    CombatStarted {
        encounter_id: String,
        room_id: String,
        initiative_order: Vec<EntityId>,
        entities: Vec<Entity>,
    },
    ActionResolved {
        actor_id: EntityId,
        action_type: ActionType,
        round: Option<u32>,
        success: bool,
        narration: String,
        details: Option<ResolutionDetails>,
    },
    StatusEffectApplied {
        entity_id: EntityId,
        effect_type: StatusKind,
        duration: i32,
        magnitude: i32,
        source_id: Option<EntityId>,
    },
    StatusEffectTriggered {
        entity_id: EntityId,
        effect_type: StatusKind,
        damage_applied: u32,
        duration_remaining: i32,
    },
    EntityDied {
        entity_id: EntityId,
        name: String,
        final_hp: u32,
        killed_by: Option<EntityId>,
    },
    EncounterEnded {
        encounter_id: String,
        result: EncounterOutcome,
        reward: u32,
        player_final_states: Vec<Entity>,
    },
    ExplorationMoved {
        from_room: String,
        to_room: String,
        room_description: String,
    },
    RestCompleted {
        rest_type: RestType,
        room_id: String,
        player_states_after: Vec<RestSnapshot>,
    },
    GameEnded {
        result: GameResult,
        total_rewards: u32,
        total_encounters: u32,
        final_party_state: Vec<Entity>,
    },
}

impl GameEvent {
    /// The snake_case tag this event is recorded under.
    pub fn event_type(&self) -> &'static str {
        match self {
            GameEvent::ActionInitiated { .. } => "action_initiated",
            GameEvent::CombatStarted { .. } => "combat_started",
            GameEvent::ActionResolved { .. } => "action_resolved",
            GameEvent::StatusEffectApplied { .. } => "status_effect_applied",
            GameEvent::StatusEffectTriggered { .. } => "status_effect_triggered",
            GameEvent::EntityDied { .. } => "entity_died",
            GameEvent::EncounterEnded { .. } => "encounter_ended",
            GameEvent::ExplorationMoved { .. } => "exploration_moved",
            GameEvent::RestCompleted { .. } => "rest_completed",
            GameEvent::GameEnded { .. } => "game_ended",
        }
    }
}

/// Receiver for game events.
pub trait EventSink {
    fn record(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn record(&mut self, event: GameEvent) {
        self.push(event);
    }
}

/// One timestamped entry in a session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_type: String,
    pub timestamp: String,
    pub details: serde_json::Value,
}

/// Ordered record of a play session, written out as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub started_at: String,
    #[serde(default)]
    pub dungeon_id: Option<String>,
    #[serde(default)]
    pub result: Option<GameResult>,
    pub events: Vec<EventRecord>,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

impl SessionLog {
    /// Start a new log with a fresh session id.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            started_at: now_rfc3339(),
            dungeon_id: None,
            result: None,
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Records of one event type, in order.
    pub fn of_type<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a EventRecord> + 'a {
        self.events.iter().filter(move |r| r.event_type == event_type)
    }

    pub fn file_name(session_id: &str) -> String {
        format!("session_{session_id}.json")
    }

    /// Write the log to `dir/session_<id>.json`, creating `dir` as needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or the file cannot be written.
    pub fn save(&mut self, dir: &Path, dungeon_id: &str, result: GameResult) -> Result<PathBuf> {
        self.dungeon_id = Some(dungeon_id.to_string());
        self.result = Some(result);
        fs::create_dir_all(dir).with_context(|| format!("creating session log directory {}", dir.display()))?;
        let path = dir.join(Self::file_name(&self.session_id));
        let json = serde_json::to_string_pretty(self).context("serializing session log")?;
        fs::write(&path, json).with_context(|| format!("writing session log {}", path.display()))?;
        info!("session log written to {}", path.display());
        Ok(path)
    }

    /// Read a saved log back. Returns `Ok(None)` when no log exists for `session_id`.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(dir: &Path, session_id: &str) -> Result<Option<SessionLog>> {
        let path = dir.join(Self::file_name(session_id));
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).with_context(|| format!("reading session log {}", path.display()))?;
        let log = serde_json::from_str(&text).with_context(|| format!("parsing session log {}", path.display()))?;
        Ok(Some(log))
    }
}

impl EventSink for SessionLog {
    fn record(&mut self, event: GameEvent) {
        let event_type = event.event_type().to_string();
        let details = match serde_json::to_value(&event) {
            Ok(serde_json::Value::Object(mut map)) => map.remove("details").unwrap_or(serde_json::Value::Null),
            Ok(_) => serde_json::Value::Null,
            Err(err) => {
                warn!("could not serialize {event_type} event: {err}");
                serde_json::Value::Null
            },
        };
        debug!("event recorded: {event_type}");
        self.events.push(EventRecord {
            event_type,
            timestamp: now_rfc3339(),
            details,
        });
    }
}
