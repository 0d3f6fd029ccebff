//! Status effects
//!
//! Timed modifiers attached to an entity. Damage-over-time kinds hurt their owner at the start of
//! each of its turns; every effect loses one turn of duration per tick and expires at zero.

use delve_data::{StatusEffectDef, StatusKind};
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// A status effect instance on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    #[serde(rename = "type")]
    pub kind: StatusKind,
    /// Turns remaining.
    pub duration: i32,
    #[serde(default = "default_magnitude")]
    pub magnitude: i32,
    #[serde(default)]
    pub source_id: Option<EntityId>,
}

fn default_magnitude() -> i32 {
    1
}

impl StatusEffect {
    pub fn new(kind: StatusKind, duration: i32, magnitude: i32) -> Self {
        Self {
            kind,
            duration,
            magnitude,
            source_id: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source_id: impl Into<EntityId>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Instantiate a content payload, attributing it to `source_id`.
    pub fn from_def(def: &StatusEffectDef, source_id: Option<&str>) -> Self {
        Self {
            kind: def.kind.clone(),
            duration: def.duration,
            magnitude: def.magnitude,
            source_id: source_id.map(ToString::to_string),
        }
    }
}

/// One damage-over-time effect that fired during a start-of-turn tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredEffect {
    pub effect_type: StatusKind,
    pub damage_applied: u32,
    pub duration_remaining: i32,
}

/// Record of a start-of-turn tick for a single entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTick {
    pub entity_id: EntityId,
    pub triggered: Vec<TriggeredEffect>,
}

impl StatusTick {
    pub fn total_damage(&self) -> u32 {
        self.triggered.iter().map(|t| t.damage_applied).sum()
    }
}
