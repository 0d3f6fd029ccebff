//! Actions
//!
//! A fully specified command an actor wants to perform. Each kind carries exactly the payload it
//! needs, so a well-formed action can only be built through the typed constructors below.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use variantly::Variantly;

use crate::entity::EntityId;

/// Tag for the six action (and intent) kinds, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Variantly)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Move,
    Attack,
    CastSpell,
    Rest,
    EndTurn,
    Explore,
}

impl ActionType {
    pub const ALL: [ActionType; 6] = [
        ActionType::Move,
        ActionType::Attack,
        ActionType::CastSpell,
        ActionType::Rest,
        ActionType::EndTurn,
        ActionType::Explore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Move => "move",
            ActionType::Attack => "attack",
            ActionType::CastSpell => "cast_spell",
            ActionType::Rest => "rest",
            ActionType::EndTurn => "end_turn",
            ActionType::Explore => "explore",
        }
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestType {
    #[default]
    Short,
    Long,
}

impl RestType {
    pub fn as_str(self) -> &'static str {
        match self {
            RestType::Short => "short",
            RestType::Long => "long",
        }
    }
}

impl Display for RestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind payload of an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum ActionKind {
    Move {
        room_id: String,
    },
    Attack {
        target_id: EntityId,
        attack_id: String,
    },
    CastSpell {
        spell_id: String,
        #[serde(default)]
        target_id: Option<EntityId>,
    },
    Rest {
        rest_type: RestType,
    },
    EndTurn,
    Explore,
}

/// An immutable, fully specified action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    actor_id: EntityId,
    #[serde(flatten)]
    kind: ActionKind,
}

impl Action {
    pub fn move_to(actor_id: impl Into<EntityId>, room_id: impl Into<String>) -> Self {
        Self::new(actor_id, ActionKind::Move { room_id: room_id.into() })
    }

    pub fn attack(actor_id: impl Into<EntityId>, target_id: impl Into<EntityId>, attack_id: impl Into<String>) -> Self {
        Self::new(
            actor_id,
            ActionKind::Attack {
                target_id: target_id.into(),
                attack_id: attack_id.into(),
            },
        )
    }

    pub fn cast_spell(actor_id: impl Into<EntityId>, spell_id: impl Into<String>, target_id: Option<EntityId>) -> Self {
        Self::new(
            actor_id,
            ActionKind::CastSpell {
                spell_id: spell_id.into(),
                target_id,
            },
        )
    }

    pub fn rest(actor_id: impl Into<EntityId>, rest_type: RestType) -> Self {
        Self::new(actor_id, ActionKind::Rest { rest_type })
    }

    pub fn end_turn(actor_id: impl Into<EntityId>) -> Self {
        Self::new(actor_id, ActionKind::EndTurn)
    }

    pub fn explore(actor_id: impl Into<EntityId>) -> Self {
        Self::new(actor_id, ActionKind::Explore)
    }

    fn new(actor_id: impl Into<EntityId>, kind: ActionKind) -> Self {
        Self {
            actor_id: actor_id.into(),
            kind,
        }
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn action_type(&self) -> ActionType {
        match self.kind {
            ActionKind::Move { .. } => ActionType::Move,
            ActionKind::Attack { .. } => ActionType::Attack,
            ActionKind::CastSpell { .. } => ActionType::CastSpell,
            ActionKind::Rest { .. } => ActionType::Rest,
            ActionKind::EndTurn => ActionType::EndTurn,
            ActionKind::Explore => ActionType::Explore,
        }
    }

    /// The target id: a room for moves, an entity for attacks and single-target spells.
    pub fn target_id(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Move { room_id } => Some(room_id),
            ActionKind::Attack { target_id, .. } => Some(target_id),
            ActionKind::CastSpell { target_id, .. } => target_id.as_deref(),
            _ => None,
        }
    }

    pub fn attack_id(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Attack { attack_id, .. } => Some(attack_id),
            _ => None,
        }
    }

    pub fn spell_id(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::CastSpell { spell_id, .. } => Some(spell_id),
            _ => None,
        }
    }

    pub fn rest_type(&self) -> Option<RestType> {
        match self.kind {
            ActionKind::Rest { rest_type } => Some(rest_type),
            _ => None,
        }
    }
}
