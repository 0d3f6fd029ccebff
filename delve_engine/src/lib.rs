#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Delve **
//! Turn-based tabletop RPG rules engine: free-text intents in, validated actions and dice-driven
//! outcomes out.

pub const DELVE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Rules core
pub mod action;
pub mod content;
pub mod dice;
pub mod encounter;
pub mod entity;
pub mod intent;
pub mod mapper;
pub mod resolution;
pub mod status;
pub mod validation;
pub mod world;

// Running a game
pub mod config;
pub mod data_paths;
pub mod events;
pub mod loader;
pub mod party;
pub mod repl;
pub mod save_files;
pub mod session;
pub mod style;

#[cfg(test)]
mod fixtures;

// Re-exports for convenience
pub use action::{Action, ActionKind, ActionType, RestType};
pub use config::{EngineConfig, PartyMember, load_config};
pub use content::{Content, ContentRepository};
pub use dice::{DieSource, ScriptedDice, SeededDice, ThreadDice};
pub use encounter::EncounterState;
pub use entity::{Entity, EntityKind};
pub use intent::{IntentParser, ParsedIntent};
pub use loader::load_content;
pub use mapper::{ActionMapper, Mapping};
pub use party::build_party;
pub use repl::run_repl;
pub use resolution::{ResolutionEngine, ResolutionResult};
pub use session::{Session, TurnOutcome, TurnReport};
pub use validation::{ValidationEngine, ValidationResult};
pub use world::{GameMode, GameResult, GlobalGameState};
