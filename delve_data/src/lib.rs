//! Shared content model for Delve dungeons, spells, attacks and creatures.

pub mod defs;
pub mod dice;
pub mod status;
pub mod validate;

pub use defs::*;
pub use dice::{DiceExpr, DiceNotationError};
pub use status::StatusKind;
pub use validate::{ValidationError, validate_content};
