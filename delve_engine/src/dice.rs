//! Dice rolling.
//!
//! Every random outcome in the engine goes through a [`DieSource`], so a session can run on the
//! thread RNG, on a seeded generator for replays, or on a fixed script in tests.

use std::collections::VecDeque;

use delve_data::{DiceExpr, DiceNotationError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error(transparent)]
    Notation(#[from] DiceNotationError),
}

/// Source of single die results.
pub trait DieSource {
    /// Roll one die with `sides` faces, returning a value in `1..=sides` (0 for a zero-sided die).
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl<D: DieSource + ?Sized> DieSource for Box<D> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

/// Dice backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDice;

impl DieSource for ThreadDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        rand::rng().random_range(1..=sides)
    }
}

/// Dice backed by a seeded generator; the same seed replays the same rolls.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl DieSource for SeededDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        self.rng.random_range(1..=sides)
    }
}

/// Dice that replay a fixed script of faces.
///
/// Each scripted value is clamped into `1..=sides` for the die being rolled. Once the script runs
/// dry the last value keeps repeating.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    queue: VecDeque<u32>,
    last: u32,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            queue: faces.into_iter().collect(),
            last: 1,
        }
    }

    /// Queue more faces behind the ones not yet rolled.
    pub fn push(&mut self, faces: impl IntoIterator<Item = u32>) {
        self.queue.extend(faces);
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl DieSource for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        if let Some(next) = self.queue.pop_front() {
            self.last = next;
        }
        self.last.clamp(1, sides)
    }
}

/// The outcome of rolling a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: String,
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
}

impl RollResult {
    /// Total floored at zero, the amount actually dealt as damage or healing.
    pub fn amount(&self) -> u32 {
        self.total.max(0).unsigned_abs()
    }
}

/// Roll a parsed expression.
pub fn roll(dice: &mut dyn DieSource, expr: DiceExpr) -> RollResult {
    let rolls: Vec<u32> = (0..expr.count).map(|_| dice.roll_die(expr.sides)).collect();
    let sum: i64 = rolls.iter().map(|r| i64::from(*r)).sum::<i64>() + i64::from(expr.modifier);
    let total = i32::try_from(sum).unwrap_or(if sum < 0 { i32::MIN } else { i32::MAX });
    RollResult {
        expression: expr.to_string(),
        rolls,
        modifier: expr.modifier,
        total,
    }
}

/// Parse and roll dice notation such as `2d8+1`.
///
/// # Errors
/// Returns [`DiceError::Notation`] if the string is not valid dice notation.
pub fn roll_notation(dice: &mut dyn DieSource, notation: &str) -> Result<RollResult, DiceError> {
    let expr = DiceExpr::parse(notation)?;
    Ok(roll(dice, expr))
}

/// Roll a single d20.
pub fn roll_d20(dice: &mut dyn DieSource) -> u32 {
    dice.roll_die(20)
}
