//! Dice notation (`NdM`, `NdM+K`, `NdM-K`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static DICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)d(\d+)([+\-]\d+)?$").expect("dice notation pattern is valid")
});

/// Reason a dice string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiceNotationError {
    Malformed(String),
    ZeroSides(String),
    OutOfRange(String),
}

impl fmt::Display for DiceNotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiceNotationError::Malformed(raw) => write!(f, "invalid dice notation '{raw}'"),
            DiceNotationError::ZeroSides(raw) => write!(f, "dice notation '{raw}' has zero-sided dice"),
            DiceNotationError::OutOfRange(raw) => write!(f, "dice notation '{raw}' is out of range"),
        }
    }
}

impl std::error::Error for DiceNotationError {}

/// A parsed dice expression: roll `count` dice with `sides` faces and add `modifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceExpr {
    /// Parse standard notation such as `1d6` or `2d8+1`. Surrounding whitespace is ignored.
    ///
    /// ```
    /// use delve_data::DiceExpr;
    ///
    /// let expr = DiceExpr::parse("2d8+1").unwrap();
    /// assert_eq!((expr.count, expr.sides, expr.modifier), (2, 8, 1));
    /// assert!(DiceExpr::parse("d20").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<DiceExpr, DiceNotationError> {
        let trimmed = raw.trim();
        let caps = DICE_PATTERN
            .captures(trimmed)
            .ok_or_else(|| DiceNotationError::Malformed(raw.to_string()))?;
        let out_of_range = || DiceNotationError::OutOfRange(raw.to_string());
        let count = caps[1].parse::<u32>().map_err(|_| out_of_range())?;
        let sides = caps[2].parse::<u32>().map_err(|_| out_of_range())?;
        let modifier = match caps.get(3) {
            Some(m) => m.as_str().parse::<i32>().map_err(|_| out_of_range())?,
            None => 0,
        };
        if sides == 0 {
            return Err(DiceNotationError::ZeroSides(raw.to_string()));
        }
        Ok(DiceExpr { count, sides, modifier })
    }

    /// Smallest and largest possible totals.
    pub fn bounds(&self) -> (i64, i64) {
        let count = i64::from(self.count);
        let modifier = i64::from(self.modifier);
        (count + modifier, count * i64::from(self.sides) + modifier)
    }
}

impl FromStr for DiceExpr {
    type Err = DiceNotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpr::parse(s)
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.count, self.sides),
            m if m > 0 => write!(f, "{}d{}+{m}", self.count, self.sides),
            m => write!(f, "{}d{}{m}", self.count, self.sides),
        }
    }
}

/// Returns `true` if the string is valid dice notation.
pub fn is_valid_dice_notation(raw: &str) -> bool {
    DiceExpr::parse(raw).is_ok()
}

/// Dice notation as it appears in content files, kept as the authored string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiceNotation(pub String);

impl DiceNotation {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Result<DiceExpr, DiceNotationError> {
        DiceExpr::parse(&self.0)
    }
}

impl From<&str> for DiceNotation {
    fn from(value: &str) -> Self {
        DiceNotation(value.to_string())
    }
}

impl fmt::Display for DiceNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
