use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag identifying a status effect.
///
/// The rules engine gives meaning to the named kinds. Any other tag found in content or a save
/// file is kept verbatim in `Other` so it survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusKind {
    Poisoned,
    Burned,
    Stunned,
    Fortified,
    Vulnerable,
    Strengthened,
    Weakened,
    Other(String),
}

impl StatusKind {
    /// Parse a status tag. Matching is case-insensitive for the known kinds.
    pub fn from_tag(tag: &str) -> StatusKind {
        match tag.trim().to_lowercase().as_str() {
            "poisoned" => StatusKind::Poisoned,
            "burned" => StatusKind::Burned,
            "stunned" => StatusKind::Stunned,
            "fortified" => StatusKind::Fortified,
            "vulnerable" => StatusKind::Vulnerable,
            "strengthened" => StatusKind::Strengthened,
            "weakened" => StatusKind::Weakened,
            _ => StatusKind::Other(tag.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            StatusKind::Poisoned => "poisoned",
            StatusKind::Burned => "burned",
            StatusKind::Stunned => "stunned",
            StatusKind::Fortified => "fortified",
            StatusKind::Vulnerable => "vulnerable",
            StatusKind::Strengthened => "strengthened",
            StatusKind::Weakened => "weakened",
            StatusKind::Other(tag) => tag,
        }
    }

    /// Kinds that deal their magnitude as damage when the owner's turn starts.
    pub fn deals_damage_over_time(&self) -> bool {
        matches!(self, StatusKind::Poisoned | StatusKind::Burned)
    }
}

impl From<String> for StatusKind {
    fn from(value: String) -> Self {
        StatusKind::from_tag(&value)
    }
}

impl From<StatusKind> for String {
    fn from(value: StatusKind) -> Self {
        value.as_tag().to_string()
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}
