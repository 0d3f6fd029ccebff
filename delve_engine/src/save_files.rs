//! Save-game discovery and serialization helpers.
//!
//! A save holds the run's [`GlobalGameState`] and, mid-fight, its [`EncounterState`]. Files are
//! named `<slot>-delve-<version>.ron` so slots and versions can be listed without parsing them.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::DELVE_VERSION;
use crate::encounter::EncounterState;
use crate::world::GlobalGameState;

/// Serialized run state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveGame {
    pub version: String,
    pub global: GlobalGameState,
    #[serde(default)]
    pub encounter: Option<EncounterState>,
}

impl SaveGame {
    pub fn new(global: GlobalGameState, encounter: Option<EncounterState>) -> Self {
        Self {
            version: DELVE_VERSION.to_string(),
            global,
            encounter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSlot {
    pub slot: String,
    pub version: String,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

/// Short description of a save, for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSummary {
    pub dungeon_id: String,
    pub room_id: String,
    pub party: Vec<String>,
    pub in_combat: bool,
    pub total_rewards: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveFileStatus {
    Ready,
    VersionMismatch { save_version: String, current_version: String },
    Corrupted { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFileEntry {
    pub slot: String,
    pub version: String,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub summary: Option<SaveSummary>,
    pub status: SaveFileStatus,
}

/// Normalize a user-provided slot name into a filesystem-safe slug.
pub fn sanitize_slot(raw: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() { "save".to_string() } else { slug }
}

/// Path a slot is written to for the running version.
pub fn save_path(dir: &Path, slot: &str) -> PathBuf {
    dir.join(format!("{}-delve-{DELVE_VERSION}.ron", sanitize_slot(slot)))
}

/// Write `save` into `dir` under `slot`, creating the directory as needed.
///
/// # Errors
/// Returns an error if the state cannot be serialized or the file cannot be written.
pub fn write_save(dir: &Path, slot: &str, save: &SaveGame) -> Result<PathBuf> {
    let text = ron::ser::to_string_pretty(save, ron::ser::PrettyConfig::default())
        .context("error converting game state to 'ron' format")?;
    fs::create_dir_all(dir).with_context(|| format!("creating save directory {}", dir.display()))?;
    let path = save_path(dir, slot);
    fs::write(&path, text).with_context(|| format!("writing save file {}", path.display()))?;
    info!("game saved to '{}'", path.display());
    Ok(path)
}

/// Load a save file from disk.
///
/// # Errors
/// Returns an error if the file cannot be read or deserialized.
pub fn load_save_file(path: &Path) -> Result<SaveGame> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading save file {}", path.display()))?;
    ron::from_str::<SaveGame>(&raw).with_context(|| format!("parsing save file {}", path.display()))
}

/// Find and load the newest readable save for `slot` in `dir`.
///
/// A save from another version still loads, with a warning.
///
/// # Errors
/// Returns an error if no file exists for the slot or it cannot be parsed.
pub fn load_slot(dir: &Path, slot: &str) -> Result<SaveGame> {
    let wanted = sanitize_slot(slot);
    let mut matches: Vec<SaveSlot> = collect_save_slots(dir)?
        .into_iter()
        .filter(|s| s.slot == wanted)
        .collect();
    matches.sort_by(|a, b| b.modified.cmp(&a.modified));
    let found = matches
        .first()
        .with_context(|| format!("no save named '{wanted}' in {}", dir.display()))?;
    let save = load_save_file(&found.path)?;
    if save.version != DELVE_VERSION {
        warn!(
            "loaded '{wanted}' (v{}), current version is v{DELVE_VERSION}",
            save.version
        );
    }
    Ok(save)
}

/// Discover save slot files stored in `dir`.
///
/// # Errors
/// Returns an error if the directory contents cannot be read or enumerated.
pub fn collect_save_slots(dir: &Path) -> Result<Vec<SaveSlot>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut slots = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry.with_context(|| format!("enumerating {}", dir.display()))?;
        if let Some(slot) = slot_from_entry(&entry) {
            slots.push(slot);
        }
    }
    slots.sort_by(|a, b| a.slot.cmp(&b.slot).then(a.version.cmp(&b.version)));
    Ok(slots)
}

/// Build descriptive entries for the save files in `dir`, newest first.
///
/// # Errors
/// Returns an error if the directory cannot be read.
pub fn build_save_entries(dir: &Path) -> Result<Vec<SaveFileEntry>> {
    let slots = collect_save_slots(dir)?;
    let mut entries: Vec<_> = slots.into_iter().map(entry_for_slot).collect();
    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then(a.slot.cmp(&b.slot)));
    Ok(entries)
}

fn entry_for_slot(slot: SaveSlot) -> SaveFileEntry {
    let mut version = slot.version.clone();
    let (summary, status) = match load_save_file(&slot.path) {
        Ok(save) => {
            version.clone_from(&save.version);
            let status = if save.version == DELVE_VERSION {
                SaveFileStatus::Ready
            } else {
                SaveFileStatus::VersionMismatch {
                    save_version: save.version.clone(),
                    current_version: DELVE_VERSION.to_string(),
                }
            };
            let summary = SaveSummary {
                dungeon_id: save.global.current_dungeon_id.clone(),
                room_id: save.global.current_room_id.clone(),
                party: save.global.players().map(|p| p.name.clone()).collect(),
                in_combat: save.encounter.is_some(),
                total_rewards: save.global.progression.total_rewards,
            };
            (Some(summary), status)
        },
        Err(err) => {
            warn!("failed to load save '{}' ({}): {err:#}", slot.slot, slot.path.display());
            (
                None,
                SaveFileStatus::Corrupted {
                    message: trim_error(&format!("{err:#}")),
                },
            )
        },
    };

    SaveFileEntry {
        slot: slot.slot,
        version,
        path: slot.path,
        modified: slot.modified,
        summary,
        status,
    }
}

fn slot_from_entry(entry: &fs::DirEntry) -> Option<SaveSlot> {
    let path = entry.path();
    if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("ron") {
        return None;
    }
    let stem = path.file_stem().and_then(|stem| stem.to_str())?;
    let (slot, version) = stem.rsplit_once("-delve-")?;
    if slot.is_empty() {
        return None;
    }
    let modified = entry.metadata().ok().and_then(|meta| meta.modified().ok());
    Some(SaveSlot {
        slot: slot.to_string(),
        version: version.to_string(),
        path,
        modified,
    })
}

/// Describe how long ago a save was written, e.g. "5m ago".
pub fn format_modified(modified: SystemTime) -> String {
    match SystemTime::now().duration_since(modified) {
        Ok(delta) => format_age(delta.as_secs()),
        Err(_) => "in the future".to_string(),
    }
}

fn format_age(secs: u64) -> String {
    match secs {
        0..=4 => "just now".to_string(),
        5..=59 => format!("{secs}s ago"),
        60..=3_599 => format!("{}m ago", secs / 60),
        3_600..=86_399 => format!("{}h ago", secs / 3_600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

/// Clamp verbose error messages to a readable length.
fn trim_error(message: &str) -> String {
    if message.chars().count() <= 120 {
        return message.to_string();
    }
    let mut trimmed: String = message.chars().take(117).collect();
    trimmed.push_str("...");
    trimmed
}
