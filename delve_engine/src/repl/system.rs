//! Meta-command handlers: help, status, save and load, and quitting.
//!
//! These act on the session around the rules, never through the intent pipeline, so they cost
//! no turn and are available in any mode.

use std::path::Path;

use anyhow::{Result, bail};
use log::info;

use crate::content::ContentRepository;
use crate::save_files::{
    SaveFileStatus, SaveGame, build_save_entries, format_modified, load_slot, sanitize_slot, write_save,
};
use crate::session::Session;

const DEFAULT_SLOT: &str = "quicksave";

/// A REPL command prefixed with `:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Help,
    Status,
    Save(String),
    Load(String),
    ListSaves,
    Quit,
    Unknown(String),
}

/// Parse a meta command, or `None` if the line is ordinary game input.
pub fn parse_meta(line: &str) -> Option<MetaCommand> {
    let rest = line.trim().strip_prefix(':')?;
    let (verb, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let arg = arg.trim();
    let slot = || {
        if arg.is_empty() {
            DEFAULT_SLOT.to_string()
        } else {
            arg.to_string()
        }
    };
    let command = match verb.to_lowercase().as_str() {
        "help" | "h" | "?" => MetaCommand::Help,
        "status" | "st" => MetaCommand::Status,
        "save" => MetaCommand::Save(slot()),
        "load" => MetaCommand::Load(slot()),
        "saves" => MetaCommand::ListSaves,
        "quit" | "q" | "exit" => MetaCommand::Quit,
        other => MetaCommand::Unknown(other.to_string()),
    };
    Some(command)
}

pub fn help_handler() -> Vec<String> {
    [
        "Type what your character does, for example:",
        "  go to the great hall     attack the ghoul with my longsword",
        "  cast fire bolt at ghoul 2     take a short rest     look around     end turn",
        "Meta commands:",
        "  :status          party, room and combat overview",
        "  :save [slot]     save the run",
        "  :load [slot]     restore a saved run",
        "  :saves           list saved runs",
        "  :quit            leave the game",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

/// Save the session's state under `slot`.
///
/// # Errors
/// Returns an error if the save file cannot be written.
pub fn save_handler(session: &Session, dir: &Path, slot: &str) -> Result<String> {
    let save = SaveGame::new(session.global().clone(), session.encounter().cloned());
    let path = write_save(dir, slot, &save)?;
    Ok(format!("Game saved to slot '{}' ({}).", sanitize_slot(slot), path.display()))
}

/// Replace the session's state with the save in `slot`.
///
/// # Errors
/// Returns an error if the slot is missing or unreadable, or belongs to a dungeon the loaded
/// content does not define.
pub fn load_handler(session: &mut Session, dir: &Path, slot: &str) -> Result<Vec<String>> {
    let save = load_slot(dir, slot)?;
    if session.content().dungeon(&save.global.current_dungeon_id).is_none() {
        bail!(
            "save '{}' is for dungeon '{}', which is not in the loaded content",
            sanitize_slot(slot),
            save.global.current_dungeon_id
        );
    }
    session.restore(save.global, save.encounter);
    info!("restored slot '{}'", sanitize_slot(slot));
    let mut lines = vec![format!("Restored slot '{}'.", sanitize_slot(slot))];
    lines.extend(session.status_lines());
    Ok(lines)
}

/// One line per save in `dir`, newest first.
pub fn list_saves_handler(dir: &Path) -> Vec<String> {
    let entries = match build_save_entries(dir) {
        Ok(entries) => entries,
        Err(err) => return vec![format!("Could not read saves in {}: {err:#}", dir.display())],
    };
    if entries.is_empty() {
        return vec!["No saved games found.".to_string()];
    }
    entries
        .iter()
        .map(|entry| {
            let age = entry.modified.map_or_else(|| "unknown".to_string(), format_modified);
            let detail = match (&entry.status, &entry.summary) {
                (SaveFileStatus::Corrupted { message }, _) => format!("unreadable: {message}"),
                (status, Some(summary)) => {
                    let mut text = format!(
                        "{} in {}/{}, {} reward",
                        summary.party.join(" & "),
                        summary.dungeon_id,
                        summary.room_id,
                        summary.total_rewards
                    );
                    if summary.in_combat {
                        text.push_str(", mid-combat");
                    }
                    if let SaveFileStatus::VersionMismatch { save_version, .. } = status {
                        text.push_str(&format!(" (from v{save_version})"));
                    }
                    text
                },
                (_, None) => String::new(),
            };
            format!("{:<16} {:>10}  {detail}", entry.slot, age)
        })
        .collect()
}

/// Close out the run and write its event log.
pub fn quit_handler(session: &mut Session, log_dir: &Path) -> Vec<String> {
    let progression = session.global().progression;
    info!(
        "quitting with {} reward from {} encounters",
        progression.total_rewards, progression.encounters_cleared
    );
    session.abandon();
    let mut lines = vec![format!(
        "You leave the dungeon with {} reward from {} encounters.",
        progression.total_rewards, progression.encounters_cleared
    )];
    match session.save_log(log_dir) {
        Ok(path) => lines.push(format!("Session log written to {}.", path.display())),
        Err(err) => lines.push(format!("Could not write the session log: {err:#}")),
    }
    lines
}
