//! Loader utilities for building [`Content`] from serialized data.
//!
//! Content is authored as a single RON `ContentDef` file. It is validated as a whole before the
//! engine sees it, so every cross-reference the rules core looks up is known to resolve.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use delve_data::ContentDef;
use log::info;

use crate::content::Content;

/// Read a `ContentDef` from a RON file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid content RON.
pub fn load_content_def(path: &Path) -> Result<ContentDef> {
    let text = fs::read_to_string(path).with_context(|| format!("reading content from '{}'", path.display()))?;
    parse_content_def(&text).with_context(|| format!("parsing content RON from '{}'", path.display()))
}

/// Parse a `ContentDef` from RON text.
///
/// # Errors
/// Returns an error if the text is not valid content RON.
pub fn parse_content_def(text: &str) -> Result<ContentDef> {
    Ok(ron::from_str(text)?)
}

/// Load, validate and index the content file at `path`.
///
/// # Errors
/// Errors bubble up from file IO, deserialization, or content validation.
pub fn load_content(path: &Path) -> Result<Content> {
    let def = load_content_def(path).context("while loading content from file")?;
    validate_content_def(&def)?;
    info!("{} dungeons loaded", def.dungeons.len());
    info!("{} encounters loaded", def.encounters.len());
    info!("{} spells and {} attacks loaded", def.spells.len(), def.attacks.len());
    info!(
        "{} enemy templates, {} classes and {} races loaded",
        def.enemies.len(),
        def.classes.len(),
        def.races.len()
    );
    Ok(Content::new(def))
}

/// Validate a `ContentDef` and return a single aggregated error.
///
/// # Errors
/// Returns an error listing every validation problem found.
pub fn validate_content_def(def: &ContentDef) -> Result<()> {
    let errors = delve_data::validate_content(def);
    if errors.is_empty() {
        return Ok(());
    }
    let details = errors
        .into_iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n");
    bail!("content validation failed:\n{details}");
}
