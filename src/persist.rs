//! Versioned save files
//!
//! A save is a single JSON record: a `meta` table holding the format
//! version and the wall-clock shutdown time, and the serialized game state.
//! Loading is all-or-nothing: any failed check surfaces an error naming
//! what went wrong, and nothing is ever auto-deleted or migrated. Offline
//! catch-up is the engine's job; this layer knows nothing about simulation
//! rules.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::state::GameState;

/// Current save format version. Bump on any incompatible schema change;
/// old versions are rejected, never migrated.
pub const SAVE_VERSION: u32 = 1;

/// Errors that can occur saving or loading state
#[derive(Debug, Error)]
pub enum PersistError {
    /// The file exists but is not a readable record
    #[error("could not decode state data: {0}")]
    Decode(String),
    /// The record has no `meta` table
    #[error("missing 'meta' table in state file")]
    MissingMeta,
    /// The `meta` table has no usable `version` key
    #[error("missing 'version' key in state metadata")]
    MissingVersion,
    /// The record was written by an incompatible format version
    #[error("state file version {found} is not supported (expected {SAVE_VERSION})")]
    UnsupportedVersion { found: i64 },
    /// Encoding the state for writing failed
    #[error("could not encode state data: {0}")]
    Encode(String),
    /// The underlying read or write failed
    #[error("could not access state file: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveMeta {
    version: u32,
    shutdown_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct SaveRecordRef<'a> {
    meta: SaveMeta,
    game: &'a GameState,
}

#[derive(Debug, Deserialize)]
struct SaveRecord {
    meta: SaveMeta,
    game: GameState,
}

/// Write `state` to `path` along with the current wall-clock time, so the
/// next load can advance the game by the real time spent closed.
pub fn save(path: &Path, state: &GameState) -> Result<(), PersistError> {
    let record = SaveRecordRef {
        meta: SaveMeta {
            version: SAVE_VERSION,
            shutdown_time: Utc::now(),
        },
        game: state,
    };
    let body =
        serde_json::to_string_pretty(&record).map_err(|e| PersistError::Encode(e.to_string()))?;
    std::fs::write(path, body)?;
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}

/// Read the record at `path`.
///
/// Returns `Ok(None)` when no file exists there yet; that is a fresh
/// game, not an error. Every other failure names the check that rejected
/// the file so the caller can decide what to do with it.
pub fn load(path: &Path) -> Result<Option<(GameState, DateTime<Utc>)>, PersistError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let doc: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| PersistError::Decode(e.to_string()))?;

    // Validate the envelope before touching the game payload, so a version
    // mismatch is reported as such and not as a shape error.
    let meta = doc.get("meta").ok_or(PersistError::MissingMeta)?;
    let version = meta
        .get("version")
        .and_then(serde_json::Value::as_i64)
        .ok_or(PersistError::MissingVersion)?;
    if version != SAVE_VERSION as i64 {
        return Err(PersistError::UnsupportedVersion { found: version });
    }

    let record: SaveRecord =
        serde_json::from_value(doc).map_err(|e| PersistError::Decode(e.to_string()))?;
    tracing::debug!(path = %path.display(), "state loaded");
    Ok(Some((record.game, record.meta.shutdown_time)))
}
