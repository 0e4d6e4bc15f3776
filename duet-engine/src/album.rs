//! Shared memory album.
//!
//! Memories are free-form entries (a photo, a place, a milestone) pinned
//! to a calendar day. The album also answers the days-together counter,
//! anchored on the configured relationship start or, failing that, the
//! earliest memory.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::state::ProgressState;

/// One album entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    pub id: u64,
    /// Open-ended kind tag ("photo", "place", "milestone").
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Day the memory happened, not the day it was written down.
    pub date: NaiveDate,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Mood pictogram attached to the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// Opaque reference to an attached photo, resolved by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields the user fills in when adding a memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDraft {
    pub kind: String,
    pub date: NaiveDate,
    pub title: String,
    pub note: Option<String>,
    pub mood: Option<String>,
    pub photo_ref: Option<String>,
}

/// Append a new memory and return its id. Title validation happens at the
/// action layer before this runs.
pub fn add_memory(state: &mut ProgressState, draft: MemoryDraft, now: DateTime<Utc>) -> u64 {
    let id = state.allocate_entry_id();
    state.memories.push(Memory {
        id,
        kind: draft.kind,
        date: draft.date,
        title: draft.title,
        note: draft.note,
        mood: draft.mood,
        photo_ref: draft.photo_ref,
        created_at: now,
    });
    id
}

/// Remove a memory. Returns false when no memory has this id.
pub fn delete_memory(state: &mut ProgressState, id: u64) -> bool {
    let before = state.memories.len();
    state.memories.retain(|memory| memory.id != id);
    state.memories.len() != before
}

/// Whole days since the couple got together, never negative. The anchor is
/// the configured relationship start, falling back to the earliest memory;
/// `None` when neither exists.
#[must_use]
pub fn days_together(state: &ProgressState, today: NaiveDate) -> Option<i64> {
    let anchor = state
        .relationship_start
        .or_else(|| state.memories.iter().map(|memory| memory.date).min())?;
    Some((today - anchor).num_days().max(0))
}
