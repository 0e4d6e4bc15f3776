//! Date-night planning.
//!
//! Planned entries move to the completed list when the couple follows
//! through; completion is what earns points, so entries only ever move in
//! that direction. Deleting a plan is allowed, deleting history is not
//! done here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::state::ProgressState;

/// One planned or completed date night.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateEntry {
    pub id: u64,
    /// Calendar day of the date.
    pub date: NaiveDate,
    /// Free-text time of day, as entered ("19:30", "after dinner").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Catalogue idea this date was planned from, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Stamped when the date moves to the completed list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields the user fills in when planning a date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePlan {
    pub date: NaiveDate,
    pub time: Option<String>,
    pub content_id: Option<String>,
    pub note: Option<String>,
}

/// Add a new planned date and return its id.
pub fn plan_date(state: &mut ProgressState, plan: DatePlan) -> u64 {
    let id = state.allocate_entry_id();
    state.planned_dates.push(DateEntry {
        id,
        date: plan.date,
        time: plan.time,
        content_id: plan.content_id,
        note: plan.note,
        completed_at: None,
    });
    id
}

/// Move a planned date to the completed list, stamping the completion
/// time. Returns false when no planned entry has this id.
pub fn complete_date(state: &mut ProgressState, id: u64, now: DateTime<Utc>) -> bool {
    let Some(index) = state.planned_dates.iter().position(|entry| entry.id == id) else {
        return false;
    };
    let mut entry = state.planned_dates.remove(index);
    entry.completed_at = Some(now);
    state.completed_dates.push(entry);
    true
}

/// Drop a planned date. Returns false when no planned entry has this id.
pub fn delete_date(state: &mut ProgressState, id: u64) -> bool {
    let before = state.planned_dates.len();
    state.planned_dates.retain(|entry| entry.id != id);
    state.planned_dates.len() != before
}
