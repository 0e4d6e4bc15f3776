//! Remote reconciliation types and the merge rule.
//!
//! The remote record is a thin mirror of shareable progress, not a second
//! source of truth. On session start the engine pulls a snapshot and folds
//! it in with [`merge_snapshot`]; after local mutations it pushes a
//! [`ProgressPayload`] and ignores the result beyond a log line.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codes::PartnerCode;
use crate::state::ProgressState;
use crate::RemoteSync;

/// Partner identity as the remote service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePartner {
    pub code: PartnerCode,
    pub name: Option<String>,
}

/// What the remote knows about this user at login.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSnapshot {
    pub points: u64,
    pub streak: u32,
    /// Present when the remote has this user linked to a partner.
    pub partner: Option<RemotePartner>,
}

/// Shareable progress pushed after mutations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressPayload {
    pub liked: BTreeSet<String>,
    pub disliked: BTreeSet<String>,
    pub tried: BTreeSet<String>,
    pub answered: BTreeSet<String>,
    pub completed_challenges: BTreeSet<String>,
    pub points: u64,
}

impl ProgressPayload {
    /// Snapshot the shareable slice of the aggregate.
    #[must_use]
    pub fn from_state(state: &ProgressState) -> Self {
        Self {
            liked: state.liked.clone(),
            disliked: state.disliked.clone(),
            tried: state.tried.clone(),
            answered: state.answered.clone(),
            completed_challenges: state.completed_challenges.clone(),
            points: state.points,
        }
    }
}

/// What a merge changed locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MergeOutcome {
    pub points_changed: bool,
    pub streak_changed: bool,
    pub partner_adopted: bool,
}

impl MergeOutcome {
    /// True when the merge touched anything.
    #[must_use]
    pub const fn changed_any(&self) -> bool {
        self.points_changed || self.streak_changed || self.partner_adopted
    }
}

/// Fold a remote snapshot into local state.
///
/// Points and streak are monotonic counters, so each takes the larger
/// side independently. Partner identity is adopted from the remote only
/// when the local state has no link yet; an established local link always
/// wins.
pub fn merge_snapshot(state: &mut ProgressState, snapshot: &RemoteSnapshot) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    if snapshot.points > state.points {
        state.points = snapshot.points;
        outcome.points_changed = true;
    }
    if snapshot.streak > state.streak {
        state.streak = snapshot.streak;
        outcome.streak_changed = true;
    }
    if let Some(remote) = &snapshot.partner {
        if !state.partner.is_linked {
            state
                .partner
                .link(remote.code.clone(), remote.name.clone());
            outcome.partner_adopted = true;
        }
    }

    outcome
}

/// The only operation that genuinely needs a remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("remote sync is unavailable offline")]
pub struct OfflineError;

/// [`RemoteSync`] for running without a backend, the way an
/// unauthenticated session runs. Pulls report no record, pushes are
/// accepted and dropped, partner linking fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

impl RemoteSync for OfflineRemote {
    type Error = OfflineError;

    fn login(&self) -> Result<Option<RemoteSnapshot>, Self::Error> {
        Ok(None)
    }

    fn push_progress(&self, _payload: &ProgressPayload) -> Result<(), Self::Error> {
        Ok(())
    }

    fn link_partner(&self, _code: &PartnerCode) -> Result<RemotePartner, Self::Error> {
        Err(OfflineError)
    }
}
