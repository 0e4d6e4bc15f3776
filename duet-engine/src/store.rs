//! File-backed state store.
//!
//! One pretty-printed JSON snapshot per user at a caller-chosen path.
//! A missing file is a fresh start, not an error; an unreadable or
//! unparseable file surfaces as an error that the engine downgrades to
//! "start from defaults".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::state::ProgressState;
use crate::StateStore;

/// Failures reading or writing the snapshot file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("state file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// [`StateStore`] over a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    type Error = StoreError;

    fn load(&self) -> Result<Option<ProgressState>, Self::Error> {
        let payload = match fs::read_to_string(&self.path) {
            Ok(payload) => payload,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let state = serde_json::from_str(&payload)?;
        Ok(Some(state))
    }

    fn save(&self, state: &ProgressState) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::album::{add_memory, MemoryDraft};
    use crate::coupons::{author_coupon, CouponDraft};
    use crate::planner::{plan_date, DatePlan};
    use crate::tod::Player;

    fn scratch_path(tag: &str) -> PathBuf {
        env::temp_dir().join(format!("duet-store-{tag}-{}.json", std::process::id()))
    }

    fn populated_state() -> ProgressState {
        let mut state = ProgressState::default();
        let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();

        state.points = 120;
        state.streak = 4;
        state.last_active = Some("2026-08-20".parse().unwrap());
        state.liked.insert("idea_a".into());
        state.tried.insert("idea_a".into());
        state.disliked.insert("idea_b".into());
        state.answered.insert("q_easy_01".into());
        state.completed_challenges.insert("ch_week".into());
        state.unlocked.push("first_like".into());
        state.relationship_start = Some("2025-02-14".parse().unwrap());
        state.tod_scores.record_complete(Player::One);

        plan_date(
            &mut state,
            DatePlan {
                date: "2026-09-01".parse().unwrap(),
                time: Some("19:30".into()),
                content_id: Some("idea_a".into()),
                note: Some("anniversary".into()),
            },
        );
        author_coupon(
            &mut state,
            CouponDraft {
                icon: "💆".into(),
                title: "Back massage".into(),
                note: None,
            },
            now,
        );
        add_memory(
            &mut state,
            MemoryDraft {
                kind: "photo".into(),
                date: "2026-08-19".parse().unwrap(),
                title: "Picnic".into(),
                mood: Some("😍".into()),
                ..MemoryDraft::default()
            },
            now,
        );
        state
    }

    #[test]
    fn missing_file_is_a_fresh_start() {
        let store = JsonFileStore::new(scratch_path("missing"));
        let loaded = store.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load_round_trips_every_field() {
        let path = scratch_path("roundtrip");
        let store = JsonFileStore::new(&path);
        let state = populated_state();

        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, state);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_panic() {
        let path = scratch_path("corrupt");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path);
        let result = store.load();
        assert!(matches!(result, Err(StoreError::Serde(_))));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = env::temp_dir().join(format!("duet-store-nest-{}", std::process::id()));
        let path = dir.join("inner").join("state.json");
        let store = JsonFileStore::new(&path);

        store.save(&ProgressState::default()).unwrap();
        assert!(store.load().unwrap().is_some());

        let _ = fs::remove_dir_all(&dir);
    }
}
