//! Durable progression state for one local user.
//!
//! Everything the engine persists lives in [`ProgressState`]. The aggregate
//! owns its collections outright; nothing here borrows from the catalogue or
//! the store. Every field carries a serde default so snapshots written by
//! older builds keep loading after new fields appear.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::achievements::ProgressCounts;
use crate::album::Memory;
use crate::codes::PartnerCode;
use crate::coupons::CouponBook;
use crate::numbers::count_u32;
use crate::planner::DateEntry;
use crate::tod::TodTallies;

/// Version stamp written into every snapshot.
pub const SCHEMA_VERSION: u32 = 1;

/// Pairing identity and the link to the other half of the couple.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartnerStatus {
    /// Code this user hands to their partner. Generated once at first
    /// session start and kept stable until an explicit reset.
    pub my_code: Option<PartnerCode>,
    /// Code of the linked partner, if any.
    pub linked_code: Option<PartnerCode>,
    /// Display name of the linked partner.
    pub linked_name: Option<String>,
    /// Whether a link is currently established.
    pub is_linked: bool,
}

impl PartnerStatus {
    /// Record a successful link with the given partner.
    pub fn link(&mut self, code: PartnerCode, name: Option<String>) {
        self.linked_code = Some(code);
        self.linked_name = name;
        self.is_linked = true;
    }
}

/// The whole durable state of one user's shared journey.
///
/// A fresh state is all zeroes and empty collections; the first session
/// start stamps `last_active` and mints `partner.my_code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressState {
    pub schema_version: u32,
    /// Lifetime points. Only ever grows; merges take the larger side.
    pub points: u64,
    /// Consecutive-day streak counter.
    pub streak: u32,
    /// Calendar day of the most recent session start.
    pub last_active: Option<NaiveDate>,
    /// Card ids swiped right. Disjoint from `disliked` by construction.
    pub liked: BTreeSet<String>,
    /// Card ids swiped left.
    pub disliked: BTreeSet<String>,
    /// Card ids marked as actually tried. Subset of nothing; a tried
    /// swipe records the like alongside.
    pub tried: BTreeSet<String>,
    /// Question ids already answered.
    pub answered: BTreeSet<String>,
    /// Challenge ids already completed.
    pub completed_challenges: BTreeSet<String>,
    /// Achievement ids in unlock order. Each id appears at most once.
    pub unlocked: Vec<String>,
    pub partner: PartnerStatus,
    pub planned_dates: Vec<DateEntry>,
    pub completed_dates: Vec<DateEntry>,
    pub coupons: CouponBook,
    pub memories: Vec<Memory>,
    pub tod_scores: TodTallies,
    /// Anniversary anchor for the days-together counter.
    pub relationship_start: Option<NaiveDate>,
    /// Next id handed out for locally-authored entries.
    pub next_entry_id: u64,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            points: 0,
            streak: 0,
            last_active: None,
            liked: BTreeSet::new(),
            disliked: BTreeSet::new(),
            tried: BTreeSet::new(),
            answered: BTreeSet::new(),
            completed_challenges: BTreeSet::new(),
            unlocked: Vec::new(),
            partner: PartnerStatus::default(),
            planned_dates: Vec::new(),
            completed_dates: Vec::new(),
            coupons: CouponBook::default(),
            memories: Vec::new(),
            tod_scores: TodTallies::default(),
            relationship_start: None,
            next_entry_id: 1,
        }
    }
}

impl ProgressState {
    /// Counters feeding the achievement rules.
    #[must_use]
    pub fn counts(&self) -> ProgressCounts {
        ProgressCounts {
            likes: count_u32(self.liked.len()),
            tries: count_u32(self.tried.len()),
            questions: count_u32(self.answered.len()),
            streak: self.streak,
        }
    }

    /// True when a swipe decision for this card is already on record.
    #[must_use]
    pub fn has_decided(&self, card_id: &str) -> bool {
        self.liked.contains(card_id) || self.disliked.contains(card_id)
    }

    /// True when the achievement was already unlocked.
    #[must_use]
    pub fn is_unlocked(&self, achievement_id: &str) -> bool {
        self.unlocked.iter().any(|id| id == achievement_id)
    }

    /// Add to the lifetime point total.
    pub fn award_points(&mut self, delta: u64) {
        self.points = self.points.saturating_add(delta);
    }

    /// Hand out the next id for an authored entry. Ids are unique within
    /// this state for the life of the snapshot.
    pub fn allocate_entry_id(&mut self) -> u64 {
        let id = self.next_entry_id;
        self.next_entry_id = self.next_entry_id.saturating_add(1);
        id
    }

    /// Wipe all progression. Minting the fresh pairing code afterwards is
    /// the engine's job; this only clears the data.
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }
}
