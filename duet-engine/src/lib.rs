//! Duet Progression Engine
//!
//! Platform-agnostic core for a couples-activity app: swipe decks,
//! conversation questions, challenges, date planning, coupons, memories,
//! and the progression economy (points, streaks, achievements) tying them
//! together. This crate owns the durable state and its rules; rendering,
//! gestures, and network transport live with the embedding platform.

pub mod achievements;
pub mod album;
pub mod codes;
pub mod coupons;
pub mod data;
pub mod engine;
pub mod ledger;
pub mod numbers;
pub mod planner;
pub mod queue;
pub mod rng;
pub mod state;
pub mod store;
pub mod streak;
pub mod sync;
pub mod tod;

// Re-export commonly used types
pub use achievements::{AchievementDef, AchievementList, ProgressCounts, Rule};
pub use album::{Memory, MemoryDraft, add_memory, days_together, delete_memory};
pub use codes::{CODE_ALPHABET, CODE_LEN, CodeError, PartnerCode};
pub use coupons::{Coupon, CouponBook, CouponDraft, author_coupon, redeem_coupon, share_coupon};
pub use data::{ChallengeCard, ContentCatalog, IdeaCard, QuestionCard, RouletteKind, RoulettePick};
pub use engine::{LinkError, ProgressEngine, SessionReport};
pub use ledger::{Action, ActionError, ActionOutcome, SwipeDecision, apply_action, evaluate_unlocks};
pub use planner::{DateEntry, DatePlan, complete_date, delete_date, plan_date};
pub use queue::CardQueue;
pub use rng::{CountingRng, RngBundle, derive_stream_seed};
pub use state::{PartnerStatus, ProgressState, SCHEMA_VERSION};
pub use store::{JsonFileStore, StoreError};
pub use streak::StreakChange;
pub use sync::{
    MergeOutcome, OfflineRemote, ProgressPayload, RemotePartner, RemoteSnapshot, merge_snapshot,
};
pub use tod::{Player, TodTallies};

/// Durable storage for the progression aggregate.
/// Platform-specific implementations should provide this.
pub trait StateStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the persisted snapshot, `None` when none exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot exists but cannot be read or parsed.
    fn load(&self) -> Result<Option<ProgressState>, Self::Error>;

    /// Persist the snapshot, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, state: &ProgressState) -> Result<(), Self::Error>;
}

/// The remote progress record, behind whatever transport the platform has.
/// The engine treats every call as best-effort; see the reconciliation
/// rules in [`sync`].
pub trait RemoteSync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Authenticate and fetch the remote snapshot for this user. `None`
    /// when the remote has no record yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached or rejects the
    /// session.
    fn login(&self) -> Result<Option<RemoteSnapshot>, Self::Error>;

    /// Upload the full shareable progress payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails; the engine logs and drops it.
    fn push_progress(&self, payload: &ProgressPayload) -> Result<(), Self::Error>;

    /// Ask the service to link this user to the partner owning `code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is unknown to the service or the
    /// request fails.
    fn link_partner(&self, code: &PartnerCode) -> Result<RemotePartner, Self::Error>;
}
