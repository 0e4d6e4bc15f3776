//! Engine orchestration.
//!
//! [`ProgressEngine`] owns the aggregate and is the only writer. The
//! presentation layer calls operations, reads state through [`state`],
//! and hears about changes through the `on_change` callback; it never
//! mutates fields directly. Store and remote failures degrade here, at
//! the boundary, so callers only ever see validation errors.
//!
//! [`state`]: ProgressEngine::state

use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::achievements::AchievementList;
use crate::album;
use crate::codes::{CodeError, PartnerCode};
use crate::data::{ContentCatalog, QuestionCard, RouletteKind, RoulettePick};
use crate::ledger::{self, Action, ActionError, ActionOutcome, SwipeDecision};
use crate::queue::CardQueue;
use crate::rng::RngBundle;
use crate::state::ProgressState;
use crate::streak;
use crate::sync::{self, MergeOutcome, ProgressPayload, RemotePartner, RemoteSnapshot};
use crate::{RemoteSync, StateStore};

/// What a session start did.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionReport {
    /// Streak after evaluation and merge.
    pub streak: u32,
    /// The local streak grew by one (yesterday was active).
    pub streak_extended: bool,
    /// The local streak fell back to zero (a day was missed).
    pub streak_reset: bool,
    /// What the remote snapshot changed, all-default when the pull was
    /// skipped or failed.
    pub merged: MergeOutcome,
    /// Achievements unlocked at session start (streak rules, mostly).
    pub unlocked: SmallVec<[String; 2]>,
    /// Lifetime points after the session start.
    pub points: u64,
}

/// Partner linking failures.
#[derive(Debug, Error)]
pub enum LinkError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The entered code is not a well-formed pairing code.
    #[error("invalid pairing code: {0}")]
    Code(#[from] CodeError),
    /// The entered code is this user's own.
    #[error("cannot link to your own pairing code")]
    OwnCode,
    /// The remote either rejected the code or was unreachable.
    #[error("partner link request failed: {0}")]
    Remote(#[source] E),
}

type ChangeCallback = Box<dyn Fn(&ProgressState)>;

/// The progression engine. One per local user.
pub struct ProgressEngine<S: StateStore, R: RemoteSync> {
    store: S,
    remote: R,
    catalog: ContentCatalog,
    achievements: AchievementList,
    state: ProgressState,
    queue: CardQueue,
    rng: RngBundle,
    revision: u64,
    on_change: Option<ChangeCallback>,
}

impl<S: StateStore, R: RemoteSync> ProgressEngine<S, R> {
    /// Build an engine with an entropy seed. Loads persisted state,
    /// degrading a load failure to a fresh start.
    pub fn new(store: S, remote: R, catalog: ContentCatalog, achievements: AchievementList) -> Self {
        let seed = SmallRng::from_entropy().next_u64();
        Self::with_seed(store, remote, catalog, achievements, seed)
    }

    /// Build an engine with a fixed seed, for deterministic replays.
    pub fn with_seed(
        store: S,
        remote: R,
        catalog: ContentCatalog,
        achievements: AchievementList,
        seed: u64,
    ) -> Self {
        let state = match store.load() {
            Ok(Some(state)) => state,
            Ok(None) => ProgressState::default(),
            Err(err) => {
                log::warn!("failed to load saved progress, starting fresh: {err}");
                ProgressState::default()
            }
        };
        let mut queue = CardQueue::new();
        queue.rebuild(&catalog, &state);

        Self {
            store,
            remote,
            catalog,
            achievements,
            state,
            queue,
            rng: RngBundle::from_seed(seed),
            revision: 0,
            on_change: None,
        }
    }

    /// Read-only view of the aggregate.
    #[must_use]
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// The content catalogue this engine serves cards from.
    #[must_use]
    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    /// The achievement list this engine evaluates.
    #[must_use]
    pub fn achievements(&self) -> &AchievementList {
        &self.achievements
    }

    /// Bumped once per successful mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Register the single state-changed signal. The callback runs after
    /// every persisted mutation with the post-mutation state.
    pub fn set_on_change(&mut self, callback: impl Fn(&ProgressState) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    /// Start a session for the given calendar day.
    ///
    /// First run mints the pairing code. The streak evaluates exactly once
    /// against `today`, the remote snapshot is pulled and merged, newly
    /// satisfied achievements unlock, and the swipe deck rebuilds. Calling
    /// this again on the same day changes nothing.
    pub fn begin_session(&mut self, today: NaiveDate) -> SessionReport {
        let points_before = self.state.points;
        let minted = self.ensure_code();

        let change = streak::evaluate(self.state.streak, self.state.last_active, today);
        let streak_touched = self.state.streak != change.streak
            || self.state.last_active != Some(change.last_active);
        self.state.streak = change.streak;
        self.state.last_active = Some(change.last_active);

        let pulled = self.pull_snapshot();
        let merged = match &pulled {
            Some(snapshot) => sync::merge_snapshot(&mut self.state, snapshot),
            None => MergeOutcome::default(),
        };

        let unlocked = ledger::evaluate_unlocks(&mut self.state, &self.achievements);
        self.queue.rebuild(&self.catalog, &self.state);

        if minted || streak_touched || merged.changed_any() || !unlocked.is_empty() {
            self.persist();
        }

        let remote_behind =
            matches!(&pulled, Some(snapshot) if snapshot.points < self.state.points);
        if self.state.points != points_before || remote_behind {
            self.push_progress();
        }

        SessionReport {
            streak: self.state.streak,
            streak_extended: change.extended,
            streak_reset: change.reset,
            merged,
            unlocked,
            points: self.state.points,
        }
    }

    /// Apply one progression action.
    ///
    /// The mutation, its point award, and any achievement unlocks land
    /// together, then the state persists and shareable progress is pushed.
    ///
    /// # Errors
    ///
    /// Validation failures from the ledger ([`ActionError`]); state is
    /// untouched when one comes back.
    pub fn apply(&mut self, action: Action, now: DateTime<Utc>) -> Result<ActionOutcome, ActionError> {
        let shareable_before = ProgressPayload::from_state(&self.state);
        let swiped = matches!(&action, Action::Swipe { .. });

        let outcome = ledger::apply_action(
            &mut self.state,
            &self.catalog,
            &self.achievements,
            action,
            now,
        )?;

        if outcome.applied {
            if swiped {
                self.queue.rebuild(&self.catalog, &self.state);
            }
            self.persist();
            if ProgressPayload::from_state(&self.state) != shareable_before {
                self.push_progress();
            }
        }
        Ok(outcome)
    }

    /// Swipe the card at the head of the deck. `None` when the deck is
    /// exhausted.
    pub fn swipe_next(&mut self, decision: SwipeDecision, now: DateTime<Utc>) -> Option<ActionOutcome> {
        let card_id = self.queue.pop()?;
        self.apply(Action::Swipe { card_id, decision }, now).ok()
    }

    /// Up to the next three card ids in the deck.
    #[must_use]
    pub fn upcoming(&self) -> SmallVec<[&str; 3]> {
        self.queue.peek()
    }

    /// Cards left in the deck under the active filter.
    #[must_use]
    pub fn deck_len(&self) -> usize {
        self.queue.len()
    }

    /// Narrow the deck to one category, or widen it with `None`.
    pub fn set_filter(&mut self, filter: Option<String>) {
        self.queue.set_filter(filter, &self.catalog, &self.state);
    }

    /// Link to a partner by their pairing code.
    ///
    /// The code is validated locally before the remote is asked. On
    /// success the link persists immediately.
    ///
    /// # Errors
    ///
    /// [`LinkError::Code`] for a malformed code, [`LinkError::OwnCode`]
    /// when the user enters their own, [`LinkError::Remote`] when the
    /// service rejects the code or cannot be reached. State is untouched
    /// on every error path.
    pub fn link_partner(&mut self, input: &str) -> Result<RemotePartner, LinkError<R::Error>> {
        let code: PartnerCode = input.parse()?;
        if self.state.partner.my_code.as_ref() == Some(&code) {
            return Err(LinkError::OwnCode);
        }

        let partner = self.remote.link_partner(&code).map_err(LinkError::Remote)?;
        self.state
            .partner
            .link(partner.code.clone(), partner.name.clone());
        self.persist();
        Ok(partner)
    }

    /// Wipe all progression and start over with a freshly minted pairing
    /// code. Nothing is pushed; the remote record is left to the next
    /// session's reconciliation.
    pub fn reset(&mut self, today: NaiveDate) -> SessionReport {
        self.state.clear_all();
        self.ensure_code();

        let change = streak::evaluate(self.state.streak, self.state.last_active, today);
        self.state.streak = change.streak;
        self.state.last_active = Some(change.last_active);

        self.queue.rebuild(&self.catalog, &self.state);
        self.persist();

        SessionReport {
            streak: self.state.streak,
            streak_extended: change.extended,
            streak_reset: change.reset,
            merged: MergeOutcome::default(),
            unlocked: SmallVec::new(),
            points: self.state.points,
        }
    }

    /// A uniformly random unanswered question, optionally narrowed to one
    /// level. `None` when every matching question is already answered.
    #[must_use]
    pub fn next_question(&self, level: Option<&str>) -> Option<&QuestionCard> {
        self.catalog.next_question(
            &mut *self.rng.questions(),
            |id| self.state.answered.contains(id),
            level,
        )
    }

    /// Spin the roulette for a random pick of the given kind.
    #[must_use]
    pub fn spin_roulette(&self, kind: RouletteKind) -> Option<RoulettePick<'_>> {
        self.catalog.spin_roulette(&mut *self.rng.roulette(), kind)
    }

    /// Whole days since the couple got together, if an anchor exists.
    #[must_use]
    pub fn days_together(&self, today: NaiveDate) -> Option<i64> {
        album::days_together(&self.state, today)
    }

    /// Mint the pairing code if this state never had one.
    fn ensure_code(&mut self) -> bool {
        if self.state.partner.my_code.is_some() {
            return false;
        }
        let code = PartnerCode::generate(&mut *self.rng.codes());
        log::debug!("minted pairing code {code}");
        self.state.partner.my_code = Some(code);
        true
    }

    fn pull_snapshot(&self) -> Option<RemoteSnapshot> {
        match self.remote.login() {
            Ok(Some(snapshot)) => {
                log::debug!(
                    "remote snapshot: {} points, streak {}",
                    snapshot.points,
                    snapshot.streak
                );
                Some(snapshot)
            }
            Ok(None) => None,
            Err(err) => {
                log::warn!("session pull failed, continuing local-only: {err}");
                None
            }
        }
    }

    /// Persist and signal. A save failure is logged and swallowed; the
    /// in-memory mutation stands either way.
    fn persist(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        if let Err(err) = self.store.save(&self.state) {
            log::error!("failed to persist progress: {err}");
        }
        if let Some(on_change) = &self.on_change {
            on_change(&self.state);
        }
    }

    /// Fire-and-forget progress push. Failures are logged and dropped;
    /// the next mutation pushes the full payload again anyway.
    fn push_progress(&self) {
        let payload = ProgressPayload::from_state(&self.state);
        log::debug!("pushing progress: {} points", payload.points);
        if let Err(err) = self.remote.push_progress(&payload) {
            log::warn!("progress push failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;
    use crate::ledger::{POINTS_LIKE, POINTS_TRIED};

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn noon(s: &str) -> DateTime<Utc> {
        day(s).and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    fn catalog() -> ContentCatalog {
        ContentCatalog::from_json(
            r#"{
                "ideas": [
                    {"id": "idea_a", "category": "home", "title": "Cook together"},
                    {"id": "idea_b", "category": "outdoor", "title": "Sunrise walk"},
                    {"id": "idea_c", "category": "home", "title": "Blanket fort"}
                ],
                "questions": [
                    {"id": "q_easy_01", "level": "easy", "text": "First impression?"},
                    {"id": "q_easy_02", "level": "easy", "text": "Favourite meal together?"},
                    {"id": "q_deep_01", "level": "deep", "text": "What scares you?"}
                ],
                "challenges": [
                    {"id": "ch_week", "title": "Phone-free evening", "reward": 30}
                ]
            }"#,
        )
        .unwrap()
    }

    #[derive(Clone, Default)]
    struct MemoryStore {
        slot: Rc<RefCell<Option<ProgressState>>>,
        saves: Rc<RefCell<usize>>,
        fail_loads: bool,
        fail_saves: bool,
    }

    impl StateStore for MemoryStore {
        type Error = io::Error;

        fn load(&self) -> Result<Option<ProgressState>, Self::Error> {
            if self.fail_loads {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt"));
            }
            Ok(self.slot.borrow().clone())
        }

        fn save(&self, state: &ProgressState) -> Result<(), Self::Error> {
            if self.fail_saves {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            *self.slot.borrow_mut() = Some(state.clone());
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct StubRemote {
        snapshot: Option<RemoteSnapshot>,
        partner: Option<RemotePartner>,
        fail_login: bool,
        fail_push: bool,
        fail_link: bool,
        pushes: Rc<RefCell<Vec<ProgressPayload>>>,
    }

    impl RemoteSync for StubRemote {
        type Error = io::Error;

        fn login(&self) -> Result<Option<RemoteSnapshot>, Self::Error> {
            if self.fail_login {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "offline"));
            }
            Ok(self.snapshot.clone())
        }

        fn push_progress(&self, payload: &ProgressPayload) -> Result<(), Self::Error> {
            if self.fail_push {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "offline"));
            }
            self.pushes.borrow_mut().push(payload.clone());
            Ok(())
        }

        fn link_partner(&self, code: &PartnerCode) -> Result<RemotePartner, Self::Error> {
            if self.fail_link {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such code"));
            }
            Ok(self.partner.clone().unwrap_or_else(|| RemotePartner {
                code: code.clone(),
                name: Some("Sam".into()),
            }))
        }
    }

    fn engine(store: MemoryStore, remote: StubRemote) -> ProgressEngine<MemoryStore, StubRemote> {
        ProgressEngine::with_seed(store, remote, catalog(), AchievementList::load_from_static(), 7)
    }

    #[test]
    fn first_session_mints_code_and_stamps_day() {
        let store = MemoryStore::default();
        let mut engine = engine(store.clone(), StubRemote::default());

        let report = engine.begin_session(day("2026-08-20"));

        assert_eq!(report.streak, 0);
        assert!(!report.streak_extended);
        assert!(engine.state().partner.my_code.is_some());
        assert_eq!(engine.state().last_active, Some(day("2026-08-20")));
        assert_eq!(*store.saves.borrow(), 1);
        assert_eq!(engine.revision(), 1);
    }

    #[test]
    fn same_day_session_start_is_idempotent() {
        let store = MemoryStore::default();
        let mut engine = engine(store.clone(), StubRemote::default());

        engine.begin_session(day("2026-08-20"));
        let code = engine.state().partner.my_code.clone();
        let revision = engine.revision();

        let repeat = engine.begin_session(day("2026-08-20"));

        assert_eq!(repeat.streak, 0);
        assert_eq!(engine.state().partner.my_code, code);
        assert_eq!(engine.revision(), revision);
        assert_eq!(*store.saves.borrow(), 1);
    }

    #[test]
    fn consecutive_days_extend_and_unlock_streaks() {
        let mut engine = engine(MemoryStore::default(), StubRemote::default());

        engine.begin_session(day("2026-08-20"));
        let d2 = engine.begin_session(day("2026-08-21"));
        assert!(d2.streak_extended);
        assert_eq!(d2.streak, 1);

        engine.begin_session(day("2026-08-22"));
        let d4 = engine.begin_session(day("2026-08-23"));
        assert_eq!(d4.streak, 3);
        assert_eq!(d4.unlocked.as_slice(), ["streak_3"]);
        // streak_3 carries a 15 point reward.
        assert_eq!(engine.state().points, 15);
    }

    #[test]
    fn session_merge_takes_the_larger_counters() {
        let remote = StubRemote {
            snapshot: Some(RemoteSnapshot {
                points: 80,
                streak: 5,
                partner: None,
            }),
            ..StubRemote::default()
        };
        let store = MemoryStore::default();
        *store.slot.borrow_mut() = Some({
            let mut state = ProgressState::default();
            state.points = 100;
            state.streak = 2;
            state.last_active = Some(day("2026-08-20"));
            state.partner.my_code = Some(PartnerCode::from_str("AA11BB").unwrap());
            state
        });

        let mut engine = engine(store, remote.clone());
        let report = engine.begin_session(day("2026-08-20"));

        // Points keep the larger local total plus the streak_3 reward the
        // merged streak newly satisfied.
        assert_eq!(engine.state().points, 115);
        assert_eq!(report.streak, 5);
        assert!(report.merged.streak_changed);
        assert!(!report.merged.points_changed);
        // Remote reported fewer points than local, so the merged total went
        // back out.
        assert_eq!(remote.pushes.borrow().len(), 1);
        assert_eq!(report.unlocked.as_slice(), ["streak_3"]);
    }

    #[test]
    fn failed_pull_leaves_local_state_alone() {
        let remote = StubRemote {
            fail_login: true,
            ..StubRemote::default()
        };
        let mut engine = engine(MemoryStore::default(), remote);

        let report = engine.begin_session(day("2026-08-20"));
        assert_eq!(report.merged, MergeOutcome::default());
        assert_eq!(engine.state().points, 0);
    }

    #[test]
    fn apply_persists_and_pushes_shareable_progress() {
        let store = MemoryStore::default();
        let remote = StubRemote::default();
        let mut engine = engine(store.clone(), remote.clone());
        engine.begin_session(day("2026-08-20"));

        let outcome = engine
            .apply(
                Action::Swipe {
                    card_id: "idea_a".into(),
                    decision: SwipeDecision::Like,
                },
                noon("2026-08-20"),
            )
            .unwrap();

        assert!(outcome.applied);
        assert_eq!(outcome.points, POINTS_LIKE + 10);
        let pushes = remote.pushes.borrow();
        let last = pushes.last().unwrap();
        assert!(last.liked.contains("idea_a"));
        assert_eq!(last.points, engine.state().points);
        assert_eq!(
            store.slot.borrow().as_ref().unwrap().points,
            engine.state().points
        );
    }

    #[test]
    fn noop_repeat_does_not_save_or_push() {
        let store = MemoryStore::default();
        let remote = StubRemote::default();
        let mut engine = engine(store.clone(), remote.clone());
        engine.begin_session(day("2026-08-20"));

        engine
            .apply(
                Action::Swipe {
                    card_id: "idea_a".into(),
                    decision: SwipeDecision::Like,
                },
                noon("2026-08-20"),
            )
            .unwrap();
        let saves = *store.saves.borrow();
        let pushes = remote.pushes.borrow().len();
        let revision = engine.revision();

        let repeat = engine
            .apply(
                Action::Swipe {
                    card_id: "idea_a".into(),
                    decision: SwipeDecision::Dislike,
                },
                noon("2026-08-20"),
            )
            .unwrap();

        assert!(!repeat.applied);
        assert_eq!(*store.saves.borrow(), saves);
        assert_eq!(remote.pushes.borrow().len(), pushes);
        assert_eq!(engine.revision(), revision);
    }

    #[test]
    fn push_failures_never_surface() {
        let remote = StubRemote {
            fail_push: true,
            ..StubRemote::default()
        };
        let mut engine = engine(MemoryStore::default(), remote.clone());
        engine.begin_session(day("2026-08-20"));

        let outcome = engine
            .apply(
                Action::Swipe {
                    card_id: "idea_a".into(),
                    decision: SwipeDecision::Tried,
                },
                noon("2026-08-20"),
            )
            .unwrap();

        assert!(outcome.applied);
        assert_eq!(outcome.points, POINTS_TRIED + 10 + 20);
        assert!(remote.pushes.borrow().is_empty());
    }

    #[test]
    fn save_failures_do_not_abort_mutations() {
        let store = MemoryStore {
            fail_saves: true,
            ..MemoryStore::default()
        };
        let mut engine = engine(store, StubRemote::default());
        engine.begin_session(day("2026-08-20"));

        let outcome = engine
            .apply(
                Action::AnswerQuestion {
                    question_id: "q_easy_01".into(),
                },
                noon("2026-08-20"),
            )
            .unwrap();

        assert!(outcome.applied);
        assert!(engine.state().answered.contains("q_easy_01"));
    }

    #[test]
    fn unreadable_saved_state_degrades_to_fresh() {
        let store = MemoryStore {
            fail_loads: true,
            ..MemoryStore::default()
        };
        let engine = engine(store, StubRemote::default());
        assert_eq!(engine.state().points, 0);
        assert_eq!(engine.deck_len(), 3);
    }

    #[test]
    fn deck_flows_through_swipe_next() {
        let mut engine = engine(MemoryStore::default(), StubRemote::default());
        engine.begin_session(day("2026-08-20"));

        assert_eq!(engine.upcoming().as_slice(), ["idea_a", "idea_b", "idea_c"]);

        let outcome = engine.swipe_next(SwipeDecision::Like, noon("2026-08-20"));
        assert!(outcome.is_some());
        assert!(engine.state().liked.contains("idea_a"));
        assert_eq!(engine.upcoming().as_slice(), ["idea_b", "idea_c"]);

        engine.swipe_next(SwipeDecision::Dislike, noon("2026-08-20"));
        engine.swipe_next(SwipeDecision::Tried, noon("2026-08-20"));
        assert_eq!(engine.swipe_next(SwipeDecision::Like, noon("2026-08-20")), None);
        assert!(engine.state().liked.is_disjoint(&engine.state().disliked));
    }

    #[test]
    fn filter_narrows_the_deck() {
        let mut engine = engine(MemoryStore::default(), StubRemote::default());
        engine.set_filter(Some("home".into()));
        assert_eq!(engine.upcoming().as_slice(), ["idea_a", "idea_c"]);

        engine.set_filter(None);
        assert_eq!(engine.deck_len(), 3);
    }

    #[test]
    fn link_partner_validates_before_calling_out() {
        let mut engine = engine(MemoryStore::default(), StubRemote::default());
        engine.begin_session(day("2026-08-20"));

        assert!(matches!(
            engine.link_partner("nope"),
            Err(LinkError::Code(CodeError::Length))
        ));

        let own = engine.state().partner.my_code.clone().unwrap();
        assert!(matches!(
            engine.link_partner(own.as_str()),
            Err(LinkError::OwnCode)
        ));
        assert!(!engine.state().partner.is_linked);
    }

    #[test]
    fn link_partner_remote_failure_leaves_state_untouched() {
        let remote = StubRemote {
            fail_link: true,
            ..StubRemote::default()
        };
        let mut engine = engine(MemoryStore::default(), remote);
        engine.begin_session(day("2026-08-20"));

        assert!(matches!(
            engine.link_partner("AB12CD"),
            Err(LinkError::Remote(_))
        ));
        assert!(!engine.state().partner.is_linked);
        assert!(engine.state().partner.linked_code.is_none());
    }

    #[test]
    fn link_partner_success_persists_the_link() {
        let store = MemoryStore::default();
        let mut engine = engine(store.clone(), StubRemote::default());
        engine.begin_session(day("2026-08-20"));

        let partner = engine.link_partner("ab12cd").unwrap();
        assert_eq!(partner.code.as_str(), "AB12CD");
        assert!(engine.state().partner.is_linked);
        assert_eq!(
            engine.state().partner.linked_code,
            Some(PartnerCode::from_str("AB12CD").unwrap())
        );
        assert!(store.slot.borrow().as_ref().unwrap().partner.is_linked);
    }

    #[test]
    fn reset_starts_over_with_a_new_code() {
        let mut engine = engine(MemoryStore::default(), StubRemote::default());
        engine.begin_session(day("2026-08-20"));
        engine
            .apply(
                Action::Swipe {
                    card_id: "idea_a".into(),
                    decision: SwipeDecision::Like,
                },
                noon("2026-08-20"),
            )
            .unwrap();
        let old_code = engine.state().partner.my_code.clone().unwrap();

        let report = engine.reset(day("2026-08-20"));

        assert_eq!(report.points, 0);
        assert_eq!(engine.state().points, 0);
        assert!(engine.state().liked.is_empty());
        assert!(engine.state().unlocked.is_empty());
        let new_code = engine.state().partner.my_code.clone().unwrap();
        assert_ne!(new_code, old_code);
        assert_eq!(engine.state().last_active, Some(day("2026-08-20")));
        assert_eq!(engine.deck_len(), 3);
    }

    #[test]
    fn next_question_skips_answered_and_respects_level() {
        let mut engine = engine(MemoryStore::default(), StubRemote::default());
        engine
            .apply(
                Action::AnswerQuestion {
                    question_id: "q_easy_01".into(),
                },
                noon("2026-08-20"),
            )
            .unwrap();

        for _ in 0..20 {
            let question = engine.next_question(Some("easy")).unwrap();
            assert_eq!(question.id, "q_easy_02");
        }
        engine
            .apply(
                Action::AnswerQuestion {
                    question_id: "q_easy_02".into(),
                },
                noon("2026-08-20"),
            )
            .unwrap();
        assert!(engine.next_question(Some("easy")).is_none());
        assert!(engine.next_question(None).is_some());
    }

    #[test]
    fn change_callback_fires_per_mutation() {
        let seen: Rc<RefCell<Vec<u64>>> = Rc::default();
        let mut engine = engine(MemoryStore::default(), StubRemote::default());
        let sink = Rc::clone(&seen);
        engine.set_on_change(move |state| sink.borrow_mut().push(state.points));

        engine.begin_session(day("2026-08-20"));
        engine
            .apply(
                Action::Swipe {
                    card_id: "idea_a".into(),
                    decision: SwipeDecision::Like,
                },
                noon("2026-08-20"),
            )
            .unwrap();

        assert_eq!(seen.borrow().as_slice(), [0, 15]);
    }
}
