use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use duet_engine::{
    AchievementList, ContentCatalog, PartnerCode, ProgressPayload, ProgressState, RemotePartner,
    RemoteSnapshot, RemoteSync, StateStore,
};
use log::debug;
use thiserror::Error;

use crate::logic::policy::UsageStyle;
use crate::logic::simulation::{DayDirectives, DayOutcome, DecisionRecord, SimulationConfig, SimulationSession};

/// In-memory state store shared between the harness and the engine.
///
/// Clones share the same slot, so the harness can inspect what the engine
/// persisted and a rebuilt engine reloads exactly what its predecessor saved.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<ProgressState>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn persisted(&self) -> Option<ProgressState> {
        self.slot.borrow().clone()
    }
}

impl StateStore for MemoryStore {
    type Error = Infallible;

    fn load(&self) -> Result<Option<ProgressState>, Self::Error> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&self, state: &ProgressState) -> Result<(), Self::Error> {
        *self.slot.borrow_mut() = Some(state.clone());
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum RemoteScriptError {
    #[error("remote refused the progress push")]
    PushRefused,
    #[error("pairing code not recognized")]
    UnknownCode,
}

#[derive(Default)]
struct RemoteInner {
    snapshot: Option<RemoteSnapshot>,
    partner_name: Option<String>,
    accept_links: bool,
    fail_pushes: bool,
    pushes: Vec<ProgressPayload>,
    logins: usize,
}

/// Scriptable remote endpoint.
///
/// A staged snapshot is served exactly once on the next login, mirroring a
/// partner device that synced while this one was offline. Pushes are either
/// recorded or refused wholesale, and link attempts succeed only when the
/// script says a partner is reachable.
#[derive(Clone, Default)]
pub struct ScriptedRemote {
    inner: Rc<RefCell<RemoteInner>>,
}

impl ScriptedRemote {
    pub fn serve_snapshot(&self, snapshot: RemoteSnapshot) {
        self.inner.borrow_mut().snapshot = Some(snapshot);
    }

    pub fn accept_links(&self, name: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.accept_links = true;
        inner.partner_name = Some(name.to_string());
    }

    pub fn refuse_pushes(&self) {
        self.inner.borrow_mut().fail_pushes = true;
    }

    #[must_use]
    pub fn pushes(&self) -> Vec<ProgressPayload> {
        self.inner.borrow().pushes.clone()
    }

    #[must_use]
    pub fn login_count(&self) -> usize {
        self.inner.borrow().logins
    }
}

impl RemoteSync for ScriptedRemote {
    type Error = RemoteScriptError;

    fn login(&self) -> Result<Option<RemoteSnapshot>, Self::Error> {
        let mut inner = self.inner.borrow_mut();
        inner.logins += 1;
        Ok(inner.snapshot.take())
    }

    fn push_progress(&self, payload: &ProgressPayload) -> Result<(), Self::Error> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_pushes {
            return Err(RemoteScriptError::PushRefused);
        }
        inner.pushes.push(payload.clone());
        Ok(())
    }

    fn link_partner(&self, code: &PartnerCode) -> Result<RemotePartner, Self::Error> {
        let inner = self.inner.borrow();
        if inner.accept_links {
            Ok(RemotePartner {
                code: code.clone(),
                name: inner.partner_name.clone(),
            })
        } else {
            Err(RemoteScriptError::UnknownCode)
        }
    }
}

/// What the remote side does over the course of a run.
#[derive(Debug, Clone)]
pub enum RemoteScript {
    /// Logins return nothing, pushes are recorded.
    Quiet,
    /// A snapshot appears on the given day and is served on that day's login.
    SnapshotOnDay { day: u32, snapshot: RemoteSnapshot },
    /// Every push is refused. Sessions must keep working regardless.
    FlakyPush,
    /// Link attempts succeed and report this partner name.
    PartnerAvailable { name: &'static str },
}

type ExpectationFn = Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

/// A check evaluated against the finished run.
#[derive(Clone)]
pub struct SimulationExpectation(ExpectationFn);

impl SimulationExpectation {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SimulationExpectation(..)")
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(check: F) -> Self {
        Self::new(check)
    }
}

/// Full description of one simulated stretch of app usage.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub style: UsageStyle,
    pub days: u32,
    pub remote: RemoteScript,
    /// Tear the engine down and rebuild it from the store every N days.
    pub restart_every: Option<u32>,
    /// Wipe all progress at the start of this day.
    pub reset_on_day: Option<u32>,
    /// Enter this pairing code on the given day.
    pub link_on_day: Option<(u32, &'static str)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(style: UsageStyle) -> Self {
        Self {
            style,
            days: 14,
            remote: RemoteScript::Quiet,
            restart_every: None,
            reset_on_day: None,
            link_on_day: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    #[must_use]
    pub fn with_remote(mut self, remote: RemoteScript) -> Self {
        self.remote = remote;
        self
    }

    #[must_use]
    pub fn with_restart_every(mut self, days: u32) -> Self {
        self.restart_every = Some(days);
        self
    }

    #[must_use]
    pub fn with_reset_on_day(mut self, day: u32) -> Self {
        self.reset_on_day = Some(day);
        self
    }

    #[must_use]
    pub fn with_link_on_day(mut self, day: u32, code: &'static str) -> Self {
        self.link_on_day = Some((day, code));
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Everything a finished run produced, for expectations and reports.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub style: UsageStyle,
    pub days: u32,
    pub day_log: Vec<DayOutcome>,
    pub metrics: UsageMetrics,
    pub final_state: ProgressState,
    pub pushes: Vec<ProgressPayload>,
}

/// Aggregated counters over one run.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UsageMetrics {
    pub days_elapsed: u32,
    pub active_days: u32,
    pub actions_applied: u32,
    pub points_total: u64,
    pub final_streak: u32,
    pub longest_streak: u32,
    pub unlocked: Vec<String>,
    pub cards_liked: usize,
    pub cards_disliked: usize,
    pub cards_tried: usize,
    pub questions_answered: usize,
    pub dates_completed: usize,
    pub coupons_redeemed: usize,
    pub memories_kept: usize,
    pub merges_applied: u32,
    pub pushes_accepted: usize,
    pub deck_exhausted: bool,
    pub invariant_violations: Vec<String>,
    #[serde(skip)]
    pub decision_log: Vec<DecisionRecord>,
}

impl UsageMetrics {
    pub fn record_day(&mut self, outcome: &DayOutcome) {
        self.days_elapsed += 1;
        if outcome.opened {
            self.active_days += 1;
        }
        self.actions_applied += outcome.actions_applied;
        self.longest_streak = self.longest_streak.max(outcome.streak);
        if outcome.merged {
            self.merges_applied += 1;
        }
        self.decision_log.extend(outcome.decisions.iter().cloned());
        self.invariant_violations.extend(outcome.violations.iter().cloned());
    }

    pub fn finalize(&mut self, state: &ProgressState, pushes: &[ProgressPayload], deck_len: usize) {
        self.points_total = state.points;
        self.final_streak = state.streak;
        self.longest_streak = self.longest_streak.max(state.streak);
        self.unlocked = state.unlocked.clone();
        self.cards_liked = state.liked.len();
        self.cards_disliked = state.disliked.len();
        self.cards_tried = state.tried.len();
        self.questions_answered = state.answered.len();
        self.dates_completed = state.completed_dates.len();
        self.coupons_redeemed = state.coupons.redeemed.len();
        self.memories_kept = state.memories.len();
        self.pushes_accepted = pushes.len();
        self.deck_exhausted = deck_len == 0;
    }

    #[must_use]
    pub fn actions_per_active_day(&self) -> f64 {
        if self.active_days == 0 {
            return 0.0;
        }
        f64::from(self.actions_applied) / f64::from(self.active_days)
    }
}

/// Runs simulation plans against a real engine wired to in-memory doubles.
pub struct EngineHarness {
    verbose: bool,
    catalog: ContentCatalog,
    achievements: AchievementList,
}

impl EngineHarness {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            catalog: ContentCatalog::load_from_static(),
            achievements: AchievementList::load_from_static(),
        }
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Drive one plan to completion and collect everything it produced.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let store = MemoryStore::default();
        let remote = ScriptedRemote::default();
        match &plan.remote {
            RemoteScript::Quiet | RemoteScript::SnapshotOnDay { .. } => {}
            RemoteScript::FlakyPush => remote.refuse_pushes(),
            RemoteScript::PartnerAvailable { name } => remote.accept_links(name),
        }

        let config = SimulationConfig::new(plan.style, seed).with_days(plan.days);
        let mut session = SimulationSession::new(
            config,
            store.clone(),
            remote.clone(),
            self.catalog.clone(),
            self.achievements.clone(),
        );
        let mut policy = plan.style.create_policy(seed);

        if self.verbose {
            println!(
                "  {} {} for {} days (seed {})",
                "▶".bright_cyan(),
                plan.style.label().bright_white().bold(),
                plan.days,
                seed
            );
        }

        let mut metrics = UsageMetrics::default();
        let mut day_log = Vec::with_capacity(plan.days as usize);
        for day in 1..=plan.days {
            let directives = directives_for(plan, day);
            let outcome = session.advance(policy.as_mut(), &directives);
            debug!(
                "day {} opened={} actions={} points={} streak={}",
                outcome.day, outcome.opened, outcome.actions_applied, outcome.points, outcome.streak
            );
            metrics.record_day(&outcome);
            day_log.push(outcome);
        }

        let pushes = remote.pushes();
        let deck_len = session.deck_len();
        let final_state = session.into_state();
        metrics.finalize(&final_state, &pushes, deck_len);

        if self.verbose {
            println!(
                "    {} {} active days, {} points, streak {}, {} unlocks",
                "∑".bright_cyan(),
                metrics.active_days,
                metrics.points_total,
                metrics.final_streak,
                metrics.unlocked.len()
            );
        }

        SimulationSummary {
            seed,
            style: plan.style,
            days: plan.days,
            day_log,
            metrics,
            final_state,
            pushes,
        }
    }
}

fn directives_for(plan: &SimulationPlan, day: u32) -> DayDirectives {
    let serve_snapshot = match &plan.remote {
        RemoteScript::SnapshotOnDay { day: snap_day, snapshot } if *snap_day == day => {
            Some(snapshot.clone())
        }
        _ => None,
    };
    let restart_engine = plan
        .restart_every
        .is_some_and(|every| every > 0 && day > 1 && (day - 1) % every == 0);
    let reset_first = plan.reset_on_day == Some(day);
    let link_code = plan
        .link_on_day
        .and_then(|(link_day, code)| (link_day == day).then(|| code.to_string()));
    DayDirectives {
        serve_snapshot,
        restart_engine,
        reset_first,
        link_code,
    }
}
