use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use duet_engine::{
    AchievementList, Action, ContentCatalog, CouponDraft, DatePlan, MemoryDraft, PartnerCode,
    ProgressEngine, ProgressState, RemoteSnapshot, SwipeDecision,
};
use log::trace;

use crate::logic::harness::{MemoryStore, ScriptedRemote};
use crate::logic::policy::{ExtraMove, UsageStyle, UserPolicy};

/// Fixed parameters of one simulated run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub style: UsageStyle,
    pub seed: u64,
    pub days: u32,
    /// Calendar date of day 1. A Monday, so weekday-driven policies line up.
    pub start: NaiveDate,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(style: UsageStyle, seed: u64) -> Self {
        Self {
            style,
            seed,
            days: 14,
            start: default_start(),
        }
    }

    #[must_use]
    pub const fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap_or_default()
}

/// One swipe as seen by the simulation, for decision-path reporting.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub day: u32,
    pub card_id: String,
    pub decision: SwipeDecision,
    pub policy_name: String,
    pub rationale: Option<String>,
}

/// Everything that happened on one simulated day.
#[derive(Debug, Clone)]
pub struct DayOutcome {
    pub day: u32,
    pub date: NaiveDate,
    pub opened: bool,
    pub actions_applied: u32,
    pub points: u64,
    pub streak: u32,
    pub merged: bool,
    pub reset: bool,
    pub unlocked: Vec<String>,
    pub decisions: Vec<DecisionRecord>,
    pub violations: Vec<String>,
}

/// Scripted events the harness injects into a particular day.
#[derive(Debug, Clone, Default)]
pub struct DayDirectives {
    pub serve_snapshot: Option<RemoteSnapshot>,
    pub restart_engine: bool,
    pub reset_first: bool,
    pub link_code: Option<String>,
}

impl DayDirectives {
    /// Scripted days happen even if the policy would have stayed away.
    #[must_use]
    pub fn forces_open(&self) -> bool {
        self.reset_first || self.link_code.is_some() || self.serve_snapshot.is_some()
    }
}

/// Cross-day facts the invariant checks compare against.
#[derive(Debug, Default)]
pub struct InvariantHistory {
    last_points: u64,
    last_streak: u32,
    unlocked_count: usize,
    minted_code: Option<PartnerCode>,
}

impl InvariantHistory {
    /// Drop everything after an explicit fresh start.
    pub fn forget(&mut self) {
        *self = Self::default();
    }

    pub fn observe(&mut self, state: &ProgressState) {
        self.last_points = state.points;
        self.last_streak = state.streak;
        self.unlocked_count = state.unlocked.len();
        if self.minted_code.is_none() {
            self.minted_code = state.partner.my_code.clone();
        }
    }
}

/// Check the durable state against the rules every session must preserve.
///
/// Returns human-readable violation strings so scenario failures carry the
/// broken rule instead of a bare assert.
pub fn daily_invariants(
    state: &ProgressState,
    catalog: &ContentCatalog,
    achievements: &AchievementList,
    history: &InvariantHistory,
    merged_today: bool,
) -> Vec<String> {
    let mut violations = Vec::new();

    let overlap: Vec<&String> = state.liked.intersection(&state.disliked).collect();
    if !overlap.is_empty() {
        violations.push(format!("liked and disliked overlap: {overlap:?}"));
    }
    if !state.tried.is_subset(&state.liked) {
        violations.push("tried cards are not all marked liked".to_string());
    }

    if state.points < history.last_points {
        violations.push(format!(
            "points moved backwards: {} -> {}",
            history.last_points, state.points
        ));
    }

    let streak = state.streak;
    let streak_ok = streak == 0
        || streak == history.last_streak
        || streak == history.last_streak + 1
        || (merged_today && streak > history.last_streak);
    if !streak_ok {
        violations.push(format!(
            "streak jumped {} -> {streak} without a merge",
            history.last_streak
        ));
    }

    let mut seen = BTreeSet::new();
    for id in &state.unlocked {
        if achievements.get(id).is_none() {
            violations.push(format!("unknown achievement unlocked: {id}"));
        }
        if !seen.insert(id.as_str()) {
            violations.push(format!("achievement {id} unlocked twice"));
        }
    }
    if state.unlocked.len() < history.unlocked_count {
        violations.push(format!(
            "unlock list shrank: {} -> {}",
            history.unlocked_count,
            state.unlocked.len()
        ));
    }

    if let (Some(minted), Some(current)) = (&history.minted_code, &state.partner.my_code)
        && minted != current
    {
        violations.push(format!(
            "pairing code changed from {minted} to {current}"
        ));
    }

    for id in &state.completed_challenges {
        if catalog.challenge(id).is_none() {
            violations.push(format!("unknown challenge completed: {id}"));
        }
    }

    for coupon in &state.coupons.redeemed {
        if coupon.used_at.is_none() {
            violations.push(format!("redeemed coupon {} has no used_at stamp", coupon.id));
        }
    }

    let mut entry_ids = BTreeSet::new();
    for entry in state.planned_dates.iter().chain(&state.completed_dates) {
        if !entry_ids.insert(entry.id) {
            violations.push(format!("duplicate date entry id {}", entry.id));
        }
    }

    violations
}

/// Turn a policy's declared move into a concrete action against live state.
///
/// Returns `None` when the move has no target right now, e.g. completing a
/// due date with nothing planned. Skipped moves are not errors.
pub fn translate_move(
    state: &ProgressState,
    catalog: &ContentCatalog,
    mv: &ExtraMove,
    today: NaiveDate,
) -> Option<Action> {
    match mv {
        ExtraMove::TakeChallenge => {
            let next = catalog
                .challenges
                .iter()
                .find(|c| !state.completed_challenges.contains(&c.id))?;
            Some(Action::CompleteChallenge {
                challenge_id: next.id.clone(),
            })
        }
        ExtraMove::PlanWeekendDate => {
            let date = today.checked_add_days(Days::new(1))?;
            Some(Action::PlanDate {
                plan: DatePlan {
                    date,
                    time: Some("18:30".to_string()),
                    content_id: state.liked.iter().next().cloned(),
                    note: Some("weekend together".to_string()),
                },
            })
        }
        ExtraMove::CompleteDueDate => {
            let due = state.planned_dates.iter().find(|e| e.date <= today)?;
            Some(Action::CompleteDate { id: due.id })
        }
        ExtraMove::AuthorCoupon => {
            let titles = [
                "Breakfast in bed",
                "Movie night pick",
                "Back rub",
                "Dish duty pass",
            ];
            let title = titles[state.coupons.authored.len() % titles.len()];
            Some(Action::AuthorCoupon {
                draft: CouponDraft {
                    icon: "🎟️".to_string(),
                    title: title.to_string(),
                    note: None,
                },
            })
        }
        ExtraMove::ShareLatestCoupon => {
            let latest = state.coupons.authored.last()?;
            Some(Action::ShareCoupon { id: latest.id })
        }
        ExtraMove::RedeemNextCoupon => {
            let next = state.coupons.received.first()?;
            Some(Action::RedeemCoupon { id: next.id })
        }
        ExtraMove::AddMemory => Some(Action::AddMemory {
            draft: MemoryDraft {
                kind: "moment".to_string(),
                date: today,
                title: format!("Moment {}", state.memories.len() + 1),
                note: None,
                mood: Some("happy".to_string()),
                photo_ref: None,
            },
        }),
        ExtraMove::TodRound { player, complete } => Some(if *complete {
            Action::TodComplete { player: *player }
        } else {
            Action::TodSkip { player: *player }
        }),
        ExtraMove::SetAnniversary { days_ago } => {
            let date = today.checked_sub_days(Days::new(*days_ago))?;
            Some(Action::SetRelationshipStart { date: Some(date) })
        }
    }
}

/// One engine plus its doubles, stepped a day at a time.
pub struct SimulationSession {
    config: SimulationConfig,
    store: MemoryStore,
    remote: ScriptedRemote,
    engine: ProgressEngine<MemoryStore, ScriptedRemote>,
    day: u32,
    history: InvariantHistory,
}

impl SimulationSession {
    #[must_use]
    pub fn new(
        config: SimulationConfig,
        store: MemoryStore,
        remote: ScriptedRemote,
        catalog: ContentCatalog,
        achievements: AchievementList,
    ) -> Self {
        let engine = ProgressEngine::with_seed(
            store.clone(),
            remote.clone(),
            catalog,
            achievements,
            config.seed,
        );
        Self {
            config,
            store,
            remote,
            engine,
            day: 0,
            history: InvariantHistory::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ProgressState {
        self.engine.state()
    }

    #[must_use]
    pub fn deck_len(&self) -> usize {
        self.engine.deck_len()
    }

    #[must_use]
    pub fn into_state(self) -> ProgressState {
        self.engine.state().clone()
    }

    /// Simulate an app restart: a fresh engine re-reads the shared store.
    fn rebuild_engine(&mut self) {
        let catalog = self.engine.catalog().clone();
        let achievements = self.engine.achievements().clone();
        self.engine = ProgressEngine::with_seed(
            self.store.clone(),
            self.remote.clone(),
            catalog,
            achievements,
            self.config.seed.wrapping_add(u64::from(self.day)),
        );
    }

    fn date_of(&self, day: u32) -> NaiveDate {
        self.config
            .start
            .checked_add_days(Days::new(u64::from(day.saturating_sub(1))))
            .unwrap_or(self.config.start)
    }

    /// Advance one calendar day, letting the policy use the app if it opens.
    pub fn advance(&mut self, policy: &mut dyn UserPolicy, directives: &DayDirectives) -> DayOutcome {
        if directives.restart_engine {
            self.rebuild_engine();
        }
        self.day += 1;
        let day = self.day;
        let date = self.date_of(day);
        let weekday = date.weekday();
        let now = noon(date);

        if let Some(snapshot) = &directives.serve_snapshot {
            self.remote.serve_snapshot(snapshot.clone());
        }

        let opened = directives.forces_open() || policy.opens_app(day, weekday);
        if !opened {
            trace!("day {day}: stayed away");
            let state = self.engine.state();
            return DayOutcome {
                day,
                date,
                opened: false,
                actions_applied: 0,
                points: state.points,
                streak: state.streak,
                merged: false,
                reset: false,
                unlocked: Vec::new(),
                decisions: Vec::new(),
                violations: Vec::new(),
            };
        }

        let report = if directives.reset_first {
            self.history.forget();
            self.engine.reset(date)
        } else {
            self.engine.begin_session(date)
        };
        let merged = report.merged.changed_any();
        let mut unlocked: Vec<String> = report.unlocked.iter().cloned().collect();
        let mut violations = Vec::new();
        let mut decisions = Vec::new();
        let mut actions_applied = 0u32;

        if let Some(code) = &directives.link_code {
            match self.engine.link_partner(code) {
                Ok(_) => actions_applied += 1,
                Err(err) => violations.push(format!("day {day}: partner link failed: {err}")),
            }
        }

        let budget = policy.swipe_budget(day);
        for _ in 0..budget {
            let Some(card_id) = self.engine.upcoming().first().map(|id| (*id).to_string()) else {
                break;
            };
            let Some(card) = self.engine.catalog().idea(&card_id).cloned() else {
                violations.push(format!("day {day}: queued card {card_id} not in catalog"));
                break;
            };
            let call = policy.judge_card(self.engine.state(), &card);
            match self.engine.swipe_next(call.decision, now) {
                Some(outcome) => {
                    actions_applied += 1;
                    unlocked.extend(outcome.unlocked.iter().cloned());
                    decisions.push(DecisionRecord {
                        day,
                        card_id,
                        decision: call.decision,
                        policy_name: policy.name().to_string(),
                        rationale: call.rationale,
                    });
                }
                None => break,
            }
        }

        if let Some(level) = policy.question_level(day) {
            let picked = self.engine.next_question(Some(level)).map(|q| q.id.clone());
            if let Some(question_id) = picked {
                match self.engine.apply(Action::AnswerQuestion { question_id }, now) {
                    Ok(outcome) => {
                        actions_applied += 1;
                        unlocked.extend(outcome.unlocked.iter().cloned());
                    }
                    Err(err) => violations.push(format!("day {day}: answer rejected: {err}")),
                }
            }
        }

        for mv in policy.extra_moves(day, weekday, self.engine.state()) {
            let Some(action) = translate_move(self.engine.state(), self.engine.catalog(), &mv, date)
            else {
                continue;
            };
            match self.engine.apply(action, now) {
                Ok(outcome) => {
                    actions_applied += 1;
                    unlocked.extend(outcome.unlocked.iter().cloned());
                }
                Err(err) => violations.push(format!("day {day}: {mv:?} rejected: {err}")),
            }
        }

        violations.extend(self.check_invariants(day, merged));

        let state = self.engine.state();
        DayOutcome {
            day,
            date,
            opened: true,
            actions_applied,
            points: state.points,
            streak: state.streak,
            merged,
            reset: directives.reset_first,
            unlocked,
            decisions,
            violations,
        }
    }

    fn check_invariants(&mut self, day: u32, merged_today: bool) -> Vec<String> {
        let state = self.engine.state();
        let mut violations = daily_invariants(
            state,
            self.engine.catalog(),
            self.engine.achievements(),
            &self.history,
            merged_today,
        );
        for id in self.engine.upcoming() {
            if state.has_decided(id) {
                violations.push(format!("day {day}: decided card {id} still queued"));
            }
            if self.engine.catalog().idea(id).is_none() {
                violations.push(format!("day {day}: queued card {id} not in catalog"));
            }
        }
        self.history.observe(self.engine.state());
        violations
    }
}

fn noon(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(12, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}
