use std::fmt;

use chrono::Weekday;
use duet_engine::{IdeaCard, Player, ProgressState, SwipeDecision};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// A single swipe verdict together with an optional rationale for reports.
#[derive(Debug, Clone)]
pub struct SwipeCall {
    pub decision: SwipeDecision,
    pub rationale: Option<String>,
}

impl SwipeCall {
    pub fn new(decision: SwipeDecision) -> Self {
        Self {
            decision,
            rationale: None,
        }
    }

    pub fn with_rationale(decision: SwipeDecision, rationale: impl Into<String>) -> Self {
        Self {
            decision,
            rationale: Some(rationale.into()),
        }
    }
}

/// Non-swipe engine actions a simulated user may take on a given day.
///
/// Each variant is translated into a concrete [`duet_engine::Action`] against
/// the live state, so policies stay declarative about intent.
#[derive(Debug, Clone)]
pub enum ExtraMove {
    TakeChallenge,
    PlanWeekendDate,
    CompleteDueDate,
    AuthorCoupon,
    ShareLatestCoupon,
    RedeemNextCoupon,
    AddMemory,
    TodRound { player: Player, complete: bool },
    SetAnniversary { days_ago: u64 },
}

/// Drives one simulated user through a day of app usage.
///
/// Policies own their randomness so two policies created from the same seed
/// replay identical sessions.
pub trait UserPolicy {
    /// Short name used in decision records and failure output.
    fn name(&self) -> &'static str;

    /// Whether the user opens the app at all on this day.
    fn opens_app(&mut self, day: u32, weekday: Weekday) -> bool;

    /// How many cards the user is willing to swipe through today.
    fn swipe_budget(&mut self, day: u32) -> usize;

    /// Verdict for the card currently on top of the deck.
    fn judge_card(&mut self, state: &ProgressState, card: &IdeaCard) -> SwipeCall;

    /// Conversation level the user wants a question from today, if any.
    fn question_level(&mut self, day: u32) -> Option<&'static str>;

    /// Everything beyond swiping and questions the user does today.
    fn extra_moves(&mut self, day: u32, weekday: Weekday, state: &ProgressState) -> Vec<ExtraMove>;
}

/// Named usage styles selectable by scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageStyle {
    /// Opens the app most days, drifts in and out, low commitment.
    Casual,
    /// Opens every single day and works through a fixed routine.
    DailyRitual,
    /// Swipes aggressively until the deck is empty, chasing unlocks.
    Collector,
    /// Quiet on weekdays, plans and completes dates on weekends.
    WeekendPlanner,
}

impl UsageStyle {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Casual => "Casual",
            Self::DailyRitual => "Daily Ritual",
            Self::Collector => "Collector",
            Self::WeekendPlanner => "Weekend Planner",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn UserPolicy + Send> {
        match self {
            Self::Casual => Box::new(CasualPolicy::new(seed)),
            Self::DailyRitual => Box::new(DailyRitualPolicy::new(seed)),
            Self::Collector => Box::new(CollectorPolicy::new(seed)),
            Self::WeekendPlanner => Box::new(WeekendPlannerPolicy::new(seed)),
        }
    }
}

impl fmt::Display for UsageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Low-commitment user. Skips days, swipes a little, rarely digs deeper.
pub struct CasualPolicy {
    rng: ChaCha20Rng,
}

impl CasualPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl UserPolicy for CasualPolicy {
    fn name(&self) -> &'static str {
        "casual"
    }

    fn opens_app(&mut self, _day: u32, _weekday: Weekday) -> bool {
        self.rng.gen_bool(0.55)
    }

    fn swipe_budget(&mut self, _day: u32) -> usize {
        self.rng.gen_range(0..=2)
    }

    fn judge_card(&mut self, _state: &ProgressState, card: &IdeaCard) -> SwipeCall {
        let roll = self.rng.gen_range(0..10);
        let decision = if roll < 4 {
            SwipeDecision::Like
        } else if roll < 6 {
            SwipeDecision::Tried
        } else {
            SwipeDecision::Dislike
        };
        SwipeCall::with_rationale(decision, format!("rolled {roll} on {}", card.category))
    }

    fn question_level(&mut self, _day: u32) -> Option<&'static str> {
        self.rng.gen_bool(0.4).then_some("easy")
    }

    fn extra_moves(&mut self, _day: u32, _weekday: Weekday, _state: &ProgressState) -> Vec<ExtraMove> {
        if self.rng.gen_bool(0.1) {
            vec![ExtraMove::AddMemory]
        } else {
            Vec::new()
        }
    }
}

/// Opens every day without fail. Two swipes, one question, the occasional
/// challenge and truth-or-dare round. The style that actually builds streaks.
pub struct DailyRitualPolicy {
    rng: ChaCha20Rng,
}

impl DailyRitualPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl UserPolicy for DailyRitualPolicy {
    fn name(&self) -> &'static str {
        "daily-ritual"
    }

    fn opens_app(&mut self, _day: u32, _weekday: Weekday) -> bool {
        true
    }

    fn swipe_budget(&mut self, _day: u32) -> usize {
        2
    }

    fn judge_card(&mut self, _state: &ProgressState, _card: &IdeaCard) -> SwipeCall {
        let roll = self.rng.gen_range(0..10);
        let decision = if roll < 4 {
            SwipeDecision::Like
        } else if roll < 6 {
            SwipeDecision::Tried
        } else {
            SwipeDecision::Dislike
        };
        SwipeCall::new(decision)
    }

    fn question_level(&mut self, day: u32) -> Option<&'static str> {
        Some(if day % 2 == 0 { "deep" } else { "easy" })
    }

    fn extra_moves(&mut self, day: u32, _weekday: Weekday, _state: &ProgressState) -> Vec<ExtraMove> {
        let mut moves = Vec::new();
        if day % 7 == 0 {
            moves.push(ExtraMove::TakeChallenge);
        }
        if day % 3 == 0 {
            let player = if self.rng.gen_bool(0.5) {
                Player::One
            } else {
                Player::Two
            };
            moves.push(ExtraMove::TodRound {
                player,
                complete: true,
            });
        }
        moves
    }
}

/// Burns through the whole deck as fast as the app allows. Verdicts are
/// fixed per category, which makes collector runs fully predictable.
pub struct CollectorPolicy;

impl CollectorPolicy {
    pub fn new(_seed: u64) -> Self {
        Self
    }
}

impl UserPolicy for CollectorPolicy {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn opens_app(&mut self, _day: u32, _weekday: Weekday) -> bool {
        true
    }

    fn swipe_budget(&mut self, _day: u32) -> usize {
        5
    }

    fn judge_card(&mut self, _state: &ProgressState, card: &IdeaCard) -> SwipeCall {
        let decision = match card.category.as_str() {
            "outdoor" => SwipeDecision::Tried,
            "home" => SwipeDecision::Dislike,
            _ => SwipeDecision::Like,
        };
        SwipeCall::with_rationale(decision, format!("category rule for {}", card.category))
    }

    fn question_level(&mut self, day: u32) -> Option<&'static str> {
        Some(match day % 3 {
            0 => "spicy",
            1 => "easy",
            _ => "deep",
        })
    }

    fn extra_moves(&mut self, day: u32, _weekday: Weekday, state: &ProgressState) -> Vec<ExtraMove> {
        let mut moves = Vec::new();
        if day % 2 == 0 && state.completed_challenges.len() < 8 {
            moves.push(ExtraMove::TakeChallenge);
        }
        moves
    }
}

/// Barely touches the app on weekdays, then runs the full weekend routine:
/// plan a date on Saturday, complete it on Sunday, trade coupons along the way.
pub struct WeekendPlannerPolicy {
    rng: ChaCha20Rng,
    anniversary_set: bool,
}

impl WeekendPlannerPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            anniversary_set: false,
        }
    }
}

impl UserPolicy for WeekendPlannerPolicy {
    fn name(&self) -> &'static str {
        "weekend-planner"
    }

    fn opens_app(&mut self, _day: u32, weekday: Weekday) -> bool {
        is_weekend(weekday) || self.rng.gen_bool(0.3)
    }

    fn swipe_budget(&mut self, _day: u32) -> usize {
        if self.rng.gen_bool(0.5) { 1 } else { 0 }
    }

    fn judge_card(&mut self, _state: &ProgressState, card: &IdeaCard) -> SwipeCall {
        let decision = if card.difficulty <= 2 {
            SwipeDecision::Like
        } else {
            SwipeDecision::Dislike
        };
        SwipeCall::new(decision)
    }

    fn question_level(&mut self, _day: u32) -> Option<&'static str> {
        None
    }

    fn extra_moves(&mut self, day: u32, weekday: Weekday, _state: &ProgressState) -> Vec<ExtraMove> {
        let mut moves = Vec::new();
        if !self.anniversary_set {
            self.anniversary_set = true;
            moves.push(ExtraMove::SetAnniversary { days_ago: 400 });
        }
        match weekday {
            Weekday::Sat => {
                moves.push(ExtraMove::PlanWeekendDate);
                moves.push(ExtraMove::AuthorCoupon);
                let week = (day - 1) / 7;
                if week % 2 == 0 {
                    moves.push(ExtraMove::AddMemory);
                }
            }
            Weekday::Sun => {
                moves.push(ExtraMove::CompleteDueDate);
                moves.push(ExtraMove::ShareLatestCoupon);
                moves.push(ExtraMove::RedeemNextCoupon);
            }
            _ => {}
        }
        moves
    }
}
