//! Progression ledger: the closed set of actions that advance state.
//!
//! Every progression mutation enters through [`apply_action`]. Set-backed
//! actions are idempotent (a repeat is a successful no-op with
//! `applied == false`); reference and validation failures are rejected
//! before anything mutates. Point awards and achievement unlocks land in
//! the same logical transaction as the mutation itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::achievements::AchievementList;
use crate::album::{self, MemoryDraft};
use crate::coupons::{self, CouponDraft};
use crate::data::ContentCatalog;
use crate::planner::{self, DatePlan};
use crate::state::ProgressState;
use crate::tod::Player;

/// Points for liking a card.
pub const POINTS_LIKE: u64 = 5;
/// Points for marking a card as actually tried.
pub const POINTS_TRIED: u64 = 20;
/// Points for answering a conversation question.
pub const POINTS_ANSWER: u64 = 10;
/// Points for completing a planned date.
pub const POINTS_COMPLETE_DATE: u64 = 25;
/// Points for authoring a coupon.
pub const POINTS_AUTHOR_COUPON: u64 = 15;
/// Points for redeeming a received coupon.
pub const POINTS_REDEEM_COUPON: u64 = 10;
/// Points for adding a memory to the album.
pub const POINTS_ADD_MEMORY: u64 = 20;
/// Points for completing a truth-or-dare prompt.
pub const POINTS_TOD_COMPLETE: u64 = 5;

/// How a card was swiped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDecision {
    /// Not interested.
    Dislike,
    /// Want to try this.
    Like,
    /// Already tried it; records the like alongside.
    Tried,
}

/// Everything the presentation layer can ask the ledger to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Swipe {
        card_id: String,
        decision: SwipeDecision,
    },
    AnswerQuestion {
        question_id: String,
    },
    CompleteChallenge {
        challenge_id: String,
    },
    PlanDate {
        plan: DatePlan,
    },
    CompleteDate {
        id: u64,
    },
    DeleteDate {
        id: u64,
    },
    AuthorCoupon {
        draft: CouponDraft,
    },
    ShareCoupon {
        id: u64,
    },
    RedeemCoupon {
        id: u64,
    },
    AddMemory {
        draft: MemoryDraft,
    },
    DeleteMemory {
        id: u64,
    },
    TodComplete {
        player: Player,
    },
    TodSkip {
        player: Player,
    },
    SetRelationshipStart {
        date: Option<NaiveDate>,
    },
}

/// Rejected actions. State is untouched whenever one of these comes back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Authored content needs a non-empty title.
    #[error("title must not be empty")]
    EmptyTitle,
    /// The challenge id is not in the content catalogue.
    #[error("unknown challenge id: {0}")]
    UnknownChallenge(String),
    /// No planned date, coupon, or memory carries this id.
    #[error("no entry with id {0}")]
    UnknownEntry(u64),
}

/// What an applied action did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionOutcome {
    /// False when the action was an idempotent repeat.
    pub applied: bool,
    /// Points gained by this action, achievement rewards included.
    pub points_delta: u64,
    /// Lifetime total after the action.
    pub points: u64,
    /// Achievement ids unlocked by this action, in declaration order.
    pub unlocked: SmallVec<[String; 2]>,
}

impl ActionOutcome {
    fn unchanged(points: u64) -> Self {
        Self {
            applied: false,
            points_delta: 0,
            points,
            unlocked: SmallVec::new(),
        }
    }
}

/// Apply one action to the aggregate.
///
/// Validation failures return before any mutation. Idempotent repeats
/// return `applied == false`. Otherwise the mutation, the point award, and
/// any newly-satisfied achievement unlocks all land before returning.
///
/// # Errors
///
/// [`ActionError::EmptyTitle`] for authored content without a title,
/// [`ActionError::UnknownChallenge`] for a challenge id missing from the
/// catalogue, [`ActionError::UnknownEntry`] for id-keyed operations on
/// entries that do not exist.
pub fn apply_action(
    state: &mut ProgressState,
    catalog: &ContentCatalog,
    achievements: &AchievementList,
    action: Action,
    now: DateTime<Utc>,
) -> Result<ActionOutcome, ActionError> {
    let points_before = state.points;
    let mut delta = 0u64;

    match action {
        Action::Swipe { card_id, decision } => {
            if state.has_decided(&card_id) {
                return Ok(ActionOutcome::unchanged(state.points));
            }
            match decision {
                SwipeDecision::Dislike => {
                    state.disliked.insert(card_id);
                }
                SwipeDecision::Like => {
                    state.liked.insert(card_id);
                    delta = POINTS_LIKE;
                }
                SwipeDecision::Tried => {
                    state.liked.insert(card_id.clone());
                    state.tried.insert(card_id);
                    delta = POINTS_TRIED;
                }
            }
        }
        Action::AnswerQuestion { question_id } => {
            if !state.answered.insert(question_id) {
                return Ok(ActionOutcome::unchanged(state.points));
            }
            delta = POINTS_ANSWER;
        }
        Action::CompleteChallenge { challenge_id } => {
            let Some(challenge) = catalog.challenge(&challenge_id) else {
                return Err(ActionError::UnknownChallenge(challenge_id));
            };
            let reward = challenge.reward;
            if !state.completed_challenges.insert(challenge_id) {
                return Ok(ActionOutcome::unchanged(state.points));
            }
            delta = reward;
        }
        Action::PlanDate { plan } => {
            planner::plan_date(state, plan);
        }
        Action::CompleteDate { id } => {
            if !planner::complete_date(state, id, now) {
                return Err(ActionError::UnknownEntry(id));
            }
            delta = POINTS_COMPLETE_DATE;
        }
        Action::DeleteDate { id } => {
            if !planner::delete_date(state, id) {
                return Err(ActionError::UnknownEntry(id));
            }
        }
        Action::AuthorCoupon { draft } => {
            if draft.title.trim().is_empty() {
                return Err(ActionError::EmptyTitle);
            }
            coupons::author_coupon(state, draft, now);
            delta = POINTS_AUTHOR_COUPON;
        }
        Action::ShareCoupon { id } => {
            if !coupons::share_coupon(state, id, now) {
                return Err(ActionError::UnknownEntry(id));
            }
        }
        Action::RedeemCoupon { id } => {
            if !coupons::redeem_coupon(state, id, now) {
                return Err(ActionError::UnknownEntry(id));
            }
            delta = POINTS_REDEEM_COUPON;
        }
        Action::AddMemory { draft } => {
            if draft.title.trim().is_empty() {
                return Err(ActionError::EmptyTitle);
            }
            album::add_memory(state, draft, now);
            delta = POINTS_ADD_MEMORY;
        }
        Action::DeleteMemory { id } => {
            if !album::delete_memory(state, id) {
                return Err(ActionError::UnknownEntry(id));
            }
        }
        Action::TodComplete { player } => {
            state.tod_scores.record_complete(player);
            delta = POINTS_TOD_COMPLETE;
        }
        Action::TodSkip { player } => {
            state.tod_scores.record_skip(player);
        }
        Action::SetRelationshipStart { date } => {
            state.relationship_start = date;
        }
    }

    state.award_points(delta);
    let unlocked = evaluate_unlocks(state, achievements);

    Ok(ActionOutcome {
        applied: true,
        points_delta: state.points.saturating_sub(points_before),
        points: state.points,
        unlocked,
    })
}

/// Unlock every newly-satisfied achievement against current counts,
/// awarding its reward. Returns the unlocked ids in declaration order.
pub fn evaluate_unlocks(
    state: &mut ProgressState,
    achievements: &AchievementList,
) -> SmallVec<[String; 2]> {
    let counts = state.counts();
    let newly = achievements.newly_satisfied(&counts, |id| state.is_unlocked(id));

    let mut unlocked = SmallVec::new();
    for def in newly {
        state.unlocked.push(def.id.clone());
        state.award_points(def.points);
        unlocked.push(def.id.clone());
    }
    unlocked
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap()
    }

    fn catalog() -> ContentCatalog {
        ContentCatalog::from_json(
            r#"{
                "ideas": [
                    {"id": "idea_a", "category": "home", "title": "Cook together"},
                    {"id": "idea_b", "category": "outdoor", "title": "Sunrise walk"}
                ],
                "questions": [
                    {"id": "q_easy_01", "level": "easy", "text": "First impression?"}
                ],
                "challenges": [
                    {"id": "ch_week", "title": "Phone-free evening", "reward": 30}
                ]
            }"#,
        )
        .unwrap()
    }

    fn achievements() -> AchievementList {
        AchievementList::load_from_static()
    }

    fn apply(state: &mut ProgressState, action: Action) -> Result<ActionOutcome, ActionError> {
        apply_action(state, &catalog(), &achievements(), action, now())
    }

    fn swipe(state: &mut ProgressState, card_id: &str, decision: SwipeDecision) -> ActionOutcome {
        apply(
            state,
            Action::Swipe {
                card_id: card_id.into(),
                decision,
            },
        )
        .unwrap()
    }

    #[test]
    fn first_like_awards_points_and_unlocks() {
        let mut state = ProgressState::default();
        let outcome = swipe(&mut state, "idea_a", SwipeDecision::Like);

        assert!(outcome.applied);
        // +5 for the like, +10 for first_like.
        assert_eq!(outcome.points_delta, 15);
        assert_eq!(outcome.points, 15);
        assert_eq!(outcome.unlocked.as_slice(), ["first_like"]);
        assert!(state.liked.contains("idea_a"));
    }

    #[test]
    fn repeated_swipe_is_a_noop() {
        let mut state = ProgressState::default();
        swipe(&mut state, "idea_a", SwipeDecision::Like);
        let repeat = swipe(&mut state, "idea_a", SwipeDecision::Like);

        assert!(!repeat.applied);
        assert_eq!(repeat.points_delta, 0);
        assert_eq!(repeat.points, 15);
        assert!(repeat.unlocked.is_empty());
    }

    #[test]
    fn conflicting_swipe_never_splits_membership() {
        let mut state = ProgressState::default();
        swipe(&mut state, "idea_a", SwipeDecision::Dislike);
        let flip = swipe(&mut state, "idea_a", SwipeDecision::Like);

        assert!(!flip.applied);
        assert!(state.disliked.contains("idea_a"));
        assert!(!state.liked.contains("idea_a"));
        assert!(state.liked.is_disjoint(&state.disliked));
    }

    #[test]
    fn tried_swipe_records_both_sets_and_both_firsts() {
        let mut state = ProgressState::default();
        let outcome = swipe(&mut state, "idea_a", SwipeDecision::Tried);

        assert!(state.liked.contains("idea_a"));
        assert!(state.tried.contains("idea_a"));
        // +20 for the try, +10 first_like, +20 first_try.
        assert_eq!(outcome.points_delta, 50);
        assert_eq!(outcome.unlocked.as_slice(), ["first_like", "first_try"]);
    }

    #[test]
    fn dislike_earns_nothing() {
        let mut state = ProgressState::default();
        let outcome = swipe(&mut state, "idea_a", SwipeDecision::Dislike);
        assert!(outcome.applied);
        assert_eq!(outcome.points_delta, 0);
        assert!(outcome.unlocked.is_empty());
    }

    #[test]
    fn answering_is_idempotent_per_question() {
        let mut state = ProgressState::default();
        let first = apply(
            &mut state,
            Action::AnswerQuestion {
                question_id: "q_easy_01".into(),
            },
        )
        .unwrap();
        // +10 for the answer, +10 for first_question.
        assert_eq!(first.points_delta, 20);
        assert_eq!(first.unlocked.as_slice(), ["first_question"]);

        let repeat = apply(
            &mut state,
            Action::AnswerQuestion {
                question_id: "q_easy_01".into(),
            },
        )
        .unwrap();
        assert!(!repeat.applied);
        assert_eq!(state.points, 20);
    }

    #[test]
    fn challenge_reward_comes_from_the_catalogue() {
        let mut state = ProgressState::default();
        let outcome = apply(
            &mut state,
            Action::CompleteChallenge {
                challenge_id: "ch_week".into(),
            },
        )
        .unwrap();
        assert_eq!(outcome.points_delta, 30);

        let repeat = apply(
            &mut state,
            Action::CompleteChallenge {
                challenge_id: "ch_week".into(),
            },
        )
        .unwrap();
        assert!(!repeat.applied);

        let unknown = apply(
            &mut state,
            Action::CompleteChallenge {
                challenge_id: "ch_nope".into(),
            },
        );
        assert_eq!(
            unknown,
            Err(ActionError::UnknownChallenge("ch_nope".into()))
        );
        assert_eq!(state.points, 30);
    }

    #[test]
    fn date_lifecycle_awards_on_completion_only() {
        let mut state = ProgressState::default();
        let planned = apply(
            &mut state,
            Action::PlanDate {
                plan: DatePlan {
                    date: "2026-09-01".parse().unwrap(),
                    ..DatePlan::default()
                },
            },
        )
        .unwrap();
        assert!(planned.applied);
        assert_eq!(planned.points_delta, 0);

        let id = state.planned_dates[0].id;
        let completed = apply(&mut state, Action::CompleteDate { id }).unwrap();
        assert_eq!(completed.points_delta, POINTS_COMPLETE_DATE);

        assert_eq!(
            apply(&mut state, Action::CompleteDate { id }),
            Err(ActionError::UnknownEntry(id))
        );
    }

    #[test]
    fn empty_titles_are_rejected_before_mutation() {
        let mut state = ProgressState::default();
        let coupon = apply(
            &mut state,
            Action::AuthorCoupon {
                draft: CouponDraft {
                    title: "   ".into(),
                    ..CouponDraft::default()
                },
            },
        );
        assert_eq!(coupon, Err(ActionError::EmptyTitle));
        assert!(state.coupons.authored.is_empty());

        let memory = apply(
            &mut state,
            Action::AddMemory {
                draft: MemoryDraft {
                    title: String::new(),
                    date: "2026-08-19".parse().unwrap(),
                    ..MemoryDraft::default()
                },
            },
        );
        assert_eq!(memory, Err(ActionError::EmptyTitle));
        assert!(state.memories.is_empty());
        assert_eq!(state.points, 0);
    }

    #[test]
    fn coupon_lifecycle_points() {
        let mut state = ProgressState::default();
        apply(
            &mut state,
            Action::AuthorCoupon {
                draft: CouponDraft {
                    icon: "💆".into(),
                    title: "Back massage".into(),
                    note: None,
                },
            },
        )
        .unwrap();
        assert_eq!(state.points, POINTS_AUTHOR_COUPON);

        let id = state.coupons.authored[0].id;
        let shared = apply(&mut state, Action::ShareCoupon { id }).unwrap();
        assert_eq!(shared.points_delta, 0);

        let redeemed = apply(&mut state, Action::RedeemCoupon { id }).unwrap();
        assert_eq!(redeemed.points_delta, POINTS_REDEEM_COUPON);
        assert_eq!(state.points, POINTS_AUTHOR_COUPON + POINTS_REDEEM_COUPON);
    }

    #[test]
    fn tod_scoring_and_skip_floor() {
        let mut state = ProgressState::default();
        let done = apply(
            &mut state,
            Action::TodComplete {
                player: Player::One,
            },
        )
        .unwrap();
        assert_eq!(done.points_delta, POINTS_TOD_COMPLETE);
        assert_eq!(state.tod_scores.player1, 1);

        for _ in 0..3 {
            let skip = apply(
                &mut state,
                Action::TodSkip {
                    player: Player::Two,
                },
            )
            .unwrap();
            assert!(skip.applied);
            assert_eq!(skip.points_delta, 0);
        }
        assert_eq!(state.tod_scores.player2, 0);
        assert_eq!(state.points, POINTS_TOD_COMPLETE);
    }

    #[test]
    fn relationship_start_can_be_set_and_cleared() {
        let mut state = ProgressState::default();
        apply(
            &mut state,
            Action::SetRelationshipStart {
                date: Some("2025-02-14".parse().unwrap()),
            },
        )
        .unwrap();
        assert_eq!(state.relationship_start, Some("2025-02-14".parse().unwrap()));

        apply(&mut state, Action::SetRelationshipStart { date: None }).unwrap();
        assert!(state.relationship_start.is_none());
        assert_eq!(state.points, 0);
    }

    #[test]
    fn memory_deletion_requires_a_real_id() {
        let mut state = ProgressState::default();
        apply(
            &mut state,
            Action::AddMemory {
                draft: MemoryDraft {
                    kind: "photo".into(),
                    date: "2026-08-19".parse().unwrap(),
                    title: "Picnic".into(),
                    ..MemoryDraft::default()
                },
            },
        )
        .unwrap();
        let id = state.memories[0].id;

        assert!(apply(&mut state, Action::DeleteMemory { id }).unwrap().applied);
        assert_eq!(
            apply(&mut state, Action::DeleteMemory { id }),
            Err(ActionError::UnknownEntry(id))
        );
    }

    #[test]
    fn like_milestones_fire_at_their_thresholds() {
        let mut state = ProgressState::default();
        let mut milestone_hits = Vec::new();
        for n in 1..=10 {
            let outcome = swipe(&mut state, &format!("card_{n:02}"), SwipeDecision::Like);
            for id in &outcome.unlocked {
                milestone_hits.push((n, id.clone()));
            }
        }
        assert_eq!(
            milestone_hits,
            vec![
                (1, "first_like".to_string()),
                (10, "10_likes".to_string()),
            ]
        );
        // 10 likes at 5 each, plus the 10 and 25 point unlocks.
        assert_eq!(state.points, 50 + 10 + 25);
    }
}
