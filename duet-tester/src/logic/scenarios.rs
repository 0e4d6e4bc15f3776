use anyhow::{Result, ensure};
use duet_engine::RemoteSnapshot;

use crate::logic::harness::{RemoteScript, SimulationPlan, SimulationSummary};
use crate::logic::policy::UsageStyle;

/// A named, self-checking simulation plan.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    pub fn new(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Look up a scenario by its canonical name or a short alias.
#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke_scenario()),
        "daily-ritual" | "ritual" => Some(daily_ritual_scenario()),
        "casual-drift" | "casual" => Some(casual_drift_scenario()),
        "collector" | "completionist" => Some(collector_scenario()),
        "weekend-planner" | "planner" => Some(weekend_planner_scenario()),
        "merge-convergence" | "merge" => Some(merge_convergence_scenario()),
        "partner-link" | "link" => Some(partner_link_scenario()),
        "flaky-remote" | "flaky" => Some(flaky_remote_scenario()),
        "restart-resilience" | "restart" => Some(restart_resilience_scenario()),
        "reset-fresh-start" | "reset" => Some(reset_fresh_start_scenario()),
        "deck-exhaustion" | "deck" => Some(deck_exhaustion_scenario()),
        _ => None,
    }
}

/// Canonical scenario names with one-line descriptions, for `--list`.
#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "One week of daily use, streak and points sanity"),
        ("daily-ritual", "A month of unbroken daily sessions through streak_30"),
        ("casual-drift", "Intermittent use, gaps allowed, nothing may corrupt"),
        ("collector", "Aggressive swiping until every card and challenge is done"),
        ("weekend-planner", "Weekend date planning, coupons, and memories"),
        ("merge-convergence", "A partner snapshot lands mid-run and must win"),
        ("partner-link", "Entering a pairing code links the couple"),
        ("flaky-remote", "Every push refused, local progress must not stall"),
        ("restart-resilience", "App restart every day, state survives reloads"),
        ("reset-fresh-start", "Mid-run wipe, the journey restarts cleanly"),
        ("deck-exhaustion", "Deck runs dry and stays consistent afterwards"),
    ]
}

/// Saturdays whose Sunday also falls inside the run. Day 1 is a Monday, so
/// Saturdays are days 6, 13, 20 and so on.
fn completed_weekends(days: u32) -> usize {
    (1..=days).filter(|d| d % 7 == 6 && d + 1 <= days).count()
}

/// Saturdays in even-numbered weeks, when the planner keeps a memory.
fn memory_saturdays(days: u32) -> usize {
    (1..=days)
        .filter(|d| d % 7 == 6 && ((d - 1) / 7) % 2 == 0)
        .count()
}

fn full_days_active(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.metrics.days_elapsed == summary.days,
        "expected {} elapsed days, saw {}",
        summary.days,
        summary.metrics.days_elapsed
    );
    ensure!(
        summary.metrics.active_days == summary.days,
        "expected every day active, saw {}/{}",
        summary.metrics.active_days,
        summary.days
    );
    Ok(())
}

fn unbroken_streak(summary: &SimulationSummary) -> Result<()> {
    let expected = summary.days.saturating_sub(1);
    ensure!(
        summary.metrics.final_streak == expected,
        "expected streak {} after {} unbroken days, saw {}",
        expected,
        summary.days,
        summary.metrics.final_streak
    );
    Ok(())
}

fn unlocked(summary: &SimulationSummary, id: &str) -> bool {
    summary.metrics.unlocked.iter().any(|u| u == id)
}

fn smoke_scenario() -> TestScenario {
    let plan = SimulationPlan::new(UsageStyle::DailyRitual)
        .with_days(7)
        .with_expectation(full_days_active)
        .with_expectation(unbroken_streak)
        .with_expectation(|summary: &SimulationSummary| {
            ensure!(summary.metrics.points_total > 0, "no points earned");
            if summary.days >= 4 {
                ensure!(unlocked(summary, "streak_3"), "streak_3 should unlock by day 4");
            }
            Ok(())
        });
    TestScenario::new("smoke", plan)
}

fn daily_ritual_scenario() -> TestScenario {
    let plan = SimulationPlan::new(UsageStyle::DailyRitual)
        .with_days(32)
        .with_expectation(full_days_active)
        .with_expectation(unbroken_streak)
        .with_expectation(|summary: &SimulationSummary| {
            if summary.days >= 8 {
                ensure!(unlocked(summary, "streak_7"), "streak_7 should unlock by day 8");
            }
            if summary.days >= 31 {
                ensure!(
                    unlocked(summary, "streak_30"),
                    "streak_30 should unlock by day 31"
                );
            }
            Ok(())
        });
    TestScenario::new("daily-ritual", plan)
}

fn casual_drift_scenario() -> TestScenario {
    let plan = SimulationPlan::new(UsageStyle::Casual)
        .with_days(30)
        .with_expectation(|summary: &SimulationSummary| {
            ensure!(
                summary.metrics.days_elapsed == summary.days,
                "expected {} elapsed days, saw {}",
                summary.days,
                summary.metrics.days_elapsed
            );
            ensure!(
                summary.metrics.active_days <= summary.days,
                "more active days than elapsed days"
            );
            ensure!(
                summary.metrics.final_streak <= summary.days.saturating_sub(1),
                "streak cannot exceed the days lived"
            );
            Ok(())
        });
    TestScenario::new("casual-drift", plan)
}

fn collector_scenario() -> TestScenario {
    let plan = SimulationPlan::new(UsageStyle::Collector)
        .with_days(21)
        .with_expectation(full_days_active)
        .with_expectation(|summary: &SimulationSummary| {
            if summary.days >= 5 {
                ensure!(summary.metrics.deck_exhausted, "deck should be empty");
                ensure!(
                    summary.metrics.cards_liked == 14,
                    "collector likes every non-home card, saw {}",
                    summary.metrics.cards_liked
                );
                ensure!(summary.metrics.cards_tried == 4, "outdoor cards count as tried");
                ensure!(summary.metrics.cards_disliked == 4, "home cards get disliked");
                ensure!(unlocked(summary, "first_like"), "first_like missing");
                ensure!(unlocked(summary, "first_try"), "first_try missing");
                ensure!(unlocked(summary, "10_likes"), "10_likes missing");
            }
            if summary.days >= 16 {
                ensure!(
                    summary.final_state.completed_challenges.len() == 8,
                    "every second day takes a challenge, all 8 should be done"
                );
            }
            Ok(())
        });
    TestScenario::new("collector", plan)
}

fn weekend_planner_scenario() -> TestScenario {
    let plan = SimulationPlan::new(UsageStyle::WeekendPlanner)
        .with_days(28)
        .with_expectation(|summary: &SimulationSummary| {
            let weekends = completed_weekends(summary.days);
            ensure!(
                summary.metrics.dates_completed == weekends,
                "expected {} completed dates, saw {}",
                weekends,
                summary.metrics.dates_completed
            );
            ensure!(
                summary.metrics.coupons_redeemed == weekends,
                "expected {} redeemed coupons, saw {}",
                weekends,
                summary.metrics.coupons_redeemed
            );
            let memories = memory_saturdays(summary.days);
            ensure!(
                summary.metrics.memories_kept == memories,
                "expected {} memories, saw {}",
                memories,
                summary.metrics.memories_kept
            );
            if summary.days >= 6 {
                ensure!(
                    summary.final_state.relationship_start.is_some(),
                    "anniversary should be set on the first open day"
                );
            }
            ensure!(
                summary.metrics.points_total >= 25 * weekends as u64,
                "completed dates alone should earn 25 points each"
            );
            Ok(())
        });
    TestScenario::new("weekend-planner", plan)
}

fn merge_convergence_scenario() -> TestScenario {
    const SNAPSHOT_DAY: u32 = 5;
    const REMOTE_POINTS: u64 = 500;
    const REMOTE_STREAK: u32 = 9;
    let plan = SimulationPlan::new(UsageStyle::DailyRitual)
        .with_days(10)
        .with_remote(RemoteScript::SnapshotOnDay {
            day: SNAPSHOT_DAY,
            snapshot: RemoteSnapshot {
                points: REMOTE_POINTS,
                streak: REMOTE_STREAK,
                partner: None,
            },
        })
        .with_expectation(full_days_active)
        .with_expectation(move |summary: &SimulationSummary| {
            if summary.days < SNAPSHOT_DAY {
                ensure!(
                    summary.metrics.merges_applied == 0,
                    "no snapshot served yet, nothing to merge"
                );
                return Ok(());
            }
            ensure!(
                summary.metrics.merges_applied == 1,
                "exactly one merge expected, saw {}",
                summary.metrics.merges_applied
            );
            ensure!(
                summary.metrics.points_total >= REMOTE_POINTS,
                "merged points may never drop below the remote total"
            );
            let expected_streak = REMOTE_STREAK + (summary.days - SNAPSHOT_DAY);
            ensure!(
                summary.metrics.final_streak == expected_streak,
                "streak should continue from the merged value: expected {}, saw {}",
                expected_streak,
                summary.metrics.final_streak
            );
            ensure!(
                unlocked(summary, "streak_7"),
                "merged streak crosses 7, streak_7 should unlock"
            );
            let last_push = summary.pushes.last();
            ensure!(
                last_push.is_some_and(|p| p.points == summary.final_state.points),
                "final push must carry the converged point total"
            );
            Ok(())
        });
    TestScenario::new("merge-convergence", plan)
}

fn partner_link_scenario() -> TestScenario {
    const LINK_DAY: u32 = 2;
    let plan = SimulationPlan::new(UsageStyle::DailyRitual)
        .with_days(5)
        .with_remote(RemoteScript::PartnerAvailable { name: "Sam" })
        .with_link_on_day(LINK_DAY, "ZETA42")
        .with_expectation(move |summary: &SimulationSummary| {
            if summary.days < LINK_DAY {
                return Ok(());
            }
            let partner = &summary.final_state.partner;
            ensure!(partner.is_linked, "partner should be linked");
            ensure!(
                partner.linked_name.as_deref() == Some("Sam"),
                "linked partner name should come from the remote"
            );
            ensure!(
                partner.linked_code.as_ref().map(|c| c.as_str()) == Some("ZETA42"),
                "linked code should be the one entered"
            );
            ensure!(partner.my_code.is_some(), "own pairing code should exist");
            Ok(())
        });
    TestScenario::new("partner-link", plan)
}

fn flaky_remote_scenario() -> TestScenario {
    let plan = SimulationPlan::new(UsageStyle::DailyRitual)
        .with_days(7)
        .with_remote(RemoteScript::FlakyPush)
        .with_expectation(full_days_active)
        .with_expectation(unbroken_streak)
        .with_expectation(|summary: &SimulationSummary| {
            ensure!(
                summary.metrics.pushes_accepted == 0,
                "the remote refuses everything, nothing should land"
            );
            ensure!(
                summary.metrics.points_total > 0,
                "local progress must continue despite push failures"
            );
            Ok(())
        });
    TestScenario::new("flaky-remote", plan)
}

fn restart_resilience_scenario() -> TestScenario {
    let plan = SimulationPlan::new(UsageStyle::DailyRitual)
        .with_days(14)
        .with_restart_every(1)
        .with_expectation(full_days_active)
        .with_expectation(unbroken_streak)
        .with_expectation(|summary: &SimulationSummary| {
            if summary.days >= 8 {
                ensure!(
                    unlocked(summary, "streak_7"),
                    "streak must survive daily restarts"
                );
            }
            Ok(())
        });
    TestScenario::new("restart-resilience", plan)
}

fn reset_fresh_start_scenario() -> TestScenario {
    const RESET_DAY: u32 = 6;
    let plan = SimulationPlan::new(UsageStyle::DailyRitual)
        .with_days(10)
        .with_reset_on_day(RESET_DAY)
        .with_expectation(full_days_active)
        .with_expectation(move |summary: &SimulationSummary| {
            if summary.days < RESET_DAY {
                return Ok(());
            }
            let expected = summary.days - RESET_DAY;
            ensure!(
                summary.metrics.final_streak == expected,
                "streak should rebuild from zero after the wipe: expected {}, saw {}",
                expected,
                summary.metrics.final_streak
            );
            let streak_3_expected = expected >= 3;
            ensure!(
                unlocked(summary, "streak_3") == streak_3_expected,
                "streak_3 after a reset should track only post-reset days"
            );
            if expected < 7 {
                ensure!(
                    !unlocked(summary, "streak_7"),
                    "pre-reset streaks must not leak through the wipe"
                );
            }
            Ok(())
        });
    TestScenario::new("reset-fresh-start", plan)
}

fn deck_exhaustion_scenario() -> TestScenario {
    let plan = SimulationPlan::new(UsageStyle::Collector)
        .with_days(10)
        .with_expectation(full_days_active)
        .with_expectation(|summary: &SimulationSummary| {
            if summary.days < 5 {
                return Ok(());
            }
            ensure!(summary.metrics.deck_exhausted, "deck should run dry");
            ensure!(
                summary.metrics.cards_liked + summary.metrics.cards_disliked == 18,
                "every card should carry a verdict once the deck is empty"
            );
            Ok(())
        });
    TestScenario::new("deck-exhaustion", plan)
}
