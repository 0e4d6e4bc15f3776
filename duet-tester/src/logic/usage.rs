use duet_engine::numbers::{u64_to_f64, usize_to_f64};
use serde::{Deserialize, Serialize};

use crate::logic::harness::UsageMetrics;
use crate::logic::policy::UsageStyle;

/// Metrics from one finished run, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct UsageRecord {
    pub scenario_name: String,
    pub style: UsageStyle,
    pub seed: u64,
    pub metrics: UsageMetrics,
}

/// Per-scenario aggregate over every run the tester executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageAggregate {
    pub scenario_name: String,
    pub style: String,
    pub runs: usize,
    pub mean_points: f64,
    pub std_points: f64,
    pub mean_active_days: f64,
    pub mean_actions_per_active_day: f64,
    pub mean_longest_streak: f64,
    pub mean_unlocks: f64,
    pub deck_exhausted_pct: f64,
    pub runs_with_violations: usize,
}

/// Group records by scenario, preserving first-seen order.
#[must_use]
pub fn aggregate_usage(records: &[UsageRecord]) -> Vec<UsageAggregate> {
    let mut order: Vec<&str> = Vec::new();
    for record in records {
        if !order.contains(&record.scenario_name.as_str()) {
            order.push(&record.scenario_name);
        }
    }

    order
        .into_iter()
        .map(|name| {
            let group: Vec<&UsageRecord> =
                records.iter().filter(|r| r.scenario_name == name).collect();
            aggregate_group(name, &group)
        })
        .collect()
}

fn aggregate_group(name: &str, group: &[&UsageRecord]) -> UsageAggregate {
    let points: Vec<f64> = group
        .iter()
        .map(|r| u64_to_f64(r.metrics.points_total))
        .collect();
    let active: Vec<f64> = group
        .iter()
        .map(|r| f64::from(r.metrics.active_days))
        .collect();
    let per_day: Vec<f64> = group
        .iter()
        .map(|r| r.metrics.actions_per_active_day())
        .collect();
    let streaks: Vec<f64> = group
        .iter()
        .map(|r| f64::from(r.metrics.longest_streak))
        .collect();
    let unlocks: Vec<f64> = group
        .iter()
        .map(|r| usize_to_f64(r.metrics.unlocked.len()))
        .collect();
    let exhausted = group.iter().filter(|r| r.metrics.deck_exhausted).count();
    let violated = group
        .iter()
        .filter(|r| !r.metrics.invariant_violations.is_empty())
        .count();

    UsageAggregate {
        scenario_name: name.to_string(),
        style: group
            .first()
            .map(|r| r.style.label().to_string())
            .unwrap_or_default(),
        runs: group.len(),
        mean_points: mean(&points),
        std_points: std_dev(&points),
        mean_active_days: mean(&active),
        mean_actions_per_active_day: mean(&per_day),
        mean_longest_streak: mean(&streaks),
        mean_unlocks: mean(&unlocks),
        deck_exhausted_pct: if group.is_empty() {
            0.0
        } else {
            usize_to_f64(exhausted) / usize_to_f64(group.len()) * 100.0
        },
        runs_with_violations: violated,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / usize_to_f64(values.len())
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / usize_to_f64(values.len() - 1);
    variance.sqrt()
}
