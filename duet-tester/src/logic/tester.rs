use std::time::{Duration, Instant};

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::logic::harness::{EngineHarness, SimulationPlan, SimulationSummary, UsageMetrics};
use crate::logic::scenarios::TestScenario;
use crate::logic::simulation::DecisionRecord;
use crate::logic::usage::UsageRecord;

/// Outcome of running one scenario under one base seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub iteration_durations: Vec<Duration>,
    pub performance_data: Vec<UsageMetrics>,
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u128(duration.as_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        durations: &[Duration],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Duration>, D::Error> {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|ms| Duration::from_millis(u64::try_from(ms).unwrap_or(u64::MAX)))
            .collect())
    }
}

/// Runs scenarios across seeds and iterations and grades each run.
pub struct SessionTester {
    harness: EngineHarness,
}

impl SessionTester {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            harness: EngineHarness::new(verbose),
        }
    }

    /// One [`ScenarioResult`] per seed. Each iteration perturbs the seed so a
    /// flaky expectation shows up as a partial failure instead of hiding.
    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> (Vec<ScenarioResult>, Vec<UsageRecord>) {
        let mut results = Vec::with_capacity(seeds.len());
        let mut records = Vec::new();

        for &seed in seeds {
            if self.harness.verbose() {
                println!(
                    "🧪 Testing scenario: {} (seed {})",
                    scenario.name.bright_white(),
                    seed
                );
            }

            let mut failures = Vec::new();
            let mut durations = Vec::with_capacity(iterations);
            let mut performance_data = Vec::with_capacity(iterations);
            let mut successful = 0usize;

            for i in 0..iterations {
                let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
                let started = Instant::now();
                let summary = self.harness.run_plan(&scenario.plan, iteration_seed);
                durations.push(started.elapsed());

                match evaluate_summary(&scenario.plan, &summary) {
                    Ok(()) => {
                        successful += 1;
                        if self.harness.verbose() {
                            println!(
                                "  ✅ Iteration {} passed ({} points, streak {})",
                                i + 1,
                                summary.metrics.points_total,
                                summary.metrics.final_streak
                            );
                        }
                    }
                    Err(reason) => {
                        if self.harness.verbose() {
                            println!("  ❌ Iteration {} failed: {reason}", i + 1);
                        }
                        failures.push(format!(
                            "iteration {} (seed {iteration_seed}): {reason} \
                             [style {}, {} days, {} active, {} points, streak {}, path: {}]",
                            i + 1,
                            summary.style,
                            summary.days,
                            summary.metrics.active_days,
                            summary.metrics.points_total,
                            summary.metrics.final_streak,
                            summarize_decision_path(&summary.metrics.decision_log),
                        ));
                    }
                }

                records.push(UsageRecord {
                    scenario_name: scenario.name.clone(),
                    style: summary.style,
                    seed: iteration_seed,
                    metrics: summary.metrics.clone(),
                });
                performance_data.push(summary.metrics);
            }

            results.push(ScenarioResult {
                scenario_name: scenario.name.clone(),
                passed: failures.is_empty(),
                iterations_run: iterations,
                successful_iterations: successful,
                failures,
                average_duration: average_duration(&durations),
                iteration_durations: durations,
                performance_data,
            });
        }

        (results, records)
    }
}

/// Invariant violations trump expectations: a run that broke the rules fails
/// even if every scripted expectation happens to hold.
fn evaluate_summary(plan: &SimulationPlan, summary: &SimulationSummary) -> Result<(), String> {
    let violations = &summary.metrics.invariant_violations;
    if !violations.is_empty() {
        let shown: Vec<&str> = violations.iter().take(3).map(String::as_str).collect();
        let suffix = if violations.len() > 3 {
            format!(" (+{} more)", violations.len() - 3)
        } else {
            String::new()
        };
        return Err(format!(
            "{} invariant violation(s): {}{suffix}",
            violations.len(),
            shown.join("; ")
        ));
    }

    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Err(err.to_string());
        }
    }
    Ok(())
}

fn average_duration(durations: &[Duration]) -> Duration {
    if durations.is_empty() {
        return Duration::ZERO;
    }
    durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(u32::MAX)
}

/// The last few swipes of a run, oldest first, for failure output.
#[must_use]
pub fn summarize_decision_path(log: &[DecisionRecord]) -> String {
    if log.is_empty() {
        return "no swipes".to_string();
    }
    let mut tail: Vec<String> = log
        .iter()
        .rev()
        .take(3)
        .map(|d| format!("d{} {}:{:?}", d.day, d.card_id, d.decision))
        .collect();
    tail.reverse();
    tail.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::get_scenario;
    use duet_engine::SwipeDecision;

    #[test]
    fn smoke_scenario_passes_under_default_seed() {
        let tester = SessionTester::new(false);
        let scenario = get_scenario("smoke").unwrap();
        let (results, records) = tester.run_scenario(&scenario, &[1337], 2);
        assert_eq!(results.len(), 1);
        assert!(results[0].passed, "failures: {:?}", results[0].failures);
        assert_eq!(results[0].successful_iterations, 2);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn result_serde_round_trips_durations() {
        let result = ScenarioResult {
            scenario_name: "smoke".to_string(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(42),
            iteration_durations: vec![Duration::from_millis(42)],
            performance_data: Vec::new(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: ScenarioResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.average_duration, Duration::from_millis(42));
        assert_eq!(back.iteration_durations, vec![Duration::from_millis(42)]);
    }

    #[test]
    fn decision_path_shows_last_three_oldest_first() {
        let log: Vec<DecisionRecord> = (1..=5)
            .map(|day| DecisionRecord {
                day,
                card_id: format!("card_{day}"),
                decision: SwipeDecision::Like,
                policy_name: "test".to_string(),
                rationale: None,
            })
            .collect();
        let path = summarize_decision_path(&log);
        assert_eq!(path, "d3 card_3:Like | d4 card_4:Like | d5 card_5:Like");
        assert_eq!(summarize_decision_path(&[]), "no swipes");
    }
}
