use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use duet_engine::numbers::usize_to_f64;

use crate::logic::tester::ScenarioResult;
use crate::logic::usage::UsageAggregate;

fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 100.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    usize_to_f64(passed) / usize_to_f64(results.len()) * 100.0
}

/// Human-readable summary, the default report.
pub fn generate_console_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    aggregates: &[UsageAggregate],
    total_duration: Duration,
) -> Result<()> {
    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();

    writeln!(out)?;
    writeln!(out, "📊 Scenario Results Summary")?;
    writeln!(out, "{}", "=".repeat(30))?;
    writeln!(out, "Total scenario runs: {total}")?;
    writeln!(out, "Passed: {passed}")?;
    writeln!(out, "Failed: {}", total - passed)?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;

    for result in results {
        writeln!(out)?;
        let mark = if result.passed { "✅" } else { "❌" };
        writeln!(out, "{mark} {}", result.scenario_name)?;
        writeln!(
            out,
            "   Iterations: {}/{} passed",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average duration: {:?}", result.average_duration)?;
        for failure in &result.failures {
            writeln!(out, "   ↳ {failure}")?;
        }
    }

    if !aggregates.is_empty() {
        writeln!(out)?;
        writeln!(out, "📈 Usage Summary")?;
        writeln!(out, "{}", "-".repeat(30))?;
        for agg in aggregates {
            writeln!(out, "{} ({}, {} runs)", agg.scenario_name, agg.style, agg.runs)?;
            writeln!(
                out,
                "   points {:.1} ± {:.1}, active days {:.1}, {:.2} actions per active day",
                agg.mean_points, agg.std_points, agg.mean_active_days,
                agg.mean_actions_per_active_day
            )?;
            writeln!(
                out,
                "   longest streak {:.1}, unlocks {:.1}, deck exhausted {:.0}%, {} run(s) with violations",
                agg.mean_longest_streak, agg.mean_unlocks, agg.deck_exhausted_pct,
                agg.runs_with_violations
            )?;
        }
    }

    if let Some(fastest) = results.iter().min_by_key(|r| r.average_duration) {
        writeln!(out)?;
        writeln!(out, "⚡ Performance Summary")?;
        writeln!(out, "{}", "-".repeat(30))?;
        writeln!(
            out,
            "Fastest scenario: {} ({:?})",
            fastest.scenario_name, fastest.average_duration
        )?;
        if let Some(slowest) = results.iter().max_by_key(|r| r.average_duration) {
            writeln!(
                out,
                "Slowest scenario: {} ({:?})",
                slowest.scenario_name, slowest.average_duration
            )?;
        }
    }

    Ok(())
}

/// Machine-readable results for CI pipelines.
pub fn generate_json_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json}")?;
    Ok(())
}

/// Markdown report, pasteable into an issue or a PR comment.
pub fn generate_markdown_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    aggregates: &[UsageAggregate],
) -> Result<()> {
    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();

    writeln!(out, "# Duet Engine Test Results")?;
    writeln!(out)?;
    writeln!(out, "## Summary")?;
    writeln!(out)?;
    writeln!(out, "- Scenario runs: {total}")?;
    writeln!(out, "- Passed: {passed}")?;
    writeln!(out, "- Failed: {}", total - passed)?;
    writeln!(out, "- Success rate: {:.1}%", success_rate(results))?;

    if !aggregates.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Usage")?;
        writeln!(out)?;
        writeln!(
            out,
            "| Scenario | Style | Runs | Mean points | Mean active days | Longest streak | Runs w/ violations |"
        )?;
        writeln!(out, "|---|---|---|---|---|---|---|")?;
        for agg in aggregates {
            writeln!(
                out,
                "| {} | {} | {} | {:.1} | {:.1} | {:.1} | {} |",
                agg.scenario_name,
                agg.style,
                agg.runs,
                agg.mean_points,
                agg.mean_active_days,
                agg.mean_longest_streak,
                agg.runs_with_violations
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "## Detailed Results")?;
    for result in results {
        let mark = if result.passed { "✅" } else { "❌" };
        writeln!(out)?;
        writeln!(out, "### {mark} {}", result.scenario_name)?;
        writeln!(out)?;
        writeln!(
            out,
            "- Iterations: {}/{} passed",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- Average duration: {}ms", result.average_duration.as_millis())?;
        if !result.failures.is_empty() {
            writeln!(out, "- Failures:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
    }

    Ok(())
}
