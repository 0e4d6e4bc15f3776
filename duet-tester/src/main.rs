use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

mod logic;

use logic::{
    ScenarioResult, SessionTester, UsageAggregate, UsageRecord, aggregate_usage,
    generate_console_report, generate_json_report, generate_markdown_report, get_scenario,
    list_scenarios, resolve_seed_inputs, split_csv,
};

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Scenario test runner for the duet progression engine",
    long_about = None
)]
struct Args {
    /// Comma separated scenario names, or "all"
    #[arg(short, long, default_value = "smoke")]
    scenarios: String,

    /// List available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Comma separated seeds; every iteration perturbs its seed
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Override the simulated day count of every selected scenario
    #[arg(short, long)]
    days: Option<u32>,

    /// Iterations per scenario per seed
    #[arg(short, long, default_value_t = 5)]
    iterations: usize,

    /// Report format
    #[arg(short, long, value_parser = ["json", "markdown", "console"], default_value = "console")]
    report: String,

    /// Per-iteration progress output
    #[arg(short, long)]
    verbose: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

enum OutputTarget {
    Stdout(BufWriter<io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn stdout() -> Self {
        Self::Stdout(BufWriter::new(io::stdout()))
    }

    fn file(path: &Path) -> io::Result<Self> {
        Ok(Self::File(BufWriter::new(File::create(path)?)))
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> io::Result<()> {
        self.writer().flush()
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer().flush()
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();
    let start_time = Instant::now();

    let scenario_names = expand_scenarios(&args.scenarios);
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    println!(
        "Scenarios: {} | Seeds: {} | Iterations per seed: {}",
        scenario_names.join(", "),
        seeds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        args.iterations
    );

    let (all_results, usage_records) = run_scenarios(&args, &scenario_names, &seeds);
    let aggregates = aggregate_usage(&usage_records);

    write_reports(&args, &all_results, &aggregates, start_time.elapsed())?;

    println!();
    println!("🏁 Total time: {:?}", start_time.elapsed());

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn announce_banner() {
    println!("{}", "💞 Duet Engine Session Tester".bright_cyan().bold());
    println!("{}", "=".repeat(34).cyan());
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut stdout = io::stdout().lock();
    write_scenario_list(&mut stdout)?;
    Ok(true)
}

fn write_scenario_list<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Available scenarios:")?;
    for (name, description) in list_scenarios() {
        writeln!(out, "  {name:<20} {description}")?;
    }
    Ok(())
}

/// Expand the `--scenarios` argument, honoring the "all" keyword.
fn expand_scenarios(input: &str) -> Vec<String> {
    let tokens = split_csv(input);
    if tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return list_scenarios()
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect();
    }
    tokens
}

fn run_scenarios(
    args: &Args,
    scenario_names: &[String],
    seeds: &[u64],
) -> (Vec<ScenarioResult>, Vec<UsageRecord>) {
    let tester = SessionTester::new(args.verbose);
    let mut all_results = Vec::new();
    let mut usage_records = Vec::new();

    for name in scenario_names {
        match get_scenario(name) {
            Some(mut scenario) => {
                if let Some(days) = args.days {
                    scenario.plan.days = days;
                }
                let (results, records) = tester.run_scenario(&scenario, seeds, args.iterations);
                all_results.extend(results);
                usage_records.extend(records);
            }
            None => eprintln!("⚠️  Unknown scenario: {}", name.yellow()),
        }
    }

    (all_results, usage_records)
}

fn write_reports(
    args: &Args,
    all_results: &[ScenarioResult],
    aggregates: &[UsageAggregate],
    total_duration: Duration,
) -> Result<()> {
    let mut target = match &args.output {
        Some(path) => OutputTarget::file(path)?,
        None => OutputTarget::stdout(),
    };

    match args.report.as_str() {
        "json" => generate_json_report(&mut target, all_results)?,
        "markdown" => generate_markdown_report(&mut target, all_results, aggregates)?,
        _ => generate_console_report(&mut target, all_results, aggregates, total_duration)?,
    }
    target.flush_inner()?;

    if let Some(path) = &args.output {
        println!("📄 Report written to {}", path.display());
    }
    Ok(())
}
