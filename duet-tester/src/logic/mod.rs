pub mod harness;
pub mod policy;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod simulation;
pub mod tester;
pub mod usage;

pub use harness::{
    EngineHarness, MemoryStore, RemoteScript, ScriptedRemote, SimulationExpectation,
    SimulationPlan, SimulationSummary, UsageMetrics,
};
pub use policy::{ExtraMove, SwipeCall, UsageStyle, UserPolicy};
pub use reports::{generate_console_report, generate_json_report, generate_markdown_report};
pub use scenarios::{TestScenario, get_scenario, list_scenarios};
pub use seeds::{resolve_seed_inputs, split_csv};
pub use simulation::{
    DayDirectives, DayOutcome, DecisionRecord, SimulationConfig, SimulationSession,
};
pub use tester::{ScenarioResult, SessionTester};
pub use usage::{UsageAggregate, UsageRecord, aggregate_usage};
