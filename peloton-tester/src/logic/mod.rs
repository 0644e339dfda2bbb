pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use scenarios::{ScenarioDefaults, get_scenario, list_scenarios};
pub use seeds::resolve_seed_inputs;
pub use simulation::{CardStrategy, RaceSimulator};
pub use tester::*;
