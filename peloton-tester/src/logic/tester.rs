use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::scenarios::TestScenario;
use super::simulation::{RaceSimulator, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub average_turns: f64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    simulator: RaceSimulator,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(simulator: RaceSimulator, verbose: bool) -> Self {
        Self { simulator, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            log::info!(
                "scenario '{}' seed {seed} ({} players, {} strategy)",
                scenario.name,
                scenario.plan.players,
                scenario.plan.strategy
            );
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (course: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.course,
                    seed
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut total_turns = 0;

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            match self.run_iteration(&scenario.plan, iteration_seed) {
                Ok(summary) => {
                    successes += 1;
                    total_turns += summary.turns_played();
                    let duration = start_time.elapsed();
                    performance_data.push(duration);

                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) seed:{} turns:{} finishers:{} slipstream:{} exhaustion:{}",
                            i + 1,
                            iterations,
                            summary.seed,
                            summary.turns_played(),
                            summary.finishers.len(),
                            summary.slipstream_shifts(),
                            summary.exhaustion_cards()
                        );
                    }
                }
                Err(err) => {
                    let message = format!(
                        "Iteration {} (course '{}', strategy {}, seed {}): {err:#}",
                        i + 1,
                        scenario.plan.course,
                        scenario.plan.strategy,
                        iteration_seed
                    );
                    log::warn!("{message}");
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };
        #[allow(clippy::cast_precision_loss)]
        let average_turns = if successes == 0 {
            0.0
        } else {
            total_turns as f64 / successes as f64
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_turns,
            average_duration,
            performance_data,
        }
    }

    fn run_iteration(&self, plan: &SimulationPlan, seed: u64) -> anyhow::Result<SimulationSummary> {
        let summary = self.simulator.run_plan(plan, seed)?;
        for expectation in &plan.expectations {
            expectation(&summary)?;
        }
        if plan.replay_check {
            let replay = self.simulator.run_plan(plan, seed)?;
            anyhow::ensure!(
                replay.digest == summary.digest,
                "replay diverged: {:016x} vs {:016x}",
                summary.digest,
                replay.digest
            );
        }
        Ok(summary)
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
