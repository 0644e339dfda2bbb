use anyhow::{Result, ensure};
use std::collections::BTreeSet;

use super::simulation::{CardStrategy, SimulationPlan, SimulationSummary};

/// CLI-level knobs every scenario starts from.
#[derive(Debug, Clone)]
pub struct ScenarioDefaults {
    pub course: String,
    pub players: usize,
    pub strategy: CardStrategy,
    pub max_turns: u32,
}

impl ScenarioDefaults {
    fn plan(&self) -> SimulationPlan {
        SimulationPlan::new(self.course.clone(), self.players, self.strategy)
            .with_max_turns(self.max_turns)
    }
}

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

const SCENARIOS: [(&str, &str); 7] = [
    ("smoke", "Race on the chosen course reaches the end"),
    (
        "board-integrity",
        "Lanes, rider positions and deck counts agree after every turn",
    ),
    (
        "slipstream",
        "Slipstream only pulls riders one space and never leaves a single gap",
    ),
    ("finish-order", "Finishers leave the board in a stable order"),
    ("determinism", "Replaying a seed reproduces the same race"),
    ("large-field", "Six players on the wide start layout"),
    (
        "cautious",
        "Everyone plays their weakest card and the leaders tire",
    ),
];

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.to_vec()
}

pub fn get_scenario(key: &str, defaults: &ScenarioDefaults) -> Option<TestScenario> {
    let base = defaults.plan();
    let (name, plan) = match key {
        "smoke" => ("Smoke", base.with_expectation(race_completes)),
        "board-integrity" => (
            "Board Integrity",
            base.with_expectation(race_completes)
                .with_expectation(no_violations),
        ),
        "slipstream" => ("Slipstream Steps", base.with_expectation(slipstream_single_steps)),
        "finish-order" => (
            "Finish Order",
            base.with_expectation(race_completes)
                .with_expectation(finishers_left_board),
        ),
        "determinism" => ("Deterministic Replay", base.with_replay_check()),
        "large-field" => (
            "Large Field",
            SimulationPlan::new(defaults.course.clone(), 6, defaults.strategy)
                .with_max_turns(defaults.max_turns)
                .with_expectation(race_completes)
                .with_expectation(no_violations),
        ),
        "cautious" => (
            "Cautious Peloton",
            SimulationPlan::new(defaults.course.clone(), defaults.players, CardStrategy::Lowest)
                .with_max_turns(defaults.max_turns)
                .with_expectation(race_completes)
                .with_expectation(leaders_tire),
        ),
        _ => return None,
    };
    Some(TestScenario {
        name: name.to_string(),
        plan,
    })
}

fn race_completes(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.race_over,
        "race still running after {} turns",
        summary.turns_played()
    );
    ensure!(
        summary.finishers.len() + 1 >= summary.riders,
        "only {} of {} riders finished",
        summary.finishers.len(),
        summary.riders
    );
    Ok(())
}

fn no_violations(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.violations.is_empty(),
        "board violations: {}",
        summary.violations.join("; ")
    );
    Ok(())
}

fn slipstream_single_steps(summary: &SimulationSummary) -> Result<()> {
    for turn in &summary.turns {
        ensure!(turn.slipstream.passes >= 1, "turn {} skipped slipstream", turn.turn);
        for shift in &turn.slipstream.shifts {
            ensure!(
                shift.to.space == shift.from.space + 1,
                "turn {}: rider {} slipped from {} to {}",
                turn.turn,
                shift.rider,
                shift.from.space,
                shift.to.space
            );
        }
    }
    ensure!(
        !summary
            .violations
            .iter()
            .any(|problem| problem.contains("single gap")),
        "slipstream did not settle"
    );
    Ok(())
}

fn finishers_left_board(summary: &SimulationSummary) -> Result<()> {
    let unique: BTreeSet<_> = summary.finishers.iter().collect();
    ensure!(
        unique.len() == summary.finishers.len(),
        "a rider finished twice"
    );
    for space in &summary.final_board.spaces {
        for occupant in space.lanes.iter().flatten() {
            ensure!(
                !summary.finishers.contains(&occupant.rider),
                "finisher {} still occupies space {}",
                occupant.rider,
                space.index
            );
        }
    }
    ensure!(
        summary
            .final_board
            .finishers
            .windows(2)
            .all(|pair| pair[0].turn <= pair[1].turn),
        "finishers recorded out of turn order"
    );
    Ok(())
}

fn leaders_tire(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.exhaustion_cards() > 0,
        "nobody drew an exhaustion card"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::simulation::{DEFAULT_COURSE, DEFAULT_MAX_TURNS};

    fn defaults() -> ScenarioDefaults {
        ScenarioDefaults {
            course: DEFAULT_COURSE.to_string(),
            players: 4,
            strategy: CardStrategy::Highest,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, _) in list_scenarios() {
            assert!(get_scenario(key, &defaults()).is_some(), "{key}");
        }
        assert!(get_scenario("nope", &defaults()).is_none());
    }

    #[test]
    fn large_field_overrides_player_count() {
        let scenario = get_scenario("large-field", &defaults()).unwrap();
        assert_eq!(scenario.plan.players, 6);
        let cautious = get_scenario("cautious", &defaults()).unwrap();
        assert_eq!(cautious.plan.strategy, CardStrategy::Lowest);
        assert!(get_scenario("determinism", &defaults()).unwrap().plan.replay_check);
    }
}
