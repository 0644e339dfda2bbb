use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use peloton_game::{
    BoardSnapshot, Card, Color, CourseCatalog, GameEngine, Location, PlayerBracket, Race, Rider,
    RiderId, TurnOutcome, seed_bytes,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;
use twox_hash::XxHash64;

pub const DEFAULT_COURSE: &str = "La Classicissima";
pub const DEFAULT_MAX_TURNS: u32 = 80;
const BUNDLED_COURSES: &str = include_str!("../../../peloton-game/data/courses.json");

/// How the simulated players pick a card from each hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CardStrategy {
    /// Always play the strongest card
    Highest,
    /// Always play the weakest card
    Lowest,
    /// Pick uniformly from the hand
    Random,
}

impl CardStrategy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Highest => "highest",
            Self::Lowest => "lowest",
            Self::Random => "random",
        }
    }

    fn pick(self, hand: &[Card], exhaustion_value: u8, rng: &mut ChaCha20Rng) -> Option<usize> {
        if hand.is_empty() {
            return None;
        }
        let ranked = hand.iter().enumerate();
        match self {
            Self::Highest => ranked
                .max_by_key(|(index, card)| {
                    (card.movement(exhaustion_value), std::cmp::Reverse(*index))
                })
                .map(|(index, _)| index),
            Self::Lowest => ranked
                .min_by_key(|(index, card)| (card.movement(exhaustion_value), *index))
                .map(|(index, _)| index),
            Self::Random => Some(rng.gen_range(0..hand.len())),
        }
    }
}

impl fmt::Display for CardStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Assertion hook run after a simulation completes.
pub type SimulationExpectation = fn(&SimulationSummary) -> Result<()>;

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub course: String,
    pub players: usize,
    pub strategy: CardStrategy,
    pub max_turns: u32,
    /// Run every seed twice and require identical digests.
    pub replay_check: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(course: impl Into<String>, players: usize, strategy: CardStrategy) -> Self {
        Self {
            course: course.into(),
            players,
            strategy,
            max_turns: DEFAULT_MAX_TURNS,
            replay_check: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    #[must_use]
    pub const fn with_replay_check(mut self) -> Self {
        self.replay_check = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: SimulationExpectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub riders: usize,
    pub turns: Vec<TurnOutcome>,
    pub finishers: Vec<RiderId>,
    pub race_over: bool,
    /// Board and deck inconsistencies spotted after each turn.
    pub violations: Vec<String>,
    pub final_board: BoardSnapshot,
    /// XxHash64 over every turn outcome and the final board.
    pub digest: u64,
}

impl SimulationSummary {
    pub fn turns_played(&self) -> usize {
        self.turns.len()
    }

    pub fn exhaustion_cards(&self) -> usize {
        self.turns.iter().map(|turn| turn.exhausted.len()).sum()
    }

    pub fn slipstream_shifts(&self) -> usize {
        self.turns
            .iter()
            .map(|turn| turn.slipstream.shifts.len())
            .sum()
    }
}

/// Headless deterministic runner for the race engine.
#[derive(Clone)]
pub struct RaceSimulator {
    verbose: bool,
    catalog: Arc<CourseCatalog>,
}

impl RaceSimulator {
    pub const fn new(catalog: Arc<CourseCatalog>, verbose: bool) -> Self {
        Self { verbose, catalog }
    }

    /// Simulator over the course data shipped with the engine.
    pub fn bundled(verbose: bool) -> Result<Self> {
        let catalog =
            CourseCatalog::from_json(BUNDLED_COURSES).context("parsing bundled course data")?;
        Ok(Self::new(Arc::new(catalog), verbose))
    }

    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    /// Line every rider up on the grid, front start space first.
    pub fn prepare_race(&self, plan: &SimulationPlan, seed: u64) -> Result<Race> {
        let bracket = PlayerBracket::for_player_count(plan.players)?;
        let engine = GameEngine::new(self.catalog.as_ref().clone());
        let mut race = engine
            .create_race(&plan.course, bracket, seed)
            .with_context(|| format!("creating race on '{}'", plan.course))?;

        for color in Color::ALL.into_iter().take(plan.players) {
            race.register_player(color)?;
        }
        let grid = race
            .track()
            .spaces()
            .iter()
            .take_while(|space| space.is_start())
            .count()
            .checked_sub(1)
            .ok_or_else(|| anyhow!("course '{}' has no start grid", plan.course))?;
        let ids: Vec<RiderId> = race.riders().iter().map(|rider| rider.id()).collect();
        for id in ids {
            race.place_rider(id, grid)
                .with_context(|| format!("lining up rider {id}"))?;
        }
        Ok(race)
    }

    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut race = self.prepare_race(plan, seed)?;
        let mut rng = ChaCha20Rng::from_seed(seed_bytes(seed));
        let exhaustion_value = race.rules().exhaustion_value;
        let mut turns = Vec::new();
        let mut violations = Vec::new();

        while race.turn() <= plan.max_turns {
            let mut played = BTreeMap::new();
            for id in race.rider_order().to_vec() {
                let Some(rider) = race.rider(id) else {
                    continue;
                };
                if rider.is_finished() {
                    continue;
                }
                let choice = plan
                    .strategy
                    .pick(rider.deck().hand(), exhaustion_value, &mut rng);
                if let Some(index) = choice {
                    played.insert(id, race.play_card(id, index)?);
                }
            }

            let outcome = race
                .resolve_turn(&played)
                .with_context(|| format!("resolving turn {}", race.turn()))?;
            log::debug!(
                "turn {}: {} moved, {} slipstream shifts, {} finished",
                outcome.turn,
                outcome.moves.len(),
                outcome.slipstream.shifts.len(),
                outcome.finished.len()
            );
            if self.verbose && !outcome.finished.is_empty() {
                println!("    turn {}: finishers {:?}", outcome.turn, outcome.finished);
            }
            violations.extend(
                board_violations(&race)
                    .into_iter()
                    .map(|problem| format!("turn {}: {problem}", outcome.turn)),
            );
            let over = outcome.race_over;
            turns.push(outcome);
            if over {
                break;
            }
        }

        let final_board = race.snapshot();
        let digest = race_digest(&turns, &final_board)?;
        Ok(SimulationSummary {
            seed,
            riders: race.riders().len(),
            turns,
            finishers: race.finishers().iter().map(|finisher| finisher.rider).collect(),
            race_over: race.check_end_game(),
            violations,
            final_board,
            digest,
        })
    }
}

fn race_digest(turns: &[TurnOutcome], final_board: &BoardSnapshot) -> Result<u64> {
    let mut hasher = XxHash64::with_seed(0);
    for turn in turns {
        hasher.write(&serde_json::to_vec(turn)?);
    }
    hasher.write(&serde_json::to_vec(final_board)?);
    Ok(hasher.finish())
}

/// Cross-check lanes against rider positions and every deck's card count.
pub fn board_violations(race: &Race) -> Vec<String> {
    let mut problems = Vec::new();
    for (index, space) in race.track().spaces().iter().enumerate() {
        let mut gap = false;
        for (lane, slot) in space.lanes().iter().enumerate() {
            match slot {
                Some(id) => {
                    if gap {
                        problems.push(format!("space {index} has a hole below lane {lane}"));
                    }
                    let cached = race.rider(*id).and_then(Rider::location);
                    if cached != Some(Location::new(index, lane)) {
                        problems.push(format!(
                            "rider {id} sits in space {index} lane {lane} but thinks it is at {cached:?}"
                        ));
                    }
                }
                None => gap = true,
            }
        }
    }
    for rider in race.riders() {
        let deck = rider.deck();
        let accounted = deck.circulating_len() + deck.removed().len();
        if accounted != deck.total_issued() {
            problems.push(format!(
                "{rider} holds {accounted} cards, expected {}",
                deck.total_issued()
            ));
        }
    }
    // A settled board is a slipstream fixed point: another pass moves nobody.
    match race.clone().apply_slipstream() {
        Ok(report) if report.moved() => problems.push(format!(
            "slipstream left an open single gap ({} shifts pending)",
            report.shifts.len()
        )),
        Ok(_) => {}
        Err(err) => problems.push(format!("slipstream check failed: {err}")),
    }
    problems
}
