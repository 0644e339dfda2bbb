mod logic;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use peloton_game::CourseCatalog;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use logic::simulation::{DEFAULT_COURSE, DEFAULT_MAX_TURNS};
use logic::{
    CardStrategy, LogicTester, RaceSimulator, ScenarioDefaults, ScenarioResult, get_scenario,
    list_scenarios, resolve_seed_inputs,
};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "peloton-tester", version = "0.1.0")]
#[command(about = "Automated QA runs for the Peloton race engine")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated, decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Course to race on
    #[arg(long, default_value = DEFAULT_COURSE)]
    course: String,

    /// Number of players (2-6); picks the course layout bracket
    #[arg(long, default_value_t = 4)]
    players: usize,

    /// How simulated players choose their card
    #[arg(long, value_enum, default_value_t = CardStrategy::Highest)]
    strategy: CardStrategy,

    /// Abort a race that has not ended after this many turns
    #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
    max_turns: u32,

    /// Course catalog JSON to load instead of the bundled courses
    #[arg(long)]
    data: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let simulator = load_simulator(&args)?;
    log::debug!("{} courses available", simulator.catalog().courses.len());
    let tester = LogicTester::new(simulator, args.verbose);

    let results = run_logic_scenarios(&args, &scenarios, &seeds, &tester);
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🚴 Peloton Automated Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn load_catalog(path: &Path) -> Result<CourseCatalog> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    CourseCatalog::from_json(&json).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_simulator(args: &Args) -> Result<RaceSimulator> {
    match &args.data {
        Some(path) => {
            log::info!("loading course catalog from {}", path.display());
            Ok(RaceSimulator::new(
                Arc::new(load_catalog(path)?),
                args.verbose,
            ))
        }
        None => RaceSimulator::bundled(args.verbose),
    }
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    tester: &LogicTester,
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let defaults = ScenarioDefaults {
        course: args.course.clone(),
        players: args.players,
        strategy: args.strategy,
        max_turns: args.max_turns,
    };

    let mut results = Vec::new();
    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name, &defaults) {
            results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            log::warn!("unknown scenario requested: {scenario_name}");
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Peloton Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            course: DEFAULT_COURSE.to_string(),
            players: 4,
            strategy: CardStrategy::Highest,
            max_turns: DEFAULT_MAX_TURNS,
            data: None,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    #[test]
    fn expand_all_adds_every_scenario_once() {
        let expanded = expand_scenarios("smoke,all");
        assert_eq!(expanded[0], "smoke");
        assert_eq!(expanded.len(), list_scenarios().len());
        assert!(expanded.iter().any(|s| s == "determinism"));
    }

    #[test]
    fn scenarios_run_against_bundled_data() {
        let args = base_args();
        let tester = LogicTester::new(load_simulator(&args).unwrap(), false);
        let results = run_logic_scenarios(
            &args,
            &["smoke".to_string(), "nope".to_string()],
            &[1],
            &tester,
        );
        assert_eq!(results.len(), 1);
        assert!(results[0].passed, "{:?}", results[0].failures);
    }

    #[test]
    fn missing_data_file_is_reported() {
        let mut args = base_args();
        args.data = Some(PathBuf::from("/definitely/not/here.json"));
        let err = load_simulator(&args).err().unwrap();
        assert!(format!("{err:#}").contains("failed to read"));
    }
}
