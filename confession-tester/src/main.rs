mod reports;
mod simulation;
mod tester;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use confession_game::RulesConfig;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tester::{LogicTester, ScenarioResult, TablePlan};
use util::{parse_seeds, parse_strategies, parse_table_sizes, split_csv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "confession-tester", version = "0.1.0")]
#[command(about = "Seeded bot simulations that check Confession Box game invariants")]
struct Args {
    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Games played per seed and table
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Table sizes to simulate (comma-separated)
    #[arg(long, default_value = "4,6,8")]
    players: String,

    /// Confessions each bot writes
    #[arg(long, default_value_t = 3)]
    confessions_per_player: usize,

    /// Bot voting strategies (random, sharp, herd, or all)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// Optional JSON rules file; missing fields take defaults
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

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

    if args.report == ReportFormat::Console {
        announce_banner();
    }

    let start_time = Instant::now();
    let rules = load_rules(args.rules.as_deref())?;
    let plans = build_plans(&args)?;
    let seeds = parse_seeds(&split_csv(&args.seeds))?;
    log::info!(
        "running {} tables x {} seeds x {} iterations",
        plans.len(),
        seeds.len(),
        args.iterations
    );

    let tester = LogicTester::new(rules, args.verbose);
    let results: Vec<ScenarioResult> = plans
        .iter()
        .flat_map(|plan| tester.run_scenario(*plan, &seeds, args.iterations))
        .collect();

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn announce_banner() {
    println!("{}", "🎭 Confession Box Simulation Tester".bright_cyan().bold());
    println!("{}", "====================================".cyan());
}

fn load_rules(path: Option<&Path>) -> Result<RulesConfig> {
    let Some(path) = path else {
        return Ok(RulesConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules from {}", path.display()))?;
    RulesConfig::from_json(&json).with_context(|| format!("invalid rules in {}", path.display()))
}

fn build_plans(args: &Args) -> Result<Vec<TablePlan>> {
    let sizes = parse_table_sizes(&split_csv(&args.players))?;
    let strategies = parse_strategies(&split_csv(&args.strategies))?;
    Ok(sizes
        .iter()
        .flat_map(|&players| {
            strategies.iter().map(move |&strategy| TablePlan {
                players,
                confessions_per_player: args.confessions_per_player,
                strategy,
            })
        })
        .collect())
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut sink = ReportSink::open(args.output.clone())?;

    match args.report {
        ReportFormat::Json => reports::generate_json_report(&mut sink, results)?,
        ReportFormat::Markdown => {
            if results.is_empty() {
                writeln!(
                    &mut sink,
                    "# Confession Box Simulation Results\n\n_No tables simulated._"
                )?;
            } else {
                reports::generate_markdown_report(&mut sink, results)?;
            }
        }
        ReportFormat::Console => {
            if results.is_empty() {
                writeln!(&mut sink, "No tables simulated.")?;
            } else {
                reports::generate_console_report(
                    &mut sink,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(
                &mut sink,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    sink.finish()
}

/// Destination for the rendered report. File destinations get their parent
/// directories created and are logged once the report is flushed.
struct ReportSink {
    destination: Option<PathBuf>,
    writer: Box<dyn Write>,
}

impl ReportSink {
    fn open(destination: Option<PathBuf>) -> Result<Self> {
        let writer: Box<dyn Write> = match &destination {
            Some(path) => {
                if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("failed to create {}", dir.display()))?;
                }
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(BufWriter::new(stdout())),
        };
        Ok(Self {
            destination,
            writer,
        })
    }

    fn finish(mut self) -> Result<()> {
        self.writer.flush().context("failed to flush report")?;
        if let Some(path) = &self.destination {
            log::info!("report written to {}", path.display());
        }
        Ok(())
    }
}

impl Write for ReportSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}
