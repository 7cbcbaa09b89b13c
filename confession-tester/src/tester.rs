use colored::Colorize;
use confession_game::RulesConfig;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::simulation::{BotStrategy, SimulationConfig, SimulationSession, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub average_rounds: f64,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

/// What each iteration of a scenario plays.
#[derive(Debug, Clone, Copy)]
pub struct TablePlan {
    pub players: usize,
    pub confessions_per_player: usize,
    pub strategy: BotStrategy,
}

impl TablePlan {
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}p x{} {}",
            self.players,
            self.confessions_per_player,
            self.strategy.label()
        )
    }
}

pub struct LogicTester {
    rules: RulesConfig,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(rules: RulesConfig, verbose: bool) -> Self {
        Self { rules, verbose }
    }

    pub fn run_scenario(&self, plan: TablePlan, seeds: &[u64], iterations: usize) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing table: {} (seed: {seed})",
                        plan.label().bright_white()
                    );
                }
                self.run_single_scenario(plan, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(&self, plan: TablePlan, seed: u64, iterations: usize) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut durations = Vec::with_capacity(iterations);
        let mut rounds = 0_usize;

        for i in 0..iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let config = SimulationConfig {
                seed: iteration_seed,
                players: plan.players,
                confessions_per_player: plan.confessions_per_player,
                strategy: plan.strategy,
            };
            let start = Instant::now();
            match self.play_twice(config) {
                Ok(summary) => {
                    rounds += summary.rounds;
                    if summary.violations.is_empty() {
                        successes += 1;
                    } else {
                        failures.push(format!(
                            "Iteration {} (seed {iteration_seed}): {}",
                            i + 1,
                            summary.violations.join("; ")
                        ));
                    }
                    if self.verbose {
                        println!(
                            "   seed {iteration_seed}: {} rounds, heat {}, {} right / {} wrong, fingerprint {:016x}",
                            summary.rounds,
                            summary.final_heat,
                            summary.correct_guesses,
                            summary.wrong_guesses,
                            summary.fingerprint
                        );
                    }
                }
                Err(err) => failures.push(format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1)),
            }
            durations.push(start.elapsed());
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };
        #[allow(clippy::cast_precision_loss)]
        let average_rounds = if iterations == 0 {
            0.0
        } else {
            rounds as f64 / iterations as f64
        };

        ScenarioResult {
            scenario_name: plan.label(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            average_rounds,
            failures,
            average_duration,
        }
    }

    /// Play the same seed twice; differing transcripts count as a violation.
    fn play_twice(&self, config: SimulationConfig) -> anyhow::Result<SimulationSummary> {
        let mut first = SimulationSession::new(config, self.rules.clone())?.run()?;
        let second = SimulationSession::new(config, self.rules.clone())?.run()?;
        if first.fingerprint != second.fingerprint {
            first.violations.push(format!(
                "non-deterministic replay: {:016x} vs {:016x}",
                first.fingerprint, second.fingerprint
            ));
        }
        Ok(first)
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
