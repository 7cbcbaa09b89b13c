use anyhow::{Context, Result, bail, ensure};
use clap::ValueEnum;
use confession_game::{
    Category, ConfessionId, GameSession, GameStatus, HeatLevel, MemoryStorage, PlayerId,
    RulesConfig, SessionEngine, suggestions,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hasher;
use twox_hash::XxHash64;

/// How bot players pick a suspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BotStrategy {
    /// Uniform pick among the candidates.
    Random,
    /// Always names the real author.
    Sharp,
    /// Follows whoever has the most votes so far.
    Herd,
}

impl BotStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Sharp => "sharp",
            Self::Herd => "herd",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub players: usize,
    pub confessions_per_player: usize,
    pub strategy: BotStrategy,
}

/// Outcome of one bot-played game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: BotStrategy,
    pub players: usize,
    pub rounds: usize,
    pub final_heat: u8,
    pub status: GameStatus,
    pub correct_guesses: usize,
    pub wrong_guesses: usize,
    /// XxHash64 over the drawn rounds, for determinism checks.
    pub fingerprint: u64,
    pub violations: Vec<String>,
}

/// Plays a complete game against a fresh in-memory engine, checking the
/// session invariants after every mutation.
pub struct SimulationSession {
    config: SimulationConfig,
    engine: SessionEngine<MemoryStorage>,
    storage: MemoryStorage,
    bots: ChaCha20Rng,
    ids: Vec<PlayerId>,
    drawn: BTreeSet<ConfessionId>,
    last_status: GameStatus,
    last_heat: HeatLevel,
    violations: Vec<String>,
}

impl SimulationSession {
    /// # Errors
    ///
    /// Returns an error if the rules are invalid or the table size is out of
    /// bounds for them.
    pub fn new(config: SimulationConfig, rules: RulesConfig) -> Result<Self> {
        ensure!(
            config.players >= rules.min_players && config.players <= rules.max_players,
            "{} players is outside the {}-{} table",
            config.players,
            rules.min_players,
            rules.max_players
        );
        ensure!(
            config.confessions_per_player >= rules.min_confessions_per_player,
            "bots need at least {} confessions each",
            rules.min_confessions_per_player
        );
        let storage = MemoryStorage::new();
        let engine = SessionEngine::with_rules(storage.clone(), rules, config.seed)
            .context("invalid rules")?;
        Ok(Self {
            config,
            engine,
            storage,
            bots: ChaCha20Rng::seed_from_u64(config.seed.rotate_left(17)),
            ids: Vec::new(),
            drawn: BTreeSet::new(),
            last_status: GameStatus::Setup,
            last_heat: HeatLevel::MIN,
            violations: Vec::new(),
        })
    }

    /// # Errors
    ///
    /// Returns an error when the engine rejects a move the bots believe is
    /// legal.
    pub fn run(mut self) -> Result<SimulationSummary> {
        self.seat_players()?;
        self.write_confessions()?;

        let mut more = self.engine.start_game().context("start_game")?;
        self.check("start_game");
        let mut correct_guesses = 0;
        let mut wrong_guesses = 0;
        while more {
            self.check_draw();
            self.cast_votes()?;
            let result = self.engine.reveal_round().context("reveal_round")?;
            correct_guesses += result.correct_guessers.len();
            wrong_guesses += result.wrong_guessers.len();
            self.check("reveal_round");
            more = self.engine.next_round().context("next_round")?;
            self.check("next_round");
        }
        self.check_reload();

        let session = self.session()?.clone();
        log::debug!(
            "seed {} finished after {} rounds at heat {}",
            self.config.seed,
            session.completed_rounds.len(),
            session.heat_level
        );
        Ok(SimulationSummary {
            seed: self.config.seed,
            strategy: self.config.strategy,
            players: session.players.len(),
            rounds: session.completed_rounds.len(),
            final_heat: session.heat_level.get(),
            status: session.status,
            correct_guesses,
            wrong_guesses,
            fingerprint: fingerprint(&session)?,
            violations: self.violations,
        })
    }

    fn session(&self) -> Result<&GameSession> {
        self.engine.session().context("engine lost its session")
    }

    fn seat_players(&mut self) -> Result<()> {
        self.engine.create_new_game()?;
        for n in 1..=self.config.players {
            let player = self
                .engine
                .add_player(&format!("Bot {n}"))
                .with_context(|| format!("seating bot {n}"))?;
            self.ids.push(player.id);
            self.check("add_player");
        }
        self.engine.start_confessions()?;
        self.check("start_confessions");
        Ok(())
    }

    fn write_confessions(&mut self) -> Result<()> {
        for id in self.ids.clone() {
            for _ in 0..self.config.confessions_per_player {
                let category = Category::ALL[self.bots.gen_range(0..Category::ALL.len())];
                let Some(text) = suggestions(category).choose(&mut self.bots) else {
                    bail!("no suggestions for {category}");
                };
                self.engine.add_confession(&id, text, category)?;
            }
            self.check("add_confession");
        }
        Ok(())
    }

    fn cast_votes(&mut self) -> Result<()> {
        let author = self
            .session()?
            .current_round
            .as_ref()
            .map(|round| round.author().clone())
            .context("no round to vote on")?;
        let mut order = self.ids.clone();
        order.shuffle(&mut self.bots);
        for voter in &order {
            if self.engine.vote(voter, voter).is_ok() {
                self.violations.push(format!("{voter} voted for themselves"));
            }
            let target = self.pick_target(voter, &author)?;
            self.engine
                .vote(voter, &target)
                .with_context(|| format!("{voter} voting for {target}"))?;
            self.check("vote");
        }
        if !self.engine.all_players_voted() {
            self.violations
                .push("round not complete after every bot voted".to_string());
        }
        Ok(())
    }

    fn pick_target(&mut self, voter: &PlayerId, author: &PlayerId) -> Result<PlayerId> {
        let others: Vec<&PlayerId> = self.ids.iter().filter(|id| *id != voter).collect();
        let target = match self.config.strategy {
            BotStrategy::Sharp if voter != author => Some(author),
            BotStrategy::Herd => {
                let round = self.session()?.current_round.as_ref();
                let counts = round.map(|r| r.vote_counts()).unwrap_or_default();
                others
                    .iter()
                    .copied()
                    .max_by_key(|id| counts.get(id).copied().unwrap_or(0))
            }
            _ => others.choose(&mut self.bots).copied(),
        };
        target.cloned().context("no one left to vote for")
    }

    fn check_draw(&mut self) {
        let Some(session) = self.engine.session() else {
            return;
        };
        let Some(round) = session.current_round.as_ref() else {
            self.violations.push("round reported but none drawn".to_string());
            return;
        };
        let id = round.confession.id.clone();
        if !session.heat_level.allows(round.confession.category) {
            self.violations.push(format!(
                "confession {id} ({}) drawn at heat {}",
                round.confession.category, session.heat_level
            ));
        }
        if !self.drawn.insert(id.clone()) {
            self.violations.push(format!("confession {id} drawn twice"));
        }
    }

    fn check(&mut self, step: &str) {
        let Some(session) = self.engine.session() else {
            self.violations.push(format!("{step}: session vanished"));
            return;
        };
        let mut found = invariant_violations(session, self.engine.rules());
        if session.status < self.last_status {
            found.push(format!(
                "status went back from {} to {}",
                self.last_status, session.status
            ));
        }
        if session.heat_level < self.last_heat {
            found.push(format!(
                "heat dropped from {} to {}",
                self.last_heat, session.heat_level
            ));
        }
        self.last_status = session.status;
        self.last_heat = session.heat_level;
        self.violations
            .extend(found.into_iter().map(|v| format!("{step}: {v}")));
    }

    fn check_reload(&mut self) {
        let reopened = SessionEngine::new(self.storage.clone());
        if reopened.session() != self.engine.session() {
            self.violations
                .push("persisted session differs from the live one".to_string());
        }
    }
}

/// Structural invariants every committed session must satisfy.
#[must_use]
pub fn invariant_violations(session: &GameSession, rules: &RulesConfig) -> Vec<String> {
    let mut found = Vec::new();

    let player_ids: BTreeSet<&PlayerId> = session.players.iter().map(|p| &p.id).collect();
    if player_ids.len() != session.players.len() {
        found.push("duplicate player ids".to_string());
    }
    if session.players.len() > rules.max_players {
        found.push(format!("{} players seated", session.players.len()));
    }
    let confession_ids: BTreeSet<&ConfessionId> =
        session.confessions.iter().map(|c| &c.id).collect();
    if confession_ids.len() != session.confessions.len() {
        found.push("duplicate confession ids".to_string());
    }

    if let Some(round) = &session.current_round {
        for (voter, target) in &round.votes {
            if !player_ids.contains(voter) {
                found.push(format!("vote from unseated {voter}"));
            }
            if voter == target {
                found.push(format!("{voter} voted for themselves"));
            }
        }
        if !round.revealed && !round.correct_guesses.is_empty() {
            found.push("correct guesses recorded before reveal".to_string());
        }
    }

    let in_play = session.completed_rounds.len() + usize::from(session.current_round.is_some());
    let used = session.confessions.iter().filter(|c| c.is_used).count();
    if used != in_play {
        found.push(format!("{used} confessions used but {in_play} drawn"));
    }

    let steps = session
        .completed_rounds
        .len()
        .checked_div(rules.rounds_per_heat_step)
        .unwrap_or(0);
    let expected = u8::try_from(steps)
        .ok()
        .and_then(|s| HeatLevel::new(s.saturating_add(1)))
        .unwrap_or(HeatLevel::MAX);
    if session.heat_level != expected {
        found.push(format!(
            "heat {} after {} rounds, expected {expected}",
            session.heat_level,
            session.completed_rounds.len()
        ));
    }

    if session.status == GameStatus::Finished && session.current_round.is_some() {
        found.push("finished game still has a current round".to_string());
    }
    found
}

#[derive(Serialize)]
struct Transcript<'a> {
    players: Vec<&'a str>,
    rounds: Vec<TranscriptRound<'a>>,
    heat: u8,
}

#[derive(Serialize)]
struct TranscriptRound<'a> {
    confession: &'a str,
    author: &'a str,
    votes: &'a BTreeMap<PlayerId, PlayerId>,
}

/// Hash of the drawn rounds. `createdAt` is left out so two runs with the
/// same seed agree.
///
/// # Errors
///
/// Returns an error if the transcript cannot be serialized.
pub fn fingerprint(session: &GameSession) -> Result<u64> {
    let transcript = Transcript {
        players: session.players.iter().map(|p| p.id.as_str()).collect(),
        rounds: session
            .completed_rounds
            .iter()
            .map(|round| TranscriptRound {
                confession: round.confession.id.as_str(),
                author: round.author().as_str(),
                votes: &round.votes,
            })
            .collect(),
        heat: session.heat_level.get(),
    };
    let bytes = serde_json::to_vec(&transcript).context("serializing transcript")?;
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u64, strategy: BotStrategy) -> SimulationConfig {
        SimulationConfig {
            seed,
            players: 5,
            confessions_per_player: 3,
            strategy,
        }
    }

    fn play(seed: u64, strategy: BotStrategy) -> SimulationSummary {
        SimulationSession::new(config(seed, strategy), RulesConfig::default())
            .unwrap()
            .run()
            .unwrap()
    }

    #[test]
    fn games_finish_without_violations() {
        for strategy in [BotStrategy::Random, BotStrategy::Sharp, BotStrategy::Herd] {
            for seed in 0..5 {
                let summary = play(seed, strategy);
                assert_eq!(summary.status, GameStatus::Finished);
                assert!(summary.violations.is_empty(), "{:?}", summary.violations);
                assert_eq!(
                    summary.correct_guesses + summary.wrong_guesses,
                    summary.rounds * 4
                );
            }
        }
    }

    #[test]
    fn same_seed_same_fingerprint() {
        let a = play(42, BotStrategy::Random);
        let b = play(42, BotStrategy::Random);
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.rounds, b.rounds);
    }

    #[test]
    fn sharp_bots_never_miss() {
        let summary = play(9, BotStrategy::Sharp);
        assert_eq!(summary.wrong_guesses, 0);
    }

    #[test]
    fn rejects_oversized_table() {
        let cfg = SimulationConfig {
            players: 9,
            ..config(1, BotStrategy::Random)
        };
        assert!(SimulationSession::new(cfg, RulesConfig::default()).is_err());
    }

    #[test]
    fn detects_tampered_heat() {
        let mut session = GameSession::new("s".into(), chrono::Utc::now());
        session.heat_level = HeatLevel::MAX;
        let found = invariant_violations(&session, &RulesConfig::default());
        assert!(found.iter().any(|v| v.contains("heat")));
    }
}
