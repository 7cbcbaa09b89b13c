//! The session engine: owns the single live session, runs every mutation
//! against a draft, persists it, and only then publishes the new snapshot.
use chrono::Utc;

use crate::category::Category;
use crate::config::{RulesConfig, RulesConfigError};
use crate::constants::SESSION_STORAGE_KEY;
use crate::error::{GameError, StateError, ValidationError};
use crate::model::{Confession, Player, PlayerId, SessionId};
use crate::reveal::RoundResult;
use crate::rng::SessionRng;
use crate::session::GameSession;
use crate::stats::GameStats;
use crate::storage::{GameStorage, decode_session, encode_session};

type Listener = Box<dyn FnMut(Option<&GameSession>)>;

/// Handle returned by [`SessionEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct SessionEngine<S: GameStorage> {
    storage: S,
    rules: RulesConfig,
    rng: SessionRng,
    session: Option<GameSession>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: GameStorage> SessionEngine<S> {
    /// Open the engine with default rules and an entropy-seeded RNG,
    /// restoring whatever session `storage` holds.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self::build(storage, RulesConfig::default(), SessionRng::from_entropy())
    }

    /// Open the engine with explicit rules and a deterministic seed.
    ///
    /// # Errors
    ///
    /// Returns an error if `rules` fails validation.
    pub fn with_rules(storage: S, rules: RulesConfig, seed: u64) -> Result<Self, RulesConfigError> {
        rules.validate()?;
        Ok(Self::build(storage, rules, SessionRng::from_user_seed(seed)))
    }

    fn build(storage: S, rules: RulesConfig, rng: SessionRng) -> Self {
        let session = load_session(&storage);
        Self {
            storage,
            rules,
            rng,
            session,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Current snapshot, `None` when no game exists.
    #[must_use]
    pub const fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Register a listener. It receives the current snapshot immediately and
    /// again after every committed mutation.
    pub fn subscribe(
        &mut self,
        mut listener: impl FnMut(Option<&GameSession>) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        listener(self.session.as_ref());
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn publish(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(self.session.as_ref());
        }
    }

    fn require_session(&self) -> Result<&GameSession, ValidationError> {
        self.session.as_ref().ok_or(ValidationError::NoActiveSession)
    }

    /// Round operations treat a missing session as a missing round.
    fn require_round_session(&self) -> Result<&GameSession, StateError> {
        self.session.as_ref().ok_or(StateError::NoCurrentRound)
    }

    fn commit(&mut self, next: GameSession) -> Result<(), GameError> {
        let blob = encode_session(&next)?;
        self.storage
            .write(SESSION_STORAGE_KEY, &blob)
            .map_err(GameError::storage)?;
        self.session = Some(next);
        self.publish();
        Ok(())
    }

    /// Run `op` on a copy of the live session and commit the copy on success.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut GameSession, &RulesConfig, &mut SessionRng) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let mut draft = self.require_session()?.clone();
        let out = op(&mut draft, &self.rules, &mut self.rng)?;
        self.commit(draft)?;
        Ok(out)
    }

    // Lifecycle --------------------------------------------------------------

    /// Replace any live session with a fresh one in setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the new session cannot be persisted.
    pub fn create_new_game(&mut self) -> Result<SessionId, GameError> {
        let id = SessionId::new(self.rng.next_id(|_| false));
        self.commit(GameSession::new(id.clone(), Utc::now()))?;
        log::info!("created session {id}");
        Ok(id)
    }

    /// Wipe the persisted blob and drop the live session.
    ///
    /// # Errors
    ///
    /// Returns an error if storage refuses the delete; the session stays live.
    pub fn clear_game_data(&mut self) -> Result<(), GameError> {
        self.storage
            .remove(SESSION_STORAGE_KEY)
            .map_err(GameError::storage)?;
        self.session = None;
        self.publish();
        log::info!("cleared game data");
        Ok(())
    }

    // Roster -----------------------------------------------------------------

    /// # Errors
    ///
    /// See [`GameSession::add_player`]; also `Validation` without a session.
    pub fn add_player(&mut self, name: &str) -> Result<Player, GameError> {
        self.mutate(|session, rules, rng| session.add_player(name, rules, rng))
    }

    /// Remove a player. Absent sessions and unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the change fails.
    pub fn remove_player(&mut self, id: &PlayerId) -> Result<(), GameError> {
        if !self.session.as_ref().is_some_and(|s| s.has_player(id)) {
            return Ok(());
        }
        self.mutate(|session, _, _| {
            session.remove_player(id);
            Ok(())
        })
    }

    // Confessions ------------------------------------------------------------

    /// # Errors
    ///
    /// See [`GameSession::start_confessions`].
    pub fn start_confessions(&mut self) -> Result<(), GameError> {
        self.mutate(|session, rules, _| session.start_confessions(rules))
    }

    /// # Errors
    ///
    /// See [`GameSession::add_confession`].
    pub fn add_confession(
        &mut self,
        author: &PlayerId,
        text: &str,
        category: Category,
    ) -> Result<Confession, GameError> {
        self.mutate(|session, rules, rng| session.add_confession(author, text, category, rules, rng))
    }

    #[must_use]
    pub fn player_confessions(&self, author: &PlayerId) -> Vec<Confession> {
        self.session
            .as_ref()
            .map(|s| s.player_confessions(author).cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn confession_count(&self, author: &PlayerId) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.confession_count(author))
    }

    #[must_use]
    pub fn players_missing_confessions(&self) -> Vec<Player> {
        self.session.as_ref().map_or_else(Vec::new, |s| {
            s.players_missing_confessions(self.rules.min_confessions_per_player)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    #[must_use]
    pub fn all_players_have_confessions(&self) -> bool {
        self.session.as_ref().is_some_and(|s| {
            s.all_players_have_confessions(self.rules.min_confessions_per_player)
        })
    }

    // Rounds -----------------------------------------------------------------

    /// Begin play and draw the first round. Returns whether a round started.
    ///
    /// # Errors
    ///
    /// See [`GameSession::start_game`].
    pub fn start_game(&mut self) -> Result<bool, GameError> {
        self.mutate(|session, rules, rng| session.start_game(rules, rng.selection()))
    }

    /// Retire a revealed round and draw the next. `Ok(false)` means the game
    /// is finished.
    ///
    /// # Errors
    ///
    /// See [`GameSession::next_round`]; also `Validation` without a session.
    pub fn next_round(&mut self) -> Result<bool, GameError> {
        self.mutate(|session, rules, rng| session.next_round(rules, rng.selection()))
    }

    /// # Errors
    ///
    /// See [`GameSession::vote`]; `State` without a session.
    pub fn vote(&mut self, voter: &PlayerId, voted_for: &PlayerId) -> Result<(), GameError> {
        self.require_round_session()?;
        self.mutate(|session, _, _| session.vote(voter, voted_for))
    }

    #[must_use]
    pub fn has_voted(&self, voter: &PlayerId) -> bool {
        self.session.as_ref().is_some_and(|s| s.has_voted(voter))
    }

    #[must_use]
    pub fn all_players_voted(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(GameSession::all_players_voted)
    }

    #[must_use]
    pub fn pending_voters(&self) -> Vec<Player> {
        self.session.as_ref().map_or_else(Vec::new, |s| {
            s.pending_voters().into_iter().cloned().collect()
        })
    }

    #[must_use]
    pub fn vote_candidates(&self) -> Vec<Player> {
        self.session.as_ref().map_or_else(Vec::new, |s| {
            s.vote_candidates().into_iter().cloned().collect()
        })
    }

    /// Reveal the current round. Revealing twice returns the same result and
    /// leaves the session untouched.
    ///
    /// # Errors
    ///
    /// `State` without a session or without a current round.
    pub fn reveal_round(&mut self) -> Result<RoundResult, GameError> {
        if let Some(result) = self.require_round_session()?.round_result() {
            return Ok(result);
        }
        self.mutate(|session, _, _| session.reveal_round())?;
        self.require_round_session()?
            .round_result()
            .ok_or_else(|| StateError::NoCurrentRound.into())
    }

    /// Result of the current round if it has been revealed.
    #[must_use]
    pub fn round_result(&self) -> Option<RoundResult> {
        self.session.as_ref().and_then(GameSession::round_result)
    }

    #[must_use]
    pub fn game_stats(&self) -> Option<GameStats> {
        self.session.as_ref().map(GameStats::from_session)
    }
}

fn load_session<S: GameStorage>(storage: &S) -> Option<GameSession> {
    let blob = match storage.read(SESSION_STORAGE_KEY) {
        Ok(Some(blob)) => blob,
        Ok(None) => return None,
        Err(err) => {
            log::warn!("could not read saved session: {err}");
            return None;
        }
    };
    match decode_session(&blob) {
        Ok(session) => {
            log::info!(
                "restored session {} ({}, {} players)",
                session.id,
                session.status,
                session.players.len()
            );
            Some(session)
        }
        Err(err) => {
            log::error!("discarding unreadable saved session: {err}");
            if let Err(err) = storage.remove(SESSION_STORAGE_KEY) {
                log::warn!("could not remove unreadable session: {err}");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    /// Storage whose reads and writes can be switched off to simulate a
    /// failing disk. `remove` counts as a write.
    #[derive(Clone, Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_reads: Rc<RefCell<bool>>,
        fail_writes: Rc<RefCell<bool>>,
    }

    impl GameStorage for FlakyStorage {
        type Error = io::Error;

        fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
            if *self.fail_reads.borrow() {
                return Err(io::Error::other("disk unreadable"));
            }
            Ok(self.inner.get(key))
        }

        fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
            if *self.fail_writes.borrow() {
                return Err(io::Error::other("disk unavailable"));
            }
            self.inner.insert(key, blob);
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), Self::Error> {
            if *self.fail_writes.borrow() {
                return Err(io::Error::other("disk unavailable"));
            }
            self.inner.remove(key).map_err(|never| match never {})
        }
    }

    fn engine(storage: MemoryStorage) -> SessionEngine<MemoryStorage> {
        SessionEngine::with_rules(storage, RulesConfig::default(), 99).unwrap()
    }

    #[test]
    fn operations_without_session_are_rejected() {
        let mut engine = engine(MemoryStorage::new());
        assert!(engine.session().is_none());
        assert!(engine.add_player("Ana").unwrap_err().is_validation());
        assert!(engine.start_confessions().unwrap_err().is_validation());
        assert!(engine.next_round().unwrap_err().is_validation());
        let nobody = PlayerId::from("nobody");
        assert!(matches!(
            engine.vote(&nobody, &nobody),
            Err(GameError::State(StateError::NoCurrentRound))
        ));
        assert!(matches!(
            engine.reveal_round(),
            Err(GameError::State(StateError::NoCurrentRound))
        ));
        assert!(engine.round_result().is_none());
        engine.remove_player(&PlayerId::from("nobody")).unwrap();
        assert!(!engine.all_players_voted());
        assert!(!engine.all_players_have_confessions());
        assert!(engine.player_confessions(&PlayerId::from("x")).is_empty());
        assert!(engine.game_stats().is_none());
    }

    #[test]
    fn every_mutation_is_persisted_and_published() {
        let storage = MemoryStorage::new();
        let mut engine = engine(storage.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = engine.subscribe(move |snapshot| {
            sink.borrow_mut()
                .push(snapshot.map(|s| s.players.len()));
        });
        assert_eq!(*seen.borrow(), vec![None]);

        engine.create_new_game().unwrap();
        engine.add_player("Ana").unwrap();
        assert_eq!(*seen.borrow(), vec![None, Some(0), Some(1)]);

        let stored = decode_session(&storage.get(SESSION_STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(Some(&stored), engine.session());

        assert!(engine.add_player("ana").is_err());
        assert_eq!(seen.borrow().len(), 3);

        assert!(engine.unsubscribe(sub));
        assert!(!engine.unsubscribe(sub));
        engine.add_player("Bo").unwrap();
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn failed_write_leaves_session_untouched() {
        let storage = FlakyStorage::default();
        let mut engine =
            SessionEngine::with_rules(storage.clone(), RulesConfig::default(), 5).unwrap();
        engine.create_new_game().unwrap();
        engine.add_player("Ana").unwrap();
        let before = engine.session().cloned();

        *storage.fail_writes.borrow_mut() = true;
        let err = engine.add_player("Bo").unwrap_err();
        assert!(matches!(err, GameError::Storage(_)));
        assert_eq!(engine.session().cloned(), before);
        assert!(engine.clear_game_data().is_err());
        assert!(engine.session().is_some());

        *storage.fail_writes.borrow_mut() = false;
        engine.add_player("Bo").unwrap();
        assert_eq!(engine.session().unwrap().players.len(), 2);
    }

    #[test]
    fn reload_restores_and_corrupt_blob_is_discarded() {
        let storage = MemoryStorage::new();
        let mut first = engine(storage.clone());
        first.create_new_game().unwrap();
        first.add_player("Ana").unwrap();
        let saved = first.session().cloned();

        let second = engine(storage.clone());
        assert_eq!(second.session().cloned(), saved);

        storage.insert(SESSION_STORAGE_KEY, "{ this is not json");
        let third = engine(storage.clone());
        assert!(third.session().is_none());
        assert!(storage.get(SESSION_STORAGE_KEY).is_none());
    }

    #[test]
    fn unreadable_storage_starts_without_session() {
        let storage = FlakyStorage::default();
        let mut first =
            SessionEngine::with_rules(storage.clone(), RulesConfig::default(), 3).unwrap();
        first.create_new_game().unwrap();
        first.add_player("Ana").unwrap();

        *storage.fail_reads.borrow_mut() = true;
        let mut reopened = SessionEngine::new(storage.clone());
        assert!(reopened.session().is_none());
        assert!(storage.inner.get(SESSION_STORAGE_KEY).is_some());

        reopened.create_new_game().unwrap();
        assert!(reopened.session().unwrap().players.is_empty());
    }

    #[test]
    fn corrupt_blob_that_cannot_be_removed_is_still_ignored() {
        let storage = FlakyStorage::default();
        storage.inner.insert(SESSION_STORAGE_KEY, "[1, 2, 3]");
        *storage.fail_writes.borrow_mut() = true;

        let engine = SessionEngine::with_rules(storage.clone(), RulesConfig::default(), 3).unwrap();
        assert!(engine.session().is_none());
        assert_eq!(
            storage.inner.get(SESSION_STORAGE_KEY).as_deref(),
            Some("[1, 2, 3]")
        );

        *storage.fail_writes.borrow_mut() = false;
        let engine = SessionEngine::with_rules(storage.clone(), RulesConfig::default(), 3).unwrap();
        assert!(engine.session().is_none());
        assert!(storage.inner.get(SESSION_STORAGE_KEY).is_none());
    }

    #[test]
    fn clear_game_data_drops_session_and_blob() {
        let storage = MemoryStorage::new();
        let mut engine = engine(storage.clone());
        engine.create_new_game().unwrap();
        let last = Rc::new(RefCell::new(Some(String::new())));
        let sink = Rc::clone(&last);
        engine.subscribe(move |snapshot| {
            *sink.borrow_mut() = snapshot.map(|s| s.id.to_string());
        });
        engine.clear_game_data().unwrap();
        assert!(engine.session().is_none());
        assert!(last.borrow().is_none());
        assert!(storage.get(SESSION_STORAGE_KEY).is_none());
    }

    #[test]
    fn create_new_game_replaces_live_session() {
        let mut engine = engine(MemoryStorage::new());
        let first = engine.create_new_game().unwrap();
        engine.add_player("Ana").unwrap();
        let second = engine.create_new_game().unwrap();
        assert_ne!(first, second);
        let session = engine.session().unwrap();
        assert!(session.players.is_empty());
        assert_eq!(session.heat_level.get(), 1);
    }

    #[test]
    fn invalid_rules_are_rejected_up_front() {
        let rules = RulesConfig {
            max_players: 12,
            ..RulesConfig::default()
        };
        assert!(SessionEngine::with_rules(MemoryStorage::new(), rules, 1).is_err());
    }
}
