//! Live engine state: rule validator, match state machine, and the
//! concurrent registry of in-progress matches.

pub mod live_match;
pub mod rules;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::dao::match_store::{MatchStore, PlayerDirectory};
use crate::state::live_match::LiveMatch;

pub use self::live_match::{LegCompletionError, ThrowEvent, ThrowRejection};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// A registry entry: one live match behind its own lock so mutating
/// operations on a match are linearized without blocking unrelated matches.
pub type SharedMatch = Arc<Mutex<LiveMatch>>;

/// Central application state owning the live match registry and the
/// constructor-injected persistence collaborators.
pub struct AppState {
    matches: DashMap<u64, SharedMatch>,
    next_match_id: AtomicU64,
    players: Arc<dyn PlayerDirectory>,
    match_store: Arc<dyn MatchStore>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be
    /// cloned cheaply across handlers.
    pub fn new(
        config: AppConfig,
        players: Arc<dyn PlayerDirectory>,
        match_store: Arc<dyn MatchStore>,
    ) -> SharedState {
        Arc::new(Self {
            matches: DashMap::new(),
            next_match_id: AtomicU64::new(1),
            players,
            match_store,
            config,
        })
    }

    /// Runtime configuration (match format).
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Player lookup collaborator.
    pub fn players(&self) -> &Arc<dyn PlayerDirectory> {
        &self.players
    }

    /// Persistence collaborator for finished matches.
    pub fn match_store(&self) -> &Arc<dyn MatchStore> {
        &self.match_store
    }

    /// Allocate the next match id from the process-wide counter.
    pub fn allocate_match_id(&self) -> u64 {
        self.next_match_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Insert a freshly created match into the registry.
    pub fn insert_match(&self, live: LiveMatch) -> SharedMatch {
        let id = live.id;
        let shared: SharedMatch = Arc::new(Mutex::new(live));
        self.matches.insert(id, shared.clone());
        shared
    }

    /// Registry entry for a match id, if it is still live.
    pub fn live_match(&self, id: u64) -> Option<SharedMatch> {
        self.matches.get(&id).map(|entry| entry.value().clone())
    }

    /// Remove a match from the registry once it has been persisted.
    pub fn remove_match(&self, id: u64) -> Option<SharedMatch> {
        self.matches.remove(&id).map(|(_, shared)| shared)
    }

    /// Snapshot of every live registry entry, ordered by match id.
    pub fn active_matches(&self) -> Vec<SharedMatch> {
        let mut entries: Vec<(u64, SharedMatch)> = self
            .matches
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, shared)| shared).collect()
    }

    /// Number of matches currently live.
    pub fn active_match_count(&self) -> usize {
        self.matches.len()
    }
}
