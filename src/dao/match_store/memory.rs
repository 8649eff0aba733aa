//! In-memory storage backend.
//!
//! The engine treats persistence as an external collaborator; this backend
//! keeps everything in process memory so the binary and the tests can run
//! without a database.

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::match_store::{MatchStore, PlayerDirectory};
use crate::dao::models::{LegEntity, MatchEntity, PlayerEntity, ThrowEntity};
use crate::dao::storage::StorageResult;

/// Thread-safe in-memory player directory and match store.
#[derive(Debug)]
pub struct InMemoryStore {
    players: DashMap<i64, PlayerEntity>,
    matches: DashMap<i64, MatchEntity>,
    legs: DashMap<i64, (i64, LegEntity)>,
    throws: DashMap<(i64, i64), Vec<ThrowEntity>>,
    next_id: AtomicI64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Empty store with no registered players.
    pub fn new() -> Self {
        Self {
            players: DashMap::new(),
            matches: DashMap::new(),
            legs: DashMap::new(),
            throws: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Store pre-seeded with the given players.
    pub fn with_players(players: impl IntoIterator<Item = PlayerEntity>) -> Self {
        let store = Self::new();
        for player in players {
            store.players.insert(player.id, player);
        }
        store
    }

    /// Register or replace a player.
    pub fn upsert_player(&self, player: PlayerEntity) {
        self.players.insert(player.id, player);
    }

    /// Number of persisted matches.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// A persisted match by its assigned id.
    pub fn persisted_match(&self, id: i64) -> Option<MatchEntity> {
        self.matches.get(&id).map(|entry| entry.value().clone())
    }

    /// Persisted legs of a match, ordered by leg number.
    pub fn persisted_legs(&self, match_id: i64) -> Vec<(i64, LegEntity)> {
        let mut legs: Vec<(i64, LegEntity)> = self
            .legs
            .iter()
            .filter(|entry| entry.value().0 == match_id)
            .map(|entry| (*entry.key(), entry.value().1.clone()))
            .collect();
        legs.sort_by_key(|(_, leg)| leg.leg_number);
        legs
    }

    /// Persisted throws of a leg, in insertion order.
    pub fn persisted_throws(&self, match_id: i64, leg_id: i64) -> Vec<ThrowEntity> {
        self.throws
            .get(&(match_id, leg_id))
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl PlayerDirectory for InMemoryStore {
    fn find_player(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let player = self.players.get(&id).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(player) })
    }
}

impl MatchStore for InMemoryStore {
    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<i64>> {
        let id = self.allocate_id();
        self.matches.insert(id, entity);
        Box::pin(async move { Ok(id) })
    }

    fn save_leg(
        &self,
        match_id: i64,
        entity: LegEntity,
    ) -> BoxFuture<'static, StorageResult<i64>> {
        let id = self.allocate_id();
        self.legs.insert(id, (match_id, entity));
        Box::pin(async move { Ok(id) })
    }

    fn save_throw(
        &self,
        match_id: i64,
        leg_id: i64,
        entity: ThrowEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.throws
            .entry((match_id, leg_id))
            .or_default()
            .push(entity);
        Box::pin(async move { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    #[tokio::test]
    async fn default_store_assigns_ids_from_one() {
        let store = InMemoryStore::default();
        let entity = MatchEntity {
            home_player_id: 1,
            away_player_id: 2,
            tournament_id: None,
            home_legs_won: 3,
            away_legs_won: 0,
            home_three_dart_average: 60.0,
            away_three_dart_average: 45.0,
            winner_player_id: Some(1),
            started_at: SystemTime::now(),
            duration_seconds: 0,
        };
        assert_eq!(store.save_match(entity.clone()).await.unwrap(), 1);
        assert_eq!(store.save_match(entity).await.unwrap(), 2);
    }
}
