use std::sync::Arc;

use tracing::info;

use crate::{
    dao::models::{LegEntity, MatchEntity, PlayerEntity, ThrowEntity},
    dto::matches::{
        CreateMatchRequest, LegFinishResponse, LiveMatchView, MatchReport, ThrowRequest,
        ThrowResponse, UndoRequest, UndoResponse,
    },
    error::ServiceError,
    state::{SharedMatch, SharedState, live_match::LiveMatch, live_match::PlayerSide},
};

/// Open a new live match between two resolved players.
pub async fn create_match(
    state: &SharedState,
    request: CreateMatchRequest,
) -> Result<LiveMatchView, ServiceError> {
    if request.home_player_id == request.away_player_id {
        return Err(ServiceError::InvalidInput(
            "a match requires two distinct players".into(),
        ));
    }

    let home = resolve_player(state, request.home_player_id).await?;
    let away = resolve_player(state, request.away_player_id).await?;

    let id = state.allocate_match_id();
    let live = LiveMatch::new(
        id,
        PlayerSide {
            id: home.id,
            name: home.name,
        },
        PlayerSide {
            id: away.id,
            name: away.name,
        },
        request.tournament_id,
        state.config().starting_score,
        state.config().legs_to_win,
    );
    let view = LiveMatchView::from(&live);
    state.insert_match(live);

    info!(
        match_id = id,
        home = request.home_player_id,
        away = request.away_player_id,
        "live match created"
    );
    Ok(view)
}

/// Snapshot of one live match.
pub async fn get_match(state: &SharedState, match_id: u64) -> Result<LiveMatchView, ServiceError> {
    let shared = require_match(state, match_id)?;
    let guard = shared.lock().await;
    Ok(LiveMatchView::from(&*guard))
}

/// Snapshot of every live match, ordered by match id.
pub async fn list_active_matches(state: &SharedState) -> Vec<LiveMatchView> {
    let mut views = Vec::new();
    for shared in state.active_matches() {
        let guard = shared.lock().await;
        views.push(LiveMatchView::from(&*guard));
    }
    views
}

/// Apply one scoring call to a live match.
///
/// Expected rejections (wrong turn, exhausted darts, invalid score, finished
/// match) come back as `accepted = false` data; only an unknown match id is
/// an error.
pub async fn record_throw(
    state: &SharedState,
    match_id: u64,
    request: ThrowRequest,
) -> Result<ThrowResponse, ServiceError> {
    let shared = require_match(state, match_id)?;
    let mut guard = shared.lock().await;
    match guard.record_throw(request.player_id, request.score, request.darts_used) {
        Ok(event) => Ok(ThrowResponse::applied(event, &guard)),
        Err(rejection) => Ok(ThrowResponse::rejected(rejection)),
    }
}

/// Remove the most recent throw of a player within the current leg.
pub async fn undo_last_throw(
    state: &SharedState,
    match_id: u64,
    request: UndoRequest,
) -> Result<UndoResponse, ServiceError> {
    let shared = require_match(state, match_id)?;
    let mut guard = shared.lock().await;
    match guard.undo_last_throw(request.player_id) {
        Ok(restored_score) => Ok(UndoResponse {
            accepted: true,
            rejection: None,
            restored_score: Some(restored_score),
            match_state: Some(LiveMatchView::from(&*guard)),
        }),
        Err(rejection) => Ok(UndoResponse {
            accepted: false,
            rejection: Some(rejection.to_string()),
            restored_score: None,
            match_state: None,
        }),
    }
}

/// Explicitly close the current leg, crediting the player at exactly 0.
///
/// A finishing throw already closes its leg; this entry point covers callers
/// that drive leg transitions themselves and fails when no player has
/// checked out.
pub async fn finish_leg(
    state: &SharedState,
    match_id: u64,
) -> Result<LegFinishResponse, ServiceError> {
    let shared = require_match(state, match_id)?;
    let mut guard = shared.lock().await;
    let result = guard
        .complete_leg()
        .map_err(|err| ServiceError::InvalidState(err.to_string()))?;

    info!(
        match_id,
        leg_winner = result.winner_id,
        match_finished = result.match_finished,
        "leg completed"
    );
    Ok(LegFinishResponse {
        winner_player_id: result.winner_id,
        match_finished: result.match_finished,
        match_state: LiveMatchView::from(&*guard),
    })
}

/// Persist a finished match and evict it from the live registry.
///
/// The match stays in the registry until every persistence call succeeded,
/// so a failed hand-off can be retried without losing in-memory state. This
/// is the engine's only I/O path.
pub async fn finish_match(
    state: &SharedState,
    match_id: u64,
) -> Result<MatchReport, ServiceError> {
    let shared = require_match(state, match_id)?;
    let guard = shared.lock().await;
    // A concurrent finalize may have persisted and evicted this entry while
    // we waited for the lock; re-check under the lock so the match is
    // written out at most once.
    let still_registered = state
        .live_match(match_id)
        .is_some_and(|entry| Arc::ptr_eq(&entry, &shared));
    if !still_registered {
        return Err(ServiceError::NotFound(format!(
            "match `{match_id}` not found"
        )));
    }
    if !guard.finished {
        return Err(ServiceError::InvalidState("match not finished".into()));
    }

    let entity = MatchEntity::from(&*guard);
    let store = state.match_store();
    let persisted_id = store.save_match(entity.clone()).await?;
    for leg in &guard.legs {
        let leg_id = store.save_leg(persisted_id, LegEntity::from(leg)).await?;
        for throw in guard.throws_in_leg(leg.number) {
            store
                .save_throw(persisted_id, leg_id, ThrowEntity::from(throw))
                .await?;
        }
    }
    // Evict while still holding the lock so no other finalize can slip in
    // between the last write and the removal.
    state.remove_match(match_id);
    drop(guard);

    info!(
        match_id,
        persisted_id,
        winner = entity.winner_player_id,
        "match persisted and removed from the live registry"
    );
    Ok(MatchReport {
        persisted_id,
        match_id,
        winner_player_id: entity.winner_player_id,
        home_legs_won: entity.home_legs_won,
        away_legs_won: entity.away_legs_won,
        home_three_dart_average: entity.home_three_dart_average,
        away_three_dart_average: entity.away_three_dart_average,
        duration_seconds: entity.duration_seconds,
    })
}

fn require_match(state: &SharedState, match_id: u64) -> Result<SharedMatch, ServiceError> {
    state
        .live_match(match_id)
        .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}` not found")))
}

async fn resolve_player(state: &SharedState, id: i64) -> Result<PlayerEntity, ServiceError> {
    match state.players().find_player(id).await? {
        Some(player) => Ok(player),
        None => Err(ServiceError::InvalidInput(format!("invalid player `{id}`"))),
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};

    use futures::future::BoxFuture;
    use tokio::sync::Notify;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::match_store::{MatchStore, memory::InMemoryStore},
        dao::storage::{StorageError, StorageResult},
        state::AppState,
    };

    fn seed_players() -> [PlayerEntity; 2] {
        [
            PlayerEntity {
                id: 1,
                name: "Alice".into(),
            },
            PlayerEntity {
                id: 2,
                name: "Bob".into(),
            },
        ]
    }

    fn test_state() -> (SharedState, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::with_players(seed_players()));
        let state = AppState::new(AppConfig::default(), store.clone(), store.clone());
        (state, store)
    }

    /// Store that fails the next `save_match` call, then recovers.
    struct FlakyStore {
        inner: Arc<InMemoryStore>,
        fail_next: AtomicBool,
    }

    impl MatchStore for FlakyStore {
        fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<i64>> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Box::pin(async {
                    Err(StorageError::unavailable(
                        "match store unreachable".into(),
                        io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"),
                    ))
                });
            }
            self.inner.save_match(entity)
        }

        fn save_leg(
            &self,
            match_id: i64,
            entity: LegEntity,
        ) -> BoxFuture<'static, StorageResult<i64>> {
            self.inner.save_leg(match_id, entity)
        }

        fn save_throw(
            &self,
            match_id: i64,
            leg_id: i64,
            entity: ThrowEntity,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_throw(match_id, leg_id, entity)
        }
    }

    /// Store that parks inside `save_match` until the test releases it,
    /// pinning a finalize mid-persist.
    struct GatedStore {
        inner: Arc<InMemoryStore>,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl MatchStore for GatedStore {
        fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<i64>> {
            let inner = self.inner.clone();
            let entered = self.entered.clone();
            let release = self.release.clone();
            Box::pin(async move {
                entered.notify_one();
                release.notified().await;
                inner.save_match(entity).await
            })
        }

        fn save_leg(
            &self,
            match_id: i64,
            entity: LegEntity,
        ) -> BoxFuture<'static, StorageResult<i64>> {
            self.inner.save_leg(match_id, entity)
        }

        fn save_throw(
            &self,
            match_id: i64,
            leg_id: i64,
            entity: ThrowEntity,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_throw(match_id, leg_id, entity)
        }
    }

    fn create_request() -> CreateMatchRequest {
        CreateMatchRequest {
            home_player_id: 1,
            away_player_id: 2,
            tournament_id: Some(7),
        }
    }

    async fn throw(state: &SharedState, match_id: u64, player_id: i64, score: i32, darts: u8) {
        let response = record_throw(
            state,
            match_id,
            ThrowRequest {
                player_id,
                score,
                darts_used: darts,
            },
        )
        .await
        .unwrap();
        assert!(response.accepted, "throw {score} rejected unexpectedly");
    }

    /// Drive a full leg win for the given player through the service layer.
    async fn win_leg(state: &SharedState, match_id: u64, player_id: i64) {
        loop {
            let view = get_match(state, match_id).await.unwrap();
            let (current, score) = if view.home.id == player_id {
                (view.current_player_id, view.home.score)
            } else {
                (view.current_player_id, view.away.score)
            };
            if current != player_id {
                throw(state, match_id, current, 0, 3).await;
                continue;
            }
            if score == 40 {
                throw(state, match_id, player_id, 40, 1).await;
                return;
            }
            let turn = (score - 40).min(140);
            throw(state, match_id, player_id, i32::from(turn), 3).await;
        }
    }

    #[tokio::test]
    async fn creates_a_match_with_resolved_players() {
        let (state, _) = test_state();
        let view = create_match(&state, create_request()).await.unwrap();

        assert_eq!(view.home.name, "Alice");
        assert_eq!(view.away.name, "Bob");
        assert_eq!(view.tournament_id, Some(7));
        assert_eq!(view.home.score, 501);
        assert_eq!(view.current_player_id, 1);
        assert_eq!(state.active_match_count(), 1);
    }

    #[tokio::test]
    async fn rejects_unknown_players_at_creation() {
        let (state, _) = test_state();
        let result = create_match(
            &state,
            CreateMatchRequest {
                home_player_id: 1,
                away_player_id: 99,
                tournament_id: None,
            },
        )
        .await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
        assert_eq!(state.active_match_count(), 0);
    }

    #[tokio::test]
    async fn match_ids_are_monotonic() {
        let (state, store) = test_state();
        store.upsert_player(PlayerEntity {
            id: 3,
            name: "Cara".into(),
        });
        let first = create_match(&state, create_request()).await.unwrap();
        let second = create_match(
            &state,
            CreateMatchRequest {
                home_player_id: 2,
                away_player_id: 3,
                tournament_id: None,
            },
        )
        .await
        .unwrap();
        assert!(second.id > first.id);

        let listed = list_active_matches(&state).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }

    #[tokio::test]
    async fn unknown_match_id_is_not_found() {
        let (state, _) = test_state();
        assert!(matches!(
            get_match(&state, 42).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            record_throw(
                &state,
                42,
                ThrowRequest {
                    player_id: 1,
                    score: 60,
                    darts_used: 3
                }
            )
            .await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejected_throws_come_back_as_data() {
        let (state, _) = test_state();
        let view = create_match(&state, create_request()).await.unwrap();

        // Away player out of turn.
        let response = record_throw(
            &state,
            view.id,
            ThrowRequest {
                player_id: 2,
                score: 60,
                darts_used: 3,
            },
        )
        .await
        .unwrap();
        assert!(!response.accepted);
        assert!(response.rejection.unwrap().contains("not the current"));

        // Impossible total.
        let response = record_throw(
            &state,
            view.id,
            ThrowRequest {
                player_id: 1,
                score: 179,
                darts_used: 3,
            },
        )
        .await
        .unwrap();
        assert!(!response.accepted);
        assert!(response.rejection.unwrap().contains("not possible"));

        let unchanged = get_match(&state, view.id).await.unwrap();
        assert_eq!(unchanged.home.score, 501);
        assert_eq!(unchanged.darts_thrown_this_turn, 0);
    }

    #[tokio::test]
    async fn undo_round_trip() {
        let (state, _) = test_state();
        let view = create_match(&state, create_request()).await.unwrap();
        throw(&state, view.id, 1, 60, 1).await;

        let response = undo_last_throw(&state, view.id, UndoRequest { player_id: 1 })
            .await
            .unwrap();
        assert!(response.accepted);
        assert_eq!(response.restored_score, Some(501));

        let response = undo_last_throw(&state, view.id, UndoRequest { player_id: 1 })
            .await
            .unwrap();
        assert!(!response.accepted);
        assert!(response.rejection.unwrap().contains("no throw to undo"));
    }

    #[tokio::test]
    async fn finish_leg_requires_a_checkout() {
        let (state, _) = test_state();
        let view = create_match(&state, create_request()).await.unwrap();
        let result = finish_leg(&state, view.id).await;
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn finish_match_rejects_unfinished_matches_without_persisting() {
        let (state, store) = test_state();
        let view = create_match(&state, create_request()).await.unwrap();

        let result = finish_match(&state, view.id).await;
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
        assert_eq!(store.match_count(), 0);
        // The match is still live and scorable.
        throw(&state, view.id, 1, 60, 3).await;
    }

    #[tokio::test]
    async fn full_match_is_persisted_and_evicted() {
        let (state, store) = test_state();
        let view = create_match(&state, create_request()).await.unwrap();

        win_leg(&state, view.id, 1).await;
        win_leg(&state, view.id, 2).await;
        win_leg(&state, view.id, 1).await;
        win_leg(&state, view.id, 1).await;

        let snapshot = get_match(&state, view.id).await.unwrap();
        assert!(snapshot.is_finished);
        assert_eq!(snapshot.winner_player_id, Some(1));
        assert_eq!(snapshot.home.legs_won, 3);

        let report = finish_match(&state, view.id).await.unwrap();
        assert_eq!(report.winner_player_id, Some(1));
        assert_eq!(report.home_legs_won, 3);
        assert_eq!(report.away_legs_won, 1);
        assert!(report.home_three_dart_average > 0.0);

        // Evicted from the registry, persisted in the store.
        assert!(matches!(
            get_match(&state, view.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(store.match_count(), 1);

        let persisted = store.persisted_match(report.persisted_id).unwrap();
        assert_eq!(persisted.winner_player_id, Some(1));
        let legs = store.persisted_legs(report.persisted_id);
        assert_eq!(legs.len(), 4);
        for (leg_id, leg) in &legs {
            let throws = store.persisted_throws(report.persisted_id, *leg_id);
            assert!(!throws.is_empty());
            assert!(throws.iter().all(|t| t.leg_number == leg.leg_number));
            assert!(throws.last().unwrap().is_finishing_throw);
        }
    }

    #[tokio::test]
    async fn failed_persistence_keeps_the_match_live_for_a_retry() {
        let inner = Arc::new(InMemoryStore::with_players(seed_players()));
        let store = Arc::new(FlakyStore {
            inner: inner.clone(),
            fail_next: AtomicBool::new(true),
        });
        let state = AppState::new(AppConfig::default(), inner.clone(), store);

        let view = create_match(&state, create_request()).await.unwrap();
        for _ in 0..3 {
            win_leg(&state, view.id, 1).await;
        }

        let result = finish_match(&state, view.id).await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        // Nothing persisted and the match is still live.
        assert_eq!(inner.match_count(), 0);
        assert_eq!(state.active_match_count(), 1);

        // A retry against the recovered store succeeds and evicts.
        let report = finish_match(&state, view.id).await.unwrap();
        assert_eq!(report.winner_player_id, Some(1));
        assert_eq!(inner.match_count(), 1);
        assert!(matches!(
            get_match(&state, view.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_finishes_persist_the_match_once() {
        let inner = Arc::new(InMemoryStore::with_players(seed_players()));
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let store = Arc::new(GatedStore {
            inner: inner.clone(),
            entered: entered.clone(),
            release: release.clone(),
        });
        let state = AppState::new(AppConfig::default(), inner.clone(), store);

        let view = create_match(&state, create_request()).await.unwrap();
        for _ in 0..3 {
            win_leg(&state, view.id, 1).await;
        }
        let match_id = view.id;

        let first = tokio::spawn({
            let state = state.clone();
            async move { finish_match(&state, match_id).await }
        });
        // The first finalize is now mid-persist, holding the match lock.
        entered.notified().await;

        let second = tokio::spawn({
            let state = state.clone();
            async move { finish_match(&state, match_id).await }
        });
        // Let the second finalize pass the registry lookup and park on the
        // match lock before the first one completes.
        tokio::task::yield_now().await;

        release.notify_one();
        let first = first.await.unwrap();
        let second = second.await.unwrap();

        assert!(first.is_ok());
        assert!(matches!(second, Err(ServiceError::NotFound(_))));
        assert_eq!(inner.match_count(), 1);
        assert_eq!(state.active_match_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_throws_on_one_match_are_linearized() {
        let (state, _) = test_state();
        let view = create_match(&state, create_request()).await.unwrap();
        let match_id = view.id;

        // Both players hammer the same match; only calls matching the
        // current thrower and dart budget may apply.
        // Few enough turns that 26 a turn can never bust from 501, so every
        // accepted call subtracts exactly 26.
        let mut handles = Vec::new();
        for player_id in [1i64, 2] {
            for _ in 0..8 {
                let state = state.clone();
                handles.push(tokio::spawn(async move {
                    let response = record_throw(
                        &state,
                        match_id,
                        ThrowRequest {
                            player_id,
                            score: 26,
                            darts_used: 3,
                        },
                    )
                    .await
                    .unwrap();
                    response.accepted
                }));
            }
        }
        let mut accepted = 0u32;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }
        assert!(accepted > 0);

        let snapshot = get_match(&state, match_id).await.unwrap();
        let expected_total = u32::from(snapshot.home.score) + u32::from(snapshot.away.score);
        assert_eq!(expected_total, 501 * 2 - accepted * 26);
        assert_eq!(snapshot.darts_thrown_this_turn, 0);
    }
}
