pub mod memory;

use futures::future::BoxFuture;

use crate::dao::models::{LegEntity, MatchEntity, PlayerEntity, ThrowEntity};
use crate::dao::storage::StorageResult;

/// Lookup of league players, consumed at match creation to resolve ids to
/// display names and reject unknown players.
pub trait PlayerDirectory: Send + Sync {
    /// Resolve a player id to its record, if it exists.
    fn find_player(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
}

/// Abstraction over the persistence layer for finished matches.
///
/// The engine calls these in order: match, then each leg, then each leg's
/// throws. Identifiers assigned by the backend thread through the calls.
pub trait MatchStore: Send + Sync {
    /// Persist a finished match summary, returning its assigned id.
    fn save_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<i64>>;
    /// Persist a completed leg of a persisted match, returning its id.
    fn save_leg(
        &self,
        match_id: i64,
        entity: LegEntity,
    ) -> BoxFuture<'static, StorageResult<i64>>;
    /// Persist a throw belonging to a persisted leg.
    fn save_throw(
        &self,
        match_id: i64,
        leg_id: i64,
        entity: ThrowEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
}
