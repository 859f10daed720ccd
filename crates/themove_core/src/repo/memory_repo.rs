//! In-memory move store.
//!
//! Backs previews, tests and the CLI smoke run. Writes publish synchronously, so
//! subscribers observe each change before the write call returns.

use crate::model::move_record::{Move, MoveId, MovePatch};
use crate::repo::feed::{SnapshotFeed, SnapshotListener, Subscription};
use crate::repo::move_repo::{
    sort_newest_first, MoveRepository, RepoError, RepoResult, StoreCapabilities,
};
use log::info;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Move store kept entirely in process memory.
#[derive(Default)]
pub struct InMemoryMoveRepository {
    moves: Mutex<BTreeMap<MoveId, Move>>,
    capabilities: StoreCapabilities,
    feed: SnapshotFeed,
}

impl InMemoryMoveRepository {
    pub fn new(capabilities: StoreCapabilities) -> Self {
        Self {
            moves: Mutex::new(BTreeMap::new()),
            capabilities,
            feed: SnapshotFeed::new(),
        }
    }

    /// Builds a store pre-filled with `records`. Invalid records are rejected.
    pub fn with_moves(
        capabilities: StoreCapabilities,
        records: impl IntoIterator<Item = Move>,
    ) -> RepoResult<Self> {
        let repo = Self::new(capabilities);
        {
            let mut moves = repo.lock();
            for record in records {
                record.validate()?;
                if moves.contains_key(&record.id) {
                    return Err(RepoError::DuplicateId(record.id));
                }
                moves.insert(record.id.clone(), record);
            }
        }
        Ok(repo)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<MoveId, Move>> {
        self.moves
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self) {
        let snapshot = snapshot_of(&self.lock());
        self.feed.publish(&snapshot);
    }
}

impl MoveRepository for InMemoryMoveRepository {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    fn list_moves(&self) -> RepoResult<Vec<Move>> {
        Ok(snapshot_of(&self.lock()))
    }

    fn get_move(&self, id: &MoveId) -> RepoResult<Option<Move>> {
        Ok(self.lock().get(id).cloned())
    }

    fn create_move(&self, record: &Move) -> RepoResult<MoveId> {
        record.validate()?;
        {
            let mut moves = self.lock();
            if moves.contains_key(&record.id) {
                return Err(RepoError::DuplicateId(record.id.clone()));
            }
            moves.insert(record.id.clone(), record.clone());
        }
        info!("event=move_create module=repo status=ok store=memory");
        self.publish();
        Ok(record.id.clone())
    }

    fn update_move(&self, id: &MoveId, patch: &MovePatch) -> RepoResult<()> {
        {
            let mut moves = self.lock();
            let record = moves
                .get_mut(id)
                .ok_or_else(|| RepoError::NotFound(id.clone()))?;
            patch.apply_to(record)?;
        }
        self.publish();
        Ok(())
    }

    fn delete_move(&self, id: &MoveId) -> RepoResult<()> {
        if !self.capabilities.supports_delete {
            return Err(RepoError::Unsupported("delete"));
        }
        if self.lock().remove(id).is_none() {
            return Err(RepoError::NotFound(id.clone()));
        }
        info!("event=move_delete module=repo status=ok store=memory");
        self.publish();
        Ok(())
    }

    fn subscribe(&self, listener: SnapshotListener) -> RepoResult<Subscription> {
        Ok(self.feed.subscribe(listener))
    }
}

fn snapshot_of(moves: &BTreeMap<MoveId, Move>) -> Vec<Move> {
    let mut snapshot = moves.values().cloned().collect::<Vec<_>>();
    sort_newest_first(&mut snapshot);
    snapshot
}
