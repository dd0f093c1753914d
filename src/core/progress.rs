/// Journey completion: the per-session cache used on the hot path, and the
/// backing stores it is seeded from.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::schema::journey::{Journey, JourneyCatalog, JourneyId};
use crate::schema::player::PlayerId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("progress store lock poisoned")]
    Poisoned,
}

/// Completed journeys for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    completed: FxHashSet<JourneyId>,
}

impl Progress {
    pub fn new(completed: impl IntoIterator<Item = JourneyId>) -> Self {
        Self {
            completed: completed.into_iter().collect(),
        }
    }

    pub fn is_complete(&self, id: JourneyId) -> bool {
        self.completed.contains(&id)
    }

    /// Returns `true` the first time a journey is marked.
    pub fn mark_complete(&mut self, id: JourneyId) -> bool {
        self.completed.insert(id)
    }

    /// Journey 1 is always open; journey k opens once k-1 is complete.
    pub fn is_unlocked(&self, id: JourneyId) -> bool {
        match id.previous() {
            None => id == JourneyId::FIRST,
            Some(prev) => self.is_complete(prev),
        }
    }

    pub fn unlocked<'a>(&self, catalog: &'a JourneyCatalog) -> Vec<&'a Journey> {
        catalog.iter().filter(|j| self.is_unlocked(j.id)).collect()
    }

    /// Lowest-numbered journey that is open but not yet complete.
    pub fn next_journey<'a>(&self, catalog: &'a JourneyCatalog) -> Option<&'a Journey> {
        catalog
            .iter()
            .find(|j| self.is_unlocked(j.id) && !self.is_complete(j.id))
    }

    pub fn all_complete(&self, catalog: &JourneyCatalog) -> bool {
        catalog.iter().all(|j| self.is_complete(j.id))
    }

    pub fn completed(&self) -> BTreeSet<JourneyId> {
        self.completed.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }
}

/// Where completion records live between sessions.
pub trait ProgressStore: Send + Sync {
    fn load_completed(&self, player: PlayerId) -> Result<FxHashSet<JourneyId>, StoreError>;

    /// Duplicate marks are a no-op.
    fn mark_complete(&self, player: PlayerId, journey: JourneyId) -> Result<(), StoreError>;

    fn is_complete(&self, player: PlayerId, journey: JourneyId) -> Result<bool, StoreError> {
        Ok(self.load_completed(player)?.contains(&journey))
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: Mutex<BTreeMap<PlayerId, BTreeSet<JourneyId>>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load_completed(&self, player: PlayerId) -> Result<FxHashSet<JourneyId>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .get(&player)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn mark_complete(&self, player: PlayerId, journey: JourneyId) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.entry(player).or_default().insert(journey);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "Progress")]
struct RonProgress {
    completed: BTreeMap<u64, BTreeSet<u8>>,
}

/// Store that keeps the whole completion table in one RON file and
/// rewrites it on every new mark.
#[derive(Debug)]
pub struct RonFileProgressStore {
    path: PathBuf,
    table: Mutex<RonProgress>,
}

impl RonFileProgressStore {
    /// Open `path`, starting empty if the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let table = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            ron::from_str(&contents)?
        } else {
            RonProgress::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            table: Mutex::new(table),
        })
    }

    fn persist(&self, table: &RonProgress) -> Result<(), StoreError> {
        let text = ron::ser::to_string_pretty(table, ron::ser::PrettyConfig::default())?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl ProgressStore for RonFileProgressStore {
    fn load_completed(&self, player: PlayerId) -> Result<FxHashSet<JourneyId>, StoreError> {
        let table = self.table.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(table
            .completed
            .get(&player.0)
            .map(|set| set.iter().map(|&id| JourneyId(id)).collect())
            .unwrap_or_default())
    }

    fn mark_complete(&self, player: PlayerId, journey: JourneyId) -> Result<(), StoreError> {
        let mut table = self.table.lock().map_err(|_| StoreError::Poisoned)?;
        if table.completed.get(&player.0).is_some_and(|set| set.contains(&journey.0)) {
            return Ok(());
        }
        // Only a table that reached the disk replaces the in-memory one.
        let mut updated = table.clone();
        updated.completed.entry(player.0).or_default().insert(journey.0);
        self.persist(&updated)?;
        *table = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_order() {
        let catalog = JourneyCatalog::standard();
        let mut progress = Progress::default();
        for journey in catalog.iter() {
            let expected = journey.id.0 == 1;
            assert_eq!(progress.is_unlocked(journey.id), expected, "{:?}", journey.id);
        }

        progress.mark_complete(JourneyId(1));
        progress.mark_complete(JourneyId(2));
        assert!(progress.is_unlocked(JourneyId(3)));
        assert!(!progress.is_unlocked(JourneyId(4)));

        // Completing 3 without 2 would still open 4: the rule only looks
        // one step back.
        let skip = Progress::new([JourneyId(3)]);
        assert!(skip.is_unlocked(JourneyId(4)));
        assert!(!skip.is_unlocked(JourneyId(3)));
    }

    #[test]
    fn mark_complete_is_idempotent() {
        let mut progress = Progress::default();
        assert!(progress.mark_complete(JourneyId(1)));
        assert!(!progress.mark_complete(JourneyId(1)));
        assert_eq!(progress.len(), 1);
    }

    #[test]
    fn next_and_all_complete() {
        let catalog = JourneyCatalog::standard();
        let mut progress = Progress::new([JourneyId(1)]);
        assert_eq!(progress.next_journey(&catalog).unwrap().id, JourneyId(2));
        for j in catalog.iter() {
            progress.mark_complete(j.id);
        }
        assert!(progress.all_complete(&catalog));
        assert!(progress.next_journey(&catalog).is_none());
        assert_eq!(progress.unlocked(&catalog).len(), 7);
    }

    #[test]
    fn memory_store_dedupes() {
        let store = MemoryProgressStore::new();
        let p = PlayerId(9);
        store.mark_complete(p, JourneyId(1)).unwrap();
        store.mark_complete(p, JourneyId(1)).unwrap();
        assert_eq!(store.load_completed(p).unwrap().len(), 1);
        assert!(store.is_complete(p, JourneyId(1)).unwrap());
        assert!(store.load_completed(PlayerId(10)).unwrap().is_empty());
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.ron");
        {
            let store = RonFileProgressStore::open(&path).unwrap();
            store.mark_complete(PlayerId(1), JourneyId(1)).unwrap();
            store.mark_complete(PlayerId(1), JourneyId(2)).unwrap();
        }
        let reopened = RonFileProgressStore::open(&path).unwrap();
        let done = reopened.load_completed(PlayerId(1)).unwrap();
        assert!(done.contains(&JourneyId(2)));
        assert_eq!(done.len(), 2);
    }

    #[test]
    fn failed_write_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("not_yet");
        let path = parent.join("progress.ron");
        let store = RonFileProgressStore::open(&path).unwrap();
        let p = PlayerId(7);

        assert!(store.mark_complete(p, JourneyId(1)).is_err());
        assert!(!store.is_complete(p, JourneyId(1)).unwrap());

        std::fs::create_dir(&parent).unwrap();
        store.mark_complete(p, JourneyId(1)).unwrap();
        assert!(path.exists());

        let reopened = RonFileProgressStore::open(&path).unwrap();
        assert!(reopened.is_complete(p, JourneyId(1)).unwrap());
    }
}
