use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{info, warn};

use super::CatalogError;
use crate::models::{Deck, FlashcardSet, NewFlashcardSet};

/// File name of the store inside the data directory.
pub const STORE_FILE: &str = "flashcards.json";

static ID_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Flashcard sets kept in a single JSON array on disk.
///
/// Every operation re-reads the file so edits made by another process are
/// picked up; writes are serialised through a mutex shared by clones.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl LocalCatalog {
    /// Create a catalog stored under `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STORE_FILE),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the backing JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decks with at least one stored set, in [`Deck::ALL`] order.
    pub fn decks(&self) -> Result<Vec<Deck>, CatalogError> {
        let _guard = self.lock.lock();
        let sets = self.read_sets()?;
        Ok(Deck::ALL
            .into_iter()
            .filter(|deck| sets.iter().any(|set| set.deck == *deck))
            .collect())
    }

    /// Sets of `deck` (or all), newest first.
    pub fn fetch_sets(&self, deck: Option<Deck>) -> Result<Vec<FlashcardSet>, CatalogError> {
        let _guard = self.lock.lock();
        let mut sets = self.read_sets()?;
        if let Some(deck) = deck {
            sets.retain(|set| set.deck == deck);
        }
        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sets)
    }

    /// Store a new set and return it with a generated id.
    pub fn create_set(&self, draft: NewFlashcardSet) -> Result<FlashcardSet, CatalogError> {
        draft.validate()?;
        let _guard = self.lock.lock();
        let mut sets = self.read_sets()?;
        let now = Utc::now();
        let set = draft.into_set(Some(generate_id(now.timestamp_micros())), now);
        sets.push(set.clone());
        self.write_sets(&sets)?;
        info!(id = set.id.as_deref().unwrap_or("?"), deck = %set.deck, "Stored flashcard set");
        Ok(set)
    }

    /// Remove the set with `id`.
    pub fn delete_set(&self, id: &str) -> Result<(), CatalogError> {
        let _guard = self.lock.lock();
        let mut sets = self.read_sets()?;
        let before = sets.len();
        sets.retain(|set| set.id.as_deref() != Some(id));
        if sets.len() == before {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        self.write_sets(&sets)?;
        info!(id, "Removed flashcard set");
        Ok(())
    }

    fn read_sets(&self) -> Result<Vec<FlashcardSet>, CatalogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            warn!("Flashcard store {} is empty", self.path.display());
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| CatalogError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn write_sets(&self, sets: &[FlashcardSet]) -> Result<(), CatalogError> {
        let io_err = |source| CatalogError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let serialised = serde_json::to_vec_pretty(sets).map_err(|source| CatalogError::Decode {
            path: self.path.clone(),
            source,
        })?;
        // Staged write; the rename replaces the store in one step.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serialised).map_err(io_err)?;
        fs::rename(&staging, &self.path).map_err(io_err)
    }
}

/// 24 hex digits: 16 from the creation time, 8 from a process-wide counter.
fn generate_id(micros: i64) -> String {
    let sequence = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:016x}{:08x}", micros as u64, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn draft(deck: Deck, image: &str) -> NewFlashcardSet {
        NewFlashcardSet::new(deck, image).with_question("What is shown?", ["A", "B", "C"], 2)
    }

    #[test]
    fn store_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let catalog = LocalCatalog::new(dir.path());
        assert!(catalog.fetch_sets(None)?.is_empty());
        assert!(catalog.decks()?.is_empty());

        let first = catalog.create_set(draft(Deck::Miscellaneous, "first.png"))?;
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = catalog.create_set(draft(Deck::Miscellaneous, "second.png"))?;
        let other = catalog.create_set(draft(Deck::Children, "other.png"))?;
        assert!(catalog.path().exists());

        let ids: Vec<_> = [&first, &second, &other]
            .iter()
            .map(|set| set.id.clone().unwrap_or_default())
            .collect();
        assert!(ids.iter().all(|id| id.len() == 24));
        assert_ne!(ids[0], ids[1]);

        let misc = catalog.fetch_sets(Some(Deck::Miscellaneous))?;
        assert_eq!(misc.len(), 2);
        assert_eq!(misc[0].image_url, "second.png");
        assert_eq!(misc[1].image_url, "first.png");
        assert_eq!(catalog.decks()?, vec![Deck::Children, Deck::Miscellaneous]);

        let reopened = LocalCatalog::new(dir.path());
        assert_eq!(reopened.fetch_sets(None)?.len(), 3);

        reopened.delete_set(&ids[2])?;
        assert_eq!(catalog.decks()?, vec![Deck::Miscellaneous]);
        let err = catalog.delete_set(&ids[2]).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
        Ok(())
    }

    #[test]
    fn rejects_invalid_drafts_without_writing() -> Result<()> {
        let dir = tempdir()?;
        let catalog = LocalCatalog::new(dir.path());
        let bad = NewFlashcardSet::new(Deck::Children, "x.png").with_question("Q", ["only"], 0);
        assert!(matches!(
            catalog.create_set(bad),
            Err(CatalogError::Invalid(_))
        ));
        assert!(!catalog.path().exists());
        Ok(())
    }

    #[test]
    fn corrupt_store_is_decode_error() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(STORE_FILE), "{ not json")?;
        let catalog = LocalCatalog::new(dir.path());
        assert!(matches!(
            catalog.fetch_sets(Some(Deck::Children)),
            Err(CatalogError::Decode { .. })
        ));
        Ok(())
    }
}
