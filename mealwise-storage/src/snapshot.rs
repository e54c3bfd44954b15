//! Persistent knowledge snapshot: food embeddings plus nutrition facts.
//!
//! Two JSON files live side by side in the embeddings directory. They are
//! always written together; on load, both must be present, decodable, and
//! agree on which foods are known, or the store starts empty.

use crate::cache::{commit_temp, discard_temp, write_failed, write_temp};
use mealwise_core::{
    EmbeddingVector, MealwiseError, MealwiseResult, NutritionFact, Outcome, StorageError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const EMBEDDINGS_FILE: &str = "food_embeddings.json";
pub const FACTS_FILE: &str = "food_database.json";

/// In-memory image of everything the knowledge store persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    pub embeddings: BTreeMap<String, EmbeddingVector>,
    pub facts: BTreeMap<String, Vec<NutritionFact>>,
}

impl KnowledgeSnapshot {
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty() && self.facts.is_empty()
    }
}

/// Location of the two snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotFiles {
    dir: PathBuf,
}

impl SnapshotFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn embeddings_path(&self) -> PathBuf {
        self.dir.join(EMBEDDINGS_FILE)
    }

    pub fn facts_path(&self) -> PathBuf {
        self.dir.join(FACTS_FILE)
    }

    /// Load the snapshot.
    ///
    /// Neither file present is a normal first run and yields an empty
    /// `Complete`. Any other inconsistency (one file missing, unreadable,
    /// undecodable, or an embedding with no facts behind it) yields an empty
    /// `Degraded` carrying the cause.
    pub fn load(&self) -> Outcome<KnowledgeSnapshot> {
        let embeddings_path = self.embeddings_path();
        let facts_path = self.facts_path();

        let embeddings = read_optional::<BTreeMap<String, EmbeddingVector>>(&embeddings_path);
        let facts = read_optional::<BTreeMap<String, Vec<NutritionFact>>>(&facts_path);

        match (embeddings, facts) {
            (Ok(None), Ok(None)) => Outcome::Complete(KnowledgeSnapshot::default()),
            (Ok(Some(embeddings)), Ok(Some(facts))) => {
                if let Some(orphan) = embeddings.keys().find(|name| !facts.contains_key(*name)) {
                    let cause = StorageError::Corrupt {
                        path: embeddings_path,
                        reason: format!("embedding for '{}' has no nutrition facts", orphan),
                    };
                    tracing::warn!(error = %cause, "Knowledge snapshot out of sync, starting empty");
                    return Outcome::empty(cause);
                }
                tracing::info!(
                    foods = facts.len(),
                    embeddings = embeddings.len(),
                    "Loaded knowledge snapshot"
                );
                Outcome::Complete(KnowledgeSnapshot { embeddings, facts })
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Knowledge snapshot unusable, starting empty");
                Outcome::empty(e)
            }
            (Ok(None), Ok(Some(_))) => missing_half(&embeddings_path),
            (Ok(Some(_)), Ok(None)) => missing_half(&facts_path),
        }
    }

    /// Write both files via temporaries, renaming only once both are written.
    ///
    /// Facts are renamed before embeddings, so a failure between the two
    /// renames leaves facts ahead of embeddings, which `load` accepts.
    pub fn save(&self, snapshot: &KnowledgeSnapshot) -> MealwiseResult<()> {
        let embeddings_path = self.embeddings_path();
        let facts_path = self.facts_path();
        std::fs::create_dir_all(&self.dir).map_err(|e| write_failed(&self.dir, e))?;

        let embeddings = serde_json::to_vec(&snapshot.embeddings)
            .map_err(|e| write_failed(&embeddings_path, e))?;
        let facts = serde_json::to_vec_pretty(&snapshot.facts)
            .map_err(|e| write_failed(&facts_path, e))?;

        let embeddings_tmp = write_temp(&embeddings_path, &embeddings)?;
        let facts_tmp = match write_temp(&facts_path, &facts) {
            Ok(tmp) => tmp,
            Err(e) => {
                discard_temp(&embeddings_tmp);
                return Err(e);
            }
        };

        if let Err(e) = commit_temp(&facts_tmp, &facts_path) {
            discard_temp(&embeddings_tmp);
            return Err(e);
        }
        commit_temp(&embeddings_tmp, &embeddings_path)?;

        tracing::debug!(
            dir = %self.dir.display(),
            foods = snapshot.facts.len(),
            "Saved knowledge snapshot"
        );
        Ok(())
    }
}

fn missing_half(path: &Path) -> Outcome<KnowledgeSnapshot> {
    let cause = StorageError::ReadFailed {
        path: path.to_path_buf(),
        reason: "companion snapshot file is missing".to_string(),
    };
    tracing::warn!(error = %cause, "Knowledge snapshot incomplete, starting empty");
    Outcome::empty(cause)
}

fn read_optional<T>(path: &Path) -> Result<Option<T>, MealwiseError>
where
    T: for<'de> Deserialize<'de>,
{
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StorageError::ReadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into())
        }
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        StorageError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KnowledgeSnapshot {
        let mut snapshot = KnowledgeSnapshot::default();
        snapshot.embeddings.insert(
            "kimchi".to_string(),
            EmbeddingVector::new(vec![0.1, 0.2, 0.3], "test"),
        );
        snapshot.facts.insert(
            "kimchi".to_string(),
            vec![NutritionFact::named("kimchi", "pickles")],
        );
        snapshot
    }

    #[test]
    fn test_load_empty_dir_is_complete_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = SnapshotFiles::new(dir.path().join("embeddings"));
        let loaded = files.load();
        assert!(!loaded.is_degraded());
        assert!(loaded.value().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let files = SnapshotFiles::new(dir.path().join("embeddings"));
        let snapshot = sample();

        files.save(&snapshot).unwrap();
        let loaded = files.load();

        assert!(!loaded.is_degraded());
        assert_eq!(loaded.into_value(), snapshot);
    }

    #[test]
    fn test_missing_companion_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = SnapshotFiles::new(dir.path());
        files.save(&sample()).unwrap();
        std::fs::remove_file(files.facts_path()).unwrap();

        let loaded = files.load();
        assert!(loaded.is_degraded());
        assert!(loaded.value().is_empty());
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = SnapshotFiles::new(dir.path());
        files.save(&sample()).unwrap();
        std::fs::write(files.embeddings_path(), b"[[[").unwrap();

        let loaded = files.load();
        assert!(loaded.is_degraded());
        assert!(matches!(
            loaded.cause(),
            Some(MealwiseError::Storage(StorageError::Corrupt { .. }))
        ));
        assert!(loaded.value().is_empty());
    }

    #[test]
    fn test_failed_save_leaves_previous_pair_intact() {
        let dir = tempfile::tempdir().unwrap();
        let files = SnapshotFiles::new(dir.path());
        let original = sample();
        files.save(&original).unwrap();

        // A directory where the facts temporary belongs makes the second write fail.
        std::fs::create_dir(files.facts_path().with_extension("tmp")).unwrap();
        let mut grown = original.clone();
        grown.embeddings.insert(
            "tofu".to_string(),
            EmbeddingVector::new(vec![0.3, 0.2, 0.1], "test"),
        );
        grown
            .facts
            .insert("tofu".to_string(), vec![NutritionFact::named("tofu", "beans")]);

        assert!(files.save(&grown).is_err());
        assert!(!files.embeddings_path().with_extension("tmp").exists());

        let loaded = files.load();
        assert!(!loaded.is_degraded());
        assert_eq!(loaded.into_value(), original);
    }

    #[test]
    fn test_embedding_without_facts_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = SnapshotFiles::new(dir.path());
        let mut snapshot = sample();
        snapshot.embeddings.insert(
            "tofu".to_string(),
            EmbeddingVector::new(vec![0.3, 0.2, 0.1], "test"),
        );
        files.save(&snapshot).unwrap();

        let loaded = files.load();
        assert!(matches!(
            loaded.cause(),
            Some(MealwiseError::Storage(StorageError::Corrupt { .. }))
        ));
        assert!(loaded.value().is_empty());
    }

    #[test]
    fn test_facts_without_embedding_load_complete() {
        let dir = tempfile::tempdir().unwrap();
        let files = SnapshotFiles::new(dir.path());
        let mut snapshot = sample();
        snapshot
            .facts
            .insert("tofu".to_string(), vec![NutritionFact::named("tofu", "beans")]);
        files.save(&snapshot).unwrap();

        let loaded = files.load();
        assert!(!loaded.is_degraded());
        assert_eq!(loaded.value().facts.len(), 2);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = SnapshotFiles::new(dir.path());
        files.save(&sample()).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.ends_with(".json")));
    }
}
