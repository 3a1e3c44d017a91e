//! Read-only content loaders: item bank, blueprint, learning objectives.
//! Loaded once at startup and swapped atomically on reload, per spec §5.

use crate::error::StorageError;
use std::path::{Path, PathBuf};
use studyforge_domain::{Blueprint, EvidenceChunk, Item, LearningObjective};
use tokio::fs;

/// Recursively load every `*.item.json` file under `scope_dirs`.
pub async fn load_item_bank(scope_dirs: &[String]) -> Result<Vec<Item>, StorageError> {
    let mut items = Vec::new();
    for dir in scope_dirs {
        collect_items(Path::new(dir), &mut items).await?;
    }
    items.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(items)
}

async fn collect_items(dir: &Path, out: &mut Vec<Item>) -> Result<(), StorageError> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(StorageError::Io {
                path: dir.display().to_string(),
                source,
            })
        }
    };

    let mut subdirs: Vec<PathBuf> = Vec::new();
    let mut files: Vec<PathBuf> = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(|source| StorageError::Io {
        path: dir.display().to_string(),
        source,
    })? {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.to_string_lossy().ends_with(".item.json") {
            files.push(path);
        }
    }

    files.sort();
    for file in files {
        let bytes = fs::read(&file).await.map_err(|source| StorageError::Io {
            path: file.display().to_string(),
            source,
        })?;
        let item: Item = serde_json::from_slice(&bytes).map_err(|source| StorageError::Malformed {
            learner_id: file.display().to_string(),
            source,
        })?;
        out.push(item);
    }

    subdirs.sort();
    for subdir in subdirs {
        Box::pin(collect_items(&subdir, out)).await?;
    }

    Ok(())
}

/// Load the blueprint document at `path`.
pub async fn load_blueprint(path: &str) -> Result<Blueprint, StorageError> {
    let bytes = fs::read(path).await.map_err(|source| StorageError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Malformed {
        learner_id: path.to_string(),
        source,
    })
}

/// Load the learning-objective catalog at `path` (a JSON array).
pub async fn load_learning_objectives(path: &str) -> Result<Vec<LearningObjective>, StorageError> {
    let bytes = fs::read(path).await.map_err(|source| StorageError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Malformed {
        learner_id: path.to_string(),
        source,
    })
}

/// Load the evidence-chunk catalog at `path` (a JSON array), backing
/// `/api/search`. Absent file yields an empty catalog rather than an error,
/// since search is optional ambient functionality.
pub async fn load_evidence_chunks(path: &str) -> Result<Vec<EvidenceChunk>, StorageError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_string(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Malformed {
        learner_id: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn load_item_bank_recurses_into_subdirectories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("unit-1");
        fs::create_dir_all(&nested).await.unwrap();

        let item_json = serde_json::json!({
            "id": "item-1",
            "stem": "stem",
            "choices": {"A": "a", "B": "b", "C": "c", "D": "d", "E": "e"},
            "key": "A",
            "rationale_correct": "because",
            "rationale_distractors": {"B": "no", "C": "no", "D": "no", "E": "no"},
            "los": ["lo1"],
            "difficulty": "easy",
            "bloom": "remember",
            "evidence": {"file": "f.pdf", "page": 1, "citation": "p.1"},
            "status": "published",
            "rubric_score": 3.0,
            "content_hash": "abc"
        });
        fs::write(nested.join("q1.item.json"), item_json.to_string()).await.unwrap();

        let items = load_item_bank(&[dir.path().to_string_lossy().to_string()]).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "item-1");
    }

    #[tokio::test]
    async fn load_item_bank_tolerates_missing_directory() {
        let items = load_item_bank(&["/nonexistent/path/for/sure".to_string()]).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn load_blueprint_parses_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blueprint.json");
        fs::write(&path, r#"{"id":"bp1","weights":{"lo1":0.5}}"#).await.unwrap();
        let bp = load_blueprint(path.to_str().unwrap()).await.unwrap();
        assert_eq!(bp.id, "bp1");
    }
}
