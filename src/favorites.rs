use async_trait::async_trait;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::MovieCard;
use crate::movies::batch_join;
use crate::tmdb::MovieProvider;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Favorites store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Favorites store encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The user's favorite movie ids, kept in insertion order without duplicates.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn get(&self) -> Result<Vec<u64>, StoreError>;
    /// Adds or removes `id`; returns whether it is a favorite afterwards.
    async fn toggle(&self, id: u64) -> Result<bool, StoreError>;
}

fn toggle_in(ids: &mut Vec<u64>, id: u64) -> bool {
    if let Some(pos) = ids.iter().position(|x| *x == id) {
        ids.remove(pos);
        false
    } else {
        ids.push(id);
        true
    }
}

#[derive(Debug, Default)]
pub struct MemoryFavorites {
    ids: Mutex<Vec<u64>>,
}

impl MemoryFavorites {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        let mut unique = Vec::new();
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self {
            ids: Mutex::new(unique),
        }
    }
}

#[async_trait]
impl FavoritesStore for MemoryFavorites {
    async fn get(&self) -> Result<Vec<u64>, StoreError> {
        Ok(self.ids.lock().await.clone())
    }

    async fn toggle(&self, id: u64) -> Result<bool, StoreError> {
        Ok(toggle_in(&mut *self.ids.lock().await, id))
    }
}

/// Favorites persisted as a single JSON array, read and written whole.
#[derive(Debug)]
pub struct FileFavorites {
    path: PathBuf,
    // Serializes read-modify-write within this process; other writers still race (last write wins).
    lock: Mutex<()>,
}

impl FileFavorites {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_ids(&self) -> Result<Vec<u64>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(parse_favorite_ids(&raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_ids(&self, ids: &[u64]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(ids)?;
        tokio::fs::write(&self.path, raw).await?;
        debug!(path = %self.path.display(), count = ids.len(), "Wrote favorites");
        Ok(())
    }
}

#[async_trait]
impl FavoritesStore for FileFavorites {
    async fn get(&self) -> Result<Vec<u64>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_ids().await
    }

    async fn toggle(&self, id: u64) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut ids = self.read_ids().await?;
        let now_favorite = toggle_in(&mut ids, id);
        self.write_ids(&ids).await?;
        info!(
            "{} movie {} {} favorites",
            if now_favorite { "Added" } else { "Removed" },
            id,
            if now_favorite { "to" } else { "from" }
        );
        Ok(now_favorite)
    }
}

/// Parses stored favorites leniently.
///
/// Accepts a JSON array of numbers or numeric strings; anything else is stripped of
/// brackets and whitespace and split on commas. Unparseable pieces are skipped.
pub fn parse_favorite_ids(raw: &str) -> Vec<u64> {
    let candidates: Vec<String> = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(values) => values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Err(_) => raw
            .chars()
            .filter(|c| !matches!(c, '[' | ']') && !c.is_whitespace())
            .collect::<String>()
            .split(',')
            .map(str::to_string)
            .collect(),
    };

    let mut ids = Vec::new();
    for candidate in candidates {
        if let Ok(id) = candidate.trim().parse::<u64>() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoritesView {
    pub items: Vec<MovieCard>,
    pub dropped: Vec<u64>,
}

/// Favorites page rows; ids whose detail cannot be fetched are left out and listed in `dropped`.
pub async fn favorite_cards(
    provider: &dyn MovieProvider,
    store: &dyn FavoritesStore,
    limit: usize,
) -> Result<FavoritesView, StoreError> {
    let ids = store.get().await?;
    if ids.is_empty() {
        return Ok(FavoritesView {
            items: Vec::new(),
            dropped: Vec::new(),
        });
    }
    let outcome = batch_join(provider, &ids, limit).await;
    let items = outcome
        .items
        .into_iter()
        .map(|m| MovieCard::from_summary(&m.detail.summary, m.trailer_key))
        .collect();
    Ok(FavoritesView {
        items,
        dropped: outcome.dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "reelview-{tag}-{}-{nanos}.json",
            std::process::id()
        ))
    }

    #[test]
    fn parses_json_arrays_including_numeric_strings() {
        assert_eq!(parse_favorite_ids("[3, \"5\", 3, 7]"), vec![3, 5, 7]);
        assert_eq!(parse_favorite_ids("[]"), Vec::<u64>::new());
    }

    #[test]
    fn falls_back_to_comma_splitting() {
        assert_eq!(parse_favorite_ids("[1, 2,x,3"), vec![1, 2, 3]);
        assert_eq!(parse_favorite_ids("  "), Vec::<u64>::new());
    }

    #[test]
    fn skips_non_integer_json_entries() {
        assert_eq!(parse_favorite_ids("[1.5, null, -2, 4]"), vec![4]);
    }

    #[tokio::test]
    async fn memory_toggle_twice_restores_membership() {
        let store = MemoryFavorites::new([1, 1, 2]);
        assert_eq!(store.get().await.unwrap(), vec![1, 2]);
        assert!(store.toggle(9).await.unwrap());
        assert!(!store.toggle(9).await.unwrap());
        assert_eq!(store.get().await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn file_store_starts_empty_and_survives_reopen() {
        let path = temp_path("reopen");
        let store = FileFavorites::new(&path);
        assert!(store.get().await.unwrap().is_empty());
        assert!(store.toggle(42).await.unwrap());
        assert!(store.toggle(7).await.unwrap());
        assert!(!store.toggle(42).await.unwrap());

        let reopened = FileFavorites::new(&path);
        assert_eq!(reopened.get().await.unwrap(), vec![7]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn file_store_reads_legacy_comma_content() {
        let path = temp_path("legacy");
        std::fs::write(&path, "[10, 20,oops]").unwrap();
        let store = FileFavorites::new(&path);
        assert_eq!(store.get().await.unwrap(), vec![10, 20]);
        assert!(store.toggle(30).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[10,20,30]");
        let _ = std::fs::remove_file(&path);
    }
}
