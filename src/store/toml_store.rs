use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::ContentStore;
use crate::error::StoreError;
use crate::models::loaders::{load_all_item_files, load_item_file, load_taxonomy_file, write_item_file};
use crate::models::{EnrichableItem, EnrichmentPatch, TaxonomySnapshot};

/// 基于 TOML 文件的内容存储
///
/// 目录结构：
/// ```text
/// <root>/
///   taxonomy.toml        [[themes]] id / label / description
///   items/<id>.toml      每道题目一个文件
/// ```
pub struct TomlStore {
    root: PathBuf,
    /// 同一进程内串行化"读-改-写"
    write_lock: Mutex<()>,
}

impl TomlStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn items_dir(&self) -> PathBuf {
        self.root.join("items")
    }

    fn taxonomy_path(&self) -> PathBuf {
        self.root.join("taxonomy.toml")
    }

    fn item_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !id.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.items_dir().join(format!("{}.toml", id)))
    }

    /// 写入（新建或覆盖）一道题目
    pub async fn save_item(&self, item: &EnrichableItem) -> Result<(), StoreError> {
        let path = self.item_path(&item.id)?;
        let items_dir = self.items_dir();
        tokio::fs::create_dir_all(&items_dir)
            .await
            .map_err(|source| StoreError::Io {
                path: items_dir,
                source,
            })?;

        let _guard = self.write_lock.lock().await;
        write_item_file(&path, item).await
    }
}

#[async_trait]
impl ContentStore for TomlStore {
    async fn find_pending_items(&self, limit: usize) -> Result<Vec<EnrichableItem>, StoreError> {
        let items = load_all_item_files(&self.items_dir()).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.is_pending())
            .take(limit)
            .collect())
    }

    async fn taxonomy_snapshot(&self) -> Result<TaxonomySnapshot, StoreError> {
        let entries = load_taxonomy_file(&self.taxonomy_path()).await?;
        Ok(TaxonomySnapshot::new(entries))
    }

    async fn update_item(&self, id: &str, patch: &EnrichmentPatch) -> Result<(), StoreError> {
        let path = self.item_path(id)?;
        let _guard = self.write_lock.lock().await;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let mut item = load_item_file(&path).await?;
        item.apply(patch);
        write_item_file(&path, &item).await
    }

    async fn get_item(&self, id: &str) -> Result<Option<EnrichableItem>, StoreError> {
        let path = self.item_path(id)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        load_item_file(&path).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompletedFields, EnrichmentStatus};
    use chrono::Utc;

    async fn store_in(dir: &tempfile::TempDir) -> TomlStore {
        let store = TomlStore::new(dir.path());
        tokio::fs::write(
            dir.path().join("taxonomy.toml"),
            "[[themes]]\nid = \"algebra-1\"\nlabel = \"Équations\"\n\n[[themes]]\nid = \"geo-2\"\nlabel = \"Géométrie\"\ndescription = \"Plane\"\n",
        )
        .await
        .unwrap();
        store
            .save_item(&EnrichableItem::new("ex-1").with_source_url("https://example.org/1.pdf"))
            .await
            .unwrap();
        store
            .save_item(&EnrichableItem::new("ex-2").with_raw_text("Calculer l'aire"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_reads_pending_items_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let items = store.find_pending_items(10).await.unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["ex-1", "ex-2"]);
        assert_eq!(items[1].raw_text.as_deref(), Some("Calculer l'aire"));
    }

    #[tokio::test]
    async fn test_reads_taxonomy() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let snapshot = store.taxonomy_snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains("geo-2"));
        assert_eq!(snapshot.entries()[1].description.as_deref(), Some("Plane"));
    }

    #[tokio::test]
    async fn test_update_persists_patch() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let patch = EnrichmentPatch::Completed(CompletedFields {
            raw_text: Some("Résoudre l'équation".to_string()),
            title: Some("Équation".to_string()),
            summary: Some("Une équation du premier degré".to_string()),
            keywords: vec!["équation".to_string()],
            estimated_duration: Some(10),
            estimated_difficulty: Some(3),
            theme_ids: vec!["algebra-1".to_string()],
            enriched_at: Utc::now(),
        });
        store.update_item("ex-1", &patch).await.unwrap();

        let item = store.get_item("ex-1").await.unwrap().unwrap();
        assert_eq!(item.enrichment_status, EnrichmentStatus::Completed);
        assert_eq!(item.estimated_difficulty, Some(3));
        assert_eq!(item.theme_ids, vec!["algebra-1".to_string()]);
        assert_eq!(store.find_pending_items(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_item_and_bad_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        assert!(matches!(
            store.update_item("ex-404", &EnrichmentPatch::Failed).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.get_item("../secret").await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(store.get_item("ex-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_items_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlStore::new(dir.path().join("nowhere"));
        assert!(store.find_pending_items(10).await.is_err());
        assert!(matches!(
            store.taxonomy_snapshot().await,
            Err(StoreError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_taxonomy_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlStore::new(dir.path());
        store.save_item(&EnrichableItem::new("ex-1")).await.unwrap();

        assert!(matches!(
            store.taxonomy_snapshot().await,
            Err(StoreError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_explicit_empty_taxonomy() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("taxonomy.toml"), "themes = []\n")
            .await
            .unwrap();
        let store = TomlStore::new(dir.path());

        assert!(store.taxonomy_snapshot().await.unwrap().is_empty());
    }
}
