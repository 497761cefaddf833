use crate::error::StoreError;
use crate::models::item::EnrichableItem;
use crate::models::taxonomy::TaxonomyEntry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// `taxonomy.toml` 的文件结构
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaxonomyFile {
    #[serde(default)]
    pub themes: Vec<TaxonomyEntry>,
}

/// 从 TOML 文件加载单道题目
pub async fn load_item_file(toml_file_path: &Path) -> Result<EnrichableItem, StoreError> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|source| StoreError::Io {
            path: toml_file_path.to_path_buf(),
            source,
        })?;

    toml::from_str(&content).map_err(|source| StoreError::Parse {
        path: toml_file_path.to_path_buf(),
        source,
    })
}

/// 从文件夹中加载所有题目文件，按文件名排序
///
/// 解析失败的文件会被跳过并记录警告
pub async fn load_all_item_files(folder: &Path) -> Result<Vec<EnrichableItem>, StoreError> {
    let mut paths = list_toml_files(folder).await?;
    paths.sort();

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        match load_item_file(&path).await {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    tracing::debug!("从 {} 加载了 {} 道题目", folder.display(), items.len());
    Ok(items)
}

/// 加载主题文件
///
/// 文件缺失返回 `StoreError::Io`；空主题表要显式写 `themes = []`
pub async fn load_taxonomy_file(path: &Path) -> Result<Vec<TaxonomyEntry>, StoreError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let file: TaxonomyFile = toml::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(file.themes)
}

/// 把题目写入 TOML 文件
///
/// 先写临时文件再重命名，读者不会看到写了一半的文件
pub async fn write_item_file(path: &Path, item: &EnrichableItem) -> Result<(), StoreError> {
    let content = toml::to_string(item)?;
    let tmp_path = path.with_extension("toml.tmp");

    fs::write(&tmp_path, content)
        .await
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    fs::rename(&tmp_path, path)
        .await
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn list_toml_files(folder: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let io_err = |source| StoreError::Io {
        path: folder.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(folder).await.map_err(io_err)?;
    let mut paths = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            paths.push(path);
        }
    }

    Ok(paths)
}
