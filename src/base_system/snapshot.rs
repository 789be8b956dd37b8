//! 页面快照与目录导出。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::release_parser::models::Catalog;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to serialize catalog: {0}")]
    Json(#[from] serde_json::Error),
}

fn write_creating_parent(path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SnapshotError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// 覆盖写入已接收的页面字节，便于之后用 `--from-file` 离线解析。
pub fn save_page(path: &Path, body: &[u8]) -> Result<(), SnapshotError> {
    write_creating_parent(path, body)?;
    info!("页面已保存到 {}（{} 字节）", path.display(), body.len());
    Ok(())
}

pub fn export_catalog(path: &Path, catalog: &Catalog) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(catalog)?;
    write_creating_parent(path, json.as_bytes())?;
    info!("已导出 {} 条记录到 {}", catalog.len(), path.display());
    Ok(())
}
