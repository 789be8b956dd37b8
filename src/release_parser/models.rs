//! 解析相关的数据模型定义。
//!
//! 包含扫描限额（Limits）、字节区间、发布记录与定长目录（Catalog）。

use serde::Serialize;

/// 响应缓冲区容量：2 MiB。
pub const RESPONSE_CAPACITY: usize = 2 * 1024 * 1024;
/// 写指针距离缓冲区末尾的保留字节数，到达后视为截断。
pub const TRUNCATION_MARGIN: usize = 128;
pub const MAX_RECORDS: usize = 100;
pub const MAX_VERSION_LEN: usize = 40;
pub const MAX_URL_LEN: usize = 150;
/// 外层锚点扫描必须在区间末尾前停止的字节数。
pub const SCAN_MARGIN: usize = 100;
pub const VERSION_LOOKAHEAD: usize = 15;
pub const SUFFIX_LOOKAHEAD: usize = 20;

/// 所有可调的扫描/缓冲限额。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub response_capacity: usize,
    pub truncation_margin: usize,
    pub max_records: usize,
    pub max_version_len: usize,
    pub max_url_len: usize,
    pub scan_margin: usize,
    pub version_lookahead: usize,
    pub suffix_lookahead: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            response_capacity: RESPONSE_CAPACITY,
            truncation_margin: TRUNCATION_MARGIN,
            max_records: MAX_RECORDS,
            max_version_len: MAX_VERSION_LEN,
            max_url_len: MAX_URL_LEN,
            scan_margin: SCAN_MARGIN,
            version_lookahead: VERSION_LOOKAHEAD,
            suffix_lookahead: SUFFIX_LOOKAHEAD,
        }
    }
}

impl Limits {
    /// 写指针允许到达的上限（不含）。
    pub fn ceiling(&self) -> usize {
        self.response_capacity.saturating_sub(self.truncation_margin)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.response_capacity == 0 {
            return Err("response_capacity must be greater than 0".to_string());
        }
        if self.truncation_margin >= self.response_capacity {
            return Err(format!(
                "truncation_margin ({}) must be smaller than response_capacity ({})",
                self.truncation_margin, self.response_capacity
            ));
        }
        if self.max_records == 0 {
            return Err("max_records must be greater than 0".to_string());
        }
        if self.max_version_len == 0 || self.max_url_len == 0 {
            return Err("record field lengths must be greater than 0".to_string());
        }
        if self.version_lookahead == 0 || self.suffix_lookahead == 0 {
            return Err("look-ahead windows must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// 半开区间 `[begin, end)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub begin: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    /// Returns the covered bytes, clamped to the slice length.
    pub fn slice<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        let end = self.end.min(bytes.len());
        let begin = self.begin.min(end);
        &bytes[begin..end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRecord {
    pub version: String,
    pub download_url: String,
}

impl ReleaseRecord {
    /// 按字段容量截断复制；调用方保证两段均为 ASCII。
    pub fn from_spans(version: &[u8], url: &[u8], limits: &Limits) -> Self {
        Self {
            version: bounded_ascii(version, limits.max_version_len),
            download_url: bounded_ascii(url, limits.max_url_len),
        }
    }
}

fn bounded_ascii(span: &[u8], cap: usize) -> String {
    let take = span.len().min(cap);
    span[..take].iter().map(|&b| b as char).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("catalog is full ({capacity} records)")]
pub struct CatalogFull {
    pub capacity: usize,
}

/// 预分配、只追加的发布记录集合。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    records: Vec<ReleaseRecord>,
    #[serde(skip)]
    capacity: usize,
}

impl Catalog {
    /// Reserves storage for exactly `capacity` records up front.
    pub fn try_with_capacity(
        capacity: usize,
    ) -> Result<Self, std::collections::TryReserveError> {
        let mut records = Vec::new();
        records.try_reserve_exact(capacity)?;
        Ok(Self { records, capacity })
    }

    pub fn push(&mut self, record: ReleaseRecord) -> Result<(), CatalogFull> {
        if self.is_full() {
            return Err(CatalogFull {
                capacity: self.capacity,
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReleaseRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ReleaseRecord;
    type IntoIter = std::slice::Iter<'a, ReleaseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
