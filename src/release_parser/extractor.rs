//! 从 Stable Releases 区段中提取安装包下载记录。
//!
//! 目标锚点形如：
//! `<a href="https://www.python.org/ftp/python/3.10.11/python-3.10.11-amd64.exe">`
//!
//! arm64、32 位、embeddable zip 等链接前缀完全相同，只在文件名末尾不同，
//! 因此必须检查架构后缀后才能确认是否为目标记录。

use thiserror::Error;
use tracing::{debug, warn};

use super::cursor::ByteCursor;
use super::models::{Catalog, Limits, ReleaseRecord};

pub const ANCHOR_PREFIX: &[u8] = b"<a href=\"https://www.python.org/ftp/python/";
/// `<a href="` 的长度，URL 从这里开始。
pub const HREF_OPEN_LEN: usize = 9;
/// 版本目录之后、文件名中版本号之前的固定片段。
pub const FILE_STEM: &[u8] = b"/python-";
pub const DEFAULT_ARCH_SUFFIX: &[u8] = b"amd64.exe";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to reserve catalog storage for {capacity} records: {source}")]
    Allocation {
        capacity: usize,
        source: std::collections::TryReserveError,
    },
}

/// 单个锚点的扫描状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ScanningForAnchor,
    MatchingPrefix,
    LocatingVersionEnd { version_begin: usize },
    LocatingArchSuffix { version_begin: usize, version_end: usize },
    EmitRecord { version_begin: usize, version_end: usize, url_end: usize },
}

pub struct RecordExtractor<'s> {
    limits: Limits,
    arch_suffix: &'s [u8],
}

impl Default for RecordExtractor<'static> {
    fn default() -> Self {
        Self::new(Limits::default(), DEFAULT_ARCH_SUFFIX)
    }
}

impl<'s> RecordExtractor<'s> {
    pub fn new(limits: Limits, arch_suffix: &'s [u8]) -> Self {
        Self {
            limits,
            arch_suffix,
        }
    }

    /// 外层扫描的上界（不含）。区间短于安全边距时为 0。
    pub fn scan_limit(&self, size: usize) -> usize {
        size.saturating_sub(self.limits.scan_margin)
    }

    /// 扫描 `html[..size]` 并返回目录。没有匹配记录时返回空目录，而不是错误。
    pub fn extract(&self, html: &[u8], size: usize) -> Result<Catalog, ExtractError> {
        let capacity = self.limits.max_records;
        let mut catalog = Catalog::try_with_capacity(capacity)
            .map_err(|source| ExtractError::Allocation { capacity, source })?;

        let size = size.min(html.len());
        let cursor = ByteCursor::new(&html[..size]);
        let limit = self.scan_limit(size);

        let mut i = 0;
        let mut skipped = 0usize;
        while i < limit {
            match self.match_anchor(&cursor, i) {
                Some(ScanState::EmitRecord {
                    version_begin,
                    version_end,
                    url_end,
                }) => {
                    let url_begin = i + HREF_OPEN_LEN;
                    let (Some(version), Some(url)) = (
                        cursor.span(version_begin, version_end),
                        cursor.span(url_begin, url_end),
                    ) else {
                        i += 1;
                        continue;
                    };
                    if version.len() > self.limits.max_version_len
                        || url.len() > self.limits.max_url_len
                    {
                        warn!(
                            target: "extract",
                            offset = i,
                            "record field exceeds its capacity and was truncated"
                        );
                    }
                    let record = ReleaseRecord::from_spans(version, url, &self.limits);
                    debug!(target: "extract", version = %record.version, "release record");
                    if catalog.push(record).is_err() {
                        warn!(
                            target: "extract",
                            capacity,
                            "目录已满，剩余的发布记录被忽略"
                        );
                        break;
                    }
                    i = url_end;
                }
                Some(_) => {
                    skipped += 1;
                    i += 1;
                }
                None => i += 1,
            }
        }

        debug!(
            target: "extract",
            records = catalog.len(),
            skipped,
            "extraction finished"
        );
        Ok(catalog)
    }

    /// 在 `i` 处驱动单个锚点的状态机。
    ///
    /// 返回 `None` 表示此处根本没有锚点；`Some(EmitRecord)` 表示接受；
    /// 其它 `Some` 为匹配中途失败时所处的状态（软跳过）。
    fn match_anchor(&self, cursor: &ByteCursor<'_>, i: usize) -> Option<ScanState> {
        let prefix_len = ANCHOR_PREFIX.len();
        let mut state = ScanState::ScanningForAnchor;
        loop {
            state = match state {
                ScanState::ScanningForAnchor => {
                    if cursor.peek(i) == Some(b'<') && cursor.peek(i + 1) == Some(b'a') {
                        ScanState::MatchingPrefix
                    } else {
                        return None;
                    }
                }
                ScanState::MatchingPrefix => {
                    if !cursor.matches(ANCHOR_PREFIX, i) {
                        return Some(state);
                    }
                    ScanState::LocatingVersionEnd {
                        version_begin: i + prefix_len,
                    }
                }
                ScanState::LocatingVersionEnd { version_begin } => {
                    let Some(version_end) = cursor.find_byte_within(
                        b'/',
                        version_begin,
                        self.limits.version_lookahead,
                    ) else {
                        return Some(state);
                    };
                    let version = cursor.span(version_begin, version_end)?;
                    if !is_dotted_numeric(version) {
                        return Some(state);
                    }
                    ScanState::LocatingArchSuffix {
                        version_begin,
                        version_end,
                    }
                }
                ScanState::LocatingArchSuffix {
                    version_begin,
                    version_end,
                } => {
                    let version_len = version_end - version_begin;
                    // .../3.10.11/python-3.10.11-amd64.exe：窗口从文件名中版本号之后开始
                    let window_start = i + prefix_len + version_len + FILE_STEM.len() + version_len;
                    let Some(at) = cursor.find_within(
                        self.arch_suffix,
                        window_start,
                        self.limits.suffix_lookahead,
                    ) else {
                        return Some(state);
                    };
                    let url_end = at + self.arch_suffix.len();
                    let url = cursor.span(i + HREF_OPEN_LEN, url_end)?;
                    if !url.iter().all(|b| b.is_ascii_graphic() && *b != b'"') {
                        return Some(state);
                    }
                    return Some(ScanState::EmitRecord {
                        version_begin,
                        version_end,
                        url_end,
                    });
                }
                ScanState::EmitRecord { .. } => return Some(state),
            };
        }
    }
}

fn is_dotted_numeric(span: &[u8]) -> bool {
    span.first().is_some_and(u8::is_ascii_digit)
        && span.iter().all(|b| b.is_ascii_digit() || *b == b'.')
}
