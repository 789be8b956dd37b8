//! 定位 “Stable Releases” 区段。
//!
//! 页面中两个标题各只出现一次：找到起始标题后不再重复匹配，找到结束标题立即停止。

use thiserror::Error;
use tracing::debug;

use super::cursor::ByteCursor;
use super::models::ByteRange;

pub const HEADING_OPEN: &[u8] = b"<h2>";
pub const STABLE_HEADING: &[u8] = b"<h2>Stable Releases</h2>";
pub const PRE_RELEASE_HEADING: &[u8] = b"<h2>Pre-releases</h2>";

#[derive(Debug, Clone, Copy)]
pub struct SectionMarkers<'m> {
    pub start: &'m [u8],
    pub end: &'m [u8],
}

impl Default for SectionMarkers<'static> {
    fn default() -> Self {
        Self {
            start: STABLE_HEADING,
            end: PRE_RELEASE_HEADING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("page layout not recognized: stable releases heading not found")]
    MissingStart,
    #[error("page layout not recognized: pre-releases heading not found")]
    MissingEnd,
    #[error("page layout not recognized: section ends at {end} before it begins at {begin}")]
    Inverted { begin: usize, end: usize },
}

pub fn locate_stable_releases(html: &[u8], size: usize) -> Result<ByteRange, LocateError> {
    locate_section(html, size, SectionMarkers::default())
}

/// 返回两个标题之间的半开区间：起点为起始标题之后的第一个字节，终点为结束标题前一个字节。
pub fn locate_section(
    html: &[u8],
    size: usize,
    markers: SectionMarkers<'_>,
) -> Result<ByteRange, LocateError> {
    let size = size.min(html.len());
    let cursor = ByteCursor::new(&html[..size]);
    let stride = markers.start.len();

    let mut begin: Option<usize> = None;
    let mut end: Option<usize> = None;

    for i in 0..size {
        if cursor.peek(i) != Some(b'<') || !cursor.matches(HEADING_OPEN, i) {
            continue;
        }
        if begin.is_none() && cursor.matches(markers.start, i) {
            begin = Some(i + stride);
            debug!(target: "section", offset = i, "found start heading");
        }
        if cursor.matches(markers.end, i) {
            end = Some(i.saturating_sub(1));
            debug!(target: "section", offset = i, "found end heading");
            break;
        }
    }

    let begin = begin.ok_or(LocateError::MissingStart)?;
    let end = end.ok_or(LocateError::MissingEnd)?;
    if end < begin {
        return Err(LocateError::Inverted { begin, end });
    }
    Ok(ByteRange { begin, end })
}
