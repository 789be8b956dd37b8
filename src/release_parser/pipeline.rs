//! 拉取 → 定位区段 → 提取记录 的单向流程编排。

use thiserror::Error;
use tracing::{info, warn};

use super::extractor::{ExtractError, RecordExtractor};
use super::models::{ByteRange, Catalog, Limits};
use super::section::{LocateError, locate_stable_releases};
use crate::network_parser::accumulator::{
    AccumulateError, Accumulated, Completion, accumulate_with_progress,
};
use crate::network_parser::source::ChunkSource;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] AccumulateError),
    #[error(transparent)]
    Layout(#[from] LocateError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[derive(Debug)]
pub struct ParsedPage {
    pub range: ByteRange,
    pub catalog: Catalog,
}

/// 对已完整读入的页面执行两阶段扫描；区段未找到时不会调用提取器。
pub fn parse_page(
    body: &[u8],
    limits: &Limits,
    arch_suffix: &[u8],
) -> Result<ParsedPage, PipelineError> {
    let range = locate_stable_releases(body, body.len())?;
    info!(
        target: "section",
        begin = range.begin,
        end = range.end,
        len = range.len(),
        "已定位 Stable Releases 区段"
    );

    let section = range.slice(body);
    let catalog = RecordExtractor::new(*limits, arch_suffix).extract(section, section.len())?;
    Ok(ParsedPage { range, catalog })
}

/// 累积响应正文并记录完成状态；截断或中断时仍返回已读取的前缀。
///
/// 与 [`parse_page`] 分开调用，便于调用方在解析前先保存页面。
pub fn fetch<S, F>(source: S, limits: &Limits, on_progress: F) -> Result<Accumulated, PipelineError>
where
    S: ChunkSource,
    F: FnMut(usize),
{
    let page = accumulate_with_progress(source, limits, on_progress)?;
    match page.completion {
        Completion::Complete => info!(target: "fetch", "已接收 {} 字节", page.len()),
        Completion::Truncated => warn!(
            target: "fetch",
            "响应被截断，仅解析前 {} 字节，结果可能不完整",
            page.len()
        ),
        Completion::Interrupted => warn!(
            target: "fetch",
            "响应读取中断，仅解析前 {} 字节，结果可能不完整",
            page.len()
        ),
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network_parser::source::ReadSource;
    use crate::release_parser::extractor::DEFAULT_ARCH_SUFFIX;
    use std::io::Cursor;

    fn sample_page() -> String {
        let mut page = String::from("<html><body><h2>Python Releases for Windows</h2>\n");
        page.push_str("<h2>Stable Releases</h2>\n<ul>\n");
        for v in ["3.12.1", "3.11.7", "3.10.11"] {
            page.push_str(&format!(
                "<li><a href=\"https://www.python.org/downloads/release/python-{}/\">Python {v}</a>\n",
                v.replace('.', "")
            ));
            for suffix in ["-amd64.exe", "-arm64.exe", ".exe", "-embed-amd64.zip"] {
                page.push_str(&format!(
                    "<li><a href=\"https://www.python.org/ftp/python/{v}/python-{v}{suffix}\">installer</a></li>\n"
                ));
            }
        }
        page.push_str(&" ".repeat(200));
        page.push_str("</ul>\n<h2>Pre-releases</h2>\n<ul>\n");
        page.push_str(
            "<li><a href=\"https://www.python.org/ftp/python/3.13.0/python-3.13.0a2-amd64.exe\">x</a></li>\n",
        );
        page.push_str("</ul></body></html>\n");
        page
    }

    #[test]
    fn sample_page_lists_stable_amd64_installers_only() {
        let page = sample_page();
        let parsed = parse_page(page.as_bytes(), &Limits::default(), DEFAULT_ARCH_SUFFIX).unwrap();
        let versions: Vec<_> = parsed.catalog.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, ["3.12.1", "3.11.7", "3.10.11"]);
        assert!(parsed.range.begin > 0);
    }

    #[test]
    fn missing_heading_stops_before_extraction() {
        let page = sample_page().replace("<h2>Stable Releases</h2>", "<h2>Stable</h2>");
        let err = parse_page(page.as_bytes(), &Limits::default(), DEFAULT_ARCH_SUFFIX).unwrap_err();
        assert!(matches!(err, PipelineError::Layout(LocateError::MissingStart)));
    }

    #[test]
    fn run_over_stream_matches_direct_parse() {
        let page = sample_page();
        let source = ReadSource::new(Cursor::new(page.clone().into_bytes()), "mem");
        let fetched = fetch(source, &Limits::default(), |_| {}).unwrap();
        assert_eq!(fetched.completion, Completion::Complete);
        assert_eq!(fetched.body, page.as_bytes());

        let streamed = parse_page(&fetched.body, &Limits::default(), DEFAULT_ARCH_SUFFIX).unwrap();
        let direct = parse_page(page.as_bytes(), &Limits::default(), DEFAULT_ARCH_SUFFIX).unwrap();
        assert_eq!(streamed.range, direct.range);
        assert_eq!(streamed.catalog, direct.catalog);
    }

    #[test]
    fn truncated_stream_is_still_parsed() {
        let mut page = sample_page();
        page.push_str(&"<!-- filler -->".repeat(1000));
        let limits = Limits {
            response_capacity: page.len() - 500,
            ..Limits::default()
        };
        let source = ReadSource::new(Cursor::new(page.clone().into_bytes()), "mem");
        let fetched = fetch(source, &limits, |_| {}).unwrap();
        assert_eq!(fetched.completion, Completion::Truncated);
        assert!(fetched.len() < page.len());
        let parsed = parse_page(&fetched.body, &limits, DEFAULT_ARCH_SUFFIX).unwrap();
        assert_eq!(parsed.catalog.len(), 3);
    }

    #[test]
    fn truncation_before_end_heading_is_a_layout_error() {
        let page = sample_page();
        let cut = page.find("<h2>Pre-releases</h2>").unwrap();
        let limits = Limits {
            response_capacity: cut,
            truncation_margin: 0,
            ..Limits::default()
        };
        let source = ReadSource::new(Cursor::new(page.into_bytes()), "mem");
        let fetched = fetch(source, &limits, |_| {}).unwrap();
        let err = parse_page(&fetched.body, &limits, DEFAULT_ARCH_SUFFIX).unwrap_err();
        assert!(matches!(err, PipelineError::Layout(LocateError::MissingEnd)));
    }

    #[test]
    fn catalog_reservation_failure_surfaces_as_extract_error() {
        let limits = Limits {
            max_records: usize::MAX,
            ..Limits::default()
        };
        let err = parse_page(sample_page().as_bytes(), &limits, DEFAULT_ARCH_SUFFIX).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Extract(ExtractError::Allocation { .. })
        ));
    }
}
