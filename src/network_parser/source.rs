//! 响应字节源：HTTP 响应与本地文件都通过 [`ChunkSource`] 交给累积器。
//!
//! 源对象持有底层句柄（连接或文件），被 drop 时释放。

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use thiserror::Error;
use tracing::{debug, info};

/// 每次从底层读入暂存区的字节数。
pub const STAGING_CHUNK: usize = 8 * 1024;

/// “当前可读多少字节” + “读取至多 N 字节”。
pub trait ChunkSource {
    /// 返回 0 表示数据已读完。
    fn available(&mut self) -> io::Result<usize>;
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to init http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("cannot open {path}: {source}")]
    File { path: PathBuf, source: io::Error },
}

/// 将任意 `Read` 适配为 [`ChunkSource`]：先读入暂存区，再按请求大小交付。
pub struct ReadSource<R: Read> {
    inner: R,
    label: String,
    staging: Vec<u8>,
    staged: usize,
    consumed: usize,
    eof: bool,
}

impl<R: Read> ReadSource<R> {
    pub fn new(inner: R, label: impl Into<String>) -> Self {
        Self {
            inner,
            label: label.into(),
            staging: vec![0; STAGING_CHUNK],
            staged: 0,
            consumed: 0,
            eof: false,
        }
    }
}

impl<R: Read> ChunkSource for ReadSource<R> {
    fn available(&mut self) -> io::Result<usize> {
        if self.consumed < self.staged {
            return Ok(self.staged - self.consumed);
        }
        if self.eof {
            return Ok(0);
        }
        let n = loop {
            match self.inner.read(&mut self.staging) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        if n == 0 {
            self.eof = true;
        }
        self.staged = n;
        self.consumed = 0;
        Ok(n)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pending = &self.staging[self.consumed..self.staged];
        let n = pending.len().min(buf.len());
        buf[..n].copy_from_slice(&pending[..n]);
        self.consumed += n;
        Ok(n)
    }
}

impl<R: Read> Drop for ReadSource<R> {
    fn drop(&mut self) {
        debug!(target: "fetch", source = %self.label, "response source released");
    }
}

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub user_agent: String,
    pub request_timeout: Duration,
}

/// python.org 会拒绝没有浏览器 UA 的请求。
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0";

fn build_blocking_client(options: &HttpOptions) -> Result<Client, SourceError> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    default_headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&options.user_agent)
            .unwrap_or(HeaderValue::from_static("Mozilla/5.0")),
    );

    Client::builder()
        .default_headers(default_headers)
        .timeout(options.request_timeout)
        .gzip(true)
        .deflate(true)
        .build()
        .map_err(SourceError::Client)
}

/// 发出 GET 并在收到响应头后返回；正文留给累积器按块拉取。
pub fn open_http(url: &str, options: &HttpOptions) -> Result<ReadSource<Response>, SourceError> {
    let client = build_blocking_client(options)?;
    info!(target: "fetch", "正在请求 {url}");
    let resp = client
        .get(url)
        .send()
        .map_err(|source| SourceError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status,
        });
    }
    debug!(
        target: "fetch",
        status = %status,
        content_length = ?resp.content_length(),
        "response headers received"
    );
    Ok(ReadSource::new(resp, url))
}

pub fn open_file(path: &Path) -> Result<ReadSource<File>, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::File {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReadSource::new(file, path.display().to_string()))
}
