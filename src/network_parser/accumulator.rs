//! 将响应正文按块累积进一个定长缓冲区。
//!
//! 缓冲区一次性预留 `response_capacity` 字节，写指针到达 `capacity - margin` 时停止：
//! 若此时源仍有数据则标记为截断，已读取的前缀照常返回。

use std::io;

use thiserror::Error;
use tracing::{debug, warn};

use super::source::ChunkSource;
use crate::release_parser::models::Limits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 源报告 0 字节可读。
    Complete,
    /// 缓冲区到达上限时源仍有数据。
    Truncated,
    /// 读取中途出错，仅返回已读取的前缀。
    Interrupted,
}

#[derive(Debug)]
pub struct Accumulated {
    pub body: Vec<u8>,
    pub completion: Completion,
}

impl Accumulated {
    pub fn len(&self) -> usize {
        self.body.len()
    }
}

#[derive(Debug, Error)]
pub enum AccumulateError {
    #[error("failed to reserve a {capacity} byte response buffer: {source}")]
    Allocation {
        capacity: usize,
        source: std::collections::TryReserveError,
    },
    #[error("response read failed before any bytes arrived: {0}")]
    Read(#[source] io::Error),
}

/// `on_progress` 在每次追加后收到累计字节数。
///
/// `source` 按值传入，函数返回前（无论成功与否）即被释放。
pub fn accumulate_with_progress<S, F>(
    mut source: S,
    limits: &Limits,
    mut on_progress: F,
) -> Result<Accumulated, AccumulateError>
where
    S: ChunkSource,
    F: FnMut(usize),
{
    let capacity = limits.response_capacity;
    let ceiling = limits.ceiling();

    let mut body: Vec<u8> = Vec::new();
    body.try_reserve_exact(capacity)
        .map_err(|source| AccumulateError::Allocation { capacity, source })?;

    let mut written = 0usize;
    let completion = loop {
        let available = match source.available() {
            Ok(n) => n,
            Err(err) => break on_read_error(err, written)?,
        };
        if available == 0 {
            break Completion::Complete;
        }

        if written >= ceiling {
            warn!(
                target: "fetch",
                written,
                capacity,
                "响应超出缓冲区容量，已截断"
            );
            break Completion::Truncated;
        }

        let want = available.min(ceiling - written);
        body.resize(written + want, 0);
        let got = match source.read_chunk(&mut body[written..written + want]) {
            Ok(n) => n,
            Err(err) => {
                body.truncate(written);
                break on_read_error(err, written)?;
            }
        };
        body.truncate(written + got);
        written += got;
        debug!(target: "fetch", chunk = got, total = written, "chunk appended");
        on_progress(written);

        if got == 0 {
            // 源声称有数据却没有交付任何字节，视为结束，避免空转
            break Completion::Complete;
        }
    };

    drop(source);
    Ok(Accumulated { body, completion })
}

fn on_read_error(err: io::Error, written: usize) -> Result<Completion, AccumulateError> {
    if written == 0 {
        return Err(AccumulateError::Read(err));
    }
    warn!(
        target: "fetch",
        written,
        "读取响应时出错，保留已接收的 {written} 字节: {err}"
    );
    Ok(Completion::Interrupted)
}
