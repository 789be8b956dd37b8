//! 带边界检查的字节游标。
//!
//! 所有偏移运算都经过这里，越界访问一律返回 `None`/`false`，不会 panic。

#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn peek(&self, at: usize) -> Option<u8> {
        self.bytes.get(at).copied()
    }

    /// `literal` 是否完整出现在 `at` 处。
    pub fn matches(&self, literal: &[u8], at: usize) -> bool {
        at.checked_add(literal.len())
            .and_then(|end| self.bytes.get(at..end))
            .is_some_and(|window| window == literal)
    }

    /// Position of `byte` within `[from, from + window)`.
    pub fn find_byte_within(&self, byte: u8, from: usize, window: usize) -> Option<usize> {
        let end = from.saturating_add(window).min(self.bytes.len());
        self.bytes
            .get(from..end)?
            .iter()
            .position(|&b| b == byte)
            .map(|p| from + p)
    }

    /// Position of the first match of `literal` that starts within `[from, from + window)`.
    /// The literal itself may extend past the window.
    pub fn find_within(&self, literal: &[u8], from: usize, window: usize) -> Option<usize> {
        let last = from.saturating_add(window);
        (from..last).find(|&at| self.matches(literal, at))
    }

    pub fn span(&self, begin: usize, end: usize) -> Option<&'a [u8]> {
        self.bytes.get(begin..end)
    }
}
