//! Incrementally-invalidated cache of line-start byte offsets.
//!
//! `line_starts[0]` is always `0`. Entry `i` is the byte offset of the first
//! byte of line `i`, meaning an LF at position `p` always introduces an entry
//! `p + 1`. Edits invalidate everything after the edit position; the cache is
//! lazily extended back to full coverage the next time a line query needs it.

#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u64>,
    /// Byte offset up to which `line_starts` is known accurate.
    valid_until_pos: u64,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LineIndex {
    pub fn new() -> Self {
        LineIndex {
            line_starts: vec![0],
            valid_until_pos: 0,
        }
    }

    pub fn is_valid(&self, total_len: u64) -> bool {
        self.valid_until_pos >= total_len
    }

    /// Drops every known line start past `pos` and rewinds the validity
    /// watermark. Called on every insert/delete with the edit's start
    /// position: everything at or after it may now be wrong.
    pub fn invalidate_from(&mut self, pos: u64) {
        if pos < self.valid_until_pos {
            self.line_starts.retain(|&s| s <= pos);
            self.valid_until_pos = pos;
        }
    }

    /// Scans `bytes` (which must be exactly the buffer content starting at
    /// `from`) for LF bytes, appending new line starts and advancing the
    /// validity watermark to `from + bytes.len()`.
    pub fn extend(&mut self, from: u64, bytes: &[u8]) {
        debug_assert!(from == self.valid_until_pos);
        let mut pos = from;
        for &b in bytes {
            pos += 1;
            if b == b'\n' {
                self.line_starts.push(pos);
            }
        }
        self.valid_until_pos = from + bytes.len() as u64;
    }

    /// Byte offset that scanning should resume from to reach full coverage.
    pub fn valid_until_pos(&self) -> u64 {
        self.valid_until_pos
    }

    pub fn line_count(&self) -> u64 {
        self.line_starts.len() as u64
    }

    pub fn line_start(&self, line: u64) -> Option<u64> {
        self.line_starts.get(line as usize).copied()
    }

    /// Finds the line containing `pos` and the byte column within that line.
    /// Requires full coverage (`is_valid(total_len)` for the relevant
    /// `total_len`) — callers must extend first.
    pub fn find_line_by_pos(&self, pos: u64) -> (u64, u64) {
        match self.line_starts.binary_search(&pos) {
            Ok(idx) => (idx as u64, 0),
            Err(idx) => {
                let line = idx - 1;
                (line as u64, pos - self.line_starts[line])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_single_line() {
        let idx = LineIndex::new();
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.line_start(0), Some(0));
    }

    #[test]
    fn extend_finds_newlines() {
        let mut idx = LineIndex::new();
        idx.extend(0, b"ab\ncd\ne");
        assert_eq!(idx.line_count(), 3);
        assert_eq!(idx.line_start(1), Some(3));
        assert_eq!(idx.line_start(2), Some(6));
    }

    #[test]
    fn invalidate_from_trims_future_entries() {
        let mut idx = LineIndex::new();
        idx.extend(0, b"ab\ncd\nef\n");
        assert_eq!(idx.line_count(), 4);
        idx.invalidate_from(4);
        assert_eq!(idx.line_count(), 2); // entries 0 and 3 survive
        assert_eq!(idx.valid_until_pos(), 4);
    }

    #[test]
    fn find_line_by_pos_binary_searches() {
        let mut idx = LineIndex::new();
        idx.extend(0, b"ab\ncd\ne");
        assert_eq!(idx.find_line_by_pos(0), (0, 0));
        assert_eq!(idx.find_line_by_pos(2), (0, 2));
        assert_eq!(idx.find_line_by_pos(3), (1, 0));
        assert_eq!(idx.find_line_by_pos(6), (2, 0));
    }
}
