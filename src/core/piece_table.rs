//! The piece-table text buffer: an immutable original container, an
//! append-only add buffer, and an ordered sequence of pieces pointing into
//! one or the other. Edits never mutate existing bytes, only the piece
//! sequence — which is what makes undo/redo a matter of swapping piece
//! vectors rather than replaying byte patches.

use crate::core::line_index::LineIndex;
use crate::encoding::{Encoding, LineEnding};
use crate::error::{CoreError, CoreResult};

/// Which of the two byte containers a piece's bytes live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Original,
    Add,
}

/// A contiguous run of bytes in one of the buffer's two containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub source: Source,
    pub start: u64,
    pub length: u64,
}

/// The buffer's immutable original content, loaded either by `mmap` (the
/// file was already UTF-8+LF, so the mapped bytes serve directly) or into an
/// owned `Vec<u8>` (the file needed decoding or line-ending conversion).
pub enum OriginalData {
    Owned(Vec<u8>),
    Mapped(memmap2::Mmap),
}

impl std::ops::Deref for OriginalData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            OriginalData::Owned(v) => v,
            OriginalData::Mapped(m) => m,
        }
    }
}

impl std::fmt::Debug for OriginalData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OriginalData({} bytes)", self.len())
    }
}

/// The piece-table text buffer.
#[derive(Debug)]
pub struct Buffer {
    original: OriginalData,
    add_buffer: Vec<u8>,
    pieces: Vec<Piece>,
    total_len: u64,
    line_index: LineIndex,
    pub detected_encoding: Encoding,
    pub detected_line_ending: LineEnding,
}

impl Buffer {
    pub fn empty() -> Self {
        Buffer::from_original(OriginalData::Owned(Vec::new()), Encoding::Utf8, LineEnding::Lf)
    }

    pub fn from_original(
        original: OriginalData,
        detected_encoding: Encoding,
        detected_line_ending: LineEnding,
    ) -> Self {
        let total_len = original.len() as u64;
        let pieces = if total_len == 0 {
            Vec::new()
        } else {
            vec![Piece {
                source: Source::Original,
                start: 0,
                length: total_len,
            }]
        };
        Buffer {
            original,
            add_buffer: Vec::new(),
            pieces,
            total_len,
            line_index: LineIndex::new(),
            detected_encoding,
            detected_line_ending,
        }
    }

    pub fn len(&self) -> u64 {
        self.total_len
    }

    pub fn is_empty(&self) -> bool {
        self.total_len == 0
    }

    fn piece_bytes(&self, p: &Piece) -> &[u8] {
        let (container, start, length): (&[u8], u64, u64) = match p.source {
            Source::Original => (&self.original, p.start, p.length),
            Source::Add => (&self.add_buffer, p.start, p.length),
        };
        &container[start as usize..(start + length) as usize]
    }

    /// Finds the piece containing byte offset `pos`, returning its index
    /// and the offset within that piece. `pos == total_len` is valid and
    /// returns `(pieces.len(), 0)` — the one-past-the-end position used by
    /// append-at-end inserts.
    pub(crate) fn locate(&self, pos: u64) -> (usize, u64) {
        let mut acc = 0u64;
        for (i, p) in self.pieces.iter().enumerate() {
            if pos < acc + p.length {
                return (i, pos - acc);
            }
            acc += p.length;
        }
        (self.pieces.len(), 0)
    }

    /// Finds the piece containing the last byte of an exclusive range ending
    /// at `end` (`end` must be `>= 1`), returning its index and the number of
    /// leading bytes of that piece included in the range (in `(0, length]`).
    fn locate_end_exclusive(&self, end: u64) -> (usize, u64) {
        debug_assert!(end >= 1);
        let mut acc = 0u64;
        for (i, p) in self.pieces.iter().enumerate() {
            if end <= acc + p.length {
                return (i, end - acc);
            }
            acc += p.length;
        }
        unreachable!("end exceeds total_len")
    }

    /// Inserts `text` at byte offset `pos`. `text` is appended to the add
    /// buffer and the piece sequence is split around `pos` to reference it.
    pub fn insert(&mut self, pos: u64, text: &[u8]) -> CoreResult<()> {
        if pos > self.total_len {
            return Err(CoreError::PositionOutOfBounds {
                pos,
                len: self.total_len,
            });
        }
        if text.is_empty() {
            return Ok(());
        }

        let add_start = self.add_buffer.len() as u64;
        self.add_buffer.extend_from_slice(text);
        let new_piece = Piece {
            source: Source::Add,
            start: add_start,
            length: text.len() as u64,
        };

        let (idx, offset) = self.locate(pos);
        if offset == 0 {
            self.pieces.insert(idx, new_piece);
        } else {
            let p = self.pieces[idx];
            let left = Piece {
                source: p.source,
                start: p.start,
                length: offset,
            };
            let right = Piece {
                source: p.source,
                start: p.start + offset,
                length: p.length - offset,
            };
            self.pieces.splice(idx..=idx, [left, new_piece, right]);
        }

        self.total_len += text.len() as u64;
        self.line_index.invalidate_from(pos);
        Ok(())
    }

    /// Deletes up to `length` bytes starting at `pos`. `length` is clamped to
    /// `total_len - pos`, so a range running past the end of the buffer is
    /// silently truncated rather than rejected; only `pos` itself out of
    /// range is an error. A no-op if the clamped length is zero.
    pub fn delete(&mut self, pos: u64, length: u64) -> CoreResult<()> {
        if pos > self.total_len {
            return Err(CoreError::OutOfRange {
                start: pos,
                length,
                len: self.total_len,
            });
        }
        let length = length.min(self.total_len - pos);
        if length == 0 {
            return Ok(());
        }
        let end = pos + length;

        let (start_idx, start_off) = self.locate(pos);
        let (end_idx, end_off) = self.locate_end_exclusive(end);

        let mut replacement = Vec::with_capacity(2);
        if start_idx == end_idx {
            let p = self.pieces[start_idx];
            if start_off > 0 {
                replacement.push(Piece {
                    source: p.source,
                    start: p.start,
                    length: start_off,
                });
            }
            if end_off < p.length {
                replacement.push(Piece {
                    source: p.source,
                    start: p.start + end_off,
                    length: p.length - end_off,
                });
            }
        } else {
            let first = self.pieces[start_idx];
            if start_off > 0 {
                replacement.push(Piece {
                    source: first.source,
                    start: first.start,
                    length: start_off,
                });
            }
            let last = self.pieces[end_idx];
            if end_off < last.length {
                replacement.push(Piece {
                    source: last.source,
                    start: last.start + end_off,
                    length: last.length - end_off,
                });
            }
        }
        self.pieces.splice(start_idx..=end_idx, replacement);

        self.total_len -= length;
        self.line_index.invalidate_from(pos);
        Ok(())
    }

    /// Reads `length` bytes starting at `pos` into an owned `Vec<u8>`.
    pub fn get_range(&self, start: u64, length: u64) -> CoreResult<Vec<u8>> {
        let end = start
            .checked_add(length)
            .ok_or(CoreError::OutOfRange {
                start,
                length,
                len: self.total_len,
            })?;
        if end > self.total_len {
            return Err(CoreError::OutOfRange {
                start,
                length,
                len: self.total_len,
            });
        }
        if length == 0 {
            return Ok(Vec::new());
        }

        let (start_idx, start_off) = self.locate(start);
        let mut out = Vec::with_capacity(length as usize);
        let mut remaining = length;
        let mut offset = start_off;
        for p in &self.pieces[start_idx..] {
            if remaining == 0 {
                break;
            }
            let data = self.piece_bytes(p);
            let avail = data.len() as u64 - offset;
            let take = avail.min(remaining);
            out.extend_from_slice(&data[offset as usize..(offset + take) as usize]);
            remaining -= take;
            offset = 0;
        }
        Ok(out)
    }

    pub(crate) fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub(crate) fn piece_length(&self, idx: usize) -> u64 {
        self.pieces[idx].length
    }

    pub(crate) fn piece_byte(&self, idx: usize, offset: u64) -> u8 {
        self.piece_bytes(&self.pieces[idx])[offset as usize]
    }

    pub(crate) fn byte_at(&self, pos: u64) -> Option<u8> {
        if pos >= self.total_len {
            return None;
        }
        let (idx, off) = self.locate(pos);
        Some(self.piece_byte(idx, off))
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.get_range(0, self.total_len)
            .expect("[0, total_len) is always in range")
    }

    /// A zero-copy preview of the first `max_len` bytes, for callers (e.g.
    /// language detection) that only want a peek and don't want to pay for
    /// a materializing copy. Only available when the whole prefix lives in
    /// the buffer's first piece; `None` if it would have to cross a piece
    /// boundary, in which case the caller can fall back to `get_range`.
    pub fn get_content_preview(&self, max_len: u64) -> Option<&[u8]> {
        let first = self.pieces.first()?;
        if max_len > first.length {
            return None;
        }
        Some(&self.piece_bytes(first)[..max_len as usize])
    }

    /// Snapshots the piece sequence for later restoration (undo/redo and
    /// transactional rollback on a failed multi-step edit).
    pub fn clone_pieces(&self) -> Vec<Piece> {
        self.pieces.clone()
    }

    pub fn restore_pieces(&mut self, pieces: Vec<Piece>, total_len: u64) {
        self.pieces = pieces;
        self.total_len = total_len;
        self.line_index.invalidate_from(0);
    }

    fn ensure_line_index(&mut self) {
        if self.line_index.is_valid(self.total_len) {
            return;
        }
        let from = self.line_index.valid_until_pos();
        let bytes = self
            .get_range(from, self.total_len - from)
            .expect("[from, total_len) is always in range");
        self.line_index.extend(from, &bytes);
    }

    pub fn line_count(&mut self) -> u64 {
        self.ensure_line_index();
        self.line_index.line_count()
    }

    pub fn line_start(&mut self, line: u64) -> Option<u64> {
        self.ensure_line_index();
        self.line_index.line_start(line)
    }

    pub fn find_line_by_pos(&mut self, pos: u64) -> (u64, u64) {
        self.ensure_line_index();
        self.line_index.find_line_by_pos(pos)
    }

    /// `pos`'s display-width column within its line (distinct from its byte
    /// offset into the line whenever the line contains multi-byte or
    /// wide-display characters).
    pub fn find_column_by_pos(&mut self, pos: u64) -> usize {
        let (line, byte_col) = self.find_line_by_pos(pos);
        let line_start = self.line_index.line_start(line).unwrap_or(0);
        let prefix = self
            .get_range(line_start, byte_col)
            .unwrap_or_default();
        crate::unicode::display_width(&String::from_utf8_lossy(&prefix))
    }

    /// Byte offset of the start of the line after the one containing `pos`,
    /// or `None` if `pos` is on the last line.
    pub fn find_next_line_from_pos(&mut self, pos: u64) -> Option<u64> {
        let (line, _) = self.find_line_by_pos(pos);
        self.line_start(line + 1)
    }

    /// Line `n`'s content with its trailing LF (if any) stripped.
    pub fn get_line_range(&mut self, n: u64) -> CoreResult<Vec<u8>> {
        self.ensure_line_index();
        let start = self
            .line_index
            .line_start(n)
            .ok_or(CoreError::OutOfRange {
                start: n,
                length: 1,
                len: self.line_index.line_count(),
            })?;
        let end = self.line_index.line_start(n + 1).unwrap_or(self.total_len);
        let mut bytes = self.get_range(start, end - start)?;
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        Ok(bytes)
    }

    /// Finds the first occurrence of `needle` at or after `from`, scanning
    /// piece-by-piece with a sliding overlap window so a match can span a
    /// piece boundary without materializing the whole buffer.
    pub fn search_forward(&self, needle: &[u8], from: u64) -> Option<u64> {
        if needle.is_empty() || from >= self.total_len {
            return None;
        }
        let n = needle.len();
        let (start_idx, start_off) = self.locate(from);
        let mut window: Vec<u8> = Vec::with_capacity(n * 2);
        let mut window_start = from;

        for (i, p) in self.pieces[start_idx..].iter().enumerate() {
            let data = self.piece_bytes(p);
            let chunk = if i == 0 { &data[start_off as usize..] } else { data };
            window.extend_from_slice(chunk);

            let mut i = 0;
            while i + n <= window.len() {
                if &window[i..i + n] == needle {
                    return Some(window_start + i as u64);
                }
                i += 1;
            }
            if window.len() > n - 1 {
                let drop = window.len() - (n - 1);
                window.drain(0..drop);
                window_start += drop as u64;
            }
        }
        None
    }

    /// Finds the last occurrence of `needle` strictly before `from`.
    pub fn search_backward(&self, needle: &[u8], from: u64) -> Option<u64> {
        if needle.is_empty() || from == 0 {
            return None;
        }
        let upto = from.min(self.total_len);
        let haystack = self.get_range(0, upto).ok()?;
        let n = needle.len();
        if n > haystack.len() {
            return None;
        }
        haystack
            .windows(n)
            .enumerate()
            .rev()
            .find(|(_, w)| *w == needle)
            .map(|(i, _)| i as u64)
    }

    /// `search_forward`, but wraps to the start of the buffer if nothing is
    /// found after `from`. A wrapped match is only reported if it starts
    /// strictly before `from` (never re-matching the already-scanned tail).
    pub fn search_forward_wrap(&self, needle: &[u8], from: u64) -> Option<u64> {
        if let Some(pos) = self.search_forward(needle, from) {
            return Some(pos);
        }
        if from == 0 {
            return None;
        }
        self.search_forward(needle, 0).filter(|&pos| pos < from)
    }

    /// `search_backward`, but wraps to the end of the buffer if nothing is
    /// found before `from`. A wrapped match is only reported if it starts at
    /// or after `from` (never re-matching the already-scanned head).
    pub fn search_backward_wrap(&self, needle: &[u8], from: u64) -> Option<u64> {
        if let Some(pos) = self.search_backward(needle, from) {
            return Some(pos);
        }
        if from >= self.total_len {
            return None;
        }
        self.search_backward(needle, self.total_len)
            .filter(|&pos| pos >= from)
    }
}
