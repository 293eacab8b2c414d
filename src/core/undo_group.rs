//! Undo-entry grouping: merges a run of small, time-adjacent edits of the
//! same kind into one undo step, so holding down a letter key doesn't
//! require one undo press per character.

use std::time::Instant;

/// Consecutive edits merge into one undo step only while they stay within
/// this wall-clock gap.
const GROUP_TIME_THRESHOLD_MS: u128 = 300;

/// Inserts at or above this size never get a redo entry: keeping both the
/// undo snapshot and a redo snapshot of a huge paste would double its
/// memory cost for an operation a user is unlikely to redo anyway.
pub const LARGE_INSERT_THRESHOLD: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Insert,
    Delete,
}

/// One undone/redoable edit. `data` is the inserted text (for `Insert`) or
/// the deleted text (for `Delete`) — either way, enough to replay or invert
/// the edit without consulting the buffer. `actual_len` normally equals
/// `data.len()`; it diverges only for a large insert, where `data` is left
/// empty (see [`UndoEntry::is_large_insert`]) but `actual_len` still records
/// how many bytes undo must delete.
#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub op: EditOp,
    pub position: u64,
    pub data: Vec<u8>,
    pub actual_len: u64,
    pub cursor_before: u64,
    pub cursor_after: u64,
    /// False for edits that must never merge with a neighbor (e.g. the
    /// synthetic halves of a replace, or anything produced by `yank`).
    pub groupable: bool,
    pub group_id: Option<u32>,
}

impl UndoEntry {
    /// Inserts at or above [`LARGE_INSERT_THRESHOLD`] skip storing `data` at
    /// all, to avoid doubling memory for a huge paste's undo and redo
    /// snapshots; `actual_len` alone is enough for undo to invert the edit,
    /// but redo cannot reconstruct the text and such an entry is never
    /// placed on the redo stack.
    pub fn is_large_insert(&self) -> bool {
        self.op == EditOp::Insert && self.actual_len >= LARGE_INSERT_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteClass {
    Word,
    Space,
    Newline,
    Punctuation,
    NonAscii,
}

fn classify_byte(b: u8) -> ByteClass {
    match b {
        b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' => ByteClass::Word,
        b' ' | b'\t' => ByteClass::Space,
        b'\n' | b'\r' => ByteClass::Newline,
        b if b < 0x80 => ByteClass::Punctuation,
        _ => ByteClass::NonAscii,
    }
}

/// Tracks wall-clock time and hands out group ids; the actual merge
/// decision lives in [`should_group`], which is pure so it is easy to test.
#[derive(Debug, Default)]
pub struct UndoGrouper {
    last_edit_at: Option<Instant>,
    next_group_id: u32,
}

impl UndoGrouper {
    pub fn new() -> Self {
        UndoGrouper::default()
    }

    /// Call once per committed edit, after `should_group` has decided
    /// whether it joins the previous entry's group.
    pub fn note_edit(&mut self, now: Instant) {
        self.last_edit_at = Some(now);
    }

    pub fn fresh_group_id(&mut self) -> u32 {
        let id = self.next_group_id;
        self.next_group_id += 1;
        id
    }

    /// Decides whether an edit of `new_op` at `new_pos` touching `new_byte`
    /// (the single byte being inserted/deleted, when the edit is exactly one
    /// byte — multi-byte edits never merge) should join `prev`'s group.
    ///
    /// Conditions, all of which must hold:
    /// 1. `prev` allows merging (`prev.groupable`).
    /// 2. Same edit kind (insert only merges with insert).
    /// 3. Within [`GROUP_TIME_THRESHOLD_MS`] of the previous edit.
    /// 4. Positionally adjacent (an insert continues right after the
    ///    previous one; a delete continues at the same position, repeated
    ///    forward-deletes, or one position earlier, repeated backspaces).
    /// 5. Neither edit's affected byte is a newline — a group never spans a
    ///    line boundary.
    /// 6. Neither byte is non-ASCII — multi-byte edits always start a fresh
    ///    group, since "word" classification does not apply.
    /// 7. The two bytes share a class, or the run transitions from
    ///    whitespace into a word (so "foo " then "bar" merges into typing
    ///    one phrase, matching how a word processor groups a sentence).
    /// 8. A transition out of a word into punctuation, or vice versa, always
    ///    starts a new group.
    pub fn should_group(
        &self,
        prev: &UndoEntry,
        new_op: EditOp,
        new_pos: u64,
        new_byte: Option<u8>,
        now: std::time::Instant,
    ) -> bool {
        if !prev.groupable || prev.op != new_op {
            return false;
        }
        if let Some(last) = self.last_edit_at {
            if now.saturating_duration_since(last).as_millis() > GROUP_TIME_THRESHOLD_MS {
                return false;
            }
        }

        let adjacent = match new_op {
            EditOp::Insert => new_pos == prev.position + prev.data.len() as u64,
            EditOp::Delete => new_pos == prev.position || new_pos + 1 == prev.position,
        };
        if !adjacent {
            return false;
        }

        if prev.data.iter().any(|&b| b == b'\n') {
            return false;
        }
        if matches!(new_byte, Some(b'\n')) {
            return false;
        }

        let prev_class = prev.data.last().copied().map(classify_byte);
        let new_class = new_byte.map(classify_byte);
        match (prev_class, new_class) {
            (Some(ByteClass::NonAscii), _) | (_, Some(ByteClass::NonAscii)) => false,
            (Some(a), Some(b)) => a == b || (a == ByteClass::Space && b == ByteClass::Word),
            // Multi-byte entries (no single trailing/leading byte to
            // classify, e.g. a pasted block) never merge.
            _ => false,
        }
    }
}
