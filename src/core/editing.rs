//! `EditingContext`: cursor/mark, kill ring, and undo/redo wired on top of
//! the piece-table [`Buffer`](crate::core::piece_table::Buffer). This is the
//! seam external collaborators (command dispatcher, keymap) actually call
//! through — the buffer itself has no notion of a cursor.

use std::time::Instant;

use crate::core::kill_ring::KillRing;
use crate::core::piece_iterator::PieceIterator;
use crate::core::piece_table::Buffer;
use crate::core::undo_group::{EditOp, UndoEntry, UndoGrouper, LARGE_INSERT_THRESHOLD};
use crate::error::CoreResult;

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Bounds how far `move_word_left` scans backward looking for a word
/// boundary, so a very long run of non-word bytes can't make a single
/// keystroke scan the whole buffer.
const WORD_BACKWARD_WINDOW: u64 = 256;

pub struct EditingContext {
    buffer: Buffer,
    cursor: u64,
    mark: Option<u64>,
    kill_ring: KillRing,
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    grouper: UndoGrouper,
    explicit_group_id: Option<u32>,
    /// Undo-stack depth at the last save; `modified()` compares against it.
    savepoint: usize,
    /// Display column preserved across a run of up/down movement.
    desired_visual_col: Option<usize>,
}

impl EditingContext {
    pub fn new(buffer: Buffer) -> Self {
        EditingContext {
            buffer,
            cursor: 0,
            mark: None,
            kill_ring: KillRing::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            grouper: UndoGrouper::new(),
            explicit_group_id: None,
            savepoint: 0,
            desired_visual_col: None,
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn mark(&self) -> Option<u64> {
        self.mark
    }

    pub fn set_mark(&mut self) {
        self.mark = Some(self.cursor);
    }

    pub fn clear_mark(&mut self) {
        self.mark = None;
    }

    pub fn select_all(&mut self) {
        self.mark = Some(0);
        self.cursor = self.buffer.len();
    }

    /// `true` once the undo stack has moved away from the depth it was at
    /// the last save — including moving *back* past it via `undo`, since
    /// the buffer's content then again differs from what was saved.
    pub fn modified(&self) -> bool {
        self.undo_stack.len() != self.savepoint
    }

    pub fn mark_saved(&mut self) {
        self.savepoint = self.undo_stack.len();
    }

    /// Drops all undo/redo history and resets grouping state. Used after a
    /// reload, when the old history no longer corresponds to anything on
    /// disk.
    pub fn clear_undo_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.grouper = UndoGrouper::new();
        self.explicit_group_id = None;
        self.savepoint = 0;
    }

    /// Brackets a sequence of edits (e.g. auto-indent followed by a
    /// character) into one undo step, overriding the automatic grouping
    /// heuristics for the duration.
    pub fn begin_undo_group(&mut self) {
        self.explicit_group_id = Some(self.grouper.fresh_group_id());
    }

    pub fn end_undo_group(&mut self) {
        self.explicit_group_id = None;
    }

    // --- Editing primitives -------------------------------------------------

    pub fn insert(&mut self, text: &[u8]) -> CoreResult<()> {
        self.insert_groupable(text, true)
    }

    fn insert_groupable(&mut self, text: &[u8], groupable: bool) -> CoreResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let pos = self.cursor;
        let snapshot = self.buffer.clone_pieces();
        let snapshot_len = self.buffer.len();
        if let Err(e) = self.buffer.insert(pos, text) {
            self.buffer.restore_pieces(snapshot, snapshot_len);
            return Err(e);
        }
        let cursor_after = pos + text.len() as u64;
        let actual_len = text.len() as u64;
        let is_large = actual_len >= LARGE_INSERT_THRESHOLD;
        let stored = if is_large { Vec::new() } else { text.to_vec() };
        self.record_edit_with_len(
            EditOp::Insert,
            pos,
            stored,
            actual_len,
            pos,
            cursor_after,
            groupable && !is_large,
        );
        self.cursor = cursor_after;
        self.mark = None;
        self.desired_visual_col = None;
        Ok(())
    }

    pub fn delete_forward(&mut self, len: u64) -> CoreResult<()> {
        let pos = self.cursor;
        let len = len.min(self.buffer.len().saturating_sub(pos));
        if len == 0 {
            return Ok(());
        }
        let data = self.buffer.get_range(pos, len)?;
        let snapshot = self.buffer.clone_pieces();
        let snapshot_len = self.buffer.len();
        if let Err(e) = self.buffer.delete(pos, len) {
            self.buffer.restore_pieces(snapshot, snapshot_len);
            return Err(e);
        }
        self.record_edit(EditOp::Delete, pos, data, pos, pos, true);
        self.mark = None;
        self.desired_visual_col = None;
        Ok(())
    }

    pub fn backspace(&mut self, len: u64) -> CoreResult<()> {
        let len = len.min(self.cursor);
        if len == 0 {
            return Ok(());
        }
        let pos = self.cursor - len;
        let data = self.buffer.get_range(pos, len)?;
        let snapshot = self.buffer.clone_pieces();
        let snapshot_len = self.buffer.len();
        if let Err(e) = self.buffer.delete(pos, len) {
            self.buffer.restore_pieces(snapshot, snapshot_len);
            return Err(e);
        }
        self.record_edit(EditOp::Delete, pos, data, self.cursor, pos, true);
        self.cursor = pos;
        self.mark = None;
        self.desired_visual_col = None;
        Ok(())
    }

    /// Kills (cuts) from the cursor to the end of the current line, and the
    /// line's newline too if the cursor was already at end-of-line.
    pub fn kill_line(&mut self) -> CoreResult<()> {
        let mut end = self.current_line_end_pos();
        if end == self.cursor && end < self.buffer.len() {
            end += 1; // also take the newline
        }
        let len = end - self.cursor;
        if len == 0 {
            return Ok(());
        }
        let pos = self.cursor;
        let data = self.buffer.get_range(pos, len)?;
        let snapshot = self.buffer.clone_pieces();
        let snapshot_len = self.buffer.len();
        if let Err(e) = self.buffer.delete(pos, len) {
            self.buffer.restore_pieces(snapshot, snapshot_len);
            return Err(e);
        }
        self.kill_ring.set(data.clone());
        self.record_edit(EditOp::Delete, pos, data, pos, pos, false);
        self.desired_visual_col = None;
        Ok(())
    }

    fn current_line_end_pos(&mut self) -> u64 {
        let (line, _) = self.buffer.find_line_by_pos(self.cursor);
        match self.buffer.line_start(line + 1) {
            Some(next_line_start) => next_line_start - 1,
            None => self.buffer.len(),
        }
    }

    /// Copies the marked region into the kill ring without deleting it. A
    /// no-op if no mark is set.
    pub fn copy_region(&mut self) -> CoreResult<()> {
        if let Some((start, len)) = self.region_span() {
            let data = self.buffer.get_range(start, len)?;
            self.kill_ring.set(data);
        }
        Ok(())
    }

    /// Deletes the marked region into the kill ring. A no-op if no mark is
    /// set.
    pub fn kill_region(&mut self) -> CoreResult<()> {
        let Some((start, len)) = self.region_span() else {
            return Ok(());
        };
        if len == 0 {
            return Ok(());
        }
        let data = self.buffer.get_range(start, len)?;
        let snapshot = self.buffer.clone_pieces();
        let snapshot_len = self.buffer.len();
        if let Err(e) = self.buffer.delete(start, len) {
            self.buffer.restore_pieces(snapshot, snapshot_len);
            return Err(e);
        }
        self.kill_ring.set(data.clone());
        self.record_edit(EditOp::Delete, start, data, self.cursor, start, false);
        self.cursor = start;
        self.mark = None;
        self.desired_visual_col = None;
        Ok(())
    }

    fn region_span(&self) -> Option<(u64, u64)> {
        let mark = self.mark?;
        let (start, end) = if mark <= self.cursor {
            (mark, self.cursor)
        } else {
            (self.cursor, mark)
        };
        Some((start, end - start))
    }

    /// The active selection as a normalized `(start, end)` pair, or `None`
    /// if no mark is set.
    pub fn get_selection(&self) -> Option<(u64, u64)> {
        let mark = self.mark?;
        Some(if mark <= self.cursor {
            (mark, self.cursor)
        } else {
            (self.cursor, mark)
        })
    }

    /// Records an insert a caller already applied to the buffer directly
    /// (via [`Self::buffer_mut`]), without touching the buffer itself. Used
    /// by composite commands that need custom grouping — see
    /// [`Self::record_replace_op`].
    pub fn record_insert_op(&mut self, position: u64, data: Vec<u8>) {
        let cursor_after = position + data.len() as u64;
        self.record_edit(EditOp::Insert, position, data, position, cursor_after, false);
    }

    /// Records a delete a caller already applied to the buffer directly.
    pub fn record_delete_op(&mut self, position: u64, data: Vec<u8>) {
        let cursor_before = position + data.len() as u64;
        self.record_edit(EditOp::Delete, position, data, cursor_before, position, false);
    }

    /// Records a replace (a delete of `old` immediately followed by an
    /// insert of `new`, both already applied to the buffer by the caller)
    /// as two undo entries under one group id, `{Delete(old), Insert(new)}`
    /// — LIFO pop order during undo then restores `old` before removing
    /// `new`, giving the correct visual result in one undo press.
    pub fn record_replace_op(&mut self, position: u64, old: Vec<u8>, new: Vec<u8>) {
        self.begin_undo_group();
        self.record_delete_op(position, old);
        let new_len = new.len() as u64;
        self.record_insert_op(position, new);
        self.end_undo_group();
        self.cursor = position + new_len;
        self.mark = None;
        self.desired_visual_col = None;
    }

    /// Inserts the kill ring's contents at the cursor. The yanked text never
    /// merges with a neighboring undo group — undoing a yank always removes
    /// exactly what was yanked.
    pub fn yank(&mut self) -> CoreResult<()> {
        if let Some(data) = self.kill_ring.get() {
            let data = data.to_vec();
            self.insert_groupable(&data, false)?;
        }
        Ok(())
    }

    // --- Undo / redo ---------------------------------------------------------

    /// Pops and inverts every entry sharing the top entry's group id (so a
    /// multi-entry group, such as a replace's `{Delete(old), Insert(new)}`,
    /// undoes as a single user-visible step), pushing each to the redo stack
    /// in the same LIFO order so redo can replay them forward.
    pub fn undo(&mut self) -> CoreResult<bool> {
        if self.undo_stack.is_empty() {
            return Ok(false);
        }
        let group_id = self.undo_stack.last().unwrap().group_id;
        let mut cursor_before = self.cursor;
        while let Some(e) = self.undo_stack.last() {
            if e.group_id != group_id {
                break;
            }
            let entry = self.undo_stack.pop().unwrap();
            self.apply_inverse(&entry)?;
            cursor_before = entry.cursor_before;
            if !entry.is_large_insert() {
                self.redo_stack.push(entry);
            }
        }
        self.cursor = cursor_before;
        self.mark = None;
        self.desired_visual_col = None;
        Ok(true)
    }

    pub fn redo(&mut self) -> CoreResult<bool> {
        if self.redo_stack.is_empty() {
            return Ok(false);
        }
        let group_id = self.redo_stack.last().unwrap().group_id;
        let mut cursor_after = self.cursor;
        while let Some(e) = self.redo_stack.last() {
            if e.group_id != group_id {
                break;
            }
            let entry = self.redo_stack.pop().unwrap();
            self.apply_forward(&entry)?;
            cursor_after = entry.cursor_after;
            self.undo_stack.push(entry);
        }
        self.cursor = cursor_after;
        self.mark = None;
        self.desired_visual_col = None;
        Ok(true)
    }

    fn apply_inverse(&mut self, entry: &UndoEntry) -> CoreResult<()> {
        match entry.op {
            EditOp::Insert => self.buffer.delete(entry.position, entry.actual_len),
            EditOp::Delete => self.buffer.insert(entry.position, &entry.data),
        }
    }

    fn apply_forward(&mut self, entry: &UndoEntry) -> CoreResult<()> {
        match entry.op {
            EditOp::Insert => self.buffer.insert(entry.position, &entry.data),
            EditOp::Delete => self.buffer.delete(entry.position, entry.data.len() as u64),
        }
    }

    fn record_edit(
        &mut self,
        op: EditOp,
        position: u64,
        data: Vec<u8>,
        cursor_before: u64,
        cursor_after: u64,
        groupable: bool,
    ) {
        let actual_len = data.len() as u64;
        self.record_edit_with_len(op, position, data, actual_len, cursor_before, cursor_after, groupable);
    }

    fn record_edit_with_len(
        &mut self,
        op: EditOp,
        position: u64,
        data: Vec<u8>,
        actual_len: u64,
        cursor_before: u64,
        cursor_after: u64,
        groupable: bool,
    ) {
        let now = Instant::now();

        if let Some(gid) = self.explicit_group_id {
            if let Some(prev) = self.undo_stack.last_mut() {
                if prev.group_id == Some(gid) && prev.op == op {
                    Self::merge_into(prev, op, position, data, cursor_after);
                    self.grouper.note_edit(now);
                    self.redo_stack.clear();
                    return;
                }
            }
            self.undo_stack.push(UndoEntry {
                op,
                position,
                data,
                actual_len,
                cursor_before,
                cursor_after,
                groupable,
                group_id: Some(gid),
            });
            self.grouper.note_edit(now);
            self.redo_stack.clear();
            return;
        }

        let new_byte = if data.len() == 1 { Some(data[0]) } else { None };
        let mut merged = false;
        if groupable {
            if let Some(prev) = self.undo_stack.last_mut() {
                if self.grouper.should_group(prev, op, position, new_byte, now) {
                    Self::merge_into(prev, op, position, data.clone(), cursor_after);
                    merged = true;
                }
            }
        }
        if !merged {
            let group_id = self.grouper.fresh_group_id();
            self.undo_stack.push(UndoEntry {
                op,
                position,
                data,
                actual_len,
                cursor_before,
                cursor_after,
                groupable,
                group_id: Some(group_id),
            });
        }
        self.grouper.note_edit(now);
        self.redo_stack.clear();
    }

    fn merge_into(prev: &mut UndoEntry, op: EditOp, position: u64, data: Vec<u8>, cursor_after: u64) {
        match op {
            EditOp::Insert => prev.data.extend_from_slice(&data),
            EditOp::Delete => {
                if position == prev.position {
                    prev.data.extend_from_slice(&data);
                } else {
                    let mut merged = data;
                    merged.extend_from_slice(&prev.data);
                    prev.data = merged;
                    prev.position = position;
                }
            }
        }
        prev.actual_len = prev.data.len() as u64;
        prev.cursor_after = cursor_after;
    }

    // --- Cursor movement ------------------------------------------------------

    pub fn move_left(&mut self) {
        self.cursor = self.prev_grapheme_start(self.cursor);
        self.desired_visual_col = None;
    }

    pub fn move_right(&mut self) {
        let mut it = PieceIterator::new(&self.buffer, self.cursor);
        // Malformed UTF-8 can't occur in a buffer built from this crate's own
        // encoding gateway; treat it the same as end-of-buffer (don't move).
        if it.next_grapheme_cluster().unwrap_or(None).is_some() {
            self.cursor = it.position();
        }
        self.desired_visual_col = None;
    }

    /// Finds the start of the grapheme cluster ending at `pos`, by walking
    /// back to a safe UTF-8 lead byte within a bounded window and then
    /// re-clustering forward — grapheme clustering has no native backward
    /// direction, so this is the standard way to invert it.
    fn prev_grapheme_start(&self, pos: u64) -> u64 {
        if pos == 0 {
            return 0;
        }
        const SAFE_WINDOW: u64 = 64;
        let floor = pos.saturating_sub(SAFE_WINDOW);
        let mut safe = pos;
        while safe > floor {
            safe -= 1;
            if let Some(b) = self.buffer.byte_at(safe) {
                if crate::unicode::is_lead_byte(b) && !crate::unicode::is_grapheme_extender(self.decode_codepoint_at(safe)) {
                    break;
                }
            }
        }

        let mut it = PieceIterator::new(&self.buffer, safe);
        let mut last_start = safe;
        loop {
            let start = it.position();
            if start >= pos {
                break;
            }
            if it.next_grapheme_cluster().unwrap_or(None).is_none() {
                break;
            }
            last_start = start;
        }
        last_start
    }

    fn decode_codepoint_at(&self, pos: u64) -> u32 {
        PieceIterator::new(&self.buffer, pos)
            .next_codepoint()
            .ok()
            .flatten()
            .map(|c| c as u32)
            .unwrap_or(0)
    }

    /// Skips the rest of the current word (if the cursor is in one), then
    /// skips the non-word run that follows, landing at the start of the
    /// next word.
    pub fn move_word_right(&mut self) {
        let len = self.buffer.len();
        let mut pos = self.cursor;
        while pos < len && is_word_byte(self.buffer.byte_at(pos).unwrap_or(0)) {
            pos += 1;
        }
        while pos < len && !is_word_byte(self.buffer.byte_at(pos).unwrap_or(0)) {
            pos += 1;
        }
        self.cursor = pos;
        self.desired_visual_col = None;
    }

    /// Skips the non-word run immediately behind the cursor (if any), then
    /// skips the word behind that, landing at that word's start. The phase
    /// order is the mirror image of `move_word_right`'s, not a copy of it:
    /// the run that must be skipped in full to reach the boundary goes
    /// last, and going backward that's the word itself.
    pub fn move_word_left(&mut self) {
        let floor = self.cursor.saturating_sub(WORD_BACKWARD_WINDOW);
        let mut pos = self.cursor;
        while pos > floor && !is_word_byte(self.buffer.byte_at(pos - 1).unwrap_or(0)) {
            pos -= 1;
        }
        while pos > floor && is_word_byte(self.buffer.byte_at(pos - 1).unwrap_or(0)) {
            pos -= 1;
        }
        self.cursor = pos;
        self.desired_visual_col = None;
    }

    pub fn move_down(&mut self) {
        self.move_vertical(1);
    }

    pub fn move_up(&mut self) {
        self.move_vertical(-1);
    }

    fn move_vertical(&mut self, delta: i64) {
        let (line, col_bytes) = self.buffer.find_line_by_pos(self.cursor);
        let line_start = self.buffer.line_start(line).unwrap_or(0);
        let current_prefix = self.buffer.get_range(line_start, col_bytes).unwrap_or_default();
        let current_col = self.desired_visual_col.unwrap_or_else(|| {
            crate::unicode::display_width(&String::from_utf8_lossy(&current_prefix))
        });
        self.desired_visual_col = Some(current_col);

        let target_line = if delta < 0 {
            match line.checked_sub((-delta) as u64) {
                Some(l) => l,
                None => return,
            }
        } else {
            line + delta as u64
        };
        if target_line >= self.buffer.line_count() {
            return;
        }
        let target_start = match self.buffer.line_start(target_line) {
            Some(p) => p,
            None => return,
        };
        let target_end = self
            .buffer
            .line_start(target_line + 1)
            .map(|p| p - 1)
            .unwrap_or(self.buffer.len());
        let line_bytes = self
            .buffer
            .get_range(target_start, target_end - target_start)
            .unwrap_or_default();
        let line_text = String::from_utf8_lossy(&line_bytes);

        let mut acc_width = 0usize;
        let mut byte_pos = target_start;
        for cluster in crate::unicode::grapheme_clusters(&line_text) {
            let w = crate::unicode::grapheme_cluster_width(cluster);
            if acc_width + w > current_col {
                break;
            }
            acc_width += w;
            byte_pos += cluster.len() as u64;
        }
        self.cursor = byte_pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::piece_table::OriginalData;
    use crate::encoding::{Encoding, LineEnding};

    fn ctx_from(s: &str) -> EditingContext {
        let buffer = Buffer::from_original(
            OriginalData::Owned(s.as_bytes().to_vec()),
            Encoding::Utf8,
            LineEnding::Lf,
        );
        EditingContext::new(buffer)
    }

    #[test]
    fn insert_advances_cursor_and_sets_modified() {
        let mut ctx = ctx_from("");
        assert!(!ctx.modified());
        ctx.insert(b"hi").unwrap();
        assert_eq!(ctx.buffer().to_vec(), b"hi");
        assert_eq!(ctx.cursor(), 2);
        assert!(ctx.modified());
    }

    #[test]
    fn mark_saved_resets_modified() {
        let mut ctx = ctx_from("x");
        ctx.insert(b"y").unwrap();
        ctx.mark_saved();
        assert!(!ctx.modified());
    }

    #[test]
    fn undo_past_savepoint_is_modified_again() {
        let mut ctx = ctx_from("x");
        ctx.insert(b"y").unwrap();
        ctx.mark_saved();
        ctx.undo().unwrap();
        assert!(ctx.modified());
    }

    #[test]
    fn undo_redo_roundtrips_insert() {
        let mut ctx = ctx_from("ab");
        ctx.insert(b"X").unwrap(); // "Xab"
        assert_eq!(ctx.buffer().to_vec(), b"Xab");
        assert!(ctx.undo().unwrap());
        assert_eq!(ctx.buffer().to_vec(), b"ab");
        assert!(ctx.redo().unwrap());
        assert_eq!(ctx.buffer().to_vec(), b"Xab");
    }

    #[test]
    fn consecutive_typing_groups_into_one_undo_step() {
        let mut ctx = ctx_from("");
        ctx.insert(b"h").unwrap();
        ctx.insert(b"i").unwrap();
        assert_eq!(ctx.undo_stack.len(), 1);
        ctx.undo().unwrap();
        assert_eq!(ctx.buffer().to_vec(), b"");
    }

    #[test]
    fn backspace_removes_preceding_byte() {
        let mut ctx = ctx_from("abc");
        ctx.cursor = 3;
        ctx.backspace(1).unwrap();
        assert_eq!(ctx.buffer().to_vec(), b"ab");
        assert_eq!(ctx.cursor(), 2);
    }

    #[test]
    fn kill_line_then_yank_roundtrips() {
        let mut ctx = ctx_from("hello world");
        ctx.cursor = 5;
        ctx.kill_line().unwrap();
        assert_eq!(ctx.buffer().to_vec(), b"hello");
        ctx.cursor = 5;
        ctx.yank().unwrap();
        assert_eq!(ctx.buffer().to_vec(), b"hello world");
    }

    #[test]
    fn kill_region_deletes_and_fills_kill_ring() {
        let mut ctx = ctx_from("hello world");
        ctx.cursor = 0;
        ctx.set_mark();
        ctx.cursor = 5;
        ctx.kill_region().unwrap();
        assert_eq!(ctx.buffer().to_vec(), b" world");
        ctx.cursor = ctx.buffer().len();
        ctx.yank().unwrap();
        assert_eq!(ctx.buffer().to_vec(), b" worldhello");
    }

    #[test]
    fn move_left_right_are_grapheme_safe() {
        let mut ctx = ctx_from("e\u{0301}x"); // e + combining acute, then x
        ctx.cursor = 0;
        ctx.move_right();
        assert_eq!(ctx.cursor(), "e\u{0301}".len() as u64);
        ctx.move_right();
        assert_eq!(ctx.cursor(), ctx.buffer().len());
        ctx.move_left();
        assert_eq!(ctx.cursor(), "e\u{0301}".len() as u64);
        ctx.move_left();
        assert_eq!(ctx.cursor(), 0);
    }

    #[test]
    fn move_word_right_and_left() {
        let mut ctx = ctx_from("foo  bar");
        ctx.cursor = 0;
        ctx.move_word_right(); // skip "foo" then the two spaces
        assert_eq!(ctx.cursor(), 5);
        ctx.move_word_right(); // skip "bar"; nothing follows
        assert_eq!(ctx.cursor(), 8);
        ctx.move_word_left(); // skip back over "bar" to its start
        assert_eq!(ctx.cursor(), 5);
        ctx.move_word_left(); // skip back over the spaces, then "foo"
        assert_eq!(ctx.cursor(), 0);
    }

    #[test]
    fn move_word_right_from_mid_word_reaches_the_next_words_start() {
        let mut ctx = ctx_from("foo  bar");
        ctx.cursor = 1; // inside "foo"
        ctx.move_word_right();
        assert_eq!(ctx.cursor(), 5);
    }

    #[test]
    fn move_word_left_from_mid_word_stops_at_that_words_start() {
        let mut ctx = ctx_from("foo  bar");
        ctx.cursor = 6; // inside "bar"
        ctx.move_word_left();
        assert_eq!(ctx.cursor(), 5);
    }

    #[test]
    fn vertical_movement_preserves_display_column() {
        let mut ctx = ctx_from("abcdef\nxy\nuvwxyz");
        ctx.cursor = 4; // column 4 on line 0
        ctx.move_down();
        assert_eq!(ctx.cursor(), 9); // line 1 ("xy") is only 2 wide, clamp to end
        ctx.move_down();
        assert_eq!(ctx.cursor(), 14); // back to column 4 on line 2
    }

    #[test]
    fn large_insert_is_not_redoable_after_undo() {
        let mut ctx = ctx_from("");
        let big = vec![b'x'; crate::core::undo_group::LARGE_INSERT_THRESHOLD as usize];
        ctx.insert(&big).unwrap();
        ctx.undo().unwrap();
        assert!(!ctx.redo().unwrap());
    }

    #[test]
    fn select_all_sets_mark_and_cursor() {
        let mut ctx = ctx_from("hello");
        ctx.select_all();
        assert_eq!(ctx.mark(), Some(0));
        assert_eq!(ctx.cursor(), 5);
    }

    #[test]
    fn get_selection_normalizes_mark_and_cursor_order() {
        let mut ctx = ctx_from("hello world");
        ctx.cursor = 7;
        ctx.set_mark();
        ctx.cursor = 2;
        assert_eq!(ctx.get_selection(), Some((2, 7)));
    }

    #[test]
    fn record_replace_op_undoes_as_one_step() {
        let mut ctx = ctx_from("hello");
        ctx.buffer_mut().delete(0, 5).unwrap();
        ctx.buffer_mut().insert(0, b"goodbye").unwrap();
        ctx.record_replace_op(0, b"hello".to_vec(), b"goodbye".to_vec());
        assert_eq!(ctx.buffer().to_vec(), b"goodbye");
        assert_eq!(ctx.cursor(), 7);
        assert!(ctx.undo().unwrap());
        assert_eq!(ctx.buffer().to_vec(), b"hello");
        assert!(ctx.redo().unwrap());
        assert_eq!(ctx.buffer().to_vec(), b"goodbye");
    }
}
