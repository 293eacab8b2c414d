//! The core, headless, backend-agnostic editing engine: a piece-table text
//! buffer, its line index and cursor, and the editing context (cursor, mark,
//! kill ring, undo/redo) built on top of it.

pub mod editing;
pub mod kill_ring;
pub mod line_index;
pub mod piece_iterator;
pub mod piece_table;
pub mod undo_group;
