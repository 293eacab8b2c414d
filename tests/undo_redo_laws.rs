//! Undo/redo algebraic laws and the large-insert redo-disablement trade-off,
//! plus the concrete keystroke-grouping scenarios.

use ze_core::core::editing::EditingContext;
use ze_core::core::piece_table::{Buffer, OriginalData};
use ze_core::core::undo_group::LARGE_INSERT_THRESHOLD;
use ze_core::encoding::{Encoding, LineEnding};

fn ctx_from(s: &str) -> EditingContext {
    let buffer = Buffer::from_original(
        OriginalData::Owned(s.as_bytes().to_vec()),
        Encoding::Utf8,
        LineEnding::Lf,
    );
    EditingContext::new(buffer)
}

#[test]
fn undo_after_do_restores_the_prior_state_for_a_single_edit() {
    let mut ctx = ctx_from("abc");
    let before = ctx.buffer().to_vec();
    ctx.insert(b"XYZ").unwrap();
    assert_ne!(ctx.buffer().to_vec(), before);
    ctx.undo().unwrap();
    assert_eq!(ctx.buffer().to_vec(), before);
}

#[test]
fn redo_after_undo_restores_state_when_no_new_edit_intervenes() {
    let mut ctx = ctx_from("abc");
    ctx.insert(b"XYZ").unwrap();
    let after_insert = ctx.buffer().to_vec();
    ctx.undo().unwrap();
    ctx.redo().unwrap();
    assert_eq!(ctx.buffer().to_vec(), after_insert);
}

#[test]
fn a_new_edit_after_undo_clears_the_redo_stack() {
    let mut ctx = ctx_from("abc");
    ctx.insert(b"X").unwrap();
    ctx.undo().unwrap();
    ctx.insert(b"Y").unwrap();
    assert!(!ctx.redo().unwrap());
}

#[test]
fn large_insert_undoes_but_is_not_redoable() {
    let mut ctx = ctx_from("");
    let huge = vec![b'x'; LARGE_INSERT_THRESHOLD as usize];
    ctx.insert(&huge).unwrap();
    assert!(ctx.undo().unwrap());
    assert!(ctx.buffer().is_empty());
    assert!(!ctx.redo().unwrap());
}

#[test]
fn scenario_4_and_5_word_then_space_word_undoes_in_two_groups() {
    // Word-to-space never merges and space-to-word always does, so "hello"
    // then " world" form two undo groups whether or not a pause separates
    // them — covers both the paused (scenario 4) and unpaused (scenario 5)
    // cases, which collapse to the same grouping outcome.
    let mut ctx = ctx_from("");
    for b in b"hello world" {
        ctx.insert(&[*b]).unwrap();
    }
    assert_eq!(ctx.buffer().to_vec(), b"hello world");

    ctx.undo().unwrap();
    assert_eq!(ctx.buffer().to_vec(), b"hello");
    ctx.undo().unwrap();
    assert_eq!(ctx.buffer().to_vec(), b"");
}

#[test]
fn scenario_6_kill_region_clears_mark_and_fills_kill_ring() {
    let mut ctx = ctx_from("abc\ndef");
    ctx.move_right(); // cursor: 0 -> 1
    ctx.set_mark(); // mark = 1
    for _ in 0..4 {
        ctx.move_right(); // cursor: 1 -> 5 (through the newline)
    }
    assert_eq!(ctx.cursor(), 5);
    ctx.kill_region().unwrap();
    assert_eq!(ctx.buffer().to_vec(), b"aef");
    assert_eq!(ctx.mark(), None);

    // The kill ring now holds "bc\nd", and kill_region left the cursor at
    // the region's start — confirm both via yank, since there's no direct
    // kill-ring content getter.
    assert_eq!(ctx.cursor(), 1);
    ctx.yank().unwrap();
    assert_eq!(ctx.buffer().to_vec(), b"abc\ndef");
}
