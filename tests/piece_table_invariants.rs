//! Cross-module checks for the piece-table invariants of the testable
//! properties: total length always matches the piece sequence, line lookups
//! are consistent, and no edit ever produces a zero-length piece.

use ze_core::core::piece_table::{Buffer, OriginalData};
use ze_core::encoding::{Encoding, LineEnding};

fn buf_from(s: &str) -> Buffer {
    Buffer::from_original(
        OriginalData::Owned(s.as_bytes().to_vec()),
        Encoding::Utf8,
        LineEnding::Lf,
    )
}

fn assert_len_matches_pieces(b: &Buffer) {
    let sum: u64 = b.clone_pieces().iter().map(|p| p.length).sum();
    assert_eq!(sum, b.len());
}

fn assert_no_zero_length_pieces(b: &Buffer) {
    assert!(b.clone_pieces().iter().all(|p| p.length > 0));
}

#[test]
fn total_len_tracks_piece_sum_across_a_sequence_of_edits() {
    let mut b = buf_from("hello");
    assert_len_matches_pieces(&b);
    b.insert(5, b", world").unwrap();
    assert_len_matches_pieces(&b);
    b.insert(0, b">> ").unwrap();
    assert_len_matches_pieces(&b);
    b.delete(3, 5).unwrap();
    assert_len_matches_pieces(&b);
    b.delete(0, b.len()).unwrap();
    assert_len_matches_pieces(&b);
    assert!(b.is_empty());
}

#[test]
fn insert_at_start_end_and_piece_boundary_produce_no_zero_length_pieces() {
    let mut b = buf_from("hello");
    b.insert(0, b"A").unwrap(); // at start
    b.insert(b.len(), b"Z").unwrap(); // at end
    assert_no_zero_length_pieces(&b);

    // insert exactly on the boundary between the two pieces created above
    let boundary = 1; // right after "A"
    b.insert(boundary, b"-").unwrap();
    assert_no_zero_length_pieces(&b);
    assert_len_matches_pieces(&b);
}

#[test]
fn delete_spanning_multiple_pieces_trims_ends_and_removes_middle() {
    let mut b = buf_from("hello");
    b.insert(5, b" there").unwrap(); // "hello there"
    b.insert(11, b" world").unwrap(); // "hello there world" — three pieces
    assert_eq!(b.clone_pieces().len(), 3);

    b.delete(3, 10).unwrap(); // remove "lo there w"
    assert_eq!(b.to_vec(), b"helorld");
    assert_no_zero_length_pieces(&b);
    assert_len_matches_pieces(&b);
}

#[test]
fn find_line_by_pos_agrees_with_line_start_for_every_position() {
    let mut b = buf_from("one\ntwo\nthree\n");
    let total = b.len();
    for pos in 0..=total {
        let (line, col) = b.find_line_by_pos(pos);
        let start = b.line_start(line).unwrap();
        assert_eq!(start + col, pos);
        if let Some(next_start) = b.line_start(line + 1) {
            assert!(pos < next_start);
        } else {
            assert_eq!(line + 1, b.line_count());
        }
    }
}

#[test]
fn buffer_content_is_always_well_formed_utf8() {
    let mut b = buf_from("caf\u{00e9}");
    b.insert(3, "\u{65e5}\u{672c}".as_bytes()).unwrap();
    let bytes = b.to_vec();
    assert!(std::str::from_utf8(&bytes).is_ok());
}

#[test]
fn scenario_1_insert_into_empty_buffer() {
    let mut b = Buffer::empty();
    b.insert(0, b"Hello").unwrap();
    assert_eq!(b.len(), 5);
    let pieces = b.clone_pieces();
    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].start, 0);
    assert_eq!(pieces[0].length, 5);
    assert_eq!(b.line_count(), 1);
}

#[test]
fn scenario_2_three_inserts_concatenate_into_three_pieces() {
    let mut b = Buffer::empty();
    b.insert(0, b"Hello").unwrap();
    b.insert(5, b", Beautiful").unwrap();
    b.insert(16, b" World").unwrap();
    assert_eq!(b.clone_pieces().len(), 3);
    assert_eq!(b.to_vec(), b"Hello, Beautiful World");
    assert_eq!(b.len(), 22);
}
