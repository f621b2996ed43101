//! Row-layout validation.
//!
//! The validator answers one question: would a given row still be legal if
//! `widget_id` took `candidate_size`? It builds the hypothetical row
//! membership (enabled placements anchored in the row, with `widget_id`'s
//! size swapped) and applies the row invariants. Pure, no I/O; callers decide
//! what to do with a rejection (the store turns it into a logged no-op).

use crate::{GRID_COLS, WidgetPlacement, WidgetSize};

/// Would `row` remain legal with `widget_id` at `candidate_size`?
///
/// Placements that are not enabled are excluded regardless of their stored
/// position. The checks mirror the row invariants: span sum at most
/// [`GRID_COLS`], at most one Medium, and a Large alone in its row.
pub fn is_valid_row_layout(
    placements: &[WidgetPlacement],
    widget_id: &str,
    candidate_size: WidgetSize,
    row: u8,
) -> bool {
    let sizes: Vec<WidgetSize> = placements
        .iter()
        .filter(|p| p.enabled && p.row() == row)
        .map(|p| {
            if p.id == widget_id {
                candidate_size
            } else {
                p.size
            }
        })
        .collect();

    let span_sum: u8 = sizes.iter().map(|s| s.span()).sum();
    if span_sum > GRID_COLS {
        return false;
    }
    if sizes.iter().filter(|s| **s == WidgetSize::Medium).count() > 1 {
        return false;
    }
    if sizes.contains(&WidgetSize::Large) && sizes.len() > 1 {
        return false;
    }
    true
}
