//! Occupancy: which slots are covered by the enabled placements.
//!
//! Derived view, never stored. Used to find free slots for add/drop targets
//! and to render empty-slot placeholders. A span that would cross the row
//! boundary is clipped (columns past the last are dropped); a Large widget
//! covers its whole row regardless of the stored column offset.

use std::collections::BTreeSet;

use crate::{GRID_COLS, SLOT_COUNT, WidgetPlacement, WidgetSize, slot_coords, slot_index};

/// Slots covered by a single placement, ignoring its `enabled` flag.
pub fn covered_slots(placement: &WidgetPlacement) -> Vec<u8> {
    let (row, col) = slot_coords(placement.position);
    match placement.size {
        WidgetSize::Large => (0..GRID_COLS).map(|c| slot_index(row, c)).collect(),
        _ => {
            let span = placement.size.span().min(GRID_COLS - col);
            (col..col + span).map(|c| slot_index(row, c)).collect()
        }
    }
}

/// Union of covered slots over all *enabled* placements.
pub fn occupied_slots(placements: &[WidgetPlacement]) -> BTreeSet<u8> {
    placements
        .iter()
        .filter(|p| p.enabled)
        .flat_map(|p| covered_slots(p))
        .collect()
}

/// Slots not covered by any enabled placement, ascending.
pub fn free_slots(placements: &[WidgetPlacement]) -> Vec<u8> {
    let occupied = occupied_slots(placements);
    (0..SLOT_COUNT).filter(|s| !occupied.contains(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WidgetSize::{Large, Medium, Small};

    fn p(id: &str, enabled: bool, size: crate::WidgetSize, position: u8) -> WidgetPlacement {
        WidgetPlacement::new(id, enabled, size, position)
    }

    #[test]
    fn small_covers_anchor_only() {
        assert_eq!(covered_slots(&p("steps", true, Small, 4)), vec![4]);
    }

    #[test]
    fn medium_covers_anchor_and_next() {
        assert_eq!(covered_slots(&p("sleep", true, Medium, 3)), vec![3, 4]);
    }

    #[test]
    fn medium_at_last_column_clips() {
        assert_eq!(covered_slots(&p("sleep", true, Medium, 2)), vec![2]);
        assert_eq!(covered_slots(&p("sleep", true, Medium, 5)), vec![5]);
    }

    #[test]
    fn large_covers_whole_row_regardless_of_offset() {
        assert_eq!(covered_slots(&p("steps", true, Large, 0)), vec![0, 1, 2]);
        assert_eq!(covered_slots(&p("steps", true, Large, 4)), vec![3, 4, 5]);
    }

    #[test]
    fn disabled_placements_do_not_occupy() {
        let placements = vec![
            p("steps", true, Small, 0),
            p("hrv", false, Large, 3), // stale position, must not count
        ];
        assert_eq!(occupied_slots(&placements), BTreeSet::from([0]));
        assert_eq!(free_slots(&placements), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn full_grid_has_no_free_slots() {
        let placements = vec![
            p("steps", true, Large, 0),
            p("sleep", true, Medium, 3),
            p("hrv", true, Small, 5),
        ];
        assert!(free_slots(&placements).is_empty());
    }
}
