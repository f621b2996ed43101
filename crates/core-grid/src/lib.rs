//! Pure grid model for the dashboard: slot geometry, widget sizes, and the
//! placement record persisted by `core-store`.
//!
//! The dashboard arranges widgets on a fixed 2-row by 3-column grid. A slot is
//! a linear index `0..6`; a widget anchors at one slot and spans 1, 2, or 3
//! columns of its row depending on its size. Everything in this crate is
//! stateless and total for in-range inputs; callers (the store and the drag
//! controller) clamp before calling in.
//!
//! Invariants enforced by the validator for the set of *enabled* placements:
//! * covered-slot sets never overlap within a row,
//! * per-row span sum is at most [`GRID_COLS`],
//! * two Medium widgets never share a row,
//! * an enabled Large widget is alone in its row.
//!
//! Disabled placements keep a stale `position` on purpose; they never
//! participate in occupancy or conflict calculations.

use serde::{Deserialize, Serialize};

mod occupancy;
mod validate;

pub use occupancy::{covered_slots, free_slots, occupied_slots};
pub use validate::is_valid_row_layout;

/// Number of grid rows.
pub const GRID_ROWS: u8 = 2;
/// Number of grid columns (also the maximum span in a row).
pub const GRID_COLS: u8 = 3;
/// Total slot count (`GRID_ROWS * GRID_COLS`).
pub const SLOT_COUNT: u8 = GRID_ROWS * GRID_COLS;

/// Column span of a widget. Serialized lowercase so the persisted JSON stays
/// stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetSize {
    Small,
    Medium,
    Large,
}

impl WidgetSize {
    /// Columns occupied starting at the anchor slot.
    pub const fn span(self) -> u8 {
        match self {
            WidgetSize::Small => 1,
            WidgetSize::Medium => 2,
            WidgetSize::Large => 3,
        }
    }
}

/// One persisted placement record. At most one record per widget kind is
/// meaningful; "removing" a widget flips `enabled` rather than deleting the
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetPlacement {
    /// Stable identifier of the widget kind (e.g. `"steps"`, `"sleep"`).
    pub id: String,
    /// Whether the widget currently occupies grid slots.
    pub enabled: bool,
    pub size: WidgetSize,
    /// Anchor (leftmost) slot in `0..SLOT_COUNT`. Stale when disabled.
    pub position: u8,
}

impl WidgetPlacement {
    pub fn new(id: impl Into<String>, enabled: bool, size: WidgetSize, position: u8) -> Self {
        Self {
            id: id.into(),
            enabled,
            size,
            position,
        }
    }

    /// Row this placement anchors in.
    pub fn row(&self) -> u8 {
        slot_coords(self.position).0
    }
}

/// Linear slot index for `(row, col)`. Defined for `row < GRID_ROWS`,
/// `col < GRID_COLS`.
pub const fn slot_index(row: u8, col: u8) -> u8 {
    row * GRID_COLS + col
}

/// `(row, col)` coordinates of a linear slot index.
pub const fn slot_coords(slot: u8) -> (u8, u8) {
    (slot / GRID_COLS, slot % GRID_COLS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_round_trip() {
        for slot in 0..SLOT_COUNT {
            let (row, col) = slot_coords(slot);
            assert!(row < GRID_ROWS);
            assert!(col < GRID_COLS);
            assert_eq!(slot_index(row, col), slot);
        }
    }

    #[test]
    fn spans_match_sizes() {
        assert_eq!(WidgetSize::Small.span(), 1);
        assert_eq!(WidgetSize::Medium.span(), 2);
        assert_eq!(WidgetSize::Large.span(), 3);
    }

    #[test]
    fn placement_serializes_lowercase_size() {
        let p = WidgetPlacement::new("steps", true, WidgetSize::Medium, 3);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"medium\""), "unexpected json: {json}");
        let back: WidgetPlacement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
