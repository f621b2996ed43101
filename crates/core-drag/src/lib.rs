//! Drag/placement controller: turns a continuous 2-D gesture stream into a
//! discrete slot move against the configuration store.
//!
//! One controller per widget instance, active only while the enclosing UI is
//! in edit mode. Phases: `Idle → Dragging → (Committing | Cancelling) → Idle`.
//! While dragging, accumulated translation from the gesture origin is mapped
//! to a candidate slot: once either axis exceeds [`COMMIT_THRESHOLD_PX`] the
//! widget's (row, col) shifts one step in the dominant direction, clamped to
//! grid bounds. The candidate is republished only when it changes, so
//! observers drawing a drop indicator see no redundant updates.
//!
//! A release below threshold, or a platform cancellation, springs the widget
//! back without ever touching the store. Only one widget drags at a time in
//! practice (single-touch gestures); the store still serializes its own
//! read-modify-write internally.

use core_grid::{GRID_COLS, GRID_ROWS, slot_coords, slot_index};
use core_store::{StoreError, WidgetConfigStore};
use tracing::{debug, trace};

/// Translation (px) on either axis past which a release commits. Tuned above
/// the initial gesture-recognition threshold to avoid jitter.
pub const COMMIT_THRESHOLD_PX: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
    Committing,
    Cancelling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    Commit { target: u8 },
    Cancel,
}

/// Spring used to settle the widget's visual transform back to identity.
/// Cosmetic only; no effect on the data model.
#[derive(Debug, Clone, Copy)]
pub struct SpringSpec {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl Default for SpringSpec {
    fn default() -> Self {
        Self {
            stiffness: 180.0,
            damping: 14.0,
            mass: 1.0,
        }
    }
}

/// Idle edit-mode wiggle (small oscillating rotation). Runs whenever edit
/// mode is on and this widget is not being dragged. Cosmetic only.
#[derive(Debug, Clone, Copy)]
pub struct WiggleSpec {
    pub amplitude_deg: f32,
    pub period_ms: u32,
}

impl Default for WiggleSpec {
    fn default() -> Self {
        Self {
            amplitude_deg: 2.0,
            period_ms: 300,
        }
    }
}

pub struct DragController {
    widget_id: String,
    phase: DragPhase,
    origin: u8,
    dx: f32,
    dy: f32,
    candidate: Option<u8>,
}

impl DragController {
    pub fn new(widget_id: impl Into<String>) -> Self {
        Self {
            widget_id: widget_id.into(),
            phase: DragPhase::Idle,
            origin: 0,
            dx: 0.0,
            dy: 0.0,
            candidate: None,
        }
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// Current drop-target candidate, if the translation is past threshold.
    pub fn candidate(&self) -> Option<u8> {
        self.candidate
    }

    /// Gesture-begin. Enters `Dragging` only from `Idle` and only in edit
    /// mode; returns whether the drag was accepted.
    pub fn begin(&mut self, origin_slot: u8, edit_mode: bool) -> bool {
        if !edit_mode || self.phase != DragPhase::Idle {
            return false;
        }
        self.phase = DragPhase::Dragging;
        self.origin = origin_slot;
        self.dx = 0.0;
        self.dy = 0.0;
        self.candidate = None;
        trace!(target: "drag", widget = %self.widget_id, origin = origin_slot, "drag_begin");
        true
    }

    /// Gesture update with the translation accumulated from the origin.
    /// Returns `true` when the candidate slot changed.
    pub fn update(&mut self, dx: f32, dy: f32) -> bool {
        if self.phase != DragPhase::Dragging {
            return false;
        }
        self.dx = dx;
        self.dy = dy;
        let next = self.candidate_for(dx, dy);
        if next == self.candidate {
            return false;
        }
        self.candidate = next;
        trace!(target: "drag", widget = %self.widget_id, candidate = ?next, "drag_candidate");
        true
    }

    /// Gesture-end. Commits when the final translation still exceeds the
    /// threshold and the candidate differs from the origin; otherwise
    /// cancels (spring back, no store mutation). An at-the-edge drag whose
    /// candidate clamped back onto the origin is deliberately treated as a
    /// cancel rather than a same-slot move: the store would no-op either
    /// way, this just skips the pointless round-trip.
    pub fn release(&mut self) -> DragOutcome {
        if self.phase != DragPhase::Dragging {
            return DragOutcome::Cancel;
        }
        let past_threshold =
            self.dx.abs() >= COMMIT_THRESHOLD_PX || self.dy.abs() >= COMMIT_THRESHOLD_PX;
        match self.candidate {
            Some(target) if past_threshold && target != self.origin => {
                self.phase = DragPhase::Committing;
                debug!(
                    target: "drag",
                    widget = %self.widget_id,
                    origin = self.origin,
                    slot = target,
                    "drag_commit"
                );
                DragOutcome::Commit { target }
            }
            _ => {
                self.phase = DragPhase::Cancelling;
                trace!(target: "drag", widget = %self.widget_id, "drag_cancel");
                DragOutcome::Cancel
            }
        }
    }

    /// Platform cancellation (interrupted gesture). Identical to a
    /// below-threshold release.
    pub fn cancel(&mut self) -> DragOutcome {
        if self.phase == DragPhase::Dragging {
            self.phase = DragPhase::Cancelling;
            trace!(target: "drag", widget = %self.widget_id, "drag_cancel");
        }
        DragOutcome::Cancel
    }

    /// Apply a committed move to the store. The controller stays in
    /// `Committing` until [`DragController::settle`] runs after the spring
    /// animation resolves.
    pub async fn commit(&mut self, store: &WidgetConfigStore) -> Result<(), StoreError> {
        debug_assert_eq!(self.phase, DragPhase::Committing, "commit outside Committing");
        let Some(target) = self.candidate else {
            return Ok(());
        };
        store.move_to_position(&self.widget_id, target).await
    }

    /// Spring animation finished (or store round-trip resolved): back to
    /// rest.
    pub fn settle(&mut self) {
        if matches!(self.phase, DragPhase::Committing | DragPhase::Cancelling) {
            self.phase = DragPhase::Idle;
            self.dx = 0.0;
            self.dy = 0.0;
            self.candidate = None;
        }
    }

    fn candidate_for(&self, dx: f32, dy: f32) -> Option<u8> {
        if dx.abs() < COMMIT_THRESHOLD_PX && dy.abs() < COMMIT_THRESHOLD_PX {
            return None;
        }
        let (row, col) = slot_coords(self.origin);
        let (row, col) = if dx.abs() >= dy.abs() {
            let col = if dx > 0.0 {
                (col + 1).min(GRID_COLS - 1)
            } else {
                col.saturating_sub(1)
            };
            (row, col)
        } else {
            let row = if dy > 0.0 {
                (row + 1).min(GRID_ROWS - 1)
            } else {
                row.saturating_sub(1)
            };
            (row, col)
        };
        Some(slot_index(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_store::MemoryStorage;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn begin_requires_edit_mode() {
        let mut drag = DragController::new("steps");
        assert!(!drag.begin(0, false));
        assert_eq!(drag.phase(), DragPhase::Idle);
        assert!(drag.begin(0, true));
        assert_eq!(drag.phase(), DragPhase::Dragging);
        // Re-entrant begin is rejected while dragging.
        assert!(!drag.begin(1, true));
    }

    #[test]
    fn candidate_follows_dominant_axis() {
        let mut drag = DragController::new("steps");
        drag.begin(0, true);
        assert!(drag.update(70.0, 10.0));
        assert_eq!(drag.candidate(), Some(1));
        // Vertical becomes dominant.
        assert!(drag.update(30.0, 80.0));
        assert_eq!(drag.candidate(), Some(3));
    }

    #[test]
    fn candidate_published_only_on_change() {
        let mut drag = DragController::new("steps");
        drag.begin(0, true);
        assert!(drag.update(70.0, 0.0));
        assert!(!drag.update(75.0, 5.0));
        assert!(!drag.update(90.0, 12.0));
    }

    #[test]
    fn candidate_clamps_at_grid_bounds() {
        let mut drag = DragController::new("steps");
        drag.begin(0, true);
        // Leftwards from column 0 clamps back onto the origin.
        drag.update(-90.0, 0.0);
        assert_eq!(drag.candidate(), Some(0));
        assert_eq!(drag.release(), DragOutcome::Cancel);

        let mut drag = DragController::new("hrv");
        drag.begin(5, true);
        drag.update(10.0, 90.0);
        assert_eq!(drag.candidate(), Some(5));
    }

    #[test]
    fn below_threshold_release_cancels() {
        let mut drag = DragController::new("steps");
        drag.begin(0, true);
        drag.update(40.0, 59.0);
        assert_eq!(drag.candidate(), None);
        assert_eq!(drag.release(), DragOutcome::Cancel);
        assert_eq!(drag.phase(), DragPhase::Cancelling);
        drag.settle();
        assert_eq!(drag.phase(), DragPhase::Idle);
    }

    #[test]
    fn platform_cancel_matches_below_threshold() {
        let mut drag = DragController::new("steps");
        drag.begin(0, true);
        drag.update(200.0, 0.0);
        assert_eq!(drag.cancel(), DragOutcome::Cancel);
        assert_eq!(drag.phase(), DragPhase::Cancelling);
    }

    #[tokio::test]
    async fn cancelled_drag_never_mutates_the_store() {
        let store = WidgetConfigStore::new(Arc::new(MemoryStorage::new()));
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = hits.clone();
            store.subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        let mut drag = DragController::new("steps");
        drag.begin(0, true);
        drag.update(40.0, 30.0);
        assert_eq!(drag.release(), DragOutcome::Cancel);
        drag.settle();

        assert_eq!(hits.load(Ordering::SeqCst), 0, "store was mutated");
    }

    #[tokio::test]
    async fn committed_drag_swaps_with_occupant() {
        let store = WidgetConfigStore::new(Arc::new(MemoryStorage::new()));

        let mut drag = DragController::new("steps");
        drag.begin(0, true);
        drag.update(80.0, 0.0);
        let outcome = drag.release();
        assert_eq!(outcome, DragOutcome::Commit { target: 1 });
        drag.commit(&store).await.unwrap();
        drag.settle();
        assert_eq!(drag.phase(), DragPhase::Idle);

        let placements = store.load().await;
        let by_id = |id: &str| placements.iter().find(|p| p.id == id).unwrap().position;
        assert_eq!(by_id("steps"), 1);
        assert_eq!(by_id("hydration"), 0);
    }
}
