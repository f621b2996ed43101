//! The dashboard configuration store: the persisted source of truth for
//! widget placements.
//!
//! One store instance is constructed at application start and injected into
//! every UI surface (no module-level singleton). Each mutation is a full
//! read-modify-write: load the complete array, deep-copy, mutate, serialize
//! atomically under the single fixed key, then fan out a payload-free
//! notification to all subscribers. Partial updates are deliberately not
//! supported; at dashboard scale (at most a handful of widgets) whole-array
//! replacement is simpler and keeps the persisted value self-consistent.
//!
//! The read-modify-write cycle is serialized by an internal async mutex.
//! Gesture-driven callers are naturally sequential already, but overlapping
//! async mutations (a resize racing a drag commit) would otherwise risk a
//! lost update.
//!
//! Error policy:
//! * read failures (missing key, corrupt JSON, backend error) fall back to
//!   the default layout and are never surfaced;
//! * write failures propagate as [`StoreError`] — losing one layout edit is
//!   non-critical and callers decide whether to retry;
//! * an invalid resize request is an expected state, not an error: the
//!   operation becomes a logged no-op and the persisted array is untouched.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use core_grid::{
    SLOT_COUNT, WidgetPlacement, WidgetSize, covered_slots, free_slots, is_valid_row_layout,
    slot_coords,
};

mod storage;
mod subscribe;

pub use storage::{FileStorage, MemoryStorage, StorageError, WidgetStorage};
pub use subscribe::SubscriptionId;

/// The single fixed key the placement array is persisted under.
pub const CONFIG_KEY: &str = "dashboard.widget_config";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The fixed 6-record layout used on first run and as the corrupt-state
/// fallback. Five widgets fill the grid; mindfulness ships disabled.
pub fn default_layout() -> Vec<WidgetPlacement> {
    vec![
        WidgetPlacement::new("steps", true, WidgetSize::Small, 0),
        WidgetPlacement::new("hydration", true, WidgetSize::Small, 1),
        WidgetPlacement::new("meditation", true, WidgetSize::Small, 2),
        WidgetPlacement::new("sleep", true, WidgetSize::Medium, 3),
        WidgetPlacement::new("hrv", true, WidgetSize::Small, 5),
        WidgetPlacement::new("mindfulness", false, WidgetSize::Small, 0),
    ]
}

pub struct WidgetConfigStore {
    storage: Arc<dyn WidgetStorage>,
    /// Serializes load → mutate → persist cycles against each other.
    rmw: tokio::sync::Mutex<()>,
    subscribers: subscribe::SubscriberRegistry,
}

impl WidgetConfigStore {
    pub fn new(storage: Arc<dyn WidgetStorage>) -> Self {
        Self {
            storage,
            rmw: tokio::sync::Mutex::new(()),
            subscribers: subscribe::SubscriberRegistry::default(),
        }
    }

    /// Current persisted placements, or the default layout when nothing
    /// usable is stored. Infallible: every read-side failure recovers to the
    /// default set.
    pub async fn load(&self) -> Vec<WidgetPlacement> {
        match self.storage.read(CONFIG_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<WidgetPlacement>>(&raw) {
                Ok(placements) if !placements.is_empty() => placements,
                Ok(_) => {
                    debug!(target: "store", "empty_config_fallback");
                    default_layout()
                }
                Err(err) => {
                    warn!(target: "store", error = %err, "corrupt_config_fallback");
                    default_layout()
                }
            },
            Ok(None) => default_layout(),
            Err(err) => {
                warn!(target: "store", error = %err, "read_failed_fallback");
                default_layout()
            }
        }
    }

    /// Register an observer. Notifications carry no payload; call
    /// [`WidgetConfigStore::load`] for a fresh snapshot.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }

    /// Flip `enabled` for `id`, leaving size and position untouched. No
    /// validation: toggling off is always legal, and toggling back on with a
    /// stale anchor is an accepted edge of this design.
    pub async fn toggle(&self, id: &str) -> Result<(), StoreError> {
        self.mutate("toggle", |placements| {
            let Some(p) = placements.iter_mut().find(|p| p.id == id) else {
                warn!(target: "store", widget = id, "toggle_unknown_widget");
                return false;
            };
            p.enabled = !p.enabled;
            true
        })
        .await
    }

    /// Force-enable `id` with the given size, optionally relocating it.
    /// Deliberately unvalidated: the permissive path for callers that already
    /// know a free slot.
    pub async fn enable(
        &self,
        id: &str,
        size: WidgetSize,
        position: Option<u8>,
    ) -> Result<(), StoreError> {
        self.mutate("enable", |placements| {
            let Some(p) = placements.iter_mut().find(|p| p.id == id) else {
                warn!(target: "store", widget = id, "enable_unknown_widget");
                return false;
            };
            p.enabled = true;
            p.size = size;
            if let Some(pos) = position {
                p.position = pos.min(SLOT_COUNT - 1);
            }
            true
        })
        .await
    }

    /// The validated mutation path. Simulates the final configuration
    /// (including the conflict-resolution ripple) and validates the affected
    /// row; an illegal result leaves the persisted array byte-for-byte
    /// unchanged. Growing a widget disables every other enabled widget in
    /// the row whose covered slots intersect the enlarged range — a Large
    /// always clears its row.
    pub async fn change_size(&self, id: &str, new_size: WidgetSize) -> Result<(), StoreError> {
        self.mutate("change_size", |placements| {
            let Some(idx) = placements.iter().position(|p| p.id == id) else {
                warn!(target: "store", widget = id, "change_size_unknown_widget");
                return false;
            };
            let old_span = placements[idx].size.span();
            let row = placements[idx].row();

            let mut simulated = placements.clone();
            simulated[idx].size = new_size;
            // A disabled widget's anchor is stale; growing it must not touch
            // the row it happens to point at. Its size still updates.
            if placements[idx].enabled && new_size.span() > old_span {
                disable_row_conflicts(&mut simulated, idx);
            }
            if !is_valid_row_layout(&simulated, id, new_size, row) {
                warn!(
                    target: "store.layout",
                    widget = id,
                    row,
                    requested = ?new_size,
                    "resize_rejected"
                );
                return false;
            }
            *placements = simulated;
            true
        })
        .await
    }

    /// Unconditional replace-and-persist. Used by the drag controller once a
    /// legal target has already been computed.
    pub async fn reorder(&self, placements: Vec<WidgetPlacement>) -> Result<(), StoreError> {
        let _guard = self.rmw.lock().await;
        self.persist("reorder", &placements).await
    }

    /// Exchange the two widgets' positions; sizes untouched, no validation
    /// (callers guarantee the pair was already mutually legal).
    pub async fn swap(&self, id_a: &str, id_b: &str) -> Result<(), StoreError> {
        self.mutate("swap", |placements| {
            let Some(a) = placements.iter().position(|p| p.id == id_a) else {
                warn!(target: "store", widget = id_a, "swap_unknown_widget");
                return false;
            };
            let Some(b) = placements.iter().position(|p| p.id == id_b) else {
                warn!(target: "store", widget = id_b, "swap_unknown_widget");
                return false;
            };
            let pos_a = placements[a].position;
            placements[a].position = placements[b].position;
            placements[b].position = pos_a;
            true
        })
        .await
    }

    /// Relocate `id` to `new_pos`, swapping with a different enabled widget
    /// anchored there if any. No span validation; the drag controller only
    /// offers legal single-slot destinations.
    pub async fn move_to_position(&self, id: &str, new_pos: u8) -> Result<(), StoreError> {
        self.mutate("move_to_position", |placements| {
            if new_pos >= SLOT_COUNT {
                warn!(target: "store", widget = id, new_pos, "move_out_of_range");
                return false;
            }
            let Some(idx) = placements.iter().position(|p| p.id == id) else {
                warn!(target: "store", widget = id, "move_unknown_widget");
                return false;
            };
            let old_pos = placements[idx].position;
            if old_pos == new_pos {
                return false;
            }
            if let Some(occupant) = placements
                .iter()
                .position(|p| p.id != id && p.enabled && p.position == new_pos)
            {
                placements[occupant].position = old_pos;
            }
            placements[idx].position = new_pos;
            true
        })
        .await
    }

    /// Disable `id`; its slots become reusable. The record itself is kept.
    pub async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.mutate("remove", |placements| {
            let Some(p) = placements.iter_mut().find(|p| p.id == id) else {
                warn!(target: "store", widget = id, "remove_unknown_widget");
                return false;
            };
            p.enabled = false;
            true
        })
        .await
    }

    /// Add or re-enable a widget. An existing record is re-enabled and
    /// resized, trying `preferred` first and then scanning free slots whose
    /// row accepts the size. An unknown id appends a new record at the first
    /// accepted free slot — or at slot 0 when the grid is full, which can
    /// produce an overlapping configuration (kept for compatibility; a
    /// capacity warning is logged).
    pub async fn add(
        &self,
        id: &str,
        size: WidgetSize,
        preferred: Option<u8>,
    ) -> Result<(), StoreError> {
        self.mutate("add", |placements| {
            let chosen = preferred
                .filter(|&slot| slot < SLOT_COUNT && slot_accepts(placements, id, size, slot))
                .or_else(|| {
                    free_slots(placements)
                        .into_iter()
                        .find(|&slot| slot_accepts(placements, id, size, slot))
                });

            match placements.iter_mut().find(|p| p.id == id) {
                Some(p) => {
                    p.enabled = true;
                    p.size = size;
                    match chosen {
                        Some(slot) => p.position = slot,
                        // Re-enable in place; the stale anchor may overlap.
                        None => warn!(target: "store", widget = id, "add_no_free_slot"),
                    }
                }
                None => {
                    let slot = chosen.unwrap_or_else(|| {
                        warn!(target: "store", widget = id, "capacity_exceeded_slot0_fallback");
                        0
                    });
                    placements.push(WidgetPlacement::new(id, true, size, slot));
                }
            }
            true
        })
        .await
    }

    async fn mutate<F>(&self, op: &'static str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<WidgetPlacement>) -> bool,
    {
        let _guard = self.rmw.lock().await;
        let mut placements = self.load().await;
        if !apply(&mut placements) {
            // Expected no-op (rejected or unknown target); nothing persisted,
            // nobody notified.
            return Ok(());
        }
        self.persist(op, &placements).await
    }

    async fn persist(&self, op: &'static str, placements: &[WidgetPlacement]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(placements)?;
        self.storage.write(CONFIG_KEY, &raw).await?;
        debug!(target: "store", op, widgets = placements.len(), "config_persisted");
        self.subscribers.notify();
        Ok(())
    }
}

/// Disable every other enabled widget sharing the grown widget's row whose
/// covered slots intersect the grown widget's new covered range.
fn disable_row_conflicts(placements: &mut [WidgetPlacement], grown: usize) {
    let row = placements[grown].row();
    let grown_covered: BTreeSet<u8> = covered_slots(&placements[grown]).into_iter().collect();
    let grown_id = placements[grown].id.clone();
    for p in placements.iter_mut() {
        if p.id == grown_id || !p.enabled || p.row() != row {
            continue;
        }
        if covered_slots(p).iter().any(|s| grown_covered.contains(s)) {
            debug!(target: "store.layout", widget = %p.id, "conflict_disabled");
            p.enabled = false;
        }
    }
}

/// Would `id` (enabled, at `size`) fit at `slot` without overlapping another
/// enabled widget and without breaking the row invariants?
fn slot_accepts(placements: &[WidgetPlacement], id: &str, size: WidgetSize, slot: u8) -> bool {
    let candidate = WidgetPlacement::new(id, true, size, slot);
    let occupied: BTreeSet<u8> = placements
        .iter()
        .filter(|p| p.enabled && p.id != id)
        .flat_map(|p| covered_slots(p))
        .collect();
    if covered_slots(&candidate).iter().any(|s| occupied.contains(s)) {
        return false;
    }
    let (row, _) = slot_coords(slot);
    let mut simulated: Vec<WidgetPlacement> =
        placements.iter().filter(|p| p.id != id).cloned().collect();
    simulated.push(candidate);
    is_valid_row_layout(&simulated, id, size, row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_legal_and_full() {
        let layout = default_layout();
        assert_eq!(layout.len(), 6);
        let occupied = core_grid::occupied_slots(&layout);
        assert_eq!(occupied.len(), SLOT_COUNT as usize);
        for p in layout.iter().filter(|p| p.enabled) {
            assert!(is_valid_row_layout(&layout, &p.id, p.size, p.row()));
        }
    }

    #[test]
    fn slot_accepts_rejects_covered_overlap() {
        // Row 0: small anchored at column 1. A medium at column 0 would cover
        // slots {0,1} and collide even though the span sum stays legal.
        let placements = vec![WidgetPlacement::new("hrv", true, WidgetSize::Small, 1)];
        assert!(!slot_accepts(&placements, "sleep", WidgetSize::Medium, 0));
        assert!(slot_accepts(&placements, "sleep", WidgetSize::Medium, 3));
    }
}
