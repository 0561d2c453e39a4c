//! Event reconciliation: merging the notification stream into a local
//! working set.
//!
//! [`NearbyView`] owns a map of dip id to last-known snapshot -- the
//! "searchable" view a client renders. The stream it consumes is
//! unordered, at-least-once, and possibly duplicated, so every merge is
//! "replace by id" guarded by `updated_at`: a snapshot older than the
//! locally held one is discarded. Removals leave a timestamp tombstone
//! behind, so a direct call result (e.g. the caller's own successful
//! claim, which removes the dip from the searchable view) cannot be
//! clobbered by a late-arriving pre-claim notification.

use std::collections::HashMap;

use dibs_core::types::{DbId, Timestamp};
use dibs_db::models::dip::Dip;

use crate::bus::{DipEvent, DipEventKind};

/// An owned, locally consistent working set of active dips.
#[derive(Debug, Default)]
pub struct NearbyView {
    dips: HashMap<DbId, Dip>,
    /// `updated_at` high-water marks for ids no longer in the set.
    /// Bounded by the ids seen in one client session.
    removed: HashMap<DbId, Timestamp>,
}

impl NearbyView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole view from a fresh query result. Non-active rows
    /// are skipped -- the searchable view only ever holds `active` dips.
    /// Tombstones are kept: the query may have raced an in-flight
    /// mutation the view already knows about.
    pub fn seed<I: IntoIterator<Item = Dip>>(&mut self, dips: I) {
        self.dips.clear();
        for dip in dips {
            if dip.is_active() && !self.is_stale(dip.id, dip.updated_at) {
                self.removed.remove(&dip.id);
                self.dips.insert(dip.id, dip);
            }
        }
    }

    /// Merge one notification. Returns `true` if the view changed.
    pub fn apply(&mut self, event: &DipEvent) -> bool {
        match event.kind {
            // An insert is only "new" to the viewer while active; a
            // claimed/expired/completed insert is history, not a result.
            DipEventKind::Insert | DipEventKind::Update => self.merge(&event.dip),
            DipEventKind::Delete => self.remove(event.dip.id, event.dip.updated_at),
        }
    }

    /// Merge a snapshot returned directly by a call (create, claim,
    /// complete, ...). Same rules as a notification; the staleness guard
    /// then shields it from older notifications arriving later.
    pub fn apply_snapshot(&mut self, dip: &Dip) -> bool {
        self.merge(dip)
    }

    fn merge(&mut self, dip: &Dip) -> bool {
        if self.is_stale(dip.id, dip.updated_at) {
            return false;
        }
        if dip.is_active() {
            self.removed.remove(&dip.id);
            self.dips.insert(dip.id, dip.clone());
            true
        } else {
            // Leaving `active` means leaving the searchable view; the
            // entry is removed rather than shown with a new status.
            self.remove(dip.id, dip.updated_at)
        }
    }

    /// Drop `id`, recording the newest timestamp seen for it so older
    /// snapshots cannot resurrect the entry. Deletes are unconditional
    /// with respect to presence, but still advance the high-water mark.
    fn remove(&mut self, id: DbId, updated_at: Timestamp) -> bool {
        let held = self.dips.remove(&id);
        let mark = self
            .removed
            .get(&id)
            .copied()
            .into_iter()
            .chain(held.as_ref().map(|d| d.updated_at))
            .chain(std::iter::once(updated_at))
            .max()
            .unwrap_or(updated_at);
        self.removed.insert(id, mark);
        held.is_some()
    }

    /// Whether a snapshot with `updated_at` is older than what the view
    /// already knows for `id` (present entry or tombstone).
    fn is_stale(&self, id: DbId, updated_at: Timestamp) -> bool {
        let held = self.dips.get(&id).map(|d| d.updated_at);
        let tombstone = self.removed.get(&id).copied();
        match held.into_iter().chain(tombstone).max() {
            Some(known) => updated_at < known,
            None => false,
        }
    }

    pub fn get(&self, id: DbId) -> Option<&Dip> {
        self.dips.get(&id)
    }

    pub fn len(&self) -> usize {
        self.dips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dips.is_empty()
    }

    /// Iterate over the current working set, no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Dip> {
        self.dips.values()
    }
}
