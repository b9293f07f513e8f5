use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::MarkerUpdateError;
use crate::geo::LatLng;
use crate::map::{MapHost, MarkerKey, MarkerLayer, MarkerSpec};
use crate::markers::icon::{icon_for, selection_icon, user_icon, IconDescriptor};
use crate::model::{SelectionPoint, TreeId, TreeRecord, UserPosition};

/// An owned reference to one marker on the host
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerHandle {
    pub key: MarkerKey,
    pub position: LatLng,
    pub icon: IconDescriptor,
}

impl MarkerHandle {
    pub fn glows(&self) -> bool {
        self.icon.glow.is_some()
    }
}

/// Handle plus the record value it was rendered from
struct TreeEntry {
    handle: MarkerHandle,
    rendered: TreeRecord,
}

/// Host calls made by one registry operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub removed: usize,
    /// Records recreated because an attribute changed (counted once, not in created/removed)
    pub replaced: usize,
    pub skipped: usize,
}

impl SyncReport {
    /// Zero visual churn
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.removed == 0 && self.replaced == 0
    }
}

/// Single-slot marker (user position, selection pin)
struct SingleSlot<T> {
    value: T,
    handle: MarkerHandle,
}

/// Live marker handles per category, diffed against each incoming snapshot
#[derive(Default)]
pub struct MarkerRegistry {
    trees: HashMap<TreeId, TreeEntry>,
    /// Records the host refused, kept until they change or leave the snapshot
    rejected: HashMap<TreeId, TreeRecord>,
    by_key: HashMap<MarkerKey, TreeId>,
    user: Option<SingleSlot<UserPosition>>,
    selection: Option<SingleSlot<SelectionPoint>>,
}

fn place<H: MapHost>(
    host: &mut H,
    layer: MarkerLayer,
    position: LatLng,
    icon: IconDescriptor,
    tooltip: String,
) -> Result<MarkerHandle, MarkerUpdateError> {
    let key = host.add_marker(MarkerSpec {
        layer,
        position,
        icon,
        tooltip,
    })?;
    Ok(MarkerHandle {
        key,
        position,
        icon,
    })
}

/// Field equality that also matches identical NaN coordinates
fn same_record(a: &TreeRecord, b: &TreeRecord) -> bool {
    a.id == b.id
        && a.kind == b.kind
        && a.species == b.species
        && a.in_season == b.in_season
        && a.tooltip == b.tooltip
        && a.position.lat.to_bits() == b.position.lat.to_bits()
        && a.position.lng.to_bits() == b.position.lng.to_bits()
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff the tree markers against a full snapshot.
    ///
    /// New ids get a marker, missing ids lose theirs, and ids whose record
    /// changed in any way get a fresh marker. Unchanged ids are not touched.
    /// A record that can't be placed is logged and skipped, and not offered
    /// to the host again until it changes.
    pub fn upsert_tree_markers<H: MapHost>(
        &mut self,
        host: &mut H,
        records: &[TreeRecord],
    ) -> SyncReport {
        let mut report = SyncReport::default();

        // Last occurrence wins on duplicate ids
        let mut latest: HashMap<TreeId, &TreeRecord> = HashMap::with_capacity(records.len());
        for record in records {
            if latest.insert(record.id, record).is_some() {
                warn!(id = %record.id, "duplicate tree id in snapshot, keeping the last one");
            }
        }

        let stale: Vec<TreeId> = self
            .trees
            .keys()
            .filter(|id| !latest.contains_key(id))
            .copied()
            .collect();
        for id in stale {
            if let Some(entry) = self.trees.remove(&id) {
                self.by_key.remove(&entry.handle.key);
                host.remove_marker(entry.handle.key);
                report.removed += 1;
                debug!(%id, "removed tree marker");
            }
        }
        self.rejected.retain(|id, _| latest.contains_key(id));

        // Walk the snapshot in input order so marker creation is deterministic
        for record in records {
            if !std::ptr::eq(latest[&record.id], record) {
                continue;
            }
            if self.rejected.get(&record.id).is_some_and(|old| same_record(old, record)) {
                continue;
            }
            let replacing = match self.trees.get(&record.id) {
                Some(entry) if entry.rendered == *record => continue,
                Some(entry) => {
                    let key = entry.handle.key;
                    self.by_key.remove(&key);
                    self.trees.remove(&record.id);
                    host.remove_marker(key);
                    true
                }
                None => false,
            };

            let icon = icon_for(&record.kind, record.in_season);
            match place(host, MarkerLayer::Tree, record.position, icon, record.tooltip.clone()) {
                Ok(handle) => {
                    self.rejected.remove(&record.id);
                    self.by_key.insert(handle.key, record.id);
                    self.trees.insert(
                        record.id,
                        TreeEntry {
                            handle,
                            rendered: record.clone(),
                        },
                    );
                    if replacing {
                        report.replaced += 1;
                        debug!(id = %record.id, "recreated tree marker");
                    } else {
                        report.created += 1;
                        debug!(id = %record.id, kind = %record.kind, "created tree marker");
                    }
                }
                Err(err) => {
                    if replacing {
                        report.removed += 1;
                    }
                    report.skipped += 1;
                    self.rejected.insert(record.id, record.clone());
                    warn!(id = %record.id, %err, "skipping tree marker");
                }
            }
        }

        report
    }

    /// Replace the viewer's marker; `None` removes it
    pub fn set_user_marker<H: MapHost>(
        &mut self,
        host: &mut H,
        position: Option<UserPosition>,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        if self.user.as_ref().map(|s| s.value) == position {
            return report;
        }
        if let Some(old) = self.user.take() {
            host.remove_marker(old.handle.key);
            report.removed += 1;
        }
        if let Some(value) = position {
            match place(host, MarkerLayer::User, value.position, user_icon(value.is_default), value.label().to_string()) {
                Ok(handle) => {
                    self.user = Some(SingleSlot { value, handle });
                    report.created += 1;
                }
                Err(err) => {
                    report.skipped += 1;
                    warn!(%err, "skipping user marker");
                }
            }
        }
        report
    }

    /// Replace the selection pin; `None` removes it
    pub fn set_selection_marker<H: MapHost>(
        &mut self,
        host: &mut H,
        point: Option<SelectionPoint>,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        if self.selection.as_ref().map(|s| s.value) == point {
            return report;
        }
        if let Some(old) = self.selection.take() {
            host.remove_marker(old.handle.key);
            report.removed += 1;
        }
        if let Some(value) = point {
            match place(host, MarkerLayer::Selection, value, selection_icon(), "Selected Location".to_string()) {
                Ok(handle) => {
                    self.selection = Some(SingleSlot { value, handle });
                    report.created += 1;
                }
                Err(err) => {
                    report.skipped += 1;
                    warn!(%err, "skipping selection marker");
                }
            }
        }
        report
    }

    /// Remove every marker this registry owns
    pub fn clear_all<H: MapHost>(&mut self, host: &mut H) -> SyncReport {
        let mut report = SyncReport::default();
        for (_, entry) in self.trees.drain() {
            host.remove_marker(entry.handle.key);
            report.removed += 1;
        }
        self.by_key.clear();
        self.rejected.clear();
        report.removed += self.set_user_marker(host, None).removed;
        report.removed += self.set_selection_marker(host, None).removed;
        report
    }

    pub fn tree_ids(&self) -> HashSet<TreeId> {
        self.trees.keys().copied().collect()
    }

    pub fn tree_handle(&self, id: TreeId) -> Option<&MarkerHandle> {
        self.trees.get(&id).map(|e| &e.handle)
    }

    /// Tree behind a host marker, for click hit tests
    pub fn tree_for_key(&self, key: MarkerKey) -> Option<&TreeRecord> {
        let id = self.by_key.get(&key)?;
        self.trees.get(id).map(|e| &e.rendered)
    }

    pub fn user_handle(&self) -> Option<&MarkerHandle> {
        self.user.as_ref().map(|s| &s.handle)
    }

    pub fn selection_handle(&self) -> Option<&MarkerHandle> {
        self.selection.as_ref().map(|s| &s.handle)
    }

    /// Total live handles across all categories
    pub fn len(&self) -> usize {
        self.trees.len() + usize::from(self.user.is_some()) + usize::from(self.selection.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingHost;
    use proptest::prelude::*;

    fn lemon_and_fig() -> Vec<TreeRecord> {
        vec![
            TreeRecord::new(1, "Lemon", "Citrus limon", LatLng::new(-34.6037, -58.3816), true),
            TreeRecord::new(2, "Fig", "Ficus carica", LatLng::new(-34.6057, -58.3845), false),
        ]
    }

    fn ids(records: &[TreeRecord]) -> HashSet<TreeId> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_lemon_and_fig_scenario() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        let report = registry.upsert_tree_markers(&mut host, &lemon_and_fig());

        assert_eq!(report.created, 2);
        assert_eq!(registry.len(), 2);
        assert!(registry.tree_handle(TreeId(1)).unwrap().glows());
        assert!(!registry.tree_handle(TreeId(2)).unwrap().glows());
        assert_eq!(host.live_markers(), 2);
    }

    #[test]
    fn test_identical_snapshot_is_noop() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        registry.upsert_tree_markers(&mut host, &lemon_and_fig());
        let calls = host.call_count();

        let report = registry.upsert_tree_markers(&mut host, &lemon_and_fig());
        assert!(report.is_noop());
        assert_eq!(host.call_count(), calls);
    }

    #[test]
    fn test_missing_ids_are_removed() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        let trees = lemon_and_fig();
        registry.upsert_tree_markers(&mut host, &trees);

        let report = registry.upsert_tree_markers(&mut host, &trees[..1]);
        assert_eq!(report.removed, 1);
        assert_eq!(registry.tree_ids(), ids(&trees[..1]));
        assert_eq!(host.live_markers(), 1);
    }

    #[test]
    fn test_season_flip_recreates_marker() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        let mut trees = lemon_and_fig();
        registry.upsert_tree_markers(&mut host, &trees);
        let old_key = registry.tree_handle(TreeId(2)).unwrap().key;

        trees[1].in_season = true;
        let report = registry.upsert_tree_markers(&mut host, &trees);
        assert_eq!(report.replaced, 1);
        assert_eq!(report.created + report.removed, 0);

        let handle = registry.tree_handle(TreeId(2)).unwrap();
        assert_ne!(handle.key, old_key);
        assert!(handle.glows());
        assert_eq!(host.live_markers(), 2);
    }

    #[test]
    fn test_bad_coordinates_skip_only_that_record() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        let mut trees = lemon_and_fig();
        trees.push(TreeRecord::new(3, "Olive", "Olea europaea", LatLng::new(f64::NAN, 0.0), true));

        let report = registry.upsert_tree_markers(&mut host, &trees);
        assert_eq!(report.created, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(registry.tree_ids(), ids(&trees[..2]));
    }

    #[test]
    fn test_rejected_record_is_not_retried_until_it_changes() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        let mut trees = vec![
            TreeRecord::new(1, "Lemon", "Citrus limon", LatLng::new(-34.6037, -58.3816), true),
            TreeRecord::new(2, "Olive", "Olea europaea", LatLng::new(f64::NAN, 0.0), false),
        ];
        registry.upsert_tree_markers(&mut host, &trees);
        let calls = host.call_count();

        let report = registry.upsert_tree_markers(&mut host, &trees);
        assert_eq!(report, SyncReport::default());
        assert_eq!(host.call_count(), calls);

        // Fixed coordinates are placed on the next pass
        trees[1].position = LatLng::new(-34.61, -58.39);
        let report = registry.upsert_tree_markers(&mut host, &trees);
        assert_eq!(report.created, 1);
        assert_eq!(host.live_markers(), 2);
    }

    #[test]
    fn test_rejected_record_is_retried_after_leaving_snapshot() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        let bad = vec![TreeRecord::new(7, "Fig", "Ficus carica", LatLng::new(91.0, 0.0), true)];
        registry.upsert_tree_markers(&mut host, &bad);
        registry.upsert_tree_markers(&mut host, &[]);

        let report = registry.upsert_tree_markers(&mut host, &bad);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_duplicate_ids_keep_last() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        let mut trees = lemon_and_fig();
        trees.push(TreeRecord::new(1, "Plum", "Prunus domestica", LatLng::new(-34.6, -58.38), false));

        registry.upsert_tree_markers(&mut host, &trees);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tree_handle(TreeId(1)).unwrap().icon, icon_for("Plum", false));
    }

    #[test]
    fn test_user_marker_single_slot() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        let a = UserPosition::fix(LatLng::new(1.0, 1.0));
        let b = UserPosition::fix(LatLng::new(2.0, 2.0));

        registry.set_user_marker(&mut host, Some(a));
        registry.set_user_marker(&mut host, Some(b));
        assert_eq!(host.live_markers(), 1);
        assert_eq!(registry.user_handle().unwrap().position, b.position);

        let calls = host.call_count();
        assert!(registry.set_user_marker(&mut host, Some(b)).is_noop());
        assert_eq!(host.call_count(), calls);

        registry.set_user_marker(&mut host, None);
        assert!(registry.user_handle().is_none());
        assert_eq!(host.live_markers(), 0);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        registry.set_user_marker(&mut host, Some(UserPosition::fallback(LatLng::new(1.0, 1.0))));
        registry.set_selection_marker(&mut host, Some(LatLng::new(3.0, 3.0)));
        registry.set_selection_marker(&mut host, None);

        assert!(registry.user_handle().is_some());
        assert!(registry.selection_handle().is_none());
        assert_eq!(host.live_markers(), 1);
    }

    #[test]
    fn test_clear_all() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        registry.upsert_tree_markers(&mut host, &lemon_and_fig());
        registry.set_user_marker(&mut host, Some(UserPosition::fix(LatLng::new(1.0, 1.0))));
        registry.set_selection_marker(&mut host, Some(LatLng::new(3.0, 3.0)));

        let report = registry.clear_all(&mut host);
        assert_eq!(report.removed, 4);
        assert!(registry.is_empty());
        assert_eq!(host.live_markers(), 0);
        assert!(registry.clear_all(&mut host).is_noop());
    }

    #[test]
    fn test_tree_for_key() {
        let mut host = RecordingHost::new();
        let mut registry = MarkerRegistry::new();
        registry.upsert_tree_markers(&mut host, &lemon_and_fig());
        let key = registry.tree_handle(TreeId(2)).unwrap().key;
        assert_eq!(registry.tree_for_key(key).unwrap().kind, "Fig");
    }

    /// Snapshots with roughly one in ten records at an unplaceable position
    fn arb_snapshot() -> impl Strategy<Value = Vec<TreeRecord>> {
        let record = (0usize..4, any::<bool>(), prop::bool::weighted(0.9));
        prop::collection::btree_map(0u64..64, record, 0..24).prop_map(|m| {
            const KINDS: [&str; 4] = ["Lemon", "Fig", "Olive", "Durian"];
            m.into_iter()
                .map(|(id, (kind, in_season, placeable))| {
                    let lat = if placeable { -34.6 + id as f64 * 1e-3 } else { f64::NAN };
                    TreeRecord::new(id, KINDS[kind], "sp.", LatLng::new(lat, -58.4), in_season)
                })
                .collect()
        })
    }

    fn placeable(records: &[TreeRecord]) -> Vec<TreeRecord> {
        records.iter().filter(|r| r.position.is_valid()).cloned().collect()
    }

    proptest! {
        #[test]
        fn prop_handles_match_snapshot(snapshots in prop::collection::vec(arb_snapshot(), 1..6)) {
            let mut host = RecordingHost::new();
            let mut registry = MarkerRegistry::new();
            for snapshot in &snapshots {
                registry.upsert_tree_markers(&mut host, snapshot);
                let placed = placeable(snapshot);
                prop_assert_eq!(registry.tree_ids(), ids(&placed));
                prop_assert_eq!(host.live_markers(), placed.len());
                for record in &placed {
                    let handle = registry.tree_handle(record.id).unwrap();
                    prop_assert_eq!(handle.icon, icon_for(&record.kind, record.in_season));
                }
            }
        }

        #[test]
        fn prop_resync_is_idempotent(snapshot in arb_snapshot()) {
            let mut host = RecordingHost::new();
            let mut registry = MarkerRegistry::new();
            registry.upsert_tree_markers(&mut host, &snapshot);
            let calls = host.call_count();
            prop_assert!(registry.upsert_tree_markers(&mut host, &snapshot).is_noop());
            prop_assert_eq!(host.call_count(), calls);
        }
    }
}
