use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace};

use crate::error::InitializationError;
use crate::geo::LatLng;
use crate::map::MapHost;
use crate::markers::{MarkerRegistry, SyncReport};
use crate::model::{SelectionPoint, TreeRecord, UserPosition};

/// Buenos Aires, where the first trees were mapped
pub const DEFAULT_CENTER: LatLng = LatLng::new(-34.6037, -58.3816);
pub const DEFAULT_ZOOM: u8 = 13;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Mount-time configuration of a map view
#[derive(Clone, Debug)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: u8,
    /// Clicks pick a location instead of only panning
    pub selectable: bool,
    /// Wait before the first forced layout pass; zero runs it immediately
    pub settle_delay: Duration,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            selectable: false,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// A full snapshot of one of the three inputs
#[derive(Clone, Debug, PartialEq)]
pub enum MapInput {
    Trees(Vec<TreeRecord>),
    UserPosition(Option<UserPosition>),
    Selection(Option<SelectionPoint>),
}

/// Reported back to whoever embeds the map
#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    LocationSelected(LatLng),
    TreeSelected(TreeRecord),
}

/// Identifies one host acquisition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready,
    Failed,
    TornDown,
}

struct Live<H> {
    host: H,
    registry: MarkerRegistry,
    settle_at: Option<Instant>,
    resize_pending: bool,
}

enum State<H> {
    Uninitialized,
    Loading(LoadTicket),
    Ready(Live<H>),
    Failed(InitializationError),
    TornDown,
}

/// Inputs changed since the last sync pass
#[derive(Clone, Copy, Default)]
struct Dirty {
    trees: bool,
    user: bool,
    selection: bool,
}

/// Owns the host and the marker registry, and keeps both in step with
/// the latest tree, user and selection snapshots.
pub struct SyncController<H> {
    options: MapOptions,
    state: State<H>,
    trees: Vec<TreeRecord>,
    user: Option<UserPosition>,
    selection: Option<SelectionPoint>,
    dirty: Dirty,
    next_ticket: u64,
    events: Sender<MapEvent>,
}

impl<H: MapHost> SyncController<H> {
    pub fn new(options: MapOptions) -> (Self, Receiver<MapEvent>) {
        let (events, rx) = mpsc::channel();
        let controller = Self {
            options,
            state: State::Uninitialized,
            trees: Vec::new(),
            user: None,
            selection: None,
            dirty: Dirty::default(),
            next_ticket: 0,
            events,
        };
        (controller, rx)
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Uninitialized => Phase::Uninitialized,
            State::Loading(_) => Phase::Loading,
            State::Ready(_) => Phase::Ready,
            State::Failed(_) => Phase::Failed,
            State::TornDown => Phase::TornDown,
        }
    }

    pub fn error(&self) -> Option<&InitializationError> {
        match &self.state {
            State::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn host(&self) -> Option<&H> {
        match &self.state {
            State::Ready(live) => Some(&live.host),
            _ => None,
        }
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        match &mut self.state {
            State::Ready(live) => Some(&mut live.host),
            _ => None,
        }
    }

    pub fn registry(&self) -> Option<&MarkerRegistry> {
        match &self.state {
            State::Ready(live) => Some(&live.registry),
            _ => None,
        }
    }

    pub fn trees(&self) -> &[TreeRecord] {
        &self.trees
    }

    pub fn user_position(&self) -> Option<UserPosition> {
        self.user
    }

    pub fn selection(&self) -> Option<SelectionPoint> {
        self.selection
    }

    /// Start acquiring a host. Only one acquisition per mount.
    pub fn begin_loading(&mut self) -> Option<LoadTicket> {
        match self.state {
            State::Uninitialized => {
                self.next_ticket += 1;
                let ticket = LoadTicket(self.next_ticket);
                self.state = State::Loading(ticket);
                info!("map host loading");
                Some(ticket)
            }
            _ => None,
        }
    }

    /// Finish an acquisition started by `begin_loading`.
    ///
    /// A host arriving after teardown, or for another ticket, is dropped
    /// without being touched.
    pub fn complete_loading(&mut self, ticket: LoadTicket, result: Result<H, InitializationError>) {
        match self.state {
            State::Loading(current) if current == ticket => {}
            _ => {
                debug!(?ticket, phase = ?self.phase(), "discarding host for inactive mount");
                return;
            }
        }

        let mut host = match result {
            Ok(host) => host,
            Err(err) => {
                error!(%err, "map host failed to initialize");
                self.state = State::Failed(err);
                return;
            }
        };

        if self.options.selectable {
            let events = self.events.clone();
            host.register_click_handler(Box::new(move |point| {
                let _ = events.send(MapEvent::LocationSelected(point));
            }));
        }

        let settle_at = if self.options.settle_delay.is_zero() {
            host.invalidate_size();
            None
        } else {
            Some(Instant::now() + self.options.settle_delay)
        };

        self.state = State::Ready(Live {
            host,
            registry: MarkerRegistry::new(),
            settle_at,
            resize_pending: false,
        });
        info!(selectable = self.options.selectable, "map host ready");

        // Everything received while loading is applied now
        self.dirty = Dirty {
            trees: true,
            user: true,
            selection: true,
        };
        self.sync();
    }

    /// Push a new snapshot of one input
    pub fn notify(&mut self, input: MapInput) {
        if matches!(self.state, State::Failed(_) | State::TornDown) {
            trace!(phase = ?self.phase(), "ignoring map input");
            return;
        }

        match input {
            MapInput::Trees(trees) => {
                if trees != self.trees {
                    self.trees = trees;
                    self.dirty.trees = true;
                }
            }
            MapInput::UserPosition(user) => {
                if user != self.user {
                    self.user = user;
                    self.dirty.user = true;
                }
            }
            MapInput::Selection(selection) => {
                if selection != self.selection {
                    self.selection = selection;
                    self.dirty.selection = true;
                }
            }
        }

        self.sync();
    }

    /// One synchronization pass over every dirty input. Recentering happens
    /// once, after all registry slots are updated.
    fn sync(&mut self) -> SyncReport {
        let State::Ready(live) = &mut self.state else {
            return SyncReport::default();
        };
        let dirty = std::mem::take(&mut self.dirty);
        let mut report = SyncReport::default();
        let mut recenter = None;

        if dirty.trees {
            let r = live.registry.upsert_tree_markers(&mut live.host, &self.trees);
            report.created += r.created;
            report.removed += r.removed;
            report.replaced += r.replaced;
            report.skipped += r.skipped;
        }

        if dirty.user {
            let r = live.registry.set_user_marker(&mut live.host, self.user);
            report.created += r.created;
            report.removed += r.removed;
            report.skipped += r.skipped;
            if let Some(user) = self.user.filter(|u| !u.is_default) {
                recenter = Some(user.position);
            }
        }

        if dirty.selection && self.options.selectable {
            let r = live.registry.set_selection_marker(&mut live.host, self.selection);
            report.created += r.created;
            report.removed += r.removed;
            report.skipped += r.skipped;
            if let Some(point) = self.selection {
                recenter = Some(point);
            }
        }

        if let Some(center) = recenter {
            live.host.set_view(center, self.options.zoom);
        }

        if !report.is_noop() || report.skipped > 0 {
            debug!(
                created = report.created,
                removed = report.removed,
                replaced = report.replaced,
                skipped = report.skipped,
                "markers synchronized"
            );
        }
        report
    }

    /// The container was resized; coalesced until the next `tick`
    pub fn notify_resize(&mut self) {
        if let State::Ready(live) = &mut self.state {
            live.resize_pending = true;
        }
    }

    /// Run deferred layout work that is due
    pub fn tick(&mut self, now: Instant) {
        let State::Ready(live) = &mut self.state else {
            return;
        };
        let settled = live.settle_at.is_some_and(|at| now >= at);
        if settled || live.resize_pending {
            live.settle_at = live.settle_at.filter(|_| !settled);
            live.resize_pending = false;
            live.host.invalidate_size();
        }
    }

    /// Route a click at a screen pixel: a tree marker reports the tree,
    /// anything else goes to the host's click handler.
    pub fn click(&mut self, px: i32, py: i32) -> bool {
        let State::Ready(live) = &mut self.state else {
            return false;
        };

        let tree = live
            .host
            .marker_at(px, py)
            .and_then(|key| live.registry.tree_for_key(key))
            .cloned();
        if let Some(tree) = tree {
            debug!(id = %tree.id, "tree marker clicked");
            let _ = self.events.send(MapEvent::TreeSelected(tree));
            return true;
        }

        live.host.click(px, py)
    }

    /// Unmount. Clears markers and releases the host if one was built.
    pub fn teardown(&mut self) {
        match std::mem::replace(&mut self.state, State::TornDown) {
            State::Ready(mut live) => {
                live.registry.clear_all(&mut live.host);
                live.host.teardown();
                info!("map host torn down");
            }
            State::TornDown => {}
            previous => {
                let phase = match previous {
                    State::Loading(_) => Phase::Loading,
                    State::Failed(_) => Phase::Failed,
                    _ => Phase::Uninitialized,
                };
                info!(?phase, "map unmounted before host was ready");
            }
        }
    }
}
