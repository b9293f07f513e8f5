use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::Config;
use crate::data;
use crate::error::{InitializationError, LocationUnavailable};
use crate::geo::LatLng;
use crate::geolocation;
use crate::map::{BaseLayer, MapHost, Surface, TerminalHost};
use crate::model::TreeRecord;
use crate::sync::{LoadTicket, MapEvent, MapInput, Phase, SyncController};

/// Convert terminal coordinates inside the bordered map to braille pixels
pub fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    (i32::from(col.saturating_sub(1)) * 2, i32::from(row.saturating_sub(1)) * 4)
}

/// Braille pixel size of the map area for a terminal of `width` x `height`
pub fn map_pixels(width: usize, height: usize) -> (usize, usize) {
    // Border takes 2 columns; border + status bar take 3 rows
    (width.saturating_sub(2) * 2, height.saturating_sub(3) * 4)
}

/// One mounted map view plus the bits of page state around it
pub struct App {
    pub config: Config,
    pub controller: SyncController<TerminalHost>,
    events: Receiver<MapEvent>,
    surface: Surface,
    loader: Option<(LoadTicket, Receiver<Result<BaseLayer, InitializationError>>)>,
    /// Every known tree; what the map shows depends on the season filter
    all_trees: Vec<TreeRecord>,
    pub season_only: bool,
    pub share_location: bool,
    pub selected_tree: Option<TreeRecord>,
    pub should_quit: bool,
    pub reload_requested: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    dragged: bool,
    /// Current mouse position for hover tooltips
    pub mouse_pos: Option<(u16, u16)>,
    /// Frame counter driving the breathing animation
    pub frame: u64,
}

impl App {
    /// Mount a map view: start loading the host and push the initial snapshots
    pub fn mount(config: Config, trees: Vec<TreeRecord>, width: usize, height: usize) -> Self {
        let (pw, ph) = map_pixels(width, height);
        let surface = Surface::new(pw, ph);
        let (mut controller, events) = SyncController::new(config.map_options());

        let loader = controller
            .begin_loading()
            .map(|ticket| (ticket, spawn_loader(config.data_dir.clone())));

        let mut app = Self {
            config,
            controller,
            events,
            surface,
            loader,
            all_trees: trees,
            season_only: false,
            share_location: true,
            selected_tree: None,
            should_quit: false,
            reload_requested: false,
            last_mouse: None,
            dragged: false,
            mouse_pos: None,
            frame: 0,
        };
        app.push_trees();
        app.push_location();
        app
    }

    /// Unmount: release the host and detach the container
    pub fn unmount(&mut self) {
        self.controller.teardown();
        self.surface.detach();
        self.loader = None;
    }

    fn visible_trees(&self) -> Vec<TreeRecord> {
        if self.season_only {
            data::in_season(&self.all_trees)
        } else {
            self.all_trees.clone()
        }
    }

    fn push_trees(&mut self) {
        let trees = self.visible_trees();
        self.controller.notify(MapInput::Trees(trees));
    }

    fn push_location(&mut self) {
        let position = self.share_location.then(|| {
            let fix = self.config.location.ok_or(LocationUnavailable::Unsupported);
            geolocation::resolve(fix, self.config.center)
        });
        self.controller.notify(MapInput::UserPosition(position));
    }

    /// Per-frame work: finish loading, run deferred layout, route map events
    pub fn update(&mut self, now: Instant) {
        self.frame = self.frame.wrapping_add(1);
        self.poll_loader();
        self.controller.tick(now);

        while let Ok(event) = self.events.try_recv() {
            match event {
                MapEvent::TreeSelected(tree) => {
                    info!(id = %tree.id, kind = %tree.kind, "tree selected");
                    self.selected_tree = Some(tree);
                }
                MapEvent::LocationSelected(point) => {
                    info!(%point, "location selected");
                    self.controller.notify(MapInput::Selection(Some(point)));
                }
            }
        }
    }

    fn poll_loader(&mut self) {
        let Some((ticket, rx)) = &self.loader else {
            return;
        };
        let loaded = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(InitializationError::Basemap {
                path: self.config.data_dir.clone(),
                reason: "loader exited without a result".to_string(),
            }),
        };
        let ticket = *ticket;
        self.loader = None;

        let host = loaded.and_then(|base| {
            TerminalHost::initialize(self.surface.clone(), base, self.config.center, self.config.zoom)
        });
        self.controller.complete_loading(ticket, host);
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// Update the container size when the terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pw, ph) = map_pixels(width, height);
        self.surface.set_size(pw, ph);
        self.controller.notify_resize();
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        if let Some(host) = self.controller.host_mut() {
            host.pan(dx, dy);
        }
    }

    pub fn zoom_in(&mut self) {
        if let Some(host) = self.controller.host_mut() {
            host.zoom_in();
        }
    }

    pub fn zoom_out(&mut self) {
        if let Some(host) = self.controller.host_mut() {
            host.zoom_out();
        }
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        if let Some(host) = self.controller.host_mut() {
            host.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        if let Some(host) = self.controller.host_mut() {
            host.zoom_out_at(px, py);
        }
    }

    pub fn toggle_grid(&mut self) {
        if let Some(host) = self.controller.host_mut() {
            host.base.toggle_grid();
        }
    }

    /// Show only in-season trees, or everything
    pub fn toggle_season_filter(&mut self) {
        self.season_only = !self.season_only;
        self.push_trees();
    }

    pub fn toggle_location(&mut self) {
        self.share_location = !self.share_location;
        self.push_location();
    }

    /// Drop the picked point
    pub fn clear_selection(&mut self) {
        self.controller.notify(MapInput::Selection(None));
    }

    /// Re-center on the viewer
    pub fn recenter(&mut self) {
        let zoom = self.config.zoom;
        let target = self
            .controller
            .user_position()
            .map(|u| u.position)
            .unwrap_or(self.config.center);
        if let Some(host) = self.controller.host_mut() {
            host.set_view(target, zoom);
        }
    }

    pub fn close_detail(&mut self) {
        self.selected_tree = None;
    }

    pub fn press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Pan while dragging
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = (i32::from(last_col) - i32::from(col)) * 2;
            let dy = (i32::from(last_row) - i32::from(row)) * 4;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx, dy);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Mouse released; a press without a drag is a click
    pub fn release(&mut self, col: u16, row: u16) {
        let clicked = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if clicked {
            let (px, py) = cell_to_pixel(col, row);
            // Aim at the middle of the character cell
            self.controller.click(px + 1, py + 2);
        }
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Tooltip of the marker under the mouse, if any
    pub fn hovered_tooltip(&self) -> Option<(u16, u16, String)> {
        let (col, row) = self.mouse_pos?;
        let (px, py) = cell_to_pixel(col, row);
        let host = self.controller.host()?;
        let key = host.marker_at(px + 1, py + 2)?;
        let spec = host.marker(key)?;
        Some((col, row, spec.tooltip.clone()))
    }

    pub fn selection(&self) -> Option<LatLng> {
        self.controller.selection()
    }

    pub fn tree_count(&self) -> usize {
        self.controller.trees().len()
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn request_reload(&mut self) {
        self.reload_requested = true;
    }
}

/// Load the base layer off the UI thread
fn spawn_loader(dir: PathBuf) -> Receiver<Result<BaseLayer, InitializationError>> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("basemap-loader".to_string())
        .spawn(move || {
            let _ = tx.send(data::load_base_layer(&dir));
        });
    if let Err(err) = spawned {
        // The dropped sender surfaces as a failed load on the next poll
        warn!(%err, "failed to spawn base layer loader");
    }
    rx
}
