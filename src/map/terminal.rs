use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::error::{InitializationError, MarkerUpdateError};
use crate::geo::LatLng;
use crate::map::basemap::BaseLayer;
use crate::map::host::{ClickHandler, MapHost, MarkerKey, MarkerLayer, MarkerSpec};
use crate::map::projection::Viewport;

/// Markers within this many braille pixels of a click are hit
const HIT_RADIUS: i32 = 4;

/// The container region the map is laid out into, in braille pixels.
///
/// The layout pass writes it; the host only reads it on `invalidate_size`,
/// the same way a canvas library can't see its element being resized.
#[derive(Clone, Debug)]
pub struct Surface(Rc<Cell<Option<(usize, usize)>>>);

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self(Rc::new(Cell::new(Some((width, height)))))
    }

    pub fn set_size(&self, width: usize, height: usize) {
        if self.0.get().is_some() {
            self.0.set(Some((width, height)));
        }
    }

    /// The container is gone; later reads report no area
    pub fn detach(&self) {
        self.0.set(None);
    }

    /// Current size, `None` once detached
    pub fn size(&self) -> Option<(usize, usize)> {
        self.0.get()
    }

    pub fn is_attached(&self) -> bool {
        self.0.get().is_some()
    }
}

struct Slot {
    generation: u32,
    marker: Option<MarkerSpec>,
}

/// Map host drawing into a terminal region
pub struct TerminalHost {
    surface: Surface,
    pub viewport: Viewport,
    pub base: BaseLayer,
    slots: Vec<Slot>,
    free: Vec<u32>,
    click_handler: Option<ClickHandler>,
}

impl TerminalHost {
    /// Acquire the surface and build the viewport
    pub fn initialize(
        surface: Surface,
        base: BaseLayer,
        center: LatLng,
        zoom: u8,
    ) -> Result<Self, InitializationError> {
        let (width, height) = surface
            .size()
            .filter(|&(w, h)| w > 0 && h > 0)
            .ok_or(InitializationError::SurfaceUnavailable)?;

        Ok(Self {
            surface,
            viewport: Viewport::new(center, zoom, width, height),
            base,
            slots: Vec::new(),
            free: Vec::new(),
            click_handler: None,
        })
    }

    /// Live markers in draw order (trees, then user, then selection)
    pub fn markers(&self) -> Vec<(MarkerKey, &MarkerSpec)> {
        let mut live: Vec<_> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let key = MarkerKey {
                    index: index as u32,
                    generation: slot.generation,
                };
                slot.marker.as_ref().map(|m| (key, m))
            })
            .collect();
        live.sort_by_key(|(_, m)| m.layer);
        live
    }

    pub fn marker(&self, key: MarkerKey) -> Option<&MarkerSpec> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.marker.as_ref())
    }

    pub fn marker_count(&self) -> usize {
        self.slots.iter().filter(|s| s.marker.is_some()).count()
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.viewport.zoom_in_at(px, py);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.viewport.zoom_out_at(px, py);
    }
}

impl MapHost for TerminalHost {
    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.viewport.set_view(center, zoom);
    }

    fn invalidate_size(&mut self) {
        // Detached containers keep the last known size
        if let Some((width, height)) = self.surface.size() {
            if (width, height) != (self.viewport.width, self.viewport.height) {
                debug!(width, height, "map surface resized");
            }
            self.viewport.resize(width, height);
        }
    }

    fn add_marker(&mut self, spec: MarkerSpec) -> Result<MarkerKey, MarkerUpdateError> {
        if !spec.position.is_valid() {
            return Err(MarkerUpdateError::InvalidCoordinates {
                lat: spec.position.lat,
                lng: spec.position.lng,
            });
        }

        let key = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.marker = Some(spec);
                MarkerKey {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    marker: Some(spec),
                });
                MarkerKey {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        Ok(key)
    }

    fn remove_marker(&mut self, key: MarkerKey) {
        let Some(slot) = self.slots.get_mut(key.index as usize) else {
            return;
        };
        if slot.generation != key.generation || slot.marker.is_none() {
            return;
        }
        slot.marker = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
    }

    fn register_click_handler(&mut self, handler: ClickHandler) {
        self.click_handler = Some(handler);
    }

    fn marker_at(&self, px: i32, py: i32) -> Option<MarkerKey> {
        let mut best: Option<(i32, MarkerLayer, MarkerKey)> = None;

        for (key, spec) in self.markers() {
            let (mx, my) = self.viewport.project(spec.position);
            let (dx, dy) = (mx.saturating_sub(px), my.saturating_sub(py));
            if dx.unsigned_abs() > HIT_RADIUS as u32 || dy.unsigned_abs() > HIT_RADIUS as u32 {
                continue;
            }
            let dist = dx * dx + dy * dy;
            if dist > HIT_RADIUS * HIT_RADIUS {
                continue;
            }
            // Closest wins; on ties the one drawn last is on top
            let better = match best {
                None => true,
                Some((d, layer, _)) => dist < d || (dist == d && spec.layer >= layer),
            };
            if better {
                best = Some((dist, spec.layer, key));
            }
        }

        best.map(|(_, _, key)| key)
    }

    fn click(&mut self, px: i32, py: i32) -> bool {
        let point = self.viewport.unproject(px, py);
        match self.click_handler.as_mut() {
            Some(handler) => {
                handler(point);
                true
            }
            None => false,
        }
    }

    fn teardown(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.click_handler = None;
        self.base = BaseLayer::default();
    }
}
