use crate::error::MarkerUpdateError;
use crate::geo::LatLng;
use crate::markers::IconDescriptor;

/// Key of a marker living in a host's arena.
/// The generation makes keys of removed markers stale instead of aliasing new ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerKey {
    pub index: u32,
    pub generation: u32,
}

/// Which registry slot a marker belongs to; also its draw order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerLayer {
    Tree,
    User,
    Selection,
}

/// Everything needed to put one marker on the canvas
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerSpec {
    pub layer: MarkerLayer,
    pub position: LatLng,
    pub icon: IconDescriptor,
    pub tooltip: String,
}

/// Called with the clicked coordinate while the map is selectable
pub type ClickHandler = Box<dyn FnMut(LatLng)>;

/// The drawing surface the controller drives.
pub trait MapHost {
    /// Recenter the viewport
    fn set_view(&mut self, center: LatLng, zoom: u8);

    /// Re-read container dimensions. Must follow every container resize.
    fn invalidate_size(&mut self);

    fn add_marker(&mut self, spec: MarkerSpec) -> Result<MarkerKey, MarkerUpdateError>;

    /// Removing a stale key is a no-op
    fn remove_marker(&mut self, key: MarkerKey);

    fn register_click_handler(&mut self, handler: ClickHandler);

    /// Marker under a screen pixel, if any
    fn marker_at(&self, px: i32, py: i32) -> Option<MarkerKey>;

    /// Dispatch a click at a screen pixel to the registered handler.
    /// Returns false when no handler is registered.
    fn click(&mut self, px: i32, py: i32) -> bool;

    /// Release markers, handler and layers
    fn teardown(&mut self);
}
