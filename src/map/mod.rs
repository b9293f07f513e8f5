mod basemap;
mod geometry;
mod host;
mod projection;
mod terminal;

pub use basemap::{BaseLayer, LineString};
pub use geometry::{draw_line, draw_ring};
pub use host::{ClickHandler, MapHost, MarkerKey, MarkerLayer, MarkerSpec};
pub use projection::{Viewport, MAX_ZOOM, MIN_ZOOM};
pub use terminal::{Surface, TerminalHost};
