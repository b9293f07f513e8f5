mod icon;
mod registry;

pub use icon::{icon_for, selection_icon, user_icon, Glyph, IconDescriptor, Rgb};
pub use registry::{MarkerHandle, MarkerRegistry, SyncReport};
