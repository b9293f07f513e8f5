mod controller;

pub use controller::{
    LoadTicket, MapEvent, MapInput, MapOptions, Phase, SyncController, DEFAULT_CENTER,
    DEFAULT_SETTLE_DELAY, DEFAULT_ZOOM,
};
