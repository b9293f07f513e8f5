use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::MarkerUpdateError;
use crate::geo::LatLng;
use crate::map::{ClickHandler, MapHost, MarkerKey, MarkerSpec};

#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
    SetView(LatLng, u8),
    InvalidateSize,
    AddMarker(MarkerSpec),
    RemoveMarker(MarkerKey),
    RegisterClickHandler,
    Click(i32, i32),
    Teardown,
}

#[derive(Default)]
struct State {
    calls: Vec<HostCall>,
    live: HashMap<MarkerKey, MarkerSpec>,
    next: u32,
}

/// In-memory host that records every call.
///
/// Cloning shares the call log, so a test can keep a recorder after
/// moving the host into a controller
#[derive(Clone, Default)]
pub struct RecordingHost {
    state: Rc<RefCell<State>>,
    handler: Rc<RefCell<Option<ClickHandler>>>,
    /// Marker reported by `marker_at`, set by tests
    pub hit: Rc<RefCell<Option<MarkerKey>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn live_markers(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn last_view(&self) -> Option<LatLng> {
        self.state.borrow().calls.iter().rev().find_map(|c| match c {
            HostCall::SetView(center, _) => Some(*center),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: HostCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl MapHost for RecordingHost {
    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.record(HostCall::SetView(center, zoom));
    }

    fn invalidate_size(&mut self) {
        self.record(HostCall::InvalidateSize);
    }

    fn add_marker(&mut self, spec: MarkerSpec) -> Result<MarkerKey, MarkerUpdateError> {
        self.record(HostCall::AddMarker(spec.clone()));
        if !spec.position.is_valid() {
            return Err(MarkerUpdateError::InvalidCoordinates {
                lat: spec.position.lat,
                lng: spec.position.lng,
            });
        }
        let mut state = self.state.borrow_mut();
        let key = MarkerKey {
            index: state.next,
            generation: 0,
        };
        state.next += 1;
        state.live.insert(key, spec);
        Ok(key)
    }

    fn remove_marker(&mut self, key: MarkerKey) {
        self.record(HostCall::RemoveMarker(key));
        self.state.borrow_mut().live.remove(&key);
    }

    fn register_click_handler(&mut self, handler: ClickHandler) {
        self.record(HostCall::RegisterClickHandler);
        *self.handler.borrow_mut() = Some(handler);
    }

    fn marker_at(&self, _px: i32, _py: i32) -> Option<MarkerKey> {
        *self.hit.borrow()
    }

    fn click(&mut self, px: i32, py: i32) -> bool {
        self.record(HostCall::Click(px, py));
        match self.handler.borrow_mut().as_mut() {
            Some(handler) => {
                handler(LatLng::new(f64::from(py), f64::from(px)));
                true
            }
            None => false,
        }
    }

    fn teardown(&mut self) {
        self.record(HostCall::Teardown);
        self.state.borrow_mut().live.clear();
        *self.handler.borrow_mut() = None;
    }
}
