use tracing::info;

use crate::error::LocationUnavailable;
use crate::geo::LatLng;
use crate::model::UserPosition;

/// A failed lookup becomes the fallback center, flagged as default
pub fn resolve(result: Result<LatLng, LocationUnavailable>, fallback: LatLng) -> UserPosition {
    match result {
        Ok(position) if position.is_valid() => UserPosition::fix(position),
        Ok(position) => {
            info!(lat = position.lat, lng = position.lng, "ignoring invalid location fix");
            UserPosition::fallback(fallback)
        }
        Err(err) => {
            info!(%err, "location unavailable, using default center");
            UserPosition::fallback(fallback)
        }
    }
}
