use std::path::PathBuf;

use thiserror::Error;

/// Host construction failed. Terminal for the mount; never retried automatically.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InitializationError {
    /// The container is detached or has no drawable area.
    #[error("drawing surface unavailable")]
    SurfaceUnavailable,

    /// A base layer file could not be read or parsed.
    #[error("failed to load base layer {}: {reason}", path.display())]
    Basemap { path: PathBuf, reason: String },
}

/// A single marker could not be built. The record is skipped, the batch continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarkerUpdateError {
    #[error("invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { lat: f64, lng: f64 },
}

/// Reported by the geolocation collaborator; treated as a fallback position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationUnavailable {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported")]
    Unsupported,
}
