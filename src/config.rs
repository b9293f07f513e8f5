use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use crate::geo::LatLng;
use crate::map::{MAX_ZOOM, MIN_ZOOM};
use crate::sync::{MapOptions, DEFAULT_CENTER, DEFAULT_SETTLE_DELAY, DEFAULT_ZOOM};

/// Command line accepted by the `fruit-map` binary.
#[derive(Debug, Parser)]
#[command(name = "fruit-map", about = "Terminal map of community fruit trees")]
pub struct CliArgs {
    /// GeoJSON tree snapshot (built-in sample trees when omitted).
    #[arg(long = "trees", value_name = "FILE")]
    pub trees: Option<PathBuf>,
    /// Directory of base layer GeoJSON files.
    #[arg(long = "data", value_name = "DIR", default_value = "data")]
    pub data: PathBuf,
    /// Initial map center.
    #[arg(long = "center", value_name = "LAT,LNG", value_parser = parse_lat_lng)]
    pub center: Option<LatLng>,
    /// Initial zoom level.
    #[arg(long = "zoom", value_name = "LEVEL")]
    pub zoom: Option<u8>,
    /// Contribution mode: clicking the map picks a location.
    #[arg(long = "select", action = clap::ArgAction::SetTrue)]
    pub select: bool,
    /// Position reported by the location provider.
    #[arg(long = "location", value_name = "LAT,LNG", value_parser = parse_lat_lng)]
    pub location: Option<LatLng>,
    /// Delay before the first layout pass after the map loads (0 disables it).
    #[arg(long = "settle-ms", value_name = "MS")]
    pub settle_ms: Option<u64>,
    /// Log file path.
    #[arg(long = "log", value_name = "FILE", default_value = "fruit-map.log")]
    pub log: PathBuf,
}

fn parse_lat_lng(raw: &str) -> std::result::Result<LatLng, String> {
    LatLng::parse(raw).ok_or_else(|| format!("expected lat,lng, got {raw:?}"))
}

#[derive(Clone, Debug)]
pub struct Config {
    /// GeoJSON tree snapshot; the built-in sample when absent
    pub trees_path: Option<PathBuf>,
    /// Directory of base layer GeoJSON files
    pub data_dir: PathBuf,
    pub center: LatLng,
    pub zoom: u8,
    /// Contribution mode: clicks pick a location
    pub selectable: bool,
    /// Position reported by the location provider, if any
    pub location: Option<LatLng>,
    pub settle_delay: Duration,
    pub log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trees_path: None,
            data_dir: PathBuf::from("data"),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            selectable: false,
            location: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
            log_path: PathBuf::from("fruit-map.log"),
        }
    }
}

impl TryFrom<CliArgs> for Config {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self> {
        let zoom = args.zoom.unwrap_or(DEFAULT_ZOOM);
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            bail!("--zoom must be between {MIN_ZOOM} and {MAX_ZOOM}");
        }

        Ok(Self {
            trees_path: args.trees,
            data_dir: args.data,
            center: args.center.unwrap_or(DEFAULT_CENTER),
            zoom,
            selectable: args.select,
            location: args.location,
            settle_delay: args
                .settle_ms
                .map_or(DEFAULT_SETTLE_DELAY, Duration::from_millis),
            log_path: args.log,
        })
    }
}

impl Config {
    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            center: self.center,
            zoom: self.zoom,
            selectable: self.selectable,
            settle_delay: self.settle_delay,
        }
    }
}
