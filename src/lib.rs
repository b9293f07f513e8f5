pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod geolocation;
pub mod logging;
pub mod map;
pub mod markers;
pub mod model;
pub mod sync;
pub mod ui;

#[cfg(test)]
mod testing;
