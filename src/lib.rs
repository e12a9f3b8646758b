//! Ride demand prediction over an H3 hexagonal grid.
//!
//! A point is mapped to its resolution-12 cell. Cells the model was trained
//! on are scored directly; other cells fall back to the best known cell of
//! the nearest non-empty grid disk. Heatmaps score every known cell around
//! a point in one batch.

pub mod api;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod heatmap;
pub mod model;
pub mod models;
pub mod registry;
pub mod resolver;
pub mod scaler;
pub mod spatial;
