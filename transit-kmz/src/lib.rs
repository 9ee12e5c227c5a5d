//! GTFS to KML/KMZ converter.
//!
//! Turns a GTFS feed into a map overlay with one folder per route and
//! direction, then merges in a separately maintained metro rail dataset.

pub mod assemble;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod gtfs;
pub mod kml;
pub mod overlay;
pub mod pipeline;
pub mod resolve;
pub mod variant;
pub mod web;

#[cfg(test)]
mod test_support;
