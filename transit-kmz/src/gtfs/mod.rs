//! GTFS feed loading.
//!
//! Reads the five tables the overlay needs out of a GTFS zip archive:
//! `routes.txt`, `trips.txt`, `shapes.txt`, `stops.txt` and `stop_times.txt`.
//!
//! Rows are kept close to the source text. Optional columns are `Option`s and
//! numeric columns stay as strings until a caller parses them with one of the
//! `parse_*` helpers, so a single bad row never fails the whole feed.

mod error;
mod loader;
mod records;

pub use error::FeedError;
pub use loader::{Feed, REQUIRED_TABLES};
pub use records::{
    RouteRecord, ShapePointRecord, StopRecord, StopTimeRecord, TripRecord, non_blank,
    parse_coordinate, parse_direction, parse_sequence,
};
