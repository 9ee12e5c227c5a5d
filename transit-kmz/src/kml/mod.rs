//! KML document model and serialization.
//!
//! The document is a plain tree: folders own their children, placemarks
//! carry their own style. [`write_kml`] walks it once to produce the markup,
//! and [`render`] optionally wraps that markup in a KMZ container.

mod color;
mod document;
mod error;
mod package;
mod writer;

pub use color::Color;
pub use document::{Coord, Document, Feature, Folder, Geometry, Placemark};
pub use error::KmlError;
pub use package::{InvalidOutputFormat, KMZ_ENTRY_NAME, OutputFormat, package_kmz, render};
pub use writer::{KML_NAMESPACE, write_kml};
