//! Metro rail overlay.
//!
//! The rail lines live in a KMZ maintained outside the GTFS feed. Every line
//! is merged twice: as drawn into the forward paths, and reversed into the
//! backward paths, because the dataset only has one direction per line.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::assemble::TransitLayers;
use crate::gtfs::parse_coordinate;
use crate::kml::{Color, Coord, Folder, Placemark};

/// Name given to placemarks without one.
pub const DEFAULT_SEGMENT_NAME: &str = "Metro Segment";

/// Line width of rail segments.
pub const RAIL_LINE_WIDTH: f64 = 5.0;

/// Errors reading the overlay container.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// The bytes are not a zip archive
    #[error("metro overlay is not a valid KMZ archive: {0}")]
    InvalidArchive(#[from] zip::result::ZipError),

    /// The container holds no `.kml` entry
    #[error("no .kml file found inside metro KMZ")]
    NoOverlayContent,

    /// The KML entry could not be read or is not UTF-8
    #[error("metro KML is unreadable: {0}")]
    Encoding(String),

    /// The KML is not well-formed XML
    #[error("metro KML is malformed: {0}")]
    Xml(String),
}

/// A rail line from the overlay, with at least two coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RailSegment {
    pub name: String,
    pub coordinates: Vec<Coord>,
}

impl RailSegment {
    /// Line color derived from the segment name.
    ///
    /// A name containing "red" (any case) is red, one containing "orange" is
    /// orange, anything else is white.
    pub fn color(&self) -> Color {
        let name = self.name.to_lowercase();
        if name.contains("red") {
            Color::RED
        } else if name.contains("orange") {
            Color::ORANGE
        } else {
            Color::WHITE
        }
    }

    /// Read the segments of the first `.kml` entry of a KMZ.
    pub fn parse_kmz(bytes: &[u8]) -> Result<Vec<RailSegment>, OverlayError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut kml_index = None;
        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            if entry.name().to_lowercase().ends_with(".kml") {
                kml_index = Some(index);
                break;
            }
        }
        let index = kml_index.ok_or(OverlayError::NoOverlayContent)?;

        let mut entry = archive.by_index(index)?;
        let mut raw = Vec::new();
        entry
            .read_to_end(&mut raw)
            .map_err(|e| OverlayError::Encoding(e.to_string()))?;
        let text = String::from_utf8(raw).map_err(|e| OverlayError::Encoding(e.to_string()))?;

        Self::parse_kml(&text)
    }

    /// Read every `Placemark` with a usable `LineString` from KML text.
    ///
    /// Elements are matched by local name, so the namespace prefix does not
    /// matter.
    pub fn parse_kml(text: &str) -> Result<Vec<RailSegment>, OverlayError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut path: Vec<Vec<u8>> = Vec::new();
        let mut current: Option<PlacemarkScan> = None;
        let mut segments = Vec::new();

        loop {
            match reader
                .read_event()
                .map_err(|e| OverlayError::Xml(e.to_string()))?
            {
                Event::Start(start) => {
                    let name = start.local_name().as_ref().to_vec();
                    path.push(name);
                    let depth = path.len();
                    let tag = path[depth - 1].as_slice();
                    if tag == b"Placemark" && current.is_none() {
                        current = Some(PlacemarkScan::new(depth));
                    } else if tag == b"LineString" {
                        if let Some(scan) = current.as_mut() {
                            scan.enter_line_string(depth);
                        }
                    }
                }
                Event::End(_) => {
                    let depth = path.len();
                    let tag = path.pop().unwrap_or_default();
                    let mut finished = false;
                    if let Some(scan) = current.as_mut() {
                        if tag == b"LineString" {
                            scan.leave_line_string(depth);
                        } else if tag == b"Placemark" && depth == scan.depth {
                            segments.extend(scan.finish());
                            finished = true;
                        }
                    }
                    if finished {
                        current = None;
                    }
                }
                Event::Text(content) => {
                    let content = content
                        .unescape()
                        .map_err(|e| OverlayError::Xml(e.to_string()))?;
                    if let Some(scan) = &mut current {
                        scan.text(&path, &content);
                    }
                }
                Event::CData(content) => {
                    let content = String::from_utf8_lossy(&content).into_owned();
                    if let Some(scan) = &mut current {
                        scan.text(&path, &content);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(segments)
    }
}

/// State while reading one `Placemark`.
#[derive(Debug)]
struct PlacemarkScan {
    /// Depth of the `Placemark` element itself.
    depth: usize,
    name: String,
    coordinates: Option<String>,
    /// Depth of the `LineString` being read, if inside the first one.
    line_string: Option<usize>,
    line_string_done: bool,
}

impl PlacemarkScan {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            name: String::new(),
            coordinates: None,
            line_string: None,
            line_string_done: false,
        }
    }

    fn enter_line_string(&mut self, depth: usize) {
        if !self.line_string_done && self.line_string.is_none() {
            self.line_string = Some(depth);
        }
    }

    fn leave_line_string(&mut self, depth: usize) {
        if self.line_string == Some(depth) {
            self.line_string = None;
            self.line_string_done = true;
        }
    }

    fn text(&mut self, path: &[Vec<u8>], content: &str) {
        let Some(tag) = path.last() else {
            return;
        };
        if tag == b"name" && path.len() == self.depth + 1 {
            self.name.push_str(content);
        } else if tag == b"coordinates" && self.line_string == Some(path.len() - 1) {
            let coordinates = self.coordinates.get_or_insert_with(String::new);
            coordinates.push(' ');
            coordinates.push_str(content);
        }
    }

    fn finish(&mut self) -> Option<RailSegment> {
        let name = match self.name.trim() {
            "" => DEFAULT_SEGMENT_NAME.to_string(),
            name => name.to_string(),
        };
        let Some(raw) = self.coordinates.as_deref() else {
            debug!(name = %name, "skipping placemark without a line string");
            return None;
        };
        let coordinates = parse_coordinate_text(raw);
        if coordinates.len() < 2 {
            debug!(name = %name, points = coordinates.len(), "skipping degenerate rail segment");
            return None;
        }
        Some(RailSegment { name, coordinates })
    }
}

/// Parse a KML `coordinates` value.
///
/// Tuples are whitespace separated, fields comma separated. The first two
/// fields are longitude and latitude; any altitude is ignored. Tuples that
/// do not yield two numbers are dropped.
pub fn parse_coordinate_text(text: &str) -> Vec<Coord> {
    text.split_whitespace()
        .filter_map(|tuple| {
            let mut fields = tuple.split(',');
            let lon = parse_coordinate(fields.next()?)?;
            let lat = parse_coordinate(fields.next()?)?;
            Some(Coord::new(lon, lat))
        })
        .collect()
}

/// Add each segment to the forward paths as drawn and to the backward paths
/// reversed, each in a folder of its own.
pub fn merge_rail_segments(layers: &mut TransitLayers, segments: &[RailSegment]) {
    for segment in segments {
        let color = segment.color();

        let mut forward = Folder::new(&segment.name);
        forward.push_placemark(Placemark::line(
            &segment.name,
            segment.coordinates.clone(),
            color,
            RAIL_LINE_WIDTH,
        ));
        layers.forward_paths.push_folder(forward);

        let mut backward = Folder::new(&segment.name);
        backward.push_placemark(Placemark::line(
            &segment.name,
            segment.coordinates.iter().rev().copied().collect(),
            color,
            RAIL_LINE_WIDTH,
        ));
        layers.backward_paths.push_folder(backward);
    }

    info!(segments = segments.len(), "merged metro rail overlay");
}
