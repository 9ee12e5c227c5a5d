//! Reading the feed tables out of a zip archive.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, warn};
use zip::ZipArchive;

use super::error::FeedError;
use super::records::{RouteRecord, ShapePointRecord, StopRecord, StopTimeRecord, TripRecord};

/// Tables that must be present in every feed.
pub const REQUIRED_TABLES: [&str; 5] = [
    "routes.txt",
    "trips.txt",
    "shapes.txt",
    "stops.txt",
    "stop_times.txt",
];

const SHAPE_COLUMNS: [&str; 4] = [
    "shape_id",
    "shape_pt_lat",
    "shape_pt_lon",
    "shape_pt_sequence",
];

const STOP_TIME_COLUMNS: [&str; 1] = ["stop_sequence"];

const UTF8_BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Upper bound on the buffer reserved from a size declared in the archive.
const MAX_RESERVE: u64 = 64 << 20;

/// The parsed tables of a GTFS feed, each in source row order.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub routes: Vec<RouteRecord>,
    pub trips: Vec<TripRecord>,
    pub shapes: Vec<ShapePointRecord>,
    pub stops: Vec<StopRecord>,
    pub stop_times: Vec<StopTimeRecord>,
}

impl Feed {
    /// Parse a GTFS zip archive held in memory.
    pub fn from_zip_bytes(bytes: &[u8]) -> Result<Self, FeedError> {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(FeedError::InvalidArchive)?;
        let entries = locate_tables(&mut archive)?;

        for table in REQUIRED_TABLES {
            if !entries.contains_key(table) {
                return Err(FeedError::MissingTable(table));
            }
        }

        let feed = Feed {
            routes: read_table(&mut archive, &entries, "routes.txt", &[])?,
            trips: read_table(&mut archive, &entries, "trips.txt", &[])?,
            shapes: read_table(&mut archive, &entries, "shapes.txt", &SHAPE_COLUMNS)?,
            stops: read_table(&mut archive, &entries, "stops.txt", &[])?,
            stop_times: read_table(
                &mut archive,
                &entries,
                "stop_times.txt",
                &STOP_TIME_COLUMNS,
            )?,
        };

        info!(
            routes = feed.routes.len(),
            trips = feed.trips.len(),
            shape_points = feed.shapes.len(),
            stops = feed.stops.len(),
            stop_times = feed.stop_times.len(),
            "loaded GTFS feed"
        );

        Ok(feed)
    }
}

/// Map each required table name to its archive index.
///
/// A table at the archive root wins. Otherwise entries are matched on file
/// name, so feeds zipped with an enclosing directory still load; the first
/// such match in archive order is used.
fn locate_tables<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<HashMap<&'static str, usize>, FeedError> {
    let mut root = HashMap::new();
    let mut nested = HashMap::new();
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(FeedError::InvalidArchive)?;
        let name = entry.name();
        if let Some(table) = REQUIRED_TABLES.iter().find(|t| **t == name) {
            root.entry(*table).or_insert(index);
            continue;
        }
        let file_name = Path::new(name).file_name().and_then(|f| f.to_str());
        if let Some(table) = REQUIRED_TABLES.iter().find(|t| Some(**t) == file_name) {
            nested.entry(*table).or_insert(index);
        }
    }
    for (table, index) in nested {
        root.entry(table).or_insert(index);
    }
    Ok(root)
}

fn read_table<R, T>(
    archive: &mut ZipArchive<R>,
    entries: &HashMap<&'static str, usize>,
    table: &'static str,
    required_columns: &[&str],
) -> Result<Vec<T>, FeedError>
where
    R: Read + Seek,
    T: DeserializeOwned,
{
    let index = entries
        .get(table)
        .copied()
        .ok_or(FeedError::MissingTable(table))?;
    let mut file = archive
        .by_index(index)
        .map_err(|source| FeedError::Io { table, source })?;

    let mut contents = Vec::with_capacity(reserve_hint(file.size()));
    file.read_to_end(&mut contents)
        .map_err(|e| FeedError::Io {
            table,
            source: zip::result::ZipError::Io(e),
        })?;

    parse_table(&contents, table, required_columns)
}

/// The declared size comes from the archive and is not trusted.
fn reserve_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_RESERVE)).unwrap_or(0)
}

/// Parse one CSV table, validating its header before reading any record.
fn parse_table<T: DeserializeOwned>(
    contents: &[u8],
    table: &'static str,
    required_columns: &[&str],
) -> Result<Vec<T>, FeedError> {
    let contents = contents.strip_prefix(&UTF8_BOM).unwrap_or(contents);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents);

    let headers = reader
        .headers()
        .map_err(|source| FeedError::Csv { table, source })?
        .clone();

    let mut missing: Vec<String> = required_columns
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(FeedError::Schema { table, missing });
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.deserialize::<T>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                if skipped == 1 {
                    warn!(table, error = %e, "skipping unreadable row");
                }
            }
        }
    }
    if skipped > 1 {
        warn!(table, skipped, "skipped unreadable rows");
    }

    Ok(rows)
}
