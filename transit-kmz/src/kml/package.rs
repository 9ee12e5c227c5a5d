//! Output formats and KMZ packaging.

use std::fmt;
use std::io::{Cursor, Write};
use std::str::FromStr;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::document::Document;
use super::error::KmlError;
use super::writer::write_kml;

/// Name of the single entry inside a KMZ produced here.
pub const KMZ_ENTRY_NAME: &str = "doc.kml";

/// Error returned when parsing an unknown output format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid output format {0:?}: must be 'kmz' or 'kml'")]
pub struct InvalidOutputFormat(String);

/// The two ways a document can be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain KML text
    Kml,
    /// KML zipped as a single `doc.kml` entry
    #[default]
    Kmz,
}

impl OutputFormat {
    /// MIME type of the rendered bytes.
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Kml => "application/vnd.google-earth.kml+xml",
            OutputFormat::Kmz => "application/vnd.google-earth.kmz",
        }
    }

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Kml => "kml",
            OutputFormat::Kmz => "kmz",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = InvalidOutputFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kml" => Ok(OutputFormat::Kml),
            "kmz" => Ok(OutputFormat::Kmz),
            _ => Err(InvalidOutputFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Wrap KML text as the only, deflate-compressed entry of a KMZ.
pub fn package_kmz(kml: &[u8]) -> Result<Vec<u8>, KmlError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(KMZ_ENTRY_NAME, options)?;
    zip.write_all(kml)
        .map_err(|e| KmlError::Package(zip::result::ZipError::Io(e)))?;

    Ok(zip.finish()?.into_inner())
}

/// Serialize a document in the requested format.
pub fn render(document: &Document, format: OutputFormat) -> Result<Vec<u8>, KmlError> {
    let kml = write_kml(document)?;
    match format {
        OutputFormat::Kml => Ok(kml.into_bytes()),
        OutputFormat::Kmz => package_kmz(kml.as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kml::{Color, Coord, Folder, Placemark};
    use std::io::Read;

    fn document() -> Document {
        let mut root = Folder::new("root");
        root.push_placemark(Placemark::line(
            "line",
            vec![Coord::new(1.0, 2.0), Coord::new(3.0, 4.0)],
            Color::WHITE,
            5.0,
        ));
        Document { root }
    }

    fn unpack(kmz: &[u8]) -> (Vec<String>, Vec<u8>) {
        let mut archive = zip::ZipArchive::new(Cursor::new(kmz)).unwrap();
        let names = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        let mut entry = archive.by_name(KMZ_ENTRY_NAME).unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).unwrap();
        (names, contents)
    }

    #[test]
    fn parse_formats() {
        assert_eq!("kml".parse::<OutputFormat>(), Ok(OutputFormat::Kml));
        assert_eq!("KMZ".parse::<OutputFormat>(), Ok(OutputFormat::Kmz));
        assert_eq!(" kmz ".parse::<OutputFormat>(), Ok(OutputFormat::Kmz));
        assert!("zip".parse::<OutputFormat>().is_err());
        assert!("".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn default_is_kmz() {
        assert_eq!(OutputFormat::default(), OutputFormat::Kmz);
    }

    #[test]
    fn content_types() {
        assert_eq!(
            OutputFormat::Kml.content_type(),
            "application/vnd.google-earth.kml+xml"
        );
        assert_eq!(
            OutputFormat::Kmz.content_type(),
            "application/vnd.google-earth.kmz"
        );
        assert_eq!(OutputFormat::Kmz.to_string(), "kmz");
    }

    #[test]
    fn invalid_format_message() {
        let err = "pdf".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.to_string(), "invalid output format \"pdf\": must be 'kmz' or 'kml'");
    }

    #[test]
    fn kmz_has_single_doc_entry() {
        let kmz = render(&document(), OutputFormat::Kmz).unwrap();
        let (names, _) = unpack(&kmz);
        assert_eq!(names, vec![KMZ_ENTRY_NAME.to_string()]);
    }

    #[test]
    fn kmz_wraps_kml_exactly() {
        let doc = document();
        let kml = render(&doc, OutputFormat::Kml).unwrap();
        let kmz = render(&doc, OutputFormat::Kmz).unwrap();
        let (_, contents) = unpack(&kmz);
        assert_eq!(contents, kml);

        let repackaged = package_kmz(&kml).unwrap();
        assert_eq!(unpack(&repackaged).1, kml);
    }
}
