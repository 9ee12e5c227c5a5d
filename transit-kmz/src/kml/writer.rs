//! KML markup writer.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::document::{Coord, Document, Feature, Folder, Geometry, Placemark};
use super::error::KmlError;

/// The KML 2.2 namespace.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

type XmlWriter = Writer<Vec<u8>>;

/// Render a document as KML text.
///
/// Output is deterministic: the same tree always yields the same text.
pub fn write_kml(document: &Document) -> Result<String, KmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    let mut kml = BytesStart::new("kml");
    kml.push_attribute(("xmlns", KML_NAMESPACE));
    emit(&mut writer, Event::Start(kml))?;
    open(&mut writer, "Document")?;
    write_folder(&mut writer, &document.root)?;
    close(&mut writer, "Document")?;
    close(&mut writer, "kml")?;

    String::from_utf8(writer.into_inner()).map_err(|e| KmlError::Write(e.to_string()))
}

fn write_folder(writer: &mut XmlWriter, folder: &Folder) -> Result<(), KmlError> {
    open(writer, "Folder")?;
    text_element(writer, "name", &folder.name)?;
    for child in &folder.children {
        match child {
            Feature::Folder(folder) => write_folder(writer, folder)?,
            Feature::Placemark(placemark) => write_placemark(writer, placemark)?,
        }
    }
    close(writer, "Folder")
}

fn write_placemark(writer: &mut XmlWriter, placemark: &Placemark) -> Result<(), KmlError> {
    open(writer, "Placemark")?;
    text_element(writer, "name", &placemark.name)?;

    match &placemark.geometry {
        Geometry::LineString {
            coordinates,
            color,
            width,
        } => {
            open(writer, "Style")?;
            open(writer, "LineStyle")?;
            text_element(writer, "color", &color.to_kml())?;
            text_element(writer, "width", &width.to_string())?;
            close(writer, "LineStyle")?;
            close(writer, "Style")?;

            open(writer, "LineString")?;
            text_element(writer, "coordinates", &format_coordinates(coordinates))?;
            close(writer, "LineString")?;
        }
        Geometry::Point {
            position,
            icon_color,
            label_scale,
        } => {
            open(writer, "Style")?;
            open(writer, "IconStyle")?;
            text_element(writer, "color", &icon_color.to_kml())?;
            close(writer, "IconStyle")?;
            open(writer, "LabelStyle")?;
            text_element(writer, "scale", &label_scale.to_string())?;
            close(writer, "LabelStyle")?;
            close(writer, "Style")?;

            open(writer, "Point")?;
            text_element(
                writer,
                "coordinates",
                &format_coordinates(std::slice::from_ref(position)),
            )?;
            close(writer, "Point")?;
        }
    }

    close(writer, "Placemark")
}

/// `lon,lat` tuples separated by single spaces.
pub(crate) fn format_coordinates(coordinates: &[Coord]) -> String {
    coordinates
        .iter()
        .map(|c| format!("{},{}", c.lon, c.lat))
        .collect::<Vec<_>>()
        .join(" ")
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), KmlError> {
    writer
        .write_event(event)
        .map_err(|e| KmlError::Write(e.to_string()))
}

fn open(writer: &mut XmlWriter, tag: &str) -> Result<(), KmlError> {
    emit(writer, Event::Start(BytesStart::new(tag)))
}

fn close(writer: &mut XmlWriter, tag: &str) -> Result<(), KmlError> {
    emit(writer, Event::End(BytesEnd::new(tag)))
}

fn text_element(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<(), KmlError> {
    open(writer, tag)?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    close(writer, tag)
}
