//! In-memory fixtures shared by the unit tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip the given `(name, contents)` entries in order.
pub fn zip_entries(entries: &[(String, String)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in entries {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// The text of each GTFS table; `None` leaves the table out of the archive.
#[derive(Debug, Clone)]
pub struct FeedFixture {
    pub routes: Option<String>,
    pub trips: Option<String>,
    pub shapes: Option<String>,
    pub stops: Option<String>,
    pub stop_times: Option<String>,
}

impl FeedFixture {
    /// One red route `R1` named `1`, one forward trip on shape `S1` with three
    /// points, calling at three stops.
    pub fn single_route() -> Self {
        Self {
            routes: Some(
                "route_id,route_short_name,route_long_name,route_color\nR1,1,Blue Area,FF0000\n"
                    .into(),
            ),
            trips: Some("route_id,trip_id,shape_id,direction_id\nR1,T1,S1,0\n".into()),
            shapes: Some(
                "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\n\
                 S1,33.70,73.05,1\n\
                 S1,33.71,73.06,2\n\
                 S1,33.72,73.07,3\n"
                    .into(),
            ),
            stops: Some(
                "stop_id,stop_name,stop_lat,stop_lon\n\
                 A,Alpha,33.70,73.05\n\
                 B,Bravo,33.71,73.06\n\
                 C,Charlie,33.72,73.07\n"
                    .into(),
            ),
            stop_times: Some(
                "trip_id,stop_id,stop_sequence\nT1,A,1\nT1,B,2\nT1,C,3\n".into(),
            ),
        }
    }

    /// The tables that are present, as archive entries.
    pub fn entries(&self) -> Vec<(String, String)> {
        [
            ("routes.txt", &self.routes),
            ("trips.txt", &self.trips),
            ("shapes.txt", &self.shapes),
            ("stops.txt", &self.stops),
            ("stop_times.txt", &self.stop_times),
        ]
        .into_iter()
        .filter_map(|(name, body)| body.as_ref().map(|b| (name.to_string(), b.clone())))
        .collect()
    }

    pub fn to_zip(&self) -> Vec<u8> {
        zip_entries(&self.entries())
    }
}

/// A KML document holding one `Placemark` per `(name, coordinates)` pair.
///
/// A `None` name omits the `<name>` element.
pub fn rail_kml(placemarks: &[(Option<&str>, &str)]) -> String {
    let mut body = String::new();
    for (name, coordinates) in placemarks {
        body.push_str("<Placemark>");
        if let Some(name) = name {
            body.push_str(&format!("<name>{name}</name>"));
        }
        body.push_str(&format!(
            "<LineString><coordinates>{coordinates}</coordinates></LineString></Placemark>\n"
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document>\n{body}</Document></kml>\n"
    )
}

/// `rail_kml` packed as `doc.kml` in a KMZ container.
pub fn rail_kmz(placemarks: &[(Option<&str>, &str)]) -> Vec<u8> {
    zip_entries(&[("doc.kml".to_string(), rail_kml(placemarks))])
}
