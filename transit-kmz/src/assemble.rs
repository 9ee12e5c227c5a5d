//! Building the transit document from a feed.
//!
//! Layout:
//!
//! ```text
//! <root>
//! ├── Routes - Forward Path / <route> / "<route> FWD" line
//! ├── Routes - Backward Path / <route> / "<route> BWD" line
//! └── Routes - Stops / <route> / Stops - FWD, Stops - BWD / stop points
//! ```
//!
//! Every route gets its folders even when none of its directions resolve,
//! so the folder list always mirrors `routes.txt`.

use tracing::info;

use crate::gtfs::Feed;
use crate::kml::{Document, Folder, Placemark};
use crate::resolve::{RouteStyle, route_name};
use crate::variant::{Direction, FeedIndex, RouteVariant};

pub const FORWARD_PATHS_FOLDER: &str = "Routes - Forward Path";
pub const BACKWARD_PATHS_FOLDER: &str = "Routes - Backward Path";
pub const STOPS_FOLDER: &str = "Routes - Stops";
pub const FORWARD_STOPS_FOLDER: &str = "Stops - FWD";
pub const BACKWARD_STOPS_FOLDER: &str = "Stops - BWD";

/// Width of route lines.
pub const ROUTE_LINE_WIDTH: f64 = 4.0;

/// Label scale of stop points.
pub const STOP_LABEL_SCALE: f64 = 0.8;

/// The three top-level folders of the output, kept apart while they are
/// filled so routes and the rail overlay can append to each directly.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitLayers {
    pub root_name: String,
    pub forward_paths: Folder,
    pub backward_paths: Folder,
    pub stops: Folder,
}

impl TransitLayers {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            forward_paths: Folder::new(FORWARD_PATHS_FOLDER),
            backward_paths: Folder::new(BACKWARD_PATHS_FOLDER),
            stops: Folder::new(STOPS_FOLDER),
        }
    }

    /// Add a route's folders and the features of each of its variants.
    pub fn add_route(&mut self, name: &str, style: RouteStyle, variants: &[RouteVariant]) {
        let mut forward = Folder::new(name);
        let mut backward = Folder::new(name);
        let mut forward_stops = Folder::new(FORWARD_STOPS_FOLDER);
        let mut backward_stops = Folder::new(BACKWARD_STOPS_FOLDER);

        for variant in variants {
            let (paths, stops) = match variant.direction {
                Direction::Forward => (&mut forward, &mut forward_stops),
                Direction::Backward => (&mut backward, &mut backward_stops),
            };

            paths.push_placemark(Placemark::line(
                format!("{name} {}", variant.direction.label()),
                variant.coordinates.clone(),
                style.line,
                ROUTE_LINE_WIDTH,
            ));

            for stop in &variant.stops {
                stops.push_placemark(Placemark::point(
                    &stop.name,
                    stop.position,
                    style.stop_icon,
                    STOP_LABEL_SCALE,
                ));
            }
        }

        let mut route_stops = Folder::new(name);
        route_stops.push_folder(forward_stops);
        route_stops.push_folder(backward_stops);

        self.forward_paths.push_folder(forward);
        self.backward_paths.push_folder(backward);
        self.stops.push_folder(route_stops);
    }

    /// Close the layers into a document.
    pub fn into_document(self) -> Document {
        let mut root = Folder::new(self.root_name);
        root.push_folder(self.forward_paths);
        root.push_folder(self.backward_paths);
        root.push_folder(self.stops);
        Document { root }
    }
}

/// Lay out every route of the feed, in `routes.txt` order.
pub fn assemble(feed: &Feed, root_name: &str) -> TransitLayers {
    let index = FeedIndex::new(feed);
    let mut layers = TransitLayers::new(root_name);
    let mut variant_count = 0;

    for route in &feed.routes {
        let name = route_name(route);
        let style = RouteStyle::resolve(route);
        let variants = index.route_variants(&route.route_id);
        variant_count += variants.len();
        layers.add_route(&name, style, &variants);
    }

    info!(
        routes = feed.routes.len(),
        variants = variant_count,
        "assembled transit layers"
    );

    layers
}
