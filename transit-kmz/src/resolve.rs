//! Route display attributes.
//!
//! GTFS leaves names and colors optional. Everything here is total: a missing
//! or malformed value falls back, it never fails.

use crate::gtfs::{RouteRecord, non_blank};
use crate::kml::Color;

/// Line color for routes without a usable `route_color`.
pub const DEFAULT_LINE_COLOR: Color = Color::BLUE;

/// Display name of a route: short name, then long name, then the route id.
pub fn route_name(route: &RouteRecord) -> String {
    non_blank(route.route_short_name.as_deref())
        .or_else(|| non_blank(route.route_long_name.as_deref()))
        .unwrap_or(&route.route_id)
        .to_string()
}

/// Resolve a GTFS color field, returning `fallback` unless the value is six
/// hex digits with an optional leading `#`.
pub fn resolve_color(raw: Option<&str>, fallback: Color) -> Color {
    raw.map(|value| value.trim())
        .map(|value| value.strip_prefix('#').unwrap_or(value))
        .and_then(Color::from_hex)
        .unwrap_or(fallback)
}

/// Resolved colors of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteStyle {
    pub line: Color,
    pub stop_icon: Color,
}

impl RouteStyle {
    /// The stop icon takes `route_text_color`, falling back to the line color,
    /// which itself falls back to [`DEFAULT_LINE_COLOR`].
    pub fn resolve(route: &RouteRecord) -> Self {
        let line = resolve_color(route.route_color.as_deref(), DEFAULT_LINE_COLOR);
        let stop_icon = resolve_color(route.route_text_color.as_deref(), line);
        Self { line, stop_icon }
    }
}
