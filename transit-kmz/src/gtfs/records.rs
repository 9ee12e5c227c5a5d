//! Row records for the GTFS tables and the parsers that type them.

use serde::Deserialize;

/// A row of `routes.txt`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteRecord {
    #[serde(default)]
    pub route_id: String,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_color: Option<String>,
    pub route_text_color: Option<String>,
}

/// A row of `trips.txt`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripRecord {
    #[serde(default)]
    pub route_id: String,
    #[serde(default)]
    pub trip_id: String,
    pub shape_id: Option<String>,
    pub direction_id: Option<String>,
}

impl TripRecord {
    /// Direction indicator, with absent or unreadable values treated as forward.
    pub fn direction(&self) -> i64 {
        parse_direction(self.direction_id.as_deref())
    }

    /// Shape identifier, if the trip names a non-blank one.
    pub fn shape(&self) -> Option<&str> {
        non_blank(self.shape_id.as_deref())
    }
}

/// A row of `shapes.txt`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShapePointRecord {
    pub shape_id: String,
    pub shape_pt_lat: String,
    pub shape_pt_lon: String,
    pub shape_pt_sequence: String,
}

/// A row of `stops.txt`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopRecord {
    #[serde(default)]
    pub stop_id: String,
    pub stop_name: Option<String>,
    pub stop_lat: Option<String>,
    pub stop_lon: Option<String>,
}

impl StopRecord {
    /// Display name: the stop name when present, otherwise the stop id.
    pub fn display_name(&self) -> &str {
        non_blank(self.stop_name.as_deref()).unwrap_or(&self.stop_id)
    }

    /// `(lon, lat)` if both coordinates parse.
    pub fn position(&self) -> Option<(f64, f64)> {
        let lon = parse_coordinate(self.stop_lon.as_deref()?)?;
        let lat = parse_coordinate(self.stop_lat.as_deref()?)?;
        Some((lon, lat))
    }
}

/// A row of `stop_times.txt`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopTimeRecord {
    #[serde(default)]
    pub trip_id: String,
    #[serde(default)]
    pub stop_id: String,
    pub stop_sequence: String,
}

/// Returns the trimmed value if it is present and not blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a longitude or latitude. Non-finite values are rejected.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a sequence number.
///
/// Sequences are compared numerically, so `"2"` sorts before `"10"` and
/// `"3.0"` is accepted.
pub fn parse_sequence(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parse a direction indicator.
///
/// Blank, missing and unreadable values all mean forward (`0`).
pub fn parse_direction(raw: Option<&str>) -> i64 {
    let Some(raw) = non_blank(raw) else {
        return 0;
    };
    if let Ok(value) = raw.parse::<i64>() {
        return value;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => value as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_defaults_to_forward() {
        assert_eq!(parse_direction(None), 0);
        assert_eq!(parse_direction(Some("")), 0);
        assert_eq!(parse_direction(Some("  ")), 0);
        assert_eq!(parse_direction(Some("outbound")), 0);
        assert_eq!(parse_direction(Some("NaN")), 0);
    }

    #[test]
    fn direction_accepts_numeric_text() {
        assert_eq!(parse_direction(Some("0")), 0);
        assert_eq!(parse_direction(Some("1")), 1);
        assert_eq!(parse_direction(Some(" 1 ")), 1);
        assert_eq!(parse_direction(Some("1.0")), 1);
    }

    #[test]
    fn sequence_parsing() {
        assert_eq!(parse_sequence("10"), Some(10.0));
        assert_eq!(parse_sequence(" 3.5 "), Some(3.5));
        assert_eq!(parse_sequence("x"), None);
        assert_eq!(parse_sequence(""), None);
        assert_eq!(parse_sequence("NaN"), None);
    }

    #[test]
    fn coordinate_parsing() {
        assert_eq!(parse_coordinate("73.0479"), Some(73.0479));
        assert_eq!(parse_coordinate("-33.5"), Some(-33.5));
        assert_eq!(parse_coordinate("inf"), None);
        assert_eq!(parse_coordinate("north"), None);
    }

    #[test]
    fn stop_display_name_falls_back_to_id() {
        let stop = StopRecord {
            stop_id: "S9".into(),
            stop_name: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(stop.display_name(), "S9");

        let stop = StopRecord {
            stop_id: "S9".into(),
            stop_name: Some("Faizabad".into()),
            ..Default::default()
        };
        assert_eq!(stop.display_name(), "Faizabad");
    }

    #[test]
    fn stop_position_requires_both_coordinates() {
        let stop = StopRecord {
            stop_id: "S1".into(),
            stop_lat: Some("33.6".into()),
            stop_lon: Some("73.1".into()),
            ..Default::default()
        };
        assert_eq!(stop.position(), Some((73.1, 33.6)));

        let stop = StopRecord {
            stop_lon: None,
            ..stop
        };
        assert_eq!(stop.position(), None);
    }

    #[test]
    fn trip_shape_ignores_blank() {
        let trip = TripRecord {
            shape_id: Some(" ".into()),
            ..Default::default()
        };
        assert_eq!(trip.shape(), None);
    }
}
