//! Directional route variants.
//!
//! A route's trips are grouped by direction. Each group contributes one line,
//! drawn from the shape of the group's first trip, and one stop sequence,
//! taken from whichever trip in the group has the most stop-time rows. The
//! two representatives are picked independently and need not be the same
//! trip.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::gtfs::{
    Feed, ShapePointRecord, StopRecord, StopTimeRecord, TripRecord, parse_coordinate,
    parse_sequence,
};
use crate::kml::Coord;

/// Travel direction of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// `0` is forward, every other indicator is backward.
    pub fn from_indicator(indicator: i64) -> Self {
        if indicator == 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// Short label used in feature and folder names.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Forward => "FWD",
            Direction::Backward => "BWD",
        }
    }
}

/// Trips of one route sharing a direction indicator, in feed order.
#[derive(Debug, Clone)]
pub struct DirectionGroup<'a> {
    pub indicator: i64,
    pub trips: Vec<&'a TripRecord>,
}

impl DirectionGroup<'_> {
    pub fn direction(&self) -> Direction {
        Direction::from_indicator(self.indicator)
    }
}

/// A stop on a variant, in visiting order.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedStop {
    pub stop_id: String,
    pub name: String,
    pub position: Coord,
}

/// The geometry and stops of one direction of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteVariant {
    pub direction: Direction,
    /// At least two points.
    pub coordinates: Vec<Coord>,
    /// May be empty when no trip of the direction has usable stop-times.
    pub stops: Vec<SequencedStop>,
}

/// Lookup tables over a feed, built once and shared by every route.
#[derive(Debug)]
pub struct FeedIndex<'a> {
    trips_by_route: HashMap<&'a str, Vec<&'a TripRecord>>,
    shape_points: HashMap<&'a str, Vec<&'a ShapePointRecord>>,
    stop_times_by_trip: HashMap<&'a str, Vec<&'a StopTimeRecord>>,
    stops: HashMap<&'a str, &'a StopRecord>,
}

impl<'a> FeedIndex<'a> {
    pub fn new(feed: &'a Feed) -> Self {
        let mut trips_by_route: HashMap<&str, Vec<&TripRecord>> = HashMap::new();
        for trip in &feed.trips {
            trips_by_route.entry(&trip.route_id).or_default().push(trip);
        }

        let mut shape_points: HashMap<&str, Vec<&ShapePointRecord>> = HashMap::new();
        for point in &feed.shapes {
            shape_points.entry(&point.shape_id).or_default().push(point);
        }

        let mut stop_times_by_trip: HashMap<&str, Vec<&StopTimeRecord>> = HashMap::new();
        for stop_time in &feed.stop_times {
            stop_times_by_trip
                .entry(&stop_time.trip_id)
                .or_default()
                .push(stop_time);
        }

        // A left join against the first row of each stop id.
        let mut stops = HashMap::new();
        for stop in &feed.stops {
            stops.entry(stop.stop_id.as_str()).or_insert(stop);
        }

        Self {
            trips_by_route,
            shape_points,
            stop_times_by_trip,
            stops,
        }
    }

    /// Trips of a route grouped by direction indicator, ascending.
    pub fn direction_groups(&self, route_id: &str) -> Vec<DirectionGroup<'a>> {
        let mut groups: BTreeMap<i64, Vec<&'a TripRecord>> = BTreeMap::new();
        if let Some(trips) = self.trips_by_route.get(route_id) {
            for &trip in trips {
                groups.entry(trip.direction()).or_default().push(trip);
            }
        }
        groups
            .into_iter()
            .map(|(indicator, trips)| DirectionGroup { indicator, trips })
            .collect()
    }

    /// The trip of the group with the most stop-time rows.
    ///
    /// Ties go to the trip that comes first in the group. Returns `None` when
    /// no trip of the group has any stop-time rows.
    pub fn stop_representative(&self, group: &DirectionGroup<'a>) -> Option<&'a str> {
        let mut seen = HashSet::new();
        let mut best: Option<(&'a str, usize)> = None;
        for &trip in &group.trips {
            let trip_id = trip.trip_id.as_str();
            if !seen.insert(trip_id) {
                continue;
            }
            let count = self.stop_times_by_trip.get(trip_id).map_or(0, Vec::len);
            if count > 0 && best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((trip_id, count));
            }
        }
        best.map(|(trip_id, _)| trip_id)
    }

    /// Every variant of a route that has drawable geometry, in direction order.
    pub fn route_variants(&self, route_id: &str) -> Vec<RouteVariant> {
        self.direction_groups(route_id)
            .iter()
            .filter_map(|group| self.variant(route_id, group))
            .collect()
    }

    /// Resolve one direction group, or `None` if it has no usable shape.
    pub fn variant(&self, route_id: &str, group: &DirectionGroup<'a>) -> Option<RouteVariant> {
        let first = group.trips.first()?;
        let Some(shape_id) = first.shape() else {
            debug!(route_id, trip_id = %first.trip_id, "skipping direction: trip has no shape");
            return None;
        };

        let points = self
            .shape_points
            .get(shape_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let coordinates = shape_coordinates(points);
        if coordinates.len() < 2 {
            debug!(
                route_id,
                shape_id,
                points = coordinates.len(),
                "skipping direction: shape has fewer than two points"
            );
            return None;
        }

        let stops = match self.stop_representative(group) {
            Some(trip_id) => {
                let stop_times = self
                    .stop_times_by_trip
                    .get(trip_id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                ordered_stops(stop_times, &self.stops)
            }
            None => Vec::new(),
        };

        Some(RouteVariant {
            direction: group.direction(),
            coordinates,
            stops,
        })
    }
}

/// Shape points ordered by sequence as `(lon, lat)` coordinates.
///
/// Points with an unreadable sequence or position are dropped. Equal
/// sequence numbers keep their feed order.
pub fn shape_coordinates(points: &[&ShapePointRecord]) -> Vec<Coord> {
    let mut sequenced: Vec<(f64, Coord)> = points
        .iter()
        .filter_map(|point| {
            let sequence = parse_sequence(&point.shape_pt_sequence)?;
            let lon = parse_coordinate(&point.shape_pt_lon)?;
            let lat = parse_coordinate(&point.shape_pt_lat)?;
            Some((sequence, Coord::new(lon, lat)))
        })
        .collect();
    sequenced.sort_by(|a, b| a.0.total_cmp(&b.0));
    sequenced.into_iter().map(|(_, coord)| coord).collect()
}

/// The stops of a trip in visiting order, each stop at most once.
///
/// Rows with a non-numeric sequence are dropped before sorting. A stop
/// visited more than once keeps its first position. Stops that are unknown
/// or lack a readable position are dropped after deduplication, so a later
/// visit never stands in for a bad first one.
pub fn ordered_stops(
    stop_times: &[&StopTimeRecord],
    stops: &HashMap<&str, &StopRecord>,
) -> Vec<SequencedStop> {
    let mut sequenced: Vec<(f64, &StopTimeRecord)> = stop_times
        .iter()
        .filter_map(|st| parse_sequence(&st.stop_sequence).map(|seq| (seq, *st)))
        .collect();
    sequenced.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut seen = HashSet::new();
    sequenced
        .into_iter()
        .filter(|&(_, st)| seen.insert(st.stop_id.as_str()))
        .filter_map(|(_, st)| {
            let stop = stops.get(st.stop_id.as_str())?;
            let (lon, lat) = stop.position()?;
            Some(SequencedStop {
                stop_id: st.stop_id.clone(),
                name: stop.display_name().to_string(),
                position: Coord::new(lon, lat),
            })
        })
        .collect()
}
