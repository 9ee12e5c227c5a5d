//! The in-memory document tree.

use super::color::Color;

/// A WGS84 position, longitude first as KML writes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Geometry of a placemark together with its style.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    LineString {
        coordinates: Vec<Coord>,
        color: Color,
        width: f64,
    },
    Point {
        position: Coord,
        icon_color: Color,
        label_scale: f64,
    },
}

/// A named, styled feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub name: String,
    pub geometry: Geometry,
}

impl Placemark {
    pub fn line(name: impl Into<String>, coordinates: Vec<Coord>, color: Color, width: f64) -> Self {
        Self {
            name: name.into(),
            geometry: Geometry::LineString {
                coordinates,
                color,
                width,
            },
        }
    }

    pub fn point(
        name: impl Into<String>,
        position: Coord,
        icon_color: Color,
        label_scale: f64,
    ) -> Self {
        Self {
            name: name.into(),
            geometry: Geometry::Point {
                position,
                icon_color,
                label_scale,
            },
        }
    }
}

/// A child of a folder.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Folder(Folder),
    Placemark(Placemark),
}

/// A named container that exclusively owns its children, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Folder {
    pub name: String,
    pub children: Vec<Feature>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn push_folder(&mut self, folder: Folder) {
        self.children.push(Feature::Folder(folder));
    }

    pub fn push_placemark(&mut self, placemark: Placemark) {
        self.children.push(Feature::Placemark(placemark));
    }

    /// Direct sub-folders.
    pub fn folders(&self) -> impl Iterator<Item = &Folder> {
        self.children.iter().filter_map(|child| match child {
            Feature::Folder(folder) => Some(folder),
            Feature::Placemark(_) => None,
        })
    }

    /// Direct placemarks.
    pub fn placemarks(&self) -> impl Iterator<Item = &Placemark> {
        self.children.iter().filter_map(|child| match child {
            Feature::Placemark(placemark) => Some(placemark),
            Feature::Folder(_) => None,
        })
    }

    /// First direct sub-folder with the given name.
    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders().find(|folder| folder.name == name)
    }

    /// Number of placemarks in this folder and all of its descendants.
    pub fn placemark_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                Feature::Folder(folder) => folder.placemark_count(),
                Feature::Placemark(_) => 1,
            })
            .sum()
    }
}

/// A complete KML document with a single root folder.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Folder,
}
