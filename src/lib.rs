pub mod core {
    pub mod parser;
    pub mod tree;
    pub mod extractor;
}

pub mod utils {
    pub mod upload_store;
}

pub mod config;
pub mod error;
pub mod server;

use serde::{Deserialize, Serialize};

pub use config::ServerConfig;
pub use crate::core::extractor::{extract_placemarks, DetailEntry, ExtractionReport, Placemark};
pub use error::{KmlError, UploadError};
pub use server::{build_router, serve, start_server, AppState};

/// Geometry classification of a single placemark.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    /// Any placemark wrapping a `MultiGeometry`, whatever it contains.
    MultiLineString,
}

impl GeometryKind {
    pub fn label(self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiLineString => "MultiLineString",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
