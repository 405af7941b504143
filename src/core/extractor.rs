//! Placemark location, classification and aggregation.
//!
//! The extractor is a pure function of the document text: it keeps no state
//! between calls, so the same input always yields the same report.

use crate::core::parser::{KmlParser, Parser};
use crate::core::tree::XmlElement;
use crate::{GeometryKind, KmlError};
use serde::Serialize;
use std::collections::BTreeMap;

/// One placemark taken from the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark<'a> {
    pub kind: GeometryKind,
    /// Raw text of the first `LineString/coordinates`, when there is one.
    pub coordinates: Option<String>,
    pub element: &'a XmlElement,
}

impl<'a> Placemark<'a> {
    /// Classify a `Placemark` element by its direct geometry children.
    pub fn classify(element: &'a XmlElement) -> Self {
        let line_string = element.child("LineString");
        let kind = if line_string.is_some() {
            GeometryKind::LineString
        } else if element.has_child("MultiGeometry") {
            GeometryKind::MultiLineString
        } else {
            GeometryKind::Point
        };
        let coordinates = line_string
            .and_then(|line| line.child("coordinates"))
            .map(XmlElement::text);

        Self {
            kind,
            coordinates,
            element,
        }
    }

    /// Detail row for placemarks carrying a `LineString`.
    ///
    /// `MultiGeometry` placemarks never get one, even when the geometry they
    /// wrap is a line.
    pub fn detail(&self) -> Option<DetailEntry> {
        if self.kind == GeometryKind::Point || !self.element.has_child("LineString") {
            return None;
        }
        let total_length = self
            .coordinates
            .as_deref()
            .map(count_coordinate_tokens)
            .unwrap_or(0);
        Some(DetailEntry {
            kind: self.kind,
            total_length,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DetailEntry {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    #[serde(rename = "totalLength")]
    pub total_length: usize,
}

/// Response body of a successful extraction.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExtractionReport {
    pub summary: BTreeMap<String, usize>,
    pub details: Vec<DetailEntry>,
    pub placemarks: Vec<serde_json::Value>,
}

impl ExtractionReport {
    pub fn total_placemarks(&self) -> usize {
        self.summary.values().sum()
    }
}

/// Number of single-space separated tokens in a trimmed coordinate string.
///
/// An empty string still counts as one token, matching a plain split.
pub fn count_coordinate_tokens(coordinates: &str) -> usize {
    coordinates.trim().split(' ').count()
}

/// Placemarks of the first non-empty location: first `Document`, then first
/// `Folder`, then the root itself. Locations are never merged.
pub fn locate_placemarks(root: &XmlElement) -> Vec<&XmlElement> {
    let wrappers = [root.child("Document"), root.child("Folder"), Some(root)];
    wrappers
        .into_iter()
        .flatten()
        .map(|wrapper| wrapper.children_named("Placemark").collect::<Vec<_>>())
        .find(|placemarks| !placemarks.is_empty())
        .unwrap_or_default()
}

/// Summarize an already parsed document.
pub fn summarize(root: &XmlElement) -> Result<ExtractionReport, KmlError> {
    if root.name != "kml" {
        return Err(KmlError::InvalidStructure);
    }

    let located = locate_placemarks(root);
    if located.is_empty() {
        return Err(KmlError::NoPlacemarkData);
    }

    let mut summary = BTreeMap::new();
    let mut details = Vec::new();
    let mut placemarks = Vec::with_capacity(located.len());

    for element in located {
        let placemark = Placemark::classify(element);
        *summary.entry(placemark.kind.label().to_string()).or_insert(0) += 1;
        if let Some(detail) = placemark.detail() {
            details.push(detail);
        }
        placemarks.push(element.to_json());
    }

    Ok(ExtractionReport {
        summary,
        details,
        placemarks,
    })
}

/// Parse KML text and summarize its placemarks.
pub fn extract_placemarks(text: &str) -> Result<ExtractionReport, KmlError> {
    let root = KmlParser::new().parse_str(text)?;
    summarize(&root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MIXED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark><name>a</name><Point><coordinates>1,1,0</coordinates></Point></Placemark>
    <Placemark><LineString><coordinates>
        1,1,0 2,2,0 3,3,0 4,4,0
    </coordinates></LineString></Placemark>
    <Placemark><MultiGeometry><LineString><coordinates>1,1 2,2</coordinates></LineString></MultiGeometry></Placemark>
    <Placemark><Polygon/></Placemark>
    <Placemark><LineString><coordinates>5,5,0 6,6,0</coordinates></LineString></Placemark>
  </Document>
</kml>"#;

    #[test]
    fn test_single_point_in_document() {
        let report =
            extract_placemarks("<kml><Document><Placemark><Point/></Placemark></Document></kml>")
                .unwrap();
        assert_eq!(report.summary, BTreeMap::from([("Point".to_string(), 1)]));
        assert!(report.details.is_empty());
    }

    #[test]
    fn test_line_string_at_root() {
        let report = extract_placemarks(
            "<kml><Placemark><LineString><coordinates>1,1,0 2,2,0 3,3,0</coordinates></LineString></Placemark></kml>",
        )
        .unwrap();
        assert_eq!(report.summary, BTreeMap::from([("LineString".to_string(), 1)]));
        assert_eq!(
            report.details,
            vec![DetailEntry {
                kind: GeometryKind::LineString,
                total_length: 3
            }]
        );
        assert_eq!(
            serde_json::to_value(&report.details).unwrap(),
            json!([{"type": "LineString", "totalLength": 3}])
        );
    }

    #[test]
    fn test_mixed_document() {
        let report = extract_placemarks(MIXED).unwrap();
        assert_eq!(report.summary["Point"], 2);
        assert_eq!(report.summary["LineString"], 2);
        assert_eq!(report.summary["MultiLineString"], 1);
        assert_eq!(report.total_placemarks(), 5);
        assert_eq!(report.placemarks.len(), 5);

        // MultiGeometry never contributes a detail row.
        let lengths: Vec<_> = report.details.iter().map(|d| d.total_length).collect();
        assert_eq!(lengths, vec![4, 2]);
        assert!(report.details.iter().all(|d| d.kind == GeometryKind::LineString));
    }

    #[test]
    fn test_placemarks_rendered_in_order() {
        let report = extract_placemarks(MIXED).unwrap();
        assert_eq!(report.placemarks[0]["name"], json!(["a"]));
        assert_eq!(report.placemarks[3], json!({"Polygon": [""]}));
    }

    #[test]
    fn test_location_precedence_does_not_merge() {
        let text = r#"<kml>
            <Placemark><Point/></Placemark>
            <Folder><Placemark><LineString/></Placemark></Folder>
            <Document><Placemark><MultiGeometry/></Placemark></Document>
        </kml>"#;
        let report = extract_placemarks(text).unwrap();
        assert_eq!(report.summary, BTreeMap::from([("MultiLineString".to_string(), 1)]));

        let text = r#"<kml>
            <Placemark><Point/></Placemark>
            <Folder><Placemark><LineString/></Placemark></Folder>
        </kml>"#;
        let report = extract_placemarks(text).unwrap();
        assert_eq!(report.summary, BTreeMap::from([("LineString".to_string(), 1)]));
    }

    #[test]
    fn test_empty_document_falls_through_to_folder() {
        let text = "<kml><Document/><Folder><Placemark/></Folder></kml>";
        let report = extract_placemarks(text).unwrap();
        assert_eq!(report.summary, BTreeMap::from([("Point".to_string(), 1)]));
        assert_eq!(report.placemarks, vec![json!("")]);
    }

    #[test]
    fn test_only_first_document_is_searched() {
        let text = "<kml><Document/><Document><Placemark/></Document></kml>";
        assert!(matches!(extract_placemarks(text), Err(KmlError::NoPlacemarkData)));
    }

    #[test]
    fn test_nested_folder_is_not_searched() {
        let text = "<kml><Document><Folder><Placemark/></Folder></Document></kml>";
        assert!(matches!(extract_placemarks(text), Err(KmlError::NoPlacemarkData)));
    }

    #[test]
    fn test_wrong_root_is_invalid_structure() {
        let text = "<gpx><Placemark><Point/></Placemark></gpx>";
        assert!(matches!(extract_placemarks(text), Err(KmlError::InvalidStructure)));
        assert!(matches!(extract_placemarks("<gpx/>"), Err(KmlError::InvalidStructure)));
    }

    #[test]
    fn test_malformed_is_parse_error() {
        assert!(matches!(extract_placemarks("<kml><Document>"), Err(KmlError::Parse { .. })));
    }

    #[test]
    fn test_coordinate_token_counting() {
        assert_eq!(count_coordinate_tokens("1,1 2,2 3,3"), 3);
        assert_eq!(count_coordinate_tokens("  1,1 2,2  "), 2);
        assert_eq!(count_coordinate_tokens("1,1  2,2"), 3);
        assert_eq!(count_coordinate_tokens("1,1\n2,2"), 1);
        assert_eq!(count_coordinate_tokens(""), 1);
    }

    #[test]
    fn test_line_string_without_coordinates() {
        let report = extract_placemarks(
            "<kml><Placemark><LineString/></Placemark><Placemark><LineString><coordinates/></LineString></Placemark></kml>",
        )
        .unwrap();
        let lengths: Vec<_> = report.details.iter().map(|d| d.total_length).collect();
        assert_eq!(lengths, vec![0, 1]);
    }

    #[test]
    fn test_line_string_wins_over_multi_geometry() {
        let root = KmlParser::new()
            .parse_str("<Placemark><MultiGeometry/><LineString/></Placemark>")
            .unwrap();
        assert_eq!(Placemark::classify(&root).kind, GeometryKind::LineString);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        assert_eq!(extract_placemarks(MIXED).unwrap(), extract_placemarks(MIXED).unwrap());
    }

    #[test]
    fn test_summary_sums_to_placemark_count() {
        for n in 1..6 {
            let body: String = (0..n)
                .map(|i| match i % 3 {
                    0 => "<Placemark><Point/></Placemark>",
                    1 => "<Placemark><LineString><coordinates>1,1</coordinates></LineString></Placemark>",
                    _ => "<Placemark><MultiGeometry/></Placemark>",
                })
                .collect();
            let report = extract_placemarks(&format!("<kml><Folder>{body}</Folder></kml>")).unwrap();
            assert_eq!(report.total_placemarks(), n);
        }
    }
}
