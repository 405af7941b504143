use crate::core::tree::XmlElement;
use crate::KmlError;
use roxmltree::{Document, ParsingOptions};
use std::path::Path;

pub trait Parser {
    /// Parse raw document text into an owned element tree rooted at the document element.
    fn parse_str(&self, text: &str) -> Result<XmlElement, KmlError>;

    /// Parse a document from disk. Invalid UTF-8 is replaced rather than rejected.
    fn parse<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<XmlElement> {
        let bytes = std::fs::read(path.as_ref())?;
        Ok(self.parse_str(&decode_text(&bytes))?)
    }
}

/// Decode uploaded bytes as UTF-8 (lossy) and drop a leading byte-order mark.
pub fn decode_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

/// KmlParser: turns KML text into an [`XmlElement`] tree using roxmltree.
#[derive(Debug, Clone, Copy, Default)]
pub struct KmlParser;

impl KmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for KmlParser {
    fn parse_str(&self, text: &str) -> Result<XmlElement, KmlError> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(text, options)?;

        XmlElement::from_node(doc.root_element()).ok_or_else(|| KmlError::Parse {
            reason: format!(
                "element nesting exceeds {} levels",
                crate::core::tree::MAX_DEPTH
            ),
        })
    }
}
