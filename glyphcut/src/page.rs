//! Reading glyph records from PAGE XML documents.

use crate::ExtractError;
use crate::geom::{Point, Polygon};
use core::fmt;
use roxmltree::{Document, Node};
use std::io;
use std::path::Path;

/// An error that prevents a page document from being used at all.
#[derive(Debug)]
pub enum PageError {
    /// The document could not be read.
    Io(io::Error),
    /// The document is not well-formed XML.
    Xml(roxmltree::Error),
    /// The root element doesn't declare a default namespace, so glyph
    /// elements cannot be identified.
    MissingNamespace,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{e}"),
            Self::Xml(e) => write!(f, "malformed XML: {e}"),
            Self::MissingNamespace => write!(f, "root element has no default namespace"),
        }
    }
}

impl core::error::Error for PageError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Xml(e) => Some(e),
            Self::MissingNamespace => None,
        }
    }
}

impl From<io::Error> for PageError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<roxmltree::Error> for PageError {
    fn from(e: roxmltree::Error) -> Self {
        Self::Xml(e)
    }
}

/// A glyph as described by the page document.
#[derive(Debug)]
pub struct GlyphRecord {
    /// The identifier of the glyph, empty if the document has none.
    pub id: String,
    /// The transcription of the glyph.
    pub label: Option<String>,
    /// The outline of the glyph in page coordinates, or why it couldn't be
    /// read.
    pub polygon: Result<Polygon, ExtractError>,
}

/// A parsed PAGE XML document.
pub struct PageDocument<'a> {
    doc: Document<'a>,
    namespace: String,
}

impl<'a> PageDocument<'a> {
    /// Parse a document.
    ///
    /// Elements are looked up in the default namespace of the root element,
    /// which therefore has to exist.
    pub fn parse(text: &'a str) -> Result<Self, PageError> {
        let doc = Document::parse(text)?;
        let namespace = doc
            .root_element()
            .default_namespace()
            .ok_or(PageError::MissingNamespace)?
            .to_string();

        Ok(Self { doc, namespace })
    }

    /// The default namespace of the document.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// All glyphs of the document, in document order.
    ///
    /// A glyph whose coordinates cannot be parsed carries an error in place
    /// of its polygon, which doesn't affect the other glyphs.
    pub fn glyphs(&self) -> Vec<GlyphRecord> {
        self.doc
            .descendants()
            .filter(|n| n.has_tag_name((self.namespace.as_str(), "Glyph")))
            .map(|n| self.glyph(n))
            .collect()
    }

    fn glyph(&self, node: Node<'_, '_>) -> GlyphRecord {
        let id = node.attribute("id").unwrap_or_default().to_string();

        let label = self
            .child(node, "TextEquiv")
            .and_then(|equiv| self.child(equiv, "Unicode"))
            .map(|unicode| unicode.text().unwrap_or_default().to_string());

        let polygon = match self.child(node, "Coords") {
            Some(coords) => self.polygon(coords),
            None => Ok(Polygon::default()),
        };

        GlyphRecord { id, label, polygon }
    }

    fn polygon(&self, coords: Node<'_, '_>) -> Result<Polygon, ExtractError> {
        if let Some(points) = coords.attribute("points") {
            return points.parse();
        }

        // Older schema versions list the points as child elements.
        coords
            .children()
            .filter(|n| n.has_tag_name((self.namespace.as_str(), "Point")))
            .map(|n| {
                let x = n.attribute("x").unwrap_or_default();
                let y = n.attribute("y").unwrap_or_default();

                match (x.parse(), y.parse()) {
                    (Ok(x), Ok(y)) => Ok(Point::new(x, y)),
                    _ => Err(ExtractError::MalformedCoordinates {
                        token: format!("{x},{y}"),
                    }),
                }
            })
            .collect()
    }

    fn child<'b, 'input>(&self, node: Node<'b, 'input>, name: &str) -> Option<Node<'b, 'input>> {
        node.children()
            .find(|n| n.has_tag_name((self.namespace.as_str(), name)))
    }
}

/// Read and parse the page document at `path`, returning its glyphs.
pub fn read_glyphs(path: &Path) -> Result<Vec<GlyphRecord>, PageError> {
    let text = std::fs::read_to_string(path)?;
    let page = PageDocument::parse(&text)?;

    Ok(page.glyphs())
}
