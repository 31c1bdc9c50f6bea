mod consts;
pub mod error;
mod extract;
mod header;
pub mod models;
mod tree;

use tracing::instrument;

use crate::error::Result;
pub use crate::extract::{Extractor, update_ids};
pub use crate::header::split_header;
use crate::models::Record;
pub use crate::tree::{Element, Node, normalize_space};

/// A parsed article document: the preamble kept aside, the mutable element
/// tree, and what was extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Declaration, doctype and anything else preceding the root element.
    pub header: String,
    pub tree: Element,
    pub record: Record,
}
impl Extracted {
    /// Serializes the (possibly modified) tree, re-attaching the original preamble.
    pub fn to_xml(&self) -> String {
        format!("{}{}", self.header, self.tree.to_xml())
    }
}

/// Produces an [`Extracted`] document from raw article XML.
///
/// The registry only depends on this seam, so alternative document formats can
/// plug in their own extraction.
pub trait Extract {
    fn extract(&self, xml: &str) -> Result<Extracted>;
}

/// Extraction for SciELO PS (JATS) article documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpsExtractor;
impl Extract for SpsExtractor {
    fn extract(&self, xml: &str) -> Result<Extracted> {
        extract(xml)
    }
}

/// Easy, top-level entrypoint: split the preamble, parse the root element and
/// extract identifiers and descriptive metadata.
#[instrument(skip(xml), fields(xml_size = xml.len()))]
pub fn extract(xml: &str) -> Result<Extracted> {
    let (header, body) = split_header(xml);
    let tree = Element::parse(body)?;
    let record = Extractor::new(&tree).record()?;
    Ok(Extracted { header: header.to_string(), tree, record })
}
