mod document;
pub(crate) mod facet;

pub use self::document::Document;
pub(crate) use self::document::DocumentRow;
