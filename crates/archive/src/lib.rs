//! Document packages: zip archives of XML entries, or a bare XML file.
//!
//! Only entries ending in `.xml` (exactly, lower case) are documents; anything
//! else in an archive (images, PDFs, directories) is ignored when reading.
//! Entries are returned keyed and ordered by name.

pub mod error;
mod ops;

use std::path::Path;

pub use crate::ops::{copy_to_temp, read_xml_entries, read_xml_file, read_zip_entries, write_xml_entries, write_xml_file};

const XML_EXTENSION: &str = "xml";
const ZIP_EXTENSION: &str = "zip";

/// The container format of a package, detected from its file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Package {
    /// A zip archive (.zip)
    Zip,
    /// A single uncompressed XML document (.xml)
    Xml,
}
impl Package {
    /// Detect the package format from a file extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        match path.as_ref().extension()?.to_str()? {
            ZIP_EXTENSION => Some(Package::Zip),
            XML_EXTENSION => Some(Package::Xml),
            _ => None,
        }
    }
}

pub(crate) fn is_xml_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == XML_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("package.zip", Some(Package::Zip))]
    #[case("/tmp/package.zip", Some(Package::Zip))]
    #[case("PACKAGE.ZIP", None)]
    #[case("article.xml", Some(Package::Xml))]
    #[case("article.tar.gz", None)]
    #[case("article", None)]
    fn package_from_path(#[case] path: &str, #[case] expected: Option<Package>) {
        assert_eq!(Package::from_path(path), expected);
    }

    #[rstest]
    #[case("a.xml", true)]
    #[case("dir/b.xml", true)]
    #[case("dir/b.XML", false)]
    #[case("a.Xml", false)]
    #[case("a.pdf", false)]
    #[case("xml", false)]
    #[case("dir/", false)]
    fn xml_names(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_xml_name(name), expected);
    }
}
