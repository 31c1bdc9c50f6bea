//! Separation of the XML preamble from the document element.
//!
//! The preamble (XML declaration, processing instructions, doctype) must be
//! written back byte-for-byte, and the tree parser does not preserve it, so
//! the boundary is recomputed from the raw text instead.

use memchr::memmem;

/// Splits XML text into the preamble preceding the root element and the root
/// element itself.
///
/// The root element's name is learnt from the *last* closing tag in the text,
/// and the split happens at the *first* occurrence of `<name`. Surrounding
/// whitespace of the whole text and of the returned body is trimmed, but the
/// preamble is returned untouched (including its trailing newline).
///
/// Text without any closing tag (a lone self-closing root) has no preamble.
///
/// > **Note:** a preamble which contains the literal text `<name` (for the
/// > root element's name) before the real root element will be split at the
/// > wrong position.
///
/// # Examples
///
/// ```rust
/// use pidr_xml::split_header;
/// let xml = "<?xml version=\"1.0\"?>\n<!DOCTYPE article>\n<article><front/></article>";
/// let (header, body) = split_header(xml);
/// assert_eq!(header, "<?xml version=\"1.0\"?>\n<!DOCTYPE article>\n");
/// assert_eq!(body, "<article><front/></article>");
/// ```
pub fn split_header(xml: &str) -> (&str, &str) {
    let xml = xml.trim();
    let Some(end_tag) = memmem::rfind(xml.as_bytes(), b"</") else {
        return ("", xml);
    };
    let start_tag = xml[end_tag..].chars().filter(|c| *c != '/' && *c != '>').collect::<String>();
    match memmem::find(xml.as_bytes(), start_tag.trim().as_bytes()) {
        Some(position) => (&xml[..position], xml[position..].trim()),
        None => ("", xml),
    }
}
