/// Location of an article inside its issue.
///
/// Every field defaults to an empty string when absent from the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Issue {
    pub volume: String,
    pub number: String,
    pub suppl: String,
    pub fpage: String,
    pub fpage_seq: String,
    pub lpage: String,
    pub elocation_id: String,
    pub pub_year: String,
}
