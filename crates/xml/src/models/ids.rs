/// The identifiers carried by an article document.
///
/// Empty identifiers in the XML are represented as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleIds {
    /// Current primary identifier.
    pub v3: Option<String>,
    /// Legacy identifier.
    pub v2: Option<String>,
    /// Identifier of the ahead-of-print predecessor.
    pub aop_pid: Option<String>,
}
impl ArticleIds {
    pub fn new(v3: Option<String>, v2: Option<String>, aop_pid: Option<String>) -> Self {
        let present = |id: Option<String>| id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty());
        Self { v3: present(v3), v2: present(v2), aop_pid: present(aop_pid) }
    }

    /// Returns `true` if the document carries any legacy identifier.
    pub fn has_legacy(&self) -> bool {
        self.v2.is_some() || self.aop_pid.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.v3.is_none() && !self.has_legacy()
    }
}
