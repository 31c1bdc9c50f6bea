use std::fmt::{Display, Formatter, Result as FmtResult};

/// A contributor listed as an author of the article.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Author {
    pub surname: String,
    pub given_names: String,
    pub prefix: String,
    pub suffix: String,
    pub orcid: String,
}

impl Display for Author {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.given_names.is_empty() {
            true => write!(f, "{}", self.surname),
            false => write!(f, "{}, {}", self.surname, self.given_names),
        }
    }
}
