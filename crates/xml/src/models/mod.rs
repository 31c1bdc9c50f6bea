mod author;
mod ids;
mod issue;
mod metadata;

pub use self::author::Author;
pub use self::ids::ArticleIds;
pub use self::issue::Issue;
pub use self::metadata::{DoiWithLang, Issn, Metadata, Record};
