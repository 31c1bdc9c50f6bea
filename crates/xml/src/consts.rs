use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

pub(crate) const ARTICLE_META: &str = "front/article-meta";
pub(crate) const JOURNAL_META: &str = "front/journal-meta";
pub(crate) const ARTICLE_ID: &str = "article-id";
pub(crate) const TRANSLATION: &str = "translation";

// `specific-use` values of the `article-id` elements holding each identifier.
pub(crate) const SPECIFIC_USE_V3: &str = "scielo-v3";
pub(crate) const SPECIFIC_USE_V2: &str = "scielo-v2";
pub(crate) const SPECIFIC_USE_AOP_PID: &str = "previous-pid";
pub(crate) const PUBLISHER_ID: &str = "publisher-id";

// Issue labels such as "4 suppl 1", "suppl 2" or "Supplement".
regex!(SUPPLEMENT_REGEX, r"(?i)^(?:(?P<number>.*?)\s+)?(?:suppl|supl|supplement)\.?(?:\s+(?P<suppl>.+))?$");
