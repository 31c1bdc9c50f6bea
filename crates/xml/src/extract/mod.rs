//! Descriptive metadata extraction from SciELO PS (JATS) article trees.

mod ids;
mod issue;

use std::collections::BTreeMap;

use exn::OptionExt;
use tracing::instrument;

pub use self::ids::update_ids;
use crate::consts::{ARTICLE_ID, ARTICLE_META, JOURNAL_META, TRANSLATION};
use crate::error::{ErrorKind, Result};
use crate::models::{Author, DoiWithLang, Issn, Issue, Metadata, Record};
use crate::tree::{Element, normalize_space};

fn child_text(element: &Element, path: &str) -> String {
    element.find(path).map(|e| normalize_space(&e.text())).unwrap_or_default()
}

fn lang(element: &Element) -> String {
    element.attr("xml:lang").map(|lang| lang.trim().to_lowercase()).unwrap_or_default()
}

#[derive(Debug)]
pub struct Extractor<'a> {
    root: &'a Element,
}
impl<'a> Extractor<'a> {
    pub fn new(root: &'a Element) -> Self {
        Self { root }
    }

    /// Extracts identifiers and descriptive metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidDocument`] if the tree has no `front/article-meta`.
    #[instrument(skip(self), fields(root = %self.root.name))]
    pub fn record(&self) -> Result<Record> {
        let article_meta = self.article_meta()?;
        Ok(Record {
            ids: ids::read(article_meta),
            metadata: Metadata {
                doi_with_lang: self.doi_with_lang(article_meta),
                issns: self.issns(),
                issue: self.issue(article_meta),
                authors: self.authors(article_meta),
                collab: self.collab(article_meta),
                article_titles: self.article_titles(article_meta),
                partial_body: self.partial_body(),
            },
        })
    }

    fn article_meta(&self) -> Result<&'a Element> {
        self.root.find(ARTICLE_META).ok_or_raise(|| ErrorKind::InvalidDocument("article-meta"))
    }

    fn translations(&self) -> impl Iterator<Item = &'a Element> {
        self.root
            .elements_named("sub-article")
            .filter(|sub| sub.attr("article-type").as_deref() == Some(TRANSLATION))
    }

    fn doi(meta: &Element) -> Option<String> {
        meta.elements_named(ARTICLE_ID)
            .find(|id| id.attr("pub-id-type").as_deref() == Some("doi"))
            .map(|id| normalize_space(&id.text()))
            .filter(|doi| !doi.is_empty())
    }

    fn doi_with_lang(&self, article_meta: &Element) -> Vec<DoiWithLang> {
        let main = Self::doi(article_meta).map(|doi| DoiWithLang { doi, lang: lang(self.root) });
        let translated = self.translations().filter_map(|sub| {
            let front = sub.find("front-stub").or_else(|| sub.find("front"))?;
            Self::doi(front).map(|doi| DoiWithLang { doi, lang: lang(sub) })
        });
        main.into_iter().chain(translated).collect()
    }

    fn issns(&self) -> Vec<Issn> {
        let Some(journal_meta) = self.root.find(JOURNAL_META) else {
            return Vec::new();
        };
        journal_meta
            .elements_named("issn")
            .map(|issn| Issn {
                kind: issn.attr("pub-type").or_else(|| issn.attr("publication-format")).unwrap_or_default(),
                value: normalize_space(&issn.text()),
            })
            .filter(|issn| !issn.value.is_empty())
            .collect()
    }

    fn issue(&self, article_meta: &Element) -> Issue {
        let (number, mut suppl) = issue::split_issue(&child_text(article_meta, "issue"));
        let supplement = child_text(article_meta, "supplement");
        if !supplement.is_empty() {
            suppl = supplement;
        }
        let fpage = article_meta.find("fpage");
        let mut pub_year = Self::pub_year(article_meta, &["collection", "epub-ppub", "ppub"]);
        if pub_year.is_empty() {
            pub_year = self.article_date_year(article_meta);
        }
        Issue {
            volume: child_text(article_meta, "volume"),
            number,
            suppl,
            fpage: fpage.map(|e| normalize_space(&e.text())).unwrap_or_default(),
            fpage_seq: fpage.and_then(|e| e.attr("seq")).unwrap_or_default(),
            lpage: child_text(article_meta, "lpage"),
            elocation_id: child_text(article_meta, "elocation-id"),
            pub_year,
        }
    }

    /// Year of the first `pub-date` whose `date-type` or `pub-type` is one of `types`.
    fn pub_year(article_meta: &Element, types: &[&str]) -> String {
        article_meta
            .elements_named("pub-date")
            .find(|date| {
                let kind = date.attr("date-type").or_else(|| date.attr("pub-type")).unwrap_or_default();
                types.contains(&kind.as_str())
            })
            .map(|date| child_text(date, "year"))
            .unwrap_or_default()
    }

    /// Year of the article's own publication date, used when the issue omits it.
    fn article_date_year(&self, article_meta: &Element) -> String {
        let year = Self::pub_year(article_meta, &["pub", "epub"]);
        if !year.is_empty() {
            return year;
        }
        article_meta
            .elements_named("pub-date")
            .map(|date| child_text(date, "year"))
            .find(|year| !year.is_empty())
            .unwrap_or_default()
    }

    fn contribs(article_meta: &'a Element) -> impl Iterator<Item = &'a Element> {
        article_meta.find_all("contrib-group/contrib").into_iter().filter(|contrib| {
            contrib.attr("contrib-type").is_none_or(|kind| kind == "author")
        })
    }

    fn authors(&self, article_meta: &'a Element) -> Vec<Author> {
        Self::contribs(article_meta)
            .filter_map(|contrib| {
                let name = contrib.find("name")?;
                Some(Author {
                    surname: child_text(name, "surname"),
                    given_names: child_text(name, "given-names"),
                    prefix: child_text(name, "prefix"),
                    suffix: child_text(name, "suffix"),
                    orcid: contrib
                        .elements_named("contrib-id")
                        .find(|id| id.attr("contrib-id-type").as_deref() == Some("orcid"))
                        .map(|id| normalize_space(&id.text()))
                        .unwrap_or_default(),
                })
            })
            .collect()
    }

    fn collab(&self, article_meta: &'a Element) -> String {
        Self::contribs(article_meta)
            .filter_map(|contrib| contrib.find("collab"))
            .map(|collab| normalize_space(&collab.text()))
            .find(|collab| !collab.is_empty())
            .unwrap_or_default()
    }

    fn article_titles(&self, article_meta: &Element) -> BTreeMap<String, String> {
        let mut titles = BTreeMap::new();
        let mut add = |lang: String, title: String| {
            if !title.is_empty() {
                titles.entry(lang).or_insert(title);
            }
        };
        add(lang(self.root), child_text(article_meta, "title-group/article-title"));
        for group in article_meta.find_all("title-group/trans-title-group") {
            add(lang(group), child_text(group, "trans-title"));
        }
        for sub in self.translations() {
            if let Some(front) = sub.find("front-stub").or_else(|| sub.find("front")) {
                add(lang(sub), child_text(front, "title-group/article-title"));
            }
        }
        titles
    }

    /// The first non-empty paragraph of the main body.
    fn partial_body(&self) -> String {
        let Some(body) = self.root.find("body") else {
            return String::new();
        };
        body.descendants_named("p")
            .into_iter()
            .map(|p| normalize_space(&p.text()))
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }
}
