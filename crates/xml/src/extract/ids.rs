//! Reading and writing of the `article-id` elements holding PIDs.

use exn::OptionExt;

use crate::consts::{ARTICLE_ID, ARTICLE_META, PUBLISHER_ID, SPECIFIC_USE_AOP_PID, SPECIFIC_USE_V2, SPECIFIC_USE_V3};
use crate::error::{ErrorKind, Result};
use crate::models::ArticleIds;
use crate::tree::{Element, normalize_space};

fn by_specific_use<'a>(article_meta: &'a Element, specific_use: &str) -> Option<&'a Element> {
    article_meta
        .elements_named(ARTICLE_ID)
        .find(|id| id.attr("specific-use").as_deref() == Some(specific_use))
}

pub(crate) fn read(article_meta: &Element) -> ArticleIds {
    let text = |element: Option<&Element>| element.map(|e| normalize_space(&e.text()));
    // Older documents only carry the v2 as a plain publisher-id.
    let v2 = text(by_specific_use(article_meta, SPECIFIC_USE_V2)).filter(|v2| !v2.is_empty()).or_else(|| {
        text(article_meta.elements_named(ARTICLE_ID).find(|id| {
            id.attr("pub-id-type").as_deref() == Some(PUBLISHER_ID) && id.attr("specific-use").is_none()
        }))
    });
    ArticleIds::new(
        text(by_specific_use(article_meta, SPECIFIC_USE_V3)),
        v2,
        text(by_specific_use(article_meta, SPECIFIC_USE_AOP_PID)),
    )
}

/// Writes the identifiers into `article-meta`, replacing the text of existing
/// `article-id` elements or creating them (ahead of the other children) when
/// absent. Absent `v2`/`aop_pid` leave the document untouched.
pub fn update_ids(root: &mut Element, v3: &str, v2: Option<&str>, aop_pid: Option<&str>) -> Result<()> {
    let article_meta = root.find_mut(ARTICLE_META).ok_or_raise(|| ErrorKind::InvalidDocument("article-meta"))?;
    let ids = [(SPECIFIC_USE_V3, Some(v3)), (SPECIFIC_USE_V2, v2), (SPECIFIC_USE_AOP_PID, aop_pid)];
    let mut inserted = 0;
    for (specific_use, value) in ids {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        let existing = article_meta
            .elements_mut()
            .find(|id| id.name == ARTICLE_ID && id.attr("specific-use").as_deref() == Some(specific_use));
        match existing {
            Some(element) => element.set_text(value),
            None => {
                let element = Element::new(ARTICLE_ID)
                    .with_attr("pub-id-type", PUBLISHER_ID)
                    .with_attr("specific-use", specific_use)
                    .with_text(value);
                article_meta.insert(inserted, element);
                inserted += 1;
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(ids: &str) -> Element {
        Element::parse(&format!("<article><front><article-meta>{ids}<volume>1</volume></article-meta></front></article>"))
            .unwrap()
    }

    #[test]
    fn reads_specific_use_ids() {
        let root = meta(concat!(
            "<article-id pub-id-type=\"publisher-id\" specific-use=\"scielo-v3\">TPg77CCrGj4wcbLCh9vG8bS</article-id>",
            "<article-id pub-id-type=\"publisher-id\" specific-use=\"scielo-v2\">S0104-11692020000100303</article-id>",
            "<article-id specific-use=\"previous-pid\">S0104-11692019005000101</article-id>",
            "<article-id pub-id-type=\"doi\">10.1590/1518-8345.3129.3236</article-id>",
        ));
        let ids = read(root.find(ARTICLE_META).unwrap());
        assert_eq!(ids.v3.as_deref(), Some("TPg77CCrGj4wcbLCh9vG8bS"));
        assert_eq!(ids.v2.as_deref(), Some("S0104-11692020000100303"));
        assert_eq!(ids.aop_pid.as_deref(), Some("S0104-11692019005000101"));
    }

    #[test]
    fn plain_publisher_id_is_v2() {
        let root = meta("<article-id pub-id-type=\"publisher-id\">S0104-11692020000100303</article-id>");
        let ids = read(root.find(ARTICLE_META).unwrap());
        assert_eq!(ids.v2.as_deref(), Some("S0104-11692020000100303"));
        assert_eq!(ids.v3, None);
    }

    #[test]
    fn creates_missing_ids_in_order() {
        let mut root = meta("<article-id pub-id-type=\"doi\">10.1/x</article-id>");
        update_ids(&mut root, "v3value", Some("S0001-00002024000100001"), None).unwrap();
        let article_meta = root.find(ARTICLE_META).unwrap();
        let ids = article_meta.elements_named(ARTICLE_ID).map(|e| e.text()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["v3value", "S0001-00002024000100001", "10.1/x"]);
        let written = read(article_meta);
        assert_eq!(written.v3.as_deref(), Some("v3value"));
        assert_eq!(written.aop_pid, None);
    }

    #[test]
    fn replaces_existing_ids() {
        let mut root = meta("<article-id pub-id-type=\"publisher-id\" specific-use=\"scielo-v3\">old</article-id>");
        update_ids(&mut root, "new", None, Some("S0001-00002023005000001")).unwrap();
        let ids = read(root.find(ARTICLE_META).unwrap());
        assert_eq!(ids.v3.as_deref(), Some("new"));
        assert_eq!(ids.aop_pid.as_deref(), Some("S0001-00002023005000001"));
        assert_eq!(root.find(ARTICLE_META).unwrap().elements_named(ARTICLE_ID).count(), 2);
    }

    #[test]
    fn requires_article_meta() {
        let mut root = Element::parse("<article><front/></article>").unwrap();
        let err = update_ids(&mut root, "v3", None, None).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidDocument("article-meta")));
    }
}
