use pidr_xml::models as xml;

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct DoiProxy {
    #[facet(rename = "d")]
    pub(crate) doi: String,
    #[facet(rename = "l")]
    pub(crate) lang: String,
}
impl From<&xml::DoiWithLang> for DoiProxy {
    fn from(doi: &xml::DoiWithLang) -> Self {
        Self { doi: doi.doi.clone(), lang: doi.lang.clone() }
    }
}
impl From<DoiProxy> for xml::DoiWithLang {
    fn from(doi: DoiProxy) -> Self {
        Self { doi: doi.doi, lang: doi.lang }
    }
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct IssnProxy {
    #[facet(rename = "t")]
    pub(crate) kind: String,
    #[facet(rename = "v")]
    pub(crate) value: String,
}
impl From<&xml::Issn> for IssnProxy {
    fn from(issn: &xml::Issn) -> Self {
        Self { kind: issn.kind.clone(), value: issn.value.clone() }
    }
}
impl From<IssnProxy> for xml::Issn {
    fn from(issn: IssnProxy) -> Self {
        Self { kind: issn.kind, value: issn.value }
    }
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct AuthorProxy {
    #[facet(rename = "s")]
    pub(crate) surname: String,
    #[facet(rename = "g")]
    pub(crate) given_names: String,
    #[facet(rename = "p")]
    pub(crate) prefix: String,
    #[facet(rename = "x")]
    pub(crate) suffix: String,
    #[facet(rename = "o")]
    pub(crate) orcid: String,
}
impl From<&xml::Author> for AuthorProxy {
    fn from(author: &xml::Author) -> Self {
        Self {
            surname: author.surname.clone(),
            given_names: author.given_names.clone(),
            prefix: author.prefix.clone(),
            suffix: author.suffix.clone(),
            orcid: author.orcid.clone(),
        }
    }
}
impl From<AuthorProxy> for xml::Author {
    fn from(author: AuthorProxy) -> Self {
        Self {
            surname: author.surname,
            given_names: author.given_names,
            prefix: author.prefix,
            suffix: author.suffix,
            orcid: author.orcid,
        }
    }
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct TitleProxy {
    #[facet(rename = "l")]
    pub(crate) lang: String,
    #[facet(rename = "t")]
    pub(crate) title: String,
}

/// Only used as identity key material; the issue descriptor has its own columns.
#[derive(facet::Facet)]
pub(crate) struct IssueProxy {
    pub(crate) volume: String,
    pub(crate) number: String,
    pub(crate) suppl: String,
    pub(crate) fpage: String,
    pub(crate) fpage_seq: String,
    pub(crate) lpage: String,
    pub(crate) elocation_id: String,
    pub(crate) pub_year: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_json::{from_str as from_json, to_string as to_json};

    #[test]
    fn author_json_keys_are_short() {
        let author = xml::Author {
            surname: "Silva".to_string(),
            given_names: "Maria".to_string(),
            orcid: "0000-0001-2345-6789".to_string(),
            ..Default::default()
        };
        let json = to_json(&vec![AuthorProxy::from(&author)]).unwrap();
        assert!(json.contains(r#""s":"Silva""#));
        assert!(json.contains(r#""o":"0000-0001-2345-6789""#));
        let back = from_json::<Vec<AuthorProxy>>(&json).unwrap();
        assert_eq!(xml::Author::from(back.into_iter().next().unwrap()), author);
    }

    #[test]
    fn doi_from_json() {
        let dois = from_json::<Vec<DoiProxy>>(r#"[{"d":"10.1590/x","l":"en"}]"#).unwrap();
        assert_eq!(dois, vec![DoiProxy { doi: "10.1590/x".to_string(), lang: "en".to_string() }]);
    }
}
