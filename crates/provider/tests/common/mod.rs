#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A minimal SciELO PS article.
pub struct Article<'a> {
    pub v2: Option<&'a str>,
    pub aop_pid: Option<&'a str>,
    pub doi: &'a str,
    pub title: &'a str,
}
impl<'a> Article<'a> {
    pub fn new(doi: &'a str, title: &'a str) -> Self {
        Self { v2: None, aop_pid: None, doi, title }
    }

    pub fn with_v2(mut self, v2: &'a str) -> Self {
        self.v2 = Some(v2);
        self
    }

    pub fn with_aop_pid(mut self, aop_pid: &'a str) -> Self {
        self.aop_pid = Some(aop_pid);
        self
    }

    pub fn xml(&self) -> String {
        let id = |specific_use: &str, value: Option<&str>| {
            value
                .map(|value| {
                    format!(r#"<article-id pub-id-type="publisher-id" specific-use="{specific_use}">{value}</article-id>"#)
                })
                .unwrap_or_default()
        };
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE article PUBLIC "-//NLM//DTD JATS (Z39.96) Journal Publishing DTD v1.1 20151215//EN" "https://jats.nlm.nih.gov/publishing/1.1/JATS-journalpublishing1.dtd">
<article xmlns:xlink="http://www.w3.org/1999/xlink" article-type="research-article" xml:lang="en">
  <front>
    <journal-meta>
      <issn pub-type="epub">1518-8345</issn>
    </journal-meta>
    <article-meta>
      {v2}{aop_pid}<article-id pub-id-type="doi">{doi}</article-id>
      <title-group><article-title>{title}</article-title></title-group>
      <contrib-group>
        <contrib contrib-type="author"><name><surname>Silva</surname><given-names>Maria</given-names></name></contrib>
      </contrib-group>
      <pub-date pub-type="collection"><year>2024</year></pub-date>
      <volume>32</volume>
      <elocation-id>e4101</elocation-id>
    </article-meta>
  </front>
  <body><sec><p>{title}: introduction.</p></sec></body>
</article>"#,
            v2 = id("scielo-v2", self.v2),
            aop_pid = id("previous-pid", self.aop_pid),
            doi = self.doi,
            title = self.title,
        )
    }
}

/// Scratch space for a test: a registry database and packages.
pub struct Workspace {
    pub dir: TempDir,
}
impl Workspace {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    pub fn store_uri(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.dir.path().join("registry.db").display())
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes a zip package holding the given entries.
    pub fn package(&self, name: &str, entries: &[(&str, String)]) -> PathBuf {
        let path = self.path(name);
        let entries = entries
            .iter()
            .map(|(name, content)| (name.to_string(), content.clone()))
            .collect::<BTreeMap<_, _>>();
        pidr_archive::write_xml_entries(&path, &entries).unwrap();
        path
    }
}

pub fn read_package(path: &Path) -> BTreeMap<String, String> {
    pidr_archive::read_xml_entries(path, None).unwrap()
}
