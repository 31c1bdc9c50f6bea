mod common;

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use common::{Article, Workspace, read_package};
use pidr_provider::error::ErrorKind;
use pidr_provider::{Outcome, Provider, V3_LENGTH};
use pidr_xml::{Extract, Extracted};
use rstest::rstest;

#[tokio::test]
async fn registers_and_embeds_identifiers() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let article = Article::new("10.1590/1518-8345.0001.4101", "Nursing care").with_v2("S0104-11692024000100301");
    let source = ws.package("source.zip", &[("a.xml", article.xml())]);
    let output = ws.path("out/result.zip");

    let manifest = provider.request_document_id(&source, &output, "editor").await.unwrap();
    assert_eq!(manifest.output, output);
    assert!(manifest.is_complete());
    let entry = manifest.entry("a.xml").unwrap();
    assert_eq!(entry.outcome, Outcome::Registered);
    assert_eq!(entry.previous.v3, None);
    assert_eq!(entry.ids.v3.len(), V3_LENGTH);
    assert_eq!(entry.ids.v2.as_deref(), Some("S0104-11692024000100301"));

    let written = read_package(&output);
    let xml = written.get("a.xml").unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE article PUBLIC"));
    assert!(xml.contains(&format!(r#"specific-use="scielo-v3">{}</article-id>"#, entry.ids.v3)));
    assert_eq!(&provider.get_xml(&entry.ids.v3).await.unwrap(), xml);
}

#[tokio::test]
async fn resubmission_is_idempotent() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let source = ws.package("source.zip", &[("a.xml", Article::new("10.1590/a", "Alpha").xml())]);

    let first = provider.request_document_id(&source, &ws.path("first.zip"), "editor").await.unwrap();
    let second = provider.request_document_id(&source, &ws.path("second.zip"), "editor").await.unwrap();
    assert_eq!(first.entries[0].outcome, Outcome::Registered);
    assert_eq!(second.entries[0].outcome, Outcome::Matched);
    assert_eq!(first.entries[0].ids, second.entries[0].ids);

    // Submitting the already identified output changes nothing either.
    let third = provider.request_document_id(&ws.path("second.zip"), &ws.path("third.zip"), "editor").await.unwrap();
    assert_eq!(third.entries[0].ids.v3, first.entries[0].ids.v3);
    assert_eq!(third.entries[0].previous.v3.as_deref(), Some(first.entries[0].ids.v3.as_str()));
    assert_eq!(read_package(&ws.path("second.zip")), read_package(&ws.path("third.zip")));
}

#[tokio::test]
async fn same_content_in_differently_named_package() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let xml = Article::new("10.1590/a", "Alpha").xml();
    let one = ws.package("one.zip", &[("article.xml", xml.clone())]);
    let two = ws.package("two.zip", &[("renamed.xml", xml)]);

    let first = provider.request_document_id(&one, &ws.path("out1.zip"), "editor").await.unwrap();
    let second = provider.request_document_id(&two, &ws.path("out2.zip"), "someone-else").await.unwrap();
    assert_eq!(first.entries[0].ids.v3, second.entries[0].ids.v3);
    assert_eq!(second.entries[0].name, "renamed.xml");
}

#[tokio::test]
async fn cosmetic_whitespace_does_not_change_identity() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let one = ws.package("one.zip", &[("a.xml", Article::new("10.1590/a", "Alpha  study").xml())]);
    let two = ws.package("two.zip", &[("a.xml", Article::new("10.1590/A", "Alpha study").xml())]);

    let first = provider.request_document_id(&one, &ws.path("out1.zip"), "editor").await.unwrap();
    let second = provider.request_document_id(&two, &ws.path("out2.zip"), "editor").await.unwrap();
    assert_eq!(first.entries[0].ids.v3, second.entries[0].ids.v3);
}

#[tokio::test]
async fn legacy_identifier_takes_precedence() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let original = ws.package("v1.zip", &[("a.xml", Article::new("10.1590/a", "Alpha").with_v2("S0001").xml())]);
    let revised = ws.package("v2.zip", &[("a.xml", Article::new("10.1590/a", "Alpha (errata)").with_v2("S0001").xml())]);
    let other = ws.package("v3.zip", &[("a.xml", Article::new("10.1590/a", "Alpha (errata)").with_v2("S0002").xml())]);

    let first = provider.request_document_id(&original, &ws.path("o1.zip"), "editor").await.unwrap();
    let second = provider.request_document_id(&revised, &ws.path("o2.zip"), "editor").await.unwrap();
    assert_eq!(second.entries[0].outcome, Outcome::Matched);
    assert_eq!(first.entries[0].ids.v3, second.entries[0].ids.v3);
    assert!(provider.get_xml(&first.entries[0].ids.v3).await.unwrap().contains("Alpha (errata)"));

    // Same content but another legacy identifier: content lookup still finds it.
    let third = provider.request_document_id(&other, &ws.path("o3.zip"), "editor").await.unwrap();
    assert_eq!(third.entries[0].ids.v3, first.entries[0].ids.v3);
    assert_eq!(third.entries[0].ids.v2.as_deref(), Some("S0002"));
}

#[tokio::test]
async fn ahead_of_print_identifier_finds_the_aop_version() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let aop = ws.package("aop.zip", &[("a.xml", Article::new("10.1590/a", "Early").with_v2("S-AOP-0001").xml())]);
    let issue = ws.package(
        "issue.zip",
        &[("a.xml", Article::new("10.1590/a", "Final").with_v2("S0001").with_aop_pid("S-AOP-0001").xml())],
    );

    let early = provider.request_document_id(&aop, &ws.path("o1.zip"), "editor").await.unwrap();
    let published = provider.request_document_id(&issue, &ws.path("o2.zip"), "editor").await.unwrap();
    assert_eq!(published.entries[0].outcome, Outcome::Matched);
    assert_eq!(published.entries[0].ids.v3, early.entries[0].ids.v3);
    assert_eq!(published.entries[0].ids.aop_pid.as_deref(), Some("S-AOP-0001"));
}

#[tokio::test]
async fn get_xml_of_unknown_document() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let err = provider.get_xml("nonexistent-v3").await.unwrap_err();
    assert_eq!(*err, ErrorKind::NotFound("nonexistent-v3".to_string()));
}

#[rstest]
#[case(1)]
#[case(3)]
#[tokio::test]
async fn one_output_entry_per_input_entry(#[case] count: usize) {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let entries = (0..count)
        .map(|i| (format!("doc{i}.xml"), Article::new(&format!("10.1590/{i}"), &format!("Title {i}")).xml()))
        .collect::<Vec<_>>();
    let entries = entries.iter().map(|(name, xml)| (name.as_str(), xml.clone())).collect::<Vec<_>>();
    let source = ws.package("source.zip", &entries);

    let manifest = provider.request_document_id(&source, &ws.path("out.zip"), "editor").await.unwrap();
    assert_eq!(manifest.entries.len(), count);
    let written = read_package(&ws.path("out.zip"));
    assert_eq!(written.len(), count);
    assert!(manifest.entries.iter().all(|entry| written.contains_key(&entry.name)));
    let distinct = manifest.entries.iter().map(|entry| entry.ids.v3.clone()).collect::<HashSet<_>>();
    assert_eq!(distinct.len(), count);
}

#[tokio::test]
async fn package_without_xml_is_rejected() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let source = ws.path("source.zip");
    write_pdf_only(&source);

    let err = provider.request_document_id(&source, &ws.path("out.zip"), "editor").await.unwrap_err();
    assert_eq!(*err, ErrorKind::InputData);
    assert!(!ws.path("out.zip").exists());
}

#[tokio::test]
async fn unreadable_package_is_rejected() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let err = provider.request_document_id(&ws.path("missing.zip"), &ws.path("out.zip"), "editor").await.unwrap_err();
    assert_eq!(*err, ErrorKind::InputData);
}

#[tokio::test]
async fn malformed_entries_are_skipped_and_reported() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let source = ws.package(
        "source.zip",
        &[("good.xml", Article::new("10.1590/a", "Alpha").xml()), ("broken.xml", "<article><front>".to_string())],
    );

    let manifest = provider.request_document_id(&source, &ws.path("out.zip"), "editor").await.unwrap();
    assert_eq!(manifest.entries.len(), 1);
    assert_eq!(manifest.failures.len(), 1);
    assert_eq!(manifest.failures[0].name, "broken.xml");
    assert_eq!(*manifest.failures[0].error, ErrorKind::Extraction("broken.xml".to_string()));
    assert!(!manifest.is_complete());
    assert_eq!(read_package(&ws.path("out.zip")).into_keys().collect::<Vec<_>>(), vec!["good.xml"]);
}

#[tokio::test]
async fn package_of_only_malformed_entries_fails() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let source = ws.package("source.zip", &[("a.xml", "not xml".to_string()), ("b.xml", "<x>".to_string())]);
    let err = provider.request_document_id(&source, &ws.path("out.zip"), "editor").await.unwrap_err();
    assert_eq!(*err, ErrorKind::Extraction("a.xml".to_string()));
}

#[tokio::test]
async fn unreachable_store_fails_after_one_retry() {
    let ws = Workspace::new();
    let provider = Provider::new("sqlite:///nonexistent/directory/registry.db");
    let source = ws.package("source.zip", &[("a.xml", Article::new("10.1590/a", "Alpha").xml())]);
    let err = provider.request_document_id(&source, &ws.path("out.zip"), "editor").await.unwrap_err();
    assert_eq!(*err, ErrorKind::Connect);
}

#[tokio::test]
async fn lost_connection_is_recovered_once() {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let source = ws.package("source.zip", &[("a.xml", Article::new("10.1590/a", "Alpha").xml())]);
    let first = provider.request_document_id(&source, &ws.path("o1.zip"), "editor").await.unwrap();

    // Simulate a dropped connection: the current pool stops answering.
    provider.connections().get().await.unwrap().database().close().await;

    let second = provider.request_document_id(&source, &ws.path("o2.zip"), "editor").await.unwrap();
    assert_eq!(second.entries[0].ids.v3, first.entries[0].ids.v3);
}

/// Closes the registry connection the first time it extracts a document
/// containing `trigger`.
struct DisconnectOn {
    trigger: &'static str,
    provider: Provider,
    fired: AtomicBool,
}
impl Extract for DisconnectOn {
    fn extract(&self, xml: &str) -> pidr_xml::error::Result<Extracted> {
        if xml.contains(self.trigger) && !self.fired.swap(true, Ordering::SeqCst) {
            tokio::task::block_in_place(|| {
                tokio::runtime::Handle::current().block_on(async {
                    let connection = self.provider.connections().get().await.unwrap();
                    connection.database().close().await;
                })
            });
        }
        pidr_xml::extract(xml)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn retry_keeps_entries_registered_before_the_failure() {
    let ws = Workspace::new();
    let base = Provider::new(ws.store_uri());
    let provider = base.clone().with_extractor(DisconnectOn { trigger: "Beta", provider: base, fired: AtomicBool::new(false) });
    let source = ws.package(
        "source.zip",
        &[("a.xml", Article::new("10.1590/a", "Alpha").xml()), ("b.xml", Article::new("10.1590/b", "Beta").xml())],
    );

    let manifest = provider.request_document_id(&source, &ws.path("out.zip"), "editor").await.unwrap();
    assert_eq!(manifest.entry("a.xml").unwrap().outcome, Outcome::Registered);
    assert_eq!(manifest.entry("b.xml").unwrap().outcome, Outcome::Registered);

    // A later request for the same package only matches.
    let again = provider.request_document_id(&source, &ws.path("again.zip"), "editor").await.unwrap();
    assert!(again.entries.iter().all(|entry| entry.outcome == Outcome::Matched));
    assert_eq!(again.entry("a.xml").unwrap().ids, manifest.entry("a.xml").unwrap().ids);
}

#[rstest]
#[case("result")]
#[case("result.xml")]
#[tokio::test]
async fn output_is_a_zip_whatever_its_name(#[case] name: &str) {
    let ws = Workspace::new();
    let provider = Provider::new(ws.store_uri());
    let source = ws.package("source.zip", &[("a.xml", Article::new("10.1590/a", "Alpha").xml())]);
    let output = ws.path(name);

    let manifest = provider.request_document_id(&source, &output, "editor").await.unwrap();
    let written = pidr_archive::read_zip_entries(&output, None).unwrap();
    assert_eq!(written.into_keys().collect::<Vec<_>>(), vec!["a.xml"]);
    assert_eq!(manifest.entries[0].outcome, Outcome::Registered);
}

#[tokio::test]
async fn one_shot_request() {
    let ws = Workspace::new();
    let source = ws.package("source.zip", &[("a.xml", Article::new("10.1590/a", "Alpha").xml())]);
    let manifest =
        pidr_provider::request_document_id(&source, &ws.path("out.zip"), "editor", &ws.store_uri()).await.unwrap();
    assert_eq!(manifest.entries.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_register_once() {
    let ws = Workspace::new();
    Provider::new(ws.store_uri()).connect().await.unwrap();
    let source = ws.package("source.zip", &[("a.xml", Article::new("10.1590/a", "Alpha").xml())]);

    let requests = (0..6).map(|i| {
        let provider = Provider::new(ws.store_uri());
        let source = source.clone();
        let output = ws.path(&format!("out{i}.zip"));
        tokio::spawn(async move { provider.request_document_id(&source, &output, "editor").await })
    });
    let manifests = futures::future::join_all(requests)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect::<Vec<_>>();

    let v3s = manifests.iter().map(|manifest| manifest.entries[0].ids.v3.clone()).collect::<HashSet<_>>();
    assert_eq!(v3s.len(), 1);
    let registered = manifests.iter().filter(|manifest| manifest.entries[0].outcome == Outcome::Registered).count();
    assert_eq!(registered, 1);
}

fn write_pdf_only(path: &Path) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    writer.start_file("document.pdf", zip::write::SimpleFileOptions::default()).unwrap();
    writer.write_all(b"%PDF-1.7").unwrap();
    writer.finish().unwrap();
}
