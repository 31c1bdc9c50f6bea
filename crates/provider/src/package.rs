//! Processing of a whole document package.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use exn::{OptionExt, ResultExt};
use pidr_archive::error::Result as ArchiveResult;
use pidr_xml::Extract;
use tracing::instrument;

use crate::connection::Connection;
use crate::error::{ErrorKind, Result};
use crate::manifest::{Entry, Failure, Outcome, RequestManifest};
use crate::resolve::resolve;

/// Runs blocking archive I/O off the async runtime.
async fn blocking<T, F>(kind: ErrorKind, operation: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> ArchiveResult<T> + Send + 'static,
{
    let join_kind = kind.clone();
    tokio::task::spawn_blocking(operation).await.or_raise(|| join_kind)?.or_raise(|| kind)
}

/// Entries registered by one request, by name, kept across its attempts.
///
/// A retried request resolves again the entries an earlier attempt already
/// registered; those resolve as matches of its own registrations and are
/// reported as [`Outcome::Registered`] still.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registrations(BTreeMap<String, String>);
impl Registrations {
    fn settle(&mut self, entry: &mut Entry) {
        match entry.outcome {
            Outcome::Registered => {
                self.0.insert(entry.name.clone(), entry.ids.v3.clone());
            },
            Outcome::Matched if self.0.get(&entry.name) == Some(&entry.ids.v3) => entry.outcome = Outcome::Registered,
            Outcome::Matched => {},
        }
    }
}

/// Checks that every input entry was either resolved or failed, exactly once.
fn account(inputs: &BTreeMap<String, String>, outputs: &BTreeMap<String, String>, failures: &[Failure]) -> Result<()> {
    let failed = |name: &String| failures.iter().any(|failure| &failure.name == name);
    let accounted = inputs.keys().all(|name| outputs.contains_key(name) != failed(name));
    if !accounted || outputs.len() + failures.len() != inputs.len() {
        exn::bail!(ErrorKind::Conclusion);
    }
    Ok(())
}

/// Extracts and resolves a single entry, returning its manifest entry and the
/// XML to write to the output package.
///
/// Extraction failures are [`ErrorKind::Extraction`], naming the entry.
#[instrument(skip(connection, extractor, xml, requester), fields(xml_size = xml.len()))]
pub async fn resolve_entry(
    connection: &Connection,
    extractor: &(dyn Extract + Send + Sync),
    name: &str,
    xml: &str,
    requester: &str,
) -> Result<(Entry, String)> {
    let mut extracted = extractor.extract(xml).or_raise(|| ErrorKind::Extraction(name.to_string()))?;
    let previous = extracted.record.ids.clone();
    let resolution = resolve(connection.repository(), &mut extracted, requester).await?;
    let entry = Entry {
        name: name.to_string(),
        previous,
        ids: resolution.ids,
        outcome: resolution.outcome,
        refresh_error: resolution.refresh_error,
    };
    Ok((entry, resolution.xml))
}

/// Resolves every XML document of the `source` package and writes them, with
/// their identifiers embedded, to the `output` package under the same names.
///
/// Entries are processed in name order, independently of one another. An
/// entry that cannot be extracted is skipped and listed in
/// [`RequestManifest::failures`]; any other failure aborts the request.
///
/// # Errors
///
/// - [`ErrorKind::InputData`] if the source is unreadable or holds no XML.
/// - The first entry's [`ErrorKind::Extraction`] if *no* entry could be extracted.
/// - [`ErrorKind::Conclusion`] if some entry is neither resolved nor failed.
/// - [`ErrorKind::InvalidPackage`] if the output cannot be written, or does
///   not hold exactly the resolved entries when read back.
/// - Registry failures of [`resolve`](crate::resolve::resolve).
///
/// Entries this request registers are recorded in `registrations`, so that
/// a retry of the request reports them as registered.
#[instrument(skip(connection, extractor, source, output, registrations), fields(source = %source.display(), output = %output.display(), entries))]
pub async fn process(
    connection: &Connection,
    extractor: &(dyn Extract + Send + Sync),
    source: &Path,
    output: &Path,
    requester: &str,
    registrations: &mut Registrations,
) -> Result<RequestManifest> {
    let source_path = source.to_path_buf();
    let inputs = blocking(ErrorKind::InputData, move || pidr_archive::read_xml_entries(&source_path, None)).await?;
    if inputs.is_empty() {
        exn::bail!(ErrorKind::InputData);
    }
    tracing::Span::current().record("entries", inputs.len());

    let mut entries = Vec::with_capacity(inputs.len());
    let mut failures = Vec::new();
    let mut outputs = BTreeMap::new();
    for (name, xml) in &inputs {
        match resolve_entry(connection, extractor, name, xml, requester).await {
            Ok((mut entry, xml)) => {
                registrations.settle(&mut entry);
                outputs.insert(name.clone(), xml);
                entries.push(entry);
            },
            Err(err) if matches!(&*err, ErrorKind::Extraction(_)) => {
                tracing::warn!(entry = %name, error = ?err, "skipping entry");
                failures.push(Failure { name: name.clone(), error: err });
            },
            Err(err) => return Err(err),
        }
    }
    if entries.is_empty() {
        // Nothing could be extracted: report the first entry's failure.
        let first = failures.into_iter().next().ok_or_raise(|| ErrorKind::Conclusion)?;
        return Err(first.error);
    }
    account(&inputs, &outputs, &failures)?;

    let output_path = output.to_path_buf();
    // The output is a zip whatever its name.
    let written = blocking(ErrorKind::InvalidPackage, move || {
        pidr_archive::write_xml_entries(&output_path, &outputs)?;
        pidr_archive::read_zip_entries(&output_path, None)
    })
    .await?;
    if !written.keys().eq(entries.iter().map(|entry| &entry.name)) {
        exn::bail!(ErrorKind::InvalidPackage);
    }

    Ok(RequestManifest { output: PathBuf::from(output), entries, failures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ResolvedIds;
    use pidr_xml::models::ArticleIds;

    fn entry(name: &str, v3: &str, outcome: Outcome) -> Entry {
        Entry {
            name: name.to_string(),
            previous: ArticleIds::default(),
            ids: ResolvedIds { v3: v3.to_string(), v2: None, aop_pid: None },
            outcome,
            refresh_error: None,
        }
    }

    fn names(pairs: &[&str]) -> BTreeMap<String, String> {
        pairs.iter().map(|name| (name.to_string(), String::new())).collect()
    }

    fn failure(name: &str) -> Failure {
        Failure { name: name.to_string(), error: exn::Exn::from(ErrorKind::Extraction(name.to_string())) }
    }

    #[test]
    fn retried_registrations_stay_registered() {
        let mut registrations = Registrations::default();
        let mut first = entry("a.xml", "v3a", Outcome::Registered);
        registrations.settle(&mut first);

        let mut retried = entry("a.xml", "v3a", Outcome::Matched);
        registrations.settle(&mut retried);
        assert_eq!(retried.outcome, Outcome::Registered);

        // Another entry matching the same registration did not register it.
        let mut duplicate = entry("b.xml", "v3a", Outcome::Matched);
        registrations.settle(&mut duplicate);
        assert_eq!(duplicate.outcome, Outcome::Matched);

        let mut other = entry("c.xml", "v3c", Outcome::Matched);
        registrations.settle(&mut other);
        assert_eq!(other.outcome, Outcome::Matched);
    }

    #[test]
    fn every_input_is_accounted_for() {
        let inputs = names(&["a.xml", "b.xml", "c.xml"]);
        account(&inputs, &names(&["a.xml", "c.xml"]), &[failure("b.xml")]).unwrap();

        let err = account(&inputs, &names(&["a.xml", "c.xml"]), &[]).unwrap_err();
        assert_eq!(*err, ErrorKind::Conclusion);
        let err = account(&inputs, &names(&["a.xml", "c.xml"]), &[failure("d.xml")]).unwrap_err();
        assert_eq!(*err, ErrorKind::Conclusion);
        let err = account(&inputs, &names(&["a.xml", "b.xml", "c.xml"]), &[failure("b.xml")]).unwrap_err();
        assert_eq!(*err, ErrorKind::Conclusion);
    }
}
