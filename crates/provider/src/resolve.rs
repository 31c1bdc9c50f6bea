//! Identity resolution: find the registration a document already has, or mint
//! and register a new one.
//!
//! ```text
//! Extracted ─┬─ legacy ids ─▶ LegacyLookup ──┬─ found ─────▶ Matched ──┐
//!            └─ otherwise ──▶ ContentLookup ─┤                         ├─▶ Embedded ─▶ Refreshed
//!                                            └─ not found ─▶ Minting ──┘
//!                                               (a lost race falls back to Matched)
//! ```
//!
//! No lock decides identity: concurrent requesters race on the registry's
//! unique indexes and the losers re-read the winner.

use exn::ResultExt;
use pidr_registry::error::ErrorKind as RegistryErrorKind;
use pidr_registry::{Document, IdentityKey, Repository};
use pidr_xml::models::{ArticleIds, Record};
use pidr_xml::{Extracted, update_ids};
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::manifest::{Outcome, ResolvedIds};
use crate::mint::mint_v3;

/// Fresh `v3` values tried before giving up on an insert that keeps colliding
/// with an existing `v3`.
const MINT_ATTEMPTS: usize = 3;

/// A resolved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub ids: ResolvedIds,
    pub outcome: Outcome,
    /// The document's XML (preamble included) with the identifiers embedded.
    pub xml: String,
    pub refresh_error: Option<String>,
}

/// Finds the registration matching the document's identifiers or content.
///
/// Legacy identifiers take precedence over content: `v2` first, then the
/// ahead-of-print `aop_pid`, then the [`IdentityKey`].
pub async fn lookup(repository: &Repository, ids: &ArticleIds, key: &IdentityKey) -> Result<Option<Document>> {
    let fetch = |err| ErrorKind::registry(err, ErrorKind::Fetch);
    if let Some(v2) = &ids.v2
        && let Some(document) = repository.get_by_v2(v2).await.map_err(fetch)?
    {
        return Ok(Some(document));
    }
    if let Some(aop_pid) = &ids.aop_pid
        && let Some(document) = repository.get_by_aop_pid(aop_pid).await.map_err(fetch)?
    {
        return Ok(Some(document));
    }
    repository.get_by_identity_key(key).await.map_err(fetch)
}

/// Adopts a registration: its `v3`, and its legacy identifiers wherever the
/// document itself carries none.
fn matched(document: Document, ids: &ArticleIds) -> ResolvedIds {
    ResolvedIds {
        v3: document.v3,
        v2: ids.v2.clone().or(document.v2),
        aop_pid: ids.aop_pid.clone().or(document.aop_pid),
    }
}

fn embed(extracted: &mut Extracted, ids: &ResolvedIds) -> Result<String> {
    update_ids(&mut extracted.tree, &ids.v3, ids.v2.as_deref(), ids.aop_pid.as_deref())
        .or_raise(|| ErrorKind::Create)?;
    Ok(extracted.to_xml())
}

/// Resolves the identity of an extracted document, embeds the identifiers into
/// its tree and keeps the registry record current.
///
/// - **[`Outcome::Matched`]**: the registration is refreshed with the
///   submitted metadata and XML. The refresh is best-effort: its failure is
///   logged and reported in [`Resolution::refresh_error`], the identifiers
///   stand regardless.
/// - **[`Outcome::Registered`]**: a new `v3` is minted and the document is
///   registered with the identifiers already embedded. Should the insert
///   collide with a concurrent registration of the same document, that
///   registration is adopted instead.
///
/// # Errors
///
/// - [`ErrorKind::Connect`] if the registry became unreachable.
/// - [`ErrorKind::Fetch`] / [`ErrorKind::Create`] for other registry failures.
/// - [`ErrorKind::NotUnique`] if an insert collided but nothing it could have
///   collided with exists.
#[instrument(skip_all, fields(requester = %requester, v3, outcome))]
pub async fn resolve(repository: &Repository, extracted: &mut Extracted, requester: &str) -> Result<Resolution> {
    let Record { ids, metadata } = extracted.record.clone();
    let key = IdentityKey::from_metadata(&metadata).or_raise(|| ErrorKind::Create)?;

    let (resolved, outcome) = match lookup(repository, &ids, &key).await? {
        Some(document) => (matched(document, &ids), Outcome::Matched),
        None => register(repository, extracted, &ids, &key, requester).await?,
    };
    let span = tracing::Span::current();
    span.record("v3", resolved.v3.as_str());
    span.record("outcome", tracing::field::display(outcome));

    let xml = embed(extracted, &resolved)?;
    let refresh_error = match outcome {
        Outcome::Registered => None,
        Outcome::Matched => refresh(repository, &resolved, &extracted.record, &xml, requester).await,
    };
    Ok(Resolution { ids: resolved, outcome, xml, refresh_error })
}

async fn register(
    repository: &Repository,
    extracted: &mut Extracted,
    ids: &ArticleIds,
    key: &IdentityKey,
    requester: &str,
) -> Result<(ResolvedIds, Outcome)> {
    for attempt in 1..=MINT_ATTEMPTS {
        let resolved = ResolvedIds { v3: mint_v3(), v2: ids.v2.clone(), aop_pid: ids.aop_pid.clone() };
        let xml = embed(extracted, &resolved)?;
        let document = Document::new(&resolved.v3, ids, extracted.record.metadata.clone(), xml, requester)
            .or_raise(|| ErrorKind::Create)?;
        let err = match repository.insert(&document).await {
            Ok(()) => return Ok((resolved, Outcome::Registered)),
            Err(err) => err,
        };
        if !matches!(&*err, RegistryErrorKind::NotUnique) {
            return Err(ErrorKind::registry(err, ErrorKind::Create));
        }
        // Someone registered this document first: adopt their registration.
        if let Some(winner) = lookup(repository, ids, key).await? {
            tracing::debug!(v3 = %winner.v3, "lost registration race");
            return Ok((matched(winner, ids), Outcome::Matched));
        }
        // Otherwise the freshly minted v3 itself was taken.
        let taken = repository
            .get_by_v3(&resolved.v3)
            .await
            .map_err(|err| ErrorKind::registry(err, ErrorKind::Fetch))?
            .is_some();
        if !taken {
            return Err(err.raise(ErrorKind::NotUnique));
        }
        tracing::warn!(v3 = %resolved.v3, attempt, "minted v3 already registered");
    }
    exn::bail!(ErrorKind::Create)
}

/// Refreshes a matched registration; returns why it failed, if it did.
async fn refresh(
    repository: &Repository,
    resolved: &ResolvedIds,
    record: &Record,
    xml: &str,
    requester: &str,
) -> Option<String> {
    let ids = ArticleIds::new(Some(resolved.v3.clone()), resolved.v2.clone(), resolved.aop_pid.clone());
    let refreshed = match Document::new(&resolved.v3, &ids, record.metadata.clone(), xml, requester) {
        Ok(document) => repository.refresh(&document).await,
        Err(err) => Err(err),
    };
    let message = match refreshed {
        Ok(true) => return None,
        Ok(false) => "document is no longer registered".to_string(),
        Err(err) => (*err).to_string(),
    };
    tracing::warn!(v3 = %resolved.v3, error = %message, "unable to refresh registration");
    Some(message)
}
