//! Persistent identifier provider for article document packages.
//!
//! Given a package (zip archive) of XML article documents, the [`Provider`]
//! resolves each document's identity against the registry, minting a new
//! `v3` only for documents that were never registered, embeds the
//! identifiers into the XML and writes the result to a new package.

pub mod connection;
pub mod error;
mod manifest;
mod mint;
pub mod package;
pub mod resolve;

use std::path::Path;
use std::sync::Arc;

use pidr_config::Config;
use pidr_xml::{Extract, SpsExtractor};
use tracing::instrument;

pub use crate::connection::{Connection, ConnectionManager};
use crate::error::{ErrorKind, Result};
pub use crate::manifest::{Entry, Failure, Outcome, RequestManifest, ResolvedIds};
pub use crate::mint::{V3_LENGTH, mint_v3};
use crate::package::Registrations;

/// Entry point to the registry: owns the connection to the store and the
/// metadata extractor.
///
/// # Examples
///
/// ```no_run
/// use pidr_provider::Provider;
/// use std::path::Path;
///
/// # async fn example() -> pidr_provider::error::Result<()> {
/// let provider = Provider::new("sqlite://registry.db?mode=rwc");
/// let manifest = provider
///     .request_document_id(Path::new("package.zip"), Path::new("out/package.zip"), "editor")
///     .await?;
/// for entry in &manifest.entries {
///     println!("{entry}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Provider {
    connections: Arc<ConnectionManager>,
    extractor: Arc<dyn Extract + Send + Sync>,
}
impl Provider {
    /// Creates a provider for the store at `uri`. Nothing connects until first use.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { connections: Arc::new(ConnectionManager::new(uri)), extractor: Arc::new(SpsExtractor) }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.store.uri.clone())
    }

    /// Replaces the default SciELO PS metadata extraction.
    #[must_use]
    pub fn with_extractor(mut self, extractor: impl Extract + Send + Sync + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Establishes (or re-establishes) the registry connection explicitly.
    pub async fn connect(&self) -> Result<()> {
        self.connections.connect().await?;
        Ok(())
    }

    /// Returns the stored XML (preamble included) of a registered document.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotFound`] if no document is registered as `v3`.
    #[instrument(skip(self))]
    pub async fn get_xml(&self, v3: &str) -> Result<String> {
        let connection = self.connections.get().await?;
        let xml = connection
            .repository()
            .get_xml(v3)
            .await
            .map_err(|err| ErrorKind::registry(err, ErrorKind::Fetch))?;
        xml.ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(v3.to_string())))
    }

    /// Resolves every document of the `source` package and writes the result
    /// to `output`. See [`package::process`].
    ///
    /// A request failing because the registry is unreachable (including when
    /// first connecting) reconnects once and is retried once, from the start.
    /// A second connectivity failure is returned as [`ErrorKind::Connect`].
    /// Entries registered before the failure are reported as registered by
    /// the retry too.
    #[instrument(skip(self, source, output), fields(source = %source.display(), output = %output.display()))]
    pub async fn request_document_id(&self, source: &Path, output: &Path, requester: &str) -> Result<RequestManifest> {
        let mut registrations = Registrations::default();
        match self.try_request(source, output, requester, &mut registrations).await {
            Err(err) if err.is_retryable() => {
                tracing::warn!(error = ?err, "registry unreachable, retrying request once");
                self.connections.reconnect().await?;
                self.try_request(source, output, requester, &mut registrations).await
            },
            result => result,
        }
    }

    async fn try_request(
        &self,
        source: &Path,
        output: &Path,
        requester: &str,
        registrations: &mut Registrations,
    ) -> Result<RequestManifest> {
        let connection = self.connections.get().await?;
        package::process(&connection, self.extractor.as_ref(), source, output, requester, registrations).await
    }
}

/// One-shot convenience: [`Provider::request_document_id`] against the store at `store_uri`.
pub async fn request_document_id(
    source: &Path,
    output: &Path,
    requester: &str,
    store_uri: &str,
) -> Result<RequestManifest> {
    Provider::new(store_uri).request_document_id(source, output, requester).await
}
