//! Lazily established, replaceable registry connections.
//!
//! Operations receive an explicit [`Connection`]: an immutable, cheaply
//! clonable handle on the registry. The [`ConnectionManager`] owns the current
//! one, creates it on first use and swaps in a brand-new one on
//! [`reconnect`](ConnectionManager::reconnect). Callers still holding the
//! previous handle keep using it until they finish.

use pidr_registry::{Database, Repository};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// An open registry: the database pool and the repository over it.
#[derive(Debug, Clone)]
pub struct Connection {
    database: Database,
    repository: Repository,
}
impl Connection {
    /// Opens (and migrates) the registry at `uri`.
    ///
    /// # Errors
    ///
    /// Any failure to establish a usable registry is [`ErrorKind::Connect`].
    pub async fn open(uri: &str) -> Result<Self> {
        let database = Database::connect(uri).await.map_err(|err| ErrorKind::registry(err, ErrorKind::Connect))?;
        let repository = Repository::from(&database);
        Ok(Self { database, repository })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}

/// Owner of the current [`Connection`] for one store URI.
///
/// > **Note:** an in-memory store (`sqlite::memory:`) lives exactly as long as
/// > its connection: reconnecting starts over with an empty registry.
#[derive(Debug)]
pub struct ConnectionManager {
    uri: String,
    current: RwLock<Option<Connection>>,
}
impl ConnectionManager {
    /// Creates a manager without connecting; the first [`get`](Self::get) connects.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into(), current: RwLock::new(None) }
    }

    /// Returns the current connection, establishing it on first use.
    pub async fn get(&self) -> Result<Connection> {
        if let Some(connection) = self.current.read().await.as_ref() {
            return Ok(connection.clone());
        }
        let mut current = self.current.write().await;
        // Another caller may have connected while we waited for the lock.
        if let Some(connection) = current.as_ref() {
            return Ok(connection.clone());
        }
        let connection = Connection::open(&self.uri).await?;
        *current = Some(connection.clone());
        Ok(connection)
    }

    /// (Re)initializes the connection explicitly, replacing any current one.
    #[instrument(skip(self), fields(uri = %self.uri))]
    pub async fn connect(&self) -> Result<Connection> {
        let connection = Connection::open(&self.uri).await?;
        *self.current.write().await = Some(connection.clone());
        tracing::debug!("registry connection established");
        Ok(connection)
    }

    /// Replaces the current connection after a connectivity failure.
    ///
    /// The previous connection is dropped from the manager but not closed.
    pub async fn reconnect(&self) -> Result<Connection> {
        tracing::warn!(uri = %self.uri, "reconnecting to the registry");
        self.connect().await
    }
}
