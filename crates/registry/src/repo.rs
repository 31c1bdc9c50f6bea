//! Repository for registered documents.
//!
//! Identity issuance is serialized by the unique indexes alone (`v3`, `v2`
//! where present, `identity_key`): a losing concurrent insert fails with
//! [`ErrorKind::NotUnique`](crate::error::ErrorKind::NotUnique) and the caller
//! re-reads the winner.

use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::instrument;

use crate::error::{Result, SqlxResultExt};
use crate::models::{Document, DocumentRow};
use crate::{Database, IdentityKey};

/// Repository for managing documents in the registry database.
///
/// There is no delete: documents are only ever inserted or refreshed.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Insert/Update
    // =========================================================================

    /// Registers a new document.
    ///
    /// Fails with [`ErrorKind::NotUnique`](crate::error::ErrorKind::NotUnique)
    /// if its `v3`, `v2` or identity key is already registered.
    #[instrument(skip_all, fields(v3 = %document.v3, identity_key = %document.identity_key))]
    pub async fn insert(&self, document: &Document) -> Result<()> {
        let row = DocumentRow::try_from(document)?;
        sqlx::query(include_str!("../queries/insert_document.sql"))
            .bind(row.v3)
            .bind(row.v2)
            .bind(row.aop_pid)
            .bind(row.identity_key)
            .bind(row.doi_with_lang)
            .bind(row.issns)
            .bind(row.authors)
            .bind(row.article_titles)
            .bind(row.volume)
            .bind(row.number)
            .bind(row.suppl)
            .bind(row.fpage)
            .bind(row.fpage_seq)
            .bind(row.lpage)
            .bind(row.elocation_id)
            .bind(row.pub_year)
            .bind(row.collab)
            .bind(row.partial_body)
            .bind(row.xml)
            .bind(row.created_by)
            .bind(row.updated_by)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&self.pool)
            .await
            .or_classify()?;
        Ok(())
    }

    /// Refreshes the descriptive fields, identity key and XML of the document
    /// registered as `document.v3`, on behalf of `document.updated_by`.
    ///
    /// `v3` never changes and stored legacy identifiers are never replaced,
    /// only filled in when previously absent. Returns `false` if no document
    /// is registered under that `v3`.
    #[instrument(skip_all, fields(v3 = %document.v3))]
    pub async fn refresh(&self, document: &Document) -> Result<bool> {
        let row = DocumentRow::try_from(document)?;
        let result = sqlx::query(include_str!("../queries/refresh_document.sql"))
            .bind(row.v2)
            .bind(row.aop_pid)
            .bind(row.identity_key)
            .bind(row.doi_with_lang)
            .bind(row.issns)
            .bind(row.authors)
            .bind(row.article_titles)
            .bind(row.volume)
            .bind(row.number)
            .bind(row.suppl)
            .bind(row.fpage)
            .bind(row.fpage_seq)
            .bind(row.lpage)
            .bind(row.elocation_id)
            .bind(row.pub_year)
            .bind(row.collab)
            .bind(row.partial_body)
            .bind(row.xml)
            .bind(row.updated_by)
            .bind(UtcDateTime::now().unix_timestamp())
            .bind(row.v3)
            .execute(&self.pool)
            .await
            .or_classify()?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    async fn fetch_one(&self, query: &'static str, value: &str) -> Result<Option<Document>> {
        let row: Option<DocumentRow> =
            sqlx::query_as(query).bind(value).fetch_optional(&self.pool).await.or_classify()?;
        row.map(Document::try_from).transpose()
    }

    pub async fn get_by_v3(&self, v3: &str) -> Result<Option<Document>> {
        self.fetch_one(include_str!("../queries/get_by_v3.sql"), v3).await
    }

    pub async fn get_by_v2(&self, v2: &str) -> Result<Option<Document>> {
        self.fetch_one(include_str!("../queries/get_by_v2.sql"), v2).await
    }

    /// Get the document registered with an ahead-of-print identifier.
    ///
    /// Matches either the `aop_pid` column, or the `v2` of a document that was
    /// itself registered as the ahead-of-print version.
    pub async fn get_by_aop_pid(&self, aop_pid: &str) -> Result<Option<Document>> {
        self.fetch_one(include_str!("../queries/get_by_aop_pid.sql"), aop_pid).await
    }

    pub async fn get_by_identity_key(&self, key: &IdentityKey) -> Result<Option<Document>> {
        self.fetch_one(include_str!("../queries/get_by_identity_key.sql"), key.as_str()).await
    }

    /// Get the stored XML of a document, without decoding the rest of its row.
    pub async fn get_xml(&self, v3: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(include_str!("../queries/get_xml.sql"))
            .bind(v3)
            .fetch_optional(&self.pool)
            .await
            .or_classify()?;
        Ok(row.map(|(xml,)| xml))
    }

    pub async fn count(&self) -> Result<u64> {
        let (count,): (i64,) =
            sqlx::query_as(include_str!("../queries/count_documents.sql")).fetch_one(&self.pool).await.or_classify()?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
