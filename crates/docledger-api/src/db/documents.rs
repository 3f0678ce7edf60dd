//! Document record persistence.
//!
//! [`PgRecorder`] implements the pipeline's recorder traits over the
//! `documents` table. Ordering is by the `seq` column, never by timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docledger_core::{ContentDigest, DocumentRecord, DocumentType, FormatError, NewDocument, OwnerId};
use docledger_pipeline::{MetadataRecorder, RecordSource, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed recorder.
#[derive(Debug, Clone)]
pub struct PgRecorder {
    pool: PgPool,
}

impl PgRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSource for PgRecorder {
    async fn records_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<DocumentRecord>, StoreError> {
        list_by_owner(&self.pool, owner_id)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(DocumentRow::into_record)
            .collect()
    }
}

#[async_trait]
impl MetadataRecorder for PgRecorder {
    async fn record(&self, doc: NewDocument) -> Result<DocumentRecord, StoreError> {
        let record = doc.into_record();
        insert(&self.pool, &record).await.map_err(store_error)?;
        Ok(record)
    }

    async fn find_by_hash(&self, content_hash: &ContentDigest) -> Result<Option<DocumentRecord>, StoreError> {
        match get_by_hash(&self.pool, content_hash).await.map_err(store_error)? {
            Some(row) => row.into_record().map(Some),
            None => Ok(None),
        }
    }
}

fn store_error(err: sqlx::Error) -> StoreError {
    StoreError::new(err.to_string())
}

/// Insert a new record.
pub async fn insert(pool: &PgPool, record: &DocumentRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO documents (id, owner_id, content_hash, storage_locator, document_type, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(record.id)
    .bind(record.owner_id.as_str())
    .bind(record.content_hash.to_base64())
    .bind(&record.storage_locator)
    .bind(record.document_type.as_str())
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Every record for an owner, oldest first.
pub async fn list_by_owner(pool: &PgPool, owner_id: &OwnerId) -> Result<Vec<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>(
        "SELECT id, owner_id, content_hash, storage_locator, document_type, created_at
         FROM documents WHERE owner_id = $1 ORDER BY seq ASC",
    )
    .bind(owner_id.as_str())
    .fetch_all(pool)
    .await
}

/// Earliest record carrying a hash.
pub async fn get_by_hash(pool: &PgPool, content_hash: &ContentDigest) -> Result<Option<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>(
        "SELECT id, owner_id, content_hash, storage_locator, document_type, created_at
         FROM documents WHERE content_hash = $1 ORDER BY seq ASC LIMIT 1",
    )
    .bind(content_hash.to_base64())
    .fetch_optional(pool)
    .await
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
pub struct DocumentRow {
    id: Uuid,
    owner_id: String,
    content_hash: String,
    storage_locator: String,
    document_type: String,
    created_at: DateTime<Utc>,
}

impl DocumentRow {
    /// Re-validate stored columns into domain types.
    fn into_record(self) -> Result<DocumentRecord, StoreError> {
        let id = self.id;
        let corrupt = |e: FormatError| StoreError::new(format!("corrupt documents row {id}: {e}"));
        Ok(DocumentRecord {
            id,
            owner_id: OwnerId::new(self.owner_id).map_err(corrupt)?,
            content_hash: ContentDigest::from_base64(&self.content_hash).map_err(corrupt)?,
            storage_locator: self.storage_locator,
            document_type: DocumentType::new(self.document_type).map_err(corrupt)?,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docledger_core::hash_bytes;

    fn row() -> DocumentRow {
        DocumentRow {
            id: Uuid::new_v4(),
            owner_id: "DL1234".into(),
            content_hash: hash_bytes(b"doc").to_base64(),
            storage_locator: "mem://sha256/doc".into(),
            document_type: "Transcript".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn valid_row_converts() {
        let row = row();
        let id = row.id;
        let record = row.into_record().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.owner_id.as_str(), "DL1234");
        assert_eq!(record.content_hash, hash_bytes(b"doc"));
    }

    #[test]
    fn corrupt_owner_names_the_row() {
        let mut row = row();
        row.owner_id = "dl-1234".into();
        let id = row.id;
        let err = row.into_record().unwrap_err();
        assert!(err.message.contains(&id.to_string()), "{err}");
        assert!(err.message.contains("dl-1234"), "{err}");
    }

    #[test]
    fn corrupt_hash_is_a_store_error() {
        let mut row = row();
        row.content_hash = "not base64".into();
        assert!(row.into_record().unwrap_err().message.contains("corrupt documents row"));
    }

    #[test]
    fn corrupt_document_type_is_a_store_error() {
        let mut row = row();
        row.document_type = "Transcript_2024".into();
        assert!(row.into_record().is_err());
    }
}
