use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Error as SqlxError, Row};
use std::time::Duration;
use tracing::{error, info};

use crate::models::Document;
use super::{DocumentStore, SaveOutcome, StoreError};

/// Document row from the database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub doc_id: String,
    pub title: String,
    pub content: String,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            doc_id: row.doc_id,
            title: row.title,
            content: row.content,
            owner: row.owner,
        }
    }
}

/// PostgreSQL-backed document store
pub struct DbColab {
    pool: PgPool,
}

impl DbColab {
    /// Create a new database connection pool
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    ///
    /// # Returns
    /// * `Result<Self, SqlxError>` - Database connection pool or error
    pub async fn new(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600)) // Close idle connections after 10 minutes
            .max_lifetime(Duration::from_secs(1800)) // Recycle connections after 30 minutes
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    /// Create the documents table if it does not exist yet
    pub async fn migrate(&self) -> Result<(), SqlxError> {
        let create_sql = r#"
            CREATE TABLE IF NOT EXISTS documents (
                doc_id      TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                content     TEXT NOT NULL DEFAULT '',
                owner       TEXT,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
        "#;
        sqlx::query(create_sql).execute(&self.pool).await?;
        info!("Documents table is ready");
        Ok(())
    }

    fn log_pool_state(&self, action: &str, doc_id: &str) {
        let pool_idle = self.pool.num_idle() as u32;
        let pool_size = self.pool.size();
        info!(
            "{} document {}. Pool connections: {} idle, {} in use",
            action,
            doc_id,
            pool_idle,
            pool_size.saturating_sub(pool_idle)
        );
    }

    /// Load a document by id
    ///
    /// # Returns
    /// * `Result<Option<DocumentRow>, SqlxError>` - The row, or None if it does not exist
    pub async fn load_document(&self, doc_id: &str) -> Result<Option<DocumentRow>, SqlxError> {
        self.log_pool_state("Loading", doc_id);

        let query_sql = r#"
            SELECT doc_id, title, content, owner, created_at, updated_at
            FROM documents
            WHERE doc_id = $1
        "#;

        sqlx::query_as::<_, DocumentRow>(query_sql)
            .bind(doc_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to load document '{}': {}", doc_id, e);
                e
            })
    }

    /// List documents, optionally only those of one owner
    pub async fn list_documents(&self, owner: Option<&str>) -> Result<Vec<DocumentRow>, SqlxError> {
        let query_sql = r#"
            SELECT doc_id, title, content, owner, created_at, updated_at
            FROM documents
            WHERE $1::TEXT IS NULL OR owner = $1
            ORDER BY doc_id
        "#;

        sqlx::query_as::<_, DocumentRow>(query_sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to list documents (owner {:?}): {}", owner, e);
                e
            })
    }

    /// Insert or update a document
    ///
    /// # Returns
    /// * `Result<bool, SqlxError>` - true if the row was inserted, false if it was updated
    pub async fn upsert_document(&self, doc: &Document) -> Result<bool, SqlxError> {
        self.log_pool_state("Saving", &doc.doc_id);

        // xmax is zero only for a freshly inserted tuple
        let upsert_sql = r#"
            INSERT INTO documents (doc_id, title, content, owner)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (doc_id) DO UPDATE
                SET title = EXCLUDED.title,
                    content = EXCLUDED.content,
                    owner = COALESCE(EXCLUDED.owner, documents.owner),
                    updated_at = NOW()
            RETURNING (xmax = 0) AS inserted;
        "#;

        let row = sqlx::query(upsert_sql)
            .bind(&doc.doc_id)
            .bind(&doc.title)
            .bind(&doc.content)
            .bind(&doc.owner)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to save document '{}': {}", doc.doc_id, e);
                e
            })?;

        let inserted: bool = row.try_get("inserted")?;
        info!("Document '{}' {}", doc.doc_id, if inserted { "created" } else { "updated" });
        Ok(inserted)
    }
}

#[async_trait]
impl DocumentStore for DbColab {
    async fn load(&self, doc_id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.load_document(doc_id).await?.map(Document::from))
    }

    async fn save(&self, doc: &Document) -> Result<SaveOutcome, StoreError> {
        match self.upsert_document(doc).await? {
            true => Ok(SaveOutcome::Created),
            false => Ok(SaveOutcome::Updated),
        }
    }

    async fn list(&self, owner: Option<&str>) -> Result<Vec<Document>, StoreError> {
        Ok(self.list_documents(owner).await?.into_iter().map(Document::from).collect())
    }
}
