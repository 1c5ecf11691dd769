use async_trait::async_trait;
use keyhole_core::repository::{ReadRepository, Repository, Result};
use keyhole_core::{ShortKey, StorageError, UrlMapping};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;

const SCHEMA: &str = include_str!("../ddl/mysql/url_mappings.sql");
const SHORT_URL_INDEX: &str = "uq_url_mappings_short_url";

/// MySQL implementation of the repository contract.
///
/// Uniqueness is enforced by the schema: `short_url` carries a unique index
/// and `long_url` is indexed through a stored SHA-256 column, since MySQL
/// cannot put a full unique index on a `TEXT` column. Short keys use a binary
/// collation so keys differing only in case stay distinct.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `url_mappings` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

/// Maps a unique violation to the constraint it hit.
///
/// MySQL names the index in the message:
/// `Duplicate entry 'abc123' for key 'url_mappings.uq_url_mappings_short_url'`.
fn map_insert_error(err: sqlx::Error, long_url: &str, key: &ShortKey) -> StorageError {
    let short_url_violated = err
        .as_database_error()
        .filter(|db_err| db_err.is_unique_violation())
        .map(|db_err| db_err.message().contains(SHORT_URL_INDEX));

    match short_url_violated {
        Some(true) => StorageError::DuplicateKey(key.to_string()),
        Some(false) => StorageError::DuplicateLongUrl(long_url.to_owned()),
        None => map_sqlx_error(err),
    }
}

fn decode_row(row: MySqlRow) -> Result<UrlMapping> {
    let long_url: String = row.try_get("long_url").map_err(map_sqlx_error)?;
    let short_url: String = row.try_get("short_url").map_err(map_sqlx_error)?;
    let title: String = row.try_get("title").map_err(map_sqlx_error)?;

    Ok(UrlMapping {
        long_url,
        short_key: ShortKey::new_unchecked(short_url),
        title,
    })
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<UrlMapping>> {
        let row = sqlx::query(
            r#"
            SELECT long_url, short_url, title
            FROM url_mappings
            WHERE long_url_sha256 = UNHEX(SHA2(?, 256))
              AND long_url = ?
            LIMIT 1
            "#,
        )
        .bind(long_url)
        .bind(long_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(decode_row).transpose()
    }

    async fn find_by_short_key(&self, key: &ShortKey) -> Result<Option<UrlMapping>> {
        let row = sqlx::query(
            r#"
            SELECT long_url, short_url, title
            FROM url_mappings
            WHERE short_url = ?
            LIMIT 1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(decode_row).transpose()
    }

    async fn exists(&self, key: &ShortKey) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM url_mappings
            WHERE short_url = ?
            LIMIT 1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }

    async fn list_all(&self) -> Result<Vec<UrlMapping>> {
        let rows = sqlx::query(
            r#"
            SELECT long_url, short_url, title
            FROM url_mappings
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(decode_row).collect()
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, long_url: &str, key: &ShortKey, title: &str) -> Result<UrlMapping> {
        let result = sqlx::query(
            r#"
            INSERT INTO url_mappings (long_url, short_url, title)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(long_url)
        .bind(key.as_str())
        .bind(title)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(short_key = %key, "Inserted mapping");
                Ok(UrlMapping {
                    long_url: long_url.to_owned(),
                    short_key: key.clone(),
                    title: title.to_owned(),
                })
            }
            Err(err) => Err(map_insert_error(err, long_url, key)),
        }
    }
}
