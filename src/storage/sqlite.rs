//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::record::{ApiPayload, NewsArticle, Record, RecordKind, WebPage};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database file and ensures the schema exists
    ///
    /// `synchronous = FULL` makes every autocommitted insert durable before
    /// `append` returns.
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn insert_web_page(&self, page: &WebPage) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO web_data (url, title, content, timestamp, source) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                page.url,
                page.title,
                page.content,
                page.timestamp.to_rfc3339(),
                page.source
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_api_payload(&self, payload: &ApiPayload) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO api_data (endpoint, data_type, data_json, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                payload.endpoint,
                payload.data_type,
                payload.raw_json,
                payload.timestamp.to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_news_article(&self, article: &NewsArticle) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO news_articles (title, content, source, published_date, url, authors, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                article.title,
                article.content,
                article.source,
                article.published_date,
                article.url,
                article.authors,
                article.timestamp.to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl Storage for SqliteStorage {
    fn append(&mut self, record: &Record) -> StorageResult<i64> {
        match record {
            Record::WebPage(page) => self.insert_web_page(page),
            Record::ApiPayload(payload) => self.insert_api_payload(payload),
            Record::NewsArticle(article) => self.insert_news_article(article),
        }
    }

    fn count_records(&self, kind: RecordKind) -> StorageResult<u64> {
        // Table names come from the closed RecordKind mapping, never from input
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table_name());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
