//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Dates are stored as `YYYY-MM-DD` text; genre lists and shelf sets as JSON
//! arrays.

use crate::extract::{BookMetadata, EntityKind, Interaction, Rating, UserProfile};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{PopularBook, Record, RunRecord, RunStatus};
use crate::BookgraphError;
use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`, creating parent directories
    pub fn new(path: &Path) -> Result<Self, BookgraphError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, BookgraphError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn check_persisted(kind: EntityKind) -> StorageResult<()> {
    match kind {
        EntityKind::ReviewerRef => Err(StorageError::UnsupportedKind(kind)),
        _ => Ok(()),
    }
}

fn check_kind(kind: EntityKind, record: &Record) -> StorageResult<()> {
    if record.kind() != kind {
        return Err(StorageError::KindMismatch {
            expected: kind,
            found: record.kind(),
        });
    }
    Ok(())
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn parse_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn write_record(conn: &Connection, record: &Record, now: &str) -> StorageResult<()> {
    match record {
        Record::User(user) => {
            conn.execute(
                "INSERT INTO users (user_id, join_date, last_active, location, num_ratings, avg_rating_given, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id) DO UPDATE SET
                    join_date = excluded.join_date,
                    last_active = excluded.last_active,
                    location = excluded.location,
                    num_ratings = excluded.num_ratings,
                    avg_rating_given = excluded.avg_rating_given,
                    updated_at = excluded.updated_at",
                params![
                    user.user_id,
                    format_date(user.join_date),
                    format_date(user.last_active),
                    user.location,
                    user.num_ratings,
                    user.avg_rating_given.map(f64::from),
                    now
                ],
            )?;
        }
        Record::Interaction(i) => {
            conn.execute(
                "INSERT INTO interactions (user_id, book_id, rating, date_read, shelves, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id, book_id) DO UPDATE SET
                    rating = excluded.rating,
                    date_read = excluded.date_read,
                    shelves = excluded.shelves,
                    updated_at = excluded.updated_at",
                params![
                    i.user_id,
                    i.book_id,
                    i.rating.map(Rating::value),
                    format_date(i.date_read),
                    serde_json::to_string(&i.shelves)?,
                    now
                ],
            )?;
        }
        Record::Book(book) => {
            conn.execute(
                "INSERT INTO books (book_id, title, description, author_id, author_name, average_rating,
                                    ratings_count, publication_year, genres, num_pages, cover_image_url, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(book_id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    author_id = excluded.author_id,
                    author_name = excluded.author_name,
                    average_rating = excluded.average_rating,
                    ratings_count = excluded.ratings_count,
                    publication_year = excluded.publication_year,
                    genres = excluded.genres,
                    num_pages = excluded.num_pages,
                    cover_image_url = excluded.cover_image_url,
                    updated_at = excluded.updated_at",
                params![
                    book.book_id,
                    book.title,
                    book.description,
                    book.author_id,
                    book.author_name,
                    book.average_rating.map(f64::from),
                    book.ratings_count.map(|c| c as i64),
                    book.publication_year,
                    serde_json::to_string(&book.genres)?,
                    book.num_pages,
                    book.cover_image_url,
                    now
                ],
            )?;
        }
    }
    Ok(())
}

fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let finished_at = (status != RunStatus::Running).then(|| Utc::now().to_rfc3339());
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), finished_at, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Entity Upserts =====

    fn upsert_one(&mut self, kind: EntityKind, record: &Record) -> StorageResult<()> {
        check_persisted(kind)?;
        check_kind(kind, record)?;

        if !record.has_identifier() {
            tracing::debug!("Dropping {} record without identifier", kind);
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        write_record(&self.conn, record, &now)
    }

    fn upsert_batch(&mut self, kind: EntityKind, records: &[Record]) -> StorageResult<usize> {
        check_persisted(kind)?;
        for record in records {
            check_kind(kind, record)?;
        }

        if records.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut written = 0;

        for record in records.iter().filter(|r| r.has_identifier()) {
            write_record(&tx, record, &now)?;
            written += 1;
        }

        tx.commit()?;

        if written < records.len() {
            tracing::debug!(
                "Dropped {} {} records without identifier",
                records.len() - written,
                kind
            );
        }

        Ok(written)
    }

    // ===== Reads =====

    fn get_user(&self, user_id: &str) -> StorageResult<Option<UserProfile>> {
        let user = self
            .conn
            .query_row(
                "SELECT user_id, join_date, last_active, location, num_ratings, avg_rating_given
                 FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserProfile {
                        user_id: row.get(0)?,
                        join_date: parse_date(row.get(1)?),
                        last_active: parse_date(row.get(2)?),
                        location: row.get(3)?,
                        num_ratings: row.get(4)?,
                        avg_rating_given: row.get::<_, Option<f64>>(5)?.map(|v| v as f32),
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn get_book(&self, book_id: &str) -> StorageResult<Option<BookMetadata>> {
        let book = self
            .conn
            .query_row(
                "SELECT book_id, title, description, author_id, author_name, average_rating,
                        ratings_count, publication_year, genres, num_pages, cover_image_url
                 FROM books WHERE book_id = ?1",
                params![book_id],
                |row| {
                    Ok(BookMetadata {
                        book_id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        author_id: row.get(3)?,
                        author_name: row.get(4)?,
                        average_rating: row.get::<_, Option<f64>>(5)?.map(|v| v as f32),
                        ratings_count: row.get::<_, Option<i64>>(6)?.map(|v| v as u64),
                        publication_year: row.get(7)?,
                        genres: json_column(row, 8)?,
                        num_pages: row.get(9)?,
                        cover_image_url: row.get(10)?,
                    })
                },
            )
            .optional()?;
        Ok(book)
    }

    fn get_interactions(&self, user_id: &str) -> StorageResult<Vec<Interaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, book_id, rating, date_read, shelves
             FROM interactions WHERE user_id = ?1 ORDER BY book_id",
        )?;

        let interactions = stmt
            .query_map(params![user_id], |row| {
                let mut interaction = Interaction::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                );
                interaction.rating = row.get::<_, Option<i64>>(2)?.map(Rating::new);
                interaction.date_read = parse_date(row.get(3)?);
                interaction.shelves = json_column(row, 4)?;
                Ok(interaction)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(interactions)
    }

    // ===== Statistics =====

    fn count_records(&self, kind: EntityKind) -> StorageResult<u64> {
        let table = match kind {
            EntityKind::UserProfile => "users",
            EntityKind::Interaction => "interactions",
            EntityKind::BookMetadata => "books",
            EntityKind::ReviewerRef => return Err(StorageError::UnsupportedKind(kind)),
        };

        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn popular_books(&self, n: usize, min_ratings: u64) -> StorageResult<Vec<PopularBook>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.book_id, b.title, b.cover_image_url, COUNT(*) AS rated
             FROM interactions i
             LEFT JOIN books b ON b.book_id = i.book_id
             WHERE i.rating IS NOT NULL
             GROUP BY i.book_id
             HAVING COUNT(*) >= ?1
             ORDER BY rated DESC, i.book_id ASC
             LIMIT ?2",
        )?;

        let books = stmt
            .query_map(params![min_ratings as i64, n as i64], |row| {
                Ok(PopularBook {
                    book_id: row.get(0)?,
                    title: row.get(1)?,
                    cover_image_url: row.get(2)?,
                    rated_count: row.get::<_, i64>(3)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(books)
    }
}
