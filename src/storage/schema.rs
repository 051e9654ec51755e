//! Database schema definitions
//!
//! Only the tables the crawler itself writes. Interactions carry no foreign
//! key to books because a user's read list is persisted before the books on
//! it are fetched.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- User profiles
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    join_date TEXT,
    last_active TEXT,
    location TEXT,
    num_ratings INTEGER,
    avg_rating_given REAL,
    updated_at TEXT NOT NULL
);

-- Read-list rows, one per (user, book)
CREATE TABLE IF NOT EXISTS interactions (
    user_id TEXT NOT NULL,
    book_id TEXT NOT NULL,
    rating INTEGER CHECK (rating BETWEEN 1 AND 5),
    date_read TEXT,
    shelves TEXT NOT NULL DEFAULT '[]',
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, book_id)
);

CREATE INDEX IF NOT EXISTS idx_interactions_book ON interactions(book_id);

-- Book metadata
CREATE TABLE IF NOT EXISTS books (
    book_id TEXT PRIMARY KEY,
    title TEXT,
    description TEXT,
    author_id TEXT,
    author_name TEXT,
    average_rating REAL,
    ratings_count INTEGER,
    publication_year INTEGER,
    genres TEXT NOT NULL DEFAULT '[]',
    num_pages INTEGER,
    cover_image_url TEXT,
    updated_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
