//! SQL DDL for the Calm Sphere tables.
//!
//! One row per user in `users`; the chat history and keyword list are
//! JSON arrays stored in TEXT columns so a record reads and writes as a
//! single document. All DDL uses `IF NOT EXISTS` for idempotent
//! initialization.

use rusqlite::Connection;

/// Base (v1) schema. Later columns arrive through [`super::migrations`].
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    name TEXT,
    age INTEGER CHECK(age IS NULL OR age >= 0),
    college TEXT,
    location TEXT,
    phone TEXT,
    friends TEXT,
    chat_history TEXT NOT NULL DEFAULT '[]',
    important_info TEXT NOT NULL DEFAULT '[]',
    incognito_mode INTEGER NOT NULL DEFAULT 0 CHECK(incognito_mode IN (0, 1)),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
