//! Database schema management.

use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}

const SCHEMA: &str = r#"
-- Job schedules
CREATE TABLE IF NOT EXISTS cron_settings (
    name TEXT PRIMARY KEY,
    schedule TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

-- Execution history; status 0 failed, 1 ok, 2 partial
CREATE TABLE IF NOT EXISTS cron_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    status INTEGER NOT NULL,
    output TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_cron_history_name ON cron_history(name);
CREATE INDEX IF NOT EXISTS idx_cron_history_timestamp ON cron_history(timestamp);

-- Single-row tables
CREATE TABLE IF NOT EXISTS collect_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    max_repos INTEGER NOT NULL,
    resource TEXT NOT NULL,
    since TEXT NOT NULL,
    spoken_language_code TEXT NOT NULL,
    period TEXT NOT NULL,
    language TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS prompt_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    use_direct_url INTEGER NOT NULL,
    llm_provider TEXT NOT NULL,
    temperature REAL NOT NULL,
    content TEXT NOT NULL,
    model TEXT NOT NULL,
    llm_output_language TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Endpoint definitions, stored as JSON documents
CREATE TABLE IF NOT EXISTS api_configs (
    name TEXT PRIMARY KEY,
    config TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
