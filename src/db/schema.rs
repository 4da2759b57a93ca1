//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `config_entries` table (flat key/value configuration, one row per key)
/// - `templates` table (named prompt templates, one row per name)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Config entries (systemPrompt, knowledgeBase, ...)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS config_entries (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL -- RFC3339
);

-- ---------------------------------------------------------------------------
-- Templates (name is the user-facing identity and must stay unique)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS templates (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    data TEXT NOT NULL, -- JSON
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL, -- RFC3339
    UNIQUE(name)
);

CREATE INDEX IF NOT EXISTS idx_templates_created_at ON templates(created_at);
"#;
