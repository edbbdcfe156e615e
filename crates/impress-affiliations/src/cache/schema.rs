//! SQLite schema for the persistent resolution cache

/// Schema version for migrations
pub const SCHEMA_VERSION: u32 = 1;

/// SQLite schema definition
pub struct Schema;

impl Schema {
    /// Get the complete schema SQL
    pub fn create_tables() -> &'static str {
        r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Successful organization-name resolutions, keyed by the raw extracted name
CREATE TABLE IF NOT EXISTS resolutions (
    org_name TEXT PRIMARY KEY,
    canonical_name TEXT NOT NULL,
    registry_id TEXT NOT NULL,
    resolved_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_resolutions_registry ON resolutions(registry_id);
"#
    }

    /// Get migration SQL from one version to the next
    pub fn migration(from: u32, to: u32) -> Option<&'static str> {
        match (from, to) {
            // No migrations yet
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_applies() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(Schema::create_tables()).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM resolutions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_no_migrations_yet() {
        assert!(Schema::migration(1, 2).is_none());
    }
}
