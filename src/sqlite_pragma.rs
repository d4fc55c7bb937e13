//! Connection tuning shared by every SQLite handle the crate opens

use rusqlite::Connection;

/// Apply WAL journaling and read-friendly cache settings.
///
/// WAL lets readers keep querying `suburb_stats` while a rebuild
/// transaction is open; they see the old snapshot until commit.
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "cache_size", -16_000)?;
    conn.pragma_update(None, "busy_timeout", 5_000)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_wal_enabled_on_file_database() {
        let dir = tempdir().unwrap();
        let conn = Connection::open(dir.path().join("pragma.db")).unwrap();

        apply_optimized_pragmas(&conn).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_in_memory_database_accepts_pragmas() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(apply_optimized_pragmas(&conn).is_ok());
    }
}
