use rusqlite::Connection;

use crate::error::Result;

/// Initialise the content schema in `conn`.
///
/// Creates the `articles` table (idempotent) and an index on
/// `(status, publish_at)` so the sweeper's due-drafts query stays efficient
/// even with a large archive of published articles.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS articles (
            id          TEXT    NOT NULL PRIMARY KEY,
            title       TEXT    NOT NULL,
            content     TEXT    NOT NULL,
            author      TEXT    NOT NULL,
            status      TEXT    NOT NULL DEFAULT 'draft',
            publish_at  TEXT,               -- ISO-8601 or NULL (never auto-published)
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        ) STRICT;

        -- Efficient polling: SELECT … WHERE status = 'draft' AND publish_at <= ?
        CREATE INDEX IF NOT EXISTS idx_articles_due ON articles (status, publish_at);
        ",
    )?;
    Ok(())
}
