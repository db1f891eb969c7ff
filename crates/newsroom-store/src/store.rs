use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::{Article, ArticlePatch, ArticleStatus, NewArticle};

/// The narrow store surface the publication sweeper depends on.
///
/// A trait seam so the sweeper can be exercised against a mock store in
/// tests (failure injection, deterministic due sets) without a database.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// IDs of all articles with `status = draft` and `publish_at <= now`.
    async fn find_due_drafts(&self, now: DateTime<Utc>) -> Result<Vec<String>>;

    /// Atomically transition exactly the given IDs to Published.
    ///
    /// Must be a single bulk statement, not a per-item loop, so a concurrent
    /// edit can never observe a half-transitioned batch. Returns the number
    /// of rows actually modified, which may be less than `ids.len()` if an
    /// external mutation changed an article's status in between.
    async fn bulk_set_published(&self, ids: &[String]) -> Result<usize>;
}

/// Thread-safe SQLite-backed article store.
///
/// Wraps a single connection in a `Mutex`. For high-concurrency deployments
/// consider a connection pool (e.g. r2d2), but a Mutex is sufficient for the
/// single-node target.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an already-open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Create a new article. New articles always start as Draft.
    #[instrument(skip(self, article), fields(title = %article.title))]
    pub fn create(&self, article: NewArticle) -> Result<Article> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let publish_at = article.publish_at.as_deref().map(normalize_ts).transpose()?;

        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO articles
             (id, title, content, author, status, publish_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'draft', ?5, ?6, ?6)",
            rusqlite::params![id, article.title, article.content, article.author, publish_at, now],
        )?;

        Ok(Article {
            id,
            title: article.title,
            content: article.content,
            author: article.author,
            status: ArticleStatus::Draft,
            publish_at,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Retrieve an article by ID, returning `None` if it does not exist.
    #[instrument(skip(self))]
    pub fn get(&self, id: &str) -> Result<Option<Article>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT id, title, content, author, status, publish_at, created_at, updated_at
             FROM articles WHERE id = ?1",
            rusqlite::params![id],
            row_to_article,
        ) {
            Ok(a) => Ok(Some(a)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// List all articles, newest first.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Article>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, title, content, author, status, publish_at, created_at, updated_at
             FROM articles ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], row_to_article)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Apply a partial update. `None` fields are left unchanged.
    ///
    /// Bumps `updated_at`. Returns the updated article.
    #[instrument(skip(self, patch))]
    pub fn update(&self, id: &str, patch: ArticlePatch) -> Result<Article> {
        let current = self.get(id)?.ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;

        let title = patch.title.unwrap_or(current.title);
        let content = patch.content.unwrap_or(current.content);
        let status = patch.status.unwrap_or(current.status);
        let publish_at = match patch.publish_at {
            Some(ts) => Some(normalize_ts(&ts)?),
            None => current.publish_at,
        };
        let now = Utc::now().to_rfc3339();

        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE articles
             SET title = ?1, content = ?2, status = ?3, publish_at = ?4, updated_at = ?5
             WHERE id = ?6",
            rusqlite::params![title, content, status.to_string(), publish_at, now, id],
        )?;

        Ok(Article {
            id: id.to_string(),
            title,
            content,
            author: current.author,
            status,
            publish_at,
            created_at: current.created_at,
            updated_at: now,
        })
    }

    /// Permanently delete an article.
    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let rows_changed = db.execute("DELETE FROM articles WHERE id = ?1", rusqlite::params![id])?;
        if rows_changed == 0 {
            return Err(StoreError::NotFound {
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    #[instrument(skip(self), fields(now = %now.to_rfc3339()))]
    async fn find_due_drafts(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let now_str = now.to_rfc3339();
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare_cached(
            "SELECT id FROM articles
             WHERE status = 'draft' AND publish_at IS NOT NULL AND publish_at <= ?1",
        )?;
        let ids = stmt
            .query_map([&now_str], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect::<Vec<_>>();
        debug!(due = ids.len(), "due-drafts query complete");
        Ok(ids)
    }

    async fn bulk_set_published(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let now = Utc::now().to_rfc3339();
        // One UPDATE over the whole ID set. The status guard makes the call
        // idempotent and keeps the count honest under concurrent edits.
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "UPDATE articles SET status = 'published', updated_at = ?
             WHERE status = 'draft' AND id IN ({placeholders})"
        );

        let db = self.db.lock().unwrap();
        let params = std::iter::once(&now).chain(ids.iter());
        let modified = db.execute(&sql, rusqlite::params_from_iter(params))?;
        Ok(modified)
    }
}

/// Map a SQLite row to an `Article`.
fn row_to_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
    let status_str: String = row.get(4)?;
    // A malformed status column means the row was written outside this
    // subsystem; treat it as Draft rather than panicking.
    let status = status_str.parse().unwrap_or(ArticleStatus::Draft);

    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author: row.get(3)?,
        status,
        publish_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Re-serialize a client-supplied timestamp into chrono's canonical RFC 3339
/// form so the column compares lexically in chronological order ("Z" and
/// "+00:00" suffixes would otherwise interleave).
fn normalize_ts(ts: &str) -> Result<String> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .map_err(|_| StoreError::InvalidTimestamp(ts.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn mem_store() -> SqliteStore {
        SqliteStore::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn draft(store: &SqliteStore, title: &str, publish_at: Option<String>) -> Article {
        store
            .create(NewArticle {
                title: title.to_string(),
                content: "body".to_string(),
                author: "ana".to_string(),
                publish_at,
            })
            .unwrap()
    }

    #[test]
    fn create_starts_as_draft() {
        let store = mem_store();
        let a = draft(&store, "first", None);
        assert_eq!(a.status, ArticleStatus::Draft);
        assert_eq!(store.get(&a.id).unwrap().unwrap().title, "first");
    }

    #[test]
    fn update_patches_only_given_fields() {
        let store = mem_store();
        let a = draft(&store, "first", None);
        let updated = store
            .update(
                &a.id,
                ArticlePatch {
                    title: Some("renamed".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.content, "body");
        assert_eq!(updated.status, ArticleStatus::Draft);
    }

    #[test]
    fn delete_missing_article_is_not_found() {
        let store = mem_store();
        assert!(matches!(
            store.delete("nope"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn bad_publish_at_is_rejected() {
        let store = mem_store();
        let result = store.create(NewArticle {
            title: "t".to_string(),
            content: "c".to_string(),
            author: "a".to_string(),
            publish_at: Some("next tuesday".to_string()),
        });
        assert!(matches!(result, Err(StoreError::InvalidTimestamp(_))));
    }

    #[tokio::test]
    async fn due_query_is_inclusive_and_skips_unscheduled() {
        let store = mem_store();
        let now = Utc::now();

        let past = draft(&store, "past", Some((now - Duration::minutes(5)).to_rfc3339()));
        let exact = draft(&store, "exact", Some(now.to_rfc3339()));
        let future = draft(
            &store,
            "future",
            Some((now + Duration::minutes(5)).to_rfc3339()),
        );
        let manual = draft(&store, "manual", None);

        let due = store.find_due_drafts(now).await.unwrap();
        assert!(due.contains(&past.id));
        assert!(due.contains(&exact.id)); // <= comparison: exactly-now is eligible
        assert!(!due.contains(&future.id));
        assert!(!due.contains(&manual.id));
    }

    #[tokio::test]
    async fn due_query_ignores_published_articles() {
        let store = mem_store();
        let now = Utc::now();
        let a = draft(&store, "a", Some((now - Duration::minutes(1)).to_rfc3339()));
        store.bulk_set_published(&[a.id.clone()]).await.unwrap();

        assert!(store.find_due_drafts(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_publish_reports_modified_count() {
        let store = mem_store();
        let now = Utc::now();
        let a = draft(&store, "a", Some(now.to_rfc3339()));
        let b = draft(&store, "b", Some(now.to_rfc3339()));

        let n = store
            .bulk_set_published(&[a.id.clone(), b.id.clone()])
            .await
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(
            store.get(&a.id).unwrap().unwrap().status,
            ArticleStatus::Published
        );

        // Second call finds no drafts left to transition.
        let n = store.bulk_set_published(&[a.id, b.id]).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn failed_bulk_update_publishes_nothing() {
        let store = mem_store();
        let now = Utc::now();
        let a = draft(&store, "a", Some(now.to_rfc3339()));
        let b = draft(&store, "b", Some(now.to_rfc3339()));
        let c = draft(&store, "c", Some(now.to_rfc3339()));

        // Abort the statement partway through the batch. SQLite rolls back
        // the whole UPDATE, so the single-statement guarantee means no row
        // may come out Published.
        store
            .db
            .lock()
            .unwrap()
            .execute_batch(&format!(
                "CREATE TRIGGER abort_mid_batch BEFORE UPDATE ON articles
                 WHEN NEW.id = '{}'
                 BEGIN SELECT RAISE(ABORT, 'mid-batch failure'); END;",
                b.id
            ))
            .unwrap();

        let result = store
            .bulk_set_published(&[a.id.clone(), b.id.clone(), c.id.clone()])
            .await;
        assert!(result.is_err());

        for id in [&a.id, &b.id, &c.id] {
            assert_eq!(
                store.get(id).unwrap().unwrap().status,
                ArticleStatus::Draft
            );
        }
    }

    #[tokio::test]
    async fn normalized_z_suffix_compares_correctly() {
        let store = mem_store();
        let now = Utc::now();
        // "Z" suffix input must still be found by the "+00:00"-form query.
        let z_form = (now - Duration::minutes(1))
            .to_rfc3339()
            .replace("+00:00", "Z");
        let a = draft(&store, "z", Some(z_form));

        let due = store.find_due_drafts(now).await.unwrap();
        assert!(due.contains(&a.id));
    }
}
