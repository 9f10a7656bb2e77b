//! Store trait and the SQLite implementation.

use crate::error::{StoreError, StoreResult};
use crate::repos::{SessionRepo, SubtaskRepo, TaskRepo, UserRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined store trait.
#[async_trait]
pub trait Store: UserRepo + SessionRepo + TaskRepo + SubtaskRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> StoreResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> StoreResult<()>;
}

/// SQLite-backed store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (and create if missing) a SQLite store at `path`.
    pub async fn new(path: impl AsRef<Path>, busy_timeout_secs: Option<u64>) -> StoreResult<Self> {
        let path = path.as_ref();
        let busy_timeout = Duration::from_secs(busy_timeout_secs.unwrap_or(5));

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            // Subtask trees lean on ON DELETE CASCADE, which only fires with
            // foreign key enforcement switched on.
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; using a single connection avoids
            // persistent "database is locked" failures under test/axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn migrate(&self) -> StoreResult<()> {
        // The schema is several statements; raw_sql runs them without
        // preparing, which single-statement prepared queries would reject.
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Escape LIKE wildcards so a search string matches literally under
/// `ESCAPE '\'`.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use grove_core::{TaskFilter, TaskSortBy};
    use time::OffsetDateTime;

    #[async_trait]
    impl UserRepo for SqliteStore {
        async fn create_user(
            &self,
            username: &str,
            created_at: OffsetDateTime,
        ) -> StoreResult<UserRow> {
            let result = sqlx::query_as::<_, UserRow>(
                "INSERT INTO users (username, created_at) VALUES (?, ?) RETURNING *",
            )
            .bind(username)
            .bind(created_at)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(row) => Ok(row),
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                    StoreError::Constraint(format!("username '{username}' already exists")),
                ),
                Err(e) => Err(e.into()),
            }
        }

        async fn get_user(&self, user_id: i64) -> StoreResult<Option<UserRow>> {
            let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<UserRow>> {
            let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }
    }

    #[async_trait]
    impl SessionRepo for SqliteStore {
        async fn create_session(
            &self,
            user_id: i64,
            token_hash: &str,
            created_at: OffsetDateTime,
            expires_at: Option<OffsetDateTime>,
        ) -> StoreResult<SessionRow> {
            let row = sqlx::query_as::<_, SessionRow>(
                "INSERT INTO sessions (user_id, token_hash, created_at, expires_at) \
                 VALUES (?, ?, ?, ?) RETURNING *",
            )
            .bind(user_id)
            .bind(token_hash)
            .bind(created_at)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_session_by_token_hash(
            &self,
            token_hash: &str,
            now: OffsetDateTime,
        ) -> StoreResult<Option<SessionRow>> {
            let row = sqlx::query_as::<_, SessionRow>(
                "SELECT * FROM sessions WHERE token_hash = ? \
                 AND (expires_at IS NULL OR expires_at > ?)",
            )
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn delete_session(&self, session_id: i64) -> StoreResult<()> {
            let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(session_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!(
                    "session {session_id} not found"
                )));
            }
            Ok(())
        }

        async fn delete_expired_sessions(&self, now: OffsetDateTime) -> StoreResult<u64> {
            let result =
                sqlx::query("DELETE FROM sessions WHERE expires_at IS NOT NULL AND expires_at <= ?")
                    .bind(now)
                    .execute(&self.pool)
                    .await?;
            Ok(result.rows_affected())
        }
    }

    #[async_trait]
    impl TaskRepo for SqliteStore {
        async fn create_task(&self, new: &NewTask<'_>) -> StoreResult<TaskRow> {
            let row = sqlx::query_as::<_, TaskRow>(
                r#"
                INSERT INTO tasks (
                    user_id, title, description, priority, estimated_minutes,
                    due_at, is_completed, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
                RETURNING *
                "#,
            )
            .bind(new.user_id)
            .bind(new.title)
            .bind(new.description)
            .bind(new.priority)
            .bind(new.estimated_minutes)
            .bind(new.due_at)
            .bind(new.created_at)
            .bind(new.created_at)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_task(&self, task_id: i64) -> StoreResult<Option<TaskRow>> {
            let row = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = ?")
                .bind(task_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn list_tasks(
            &self,
            user_id: i64,
            filter: &TaskFilter,
            sort: TaskSortBy,
            now: OffsetDateTime,
        ) -> StoreResult<Vec<TaskRow>> {
            let mut sql = String::from("SELECT * FROM tasks WHERE user_id = ?");

            if filter.search.is_some() {
                sql.push_str(" AND (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')");
            }
            if filter.priority.is_some() {
                sql.push_str(" AND priority = ?");
            }
            // Negative windows are treated as no filter at all.
            let due_cutoff = filter
                .due_within_days
                .filter(|days| *days >= 0)
                .map(|days| now + time::Duration::days(days));
            if due_cutoff.is_some() {
                sql.push_str(" AND due_at IS NOT NULL AND due_at <= ?");
            }

            sql.push_str(match sort {
                TaskSortBy::Priority => " ORDER BY priority ASC, created_at DESC",
                TaskSortBy::DueAt => " ORDER BY due_at IS NULL, due_at ASC",
                TaskSortBy::EstimatedMinutes => " ORDER BY estimated_minutes ASC, created_at DESC",
                TaskSortBy::CreatedAt => " ORDER BY created_at DESC",
            });

            let mut query = sqlx::query_as::<_, TaskRow>(&sql).bind(user_id);
            if let Some(search) = &filter.search {
                let pattern = format!("%{}%", escape_like(search));
                query = query.bind(pattern.clone()).bind(pattern);
            }
            if let Some(priority) = filter.priority {
                query = query.bind(priority);
            }
            if let Some(cutoff) = due_cutoff {
                query = query.bind(cutoff);
            }

            Ok(query.fetch_all(&self.pool).await?)
        }

        async fn update_task(&self, task: &TaskRow) -> StoreResult<()> {
            let result = sqlx::query(
                r#"
                UPDATE tasks SET
                    title = ?, description = ?, priority = ?, estimated_minutes = ?,
                    due_at = ?, is_completed = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority)
            .bind(task.estimated_minutes)
            .bind(task.due_at)
            .bind(task.is_completed)
            .bind(task.updated_at)
            .bind(task.id)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("task {} not found", task.id)));
            }
            Ok(())
        }

        async fn delete_task(&self, task_id: i64) -> StoreResult<()> {
            let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
                .bind(task_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("task {task_id} not found")));
            }
            Ok(())
        }

        async fn set_task_completion(
            &self,
            task_id: i64,
            complete: bool,
            cascade: bool,
            now: OffsetDateTime,
        ) -> StoreResult<()> {
            let mut tx = self.pool.begin().await?;

            let result = sqlx::query("UPDATE tasks SET is_completed = ?, updated_at = ? WHERE id = ?")
                .bind(complete)
                .bind(now)
                .bind(task_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("task {task_id} not found")));
            }

            if cascade {
                sqlx::query("UPDATE subtasks SET is_completed = ?, updated_at = ? WHERE task_id = ?")
                    .bind(complete)
                    .bind(now)
                    .bind(task_id)
                    .execute(&mut *tx)
                    .await?;
            }

            tx.commit().await?;
            Ok(())
        }
    }

    #[async_trait]
    impl SubtaskRepo for SqliteStore {
        async fn create_subtask(&self, new: &NewSubtask<'_>) -> StoreResult<SubtaskRow> {
            let row = sqlx::query_as::<_, SubtaskRow>(
                r#"
                INSERT INTO subtasks (
                    task_id, parent_subtask_id, title, description,
                    is_completed, order_index, created_at, updated_at
                ) VALUES (?, ?, ?, ?, 0, ?, ?, ?)
                RETURNING *
                "#,
            )
            .bind(new.task_id)
            .bind(new.parent_subtask_id)
            .bind(new.title)
            .bind(new.description)
            .bind(new.order_index)
            .bind(new.created_at)
            .bind(new.created_at)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_subtask(&self, subtask_id: i64) -> StoreResult<Option<SubtaskRow>> {
            let row = sqlx::query_as::<_, SubtaskRow>("SELECT * FROM subtasks WHERE id = ?")
                .bind(subtask_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn list_subtasks_for_task(&self, task_id: i64) -> StoreResult<Vec<SubtaskRow>> {
            let rows = sqlx::query_as::<_, SubtaskRow>(
                "SELECT * FROM subtasks WHERE task_id = ? ORDER BY id",
            )
            .bind(task_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn list_subtasks_for_user(&self, user_id: i64) -> StoreResult<Vec<SubtaskRow>> {
            let rows = sqlx::query_as::<_, SubtaskRow>(
                "SELECT s.* FROM subtasks s \
                 INNER JOIN tasks t ON t.id = s.task_id \
                 WHERE t.user_id = ? ORDER BY s.id",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn update_subtask(&self, subtask: &SubtaskRow) -> StoreResult<()> {
            let result = sqlx::query(
                r#"
                UPDATE subtasks SET
                    parent_subtask_id = ?, title = ?, description = ?,
                    is_completed = ?, order_index = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(subtask.parent_subtask_id)
            .bind(&subtask.title)
            .bind(&subtask.description)
            .bind(subtask.is_completed)
            .bind(subtask.order_index)
            .bind(subtask.updated_at)
            .bind(subtask.id)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!(
                    "subtask {} not found",
                    subtask.id
                )));
            }
            Ok(())
        }

        async fn delete_subtask(&self, subtask_id: i64) -> StoreResult<()> {
            let result = sqlx::query("DELETE FROM subtasks WHERE id = ?")
                .bind(subtask_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!(
                    "subtask {subtask_id} not found"
                )));
            }
            Ok(())
        }

        async fn set_subtasks_completion(
            &self,
            subtask_ids: &[i64],
            complete: bool,
            now: OffsetDateTime,
        ) -> StoreResult<()> {
            if subtask_ids.is_empty() {
                return Ok(());
            }

            let mut tx = self.pool.begin().await?;

            // SQLite caps bound parameters per statement, so chunk the id list.
            const BATCH_SIZE: usize = 900;
            for batch in subtask_ids.chunks(BATCH_SIZE) {
                let placeholders: Vec<&str> = batch.iter().map(|_| "?").collect();
                let sql = format!(
                    "UPDATE subtasks SET is_completed = ?, updated_at = ? WHERE id IN ({})",
                    placeholders.join(", ")
                );
                let mut query = sqlx::query(&sql).bind(complete).bind(now);
                for id in batch {
                    query = query.bind(*id);
                }
                query.execute(&mut *tx).await?;
            }

            tx.commit().await?;
            Ok(())
        }
    }
}

const SCHEMA_SQL: &str = r#"
-- Users
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);

-- Login sessions; token_hash is the SHA-256 hex digest of the bearer token
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token_hash TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    expires_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at) WHERE expires_at IS NOT NULL;

-- Tasks
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    priority INTEGER NOT NULL DEFAULT 3,
    estimated_minutes INTEGER NOT NULL DEFAULT 0,
    due_at TEXT,
    is_completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id);
CREATE INDEX IF NOT EXISTS idx_tasks_user_due ON tasks(user_id, due_at);

-- Subtasks; parent_subtask_id forms a forest within one task
CREATE TABLE IF NOT EXISTS subtasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    parent_subtask_id INTEGER REFERENCES subtasks(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    is_completed INTEGER NOT NULL DEFAULT 0,
    order_index INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_subtasks_task ON subtasks(task_id);
CREATE INDEX IF NOT EXISTS idx_subtasks_parent ON subtasks(parent_subtask_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_passthrough() {
        assert_eq!(escape_like("groceries"), "groceries");
        assert_eq!(escape_like(""), "");
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
