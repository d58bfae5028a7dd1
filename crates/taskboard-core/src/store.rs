//! SQLite persistence for projects and actions.
//!
//! # Schema
//!
//! ```text
//! projects (id INTEGER PK AUTOINCREMENT, name, description, completed)
//! actions  (id INTEGER PK AUTOINCREMENT, project_id -> projects.id, description, notes, completed)
//! ```
//!
//! Every pooled connection runs with `foreign_keys = ON` and the `actions`
//! foreign key is declared `ON DELETE CASCADE`. Project deletion still removes
//! the children explicitly inside the same transaction, so the cascade holds
//! even against a database file created without the constraint.
//!
//! The database runs in WAL mode. Writes that depend on a read (action insert
//! and update) are single statements, so each one takes the write lock up
//! front and waits on `busy_timeout` instead of failing a lock upgrade.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};

use crate::error::{BoardError, Result};
use crate::types::{Action, ActionChanges, NewAction, Project, ProjectDetail, ProjectFields};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS projects (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT    NOT NULL CHECK (length(name) <= 128),
        description TEXT    NOT NULL,
        completed   INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS actions (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id  INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        description TEXT    NOT NULL CHECK (length(description) <= 128),
        notes       TEXT    NOT NULL,
        completed   INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_actions_project_id ON actions(project_id)",
];

const PROJECT_COLUMNS: &str = "id, name, description, completed";
const ACTION_COLUMNS: &str = "id, project_id, description, notes, completed";

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Pooled handle to the taskboard database. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Connect to `url` (e.g. `sqlite://taskboard.db`), creating the file and
    /// tables if they do not exist yet.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let store = Self::connect_with(SqliteConnectOptions::from_str(url)?, max_connections).await?;
        tracing::debug!(url, max_connections, "store ready");
        Ok(store)
    }

    /// Open a database file directly. Parent directories must exist.
    pub async fn open(path: &Path) -> Result<Self> {
        let store = Self::connect_with(SqliteConnectOptions::new().filename(path), 1).await?;
        tracing::debug!(path = %path.display(), "store ready");
        Ok(store)
    }

    async fn connect_with(opts: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let opts = opts
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| BoardError::Migrate(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// A project with its actions attached.
    pub async fn project_detail(&self, id: i64) -> Result<ProjectDetail> {
        let project = self
            .get_project(id)
            .await?
            .ok_or(BoardError::ProjectNotFound(id))?;
        let actions = self.actions_for(id).await?;
        Ok(ProjectDetail { project, actions })
    }

    /// Actions of one project. A project that exists but has no actions
    /// yields an empty list; an unknown project is `ProjectNotFound`.
    pub async fn project_actions(&self, project_id: i64) -> Result<Vec<Action>> {
        if self.get_project(project_id).await?.is_none() {
            return Err(BoardError::ProjectNotFound(project_id));
        }
        self.actions_for(project_id).await
    }

    async fn actions_for(&self, project_id: i64) -> Result<Vec<Action>> {
        let rows = sqlx::query_as::<_, Action>(&format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE project_id = ? ORDER BY id"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert_project(&self, fields: &ProjectFields) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (name, description, completed) VALUES (?, ?, ?) \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.completed.unwrap_or(false))
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(id = project.id, "project created");
        Ok(project)
    }

    /// Replace name and description. `completed` is only written when given.
    pub async fn update_project(&self, id: i64, fields: &ProjectFields) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects SET name = ?, description = ?, completed = COALESCE(?, completed) \
             WHERE id = ? RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.completed)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(BoardError::ProjectNotFound(id))?;
        tracing::info!(id, "project updated");
        Ok(project)
    }

    /// Delete a project and every action that references it, atomically.
    ///
    /// Returns the number of actions removed alongside the project.
    pub async fn delete_project(&self, id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let children = sqlx::query("DELETE FROM actions WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let removed = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            // Dropping `tx` rolls back.
            return Err(BoardError::ProjectNotFound(id));
        }

        tx.commit().await?;
        tracing::info!(id, actions = children, "project deleted");
        Ok(children)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    pub async fn list_actions(&self) -> Result<Vec<Action>> {
        let rows = sqlx::query_as::<_, Action>(&format!(
            "SELECT {ACTION_COLUMNS} FROM actions ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_action(&self, id: i64) -> Result<Option<Action>> {
        let row = sqlx::query_as::<_, Action>(&format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert an action. The referenced project must exist.
    ///
    /// The existence check and the insert are one statement, so a concurrent
    /// project delete cannot leave an orphan behind.
    pub async fn insert_action(&self, new: &NewAction) -> Result<Action> {
        let action = sqlx::query_as::<_, Action>(&format!(
            "INSERT INTO actions (project_id, description, notes, completed) \
             SELECT ?, ?, ?, ? WHERE EXISTS(SELECT 1 FROM projects WHERE id = ?) \
             RETURNING {ACTION_COLUMNS}"
        ))
        .bind(new.project_id)
        .bind(&new.description)
        .bind(&new.notes)
        .bind(new.completed)
        .bind(new.project_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(BoardError::ProjectNotFound(new.project_id))?;

        tracing::info!(id = action.id, project_id = action.project_id, "action created");
        Ok(action)
    }

    /// Update an action. Fails with `ActionNotFound` before checking the
    /// referenced project, and with `ProjectNotFound` if that project is gone.
    pub async fn update_action(&self, id: i64, changes: &ActionChanges) -> Result<Action> {
        let updated = sqlx::query_as::<_, Action>(&format!(
            "UPDATE actions SET project_id = ?, description = ?, \
             notes = COALESCE(?, notes), completed = COALESCE(?, completed) \
             WHERE id = ? AND EXISTS(SELECT 1 FROM projects WHERE id = ?) \
             RETURNING {ACTION_COLUMNS}"
        ))
        .bind(changes.project_id)
        .bind(&changes.description)
        .bind(changes.notes.as_deref())
        .bind(changes.completed)
        .bind(id)
        .bind(changes.project_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(action) => {
                tracing::info!(id, "action updated");
                Ok(action)
            }
            None if self.get_action(id).await?.is_none() => Err(BoardError::ActionNotFound(id)),
            None => Err(BoardError::ProjectNotFound(changes.project_id)),
        }
    }

    pub async fn delete_action(&self, id: i64) -> Result<()> {
        let removed = sqlx::query("DELETE FROM actions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(BoardError::ActionNotFound(id));
        }
        tracing::info!(id, "action deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_tmp() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.db")).await.unwrap();
        (dir, store)
    }

    fn fields(name: &str) -> ProjectFields {
        ProjectFields {
            name: name.into(),
            description: "d".into(),
            completed: None,
        }
    }

    fn new_action(project_id: i64, description: &str) -> NewAction {
        NewAction {
            project_id,
            description: description.into(),
            notes: "n".into(),
            completed: false,
        }
    }

    #[tokio::test]
    async fn ids_start_at_one_and_increase() {
        let (_dir, store) = open_tmp().await;
        let a = store.insert_project(&fields("Alpha")).await.unwrap();
        let b = store.insert_project(&fields("Beta")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(!a.completed);

        let listed = store.list_projects().await.unwrap();
        assert_eq!(listed, vec![a, b]);
    }

    #[tokio::test]
    async fn get_missing_project_is_none() {
        let (_dir, store) = open_tmp().await;
        assert!(store.get_project(42).await.unwrap().is_none());
        let err = store.project_detail(42).await.unwrap_err();
        assert!(matches!(err, BoardError::ProjectNotFound(42)));
    }

    #[tokio::test]
    async fn update_project_keeps_completed_when_omitted() {
        let (_dir, store) = open_tmp().await;
        let p = store
            .insert_project(&ProjectFields {
                completed: Some(true),
                ..fields("Alpha")
            })
            .await
            .unwrap();

        let updated = store.update_project(p.id, &fields("Renamed")).await.unwrap();
        assert_eq!(updated.name, "Renamed");
        assert!(updated.completed);

        let err = store.update_project(99, &fields("x")).await.unwrap_err();
        assert!(matches!(err, BoardError::ProjectNotFound(99)));
    }

    #[tokio::test]
    async fn project_actions_distinguishes_empty_from_missing() {
        let (_dir, store) = open_tmp().await;
        let p = store.insert_project(&fields("Alpha")).await.unwrap();
        assert!(store.project_actions(p.id).await.unwrap().is_empty());

        let err = store.project_actions(p.id + 1).await.unwrap_err();
        assert!(matches!(err, BoardError::ProjectNotFound(_)));
    }

    #[tokio::test]
    async fn insert_action_requires_existing_project() {
        let (_dir, store) = open_tmp().await;
        let err = store.insert_action(&new_action(5, "step1")).await.unwrap_err();
        assert!(matches!(err, BoardError::ProjectNotFound(5)));
        assert!(store.list_actions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_project_cascades_to_its_actions_only() {
        let (_dir, store) = open_tmp().await;
        let keep = store.insert_project(&fields("Keep")).await.unwrap();
        let doomed = store.insert_project(&fields("Doomed")).await.unwrap();
        store.insert_action(&new_action(doomed.id, "a")).await.unwrap();
        store.insert_action(&new_action(doomed.id, "b")).await.unwrap();
        let survivor = store.insert_action(&new_action(keep.id, "c")).await.unwrap();

        let removed = store.delete_project(doomed.id).await.unwrap();
        assert_eq!(removed, 2);

        assert_eq!(store.list_actions().await.unwrap(), vec![survivor]);
        assert!(store.get_project(doomed.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete_project(doomed.id).await.unwrap_err(),
            BoardError::ProjectNotFound(_)
        ));
    }

    #[tokio::test]
    async fn update_action_checks_action_then_project() {
        let (_dir, store) = open_tmp().await;
        let p = store.insert_project(&fields("Alpha")).await.unwrap();
        let a = store.insert_action(&new_action(p.id, "step1")).await.unwrap();

        let changes = ActionChanges {
            project_id: p.id,
            description: "step1b".into(),
            notes: None,
            completed: Some(true),
        };
        let updated = store.update_action(a.id, &changes).await.unwrap();
        assert_eq!(updated.description, "step1b");
        assert_eq!(updated.notes, "n");
        assert!(updated.completed);

        let missing_action = store.update_action(77, &changes).await.unwrap_err();
        assert!(matches!(missing_action, BoardError::ActionNotFound(77)));

        let bad_project = ActionChanges {
            project_id: 999,
            ..changes
        };
        let err = store.update_action(a.id, &bad_project).await.unwrap_err();
        assert!(matches!(err, BoardError::ProjectNotFound(999)));
        assert_eq!(store.get_action(a.id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn delete_action_reports_missing_id() {
        let (_dir, store) = open_tmp().await;
        let p = store.insert_project(&fields("Alpha")).await.unwrap();
        let a = store.insert_action(&new_action(p.id, "step1")).await.unwrap();

        store.delete_action(a.id).await.unwrap();
        assert!(store.get_action(a.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete_action(a.id).await.unwrap_err(),
            BoardError::ActionNotFound(_)
        ));
    }

    #[tokio::test]
    async fn project_detail_serializes_flat_with_actions() {
        let (_dir, store) = open_tmp().await;
        let p = store.insert_project(&fields("Alpha")).await.unwrap();
        store.insert_action(&new_action(p.id, "step1")).await.unwrap();

        let detail = store.project_detail(p.id).await.unwrap();
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Alpha");
        assert_eq!(json["actions"][0]["description"], "step1");
    }

    #[tokio::test]
    async fn reopening_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("persist.db");
        {
            let store = Store::open(&path).await.unwrap();
            store.insert_project(&fields("Alpha")).await.unwrap();
            store.health_check().await.unwrap();
        }
        let store = Store::open(&path).await.unwrap();
        assert_eq!(store.list_projects().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_action_writes_all_succeed() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("concurrent.db").display());
        let store = Store::connect(&url, 5).await.unwrap();
        let project_id = store.insert_project(&fields("Alpha")).await.unwrap().id;

        let inserts: Vec<_> = (0..200)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert_action(&new_action(project_id, &format!("step{i}")))
                        .await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in inserts {
            let action = handle.await.unwrap().unwrap();
            ids.push(action.id);
        }
        assert_eq!(store.project_actions(project_id).await.unwrap().len(), 200);

        let updates: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let store = store.clone();
                tokio::spawn(async move {
                    let changes = ActionChanges {
                        project_id,
                        description: format!("done{id}"),
                        notes: None,
                        completed: Some(true),
                    };
                    store.update_action(id, &changes).await
                })
            })
            .collect();
        for handle in updates {
            assert!(handle.await.unwrap().unwrap().completed);
        }
    }

    #[tokio::test]
    async fn open_accepts_paths_with_url_metacharacters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odd?name#1.db");
        let store = Store::open(&path).await.unwrap();
        store.insert_project(&fields("Alpha")).await.unwrap();

        assert!(path.exists());
        let reopened = Store::open(&path).await.unwrap();
        assert_eq!(reopened.list_projects().await.unwrap().len(), 1);
    }
}
