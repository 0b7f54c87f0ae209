//! SurrealDB implementation of [`WorkspaceRepository`].

use chrono::{DateTime, Utc};
use consay_core::error::{ConsayError, ConsayResult};
use consay_core::models::workspace::{CreateWorkspace, Workspace};
use consay_core::repository::WorkspaceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct WorkspaceRow {
    name: String,
    owner_id: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct WorkspaceRowWithId {
    row_id: String,
    name: String,
    owner_id: String,
    created_at: DateTime<Utc>,
}

fn row_to_workspace(row: WorkspaceRow, id: Uuid) -> Result<Workspace, DbError> {
    let owner_id = Uuid::parse_str(&row.owner_id)
        .map_err(|e| DbError::Migration(format!("invalid owner UUID: {e}")))?;
    Ok(Workspace {
        id,
        name: row.name,
        owner_id,
        created_at: row.created_at,
    })
}

impl WorkspaceRowWithId {
    fn try_into_workspace(self) -> Result<Workspace, DbError> {
        let id = Uuid::parse_str(&self.row_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| DbError::Migration(format!("invalid owner UUID: {e}")))?;
        Ok(Workspace {
            id,
            name: self.name,
            owner_id,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Workspace repository.
#[derive(Clone)]
pub struct SurrealWorkspaceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWorkspaceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> WorkspaceRepository for SurrealWorkspaceRepository<C> {
    async fn create(&self, input: CreateWorkspace) -> ConsayResult<Workspace> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ConsayError::Validation {
                message: "workspace name must not be empty".into(),
            });
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('workspace', $id) SET \
                 name = $name, \
                 owner_id = $owner_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", name))
            .bind(("owner_id", input.owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<WorkspaceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace".into(),
            id: id_str,
        })?;

        row_to_workspace(row, id).map_err(Into::into)
    }

    async fn get_owned(&self, owner_id: Uuid, id: Uuid) -> ConsayResult<Workspace> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('workspace', $id) \
                 WHERE owner_id = $owner_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkspaceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workspace".into(),
            id: id_str,
        })?;

        row_to_workspace(row, id).map_err(Into::into)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> ConsayResult<Vec<Workspace>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS row_id, * \
                 FROM workspace \
                 WHERE owner_id = $owner_id \
                 ORDER BY created_at DESC",
            )
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkspaceRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_workspace().map_err(Into::into))
            .collect()
    }
}
