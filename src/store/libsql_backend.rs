//! libSQL backend for `AgentStore`. Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::{Agent, AgentStore, CreateAgentRequest, UpdateAgentRequest};

/// libSQL agent store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlAgentStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlAgentStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Agent database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests and ephemeral runs).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        migrations::run_migrations(&self.conn).await
    }

    async fn write_agent(&self, agent: &Agent, op: &str) -> Result<u64, StoreError> {
        self.conn
            .execute(
                "UPDATE agents SET name = ?1, description = ?2, model = ?3, system_prompt = ?4,
                    temperature = ?5, max_tokens = ?6, is_active = ?7, updated_at = ?8
                 WHERE id = ?9",
                params![
                    agent.name.as_str(),
                    agent.description.as_str(),
                    agent.model.as_str(),
                    agent.system_prompt.as_str(),
                    agent.temperature,
                    i64::from(agent.max_tokens),
                    agent.is_active as i64,
                    agent.updated_at.to_rfc3339(),
                    agent.id.to_string()
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("{op}: {e}")))
    }
}

const AGENT_COLUMNS: &str = "id, user_id, name, description, model, system_prompt, \
    temperature, max_tokens, is_active, created_at, updated_at";

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn row_to_agent(row: &libsql::Row) -> Result<Agent, StoreError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| StoreError::Serialization(format!("agent id: {e}")))?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| StoreError::Serialization(format!("agent id {id_str}: {e}")))?;
    let parse = |e: libsql::Error| StoreError::Serialization(format!("agent {id}: {e}"));

    let max_tokens: i64 = row.get(7).map_err(parse)?;
    let is_active: i64 = row.get(8).map_err(parse)?;
    let created_str: String = row.get(9).map_err(parse)?;
    let updated_str: String = row.get(10).map_err(parse)?;

    Ok(Agent {
        id,
        user_id: row.get(1).map_err(parse)?,
        name: row.get(2).map_err(parse)?,
        description: row.get(3).map_err(parse)?,
        model: row.get(4).map_err(parse)?,
        system_prompt: row.get(5).map_err(parse)?,
        temperature: row.get(6).map_err(parse)?,
        max_tokens: u32::try_from(max_tokens)
            .map_err(|e| StoreError::Serialization(format!("agent {id} max_tokens: {e}")))?,
        is_active: is_active != 0,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

#[async_trait]
impl AgentStore for LibSqlAgentStore {
    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<Agent, StoreError> {
        request.check()?;
        let agent = Agent::from_request(request);

        self.conn
            .execute(
                &format!(
                    "INSERT INTO agents ({AGENT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    agent.id.to_string(),
                    agent.user_id.as_str(),
                    agent.name.as_str(),
                    agent.description.as_str(),
                    agent.model.as_str(),
                    agent.system_prompt.as_str(),
                    agent.temperature,
                    i64::from(agent.max_tokens),
                    agent.is_active as i64,
                    agent.created_at.to_rfc3339(),
                    agent.updated_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("create_agent: {e}")))?;

        info!(agent_id = %agent.id, name = %agent.name, "Agent created");
        Ok(agent)
    }

    async fn get_agent(&self, id: Uuid) -> Result<Option<Agent>, StoreError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get_agent: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_agent(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get_agent: {e}"))),
        }
    }

    async fn update_agent(
        &self,
        id: Uuid,
        request: &UpdateAgentRequest,
    ) -> Result<Agent, StoreError> {
        request.check()?;
        let mut agent = self.get_agent(id).await?.ok_or_else(|| StoreError::NotFound {
            entity: "agent".into(),
            id: id.to_string(),
        })?;
        request.apply_to(&mut agent);

        let count = self.write_agent(&agent, "update_agent").await?;
        if count == 0 {
            return Err(StoreError::NotFound {
                entity: "agent".into(),
                id: id.to_string(),
            });
        }
        info!(agent_id = %id, "Agent updated");
        Ok(agent)
    }

    async fn delete_agent(&self, id: Uuid) -> Result<bool, StoreError> {
        let count = self
            .conn
            .execute("DELETE FROM agents WHERE id = ?1", params![id.to_string()])
            .await
            .map_err(|e| StoreError::Query(format!("delete_agent: {e}")))?;
        if count > 0 {
            info!(agent_id = %id, "Agent deleted");
        }
        Ok(count > 0)
    }

    async fn list_agents(&self, user_id: &str) -> Result<Vec<Agent>, StoreError> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {AGENT_COLUMNS} FROM agents WHERE user_id = ?1
                     ORDER BY created_at DESC"
                ),
                params![user_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("list_agents: {e}")))?;

        let mut agents = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("list_agents: {e}")))?
        {
            agents.push(row_to_agent(&row)?);
        }
        Ok(agents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> LibSqlAgentStore {
        LibSqlAgentStore::new_memory().await.unwrap()
    }

    fn request(name: &str, user: &str) -> CreateAgentRequest {
        CreateAgentRequest {
            name: name.to_string(),
            description: "Answers product questions".to_string(),
            model: "gpt-4".to_string(),
            system_prompt: "You are Support Bot, a friendly AI assistant".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            user_id: user.to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_get() {
        let db = test_db().await;
        let agent = db.create_agent(&request("Support Bot", "u1")).await.unwrap();

        let fetched = db.get_agent(agent.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, agent.id);
        assert_eq!(fetched.name, "Support Bot");
        assert_eq!(fetched.max_tokens, 1000);
        assert!((fetched.temperature - 0.7).abs() < f64::EPSILON);
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn get_not_found() {
        let db = test_db().await;
        assert!(db.get_agent(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_request() {
        let db = test_db().await;
        let mut bad = request("Bot", "u1");
        bad.max_tokens = 0;
        let err = db.create_agent(&bad).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn update_persists() {
        let db = test_db().await;
        let agent = db.create_agent(&request("Bot", "u1")).await.unwrap();

        let update = UpdateAgentRequest {
            name: Some("Sales Bot".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = db.update_agent(agent.id, &update).await.unwrap();
        assert_eq!(updated.name, "Sales Bot");

        let fetched = db.get_agent(agent.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Sales Bot");
        assert!(!fetched.is_active);
        assert_eq!(fetched.description, agent.description);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let db = test_db().await;
        let err = db
            .update_agent(Uuid::new_v4(), &UpdateAgentRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_reports_removal() {
        let db = test_db().await;
        let agent = db.create_agent(&request("Bot", "u1")).await.unwrap();
        assert!(db.delete_agent(agent.id).await.unwrap());
        assert!(!db.delete_agent(agent.id).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_scoped_and_newest_first() {
        let db = test_db().await;
        let first = db.create_agent(&request("First", "u1")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = db.create_agent(&request("Second", "u1")).await.unwrap();
        db.create_agent(&request("Other", "u2")).await.unwrap();

        let agents = db.list_agents("u1").await.unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].id, second.id);
        assert_eq!(agents[1].id, first.id);
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("agents.db");

        let id = {
            let db = LibSqlAgentStore::new_local(&path).await.unwrap();
            db.create_agent(&request("Durable", "u1")).await.unwrap().id
        };

        let db = LibSqlAgentStore::new_local(&path).await.unwrap();
        let fetched = db.get_agent(id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Durable");
    }

    #[test]
    fn parse_datetime_formats() {
        let rfc = parse_datetime("2024-05-01T10:00:00+00:00");
        let sqlite = parse_datetime("2024-05-01 10:00:00");
        assert_eq!(rfc, sqlite);
        assert_eq!(parse_datetime("garbage"), DateTime::<Utc>::MIN_UTC);
    }
}
