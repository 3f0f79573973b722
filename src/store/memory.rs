//! In-memory `AgentStore` that behaves like a remote API: every call waits
//! for a simulated round trip, and a failure can be queued to exercise error
//! paths.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::traits::{Agent, AgentStore, CreateAgentRequest, UpdateAgentRequest};
use crate::error::StoreError;

/// Mock agent backend.
#[derive(Default)]
pub struct MockAgentStore {
    agents: RwLock<HashMap<Uuid, Agent>>,
    latency: Duration,
    pending_failure: Mutex<Option<String>>,
}

impl MockAgentStore {
    /// Create a store that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose calls take `latency` plus up to 50% jitter.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Make the next call fail with `StoreError::Rejected(reason)`.
    pub async fn fail_next(&self, reason: impl Into<String>) {
        *self.pending_failure.lock().await = Some(reason.into());
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }

    /// Wait out the simulated round trip, then surface any queued failure.
    async fn round_trip(&self, op: &str) -> Result<(), StoreError> {
        if !self.latency.is_zero() {
            let base = self.latency.as_millis() as u64;
            let jitter = rand::thread_rng().gen_range(0..=base / 2);
            tokio::time::sleep(Duration::from_millis(base + jitter)).await;
        }
        if let Some(reason) = self.pending_failure.lock().await.take() {
            debug!(op, %reason, "Simulated store failure");
            return Err(StoreError::Rejected(reason));
        }
        Ok(())
    }
}

#[async_trait]
impl AgentStore for MockAgentStore {
    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<Agent, StoreError> {
        self.round_trip("create_agent").await?;
        request.check()?;

        let agent = Agent::from_request(request);
        self.agents.write().await.insert(agent.id, agent.clone());
        info!(agent_id = %agent.id, name = %agent.name, "Agent created");
        Ok(agent)
    }

    async fn get_agent(&self, id: Uuid) -> Result<Option<Agent>, StoreError> {
        self.round_trip("get_agent").await?;
        Ok(self.agents.read().await.get(&id).cloned())
    }

    async fn update_agent(
        &self,
        id: Uuid,
        request: &UpdateAgentRequest,
    ) -> Result<Agent, StoreError> {
        self.round_trip("update_agent").await?;
        request.check()?;

        let mut agents = self.agents.write().await;
        let agent = agents.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "agent".into(),
            id: id.to_string(),
        })?;
        request.apply_to(agent);
        info!(agent_id = %id, "Agent updated");
        Ok(agent.clone())
    }

    async fn delete_agent(&self, id: Uuid) -> Result<bool, StoreError> {
        self.round_trip("delete_agent").await?;
        let removed = self.agents.write().await.remove(&id).is_some();
        if removed {
            info!(agent_id = %id, "Agent deleted");
        }
        Ok(removed)
    }

    async fn list_agents(&self, user_id: &str) -> Result<Vec<Agent>, StoreError> {
        self.round_trip("list_agents").await?;
        let mut agents: Vec<Agent> = self
            .agents
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        agents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(agents)
    }
}
