//! `AgentStore` trait: the system of record for agents.
//!
//! The wizard only depends on this port; the mock and libSQL backends are
//! interchangeable behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// A persisted agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Materialize a create request as a new, active agent.
    pub fn from_request(request: &CreateAgentRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: request.user_id.clone(),
            name: request.name.clone(),
            description: request.description.clone(),
            model: request.model.clone(),
            system_prompt: request.system_prompt.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload for creating an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub description: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub user_id: String,
}

impl CreateAgentRequest {
    /// Constraints every backend enforces before writing.
    pub fn check(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Constraint("agent name must not be empty".into()));
        }
        if self.user_id.trim().is_empty() {
            return Err(StoreError::Constraint("user_id must not be empty".into()));
        }
        check_temperature(self.temperature)?;
        check_max_tokens(self.max_tokens)
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateAgentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateAgentRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn check(&self) -> Result<(), StoreError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(StoreError::Constraint("agent name must not be empty".into()));
            }
        }
        if let Some(t) = self.temperature {
            check_temperature(t)?;
        }
        if let Some(m) = self.max_tokens {
            check_max_tokens(m)?;
        }
        Ok(())
    }

    /// Apply the set fields to `agent` and bump `updated_at`.
    pub fn apply_to(&self, agent: &mut Agent) {
        if let Some(v) = &self.name {
            agent.name = v.clone();
        }
        if let Some(v) = &self.description {
            agent.description = v.clone();
        }
        if let Some(v) = &self.model {
            agent.model = v.clone();
        }
        if let Some(v) = &self.system_prompt {
            agent.system_prompt = v.clone();
        }
        if let Some(v) = self.temperature {
            agent.temperature = v;
        }
        if let Some(v) = self.max_tokens {
            agent.max_tokens = v;
        }
        if let Some(v) = self.is_active {
            agent.is_active = v;
        }
        agent.updated_at = Utc::now();
    }
}

fn check_temperature(t: f64) -> Result<(), StoreError> {
    if !(0.0..=2.0).contains(&t) {
        return Err(StoreError::Constraint(format!(
            "temperature {t} is outside 0.0..=2.0"
        )));
    }
    Ok(())
}

fn check_max_tokens(max_tokens: u32) -> Result<(), StoreError> {
    if max_tokens == 0 {
        return Err(StoreError::Constraint("max_tokens must be positive".into()));
    }
    Ok(())
}

/// Backend-agnostic agent storage.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Create an agent and return the stored record.
    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<Agent, StoreError>;

    /// Get an agent by ID.
    async fn get_agent(&self, id: Uuid) -> Result<Option<Agent>, StoreError>;

    /// Update an agent. Fails with `NotFound` if it doesn't exist.
    async fn update_agent(
        &self,
        id: Uuid,
        request: &UpdateAgentRequest,
    ) -> Result<Agent, StoreError>;

    /// Delete an agent. Returns whether a record was removed.
    async fn delete_agent(&self, id: Uuid) -> Result<bool, StoreError>;

    /// List a user's agents, newest first.
    async fn list_agents(&self, user_id: &str) -> Result<Vec<Agent>, StoreError>;
}
