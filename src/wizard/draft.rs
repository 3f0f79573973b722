//! Draft snapshots of an in-progress wizard.
//!
//! Only an in-memory store ships: drafts live as long as the process and
//! are not restored into new sessions automatically.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::form::FormState;
use super::state::WizardStep;
use crate::error::DraftError;

/// A saved copy of a session's form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    /// Session the draft was taken from.
    pub session_id: Uuid,
    pub user_id: String,
    pub step: WizardStep,
    pub form: FormState,
    pub saved_at: DateTime<Utc>,
}

impl Draft {
    pub fn snapshot(
        session_id: Uuid,
        user_id: impl Into<String>,
        step: WizardStep,
        form: &FormState,
    ) -> Self {
        Self {
            session_id,
            user_id: user_id.into(),
            step,
            form: form.clone(),
            saved_at: Utc::now(),
        }
    }
}

/// Where drafts are written.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Save (or overwrite) the draft for its session.
    async fn save_draft(&self, draft: &Draft) -> Result<(), DraftError>;

    /// Load the latest draft for a session.
    async fn load_draft(&self, session_id: Uuid) -> Result<Option<Draft>, DraftError>;
}

/// Process-local draft store.
#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: RwLock<HashMap<Uuid, Draft>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.drafts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.drafts.read().await.is_empty()
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn save_draft(&self, draft: &Draft) -> Result<(), DraftError> {
        // Drafts must survive serialization.
        let stored: Draft = serde_json::from_value(serde_json::to_value(draft)?)?;
        self.drafts.write().await.insert(draft.session_id, stored);
        tracing::debug!(session_id = %draft.session_id, step = %draft.step, "Draft saved");
        Ok(())
    }

    async fn load_draft(&self, session_id: Uuid) -> Result<Option<Draft>, DraftError> {
        Ok(self.drafts.read().await.get(&session_id).cloned())
    }
}
