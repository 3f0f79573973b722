//! WizardSession: coordinates wizard state, form edits, inline errors, and
//! the calls out to the draft and agent stores.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::draft::{Draft, DraftStore};
use super::files::{self, FileSelection, UploadedFile};
use super::form::{FieldEdit, FormState};
use super::schema::{Field, FieldError, Schema, StepValidation, step_fields};
use super::state::{WizardState, WizardStatus, WizardStep};
use super::steps::{StepView, renderer_for};
use super::submission::build_create_request;
use super::templates::{UseCase, apply_template};
use crate::config::WizardConfig;
use crate::error::WizardError;
use crate::store::{Agent, AgentStore};

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// A toast-style message queued for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Point-in-time view of a session for clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub user_id: String,
    pub state: WizardState,
    pub form: FormState,
    pub view: StepView,
    pub errors: BTreeMap<Field, String>,
    pub notifications: Vec<Notification>,
}

/// One open wizard instance.
pub struct WizardSession {
    id: Uuid,
    config: WizardConfig,
    schema: Schema,
    agents: Arc<dyn AgentStore>,
    drafts: Arc<dyn DraftStore>,
    state: WizardState,
    form: FormState,
    errors: BTreeMap<Field, String>,
    notifications: Vec<Notification>,
    last_activity: Instant,
}

impl WizardSession {
    pub fn new(
        config: WizardConfig,
        agents: Arc<dyn AgentStore>,
        drafts: Arc<dyn DraftStore>,
    ) -> Self {
        let schema = Schema::new(config.max_file_bytes);
        Self {
            id: Uuid::new_v4(),
            config,
            schema,
            agents,
            drafts,
            state: WizardState::default(),
            form: FormState::default(),
            errors: BTreeMap::new(),
            notifications: Vec::new(),
            last_activity: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Inline errors currently shown next to fields.
    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn is_closed(&self) -> bool {
        self.state.status.is_terminal()
    }

    /// Mark the session as used now.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.is_closed() {
            return Err(WizardError::Closed {
                status: self.state.status,
            });
        }
        Ok(())
    }

    fn notify(&mut self, level: NotificationLevel, title: &str, message: impl Into<String>) {
        self.notifications
            .push(Notification::new(level, title, message));
    }

    /// Replace the inline errors of `step` with `validation`.
    fn show_step_errors(&mut self, step: WizardStep, validation: &StepValidation) {
        for field in step_fields(step) {
            self.errors.remove(field);
        }
        for error in validation.errors() {
            self.errors.insert(error.field, error.message.clone());
        }
    }

    /// Apply one field edit and validate that field.
    ///
    /// Returns the field's error, if any; an invalid value is still stored.
    pub fn edit(&mut self, edit: FieldEdit) -> Result<Option<FieldError>, WizardError> {
        self.ensure_open()?;
        let field = self.form.apply(edit);
        match self.schema.validate_field(&self.form, field) {
            Ok(()) => {
                self.errors.remove(&field);
                Ok(None)
            }
            Err(error) => {
                self.errors.insert(field, error.message.clone());
                Ok(Some(error))
            }
        }
    }

    /// Record an edit whose value could not be read as the field's type.
    /// The form keeps its previous value.
    pub fn reject_edit(&mut self, field: Field) -> Result<FieldError, WizardError> {
        self.ensure_open()?;
        let error = FieldError::new(field, format!("{} has an invalid value", field.label()));
        self.errors.insert(field, error.message.clone());
        Ok(error)
    }

    /// Advance if the current step validates; otherwise show its errors.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let from = self.state.step;
        match self.state.next(&self.form, &self.schema) {
            Ok(state) => {
                self.show_step_errors(from, &StepValidation::default());
                self.state = state;
                if state.step != from {
                    info!(session_id = %self.id, from = %from, to = %state.step, "Wizard advanced");
                }
                Ok(state.step)
            }
            Err(WizardError::StepInvalid { step, errors }) => {
                debug!(session_id = %self.id, step = %step, count = errors.len(), "Step blocked");
                self.show_step_errors(step, &errors);
                Err(WizardError::StepInvalid { step, errors })
            }
            Err(e) => Err(e),
        }
    }

    pub fn previous(&mut self) -> Result<WizardStep, WizardError> {
        self.state = self.state.previous()?;
        Ok(self.state.step)
    }

    /// Jump to an already visited step (1-based).
    pub fn jump_to(&mut self, n: u8) -> Result<WizardStep, WizardError> {
        self.state = self.state.jump_to(n)?;
        debug!(session_id = %self.id, step = %self.state.step, "Wizard jumped");
        Ok(self.state.step)
    }

    /// Attach file metadata; rejected files are reported, not attached.
    pub fn select_files(&mut self, incoming: Vec<UploadedFile>) -> Result<FileSelection, WizardError> {
        self.ensure_open()?;
        let selection = files::select_files(&mut self.form.files, incoming, self.config.max_file_bytes);
        if !selection.rejected.is_empty() {
            let names: Vec<&str> = selection.rejected.iter().map(|r| r.name.as_str()).collect();
            self.notify(
                NotificationLevel::Error,
                "Some files were not added",
                names.join(", "),
            );
        }
        self.revalidate(Field::Files);
        Ok(selection)
    }

    pub fn remove_file(&mut self, name: &str) -> Result<bool, WizardError> {
        self.ensure_open()?;
        let removed = files::remove_file(&mut self.form.files, name);
        self.revalidate(Field::Files);
        Ok(removed)
    }

    pub fn apply_template(&mut self, use_case: UseCase) -> Result<(), WizardError> {
        self.ensure_open()?;
        apply_template(&mut self.form, use_case);
        for field in [
            Field::UseCase,
            Field::WhatWeDo,
            Field::WhatWeDontDo,
            Field::FallbackMessage,
            Field::ResponseStyle,
        ] {
            self.revalidate(field);
        }
        Ok(())
    }

    /// Refresh an inline error only if one is already showing.
    fn revalidate(&mut self, field: Field) {
        if self.errors.contains_key(&field) {
            match self.schema.validate_field(&self.form, field) {
                Ok(()) => {
                    self.errors.remove(&field);
                }
                Err(error) => {
                    self.errors.insert(field, error.message);
                }
            }
        }
    }

    /// Snapshot the form into the draft store.
    pub async fn save_draft(&mut self) -> Result<Draft, WizardError> {
        self.ensure_open()?;
        let draft = Draft::snapshot(self.id, self.user_id(), self.state.step, &self.form);
        match self.drafts.save_draft(&draft).await {
            Ok(()) => {
                self.notify(
                    NotificationLevel::Success,
                    "Draft saved",
                    "Your progress has been saved.",
                );
                Ok(draft)
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Draft save failed");
                self.notify(NotificationLevel::Error, "Could not save draft", e.to_string());
                Err(e.into())
            }
        }
    }

    /// Create the agent from the completed form.
    ///
    /// On success the wizard closes and the form resets. On rejection the
    /// form is untouched and the wizard stays open at the final step.
    pub async fn submit(&mut self) -> Result<Agent, WizardError> {
        self.state.ensure_can_submit()?;
        if let Err((step, errors)) = self.schema.validate_all(&self.form) {
            self.show_step_errors(step, &errors);
            self.notify(
                NotificationLevel::Error,
                "Please fix the highlighted fields",
                format!("Step {} ({}) has invalid fields.", step.number(), step.title()),
            );
            return Err(WizardError::StepInvalid { step, errors });
        }

        let request = build_create_request(&self.form, &self.config);
        info!(session_id = %self.id, name = %request.name, "Submitting agent");

        match self.agents.create_agent(&request).await {
            Ok(agent) => {
                info!(session_id = %self.id, agent_id = %agent.id, "Agent created from wizard");
                self.notify(
                    NotificationLevel::Success,
                    "Agent created",
                    format!("{} is ready.", agent.name),
                );
                self.state = self.state.close(WizardStatus::Submitted);
                self.form = FormState::default();
                self.errors.clear();
                Ok(agent)
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Agent creation failed");
                self.notify(NotificationLevel::Error, "Agent creation failed", e.to_string());
                Err(e.into())
            }
        }
    }

    /// Abandon the wizard without creating anything.
    pub fn cancel(&mut self) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.state = self.state.close(WizardStatus::Cancelled);
        self.notify(
            NotificationLevel::Info,
            "Wizard cancelled",
            "No agent was created.",
        );
        info!(session_id = %self.id, "Wizard cancelled");
        Ok(())
    }

    /// Render the current step.
    pub fn render(&self) -> StepView {
        renderer_for(self.state.step).render(&self.form, &self.schema, &self.errors)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Snapshot for clients; drains pending notifications.
    pub fn snapshot(&mut self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            user_id: self.config.user_id.clone(),
            state: self.state,
            form: self.form.clone(),
            view: self.render(),
            errors: self.errors.clone(),
            notifications: self.drain_notifications(),
        }
    }
}

/// Registry of open sessions, keyed by id.
pub struct WizardSessions {
    config: WizardConfig,
    agents: Arc<dyn AgentStore>,
    drafts: Arc<dyn DraftStore>,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<WizardSession>>>>,
}

impl WizardSessions {
    pub fn new(
        config: WizardConfig,
        agents: Arc<dyn AgentStore>,
        drafts: Arc<dyn DraftStore>,
    ) -> Self {
        Self {
            config,
            agents,
            drafts,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn agents(&self) -> &Arc<dyn AgentStore> {
        &self.agents
    }

    /// Open a new session, optionally for a user other than the default.
    pub async fn open(&self, user_id: Option<String>) -> Arc<Mutex<WizardSession>> {
        self.evict_idle().await;
        let mut config = self.config.clone();
        if let Some(user_id) = user_id.filter(|u| !u.trim().is_empty()) {
            config.user_id = user_id;
        }
        let session = WizardSession::new(config, self.agents.clone(), self.drafts.clone());
        let id = session.id();
        info!(session_id = %id, user_id = %session.user_id(), "Wizard opened");

        let session = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, session.clone());
        session
    }

    /// Look up a session and mark it active.
    pub async fn get(&self, id: Uuid) -> Result<Arc<Mutex<WizardSession>>, WizardError> {
        self.evict_idle().await;
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(WizardError::SessionNotFound(id))?;
        session.lock().await.touch();
        Ok(session)
    }

    /// Drop sessions idle for longer than the configured TTL. Sessions locked
    /// by an in-flight request are kept. Returns how many were dropped.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.config.session_ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| match session.try_lock() {
            Ok(session) if session.idle_for() > ttl => {
                info!(
                    session_id = %id,
                    idle_secs = session.idle_for().as_secs(),
                    "Idle wizard session evicted"
                );
                false
            }
            _ => true,
        });
        before - sessions.len()
    }

    /// Drop the session if it has closed. Returns whether it was removed.
    pub async fn release_if_closed(&self, id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let closed = match sessions.get(&id) {
            Some(session) => session.lock().await.is_closed(),
            None => return false,
        };
        if closed {
            sessions.remove(&id);
            debug!(session_id = %id, "Wizard session released");
        }
        closed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
