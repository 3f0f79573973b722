//! Agent-creation wizard.
//!
//! A five-step flow (identity, business, knowledge, behavior, deployment)
//! that collects a `FormState`, gates each step on validation, and submits
//! the result to an `AgentStore` as a new agent.

pub mod draft;
pub mod files;
pub mod form;
pub mod routes;
pub mod schema;
pub mod session;
pub mod state;
pub mod steps;
pub mod submission;
pub mod templates;

pub use draft::{Draft, DraftStore, MemoryDraftStore};
pub use files::{FileSelection, UploadedFile};
pub use form::{FieldEdit, FormState, Purpose, ResponseStyle};
pub use routes::{WizardRouteState, wizard_routes};
pub use schema::{Field, FieldError, Schema, StepValidation};
pub use session::{Notification, NotificationLevel, SessionSnapshot, WizardSession, WizardSessions};
pub use state::{WizardState, WizardStatus, WizardStep};
pub use steps::{StepRenderer, StepView, renderer_for};
pub use submission::{build_create_request, build_system_prompt, temperature};
pub use templates::{Template, UseCase, apply_template};
