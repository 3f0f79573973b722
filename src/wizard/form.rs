//! Form state edited across the wizard steps.

use serde::{Deserialize, Serialize};

use super::files::UploadedFile;
use super::schema::Field;
use super::templates::UseCase;

/// What the agent is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Sales,
    Support,
    Leads,
    Other,
}

impl Purpose {
    /// Human-readable label used in previews and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sales => "Sales",
            Self::Support => "Customer Support",
            Self::Leads => "Lead Generation",
            Self::Other => "General Assistance",
        }
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sales => write!(f, "sales"),
            Self::Support => write!(f, "support"),
            Self::Leads => write!(f, "leads"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// How the agent phrases its answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStyle {
    Concise,
    Detailed,
    Friendly,
    Professional,
}

impl Default for ResponseStyle {
    fn default() -> Self {
        Self::Friendly
    }
}

impl std::fmt::Display for ResponseStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concise => write!(f, "concise"),
            Self::Detailed => write!(f, "detailed"),
            Self::Friendly => write!(f, "friendly"),
            Self::Professional => write!(f, "professional"),
        }
    }
}

/// Which visitor details the agent asks for during a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCollection {
    pub name: bool,
    pub email: bool,
    pub phone: bool,
    pub company: bool,
}

impl Default for DataCollection {
    fn default() -> Self {
        Self {
            name: false,
            email: true,
            phone: false,
            company: false,
        }
    }
}

impl DataCollection {
    /// Labels of the enabled flags, in display order.
    pub fn enabled_labels(&self) -> Vec<&'static str> {
        [
            (self.name, "name"),
            (self.email, "email"),
            (self.phone, "phone"),
            (self.company, "company"),
        ]
        .into_iter()
        .filter_map(|(on, label)| on.then_some(label))
        .collect()
    }
}

/// Escalation to a human operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanHandoff {
    pub enabled: bool,
    /// Confidence threshold (0–100) below which the agent hands off.
    pub threshold: i32,
    #[serde(default)]
    pub message: String,
}

impl Default for HumanHandoff {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 70,
            message: String::new(),
        }
    }
}

/// The complete set of values edited across the five wizard steps.
///
/// Created with defaults when a session opens, mutated in place by every
/// edit, and discarded when the session closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormState {
    // Identity
    pub name: String,
    pub description: String,
    pub avatar: Option<String>,
    pub purpose: Option<Purpose>,

    // Business
    pub industry: String,
    pub use_case: Option<UseCase>,
    pub what_we_do: String,
    pub what_we_dont_do: String,

    // Knowledge
    pub files: Vec<UploadedFile>,
    pub personality_tone: i32,
    pub data_collection: DataCollection,
    pub knowledge_base: String,

    // Behavior
    pub response_style: ResponseStyle,
    pub fallback_message: String,
    pub human_handoff: HumanHandoff,

    // Deployment
    pub is_active: bool,
    pub is_public: bool,
    pub allow_feedback: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            avatar: None,
            purpose: None,
            industry: String::new(),
            use_case: None,
            what_we_do: String::new(),
            what_we_dont_do: String::new(),
            files: Vec::new(),
            personality_tone: 50,
            data_collection: DataCollection::default(),
            knowledge_base: String::new(),
            response_style: ResponseStyle::default(),
            fallback_message: String::new(),
            human_handoff: HumanHandoff::default(),
            is_active: true,
            is_public: false,
            allow_feedback: true,
        }
    }
}

/// A single typed field edit.
///
/// Serialized as `{"field": "<name>", "value": <value>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    Name(String),
    Description(String),
    Avatar(Option<String>),
    Purpose(Purpose),
    Industry(String),
    UseCase(UseCase),
    WhatWeDo(String),
    WhatWeDontDo(String),
    PersonalityTone(i32),
    DataCollection(DataCollection),
    KnowledgeBase(String),
    ResponseStyle(ResponseStyle),
    FallbackMessage(String),
    HumanHandoffEnabled(bool),
    HumanHandoffThreshold(i32),
    HumanHandoffMessage(String),
    IsActive(bool),
    IsPublic(bool),
    AllowFeedback(bool),
}

impl FieldEdit {
    /// The schema field this edit writes.
    pub fn field(&self) -> Field {
        match self {
            Self::Name(_) => Field::Name,
            Self::Description(_) => Field::Description,
            Self::Avatar(_) => Field::Avatar,
            Self::Purpose(_) => Field::Purpose,
            Self::Industry(_) => Field::Industry,
            Self::UseCase(_) => Field::UseCase,
            Self::WhatWeDo(_) => Field::WhatWeDo,
            Self::WhatWeDontDo(_) => Field::WhatWeDontDo,
            Self::PersonalityTone(_) => Field::PersonalityTone,
            Self::DataCollection(_) => Field::DataCollection,
            Self::KnowledgeBase(_) => Field::KnowledgeBase,
            Self::ResponseStyle(_) => Field::ResponseStyle,
            Self::FallbackMessage(_) => Field::FallbackMessage,
            Self::HumanHandoffEnabled(_) => Field::HumanHandoffEnabled,
            Self::HumanHandoffThreshold(_) => Field::HumanHandoffThreshold,
            Self::HumanHandoffMessage(_) => Field::HumanHandoffMessage,
            Self::IsActive(_) => Field::IsActive,
            Self::IsPublic(_) => Field::IsPublic,
            Self::AllowFeedback(_) => Field::AllowFeedback,
        }
    }
}

impl FormState {
    /// Write an edit into the form. Values are stored as given; validation
    /// is the caller's concern.
    pub fn apply(&mut self, edit: FieldEdit) -> Field {
        let field = edit.field();
        match edit {
            FieldEdit::Name(v) => self.name = v,
            FieldEdit::Description(v) => self.description = v,
            FieldEdit::Avatar(v) => self.avatar = v.filter(|s| !s.trim().is_empty()),
            FieldEdit::Purpose(v) => self.purpose = Some(v),
            FieldEdit::Industry(v) => self.industry = v,
            FieldEdit::UseCase(v) => self.use_case = Some(v),
            FieldEdit::WhatWeDo(v) => self.what_we_do = v,
            FieldEdit::WhatWeDontDo(v) => self.what_we_dont_do = v,
            FieldEdit::PersonalityTone(v) => self.personality_tone = v,
            FieldEdit::DataCollection(v) => self.data_collection = v,
            FieldEdit::KnowledgeBase(v) => self.knowledge_base = v,
            FieldEdit::ResponseStyle(v) => self.response_style = v,
            FieldEdit::FallbackMessage(v) => self.fallback_message = v,
            FieldEdit::HumanHandoffEnabled(v) => self.human_handoff.enabled = v,
            FieldEdit::HumanHandoffThreshold(v) => self.human_handoff.threshold = v,
            FieldEdit::HumanHandoffMessage(v) => self.human_handoff.message = v,
            FieldEdit::IsActive(v) => self.is_active = v,
            FieldEdit::IsPublic(v) => self.is_public = v,
            FieldEdit::AllowFeedback(v) => self.allow_feedback = v,
        }
        field
    }

    /// Current value of a field as JSON, for rendering.
    pub fn value_of(&self, field: Field) -> serde_json::Value {
        use serde_json::json;
        match field {
            Field::Name => json!(self.name),
            Field::Description => json!(self.description),
            Field::Avatar => json!(self.avatar),
            Field::Purpose => json!(self.purpose),
            Field::Industry => json!(self.industry),
            Field::UseCase => json!(self.use_case),
            Field::WhatWeDo => json!(self.what_we_do),
            Field::WhatWeDontDo => json!(self.what_we_dont_do),
            Field::Files => json!(self.files),
            Field::PersonalityTone => json!(self.personality_tone),
            Field::DataCollection => json!(self.data_collection),
            Field::KnowledgeBase => json!(self.knowledge_base),
            Field::ResponseStyle => json!(self.response_style),
            Field::FallbackMessage => json!(self.fallback_message),
            Field::HumanHandoffEnabled => json!(self.human_handoff.enabled),
            Field::HumanHandoffThreshold => json!(self.human_handoff.threshold),
            Field::HumanHandoffMessage => json!(self.human_handoff.message),
            Field::IsActive => json!(self.is_active),
            Field::IsPublic => json!(self.is_public),
            Field::AllowFeedback => json!(self.allow_feedback),
        }
    }
}
