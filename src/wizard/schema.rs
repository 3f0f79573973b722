//! Form schema: field definitions, step membership, and static validation rules.
//!
//! Rules are length bounds, enum membership, and numeric ranges. There is no
//! cross-field or asynchronous validation. Failures are values, never panics.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::files::{MAX_FILES, check_file};
use super::form::FormState;
use super::state::WizardStep;
use crate::config::DEFAULT_MAX_FILE_MB;

/// Avatar must be an http(s) URL or an inline image.
static AVATAR_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(https?://[^\s/$.?#][^\s]*|data:image/[a-z0-9.+-]+;base64,[A-Za-z0-9+/=]+)$")
        .expect("avatar regex is valid")
});

/// Every editable field of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Description,
    Avatar,
    Purpose,
    Industry,
    UseCase,
    WhatWeDo,
    WhatWeDontDo,
    Files,
    PersonalityTone,
    DataCollection,
    KnowledgeBase,
    ResponseStyle,
    FallbackMessage,
    HumanHandoffEnabled,
    HumanHandoffThreshold,
    HumanHandoffMessage,
    IsActive,
    IsPublic,
    AllowFeedback,
}

const IDENTITY_FIELDS: &[Field] = &[Field::Name, Field::Description, Field::Avatar, Field::Purpose];
const BUSINESS_FIELDS: &[Field] = &[
    Field::Industry,
    Field::UseCase,
    Field::WhatWeDo,
    Field::WhatWeDontDo,
];
const KNOWLEDGE_FIELDS: &[Field] = &[
    Field::Files,
    Field::PersonalityTone,
    Field::DataCollection,
    Field::KnowledgeBase,
];
const BEHAVIOR_FIELDS: &[Field] = &[
    Field::ResponseStyle,
    Field::FallbackMessage,
    Field::HumanHandoffEnabled,
    Field::HumanHandoffThreshold,
    Field::HumanHandoffMessage,
];
const DEPLOYMENT_FIELDS: &[Field] = &[Field::IsActive, Field::IsPublic, Field::AllowFeedback];

impl Field {
    pub const ALL: [Field; 20] = [
        Field::Name,
        Field::Description,
        Field::Avatar,
        Field::Purpose,
        Field::Industry,
        Field::UseCase,
        Field::WhatWeDo,
        Field::WhatWeDontDo,
        Field::Files,
        Field::PersonalityTone,
        Field::DataCollection,
        Field::KnowledgeBase,
        Field::ResponseStyle,
        Field::FallbackMessage,
        Field::HumanHandoffEnabled,
        Field::HumanHandoffThreshold,
        Field::HumanHandoffMessage,
        Field::IsActive,
        Field::IsPublic,
        Field::AllowFeedback,
    ];

    /// The step this field belongs to.
    pub fn step(&self) -> WizardStep {
        use Field::*;
        match self {
            Name | Description | Avatar | Purpose => WizardStep::Identity,
            Industry | UseCase | WhatWeDo | WhatWeDontDo => WizardStep::Business,
            Files | PersonalityTone | DataCollection | KnowledgeBase => WizardStep::Knowledge,
            ResponseStyle | FallbackMessage | HumanHandoffEnabled | HumanHandoffThreshold
            | HumanHandoffMessage => WizardStep::Behavior,
            IsActive | IsPublic | AllowFeedback => WizardStep::Deployment,
        }
    }

    /// Input label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Agent name",
            Self::Description => "Description",
            Self::Avatar => "Avatar URL",
            Self::Purpose => "Primary purpose",
            Self::Industry => "Industry",
            Self::UseCase => "Use case",
            Self::WhatWeDo => "What we do",
            Self::WhatWeDontDo => "What we don't do",
            Self::Files => "Knowledge files",
            Self::PersonalityTone => "Personality tone",
            Self::DataCollection => "Data collection",
            Self::KnowledgeBase => "Knowledge base",
            Self::ResponseStyle => "Response style",
            Self::FallbackMessage => "Fallback message",
            Self::HumanHandoffEnabled => "Human handoff",
            Self::HumanHandoffThreshold => "Handoff threshold",
            Self::HumanHandoffMessage => "Handoff message",
            Self::IsActive => "Active",
            Self::IsPublic => "Public",
            Self::AllowFeedback => "Allow feedback",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Avatar => "avatar",
            Self::Purpose => "purpose",
            Self::Industry => "industry",
            Self::UseCase => "use_case",
            Self::WhatWeDo => "what_we_do",
            Self::WhatWeDontDo => "what_we_dont_do",
            Self::Files => "files",
            Self::PersonalityTone => "personality_tone",
            Self::DataCollection => "data_collection",
            Self::KnowledgeBase => "knowledge_base",
            Self::ResponseStyle => "response_style",
            Self::FallbackMessage => "fallback_message",
            Self::HumanHandoffEnabled => "human_handoff_enabled",
            Self::HumanHandoffThreshold => "human_handoff_threshold",
            Self::HumanHandoffMessage => "human_handoff_message",
            Self::IsActive => "is_active",
            Self::IsPublic => "is_public",
            Self::AllowFeedback => "allow_feedback",
        };
        write!(f, "{s}")
    }
}

/// Fields owned by a step, in display order.
pub fn step_fields(step: WizardStep) -> &'static [Field] {
    match step {
        WizardStep::Identity => IDENTITY_FIELDS,
        WizardStep::Business => BUSINESS_FIELDS,
        WizardStep::Knowledge => KNOWLEDGE_FIELDS,
        WizardStep::Behavior => BEHAVIOR_FIELDS,
        WizardStep::Deployment => DEPLOYMENT_FIELDS,
    }
}

/// A failed field check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The invalid fields of one step, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepValidation {
    errors: Vec<FieldError>,
}

impl StepValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of the invalid fields.
    pub fn fields(&self) -> Vec<Field> {
        self.errors.iter().map(|e| e.field).collect()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn message_for(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}

/// Validation rules with their configurable limits.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub max_file_bytes: u64,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_MB * 1024 * 1024,
        }
    }
}

impl Schema {
    pub fn new(max_file_bytes: u64) -> Self {
        Self { max_file_bytes }
    }

    /// Check one field against its rule.
    pub fn validate_field(&self, form: &FormState, field: Field) -> Result<(), FieldError> {
        match field {
            Field::Name => length(field, &form.name, 2, 50),
            Field::Description => length(field, &form.description, 10, 500),
            Field::Avatar => match form.avatar.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() && !AVATAR_URL.is_match(url) => Err(FieldError::new(
                    field,
                    "Avatar must be a valid image URL",
                )),
                _ => Ok(()),
            },
            Field::Purpose => match form.purpose {
                Some(_) => Ok(()),
                None => Err(FieldError::new(field, "Please select a purpose")),
            },
            Field::Industry => {
                if form.industry.trim().is_empty() {
                    Err(FieldError::new(field, "Industry is required"))
                } else {
                    length(field, &form.industry, 1, 100)
                }
            }
            Field::UseCase => match form.use_case {
                Some(_) => Ok(()),
                None => Err(FieldError::new(field, "Please choose a use case")),
            },
            Field::WhatWeDo => length(field, &form.what_we_do, 10, 1000),
            Field::WhatWeDontDo => length(field, &form.what_we_dont_do, 0, 1000),
            Field::Files => {
                if form.files.len() > MAX_FILES {
                    return Err(FieldError::new(
                        field,
                        format!("At most {MAX_FILES} files can be attached"),
                    ));
                }
                for file in &form.files {
                    check_file(file, self.max_file_bytes)
                        .map_err(|reason| FieldError::new(field, format!("{}: {reason}", file.name)))?;
                }
                Ok(())
            }
            Field::PersonalityTone => range(field, form.personality_tone, 0, 100),
            Field::KnowledgeBase => length(field, &form.knowledge_base, 0, 5000),
            Field::FallbackMessage => length(field, &form.fallback_message, 5, 200),
            Field::HumanHandoffThreshold => range(field, form.human_handoff.threshold, 0, 100),
            Field::HumanHandoffMessage => length(field, &form.human_handoff.message, 0, 200),
            // Enums and flags are valid by construction.
            Field::DataCollection
            | Field::ResponseStyle
            | Field::HumanHandoffEnabled
            | Field::IsActive
            | Field::IsPublic
            | Field::AllowFeedback => Ok(()),
        }
    }

    /// Collect the invalid fields of a step.
    pub fn validate_step(&self, form: &FormState, step: WizardStep) -> StepValidation {
        let errors = step_fields(step)
            .iter()
            .filter_map(|&field| self.validate_field(form, field).err())
            .collect();
        StepValidation { errors }
    }

    /// Validate every step, returning the first step that fails.
    pub fn validate_all(&self, form: &FormState) -> Result<(), (WizardStep, StepValidation)> {
        for step in WizardStep::ALL {
            let validation = self.validate_step(form, step);
            if !validation.is_valid() {
                return Err((step, validation));
            }
        }
        Ok(())
    }
}

/// Check one field with the default limits.
pub fn validate_field(form: &FormState, field: Field) -> Result<(), FieldError> {
    Schema::default().validate_field(form, field)
}

/// Check one step with the default limits.
pub fn validate_step(form: &FormState, step: WizardStep) -> StepValidation {
    Schema::default().validate_step(form, step)
}

fn length(field: Field, value: &str, min: usize, max: usize) -> Result<(), FieldError> {
    let count = value.trim().chars().count();
    let label = field.label();
    if count < min {
        if min == 1 {
            return Err(FieldError::new(field, format!("{label} is required")));
        }
        return Err(FieldError::new(
            field,
            format!("{label} must be at least {min} characters"),
        ));
    }
    if count > max {
        return Err(FieldError::new(
            field,
            format!("{label} must be at most {max} characters"),
        ));
    }
    Ok(())
}

fn range(field: Field, value: i32, min: i32, max: i32) -> Result<(), FieldError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(FieldError::new(
            field,
            format!("{} must be between {min} and {max}", field.label()),
        ))
    }
}
