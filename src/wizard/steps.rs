//! Step renderers: one per wizard step.
//!
//! Each renderer binds its field subset to views, computes a live preview
//! derived from the form, and reports the validity of its fields. Rendering
//! has no side effects.

use std::collections::BTreeMap;

use serde::Serialize;

use super::files::format_size;
use super::form::{FormState, ResponseStyle};
use super::schema::{Field, Schema, StepValidation, step_fields};
use super::state::WizardStep;
use super::submission::{NOT_APPLICABLE, build_system_prompt, temperature};
use super::templates::is_listed_industry;

/// One bound input.
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub field: Field,
    pub label: &'static str,
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A labelled line in a preview pane.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewItem {
    pub label: String,
    pub value: String,
}

impl PreviewItem {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Live preview shown next to a step's inputs.
#[derive(Debug, Clone, Serialize)]
pub struct StepPreview {
    pub heading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_response: Option<String>,
    pub items: Vec<PreviewItem>,
}

/// Everything needed to draw one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub step: WizardStep,
    pub number: u8,
    pub title: &'static str,
    pub fields: Vec<FieldView>,
    pub preview: StepPreview,
    pub valid: bool,
}

/// Renders one wizard step.
pub trait StepRenderer: Send + Sync {
    fn step(&self) -> WizardStep;

    /// Derived preview for the current form.
    fn preview(&self, form: &FormState) -> StepPreview;

    fn fields(&self) -> &'static [Field] {
        step_fields(self.step())
    }

    fn validity(&self, form: &FormState, schema: &Schema) -> StepValidation {
        schema.validate_step(form, self.step())
    }

    /// Bind fields, attach the inline errors the user has already seen, and
    /// compute the preview.
    fn render(
        &self,
        form: &FormState,
        schema: &Schema,
        shown_errors: &BTreeMap<Field, String>,
    ) -> StepView {
        let step = self.step();
        let fields = self
            .fields()
            .iter()
            .map(|&field| FieldView {
                field,
                label: field.label(),
                value: form.value_of(field),
                error: shown_errors.get(&field).cloned(),
            })
            .collect();

        StepView {
            step,
            number: step.number(),
            title: step.title(),
            fields,
            preview: self.preview(form),
            valid: self.validity(form, schema).is_valid(),
        }
    }
}

/// Personality bucket derived from `personality_tone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneBucket {
    Formal,
    Professional,
    Friendly,
    Enthusiastic,
}

impl ToneBucket {
    pub fn from_tone(tone: i32) -> Self {
        if tone < 25 {
            Self::Formal
        } else if tone < 50 {
            Self::Professional
        } else if tone < 75 {
            Self::Friendly
        } else {
            Self::Enthusiastic
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Formal => "Formal",
            Self::Professional => "Professional",
            Self::Friendly => "Friendly",
            Self::Enthusiastic => "Enthusiastic",
        }
    }

    /// Example reply to "Can you help me with my order?"
    pub fn sample_response(&self) -> &'static str {
        match self {
            Self::Formal => {
                "Good day. I would be pleased to assist you with your order. Kindly provide your order number."
            }
            Self::Professional => {
                "Hello, I'd be happy to help with your order. Could you share your order number?"
            }
            Self::Friendly => "Hi there! Happy to help with your order. What's your order number?",
            Self::Enthusiastic => {
                "Hey! Absolutely, let's get your order sorted out! Drop me your order number and we're on it!"
            }
        }
    }
}

/// Example reply to "Do you ship internationally?" in each style.
pub fn style_sample(style: ResponseStyle) -> &'static str {
    match style {
        ResponseStyle::Concise => "Yes, we ship worldwide. Delivery takes 5-7 days.",
        ResponseStyle::Detailed => {
            "Yes, we ship to over 40 countries. Standard international delivery takes 5-7 business days, express takes 2-3, and you'll receive a tracking link as soon as your order leaves our warehouse."
        }
        ResponseStyle::Friendly => {
            "We sure do! We'd love to get your order to you wherever you are. It usually arrives within a week."
        }
        ResponseStyle::Professional => {
            "Yes, we offer international shipping. Standard delivery takes 5-7 business days. Please let us know if you require expedited service."
        }
    }
}

fn style_label(style: ResponseStyle) -> &'static str {
    match style {
        ResponseStyle::Concise => "Concise",
        ResponseStyle::Detailed => "Detailed",
        ResponseStyle::Friendly => "Friendly",
        ResponseStyle::Professional => "Professional",
    }
}

fn text_or<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { placeholder } else { trimmed }
}

fn on_off(flag: bool, on: &str, off: &str) -> String {
    if flag { on.to_string() } else { off.to_string() }
}

/// Up to two uppercase initials from the agent name.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "AI".to_string()
    } else {
        letters
    }
}

pub struct IdentityStep;
pub struct BusinessStep;
pub struct KnowledgeStep;
pub struct BehaviorStep;
pub struct DeploymentStep;

impl StepRenderer for IdentityStep {
    fn step(&self) -> WizardStep {
        WizardStep::Identity
    }

    fn preview(&self, form: &FormState) -> StepPreview {
        StepPreview {
            heading: text_or(&form.name, "Your Agent").to_string(),
            sample_response: None,
            items: vec![
                PreviewItem::new(
                    "Avatar",
                    form.avatar.clone().unwrap_or_else(|| initials(&form.name)),
                ),
                PreviewItem::new(
                    "Purpose",
                    form.purpose.map(|p| p.label()).unwrap_or("Not selected"),
                ),
                PreviewItem::new(
                    "Description",
                    text_or(&form.description, "Describe what your agent does"),
                ),
            ],
        }
    }
}

impl StepRenderer for BusinessStep {
    fn step(&self) -> WizardStep {
        WizardStep::Business
    }

    fn preview(&self, form: &FormState) -> StepPreview {
        let name = text_or(&form.name, "your assistant");
        let industry = text_or(&form.industry, "your industry");
        let focus = form
            .use_case
            .map(|u| u.template().title.to_lowercase())
            .unwrap_or_else(|| "their questions".to_string());

        let mut items = Vec::new();
        if let Some(use_case) = form.use_case {
            items.push(PreviewItem::new("Template", use_case.template().summary));
        }
        if !form.industry.trim().is_empty() {
            items.push(PreviewItem::new(
                "Industry",
                if is_listed_industry(&form.industry) {
                    form.industry.trim().to_string()
                } else {
                    format!("{} (custom)", form.industry.trim())
                },
            ));
        }
        items.push(PreviewItem::new(
            "What we do",
            text_or(&form.what_we_do, "Not described yet"),
        ));
        items.push(PreviewItem::new(
            "What we don't do",
            text_or(&form.what_we_dont_do, NOT_APPLICABLE),
        ));

        StepPreview {
            heading: "How your agent introduces itself".to_string(),
            sample_response: Some(format!(
                "Hi! I'm {name}. I help {industry} customers with {focus}."
            )),
            items,
        }
    }
}

impl StepRenderer for KnowledgeStep {
    fn step(&self) -> WizardStep {
        WizardStep::Knowledge
    }

    fn preview(&self, form: &FormState) -> StepPreview {
        let bucket = ToneBucket::from_tone(form.personality_tone);
        let total: u64 = form.files.iter().map(|f| f.size).sum();
        let collects = form.data_collection.enabled_labels();
        let kb_chars = form.knowledge_base.trim().chars().count();

        StepPreview {
            heading: format!("Personality: {}", bucket.label()),
            sample_response: Some(bucket.sample_response().to_string()),
            items: vec![
                PreviewItem::new("Tone", format!("{}/100", form.personality_tone)),
                PreviewItem::new("Temperature", format!("{:.2}", temperature(form))),
                PreviewItem::new(
                    "Files",
                    match form.files.len() {
                        0 => "None".to_string(),
                        1 => format!("1 file, {}", format_size(total)),
                        n => format!("{n} files, {}", format_size(total)),
                    },
                ),
                PreviewItem::new(
                    "Collects",
                    if collects.is_empty() {
                        "Nothing".to_string()
                    } else {
                        collects.join(", ")
                    },
                ),
                PreviewItem::new(
                    "Knowledge base",
                    if kb_chars == 0 {
                        "Empty".to_string()
                    } else {
                        format!("{kb_chars} characters")
                    },
                ),
            ],
        }
    }
}

impl StepRenderer for BehaviorStep {
    fn step(&self) -> WizardStep {
        WizardStep::Behavior
    }

    fn preview(&self, form: &FormState) -> StepPreview {
        let handoff = &form.human_handoff;
        let mut items = vec![
            PreviewItem::new(
                "Fallback",
                text_or(&form.fallback_message, "No fallback message yet"),
            ),
            PreviewItem::new(
                "Human handoff",
                if handoff.enabled {
                    format!("Below {}% confidence", handoff.threshold)
                } else {
                    "Disabled".to_string()
                },
            ),
        ];
        if handoff.enabled && !handoff.message.trim().is_empty() {
            items.push(PreviewItem::new("Handoff message", handoff.message.trim()));
        }

        StepPreview {
            heading: format!("Response style: {}", style_label(form.response_style)),
            sample_response: Some(style_sample(form.response_style).to_string()),
            items,
        }
    }
}

impl StepRenderer for DeploymentStep {
    fn step(&self) -> WizardStep {
        WizardStep::Deployment
    }

    fn preview(&self, form: &FormState) -> StepPreview {
        StepPreview {
            heading: format!("Review {}", text_or(&form.name, "your agent")),
            sample_response: None,
            items: vec![
                PreviewItem::new("Status", on_off(form.is_active, "Active", "Inactive")),
                PreviewItem::new("Visibility", on_off(form.is_public, "Public", "Private")),
                PreviewItem::new(
                    "Feedback",
                    on_off(form.allow_feedback, "Enabled", "Disabled"),
                ),
                PreviewItem::new("Temperature", format!("{:.2}", temperature(form))),
                PreviewItem::new("System prompt", build_system_prompt(form)),
            ],
        }
    }
}

static IDENTITY: IdentityStep = IdentityStep;
static BUSINESS: BusinessStep = BusinessStep;
static KNOWLEDGE: KnowledgeStep = KnowledgeStep;
static BEHAVIOR: BehaviorStep = BehaviorStep;
static DEPLOYMENT: DeploymentStep = DeploymentStep;

/// The renderer for a step.
pub fn renderer_for(step: WizardStep) -> &'static dyn StepRenderer {
    match step {
        WizardStep::Identity => &IDENTITY,
        WizardStep::Business => &BUSINESS,
        WizardStep::Knowledge => &KNOWLEDGE,
        WizardStep::Behavior => &BEHAVIOR,
        WizardStep::Deployment => &DEPLOYMENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::files::UploadedFile;
    use crate::wizard::form::Purpose;
    use crate::wizard::templates::UseCase;

    #[test]
    fn tone_buckets_use_quarter_thresholds() {
        assert_eq!(ToneBucket::from_tone(0), ToneBucket::Formal);
        assert_eq!(ToneBucket::from_tone(24), ToneBucket::Formal);
        assert_eq!(ToneBucket::from_tone(25), ToneBucket::Professional);
        assert_eq!(ToneBucket::from_tone(49), ToneBucket::Professional);
        assert_eq!(ToneBucket::from_tone(50), ToneBucket::Friendly);
        assert_eq!(ToneBucket::from_tone(74), ToneBucket::Friendly);
        assert_eq!(ToneBucket::from_tone(75), ToneBucket::Enthusiastic);
        assert_eq!(ToneBucket::from_tone(100), ToneBucket::Enthusiastic);
    }

    #[test]
    fn renderers_cover_their_steps() {
        for step in WizardStep::ALL {
            let renderer = renderer_for(step);
            assert_eq!(renderer.step(), step);
            assert_eq!(renderer.fields(), step_fields(step));
        }
    }

    #[test]
    fn initials_from_name() {
        assert_eq!(initials("support bot"), "SB");
        assert_eq!(initials("Ava"), "A");
        assert_eq!(initials("  "), "AI");
        assert_eq!(initials("one two three"), "OT");
    }

    #[test]
    fn identity_preview_placeholders() {
        let preview = IdentityStep.preview(&FormState::default());
        assert_eq!(preview.heading, "Your Agent");
        assert_eq!(preview.items[0].value, "AI");
        assert_eq!(preview.items[1].value, "Not selected");
    }

    #[test]
    fn business_preview_intro_line() {
        let form = FormState {
            name: "Nova".to_string(),
            industry: "Healthcare".to_string(),
            use_case: Some(UseCase::AppointmentBooking),
            ..Default::default()
        };
        let preview = BusinessStep.preview(&form);
        assert_eq!(
            preview.sample_response.as_deref(),
            Some("Hi! I'm Nova. I help Healthcare customers with appointment booking.")
        );
        assert!(preview.items.iter().any(|i| i.value == "Healthcare"));
        assert!(preview.items.iter().any(|i| i.value == "N/A"));
    }

    #[test]
    fn business_preview_marks_custom_industry() {
        let form = FormState {
            industry: "Space Mining".to_string(),
            ..Default::default()
        };
        let preview = BusinessStep.preview(&form);
        assert!(preview.items.iter().any(|i| i.value == "Space Mining (custom)"));
    }

    #[test]
    fn knowledge_preview_follows_tone() {
        let mut form = FormState {
            personality_tone: 10,
            ..Default::default()
        };
        let formal = KnowledgeStep.preview(&form);
        assert_eq!(formal.heading, "Personality: Formal");
        assert_eq!(
            formal.sample_response.as_deref(),
            Some(ToneBucket::Formal.sample_response())
        );

        form.personality_tone = 90;
        form.files = vec![
            UploadedFile::new("a.pdf", 1024, "application/pdf"),
            UploadedFile::new("b.txt", 1024, "text/plain"),
        ];
        let lively = KnowledgeStep.preview(&form);
        assert_eq!(lively.heading, "Personality: Enthusiastic");
        assert!(lively.items.iter().any(|i| i.value == "2 files, 2.0 KB"));
        assert!(lively.items.iter().any(|i| i.value == "0.90"));
    }

    #[test]
    fn behavior_preview_follows_style() {
        let form = FormState {
            response_style: ResponseStyle::Concise,
            ..Default::default()
        };
        let preview = BehaviorStep.preview(&form);
        assert_eq!(preview.heading, "Response style: Concise");
        assert_eq!(
            preview.sample_response.as_deref(),
            Some(style_sample(ResponseStyle::Concise))
        );
        assert!(preview.items.iter().any(|i| i.value == "Disabled"));
    }

    #[test]
    fn deployment_preview_shows_prompt() {
        let form = FormState {
            name: "Support Bot".to_string(),
            purpose: Some(Purpose::Support),
            is_public: true,
            ..Default::default()
        };
        let preview = DeploymentStep.preview(&form);
        assert_eq!(preview.heading, "Review Support Bot");
        let prompt = preview
            .items
            .iter()
            .find(|i| i.label == "System prompt")
            .unwrap();
        assert!(prompt.value.contains("Purpose: Customer Support"));
        assert!(preview.items.iter().any(|i| i.value == "Public"));
    }

    #[test]
    fn render_binds_values_and_shown_errors() {
        let form = FormState {
            name: "A".to_string(),
            ..Default::default()
        };
        let mut shown = BTreeMap::new();
        shown.insert(Field::Name, "Agent name must be at least 2 characters".to_string());

        let view = renderer_for(WizardStep::Identity).render(&form, &Schema::default(), &shown);
        assert_eq!(view.number, 1);
        assert!(!view.valid);
        assert_eq!(view.fields.len(), 4);
        assert_eq!(view.fields[0].value, serde_json::json!("A"));
        assert!(view.fields[0].error.is_some());
        // Errors are only shown for fields already flagged.
        assert!(view.fields[1].error.is_none());
    }
}
