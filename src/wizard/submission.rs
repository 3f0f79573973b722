//! Submission pipeline: maps a completed form into a create-agent request.
//!
//! Everything here is a pure function of the form and configuration; the
//! form itself is never mutated.

use super::form::{FormState, Purpose, ResponseStyle};
use crate::config::WizardConfig;
use crate::store::CreateAgentRequest;

/// Placeholder for an unset "what we don't do" section.
pub const NOT_APPLICABLE: &str = "N/A";

/// Used when no knowledge base text was provided.
pub const DEFAULT_KNOWLEDGE: &str =
    "No additional knowledge base was provided. Rely on the business description above.";

/// Map `personality_tone` (0–100) linearly onto a 0–1 sampling temperature.
pub fn temperature(form: &FormState) -> f64 {
    f64::from(form.personality_tone.clamp(0, 100)) / 100.0
}

fn style_guideline(style: ResponseStyle) -> &'static str {
    match style {
        ResponseStyle::Concise => "Keep answers short and to the point, ideally one or two sentences.",
        ResponseStyle::Detailed => {
            "Give thorough, step-by-step answers and explain the reasoning behind them."
        }
        ResponseStyle::Friendly => "Be warm and approachable, and keep the conversation light.",
        ResponseStyle::Professional => "Use a courteous, polished business tone.",
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { default } else { trimmed }
}

/// Compose the agent's system prompt from the form.
pub fn build_system_prompt(form: &FormState) -> String {
    let purpose = form.purpose.unwrap_or(Purpose::Other).label();
    let industry = or_default(&form.industry, "general");

    let mut parts = vec![
        format!(
            "You are {}, a {} AI assistant for a business in the {} industry.",
            form.name.trim(),
            form.response_style,
            industry
        ),
        String::new(),
        format!("Purpose: {purpose}"),
        format!("Industry: {industry}"),
        String::new(),
        "What we do:".to_string(),
        form.what_we_do.trim().to_string(),
        String::new(),
        "What we don't do:".to_string(),
        or_default(&form.what_we_dont_do, NOT_APPLICABLE).to_string(),
        String::new(),
        "Knowledge base:".to_string(),
        or_default(&form.knowledge_base, DEFAULT_KNOWLEDGE).to_string(),
        String::new(),
        "Guidelines:".to_string(),
        format!("- {}", style_guideline(form.response_style)),
    ];

    let fallback = form.fallback_message.trim();
    if !fallback.is_empty() {
        parts.push(format!(
            "- If you cannot answer a question, reply with: \"{fallback}\""
        ));
    }

    let collect = form.data_collection.enabled_labels();
    if !collect.is_empty() {
        parts.push(format!(
            "- When appropriate, politely ask for the visitor's {}.",
            collect.join(", ")
        ));
    }

    if form.human_handoff.enabled {
        let mut line = format!(
            "- If your confidence drops below {}%, offer to connect the visitor with a human.",
            form.human_handoff.threshold
        );
        let message = form.human_handoff.message.trim();
        if !message.is_empty() {
            line.push_str(&format!(" Say: \"{message}\""));
        }
        parts.push(line);
    }

    parts.join("\n")
}

/// Build the create-agent request for a completed form.
pub fn build_create_request(form: &FormState, config: &WizardConfig) -> CreateAgentRequest {
    CreateAgentRequest {
        name: form.name.trim().to_string(),
        description: form.description.trim().to_string(),
        model: config.model.clone(),
        system_prompt: build_system_prompt(form),
        temperature: temperature(form),
        max_tokens: config.max_tokens,
        user_id: config.user_id.clone(),
    }
}
