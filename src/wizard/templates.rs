//! Use-case templates and the fixed industry list offered by the Business step.

use serde::{Deserialize, Serialize};

use super::form::{FormState, ResponseStyle};

/// Industries offered in the picker. Free text outside this list is accepted.
pub const INDUSTRIES: &[&str] = &[
    "E-commerce",
    "SaaS",
    "Healthcare",
    "Finance",
    "Real Estate",
    "Education",
    "Hospitality",
    "Professional Services",
    "Retail",
    "Other",
];

/// Template a new agent starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    CustomerSupport,
    LeadQualification,
    SalesAssistant,
    AppointmentBooking,
    FaqBot,
    Custom,
}

impl UseCase {
    pub const ALL: [UseCase; 6] = [
        UseCase::CustomerSupport,
        UseCase::LeadQualification,
        UseCase::SalesAssistant,
        UseCase::AppointmentBooking,
        UseCase::FaqBot,
        UseCase::Custom,
    ];

    /// The template behind this use case.
    pub fn template(&self) -> &'static Template {
        match self {
            Self::CustomerSupport => &TEMPLATES[0],
            Self::LeadQualification => &TEMPLATES[1],
            Self::SalesAssistant => &TEMPLATES[2],
            Self::AppointmentBooking => &TEMPLATES[3],
            Self::FaqBot => &TEMPLATES[4],
            Self::Custom => &TEMPLATES[5],
        }
    }
}

impl std::fmt::Display for UseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CustomerSupport => "customer_support",
            Self::LeadQualification => "lead_qualification",
            Self::SalesAssistant => "sales_assistant",
            Self::AppointmentBooking => "appointment_booking",
            Self::FaqBot => "faq_bot",
            Self::Custom => "custom",
        };
        write!(f, "{s}")
    }
}

/// Pre-filled copy for a use case.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub use_case: UseCase,
    pub title: &'static str,
    pub summary: &'static str,
    pub what_we_do: &'static str,
    pub what_we_dont_do: &'static str,
    pub fallback_message: &'static str,
    pub suggested_style: ResponseStyle,
}

static TEMPLATES: [Template; 6] = [
    Template {
        use_case: UseCase::CustomerSupport,
        title: "Customer Support",
        summary: "Answer product questions and resolve common issues",
        what_we_do: "We help customers troubleshoot problems, track orders, and find answers about our products and policies.",
        what_we_dont_do: "We don't process refunds, change billing details, or give legal advice.",
        fallback_message: "I'm not sure about that one. Let me connect you with our support team.",
        suggested_style: ResponseStyle::Friendly,
    },
    Template {
        use_case: UseCase::LeadQualification,
        title: "Lead Qualification",
        summary: "Qualify inbound visitors and capture contact details",
        what_we_do: "We learn about a visitor's needs, budget, and timeline, then collect their contact details for our sales team.",
        what_we_dont_do: "We don't quote final prices or sign contracts.",
        fallback_message: "Great question! Someone from our team will follow up with details.",
        suggested_style: ResponseStyle::Professional,
    },
    Template {
        use_case: UseCase::SalesAssistant,
        title: "Sales Assistant",
        summary: "Recommend products and guide visitors to purchase",
        what_we_do: "We recommend products that fit the visitor's needs, compare options, and guide them through checkout.",
        what_we_dont_do: "We don't offer discounts beyond published promotions.",
        fallback_message: "Let me find someone who can help you with that purchase.",
        suggested_style: ResponseStyle::Friendly,
    },
    Template {
        use_case: UseCase::AppointmentBooking,
        title: "Appointment Booking",
        summary: "Schedule, reschedule, and confirm appointments",
        what_we_do: "We help visitors find an open time slot, book appointments, and send confirmations.",
        what_we_dont_do: "We don't provide diagnoses or professional advice during booking.",
        fallback_message: "I couldn't book that. Please call us and we'll sort it out.",
        suggested_style: ResponseStyle::Concise,
    },
    Template {
        use_case: UseCase::FaqBot,
        title: "FAQ Bot",
        summary: "Answer frequently asked questions from your knowledge base",
        what_we_do: "We answer frequently asked questions using our published documentation and knowledge base.",
        what_we_dont_do: "We don't answer questions outside our documentation.",
        fallback_message: "I don't have an answer for that yet. Try rephrasing your question.",
        suggested_style: ResponseStyle::Concise,
    },
    Template {
        use_case: UseCase::Custom,
        title: "Custom",
        summary: "Start from a blank agent",
        what_we_do: "",
        what_we_dont_do: "",
        fallback_message: "",
        suggested_style: ResponseStyle::Friendly,
    },
];

/// All templates, in picker order.
pub fn templates() -> &'static [Template] {
    &TEMPLATES
}

/// Whether `industry` is one of the offered picker entries.
pub fn is_listed_industry(industry: &str) -> bool {
    INDUSTRIES
        .iter()
        .any(|i| i.eq_ignore_ascii_case(industry.trim()))
}

/// Select a use case and fill blank fields from its template.
///
/// Never overwrites text the user already entered. The suggested response
/// style is only applied while the style is still the default.
pub fn apply_template(form: &mut FormState, use_case: UseCase) {
    let template = use_case.template();
    form.use_case = Some(use_case);

    fill_if_blank(&mut form.what_we_do, template.what_we_do);
    fill_if_blank(&mut form.what_we_dont_do, template.what_we_dont_do);
    fill_if_blank(&mut form.fallback_message, template.fallback_message);

    if form.response_style == ResponseStyle::default() {
        form.response_style = template.suggested_style;
    }
}

fn fill_if_blank(target: &mut String, value: &str) {
    if target.trim().is_empty() && !value.is_empty() {
        *target = value.to_string();
    }
}
