//! Wizard state machine: tracks which step the user is on.
//!
//! `WizardState` is a plain `Copy` value. Transitions are pure: they take the
//! current state (and the form, when a gate applies) and return the next
//! state or an error, leaving the caller's value untouched on failure.

use serde::{Deserialize, Serialize};

use super::form::FormState;
use super::schema::Schema;
use crate::error::WizardError;

/// The five steps of the wizard.
///
/// Progresses linearly: Identity → Business → Knowledge → Behavior →
/// Deployment. Backward moves to any earlier step are always allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Identity,
    Business,
    Knowledge,
    Behavior,
    Deployment,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Identity,
        WizardStep::Business,
        WizardStep::Knowledge,
        WizardStep::Behavior,
        WizardStep::Deployment,
    ];

    /// 1-based position.
    pub fn number(&self) -> u8 {
        match self {
            Self::Identity => 1,
            Self::Business => 2,
            Self::Knowledge => 3,
            Self::Behavior => 4,
            Self::Deployment => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<WizardStep> {
        match n {
            1 => Some(Self::Identity),
            2 => Some(Self::Business),
            3 => Some(Self::Knowledge),
            4 => Some(Self::Behavior),
            5 => Some(Self::Deployment),
            _ => None,
        }
    }

    /// Check if a move from `self` to `target` is structurally valid:
    /// one step forward, or any step backward.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        target < *self || target.number() == self.number() + 1
    }

    /// Whether this is the final step.
    pub fn is_last(&self) -> bool {
        matches!(self, Self::Deployment)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<WizardStep> {
        Self::from_number(self.number() + 1)
    }

    /// Get the previous step, if any.
    pub fn previous(&self) -> Option<WizardStep> {
        Self::from_number(self.number().saturating_sub(1))
    }

    /// Title shown above the step.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Identity => "Basic Information",
            Self::Business => "Business Details",
            Self::Knowledge => "Knowledge & Personality",
            Self::Behavior => "Response Behavior",
            Self::Deployment => "Review & Deploy",
        }
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::Identity
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Identity => "identity",
            Self::Business => "business",
            Self::Knowledge => "knowledge",
            Self::Behavior => "behavior",
            Self::Deployment => "deployment",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle of a wizard instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStatus {
    Open,
    Submitted,
    Cancelled,
}

impl WizardStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl std::fmt::Display for WizardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Submitted => "submitted",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Serializable wizard position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: WizardStep,
    pub status: WizardStatus,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: WizardStep::default(),
            status: WizardStatus::Open,
        }
    }
}

impl WizardState {
    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.status.is_terminal() {
            return Err(WizardError::Closed {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Advance one step if the current step's fields validate.
    /// A no-op on the final step.
    pub fn next(self, form: &FormState, schema: &Schema) -> Result<Self, WizardError> {
        self.ensure_open()?;
        let Some(target) = self.step.next() else {
            return Ok(self);
        };

        let validation = schema.validate_step(form, self.step);
        if !validation.is_valid() {
            return Err(WizardError::StepInvalid {
                step: self.step,
                errors: validation,
            });
        }

        debug_assert!(self.step.can_transition_to(target));
        Ok(Self {
            step: target,
            ..self
        })
    }

    /// Go back one step. A no-op on the first step.
    pub fn previous(self) -> Result<Self, WizardError> {
        self.ensure_open()?;
        Ok(match self.step.previous() {
            Some(step) => Self { step, ..self },
            None => self,
        })
    }

    /// Jump to step `n` (1-based). Only the current or an earlier step is
    /// reachable; completed steps are not re-validated.
    pub fn jump_to(self, n: u8) -> Result<Self, WizardError> {
        self.ensure_open()?;
        let target = WizardStep::from_number(n).ok_or(WizardError::InvalidStep(n))?;
        if target > self.step {
            return Err(WizardError::JumpAhead {
                current: self.step.number(),
                target: n,
            });
        }
        Ok(Self {
            step: target,
            ..self
        })
    }

    /// Submission is only allowed from the final step of an open wizard.
    pub fn ensure_can_submit(&self) -> Result<(), WizardError> {
        self.ensure_open()?;
        if !self.step.is_last() {
            return Err(WizardError::NotAtFinalStep { current: self.step });
        }
        Ok(())
    }

    /// Close the wizard with a terminal status.
    pub fn close(self, status: WizardStatus) -> Self {
        Self { status, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::form::Purpose;
    use crate::wizard::schema::Field;
    use crate::wizard::templates::UseCase;

    fn complete_form() -> FormState {
        FormState {
            name: "Support Bot".to_string(),
            description: "Answers FAQs".to_string(),
            purpose: Some(Purpose::Support),
            industry: "SaaS".to_string(),
            use_case: Some(UseCase::FaqBot),
            what_we_do: "We build project software.".to_string(),
            fallback_message: "Sorry, I'm not sure.".to_string(),
            ..Default::default()
        }
    }

    fn at(step: WizardStep) -> WizardState {
        WizardState {
            step,
            status: WizardStatus::Open,
        }
    }

    #[test]
    fn valid_transitions() {
        use WizardStep::*;
        for (from, to) in [
            (Identity, Business),
            (Business, Knowledge),
            (Knowledge, Behavior),
            (Behavior, Deployment),
            (Deployment, Identity),
            (Behavior, Business),
        ] {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use WizardStep::*;
        assert!(!Identity.can_transition_to(Knowledge));
        assert!(!Business.can_transition_to(Deployment));
        assert!(!Identity.can_transition_to(Identity));
    }

    #[test]
    fn numbers_roundtrip() {
        for step in WizardStep::ALL {
            assert_eq!(WizardStep::from_number(step.number()), Some(step));
        }
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(6), None);
    }

    #[test]
    fn display_matches_serde() {
        for step in WizardStep::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json);
        }
    }

    #[test]
    fn next_walks_all_steps_with_complete_form() {
        let form = complete_form();
        let schema = Schema::default();
        let mut state = WizardState::default();
        for expected in &WizardStep::ALL[1..] {
            state = state.next(&form, &schema).unwrap();
            assert_eq!(state.step, *expected);
        }
        // No-op at the last step
        assert_eq!(state.next(&form, &schema).unwrap(), state);
    }

    #[test]
    fn next_blocked_by_any_invalid_field() {
        let schema = Schema::default();
        let form = complete_form();
        let broken: [(WizardStep, fn(&mut FormState)); 4] = [
            (WizardStep::Identity, |f| f.name.clear()),
            (WizardStep::Business, |f| f.use_case = None),
            (WizardStep::Knowledge, |f| f.personality_tone = 150),
            (WizardStep::Behavior, |f| f.human_handoff.threshold = 101),
        ];
        for (step, breaker) in broken {
            let mut bad = form.clone();
            breaker(&mut bad);
            let state = at(step);
            match state.next(&bad, &schema) {
                Err(WizardError::StepInvalid { step: s, errors }) => {
                    assert_eq!(s, step);
                    assert!(!errors.is_empty());
                }
                other => panic!("expected StepInvalid at {step}, got {other:?}"),
            }
            assert_eq!(state.step, step);
        }
    }

    #[test]
    fn support_bot_scenario_advances_to_business() {
        let form = FormState {
            name: "Support Bot".to_string(),
            description: "Helps users!".to_string(),
            purpose: Some(Purpose::Support),
            ..Default::default()
        };
        let state = WizardState::default()
            .next(&form, &Schema::default())
            .unwrap();
        assert_eq!(state.step, WizardStep::Business);
    }

    #[test]
    fn empty_fallback_keeps_behavior_step() {
        let mut form = complete_form();
        form.fallback_message.clear();
        let err = at(WizardStep::Behavior)
            .next(&form, &Schema::default())
            .unwrap_err();
        match err {
            WizardError::StepInvalid { step, errors } => {
                assert_eq!(step, WizardStep::Behavior);
                assert!(errors.contains(Field::FallbackMessage));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn previous_is_noop_at_first_step() {
        let state = WizardState::default();
        assert_eq!(state.previous().unwrap(), state);
        assert_eq!(
            at(WizardStep::Knowledge).previous().unwrap().step,
            WizardStep::Business
        );
    }

    #[test]
    fn previous_skips_validation() {
        // Going back never consults the form.
        let state = at(WizardStep::Behavior).previous().unwrap();
        assert_eq!(state.step, WizardStep::Knowledge);
    }

    #[test]
    fn jump_back_allowed_ahead_rejected() {
        let state = at(WizardStep::Knowledge);
        assert_eq!(state.jump_to(1).unwrap().step, WizardStep::Identity);
        assert_eq!(state.jump_to(3).unwrap().step, WizardStep::Knowledge);
        for n in 4..=5 {
            assert!(matches!(
                state.jump_to(n),
                Err(WizardError::JumpAhead { current: 3, .. })
            ));
        }
        assert!(matches!(state.jump_to(0), Err(WizardError::InvalidStep(0))));
        assert!(matches!(state.jump_to(9), Err(WizardError::InvalidStep(9))));
    }

    #[test]
    fn submit_only_from_last_step() {
        assert!(matches!(
            at(WizardStep::Behavior).ensure_can_submit(),
            Err(WizardError::NotAtFinalStep { .. })
        ));
        assert!(at(WizardStep::Deployment).ensure_can_submit().is_ok());
    }

    #[test]
    fn closed_wizard_rejects_everything() {
        let state = at(WizardStep::Deployment).close(WizardStatus::Submitted);
        let form = complete_form();
        assert!(matches!(
            state.next(&form, &Schema::default()),
            Err(WizardError::Closed { .. })
        ));
        assert!(state.previous().is_err());
        assert!(state.jump_to(1).is_err());
        assert!(state.ensure_can_submit().is_err());
    }

    #[test]
    fn state_serde_roundtrip() {
        let state = at(WizardStep::Behavior);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"step":"behavior","status":"open"}"#);
        let parsed: WizardState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
