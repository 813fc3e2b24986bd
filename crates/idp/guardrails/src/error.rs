//! Guardrail violation types

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Guardrail that produced a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Guardrail {
    MandatoryTags,
    DataSensitivity,
    EnvironmentPromotion,
    ProductionApproval,
    RestrictedConfig,
}

impl Guardrail {
    pub fn id(&self) -> &'static str {
        match self {
            Guardrail::MandatoryTags => "mandatory-tags",
            Guardrail::DataSensitivity => "data-sensitivity",
            Guardrail::EnvironmentPromotion => "environment-promotion",
            Guardrail::ProductionApproval => "production-approval",
            Guardrail::RestrictedConfig => "restricted-config",
        }
    }
}

impl fmt::Display for Guardrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Policy rejection raised by a guardrail check
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("{reason}")]
pub struct GuardrailViolation {
    pub guardrail: Guardrail,
    pub reason: String,
}

impl GuardrailViolation {
    pub fn new(guardrail: Guardrail, reason: impl Into<String>) -> Self {
        Self {
            guardrail,
            reason: reason.into(),
        }
    }
}

/// Result type for guardrail checks
pub type Result<T> = std::result::Result<T, GuardrailViolation>;
