//! Request types and boundary validation.
//!
//! The JSON shape mirrors what the mobile client sends: an ordered turn
//! history plus the financial context used to condition the system prompt.
//! Everything is checked here, before any business logic runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ChatError;

/// Speaker of a single conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

/// One turn in the conversation. Order is meaningful; turns are immutable
/// once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Model,
            content: content.into(),
        }
    }
}

/// User-selected tax estimation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxPreference {
    /// Flat 8% of gross income, with the annual ₱250,000 exemption
    #[serde(rename = "8_percent")]
    EightPercent,
    /// Graduated rates on profit after expenses
    #[serde(rename = "graduated")]
    Graduated,
}

/// A chat request: conversation history plus financial context.
///
/// Built from untrusted JSON via [`ChatRequest::from_value`]; constructed
/// directly only by code that already holds typed values.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "monthlyIncome")]
    pub monthly_income: f64,
    #[serde(rename = "taxPreference", default)]
    pub tax_preference: Option<TaxPreference>,
}

impl ChatRequest {
    /// Validate an untrusted payload into a typed request.
    ///
    /// Shape errors (wrong types, unknown roles or preferences) and
    /// semantic errors (negative income, empty history) both surface as
    /// `ChatError::Validation`. No side effects.
    pub fn from_value(value: Value) -> Result<Self, ChatError> {
        let request: ChatRequest = serde_json::from_value(value)
            .map_err(|e| ChatError::validation("request", e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Semantic checks that serde's shape enforcement cannot express
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.messages.is_empty() {
            return Err(ChatError::validation(
                "messages",
                "conversation history is empty",
            ));
        }
        if !self.monthly_income.is_finite() || self.monthly_income < 0.0 {
            return Err(ChatError::validation(
                "monthlyIncome",
                format!("must be a non-negative number, got {}", self.monthly_income),
            ));
        }
        Ok(())
    }
}
