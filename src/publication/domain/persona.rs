//! Persona and rule fields authored for an agent component.

use super::PublicationDomainError;
use serde::{Deserialize, Serialize};

/// Maximum length for an agent name, matching `VARCHAR(255)`.
const MAX_AGENT_NAME_LENGTH: usize = 255;

/// Authored persona of an agent component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPersona {
    name: String,
    description: Option<String>,
    qa_who: Option<String>,
    qa_rules: Option<String>,
}

impl AgentPersona {
    /// Creates a persona with a validated display name.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationDomainError`] when the trimmed name is empty or
    /// longer than 255 characters.
    pub fn new(name: impl Into<String>) -> Result<Self, PublicationDomainError> {
        let normalized = name.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(PublicationDomainError::EmptyAgentName);
        }

        let length = normalized.chars().count();
        if length > MAX_AGENT_NAME_LENGTH {
            return Err(PublicationDomainError::AgentNameTooLong {
                max: MAX_AGENT_NAME_LENGTH,
                actual: length,
            });
        }

        Ok(Self {
            name: normalized,
            description: None,
            qa_who: None,
            qa_rules: None,
        })
    }

    /// Sets the short description shown to bridge clients.
    #[must_use]
    pub fn with_description(mut self, value: Option<String>) -> Self {
        self.description = non_blank(value);
        self
    }

    /// Sets the "who is this agent" answer.
    #[must_use]
    pub fn with_qa_who(mut self, value: Option<String>) -> Self {
        self.qa_who = non_blank(value);
        self
    }

    /// Sets the behavioural rules answer.
    #[must_use]
    pub fn with_qa_rules(mut self, value: Option<String>) -> Self {
        self.qa_rules = non_blank(value);
        self
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the optional "who" answer.
    #[must_use]
    pub fn qa_who(&self) -> Option<&str> {
        self.qa_who.as_deref()
    }

    /// Returns the optional rules answer.
    #[must_use]
    pub fn qa_rules(&self) -> Option<&str> {
        self.qa_rules.as_deref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("   ")]
    #[case("")]
    fn blank_names_are_rejected(#[case] name: &str) {
        assert_eq!(
            AgentPersona::new(name),
            Err(PublicationDomainError::EmptyAgentName)
        );
    }

    #[test]
    fn overlong_names_are_rejected() {
        let name = "a".repeat(256);

        let result = AgentPersona::new(name);

        assert!(matches!(
            result,
            Err(PublicationDomainError::AgentNameTooLong { actual: 256, .. })
        ));
    }

    #[test]
    fn blank_optional_fields_are_dropped() {
        let persona = AgentPersona::new(" Charlie ")
            .expect("valid name")
            .with_description(Some("  ".to_owned()))
            .with_qa_who(Some("A helpful tutor".to_owned()));

        assert_eq!(persona.name(), "Charlie");
        assert_eq!(persona.description(), None);
        assert_eq!(persona.qa_who(), Some("A helpful tutor"));
    }
}
