//! MCP server health status domain types.
//!
//! Health is observed by probing, never configured. It is stored alongside
//! the server but changing it does not mark the server as needing a sync.

use super::ParseMcpServerHealthStatusError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health status of an MCP server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpServerHealthStatus {
    /// Health has not been checked since the server was registered.
    #[default]
    Unknown,
    /// The last probe reached the server.
    Healthy,
    /// The last probe failed.
    Unhealthy,
}

impl McpServerHealthStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for McpServerHealthStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for McpServerHealthStatus {
    type Error = ParseMcpServerHealthStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "healthy" => Ok(Self::Healthy),
            "unhealthy" => Ok(Self::Unhealthy),
            _ => Err(ParseMcpServerHealthStatusError(value.to_owned())),
        }
    }
}

/// Result of the most recent health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerHealthSnapshot {
    status: McpServerHealthStatus,
    checked_at: Option<DateTime<Utc>>,
    message: Option<String>,
}

impl McpServerHealthSnapshot {
    /// Returns the snapshot of a server that has never been probed.
    #[must_use]
    pub const fn never_checked() -> Self {
        Self {
            status: McpServerHealthStatus::Unknown,
            checked_at: None,
            message: None,
        }
    }

    /// Creates a snapshot observed at `checked_at`.
    #[must_use]
    pub const fn observed(status: McpServerHealthStatus, checked_at: DateTime<Utc>) -> Self {
        Self {
            status,
            checked_at: Some(checked_at),
            message: None,
        }
    }

    /// Creates a `healthy` snapshot.
    #[must_use]
    pub fn healthy(checked_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self::observed(McpServerHealthStatus::Healthy, checked_at).with_message(message)
    }

    /// Creates an `unhealthy` snapshot with details.
    #[must_use]
    pub fn unhealthy(checked_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self::observed(McpServerHealthStatus::Unhealthy, checked_at).with_message(message)
    }

    /// Rebuilds a snapshot from stored columns.
    #[must_use]
    pub fn from_parts(
        status: McpServerHealthStatus,
        checked_at: Option<DateTime<Utc>>,
        message: Option<String>,
    ) -> Self {
        let snapshot = Self {
            status,
            checked_at,
            message: None,
        };
        match message {
            Some(text) => snapshot.with_message(text),
            None => snapshot,
        }
    }

    /// Adds an explanatory message. Blank messages are ignored.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let normalized = message.into().trim().to_owned();
        if !normalized.is_empty() {
            self.message = Some(normalized);
        }
        self
    }

    /// Returns the health status.
    #[must_use]
    pub const fn status(&self) -> McpServerHealthStatus {
        self.status
    }

    /// Returns when the probe ran, if it ever did.
    #[must_use]
    pub const fn checked_at(&self) -> Option<DateTime<Utc>> {
        self.checked_at
    }

    /// Returns an optional detail message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Default for McpServerHealthSnapshot {
    fn default() -> Self {
        Self::never_checked()
    }
}
