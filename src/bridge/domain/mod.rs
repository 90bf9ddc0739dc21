//! Domain model for bridge credentials and the MCP tool surface.

mod token;
mod tool;

pub use token::{BridgeToken, BridgeTokenValue, PersistedBridgeTokenData, TOKEN_PREFIX};
pub use tool::{BridgeTool, ToolCallResult, ToolContent, skill_description, tools_for_skills};
