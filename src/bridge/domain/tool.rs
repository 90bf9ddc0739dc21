//! MCP wire shapes for bridge tools and tool-call results.

use crate::skill::domain::{Workflow, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;

/// Workflow exposed to a bridge as a callable MCP tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeTool {
    /// Slug of the workflow name.
    pub name: String,
    /// Tool description shown to the model.
    pub description: String,
    /// JSON schema of the tool arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    /// Workflow the tool executes.
    #[serde(rename = "_workflow_id")]
    pub workflow_id: WorkflowId,
}

impl BridgeTool {
    /// Describes a skill workflow as a tool.
    #[must_use]
    pub fn from_workflow(workflow: &Workflow) -> Self {
        Self {
            name: workflow.tool_name(),
            description: skill_description(workflow),
            input_schema: message_schema(),
            workflow_id: workflow.id(),
        }
    }
}

/// Describes `skills` as tools with unique names.
///
/// Workflows whose names slugify alike keep list order: the first takes the
/// plain slug and later ones get `-2`, `-3` and so on.
#[must_use]
pub fn tools_for_skills(skills: &[Workflow]) -> Vec<BridgeTool> {
    let mut taken = HashSet::new();
    skills
        .iter()
        .map(|workflow| {
            let mut tool = BridgeTool::from_workflow(workflow);
            let mut suffix = 2_u32;
            let base = tool.name.clone();
            while taken.contains(&tool.name) {
                tool.name = format!("{base}-{suffix}");
                suffix += 1;
            }
            taken.insert(tool.name.clone());
            tool
        })
        .collect()
}

/// Returns the description shown for a skill, falling back to a generated
/// one when the workflow has none.
#[must_use]
pub fn skill_description(workflow: &Workflow) -> String {
    workflow.description().map_or_else(
        || format!("Executes the '{}' workflow", workflow.name().as_str()),
        str::to_owned,
    )
}

fn message_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "message": {
                "type": "string",
                "description": "The input message to send to the workflow"
            }
        },
        "required": ["message"]
    })
}

/// One block of tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContent {
    /// Content type; always `text`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Text payload.
    pub text: String,
}

/// Result of a tool call in MCP form.
///
/// Execution failures are reported with `is_error` set rather than as
/// transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Output blocks.
    pub content: Vec<ToolContent>,
    /// Whether the call failed.
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Successful call with a single text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::single(text.into(), false)
    }

    /// Failed call with a single text block describing the failure.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::single(text.into(), true)
    }

    /// Concatenated text of every block.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn single(text: String, is_error: bool) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text".to_owned(),
                text,
            }],
            is_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::domain::WorkflowName;
    use crate::tenant::TenantId;
    use mockable::DefaultClock;

    #[test]
    fn tool_uses_mcp_field_names() {
        let workflow = Workflow::new(
            TenantId::new(),
            WorkflowName::new("Grade Essay").expect("valid workflow name"),
            &DefaultClock,
        );

        let json = serde_json::to_value(BridgeTool::from_workflow(&workflow))
            .expect("tool should serialize");

        assert_eq!(json["name"], "grade-essay");
        assert_eq!(json["description"], "Executes the 'Grade Essay' workflow");
        assert_eq!(json["inputSchema"]["required"], json!(["message"]));
        assert_eq!(json["_workflow_id"], json!(workflow.id()));
    }

    #[test]
    fn colliding_slugs_get_numbered_suffixes() {
        let tenant_id = TenantId::new();
        let workflows: Vec<Workflow> = ["Summarise", "summarise!", "Summarise-2", "SUMMARISE"]
            .into_iter()
            .map(|name| {
                Workflow::new(
                    tenant_id,
                    WorkflowName::new(name).expect("valid workflow name"),
                    &DefaultClock,
                )
            })
            .collect();

        let names: Vec<String> = tools_for_skills(&workflows)
            .into_iter()
            .map(|tool| tool.name)
            .collect();

        assert_eq!(names, ["summarise", "summarise-2", "summarise-2-2", "summarise-3"]);
    }

    #[test]
    fn error_results_set_is_error() {
        let json = serde_json::to_value(ToolCallResult::error("boom"))
            .expect("result should serialize");

        assert_eq!(json, json!({"content": [{"type": "text", "text": "boom"}], "isError": true}));
    }
}
