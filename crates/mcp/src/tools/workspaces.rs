// Workspace tools

use crate::protocol::{CallToolResult, ToolSchema};
use crate::session::TrelloSession;
use crate::tools::{json_schema_object, json_schema_string, parse_args, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Tool to list the member's workspaces
pub struct ListWorkspacesTool {
    session: Arc<TrelloSession>,
}

impl ListWorkspacesTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl Tool for ListWorkspacesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_workspaces".to_string(),
            description: "List all workspaces the authenticated user belongs to".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
        let workspaces = self
            .session
            .client()
            .workspaces()
            .list_mine()
            .await
            .context("Failed to list workspaces")?;

        Ok(CallToolResult::json(&workspaces)?)
    }
}

/// Tool to choose the workspace used when `workspaceId` is omitted
pub struct SetActiveWorkspaceTool {
    session: Arc<TrelloSession>,
}

impl SetActiveWorkspaceTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetActiveWorkspaceArgs {
    workspace_id: String,
}

#[async_trait::async_trait]
impl Tool for SetActiveWorkspaceTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "set_active_workspace".to_string(),
            description: "Set the active workspace used by tools when workspaceId is not provided".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "workspaceId": json_schema_string("ID of the workspace to make active")
                }),
                vec!["workspaceId"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: SetActiveWorkspaceArgs = parse_args("set_active_workspace", arguments)?;

        let workspace = self
            .session
            .client()
            .workspaces()
            .get(&args.workspace_id)
            .await
            .with_context(|| format!("Failed to load workspace {}", args.workspace_id))?;

        self.session.set_active_workspace(workspace.id.clone()).await;
        tracing::info!(workspace_id = %workspace.id, "Active workspace changed");

        Ok(CallToolResult::text(format!(
            "Successfully set active workspace to \"{}\" ({})",
            workspace.display_name, workspace.id
        )))
    }
}

/// Tool to list the boards of a workspace
pub struct ListBoardsInWorkspaceTool {
    session: Arc<TrelloSession>,
}

impl ListBoardsInWorkspaceTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkspaceArgs {
    #[serde(default)]
    workspace_id: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ListBoardsInWorkspaceTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_boards_in_workspace".to_string(),
            description: "List all open boards in a workspace".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "workspaceId": json_schema_string("ID of the workspace (uses the active workspace if omitted)")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: WorkspaceArgs = parse_args("list_boards_in_workspace", arguments)?;
        let workspace_id = self.session.resolve_workspace(args.workspace_id).await?;

        let boards = self
            .session
            .client()
            .workspaces()
            .boards(&workspace_id)
            .await
            .with_context(|| format!("Failed to list boards in workspace {}", workspace_id))?;

        Ok(CallToolResult::json(&boards)?)
    }
}
