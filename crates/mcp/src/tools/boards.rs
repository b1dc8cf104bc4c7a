// Board tools: listing, active board selection and activity

use crate::protocol::{CallToolResult, ToolSchema};
use crate::session::TrelloSession;
use crate::tools::{json_schema_number, json_schema_object, json_schema_string, parse_args, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Tool to list the member's boards
pub struct ListBoardsTool {
    session: Arc<TrelloSession>,
}

impl ListBoardsTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl Tool for ListBoardsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_boards".to_string(),
            description: "List all open boards the authenticated user has access to".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
        let boards = self
            .session
            .client()
            .boards()
            .list_mine()
            .await
            .context("Failed to list boards")?;

        Ok(CallToolResult::json(&boards)?)
    }
}

/// Tool to choose the board used when `boardId` is omitted
pub struct SetActiveBoardTool {
    session: Arc<TrelloSession>,
}

impl SetActiveBoardTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetActiveBoardArgs {
    board_id: String,
}

#[async_trait::async_trait]
impl Tool for SetActiveBoardTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "set_active_board".to_string(),
            description: "Set the active board used by tools when boardId is not provided".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "boardId": json_schema_string("ID of the board to make active")
                }),
                vec!["boardId"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: SetActiveBoardArgs = parse_args("set_active_board", arguments)?;

        // Fetch first so an unknown or inaccessible board is never made active.
        let board = self
            .session
            .client()
            .boards()
            .get(&args.board_id)
            .await
            .with_context(|| format!("Failed to load board {}", args.board_id))?;

        self.session.set_active_board(board.id.clone()).await;
        tracing::info!(board_id = %board.id, "Active board changed");

        Ok(CallToolResult::text(format!(
            "Successfully set active board to \"{}\" ({})",
            board.name, board.id
        )))
    }
}

/// Tool to describe the active board
pub struct GetActiveBoardInfoTool {
    session: Arc<TrelloSession>,
}

impl GetActiveBoardInfoTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl Tool for GetActiveBoardInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_active_board_info".to_string(),
            description: "Get details about the currently active board".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
        let Some(board_id) = self.session.active_board().await else {
            return Ok(CallToolResult::error(
                "No active board set. Use set_active_board first",
            ));
        };

        let board = self
            .session
            .client()
            .boards()
            .get(&board_id)
            .await
            .with_context(|| format!("Failed to load board {}", board_id))?;

        let mut info = serde_json::to_value(&board)?;
        info["isActive"] = serde_json::Value::Bool(true);
        if let Some(workspace_id) = self.session.active_workspace().await {
            info["activeWorkspaceId"] = serde_json::Value::String(workspace_id);
        }

        Ok(CallToolResult::json(&info)?)
    }
}

/// Tool to fetch recent board activity
pub struct GetRecentActivityTool {
    session: Arc<TrelloSession>,
}

impl GetRecentActivityTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetRecentActivityArgs {
    #[serde(default)]
    board_id: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for GetRecentActivityTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_recent_activity".to_string(),
            description: "Fetch recent activity on a board".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "boardId": json_schema_string("ID of the board (uses the active board if omitted)"),
                    "limit": json_schema_number("Number of activities to fetch (default: 10, max: 1000)")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: GetRecentActivityArgs = parse_args("get_recent_activity", arguments)?;
        let board_id = self.session.resolve_board(args.board_id).await?;
        let limit = args.limit.unwrap_or(10).clamp(1, 1000);

        let actions = self
            .session
            .client()
            .boards()
            .actions(&board_id, limit)
            .await
            .with_context(|| format!("Failed to fetch activity for board {}", board_id))?;

        Ok(CallToolResult::json(&actions)?)
    }
}
