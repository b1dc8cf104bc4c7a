// List tools

use crate::protocol::{CallToolResult, ToolSchema};
use crate::session::TrelloSession;
use crate::tools::{json_schema_object, json_schema_string, parse_args, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Tool to list the lists on a board
pub struct GetListsTool {
    session: Arc<TrelloSession>,
}

impl GetListsTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardArgs {
    #[serde(default)]
    board_id: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetListsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_lists".to_string(),
            description: "Retrieve all open lists from a board".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "boardId": json_schema_string("ID of the board (uses the active board if omitted)")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: BoardArgs = parse_args("get_lists", arguments)?;
        let board_id = self.session.resolve_board(args.board_id).await?;

        let lists = self
            .session
            .client()
            .boards()
            .lists(&board_id)
            .await
            .with_context(|| format!("Failed to get lists for board {}", board_id))?;

        Ok(CallToolResult::json(&lists)?)
    }
}

/// Tool to add a list to a board
pub struct AddListToBoardTool {
    session: Arc<TrelloSession>,
}

impl AddListToBoardTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddListArgs {
    #[serde(default)]
    board_id: Option<String>,
    name: String,
}

#[async_trait::async_trait]
impl Tool for AddListToBoardTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "add_list_to_board".to_string(),
            description: "Add a new list to a board".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "boardId": json_schema_string("ID of the board (uses the active board if omitted)"),
                    "name": json_schema_string("Name of the new list")
                }),
                vec!["name"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: AddListArgs = parse_args("add_list_to_board", arguments)?;
        let board_id = self.session.resolve_board(args.board_id).await?;

        let list = self
            .session
            .client()
            .lists()
            .create(&board_id, &args.name)
            .await
            .with_context(|| format!("Failed to add list to board {}", board_id))?;

        Ok(CallToolResult::json(&list)?)
    }
}

/// Tool to archive a list
pub struct ArchiveListTool {
    session: Arc<TrelloSession>,
}

impl ArchiveListTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListIdArgs {
    list_id: String,
}

#[async_trait::async_trait]
impl Tool for ArchiveListTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "archive_list".to_string(),
            description: "Send a list to the archive".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "listId": json_schema_string("ID of the list to archive")
                }),
                vec!["listId"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ListIdArgs = parse_args("archive_list", arguments)?;

        let list = self
            .session
            .client()
            .lists()
            .archive(&args.list_id)
            .await
            .with_context(|| format!("Failed to archive list {}", args.list_id))?;

        Ok(CallToolResult::json(&list)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{json, session};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_lists_explicit_board() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1/boards/b1/lists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "l1", "name": "To Do", "idBoard": "b1", "pos": 1024},
                {"id": "l2", "name": "Done", "idBoard": "b1", "pos": 2048}
            ])))
            .mount(&server)
            .await;

        let result = GetListsTool::new(session(&server))
            .execute(serde_json::json!({"boardId": "b1"}))
            .await
            .unwrap();

        let lists = json(&result);
        assert_eq!(lists.as_array().unwrap().len(), 2);
        assert_eq!(lists[1]["name"], "Done");
    }

    #[tokio::test]
    async fn test_add_list_to_active_board() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/lists"))
            .and(body_json(serde_json::json!({"name": "Blocked", "idBoard": "b1", "pos": "bottom"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "l3", "name": "Blocked", "idBoard": "b1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server);
        session.set_active_board("b1").await;
        let result = AddListToBoardTool::new(session)
            .execute(serde_json::json!({"name": "Blocked"}))
            .await
            .unwrap();

        assert_eq!(json(&result)["id"], "l3");
    }

    #[tokio::test]
    async fn test_archive_list() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/1/lists/l1/closed"))
            .and(query_param("value", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "l1", "name": "Old", "closed": true
            })))
            .mount(&server)
            .await;

        let result = ArchiveListTool::new(session(&server))
            .execute(serde_json::json!({"listId": "l1"}))
            .await
            .unwrap();

        assert_eq!(json(&result)["closed"], true);
    }

    #[tokio::test]
    async fn test_archive_list_requires_list_id() {
        let server = MockServer::start().await;

        let err = ArchiveListTool::new(session(&server))
            .execute(serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid arguments for archive_list"));
    }
}
