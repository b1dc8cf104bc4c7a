pub mod boards;
pub mod cards;
pub mod lists;
pub mod workspaces;
mod registry;

pub use boards::{GetActiveBoardInfoTool, GetRecentActivityTool, ListBoardsTool, SetActiveBoardTool};
pub use cards::{
    AddCardToListTool, ArchiveCardTool, GetCardsByListIdTool, GetMyCardsTool, MoveCardTool,
    UpdateCardDetailsTool,
};
pub use lists::{AddListToBoardTool, ArchiveListTool, GetListsTool};
pub use registry::{
    json_schema_array, json_schema_number, json_schema_object, json_schema_string, Tool,
    ToolRegistry,
};
pub use workspaces::{ListBoardsInWorkspaceTool, ListWorkspacesTool, SetActiveWorkspaceTool};

use crate::session::TrelloSession;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Register every Trello tool against one session.
pub fn register_trello_tools(registry: &mut ToolRegistry, session: Arc<TrelloSession>) {
    registry.register(Arc::new(ListBoardsTool::new(session.clone())));
    registry.register(Arc::new(SetActiveBoardTool::new(session.clone())));
    registry.register(Arc::new(GetActiveBoardInfoTool::new(session.clone())));
    registry.register(Arc::new(GetRecentActivityTool::new(session.clone())));

    registry.register(Arc::new(GetListsTool::new(session.clone())));
    registry.register(Arc::new(AddListToBoardTool::new(session.clone())));
    registry.register(Arc::new(ArchiveListTool::new(session.clone())));

    registry.register(Arc::new(GetCardsByListIdTool::new(session.clone())));
    registry.register(Arc::new(AddCardToListTool::new(session.clone())));
    registry.register(Arc::new(UpdateCardDetailsTool::new(session.clone())));
    registry.register(Arc::new(ArchiveCardTool::new(session.clone())));
    registry.register(Arc::new(MoveCardTool::new(session.clone())));
    registry.register(Arc::new(GetMyCardsTool::new(session.clone())));

    registry.register(Arc::new(ListWorkspacesTool::new(session.clone())));
    registry.register(Arc::new(SetActiveWorkspaceTool::new(session.clone())));
    registry.register(Arc::new(ListBoardsInWorkspaceTool::new(session)));
}

/// Deserialize tool arguments, treating a missing/null object as empty.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, arguments: serde_json::Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        serde_json::json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).with_context(|| format!("Invalid arguments for {}", tool))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::protocol::{CallToolResult, ToolContent};
    use trello_mcp_sdk::{RetryConfig, TrelloClient};
    use wiremock::MockServer;

    pub fn session(server: &MockServer) -> Arc<TrelloSession> {
        let client = TrelloClient::builder()
            .base_url(format!("{}/1", server.uri()))
            .api_key("k")
            .token("t")
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap();
        Arc::new(TrelloSession::new(client))
    }

    pub fn text(result: &CallToolResult) -> &str {
        match &result.content[0] {
            ToolContent::Text { text } => text.as_str(),
        }
    }

    pub fn json(result: &CallToolResult) -> serde_json::Value {
        serde_json::from_str(text(result)).unwrap()
    }
}
