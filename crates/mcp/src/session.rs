// Per-server Trello session: client plus the active board/workspace

use anyhow::{anyhow, Result};
use tokio::sync::RwLock;
use trello_mcp_sdk::TrelloClient;

/// State shared by every tool of one server instance.
pub struct TrelloSession {
    client: TrelloClient,
    active_board: RwLock<Option<String>>,
    active_workspace: RwLock<Option<String>>,
}

impl TrelloSession {
    pub fn new(client: TrelloClient) -> Self {
        Self {
            client,
            active_board: RwLock::new(None),
            active_workspace: RwLock::new(None),
        }
    }

    pub fn with_defaults(
        client: TrelloClient,
        board_id: Option<String>,
        workspace_id: Option<String>,
    ) -> Self {
        Self {
            client,
            active_board: RwLock::new(board_id),
            active_workspace: RwLock::new(workspace_id),
        }
    }

    pub fn client(&self) -> &TrelloClient {
        &self.client
    }

    pub async fn active_board(&self) -> Option<String> {
        self.active_board.read().await.clone()
    }

    pub async fn set_active_board(&self, board_id: impl Into<String>) {
        *self.active_board.write().await = Some(board_id.into());
    }

    pub async fn active_workspace(&self) -> Option<String> {
        self.active_workspace.read().await.clone()
    }

    pub async fn set_active_workspace(&self, workspace_id: impl Into<String>) {
        *self.active_workspace.write().await = Some(workspace_id.into());
    }

    /// The explicit board id, falling back to the active board.
    pub async fn resolve_board(&self, board_id: Option<String>) -> Result<String> {
        match board_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => Ok(id),
            None => self.active_board().await.ok_or_else(|| {
                anyhow!("boardId is required: pass it explicitly or call set_active_board first")
            }),
        }
    }

    /// The explicit workspace id, falling back to the active workspace.
    pub async fn resolve_workspace(&self, workspace_id: Option<String>) -> Result<String> {
        match workspace_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => Ok(id),
            None => self.active_workspace().await.ok_or_else(|| {
                anyhow!("workspaceId is required: pass it explicitly or call set_active_workspace first")
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TrelloClient {
        TrelloClient::builder().api_key("k").token("t").build().unwrap()
    }

    #[tokio::test]
    async fn test_resolve_board_prefers_explicit_id() {
        let session = TrelloSession::with_defaults(client(), Some("active".to_string()), None);

        assert_eq!(session.resolve_board(Some("b1".to_string())).await.unwrap(), "b1");
        assert_eq!(session.resolve_board(None).await.unwrap(), "active");
        assert_eq!(session.resolve_board(Some(" ".to_string())).await.unwrap(), "active");
    }

    #[tokio::test]
    async fn test_resolve_board_without_active_board_fails() {
        let session = TrelloSession::new(client());

        let err = session.resolve_board(None).await.unwrap_err();
        assert!(err.to_string().contains("boardId is required"));

        session.set_active_board("b2").await;
        assert_eq!(session.resolve_board(None).await.unwrap(), "b2");
    }

    #[tokio::test]
    async fn test_active_workspace() {
        let session = TrelloSession::new(client());
        assert!(session.resolve_workspace(None).await.is_err());

        session.set_active_workspace("acme").await;
        assert_eq!(session.active_workspace().await.as_deref(), Some("acme"));
    }
}
