//! Workspaces API endpoints.

use super::path_id;
use crate::client::TrelloClient;
use crate::error::TrelloResult;
use crate::types::{Board, Workspace};

/// Workspaces API (Trello organizations).
pub struct WorkspacesApi<'a> {
    client: &'a TrelloClient,
}

impl<'a> WorkspacesApi<'a> {
    pub(crate) fn new(client: &'a TrelloClient) -> Self {
        Self { client }
    }

    /// Workspaces the authenticated member belongs to.
    pub async fn list_mine(&self) -> TrelloResult<Vec<Workspace>> {
        self.client.http.get("members/me/organizations").await
    }

    /// Get a workspace by ID.
    pub async fn get(&self, workspace_id: &str) -> TrelloResult<Workspace> {
        let workspace_id = path_id("workspace", workspace_id)?;
        self.client
            .http
            .get(&format!("organizations/{}", workspace_id))
            .await
    }

    /// Open boards in a workspace.
    pub async fn boards(&self, workspace_id: &str) -> TrelloResult<Vec<Board>> {
        let workspace_id = path_id("workspace", workspace_id)?;
        self.client
            .http
            .get_with_query(
                &format!("organizations/{}/boards", workspace_id),
                &[("filter", "open")],
            )
            .await
    }
}
