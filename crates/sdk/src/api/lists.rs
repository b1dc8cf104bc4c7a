//! Lists API endpoints.

use super::path_id;
use crate::client::TrelloClient;
use crate::error::{TrelloError, TrelloResult};
use crate::types::{Card, List};
use serde::Serialize;

/// Lists API.
pub struct ListsApi<'a> {
    client: &'a TrelloClient,
}

impl<'a> ListsApi<'a> {
    pub(crate) fn new(client: &'a TrelloClient) -> Self {
        Self { client }
    }

    /// Open cards in a list.
    pub async fn cards(&self, list_id: &str) -> TrelloResult<Vec<Card>> {
        let list_id = path_id("list", list_id)?;
        self.client.http.get(&format!("lists/{}/cards", list_id)).await
    }

    /// Create a list at the bottom of a board.
    pub async fn create(&self, board_id: &str, name: &str) -> TrelloResult<List> {
        let board_id = path_id("board", board_id)?;
        if name.trim().is_empty() {
            return Err(TrelloError::InvalidInput("list name must not be empty".to_string()));
        }
        let request = CreateListRequest {
            name,
            id_board: board_id,
            pos: "bottom",
        };
        self.client.http.post("lists", &request).await
    }

    /// Archive a list.
    pub async fn archive(&self, list_id: &str) -> TrelloResult<List> {
        let list_id = path_id("list", list_id)?;
        self.client
            .http
            .put_with_query(&format!("lists/{}/closed", list_id), &[("value", "true")])
            .await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateListRequest<'a> {
    name: &'a str,
    id_board: &'a str,
    pos: &'a str,
}
