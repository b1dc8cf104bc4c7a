//! Boards API endpoints.

use super::path_id;
use crate::client::TrelloClient;
use crate::error::TrelloResult;
use crate::types::{Action, Board, Card, List};

/// Boards API.
pub struct BoardsApi<'a> {
    client: &'a TrelloClient,
}

impl<'a> BoardsApi<'a> {
    pub(crate) fn new(client: &'a TrelloClient) -> Self {
        Self { client }
    }

    /// Open boards of the authenticated member.
    pub async fn list_mine(&self) -> TrelloResult<Vec<Board>> {
        self.client
            .http
            .get_with_query("members/me/boards", &[("filter", "open")])
            .await
    }

    /// Get a board by ID.
    pub async fn get(&self, board_id: &str) -> TrelloResult<Board> {
        let board_id = path_id("board", board_id)?;
        self.client.http.get(&format!("boards/{}", board_id)).await
    }

    /// Open lists on a board.
    pub async fn lists(&self, board_id: &str) -> TrelloResult<Vec<List>> {
        let board_id = path_id("board", board_id)?;
        self.client
            .http
            .get_with_query(&format!("boards/{}/lists", board_id), &[("filter", "open")])
            .await
    }

    /// Most recent actions on a board, newest first.
    pub async fn actions(&self, board_id: &str, limit: u32) -> TrelloResult<Vec<Action>> {
        let board_id = path_id("board", board_id)?;
        self.client
            .http
            .get_with_query(
                &format!("boards/{}/actions", board_id),
                &[("limit", limit.to_string())],
            )
            .await
    }

    /// Cards on a board assigned to a member.
    pub async fn member_cards(&self, board_id: &str, member_id: &str) -> TrelloResult<Vec<Card>> {
        let board_id = path_id("board", board_id)?;
        let member_id = path_id("member", member_id)?;
        self.client
            .http
            .get(&format!("boards/{}/members/{}/cards", board_id, member_id))
            .await
    }
}
