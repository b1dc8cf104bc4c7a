//! Cards API endpoints.

use super::path_id;
use crate::client::TrelloClient;
use crate::error::{TrelloError, TrelloResult};
use crate::types::{Card, CardUpdate, NewCard};

/// Cards API.
pub struct CardsApi<'a> {
    client: &'a TrelloClient,
}

impl<'a> CardsApi<'a> {
    pub(crate) fn new(client: &'a TrelloClient) -> Self {
        Self { client }
    }

    /// Get a card by ID.
    pub async fn get(&self, card_id: &str) -> TrelloResult<Card> {
        let card_id = path_id("card", card_id)?;
        self.client.http.get(&format!("cards/{}", card_id)).await
    }

    /// Create a card.
    pub async fn create(&self, card: &NewCard) -> TrelloResult<Card> {
        path_id("list", &card.id_list)?;
        if card.name.trim().is_empty() {
            return Err(TrelloError::InvalidInput("card name must not be empty".to_string()));
        }
        self.client.http.post("cards", card).await
    }

    /// Update a card. Fields left as `None` are untouched.
    pub async fn update(&self, card_id: &str, update: &CardUpdate) -> TrelloResult<Card> {
        let card_id = path_id("card", card_id)?;
        if update.is_empty() {
            return Err(TrelloError::InvalidInput("card update has no fields set".to_string()));
        }
        self.client.http.put(&format!("cards/{}", card_id), update).await
    }

    /// Archive a card.
    pub async fn archive(&self, card_id: &str) -> TrelloResult<Card> {
        let update = CardUpdate {
            closed: Some(true),
            ..Default::default()
        };
        self.update(card_id, &update).await
    }

    /// Move a card to another list.
    pub async fn move_to(&self, card_id: &str, list_id: &str) -> TrelloResult<Card> {
        let list_id = path_id("list", list_id)?;
        let update = CardUpdate {
            id_list: Some(list_id.to_string()),
            ..Default::default()
        };
        self.update(card_id, &update).await
    }
}
