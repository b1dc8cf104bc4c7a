//! Members API endpoints.

use crate::client::TrelloClient;
use crate::error::TrelloResult;
use crate::types::{Card, Member};

/// Members API, scoped to the member owning the token.
pub struct MembersApi<'a> {
    client: &'a TrelloClient,
}

impl<'a> MembersApi<'a> {
    pub(crate) fn new(client: &'a TrelloClient) -> Self {
        Self { client }
    }

    /// The authenticated member.
    pub async fn me(&self) -> TrelloResult<Member> {
        self.client.http.get("members/me").await
    }

    /// Open cards the authenticated member is assigned to, across all boards.
    pub async fn my_cards(&self) -> TrelloResult<Vec<Card>> {
        self.client
            .http
            .get_with_query("members/me/cards", &[("filter", "open")])
            .await
    }
}
