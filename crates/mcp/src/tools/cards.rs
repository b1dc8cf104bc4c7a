// Card tools

use crate::protocol::{CallToolResult, ToolSchema};
use crate::session::TrelloSession;
use crate::tools::{json_schema_array, json_schema_object, json_schema_string, parse_args, Tool};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use trello_mcp_sdk::{CardUpdate, NewCard};

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
fn parse_due_date(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    bail!("Invalid dueDate {:?}: expected RFC 3339 or YYYY-MM-DD", value)
}

fn card_fields_schema() -> serde_json::Map<String, serde_json::Value> {
    let mut fields = serde_json::Map::new();
    fields.insert("name".to_string(), json_schema_string("Card title"));
    fields.insert("description".to_string(), json_schema_string("Card description"));
    fields.insert(
        "dueDate".to_string(),
        json_schema_string("Due date (ISO 8601, e.g. 2026-03-01T17:00:00Z or 2026-03-01)"),
    );
    fields.insert(
        "labels".to_string(),
        json_schema_array(serde_json::json!({"type": "string"}), "Label IDs to apply"),
    );
    fields
}

/// Tool to list the cards in a list
pub struct GetCardsByListIdTool {
    session: Arc<TrelloSession>,
}

impl GetCardsByListIdTool {
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
impl Tool for GetCardsByListIdTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_cards_by_list_id".to_string(),
            description: "Fetch the open cards of a list".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "listId": json_schema_string("ID of the list")
                }),
                vec!["listId"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ListIdArgs = parse_args("get_cards_by_list_id", arguments)?;

        let cards = self
            .session
            .client()
            .lists()
            .cards(&args.list_id)
            .await
            .with_context(|| format!("Failed to get cards for list {}", args.list_id))?;

        Ok(CallToolResult::json(&cards)?)
    }
}

/// Tool to create a card
pub struct AddCardToListTool {
    session: Arc<TrelloSession>,
}

impl AddCardToListTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCardArgs {
    list_id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    labels: Option<Vec<String>>,
}

#[async_trait::async_trait]
impl Tool for AddCardToListTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = card_fields_schema();
        properties.insert(
            "listId".to_string(),
            json_schema_string("ID of the list to add the card to"),
        );

        ToolSchema {
            name: "add_card_to_list".to_string(),
            description: "Add a new card to a list".to_string(),
            input_schema: json_schema_object(properties.into(), vec!["listId", "name"]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: AddCardArgs = parse_args("add_card_to_list", arguments)?;

        let card = NewCard {
            id_list: args.list_id,
            name: args.name,
            desc: args.description,
            due: args.due_date.as_deref().map(parse_due_date).transpose()?,
            id_labels: args.labels,
            pos: Some("bottom".to_string()),
        };

        let created = self
            .session
            .client()
            .cards()
            .create(&card)
            .await
            .with_context(|| format!("Failed to add card to list {}", card.id_list))?;

        Ok(CallToolResult::json(&created)?)
    }
}

/// Tool to edit a card's details
pub struct UpdateCardDetailsTool {
    session: Arc<TrelloSession>,
}

impl UpdateCardDetailsTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCardArgs {
    card_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    labels: Option<Vec<String>>,
}

#[async_trait::async_trait]
impl Tool for UpdateCardDetailsTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = card_fields_schema();
        properties.insert("cardId".to_string(), json_schema_string("ID of the card to update"));

        ToolSchema {
            name: "update_card_details".to_string(),
            description: "Update an existing card's name, description, due date or labels".to_string(),
            input_schema: json_schema_object(properties.into(), vec!["cardId"]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: UpdateCardArgs = parse_args("update_card_details", arguments)?;

        let update = CardUpdate {
            name: args.name,
            desc: args.description,
            due: args.due_date.as_deref().map(parse_due_date).transpose()?,
            id_labels: args.labels,
            ..Default::default()
        };
        if update.is_empty() {
            return Ok(CallToolResult::error(
                "Nothing to update: provide name, description, dueDate or labels",
            ));
        }

        let card = self
            .session
            .client()
            .cards()
            .update(&args.card_id, &update)
            .await
            .with_context(|| format!("Failed to update card {}", args.card_id))?;

        Ok(CallToolResult::json(&card)?)
    }
}

/// Tool to archive a card
pub struct ArchiveCardTool {
    session: Arc<TrelloSession>,
}

impl ArchiveCardTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardIdArgs {
    card_id: String,
}

#[async_trait::async_trait]
impl Tool for ArchiveCardTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "archive_card".to_string(),
            description: "Send a card to the archive".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "cardId": json_schema_string("ID of the card to archive")
                }),
                vec!["cardId"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: CardIdArgs = parse_args("archive_card", arguments)?;

        let card = self
            .session
            .client()
            .cards()
            .archive(&args.card_id)
            .await
            .with_context(|| format!("Failed to archive card {}", args.card_id))?;

        Ok(CallToolResult::json(&card)?)
    }
}

/// Tool to move a card to another list
pub struct MoveCardTool {
    session: Arc<TrelloSession>,
}

impl MoveCardTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveCardArgs {
    card_id: String,
    list_id: String,
}

#[async_trait::async_trait]
impl Tool for MoveCardTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "move_card".to_string(),
            description: "Move a card to a different list".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "cardId": json_schema_string("ID of the card to move"),
                    "listId": json_schema_string("ID of the target list")
                }),
                vec!["cardId", "listId"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: MoveCardArgs = parse_args("move_card", arguments)?;

        let card = self
            .session
            .client()
            .cards()
            .move_to(&args.card_id, &args.list_id)
            .await
            .with_context(|| format!("Failed to move card {} to list {}", args.card_id, args.list_id))?;

        Ok(CallToolResult::json(&card)?)
    }
}

/// Tool to list cards assigned to the authenticated member
pub struct GetMyCardsTool {
    session: Arc<TrelloSession>,
}

impl GetMyCardsTool {
    pub fn new(session: Arc<TrelloSession>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl Tool for GetMyCardsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_my_cards".to_string(),
            description: "Fetch all open cards assigned to the current user".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
        let cards = self
            .session
            .client()
            .members()
            .my_cards()
            .await
            .context("Failed to get cards for current user")?;

        Ok(CallToolResult::json(&cards)?)
    }
}
