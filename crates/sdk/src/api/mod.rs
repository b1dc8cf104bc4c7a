//! Trello REST endpoint groups.

mod boards;
mod cards;
mod lists;
mod members;
mod workspaces;

pub use boards::BoardsApi;
pub use cards::CardsApi;
pub use lists::ListsApi;
pub use members::MembersApi;
pub use workspaces::WorkspacesApi;

use crate::error::{TrelloError, TrelloResult};

/// Validate an id before it is spliced into a URL path.
pub(crate) fn path_id<'a>(kind: &str, id: &'a str) -> TrelloResult<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(TrelloError::InvalidInput(format!("{} id must not be empty", kind)));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(TrelloError::InvalidInput(format!(
            "{} id contains invalid characters: {}",
            kind, id
        )));
    }
    Ok(id)
}
