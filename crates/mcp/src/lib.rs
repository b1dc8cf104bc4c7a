// MCP (Model Context Protocol) server exposing Trello as tools.
// Every Trello call goes through the SDK's dual-scope rate limiter.

pub mod config;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;

pub use config::McpConfig;
pub use server::McpServer;
pub use session::TrelloSession;
