// Discord layer - commands and event handlers.

#[path = "automod/commands.rs"]
pub mod commands;

#[path = "automod/violation_handler.rs"]
pub mod violation_handler;

use crate::core::automod::AutoModService;
use crate::infra::automod::JsonAutoModStore;
use std::sync::Arc;

/// Type alias for our bot's error and context types.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
/// This is where we store our services and configuration.
pub struct Data {
    pub automod: Arc<AutoModService<JsonAutoModStore>>,
}
