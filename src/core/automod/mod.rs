// Core auto-moderation module - the rule engine business logic.

pub mod automod_models;
pub mod automod_service;
pub mod evaluators;
pub mod ledger;

pub use automod_models::*;
pub use automod_service::*;
