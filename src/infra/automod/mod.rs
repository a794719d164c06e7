// Infra automod module - persistence for the rule engine.

pub mod json_store;

pub use json_store::JsonAutoModStore;
