//! Reya DEX plugin for conversational agents
//!
//! Answers market, price and asset questions from the Reya trading API:
//! - Classifies each message into a fixed intent set (model first, keywords as fallback)
//! - Gates API-backed actions on that intent, leaving knowledge questions to others
//! - Fronts the REST API with a short-TTL read-through cache per resource kind
//!
//! TURN:
//! MESSAGE → CLASSIFY → GATE → (ACTION VALIDATE → CACHE/FETCH → REPLY) | UNHANDLED

pub mod actions;
pub mod api;
pub mod cache;
pub mod classifier;
pub mod completion;
pub mod config;
pub mod error;
pub mod format;
pub mod gate;
pub mod gemini;
pub mod models;
pub mod plugin;
pub mod providers;
pub mod runtime;
pub mod service;
pub mod topics;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{PluginError, Result};

// Re-export common types
pub use classifier::IntentClassifier;
pub use config::PluginConfig;
pub use models::{DispatchFlags, IntentAnalysis, IntentKind, ResourceKind};
pub use plugin::ReyaPlugin;
