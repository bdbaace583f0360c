//! Core business logic - framework-agnostic market state and transactions.
//!
//! Nothing in this module knows about Discord. The bot layer translates
//! interactions into engine and controller calls and renders the results.

/// One-shot confirmation tokens gating irreversible transactions.
pub mod confirm;
/// Atomic buy/release/listing operations over ledger and registry.
pub mod engine;
/// Team balances and player ownership.
pub mod ledger;
/// Active market listings keyed by generated ids.
pub mod registry;
/// Platform-agnostic card render payloads.
pub mod render;
