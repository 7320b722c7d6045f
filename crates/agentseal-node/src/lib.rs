//! agentseal Node - HTTP client for the ledger node
//!
//! [`NodeClient`] implements [`agentseal_core::NodeApi`] over the node's REST
//! API with reqwest. Every call is bounded by the configured timeout; a
//! timeout surfaces as a transport error.

pub mod client;
pub mod config;

pub use client::NodeClient;
pub use config::NodeConfig;
