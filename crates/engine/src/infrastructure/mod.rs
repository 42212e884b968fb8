//! Infrastructure implementations.
//!
//! Port traits plus the adapters behind them: the in-memory document store,
//! the data source registry, fixtures and environment configuration.

pub mod config;
pub mod fixture;
pub mod memory_store;
pub mod ports;
pub mod registry;
