// crates/wayfarer-server/src/lib.rs
// Wayfarer - MCP tool adapters for payments, data, content, browser automation and shared context

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod adapters;
pub mod args;
pub mod catalogue;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod mcp;

pub use error::{AdapterError, Result};
