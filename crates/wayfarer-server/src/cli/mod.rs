// crates/wayfarer-server/src/cli/mod.rs
// CLI module for Wayfarer commands

use clap::{Parser, Subcommand};
use wayfarer::adapters::AdapterKind;

pub mod list;
pub mod serve;
pub mod tool;

pub use list::run_list;
pub use serve::run_mcp_server;
pub use tool::run_tool;

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "MCP tool adapters for payments, data, content, browser automation and shared context")]
#[command(version)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one adapter as an MCP server over stdio
    Serve {
        #[arg(value_enum)]
        adapter: AdapterKind,
    },

    /// Print an adapter's tool catalogue as JSON
    List {
        #[arg(value_enum)]
        adapter: AdapterKind,
    },

    /// Execute a tool directly
    Tool {
        #[arg(value_enum)]
        adapter: AdapterKind,

        /// Tool name (e.g. create_payment_intent, query_table)
        name: String,

        /// JSON arguments (e.g. '{"table": "programs", "limit": 5}')
        #[arg(default_value = "{}")]
        args: String,
    },
}

/// Build the adapter for `$kind` from env and config, bind it to `$adapter`
/// and evaluate `$body`. Construction errors propagate with `?`.
macro_rules! with_adapter {
    ($kind:expr, $config:expr, |$adapter:ident| $body:expr) => {
        match $kind {
            AdapterKind::Payments => {
                let $adapter = wayfarer::adapters::payments($config)?;
                $body
            }
            AdapterKind::Store => {
                let $adapter = wayfarer::adapters::store($config)?;
                $body
            }
            AdapterKind::Content => {
                let $adapter = wayfarer::adapters::content($config)?;
                $body
            }
            AdapterKind::Browser => {
                let $adapter = wayfarer::adapters::browser($config);
                $body
            }
            AdapterKind::Context => {
                let $adapter = wayfarer::adapters::context($config).await?;
                $body
            }
        }
    };
}

pub(crate) use with_adapter;
