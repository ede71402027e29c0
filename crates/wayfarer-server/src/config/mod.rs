// crates/wayfarer-server/src/config/mod.rs
// Configuration: environment credentials and the optional config file

pub mod env;
pub mod file;

pub use env::{ContentCredentials, PaymentsCredentials, StoreCredentials};
pub use file::{BrowserSettings, ContextSettings, HttpSettings, WayfarerConfig};
