// crates/wayfarer-server/src/adapters/context.rs
// Shared-context adapter: a single JSON document shared by the site's agents
//
// Each mutator is a whole-document read-modify-write. Writes are atomic
// (temp file + rename) but there is no lock across the cycle: one writer
// process per document is assumed.

use crate::args::Arguments;
use crate::catalogue::Operation;
use crate::dispatch::{Adapter, Output, ResourceDescriptor};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use strum::{AsRefStr, EnumIter, EnumString};
use tracing::{debug, info};
use wayfarer_types::{ContextRecord, FieldSpec, FieldType, RecentAction};

pub const STATE_RESOURCE_URI: &str = "context://application/state";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ContextOp {
    GetContext,
    SetCurrentUser,
    SetCurrentPage,
    AddAction,
    SetAppState,
    ClearContext,
}

impl Operation for ContextOp {
    fn description(self) -> &'static str {
        match self {
            ContextOp::GetContext => "Read the whole shared context document.",
            ContextOp::SetCurrentUser => "Set the current user (any JSON value, null to sign out).",
            ContextOp::SetCurrentPage => "Set the page the visitor is currently on.",
            ContextOp::AddAction => "Record a recent action. Only the 50 most recent are kept.",
            ContextOp::SetAppState => "Set one application-state key.",
            ContextOp::ClearContext => "Reset the document to its empty default.",
        }
    }

    fn input_shape(self) -> Vec<FieldSpec> {
        use FieldType::*;
        match self {
            ContextOp::GetContext | ContextOp::ClearContext => vec![],
            ContextOp::SetCurrentUser => vec![FieldSpec::required("user", Any, "User object")],
            ContextOp::SetCurrentPage => vec![FieldSpec::required("page", String, "Page path or name")],
            ContextOp::AddAction => vec![
                FieldSpec::required("action", String, "Action name"),
                FieldSpec::optional("details", Any, "Extra data about the action"),
            ],
            ContextOp::SetAppState => vec![
                FieldSpec::required("key", String, "State key"),
                FieldSpec::required("value", Any, "State value"),
            ],
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Persistent JSON document on local disk
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the default document if none exists. Does not parse an existing one.
    pub async fn ensure(&self) -> Result<()> {
        if !tokio::fs::try_exists(&self.path).await? {
            info!(path = %self.path.display(), "Creating shared context document");
            self.save(&ContextRecord::empty(now())).await?;
        }
        Ok(())
    }

    /// Load the document, creating the default one on first run
    pub async fn load(&self) -> Result<ContextRecord> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Creating shared context document");
                let record = ContextRecord::empty(now());
                self.save(&record).await?;
                Ok(record)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the document atomically
    pub async fn save(&self, record: &ContextRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "Shared context saved");
        Ok(())
    }

    /// Read-modify-write with a timestamp refresh
    pub async fn update(&self, apply: impl FnOnce(&mut ContextRecord)) -> Result<ContextRecord> {
        let mut record = self.load().await?;
        apply(&mut record);
        record.timestamp = now();
        self.save(&record).await?;
        Ok(record)
    }

    pub async fn reset(&self) -> Result<ContextRecord> {
        let record = ContextRecord::empty(now());
        self.save(&record).await?;
        Ok(record)
    }
}

pub struct ContextAdapter {
    store: ContextStore,
}

impl ContextAdapter {
    /// Open the document at `path`, creating it if absent. An unreadable
    /// document fails each invocation until `clear_context` rewrites it.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = ContextStore::new(path);
        store.ensure().await?;
        Ok(Self { store })
    }
}

#[async_trait]
impl Adapter for ContextAdapter {
    type Op = ContextOp;

    fn name(&self) -> &'static str {
        "context"
    }

    async fn invoke(&mut self, op: ContextOp, args: &Arguments) -> Result<Output> {
        match op {
            ContextOp::GetContext => {
                let record = self.store.load().await?;
                Ok(Output::Json(serde_json::to_value(record)?))
            }
            ContextOp::SetCurrentUser => {
                let user = args.value("user")?.clone();
                let user = (!user.is_null()).then_some(user);
                let signed_out = user.is_none();
                self.store.update(|record| record.current_user = user).await?;
                Ok(Output::text(if signed_out {
                    "Current user cleared"
                } else {
                    "Current user updated"
                }))
            }
            ContextOp::SetCurrentPage => {
                let page = args.str("page")?.to_string();
                let message = format!("Current page set to {page}");
                self.store.update(|record| record.current_page = Some(page)).await?;
                Ok(Output::Text(message))
            }
            ContextOp::AddAction => {
                let action = RecentAction {
                    action: args.str("action")?.to_string(),
                    details: args.opt_value("details").cloned(),
                    timestamp: now(),
                };
                let name = action.action.clone();
                let record = self.store.update(|record| record.push_action(action)).await?;
                Ok(Output::Text(format!(
                    "Action '{name}' recorded ({} recent actions)",
                    record.recent_actions.len()
                )))
            }
            ContextOp::SetAppState => {
                let key = args.str("key")?.to_string();
                let value = args.value("value")?.clone();
                let message = format!("Application state '{key}' updated");
                self.store
                    .update(|record| {
                        record.application_state.insert(key, value);
                    })
                    .await?;
                Ok(Output::Text(message))
            }
            ContextOp::ClearContext => {
                self.store.reset().await?;
                Ok(Output::text("Context cleared"))
            }
        }
    }

    fn resources(&self) -> Vec<ResourceDescriptor> {
        vec![ResourceDescriptor {
            uri: STATE_RESOURCE_URI.to_string(),
            name: "application-state".to_string(),
            title: "Shared Application State".to_string(),
            description: "Current user, current page, recent actions and application state".to_string(),
            mime_type: "application/json".to_string(),
        }]
    }

    async fn read_resource(&mut self, uri: &str) -> Result<Option<String>> {
        if uri != STATE_RESOURCE_URI {
            return Ok(None);
        }
        let record = self.store.load().await?;
        Ok(Some(serde_json::to_string_pretty(&record)?))
    }
}
