//! Read and write persisted site preferences.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use portico_core::{AppConfig, Prefs};

use crate::cli::PrefsAction;

use super::{open_db, print_json};

#[derive(Debug, Serialize)]
struct RemoveOutput {
    key: String,
    removed: bool,
}

/// Parse CLI input as JSON, falling back to a plain string so
/// `portico prefs set theme dark` works without quoting gymnastics.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub async fn run(config: &AppConfig, action: &PrefsAction) -> Result<()> {
    let prefs = Prefs::new(open_db(config).await?);

    match action {
        PrefsAction::Get { key, default } => {
            let value = prefs.get(key, parse_value(default)).await?;
            print_json(&value)
        }
        PrefsAction::Set { key, value } => {
            let value = parse_value(value);
            prefs.set(key, &value).await?;
            print_json(&value)
        }
        PrefsAction::Remove { key } => {
            let removed = prefs.remove(key).await?;
            print_json(&RemoveOutput { key: key.clone(), removed })
        }
    }
}
