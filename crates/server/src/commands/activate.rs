//! Purge stale generations and claim open clients.

use anyhow::Result;
use serde::Serialize;

use portico_core::AppConfig;

use super::{open_gateway, print_json};

#[derive(Debug, Serialize)]
struct ActivateOutput {
    generation: String,
    purged: Vec<String>,
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let gateway = open_gateway(config).await?;
    let purged = gateway.activate().await?;
    print_json(&ActivateOutput { generation: config.generation.clone(), purged })
}
