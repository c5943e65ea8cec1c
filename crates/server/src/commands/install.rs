//! Precache the manifest into the current generation.

use anyhow::Result;
use serde::Serialize;

use portico_core::AppConfig;

use super::{open_gateway, print_json};

#[derive(Debug, Serialize)]
struct InstallOutput {
    generation: String,
    precached: usize,
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let gateway = open_gateway(config).await?;
    let precached = gateway.install().await?;
    print_json(&InstallOutput { generation: config.generation.clone(), precached })
}
