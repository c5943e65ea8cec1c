//! Command implementations.
//!
//! Each command prints a JSON result on stdout; logs go to stderr.

pub mod activate;
pub mod get;
pub mod install;
pub mod prefs;
pub mod status;

use anyhow::Result;
use serde::Serialize;

use portico_client::{HttpNetwork, NetConfig};
use portico_core::{AppConfig, CacheDb, Gateway};

pub(crate) async fn open_db(config: &AppConfig) -> Result<CacheDb> {
    Ok(CacheDb::open(&config.db_path).await?)
}

pub(crate) async fn open_gateway(config: &AppConfig) -> Result<Gateway<HttpNetwork>> {
    let gw_config = config.gateway()?;
    let net_config = NetConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        max_redirects: config.max_redirects,
    };
    let network = HttpNetwork::new(gw_config.origin.clone(), net_config)?;
    let db = open_db(config).await?;
    Ok(Gateway::new(db, network, gw_config))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
