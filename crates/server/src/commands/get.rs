//! Fetch a URL through the gateway, cache-first.

use anyhow::Result;
use serde::Serialize;

use portico_client::resolve;
use portico_core::{AppConfig, Destination, Request};

use super::{open_gateway, print_json};

#[derive(Debug, Serialize)]
struct GetOutput {
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
}

pub async fn run(config: &AppConfig, url: &str, destination: &str) -> Result<()> {
    let destination: Destination = destination.parse().map_err(anyhow::Error::msg)?;
    let origin = config.origin_url()?;
    let resolved = resolve(&origin, url)?;
    let request = Request::get(resolved).with_destination(destination);

    let gateway = open_gateway(config).await?;
    let outcome = gateway.handle(&request).await?;

    let output = match outcome.response() {
        Some(response) => GetOutput {
            source: outcome.source(),
            status: Some(response.status),
            content_type: response.content_type().map(String::from),
            bytes: Some(response.body.len()),
        },
        None => GetOutput { source: outcome.source(), status: None, content_type: None, bytes: None },
    };

    // This process is the gateway's host; settle background cache writes
    // before exiting instead of abandoning them.
    gateway.drain_writes().await;

    print_json(&output)
}
