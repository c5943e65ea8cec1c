//! Report cache generations and entry counts.

use anyhow::Result;
use serde::Serialize;

use portico_core::AppConfig;

use super::{open_db, print_json};

#[derive(Debug, Serialize)]
struct GenerationStatus {
    name: String,
    entries: u64,
    current: bool,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    generation: String,
    origin: String,
    db_path: String,
    generations: Vec<GenerationStatus>,
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let db = open_db(config).await?;

    let mut generations = Vec::new();
    for name in db.generations().await? {
        let entries = db.entry_count(&name).await?;
        let current = name == config.generation;
        generations.push(GenerationStatus { name, entries, current });
    }

    print_json(&StatusOutput {
        generation: config.generation.clone(),
        origin: config.origin.clone(),
        db_path: config.db_path.display().to_string(),
        generations,
    })
}
