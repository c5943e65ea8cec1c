//! Command-line interface definition.

use clap::{Parser, Subcommand};

/// Offline-first cache gateway for static sites.
#[derive(Debug, Parser)]
#[command(name = "portico", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Precache the manifest into the current generation.
    Install,

    /// Purge stale generations and claim open clients.
    Activate,

    /// Fetch a URL through the gateway, cache-first.
    Get {
        /// Site-relative path or absolute URL.
        url: String,

        /// Request destination: document, style, script, image, font,
        /// data, or other.
        #[arg(long, default_value = "document")]
        destination: String,
    },

    /// Show cache generations and entry counts.
    Status,

    /// Read or write persisted site preferences.
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum PrefsAction {
    /// Print the stored value for a key.
    Get {
        key: String,

        /// JSON value returned when the key is absent.
        #[arg(long, default_value = "null")]
        default: String,
    },

    /// Store a value under a key. The value is parsed as JSON, falling
    /// back to a plain string.
    Set { key: String, value: String },

    /// Delete a key.
    Remove { key: String },
}
