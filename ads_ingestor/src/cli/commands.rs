use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one platform from the reporting connector and write a raw CSV
    Fetch {
        /// Platform to fetch: google or meta
        #[arg(long)]
        platform: String,

        /// Connector endpoint for the platform
        #[arg(long)]
        url: String,

        /// Environment variable holding the connector API key
        #[arg(long, default_value = "ADS_CONNECTOR_API_KEY")]
        api_key_env: String,

        /// Comma-separated account selector passed to the connector
        #[arg(long)]
        accounts: Option<String>,

        /// First day (YYYY-MM-DD); defaults to `--days` before today
        #[arg(long)]
        since: Option<String>,

        /// Last day (YYYY-MM-DD); defaults to today
        #[arg(long)]
        until: Option<String>,

        /// Window length used when `--since` is absent
        #[arg(long, default_value = "30")]
        days: u32,

        /// Output directory; defaults to the system temp directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Post a creation request to the webhook
    Submit {
        /// Request kind: criar_anuncio or criar_campanha
        #[arg(long)]
        kind: String,

        /// JSON file holding the items (an array, or an object with `dados`)
        #[arg(long)]
        input: PathBuf,

        /// Webhook endpoint
        #[arg(long)]
        url: String,
    },
}
