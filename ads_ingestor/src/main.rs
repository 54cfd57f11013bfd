use std::error::Error;

use ads_ingestor::{
    cli::{
        commands::{Cli, Commands},
        params::{parse_items_from_file, parse_range},
    },
    io::sink::{CsvFileSink, DataSink},
    models::{platform::Platform, request_params::ReportRequest},
    providers::{
        ReportSource,
        connector::{ConnectorParams, ConnectorSource},
    },
    webhook::{RequestKind, WebhookClient, WebhookPayload},
};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            platform,
            url,
            api_key_env,
            accounts,
            since,
            until,
            days,
            out_dir,
        } => {
            let platform: Platform = platform.parse()?;
            let range = parse_range(
                since.as_deref(),
                until.as_deref(),
                days,
                Local::now().date_naive(),
            )?;
            let params = ConnectorParams {
                accounts: accounts
                    .map(|a| a.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default(),
                ..ConnectorParams::default()
            };

            let source = ConnectorSource::from_env(platform, &url, &api_key_env, params)?;
            let records = source.fetch_records(&ReportRequest::new(range)).await?;

            let label = match platform {
                Platform::GoogleAds => "google_ads",
                Platform::MetaAds => "meta_ads",
            };
            let sink = match out_dir {
                Some(dir) => CsvFileSink::in_dir(label, dir),
                None => CsvFileSink::temp(label),
            };
            let path = sink.write(&records).await?;

            // Paths go to stdout; logs stay on stderr for machine parsing.
            println!("{}", path.display());
            eprintln!("SUMMARY: {} rows from {}", records.len(), source.name());
        }

        Commands::Submit { kind, input, url } => {
            let kind: RequestKind = kind.parse()?;
            let items = parse_items_from_file(&input)?;
            let client = WebhookClient::new(&url)?;
            let payload = WebhookPayload::new(kind, items);
            client.submit(&payload).await?;
            eprintln!("SUMMARY: {} items submitted as {}", payload.dados.len(), kind);
        }
    }
    Ok(())
}
