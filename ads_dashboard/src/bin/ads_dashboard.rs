use std::{path::PathBuf, sync::Arc, time::Duration};

use ads_dashboard::{
    accounts::summarize_accounts,
    config::{DashboardConfig, load_config_path},
    export::export_table,
    forecast::{MAX_HORIZON_DAYS, daily_series, forecast_linear},
    format::{format_currency, format_metric, format_percent},
    metrics::{GroupBy, Metric},
    pipeline::ConnectorRefresher,
    scheduler::{Refresher, run_refresh, spawn_auto_refresh},
    state::{Phase, Snapshot, StateStore},
};
use ads_ingestor::models::date_range::DateRange;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Marketing dashboard for Google Ads and Meta Ads")]
struct Cli {
    /// Dashboard configuration file (TOML).
    #[arg(long, value_name = "FILE", default_value = "dashboard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// KPI cards with deltas and statuses for the reporting window.
    Report {
        /// Print the full report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Write one grouped table to CSV and print its path.
    Export {
        #[arg(long, value_name = "VIEW", default_value = "campaign")]
        group_by: GroupBy,
        /// Locale-formatted cells instead of raw numbers.
        #[arg(long)]
        display: bool,
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Linear trend forecast of a daily metric.
    Forecast {
        #[arg(long, default_value = "spend")]
        metric: Metric,
        #[arg(
            long,
            default_value_t = 7,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_HORIZON_DAYS))
        )]
        days: u32,
    },
    /// Refresh on the configured interval until Ctrl-C.
    Watch,
    /// Per-account Meta Ads summary with purchase flags.
    Accounts,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config_path(&cli.config)?;

    match cli.cmd {
        Cmd::Report { json } => {
            let snapshot = refresh_once(&config).await?;
            let Some(report) = &snapshot.report else {
                bail!("no report was produced");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(report.as_ref())?);
            } else {
                print!("{}", report.render_text());
            }
        }
        Cmd::Export {
            group_by,
            display,
            out_dir,
        } => {
            let snapshot = refresh_once(&config).await?;
            let Some(report) = &snapshot.report else {
                bail!("no report was produced");
            };
            let path = export_table(report.table(group_by), group_by, display, out_dir.as_deref())?;
            println!("{}", path.display());
        }
        Cmd::Forecast { metric, days } => {
            let snapshot = refresh_once(&config).await?;
            let history = daily_series(snapshot.current.iter(), metric);
            match forecast_linear(&history, days) {
                Some(forecast) => {
                    for point in &forecast.points {
                        println!("{}  {}", point.date, format_metric(metric, point.value));
                    }
                }
                None => println!(
                    "Forecast unavailable: {} days of history, at least 3 needed.",
                    history.len()
                ),
            }
        }
        Cmd::Watch => watch_loop(&config).await?,
        Cmd::Accounts => {
            let client = config.meta_client()?;
            let accounts = config.meta_accounts()?;
            if accounts.is_empty() {
                bail!("no [accounts] configured");
            }
            let today = config.today();
            let range = DateRange::last_n_days(today, config.window_days)?;
            let report = summarize_accounts(&client, &accounts, &range, today).await;

            for s in &report.summaries {
                let flag = s
                    .purchases
                    .as_ref()
                    .map(|p| format!("{:?} ({} purchases/90d)", p.flag, p.total_purchases))
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "{:<28} {:>3} campaigns  spend {:>14}  conv {:>6}  CTR {:>8}  ROAS {:>5.2}  {}",
                    s.name,
                    s.campaigns,
                    format_currency(s.totals.spend),
                    s.totals.conversions,
                    format_percent(s.derived.ctr),
                    s.derived.roas,
                    flag,
                );
            }
            for (name, err) in &report.failures {
                eprintln!("{name}: {err}");
            }
            if report.summaries.is_empty() {
                bail!("no account could be read");
            }
        }
    }

    Ok(())
}

fn refresher(config: &DashboardConfig) -> Result<ConnectorRefresher> {
    ConnectorRefresher::from_config(config).context("set up data sources")
}

async fn refresh_once(config: &DashboardConfig) -> Result<Arc<Snapshot>> {
    let store = StateStore::new(false);
    let refresher = refresher(config)?;
    run_refresh(&store, &refresher).await;
    let snapshot = store.snapshot();
    if let Phase::Error(message) = &snapshot.phase {
        bail!("refresh failed: {message}");
    }
    for w in &snapshot.warnings {
        warn!("{w}");
    }
    Ok(snapshot)
}

async fn watch_loop(config: &DashboardConfig) -> Result<()> {
    let store = Arc::new(StateStore::new(config.refresh.auto));
    let refresher: Arc<dyn Refresher> = Arc::new(refresher(config)?);

    run_refresh(&store, refresher.as_ref()).await;
    print_snapshot(&store.snapshot());

    if !config.refresh.auto {
        info!("auto refresh is off in the configuration; enabling it for this session");
        store.set_auto_refresh(true);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn_auto_refresh(
        Arc::clone(&store),
        Arc::clone(&refresher),
        config.refresh_interval(),
        shutdown_rx,
    );

    follow_snapshots(&store, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;

    info!("shutting down");
    let _ = shutdown_tx.send(true);
    handle.await.context("auto refresh task")?;
    Ok(())
}

/// Prints every settled snapshot until `shutdown` resolves.
async fn follow_snapshots(store: &StateStore, shutdown: impl Future<Output = ()>) {
    let mut shown = store.snapshot();
    let mut poll = tokio::time::interval(Duration::from_secs(1));
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = poll.tick() => {
                let snapshot = store.snapshot();
                if snapshot.phase != Phase::Fetching && !Arc::ptr_eq(&snapshot, &shown) {
                    print_snapshot(&snapshot);
                    shown = snapshot;
                }
            }
        }
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    match (&snapshot.phase, &snapshot.report) {
        (Phase::Error(message), _) => eprintln!("refresh failed: {message}"),
        (_, Some(report)) => {
            if let Some(at) = snapshot.last_refresh {
                println!("== {} ==", at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            print!("{}", report.render_text());
        }
        _ => println!("No data for the selected period."),
    }
}
