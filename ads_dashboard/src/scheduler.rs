//! Background auto-refresh.
//!
//! A tokio interval triggers [`run_refresh`]; each tick is skipped unless
//! the current snapshot has auto refresh switched on. The task stops when
//! the shutdown channel changes to `true` or is dropped.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info};

use crate::state::{RefreshOutcome, StateStore};

/// Produces a fresh dataset and report.
#[async_trait]
pub trait Refresher: Send + Sync {
    async fn refresh(&self) -> anyhow::Result<RefreshOutcome>;
}

/// Runs one refresh through the store's transitions. Returns whether it
/// succeeded.
pub async fn run_refresh(store: &StateStore, refresher: &dyn Refresher) -> bool {
    store.begin_refresh();
    match refresher.refresh().await {
        Ok(outcome) => {
            store.complete_refresh(outcome);
            true
        }
        Err(e) => {
            store.fail_refresh(format!("{e:#}"));
            false
        }
    }
}

pub fn spawn_auto_refresh(
    store: Arc<StateStore>,
    refresher: Arc<dyn Refresher>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_secs = period.as_secs(), "auto refresh task started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if store.snapshot().auto_refresh {
                        run_refresh(&store, refresher.as_ref()).await;
                    } else {
                        debug!("auto refresh disabled, skipping tick");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("auto refresh task stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;

    use super::*;
    use crate::{report::DashboardReport, state::Phase, status::Benchmarks};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Refresher for Counting {
        async fn refresh(&self) -> anyhow::Result<RefreshOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("connector unreachable");
            }
            Ok(RefreshOutcome {
                records: vec![],
                report: DashboardReport::build(&[], &[], &Benchmarks::default()),
                warnings: vec![],
            })
        }
    }

    #[tokio::test]
    async fn run_refresh_records_failure() {
        let store = StateStore::default();
        let refresher = Counting {
            fail: true,
            ..Counting::default()
        };
        assert!(!run_refresh(&store, &refresher).await);
        assert_eq!(
            store.snapshot().phase,
            Phase::Error("connector unreachable".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_only_while_enabled() {
        let store = Arc::new(StateStore::new(true));
        let refresher = Arc::new(Counting::default());
        let (tx, rx) = watch::channel(false);

        let handle = spawn_auto_refresh(
            store.clone(),
            refresher.clone(),
            Duration::from_secs(300),
            rx,
        );

        tokio::time::sleep(Duration::from_secs(610)).await;
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);

        store.set_auto_refresh(false);
        tokio::time::sleep(Duration::from_secs(900)).await;
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);

        tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(store.snapshot().phase, Phase::Ready);
    }
}
