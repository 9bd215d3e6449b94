use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::poller::{PollOutcome, Poller};

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Repeating poll task. The first cycle runs as soon as it is started; cycles
/// never overlap, and a tick that comes due mid-cycle is skipped.
pub struct Scheduler {
    poller: Arc<Poller>,
    period: Duration,
    running: Mutex<Option<Running>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Scheduler {
    pub fn new(poller: Arc<Poller>, period: Duration) -> Self {
        Self {
            poller,
            period,
            running: Mutex::new(None),
        }
    }

    pub fn poller(&self) -> &Arc<Poller> {
        &self.poller
    }

    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }

    /// Spawn the poll loop with the first cycle due now. Returns false if it
    /// is already running.
    pub fn start(&self) -> bool {
        self.start_after(Duration::ZERO)
    }

    /// Like `start`, but the first cycle is due after `delay`.
    pub fn start_after(&self, delay: Duration) -> bool {
        let mut slot = self.slot();
        if slot.is_some() {
            warn!("Poll loop for device {} already running", self.poller.device_id());
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.poller),
            Instant::now() + delay,
            self.period,
            cancel.clone(),
        ));
        info!(
            "Polling Pushover every {:?} for device {}",
            self.period,
            self.poller.device_id()
        );
        *slot = Some(Running { cancel, handle });
        true
    }

    /// Stop the loop. A cycle already in progress is allowed to finish.
    pub async fn stop(&self) {
        let running = self.slot().take();
        let Some(Running { cancel, handle }) = running else {
            return;
        };

        cancel.cancel();
        if let Err(e) = handle.await {
            warn!("Poll loop ended abnormally: {}", e);
        }
        info!("Stopped polling for device {}", self.poller.device_id());
    }

    /// Manual refresh. Waits for any cycle in progress, then runs one more.
    pub async fn trigger_now(&self) -> PollOutcome {
        self.poller.poll().await
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn poll_loop(
    poller: Arc<Poller>,
    first: Instant,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let outcome = poller.poll().await;
        debug!("Poll cycle for device {} finished: {:?}", poller.device_id(), outcome);
    }
}
