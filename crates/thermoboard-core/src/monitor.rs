// ── Monitor: the sync engine's lifecycle ──
//
// Reconciles three independently timed sources -- the one-shot roster
// load, the periodic config poll, and the unbounded live stream -- into
// one consistent roster. A single driver task owns the roster and handles
// every trigger to completion before the next, so readers never observe a
// half-applied mutation and the roster needs no locks.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use thermoboard_api::{Config, ScreeningServer, UpdateEvent};

use crate::error::CoreError;
use crate::model::Slot;
use crate::notify::{ChangeNotifier, RosterChange};
use crate::store::{ApplyOutcome, Roster};
use crate::stream::SlotStream;

const COMMAND_CHANNEL_SIZE: usize = 16;
const FAULT_CHANNEL_SIZE: usize = 16;

// ── MonitorSettings ──────────────────────────────────────────────────

/// Timing knobs for the monitor's periodic work.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Period of the global config poll.
    pub config_refresh: Duration,
    /// Period of the staleness evaluation tick.
    pub staleness_tick: Duration,
    /// Age, in seconds, after which a reading is flagged stale.
    pub staleness_budget_secs: i64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            config_refresh: Duration::from_secs(10),
            staleness_tick: Duration::from_secs(1),
            staleness_budget_secs: 60,
        }
    }
}

// ── Monitor ──────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. [`start`](Self::start) performs the
/// initial load (config, roster, backfill, subscription) and spawns the
/// driver task; [`shutdown`](Self::shutdown) tears down the subscription
/// and both timers in one operation.
pub struct Monitor<S: ScreeningServer> {
    inner: Arc<MonitorInner<S>>,
}

impl<S: ScreeningServer> Clone for Monitor<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct MonitorInner<S> {
    server: S,
    settings: MonitorSettings,
    /// Current global config; wholesale replace on refresh, lock-free read.
    config: ArcSwapOption<Config>,
    /// Latest roster snapshot, republished after every mutation.
    slots: watch::Sender<Arc<Vec<Slot>>>,
    notifier: ChangeNotifier,
    fault_tx: broadcast::Sender<Arc<CoreError>>,
    command_tx: mpsc::Sender<MonitorCommand>,
    command_rx: Mutex<Option<mpsc::Receiver<MonitorCommand>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

enum MonitorCommand {
    /// Re-fetch the device list and rebuild the roster wholesale.
    Reload {
        respond: oneshot::Sender<Result<(), CoreError>>,
    },
    /// Refresh the config now. Does not reset the periodic poll.
    RefreshConfig {
        respond: oneshot::Sender<Result<(), CoreError>>,
    },
}

impl<S: ScreeningServer> Monitor<S> {
    /// Create a monitor over a server connection. Does not fetch anything --
    /// call [`start`](Self::start).
    pub fn new(server: S, settings: MonitorSettings) -> Self {
        let (slots, _) = watch::channel(Arc::new(Vec::new()));
        let (fault_tx, _) = broadcast::channel(FAULT_CHANNEL_SIZE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(MonitorInner {
                server,
                settings,
                config: ArcSwapOption::const_empty(),
                slots,
                notifier: ChangeNotifier::new(),
                fault_tx,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Perform the initial load and spawn the driver task.
    ///
    /// Startup order: config, device list, last-person backfill, live
    /// subscription. Config/device/subscribe failures abort the start
    /// (there is no previous state to fall back on); a backfill failure is
    /// reported on the fault channel and startup continues.
    pub async fn start(&self) -> Result<(), CoreError> {
        let Some(command_rx) = self.inner.command_rx.lock().await.take() else {
            return Err(CoreError::AlreadyStarted);
        };

        match self.initial_load().await {
            Ok((roster, updates)) => {
                let monitor = self.clone();
                let handle = tokio::spawn(driver_task(monitor, roster, updates, command_rx));
                self.inner.task_handles.lock().await.push(handle);
                info!("monitor started");
                Ok(())
            }
            Err(e) => {
                // Hand the receiver back so the caller can retry `start`.
                *self.inner.command_rx.lock().await = Some(command_rx);
                Err(e)
            }
        }
    }

    async fn initial_load(&self) -> Result<(Roster, S::Updates), CoreError> {
        let config = self.refresh_config().await?;
        let roster = self.load_roster(&config).await?;
        self.publish(&roster);
        self.inner.notifier.notify_all();

        let updates = self.inner.server.subscribe_updates().await?;
        Ok((roster, updates))
    }

    /// Stop the subscription and both timers together, then join the
    /// driver task. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("monitor stopped");
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Re-fetch the device list and rebuild the roster wholesale.
    pub async fn reload(&self) -> Result<(), CoreError> {
        self.command(|respond| MonitorCommand::Reload { respond }).await
    }

    /// Refresh the config out of band. The periodic poll keeps its phase.
    pub async fn refresh_config_now(&self) -> Result<(), CoreError> {
        self.command(|respond| MonitorCommand::RefreshConfig { respond })
            .await
    }

    async fn command<F>(&self, make: F) -> Result<(), CoreError>
    where
        F: FnOnce(oneshot::Sender<Result<(), CoreError>>) -> MonitorCommand,
    {
        // Before `start` the driver does not exist; a queued command would
        // never be answered.
        if self.inner.command_rx.lock().await.is_some() {
            return Err(CoreError::NotReady);
        }
        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(make(tx))
            .await
            .map_err(|_| CoreError::Stopped)?;
        rx.await.map_err(|_| CoreError::Stopped)?
    }

    // ── State observation ────────────────────────────────────────────

    /// The latest roster snapshot (cheap `Arc` clone, wait-free).
    pub fn slots(&self) -> Arc<Vec<Slot>> {
        self.inner.slots.borrow().clone()
    }

    /// Read-only view of one slot by grid position.
    pub fn slot(&self, index: usize) -> Option<Slot> {
        self.slots().get(index).cloned()
    }

    /// Current global config, `None` before the first successful load.
    pub fn config(&self) -> Option<Config> {
        self.inner.config.load_full().as_deref().copied()
    }

    /// Subscribe to change notifications (last-value semantics).
    pub fn changes(&self) -> watch::Receiver<RosterChange> {
        self.inner.notifier.subscribe()
    }

    /// Subscribe to roster snapshots.
    pub fn watch_slots(&self) -> SlotStream {
        SlotStream::new(self.inner.slots.subscribe())
    }

    /// Subscribe to fault reports. Each failed server operation is
    /// reported exactly once; the monitor itself never retries.
    pub fn faults(&self) -> broadcast::Receiver<Arc<CoreError>> {
        self.inner.fault_tx.subscribe()
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Fetch the config and replace the stored value wholesale. On error
    /// the previous value is retained.
    async fn refresh_config(&self) -> Result<Config, CoreError> {
        let fetched = self.inner.server.fetch_config().await?;
        if !fetched.is_valid() {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "min {} must be below max {}",
                    fetched.min_temperature, fetched.max_temperature
                ),
            });
        }
        let config = fetched.normalized();
        self.inner.config.store(Some(Arc::new(config)));
        Ok(config)
    }

    /// Build a fresh roster from the device list and backfill it with the
    /// last screened persons. Backfill failure is a non-fatal fault.
    async fn load_roster(&self, config: &Config) -> Result<Roster, CoreError> {
        let devices = self.inner.server.fetch_devices().await?;
        let mut roster = Roster::build(&devices, config, self.inner.settings.staleness_budget_secs);
        debug!(
            devices = devices.len(),
            slots = roster.len(),
            "roster built"
        );

        match self.inner.server.fetch_last_persons().await {
            Ok(persons) => {
                for person in persons {
                    roster.apply_initial_person(&person);
                }
            }
            Err(e) => self.report_fault(CoreError::Server(e)),
        }
        Ok(roster)
    }

    fn publish(&self, roster: &Roster) {
        let snapshot = Arc::new(roster.slots().to_vec());
        self.inner.slots.send_modify(|s| *s = snapshot);
    }

    fn report_fault(&self, error: CoreError) {
        warn!(error = %error, "server operation failed");
        let _ = self.inner.fault_tx.send(Arc::new(error));
    }
}

// ── Driver task ──────────────────────────────────────────────────────

/// Owns the roster and serializes all mutation: config poll, staleness
/// tick, live events and commands interleave cooperatively, each running
/// to completion before the next is processed.
async fn driver_task<S: ScreeningServer>(
    monitor: Monitor<S>,
    mut roster: Roster,
    updates: S::Updates,
    mut commands: mpsc::Receiver<MonitorCommand>,
) {
    let cancel = monitor.inner.cancel.clone();
    let settings = monitor.inner.settings.clone();

    let mut config_timer = tokio::time::interval(settings.config_refresh);
    let mut staleness_timer = tokio::time::interval(settings.staleness_tick);
    // Consume the immediate first tick of each interval.
    config_timer.tick().await;
    staleness_timer.tick().await;

    // Becomes `None` once the server drops the subscription; the timers
    // keep running so already-loaded data still ages.
    let mut updates = Some(updates);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,

            _ = config_timer.tick() => {
                monitor.poll_config(&mut roster).await;
            }

            _ = staleness_timer.tick() => {
                let newly_stale = roster.evaluate_staleness(Utc::now());
                if !newly_stale.is_empty() {
                    monitor.publish(&roster);
                    for device_id in newly_stale {
                        monitor.inner.notifier.notify_device(device_id);
                    }
                }
            }

            event = next_event(&mut updates), if updates.is_some() => {
                match event {
                    Some(event) => monitor.apply_live_event(&mut roster, &event),
                    None => {
                        monitor.report_fault(CoreError::Server(
                            thermoboard_api::ApiError::SubscriptionClosed,
                        ));
                        updates = None;
                    }
                }
            }

            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    MonitorCommand::Reload { respond } => {
                        let result = monitor.reload_into(&mut roster).await;
                        let _ = respond.send(result);
                    }
                    MonitorCommand::RefreshConfig { respond } => {
                        let result = monitor.refresh_and_restamp(&mut roster).await;
                        let _ = respond.send(result);
                    }
                }
            }
        }
    }
}

async fn next_event<U>(updates: &mut Option<U>) -> Option<UpdateEvent>
where
    U: futures_core::Stream<Item = UpdateEvent> + Send + Unpin,
{
    match updates.as_mut() {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

impl<S: ScreeningServer> Monitor<S> {
    /// One periodic config poll. A fetch failure keeps the previous value
    /// and reports the fault; a changed value re-stamps the roster.
    async fn poll_config(&self, roster: &mut Roster) {
        let previous = self.config();
        match self.refresh_config().await {
            Ok(config) => {
                if previous != Some(config) {
                    roster.restamp(&config);
                    self.publish(roster);
                    self.inner.notifier.notify_all();
                    debug!(
                        capacity = config.capacity,
                        max = config.max_temperature,
                        min = config.min_temperature,
                        "config changed, roster re-stamped"
                    );
                }
            }
            Err(e) => self.report_fault(e),
        }
    }

    async fn refresh_and_restamp(&self, roster: &mut Roster) -> Result<(), CoreError> {
        let previous = self.config();
        let config = self.refresh_config().await?;
        if previous != Some(config) {
            roster.restamp(&config);
            self.publish(roster);
            self.inner.notifier.notify_all();
        }
        Ok(())
    }

    /// Full reload: new device list, new roster, fresh backfill. The
    /// published snapshot swaps atomically from the old roster to the new.
    async fn reload_into(&self, roster: &mut Roster) -> Result<(), CoreError> {
        let config = self.config().ok_or(CoreError::NotReady)?;
        let next = self.load_roster(&config).await?;
        *roster = next;
        self.publish(roster);
        self.inner.notifier.notify_all();
        Ok(())
    }

    /// Apply one live event in arrival order and notify on success.
    fn apply_live_event(&self, roster: &mut Roster, event: &UpdateEvent) {
        match roster.apply_event(event) {
            ApplyOutcome::Applied { device_id } => {
                self.publish(roster);
                self.inner.notifier.notify_device(device_id);
            }
            ApplyOutcome::NoMatch { .. }
            | ApplyOutcome::BadgeMismatch { .. }
            | ApplyOutcome::Placeholder => {
                // Defined drop rules; diagnostics are emitted by the roster.
            }
        }
    }
}
