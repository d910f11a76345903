//! Broker implementation

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::MethodRouter;
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::error::BrokerError;
use super::state::CycleState;
use crate::admin::{self, AdminState, ShutdownHook};
use crate::awtrix::{ConfigOption, DisplayConfig};
use crate::device::{DeviceError, DeviceGateway, HttpTransport, Transport};
use crate::routine::Routine;

/// Port the admin server listens on unless told otherwise
pub const DEFAULT_ADMIN_PORT: u16 = 25827;

/// Client-side timeout for every outbound request
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A registered routine
///
/// The name is copied out at registration so panicking tasks can still be
/// reported by name.
struct RoutineSlot {
    name: String,
    routine: Arc<Mutex<Box<dyn Routine>>>,
}

/// Outcome of one poll/merge/push cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Interval the cycle should last for
    pub fastest_interval: Duration,

    /// Time spent fetching and pushing
    pub elapsed: Duration,

    /// Routines whose fetch returned an error
    pub failed: Vec<String>,

    /// Routines whose fetch panicked
    pub panicked: Vec<String>,

    /// Routines whose payload reached the device
    pub pushed: Vec<String>,
}

impl CycleReport {
    /// Remaining time before the next cycle should start
    pub fn sleep_for(&self) -> Duration {
        self.fastest_interval.saturating_sub(self.elapsed)
    }
}

/// Polls routines, merges their settings and pushes everything to one device
pub struct Broker {
    gateway: DeviceGateway,
    routines: Vec<RoutineSlot>,
    state: Arc<Mutex<CycleState>>,
    client: reqwest::Client,
    debug_mode: bool,
    admin_host: IpAddr,
    admin_port: u16,
    handlers: HashMap<String, MethodRouter>,
    shutdown: ShutdownHook,
}

impl Broker {
    /// Create a broker for the device at `address`
    ///
    /// Options are applied in order to build the initial display
    /// configuration. Fails if no routines are given or `address` is not an
    /// IP address.
    pub fn new(
        address: &str,
        routines: Vec<Box<dyn Routine>>,
        options: impl IntoIterator<Item = ConfigOption>,
    ) -> Result<Self, BrokerError> {
        debug!(%address, routine_count = routines.len(), "Broker::new: called");
        if routines.is_empty() {
            return Err(BrokerError::NoRoutines);
        }

        let ip: IpAddr = address.parse().map_err(|_| BrokerError::InvalidAddress {
            address: address.to_string(),
        })?;

        let mut config = DisplayConfig::default();
        for option in options {
            option(&mut config);
        }
        debug!(?config, "Broker::new: initial display config");

        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_client(client.clone()));

        let routines = routines
            .into_iter()
            .map(|routine| RoutineSlot {
                name: routine.name().to_string(),
                routine: Arc::new(Mutex::new(routine)),
            })
            .collect();

        Ok(Self {
            gateway: DeviceGateway::new(ip, transport),
            routines,
            state: Arc::new(Mutex::new(CycleState::new(config))),
            client,
            debug_mode: false,
            admin_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            admin_port: DEFAULT_ADMIN_PORT,
            handlers: HashMap::new(),
            shutdown: admin::exit_process(),
        })
    }

    /// Skip the initial settings push and reboot
    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn with_admin_port(mut self, port: u16) -> Self {
        self.admin_port = port;
        self
    }

    pub fn with_admin_host(mut self, host: IpAddr) -> Self {
        self.admin_host = host;
        self
    }

    /// Reach the device on a non-standard port
    pub fn with_device_port(mut self, port: Option<u16>) -> Self {
        self.gateway = self.gateway.with_port(port);
        self
    }

    /// Replace the client handed to routine fetchers
    ///
    /// Device requests are unaffected; see [`Broker::with_transport`].
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Replace how device requests are performed
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.gateway.set_transport(transport);
        self
    }

    /// Mount an extra handler on the admin server
    pub fn with_handler(mut self, path: impl Into<String>, handler: MethodRouter) -> Self {
        self.handlers.insert(path.into(), handler);
        self
    }

    /// Replace what happens when the shutdown command arrives
    pub fn with_shutdown_hook(mut self, hook: ShutdownHook) -> Self {
        self.shutdown = hook;
        self
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn admin_addr(&self) -> SocketAddr {
        SocketAddr::new(self.admin_host, self.admin_port)
    }

    pub fn routine_names(&self) -> Vec<&str> {
        self.routines.iter().map(|slot| slot.name.as_str()).collect()
    }

    /// Snapshot of the merged display configuration
    pub async fn config(&self) -> DisplayConfig {
        self.state.lock().await.config.clone()
    }

    /// Push the merged configuration with the next transition effect
    pub async fn send_config(&self) -> Result<(), DeviceError> {
        let config = {
            let mut state = self.state.lock().await;
            state.config.advance_transition_effect();
            state.config.clone()
        };
        debug!(?config, "Broker::send_config: called");
        self.gateway.send_config(&config).await
    }

    /// Initial settings push and reboot, skipped in debug mode
    ///
    /// The firmware only applies settings after a restart. Failures are
    /// logged and never stop the broker.
    pub async fn startup(&self) {
        debug!(debug_mode = self.debug_mode, "Broker::startup: called");
        if self.debug_mode {
            info!("Debug mode, skipping initial settings push and device reboot");
            return;
        }

        if let Err(e) = self.send_config().await {
            error!(error = %e, "Failed to push initial display settings");
        }

        info!(address = %self.gateway.address(), "Rebooting device");
        if let Err(e) = self.gateway.reboot().await {
            error!(error = %e, "Failed to reboot device");
        }
    }

    /// Run one poll/merge/push cycle
    pub async fn run_cycle(&self) -> CycleReport {
        debug!(routine_count = self.routines.len(), "Broker::run_cycle: called");
        let start = Instant::now();
        let mut report = CycleReport::default();

        self.state.lock().await.begin_cycle();
        self.fetch_all(&mut report).await;
        report.fastest_interval = self.state.lock().await.cycle_interval();

        if let Err(e) = self.send_config().await {
            error!(error = %e, "Failed to push display settings");
        }
        self.push_all(&mut report).await;

        report.elapsed = start.elapsed();
        report
    }

    /// Fetch every routine concurrently, each in its own task
    ///
    /// A routine's settings are merged under the shared lock as soon as its
    /// fetch completes, so fields requested by several routines end up with
    /// whichever value was merged last.
    async fn fetch_all(&self, report: &mut CycleReport) {
        let mut tasks = JoinSet::new();
        let mut names = HashMap::new();

        for slot in &self.routines {
            let routine = Arc::clone(&slot.routine);
            let state = Arc::clone(&self.state);
            let client = self.client.clone();

            let handle = tasks.spawn(async move {
                let mut routine = routine.lock().await;
                let fetched = match routine.fetch(&client).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!(routine = %routine.name(), error = %e, "Fetch failed, keeping previous data");
                        false
                    }
                };

                state.lock().await.fold(routine.global_config(), routine.poll_rate());
                fetched
            });
            names.insert(handle.id(), slot.name.clone());
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, true)) => {}
                Ok((id, false)) => {
                    report.failed.push(names.get(&id).cloned().unwrap_or_default());
                }
                Err(e) => {
                    let name = names.get(&e.id()).cloned().unwrap_or_default();
                    if e.is_panic() {
                        let reason = panic_message(e.into_panic());
                        error!(routine = %name, %reason, "Recovered from fetcher panic");
                    } else {
                        warn!(routine = %name, error = %e, "Fetch task was cancelled");
                    }
                    report.panicked.push(name);
                }
            }
        }
    }

    /// Push every routine with new data, in registration order
    async fn push_all(&self, report: &mut CycleReport) {
        for slot in &self.routines {
            let routine = slot.routine.lock().await;
            if !routine.should_push() {
                debug!(routine = %slot.name, "Skipping push, nothing new");
                continue;
            }

            match self.gateway.push_routine(&**routine).await {
                Ok(()) => {
                    debug!(routine = %slot.name, "Pushed");
                    report.pushed.push(slot.name.clone());
                }
                Err(e) => error!(routine = %slot.name, error = %e, "Failed to push to device"),
            }
        }
    }

    /// Cycle forever, pacing to the fastest routine
    pub async fn run(&self) {
        info!(routines = ?self.routine_names(), "Broker cycle loop started");
        loop {
            let report = self.run_cycle().await;
            info!(
                fastest_interval = ?report.fastest_interval,
                elapsed = ?report.elapsed,
                pushed = report.pushed.len(),
                failed = report.failed.len(),
                panicked = report.panicked.len(),
                "Cycle complete"
            );

            let pause = report.sleep_for();
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }
    }

    /// Start cycling and serve the admin endpoint on `listener`
    ///
    /// Returns once the admin server stops (ctrl-c); the cycle task is
    /// aborted at that point.
    pub async fn serve(mut self, listener: TcpListener) -> Result<()> {
        debug!("Broker::serve: called");
        let handlers = std::mem::take(&mut self.handlers);
        let router = admin::router(AdminState::new(Arc::clone(&self.shutdown)), handlers);

        let broker = Arc::new(self);
        let cycle = tokio::spawn({
            let broker = Arc::clone(&broker);
            async move {
                broker.startup().await;
                broker.run().await;
            }
        });

        let result = admin::serve(listener, router).await;
        cycle.abort();
        result
    }

    /// Bind the admin address, then [`Broker::serve`]
    pub async fn start(self) -> Result<()> {
        let addr = self.admin_addr();
        debug!(%addr, "Broker::start: called");
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind admin server to {addr}"))?;
        self.serve(listener).await
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
