//! Connectivity monitor
//!
//! Polls the service health endpoint on a fixed cadence and publishes the
//! resulting [`ConnectivityStatus`]. Platform connectivity signals can force
//! the status offline or trigger an immediate re-poll.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reviewdesk_domain::{ConnectivityStatus, HealthConfig, HealthReport};
use thiserror::Error;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::client::ReviewsApiClient;
use super::errors::ApiError;

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that can tell whether the review service is reachable
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self) -> Result<HealthReport, ApiError>;
}

#[async_trait]
impl HealthProbe for ReviewsApiClient {
    async fn probe(&self) -> Result<HealthReport, ApiError> {
        self.health_check().await
    }
}

#[derive(Debug, Error)]
pub enum HealthMonitorError {
    #[error("Health monitor already running")]
    AlreadyRunning,

    #[error("Health monitor not running")]
    NotRunning,

    #[error("Health poll interval must be greater than zero")]
    ZeroInterval,

    #[error("Health monitor task panicked: {0}")]
    TaskPanicked(String),

    #[error("Health monitor task did not stop within {0:?}")]
    StopTimeout(Duration),
}

/// Periodic health poller owning the connectivity status
pub struct HealthMonitor {
    probe: Arc<dyn HealthProbe>,
    interval: Duration,
    status: Arc<watch::Sender<ConnectivityStatus>>,
    recheck: Arc<Notify>,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl HealthMonitor {
    /// Create a stopped monitor in the `Checking` state
    pub fn new(probe: Arc<dyn HealthProbe>, config: &HealthConfig) -> Self {
        Self::with_interval(probe, config.poll_interval())
    }

    pub fn with_interval(probe: Arc<dyn HealthProbe>, interval: Duration) -> Self {
        let (status, _) = watch::channel(ConnectivityStatus::Checking);
        Self {
            probe,
            interval,
            status: Arc::new(status),
            recheck: Arc::new(Notify::new()),
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current connectivity status
    pub fn status(&self) -> ConnectivityStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status.subscribe()
    }

    /// Start polling
    ///
    /// The first poll happens immediately, then once per interval.
    ///
    /// # Errors
    ///
    /// Returns error if the monitor is already running or the interval is
    /// zero
    #[instrument(skip(self), fields(interval = ?self.interval))]
    pub async fn start(&mut self) -> Result<(), HealthMonitorError> {
        if self.interval.is_zero() {
            return Err(HealthMonitorError::ZeroInterval);
        }
        if self.is_running().await {
            return Err(HealthMonitorError::AlreadyRunning);
        }

        info!("Starting health monitor");

        // Fresh token so a stopped monitor can be restarted
        self.cancellation_token = CancellationToken::new();

        let probe = Arc::clone(&self.probe);
        let status = Arc::clone(&self.status);
        let recheck = Arc::clone(&self.recheck);
        let cancel = self.cancellation_token.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            Self::poll_loop(probe, interval, status, recheck, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        Ok(())
    }

    /// Stop polling and wait for the background task to finish
    ///
    /// # Errors
    ///
    /// Returns error if the monitor is not running or the task does not
    /// finish cleanly
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), HealthMonitorError> {
        if !self.is_running().await {
            return Err(HealthMonitorError::NotRunning);
        }

        info!("Stopping health monitor");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Health monitor task panicked: {}", e);
                    return Err(HealthMonitorError::TaskPanicked(e.to_string()));
                }
                Err(_) => {
                    warn!("Health monitor task did not complete within timeout");
                    return Err(HealthMonitorError::StopTimeout(STOP_TIMEOUT));
                }
            }
        }

        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.task_handle.lock().await.is_some()
    }

    /// The platform reported loss of connectivity
    ///
    /// Marks the service offline without a network call.
    pub fn went_offline(&self) {
        info!("Connectivity lost");
        publish(&self.status, ConnectivityStatus::Offline);
    }

    /// The platform reported connectivity is back
    ///
    /// Moves to `Checking` and re-polls right away: through the background
    /// loop when running, inline otherwise.
    pub async fn came_back_online(&self) {
        info!("Connectivity restored, re-checking service health");
        publish(&self.status, ConnectivityStatus::Checking);

        if self.is_running().await {
            self.recheck.notify_one();
        } else {
            self.poll_now().await;
        }
    }

    /// Run one health check now and publish its outcome
    pub async fn poll_now(&self) -> ConnectivityStatus {
        poll_once(self.probe.as_ref(), &self.status).await
    }

    async fn poll_loop(
        probe: Arc<dyn HealthProbe>,
        interval: Duration,
        status: Arc<watch::Sender<ConnectivityStatus>>,
        recheck: Arc<Notify>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = recheck.notified() => {
                    debug!("Re-poll requested");
                    ticker.reset();
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = poll_once(probe.as_ref(), &status) => {}
            }
        }

        debug!("Health poll loop cancelled");
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        // Best effort: the handle lock is async, so only peek at it
        let running = self.task_handle.try_lock().map(|handle| handle.is_some()).unwrap_or(true);
        if running && !self.cancellation_token.is_cancelled() {
            warn!("HealthMonitor dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}

async fn poll_once(
    probe: &dyn HealthProbe,
    status: &watch::Sender<ConnectivityStatus>,
) -> ConnectivityStatus {
    let next = match probe.probe().await {
        Ok(report) => {
            debug!(service_status = %report.status, "Health check succeeded");
            ConnectivityStatus::Online
        }
        Err(err) => {
            warn!(error = %err, "Health check failed");
            ConnectivityStatus::Offline
        }
    };
    publish(status, next);
    next
}

fn publish(sender: &watch::Sender<ConnectivityStatus>, next: ConnectivityStatus) {
    sender.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        info!(from = %current, to = %next, "Connectivity status changed");
        *current = next;
        true
    });
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use reqwest::StatusCode;

    use super::*;
    use crate::api::errors::ClassifiedError;

    /// Probe replaying scripted outcomes; repeats the last one when drained
    struct ScriptedProbe {
        outcomes: StdMutex<VecDeque<bool>>,
        last: StdMutex<bool>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new(outcomes: &[bool]) -> Arc<Self> {
            Arc::new(Self {
                outcomes: StdMutex::new(outcomes.iter().copied().collect()),
                last: StdMutex::new(true),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn probe(&self) -> Result<HealthReport, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let healthy = {
                let mut last = self.last.lock().unwrap();
                if let Some(next) = self.outcomes.lock().unwrap().pop_front() {
                    *last = next;
                }
                *last
            };

            if healthy {
                Ok(HealthReport {
                    status: "healthy".into(),
                    timestamp: None,
                    version: None,
                    database: None,
                    ai_service: None,
                    uptime: None,
                    error: None,
                })
            } else {
                let source = ClassifiedError::classify(
                    false,
                    Some(StatusCode::INTERNAL_SERVER_ERROR),
                    None,
                    Some("database unavailable"),
                );
                Err(ApiError::Failed {
                    message: format!("Health check failed: {source}"),
                    attempts: 4,
                    source,
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_probe_goes_offline() {
        let probe = ScriptedProbe::new(&[false]);
        let mut monitor = HealthMonitor::with_interval(probe.clone(), Duration::from_secs(30));
        let mut rx = monitor.subscribe();
        assert_eq!(monitor.status(), ConnectivityStatus::Checking);

        monitor.start().await.unwrap();
        rx.wait_for(|status| *status == ConnectivityStatus::Offline).await.unwrap();

        assert_eq!(probe.calls(), 1);
        monitor.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_fixed_cadence() {
        let probe = ScriptedProbe::new(&[]);
        let mut monitor = HealthMonitor::with_interval(probe.clone(), Duration::from_secs(30));

        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(95)).await;
        monitor.stop().await.unwrap();

        // t = 0, 30, 60, 90
        assert_eq!(probe.calls(), 4);
        assert_eq!(monitor.status(), ConnectivityStatus::Online);
    }

    #[tokio::test]
    async fn test_offline_signal_skips_network() {
        let probe = ScriptedProbe::new(&[]);
        let monitor = HealthMonitor::with_interval(probe.clone(), Duration::from_secs(30));

        monitor.went_offline();

        assert_eq!(monitor.status(), ConnectivityStatus::Offline);
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_passes_through_checking() {
        let probe = ScriptedProbe::new(&[false, true]);
        let mut monitor = HealthMonitor::with_interval(probe.clone(), Duration::from_secs(30));
        let mut rx = monitor.subscribe();

        monitor.start().await.unwrap();
        rx.wait_for(|status| *status == ConnectivityStatus::Offline).await.unwrap();

        let signalled = tokio::time::Instant::now();
        monitor.came_back_online().await;
        assert_eq!(monitor.status(), ConnectivityStatus::Checking);

        rx.wait_for(|status| *status == ConnectivityStatus::Online).await.unwrap();
        assert!(signalled.elapsed() < Duration::from_secs(30));
        assert_eq!(probe.calls(), 2);

        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_recovery_without_loop_polls_inline() {
        let probe = ScriptedProbe::new(&[true]);
        let monitor = HealthMonitor::with_interval(probe.clone(), Duration::from_secs(30));

        monitor.went_offline();
        monitor.came_back_online().await;

        assert_eq!(monitor.status(), ConnectivityStatus::Online);
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_errors() {
        let probe = ScriptedProbe::new(&[]);
        let mut monitor = HealthMonitor::with_interval(probe.clone(), Duration::from_secs(30));

        assert!(matches!(monitor.stop().await, Err(HealthMonitorError::NotRunning)));

        monitor.start().await.unwrap();
        assert!(monitor.is_running().await);
        assert!(matches!(monitor.start().await, Err(HealthMonitorError::AlreadyRunning)));

        monitor.stop().await.unwrap();
        assert!(!monitor.is_running().await);

        // Restart after stop
        monitor.start().await.unwrap();
        monitor.stop().await.unwrap();

        let mut zero = HealthMonitor::with_interval(probe, Duration::ZERO);
        assert!(matches!(zero.start().await, Err(HealthMonitorError::ZeroInterval)));
    }
}
