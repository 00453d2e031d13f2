//! Background shipping service and its lifecycle handle.
//!
//! One tokio task owns the flush loop. Each cycle drains the retry queue
//! first, then the main buffer, feeds the outcome to the scheduler and
//! sleeps for the scheduler's current delay. The sleep races a
//! cancellation token so shutdown interrupts it immediately.
//!
//! Nothing that happens inside a cycle escapes the task: transport and
//! collector faults are logged and folded into backoff, never propagated
//! to the host application.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::collector::Collector;
use crate::config::PipelineConfig;
use crate::record::LogRecord;
use crate::scheduler::FlushScheduler;
use crate::transport::Transport;

/// Lifecycle of the background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Background shipping pipeline, not yet started.
///
/// Construction wires the collector to a transport;
/// [`start`](BackgroundService::start) consumes the service and spawns
/// the flush loop, returning a [`ServiceHandle`].
pub struct BackgroundService {
    config: PipelineConfig,
    collector: Arc<Collector>,
    transport: Arc<dyn Transport>,
}

impl BackgroundService {
    #[must_use]
    pub fn new(config: PipelineConfig, transport: Arc<dyn Transport>) -> Self {
        let collector = Arc::new(Collector::new(&config));
        BackgroundService {
            config,
            collector,
            transport,
        }
    }

    /// The shared ingestion buffer, for wiring event adapters.
    #[must_use]
    pub fn collector(&self) -> Arc<Collector> {
        Arc::clone(&self.collector)
    }

    /// Spawns the flush loop on the current tokio runtime.
    #[must_use]
    pub fn start(self) -> ServiceHandle {
        let (status_tx, status_rx) = watch::channel(ServiceStatus::Created);
        let status_tx = Arc::new(status_tx);
        let _ = status_tx.send(ServiceStatus::Starting);

        let cancel = CancellationToken::new();
        let worker = Worker {
            collector: Arc::clone(&self.collector),
            transport: Arc::clone(&self.transport),
            scheduler: FlushScheduler::new(
                self.config.floor_delay,
                self.config.max_delay,
                self.config.backoff_factor,
            ),
        };
        let task = tokio::spawn(worker.run(cancel.clone(), Arc::clone(&status_tx)));
        info!("log shipping service started");

        ServiceHandle {
            collector: self.collector,
            cancel,
            status_tx,
            status_rx,
            task: Mutex::new(Some(task)),
        }
    }
}

/// Handle to a running service. Cheap to share behind an `Arc`; producers
/// enqueue through it and exactly one caller drives
/// [`stop`](ServiceHandle::stop).
pub struct ServiceHandle {
    collector: Arc<Collector>,
    cancel: CancellationToken,
    status_tx: Arc<watch::Sender<ServiceStatus>>,
    status_rx: watch::Receiver<ServiceStatus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ServiceHandle {
    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        *self.status_rx.borrow()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status() == ServiceStatus::Running
    }

    /// Hands a record to the pipeline. Never blocks; records arriving
    /// after [`stop`](ServiceHandle::stop) are dropped.
    pub fn enqueue(&self, record: LogRecord) {
        self.collector.enqueue(record)
    }

    /// Stops the loop and drains what it can: the retry queue once, then
    /// the remaining buffer once, each attempt independent of the other.
    /// Idempotent; later calls return once the first drain completed.
    pub async fn stop(&self) {
        let task = {
            let mut slot = self.task.lock().await;
            slot.take()
        };
        let Some(task) = task else {
            // Already stopping elsewhere; wait for it to finish.
            let mut status = self.status_rx.clone();
            while *status.borrow() != ServiceStatus::Stopped {
                if status.changed().await.is_err() {
                    break;
                }
            }
            return;
        };

        let _ = self.status_tx.send(ServiceStatus::Stopping);
        self.cancel.cancel();
        if let Err(err) = task.await {
            error!(error = %err, "shipping task aborted during shutdown");
        }
        info!("log shipping service stopped");
    }
}

/// State owned by the flush loop task.
struct Worker {
    collector: Arc<Collector>,
    transport: Arc<dyn Transport>,
    scheduler: FlushScheduler,
}

impl Worker {
    async fn run(
        mut self,
        cancel: CancellationToken,
        status_tx: Arc<watch::Sender<ServiceStatus>>,
    ) {
        let _ = status_tx.send(ServiceStatus::Running);

        loop {
            self.run_cycle().await;

            tokio::select! {
                () = tokio::time::sleep(self.scheduler.delay()) => {}
                () = cancel.cancelled() => break,
            }
        }

        self.shut_down().await;
        let _ = status_tx.send(ServiceStatus::Stopped);
    }

    /// One flush cycle. Retry drain faults are swallowed so a poisoned
    /// retry pass can never starve fresh records; the main flush outcome
    /// drives the scheduler.
    async fn run_cycle(&mut self) {
        match self.collector.flush_retries(self.transport.as_ref()).await {
            Ok(resent) if resent > 0 => debug!(resent, "resent previously failed batches"),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "retry drain failed"),
        }

        match self.collector.flush(self.transport.as_ref()).await {
            Ok(report) => {
                if let Some(failure) = report.failure {
                    self.scheduler.record_failure();
                    warn!(
                        sent = report.sent,
                        failures = self.scheduler.consecutive_failures(),
                        next_delay_ms = self.scheduler.delay().as_millis() as u64,
                        error = %failure,
                        "flush cycle degraded, backing off"
                    );
                } else {
                    self.scheduler.record_success(report.sent);
                    if report.sent > 0 {
                        debug!(sent = report.sent, "flush cycle shipped records");
                    }
                }
            }
            Err(err) => {
                self.scheduler.record_failure();
                error!(error = %err, "flush cycle failed internally");
            }
        }
    }

    /// Final drain on the way out. The buffer is closed first so the
    /// drain operates on a fixed set; the two passes run exactly once
    /// each and a failure in one does not skip the other.
    async fn shut_down(&self) {
        self.collector.close();

        match self.collector.flush_retries(self.transport.as_ref()).await {
            Ok(resent) if resent > 0 => debug!(resent, "final retry drain resent batches"),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "final retry drain failed"),
        }

        match self.collector.flush(self.transport.as_ref()).await {
            Ok(report) if report.failure.is_none() => {
                debug!(sent = report.sent, "final flush drained buffer")
            }
            Ok(report) => warn!(
                sent = report.sent,
                "final flush left records behind after a transport failure"
            ),
            Err(err) => warn!(error = %err, "final flush failed"),
        }
    }
}
