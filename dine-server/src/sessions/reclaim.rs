//! Abandoned session reclamation
//!
//! Runs once at startup, then on a fixed interval. A failed run is logged
//! and the loop keeps going. Scheduled and manual runs share a
//! [`ReclaimGuard`] so two sweeps never overlap.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use shared::models::CleanupReport;
use tokio_util::sync::CancellationToken;

use super::error::{SessionError, SessionResult};
use super::manager::SessionManager;

/// In-flight flag shared by every cleanup caller
#[derive(Debug, Clone, Default)]
pub struct ReclaimGuard {
    running: Arc<AtomicBool>,
}

/// Held for the duration of one cleanup run
#[derive(Debug)]
pub struct ReclaimPermit {
    running: Arc<AtomicBool>,
}

impl Drop for ReclaimPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

impl ReclaimGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while another run holds the permit
    pub fn try_acquire(&self) -> Option<ReclaimPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ReclaimPermit {
                running: self.running.clone(),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Operator-triggered cleanup; refuses to overlap a running sweep
pub async fn run_manual_cleanup(
    sessions: &SessionManager,
    guard: &ReclaimGuard,
    hours_inactive: u64,
) -> SessionResult<CleanupReport> {
    let Some(_permit) = guard.try_acquire() else {
        return Err(SessionError::CleanupInProgress);
    };
    let report = sessions.cleanup_abandoned_sessions(hours_inactive).await?;
    tracing::info!(
        cleaned = report.cleaned,
        hours_inactive,
        "Manual session cleanup finished"
    );
    Ok(report)
}

/// Periodic sweep of idle table sessions
///
/// Registered with `BackgroundTasks` in `ServerState::start_background_tasks()`.
pub struct SessionReclaimScheduler {
    sessions: SessionManager,
    guard: ReclaimGuard,
    hours_inactive: u64,
    interval: Duration,
    shutdown: CancellationToken,
}

impl SessionReclaimScheduler {
    pub fn new(
        sessions: SessionManager,
        guard: ReclaimGuard,
        hours_inactive: u64,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sessions,
            guard,
            hours_inactive,
            interval,
            shutdown,
        }
    }

    /// Main loop: eager sweep, then one per interval until shutdown
    pub async fn run(self) {
        tracing::info!(
            hours_inactive = self.hours_inactive,
            interval_secs = self.interval.as_secs(),
            "Session reclaim scheduler started"
        );

        self.sweep().await;

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately; the eager sweep covered it
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Session reclaim scheduler received shutdown signal");
                    return;
                }
            }
        }
    }

    /// One scheduled sweep. Returns the report when it actually ran.
    pub async fn sweep(&self) -> Option<CleanupReport> {
        let Some(_permit) = self.guard.try_acquire() else {
            tracing::info!("Session cleanup already running, skipping this tick");
            return None;
        };

        match self
            .sessions
            .cleanup_abandoned_sessions(self.hours_inactive)
            .await
        {
            Ok(report) if report.cleaned == 0 => {
                tracing::debug!("No abandoned table sessions");
                Some(report)
            }
            Ok(report) => {
                tracing::info!(
                    cleaned = report.cleaned,
                    "Reclaimed {} abandoned table session(s)",
                    report.cleaned
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Session cleanup failed");
                None
            }
        }
    }
}
