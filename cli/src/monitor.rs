//! The polling session: one task owning the decision engine, woken by a
//! repeating timer and by commands from its [`MonitorHandle`].
//!
//! Engine state is only ever touched from inside that task, so toggles and
//! polls are serialized without a lock. Dropping the handle cancels the timer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use batteryind_platform::{BatteryReading, PowerStateReader};
use batteryind_protocol::NotificationEvent;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::engine::NotificationDecisionEngine;
use crate::notifier::Notifier;

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    pub poll_interval: Duration,
    /// Backstop for a whole read; a read that takes longer yields the fallback.
    pub read_timeout: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            read_timeout: Duration::from_secs(21),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorStatus {
    pub notify_enabled: bool,
    pub last_reading: Option<BatteryReading>,
    pub last_reading_at: Option<DateTime<Utc>>,
    pub polls: u64,
    pub notifications_sent: u64,
    pub last_event: Option<NotificationEvent>,
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Monitor has stopped")]
    Stopped,
}

enum Command {
    Toggle(oneshot::Sender<NotificationEvent>),
    Status(oneshot::Sender<MonitorStatus>),
}

/// Owner of a running monitor. Dropping it stops the monitor.
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub async fn toggle(&self) -> Result<NotificationEvent, MonitorError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Toggle(tx))
            .await
            .map_err(|_| MonitorError::Stopped)?;
        rx.await.map_err(|_| MonitorError::Stopped)
    }

    pub async fn status(&self) -> Result<MonitorStatus, MonitorError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Status(tx))
            .await
            .map_err(|_| MonitorError::Stopped)?;
        rx.await.map_err(|_| MonitorError::Stopped)
    }

    /// Stops the timer without waiting for the task to exit.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Stops the timer and waits for an in-flight poll to wind down. A poll
    /// that finishes after this call never reaches the notifier.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub struct Monitor {
    engine: NotificationDecisionEngine,
    reader: Arc<dyn PowerStateReader>,
    notifier: Box<dyn Notifier>,
    started: Instant,
    last_reading: Option<BatteryReading>,
    last_reading_at: Option<DateTime<Utc>>,
    polls: u64,
    notifications_sent: u64,
    last_event: Option<NotificationEvent>,
}

impl Monitor {
    /// Starts a fresh session. Every session begins with default engine state.
    pub fn spawn(
        reader: Arc<dyn PowerStateReader>,
        notifier: Box<dyn Notifier>,
        options: MonitorOptions,
    ) -> MonitorHandle {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let monitor = Monitor {
            engine: NotificationDecisionEngine::new(),
            reader,
            notifier,
            started: Instant::now(),
            last_reading: None,
            last_reading_at: None,
            polls: 0,
            notifications_sent: 0,
            last_event: None,
        };

        let task = tokio::spawn(monitor.run(options, command_rx, cancel_rx));

        MonitorHandle {
            commands: command_tx,
            cancel: cancel_tx,
            task: Some(task),
        }
    }

    async fn run(
        mut self,
        options: MonitorOptions,
        mut commands: mpsc::Receiver<Command>,
        mut cancel: watch::Receiver<bool>,
    ) {
        let mut poll_tick = tokio::time::interval(options.poll_interval);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval = ?options.poll_interval, "Battery monitor started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.changed() => break,
                Some(command) = commands.recv() => self.handle_command(command),
                _ = poll_tick.tick() => {
                    let reading = read_with_timeout(self.reader.clone(), options.read_timeout).await;
                    if *cancel.borrow() {
                        debug!("Discarding reading that finished after shutdown");
                        break;
                    }
                    self.process_reading(reading);
                }
            }
        }

        info!(polls = self.polls, "Battery monitor stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Toggle(reply) => {
                let event = self.engine.toggle();
                info!(enabled = self.engine.is_enabled(), "Notifications toggled");
                self.deliver(event);
                let _ = reply.send(event);
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn process_reading(&mut self, reading: BatteryReading) {
        self.polls += 1;
        self.last_reading = Some(reading);
        self.last_reading_at = Some(Utc::now());

        let now = self.started.elapsed().as_secs_f64();
        debug!(
            level = reading.level_percent,
            charging = reading.is_charging,
            "Polled battery"
        );

        if let Some(event) = self.engine.on_poll(reading, now) {
            info!(?event, level = reading.level_percent, "Battery threshold crossed");
            self.deliver(event);
        }
        trace!(state = ?self.engine.state(), "Engine state after poll");
    }

    fn deliver(&mut self, event: NotificationEvent) {
        self.last_event = Some(event);
        match self.notifier.notify(&event) {
            Ok(()) => self.notifications_sent += 1,
            Err(e) => warn!(?event, error = %e, "Failed to deliver notification"),
        }
    }

    fn status(&self) -> MonitorStatus {
        MonitorStatus {
            notify_enabled: self.engine.is_enabled(),
            last_reading: self.last_reading,
            last_reading_at: self.last_reading_at,
            polls: self.polls,
            notifications_sent: self.notifications_sent,
            last_event: self.last_event,
        }
    }
}

/// Runs the blocking read off the async thread, bounded by `limit`.
async fn read_with_timeout(reader: Arc<dyn PowerStateReader>, limit: Duration) -> BatteryReading {
    let read = tokio::task::spawn_blocking(move || reader.read());

    match tokio::time::timeout(limit, read).await {
        Ok(Ok(reading)) => reading,
        Ok(Err(e)) => {
            warn!(error = %e, "Battery read task failed");
            BatteryReading::FALLBACK
        }
        Err(_) => {
            warn!(timeout = ?limit, "Battery read timed out");
            BatteryReading::FALLBACK
        }
    }
}
