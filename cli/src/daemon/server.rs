use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use batteryind_platform::{SystemCommandRunner, UpowerReader};
use batteryind_protocol::{
    DaemonRequest, DaemonResponse, DaemonStatus, ReadingSnapshot, MIN_SUPPORTED_VERSION,
    PROTOCOL_VERSION,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{runtime_dir, LogLevel, UserConfig};
use crate::daemon::socket_path;
use crate::monitor::{Monitor, MonitorHandle, MonitorOptions, MonitorStatus, POLL_INTERVAL};
use crate::notifier;

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Already running")]
    AlreadyRunning,

    #[error("Failed to daemonize: {0}")]
    Daemonize(String),
}

pub type Result<T> = std::result::Result<T, DaemonError>;

type ClientId = u64;

enum ClientMessage {
    Request { request: DaemonRequest },
    Disconnect,
}

async fn client_reader_task(
    mut reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    msg_tx: mpsc::Sender<(ClientId, ClientMessage)>,
    client_id: ClientId,
) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                let _ = msg_tx.send((client_id, ClientMessage::Disconnect)).await;
                break;
            }
            Ok(_) => match DaemonRequest::from_json(line.trim()) {
                Ok(request) => {
                    if msg_tx
                        .send((client_id, ClientMessage::Request { request }))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    warn!(client_id, error = %e, "Invalid request from client");
                }
            },
            Err(e) => {
                debug!(client_id, error = %e, "Client read error");
                let _ = msg_tx.send((client_id, ClientMessage::Disconnect)).await;
                break;
            }
        }
    }
}

async fn client_writer_task(
    mut writer: tokio::net::unix::OwnedWriteHalf,
    mut response_rx: mpsc::Receiver<DaemonResponse>,
) {
    while let Some(response) = response_rx.recv().await {
        let json = match response.to_json() {
            Ok(j) => j,
            Err(_) => continue,
        };
        if writer
            .write_all(format!("{}\n", json).as_bytes())
            .await
            .is_err()
        {
            break;
        }
    }
}

fn daemon_status(status: MonitorStatus, uptime: Duration) -> DaemonStatus {
    let taken_at = status
        .last_reading_at
        .map(|t| t.timestamp())
        .unwrap_or_default();

    DaemonStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime.as_secs(),
        notify_enabled: status.notify_enabled,
        polls: status.polls,
        notifications_sent: status.notifications_sent,
        last_reading: status.last_reading.map(|r| ReadingSnapshot {
            level_percent: r.level_percent,
            is_charging: r.is_charging,
            taken_at,
        }),
        last_event: status.last_event,
        protocol_version: PROTOCOL_VERSION,
        min_supported_version: MIN_SUPPORTED_VERSION,
    }
}

/// Answers a request. `Shutdown` is acknowledged here; stopping is up to the caller.
async fn handle_request(
    monitor: &MonitorHandle,
    start_time: Instant,
    request: &DaemonRequest,
) -> DaemonResponse {
    match request {
        DaemonRequest::GetStatus => match monitor.status().await {
            Ok(status) => DaemonResponse::Status(daemon_status(status, start_time.elapsed())),
            Err(e) => DaemonResponse::Error(e.to_string()),
        },
        DaemonRequest::Toggle => match monitor.toggle().await {
            Ok(event) => DaemonResponse::Toggled(event),
            Err(e) => DaemonResponse::Error(e.to_string()),
        },
        DaemonRequest::Shutdown => DaemonResponse::Ok,
    }
}

fn spawn_monitor(config: &UserConfig) -> MonitorHandle {
    let query_timeout = config.query_timeout();
    let reader = UpowerReader::system(SystemCommandRunner::new(query_timeout))
        .program(config.upower_path.clone());

    // Enumerate + detail query, each bounded by the command timeout.
    let options = MonitorOptions {
        poll_interval: POLL_INTERVAL,
        read_timeout: query_timeout * 2 + Duration::from_secs(1),
    };

    Monitor::spawn(Arc::new(reader), notifier::from_kind(config.notifier), options)
}

pub fn run_daemon(
    config: &UserConfig,
    foreground: bool,
    log_level_override: Option<LogLevel>,
) -> Result<()> {
    let socket = socket_path();

    if socket.exists() {
        if crate::daemon::is_daemon_running() {
            return Err(DaemonError::AlreadyRunning);
        }
        fs::remove_file(&socket)?;
    }

    fs::create_dir_all(runtime_dir())?;

    if !foreground {
        match daemonize::Daemonize::new()
            .working_directory(runtime_dir())
            .start()
        {
            Ok(_) => {}
            Err(e) => return Err(DaemonError::Daemonize(e.to_string())),
        }
        let _guard = crate::logging::init(
            config.log_level,
            crate::logging::LogMode::File,
            log_level_override,
        );
        std::mem::forget(_guard);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Daemon starting");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_daemon_async(socket, config))
}

async fn run_daemon_async(socket: PathBuf, config: &UserConfig) -> Result<()> {
    let listener = UnixListener::bind(&socket)?;
    info!(socket = ?socket, notifier = config.notifier.label(), "Listening for connections");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    let start_time = Instant::now();
    let monitor = spawn_monitor(config);

    let (msg_tx, mut msg_rx) = mpsc::channel::<(ClientId, ClientMessage)>(64);
    let mut clients: HashMap<ClientId, mpsc::Sender<DaemonResponse>> = HashMap::new();
    let mut next_client_id: ClientId = 1;

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let client_id = next_client_id;
                        next_client_id += 1;
                        debug!(client_id, "Client connected");

                        let (reader, writer) = stream.into_split();
                        let (response_tx, response_rx) = mpsc::channel::<DaemonResponse>(8);
                        clients.insert(client_id, response_tx);

                        tokio::spawn(client_reader_task(
                            BufReader::new(reader),
                            msg_tx.clone(),
                            client_id,
                        ));
                        tokio::spawn(client_writer_task(writer, response_rx));
                    }
                    Err(e) => {
                        error!(error = %e, "Socket accept error");
                    }
                }
            }
            Some((client_id, msg)) = msg_rx.recv() => {
                match msg {
                    ClientMessage::Disconnect => {
                        if clients.remove(&client_id).is_some() {
                            debug!(client_id, count = clients.len(), "Client disconnected");
                        }
                    }
                    ClientMessage::Request { request } => {
                        debug!(client_id, request = ?request, "Handling request");

                        let response = handle_request(&monitor, start_time, &request).await;
                        if let Some(client) = clients.get(&client_id) {
                            let _ = client.send(response).await;
                        }

                        if request == DaemonRequest::Shutdown {
                            info!("Shutdown requested by client");
                            break;
                        }
                    }
                }
            }
            _ = sigusr1.recv() => {
                match monitor.toggle().await {
                    Ok(event) => info!(?event, "Toggled by SIGUSR1"),
                    Err(e) => error!(error = %e, "Toggle failed"),
                }
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    info!("Daemon shutting down");
    monitor.shutdown().await;
    // Give writer tasks a moment to flush the shutdown acknowledgement.
    tokio::time::sleep(Duration::from_millis(50)).await;
    fs::remove_file(&socket).ok();

    Ok(())
}

#[cfg(test)]
mod tests {
    use batteryind_platform::{BatteryReading, PowerStateReader};
    use batteryind_protocol::NotificationEvent;

    use super::*;
    use crate::notifier::testing::RecordingNotifier;

    struct Charging85;

    impl PowerStateReader for Charging85 {
        fn read(&self) -> BatteryReading {
            BatteryReading::new(85, true)
        }
    }

    fn spawn_test_monitor(notifier: RecordingNotifier) -> MonitorHandle {
        Monitor::spawn(
            Arc::new(Charging85),
            Box::new(notifier),
            MonitorOptions {
                poll_interval: Duration::from_millis(20),
                read_timeout: Duration::from_secs(1),
            },
        )
    }

    #[tokio::test]
    async fn test_toggle_request() {
        let monitor = spawn_test_monitor(RecordingNotifier::default());
        let start = Instant::now();

        assert_eq!(
            handle_request(&monitor, start, &DaemonRequest::Toggle).await,
            DaemonResponse::Toggled(NotificationEvent::NotificationsDisabled)
        );
        assert_eq!(
            handle_request(&monitor, start, &DaemonRequest::Toggle).await,
            DaemonResponse::Toggled(NotificationEvent::NotificationsEnabled)
        );
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_status_request_reports_reading() {
        let notifier = RecordingNotifier::default();
        let monitor = spawn_test_monitor(notifier.clone());
        tokio::time::sleep(Duration::from_millis(60)).await;

        let response = handle_request(&monitor, Instant::now(), &DaemonRequest::GetStatus).await;
        let DaemonResponse::Status(status) = response else {
            panic!("expected status, got {response:?}");
        };

        assert!(status.notify_enabled);
        assert!(status.polls >= 1);
        assert_eq!(status.notifications_sent, 1);
        assert_eq!(status.last_event, Some(NotificationEvent::BatteryFull));
        assert_eq!(status.protocol_version, PROTOCOL_VERSION);

        let reading = status.last_reading.expect("reading recorded");
        assert_eq!(reading.level_percent, 85);
        assert!(reading.is_charging);
        assert!(reading.taken_at > 0);

        assert_eq!(notifier.events(), vec![NotificationEvent::BatteryFull]);
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_requests_after_monitor_stopped_are_errors() {
        let monitor = spawn_test_monitor(RecordingNotifier::default());
        monitor.cancel();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let response = handle_request(&monitor, Instant::now(), &DaemonRequest::Toggle).await;
        assert_eq!(
            response,
            DaemonResponse::Error("Monitor has stopped".to_string())
        );
        assert_eq!(
            handle_request(&monitor, Instant::now(), &DaemonRequest::Shutdown).await,
            DaemonResponse::Ok
        );
    }

    #[test]
    fn test_daemon_status_without_reading() {
        let status = daemon_status(
            MonitorStatus {
                notify_enabled: false,
                last_reading: None,
                last_reading_at: None,
                polls: 0,
                notifications_sent: 0,
                last_event: None,
            },
            Duration::from_secs(90),
        );

        assert_eq!(status.uptime_secs, 90);
        assert!(!status.notify_enabled);
        assert_eq!(status.last_reading, None);
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }
}
