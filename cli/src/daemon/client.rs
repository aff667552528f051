use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use batteryind_protocol::{
    DaemonRequest, DaemonResponse, DaemonStatus, NotificationEvent, MIN_SUPPORTED_VERSION,
    PROTOCOL_VERSION,
};

use crate::daemon::socket_path;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Daemon error: {0}")]
    Daemon(String),

    #[error(
        "Protocol version mismatch: this CLI speaks v{cli}, the daemon (v{daemon_version}) speaks v{daemon} and accepts v{daemon_min}+. Restart the daemon with `batteryind daemon stop && batteryind daemon start`."
    )]
    VersionMismatch {
        cli: u32,
        daemon: u32,
        daemon_min: u32,
        daemon_version: String,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Checks that this build and the daemon can understand each other.
pub fn check_version_compatibility(status: &DaemonStatus) -> Result<()> {
    let daemon_understands_us = PROTOCOL_VERSION >= status.min_supported_version;
    let we_understand_daemon = status.protocol_version >= MIN_SUPPORTED_VERSION;

    if daemon_understands_us && we_understand_daemon {
        return Ok(());
    }

    Err(ClientError::VersionMismatch {
        cli: PROTOCOL_VERSION,
        daemon: status.protocol_version,
        daemon_min: status.min_supported_version,
        daemon_version: status.version.clone(),
    })
}

pub struct DaemonClient {
    stream: UnixStream,
    read_buffer: Vec<u8>,
}

impl DaemonClient {
    pub fn connect() -> Result<Self> {
        let path = socket_path();
        let stream = UnixStream::connect(&path)?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        stream.set_write_timeout(Some(Duration::from_secs(5)))?;
        Ok(Self {
            stream,
            read_buffer: Vec::with_capacity(4096),
        })
    }

    /// Connects and validates protocol version compatibility.
    pub fn connect_with_version_check() -> Result<Self> {
        let mut client = Self::connect()?;
        let status = client.get_status()?;
        check_version_compatibility(&status)?;
        Ok(client)
    }

    fn read_line_blocking(&mut self) -> Result<String> {
        let mut temp_buf = [0u8; 4096];
        loop {
            if let Some(pos) = self.read_buffer.iter().position(|&b| b == b'\n') {
                let line_bytes: Vec<u8> = self.read_buffer.drain(..=pos).collect();
                return Ok(String::from_utf8_lossy(&line_bytes).to_string());
            }
            let n = self.stream.read(&mut temp_buf)?;
            if n == 0 {
                return Err(ClientError::Protocol("Connection closed".into()));
            }
            self.read_buffer.extend_from_slice(&temp_buf[..n]);
        }
    }

    fn send_request(&mut self, request: DaemonRequest) -> Result<DaemonResponse> {
        let json = request
            .to_json()
            .map_err(|e| ClientError::Protocol(e.to_string()))?;

        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;

        let line = self.read_line_blocking()?;
        tracing::debug!(line_len = line.len(), "send_request read response");

        DaemonResponse::from_json(line.trim()).map_err(|e| ClientError::Protocol(e.to_string()))
    }

    pub fn get_status(&mut self) -> Result<DaemonStatus> {
        match self.send_request(DaemonRequest::GetStatus)? {
            DaemonResponse::Status(status) => Ok(status),
            DaemonResponse::Error(e) => Err(ClientError::Daemon(e)),
            _ => Err(ClientError::Protocol("Unexpected response".into())),
        }
    }

    pub fn toggle(&mut self) -> Result<NotificationEvent> {
        match self.send_request(DaemonRequest::Toggle)? {
            DaemonResponse::Toggled(event) => Ok(event),
            DaemonResponse::Error(e) => Err(ClientError::Daemon(e)),
            _ => Err(ClientError::Protocol("Unexpected response".into())),
        }
    }

    pub fn shutdown(&mut self) -> Result<()> {
        match self.send_request(DaemonRequest::Shutdown)? {
            DaemonResponse::Ok => Ok(()),
            DaemonResponse::Error(e) => Err(ClientError::Daemon(e)),
            _ => Err(ClientError::Protocol("Unexpected response".into())),
        }
    }
}
