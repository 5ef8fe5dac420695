//! Launching the ddddocr service and checking that it answers
//!
//! The service runs detached from ddddctl: it gets its own process group,
//! its output goes to a log file, and nothing waits on it.

use crate::error::{DdddError, DdddResult};
use crate::http;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Timeout for a single readiness probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Interval between probes while waiting for a fresh service
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Feature endpoints enabled on every launch
pub const FEATURE_FLAGS: [&str; 4] = ["--ocr", "--det", "--slide", "--mcp"];

/// How to decide whether the service is up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    /// `GET /status` returns 200; polled after spawn
    #[default]
    Poll,
    /// A TCP connect succeeds; checked once after spawn
    Tcp,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poll => write!(f, "poll"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

/// Address the service binds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAddr {
    pub host: String,
    pub port: u16,
}

impl ServiceAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `http://host:port`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn status_url(&self) -> String {
        format!("{}/status", self.base_url())
    }

    pub fn mcp_url(&self) -> String {
        format!("{}/mcp", self.base_url())
    }

    pub fn docs_url(&self) -> String {
        format!("{}/docs", self.base_url())
    }
}

impl fmt::Display for ServiceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A spawned service
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    pub pid: u32,
    pub addr: ServiceAddr,
}

/// Command-line arguments for the service executable
pub fn launch_args(addr: &ServiceAddr) -> Vec<String> {
    let mut args = vec!["--address".to_string(), addr.to_string()];
    args.extend(FEATURE_FLAGS.iter().map(|f| (*f).to_string()));
    args
}

/// Start `executable` in the background, appending its output to `log_path`
pub fn spawn_detached(
    executable: &Path,
    addr: &ServiceAddr,
    log_path: &Path,
) -> DdddResult<ServiceHandle> {
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| DdddError::io(format!("opening {}", log_path.display()), e))?;
    let log_err = log
        .try_clone()
        .map_err(|e| DdddError::io(format!("opening {}", log_path.display()), e))?;

    let args = launch_args(addr);
    debug!("Spawning {} {}", executable.display(), args.join(" "));

    let mut cmd = Command::new(executable);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err));
    detach(&mut cmd);

    // The child is intentionally not waited on
    let child = cmd
        .spawn()
        .map_err(|e| DdddError::command_failed(executable.display().to_string(), e))?;

    info!("Service spawned with PID {}", child.id());
    Ok(ServiceHandle {
        pid: child.id(),
        addr: addr.clone(),
    })
}

/// New session on Unix: own process group, no controlling terminal
#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // SAFETY: setsid is async-signal-safe and touches no parent state
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}

/// Single readiness probe
pub async fn is_running(addr: &ServiceAddr, readiness: Readiness) -> bool {
    match readiness {
        Readiness::Poll => status_ok(addr).await,
        Readiness::Tcp => tcp_open(addr).await,
    }
}

/// Wait for a freshly spawned service.
///
/// `Poll` probes `/status` once a second until `timeout_secs` elapse;
/// `Tcp` checks the port once.
pub async fn wait_until_ready(addr: &ServiceAddr, readiness: Readiness, timeout_secs: u64) -> bool {
    match readiness {
        Readiness::Tcp => tcp_open(addr).await,
        Readiness::Poll => {
            for attempt in 0..timeout_secs.max(1) {
                if status_ok(addr).await {
                    debug!("Service ready after {} probe(s)", attempt + 1);
                    return true;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            false
        }
    }
}

async fn status_ok(addr: &ServiceAddr) -> bool {
    let url = addr.status_url();
    let result = tokio::task::spawn_blocking(move || {
        http::agent(PROBE_TIMEOUT)
            .get(&url)
            .call()
            .map(|r| r.status().as_u16())
    })
    .await;

    match result {
        Ok(Ok(status)) => status == 200,
        Ok(Err(e)) => {
            debug!("Status probe failed: {}", e);
            false
        }
        Err(_) => false,
    }
}

async fn tcp_open(addr: &ServiceAddr) -> bool {
    let target = (addr.host.as_str(), addr.port);
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(target)).await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn serve_status(status: u16) -> ServiceAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                    status
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        ServiceAddr::new("127.0.0.1", port)
    }

    fn closed_addr() -> ServiceAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        ServiceAddr::new("127.0.0.1", port)
    }

    #[test]
    fn launch_args_enable_all_features() {
        let addr = ServiceAddr::new("127.0.0.1", 8000);
        assert_eq!(
            launch_args(&addr),
            vec!["--address", "127.0.0.1:8000", "--ocr", "--det", "--slide", "--mcp"]
        );
    }

    #[test]
    fn addr_urls() {
        let addr = ServiceAddr::new("127.0.0.1", 9898);
        assert_eq!(addr.to_string(), "127.0.0.1:9898");
        assert_eq!(addr.status_url(), "http://127.0.0.1:9898/status");
        assert_eq!(addr.mcp_url(), "http://127.0.0.1:9898/mcp");
        assert_eq!(addr.docs_url(), "http://127.0.0.1:9898/docs");
    }

    #[test]
    fn readiness_serde_lowercase() {
        let r: Readiness = serde_json::from_str("\"tcp\"").unwrap();
        assert_eq!(r, Readiness::Tcp);
        assert_eq!(Readiness::default().to_string(), "poll");
    }

    #[tokio::test]
    async fn poll_probe_accepts_200() {
        let addr = serve_status(200);
        assert!(is_running(&addr, Readiness::Poll).await);
    }

    #[tokio::test]
    async fn poll_probe_rejects_non_200() {
        let addr = serve_status(503);
        assert!(!is_running(&addr, Readiness::Poll).await);
    }

    #[tokio::test]
    async fn tcp_probe_detects_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = ServiceAddr::new("127.0.0.1", listener.local_addr().unwrap().port());
        assert!(is_running(&addr, Readiness::Tcp).await);
    }

    #[tokio::test]
    async fn probes_fail_on_closed_port() {
        let addr = closed_addr();
        assert!(!is_running(&addr, Readiness::Tcp).await);
        assert!(!is_running(&addr, Readiness::Poll).await);
    }

    #[tokio::test]
    async fn wait_gives_up_after_timeout() {
        let addr = closed_addr();
        let started = std::time::Instant::now();
        assert!(!wait_until_ready(&addr, Readiness::Poll, 2).await);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn spawn_detached_writes_log() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let exe = temp.path().join("ddddocr");
        std::fs::write(&exe, "#!/bin/sh\necho \"args: $*\"\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        let log = temp.path().join("service.log");

        let handle = spawn_detached(&exe, &ServiceAddr::new("127.0.0.1", 8000), &log).unwrap();
        assert!(handle.pid > 0);

        let mut content = String::new();
        for _ in 0..50 {
            content = std::fs::read_to_string(&log).unwrap_or_default();
            if !content.is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        assert!(content.contains("--address 127.0.0.1:8000 --ocr --det --slide --mcp"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn spawned_service_leads_its_own_session() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let exe = temp.path().join("ddddocr");
        std::fs::write(&exe, "#!/bin/sh\ncat /proc/$$/stat\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        let log = temp.path().join("service.log");

        let handle = spawn_detached(&exe, &ServiceAddr::new("127.0.0.1", 8000), &log).unwrap();

        let mut content = String::new();
        for _ in 0..50 {
            content = std::fs::read_to_string(&log).unwrap_or_default();
            if content.ends_with('\n') {
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        // pid (comm) state ppid pgrp session ...
        let after_comm = content.rsplit_once(") ").unwrap().1;
        let fields: Vec<&str> = after_comm.split_whitespace().collect();
        let pid = handle.pid.to_string();
        assert_eq!(fields[2], pid, "process group");
        assert_eq!(fields[3], pid, "session");
    }

    #[test]
    fn spawn_missing_executable_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = spawn_detached(
            &temp.path().join("nope"),
            &ServiceAddr::new("127.0.0.1", 8000),
            &temp.path().join("service.log"),
        )
        .unwrap_err();
        assert!(matches!(err, DdddError::CommandFailed { .. }));
    }
}
