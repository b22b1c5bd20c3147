//! WebDriver server process launch and readiness probing.

use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{EkosError, Result};

const READY_ATTEMPTS: u32 = 25;
const READY_INTERVAL: Duration = Duration::from_millis(200);

/// A running WebDriver server owned by the session.
pub(super) struct DriverServer {
    child: Child,
    pub(super) port: u16,
}

impl DriverServer {
    pub(super) fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Terminates the server process. Failures are logged, not propagated.
    pub(super) fn shutdown(&mut self) {
        if let Err(err) = self.child.kill() {
            warn!(target = "ekos", error = %err, port = self.port, "failed to kill geckodriver");
        }
        let _ = self.child.wait();
    }
}

/// Spawns `geckodriver` on an ephemeral port and waits until its `/status`
/// endpoint reports ready.
pub(super) async fn spawn_geckodriver(driver_path: &Path) -> Result<DriverServer> {
    let port = free_port()?;

    let mut cmd = Command::new(driver_path);
    cmd.args(["--port", &port.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| {
        EkosError::SessionInit(format!("failed to launch {}: {e}", driver_path.display()))
    })?;

    let mut last_error = "endpoint not reachable".to_string();
    for _ in 0..READY_ATTEMPTS {
        tokio::time::sleep(READY_INTERVAL).await;

        if let Ok(Some(status)) = child.try_wait() {
            return Err(EkosError::SessionInit(format!(
                "geckodriver exited before becoming ready (status: {status})"
            )));
        }

        match probe_status(port).await {
            Ok(()) => {
                debug!(target = "ekos", port, "geckodriver ready");
                return Ok(DriverServer { child, port });
            }
            Err(e) => {
                last_error = e;
                continue;
            }
        }
    }

    let _ = child.kill();
    let _ = child.wait();
    Err(EkosError::SessionInit(format!(
        "geckodriver not ready on port {port}: {last_error}"
    )))
}

/// `/status` response subset from the WebDriver server.
#[derive(Debug, Deserialize)]
struct DriverStatus {
    value: DriverStatusValue,
}

#[derive(Debug, Deserialize)]
struct DriverStatusValue {
    ready: bool,
}

async fn probe_status(port: u16) -> std::result::Result<(), String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(400))
        .build()
        .map_err(|e| e.to_string())?;

    let response = client
        .get(format!("http://127.0.0.1:{port}/status"))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("unexpected status {}", response.status()));
    }

    let status: DriverStatus = response.json().await.map_err(|e| e.to_string())?;
    if status.value.ready {
        Ok(())
    } else {
        Err("server reports not ready".to_string())
    }
}

fn free_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .map_err(|e| EkosError::SessionInit(format!("no free local port: {e}")))?;
    let port = listener
        .local_addr()
        .map_err(|e| EkosError::SessionInit(format!("no free local port: {e}")))?
        .port();
    Ok(port)
}
