//! Common utilities for integration tests
//!
//! Cleanup guards and readiness helpers shared by the server tests.

use std::process::Command;
use std::thread;
use std::time::Duration;

/// Guard that ensures Docker container cleanup on drop (even on panic)
pub struct ContainerGuard {
    name: String,
}

impl ContainerGuard {
    pub fn new(name: &str) -> Self {
        // Leftovers from an aborted earlier run
        cleanup_container(name);
        Self {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        cleanup_container(&self.name);
    }
}

/// Helper to stop and remove a Docker container
/// The -v flag also removes anonymous volumes associated with the container
fn cleanup_container(name: &str) {
    let _ = Command::new("docker").args(["stop", name]).output();
    let _ = Command::new("docker").args(["rm", "-v", name]).output();
}

/// Helper to check if Docker is available
pub fn is_docker_available() -> bool {
    Command::new("docker")
        .args(["ps"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Whether a dump tool is installed on the host
pub fn is_tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run a command inside the container, returning stdout
pub fn docker_exec(container: &str, args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new("docker")
        .arg("exec")
        .arg(container)
        .args(args)
        .output()?;

    if !output.status.success() {
        anyhow::bail!(
            "docker exec {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Poll `check` once a second until it succeeds or `attempts` run out
pub fn wait_until(attempts: u32, mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..attempts {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_secs(1));
    }
    false
}
