//! Machine codes and device names.
//!
//! A machine code is a stable hash of hardware identifiers. Signed license
//! payloads may restrict themselves to a list of machine codes, and the
//! authorization request tells the user which device is asking.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;

/// Identifier of a specific device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineCode(String);

impl MachineCode {
    /// Wraps an existing machine code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Derives the machine code of the current device.
    ///
    /// Combines several hardware identifiers into an id that survives
    /// reboots but changes if the hardware changes significantly.
    #[must_use]
    pub fn current() -> Self {
        let combined = collect_hardware_ids().join("|");
        let hash = Sha256::digest(combined.as_bytes());
        Self(hex::encode(hash))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MachineCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name shown to the user on the approval page.
#[must_use]
pub fn device_name() -> String {
    get_hostname()
}

fn collect_hardware_ids() -> Vec<String> {
    let mut ids = vec![
        env::consts::OS.to_string(),
        env::consts::ARCH.to_string(),
        get_hostname(),
    ];

    if let Some(machine_id) = get_machine_id() {
        ids.push(machine_id);
    }

    if let Ok(user) = env::var("USER").or_else(|_| env::var("USERNAME")) {
        ids.push(user);
    }

    ids
}

fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// The OS-assigned machine identifier, where the platform has one.
#[cfg(target_os = "linux")]
fn get_machine_id() -> Option<String> {
    ["/etc/machine-id", "/var/lib/dbus/machine-id"]
        .into_iter()
        .find_map(|path| std::fs::read_to_string(path).ok())
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

#[cfg(target_os = "macos")]
fn get_machine_id() -> Option<String> {
    let output = command_stdout("ioreg", &["-rd1", "-c", "IOPlatformExpertDevice"])?;
    let line = output.lines().find(|l| l.contains("IOPlatformUUID"))?;
    // "IOPlatformUUID" = "XXXXXXXX-..."
    line.split('"').nth(3).map(str::to_owned)
}

#[cfg(target_os = "windows")]
fn get_machine_id() -> Option<String> {
    let output = command_stdout(
        "reg",
        &["query", r"HKLM\SOFTWARE\Microsoft\Cryptography", "/v", "MachineGuid"],
    )?;
    let line = output.lines().find(|l| l.contains("MachineGuid"))?;
    line.split_whitespace().last().map(str::to_owned)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn get_machine_id() -> Option<String> {
    None
}

#[cfg(any(target_os = "macos", target_os = "windows"))]
fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let output = std::process::Command::new(program).args(args).output().ok()?;
    String::from_utf8(output.stdout).ok()
}
