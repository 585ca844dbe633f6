//! Opening the approval URL in the user's browser.

use crate::error::{LicenseError, LicenseResult};
use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Presents a URL to the user.
pub trait UrlLauncher: Send + Sync {
    fn launch(&self, url: &str) -> LicenseResult<()>;
}

/// Spawns a process that opens `url`. Returns once the process is started.
pub type LaunchFn = fn(&str) -> io::Result<()>;

/// Launchers keyed by `std::env::consts::OS`.
pub const LAUNCHERS: [(&str, LaunchFn); 3] = [
    ("windows", launch_windows),
    ("linux", launch_linux),
    ("macos", launch_macos),
];

/// Returns the launcher registered for `platform`.
#[must_use]
pub fn launcher_for(platform: &str) -> Option<LaunchFn> {
    LAUNCHERS
        .iter()
        .find(|(name, _)| *name == platform)
        .map(|(_, launch)| *launch)
}

/// Opens URLs with the platform's default browser.
///
/// The native launcher is tried first. If it fails, every registered
/// launcher is tried in turn. Unknown platforms fail without spawning
/// anything.
#[derive(Debug, Clone, Copy)]
pub struct SystemBrowser {
    platform: &'static str,
}

impl SystemBrowser {
    /// A launcher for the current platform.
    #[must_use]
    pub fn new() -> Self {
        Self::for_platform(std::env::consts::OS)
    }

    /// A launcher that behaves as if running on `platform`.
    #[must_use]
    pub fn for_platform(platform: &'static str) -> Self {
        Self { platform }
    }
}

impl Default for SystemBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlLauncher for SystemBrowser {
    fn launch(&self, url: &str) -> LicenseResult<()> {
        let Some(native) = launcher_for(self.platform) else {
            return Err(LicenseError::Launch(format!(
                "unsupported platform {:?}",
                self.platform
            )));
        };

        let mut last_error = match native(url) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        debug!(platform = self.platform, error = %last_error, "native browser launch failed");

        for (name, launch) in LAUNCHERS {
            match launch(url) {
                Ok(()) => {
                    debug!(launcher = name, "browser opened by fallback launcher");
                    return Ok(());
                }
                Err(e) => last_error = e,
            }
        }

        Err(LicenseError::Launch(last_error.to_string()))
    }
}

/// Starts `command` without waiting for it. A background thread waits on
/// the child so it is reaped once it exits.
fn spawn_detached(command: &mut Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    thread::Builder::new()
        .name("browser-launch".to_string())
        .spawn(move || child.wait())
}

fn launch_windows(url: &str) -> io::Result<()> {
    // `start` treats `&` as a command separator.
    let escaped = url.replace('&', "^&");
    spawn_detached(Command::new("cmd").args(["/C", "start", "", &escaped])).map(drop)
}

fn launch_linux(url: &str) -> io::Result<()> {
    spawn_detached(Command::new("xdg-open").arg(url)).map(drop)
}

fn launch_macos(url: &str) -> io::Result<()> {
    spawn_detached(Command::new("open").arg(url)).map(drop)
}
