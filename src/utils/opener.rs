//! Hands a file to the platform's default viewer.

use std::path::Path;
use std::process::{Command, Stdio};

/// Program and leading arguments used to open a path on this platform.
pub fn platform_opener() -> (&'static str, &'static [&'static str]) {
    #[cfg(target_os = "macos")]
    {
        ("open", &[])
    }
    #[cfg(target_os = "windows")]
    {
        // `start` treats the first quoted argument as a window title.
        ("cmd", &["/C", "start", ""])
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        ("xdg-open", &[])
    }
}

pub fn open_path(path: &Path) -> Result<(), String> {
    let (cmd, args) = platform_opener();
    open_with(cmd, args, path)
}

/// Spawns `cmd args... path` without waiting for the viewer to exit.
pub fn open_with(cmd: &str, args: &[&str], path: &Path) -> Result<(), String> {
    Command::new(cmd)
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| format!("Opener `{cmd}` not available: {e}"))
}
