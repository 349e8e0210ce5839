//! Hand artifacts to the desktop: open a file, or reveal its folder

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Open a file with the platform's default application
pub fn open_file(path: &Path) -> Result<()> {
    launch(path)
}

/// Open the directory containing `path`
pub fn reveal(path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("{} has no parent directory", path.display()))?;
    launch(dir)
}

fn launch(target: &Path) -> Result<()> {
    let mut cmd = opener();
    cmd.arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    debug!("Opening {} with {:?}", target.display(), cmd.get_program());

    // Not waited on; the viewer outlives us
    cmd.spawn()
        .with_context(|| format!("Failed to open {}", target.display()))?;
    Ok(())
}

fn opener() -> Command {
    #[cfg(target_os = "windows")]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        return cmd;
    }

    #[cfg(target_os = "macos")]
    {
        return Command::new("open");
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Command::new("xdg-open")
    }
}
