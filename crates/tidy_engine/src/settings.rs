//! Settings shortcuts - ask the OS to open a settings page by URI.
//!
//! Fire and forget: success means the OS accepted the request, not that the
//! user did anything with the page.

use std::future::Future;
use std::process::Stdio;
use tidy_common::{Result, TidyError};
use tokio::process::Command;
use tracing::info;

pub trait SettingsOpener: Send + Sync {
    fn open(&self, uri: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Hands the URI to the platform's URI launcher
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl SystemOpener {
    fn command(uri: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", uri]);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(uri);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(uri);
            cmd
        }
    }
}

impl SettingsOpener for SystemOpener {
    async fn open(&self, uri: &str) -> Result<()> {
        info!("Opening settings page {}", uri);
        let status = Self::command(uri)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| TidyError::Settings(format!("cannot open {}: {}", uri, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(TidyError::Settings(format!(
                "opening {} failed with code {:?}",
                uri,
                status.code()
            )))
        }
    }
}
