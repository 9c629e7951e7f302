//! Tool identifiers and alias normalization.
//!
//! Every maintenance action has a short and a hyphenated long alias
//! (`dism` / `dism-repair`). Both forms collapse to one `ToolId` here so the
//! descriptor table only ever sees canonical keys.

use crate::error::{Result, TidyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    Dism,
    Sfc,
    DiskCleanup,
    TempFiles,
    DnsFlush,
    SystemInfo,
    WindowsUpdate,
    DisplaySettings,
}

impl ToolId {
    /// Menu order
    pub const ALL: [ToolId; 8] = [
        ToolId::Dism,
        ToolId::Sfc,
        ToolId::DiskCleanup,
        ToolId::TempFiles,
        ToolId::DnsFlush,
        ToolId::SystemInfo,
        ToolId::WindowsUpdate,
        ToolId::DisplaySettings,
    ];

    /// Short form, also the key used in `[tools.<name>]` config tables
    pub fn canonical(&self) -> &'static str {
        self.aliases()[0]
    }

    pub fn aliases(&self) -> [&'static str; 2] {
        match self {
            ToolId::Dism => ["dism", "dism-repair"],
            ToolId::Sfc => ["sfc", "sfc-scan"],
            ToolId::DiskCleanup => ["diskcleanup", "disk-cleanup"],
            ToolId::TempFiles => ["tempfiles", "temp-files"],
            ToolId::DnsFlush => ["dnsflush", "dns-flush"],
            ToolId::SystemInfo => ["systeminfo", "system-info"],
            ToolId::WindowsUpdate => ["windowsupdate", "windows-update"],
            ToolId::DisplaySettings => ["displaysettings", "display-settings"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToolId::Dism => "DISM Repair",
            ToolId::Sfc => "SFC Scan",
            ToolId::DiskCleanup => "Disk Cleanup",
            ToolId::TempFiles => "Temporary Files",
            ToolId::DnsFlush => "DNS Flush",
            ToolId::SystemInfo => "System Info",
            ToolId::WindowsUpdate => "Windows Update",
            ToolId::DisplaySettings => "Display Settings",
        }
    }

    /// Normalize a caller-supplied identifier.
    ///
    /// Matching is ASCII case-insensitive and ignores surrounding whitespace.
    /// The error keeps the identifier exactly as the caller sent it.
    pub fn parse_alias(identifier: &str) -> Result<ToolId> {
        let wanted = identifier.trim();
        ToolId::ALL
            .into_iter()
            .find(|tool| {
                tool.aliases()
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| TidyError::UnknownTool(identifier.to_string()))
    }
}

impl FromStr for ToolId {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self> {
        ToolId::parse_alias(s)
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}
