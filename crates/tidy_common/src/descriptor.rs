//! Command descriptors and the descriptor table.
//!
//! The table is built once at startup and is read-only afterwards. Each
//! descriptor carries a tagged action that decides which executor runs it.

use crate::config::{Config, ToolOverride};
use crate::error::{Result, TidyError};
use crate::tool::ToolId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Exit code reported by a process that exited normally
pub const SUCCESS_EXIT_CODE: i32 = 0;

/// ERROR_ELEVATION_REQUIRED
pub const PRIVILEGED_EXIT_CODE: i32 = 740;

/// Default age threshold for the temp-file sweep
pub const DEFAULT_SWEEP_MIN_AGE: Duration = Duration::from_secs(86_400);

/// Which executor handles a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToolKind {
    NativeProcess,
    FilesystemSweep,
    SettingsShortcut,
    SystemReport,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolKind::NativeProcess => "process",
            ToolKind::FilesystemSweep => "sweep",
            ToolKind::SettingsShortcut => "settings",
            ToolKind::SystemReport => "report",
        };
        f.write_str(name)
    }
}

/// How a finished process is turned into an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultPolicy {
    /// success / elevation / failure by exit code
    Classify,
    /// The program opens its own UI; any exit after a good launch is success
    LaunchOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub success_exit_code: i32,
    pub privileged_exit_code: i32,
    pub policy: ResultPolicy,
    /// Output reported for a `LaunchOnly` run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_note: Option<String>,
}

impl ProcessSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            success_exit_code: SUCCESS_EXIT_CODE,
            privileged_exit_code: PRIVILEGED_EXIT_CODE,
            policy: ResultPolicy::Classify,
            launch_note: None,
        }
    }

    /// Success once launched; `note` becomes the run's output
    pub fn launch_only(mut self, note: &str) -> Self {
        self.policy = ResultPolicy::LaunchOnly;
        self.launch_note = Some(note.to_string());
        self
    }

    fn apply(&mut self, over: &ToolOverride) {
        if let Some(program) = &over.program {
            self.program = program.clone();
        }
        if let Some(args) = &over.args {
            self.args = args.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepSpec {
    /// Scanned in order; missing entries are skipped at sweep time
    pub directories: Vec<PathBuf>,
    pub min_age: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ToolAction {
    Process(ProcessSpec),
    Sweep(SweepSpec),
    Settings { uri: String },
    SystemReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    pub tool: ToolId,
    /// Shown on success
    pub success_message: String,
    pub action: ToolAction,
}

impl CommandDescriptor {
    pub fn new(tool: ToolId, success_message: &str, action: ToolAction) -> Self {
        Self {
            tool,
            success_message: success_message.to_string(),
            action,
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self.action {
            ToolAction::Process(_) => ToolKind::NativeProcess,
            ToolAction::Sweep(_) => ToolKind::FilesystemSweep,
            ToolAction::Settings { .. } => ToolKind::SettingsShortcut,
            ToolAction::SystemReport => ToolKind::SystemReport,
        }
    }
}

/// Lookup table from tool to descriptor
#[derive(Debug, Clone, Default)]
pub struct ToolTable {
    descriptors: HashMap<ToolId, CommandDescriptor>,
}

impl ToolTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The stock Windows maintenance menu, with config overrides applied
    pub fn builtin(config: &Config) -> Self {
        let min_age = Duration::from_secs(config.sweep.min_age_secs);
        let mut directories = standard_temp_dirs();
        directories.extend(config.sweep.extra_dirs.iter().cloned());

        let mut table = Self::empty()
            .with_descriptor(CommandDescriptor::new(
                ToolId::Dism,
                "DISM repair completed successfully",
                ToolAction::Process(ProcessSpec::new(
                    "dism.exe",
                    &["/Online", "/Cleanup-Image", "/RestoreHealth"],
                )),
            ))
            .with_descriptor(CommandDescriptor::new(
                ToolId::Sfc,
                "SFC scan completed successfully",
                ToolAction::Process(ProcessSpec::new("sfc", &["/scannow"])),
            ))
            .with_descriptor(CommandDescriptor::new(
                ToolId::DiskCleanup,
                "Disk Cleanup started. It may take several minutes.",
                ToolAction::Process(ProcessSpec::new("cleanmgr", &["/sagerun:1"])
                    .launch_only("The Disk Cleanup window has opened.")),
            ))
            .with_descriptor(CommandDescriptor::new(
                ToolId::TempFiles,
                "Temporary files cleaned",
                ToolAction::Sweep(SweepSpec {
                    directories: dedup_paths(directories),
                    min_age,
                }),
            ))
            .with_descriptor(CommandDescriptor::new(
                ToolId::DnsFlush,
                "DNS cache flushed successfully",
                ToolAction::Process(ProcessSpec::new("ipconfig", &["/flushdns"])),
            ))
            .with_descriptor(CommandDescriptor::new(
                ToolId::SystemInfo,
                "System information",
                ToolAction::SystemReport,
            ))
            .with_descriptor(CommandDescriptor::new(
                ToolId::WindowsUpdate,
                "Windows Update opened",
                ToolAction::Settings {
                    uri: "ms-settings:windowsupdate".to_string(),
                },
            ))
            .with_descriptor(CommandDescriptor::new(
                ToolId::DisplaySettings,
                "Display settings opened",
                ToolAction::Settings {
                    uri: "ms-settings:display".to_string(),
                },
            ));

        for (name, over) in &config.tools {
            table.apply_override(name, over);
        }
        table
    }

    /// Insert or replace the descriptor for its tool
    pub fn with_descriptor(mut self, descriptor: CommandDescriptor) -> Self {
        self.descriptors.insert(descriptor.tool, descriptor);
        self
    }

    fn apply_override(&mut self, name: &str, over: &ToolOverride) {
        let tool = match ToolId::parse_alias(name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!("Ignoring override [tools.{}]: {}", name, e);
                return;
            }
        };
        match self.descriptors.get_mut(&tool).map(|d| &mut d.action) {
            Some(ToolAction::Process(spec)) => spec.apply(over),
            Some(_) => warn!("Ignoring override [tools.{}]: not a process tool", name),
            None => warn!("Ignoring override [tools.{}]: tool not in table", name),
        }
    }

    pub fn resolve(&self, identifier: &str) -> Result<&CommandDescriptor> {
        let tool = ToolId::parse_alias(identifier)?;
        self.get(tool)
            .ok_or_else(|| TidyError::UnknownTool(identifier.to_string()))
    }

    pub fn get(&self, tool: ToolId) -> Option<&CommandDescriptor> {
        self.descriptors.get(&tool)
    }

    /// Descriptors in menu order
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        ToolId::ALL.into_iter().filter_map(|tool| self.descriptors.get(&tool))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// TEMP, TMP, LOCALAPPDATA\Temp and, on Windows, SystemRoot\Temp.
/// Unset variables are dropped.
fn standard_temp_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = ["TEMP", "TMP"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .collect();

    if let Some(local) = std::env::var_os("LOCALAPPDATA").filter(|v| !v.is_empty()) {
        dirs.push(PathBuf::from(local).join("Temp"));
    }

    if cfg!(windows) {
        let root = std::env::var_os("SystemRoot")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Windows"));
        dirs.push(root.join("Temp"));
    }

    dirs
}

fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = Vec::with_capacity(paths.len());
    for path in paths {
        if !seen.contains(&path) {
            seen.push(path);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_same_descriptor() {
        let table = ToolTable::builtin(&Config::default());
        for tool in ToolId::ALL {
            let [short, long] = tool.aliases();
            let a = table.resolve(short).unwrap();
            let b = table.resolve(long).unwrap();
            assert!(std::ptr::eq(a, b), "{} and {} differ", short, long);
            assert_eq!(a.tool, tool);
        }
    }

    #[test]
    fn test_builtin_covers_every_tool() {
        let table = ToolTable::builtin(&Config::default());
        assert_eq!(table.len(), ToolId::ALL.len());
        let order: Vec<ToolId> = table.iter().map(|d| d.tool).collect();
        assert_eq!(order, ToolId::ALL.to_vec());
    }

    #[test]
    fn test_builtin_kinds() {
        let table = ToolTable::builtin(&Config::default());
        let kind = |id: &str| table.resolve(id).unwrap().kind();
        assert_eq!(kind("dism"), ToolKind::NativeProcess);
        assert_eq!(kind("sfc"), ToolKind::NativeProcess);
        assert_eq!(kind("dnsflush"), ToolKind::NativeProcess);
        assert_eq!(kind("diskcleanup"), ToolKind::NativeProcess);
        assert_eq!(kind("tempfiles"), ToolKind::FilesystemSweep);
        assert_eq!(kind("windowsupdate"), ToolKind::SettingsShortcut);
        assert_eq!(kind("displaysettings"), ToolKind::SettingsShortcut);
        assert_eq!(kind("systeminfo"), ToolKind::SystemReport);
    }

    #[test]
    fn test_dism_invocation_and_exit_codes() {
        let table = ToolTable::builtin(&Config::default());
        match &table.resolve("dism-repair").unwrap().action {
            ToolAction::Process(spec) => {
                assert_eq!(spec.program, "dism.exe");
                assert_eq!(spec.args, vec!["/Online", "/Cleanup-Image", "/RestoreHealth"]);
                assert_eq!(spec.success_exit_code, 0);
                assert_eq!(spec.privileged_exit_code, 740);
                assert_eq!(spec.policy, ResultPolicy::Classify);
            }
            other => panic!("unexpected action {:?}", other),
        }
        match &table.resolve("disk-cleanup").unwrap().action {
            ToolAction::Process(spec) => {
                assert_eq!(spec.policy, ResultPolicy::LaunchOnly);
                assert_eq!(spec.launch_note.as_deref(), Some("The Disk Cleanup window has opened."));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tool() {
        let table = ToolTable::builtin(&Config::default());
        match table.resolve("defrag") {
            Err(TidyError::UnknownTool(id)) => assert_eq!(id, "defrag"),
            other => panic!("expected UnknownTool, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_descriptor_is_unknown() {
        let table = ToolTable::empty();
        assert!(matches!(table.resolve("sfc"), Err(TidyError::UnknownTool(_))));
    }

    #[test]
    fn test_overrides_replace_process_invocation() {
        let config = Config::from_toml(
            r#"
            [tools.sfc-scan]
            program = "sh"
            args = ["-c", "echo ok"]

            [tools.dism]
            args = ["/Online"]

            [tools.tempfiles]
            program = "ignored"

            [tools.defrag]
            program = "ignored"
            "#,
        )
        .unwrap();
        let table = ToolTable::builtin(&config);

        match &table.resolve("sfc").unwrap().action {
            ToolAction::Process(spec) => {
                assert_eq!(spec.program, "sh");
                assert_eq!(spec.args, vec!["-c", "echo ok"]);
            }
            other => panic!("unexpected action {:?}", other),
        }
        match &table.resolve("dism").unwrap().action {
            ToolAction::Process(spec) => {
                assert_eq!(spec.program, "dism.exe");
                assert_eq!(spec.args, vec!["/Online"]);
            }
            other => panic!("unexpected action {:?}", other),
        }
        assert_eq!(table.resolve("tempfiles").unwrap().kind(), ToolKind::FilesystemSweep);
    }

    #[test]
    fn test_sweep_uses_config() {
        let mut config = Config::default();
        config.sweep.min_age_secs = 60;
        config.sweep.extra_dirs = vec![PathBuf::from("/srv/scratch"), PathBuf::from("/srv/scratch")];
        let table = ToolTable::builtin(&config);
        match &table.resolve("temp-files").unwrap().action {
            ToolAction::Sweep(spec) => {
                assert_eq!(spec.min_age, Duration::from_secs(60));
                let hits = spec
                    .directories
                    .iter()
                    .filter(|d| d.as_path() == std::path::Path::new("/srv/scratch"))
                    .count();
                assert_eq!(hits, 1);
                assert_eq!(spec.directories.last().unwrap(), &PathBuf::from("/srv/scratch"));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let paths = vec![
            PathBuf::from("/a"),
            PathBuf::from("/b"),
            PathBuf::from("/a"),
            PathBuf::from("/c"),
        ];
        assert_eq!(
            dedup_paths(paths),
            vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
    }
}
