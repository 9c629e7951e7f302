//! Tool dispatcher - the single entry point callers use to run a tool.
//!
//! Per call: resolve the identifier, hand the descriptor to its executor,
//! and return one `RunOutcome`. Nothing escapes as an error or a panic:
//! unknown tools, executor failures and crashed executor tasks all come
//! back as `success: false` outcomes.

use crate::relay::OutputRelay;
use crate::report::SystemReport;
use crate::runner::ProcessRunner;
use crate::settings::{SettingsOpener, SystemOpener};
use crate::sweeper;
use std::sync::Arc;
use tidy_common::{CommandDescriptor, Result, RunOutcome, TidyError, ToolAction, ToolTable};
use tracing::{info, instrument, warn};

pub struct Dispatcher<O = SystemOpener> {
    table: Arc<ToolTable>,
    relay: Arc<OutputRelay>,
    runner: ProcessRunner,
    opener: Arc<O>,
}

impl Dispatcher<SystemOpener> {
    /// Dispatcher wired to the real OS
    pub fn new(table: ToolTable, relay: Arc<OutputRelay>) -> Self {
        let runner = ProcessRunner::new(relay.clone());
        Self::with_parts(table, relay, runner, SystemOpener)
    }
}

impl<O: SettingsOpener + 'static> Dispatcher<O> {
    pub fn with_parts(table: ToolTable, relay: Arc<OutputRelay>, runner: ProcessRunner, opener: O) -> Self {
        Self {
            table: Arc::new(table),
            relay,
            runner,
            opener: Arc::new(opener),
        }
    }

    pub fn table(&self) -> &ToolTable {
        &self.table
    }

    /// Relay carrying live stdout of process-backed tools
    pub fn relay(&self) -> &Arc<OutputRelay> {
        &self.relay
    }

    #[instrument(skip(self))]
    pub async fn dispatch(&self, identifier: &str) -> RunOutcome {
        let descriptor = match self.table.resolve(identifier) {
            Ok(descriptor) => descriptor.clone(),
            Err(e) => {
                warn!("{}", e);
                return RunOutcome::from_error(&e);
            }
        };

        info!("Running tool: {} [{}]", descriptor.tool.label(), descriptor.kind());
        let tool = descriptor.tool;

        match self.execute(descriptor).await {
            Ok(outcome) => {
                info!("{} finished: {:?}", tool, outcome.status());
                outcome
            }
            Err(e) => {
                warn!("{} aborted: {}", tool, e);
                RunOutcome::from_error(&e)
            }
        }
    }

    /// Run the executor for `descriptor` on its own task
    async fn execute(&self, descriptor: CommandDescriptor) -> Result<RunOutcome> {
        let CommandDescriptor {
            tool,
            success_message,
            action,
        } = descriptor;

        let task = match action {
            ToolAction::Process(spec) => {
                let runner = self.runner.clone();
                tokio::spawn(async move { runner.run(&spec, &success_message).await })
            }
            ToolAction::Sweep(spec) => {
                tokio::spawn(async move { RunOutcome::from(sweeper::sweep(&spec).await) })
            }
            ToolAction::Settings { uri } => {
                let opener = self.opener.clone();
                tokio::spawn(async move {
                    match opener.open(&uri).await {
                        Ok(()) => RunOutcome::succeeded(success_message, Some(format!("Opened {}", uri))),
                        Err(e) => RunOutcome::from_error(&e),
                    }
                })
            }
            ToolAction::SystemReport => tokio::task::spawn_blocking(move || {
                RunOutcome::succeeded(success_message, Some(SystemReport::collect().render()))
            }),
        };

        task.await
            .map_err(|e| TidyError::Internal(format!("{} executor did not finish: {}", tool, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tidy_common::{Config, OutcomeStatus, ToolId};

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl SettingsOpener for Arc<RecordingOpener> {
        async fn open(&self, uri: &str) -> Result<()> {
            self.opened.lock().unwrap().push(uri.to_string());
            Ok(())
        }
    }

    struct FailingOpener;

    impl SettingsOpener for FailingOpener {
        async fn open(&self, uri: &str) -> Result<()> {
            Err(TidyError::Settings(format!("no handler for {}", uri)))
        }
    }

    struct PanickingOpener;

    impl SettingsOpener for PanickingOpener {
        async fn open(&self, _uri: &str) -> Result<()> {
            panic!("opener blew up");
        }
    }

    fn dispatcher_with<O: SettingsOpener + 'static>(opener: O) -> Dispatcher<O> {
        let relay = Arc::new(OutputRelay::new());
        let runner = ProcessRunner::new(relay.clone());
        Dispatcher::with_parts(ToolTable::builtin(&Config::default()), relay, runner, opener)
    }

    #[tokio::test]
    async fn test_unknown_tool_is_outcome() {
        let dispatcher = dispatcher_with(FailingOpener);
        let outcome = dispatcher.dispatch("defrag").await;
        assert!(!outcome.success());
        assert!(!outcome.requires_elevated_privilege());
        assert!(outcome.error().unwrap().contains("defrag"));
    }

    #[tokio::test]
    async fn test_settings_shortcut_reports_success() {
        let opener = Arc::new(RecordingOpener::default());
        let dispatcher = dispatcher_with(opener.clone());

        let outcome = dispatcher.dispatch("windows-update").await;
        assert!(outcome.success());
        assert_eq!(outcome.message(), Some("Windows Update opened"));

        dispatcher.dispatch("displaysettings").await;
        assert_eq!(
            *opener.opened.lock().unwrap(),
            vec!["ms-settings:windowsupdate", "ms-settings:display"]
        );
    }

    #[tokio::test]
    async fn test_settings_failure_is_plain_failure() {
        let dispatcher = dispatcher_with(FailingOpener);
        let outcome = dispatcher.dispatch("display-settings").await;
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.error().unwrap().contains("ms-settings:display"));
    }

    #[tokio::test]
    async fn test_panicking_executor_is_contained() {
        let dispatcher = dispatcher_with(PanickingOpener);
        let outcome = dispatcher.dispatch("windowsupdate").await;
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.error().unwrap().contains("windowsupdate"));
    }

    #[tokio::test]
    async fn test_system_report() {
        let dispatcher = dispatcher_with(FailingOpener);
        let outcome = dispatcher.dispatch("system-info").await;
        assert!(outcome.success());
        assert!(outcome.output().unwrap().starts_with("Hostname: "));
        assert_eq!(dispatcher.table().get(ToolId::SystemInfo).unwrap().tool, ToolId::SystemInfo);
    }
}
