//! Docker compose invocation
//!
//! Two command forms exist in the wild: the `docker compose` CLI plugin and
//! the legacy standalone `docker-compose` binary. The plugin is preferred.

use crate::error::{DependencyError, OrchestratorError};
use crate::process::{CommandSpec, ProcessRunner};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCommand {
    Plugin,
    Standalone,
}

impl ComposeCommand {
    /// Detect which compose form is usable on this host
    pub fn detect(runner: &dyn ProcessRunner) -> Result<Self, DependencyError> {
        let plugin = CommandSpec::new("docker").args(["compose", "version"]);
        match runner.run(&plugin) {
            Ok(output) if output.success() => {
                log::debug!("Using docker compose plugin: {}", output.stdout.trim());
                return Ok(ComposeCommand::Plugin);
            }
            Ok(output) => log::debug!("docker compose unavailable: {}", output.stderr.trim()),
            Err(e) => log::debug!("docker not runnable: {e}"),
        }

        if runner.is_available("docker-compose") {
            let standalone = CommandSpec::new("docker-compose").arg("version");
            if let Ok(output) = runner.run(&standalone) {
                if output.success() {
                    log::debug!("Using standalone docker-compose: {}", output.stdout.trim());
                    return Ok(ComposeCommand::Standalone);
                }
            }
        }

        Err(DependencyError::Missing {
            tool: "docker compose".to_string(),
            hint: "Install Docker with the compose plugin (or docker-compose) and rerun.".to_string(),
        })
    }

    fn command(&self, install_dir: &Path) -> CommandSpec {
        let spec = match self {
            ComposeCommand::Plugin => CommandSpec::new("docker").arg("compose"),
            ComposeCommand::Standalone => CommandSpec::new("docker-compose"),
        };
        spec.current_dir(install_dir)
    }

    /// Command line an operator can run by hand from the install directory
    pub fn manual_start_command(&self, install_dir: &Path) -> String {
        format!("cd {} && {self} up -d", install_dir.display())
    }

    /// Pull images, then start the services detached. Blocks until both finish.
    pub fn pull_and_start(
        &self,
        runner: &dyn ProcessRunner,
        install_dir: &Path,
    ) -> Result<(), OrchestratorError> {
        for step in [vec!["pull"], vec!["up", "-d"]] {
            let spec = self.command(install_dir).args(step).inherit_output();
            log::info!("Running {} in {}", spec.display(), install_dir.display());
            let output = runner.run(&spec)?;
            if !output.success() {
                return Err(OrchestratorError::CommandFailed {
                    command: spec.display(),
                    code: output.exit_code,
                    stderr: output.stderr.trim().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for ComposeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeCommand::Plugin => write!(f, "docker compose"),
            ComposeCommand::Standalone => write!(f, "docker-compose"),
        }
    }
}
