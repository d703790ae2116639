pub mod check;
pub mod completions;
pub mod cycles;
pub mod graph;

use std::path::{Path, PathBuf};

use refgraph_core::StaticRegistry;
use refgraph_core::config::ProjectConfig;
use refgraph_core::error::ErrorCode;
use refgraph_core::manifest::load_registry;
use refgraph_graph::{CyclePolicy, DependencyGraph};
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error};

/// Everything a command needs after flag and config resolution.
#[derive(Debug)]
pub struct CommandContext {
    pub output: OutputMode,
    pub project_root: PathBuf,
    pub config: ProjectConfig,
    /// Set by `--no-default-policy`.
    pub no_default_policy: bool,
}

impl CommandContext {
    /// The manifest argument, or `[registry] manifest` resolved against the
    /// project root.
    pub fn manifest_path(&self, arg: Option<&Path>) -> anyhow::Result<PathBuf> {
        if let Some(path) = arg {
            return Ok(path.to_path_buf());
        }
        match &self.config.registry.manifest {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            Some(path) => Ok(self.project_root.join(path)),
            None => Err(self.fail_with_code(
                "no registry manifest given and `[registry] manifest` is not set",
                ErrorCode::ManifestNotFound,
            )),
        }
    }

    pub fn load_registry(&self, arg: Option<&Path>) -> anyhow::Result<StaticRegistry> {
        let path = self.manifest_path(arg)?;
        load_registry(&path).map_err(|e| self.fail_with_code(e.to_string(), e.code()))
    }

    pub fn load_graph(&self, arg: Option<&Path>) -> anyhow::Result<DependencyGraph> {
        let registry = self.load_registry(arg)?;
        DependencyGraph::from_registry(&registry)
            .map_err(|e| self.fail_with_code(e.to_string(), e.code()))
    }

    /// Policy from project config, without the built-in rules when
    /// `--no-default-policy` is set.
    pub fn policy(&self) -> CyclePolicy {
        let mut policy_config = self.config.policy.clone();
        if self.no_default_policy {
            policy_config.builtin_defaults = false;
        }
        let policy = CyclePolicy::from_config(&policy_config);
        debug!(
            ignored = policy.ignored.len(),
            excused = policy.excused.len(),
            "cycle policy resolved"
        );
        policy
    }

    /// Render `message` on stderr and return an error for `main` to exit on.
    pub fn fail_with_code(&self, message: impl Into<String>, code: ErrorCode) -> anyhow::Error {
        let message = message.into();
        let error = CliError::with_code(message.clone(), code);
        if let Err(render_err) = render_error(self.output, &error) {
            return render_err;
        }
        anyhow::anyhow!("{message}")
    }
}
