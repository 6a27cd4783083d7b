//! CLI command implementations

pub mod cache;
pub mod check;
pub mod config;
pub mod conflicts;
pub mod deps;
pub mod init;
pub mod resolve;
pub mod status;

pub use cache::execute as cache;
pub use check::execute as check;
pub use config::execute as config;
pub use conflicts::execute as conflicts;
pub use deps::execute as deps;
pub use init::execute as init;
pub use resolve::execute as resolve;
pub use status::execute as status;

use crate::config::{Config, ConfigManager};
use crate::dependency::{discover, Declarations};
use crate::environment::{ConfigEnvironment, ProjectLayout};
use crate::fetch::{CommandRunner, ProcessRunner};
use crate::resolution::Resolver;
use crate::ui::{self, UiContext};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a command needs to know about the project it runs in
pub struct ProjectContext {
    pub config: Config,
    pub manager: ConfigManager,
    /// Project-local config in effect, if any
    pub local_config: Option<PathBuf>,
    pub layout: ProjectLayout,
}

impl ProjectContext {
    /// The project root is the directory holding the local config, or the
    /// working directory when there is none
    pub fn new(
        config: Config,
        manager: ConfigManager,
        local_config: Option<PathBuf>,
        cwd: PathBuf,
    ) -> Self {
        let root = local_config
            .as_deref()
            .and_then(|path| path.parent())
            .map(PathBuf::from)
            .unwrap_or(cwd);
        let layout = ProjectLayout::from_config(&root, &config);
        Self {
            config,
            manager,
            local_config,
            layout,
        }
    }

    /// Resolver wired to real processes
    pub fn resolver(&self) -> Resolver {
        self.resolver_with(Arc::new(ProcessRunner))
    }

    pub fn resolver_with(&self, runner: Arc<dyn CommandRunner>) -> Resolver {
        let env = Arc::new(ConfigEnvironment::new(self.config.clone()));
        Resolver::new(env, runner, &self.config, self.layout.clone())
    }

    /// Load every declaration file, reporting the unreadable ones
    pub fn declarations(&self, ctx: &UiContext) -> Declarations {
        let asset_root = self.layout.relative(&self.layout.asset_root).to_path_buf();
        let declarations = discover(
            &self.layout.root,
            &asset_root,
            &[self.layout.scratch_dir.clone()],
        );
        for error in &declarations.errors {
            ui::step_warn(ctx, &error.to_string());
        }
        declarations
    }
}
