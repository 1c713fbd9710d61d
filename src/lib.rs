//! Berth - supervision and state-sync layer for a local container runtime
//!
//! This crate sits between a UI and the runtime's external command-line
//! tool: it issues observational and mutating commands, decodes the tool's
//! heterogeneous output, reconciles published collections against observed
//! reality, and drives in-progress transitions to completion through bounded
//! polling with optimistic-update and rollback semantics.

pub mod config;
pub mod decode;
pub mod error;
pub mod invoker;
pub mod orchestrator;
pub mod scheduler;
pub mod store;
pub mod types;
pub mod updates;
pub mod version;

pub use config::{BerthConfig, Settings};
pub use error::{BerthError, Result};

// Export main types at root level
pub use store::{EntityStore, StoreSnapshot};
pub use types::{
    BuilderSummary, ContainerState, ContainerSummary, DnsDomain, ImageSummary, MountGroup,
    NetworkSummary, RunRequest, SystemStatus,
};

// Re-export anyhow for compatibility
pub use anyhow;

/// Re-exports for easier API usage
pub mod api {
    pub use crate::invoker::{CliInvoker, Invocation, ToolInvoker};
    pub use crate::orchestrator::Supervisor;
    pub use crate::orchestrator::converge::{AbortFlag, ConvergeTarget};
    pub use crate::scheduler::{RefreshInterval, RefreshScheduler};
    pub use crate::store::mounts::aggregate_mounts;
    pub use crate::updates::UpdateChecker;
    pub use crate::version::{SUPPORTED_VERSION, ToolVersion, extract_version};
    pub use crate::{BerthConfig, BerthRuntime, ContainerSummary, StoreSnapshot, SystemStatus};
}

use crate::orchestrator::Supervisor;
use crate::scheduler::{RefreshInterval, RefreshScheduler};
use crate::updates::UpdateChecker;
use std::sync::Arc;

/// Core Berth API wiring config, invoker, supervisor, and scheduler.
pub struct BerthRuntime {
    config: BerthConfig,
    supervisor: Arc<Supervisor>,
    scheduler: RefreshScheduler,
}

impl BerthRuntime {
    /// Create a new Berth runtime instance
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(BerthConfig::load()?))
    }

    /// Create a new Berth runtime instance with custom config
    pub fn with_config(config: BerthConfig) -> Self {
        let invoker = Arc::new(invoker::ToolInvoker::new(&config.settings.tool_path));
        let supervisor = Arc::new(Supervisor::new(invoker));

        let updates = match &config.settings.releases_endpoint {
            Some(endpoint) => Arc::new(UpdateChecker::new(endpoint)),
            None => Arc::new(UpdateChecker::default()),
        };
        let scheduler = RefreshScheduler::new(Arc::clone(&supervisor), updates);

        Self {
            config,
            supervisor,
            scheduler,
        }
    }

    pub fn config(&self) -> &BerthConfig {
        &self.config
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        self.supervisor.store()
    }

    /// Start periodic refreshes at the configured cadence.
    pub fn start_refreshing(&self) {
        self.scheduler.start(self.config.settings.refresh_interval);
    }

    pub fn set_refresh_interval(&self, interval: RefreshInterval) {
        self.scheduler.set_interval(interval);
    }

    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}
