//! Orchestration facade over the runtime tool.
//!
//! `Supervisor` owns the invoker and the entity store, issues observational
//! and mutating commands, and keeps the published state converged with
//! observed reality. Reads flow invoker -> decoder -> store; writes
//! round-trip through the tool and come back via convergence polling or
//! optimistic confirmation.

pub mod commands;
pub mod converge;
mod optimistic;

use crate::decode;
use crate::error::{Result, RuntimeError};
use crate::invoker::CliInvoker;
use crate::store::{EntityStore, mounts};
use crate::types::{
    BuilderSummary, ContainerSummary, DnsDomain, ImageSummary, MountGroup, NetworkSummary,
    RunRequest, SystemStatus,
};
use crate::version::{self, SUPPORTED_VERSION};
use self::converge::{AbortFlag, ConvergeTarget};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Loading-marker key for the singleton builder VM.
const BUILDER_MARKER: &str = "builder";

pub struct Supervisor {
    pub(crate) invoker: Arc<dyn CliInvoker>,
    pub(crate) store: Arc<EntityStore>,
    /// Per-entity mutual exclusion: a mutating command plus its convergence
    /// loop hold the entity's token, so same-id mutations serialize without
    /// relying on UI-level disabling.
    entity_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// Cancellation flags for in-flight convergence loops, keyed by entity.
    abort_flags: std::sync::Mutex<HashMap<String, AbortFlag>>,
}

impl Supervisor {
    pub fn new(invoker: Arc<dyn CliInvoker>) -> Self {
        Self {
            invoker,
            store: Arc::new(EntityStore::new()),
            entity_locks: Mutex::new(HashMap::new()),
            abort_flags: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub(crate) async fn invoke(&self, argv: &[String]) -> crate::invoker::Invocation {
        let args: Vec<&str> = argv.iter().map(String::as_str).collect();
        self.invoker.invoke(&args).await
    }

    pub(crate) async fn invoke_privileged(&self, argv: &[String]) -> crate::invoker::Invocation {
        let args: Vec<&str> = argv.iter().map(String::as_str).collect();
        self.invoker.invoke_privileged(&args).await
    }

    /// Refuse mutations while the tool version is incompatible.
    pub(crate) async fn ensure_mutable(&self) -> Result<()> {
        if self.store.snapshot().await.system_status == SystemStatus::UnsupportedVersion {
            return Err(RuntimeError::UnsupportedVersion.into());
        }
        Ok(())
    }

    async fn entity_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.entity_locks.lock().await;
        locks.entry(id.to_string()).or_default().clone()
    }

    /// Trip any in-flight convergence loop for `id` and register a fresh
    /// flag for the superseding operation.
    fn supersede(&self, id: &str) -> AbortFlag {
        let mut flags = self.abort_flags.lock().expect("abort flag registry poisoned");
        if let Some(stale) = flags.get(id) {
            stale.cancel();
        }
        let fresh = AbortFlag::new();
        flags.insert(id.to_string(), fresh.clone());
        fresh
    }

    // --- Observational refreshes -------------------------------------------

    pub async fn refresh_containers(&self) {
        let invocation = self.invoke(&commands::list_containers()).await;
        let containers: Vec<ContainerSummary> = decode::decode_list(&invocation);
        self.store.set_containers(containers).await;
    }

    pub async fn refresh_images(&self) {
        let invocation = self.invoke(&commands::list_images()).await;
        let images: Vec<ImageSummary> = decode::decode_list(&invocation);
        self.store.set_images(images).await;
    }

    pub async fn refresh_networks(&self) {
        let invocation = self.invoke(&commands::list_networks()).await;
        let networks: Vec<NetworkSummary> = decode::decode_list(&invocation);
        self.store.set_networks(networks).await;
    }

    /// Builder output may be a single object, an array, or a plain-text
    /// "not running" sentinel; all three are handled by the decoder.
    pub async fn refresh_builder(&self) {
        let invocation = self.invoke(&commands::builder_status()).await;
        let builders: Vec<BuilderSummary> = decode::decode_list(&invocation);
        let status = builders.first().map(|builder| builder.status.clone());
        self.store.set_builders(builders).await;
        self.store.set_builder_status(status).await;
    }

    pub async fn refresh_dns_domains(&self) {
        let invocation = self.invoke(&commands::list_dns_domains()).await;
        let names: Vec<String> = decode::decode_list(&invocation);

        let default_invocation = self.invoke(&commands::dns_default_get()).await;
        let default = decode::decode_scalar(&default_invocation);

        let domains = names
            .into_iter()
            .map(|name| DnsDomain {
                is_default: default.as_deref() == Some(name.as_str()),
                name,
            })
            .collect();
        self.store.set_dns_domains(domains).await;
        self.store.set_default_dns_domain(default).await;
    }

    /// Combine reachability and version compatibility into one status.
    /// Version incompatibility overrides a "running" reachability signal.
    pub async fn refresh_system_status(&self) {
        let version_invocation = self.invoke(&commands::version()).await;
        if version_invocation.failed {
            self.store.set_system_status(SystemStatus::Stopped).await;
            return;
        }

        let banner = version_invocation.stdout.as_deref().unwrap_or("");
        let status = match version::extract_version(banner) {
            None => {
                warn!("Could not extract a version from tool banner");
                SystemStatus::Unknown
            }
            Some(found) if !found.is_supported() => {
                warn!(
                    "Tool version {} is not supported (requires {})",
                    found, SUPPORTED_VERSION
                );
                SystemStatus::UnsupportedVersion
            }
            Some(_) => {
                let reachability = self.invoke(&commands::system_status()).await;
                if reachability.failed {
                    SystemStatus::Stopped
                } else {
                    SystemStatus::Running
                }
            }
        };
        self.store.set_system_status(status).await;
    }

    /// The fixed observational batch fired by the refresh scheduler.
    pub async fn refresh_all(&self) {
        futures::join!(
            self.refresh_system_status(),
            self.refresh_containers(),
            self.refresh_images(),
            self.refresh_builder(),
            self.refresh_dns_domains(),
            self.refresh_networks(),
        );
    }

    /// Deduplicated cross-container mount view, derived on demand.
    pub async fn aggregated_mounts(&self) -> Vec<MountGroup> {
        mounts::aggregate_mounts(&self.store.snapshot().await.containers)
    }

    // --- Container mutations -----------------------------------------------

    pub async fn start_container(&self, id: &str) -> Result<()> {
        self.converging_mutation(id, commands::start_container(id), ConvergeTarget::Running)
            .await
    }

    pub async fn stop_container(&self, id: &str) -> Result<()> {
        self.converging_mutation(id, commands::stop_container(id), ConvergeTarget::NotRunning)
            .await
    }

    /// Issue a mutating command, then drive the entity to the target state
    /// through the bounded convergence poller.
    async fn converging_mutation(
        &self,
        id: &str,
        argv: Vec<String>,
        target: ConvergeTarget,
    ) -> Result<()> {
        self.ensure_mutable().await?;

        let abort = self.supersede(id);
        let lock = self.entity_lock(id).await;
        let _guard = lock.lock().await;
        if abort.is_cancelled() {
            // Superseded while waiting for the entity token; the newer
            // operation owns the transition now.
            return Ok(());
        }

        self.store.mark_loading(id).await;
        let invocation = self.invoke(&argv).await;
        if invocation.failed {
            self.store.clear_loading(id).await;
            let message = invocation.diagnostic();
            self.store
                .record_error(format!("Command failed for {id}: {message}"))
                .await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }

        // Abandonment after the attempt budget is silent; the periodic
        // refresh reflects true state eventually.
        converge::run_convergence(&*self.invoker, &self.store, id, target, &abort).await;
        Ok(())
    }

    pub async fn remove_container(&self, id: &str) -> Result<()> {
        self.ensure_mutable().await?;

        let abort = self.supersede(id);
        let lock = self.entity_lock(id).await;
        let _guard = lock.lock().await;
        if abort.is_cancelled() {
            return Ok(());
        }

        self.store.mark_loading(id).await;
        let invocation = self.invoke(&commands::remove_container(id)).await;
        self.store.clear_loading(id).await;

        if invocation.failed {
            let message = invocation.diagnostic();
            self.store
                .record_error(format!("Failed to remove container {id}: {message}"))
                .await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }

        // Drop it from the published list immediately instead of waiting for
        // the next refresh tick.
        self.store.remove_container(id).await;
        self.store
            .record_message(format!("Removed container {id}"))
            .await;
        Ok(())
    }

    pub async fn run_container(&self, request: &RunRequest) -> Result<String> {
        self.ensure_mutable().await?;

        let name = match &request.name {
            Some(name) => name.clone(),
            None => format!("berth-{}", &Uuid::new_v4().simple().to_string()[..8]),
        };

        self.store.mark_loading(&name).await;
        let invocation = self.invoke(&commands::run_container(request, &name)).await;
        self.store.clear_loading(&name).await;

        if invocation.failed {
            let message = invocation.diagnostic();
            self.store
                .record_error(format!("Failed to run {}: {message}", request.image))
                .await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }

        info!("🚀 Started container {} from {}", name, request.image);
        self.store
            .record_message(format!("Started container {name}"))
            .await;
        self.refresh_containers().await;
        Ok(name)
    }

    // --- Image mutations ---------------------------------------------------

    pub async fn pull_image(&self, reference: &str) -> Result<()> {
        self.simple_mutation(
            reference,
            commands::pull_image(reference),
            format!("Pulled image {reference}"),
        )
        .await?;
        self.refresh_images().await;
        Ok(())
    }

    pub async fn delete_image(&self, reference: &str) -> Result<()> {
        self.simple_mutation(
            reference,
            commands::delete_image(reference),
            format!("Deleted image {reference}"),
        )
        .await?;
        self.refresh_images().await;
        Ok(())
    }

    // --- Builder mutations -------------------------------------------------

    pub async fn start_builder(&self) -> Result<()> {
        self.builder_mutation(commands::start_builder(), "Builder started").await
    }

    pub async fn stop_builder(&self) -> Result<()> {
        self.builder_mutation(commands::stop_builder(), "Builder stopped").await
    }

    pub async fn delete_builder(&self) -> Result<()> {
        self.builder_mutation(commands::delete_builder(), "Builder deleted").await
    }

    async fn builder_mutation(&self, argv: Vec<String>, success: &str) -> Result<()> {
        self.ensure_mutable().await?;

        self.store.mark_loading(BUILDER_MARKER).await;
        let invocation = self.invoke(&argv).await;
        self.store.clear_loading(BUILDER_MARKER).await;

        if invocation.failed {
            let message = invocation.diagnostic();
            self.store
                .record_error(format!("Builder command failed: {message}"))
                .await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }

        self.store.record_message(success).await;
        self.refresh_builder().await;
        Ok(())
    }

    // --- DNS domain mutations ----------------------------------------------

    /// DNS domain changes touch host resolver state and go through the
    /// privileged invocation path.
    pub async fn create_dns_domain(&self, domain: &str) -> Result<()> {
        self.ensure_mutable().await?;

        let invocation = self.invoke_privileged(&commands::create_dns_domain(domain)).await;
        if invocation.failed {
            let message = invocation.diagnostic();
            self.store
                .record_error(format!("Failed to create DNS domain {domain}: {message}"))
                .await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }

        self.store
            .record_message(format!("Created DNS domain {domain}"))
            .await;
        self.refresh_dns_domains().await;
        Ok(())
    }

    pub async fn delete_dns_domain(&self, domain: &str) -> Result<()> {
        self.ensure_mutable().await?;

        let invocation = self.invoke_privileged(&commands::delete_dns_domain(domain)).await;
        if invocation.failed {
            let message = invocation.diagnostic();
            self.store
                .record_error(format!("Failed to delete DNS domain {domain}: {message}"))
                .await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }

        self.store
            .record_message(format!("Deleted DNS domain {domain}"))
            .await;
        self.refresh_dns_domains().await;
        Ok(())
    }

    // --- Registry ----------------------------------------------------------

    /// Thin translation only; credentials are piped by the tool itself.
    pub async fn registry_login(&self, server: &str, username: &str) -> Result<()> {
        self.ensure_mutable().await?;

        let invocation = self.invoke(&commands::registry_login(server, username)).await;
        if invocation.failed {
            let message = invocation.diagnostic();
            self.store
                .record_error(format!("Registry login failed: {message}"))
                .await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }

        self.store
            .record_message(format!("Logged in to {server}"))
            .await;
        Ok(())
    }

    /// Shared shape for mutations that need a loading marker but no
    /// convergence loop: mark, invoke, clear, surface the outcome.
    async fn simple_mutation(&self, marker: &str, argv: Vec<String>, success: String) -> Result<()> {
        self.ensure_mutable().await?;

        self.store.mark_loading(marker).await;
        let invocation = self.invoke(&argv).await;
        self.store.clear_loading(marker).await;

        if invocation.failed {
            let message = invocation.diagnostic();
            self.store.record_error(message.clone()).await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }

        self.store.record_message(success).await;
        Ok(())
    }
}
