//! Published, consumer-observable state of the supervised runtime.
//!
//! The store holds the last-known-good snapshot of every collection and
//! notifies subscribers only on real change: a refresh that produces
//! structurally identical content must not retrigger consumer transitions.
//! Status scalars update unconditionally since they drive gating logic.

pub mod mounts;

use crate::types::{
    BuilderSummary, ContainerState, ContainerSummary, DnsDomain, ImageSummary, NetworkSummary,
    SystemStatus,
};
use std::collections::{HashMap, HashSet};
use tokio::sync::{RwLock, watch};
use tracing::debug;

/// Value snapshot of everything the UI layer observes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub containers: Vec<ContainerSummary>,
    pub images: Vec<ImageSummary>,
    pub builders: Vec<BuilderSummary>,
    pub networks: Vec<NetworkSummary>,
    pub dns_domains: Vec<DnsDomain>,
    pub default_dns_domain: Option<String>,
    pub properties: HashMap<String, String>,
    pub system_status: SystemStatus,
    pub builder_status: Option<ContainerState>,
    pub loading: HashSet<String>,
    pub last_error: Option<String>,
    pub last_message: Option<String>,
    pub update_available: bool,
}

/// Shared entity store; all mutations funnel through these methods.
pub struct EntityStore {
    inner: RwLock<StoreSnapshot>,
    publisher: watch::Sender<StoreSnapshot>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        let snapshot = StoreSnapshot::default();
        let (publisher, _) = watch::channel(snapshot.clone());
        Self {
            inner: RwLock::new(snapshot),
            publisher,
        }
    }

    /// Subscribe to state changes. Each published value is a full snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.publisher.subscribe()
    }

    /// Current state by value.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.inner.read().await.clone()
    }

    fn publish(&self, state: &StoreSnapshot) {
        // send_replace keeps the channel value current even with no
        // subscribers, so late subscribers start from live state.
        self.publisher.send_replace(state.clone());
    }

    /// Replace the container collection; returns whether content changed.
    pub async fn set_containers(&self, containers: Vec<ContainerSummary>) -> bool {
        let mut state = self.inner.write().await;
        if state.containers == containers {
            debug!("Container refresh produced identical content, suppressing notification");
            return false;
        }
        state.containers = containers;
        self.publish(&state);
        true
    }

    pub async fn set_images(&self, images: Vec<ImageSummary>) -> bool {
        let mut state = self.inner.write().await;
        if state.images == images {
            return false;
        }
        state.images = images;
        self.publish(&state);
        true
    }

    pub async fn set_builders(&self, builders: Vec<BuilderSummary>) -> bool {
        let mut state = self.inner.write().await;
        if state.builders == builders {
            return false;
        }
        state.builders = builders;
        self.publish(&state);
        true
    }

    pub async fn set_networks(&self, networks: Vec<NetworkSummary>) -> bool {
        let mut state = self.inner.write().await;
        if state.networks == networks {
            return false;
        }
        state.networks = networks;
        self.publish(&state);
        true
    }

    pub async fn set_dns_domains(&self, domains: Vec<DnsDomain>) -> bool {
        let mut state = self.inner.write().await;
        if state.dns_domains == domains {
            return false;
        }
        state.dns_domains = domains;
        self.publish(&state);
        true
    }

    /// Set the default DNS domain and the denormalized per-domain flags in
    /// one synchronous step, so subscribers never observe them out of sync.
    pub async fn set_default_dns_domain(&self, domain: Option<String>) {
        let mut state = self.inner.write().await;
        let flags_current = state
            .dns_domains
            .iter()
            .all(|entry| entry.is_default == (domain.as_deref() == Some(entry.name.as_str())));
        if state.default_dns_domain == domain && flags_current {
            return;
        }
        state.default_dns_domain = domain.clone();
        for entry in &mut state.dns_domains {
            entry.is_default = domain.as_deref() == Some(entry.name.as_str());
        }
        self.publish(&state);
    }

    pub async fn set_property(&self, key: &str, value: &str) {
        let mut state = self.inner.write().await;
        if state.properties.get(key).map(String::as_str) == Some(value) {
            return;
        }
        state.properties.insert(key.to_string(), value.to_string());
        self.publish(&state);
    }

    pub async fn unset_property(&self, key: &str) {
        let mut state = self.inner.write().await;
        if state.properties.remove(key).is_some() {
            self.publish(&state);
        }
    }

    /// Status scalars publish unconditionally.
    pub async fn set_system_status(&self, status: SystemStatus) {
        let mut state = self.inner.write().await;
        state.system_status = status;
        self.publish(&state);
    }

    pub async fn set_builder_status(&self, status: Option<ContainerState>) {
        let mut state = self.inner.write().await;
        state.builder_status = status;
        self.publish(&state);
    }

    pub async fn set_update_available(&self, available: bool) {
        let mut state = self.inner.write().await;
        state.update_available = available;
        self.publish(&state);
    }

    /// Add an id to the in-flight transition set. Returns false when the id
    /// is already marked, which callers use to refuse duplicate actions.
    pub async fn mark_loading(&self, id: &str) -> bool {
        let mut state = self.inner.write().await;
        let inserted = state.loading.insert(id.to_string());
        if inserted {
            self.publish(&state);
        }
        inserted
    }

    /// Remove an id from the in-flight set. Safe to call on every exit path.
    pub async fn clear_loading(&self, id: &str) {
        let mut state = self.inner.write().await;
        if state.loading.remove(id) {
            self.publish(&state);
        }
    }

    pub async fn is_loading(&self, id: &str) -> bool {
        self.inner.read().await.loading.contains(id)
    }

    /// Remove a container immediately on successful local removal,
    /// independent of refresh timing.
    pub async fn remove_container(&self, id: &str) {
        let mut state = self.inner.write().await;
        let before = state.containers.len();
        state.containers.retain(|container| container.id != id);
        if state.containers.len() != before {
            self.publish(&state);
        }
    }

    pub async fn record_error(&self, message: impl Into<String>) {
        let mut state = self.inner.write().await;
        state.last_error = Some(message.into());
        self.publish(&state);
    }

    pub async fn record_message(&self, message: impl Into<String>) {
        let mut state = self.inner.write().await;
        state.last_message = Some(message.into());
        self.publish(&state);
    }
}
