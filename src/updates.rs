//! Application update availability.

use crate::store::EntityStore;
use crate::version::extract_version;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_RELEASES_ENDPOINT: &str =
    "https://api.github.com/repos/CK-Technology/berth/releases/latest";

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    tag_name: String,
}

/// Queries the release feed and publishes an update-availability flag.
///
/// Failures are logged and otherwise ignored; the flag keeps its previous
/// value until a check succeeds.
pub struct UpdateChecker {
    client: Client,
    endpoint: String,
}

impl Default for UpdateChecker {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASES_ENDPOINT)
    }
}

impl UpdateChecker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("berth/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub async fn check_and_publish(&self, store: &EntityStore) {
        let response = match self.client.get(&self.endpoint).send().await {
            Ok(response) => response,
            Err(error) => {
                debug!("Update check request failed: {}", error);
                return;
            }
        };

        let release: ReleaseInfo = match response.json().await {
            Ok(release) => release,
            Err(error) => {
                debug!("Update check returned an unexpected payload: {}", error);
                return;
            }
        };

        let Some(latest) = extract_version(&release.tag_name) else {
            debug!("Release tag {:?} carries no version", release.tag_name);
            return;
        };
        let Some(current) = extract_version(env!("CARGO_PKG_VERSION")) else {
            return;
        };

        let available = latest > current;
        if available {
            info!("⬆️  Update available: {} (running {})", latest, current);
        }
        store.set_update_available(available).await;
    }
}
