//! Optimistic settings mutations.
//!
//! Some tool commands perturb foreground focus as a side effect of process
//! launch, so latency-sensitive settings are applied to the store BEFORE the
//! command is dispatched. A failed command forces a reload that discards the
//! optimistic value; a successful one needs no further action because the
//! local state already matches reality.

use super::{Supervisor, commands};
use crate::decode;
use crate::error::{Result, RuntimeError};
use tracing::debug;

impl Supervisor {
    /// Set (or clear, with `None`) the default DNS domain.
    ///
    /// The scalar and the denormalized per-domain flags change in the same
    /// synchronous store update, so consumers see the new default with zero
    /// latency and never observe the two out of sync.
    pub async fn set_default_dns_domain(&self, domain: Option<&str>) -> Result<()> {
        self.ensure_mutable().await?;

        self.store
            .set_default_dns_domain(domain.map(str::to_string))
            .await;

        let argv = match domain {
            Some(domain) => commands::dns_default_set(domain),
            None => commands::dns_default_clear(),
        };
        let invocation = self.invoke(&argv).await;

        if invocation.failed {
            let message = invocation.diagnostic();
            self.store
                .record_error(format!("Failed to update default DNS domain: {message}"))
                .await;
            // Discard the optimistic value by reloading observed state.
            self.refresh_dns_domains().await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }

        debug!("Default DNS domain confirmed as {:?}", domain);
        Ok(())
    }

    pub async fn set_system_property(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_mutable().await?;

        self.store.set_property(key, value).await;

        let invocation = self.invoke(&commands::property_set(key, value)).await;
        if invocation.failed {
            let message = invocation.diagnostic();
            self.store
                .record_error(format!("Failed to set property {key}: {message}"))
                .await;
            self.reload_property(key).await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }
        Ok(())
    }

    pub async fn unset_system_property(&self, key: &str) -> Result<()> {
        self.ensure_mutable().await?;

        self.store.unset_property(key).await;

        let invocation = self.invoke(&commands::property_unset(key)).await;
        if invocation.failed {
            let message = invocation.diagnostic();
            self.store
                .record_error(format!("Failed to unset property {key}: {message}"))
                .await;
            self.reload_property(key).await;
            return Err(RuntimeError::CommandRejected { message }.into());
        }
        Ok(())
    }

    /// Replace an optimistic property value with what the tool reports.
    async fn reload_property(&self, key: &str) {
        let invocation = self.invoke(&commands::property_get(key)).await;
        match decode::decode_scalar(&invocation) {
            Some(value) => self.store.set_property(key, &value).await,
            None => self.store.unset_property(key).await,
        }
    }
}
