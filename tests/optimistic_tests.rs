mod support;

use berth::api::Supervisor;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use support::{FakeInvoker, fail, ok};

#[tokio::test]
async fn default_domain_applies_before_the_command_confirms() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("system dns list", ok(r#"["a.local","b.local"]"#));
    invoker.on("system dns default inspect", ok("a.local"));
    invoker.on("system dns default set b.local", ok(""));
    let supervisor = Supervisor::new(invoker.clone());
    supervisor.refresh_dns_domains().await;

    supervisor.set_default_dns_domain(Some("b.local")).await.unwrap();

    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.default_dns_domain.as_deref(), Some("b.local"));
    assert!(snapshot.dns_domains[1].is_default);
    assert!(!snapshot.dns_domains[0].is_default);
    // Success needs no reconciliation reload.
    assert_eq!(invoker.calls_matching("system dns list"), 1);
}

#[tokio::test]
async fn failed_default_domain_command_rolls_back_via_reload() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("system dns list", ok(r#"["a.local","b.local"]"#));
    invoker.on("system dns default inspect", ok("a.local"));
    invoker.on("system dns default set b.local", fail("operation not permitted"));
    let supervisor = Supervisor::new(invoker.clone());
    supervisor.refresh_dns_domains().await;

    let result = supervisor.set_default_dns_domain(Some("b.local")).await;

    assert!(result.is_err());
    let snapshot = supervisor.store().snapshot().await;
    // The optimistic value was discarded by the forced reload.
    assert_eq!(snapshot.default_dns_domain.as_deref(), Some("a.local"));
    assert!(snapshot.dns_domains[0].is_default);
    assert!(snapshot.last_error.unwrap().contains("operation not permitted"));
    assert_eq!(invoker.calls_matching("system dns list"), 2);
}

#[tokio::test]
async fn clearing_the_default_domain_unsets_all_flags() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("system dns list", ok(r#"["a.local"]"#));
    invoker.on("system dns default inspect", ok("a.local"));
    invoker.on("system dns default clear", ok(""));
    let supervisor = Supervisor::new(invoker.clone());
    supervisor.refresh_dns_domains().await;

    supervisor.set_default_dns_domain(None).await.unwrap();

    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.default_dns_domain, None);
    assert!(snapshot.dns_domains.iter().all(|domain| !domain.is_default));
}

#[tokio::test]
async fn property_set_is_applied_optimistically() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("system property set registry.mirror on", ok(""));
    let supervisor = Supervisor::new(invoker.clone());

    supervisor.set_system_property("registry.mirror", "on").await.unwrap();

    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.properties.get("registry.mirror").map(String::as_str), Some("on"));
}

#[tokio::test]
async fn failed_property_set_reloads_the_observed_value() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("system property set registry.mirror on", fail("read-only property"));
    invoker.on("system property get registry.mirror", ok("off"));
    let supervisor = Supervisor::new(invoker.clone());

    let result = supervisor.set_system_property("registry.mirror", "on").await;

    assert!(result.is_err());
    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.properties.get("registry.mirror").map(String::as_str), Some("off"));
}

#[tokio::test]
async fn failed_property_unset_restores_the_observed_value() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("system property set registry.mirror on", ok(""));
    invoker.on("system property unset registry.mirror", fail("denied"));
    invoker.on("system property get registry.mirror", ok("on"));
    let supervisor = Supervisor::new(invoker.clone());
    supervisor.set_system_property("registry.mirror", "on").await.unwrap();

    let result = supervisor.unset_system_property("registry.mirror").await;

    assert!(result.is_err());
    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.properties.get("registry.mirror").map(String::as_str), Some("on"));
}

#[tokio::test]
async fn dns_domain_creation_goes_through_the_privileged_path() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("system dns create test.local", ok(""));
    invoker.on("system dns list", ok(r#"["test.local"]"#));
    let supervisor = Supervisor::new(invoker.clone());

    supervisor.create_dns_domain("test.local").await.unwrap();

    assert_eq!(invoker.privileged_calls_matching("system dns create"), 1);
    assert_eq!(invoker.calls_matching("system dns create"), 0);
    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.dns_domains.len(), 1);
}
