mod support;

use berth::api::Supervisor;
use berth::types::{ContainerState, SystemStatus};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use support::{FakeInvoker, fail, ok};

fn supervisor_with(invoker: &Arc<FakeInvoker>) -> Supervisor {
    Supervisor::new(invoker.clone())
}

#[tokio::test]
async fn refresh_populates_containers() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on(
        "list",
        ok(r#"[{"id":"web","status":"running"},{"id":"db","status":"stopped"}]"#),
    );
    let supervisor = supervisor_with(&invoker);

    supervisor.refresh_containers().await;

    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.containers.len(), 2);
    assert_eq!(snapshot.containers[0].id, "web");
}

#[tokio::test]
async fn identical_refresh_does_not_notify_again() {
    let invoker = Arc::new(FakeInvoker::new());
    let list = r#"[{"id":"web","status":"running"}]"#;
    invoker
        .on("list", ok(list))
        .on("list", ok(list))
        .on("list", ok(r#"[{"id":"web","status":"stopped"}]"#));
    let supervisor = supervisor_with(&invoker);

    supervisor.refresh_containers().await;
    let mut changes = supervisor.store().subscribe();
    changes.mark_unchanged();

    supervisor.refresh_containers().await;
    assert!(!changes.has_changed().unwrap());

    supervisor.refresh_containers().await;
    assert!(changes.has_changed().unwrap());
}

#[tokio::test]
async fn builder_sentinel_means_no_builder() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("builder status", ok("builder is not running\n"));
    let supervisor = supervisor_with(&invoker);

    supervisor.refresh_builder().await;

    let snapshot = supervisor.store().snapshot().await;
    assert!(snapshot.builders.is_empty());
    assert_eq!(snapshot.builder_status, None);
}

#[tokio::test]
async fn builder_single_object_reports_status() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on(
        "builder status",
        ok(r#"{"id":"buildkit","status":"running","cpus":4,"memory":"2048MB"}"#),
    );
    let supervisor = supervisor_with(&invoker);

    supervisor.refresh_builder().await;

    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.builders.len(), 1);
    assert_eq!(snapshot.builder_status, Some(ContainerState::Running));
}

#[tokio::test]
async fn supported_version_and_reachable_runtime_is_running() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("--version", ok("container CLI version 0.6.0\n"));
    invoker.on("system status", ok("runtime is running"));
    let supervisor = supervisor_with(&invoker);

    supervisor.refresh_system_status().await;

    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.system_status, SystemStatus::Running);
}

#[tokio::test]
async fn incompatible_version_overrides_reachability() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("--version", ok("container CLI version 0.7.0\n"));
    invoker.on("system status", ok("runtime is running"));
    let supervisor = supervisor_with(&invoker);

    supervisor.refresh_system_status().await;

    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.system_status, SystemStatus::UnsupportedVersion);
    // Reachability is irrelevant once the gate fails.
    assert_eq!(invoker.calls_matching("system status"), 0);
}

#[tokio::test]
async fn unreachable_tool_reports_stopped() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("--version", fail("connection refused"));
    let supervisor = supervisor_with(&invoker);

    supervisor.refresh_system_status().await;

    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.system_status, SystemStatus::Stopped);
}

#[tokio::test]
async fn versionless_banner_reports_unknown() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("--version", ok("usage: container <command>"));
    let supervisor = supervisor_with(&invoker);

    supervisor.refresh_system_status().await;

    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.system_status, SystemStatus::Unknown);
}

#[tokio::test]
async fn mutations_are_refused_while_version_is_unsupported() {
    let invoker = Arc::new(FakeInvoker::new());
    let supervisor = supervisor_with(&invoker);
    supervisor
        .store()
        .set_system_status(SystemStatus::UnsupportedVersion)
        .await;

    assert!(supervisor.start_container("web").await.is_err());
    assert_eq!(invoker.calls_matching("start"), 0);
}

#[tokio::test]
async fn dns_refresh_marks_default_domain() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on("system dns list", ok(r#"["a.local","b.local"]"#));
    invoker.on("system dns default inspect", ok("b.local"));
    let supervisor = supervisor_with(&invoker);

    supervisor.refresh_dns_domains().await;

    let snapshot = supervisor.store().snapshot().await;
    assert_eq!(snapshot.default_dns_domain.as_deref(), Some("b.local"));
    assert!(!snapshot.dns_domains[0].is_default);
    assert!(snapshot.dns_domains[1].is_default);
}

#[tokio::test]
async fn aggregated_mounts_deduplicate_across_containers() {
    let invoker = Arc::new(FakeInvoker::new());
    invoker.on(
        "list",
        ok(r#"[
            {"id":"web","status":"running","mounts":[{"source":"/srv","destination":"/data"}]},
            {"id":"db","status":"running","mounts":[{"source":"/srv","destination":"/data"}]}
        ]"#),
    );
    let supervisor = supervisor_with(&invoker);

    supervisor.refresh_containers().await;
    let mounts = supervisor.aggregated_mounts().await;

    assert_eq!(mounts.len(), 1);
    assert_eq!(mounts[0].container_ids, vec!["web", "db"]);
}
