//! Translation from supervision intents to tool argument lists.
//!
//! Deliberately thin: every function returns the argv for exactly one tool
//! command, with no invocation logic mixed in.

use crate::types::RunRequest;

pub fn list_containers() -> Vec<String> {
    argv(&["list", "--all", "--format", "json"])
}

pub fn list_images() -> Vec<String> {
    argv(&["images", "list", "--format", "json"])
}

pub fn builder_status() -> Vec<String> {
    argv(&["builder", "status", "--json"])
}

pub fn list_networks() -> Vec<String> {
    argv(&["network", "list", "--format", "json"])
}

pub fn system_status() -> Vec<String> {
    argv(&["system", "status"])
}

pub fn version() -> Vec<String> {
    argv(&["--version"])
}

pub fn start_container(id: &str) -> Vec<String> {
    argv(&["start", id])
}

pub fn stop_container(id: &str) -> Vec<String> {
    argv(&["stop", id])
}

pub fn remove_container(id: &str) -> Vec<String> {
    argv(&["delete", id])
}

pub fn pull_image(reference: &str) -> Vec<String> {
    argv(&["images", "pull", reference])
}

pub fn delete_image(reference: &str) -> Vec<String> {
    argv(&["images", "delete", reference])
}

pub fn start_builder() -> Vec<String> {
    argv(&["builder", "start"])
}

pub fn stop_builder() -> Vec<String> {
    argv(&["builder", "stop"])
}

pub fn delete_builder() -> Vec<String> {
    argv(&["builder", "delete"])
}

pub fn list_dns_domains() -> Vec<String> {
    argv(&["system", "dns", "list", "--format", "json"])
}

pub fn create_dns_domain(domain: &str) -> Vec<String> {
    argv(&["system", "dns", "create", domain])
}

pub fn delete_dns_domain(domain: &str) -> Vec<String> {
    argv(&["system", "dns", "delete", domain])
}

pub fn dns_default_get() -> Vec<String> {
    argv(&["system", "dns", "default", "inspect"])
}

pub fn dns_default_set(domain: &str) -> Vec<String> {
    argv(&["system", "dns", "default", "set", domain])
}

pub fn dns_default_clear() -> Vec<String> {
    argv(&["system", "dns", "default", "clear"])
}

pub fn property_get(key: &str) -> Vec<String> {
    argv(&["system", "property", "get", key])
}

pub fn property_set(key: &str, value: &str) -> Vec<String> {
    argv(&["system", "property", "set", key, value])
}

pub fn property_unset(key: &str) -> Vec<String> {
    argv(&["system", "property", "unset", key])
}

pub fn registry_login(server: &str, username: &str) -> Vec<String> {
    argv(&["registry", "login", server, "--username", username, "--password-stdin"])
}

pub fn run_container(request: &RunRequest, name: &str) -> Vec<String> {
    let mut args = vec!["run".to_string(), "--name".to_string(), name.to_string()];

    if request.detach {
        args.push("--detach".to_string());
    }

    let mut env: Vec<_> = request.env.iter().collect();
    env.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in env {
        args.push("--env".to_string());
        args.push(format!("{key}={value}"));
    }

    for port in &request.ports {
        args.push("--publish".to_string());
        args.push(port.clone());
    }

    for volume in &request.volumes {
        args.push("--volume".to_string());
        args.push(volume.clone());
    }

    if let Some(dir) = &request.working_dir {
        args.push("--workdir".to_string());
        args.push(dir.clone());
    }

    args.push(request.image.clone());
    args.extend(request.command.iter().cloned());
    args
}

fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn run_argv_orders_flags_before_image_and_command() {
        let request = RunRequest {
            image: "nginx:latest".to_string(),
            name: None,
            detach: true,
            env: HashMap::from([("B".to_string(), "2".to_string()), ("A".to_string(), "1".to_string())]),
            ports: vec!["8080:80".to_string()],
            volumes: vec!["/site:/usr/share/nginx/html".to_string()],
            working_dir: Some("/srv".to_string()),
            command: vec!["nginx".to_string(), "-g".to_string()],
        };

        let args = run_container(&request, "web");
        assert_eq!(
            args,
            vec![
                "run", "--name", "web", "--detach", "--env", "A=1", "--env", "B=2",
                "--publish", "8080:80", "--volume", "/site:/usr/share/nginx/html",
                "--workdir", "/srv", "nginx:latest", "nginx", "-g",
            ]
        );
    }
}
