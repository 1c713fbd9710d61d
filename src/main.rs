mod cli;

use anyhow::Result;
use berth::{BerthConfig, BerthRuntime, RunRequest, SystemStatus};
use clap::Parser;
use cli::{BuilderCommands, Cli, Commands, DnsCommands, PropertyCommands};
use std::collections::HashMap;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?),
        )
        .init();

    let mut config = BerthConfig::load()?;
    config.verbose = cli.verbose;
    if let Some(tool) = &cli.tool {
        config.settings.tool_path = tool.into();
    }

    let runtime = BerthRuntime::with_config(config);
    let supervisor = runtime.supervisor();

    match cli.command {
        Commands::Status => {
            supervisor.refresh_system_status().await;
            supervisor.refresh_builder().await;
            let snapshot = runtime.store().snapshot().await;
            println!("System:   {}", describe_status(snapshot.system_status));
            match snapshot.builder_status {
                Some(status) => println!("Builder:  {}", status.as_str()),
                None => println!("Builder:  not running"),
            }
            if snapshot.update_available {
                println!("⬆️  An application update is available");
            }
        }

        Commands::Ps => {
            supervisor.refresh_containers().await;
            let snapshot = runtime.store().snapshot().await;
            println!("CONTAINER ID  STATUS        IMAGE");
            for container in snapshot.containers {
                println!(
                    "{:<13} {:<13} {}",
                    container.id,
                    container.status.as_str(),
                    container.image.as_deref().unwrap_or("-")
                );
            }
        }

        Commands::Images => {
            supervisor.refresh_images().await;
            let snapshot = runtime.store().snapshot().await;
            println!("REFERENCE                                SIZE");
            for image in snapshot.images {
                let size = image
                    .size_bytes
                    .map(|bytes| format!("{:.1}MB", bytes as f64 / 1_000_000.0))
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<40} {}", image.reference, size);
            }
        }

        Commands::Networks => {
            supervisor.refresh_networks().await;
            let snapshot = runtime.store().snapshot().await;
            println!("NETWORK       DRIVER    SUBNET");
            for network in snapshot.networks {
                println!(
                    "{:<13} {:<9} {}",
                    network.id,
                    network.driver.as_deref().unwrap_or("-"),
                    network.subnet.as_deref().unwrap_or("-")
                );
            }
        }

        Commands::Mounts => {
            supervisor.refresh_containers().await;
            for group in supervisor.aggregated_mounts().await {
                println!(
                    "{} -> {}  [{}]",
                    group.descriptor.source,
                    group.descriptor.destination,
                    group.container_ids.join(", ")
                );
            }
        }

        Commands::Run {
            image,
            name,
            ports,
            env,
            volumes,
            workdir,
            detach,
            command,
        } => {
            let request = RunRequest {
                image,
                name,
                detach,
                env: parse_env(&env),
                ports,
                volumes,
                working_dir: workdir,
                command,
            };
            let name = supervisor.run_container(&request).await?;
            println!("✅ Started container {name}");
        }

        Commands::Start { id } => {
            info!("Starting container: {}", id);
            supervisor.start_container(&id).await?;
            report_container(&runtime, &id).await;
        }

        Commands::Stop { id } => {
            info!("Stopping container: {}", id);
            supervisor.stop_container(&id).await?;
            report_container(&runtime, &id).await;
        }

        Commands::Rm { id } => {
            supervisor.remove_container(&id).await?;
            println!("✅ Removed: {id}");
        }

        Commands::Pull { image } => {
            info!("Pulling image: {}", image);
            supervisor.pull_image(&image).await?;
            println!("✅ Pulled: {image}");
        }

        Commands::Rmi { image } => {
            supervisor.delete_image(&image).await?;
            println!("✅ Deleted: {image}");
        }

        Commands::Builder { command } => match command {
            BuilderCommands::Status => {
                supervisor.refresh_builder().await;
                let snapshot = runtime.store().snapshot().await;
                match snapshot.builder_status {
                    Some(status) => println!("Builder is {}", status.as_str()),
                    None => println!("Builder is not running"),
                }
            }
            BuilderCommands::Start => {
                supervisor.start_builder().await?;
                println!("✅ Builder started");
            }
            BuilderCommands::Stop => {
                supervisor.stop_builder().await?;
                println!("✅ Builder stopped");
            }
            BuilderCommands::Delete => {
                supervisor.delete_builder().await?;
                println!("✅ Builder deleted");
            }
        },

        Commands::Dns { command } => match command {
            DnsCommands::List => {
                supervisor.refresh_dns_domains().await;
                let snapshot = runtime.store().snapshot().await;
                for domain in snapshot.dns_domains {
                    let marker = if domain.is_default { " (default)" } else { "" };
                    println!("{}{}", domain.name, marker);
                }
            }
            DnsCommands::Create { domain } => {
                supervisor.create_dns_domain(&domain).await?;
                println!("✅ Created DNS domain {domain}");
            }
            DnsCommands::Delete { domain } => {
                supervisor.delete_dns_domain(&domain).await?;
                println!("✅ Deleted DNS domain {domain}");
            }
            DnsCommands::SetDefault { domain } => {
                supervisor.set_default_dns_domain(Some(domain.as_str())).await?;
                println!("✅ Default DNS domain set to {domain}");
            }
            DnsCommands::ClearDefault => {
                supervisor.set_default_dns_domain(None).await?;
                println!("✅ Default DNS domain cleared");
            }
        },

        Commands::Property { command } => match command {
            PropertyCommands::Set { key, value } => {
                supervisor.set_system_property(&key, &value).await?;
                println!("✅ {key} = {value}");
            }
            PropertyCommands::Unset { key } => {
                supervisor.unset_system_property(&key).await?;
                println!("✅ {key} unset");
            }
        },

        Commands::Login { server, username } => {
            supervisor.registry_login(&server, &username).await?;
            println!("✅ Logged in to {server}");
        }

        Commands::Watch => {
            info!("👀 Watching runtime state (ctrl-c to exit)");
            let mut changes = runtime.store().subscribe();
            runtime.start_refreshing();
            loop {
                if changes.changed().await.is_err() {
                    break;
                }
                let snapshot = changes.borrow_and_update().clone();
                println!(
                    "{} | {} containers | {} images | loading: {}",
                    describe_status(snapshot.system_status),
                    snapshot.containers.len(),
                    snapshot.images.len(),
                    snapshot.loading.len()
                );
            }
        }
    }

    Ok(())
}

fn describe_status(status: SystemStatus) -> &'static str {
    match status {
        SystemStatus::Unknown => "unknown",
        SystemStatus::Stopped => "stopped",
        SystemStatus::Running => "running",
        SystemStatus::UnsupportedVersion => "unsupported tool version",
    }
}

async fn report_container(runtime: &BerthRuntime, id: &str) {
    let snapshot = runtime.store().snapshot().await;
    match snapshot.containers.iter().find(|container| container.id == id) {
        Some(container) => println!("{} is {}", id, container.status.as_str()),
        None => println!("{id} is gone"),
    }
}

fn parse_env(pairs: &[String]) -> HashMap<String, String> {
    pairs
        .iter()
        .filter_map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
        })
        .collect()
}
