use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "berth")]
#[command(about = "Supervise a local container runtime through its CLI tool")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Runtime tool binary path (overrides settings and BERTH_TOOL)
    #[arg(short, long)]
    pub tool: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show runtime reachability, tool version gate, and builder status
    Status,

    /// List containers
    Ps,

    /// List images
    Images,

    /// List networks
    Networks,

    /// Show the deduplicated cross-container mount view
    Mounts,

    /// Run a new container
    Run {
        /// Image to run
        image: String,

        /// Container name
        #[arg(short, long)]
        name: Option<String>,

        /// Port mappings (host:container)
        #[arg(short, long)]
        ports: Vec<String>,

        /// Environment variables (KEY=VALUE)
        #[arg(short, long)]
        env: Vec<String>,

        /// Volume mounts (host:container)
        #[arg(short = 'V', long)]
        volumes: Vec<String>,

        /// Working directory inside the container
        #[arg(short, long)]
        workdir: Option<String>,

        /// Run in detached mode
        #[arg(short, long)]
        detach: bool,

        /// Command override
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Start a container and wait for it to converge
    Start {
        /// Container id
        id: String,
    },

    /// Stop a container and wait for it to converge
    Stop {
        /// Container id
        id: String,
    },

    /// Remove a container
    Rm {
        /// Container id
        id: String,
    },

    /// Pull an image
    Pull {
        /// Image reference
        image: String,
    },

    /// Delete an image
    Rmi {
        /// Image reference
        image: String,
    },

    /// Builder VM management
    Builder {
        #[command(subcommand)]
        command: BuilderCommands,
    },

    /// Local DNS domain management
    Dns {
        #[command(subcommand)]
        command: DnsCommands,
    },

    /// Runtime system properties
    Property {
        #[command(subcommand)]
        command: PropertyCommands,
    },

    /// Log in to a registry
    Login {
        /// Registry server
        server: String,

        /// User name
        #[arg(short, long)]
        username: String,
    },

    /// Keep refreshing and print every published state change
    Watch,
}

#[derive(Subcommand)]
pub enum BuilderCommands {
    /// Show builder status
    Status,
    /// Start the builder
    Start,
    /// Stop the builder
    Stop,
    /// Delete the builder
    Delete,
}

#[derive(Subcommand)]
pub enum DnsCommands {
    /// List DNS domains
    List,
    /// Create a domain (privileged)
    Create { domain: String },
    /// Delete a domain (privileged)
    Delete { domain: String },
    /// Set the default domain
    SetDefault { domain: String },
    /// Clear the default domain
    ClearDefault,
}

#[derive(Subcommand)]
pub enum PropertyCommands {
    /// Set a property
    Set { key: String, value: String },
    /// Unset a property
    Unset { key: String },
}
