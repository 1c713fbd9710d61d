use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Runtime state of a container as reported by the tool.
///
/// The tool emits free-text status strings; everything it can say is folded
/// into a closed set of variants, with unrecognized values preserved verbatim
/// in `Other` instead of being misclassified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Stopped,
    Created,
    Transitioning,
    Other(String),
}

impl ContainerState {
    /// Map a raw status string from tool output, case-insensitively.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" => ContainerState::Running,
            "stopped" | "exited" => ContainerState::Stopped,
            "created" => ContainerState::Created,
            "starting" | "stopping" | "restarting" => ContainerState::Transitioning,
            _ => ContainerState::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContainerState::Running => "running",
            ContainerState::Stopped => "stopped",
            ContainerState::Created => "created",
            ContainerState::Transitioning => "transitioning",
            ContainerState::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ContainerState::Running)
    }
}

impl Serialize for ContainerState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContainerState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ContainerState::from_raw(&raw))
    }
}

/// A single mount declared by a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountDescriptor {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub kind: Option<String>,
}

/// A network attachment on a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAttachment {
    pub network: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

/// Configuration snapshot attached to a listed container.
///
/// Immutable between refreshes; the whole container record is replaced
/// wholesale when a refresh observes different content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerConfigSnapshot {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub cpus: Option<u32>,
    #[serde(default)]
    pub memory: Option<String>,
}

/// Container information as observed from a list command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    pub status: ContainerState,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub configuration: ContainerConfigSnapshot,
    #[serde(default)]
    pub networks: Vec<NetworkAttachment>,
    #[serde(default)]
    pub mounts: Vec<MountDescriptor>,
}

/// Image information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub reference: String,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// Builder VM information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderSummary {
    pub id: String,
    pub status: ContainerState,
    #[serde(default)]
    pub cpus: Option<u32>,
    #[serde(default)]
    pub memory: Option<String>,
}

/// Network information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub id: String,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub subnet: Option<String>,
}

/// A local DNS domain handled by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsDomain {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Overall availability of the supervised runtime.
///
/// Combines reachability and version compatibility; an incompatible version
/// always overrides a "running" reachability signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemStatus {
    #[default]
    Unknown,
    Stopped,
    Running,
    UnsupportedVersion,
}

/// Structured request for running a new container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRequest {
    pub image: String,
    pub name: Option<String>,
    pub detach: bool,
    pub env: HashMap<String, String>,
    pub ports: Vec<String>,
    pub volumes: Vec<String>,
    pub working_dir: Option<String>,
    pub command: Vec<String>,
}

/// A deduplicated mount shared by one or more containers.
///
/// Derived view keyed by the `source->destination` pair; never mutated
/// independently of the container collection it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountGroup {
    pub descriptor: MountDescriptor,
    pub container_ids: Vec<String>,
}
