use thiserror::Error;

/// Berth-specific error types for better error handling
#[derive(Error, Debug)]
pub enum BerthError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invoker error: {0}")]
    Invoker(#[from] InvokerError),

    #[error("Runtime command error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Version gate error: {0}")]
    Version(#[from] VersionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    Serialization(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Generic error: {0}")]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found at path: {path}")]
    SettingsNotFound { path: String },

    #[error("Invalid settings format: {reason}")]
    InvalidFormat { reason: String },
}

#[derive(Error, Debug)]
pub enum InvokerError {
    #[error("Tool binary could not be launched: {reason}")]
    LaunchFailed { reason: String },
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Container not found: {id}")]
    ContainerNotFound { id: String },

    #[error("Command rejected: {message}")]
    CommandRejected { message: String },

    #[error("Mutation refused: tool version is unsupported")]
    UnsupportedVersion,
}

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("No version could be extracted from tool output")]
    Unparseable,
}

/// Convenience type alias for Berth results
pub type Result<T, E = BerthError> = std::result::Result<T, E>;
