//! Error handling for dockhook.
use std::path::PathBuf;

use thiserror::Error;

/// Defines all possible errors that can occur while watching docks.
#[derive(Debug, Error)]
pub enum DockHookError {
    /// Error reading or accessing a configuration file.
    #[error("Failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// Error parsing YAML configuration.
    #[error("Invalid YAML format: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// The configuration references an environment variable that is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A dock was configured without a UUID.
    #[error("UUID is mandatory, but missing for '{device}'")]
    MissingIdentifier {
        /// The configured dock name.
        device: String,
    },

    /// Two docks resolve to the same object path.
    #[error("Dock '{device}' uses the same object path as '{existing}': {path}")]
    DuplicateDevice {
        /// The dock that was being registered.
        device: String,
        /// The dock already holding the path.
        existing: String,
        /// The colliding object path.
        path: String,
    },

    /// The message bus could not be reached.
    #[error("Failed to connect to the {bus} bus: {source}")]
    Connection {
        /// Name of the bus ("system" or "session").
        bus: String,
        /// The underlying bus error.
        #[source]
        source: zbus::Error,
    },

    /// The bus rejected a match rule for a dock.
    #[error("Failed to listen to signals for '{device}' at {path}: {source}")]
    SubscriptionFailed {
        /// The configured dock name.
        device: String,
        /// The object path the rule was scoped to.
        path: String,
        /// The underlying bus error.
        #[source]
        source: zbus::Error,
    },

    /// Receiving from the bus failed.
    #[error("Failed to receive bus message: {0}")]
    Receive(#[source] zbus::Error),

    /// A signal arrived for a path that no dock was registered under.
    #[error("Unexpected path {path}")]
    UnknownDevice {
        /// The object path carried by the signal.
        path: String,
    },

    /// The property change did not originate from the bolt device interface.
    #[error("Unexpected interface: {interface}")]
    UnexpectedInterface {
        /// The interface name reported in the payload.
        interface: String,
    },

    /// The signal body did not have the expected shape.
    #[error("Unexpected data on {path}: {reason}")]
    MalformedPayload {
        /// The object path carried by the signal.
        path: String,
        /// What was wrong with the payload.
        reason: String,
    },

    /// A configured handler failed to start or exited unsuccessfully.
    #[error("{action} for {device}: {source}")]
    HandlerFailed {
        /// The configured dock name.
        device: String,
        /// The action being handled ("authorize" or "disconnect").
        action: String,
        /// The underlying invocation error.
        #[source]
        source: CommandError,
    },
}

/// Error type for external handler invocations.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started.
    #[error("Failed to execute '{program}': {source}")]
    Spawn {
        /// The executable that was launched.
        program: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The program ran but did not exit successfully.
    #[error("'{program}' {status}")]
    Exit {
        /// The executable that was launched.
        program: String,
        /// Human-readable exit description (e.g. `exited with status 3`).
        status: String,
    },
}
